// ==========================================
// 临床轮转排班核心 - 带教指派数据仓储
// ==========================================
// 对齐: instructor_assignment 表
// 红线: Repository 不做业务逻辑,只做数据映射
// 说明: 借用调用方的连接/事务, 由事务策略决定边界
// ==========================================

use std::collections::BTreeSet;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::domain::{Assignment, NewAssignment, RotationWeek};
use crate::engine::unit_of_work::AssignmentStore;
use crate::repository::error::{RepositoryError, RepositoryResult};

const SELECT_COLUMNS: &str = r#"
    SELECT assignment_id, instructor_id, rotation_id, week_id, is_primary_evaluator, role
    FROM instructor_assignment
"#;

// ==========================================
// AssignmentRepository - 带教指派仓储
// ==========================================
pub struct AssignmentRepository<'c> {
    conn: &'c Connection,
}

impl<'c> AssignmentRepository<'c> {
    /// 基于连接或事务创建（Transaction 可 Deref 为 Connection）
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn map_row(row: &Row) -> rusqlite::Result<Assignment> {
        Ok(Assignment {
            id: row.get(0)?,
            instructor_id: row.get(1)?,
            rotation_id: row.get(2)?,
            week_id: row.get(3)?,
            is_primary_evaluator: row.get::<_, i64>(4)? != 0,
            role: row.get(5)?,
        })
    }

    /// 指派总数（运维统计用）
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM instructor_assignment", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl AssignmentStore for AssignmentRepository<'_> {
    fn find_by_id(&self, assignment_id: i64) -> RepositoryResult<Option<Assignment>> {
        let sql = format!("{} WHERE assignment_id = ?1", SELECT_COLUMNS);
        let found = self
            .conn
            .query_row(&sql, params![assignment_id], Self::map_row)
            .optional()?;
        Ok(found)
    }

    fn find_by_instructor_in_weeks(
        &self,
        instructor_id: i64,
        week_ids: &BTreeSet<i64>,
        exclude_rotation_id: Option<i64>,
    ) -> RepositoryResult<Vec<Assignment>> {
        if week_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = std::iter::repeat("?")
            .take(week_ids.len())
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "{} WHERE instructor_id = ? AND week_id IN ({})",
            SELECT_COLUMNS, placeholders
        );

        let mut values: Vec<Value> = Vec::with_capacity(week_ids.len() + 2);
        values.push(Value::from(instructor_id));
        values.extend(week_ids.iter().map(|&w| Value::from(w)));

        if let Some(rotation_id) = exclude_rotation_id {
            sql.push_str(" AND rotation_id <> ?");
            values.push(Value::from(rotation_id));
        }
        sql.push_str(" ORDER BY week_id, rotation_id, assignment_id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn find_by_slot(&self, slot: RotationWeek) -> RepositoryResult<Vec<Assignment>> {
        let sql = format!(
            "{} WHERE rotation_id = ?1 AND week_id = ?2 ORDER BY assignment_id",
            SELECT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![slot.rotation_id, slot.week_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert(&mut self, new_assignment: &NewAssignment) -> RepositoryResult<Assignment> {
        self.conn.execute(
            r#"
            INSERT INTO instructor_assignment (
                instructor_id, rotation_id, week_id, is_primary_evaluator, role
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                new_assignment.instructor_id,
                new_assignment.rotation_id,
                new_assignment.week_id,
                if new_assignment.is_primary_evaluator { 1 } else { 0 },
                new_assignment.role,
            ],
        )?;

        Ok(Assignment {
            id: self.conn.last_insert_rowid(),
            instructor_id: new_assignment.instructor_id,
            rotation_id: new_assignment.rotation_id,
            week_id: new_assignment.week_id,
            is_primary_evaluator: new_assignment.is_primary_evaluator,
            role: new_assignment.role.clone(),
        })
    }

    fn set_primary_flag(&mut self, assignment_id: i64, is_primary: bool) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            "UPDATE instructor_assignment SET is_primary_evaluator = ?2 WHERE assignment_id = ?1",
            params![assignment_id, if is_primary { 1 } else { 0 }],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Assignment".to_string(),
                id: assignment_id.to_string(),
            });
        }
        Ok(())
    }

    fn delete(&mut self, assignment_id: i64) -> RepositoryResult<bool> {
        let rows = self.conn.execute(
            "DELETE FROM instructor_assignment WHERE assignment_id = ?1",
            params![assignment_id],
        )?;
        Ok(rows > 0)
    }
}
