use super::core::RECORDED_AT_FORMAT;
use super::AuditLogRepository;
use crate::domain::{AuditAction, AuditRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT audit_id, action, instructor_id, rotation_id, week_id,
           modified_by, related_assignment_id, recorded_at
    FROM schedule_audit_log
"#;

pub(super) fn map_row(row: &Row) -> SqliteResult<AuditRecord> {
    let action_str: String = row.get(1)?;
    let recorded_at_str: String = row.get(7)?;

    let action = AuditAction::parse(&action_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            Box::new(RepositoryError::FieldValueError {
                field: "action".to_string(),
                message: format!("未知审计动作: {}", action_str),
            }),
        )
    })?;

    let recorded_at = NaiveDateTime::parse_from_str(&recorded_at_str, RECORDED_AT_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(AuditRecord {
        id: row.get(0)?,
        action,
        instructor_id: row.get(2)?,
        rotation_id: row.get(3)?,
        week_id: row.get(4)?,
        modified_by: row.get(5)?,
        related_assignment_id: row.get(6)?,
        recorded_at,
    })
}

/// 按关联指派查询（最新在前, 以 audit_id 即写入顺序排序）
pub(super) fn select_by_assignment(conn: &Connection, assignment_id: i64) -> RepositoryResult<Vec<AuditRecord>> {
    let sql = format!(
        "{} WHERE related_assignment_id = ?1 ORDER BY audit_id DESC",
        SELECT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params![assignment_id], map_row)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(records)
}

/// 按格子查询（最新在前）
pub(super) fn select_by_rotation_week(
    conn: &Connection,
    rotation_id: i64,
    week_id: i64,
) -> RepositoryResult<Vec<AuditRecord>> {
    let sql = format!(
        "{} WHERE rotation_id = ?1 AND week_id = ?2 ORDER BY audit_id DESC",
        SELECT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params![rotation_id, week_id], map_row)?
        .collect::<SqliteResult<Vec<_>>>()?;
    Ok(records)
}

impl AuditLogRepository {
    /// 按关联指派查询审计历史
    pub fn find_by_assignment(&self, assignment_id: i64) -> RepositoryResult<Vec<AuditRecord>> {
        let conn = self.get_conn()?;
        select_by_assignment(&conn, assignment_id)
    }

    /// 按 (rotation_id, week_id) 查询审计历史
    pub fn find_by_rotation_week(&self, rotation_id: i64, week_id: i64) -> RepositoryResult<Vec<AuditRecord>> {
        let conn = self.get_conn()?;
        select_by_rotation_week(&conn, rotation_id, week_id)
    }

    /// 查询最近的审计记录
    ///
    /// # 参数
    /// - `limit`: 返回条数上限
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<AuditRecord>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY audit_id DESC LIMIT ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 某操作人的审计记录
    pub fn find_by_modified_by(&self, modified_by: &str, limit: i32) -> RepositoryResult<Vec<AuditRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE modified_by = ?1 ORDER BY audit_id DESC LIMIT ?2",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![modified_by, limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 审计记录总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM schedule_audit_log", [], |row| row.get(0))?;
        Ok(count)
    }
}
