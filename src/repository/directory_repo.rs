// ==========================================
// 临床轮转排班核心 - 目录数据仓储
// ==========================================
// 对齐: rotation / week / person / schedule_admin / rotation_editor 表
// 用途: 通知正文组装（名称解析）、编辑权限判定
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::engine::capabilities::ScheduleDirectory;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// DirectoryRepository - 目录仓储
// ==========================================
pub struct DirectoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DirectoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 维护数据写入（UPSERT）
    // ==========================================

    pub fn upsert_rotation(&self, rotation_id: i64, name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO rotation (rotation_id, name) VALUES (?1, ?2)
             ON CONFLICT(rotation_id) DO UPDATE SET name = excluded.name",
            params![rotation_id, name],
        )?;
        Ok(())
    }

    pub fn upsert_week(&self, week_id: i64, week_num: i32, date_start: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO week (week_id, week_num, date_start) VALUES (?1, ?2, ?3)
             ON CONFLICT(week_id) DO UPDATE SET week_num = excluded.week_num, date_start = excluded.date_start",
            params![week_id, week_num, date_start],
        )?;
        Ok(())
    }

    pub fn upsert_person(
        &self,
        person_id: i64,
        display_name: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO person (person_id, display_name, first_name, last_name, email)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(person_id) DO UPDATE SET
                display_name = excluded.display_name,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                email = excluded.email
            "#,
            params![person_id, display_name, first_name, last_name, email],
        )?;
        Ok(())
    }

    // ==========================================
    // 编辑权限
    // ==========================================

    pub fn grant_schedule_admin(&self, login_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO schedule_admin (login_id) VALUES (?1)",
            params![login_id],
        )?;
        Ok(())
    }

    pub fn grant_rotation_editor(&self, login_id: &str, rotation_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO rotation_editor (login_id, rotation_id) VALUES (?1, ?2)",
            params![login_id, rotation_id],
        )?;
        Ok(())
    }

    /// 撤销轮转编辑权限, 返回是否存在该授权
    pub fn revoke_rotation_editor(&self, login_id: &str, rotation_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM rotation_editor WHERE login_id = ?1 AND rotation_id = ?2",
            params![login_id, rotation_id],
        )?;
        Ok(rows > 0)
    }

    pub fn is_schedule_admin(&self, login_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM schedule_admin WHERE login_id = ?1",
                params![login_id],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    pub fn is_rotation_editor(&self, login_id: &str, rotation_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM rotation_editor WHERE login_id = ?1 AND rotation_id = ?2",
                params![login_id, rotation_id],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }
}

// ==========================================
// ScheduleDirectory Trait 实现
// ==========================================
impl ScheduleDirectory for DirectoryRepository {
    fn rotation_name(&self, rotation_id: i64) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let name = conn
            .query_row(
                "SELECT name FROM rotation WHERE rotation_id = ?1",
                params![rotation_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(name.filter(|n| !n.trim().is_empty()))
    }

    fn week_number(&self, week_id: i64) -> RepositoryResult<Option<i32>> {
        let conn = self.get_conn()?;
        let week_num = conn
            .query_row(
                "SELECT week_num FROM week WHERE week_id = ?1",
                params![week_id],
                |row| row.get::<_, i32>(0),
            )
            .optional()?;
        Ok(week_num)
    }

    /// display_name 优先, 否则 "名 姓"; 都为空 → None
    fn person_display_name(&self, person_id: i64) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                "SELECT display_name, first_name, last_name FROM person WHERE person_id = ?1",
                params![person_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((display_name, first_name, last_name)) = row else {
            return Ok(None);
        };

        if let Some(name) = display_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            return Ok(Some(name));
        }

        let full_name = [first_name, last_name]
            .into_iter()
            .flatten()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Some(full_name).filter(|n| !n.is_empty()))
    }
}
