use crate::domain::{AuditAction, AuditEntry, AuditRecord};
use crate::engine::unit_of_work::AuditRecorder;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{SubsecRound, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// recorded_at 存储格式（UTC, 微秒精度）
pub(super) const RECORDED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 写入一条审计记录
pub(super) fn insert_record(
    conn: &Connection,
    action: AuditAction,
    entry: &AuditEntry,
) -> RepositoryResult<AuditRecord> {
    // 与存储格式同为微秒精度, 返回值与回读记录一致
    let recorded_at = Utc::now().naive_utc().trunc_subsecs(6);

    conn.execute(
        r#"
        INSERT INTO schedule_audit_log (
            action, instructor_id, rotation_id, week_id,
            modified_by, related_assignment_id, recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            action.as_str(),
            entry.instructor_id,
            entry.rotation_id,
            entry.week_id,
            entry.modified_by,
            entry.related_assignment_id,
            recorded_at.format(RECORDED_AT_FORMAT).to_string(),
        ],
    )?;

    let record = AuditRecord::from_entry(conn.last_insert_rowid(), action, entry, recorded_at);
    tracing::debug!(
        "AuditLog: {} audit_id={}, rotation_id={}, week_id={}, modified_by={}",
        record.action,
        record.id,
        record.rotation_id,
        record.week_id,
        record.modified_by
    );
    Ok(record)
}

// ==========================================
// AuditLogWriter - 事务内审计写入
// ==========================================
pub struct AuditLogWriter<'c> {
    conn: &'c Connection,
}

impl<'c> AuditLogWriter<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl AuditRecorder for AuditLogWriter<'_> {
    fn record(&mut self, action: AuditAction, entry: &AuditEntry) -> RepositoryResult<AuditRecord> {
        insert_record(self.conn, action, entry)
    }

    fn history_by_assignment(&self, assignment_id: i64) -> RepositoryResult<Vec<AuditRecord>> {
        super::queries::select_by_assignment(self.conn, assignment_id)
    }

    fn history_by_rotation_week(&self, rotation_id: i64, week_id: i64) -> RepositoryResult<Vec<AuditRecord>> {
        super::queries::select_by_rotation_week(self.conn, rotation_id, week_id)
    }
}

// ==========================================
// AuditLogRepository - 审计日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    /// 创建新的审计日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}
