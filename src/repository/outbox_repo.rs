// ==========================================
// 临床轮转排班核心 - 通知发件箱仓储
// ==========================================
// 对齐: notification_outbox 表
// 说明: 每个收件人一行, 由外部邮件进程消费并回写状态
// ==========================================

use crate::domain::NotificationRequest;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_SENT: &str = "SENT";
pub const STATUS_FAILED: &str = "FAILED";

// ==========================================
// OutboxMessage - 发件箱消息
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub message_id: String,
    pub recipient: String,
    pub sender_address: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub status: String,
    pub created_at: NaiveDateTime,
}

// ==========================================
// NotificationOutboxRepository
// ==========================================
pub struct NotificationOutboxRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NotificationOutboxRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> SqliteResult<OutboxMessage> {
        let created_at_str: String = row.get(7)?;
        let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?;

        Ok(OutboxMessage {
            message_id: row.get(0)?,
            recipient: row.get(1)?,
            sender_address: row.get(2)?,
            subject: row.get(3)?,
            body: row.get(4)?,
            is_html: row.get::<_, i64>(5)? != 0,
            status: row.get(6)?,
            created_at,
        })
    }

    /// 为单个收件人入队
    ///
    /// # 返回
    /// - `Ok(message_id)`: 新生成的消息 ID
    pub fn enqueue(&self, recipient: &str, request: &NotificationRequest) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let message_id = Uuid::new_v4().to_string();

        conn.execute(
            r#"
            INSERT INTO notification_outbox (
                message_id, recipient, sender_address, subject, body, is_html, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                message_id,
                recipient,
                request.sender_address,
                request.subject,
                request.body,
                if request.is_html { 1 } else { 0 },
                STATUS_PENDING,
                Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(message_id)
    }

    /// 待发送消息（先进先出）
    pub fn list_pending(&self, limit: i32) -> RepositoryResult<Vec<OutboxMessage>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT message_id, recipient, sender_address, subject, body, is_html, status, created_at
            FROM notification_outbox
            WHERE status = ?1
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?2
            "#,
        )?;
        let messages = stmt
            .query_map(params![STATUS_PENDING, limit], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(messages)
    }

    pub fn mark_sent(&self, message_id: &str) -> RepositoryResult<()> {
        self.update_status(message_id, STATUS_SENT)
    }

    pub fn mark_failed(&self, message_id: &str) -> RepositoryResult<()> {
        self.update_status(message_id, STATUS_FAILED)
    }

    fn update_status(&self, message_id: &str, status: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE notification_outbox SET status = ?2 WHERE message_id = ?1",
            params![message_id, status],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "OutboxMessage".to_string(),
                id: message_id.to_string(),
            });
        }
        Ok(())
    }
}
