// ==========================================
// 临床轮转排班核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::notification_config_trait::NotificationConfigReader;
use crate::config::notification_settings::{
    NotificationSettings, DEFAULT_SEND_TIMEOUT_MS, DEFAULT_SENDER_ADDRESS, DEFAULT_SUBJECT,
};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 通知配置 =====

    /// 收件人列表
    ///
    /// # 说明
    /// 配置格式为 JSON 数组: ["a@vet.local", "b@vet.local"]
    /// 格式错误时告警并视为空列表（不发送）
    pub fn get_notification_recipients(&self) -> ConfigResult<Vec<String>> {
        let value = self.get_config_or_default(config_keys::NOTIFY_RECIPIENTS, "[]")?;
        let recipients: Vec<String> = serde_json::from_str(&value).unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::NOTIFY_RECIPIENTS,
                raw_value = %value,
                "收件人配置格式错误，使用空列表"
            );
            Vec::new()
        });

        Ok(recipients
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect())
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

// ==========================================
// NotificationConfigReader Trait 实现
// ==========================================
impl NotificationConfigReader for ConfigManager {
    fn notification_settings(&self) -> ConfigResult<NotificationSettings> {
        let enabled = parse_bool(&self.get_config_or_default(config_keys::NOTIFY_ENABLED, "true")?, true);
        let recipients = self.get_notification_recipients()?;
        let sender_address = self.get_config_or_default(config_keys::NOTIFY_SENDER, DEFAULT_SENDER_ADDRESS)?;
        let subject = self.get_config_or_default(config_keys::NOTIFY_SUBJECT, DEFAULT_SUBJECT)?;
        let is_html = parse_bool(&self.get_config_or_default(config_keys::NOTIFY_IS_HTML, "false")?, false);
        let send_timeout_ms = self
            .get_config_or_default(config_keys::NOTIFY_SEND_TIMEOUT_MS, &DEFAULT_SEND_TIMEOUT_MS.to_string())?
            .parse::<u64>()
            .unwrap_or(DEFAULT_SEND_TIMEOUT_MS);

        Ok(NotificationSettings {
            enabled,
            recipients,
            sender_address,
            subject,
            is_html,
            send_timeout_ms,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 主评估人变更通知
    pub const NOTIFY_ENABLED: &str = "notification.enabled";
    pub const NOTIFY_RECIPIENTS: &str = "notification.primary_evaluator.recipients"; // JSON 数组
    pub const NOTIFY_SENDER: &str = "notification.primary_evaluator.sender";
    pub const NOTIFY_SUBJECT: &str = "notification.primary_evaluator.subject";
    pub const NOTIFY_IS_HTML: &str = "notification.primary_evaluator.is_html";
    pub const NOTIFY_SEND_TIMEOUT_MS: &str = "notification.send_timeout_ms";
}
