use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 主评估人变更通知配置
///
/// 存储位置：config_kv（scope_id='global'，key 见 `config_keys`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// 总开关
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// 收件人（有序, 可为空）
    #[serde(default)]
    pub recipients: Vec<String>,

    /// 发件人地址
    #[serde(default = "default_sender")]
    pub sender_address: String,

    /// 邮件主题
    #[serde(default = "default_subject")]
    pub subject: String,

    /// 正文是否为 HTML
    #[serde(default)]
    pub is_html: bool,

    /// 单个收件人发送超时（毫秒）
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

pub const DEFAULT_SENDER_ADDRESS: &str = "noreply@vetmed-schedule.local";
pub const DEFAULT_SUBJECT: &str = "Primary evaluator change";
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 5_000;

fn default_enabled() -> bool {
    true
}

fn default_sender() -> String {
    DEFAULT_SENDER_ADDRESS.to_string()
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

fn default_send_timeout_ms() -> u64 {
    DEFAULT_SEND_TIMEOUT_MS
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            recipients: Vec::new(),
            sender_address: default_sender(),
            subject: default_subject(),
            is_html: false,
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl NotificationSettings {
    /// 单个收件人发送超时（0 视为默认值）
    pub fn send_timeout(&self) -> Duration {
        if self.send_timeout_ms == 0 {
            Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.send_timeout_ms)
        }
    }
}
