// ==========================================
// 临床轮转排班核心 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod notification_config_trait;
pub mod notification_settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use notification_config_trait::{NotificationConfigReader, StaticNotificationConfig};
pub use notification_settings::NotificationSettings;
