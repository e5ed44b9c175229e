// ==========================================
// 临床轮转排班核心 - 通知配置读取 Trait
// ==========================================
// 职责: 定义通知模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::notification_settings::NotificationSettings;
use std::error::Error;

// ==========================================
// NotificationConfigReader Trait
// ==========================================
// 用途: 每次发送前读取, 配置修改无需重启
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait NotificationConfigReader: Send + Sync {
    /// 读取主评估人变更通知配置
    ///
    /// # 默认值
    /// - 未配置的键取 NotificationSettings::default() 对应字段
    fn notification_settings(&self) -> Result<NotificationSettings, Box<dyn Error + Send + Sync>>;
}

/// 固定配置（不查库）
#[derive(Debug, Clone, Default)]
pub struct StaticNotificationConfig {
    pub settings: NotificationSettings,
}

impl StaticNotificationConfig {
    pub fn new(settings: NotificationSettings) -> Self {
        Self { settings }
    }
}

impl NotificationConfigReader for StaticNotificationConfig {
    fn notification_settings(&self) -> Result<NotificationSettings, Box<dyn Error + Send + Sync>> {
        Ok(self.settings.clone())
    }
}
