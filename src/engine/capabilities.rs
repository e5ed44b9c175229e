// ==========================================
// 临床轮转排班核心 - 外部协作方接口
// ==========================================
// 职责: 定义编辑器依赖的能力集合 (授权 / 通知 / 目录查询)
// 说明: Engine 层定义 trait，由应用层注入具体实现
// ==========================================

use async_trait::async_trait;
use thiserror::Error;

use crate::api::error::ApiResult;
use crate::domain::{Caller, NotificationRequest};
use crate::engine::cancellation::CancellationToken;
use crate::repository::error::RepositoryResult;

// ==========================================
// PermissionAuthority - 授权
// ==========================================
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    /// 调用方是否拥有该轮转的编辑权限
    async fn has_edit_permission_for_rotation(
        &self,
        caller: &Caller,
        rotation_id: i64,
        cancel: &CancellationToken,
    ) -> ApiResult<bool>;
}

// ==========================================
// NotificationDispatcher - 通知发送
// ==========================================

/// 通知发送错误（不会越过编辑器向调用方传播）
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("通知发送失败: {0}")]
    Transport(String),

    #[error("通知发送超时: {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("收件人被拒绝: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// 向单个收件人发送一次
    async fn send(&self, recipient: &str, request: &NotificationRequest) -> Result<(), NotificationError>;
}

// ==========================================
// ScheduleDirectory - 目录查询 (只读)
// ==========================================
// 用于组装通知正文; 解析不到时返回 None, 由调用方降级
pub trait ScheduleDirectory: Send + Sync {
    fn rotation_name(&self, rotation_id: i64) -> RepositoryResult<Option<String>>;

    /// week_id → 周序号
    fn week_number(&self, week_id: i64) -> RepositoryResult<Option<i32>>;

    fn person_display_name(&self, person_id: i64) -> RepositoryResult<Option<String>>;
}
