// ==========================================
// 临床轮转排班核心 - 协作方适配器
// ==========================================
// 职责: 实现 Engine 层定义的 PermissionAuthority / NotificationDispatcher trait
// 架构: 依赖倒置 - 应用层实现 Engine 层定义的接口
// ==========================================

use async_trait::async_trait;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::{Caller, NotificationRequest};
use crate::engine::cancellation::CancellationToken;
use crate::engine::capabilities::{NotificationDispatcher, NotificationError, PermissionAuthority};
use crate::repository::directory_repo::DirectoryRepository;
use crate::repository::outbox_repo::NotificationOutboxRepository;

// ==========================================
// SqlitePermissionAuthority - 基于授权表的编辑权限
// ==========================================
// 规则: schedule_admin 可编辑全部轮转; 否则需 rotation_editor 授权
pub struct SqlitePermissionAuthority {
    directory: Arc<DirectoryRepository>,
}

impl SqlitePermissionAuthority {
    pub fn new(directory: Arc<DirectoryRepository>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl PermissionAuthority for SqlitePermissionAuthority {
    async fn has_edit_permission_for_rotation(
        &self,
        caller: &Caller,
        rotation_id: i64,
        cancel: &CancellationToken,
    ) -> ApiResult<bool> {
        cancel.check()?;

        if caller.login_id.trim().is_empty() {
            return Ok(false);
        }
        if self.directory.is_schedule_admin(&caller.login_id)? {
            return Ok(true);
        }
        Ok(self.directory.is_rotation_editor(&caller.login_id, rotation_id)?)
    }
}

// ==========================================
// OutboxNotificationDispatcher - 发件箱投递
// ==========================================
// 每个收件人写入 notification_outbox 一行, 由外部邮件进程实际发送
pub struct OutboxNotificationDispatcher {
    outbox: Arc<NotificationOutboxRepository>,
}

impl OutboxNotificationDispatcher {
    pub fn new(outbox: Arc<NotificationOutboxRepository>) -> Self {
        Self { outbox }
    }
}

#[async_trait]
impl NotificationDispatcher for OutboxNotificationDispatcher {
    async fn send(&self, recipient: &str, request: &NotificationRequest) -> Result<(), NotificationError> {
        // SQLite 写入放到阻塞线程池, 调用方的超时才能生效
        let outbox = Arc::clone(&self.outbox);
        let owned_recipient = recipient.to_string();
        let owned_request = request.clone();
        let enqueued = tokio::task::spawn_blocking(move || outbox.enqueue(&owned_recipient, &owned_request))
            .await
            .map_err(|e| NotificationError::Transport(format!("入队任务异常: {}", e)))?;

        match enqueued {
            Ok(message_id) => {
                tracing::debug!(
                    "OutboxNotificationDispatcher: 通知已入队 - message_id={}, recipient={}",
                    message_id,
                    recipient
                );
                Ok(())
            }
            Err(e) => Err(NotificationError::Transport(e.to_string())),
        }
    }
}

// ==========================================
// LoggingNotificationDispatcher - 仅写日志
// ==========================================
// 用于未接入邮件系统的部署
#[derive(Debug, Default)]
pub struct LoggingNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingNotificationDispatcher {
    async fn send(&self, recipient: &str, request: &NotificationRequest) -> Result<(), NotificationError> {
        tracing::info!(
            recipient = recipient,
            sender = %request.sender_address,
            subject = %request.subject,
            is_html = request.is_html,
            "主评估人变更通知: {}",
            request.body
        );
        Ok(())
    }
}
