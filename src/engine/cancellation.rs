// ==========================================
// 临床轮转排班核心 - 取消信号
// ==========================================
// 提交前取消 → 整体回滚; 提交后取消无定义效果
// ==========================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};

/// 协作式取消信号（可克隆, 克隆体共享同一状态）
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发出取消
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// 已取消时返回 ApiError::Cancelled
    pub fn check(&self) -> ApiResult<()> {
        if self.is_cancelled() {
            Err(ApiError::Cancelled)
        } else {
            Ok(())
        }
    }
}
