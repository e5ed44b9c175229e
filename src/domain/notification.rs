// ==========================================
// 临床轮转排班核心 - 通知请求
// ==========================================
// 仅在主评估人被移除/替换时构造, 发送尝试后即丢弃
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipients: Vec<String>, // 有序收件人列表
    pub subject: String,
    pub body: String,
    pub sender_address: String,
    pub is_html: bool,
}

// ==========================================
// PrimaryEvaluatorNotice - 通知事件
// ==========================================
// 提交后由编辑器交给通知组件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryEvaluatorNotice {
    /// 仅移除 (无 "replaced by" 子句)
    Removed {
        removed_instructor_id: i64,
        rotation_id: i64,
        week_id: i64,
    },
    /// 被替换
    Replaced {
        removed_instructor_id: i64,
        new_instructor_id: i64,
        rotation_id: i64,
        week_id: i64,
    },
}

impl PrimaryEvaluatorNotice {
    pub fn rotation_id(&self) -> i64 {
        match self {
            PrimaryEvaluatorNotice::Removed { rotation_id, .. }
            | PrimaryEvaluatorNotice::Replaced { rotation_id, .. } => *rotation_id,
        }
    }

    pub fn week_id(&self) -> i64 {
        match self {
            PrimaryEvaluatorNotice::Removed { week_id, .. }
            | PrimaryEvaluatorNotice::Replaced { week_id, .. } => *week_id,
        }
    }

    pub fn removed_instructor_id(&self) -> i64 {
        match self {
            PrimaryEvaluatorNotice::Removed {
                removed_instructor_id,
                ..
            }
            | PrimaryEvaluatorNotice::Replaced {
                removed_instructor_id,
                ..
            } => *removed_instructor_id,
        }
    }
}
