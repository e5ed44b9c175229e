// ==========================================
// 临床轮转排班核心 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod audit;
pub mod notification;
pub mod week;

// 重导出核心类型
pub use assignment::{Assignment, Caller, NewAssignment, PrimaryEvaluatorChange, RotationWeek};
pub use audit::{AuditAction, AuditEntry, AuditRecord};
pub use notification::{NotificationRequest, PrimaryEvaluatorNotice};
pub use week::RotationWeekInfo;
