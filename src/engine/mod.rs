// ==========================================
// 临床轮转排班核心 - 引擎层
// ==========================================
// 职责: 实现排班规则, 不拼 SQL
// 说明: 数据访问经由 unit_of_work 中定义的 trait
// ==========================================

pub mod cancellation;
pub mod capabilities;
pub mod conflict_detector;
pub mod evaluation_policy;
pub mod notification;
pub mod primary_evaluator;
pub mod transaction;
pub mod unit_of_work;

// 重导出核心引擎
pub use cancellation::CancellationToken;
pub use capabilities::{NotificationDispatcher, NotificationError, PermissionAuthority, ScheduleDirectory};
pub use conflict_detector::ConflictDetector;
pub use evaluation_policy::EvaluationPolicy;
pub use notification::{NotificationOutcome, PrimaryEvaluatorNotifier};
pub use primary_evaluator::PrimaryEvaluatorInvariant;
pub use transaction::{in_transaction, read_only, IsolationLevel, TransactionRunner};
pub use unit_of_work::{audit_entry_for, AssignmentStore, AuditRecorder, ScheduleUnitOfWork};
