// ==========================================
// 临床轮转排班核心 - 应用层
// ==========================================
// 职责: 组装仓储、引擎与API, 提供协作方的生产实现
// ==========================================

pub mod adapters;
pub mod state;

// 重导出
pub use adapters::{LoggingNotificationDispatcher, OutboxNotificationDispatcher, SqlitePermissionAuthority};
pub use state::{get_default_db_path, AppState, AppStatus};
