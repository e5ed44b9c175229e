// ==========================================
// 临床轮转排班核心 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod assignment_repo;
pub mod audit_log_repo;
pub mod directory_repo;
pub mod error;
pub mod outbox_repo;
pub mod sqlite_uow;

// 重导出核心仓储
pub use assignment_repo::AssignmentRepository;
pub use audit_log_repo::{AuditLogRepository, AuditLogWriter};
pub use directory_repo::DirectoryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use outbox_repo::{NotificationOutboxRepository, OutboxMessage};
pub use sqlite_uow::{SqliteTransactionRunner, SqliteUnitOfWork};
