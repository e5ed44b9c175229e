// ==========================================
// 临床轮转排班核心 - 排班审计数据仓储
// ==========================================
// 对齐: schedule_audit_log 表
// 红线: 所有写入必须记录, 只追加不修改
// ==========================================
// 结构:
// - AuditLogWriter: 借用事务连接, 供工作单元在事务内写入
// - AuditLogRepository: 持有共享连接, 供历史查询
// ==========================================

mod core;
mod queries;


pub use core::{AuditLogRepository, AuditLogWriter};
