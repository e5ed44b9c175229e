// ==========================================
// 临床轮转排班核心 - SQLite 事务策略
// ==========================================
// 红线: 主体失败或提交前取消 → 整体回滚, 不留部分写入
// 说明:
// - Serializable → BEGIN IMMEDIATE（冲突检查读取前即持有写锁）
// - 只读查询直接在连接上执行, 不开写事务
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::engine::cancellation::CancellationToken;
use crate::engine::transaction::{IsolationLevel, TransactionRunner, UnitOfWorkBody};
use crate::engine::unit_of_work::{AssignmentStore, AuditRecorder, ScheduleUnitOfWork};
use crate::repository::assignment_repo::AssignmentRepository;
use crate::repository::audit_log_repo::AuditLogWriter;
use rusqlite::{Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteUnitOfWork - 绑定到单个连接/事务的工作单元
// ==========================================
pub struct SqliteUnitOfWork<'c> {
    assignments: AssignmentRepository<'c>,
    audit: AuditLogWriter<'c>,
}

impl<'c> SqliteUnitOfWork<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            assignments: AssignmentRepository::new(conn),
            audit: AuditLogWriter::new(conn),
        }
    }
}

impl ScheduleUnitOfWork for SqliteUnitOfWork<'_> {
    fn assignments(&mut self) -> &mut dyn AssignmentStore {
        &mut self.assignments
    }

    fn audit(&mut self) -> &mut dyn AuditRecorder {
        &mut self.audit
    }
}

// ==========================================
// SqliteTransactionRunner
// ==========================================
pub struct SqliteTransactionRunner {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTransactionRunner {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ApiResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("锁获取失败: {}", e)))
    }
}

fn behavior_for(isolation: IsolationLevel) -> TransactionBehavior {
    match isolation {
        IsolationLevel::Serializable => TransactionBehavior::Immediate,
    }
}

impl TransactionRunner for SqliteTransactionRunner {
    fn run_in_transaction(
        &self,
        isolation: IsolationLevel,
        cancel: &CancellationToken,
        body: UnitOfWorkBody<'_>,
    ) -> ApiResult<()> {
        cancel.check()?;

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(behavior_for(isolation))
            .map_err(|e| ApiError::DatabaseTransactionError(format!("开启事务失败: {}", e)))?;

        {
            let mut uow = SqliteUnitOfWork::new(&tx);
            // 出错时 tx 随作用域结束自动回滚
            body(&mut uow)?;
        }

        if cancel.is_cancelled() {
            tx.rollback()
                .map_err(|e| ApiError::DatabaseTransactionError(format!("回滚失败: {}", e)))?;
            tracing::info!("SqliteTransactionRunner: 提交前已取消，事务已回滚");
            return Err(ApiError::Cancelled);
        }

        tx.commit()
            .map_err(|e| ApiError::DatabaseTransactionError(format!("提交失败: {}", e)))?;
        Ok(())
    }

    fn run_read_only(&self, body: UnitOfWorkBody<'_>) -> ApiResult<()> {
        let conn = self.get_conn()?;
        let mut uow = SqliteUnitOfWork::new(&conn);
        body(&mut uow)
    }
}
