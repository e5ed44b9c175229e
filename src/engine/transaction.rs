// ==========================================
// 临床轮转排班核心 - 事务策略
// ==========================================
// 职责: 把“工作单元主体”包进事务执行, 可替换
// 生产: SqliteTransactionRunner (BEGIN IMMEDIATE)
// 测试: 直接执行主体, 无需真实事务存储
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::engine::cancellation::CancellationToken;
use crate::engine::unit_of_work::ScheduleUnitOfWork;

/// 隔离级别（只读查询走 run_read_only, 不经过此处）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    /// 可串行化: 读-检查-写 序列期间持有写锁
    Serializable,
}

/// 工作单元主体
pub type UnitOfWorkBody<'a> = &'a mut dyn FnMut(&mut dyn ScheduleUnitOfWork) -> ApiResult<()>;

/// 事务策略 Trait
///
/// # 实现约束
/// - run_in_transaction: 主体返回 Err 或提交前已取消 → 回滚, 不留部分写入
/// - run_read_only: 不加写锁, 主体内不得写入
pub trait TransactionRunner: Send + Sync {
    fn run_in_transaction(
        &self,
        isolation: IsolationLevel,
        cancel: &CancellationToken,
        body: UnitOfWorkBody<'_>,
    ) -> ApiResult<()>;

    fn run_read_only(&self, body: UnitOfWorkBody<'_>) -> ApiResult<()>;
}

/// 在事务内执行主体并取回结果
pub fn in_transaction<T, F>(
    runner: &dyn TransactionRunner,
    isolation: IsolationLevel,
    cancel: &CancellationToken,
    body: F,
) -> ApiResult<T>
where
    F: FnOnce(&mut dyn ScheduleUnitOfWork) -> ApiResult<T>,
{
    let mut body = Some(body);
    let mut output = None;
    runner.run_in_transaction(isolation, cancel, &mut |uow| {
        let f = body
            .take()
            .ok_or_else(|| ApiError::InternalError("事务主体被重复执行".to_string()))?;
        output = Some(f(uow)?);
        Ok(())
    })?;
    output.ok_or_else(|| ApiError::InternalError("事务主体未执行".to_string()))
}

/// 只读执行主体并取回结果
pub fn read_only<T, F>(runner: &dyn TransactionRunner, body: F) -> ApiResult<T>
where
    F: FnOnce(&mut dyn ScheduleUnitOfWork) -> ApiResult<T>,
{
    let mut body = Some(body);
    let mut output = None;
    runner.run_read_only(&mut |uow| {
        let f = body
            .take()
            .ok_or_else(|| ApiError::InternalError("查询主体被重复执行".to_string()))?;
        output = Some(f(uow)?);
        Ok(())
    })?;
    output.ok_or_else(|| ApiError::InternalError("查询主体未执行".to_string()))
}
