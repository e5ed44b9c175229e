// ==========================================
// 临床轮转排班核心 - 主评估人唯一性
// ==========================================
// 红线: 同一 (rotation_id, week_id) 至多一名主评估人
// 红线: 有带教的格子不得悄然失去唯一的主评估人
// ==========================================
// 说明: 只在事务内的工作单元上操作; 审计由编辑器负责
// ==========================================

use crate::domain::{Assignment, RotationWeek};
use crate::engine::unit_of_work::AssignmentStore;
use crate::repository::error::RepositoryResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryEvaluatorInvariant;

impl PrimaryEvaluatorInvariant {
    pub fn new() -> Self {
        Self
    }

    /// 格子内的现任主评估人（排除 keep_id）
    pub fn current_holders(
        &self,
        store: &dyn AssignmentStore,
        slot: RotationWeek,
        keep_id: Option<i64>,
    ) -> RepositoryResult<Vec<Assignment>> {
        Ok(store
            .find_by_slot(slot)?
            .into_iter()
            .filter(|a| a.is_primary_evaluator && Some(a.id) != keep_id)
            .collect())
    }

    /// 清除格子内除 keep_id 以外的主评估人标记
    ///
    /// 必须先于新主评估人写入执行（提交时部分唯一索引兜底）
    ///
    /// # 返回
    /// 被清除的指派（清除后状态）
    pub fn clear_other_holders(
        &self,
        store: &mut dyn AssignmentStore,
        slot: RotationWeek,
        keep_id: Option<i64>,
    ) -> RepositoryResult<Vec<Assignment>> {
        let holders = self.current_holders(store, slot, keep_id)?;

        let mut cleared = Vec::with_capacity(holders.len());
        for mut holder in holders {
            store.set_primary_flag(holder.id, false)?;
            holder.is_primary_evaluator = false;
            tracing::debug!(
                "PrimaryEvaluatorInvariant: 清除原主评估人 assignment_id={}, rotation_id={}, week_id={}",
                holder.id,
                slot.rotation_id,
                slot.week_id
            );
            cleared.push(holder);
        }
        Ok(cleared)
    }

    /// 指派能否被移除
    ///
    /// - 非主评估人 → true
    /// - 主评估人且格子内还有其他指派 → true
    /// - 唯一的主评估人 → false
    pub fn can_remove(&self, store: &dyn AssignmentStore, assignment: &Assignment) -> RepositoryResult<bool> {
        if !assignment.is_primary_evaluator {
            return Ok(true);
        }

        let others = store
            .find_by_slot(assignment.slot())?
            .into_iter()
            .filter(|a| a.id != assignment.id)
            .count();
        Ok(others > 0)
    }
}
