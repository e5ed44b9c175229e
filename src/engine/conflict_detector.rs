// ==========================================
// 临床轮转排班核心 - 排班冲突检测
// ==========================================
// 职责: 查找带教老师在给定周集合内的既有指派
// 用途: AddInstructor 硬性前置校验 (不排除任何轮转)
//       调用方预警查询 (可排除当前轮转, 不阻断)
// 红线: 只读, 无副作用
// ==========================================

use std::collections::BTreeSet;

use tracing::instrument;

use crate::domain::Assignment;
use crate::engine::unit_of_work::AssignmentStore;
use crate::repository::error::RepositoryResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// 查找冲突指派
    ///
    /// # 参数
    /// - instructor_id: 带教老师ID
    /// - week_ids: 周ID集合（空集合直接返回空）
    /// - exclude_rotation_id: 需要排除的轮转（可选）
    ///
    /// # 返回
    /// 按 (week_id, rotation_id, id) 排序的既有指派
    #[instrument(skip(self, store, week_ids), fields(weeks = week_ids.len()))]
    pub fn find_conflicts(
        &self,
        store: &dyn AssignmentStore,
        instructor_id: i64,
        week_ids: &BTreeSet<i64>,
        exclude_rotation_id: Option<i64>,
    ) -> RepositoryResult<Vec<Assignment>> {
        if week_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conflicts = store.find_by_instructor_in_weeks(instructor_id, week_ids, exclude_rotation_id)?;
        conflicts.sort_by_key(|a| (a.week_id, a.rotation_id, a.id));

        if !conflicts.is_empty() {
            tracing::debug!(
                "ConflictDetector: instructor_id={} 命中 {} 条既有指派",
                instructor_id,
                conflicts.len()
            );
        }
        Ok(conflicts)
    }
}
