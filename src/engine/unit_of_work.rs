// ==========================================
// 临床轮转排班核心 - 事务内工作单元
// ==========================================
// 职责: 定义编辑器在事务内可见的数据视图
// 说明: Engine 层定义 trait，Repository 层提供 SQLite 实现
//       测试可替换为内存实现
// ==========================================

use std::collections::BTreeSet;

use crate::domain::{Assignment, AuditAction, AuditEntry, AuditRecord, NewAssignment, RotationWeek};
use crate::repository::error::RepositoryResult;

// ==========================================
// AssignmentStore - 指派存取
// ==========================================
pub trait AssignmentStore {
    fn find_by_id(&self, assignment_id: i64) -> RepositoryResult<Option<Assignment>>;

    /// 带教老师在给定周集合内的全部指派（可排除某一轮转）
    ///
    /// 排序: (week_id, rotation_id, id)
    fn find_by_instructor_in_weeks(
        &self,
        instructor_id: i64,
        week_ids: &BTreeSet<i64>,
        exclude_rotation_id: Option<i64>,
    ) -> RepositoryResult<Vec<Assignment>>;

    /// 格子内全部指派, 按 id 升序
    fn find_by_slot(&self, slot: RotationWeek) -> RepositoryResult<Vec<Assignment>>;

    fn insert(&mut self, new_assignment: &NewAssignment) -> RepositoryResult<Assignment>;

    fn set_primary_flag(&mut self, assignment_id: i64, is_primary: bool) -> RepositoryResult<()>;

    /// 删除指派, 返回是否实际删除
    fn delete(&mut self, assignment_id: i64) -> RepositoryResult<bool>;
}

// ==========================================
// AuditRecorder - 审计记录
// ==========================================
// 红线: 只追加, 不更新, 不删除
pub trait AuditRecorder {
    fn record(&mut self, action: AuditAction, entry: &AuditEntry) -> RepositoryResult<AuditRecord>;

    /// 按关联指派查询, 最新在前
    fn history_by_assignment(&self, assignment_id: i64) -> RepositoryResult<Vec<AuditRecord>>;

    /// 按格子查询, 最新在前
    fn history_by_rotation_week(&self, rotation_id: i64, week_id: i64) -> RepositoryResult<Vec<AuditRecord>>;

    fn log_added(&mut self, entry: &AuditEntry) -> RepositoryResult<AuditRecord> {
        self.record(AuditAction::InstructorAdded, entry)
    }

    fn log_removed(&mut self, entry: &AuditEntry) -> RepositoryResult<AuditRecord> {
        self.record(AuditAction::InstructorRemoved, entry)
    }

    fn log_primary_evaluator_set(&mut self, entry: &AuditEntry) -> RepositoryResult<AuditRecord> {
        self.record(AuditAction::PrimaryEvaluatorSet, entry)
    }

    fn log_primary_evaluator_unset(&mut self, entry: &AuditEntry) -> RepositoryResult<AuditRecord> {
        self.record(AuditAction::PrimaryEvaluatorUnset, entry)
    }
}

// ==========================================
// ScheduleUnitOfWork - 工作单元
// ==========================================
pub trait ScheduleUnitOfWork {
    fn assignments(&mut self) -> &mut dyn AssignmentStore;
    fn audit(&mut self) -> &mut dyn AuditRecorder;
}

/// 由指派 + 操作人构造审计内容
pub fn audit_entry_for(assignment: &Assignment, modified_by: &str) -> AuditEntry {
    AuditEntry {
        instructor_id: assignment.instructor_id,
        rotation_id: assignment.rotation_id,
        week_id: assignment.week_id,
        modified_by: modified_by.to_string(),
        related_assignment_id: Some(assignment.id),
    }
}
