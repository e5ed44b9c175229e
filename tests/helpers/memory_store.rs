// ==========================================
// 内存工作单元 - 用于集成测试
// ==========================================
// 职责: 以内存状态替代 SQLite, 验证编辑器逻辑
// 说明:
// - 事务 = 在副本上执行主体, 成功且未取消才替换原状态
// - 模拟部分唯一索引: 同一格出现第二名主评估人时报错
// ==========================================

use chrono::Utc;
use rotation_scheduler::api::{ApiError, ApiResult};
use rotation_scheduler::domain::{
    Assignment, AuditAction, AuditEntry, AuditRecord, NewAssignment, RotationWeek,
};
use rotation_scheduler::engine::{
    AssignmentStore, AuditRecorder, CancellationToken, IsolationLevel, ScheduleUnitOfWork,
    TransactionRunner,
};
use rotation_scheduler::engine::transaction::UnitOfWorkBody;
use rotation_scheduler::repository::{RepositoryError, RepositoryResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// 内存状态
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub assignments: BTreeMap<i64, Assignment>,
    pub audit: Vec<AuditRecord>,
    pub fail_audit: bool,
    next_assignment_id: i64,
    next_audit_id: i64,
}

impl MemoryState {
    /// 直接写入一条指派（绕过编辑器, 用于准备数据）
    pub fn seed(&mut self, instructor_id: i64, rotation_id: i64, week_id: i64, primary: bool) -> Assignment {
        self.next_assignment_id += 1;
        let assignment = Assignment {
            id: self.next_assignment_id,
            instructor_id,
            rotation_id,
            week_id,
            is_primary_evaluator: primary,
            role: None,
        };
        self.assignments.insert(assignment.id, assignment.clone());
        assignment
    }

    pub fn primaries_in(&self, rotation_id: i64, week_id: i64) -> Vec<&Assignment> {
        self.assignments
            .values()
            .filter(|a| a.rotation_id == rotation_id && a.week_id == week_id && a.is_primary_evaluator)
            .collect()
    }

    pub fn audit_actions(&self) -> Vec<AuditAction> {
        self.audit.iter().map(|r| r.action).collect()
    }

    fn check_primary_unique(&self, slot: RotationWeek, candidate_id: i64) -> RepositoryResult<()> {
        let clash = self.assignments.values().any(|a| {
            a.id != candidate_id && a.is_primary_evaluator && a.slot() == slot
        });
        if clash {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "ux_assignment_primary_slot: rotation_id={}, week_id={}",
                slot.rotation_id, slot.week_id
            )));
        }
        Ok(())
    }

    fn newest_first(mut records: Vec<AuditRecord>) -> Vec<AuditRecord> {
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records
    }
}

impl AssignmentStore for MemoryState {
    fn find_by_id(&self, assignment_id: i64) -> RepositoryResult<Option<Assignment>> {
        Ok(self.assignments.get(&assignment_id).cloned())
    }

    fn find_by_instructor_in_weeks(
        &self,
        instructor_id: i64,
        week_ids: &BTreeSet<i64>,
        exclude_rotation_id: Option<i64>,
    ) -> RepositoryResult<Vec<Assignment>> {
        let mut found: Vec<Assignment> = self
            .assignments
            .values()
            .filter(|a| a.instructor_id == instructor_id && week_ids.contains(&a.week_id))
            .filter(|a| Some(a.rotation_id) != exclude_rotation_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.week_id, a.rotation_id, a.id));
        Ok(found)
    }

    fn find_by_slot(&self, slot: RotationWeek) -> RepositoryResult<Vec<Assignment>> {
        Ok(self.assignments.values().filter(|a| a.slot() == slot).cloned().collect())
    }

    fn insert(&mut self, new_assignment: &NewAssignment) -> RepositoryResult<Assignment> {
        let slot = RotationWeek {
            rotation_id: new_assignment.rotation_id,
            week_id: new_assignment.week_id,
        };
        if new_assignment.is_primary_evaluator {
            self.check_primary_unique(slot, 0)?;
        }

        self.next_assignment_id += 1;
        let assignment = Assignment {
            id: self.next_assignment_id,
            instructor_id: new_assignment.instructor_id,
            rotation_id: new_assignment.rotation_id,
            week_id: new_assignment.week_id,
            is_primary_evaluator: new_assignment.is_primary_evaluator,
            role: new_assignment.role.clone(),
        };
        self.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    fn set_primary_flag(&mut self, assignment_id: i64, is_primary: bool) -> RepositoryResult<()> {
        let slot = match self.assignments.get(&assignment_id) {
            Some(a) => a.slot(),
            None => {
                return Err(RepositoryError::NotFound {
                    entity: "Assignment".to_string(),
                    id: assignment_id.to_string(),
                })
            }
        };
        if is_primary {
            self.check_primary_unique(slot, assignment_id)?;
        }
        if let Some(a) = self.assignments.get_mut(&assignment_id) {
            a.is_primary_evaluator = is_primary;
        }
        Ok(())
    }

    fn delete(&mut self, assignment_id: i64) -> RepositoryResult<bool> {
        Ok(self.assignments.remove(&assignment_id).is_some())
    }
}

impl AuditRecorder for MemoryState {
    fn record(&mut self, action: AuditAction, entry: &AuditEntry) -> RepositoryResult<AuditRecord> {
        if self.fail_audit {
            return Err(RepositoryError::DatabaseQueryError("audit store unavailable".to_string()));
        }
        self.next_audit_id += 1;
        let record = AuditRecord::from_entry(self.next_audit_id, action, entry, Utc::now().naive_utc());
        self.audit.push(record.clone());
        Ok(record)
    }

    fn history_by_assignment(&self, assignment_id: i64) -> RepositoryResult<Vec<AuditRecord>> {
        Ok(Self::newest_first(
            self.audit
                .iter()
                .filter(|r| r.related_assignment_id == Some(assignment_id))
                .cloned()
                .collect(),
        ))
    }

    fn history_by_rotation_week(&self, rotation_id: i64, week_id: i64) -> RepositoryResult<Vec<AuditRecord>> {
        Ok(Self::newest_first(
            self.audit
                .iter()
                .filter(|r| r.rotation_id == rotation_id && r.week_id == week_id)
                .cloned()
                .collect(),
        ))
    }
}

impl ScheduleUnitOfWork for MemoryState {
    fn assignments(&mut self) -> &mut dyn AssignmentStore {
        self
    }

    fn audit(&mut self) -> &mut dyn AuditRecorder {
        self
    }
}

// ==========================================
// DirectTransactionRunner - 直接执行的事务策略
// ==========================================
#[derive(Default)]
pub struct DirectTransactionRunner {
    state: Mutex<MemoryState>,
    pub committed: Mutex<usize>,
    pub rolled_back: Mutex<usize>,
}

impl DirectTransactionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }
}

impl TransactionRunner for DirectTransactionRunner {
    fn run_in_transaction(
        &self,
        _isolation: IsolationLevel,
        cancel: &CancellationToken,
        body: UnitOfWorkBody<'_>,
    ) -> ApiResult<()> {
        cancel.check()?;

        let mut state = self
            .state
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let mut working = state.clone();

        let result = body(&mut working).and_then(|_| cancel.check());
        match result {
            Ok(()) => {
                *state = working;
                *self.committed.lock().unwrap() += 1;
                Ok(())
            }
            Err(e) => {
                *self.rolled_back.lock().unwrap() += 1;
                Err(e)
            }
        }
    }

    fn run_read_only(&self, body: UnitOfWorkBody<'_>) -> ApiResult<()> {
        let mut view = self
            .state
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?
            .clone();
        body(&mut view)
    }
}
