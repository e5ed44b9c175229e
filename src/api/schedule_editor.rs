// ==========================================
// 临床轮转排班核心 - 排班编辑 API
// ==========================================
// 职责: 新增带教 / 移除带教 / 主评估人切换 / 可移除判定
// 流程: 授权 → 事务(冲突检测 / 主评估人唯一性 / 指派写入 / 审计) → 提交 → 通知
// 红线:
// - 审计与指派变更同一事务, 审计失败则整体回滚
// - 通知仅在提交后发送, 失败只记日志
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::api::error::{validate_positive_id, validate_week_ids, ApiError, ApiResult};
use crate::domain::{
    Assignment, AuditRecord, Caller, NewAssignment, PrimaryEvaluatorChange, PrimaryEvaluatorNotice,
    RotationWeek,
};
use crate::engine::cancellation::CancellationToken;
use crate::engine::capabilities::PermissionAuthority;
use crate::engine::conflict_detector::ConflictDetector;
use crate::engine::notification::PrimaryEvaluatorNotifier;
use crate::engine::primary_evaluator::PrimaryEvaluatorInvariant;
use crate::engine::transaction::{in_transaction, read_only, IsolationLevel, TransactionRunner};
use crate::engine::unit_of_work::{audit_entry_for, ScheduleUnitOfWork};

// ==========================================
// ScheduleEditor - 排班编辑器
// ==========================================

/// 排班编辑器
///
/// 职责：
/// 1. 所有指派写入的唯一入口
/// 2. 写入前按轮转授权
/// 3. 写入与审计在同一可串行化事务内完成
/// 4. 主评估人被移除/替换时提交后发送通知
pub struct ScheduleEditor {
    runner: Arc<dyn TransactionRunner>,
    permissions: Arc<dyn PermissionAuthority>,
    notifier: Arc<PrimaryEvaluatorNotifier>,
    conflict_detector: ConflictDetector,
    invariant: PrimaryEvaluatorInvariant,
}

impl ScheduleEditor {
    /// 创建新的ScheduleEditor实例
    pub fn new(
        runner: Arc<dyn TransactionRunner>,
        permissions: Arc<dyn PermissionAuthority>,
        notifier: Arc<PrimaryEvaluatorNotifier>,
    ) -> Self {
        Self {
            runner,
            permissions,
            notifier,
            conflict_detector: ConflictDetector::new(),
            invariant: PrimaryEvaluatorInvariant::new(),
        }
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 为带教老师新增一个或多个周的指派
    ///
    /// # 参数
    /// - caller: 当前操作人
    /// - instructor_id: 带教老师ID
    /// - rotation_id: 轮转ID
    /// - week_ids: 周ID列表（不可为空, 重复项合并）
    /// - is_primary_evaluator: 是否设为主评估人（逐格生效）
    /// - cancel: 取消信号
    ///
    /// # 返回
    /// - Ok(Vec<Assignment>): 新建指派, 按 week_id 升序
    /// - Err(ApiError::ScheduleConflict): 该老师在任一目标周已有指派, 不写入任何数据
    pub async fn add_instructor(
        &self,
        caller: &Caller,
        instructor_id: i64,
        rotation_id: i64,
        week_ids: &[i64],
        is_primary_evaluator: bool,
        cancel: &CancellationToken,
    ) -> ApiResult<Vec<Assignment>> {
        validate_positive_id("instructor_id", instructor_id)?;
        validate_positive_id("rotation_id", rotation_id)?;
        validate_week_ids(week_ids)?;

        self.authorize(caller, rotation_id, cancel).await?;

        let weeks: BTreeSet<i64> = week_ids.iter().copied().collect();
        let detector = self.conflict_detector;
        let invariant = self.invariant;
        let modified_by = caller.login_id.as_str();

        let result = in_transaction(self.runner.as_ref(), IsolationLevel::Serializable, cancel, |uow| {
            let conflicts = detector.find_conflicts(uow.assignments(), instructor_id, &weeks, None)?;
            if !conflicts.is_empty() {
                return Err(ApiError::ScheduleConflict {
                    instructor_id,
                    conflicts: conflicts.iter().map(Assignment::slot).collect(),
                });
            }

            // 第一轮: 逐周写入指派 + InstructorAdded
            // 原主评估人必须先于新指派写入前清除（部分唯一索引）
            let mut created = Vec::with_capacity(weeks.len());
            let mut prior_holders = Vec::with_capacity(weeks.len());
            for &week_id in &weeks {
                let slot = RotationWeek { rotation_id, week_id };
                let cleared = if is_primary_evaluator {
                    invariant.clear_other_holders(uow.assignments(), slot, None)?
                } else {
                    Vec::new()
                };

                let assignment = uow.assignments().insert(&NewAssignment {
                    instructor_id,
                    rotation_id,
                    week_id,
                    is_primary_evaluator,
                    role: None,
                })?;
                uow.audit().log_added(&audit_entry_for(&assignment, modified_by))?;

                created.push(assignment);
                prior_holders.push(cleared);
            }

            // 第二轮: 主评估人交接审计
            let mut notices = Vec::new();
            for (assignment, cleared) in created.iter().zip(prior_holders) {
                if !assignment.is_primary_evaluator {
                    continue;
                }
                for holder in &cleared {
                    uow.audit()
                        .log_primary_evaluator_unset(&audit_entry_for(holder, modified_by))?;
                    notices.push(PrimaryEvaluatorNotice::Replaced {
                        removed_instructor_id: holder.instructor_id,
                        new_instructor_id: assignment.instructor_id,
                        rotation_id: assignment.rotation_id,
                        week_id: assignment.week_id,
                    });
                }
                uow.audit()
                    .log_primary_evaluator_set(&audit_entry_for(assignment, modified_by))?;
            }

            Ok((created, notices))
        });

        let (created, notices) = match result {
            Ok(output) => output,
            Err(e) => {
                self.log_rejection("add_instructor", caller, &e);
                return Err(e);
            }
        };

        tracing::info!(
            "ScheduleEditor: 新增带教完成 - instructor_id={}, rotation_id={}, weeks={:?}, primary={}, by={}",
            instructor_id,
            rotation_id,
            weeks,
            is_primary_evaluator,
            caller.login_id
        );

        self.send_notices(&notices, caller).await;
        Ok(created)
    }

    /// 移除一条带教指派
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Err(ApiError::NotFound): 指派不存在
    /// - Err(ApiError::CannotRemoveSolePrimaryEvaluator): 格子内唯一的主评估人
    pub async fn remove_instructor_schedule(
        &self,
        caller: &Caller,
        assignment_id: i64,
        cancel: &CancellationToken,
    ) -> ApiResult<bool> {
        validate_positive_id("assignment_id", assignment_id)?;

        let assignment = self.require_assignment(assignment_id)?;
        self.authorize(caller, assignment.rotation_id, cancel).await?;

        let invariant = self.invariant;
        let modified_by = caller.login_id.as_str();

        let result = in_transaction(self.runner.as_ref(), IsolationLevel::Serializable, cancel, |uow| {
            // 事务内重新读取, 以提交时的状态为准
            let current = find_in(uow, assignment_id)?;

            if !invariant.can_remove(uow.assignments(), &current)? {
                return Err(ApiError::CannotRemoveSolePrimaryEvaluator {
                    assignment_id,
                    rotation_id: current.rotation_id,
                    week_id: current.week_id,
                });
            }

            uow.assignments().delete(assignment_id)?;

            let entry = audit_entry_for(&current, modified_by);
            uow.audit().log_removed(&entry)?;
            if current.is_primary_evaluator {
                uow.audit().log_primary_evaluator_unset(&entry)?;
            }
            Ok(current)
        });

        let removed = match result {
            Ok(removed) => removed,
            Err(e) => {
                self.log_rejection("remove_instructor_schedule", caller, &e);
                return Err(e);
            }
        };

        tracing::info!(
            "ScheduleEditor: 移除带教完成 - assignment_id={}, rotation_id={}, week_id={}, was_primary={}, by={}",
            removed.id,
            removed.rotation_id,
            removed.week_id,
            removed.is_primary_evaluator,
            caller.login_id
        );

        if removed.is_primary_evaluator {
            let notice = PrimaryEvaluatorNotice::Removed {
                removed_instructor_id: removed.instructor_id,
                rotation_id: removed.rotation_id,
                week_id: removed.week_id,
            };
            self.send_notices(&[notice], caller).await;
        }
        Ok(true)
    }

    /// 设置/取消主评估人
    ///
    /// # 说明
    /// - 设为 true: 先清除格子内原主评估人, 再设置目标
    /// - 设为 false: 仅清除目标
    /// - 与当前值相同: 直接成功, 不写审计, 不发通知
    pub async fn set_primary_evaluator(
        &self,
        caller: &Caller,
        assignment_id: i64,
        is_primary_evaluator: bool,
        cancel: &CancellationToken,
    ) -> ApiResult<PrimaryEvaluatorChange> {
        validate_positive_id("assignment_id", assignment_id)?;

        let assignment = self.require_assignment(assignment_id)?;
        self.authorize(caller, assignment.rotation_id, cancel).await?;

        let invariant = self.invariant;
        let modified_by = caller.login_id.as_str();

        let result = in_transaction(self.runner.as_ref(), IsolationLevel::Serializable, cancel, |uow| {
            let mut current = find_in(uow, assignment_id)?;

            if current.is_primary_evaluator == is_primary_evaluator {
                tracing::debug!(
                    "ScheduleEditor: 主评估人标记未变化 - assignment_id={}, value={}",
                    assignment_id,
                    is_primary_evaluator
                );
                let change = PrimaryEvaluatorChange {
                    success: true,
                    assignment: current,
                    replaced: None,
                };
                return Ok((change, Vec::new()));
            }

            let mut notices = Vec::new();
            let mut replaced = None;

            if is_primary_evaluator {
                let cleared = invariant.clear_other_holders(uow.assignments(), current.slot(), Some(current.id))?;
                uow.assignments().set_primary_flag(current.id, true)?;
                current.is_primary_evaluator = true;

                for holder in &cleared {
                    uow.audit()
                        .log_primary_evaluator_unset(&audit_entry_for(holder, modified_by))?;
                    notices.push(PrimaryEvaluatorNotice::Replaced {
                        removed_instructor_id: holder.instructor_id,
                        new_instructor_id: current.instructor_id,
                        rotation_id: current.rotation_id,
                        week_id: current.week_id,
                    });
                }
                uow.audit()
                    .log_primary_evaluator_set(&audit_entry_for(&current, modified_by))?;
                replaced = cleared.into_iter().next();
            } else {
                uow.assignments().set_primary_flag(current.id, false)?;
                current.is_primary_evaluator = false;
                uow.audit()
                    .log_primary_evaluator_unset(&audit_entry_for(&current, modified_by))?;
                notices.push(PrimaryEvaluatorNotice::Removed {
                    removed_instructor_id: current.instructor_id,
                    rotation_id: current.rotation_id,
                    week_id: current.week_id,
                });
            }

            let change = PrimaryEvaluatorChange {
                success: true,
                assignment: current,
                replaced,
            };
            Ok((change, notices))
        });

        let (change, notices) = match result {
            Ok(output) => output,
            Err(e) => {
                self.log_rejection("set_primary_evaluator", caller, &e);
                return Err(e);
            }
        };

        tracing::info!(
            "ScheduleEditor: 主评估人设置完成 - assignment_id={}, value={}, replaced={:?}, by={}",
            assignment_id,
            is_primary_evaluator,
            change.replaced.as_ref().map(|a| a.id),
            caller.login_id
        );

        self.send_notices(&notices, caller).await;
        Ok(change)
    }

    // ==========================================
    // 只读查询
    // ==========================================

    /// 指派能否被移除（与移除操作的唯一主评估人校验一致）
    pub fn can_remove_instructor(&self, assignment_id: i64) -> ApiResult<bool> {
        let invariant = self.invariant;
        read_only(self.runner.as_ref(), |uow| {
            let assignment = find_in(uow, assignment_id)?;
            Ok(invariant.can_remove(uow.assignments(), &assignment)?)
        })
    }

    /// 预警查询: 带教老师在给定周的既有指派（不阻断）
    ///
    /// # 参数
    /// - exclude_rotation_id: 排除当前正在编辑的轮转
    pub fn find_conflicts(
        &self,
        instructor_id: i64,
        week_ids: &[i64],
        exclude_rotation_id: Option<i64>,
    ) -> ApiResult<Vec<Assignment>> {
        let weeks: BTreeSet<i64> = week_ids.iter().copied().collect();
        let detector = self.conflict_detector;
        read_only(self.runner.as_ref(), |uow| {
            Ok(detector.find_conflicts(uow.assignments(), instructor_id, &weeks, exclude_rotation_id)?)
        })
    }

    /// 指派的审计历史（最新在前）
    pub fn history_by_assignment(&self, assignment_id: i64) -> ApiResult<Vec<AuditRecord>> {
        read_only(self.runner.as_ref(), |uow| {
            Ok(uow.audit().history_by_assignment(assignment_id)?)
        })
    }

    /// 格子的审计历史（最新在前）
    pub fn history_by_rotation_week(&self, rotation_id: i64, week_id: i64) -> ApiResult<Vec<AuditRecord>> {
        read_only(self.runner.as_ref(), |uow| {
            Ok(uow.audit().history_by_rotation_week(rotation_id, week_id)?)
        })
    }

    /// 按ID查询指派
    pub fn get_assignment(&self, assignment_id: i64) -> ApiResult<Option<Assignment>> {
        read_only(self.runner.as_ref(), |uow| Ok(uow.assignments().find_by_id(assignment_id)?))
    }

    /// 格子内全部指派
    pub fn list_slot(&self, rotation_id: i64, week_id: i64) -> ApiResult<Vec<Assignment>> {
        read_only(self.runner.as_ref(), |uow| {
            Ok(uow.assignments().find_by_slot(RotationWeek { rotation_id, week_id })?)
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn require_assignment(&self, assignment_id: i64) -> ApiResult<Assignment> {
        self.get_assignment(assignment_id)?
            .ok_or_else(|| assignment_not_found(assignment_id))
    }

    async fn authorize(&self, caller: &Caller, rotation_id: i64, cancel: &CancellationToken) -> ApiResult<()> {
        cancel.check()?;

        let allowed = self
            .permissions
            .has_edit_permission_for_rotation(caller, rotation_id, cancel)
            .await?;

        if !allowed {
            tracing::warn!(
                "ScheduleEditor: 无编辑权限 - login_id={}, rotation_id={}",
                caller.login_id,
                rotation_id
            );
            return Err(ApiError::PermissionDenied {
                login_id: caller.login_id.clone(),
                rotation_id,
            });
        }
        Ok(())
    }

    async fn send_notices(&self, notices: &[PrimaryEvaluatorNotice], caller: &Caller) {
        for notice in notices {
            self.notifier.notify(notice, caller).await;
        }
    }

    fn log_rejection(&self, operation: &str, caller: &Caller, err: &ApiError) {
        match err {
            ApiError::ScheduleConflict { .. } | ApiError::CannotRemoveSolePrimaryEvaluator { .. } => {
                tracing::warn!("ScheduleEditor: {} 被拒绝 - by={}, reason={}", operation, caller.login_id, err);
            }
            ApiError::Cancelled => {
                tracing::info!("ScheduleEditor: {} 已取消并回滚 - by={}", operation, caller.login_id);
            }
            _ => {
                tracing::error!("ScheduleEditor: {} 失败 - by={}, error={}", operation, caller.login_id, err);
            }
        }
    }
}

fn find_in(uow: &mut dyn ScheduleUnitOfWork, assignment_id: i64) -> ApiResult<Assignment> {
    uow.assignments()
        .find_by_id(assignment_id)?
        .ok_or_else(|| assignment_not_found(assignment_id))
}

fn assignment_not_found(assignment_id: i64) -> ApiError {
    ApiError::NotFound(format!("Assignment(id={})不存在", assignment_id))
}
