// ==========================================
// ScheduleEditor 集成测试（内存工作单元）
// ==========================================
// 测试范围:
// 1. 冲突阻断 / 主评估人唯一性 / 唯一主评估人保护
// 2. 审计记录顺序与内容
// 3. 通知: 移除 / 替换句式, 失败隔离
// 4. 取消与审计失败时整体回滚
// ==========================================

mod helpers;

use helpers::fakes::{
    build_editor, caller, FailingDispatcher, RecordingDispatcher, StaticPermissionAuthority,
};
use helpers::memory_store::DirectTransactionRunner;
use rotation_scheduler::api::ApiError;
use rotation_scheduler::domain::{AuditAction, Caller, RotationWeek};
use rotation_scheduler::engine::CancellationToken;
use std::sync::Arc;

struct Env {
    runner: Arc<DirectTransactionRunner>,
    dispatcher: Arc<RecordingDispatcher>,
    editor: rotation_scheduler::api::ScheduleEditor,
}

fn setup(recipients: &[&str]) -> Env {
    let runner = Arc::new(DirectTransactionRunner::new());
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let editor = build_editor(
        runner.clone(),
        Arc::new(StaticPermissionAuthority::allow_all()),
        dispatcher.clone(),
        recipients,
    );
    Env {
        runner,
        dispatcher,
        editor,
    }
}

// ==========================================
// 冲突检测
// ==========================================

#[tokio::test]
async fn test_conflict_in_other_rotation_blocks_add() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    // 老师 10 已在轮转 1 的第 500 周
    env.editor.add_instructor(&caller(), 10, 1, &[500], false, &cancel).await.unwrap();
    let audit_before = env.runner.snapshot().audit.len();

    let err = env
        .editor
        .add_instructor(&caller(), 10, 2, &[500, 501], false, &cancel)
        .await
        .unwrap_err();

    match &err {
        ApiError::ScheduleConflict {
            instructor_id,
            conflicts,
        } => {
            assert_eq!(*instructor_id, 10);
            assert_eq!(conflicts, &vec![RotationWeek { rotation_id: 1, week_id: 500 }]);
        }
        other => panic!("Expected ScheduleConflict, got {:?}", other),
    }
    assert!(err.to_string().contains("scheduling conflict"));

    let state = env.runner.snapshot();
    assert_eq!(state.assignments.len(), 1);
    assert_eq!(state.audit.len(), audit_before);
}

#[tokio::test]
async fn test_advisory_conflicts_do_not_block() {
    let env = setup(&[]);
    let cancel = CancellationToken::new();

    env.editor.add_instructor(&caller(), 10, 1, &[500], false, &cancel).await.unwrap();

    let hits = env.editor.find_conflicts(10, &[500, 501], Some(2)).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(env.editor.find_conflicts(10, &[500], Some(1)).unwrap().is_empty());
}

// ==========================================
// 主评估人唯一性
// ==========================================

#[tokio::test]
async fn test_add_primary_replaces_existing_holder() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    let first = env.editor.add_instructor(&caller(), 10, 1, &[501], true, &cancel).await.unwrap();
    let second = env.editor.add_instructor(&caller(), 11, 1, &[501], true, &cancel).await.unwrap();

    let state = env.runner.snapshot();
    let primaries = state.primaries_in(1, 501);
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].id, second[0].id);
    assert!(!state.assignments[&first[0].id].is_primary_evaluator);

    // 第二次新增: Added(11) → Unset(10) → Set(11)
    let tail: Vec<_> = state.audit_actions().into_iter().skip(2).collect();
    assert_eq!(
        tail,
        vec![
            AuditAction::InstructorAdded,
            AuditAction::PrimaryEvaluatorUnset,
            AuditAction::PrimaryEvaluatorSet,
        ]
    );
    assert_eq!(state.audit[3].instructor_id, 10);
    assert_eq!(state.audit[4].instructor_id, 11);

    let bodies = env.dispatcher.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("Primary evaluator (Dr. Ada Vance) was removed from Small Animal Surgery week 29 and replaced by Dr. Ben Ortiz."));
}

#[tokio::test]
async fn test_multi_week_primary_applies_per_slot() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    env.runner.with_state(|s| {
        s.seed(12, 1, 501, true);
    });

    let created = env
        .editor
        .add_instructor(&caller(), 10, 1, &[502, 500, 501], true, &cancel)
        .await
        .unwrap();

    assert_eq!(created.iter().map(|a| a.week_id).collect::<Vec<_>>(), vec![500, 501, 502]);
    let state = env.runner.snapshot();
    for week_id in [500, 501, 502] {
        let primaries = state.primaries_in(1, week_id);
        assert_eq!(primaries.len(), 1, "week {}", week_id);
        assert_eq!(primaries[0].instructor_id, 10);
    }

    // 只有 501 有原主评估人 → 一条替换通知
    let bodies = env.dispatcher.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("(Dr. Cora Lind)"));
    assert!(bodies[0].contains("week 29"));
}

// ==========================================
// Scenario 6: 替换主评估人
// ==========================================

#[tokio::test]
async fn test_set_primary_replacement_writes_one_unset_and_one_set() {
    let env = setup(&["chief@vet.local", "coordinator@vet.local"]);
    let cancel = CancellationToken::new();

    let (x, y) = env.runner.with_state(|s| (s.seed(10, 1, 500, true), s.seed(11, 1, 500, false)));

    let change = env.editor.set_primary_evaluator(&caller(), y.id, true, &cancel).await.unwrap();

    assert!(change.success);
    assert!(change.assignment.is_primary_evaluator);
    let replaced = change.replaced.expect("prior holder");
    assert_eq!(replaced.id, x.id);
    assert!(!replaced.is_primary_evaluator);

    let state = env.runner.snapshot();
    assert_eq!(
        state.audit_actions(),
        vec![AuditAction::PrimaryEvaluatorUnset, AuditAction::PrimaryEvaluatorSet]
    );
    assert_eq!(state.audit[0].related_assignment_id, Some(x.id));
    assert_eq!(state.audit[1].related_assignment_id, Some(y.id));
    assert!(state.audit.iter().all(|r| r.modified_by == "jdoe"));

    // 每个收件人一次, 同一正文
    assert_eq!(
        env.dispatcher.recipients(),
        vec!["chief@vet.local".to_string(), "coordinator@vet.local".to_string()]
    );
    let bodies = env.dispatcher.bodies();
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(
        bodies[0],
        "Primary evaluator (Dr. Ada Vance) was removed from Small Animal Surgery week 28 and replaced by Dr. Ben Ortiz.\nChanged by Jane Doe."
    );
}

#[tokio::test]
async fn test_set_primary_without_prior_holder_sends_nothing() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    let y = env.runner.with_state(|s| s.seed(11, 1, 500, false));
    let change = env.editor.set_primary_evaluator(&caller(), y.id, true, &cancel).await.unwrap();

    assert_eq!(change.replaced, None);
    assert_eq!(env.runner.snapshot().audit_actions(), vec![AuditAction::PrimaryEvaluatorSet]);
    assert!(env.dispatcher.bodies().is_empty());
}

// ==========================================
// Scenario 5: 移除主评估人, 通知失败被吞掉
// ==========================================

#[tokio::test]
async fn test_remove_primary_with_co_instructor_survives_notification_failure() {
    let runner = Arc::new(DirectTransactionRunner::new());
    let dispatcher = Arc::new(FailingDispatcher::default());
    let editor = build_editor(
        runner.clone(),
        Arc::new(StaticPermissionAuthority::allow_all()),
        dispatcher.clone(),
        &["chief@vet.local"],
    );
    let cancel = CancellationToken::new();

    let (a, b) = runner.with_state(|s| (s.seed(10, 1, 500, true), s.seed(11, 1, 500, false)));

    assert!(editor.can_remove_instructor(a.id).unwrap());
    let removed = editor.remove_instructor_schedule(&caller(), a.id, &cancel).await.unwrap();
    assert!(removed);
    assert_eq!(*dispatcher.attempts.lock().unwrap(), 1);

    assert!(matches!(editor.can_remove_instructor(a.id), Err(ApiError::NotFound(_))));
    assert!(editor.get_assignment(a.id).unwrap().is_none());
    assert!(editor.get_assignment(b.id).unwrap().is_some());

    let state = runner.snapshot();
    assert_eq!(
        state.audit_actions(),
        vec![AuditAction::InstructorRemoved, AuditAction::PrimaryEvaluatorUnset]
    );
    // 移除后该格无主评估人
    assert!(state.primaries_in(1, 500).is_empty());
}

#[tokio::test]
async fn test_remove_primary_notification_has_no_replacement_clause() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    let (a, _b) = env.runner.with_state(|s| (s.seed(10, 2, 503, true), s.seed(11, 2, 503, false)));
    env.editor.remove_instructor_schedule(&caller(), a.id, &cancel).await.unwrap();

    let bodies = env.dispatcher.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0],
        "Primary evaluator (Dr. Ada Vance) was removed from Equine Medicine week 31.\nChanged by Jane Doe."
    );
}

#[tokio::test]
async fn test_remove_primary_for_unknown_person_omits_parentheses() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    let (a, _b) = env.runner.with_state(|s| (s.seed(77, 9, 9000, true), s.seed(11, 9, 9000, false)));
    env.editor.remove_instructor_schedule(&caller(), a.id, &cancel).await.unwrap();

    let bodies = env.dispatcher.bodies();
    assert_eq!(
        bodies[0],
        "Primary evaluator was removed from rotation 9 week 9000.\nChanged by Jane Doe."
    );
}

// ==========================================
// 唯一主评估人保护
// ==========================================

#[tokio::test]
async fn test_sole_primary_is_protected() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    let a = env.runner.with_state(|s| s.seed(10, 1, 500, true));

    assert!(!env.editor.can_remove_instructor(a.id).unwrap());
    let err = env
        .editor
        .remove_instructor_schedule(&caller(), a.id, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::CannotRemoveSolePrimaryEvaluator {
            rotation_id: 1,
            week_id: 500,
            ..
        }
    ));
    assert!(err.to_string().contains("sole primary evaluator cannot be removed"));

    let state = env.runner.snapshot();
    assert!(state.assignments.contains_key(&a.id));
    assert!(state.audit.is_empty());
    assert!(env.dispatcher.bodies().is_empty());
}

#[tokio::test]
async fn test_non_primary_removal_sends_nothing() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    let a = env.runner.with_state(|s| s.seed(10, 1, 500, false));
    assert!(env.editor.remove_instructor_schedule(&caller(), a.id, &cancel).await.unwrap());

    assert_eq!(env.runner.snapshot().audit_actions(), vec![AuditAction::InstructorRemoved]);
    assert!(env.dispatcher.bodies().is_empty());
}

// ==========================================
// 授权
// ==========================================

#[tokio::test]
async fn test_permission_checked_against_assignment_rotation() {
    let runner = Arc::new(DirectTransactionRunner::new());
    let permissions = Arc::new(StaticPermissionAuthority::grants(&[("jdoe", 1)]));
    let editor = build_editor(
        runner.clone(),
        permissions.clone(),
        Arc::new(RecordingDispatcher::default()),
        &[],
    );
    let cancel = CancellationToken::new();

    let other = runner.with_state(|s| s.seed(10, 2, 500, false));
    let err = editor.remove_instructor_schedule(&caller(), other.id, &cancel).await.unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied { rotation_id: 2, .. }));
    assert_eq!(permissions.checks.lock().unwrap().last(), Some(&("jdoe".to_string(), 2)));

    let stranger = Caller::new("mallory", "Mallory");
    let err = editor
        .add_instructor(&stranger, 11, 1, &[501], false, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied { .. }));

    let state = runner.snapshot();
    assert_eq!(state.assignments.len(), 1);
    assert!(state.audit.is_empty());
    assert_eq!(*runner.committed.lock().unwrap(), 0);
}

// ==========================================
// 回滚
// ==========================================

#[tokio::test]
async fn test_cancelled_before_start_writes_nothing() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = env
        .editor
        .add_instructor(&caller(), 10, 1, &[500], true, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
    assert!(env.runner.snapshot().assignments.is_empty());
}

#[tokio::test]
async fn test_audit_failure_rolls_back_mutation() {
    let env = setup(&["chief@vet.local"]);
    let cancel = CancellationToken::new();

    let (a, b) = env.runner.with_state(|s| {
        let a = s.seed(10, 1, 500, true);
        let b = s.seed(11, 1, 500, false);
        s.fail_audit = true;
        (a, b)
    });

    let err = env.editor.set_primary_evaluator(&caller(), b.id, true, &cancel).await.unwrap_err();
    assert!(matches!(err, ApiError::DatabaseError(_)));

    let state = env.runner.snapshot();
    assert!(state.assignments[&a.id].is_primary_evaluator);
    assert!(!state.assignments[&b.id].is_primary_evaluator);
    assert_eq!(*env.runner.rolled_back.lock().unwrap(), 1);
    assert!(env.dispatcher.bodies().is_empty());
}

// ==========================================
// 审计历史查询
// ==========================================

#[tokio::test]
async fn test_history_is_most_recent_first() {
    let env = setup(&[]);
    let cancel = CancellationToken::new();

    let created = env.editor.add_instructor(&caller(), 10, 1, &[500], false, &cancel).await.unwrap();
    let id = created[0].id;
    env.editor.set_primary_evaluator(&caller(), id, true, &cancel).await.unwrap();
    env.editor.set_primary_evaluator(&caller(), id, false, &cancel).await.unwrap();

    let history = env.editor.history_by_assignment(id).unwrap();
    let actions: Vec<_> = history.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::PrimaryEvaluatorUnset,
            AuditAction::PrimaryEvaluatorSet,
            AuditAction::InstructorAdded,
        ]
    );

    let slot = env.editor.history_by_rotation_week(1, 500).unwrap();
    assert_eq!(slot.len(), 3);
    assert!(env.editor.history_by_rotation_week(1, 501).unwrap().is_empty());
}
