// ==========================================
// 协作方 Mock 实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use rotation_scheduler::api::{ApiResult, ScheduleEditor};
use rotation_scheduler::config::{NotificationSettings, StaticNotificationConfig};
use rotation_scheduler::domain::{Caller, NotificationRequest};
use rotation_scheduler::engine::{
    CancellationToken, NotificationDispatcher, NotificationError, PermissionAuthority,
    PrimaryEvaluatorNotifier, ScheduleDirectory, TransactionRunner,
};
use rotation_scheduler::repository::RepositoryResult;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// ==========================================
// StaticPermissionAuthority
// ==========================================
#[derive(Debug, Default)]
pub struct StaticPermissionAuthority {
    allow_all: bool,
    grants: HashSet<(String, i64)>,
    pub checks: Mutex<Vec<(String, i64)>>,
}

impl StaticPermissionAuthority {
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            ..Self::default()
        }
    }

    pub fn grants(grants: &[(&str, i64)]) -> Self {
        Self {
            allow_all: false,
            grants: grants.iter().map(|(l, r)| (l.to_string(), *r)).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PermissionAuthority for StaticPermissionAuthority {
    async fn has_edit_permission_for_rotation(
        &self,
        caller: &Caller,
        rotation_id: i64,
        _cancel: &CancellationToken,
    ) -> ApiResult<bool> {
        self.checks.lock().unwrap().push((caller.login_id.clone(), rotation_id));
        Ok(self.allow_all || self.grants.contains(&(caller.login_id.clone(), rotation_id)))
    }
}

// ==========================================
// RecordingDispatcher - 记录每次发送
// ==========================================
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<(String, NotificationRequest)>>,
}

impl RecordingDispatcher {
    pub fn bodies(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, r)| r.body.clone()).collect()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, recipient: &str, request: &NotificationRequest) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push((recipient.to_string(), request.clone()));
        Ok(())
    }
}

// ==========================================
// FailingDispatcher - 传输层始终失败
// ==========================================
#[derive(Debug, Default)]
pub struct FailingDispatcher {
    pub attempts: Mutex<usize>,
}

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn send(&self, _recipient: &str, _request: &NotificationRequest) -> Result<(), NotificationError> {
        *self.attempts.lock().unwrap() += 1;
        Err(NotificationError::Transport("smtp relay refused connection".to_string()))
    }
}

// ==========================================
// MapDirectory - 内存目录
// ==========================================
#[derive(Debug, Default)]
pub struct MapDirectory {
    pub rotations: HashMap<i64, String>,
    pub weeks: HashMap<i64, i32>,
    pub people: HashMap<i64, String>,
}

impl MapDirectory {
    /// 常用测试数据: 轮转 1/2, 周 500-503 → 28-31, 老师 10/11/12
    pub fn sample() -> Self {
        let mut d = Self::default();
        d.rotations.insert(1, "Small Animal Surgery".to_string());
        d.rotations.insert(2, "Equine Medicine".to_string());
        for (week_id, week_num) in [(500, 28), (501, 29), (502, 30), (503, 31)] {
            d.weeks.insert(week_id, week_num);
        }
        d.people.insert(10, "Dr. Ada Vance".to_string());
        d.people.insert(11, "Dr. Ben Ortiz".to_string());
        d.people.insert(12, "Dr. Cora Lind".to_string());
        d
    }
}

impl ScheduleDirectory for MapDirectory {
    fn rotation_name(&self, rotation_id: i64) -> RepositoryResult<Option<String>> {
        Ok(self.rotations.get(&rotation_id).cloned())
    }

    fn week_number(&self, week_id: i64) -> RepositoryResult<Option<i32>> {
        Ok(self.weeks.get(&week_id).copied())
    }

    fn person_display_name(&self, person_id: i64) -> RepositoryResult<Option<String>> {
        Ok(self.people.get(&person_id).cloned())
    }
}

/// 通知配置: 给定收件人, 100ms 超时
pub fn notification_config(recipients: &[&str]) -> StaticNotificationConfig {
    StaticNotificationConfig::new(NotificationSettings {
        recipients: recipients.iter().map(|r| r.to_string()).collect(),
        send_timeout_ms: 100,
        ..NotificationSettings::default()
    })
}

/// 组装编辑器
pub fn build_editor(
    runner: Arc<dyn TransactionRunner>,
    permissions: Arc<dyn PermissionAuthority>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    recipients: &[&str],
) -> ScheduleEditor {
    let notifier = PrimaryEvaluatorNotifier::new(
        dispatcher,
        Arc::new(MapDirectory::sample()),
        Arc::new(notification_config(recipients)),
    );
    ScheduleEditor::new(runner, permissions, Arc::new(notifier))
}

pub fn caller() -> Caller {
    Caller::new("jdoe", "Jane Doe")
}
