// ==========================================
// 临床轮转排班核心 - 主评估人变更通知
// ==========================================
// 红线: 仅在事务提交后调用; 失败只记日志, 不回滚, 不向调用方传播
// ==========================================
// 职责:
// 1. 组装通知正文（移除 / 替换 两种句式）
// 2. 对每个收件人独立尝试发送（并发, 单次有超时上限）
// ==========================================

use std::sync::Arc;

use futures::future::join_all;

use crate::config::{NotificationConfigReader, NotificationSettings};
use crate::domain::{Caller, NotificationRequest, PrimaryEvaluatorNotice};
use crate::engine::capabilities::{NotificationDispatcher, NotificationError, ScheduleDirectory};

/// 一次通知的发送结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationOutcome {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

// ==========================================
// PrimaryEvaluatorNotifier - 通知组件
// ==========================================
pub struct PrimaryEvaluatorNotifier {
    dispatcher: Arc<dyn NotificationDispatcher>,
    directory: Arc<dyn ScheduleDirectory>,
    config: Arc<dyn NotificationConfigReader>,
}

impl PrimaryEvaluatorNotifier {
    pub fn new(
        dispatcher: Arc<dyn NotificationDispatcher>,
        directory: Arc<dyn ScheduleDirectory>,
        config: Arc<dyn NotificationConfigReader>,
    ) -> Self {
        Self {
            dispatcher,
            directory,
            config,
        }
    }

    /// 尽力发送通知（永不返回错误）
    pub async fn notify(&self, notice: &PrimaryEvaluatorNotice, caller: &Caller) -> NotificationOutcome {
        let settings = match self.config.notification_settings() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("PrimaryEvaluatorNotifier: 通知配置读取失败，使用默认配置: {}", e);
                NotificationSettings::default()
            }
        };

        if !settings.enabled {
            tracing::debug!("PrimaryEvaluatorNotifier: 通知已关闭，跳过");
            return NotificationOutcome::default();
        }
        if settings.recipients.is_empty() {
            tracing::debug!("PrimaryEvaluatorNotifier: 未配置收件人，跳过");
            return NotificationOutcome::default();
        }

        let request = self.compose(notice, caller, &settings);
        self.dispatch(&request, &settings).await
    }

    /// 对每个收件人独立发送
    async fn dispatch(&self, request: &NotificationRequest, settings: &NotificationSettings) -> NotificationOutcome {
        let timeout = settings.send_timeout();
        let attempts = request.recipients.iter().map(|recipient| async move {
            let result = match tokio::time::timeout(timeout, self.dispatcher.send(recipient, request)).await {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }),
            };
            (recipient, result)
        });

        let mut outcome = NotificationOutcome::default();
        for (recipient, result) in join_all(attempts).await {
            outcome.attempted += 1;
            match result {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        "PrimaryEvaluatorNotifier: 通知发送失败(已忽略) - recipient={}, error={}",
                        recipient,
                        e
                    );
                }
            }
        }

        tracing::info!(
            "PrimaryEvaluatorNotifier: 通知发送完成 - attempted={}, delivered={}, failed={}",
            outcome.attempted,
            outcome.delivered,
            outcome.failed
        );
        outcome
    }

    /// 组装通知请求
    ///
    /// 正文规则:
    /// - 被移除人姓名可解析时放在括号内, 不可解析时整个括号省略
    /// - 轮转名不可解析 → "rotation {id}"
    /// - 周序号不可解析 → 原始 week_id
    /// - 替换句式追加 "and replaced by {新主评估人}"
    pub fn compose(
        &self,
        notice: &PrimaryEvaluatorNotice,
        caller: &Caller,
        settings: &NotificationSettings,
    ) -> NotificationRequest {
        let removed_name = self.person_name(notice.removed_instructor_id());
        let rotation = self
            .lookup("rotation_name", || self.directory.rotation_name(notice.rotation_id()))
            .unwrap_or_else(|| format!("rotation {}", notice.rotation_id()));
        let week = self
            .lookup("week_number", || self.directory.week_number(notice.week_id()))
            .map(|n| n.to_string())
            .unwrap_or_else(|| notice.week_id().to_string());

        let mut sentence = match &removed_name {
            Some(name) => format!("Primary evaluator ({}) was removed from {} week {}", name, rotation, week),
            None => format!("Primary evaluator was removed from {} week {}", rotation, week),
        };

        if let PrimaryEvaluatorNotice::Replaced { new_instructor_id, .. } = notice {
            let new_name = self
                .person_name(*new_instructor_id)
                .unwrap_or_else(|| format!("instructor {}", new_instructor_id));
            sentence.push_str(&format!(" and replaced by {}", new_name));
        }
        sentence.push('.');

        let changed_by = format!("Changed by {}.", caller_name(caller));

        let body = if settings.is_html {
            format!("<p>{}</p><p>{}</p>", escape_html(&sentence), escape_html(&changed_by))
        } else {
            format!("{}\n{}", sentence, changed_by)
        };

        NotificationRequest {
            recipients: settings.recipients.clone(),
            subject: settings.subject.clone(),
            body,
            sender_address: settings.sender_address.clone(),
            is_html: settings.is_html,
        }
    }

    fn person_name(&self, person_id: i64) -> Option<String> {
        self.lookup("person_display_name", || self.directory.person_display_name(person_id))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// 目录查询失败时降级为 None（通知不可影响主流程）
    fn lookup<T, E: std::fmt::Display>(&self, what: &str, f: impl FnOnce() -> Result<Option<T>, E>) -> Option<T> {
        match f() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("PrimaryEvaluatorNotifier: 目录查询失败 - {}: {}", what, e);
                None
            }
        }
    }
}

fn caller_name(caller: &Caller) -> &str {
    if caller.display_name.trim().is_empty() {
        &caller.login_id
    } else {
        caller.display_name.trim()
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
