// ==========================================
// 临床轮转排班核心 - 排班审计领域模型
// ==========================================
// 红线: 所有写入必须记录, 审计记录只追加不修改
// 对齐: schedule_audit_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// AuditAction - 审计动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    InstructorAdded,       // 新增带教
    InstructorRemoved,     // 移除带教
    PrimaryEvaluatorSet,   // 设为主评估人
    PrimaryEvaluatorUnset, // 取消主评估人
}

impl AuditAction {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::InstructorAdded => "InstructorAdded",
            AuditAction::InstructorRemoved => "InstructorRemoved",
            AuditAction::PrimaryEvaluatorSet => "PrimaryEvaluatorSet",
            AuditAction::PrimaryEvaluatorUnset => "PrimaryEvaluatorUnset",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "InstructorAdded" => Some(AuditAction::InstructorAdded),
            "InstructorRemoved" => Some(AuditAction::InstructorRemoved),
            "PrimaryEvaluatorSet" => Some(AuditAction::PrimaryEvaluatorSet),
            "PrimaryEvaluatorUnset" => Some(AuditAction::PrimaryEvaluatorUnset),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// AuditEntry - 待写入的审计内容
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub instructor_id: i64,
    pub rotation_id: i64,
    pub week_id: i64,
    pub modified_by: String,
    pub related_assignment_id: Option<i64>,
}

// ==========================================
// AuditRecord - 审计记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub action: AuditAction,
    pub instructor_id: i64,
    pub rotation_id: i64,
    pub week_id: i64,
    pub modified_by: String,
    pub related_assignment_id: Option<i64>,
    pub recorded_at: NaiveDateTime, // UTC
}

impl AuditRecord {
    /// 由待写入内容 + 分配的ID构造
    pub fn from_entry(id: i64, action: AuditAction, entry: &AuditEntry, recorded_at: NaiveDateTime) -> Self {
        Self {
            id,
            action,
            instructor_id: entry.instructor_id,
            rotation_id: entry.rotation_id,
            week_id: entry.week_id,
            modified_by: entry.modified_by.clone(),
            related_assignment_id: entry.related_assignment_id,
            recorded_at,
        }
    }
}
