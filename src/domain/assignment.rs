// ==========================================
// 临床轮转排班核心 - 带教指派领域模型
// ==========================================
// 约束: 同一 (rotation_id, week_id) 至多一名主评估人
// 约束: 同一带教老师同一周不得出现在两个轮转
// 对齐: instructor_assignment 表
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Assignment - 带教指派
// ==========================================
// 写入方: 仅 ScheduleEditor (新增/删除/主评估人切换)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,                    // 指派ID
    pub instructor_id: i64,         // 带教老师ID
    pub rotation_id: i64,           // 轮转ID
    pub week_id: i64,               // 周ID (日历周主键, 非周序号)
    pub is_primary_evaluator: bool, // 是否主评估人
    pub role: Option<String>,       // 角色 (可选)
}

impl Assignment {
    /// 排班格子 (rotation_id, week_id)
    pub fn slot(&self) -> RotationWeek {
        RotationWeek {
            rotation_id: self.rotation_id,
            week_id: self.week_id,
        }
    }
}

// ==========================================
// NewAssignment - 待插入的指派
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub instructor_id: i64,
    pub rotation_id: i64,
    pub week_id: i64,
    pub is_primary_evaluator: bool,
    pub role: Option<String>,
}

// ==========================================
// RotationWeek - 排班格子
// ==========================================
// 主评估人唯一性按此键定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RotationWeek {
    pub rotation_id: i64,
    pub week_id: i64,
}

// ==========================================
// Caller - 当前操作人
// ==========================================
// 审计记录中的 modified_by 取 login_id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub login_id: String,     // 登录名
    pub display_name: String, // 显示名 (用于通知正文)
}

impl Caller {
    pub fn new(login_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            login_id: login_id.into(),
            display_name: display_name.into(),
        }
    }
}

// ==========================================
// PrimaryEvaluatorChange - 主评估人切换结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryEvaluatorChange {
    pub success: bool,
    pub assignment: Assignment,        // 变更后的目标指派
    pub replaced: Option<Assignment>,  // 被替换的原主评估人 (变更后状态)
}
