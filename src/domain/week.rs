// ==========================================
// 临床轮转排班核心 - 轮转周上下文
// ==========================================
// 由调用方按需提供, 核心不持久化
// ==========================================

use serde::{Deserialize, Serialize};

/// 轮转周上下文 (评估判定输入)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationWeekInfo {
    pub week_num: i32,             // 周序号
    pub is_extended_rotation: bool, // 是否延长周
    pub is_block_start_week: bool,  // 是否区块起始周
}

impl RotationWeekInfo {
    pub fn new(week_num: i32, is_extended_rotation: bool, is_block_start_week: bool) -> Self {
        Self {
            week_num,
            is_extended_rotation,
            is_block_start_week,
        }
    }
}
