// ==========================================
// 临床轮转排班核心 - 主评估周判定
// ==========================================
// 红线: 纯函数, 无持久化, 无副作用, 不抛错
// ==========================================
// 职责: 给定周序号 + 邻近周上下文, 判定该周是否需要主评估人
// 输入: RotationWeekInfo 窗口 (可能只覆盖当前区块前后各一周, 且可能无序)
// 输出: bool
// ==========================================

use crate::domain::week::RotationWeekInfo;
use std::collections::HashSet;

// ==========================================
// EvaluationPolicy - 主评估周判定
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationPolicy;

impl EvaluationPolicy {
    pub fn new() -> Self {
        Self
    }

    /// 判定 week_num 所在周是否需要主评估人
    ///
    /// 规则（顺序执行，命中即返回）:
    /// 1) 上下文为空 → false
    /// 2) 上下文中无该周 → false
    /// 3) 轮转已关闭 → false
    /// 4) service_week_size 缺失 / ≤0 → false
    /// 5) 该周为延长周 → false
    /// 6) service_week_size = 1 → true
    /// 7) 否则取该周所在区块的最后一周 last:
    ///    - last 为延长周 → 整个区块免评估 → false
    ///    - 该周即 last → true, 否则 false
    pub fn requires_primary_evaluator(
        &self,
        week_num: i32,
        context: &[RotationWeekInfo],
        service_week_size: Option<i32>,
        rotation_closed: bool,
    ) -> bool {
        if context.is_empty() {
            return false;
        }

        let matched = match context.iter().find(|w| w.week_num == week_num) {
            Some(w) => w,
            None => return false,
        };

        if rotation_closed {
            return false;
        }

        let size = match service_week_size {
            Some(size) if size > 0 => size,
            _ => return false,
        };

        if matched.is_extended_rotation {
            return false;
        }

        if size == 1 {
            return true;
        }

        let block = self.block_containing(week_num, context);
        let last_week = match block.last() {
            Some(w) => w,
            None => return false,
        };

        // 区块尾周为延长周: 区块尚未真正结束, 区块内所有周均免评估
        if last_week.is_extended_rotation {
            return false;
        }

        last_week.week_num == week_num
    }

    /// 求 week_num 所在区块（按 week_num 升序）
    ///
    /// 区块 = 从最近的 is_block_start_week 周（或窗口起点）开始,
    /// 到下一个 is_block_start_week 周之前（或窗口终点）为止。
    ///
    /// 重复 week_num 只保留输入顺序中的第一条。窗口中无该周时返回空。
    pub fn block_containing(&self, week_num: i32, context: &[RotationWeekInfo]) -> Vec<RotationWeekInfo> {
        let mut seen = HashSet::with_capacity(context.len());
        let mut weeks: Vec<RotationWeekInfo> = context
            .iter()
            .filter(|w| seen.insert(w.week_num))
            .copied()
            .collect();
        weeks.sort_by_key(|w| w.week_num);

        let idx = match weeks.iter().position(|w| w.week_num == week_num) {
            Some(idx) => idx,
            None => return Vec::new(),
        };

        let start = (0..=idx)
            .rev()
            .find(|&i| weeks[i].is_block_start_week)
            .unwrap_or(0);
        let end = (idx + 1..weeks.len())
            .find(|&i| weeks[i].is_block_start_week)
            .unwrap_or(weeks.len());

        weeks[start..end].to_vec()
    }
}
