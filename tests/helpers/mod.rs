// ==========================================
// 集成测试辅助模块
// ==========================================

#![allow(dead_code)]

pub mod fakes;
pub mod memory_store;
