// ==========================================
// 临床轮转排班核心 - API 层
// ==========================================
// 职责: 对外暴露排班编辑与查询接口
// ==========================================

pub mod error;
pub mod schedule_editor;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use schedule_editor::ScheduleEditor;
