// ==========================================
// 临床轮转排班核心 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 兽医教学医院临床轮转带教排班
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排班规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装与生产适配器
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    Assignment, AuditAction, AuditRecord, Caller, NotificationRequest, PrimaryEvaluatorChange,
    RotationWeek, RotationWeekInfo,
};

// 引擎
pub use engine::{CancellationToken, ConflictDetector, EvaluationPolicy, PrimaryEvaluatorInvariant};

// API
pub use api::{ApiError, ApiResult, ScheduleEditor};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "临床轮转排班核心";
