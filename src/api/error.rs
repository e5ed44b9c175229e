// ==========================================
// 临床轮转排班核心 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为调用方可理解的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::domain::RotationWeek;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 排班规则错误
    // ==========================================
    #[error("无编辑权限 (permission denied): login_id={login_id}, rotation_id={rotation_id}")]
    PermissionDenied { login_id: String, rotation_id: i64 },

    /// 同一周已在其他轮转带教
    #[error(
        "排班冲突 (scheduling conflict): instructor_id={instructor_id} is already scheduled in {}",
        format_slots(.conflicts)
    )]
    ScheduleConflict {
        instructor_id: i64,
        conflicts: Vec<RotationWeek>,
    },

    #[error(
        "不可移除唯一主评估人: the sole primary evaluator cannot be removed \
         (assignment_id={assignment_id}, rotation_id={rotation_id}, week_id={week_id})"
    )]
    CannotRemoveSolePrimaryEvaluator {
        assignment_id: i64,
        rotation_id: i64,
        week_id: i64,
    },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("操作已取消")]
    Cancelled,

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_slots(slots: &[RotationWeek]) -> String {
    slots
        .iter()
        .map(|s| format!("rotation {} / week {}", s.rotation_id, s.week_id))
        .collect::<Vec<_>>()
        .join(", ")
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            // 并发写入同一格的主评估人时由部分唯一索引兜底
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 入参校验辅助函数
// ==========================================

/// 校验 ID 为正数
pub fn validate_positive_id(field: &str, id: i64) -> ApiResult<()> {
    if id <= 0 {
        return Err(ApiError::InvalidInput(format!("{} 必须为正数: {}", field, id)));
    }
    Ok(())
}

/// 校验周列表非空且 ID 合法
pub fn validate_week_ids(week_ids: &[i64]) -> ApiResult<()> {
    if week_ids.is_empty() {
        return Err(ApiError::InvalidInput("week_ids 不能为空".to_string()));
    }
    for &week_id in week_ids {
        validate_positive_id("week_id", week_id)?;
    }
    Ok(())
}
