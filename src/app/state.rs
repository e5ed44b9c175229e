// ==========================================
// 临床轮转排班核心 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;

use crate::api::ScheduleEditor;
use crate::app::adapters::{OutboxNotificationDispatcher, SqlitePermissionAuthority};
use crate::config::ConfigManager;
use crate::engine::capabilities::NotificationDispatcher;
use crate::engine::{EvaluationPolicy, PrimaryEvaluatorNotifier};
use crate::repository::{
    AssignmentRepository, AuditLogRepository, DirectoryRepository, NotificationOutboxRepository,
    SqliteTransactionRunner,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "ROTATION_SCHEDULER_DB";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享连接
    pub conn: Arc<Mutex<Connection>>,

    /// 排班编辑API
    pub schedule_editor: Arc<ScheduleEditor>,

    /// 评估周判定（纯函数, 供调用方直接使用）
    pub evaluation_policy: EvaluationPolicy,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 目录仓储（轮转/周/人员/授权）
    pub directory_repo: Arc<DirectoryRepository>,

    /// 审计日志仓储（历史查询）
    pub audit_log_repo: Arc<AuditLogRepository>,

    /// 通知发件箱仓储
    pub outbox_repo: Arc<NotificationOutboxRepository>,
}

/// 启动状态摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppStatus {
    pub schema_version: Option<i64>,
    pub assignment_count: i64,
    pub audit_record_count: i64,
    pub pending_notifications: usize,
}

impl AppState {
    /// 创建新的AppState实例（通知写入发件箱）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        let conn = open_shared_connection(&db_path)?;
        let outbox_repo = Arc::new(NotificationOutboxRepository::new(conn.clone()));
        let dispatcher = Arc::new(OutboxNotificationDispatcher::new(outbox_repo.clone()));
        Self::assemble(db_path, conn, outbox_repo, dispatcher)
    }

    /// 使用指定通知发送器创建AppState
    pub fn with_dispatcher(db_path: String, dispatcher: Arc<dyn NotificationDispatcher>) -> Result<Self, String> {
        let conn = open_shared_connection(&db_path)?;
        let outbox_repo = Arc::new(NotificationOutboxRepository::new(conn.clone()));
        Self::assemble(db_path, conn, outbox_repo, dispatcher)
    }

    fn assemble(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        outbox_repo: Arc<NotificationOutboxRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法初始化ConfigManager: {}", e))?,
        );
        let directory_repo = Arc::new(DirectoryRepository::new(conn.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine与API层
        // ==========================================
        let notifier = Arc::new(PrimaryEvaluatorNotifier::new(
            dispatcher,
            directory_repo.clone(),
            config_manager.clone(),
        ));
        let schedule_editor = Arc::new(ScheduleEditor::new(
            Arc::new(SqliteTransactionRunner::new(conn.clone())),
            Arc::new(SqlitePermissionAuthority::new(directory_repo.clone())),
            notifier,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            conn,
            schedule_editor,
            evaluation_policy: EvaluationPolicy::new(),
            config_manager,
            directory_repo,
            audit_log_repo,
            outbox_repo,
        })
    }

    /// 状态摘要
    pub fn status(&self) -> Result<AppStatus, String> {
        let (schema_version, assignment_count) = {
            let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            let version = crate::db::read_schema_version(&conn).map_err(|e| e.to_string())?;
            let count = AssignmentRepository::new(&conn).count_all().map_err(|e| e.to_string())?;
            (version, count)
        };

        Ok(AppStatus {
            schema_version,
            assignment_count,
            audit_record_count: self.audit_log_repo.count().map_err(|e| e.to_string())?,
            pending_notifications: self
                .outbox_repo
                .list_pending(i32::MAX)
                .map_err(|e| e.to_string())?
                .len(),
        })
    }
}

fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, String> {
    tracing::info!("初始化AppState，数据库路径: {}", db_path);

    let conn = crate::db::open_sqlite_connection(db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
    crate::db::init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 默认数据库路径
///
/// 优先级: 环境变量 ROTATION_SCHEDULER_DB → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./rotation_scheduler.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("rotation-scheduler");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("rotation_scheduler.db");
        }
    }

    path.to_string_lossy().to_string()
}
