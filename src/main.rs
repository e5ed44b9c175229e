// ==========================================
// 临床轮转排班核心 - 命令行入口
// ==========================================
// 初始化日志与数据库, 输出状态摘要
// ==========================================

use rotation_scheduler::app::{get_default_db_path, AppState};
use rotation_scheduler::logging;

fn main() {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", rotation_scheduler::APP_NAME);
    tracing::info!("系统版本: {}", rotation_scheduler::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("AppState初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    match app_state.status() {
        Ok(status) => {
            tracing::info!(
                "schema_version={:?}, assignments={}, audit_records={}, pending_notifications={}",
                status.schema_version,
                status.assignment_count,
                status.audit_record_count,
                status.pending_notifications
            );
            match serde_json::to_string_pretty(&status) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!("状态序列化失败: {}", e),
            }
        }
        Err(e) => {
            tracing::error!("状态读取失败: {}", e);
            std::process::exit(1);
        }
    }
}
