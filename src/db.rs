// ==========================================
// 临床轮转排班核心 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建库脚本集中在 init_schema，幂等
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 说明：
/// - instructor_assignment 上的部分唯一索引在提交前兜底“每格至多一名主评估人”
/// - schedule_audit_log 不对 instructor_assignment 建外键：指派删除后审计仍需保留
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS rotation (
            rotation_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS week (
            week_id INTEGER PRIMARY KEY,
            week_num INTEGER NOT NULL,
            date_start TEXT
        );

        CREATE TABLE IF NOT EXISTS person (
            person_id INTEGER PRIMARY KEY,
            display_name TEXT,
            first_name TEXT,
            last_name TEXT,
            email TEXT
        );

        CREATE TABLE IF NOT EXISTS schedule_admin (
            login_id TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS rotation_editor (
            login_id TEXT NOT NULL,
            rotation_id INTEGER NOT NULL,
            PRIMARY KEY (login_id, rotation_id)
        );

        CREATE TABLE IF NOT EXISTS instructor_assignment (
            assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            instructor_id INTEGER NOT NULL,
            rotation_id INTEGER NOT NULL,
            week_id INTEGER NOT NULL,
            is_primary_evaluator INTEGER NOT NULL DEFAULT 0,
            role TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_assignment_instructor_week
            ON instructor_assignment(instructor_id, week_id);
        CREATE INDEX IF NOT EXISTS idx_assignment_slot
            ON instructor_assignment(rotation_id, week_id);
        CREATE UNIQUE INDEX IF NOT EXISTS ux_assignment_primary_slot
            ON instructor_assignment(rotation_id, week_id)
            WHERE is_primary_evaluator = 1;

        CREATE TABLE IF NOT EXISTS schedule_audit_log (
            audit_id INTEGER PRIMARY KEY AUTOINCREMENT,
            action TEXT NOT NULL,
            instructor_id INTEGER NOT NULL,
            rotation_id INTEGER NOT NULL,
            week_id INTEGER NOT NULL,
            modified_by TEXT NOT NULL,
            related_assignment_id INTEGER,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_assignment
            ON schedule_audit_log(related_assignment_id);
        CREATE INDEX IF NOT EXISTS idx_audit_slot
            ON schedule_audit_log(rotation_id, week_id);

        CREATE TABLE IF NOT EXISTS notification_outbox (
            message_id TEXT PRIMARY KEY,
            recipient TEXT NOT NULL,
            sender_address TEXT NOT NULL,
            subject TEXT NOT NULL,
            body TEXT NOT NULL,
            is_html INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'PENDING',
            created_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
