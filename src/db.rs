// ==========================================
// 公寓出租率统计 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供最小建表脚本（租约、房型、房间、配置）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表脚本
///
/// 说明：
/// - contract_creation_log 允许同一房间多条重叠合同（合租/续约）
/// - 日期统一存 `YYYY-MM-DD` 文本，便于字典序比较
const SCHEMA_SQL: &str = r#"
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

CREATE TABLE IF NOT EXISTS dim_room_type (
    room_code TEXT PRIMARY KEY,
    room_code_desc TEXT,
    area_sqm REAL,
    room_count INTEGER
);

CREATE TABLE IF NOT EXISTS room_details (
    room_number TEXT PRIMARY KEY,
    room_code TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_creation_log (
    contract_no TEXT PRIMARY KEY,
    room_number TEXT NOT NULL,
    room_code TEXT NOT NULL,
    actual_monthly_rent REAL,               -- 允许为空（历史数据），读取时按 0 处理
    check_in_date TEXT NOT NULL,
    check_out_date TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_contract_dates
    ON contract_creation_log (check_out_date, check_in_date);
CREATE INDEX IF NOT EXISTS idx_contract_room
    ON contract_creation_log (room_code, room_number);
"#;

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

/// 初始化表结构（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
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

/// 打开数据库并确保表结构存在；版本不一致时仅告警
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;
    match read_schema_version(&conn)? {
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                db_path,
                found = v,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 与当前代码不一致"
            );
        }
        _ => {}
    }
    Ok(conn)
}
