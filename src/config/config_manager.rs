// ==========================================
// 公寓出租率统计 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::domain::room_type::UNKNOWN_ROOM_TYPE_LABEL;
use crate::domain::types::CalcMethod;
use crate::engine::occupancy::{AggregationOptions, DEFAULT_FALLBACK_TOTAL_ROOMS};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "APARTMENT_OCCUPANCY_DB_PATH";

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取 global scope 全部配置
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    // ===== 统计配置 =====

    /// 房型目录为空时的房间总数（默认 579）
    pub fn get_fallback_total_rooms(&self) -> RepositoryResult<u32> {
        let default = DEFAULT_FALLBACK_TOTAL_ROOMS.to_string();
        let value = self.get_config_or_default(config_keys::FALLBACK_TOTAL_ROOMS, &default)?;
        match value.trim().parse::<u32>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = config_keys::FALLBACK_TOTAL_ROOMS,
                    raw_value = %value,
                    "房间总数配置格式错误，使用默认值"
                );
                Ok(DEFAULT_FALLBACK_TOTAL_ROOMS)
            }
        }
    }

    /// 未传入口径时使用的默认统计口径
    pub fn get_default_calc_method(&self) -> RepositoryResult<CalcMethod> {
        let value = self.get_config_or_default(
            config_keys::DEFAULT_CALC_METHOD,
            CalcMethod::PeriodAvg.as_str(),
        )?;
        Ok(CalcMethod::parse(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::DEFAULT_CALC_METHOD,
                raw_value = %value,
                "统计口径配置无效，使用 period_avg"
            );
            CalcMethod::PeriodAvg
        }))
    }

    /// 未知房型桶展示名
    pub fn get_unknown_room_type_label(&self) -> RepositoryResult<String> {
        let value = self.get_config_or_default(
            config_keys::UNKNOWN_ROOM_TYPE_LABEL,
            UNKNOWN_ROOM_TYPE_LABEL,
        )?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(UNKNOWN_ROOM_TYPE_LABEL.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    /// 组装统计选项
    pub fn get_aggregation_options(&self) -> RepositoryResult<AggregationOptions> {
        Ok(AggregationOptions {
            fallback_total_rooms: self.get_fallback_total_rooms()?,
            unknown_room_type_label: self.get_unknown_room_type_label()?,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 APARTMENT_OCCUPANCY_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./apartment_occupancy.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("apartment-occupancy");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "无法创建数据目录，使用当前目录");
        } else {
            path = dir.join("apartment_occupancy.db");
        }
    }

    path.to_string_lossy().to_string()
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 房型目录为空时的房间总数
    pub const FALLBACK_TOTAL_ROOMS: &str = "fallback_total_rooms";

    // 默认统计口径 (period_avg / end_point)
    pub const DEFAULT_CALC_METHOD: &str = "default_calc_method";

    // 未知房型展示名
    pub const UNKNOWN_ROOM_TYPE_LABEL: &str = "unknown_room_type_label";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_defaults_when_missing() {
        let config = manager();
        assert_eq!(config.get_fallback_total_rooms().unwrap(), 579);
        assert_eq!(config.get_default_calc_method().unwrap(), CalcMethod::PeriodAvg);
        assert_eq!(config.get_unknown_room_type_label().unwrap(), "未知房型");
    }

    #[test]
    fn test_overrides_are_read() {
        let config = manager();
        config
            .set_global_config_value(config_keys::FALLBACK_TOTAL_ROOMS, "120")
            .unwrap();
        config
            .set_global_config_value(config_keys::DEFAULT_CALC_METHOD, "END_POINT")
            .unwrap();

        let options = config.get_aggregation_options().unwrap();
        assert_eq!(options.fallback_total_rooms, 120);
        assert_eq!(config.get_default_calc_method().unwrap(), CalcMethod::EndPoint);
        assert_eq!(config.get_config_snapshot().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = manager();
        config
            .set_global_config_value(config_keys::FALLBACK_TOTAL_ROOMS, "abc")
            .unwrap();
        config
            .set_global_config_value(config_keys::DEFAULT_CALC_METHOD, "weekly")
            .unwrap();
        config
            .set_global_config_value(config_keys::UNKNOWN_ROOM_TYPE_LABEL, "  ")
            .unwrap();

        assert_eq!(config.get_fallback_total_rooms().unwrap(), 579);
        assert_eq!(config.get_default_calc_method().unwrap(), CalcMethod::PeriodAvg);
        assert_eq!(config.get_unknown_room_type_label().unwrap(), "未知房型");
    }
}
