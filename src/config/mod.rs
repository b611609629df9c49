// ==========================================
// 公寓出租率统计 - 配置层
// ==========================================
// 职责: 系统配置管理（统计兜底参数、默认口径、数据库路径）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, get_default_db_path, ConfigManager, DB_PATH_ENV};
