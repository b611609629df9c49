// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认日志级别
const DEFAULT_FILTER: &str = "info";

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "APARTMENT_OCCUPANCY_LOG_FORMAT";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=apartment_occupancy::engine=trace
///
/// 日志写到 stderr，stdout 只留给 JSON 输出
///
/// # 示例
/// ```no_run
/// use apartment_occupancy::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .try_init();
}

/// 初始化 JSON 格式日志（便于采集）
pub fn init_json() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_current_span(true)
        .try_init();
}

/// 按 APARTMENT_OCCUPANCY_LOG_FORMAT 选择日志格式（json / 文本）
pub fn init_from_env() {
    match std::env::var(LOG_FORMAT_ENV) {
        Ok(v) if v.trim().eq_ignore_ascii_case("json") => init_json(),
        _ => init(),
    }
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
