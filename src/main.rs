// ==========================================
// 公寓出租率统计 - 命令行入口
// ==========================================
// 用法:
//   apartment-occupancy [db_path] <start> <end> [calc_method]
//
// 未传 db_path 时使用 APARTMENT_OCCUPANCY_DB_PATH 或用户数据目录；
// 输出为工具响应 JSON（status = ok / error）
// ==========================================

use anyhow::Context;
use apartment_occupancy::api::OccupancyApi;
use apartment_occupancy::config::get_default_db_path;
use apartment_occupancy::db::open_and_init;
use apartment_occupancy::logging;
use std::sync::{Arc, Mutex};

const USAGE: &str = "用法: apartment-occupancy [db_path] <start YYYY-MM-DD> <end YYYY-MM-DD> [period_avg|end_point]";

/// 命令行参数
struct CliArgs {
    db_path: String,
    start: String,
    end: String,
    calc_method: Option<String>,
}

/// 解析位置参数
///
/// 三个参数时，若第一个参数形如日期则视为 `<start> <end> <calc_method>`
fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let looks_like_date = |s: &str| {
        s.len() == 10 && s.chars().enumerate().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        })
    };

    let mut args = args.into_iter();
    let parsed = match args.len() {
        2 => CliArgs {
            db_path: get_default_db_path(),
            start: args.next().context(USAGE)?,
            end: args.next().context(USAGE)?,
            calc_method: None,
        },
        3 => {
            let first = args.next().context(USAGE)?;
            if looks_like_date(&first) {
                CliArgs {
                    db_path: get_default_db_path(),
                    start: first,
                    end: args.next().context(USAGE)?,
                    calc_method: args.next(),
                }
            } else {
                CliArgs {
                    db_path: first,
                    start: args.next().context(USAGE)?,
                    end: args.next().context(USAGE)?,
                    calc_method: None,
                }
            }
        }
        4 => CliArgs {
            db_path: args.next().context(USAGE)?,
            start: args.next().context(USAGE)?,
            end: args.next().context(USAGE)?,
            calc_method: args.next(),
        },
        _ => anyhow::bail!(USAGE),
    };
    Ok(parsed)
}

fn main() -> anyhow::Result<()> {
    logging::init_from_env();

    let args = parse_args(std::env::args().skip(1).collect())?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", apartment_occupancy::APP_NAME, apartment_occupancy::VERSION);
    tracing::info!("使用数据库: {}", args.db_path);
    tracing::info!("==================================================");

    let conn = open_and_init(&args.db_path)
        .with_context(|| format!("无法打开数据库: {}", args.db_path))?;
    let api = OccupancyApi::from_connection(Arc::new(Mutex::new(conn)))?;

    let response = api.analyze_tool(&args.start, &args.end, args.calc_method.as_deref());
    let json = serde_json::to_string_pretty(&response)?;
    println!("{}", json);

    if !response.is_ok() {
        std::process::exit(2);
    }
    Ok(())
}
