// ==========================================
// API 层集成测试
// ==========================================
// 测试目标: 工具响应结构、参数校验、配置驱动的默认口径
// ==========================================


use apartment_occupancy::api::{OccupancyApi, ToolResponse};
use apartment_occupancy::config::{config_keys, ConfigManager};
use apartment_occupancy::domain::CalcMethod;
use apartment_occupancy::logging;
use serde_json::Value;
use test_helpers::{create_test_db, d, open_shared, room_type, seed, tenancy};

fn seeded_conn() -> (tempfile::NamedTempFile, std::sync::Arc<std::sync::Mutex<rusqlite::Connection>>) {
    logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_shared(&db_path);
    seed(
        &conn,
        &[room_type("STD", "标准间", 30.0, 4)],
        &[
            tenancy("C1", "A1", "STD", d(2025, 1, 1), d(2025, 3, 1), 3000.0),
            tenancy("C2", "A2", "STD", d(2025, 2, 1), d(2025, 4, 1), 3600.0),
        ],
    );
    (temp_file, conn)
}

#[test]
fn test_tool_response_ok_shape() {
    let (_tmp, conn) = seeded_conn();
    let api = OccupancyApi::from_connection(conn).unwrap();

    let response = api.analyze_tool("2025-01-01", "2025-01-31", Some("end_point"));
    assert!(response.is_ok());
    assert!(!response.request_id().is_empty());

    let json: Value = serde_json::from_str(&response.to_json()).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["overall"]["mode"], "end_point");
    assert_eq!(json["data"]["overall"]["occupied"], 1);
    // C2 在窗口之后入住，不计为预定
    assert_eq!(json["data"]["overall"]["applied"], 1);
    assert_eq!(json["data"]["room_types"][0]["code"], "STD");
}

#[test]
fn test_tool_response_error_kinds() {
    let (_tmp, conn) = seeded_conn();
    let api = OccupancyApi::from_connection(conn).unwrap();

    let cases = [
        ("2025/01/01", "2025-01-31", None, "INVALID_DATE_FORMAT"),
        ("2025-02-30", "2025-03-01", None, "INVALID_DATE_FORMAT"),
        ("2025-02-01", "2025-01-01", None, "INVALID_DATE_RANGE"),
        ("2025-01-01", "2025-01-31", Some("weekly"), "INVALID_MODE"),
    ];

    for (start, end, mode, expected_kind) in cases {
        let response = api.analyze_tool(start, end, mode);
        match response {
            ToolResponse::Error { kind, message, .. } => {
                assert_eq!(kind, expected_kind, "{} {} {:?}", start, end, mode);
                assert!(message.starts_with("输入错误"));
            }
            ToolResponse::Ok { .. } => panic!("expected error for {} {} {:?}", start, end, mode),
        }
    }
}

#[test]
fn test_default_calc_method_from_config() {
    let (_tmp, conn) = seeded_conn();
    let config = ConfigManager::from_connection(conn.clone());
    config
        .set_global_config_value(config_keys::DEFAULT_CALC_METHOD, "end_point")
        .unwrap();

    let api = OccupancyApi::from_connection(conn.clone()).unwrap();
    let analysis = api.analyze("2025-02-01", "2025-02-28", None).unwrap();
    assert_eq!(analysis.overall.mode, CalcMethod::EndPoint);
    assert_eq!(analysis.overall.occupied, 2);
    assert_eq!(analysis.overall.occupancy_rate, 50.0);

    // 显式口径优先于配置
    let analysis = api
        .analyze("2025-02-01", "2025-02-28", Some("period_avg"))
        .unwrap();
    assert_eq!(analysis.overall.mode, CalcMethod::PeriodAvg);
    assert_eq!(analysis.overall.total_available, 4 * 28);
}

#[test]
fn test_configured_fallback_and_unknown_label() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_shared(&db_path);
    seed(
        &conn,
        &[],
        &[tenancy("C1", "A1", "LOFT", d(2025, 1, 1), d(2025, 2, 1), 3000.0)],
    );

    let config = ConfigManager::from_connection(conn.clone());
    config
        .set_global_config_value(config_keys::FALLBACK_TOTAL_ROOMS, "10")
        .unwrap();
    config
        .set_global_config_value(config_keys::UNKNOWN_ROOM_TYPE_LABEL, "其他")
        .unwrap();

    let api = OccupancyApi::from_connection(conn).unwrap();
    let analysis = api
        .analyze("2025-01-01", "2025-01-31", Some("end_point"))
        .unwrap();

    assert_eq!(analysis.overall.total_room_count, 10);
    assert_eq!(analysis.overall.occupancy_rate, 10.0);
    let unknown = analysis.room_types.last().unwrap();
    assert_eq!(unknown.display_name, "其他");
}
