// ==========================================
// 出租率统计端到端测试
// ==========================================
// 测试目标: SQLite 取数 -> 引擎计算 -> API 结果
// ==========================================


use apartment_occupancy::api::OccupancyApi;
use apartment_occupancy::domain::{CalcMethod, DataQualityKind};
use apartment_occupancy::logging;
use test_helpers::{d, open_shared, room_type, seed, tenancy};

fn std_api(intervals: &[apartment_occupancy::TenancyInterval], room_count: u32) -> (tempfile::NamedTempFile, OccupancyApi) {
    logging::init_test();
    let (temp_file, db_path) = test_helpers::create_test_db().expect("Failed to create test db");
    let conn = open_shared(&db_path);
    seed(&conn, &[room_type("STD", "标准间", 30.0, room_count)], intervals);
    let api = OccupancyApi::from_connection(conn).expect("Failed to create api");
    (temp_file, api)
}

// ==========================================
// 典型场景
// ==========================================

#[test]
fn test_single_room_full_period() {
    let (_tmp, api) = std_api(
        &[tenancy("C001", "A101", "STD", d(2025, 1, 1), d(2025, 1, 11), 3000.0)],
        1,
    );

    let analysis = api
        .analyze("2025-01-01", "2025-01-10", Some("period_avg"))
        .unwrap();

    assert_eq!(analysis.overall.mode, CalcMethod::PeriodAvg);
    assert_eq!(analysis.overall.occupied, 10);
    assert_eq!(analysis.overall.total_available, 10);
    assert_eq!(analysis.overall.occupancy_rate, 100.0);

    let std = &analysis.room_types[0];
    assert_eq!(std.period.revenue, 1000.0);
    assert_eq!(std.period.adr, 100.0);
    assert!(analysis.warnings.is_empty());
}

#[test]
fn test_end_point_after_checkout_is_empty() {
    let (_tmp, api) = std_api(
        &[tenancy("C001", "A101", "STD", d(2025, 1, 1), d(2025, 1, 11), 3000.0)],
        1,
    );

    let analysis = api
        .analyze("2025-01-01", "2025-01-15", Some("end_point"))
        .unwrap();

    assert_eq!(analysis.overall.occupied, 0);
    assert_eq!(analysis.overall.occupancy_rate, 0.0);
    assert_eq!(analysis.room_types[0].end_point.run_rate_revenue, 0.0);
}

#[test]
fn test_overlapping_contracts_on_one_room() {
    let (_tmp, api) = std_api(
        &[
            tenancy("C001", "B1", "STD", d(2025, 2, 1), d(2025, 2, 5), 3000.0),
            tenancy("C002", "B1", "STD", d(2025, 2, 3), d(2025, 2, 8), 4500.0),
        ],
        1,
    );

    let analysis = api
        .analyze("2025-02-01", "2025-02-07", Some("period_avg"))
        .unwrap();

    assert_eq!(analysis.overall.occupied, 7);
    assert_eq!(analysis.summary.total_revenue, 1150.0);

    let extrema = &analysis.room_types[0].extrema;
    assert_eq!(extrema.max_monthly_rent.as_ref().unwrap().contract_no, "C002");
    assert_eq!(extrema.min_monthly_rent.as_ref().unwrap().contract_no, "C001");
    assert_eq!(extrema.max_daily_rent.as_ref().unwrap().value, 150.0);
}

// ==========================================
// 通用性质
// ==========================================

#[test]
fn test_duplicate_family_contracts_count_one_night_each_day() {
    let intervals: Vec<_> = (0..4)
        .map(|i| tenancy(&format!("F{:03}", i), "C301", "STD", d(2025, 3, 1), d(2025, 4, 1), 2000.0))
        .collect();
    let (_tmp, api) = std_api(&intervals, 2);

    let analysis = api.analyze("2025-03-01", "2025-03-31", None).unwrap();
    assert_eq!(analysis.overall.occupied, 31);
    assert_eq!(analysis.overall.occupancy_rate, 50.0);
    // 营收按合同叠加: 4 × 2000/30 × 31
    assert_eq!(
        analysis.summary.total_revenue,
        ((4.0 * 2000.0 / 30.0 * 31.0) * 100.0_f64).round() / 100.0
    );
}

#[test]
fn test_rates_are_bounded_and_ordered() {
    let (_tmp, api) = std_api(
        &[
            tenancy("C1", "A1", "STD", d(2024, 12, 15), d(2025, 1, 10), 3000.0),
            tenancy("C2", "A1", "STD", d(2025, 1, 20), d(2025, 3, 1), 3200.0),
            tenancy("C3", "A2", "STD", d(2025, 1, 25), d(2025, 6, 1), 2800.0),
            tenancy("C4", "A3", "STD", d(2025, 2, 10), d(2025, 8, 1), 3500.0),
        ],
        4,
    );

    for mode in ["period_avg", "end_point"] {
        let analysis = api.analyze("2025-01-01", "2025-01-31", Some(mode)).unwrap();
        let overall = &analysis.overall;
        assert!(overall.occupancy_rate >= 0.0);
        assert!(overall.occupancy_rate <= overall.application_rate);
        assert!(overall.application_rate <= 100.0);
        assert!((overall.vacancy_rate + overall.occupancy_rate - 100.0).abs() < 0.011);
    }

    // 期末: A1、A2 在住；A3 在窗口之后才入住，不计入
    let end_point = api
        .analyze("2025-01-01", "2025-01-31", Some("end_point"))
        .unwrap();
    assert_eq!(end_point.overall.occupied, 2);
    assert_eq!(end_point.overall.applied, 2);
}

#[test]
fn test_contract_after_window_does_not_change_applied() {
    let (_tmp, api) = std_api(
        &[tenancy("C1", "A1", "STD", d(2030, 6, 1), d(2030, 7, 1), 3000.0)],
        2,
    );

    let analysis = api
        .analyze("2025-01-01", "2025-01-31", Some("end_point"))
        .unwrap();
    assert_eq!(analysis.overall.occupied, 0);
    assert_eq!(analysis.overall.applied, 0);
    assert_eq!(analysis.overall.application_rate, 0.0);
    assert_eq!(analysis.summary.run_rate_revenue, 0.0);
}

#[test]
fn test_single_day_modes_agree_on_occupancy() {
    let (_tmp, api) = std_api(
        &[
            tenancy("C1", "A1", "STD", d(2025, 1, 1), d(2025, 1, 31), 3000.0),
            tenancy("C2", "A2", "STD", d(2025, 1, 15), d(2025, 2, 15), 3000.0),
            tenancy("C3", "A3", "STD", d(2025, 1, 15), d(2025, 1, 16), 3000.0),
        ],
        5,
    );

    for day in ["2025-01-14", "2025-01-15", "2025-01-30", "2025-01-31"] {
        let period = api.analyze(day, day, Some("period_avg")).unwrap();
        let point = api.analyze(day, day, Some("end_point")).unwrap();
        assert_eq!(
            period.overall.occupancy_rate, point.overall.occupancy_rate,
            "day {}",
            day
        );
    }
}

#[test]
fn test_boundary_days() {
    let (_tmp, api) = std_api(
        &[
            // 离店日 == 开始日: 不贡献
            tenancy("C1", "A1", "STD", d(2025, 1, 1), d(2025, 1, 10), 3000.0),
            // 入住日 == 结束日: 期末口径计 1 间
            tenancy("C2", "A2", "STD", d(2025, 1, 20), d(2025, 2, 20), 3000.0),
        ],
        2,
    );

    let period = api.analyze("2025-01-10", "2025-01-20", Some("period_avg")).unwrap();
    assert_eq!(period.overall.occupied, 1);

    let point = api.analyze("2025-01-10", "2025-01-20", Some("end_point")).unwrap();
    assert_eq!(point.overall.occupied, 1);
    assert_eq!(point.overall.occupancy_rate, 50.0);
}

#[test]
fn test_unknown_room_type_and_over_capacity_warnings() {
    let (_tmp, api) = std_api(
        &[
            tenancy("C1", "A1", "STD", d(2025, 1, 1), d(2025, 2, 1), 3000.0),
            tenancy("C2", "A2", "STD", d(2025, 1, 1), d(2025, 2, 1), 3000.0),
            tenancy("C3", "Z1", "LOFT", d(2025, 1, 1), d(2025, 2, 1), 5000.0),
        ],
        1,
    );

    let analysis = api.analyze("2025-01-01", "2025-01-10", None).unwrap();
    // 目录 1 间 + 未知房型 1 间
    assert_eq!(analysis.overall.total_room_count, 2);
    assert!(analysis.overall.occupancy_rate <= 100.0);
    assert!(analysis
        .warnings
        .iter()
        .any(|w| w.kind == DataQualityKind::OverCapacity));
    assert!(analysis
        .warnings
        .iter()
        .any(|w| w.kind == DataQualityKind::UnknownRoomType));

    let unknown = analysis.room_types.last().unwrap();
    assert!(!unknown.in_catalog);
    assert_eq!(unknown.period.revenue, round2(5000.0 / 30.0 * 10.0));
}

#[test]
fn test_unknown_rooms_count_toward_overall_total() {
    let (_tmp, api) = std_api(
        &[
            tenancy("C1", "A1", "STD", d(2025, 1, 1), d(2025, 1, 11), 3000.0),
            tenancy("C2", "Z1", "LOFT", d(2025, 1, 1), d(2025, 1, 11), 3000.0),
        ],
        1,
    );

    let analysis = api
        .analyze("2025-01-01", "2025-01-10", Some("period_avg"))
        .unwrap();
    assert_eq!(analysis.overall.total_room_count, 2);
    assert_eq!(analysis.overall.occupancy_rate, 100.0);
    assert!(!analysis
        .warnings
        .iter()
        .any(|w| w.kind == DataQualityKind::OverCapacity && w.scope == "ALL"));
    assert!(analysis
        .warnings
        .iter()
        .any(|w| w.kind == DataQualityKind::UnknownRoomType));
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
