// ==========================================
// 公寓出租率统计 - 出租率 API
// ==========================================
// 职责: 参数校验 -> 取数快照 -> 纯计算，并提供工具调用的统一响应
// 架构: API 层 → TenancySource (仓储) + OccupancyAggregator (引擎)
// ==========================================
// 红线:
// - 校验失败时不访问存储
// - 工具响应永不 panic 穿透边界；要么完整结果，要么结构化错误
// ==========================================

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::instrument;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_window;
use crate::config::config_manager::ConfigManager;
use crate::domain::report::OccupancyAnalysis;
use crate::domain::types::CalcMethod;
use crate::engine::occupancy::{AggregationOptions, OccupancyAggregator};
use crate::repository::source::{SqliteTenancySource, TenancySource};

// ==========================================
// ToolResponse - 工具调用响应
// ==========================================
// {"status":"ok","request_id":..,"data":{..}}
// {"status":"error","request_id":..,"kind":"INVALID_DATE_FORMAT","message":..}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse {
    Ok {
        request_id: String,
        data: OccupancyAnalysis,
    },
    Error {
        request_id: String,
        kind: String,
        message: String,
    },
}

impl ToolResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolResponse::Ok { .. })
    }

    pub fn request_id(&self) -> &str {
        match self {
            ToolResponse::Ok { request_id, .. } | ToolResponse::Error { request_id, .. } => request_id,
        }
    }

    /// 序列化为 JSON 文本
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "工具响应序列化失败");
            format!(
                r#"{{"status":"error","request_id":"{}","kind":"COMPUTATION_UNAVAILABLE","message":"统计暂不可用，请稍后重试"}}"#,
                self.request_id()
            )
        })
    }
}

// ==========================================
// OccupancyApi - 出租率 API
// ==========================================
pub struct OccupancyApi {
    source: Arc<dyn TenancySource>,
    aggregator: OccupancyAggregator,
    default_calc_method: CalcMethod,
}

impl OccupancyApi {
    /// 创建新的 OccupancyApi 实例
    ///
    /// # 参数
    /// - source: 数据快照来源
    /// - options: 统计选项（兜底房间数、未知房型名称）
    /// - default_calc_method: 未传入口径时使用的口径
    pub fn new(
        source: Arc<dyn TenancySource>,
        options: AggregationOptions,
        default_calc_method: CalcMethod,
    ) -> Self {
        Self {
            source,
            aggregator: OccupancyAggregator::with_options(options),
            default_calc_method,
        }
    }

    /// 基于 SQLite 连接创建（配置取自 config_kv）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone());
        tracing::debug!(config = ?config.get_config_snapshot()?, "统计配置已加载");
        let options = config.get_aggregation_options()?;
        let default_calc_method = config.get_default_calc_method()?;
        Ok(Self::new(
            Arc::new(SqliteTenancySource::new(conn)),
            options,
            default_calc_method,
        ))
    }

    /// 出租率统计
    ///
    /// # 参数
    /// - start / end: `YYYY-MM-DD`，含首尾
    /// - calc_method: `period_avg` / `end_point`；None 时使用配置的默认口径
    ///
    /// # 返回
    /// - Ok(OccupancyAnalysis)
    /// - Err(ApiError): 参数错误或统计不可用
    #[instrument(skip(self))]
    pub fn analyze(
        &self,
        start: &str,
        end: &str,
        calc_method: Option<&str>,
    ) -> ApiResult<OccupancyAnalysis> {
        let window = validate_window(start, end, calc_method, self.default_calc_method)
            .map_err(|e| {
                tracing::warn!(error = %e, "出租率统计参数校验失败");
                e
            })?;

        tracing::info!(
            start = %window.start_date,
            end = %window.end_date,
            mode = %window.mode,
            "开始出租率统计"
        );

        let catalog = self.source.load_catalog()?;
        let intervals = self.source.fetch_intervals(&window)?;

        Ok(self.aggregator.analyze(&window, &intervals, &catalog))
    }

    /// 工具调用入口
    ///
    /// 所有错误转换为结构化响应
    pub fn analyze_tool(&self, start: &str, end: &str, calc_method: Option<&str>) -> ToolResponse {
        let request_id = Uuid::new_v4().to_string();
        match self.analyze(start, end, calc_method) {
            Ok(data) => ToolResponse::Ok { request_id, data },
            Err(err) => {
                if !err.is_validation_error() {
                    tracing::error!(request_id = %request_id, kind = err.kind(), "出租率统计失败");
                }
                error_response(request_id, &err)
            }
        }
    }
}

fn error_response(request_id: String, err: &ApiError) -> ToolResponse {
    ToolResponse::Error {
        request_id,
        kind: err.kind().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::room_type::{RoomTypeCatalog, RoomTypeMeta};
    use crate::domain::tenancy::TenancyInterval;
    use crate::domain::window::AggregationWindow;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use crate::repository::source::InMemoryTenancySource;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn a101_source() -> InMemoryTenancySource {
        let catalog = RoomTypeCatalog::from_entries(vec![RoomTypeMeta {
            code: "STD".to_string(),
            display_name: "标准间".to_string(),
            area_m2: 30.0,
            room_count: 1,
        }]);
        let intervals = vec![TenancyInterval {
            contract_no: "C001".to_string(),
            room_number: "A101".to_string(),
            room_type_code: "STD".to_string(),
            check_in_date: d(2025, 1, 1),
            check_out_date: d(2025, 1, 11),
            monthly_rent: 3000.0,
        }];
        InMemoryTenancySource::new(catalog, intervals)
    }

    /// 记录访问次数、始终失败的数据源
    struct FailingSource {
        calls: Cell<u32>,
    }

    impl TenancySource for FailingSource {
        fn load_catalog(&self) -> RepositoryResult<RoomTypeCatalog> {
            self.calls.set(self.calls.get() + 1);
            Err(RepositoryError::DatabaseQueryError("disk I/O error".into()))
        }

        fn fetch_intervals(&self, _window: &AggregationWindow) -> RepositoryResult<Vec<TenancyInterval>> {
            self.calls.set(self.calls.get() + 1);
            Err(RepositoryError::DatabaseQueryError("disk I/O error".into()))
        }
    }

    fn api(source: Arc<dyn TenancySource>) -> OccupancyApi {
        OccupancyApi::new(source, AggregationOptions::default(), CalcMethod::PeriodAvg)
    }

    #[test]
    fn test_analyze_period() {
        let api = api(Arc::new(a101_source()));
        let analysis = api.analyze("2025-01-01", "2025-01-10", Some("period_avg")).unwrap();
        assert_eq!(analysis.overall.occupancy_rate, 100.0);
        assert_eq!(analysis.summary.total_revenue, 1000.0);
    }

    #[test]
    fn test_tool_response_shapes() {
        let api = api(Arc::new(a101_source()));

        let ok = api.analyze_tool("2025-01-01", "2025-01-15", Some("end_point"));
        assert!(ok.is_ok());
        let json: serde_json::Value = serde_json::from_str(&ok.to_json()).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["data"]["overall"]["occupancy_rate"], 0.0);

        let err = api.analyze_tool("2025-13-01", "2025-01-15", None);
        let json: serde_json::Value = serde_json::from_str(&err.to_json()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "INVALID_DATE_FORMAT");
        assert!(json["message"].as_str().unwrap().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_validation_happens_before_fetch() {
        let source = Arc::new(FailingSource { calls: Cell::new(0) });
        let api = api(source.clone());

        let err = api.analyze("2025-02-01", "2025-01-01", None).unwrap_err();
        assert_eq!(err.kind(), "INVALID_DATE_RANGE");
        assert_eq!(source.calls.get(), 0);

        let err = api.analyze("2025-01-01", "2025-01-31", Some("weekly")).unwrap_err();
        assert_eq!(err.kind(), "INVALID_MODE");
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_storage_failure_is_opaque() {
        let source = Arc::new(FailingSource { calls: Cell::new(0) });
        let api = api(source.clone());

        let response = api.analyze_tool("2025-01-01", "2025-01-31", None);
        match response {
            ToolResponse::Error { kind, message, .. } => {
                assert_eq!(kind, "COMPUTATION_UNAVAILABLE");
                assert!(!message.contains("disk"));
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert_eq!(source.calls.get(), 1);
    }
}
