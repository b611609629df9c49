// ==========================================
// 公寓出租率统计 - 数据快照接口
// ==========================================
// 职责: 为统计引擎提供只读快照（房型目录 + 租约区间）
// 实现: SqliteTenancySource (生产) / InMemoryTenancySource (测试、嵌入)
// ==========================================

use crate::domain::room_type::RoomTypeCatalog;
use crate::domain::tenancy::TenancyInterval;
use crate::domain::window::AggregationWindow;
use crate::repository::contract_repo::TenancyRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::room_type_repo::RoomTypeRepository;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 统计数据来源
pub trait TenancySource {
    /// 房型目录快照
    fn load_catalog(&self) -> RepositoryResult<RoomTypeCatalog>;

    /// 与窗口相交的租约快照（引擎仍会按窗口再过滤一次）
    fn fetch_intervals(&self, window: &AggregationWindow) -> RepositoryResult<Vec<TenancyInterval>>;
}

// ==========================================
// SqliteTenancySource
// ==========================================
pub struct SqliteTenancySource {
    room_types: RoomTypeRepository,
    tenancies: TenancyRepository,
}

impl SqliteTenancySource {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            room_types: RoomTypeRepository::new(conn.clone()),
            tenancies: TenancyRepository::new(conn),
        }
    }
}

impl TenancySource for SqliteTenancySource {
    fn load_catalog(&self) -> RepositoryResult<RoomTypeCatalog> {
        self.room_types.load_catalog()
    }

    fn fetch_intervals(&self, window: &AggregationWindow) -> RepositoryResult<Vec<TenancyInterval>> {
        self.tenancies.find_for_window(window)
    }
}

// ==========================================
// InMemoryTenancySource
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct InMemoryTenancySource {
    catalog: RoomTypeCatalog,
    intervals: Vec<TenancyInterval>,
}

impl InMemoryTenancySource {
    pub fn new(catalog: RoomTypeCatalog, intervals: Vec<TenancyInterval>) -> Self {
        Self { catalog, intervals }
    }
}

impl TenancySource for InMemoryTenancySource {
    fn load_catalog(&self) -> RepositoryResult<RoomTypeCatalog> {
        Ok(self.catalog.clone())
    }

    /// 与 SQLite 查询相同的过滤条件
    fn fetch_intervals(&self, window: &AggregationWindow) -> RepositoryResult<Vec<TenancyInterval>> {
        Ok(self
            .intervals
            .iter()
            .filter(|t| t.is_valid() && window.admits(t))
            .cloned()
            .collect())
    }
}
