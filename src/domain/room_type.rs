// ==========================================
// 公寓出租率统计 - 房型目录
// ==========================================
// 职责: 房型代码 -> { 名称, 面积, 房间数 } 参考数据（只读）
// 红线: room_count 是空置率分母的唯一口径，与租约条数无关
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 目录中不存在的房型统一归入该代码
pub const UNKNOWN_ROOM_TYPE_CODE: &str = "UNKNOWN";

/// 未知房型的默认展示名
pub const UNKNOWN_ROOM_TYPE_LABEL: &str = "未知房型";

// ==========================================
// RoomTypeMeta - 房型元数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTypeMeta {
    pub code: String,         // 房型代码
    pub display_name: String, // 房型名称
    pub area_m2: f64,         // 面积 (m²)，缺失为 0
    pub room_count: u32,      // 房间总数
}

// ==========================================
// RoomTypeCatalog - 房型目录
// ==========================================
// 按代码有序存储，保证分房型输出顺序稳定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomTypeCatalog {
    entries: BTreeMap<String, RoomTypeMeta>,
}

impl RoomTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = RoomTypeMeta>,
    {
        let mut catalog = Self::new();
        for meta in entries {
            catalog.insert(meta);
        }
        catalog
    }

    /// 插入或覆盖一个房型
    pub fn insert(&mut self, meta: RoomTypeMeta) {
        self.entries.insert(meta.code.clone(), meta);
    }

    pub fn get(&self, code: &str) -> Option<&RoomTypeMeta> {
        self.entries.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 按房型代码升序遍历
    pub fn iter(&self) -> impl Iterator<Item = &RoomTypeMeta> {
        self.entries.values()
    }

    /// 目录内房间总数
    pub fn total_room_count(&self) -> u32 {
        self.entries.values().map(|m| m.room_count).sum()
    }

    /// 房型面积（未知房型为 0）
    pub fn area_of(&self, code: &str) -> f64 {
        self.get(code).map(|m| m.area_m2).unwrap_or(0.0)
    }
}
