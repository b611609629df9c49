// ==========================================
// 公寓出租率统计 - 房型目录仓储
// ==========================================
// 表: dim_room_type (房型元数据) + room_details (物理房间)
// 红线: Repository 不含业务逻辑，只负责组装只读快照
// ==========================================

use crate::domain::room_type::{RoomTypeCatalog, RoomTypeMeta};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// RoomTypeRepository - 房型目录仓储
// ==========================================
pub struct RoomTypeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RoomTypeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取房型目录快照
    ///
    /// # 规则
    /// - dim_room_type.room_count 为空或 0 时，用 room_details 中该房型的房间数补齐
    /// - room_details 中出现但 dim_room_type 缺失的房型，以房型代码作为展示名、面积记 0
    pub fn load_catalog(&self) -> RepositoryResult<RoomTypeCatalog> {
        let conn = self.get_conn()?;

        let mut physical: BTreeMap<String, u32> = BTreeMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT room_code, COUNT(DISTINCT room_number) FROM room_details GROUP BY room_code",
            )?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
            for row in rows {
                let (code, count) = row?;
                physical.insert(code, count.max(0) as u32);
            }
        }

        let mut stmt = conn.prepare(
            r#"SELECT room_code, room_code_desc, area_sqm, room_count
               FROM dim_room_type
               ORDER BY room_code"#,
        )?;
        let metas = stmt
            .query_map([], |row| {
                let code: String = row.get(0)?;
                let desc: Option<String> = row.get(1)?;
                let area: Option<f64> = row.get(2)?;
                let count: Option<i64> = row.get(3)?;
                Ok((code, desc, area, count))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut catalog = RoomTypeCatalog::new();
        for (code, desc, area, count) in metas {
            let room_count = match count {
                Some(c) if c > 0 => c as u32,
                _ => physical.get(&code).copied().unwrap_or(0),
            };
            catalog.insert(RoomTypeMeta {
                display_name: desc
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| code.clone()),
                area_m2: area.filter(|a| *a > 0.0).unwrap_or(0.0),
                room_count,
                code,
            });
        }

        for (code, count) in physical {
            if !catalog.contains(&code) {
                tracing::debug!(room_code = %code, room_count = count, "房型仅存在于 room_details");
                catalog.insert(RoomTypeMeta {
                    display_name: code.clone(),
                    area_m2: 0.0,
                    room_count: count,
                    code,
                });
            }
        }

        Ok(catalog)
    }

    /// 写入或覆盖房型元数据
    pub fn upsert_room_type(&self, meta: &RoomTypeMeta) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO dim_room_type (room_code, room_code_desc, area_sqm, room_count)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(room_code) DO UPDATE SET
                   room_code_desc = excluded.room_code_desc,
                   area_sqm = excluded.area_sqm,
                   room_count = excluded.room_count"#,
            params![&meta.code, &meta.display_name, meta.area_m2, meta.room_count],
        )?;
        Ok(())
    }

    /// 登记物理房间
    pub fn upsert_room(&self, room_number: &str, room_code: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO room_details (room_number, room_code) VALUES (?1, ?2)
               ON CONFLICT(room_number) DO UPDATE SET room_code = excluded.room_code"#,
            params![room_number, room_code],
        )?;
        Ok(())
    }
}
