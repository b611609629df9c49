// ==========================================
// 公寓出租率统计 - 租约仓储
// ==========================================
// 表: contract_creation_log
// 红线: Repository 不含业务逻辑；只返回拥有所有权的快照
// ==========================================
// 查询口径（两种统计模式共用一次查询）:
//   check_in_date <= end AND check_out_date > start
//   AND check_in_date < check_out_date
// ==========================================

use crate::domain::tenancy::TenancyInterval;
use crate::domain::window::AggregationWindow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::instrument;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// TenancyRepository - 租约仓储
// ==========================================
pub struct TenancyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TenancyRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询与统计窗口相交的租约
    ///
    /// 条件: 入住日 <= 结束日 且 离店日 > 开始日
    ///
    /// # 返回
    /// 按 (合同号, 房号) 排序的租约快照；入住日不早于离店日的记录已排除
    #[instrument(skip(self), fields(start = %window.start_date, end = %window.end_date))]
    pub fn find_for_window(&self, window: &AggregationWindow) -> RepositoryResult<Vec<TenancyInterval>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT contract_no, room_number, room_code, actual_monthly_rent,
                      check_in_date, check_out_date
               FROM contract_creation_log
               WHERE substr(check_out_date, 1, 10) > ?1
                 AND substr(check_in_date, 1, 10) <= ?2
                 AND substr(check_in_date, 1, 10) < substr(check_out_date, 1, 10)
               ORDER BY contract_no, room_number"#,
        )?;

        let start = window.start_date.format(DATE_FORMAT).to_string();
        let end = window.end_date.format(DATE_FORMAT).to_string();
        let intervals = stmt
            .query_map(params![start, end], |row| self.map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = intervals.len(), "租约快照已加载");
        Ok(intervals)
    }

    /// 查询全部租约
    pub fn list_all(&self) -> RepositoryResult<Vec<TenancyInterval>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT contract_no, room_number, room_code, actual_monthly_rent,
                      check_in_date, check_out_date
               FROM contract_creation_log
               ORDER BY contract_no, room_number"#,
        )?;

        let intervals = stmt
            .query_map([], |row| self.map_row(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(intervals)
    }

    /// 按合同号判断是否已存在
    pub fn exists(&self, contract_no: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM contract_creation_log WHERE contract_no = ?1",
            params![contract_no],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 批量写入租约（同一事务）
    ///
    /// 合同号已存在时覆盖旧记录
    ///
    /// # 返回
    /// 写入的行数
    pub fn insert_batch(&self, intervals: &[TenancyInterval]) -> RepositoryResult<usize> {
        if intervals.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut inserted = 0usize;
        for t in intervals {
            inserted += tx.execute(
                r#"INSERT INTO contract_creation_log (
                     contract_no, room_number, room_code, actual_monthly_rent,
                     check_in_date, check_out_date
                   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                   ON CONFLICT(contract_no) DO UPDATE SET
                     room_number = excluded.room_number,
                     room_code = excluded.room_code,
                     actual_monthly_rent = excluded.actual_monthly_rent,
                     check_in_date = excluded.check_in_date,
                     check_out_date = excluded.check_out_date"#,
                params![
                    &t.contract_no,
                    &t.room_number,
                    &t.room_type_code,
                    t.monthly_rent,
                    &t.check_in_date.format(DATE_FORMAT).to_string(),
                    &t.check_out_date.format(DATE_FORMAT).to_string(),
                ],
            )?;
        }

        tx.commit()?;
        tracing::info!(inserted, "租约批量写入完成");
        Ok(inserted)
    }

    /// 映射数据库行到 TenancyInterval
    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<TenancyInterval> {
        let rent: Option<f64> = row.get(3)?;
        Ok(TenancyInterval {
            contract_no: row.get(0)?,
            room_number: row.get(1)?,
            room_type_code: row.get(2)?,
            monthly_rent: rent.unwrap_or(0.0).max(0.0),
            check_in_date: parse_date_column(row, 4)?,
            check_out_date: parse_date_column(row, 5)?,
        })
    }
}

/// 解析日期列（兼容 `YYYY-MM-DD HH:MM:SS`，只取日期部分）
fn parse_date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    let date_part = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
