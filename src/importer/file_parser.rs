// ==========================================
// 公寓出租率统计 - 合同 CSV 解析器
// ==========================================
// 职责: 读取 UTF-8 CSV -> 标准列名的原始行
// 说明: 列名支持英文标准名与常见中文别名
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ===== 标准列名 =====
pub const COL_CONTRACT_NO: &str = "contract_no";
pub const COL_ROOM_NUMBER: &str = "room_number";
pub const COL_ROOM_CODE: &str = "room_code";
pub const COL_MONTHLY_RENT: &str = "actual_monthly_rent";
pub const COL_CHECK_IN: &str = "check_in_date";
pub const COL_CHECK_OUT: &str = "check_out_date";

/// 必需列（缺失任一列则整文件拒绝）
const REQUIRED_COLUMNS: [&str; 4] = [COL_CONTRACT_NO, COL_ROOM_NUMBER, COL_CHECK_IN, COL_CHECK_OUT];

/// 表头别名 -> 标准列名
fn canonical_column(header: &str) -> Option<&'static str> {
    let normalized = header.trim().trim_start_matches('\u{feff}').to_lowercase();
    let col = match normalized.as_str() {
        "contract_no" | "合同号" | "合同编号" => COL_CONTRACT_NO,
        "room_number" | "房号" | "房间号" => COL_ROOM_NUMBER,
        "room_code" | "room_type_code" | "房型" | "房型代码" => COL_ROOM_CODE,
        "actual_monthly_rent" | "monthly_rent" | "月租金" | "实际月租金" => COL_MONTHLY_RENT,
        "check_in_date" | "入住日期" => COL_CHECK_IN,
        "check_out_date" | "退房日期" | "离店日期" => COL_CHECK_OUT,
        _ => return None,
    };
    Some(col)
}

/// 一行原始数据（值已去除首尾空白）
#[derive(Debug, Clone, PartialEq)]
pub struct RawContractRow {
    pub row_number: usize,
    pub fields: HashMap<&'static str, String>,
}

impl RawContractRow {
    /// 取非空字段
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

// ==========================================
// ContractCsvParser
// ==========================================
pub struct ContractCsvParser;

impl ContractCsvParser {
    /// 解析 CSV 文件
    pub fn parse_file(&self, path: &Path) -> ImportResult<Vec<RawContractRow>> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        self.parse_reader(file)
    }

    /// 解析任意输入流
    pub fn parse_reader<R: Read>(&self, input: R) -> ImportResult<Vec<RawContractRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(input);

        let columns: Vec<Option<&'static str>> =
            reader.headers()?.iter().map(canonical_column).collect();

        for required in REQUIRED_COLUMNS {
            if !columns.contains(&Some(required)) {
                return Err(ImportError::MissingColumn(required.to_string()));
            }
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut fields = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(Some(column)) = columns.get(col_idx) {
                    fields.insert(*column, value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if fields.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(RawContractRow {
                // 表头占第 1 行
                row_number: idx + 2,
                fields,
            });
        }

        tracing::debug!(rows = rows.len(), "CSV 解析完成");
        Ok(rows)
    }
}
