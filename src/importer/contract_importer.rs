// ==========================================
// 公寓出租率统计 - 合同导入器
// ==========================================
// 流程: CSV 解析 -> 字段转换 -> DQ 校验 -> 批量写入
// ==========================================
// DQ 规则:
// - ERROR  : 合同号/房号缺失、日期缺失或无法解析、入住日不早于退房日、
//            租金无法解析或为负、同批次合同号重复 -> 该行不入库
// - WARNING: 房型缺失（归入未知房型）
// - INFO   : 租金为空或为 0（按免租处理）、合同号已存在（覆盖）
// ==========================================

use crate::domain::import_report::{DqViolation, ImportReport};
use crate::domain::room_type::UNKNOWN_ROOM_TYPE_CODE;
use crate::domain::tenancy::TenancyInterval;
use crate::domain::types::DqLevel;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{
    ContractCsvParser, RawContractRow, COL_CHECK_IN, COL_CHECK_OUT, COL_CONTRACT_NO,
    COL_MONTHLY_RENT, COL_ROOM_CODE, COL_ROOM_NUMBER,
};
use crate::repository::contract_repo::TenancyRepository;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;

/// 支持的日期格式（带时间的值只取日期部分）
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// 字段转换 + 校验结果
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub accepted: Vec<TenancyInterval>,
    pub blocked: usize,
    pub violations: Vec<DqViolation>,
}

// ==========================================
// ContractImporter - 合同导入器
// ==========================================
pub struct ContractImporter {
    repo: TenancyRepository,
    parser: ContractCsvParser,
}

impl ContractImporter {
    pub fn new(repo: TenancyRepository) -> Self {
        Self {
            repo,
            parser: ContractCsvParser,
        }
    }

    /// 导入 CSV 文件
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn import_file(&self, path: &Path) -> ImportResult<ImportReport> {
        let rows = self.parser.parse_file(path)?;
        self.import_rows(rows)
    }

    /// 导入已解析的行
    pub fn import_rows(&self, rows: Vec<RawContractRow>) -> ImportResult<ImportReport> {
        let batch_id = Uuid::new_v4().to_string();
        let total_rows = rows.len();
        let mut batch = validate_rows(&rows);

        for interval in &batch.accepted {
            if self.repo.exists(&interval.contract_no)? {
                batch.violations.push(DqViolation {
                    row_number: 0,
                    contract_no: Some(interval.contract_no.clone()),
                    level: DqLevel::Info,
                    field: COL_CONTRACT_NO.to_string(),
                    message: "合同号已存在，覆盖旧记录".to_string(),
                });
            }
        }

        let imported = self.repo.insert_batch(&batch.accepted)?;

        let report = ImportReport {
            batch_id,
            total_rows,
            imported,
            blocked: batch.blocked,
            warnings: batch
                .violations
                .iter()
                .filter(|v| v.level == DqLevel::Warning)
                .count(),
            violations: batch.violations,
        };

        tracing::info!(
            batch_id = %report.batch_id,
            total_rows = report.total_rows,
            imported = report.imported,
            blocked = report.blocked,
            warnings = report.warnings,
            "合同导入完成"
        );
        Ok(report)
    }
}

/// 逐行转换并校验
pub fn validate_rows(rows: &[RawContractRow]) -> ValidatedBatch {
    let mut batch = ValidatedBatch::default();
    let mut seen_contracts: HashSet<String> = HashSet::new();

    for row in rows {
        let mut violations = Vec::new();
        let interval = convert_row(row, &mut violations);

        if let Some(interval) = &interval {
            if !seen_contracts.insert(interval.contract_no.clone()) {
                violations.push(violation(
                    row,
                    DqLevel::Error,
                    COL_CONTRACT_NO,
                    "重复合同号（同批次内）".to_string(),
                ));
            }
        }

        let has_error = violations.iter().any(|v| v.level == DqLevel::Error);
        match interval {
            Some(interval) if !has_error => batch.accepted.push(interval),
            _ => batch.blocked += 1,
        }
        batch.violations.extend(violations);
    }

    batch
}

/// 原始行 -> TenancyInterval；出现 ERROR 时返回 None 或由调用方丢弃
fn convert_row(row: &RawContractRow, violations: &mut Vec<DqViolation>) -> Option<TenancyInterval> {
    let contract_no = row.get(COL_CONTRACT_NO);
    if contract_no.is_none() {
        violations.push(violation(row, DqLevel::Error, COL_CONTRACT_NO, "合同号缺失".to_string()));
    }

    let room_number = row.get(COL_ROOM_NUMBER);
    if room_number.is_none() {
        violations.push(violation(row, DqLevel::Error, COL_ROOM_NUMBER, "房号缺失".to_string()));
    }

    let room_type_code = match row.get(COL_ROOM_CODE) {
        Some(code) => code.to_string(),
        None => {
            violations.push(violation(
                row,
                DqLevel::Warning,
                COL_ROOM_CODE,
                "房型缺失，归入未知房型".to_string(),
            ));
            UNKNOWN_ROOM_TYPE_CODE.to_string()
        }
    };

    let monthly_rent = match row.get(COL_MONTHLY_RENT) {
        None => {
            violations.push(violation(
                row,
                DqLevel::Info,
                COL_MONTHLY_RENT,
                "租金为空，按 0 处理".to_string(),
            ));
            Some(0.0)
        }
        Some(raw) => match raw.replace(',', "").parse::<f64>() {
            Ok(v) if v.is_finite() && v < 0.0 => {
                violations.push(violation(
                    row,
                    DqLevel::Error,
                    COL_MONTHLY_RENT,
                    format!("租金为负数: {}", raw),
                ));
                None
            }
            Ok(v) if v.is_finite() => {
                if v == 0.0 {
                    violations.push(violation(
                        row,
                        DqLevel::Info,
                        COL_MONTHLY_RENT,
                        "租金为 0，按免租处理".to_string(),
                    ));
                }
                Some(v)
            }
            _ => {
                violations.push(violation(
                    row,
                    DqLevel::Error,
                    COL_MONTHLY_RENT,
                    format!("租金无法解析: {}", raw),
                ));
                None
            }
        },
    };

    let check_in = date_field(row, COL_CHECK_IN, "入住日期", violations);
    let check_out = date_field(row, COL_CHECK_OUT, "退房日期", violations);
    if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
        if check_in >= check_out {
            violations.push(violation(
                row,
                DqLevel::Error,
                COL_CHECK_OUT,
                format!("退房日期 {} 不晚于入住日期 {}", check_out, check_in),
            ));
        }
    }

    Some(TenancyInterval {
        contract_no: contract_no?.to_string(),
        room_number: room_number?.to_string(),
        room_type_code,
        check_in_date: check_in?,
        check_out_date: check_out?,
        monthly_rent: monthly_rent?,
    })
}

fn date_field(
    row: &RawContractRow,
    column: &str,
    label: &str,
    violations: &mut Vec<DqViolation>,
) -> Option<NaiveDate> {
    let Some(raw) = row.get(column) else {
        violations.push(violation(row, DqLevel::Error, column, format!("{}缺失", label)));
        return None;
    };
    let parsed = parse_date(raw);
    if parsed.is_none() {
        violations.push(violation(
            row,
            DqLevel::Error,
            column,
            format!("{}格式错误: {}", label, raw),
        ));
    }
    parsed
}

/// 解析日期（支持 YYYY-MM-DD / YYYY/MM/DD / YYYYMMDD，忽略时间部分）
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

fn violation(row: &RawContractRow, level: DqLevel, field: &str, message: String) -> DqViolation {
    DqViolation {
        row_number: row.row_number,
        contract_no: row.get(COL_CONTRACT_NO).map(|s| s.to_string()),
        level,
        field: field.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(row_number: usize, values: &[(&'static str, &str)]) -> RawContractRow {
        let fields: HashMap<&'static str, String> =
            values.iter().map(|(k, v)| (*k, v.to_string())).collect();
        RawContractRow { row_number, fields }
    }

    fn valid(row_number: usize, contract: &str) -> RawContractRow {
        row(
            row_number,
            &[
                (COL_CONTRACT_NO, contract),
                (COL_ROOM_NUMBER, "A101"),
                (COL_ROOM_CODE, "STD"),
                (COL_MONTHLY_RENT, "3000"),
                (COL_CHECK_IN, "2025-01-01"),
                (COL_CHECK_OUT, "2025-02-01"),
            ],
        )
    }

    #[test]
    fn test_valid_row_is_accepted() {
        let batch = validate_rows(&[valid(2, "C001")]);
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.blocked, 0);
        assert!(batch.violations.is_empty());
        assert_eq!(batch.accepted[0].monthly_rent, 3000.0);
    }

    #[test]
    fn test_degenerate_interval_is_blocked() {
        let bad = row(
            3,
            &[
                (COL_CONTRACT_NO, "C002"),
                (COL_ROOM_NUMBER, "A102"),
                (COL_CHECK_IN, "2025-01-10"),
                (COL_CHECK_OUT, "2025-01-10"),
            ],
        );
        let batch = validate_rows(&[bad]);
        assert!(batch.accepted.is_empty());
        assert_eq!(batch.blocked, 1);
        assert!(batch
            .violations
            .iter()
            .any(|v| v.level == DqLevel::Error && v.field == COL_CHECK_OUT));
        // 房型缺失只告警
        assert!(batch
            .violations
            .iter()
            .any(|v| v.level == DqLevel::Warning && v.field == COL_ROOM_CODE));
    }

    #[test]
    fn test_negative_rent_and_bad_date_are_errors() {
        let negative = row(
            2,
            &[
                (COL_CONTRACT_NO, "C1"),
                (COL_ROOM_NUMBER, "A1"),
                (COL_ROOM_CODE, "STD"),
                (COL_MONTHLY_RENT, "-1"),
                (COL_CHECK_IN, "2025-01-01"),
                (COL_CHECK_OUT, "2025-02-01"),
            ],
        );
        let bad_date = row(
            3,
            &[
                (COL_CONTRACT_NO, "C2"),
                (COL_ROOM_NUMBER, "A2"),
                (COL_ROOM_CODE, "STD"),
                (COL_CHECK_IN, "01/02/2025"),
                (COL_CHECK_OUT, "2025-02-01"),
            ],
        );
        let batch = validate_rows(&[negative, bad_date]);
        assert!(batch.accepted.is_empty());
        assert_eq!(batch.blocked, 2);
    }

    #[test]
    fn test_duplicate_contract_in_batch() {
        let batch = validate_rows(&[valid(2, "C001"), valid(3, "C001")]);
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.blocked, 1);
        assert_eq!(batch.violations[0].row_number, 3);
    }

    #[test]
    fn test_empty_rent_is_free() {
        let free = row(
            2,
            &[
                (COL_CONTRACT_NO, "C1"),
                (COL_ROOM_NUMBER, "A1"),
                (COL_ROOM_CODE, "STD"),
                (COL_CHECK_IN, "2025/01/01"),
                (COL_CHECK_OUT, "20250201"),
            ],
        );
        let batch = validate_rows(&[free]);
        assert_eq!(batch.accepted.len(), 1);
        assert_eq!(batch.accepted[0].monthly_rent, 0.0);
        assert_eq!(batch.violations[0].level, DqLevel::Info);
    }

    #[test]
    fn test_parse_date_ignores_time() {
        assert_eq!(
            parse_date("2025-01-05 14:00:00"),
            NaiveDate::from_ymd_opt(2025, 1, 5)
        );
        assert_eq!(parse_date("yesterday"), None);
    }
}
