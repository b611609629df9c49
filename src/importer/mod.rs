// ==========================================
// 公寓出租率统计 - 合同导入层
// ==========================================
// 职责: CSV -> 租约区间，附带数据质量校验
// ==========================================

pub mod contract_importer;
pub mod error;
pub mod file_parser;

pub use contract_importer::{parse_date, validate_rows, ContractImporter, ValidatedBatch};
pub use error::{ImportError, ImportResult};
pub use file_parser::{ContractCsvParser, RawContractRow};
