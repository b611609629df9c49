// ==========================================
// 公寓出租率统计 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口，屏蔽数据库细节
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod contract_repo;
pub mod error;
pub mod room_type_repo;
pub mod source;

// 重导出核心仓储
pub use contract_repo::TenancyRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use room_type_repo::RoomTypeRepository;
pub use source::{InMemoryTenancySource, SqliteTenancySource, TenancySource};
