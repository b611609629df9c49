// ==========================================
// 公寓出租率统计 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为调用方可读的错误
// 红线: 存储层错误对外不透明，原因只写日志
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 参数校验错误（在任何查询之前返回）
    // ==========================================
    #[error("输入错误：{field} 日期格式不正确（{value}），请使用 'YYYY-MM-DD' 格式。")]
    InvalidDateFormat { field: String, value: String },

    #[error("输入错误：开始日期 {start} 不能晚于结束日期 {end}。")]
    InvalidDateRange { start: String, end: String },

    #[error("输入错误：不支持的计算方式 '{0}'。可选值: period_avg, end_point")]
    InvalidMode(String),

    // ==========================================
    // 计算不可用（存储访问失败等）
    // ==========================================
    #[error("统计暂不可用，请稍后重试")]
    ComputationUnavailable,
}

impl ApiError {
    /// 错误类别（工具响应中的 kind 字段）
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidDateFormat { .. } => "INVALID_DATE_FORMAT",
            ApiError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            ApiError::InvalidMode(_) => "INVALID_MODE",
            ApiError::ComputationUnavailable => "COMPUTATION_UNAVAILABLE",
        }
    }

    /// 是否为调用方输入问题
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidDateFormat { .. }
                | ApiError::InvalidDateRange { .. }
                | ApiError::InvalidMode(_)
        )
    }
}

// ==========================================
// 从 RepositoryError 转换
// 存储细节只记录日志，不透传给调用方
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        tracing::error!(error = %err, "存储访问失败");
        ApiError::ComputationUnavailable
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
