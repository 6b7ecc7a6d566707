use thiserror::Error;

/// 引擎、仓储与 HTTP 层统一的错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 前置条件不满足: 未知 id, 空决策, 分部已锁定等
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Division not found: {0}")]
    DivisionNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
