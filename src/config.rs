use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::{AnalysisPreferences, BudgetBasis};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub analysis: AnalysisPreferences,
    #[serde(default)]
    pub decision: DecisionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub slow_statement_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// 保存请求未指定时使用的预算核对口径
    #[serde(default)]
    pub budget_basis: BudgetBasis,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/bid_leveling".to_string(),
                max_connections: 20,
                acquire_timeout_secs: 10,
                slow_statement_secs: 5,
            },
            analysis: AnalysisPreferences::default(),
            decision: DecisionConfig::default(),
        }
    }
}

impl AppConfig {
    /// 默认值 -> `bid-leveling.toml` (可选) -> `BID_*` 环境变量
    /// (如 `BID_SERVER__PORT=9000`); 数据库地址以 `DATABASE_URL` 为准.
    pub fn load() -> AppResult<Self> {
        let defaults = AppConfig::default();

        let mut builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections as i64)?
            .set_default("database.acquire_timeout_secs", defaults.database.acquire_timeout_secs as i64)?
            .set_default("database.slow_statement_secs", defaults.database.slow_statement_secs as i64)?
            .add_source(File::with_name("bid-leveling").required(false))
            .add_source(Environment::with_prefix("BID").separator("__"));

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.analysis.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_preferences() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.price_weight, 0.8);
        assert_eq!(config.analysis.quality_weight, 0.2);
        assert_eq!(config.analysis.local_preference, 0.1);
        assert!(config.analysis.excluded_vendors.is_empty());
        assert_eq!(config.decision.budget_basis, BudgetBasis::AllLines);
    }

    #[test]
    fn partial_analysis_section_falls_back_to_defaults() {
        let config: AppConfig = Config::builder()
            .set_default("server.host", "0.0.0.0")
            .unwrap()
            .set_default("server.port", 9000)
            .unwrap()
            .set_default("database.url", "postgres://db/test")
            .unwrap()
            .set_default("database.max_connections", 5)
            .unwrap()
            .set_default("database.acquire_timeout_secs", 3)
            .unwrap()
            .set_default("database.slow_statement_secs", 1)
            .unwrap()
            .set_default("analysis.quality_weight", 0.0)
            .unwrap()
            .set_default("decision.budget_basis", "awarded_lines")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.analysis.quality_weight, 0.0);
        assert_eq!(config.analysis.price_weight, 0.8);
        assert_eq!(config.decision.budget_basis, BudgetBasis::AwardedLines);
    }
}
