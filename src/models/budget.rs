use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 业主预算的一行 (加载后不可变)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLine {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,         // 成本编码, 如 "06-100"
    pub description: String,
    #[serde(default)]
    pub quantity: Option<BigDecimal>,
    #[serde(default)]
    pub unit: Option<String>,
    pub total_cost: BigDecimal,
}

/// 给定预算行的 `total_cost` 之和
pub fn budget_total<'a, I>(lines: I) -> BigDecimal
where
    I: IntoIterator<Item = &'a BudgetLine>,
{
    lines
        .into_iter()
        .fold(BigDecimal::from(0), |acc, line| acc + &line.total_cost)
}
