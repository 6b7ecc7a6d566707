use serde::{Deserialize, Serialize};

use super::{BudgetLine, VendorQuote};

/// 从上游加载的单个分部全部输入
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionInputs {
    /// 导入时以路径参数为准
    #[serde(default)]
    pub division_id: String,
    #[serde(default)]
    pub budget_lines: Vec<BudgetLine>,
    #[serde(default)]
    pub quotes: Vec<VendorQuote>,
}
