use serde::{Deserialize, Serialize};

/// 手工映射的默认置信度
pub const DEFAULT_MAPPING_CONFIDENCE: f64 = 1.0;

/// 报价明细与预算行的关联
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub budget_line_id: String,
    pub quote_line_item_id: String,
    pub confidence: f64,
    pub user_confirmed: bool,
}

/// 单个报价对单个预算行的覆盖情况
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CoverageStatus {
    Missing,
    #[serde(rename_all = "camelCase")]
    Covered { quote_line_item_id: String },
    /// 同一供应商多条明细: 拆分报价或重复报价
    #[serde(rename_all = "camelCase")]
    Partial { quote_line_item_ids: Vec<String> },
}

impl CoverageStatus {
    pub fn is_missing(&self) -> bool {
        matches!(self, CoverageStatus::Missing)
    }

    /// 支撑该状态的报价明细 (缺失时为空)
    pub fn quote_line_item_ids(&self) -> Vec<&str> {
        match self {
            CoverageStatus::Missing => Vec::new(),
            CoverageStatus::Covered { quote_line_item_id } => vec![quote_line_item_id.as_str()],
            CoverageStatus::Partial { quote_line_item_ids } => {
                quote_line_item_ids.iter().map(String::as_str).collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorCoverage {
    pub vendor_id: String,
    pub vendor_name: String,
    pub quote_id: String,
    #[serde(flatten)]
    pub status: CoverageStatus,
}

/// 覆盖矩阵的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLineCoverage {
    pub budget_line_id: String,
    pub description: String,
    pub vendors: Vec<VendorCoverage>,
}
