use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 报价解析方给出的相关性标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageTag {
    Required,
    Extra,
    #[default]
    Unknown,
}

/// 报价导入方交付的报价明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLineItem {
    pub id: String,
    pub quote_id: String,
    pub description: String,
    #[serde(default)]
    pub quantity: Option<BigDecimal>,
    #[serde(default)]
    pub unit: Option<String>,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    #[serde(default)]
    pub coverage: CoverageTag,
    /// 上游映射提示; 加载后以 MappingStore 为准
    #[serde(default)]
    pub mapped_budget_line_ids: Vec<String>,
}

/// 供应商对分部的报价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorQuote {
    pub id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub division_id: String,
    pub status: String,
    #[serde(default)]
    pub exclusions: Option<Vec<String>>,
    /// 报价单上的总价, 仅供参考
    #[serde(default)]
    pub quote_level_total: Option<BigDecimal>,
    #[serde(default)]
    pub line_items: Vec<QuoteLineItem>,
}

impl VendorQuote {
    /// 全部明细合计 (含范围外明细)
    pub fn total_price(&self) -> BigDecimal {
        self.line_items
            .iter()
            .fold(BigDecimal::from(0), |acc, item| acc + &item.total_price)
    }

    pub fn find_item(&self, quote_line_item_id: &str) -> Option<&QuoteLineItem> {
        self.line_items.iter().find(|i| i.id == quote_line_item_id)
    }

    pub fn has_exclusions(&self) -> bool {
        self.exclusions.as_ref().is_some_and(|e| !e.is_empty())
    }
}
