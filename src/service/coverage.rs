use std::collections::{HashMap, HashSet};

use crate::models::{
    BudgetLine, BudgetLineCoverage, CoverageStatus, QuoteLineItem, VendorCoverage, VendorQuote,
};

/// 映射的只读视图: 报价明细对应哪个预算行
pub trait MappingLookup {
    fn mapped_budget_line(&self, quote_line_item_id: &str) -> Option<&str>;
}

/// 由报价明细上的 `mapped_budget_line_ids` 构建的映射视图
#[derive(Debug, Default)]
pub struct QuoteMappings<'a> {
    by_item: HashMap<&'a str, &'a str>,
}

impl<'a> QuoteMappings<'a> {
    /// 每个明细取第一个存在于预算中的预算行 (与 MappingStore 种子规则一致)
    pub fn from_quotes(quotes: &'a [VendorQuote], budget_lines: &[BudgetLine]) -> Self {
        let known: HashSet<&str> = budget_lines.iter().map(|b| b.id.as_str()).collect();
        let by_item = quotes
            .iter()
            .flat_map(|q| q.line_items.iter())
            .filter_map(|item| {
                item.mapped_budget_line_ids
                    .iter()
                    .find(|b| known.contains(b.as_str()))
                    .map(|b| (item.id.as_str(), b.as_str()))
            })
            .collect();
        Self { by_item }
    }
}

impl MappingLookup for QuoteMappings<'_> {
    fn mapped_budget_line(&self, quote_line_item_id: &str) -> Option<&str> {
        self.by_item.get(quote_line_item_id).copied()
    }
}

/// 单个报价对 `budget_line_id` 的覆盖
pub fn classify<L: MappingLookup + ?Sized>(
    quote: &VendorQuote,
    budget_line_id: &str,
    lookup: &L,
) -> CoverageStatus {
    let mut item_ids: Vec<String> = quote
        .line_items
        .iter()
        .filter(|item| lookup.mapped_budget_line(&item.id) == Some(budget_line_id))
        .map(|item| item.id.clone())
        .collect();

    match item_ids.len() {
        0 => CoverageStatus::Missing,
        1 => CoverageStatus::Covered {
            quote_line_item_id: item_ids.remove(0),
        },
        _ => CoverageStatus::Partial {
            quote_line_item_ids: item_ids,
        },
    }
}

/// 范围外明细: 未对应任何预算行
pub fn is_extra<L: MappingLookup + ?Sized>(item: &QuoteLineItem, lookup: &L) -> bool {
    lookup.mapped_budget_line(&item.id).is_none()
}

/// 该报价未覆盖的预算行, 按预算顺序
pub fn missing_budget_lines<'b, L: MappingLookup + ?Sized>(
    quote: &VendorQuote,
    budget_lines: &'b [BudgetLine],
    lookup: &L,
) -> Vec<&'b BudgetLine> {
    budget_lines
        .iter()
        .filter(|line| classify(quote, &line.id, lookup).is_missing())
        .collect()
}

/// 逐预算行列出各供应商覆盖状态 (按报价顺序)
pub fn coverage_matrix<L: MappingLookup + ?Sized>(
    quotes: &[VendorQuote],
    budget_lines: &[BudgetLine],
    lookup: &L,
) -> Vec<BudgetLineCoverage> {
    budget_lines
        .iter()
        .map(|line| BudgetLineCoverage {
            budget_line_id: line.id.clone(),
            description: line.description.clone(),
            vendors: quotes
                .iter()
                .map(|quote| VendorCoverage {
                    vendor_id: quote.vendor_id.clone(),
                    vendor_name: quote.vendor_name.clone(),
                    quote_id: quote.id.clone(),
                    status: classify(quote, &line.id, lookup),
                })
                .collect(),
        })
        .collect()
}
