use bigdecimal::BigDecimal;

use crate::models::{BudgetLine, CoverageTag, QuoteLineItem, VendorQuote};

pub fn budget_line(id: &str, description: &str, total_cost: i64) -> BudgetLine {
    BudgetLine {
        id: id.to_string(),
        code: None,
        description: description.to_string(),
        quantity: None,
        unit: None,
        total_cost: BigDecimal::from(total_cost),
    }
}

pub fn line(id: &str, quote_id: &str, description: &str, total_price: i64) -> QuoteLineItem {
    QuoteLineItem {
        id: id.to_string(),
        quote_id: quote_id.to_string(),
        description: description.to_string(),
        quantity: None,
        unit: None,
        unit_price: BigDecimal::from(total_price),
        total_price: BigDecimal::from(total_price),
        coverage: CoverageTag::Unknown,
        mapped_budget_line_ids: Vec::new(),
    }
}

/// 明细为 `(id, 描述, 总价, 映射的预算行)`
pub fn quote(
    id: &str,
    vendor_id: &str,
    vendor_name: &str,
    items: &[(&str, &str, i64, Option<&str>)],
) -> VendorQuote {
    VendorQuote {
        id: id.to_string(),
        vendor_id: vendor_id.to_string(),
        vendor_name: vendor_name.to_string(),
        division_id: "d1".to_string(),
        status: "parsed".to_string(),
        exclusions: None,
        quote_level_total: None,
        line_items: items
            .iter()
            .map(|(item_id, description, price, mapped)| {
                let mut item = line(item_id, id, description, *price);
                if let Some(budget_line_id) = mapped {
                    item.mapped_budget_line_ids.push(budget_line_id.to_string());
                    item.coverage = CoverageTag::Required;
                }
                item
            })
            .collect(),
    }
}
