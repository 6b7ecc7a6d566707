#![allow(dead_code)]

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};

use bid_leveling_rust::models::{BudgetLine, CoverageTag, DivisionInputs, QuoteLineItem, VendorQuote};

pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

pub fn budget_line(id: &str, description: &str, total_cost: i64) -> BudgetLine {
    BudgetLine {
        id: id.to_string(),
        code: Some(format!("06-{}", id)),
        description: description.to_string(),
        quantity: None,
        unit: None,
        total_cost: BigDecimal::from(total_cost),
    }
}

pub fn item(id: &str, quote_id: &str, description: &str, total_price: i64, mapped: Option<&str>) -> QuoteLineItem {
    QuoteLineItem {
        id: id.to_string(),
        quote_id: quote_id.to_string(),
        description: description.to_string(),
        quantity: Some(BigDecimal::from(1)),
        unit: Some("ls".to_string()),
        unit_price: BigDecimal::from(total_price),
        total_price: BigDecimal::from(total_price),
        coverage: if mapped.is_some() { CoverageTag::Required } else { CoverageTag::Unknown },
        mapped_budget_line_ids: mapped.map(|m| vec![m.to_string()]).unwrap_or_default(),
    }
}

pub fn vendor_quote(division_id: &str, vendor_id: &str, vendor_name: &str, items: Vec<QuoteLineItem>) -> VendorQuote {
    VendorQuote {
        id: format!("q-{}", vendor_id),
        vendor_id: vendor_id.to_string(),
        vendor_name: vendor_name.to_string(),
        division_id: division_id.to_string(),
        status: "parsed".to_string(),
        exclusions: None,
        quote_level_total: None,
        line_items: items,
    }
}

/// Single 100k framing line; vendors bid 100k, 110k and 135k for it
pub fn three_vendor_division() -> DivisionInputs {
    let budget_lines = vec![budget_line("b1", "Rough framing labor and material", 100_000)];
    let quotes = [("a", "Acme Framing", 100_000), ("b", "Birch Builders", 110_000), ("c", "Cedar Co", 135_000)]
        .into_iter()
        .map(|(vendor_id, name, price)| {
            let quote_id = format!("q-{}", vendor_id);
            vendor_quote(
                "div-06",
                vendor_id,
                name,
                vec![item(&format!("{}-1", vendor_id), &quote_id, "Rough framing labor and material", price, Some("b1"))],
            )
        })
        .collect();

    DivisionInputs {
        division_id: "div-06".to_string(),
        budget_lines,
        quotes,
    }
}

/// Two budget lines; vendor "b" leaves the trim line unpriced and adds an unmapped extra
pub fn gap_division() -> DivisionInputs {
    let budget_lines = vec![
        budget_line("b1", "Rough framing", 80_000),
        budget_line("b2", "Finish carpentry trim", 20_000),
    ];
    let quotes = vec![
        vendor_quote(
            "div-06",
            "a",
            "Acme Framing",
            vec![
                item("a-1", "q-a", "Rough framing", 78_000, Some("b1")),
                item("a-2", "q-a", "Finish carpentry trim", 21_000, Some("b2")),
            ],
        ),
        vendor_quote(
            "div-06",
            "b",
            "Birch Builders",
            vec![
                item("b-1", "q-b", "Rough framing", 75_000, Some("b1")),
                item("b-9", "q-b", "Dumpster rental", 1_500, None),
            ],
        ),
    ];

    DivisionInputs {
        division_id: "div-06".to_string(),
        budget_lines,
        quotes,
    }
}
