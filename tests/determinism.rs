mod common;

use bid_leveling_rust::models::{AnalysisContext, AnalysisPreferences};
use bid_leveling_rust::service::{analyzer, DivisionWorkspace};

use common::{as_of, gap_division, three_vendor_division};

#[test]
fn repeated_analysis_serializes_identically() {
    let inputs = gap_division();
    let ctx = AnalysisContext::new(AnalysisPreferences::default(), as_of());

    let first = analyzer::analyze(&inputs.division_id, &inputs.quotes, &inputs.budget_lines, &ctx);
    for _ in 0..10 {
        let again = analyzer::analyze(&inputs.division_id, &inputs.quotes, &inputs.budget_lines, &ctx);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&again).unwrap()
        );
    }
}

#[test]
fn separate_workspaces_agree() {
    let mut left = DivisionWorkspace::new(three_vendor_division());
    let mut right = DivisionWorkspace::new(three_vendor_division());

    let a = left.analyze(AnalysisPreferences::default(), as_of()).unwrap();
    let b = right.analyze(AnalysisPreferences::default(), as_of()).unwrap();

    assert_eq!(serde_json::to_value(&a).unwrap(), serde_json::to_value(&b).unwrap());
    assert_eq!(left.analysis_log().len(), 1);
}

#[test]
fn vendor_order_follows_input_order() {
    let inputs = three_vendor_division();
    let ctx = AnalysisContext::new(AnalysisPreferences::default(), as_of());
    let analysis = analyzer::analyze(&inputs.division_id, &inputs.quotes, &inputs.budget_lines, &ctx);

    let ids: Vec<&str> = analysis.vendors.iter().map(|v| v.vendor_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn analysis_json_uses_wire_names() {
    let inputs = gap_division();
    let ctx = AnalysisContext::new(AnalysisPreferences::default(), as_of());
    let analysis = analyzer::analyze(&inputs.division_id, &inputs.quotes, &inputs.budget_lines, &ctx);
    let value = serde_json::to_value(&analysis).unwrap();

    assert!(value["priceSpread"]["variancePercent"].is_number());
    assert_eq!(value["recommendations"][0]["type"], "negotiate");
    assert_eq!(value["recommendations"][0]["priority"], "high");
    assert_eq!(value["vendors"][1]["riskFactors"][0]["type"], "scope_gap");
    assert_eq!(value["timestamp"], "2024-03-01T09:30:00Z");
}
