mod common;

use bigdecimal::BigDecimal;
use bid_leveling_rust::models::{AnalysisContext, AnalysisPreferences, Priority, RecommendationType, RiskKind};
use bid_leveling_rust::service::analyzer;

use common::{as_of, budget_line, gap_division, item, three_vendor_division, vendor_quote};

fn run(inputs: &bid_leveling_rust::models::DivisionInputs) -> bid_leveling_rust::models::CompetitiveAnalysis {
    let ctx = AnalysisContext::new(AnalysisPreferences::default(), as_of());
    analyzer::analyze(&inputs.division_id, &inputs.quotes, &inputs.budget_lines, &ctx)
}

#[test]
fn wide_spread_triggers_negotiation_and_awards_cheapest() {
    let inputs = three_vendor_division();
    let analysis = run(&inputs);

    assert_eq!(analysis.quote_count, 3);
    assert_eq!(analysis.price_spread.lowest, BigDecimal::from(100_000));
    assert_eq!(analysis.price_spread.highest, BigDecimal::from(135_000));
    assert!((analysis.price_spread.variance_percent - 25.93).abs() < 0.01);

    let negotiate = analysis
        .recommendations
        .iter()
        .find(|r| r.kind == RecommendationType::Negotiate)
        .expect("negotiate recommendation");
    assert_eq!(negotiate.priority, Priority::High);
    assert_eq!(negotiate.potential_savings, Some(BigDecimal::from(35_000)));

    let awards: Vec<_> = analysis
        .recommendations
        .iter()
        .filter(|r| r.kind == RecommendationType::Award)
        .collect();
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0].vendor_id.as_deref(), Some("a"));
    // three quotes, full coverage
    assert!((awards[0].confidence - 0.95).abs() < 1e-9);
}

#[test]
fn spread_is_measured_against_highest_quote() {
    let budget_lines = vec![budget_line("b1", "Framing", 100_000)];
    let quotes = [("a", 100_000), ("b", 110_000), ("c", 130_000)]
        .into_iter()
        .map(|(vendor_id, price)| {
            let quote_id = format!("q-{}", vendor_id);
            vendor_quote("d", vendor_id, vendor_id, vec![item(&format!("{}-1", vendor_id), &quote_id, "Framing", price, Some("b1"))])
        })
        .collect::<Vec<_>>();

    let ctx = AnalysisContext::new(AnalysisPreferences::default(), as_of());
    let analysis = analyzer::analyze("d", &quotes, &budget_lines, &ctx);

    assert!((analysis.price_spread.variance_percent - 23.08).abs() < 0.01);
    // exactly 1.3x is not an outlier
    assert!(analysis.vendors[2]
        .risk_factors
        .iter()
        .all(|r| r.kind != RiskKind::PriceOutlier));
}

#[test]
fn outlier_flagged_above_thirty_percent_over_budget() {
    let analysis = run(&three_vendor_division());
    let cedar = analysis.vendors.iter().find(|v| v.vendor_id == "c").unwrap();
    assert!(cedar.risk_factors.iter().any(|r| r.kind == RiskKind::PriceOutlier));
    assert!((cedar.budget_variance_percent - 35.0).abs() < 1e-9);

    let acme = analysis.vendors.iter().find(|v| v.vendor_id == "a").unwrap();
    assert!(acme.risk_factors.is_empty());
}

#[test]
fn missing_scope_produces_gap_and_clarification() {
    let analysis = run(&gap_division());

    assert_eq!(analysis.scope_gaps.len(), 1);
    let gap = &analysis.scope_gaps[0];
    assert_eq!(gap.budget_line_id, "b2");
    assert_eq!(gap.missing_vendors, vec!["Birch Builders".to_string()]);
    assert_eq!(gap.budget_amount, BigDecimal::from(20_000));

    let birch = analysis.vendors.iter().find(|v| v.vendor_id == "b").unwrap();
    assert_eq!(birch.completeness_score, 0.5);
    assert_eq!(birch.missing_budget_line_ids, vec!["b2".to_string()]);
    assert_eq!(birch.extra_item_count, 1);
    assert!(birch.risk_factors.iter().any(|r| r.kind == RiskKind::ScopeGap));

    let clarify = analysis
        .recommendations
        .iter()
        .find(|r| r.kind == RecommendationType::Clarify)
        .expect("clarify recommendation");
    assert_eq!(clarify.vendor_id.as_deref(), Some("b"));
    assert_eq!(clarify.budget_line_id.as_deref(), Some("b2"));
    assert!(clarify.description.contains("Finish carpentry trim"));
}

#[test]
fn recommendations_are_ordered_by_priority() {
    let analysis = run(&gap_division());
    let priorities: Vec<Priority> = analysis.recommendations.iter().map(|r| r.priority).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);
    assert_eq!(analysis.recommendations.last().map(|r| r.kind), Some(RecommendationType::Clarify));
}

#[test]
fn line_nobody_priced_lists_every_vendor() {
    let mut inputs = three_vendor_division();
    inputs.budget_lines.push(budget_line("b9", "Blocking and backing", 5_000));

    let analysis = run(&inputs);
    let gap = analysis
        .scope_gaps
        .iter()
        .find(|g| g.budget_line_id == "b9")
        .expect("universal gap reported");
    assert_eq!(
        gap.missing_vendors,
        vec!["Acme Framing".to_string(), "Birch Builders".to_string(), "Cedar Co".to_string()]
    );
}

#[test]
fn excluded_vendor_cannot_win() {
    let inputs = three_vendor_division();
    let preferences = AnalysisPreferences {
        excluded_vendors: vec!["a".to_string()],
        ..AnalysisPreferences::default()
    };
    let ctx = AnalysisContext::new(preferences, as_of());
    let analysis = analyzer::analyze(&inputs.division_id, &inputs.quotes, &inputs.budget_lines, &ctx);

    let award = analysis
        .recommendations
        .iter()
        .find(|r| r.kind == RecommendationType::Award)
        .unwrap();
    assert_eq!(award.vendor_id.as_deref(), Some("b"));
    // excluded vendors still appear in the comparison
    assert_eq!(analysis.vendors.len(), 3);
}

#[test]
fn empty_division_yields_empty_analysis() {
    let ctx = AnalysisContext::new(AnalysisPreferences::default(), as_of());
    let budget_lines = vec![budget_line("b1", "Framing", 1_000)];
    let analysis = analyzer::analyze("d", &[], &budget_lines, &ctx);

    assert_eq!(analysis.quote_count, 0);
    assert_eq!(analysis.price_spread.variance_percent, 0.0);
    assert!(analysis.scope_gaps.is_empty());
    assert!(analysis.recommendations.is_empty());
}

#[test]
fn direct_analysis_matches_workspace_for_unknown_hints() {
    let mut inputs = gap_division();
    // first hint names a line that is not in the budget
    inputs.quotes[1].line_items[0].mapped_budget_line_ids = vec!["b-retired".to_string(), "b1".to_string()];
    inputs.quotes[1].line_items[1].mapped_budget_line_ids = vec!["b-retired".to_string()];

    let direct = run(&inputs);
    let mut workspace = bid_leveling_rust::service::DivisionWorkspace::new(inputs);
    let via_workspace = workspace.analyze(AnalysisPreferences::default(), as_of()).unwrap();

    let direct_birch = direct.vendors.iter().find(|v| v.vendor_id == "b").unwrap();
    let workspace_birch = via_workspace.vendors.iter().find(|v| v.vendor_id == "b").unwrap();
    assert_eq!(direct_birch.missing_budget_line_ids, workspace_birch.missing_budget_line_ids);
    assert_eq!(direct_birch.extra_item_count, 1);
    assert_eq!(workspace_birch.extra_item_count, 1);
    assert_eq!(direct.scope_gaps, via_workspace.scope_gaps);
    assert_eq!(direct.recommendations, via_workspace.recommendations);
}
