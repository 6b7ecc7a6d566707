pub mod analysis;
pub mod budget;
pub mod decision;
pub mod division;
pub mod mapping;
pub mod quote;

pub use analysis::{
    AnalysisContext, AnalysisLog, AnalysisLogEntry, AnalysisPreferences, CompetitiveAnalysis,
    PriceSpread, Priority, QualityIndicators, Recommendation, RecommendationType, RiskFactor,
    RiskKind, RiskTolerance, SchedulePriority, ScopeGap, Severity, VendorMetrics,
};
pub use budget::{budget_total, BudgetLine};
pub use decision::{
    BudgetBasis, DivisionStatus, LineAward, LineDecisionOutcome, SavedDecision, WorkOrderRequest,
};
pub use division::DivisionInputs;
pub use mapping::{
    BudgetLineCoverage, CoverageStatus, Mapping, VendorCoverage, DEFAULT_MAPPING_CONFIDENCE,
};
pub use quote::{CoverageTag, QuoteLineItem, VendorQuote};
