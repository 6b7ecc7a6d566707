use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use rayon::prelude::*;

use crate::models::{
    budget_total, AnalysisContext, BudgetLine, CompetitiveAnalysis, CoverageStatus, PriceSpread,
    QualityIndicators, RiskFactor, RiskKind, ScopeGap, Severity, VendorMetrics, VendorQuote,
};
use crate::service::coverage::{self, MappingLookup, QuoteMappings};
use crate::service::recommender;

/// 报价总额超过预算 `OUTLIER_NUMERATOR / OUTLIER_DENOMINATOR` 倍 (1.3x) 视为异常
const OUTLIER_NUMERATOR: i64 = 13;
const OUTLIER_DENOMINATOR: i64 = 10;
/// 缺项数超过该值时范围缺口为高风险
const SCOPE_GAP_HIGH_THRESHOLD: usize = 2;
/// 描述平均长度达到该值时明细度满分
const DETAIL_NORMALIZER: f64 = 50.0;
const EXCLUSIONS_CLEAR: f64 = 0.8;
const EXCLUSIONS_UNCLEAR: f64 = 0.4;

/// 全部明细合计, 含未映射明细
pub fn total_quote_price(quote: &VendorQuote) -> BigDecimal {
    quote.total_price()
}

pub fn price_spread(totals: &[BigDecimal]) -> PriceSpread {
    let (Some(lowest), Some(highest)) = (totals.iter().min(), totals.iter().max()) else {
        return PriceSpread::empty();
    };

    let sum = totals.iter().fold(BigDecimal::zero(), |acc, t| acc + t);
    let average = (sum / BigDecimal::from(totals.len() as u64)).round(2);

    PriceSpread {
        lowest: lowest.clone(),
        highest: highest.clone(),
        average,
        variance_percent: percent_of(&(highest - lowest), highest),
    }
}

/// `part / whole * 100`, `whole` 非正时为 0
pub(crate) fn percent_of(part: &BigDecimal, whole: &BigDecimal) -> f64 {
    if *whole <= BigDecimal::zero() {
        return 0.0;
    }
    (part * BigDecimal::from(100) / whole).to_f64().unwrap_or(0.0)
}

/// 至少一家未报价的预算行 (含全体缺项)
pub fn scope_gaps<L: MappingLookup + ?Sized>(
    quotes: &[VendorQuote],
    budget_lines: &[BudgetLine],
    lookup: &L,
) -> Vec<ScopeGap> {
    if quotes.is_empty() {
        return Vec::new();
    }

    budget_lines
        .iter()
        .filter_map(|line| {
            let missing_vendors: Vec<String> = quotes
                .iter()
                .filter(|q| coverage::classify(q, &line.id, lookup).is_missing())
                .map(|q| q.vendor_name.clone())
                .collect();

            if missing_vendors.is_empty() {
                return None;
            }
            Some(ScopeGap {
                budget_line_id: line.id.clone(),
                missing_vendors,
                description: line.description.clone(),
                budget_amount: line.total_cost.clone(),
            })
        })
        .collect()
}

pub fn risk_factors<L: MappingLookup + ?Sized>(
    quote: &VendorQuote,
    budget_lines: &[BudgetLine],
    lookup: &L,
) -> Vec<RiskFactor> {
    let mut risks = Vec::new();

    let total = total_quote_price(quote);
    let budget = budget_total(budget_lines);
    if &total * BigDecimal::from(OUTLIER_DENOMINATOR) > &budget * BigDecimal::from(OUTLIER_NUMERATOR) {
        risks.push(RiskFactor {
            kind: RiskKind::PriceOutlier,
            severity: Severity::High,
            description: format!(
                "{} total {} exceeds budget {} by more than 30%",
                quote.vendor_name, total, budget
            ),
        });
    }

    let missing = coverage::missing_budget_lines(quote, budget_lines, lookup).len();
    if missing > 0 {
        let severity = if missing > SCOPE_GAP_HIGH_THRESHOLD {
            Severity::High
        } else {
            Severity::Medium
        };
        risks.push(RiskFactor {
            kind: RiskKind::ScopeGap,
            severity,
            description: format!("{} budget line(s) not priced by {}", missing, quote.vendor_name),
        });
    }

    risks
}

pub fn quality_indicators(quote: &VendorQuote) -> QualityIndicators {
    let avg_description_length = if quote.line_items.is_empty() {
        0.0
    } else {
        let chars: usize = quote
            .line_items
            .iter()
            .map(|i| i.description.chars().count())
            .sum();
        chars as f64 / quote.line_items.len() as f64
    };

    QualityIndicators {
        detail_level: (avg_description_length / DETAIL_NORMALIZER).min(1.0),
        exclusions_clarity: if quote.has_exclusions() {
            EXCLUSIONS_CLEAR
        } else {
            EXCLUSIONS_UNCLEAR
        },
    }
}

/// 该报价覆盖的预算行占比
pub fn completeness_score<L: MappingLookup + ?Sized>(
    quote: &VendorQuote,
    budget_lines: &[BudgetLine],
    lookup: &L,
) -> f64 {
    let covered = budget_lines
        .iter()
        .filter(|line| !coverage::classify(quote, &line.id, lookup).is_missing())
        .count();
    covered as f64 / budget_lines.len().max(1) as f64
}

pub fn vendor_metrics<L: MappingLookup + ?Sized>(
    quote: &VendorQuote,
    budget_lines: &[BudgetLine],
    lookup: &L,
) -> VendorMetrics {
    let total_price = total_quote_price(quote);
    let budget = budget_total(budget_lines);

    let mut missing_budget_line_ids = Vec::new();
    let mut partial_budget_line_ids = Vec::new();
    for line in budget_lines {
        match coverage::classify(quote, &line.id, lookup) {
            CoverageStatus::Missing => missing_budget_line_ids.push(line.id.clone()),
            CoverageStatus::Partial { .. } => partial_budget_line_ids.push(line.id.clone()),
            CoverageStatus::Covered { .. } => {}
        }
    }

    VendorMetrics {
        vendor_id: quote.vendor_id.clone(),
        vendor_name: quote.vendor_name.clone(),
        quote_id: quote.id.clone(),
        budget_variance_percent: percent_of(&(&total_price - &budget), &budget),
        total_price,
        completeness_score: completeness_score(quote, budget_lines, lookup),
        missing_budget_line_ids,
        partial_budget_line_ids,
        extra_item_count: quote
            .line_items
            .iter()
            .filter(|i| coverage::is_extra(i, lookup))
            .count(),
        risk_factors: risk_factors(quote, budget_lines, lookup),
        quality_indicators: quality_indicators(quote),
    }
}

/// 分部完整比价; 仅依赖 (报价, 预算行, 上下文)
pub fn analyze(
    division_id: &str,
    quotes: &[VendorQuote],
    budget_lines: &[BudgetLine],
    ctx: &AnalysisContext,
) -> CompetitiveAnalysis {
    let lookup = QuoteMappings::from_quotes(quotes, budget_lines);

    // Phase 1: 逐供应商指标 (保持输入顺序)
    let vendors: Vec<VendorMetrics> = quotes
        .par_iter()
        .map(|q| vendor_metrics(q, budget_lines, &lookup))
        .collect();

    // Phase 2: 分部整体指标
    let totals: Vec<BigDecimal> = vendors.iter().map(|v| v.total_price.clone()).collect();
    let spread = price_spread(&totals);
    let gaps = scope_gaps(quotes, budget_lines, &lookup);

    // Phase 3: 规则阶梯
    let recommendations = recommender::generate(&vendors, &spread, budget_lines, &ctx.preferences);

    tracing::debug!(
        "Division {}: {} quotes, variance {:.2}%, {} scope gaps, {} recommendations",
        division_id,
        quotes.len(),
        spread.variance_percent,
        gaps.len(),
        recommendations.len()
    );

    CompetitiveAnalysis {
        division_id: division_id.to_string(),
        quote_count: quotes.len(),
        budget_total: budget_total(budget_lines),
        price_spread: spread,
        scope_gaps: gaps,
        vendors,
        recommendations,
        mapping_version: ctx.mapping_version,
        timestamp: ctx.as_of,
    }
}
