use bigdecimal::{BigDecimal, ToPrimitive};

use crate::models::{
    AnalysisPreferences, BudgetLine, PriceSpread, Priority, Recommendation, RecommendationType,
    VendorMetrics,
};

/// 价差超过该百分比时建议议价
const NEGOTIATE_VARIANCE_THRESHOLD: f64 = 15.0;
const NEGOTIATE_CONFIDENCE: f64 = 0.85;
const CLARIFY_CONFIDENCE: f64 = 0.9;
/// 澄清建议中列出的缺项数
const CLARIFY_LISTED_ITEMS: usize = 2;

const BASE_CONFIDENCE: f64 = 0.7;
const THREE_QUOTE_BONUS: f64 = 0.15;
const FIVE_QUOTE_BONUS: f64 = 0.10;
const COMPLETENESS_BONUS: f64 = 0.15;
const MAX_CONFIDENCE: f64 = 0.95;

/// 执行规则阶梯, 结果按 high > medium > low 排序
pub fn generate(
    vendors: &[VendorMetrics],
    spread: &PriceSpread,
    budget_lines: &[BudgetLine],
    preferences: &AnalysisPreferences,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    // 1. 价差过大 -> 议价
    if spread.variance_percent > NEGOTIATE_VARIANCE_THRESHOLD {
        recommendations.push(Recommendation {
            kind: RecommendationType::Negotiate,
            priority: Priority::High,
            budget_line_id: None,
            vendor_id: None,
            title: "Negotiate pricing".to_string(),
            description: format!(
                "Quotes range from {} to {} ({:.1}% spread); use the low bid as leverage",
                spread.lowest, spread.highest, spread.variance_percent
            ),
            potential_savings: Some(&spread.highest - &spread.lowest),
            confidence: NEGOTIATE_CONFIDENCE,
        });
    }

    // 2. 范围缺失 -> 澄清 (每家供应商一条)
    for vendor in vendors.iter().filter(|v| !v.missing_budget_line_ids.is_empty()) {
        recommendations.push(clarify_scope(vendor, budget_lines));
    }

    // 3. 唯一的授标建议
    if let Some(winner) = select_winner(vendors, preferences) {
        recommendations.push(Recommendation {
            kind: RecommendationType::Award,
            priority: Priority::High,
            budget_line_id: None,
            vendor_id: Some(winner.vendor_id.clone()),
            title: format!("Award to {}", winner.vendor_name),
            description: format!(
                "{} offers the best value at {} ({:+.1}% vs budget, {:.0}% scope coverage)",
                winner.vendor_name,
                winner.total_price,
                winner.budget_variance_percent,
                winner.completeness_score * 100.0
            ),
            potential_savings: Some(&spread.highest - &winner.total_price),
            confidence: compute_confidence(vendors.len(), winner.completeness_score),
        });
    } else if !vendors.is_empty() {
        tracing::warn!("All {} vendors excluded, no award recommendation", vendors.len());
    }

    // 稳定排序: 同级保持生成顺序
    recommendations.sort_by_key(|r| r.priority);
    recommendations
}

fn clarify_scope(vendor: &VendorMetrics, budget_lines: &[BudgetLine]) -> Recommendation {
    let missing = &vendor.missing_budget_line_ids;
    let names: Vec<&str> = missing
        .iter()
        .take(CLARIFY_LISTED_ITEMS)
        .map(|id| {
            budget_lines
                .iter()
                .find(|b| &b.id == id)
                .map(|b| b.description.as_str())
                .unwrap_or(id.as_str())
        })
        .collect();
    let ellipsis = if missing.len() > CLARIFY_LISTED_ITEMS { "..." } else { "" };

    Recommendation {
        kind: RecommendationType::Clarify,
        priority: Priority::Medium,
        budget_line_id: match missing.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        },
        vendor_id: Some(vendor.vendor_id.clone()),
        title: format!("Clarify scope with {}", vendor.vendor_name),
        description: format!(
            "{} budget line(s) not priced: {}{}",
            missing.len(),
            names.join(", "),
            ellipsis
        ),
        potential_savings: None,
        confidence: CLARIFY_CONFIDENCE,
    }
}

/// 授标置信度: 基础值 + 报价数加成 + 完整度加成, 设上限
pub fn compute_confidence(quote_count: usize, winner_completeness: f64) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if quote_count >= 3 {
        confidence += THREE_QUOTE_BONUS;
    }
    if quote_count >= 5 {
        confidence += FIVE_QUOTE_BONUS;
    }
    confidence += COMPLETENESS_BONUS * winner_completeness.clamp(0.0, 1.0);
    confidence.min(MAX_CONFIDENCE)
}

/// 价格得分 [0, 1]: 最低价为 1, 最高价为 0
fn normalized_price(total: &BigDecimal, lowest: &BigDecimal, highest: &BigDecimal) -> f64 {
    if highest <= lowest {
        return 1.0;
    }
    ((highest - total) / (highest - lowest)).to_f64().unwrap_or(0.0)
}

/// 综合授标得分, 越高越好
pub fn weighted_score(
    vendor: &VendorMetrics,
    lowest: &BigDecimal,
    highest: &BigDecimal,
    preferences: &AnalysisPreferences,
) -> f64 {
    preferences.price_weight * normalized_price(&vendor.total_price, lowest, highest)
        + preferences.quality_weight * vendor.quality_indicators.mean()
}

/// 未被排除的最优供应商; 平分时取靠前者
pub fn select_winner<'a>(
    vendors: &'a [VendorMetrics],
    preferences: &AnalysisPreferences,
) -> Option<&'a VendorMetrics> {
    let candidates: Vec<&VendorMetrics> = vendors
        .iter()
        .filter(|v| !preferences.is_excluded(&v.vendor_id))
        .collect();

    let lowest = candidates.iter().map(|v| &v.total_price).min()?;
    let highest = candidates.iter().map(|v| &v.total_price).max()?;

    if preferences.quality_weight <= 0.0 {
        // 纯价格: 最低价胜出
        let mut best: Option<&VendorMetrics> = None;
        for &v in &candidates {
            if best.map_or(true, |b| v.total_price < b.total_price) {
                best = Some(v);
            }
        }
        return best;
    }

    let mut best: Option<(&VendorMetrics, f64)> = None;
    for &v in &candidates {
        let score = weighted_score(v, lowest, highest, preferences);
        tracing::debug!("Award score {}: {:.4}", v.vendor_name, score);
        let is_better = match best {
            None => true,
            Some((_, best_score)) => score > best_score,
        };
        if is_better {
            best = Some((v, score));
        }
    }
    best.map(|(v, _)| v)
}
