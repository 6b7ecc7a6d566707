use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePriority {
    #[default]
    Standard,
    Rush,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

fn default_price_weight() -> f64 {
    0.8
}

fn default_quality_weight() -> f64 {
    0.2
}

fn default_local_preference() -> f64 {
    0.1
}

/// 单次分析的调用方偏好
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPreferences {
    #[serde(default = "default_price_weight")]
    pub price_weight: f64,
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,
    #[serde(default)]
    pub schedule_priority: SchedulePriority,
    #[serde(default)]
    pub risk_tolerance: RiskTolerance,
    #[serde(default = "default_local_preference")]
    pub local_preference: f64,
    /// 不参与授标的供应商 id
    #[serde(default)]
    pub excluded_vendors: Vec<String>,
}

impl Default for AnalysisPreferences {
    fn default() -> Self {
        Self {
            price_weight: default_price_weight(),
            quality_weight: default_quality_weight(),
            schedule_priority: SchedulePriority::default(),
            risk_tolerance: RiskTolerance::default(),
            local_preference: default_local_preference(),
            excluded_vendors: Vec::new(),
        }
    }
}

impl AnalysisPreferences {
    pub fn validate(&self) -> AppResult<()> {
        for (name, weight) in [("price_weight", self.price_weight), ("quality_weight", self.quality_weight)] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(AppError::validation(format!("{name} must be within [0, 1], got {weight}")));
            }
        }
        if !(0.0..=0.2).contains(&self.local_preference) {
            return Err(AppError::validation(format!(
                "local_preference must be within [0, 0.2], got {}",
                self.local_preference
            )));
        }
        Ok(())
    }

    pub fn is_excluded(&self, vendor_id: &str) -> bool {
        self.excluded_vendors.iter().any(|v| v == vendor_id)
    }
}

/// 显式的分析上下文, 分析状态不放在全局
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisContext {
    pub preferences: AnalysisPreferences,
    /// 写入结果的时间戳, 保证重复分析输出一致
    pub as_of: DateTime<Utc>,
    pub mapping_version: u64,
}

impl AnalysisContext {
    pub fn new(preferences: AnalysisPreferences, as_of: DateTime<Utc>) -> Self {
        Self {
            preferences,
            as_of,
            mapping_version: 0,
        }
    }

    pub fn with_mapping_version(mut self, version: u64) -> Self {
        self.mapping_version = version;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSpread {
    pub lowest: BigDecimal,
    pub highest: BigDecimal,
    pub average: BigDecimal,
    pub variance_percent: f64,
}

impl PriceSpread {
    pub fn empty() -> Self {
        Self {
            lowest: BigDecimal::from(0),
            highest: BigDecimal::from(0),
            average: BigDecimal::from(0),
            variance_percent: 0.0,
        }
    }
}

/// 至少一家供应商未报价的预算行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeGap {
    pub budget_line_id: String,
    pub missing_vendors: Vec<String>,
    pub description: String,
    pub budget_amount: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    PriceOutlier,
    ScopeGap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    #[serde(rename = "type")]
    pub kind: RiskKind,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityIndicators {
    pub detail_level: f64,
    pub exclusions_clarity: f64,
}

impl QualityIndicators {
    /// 各指标均值
    pub fn mean(&self) -> f64 {
        (self.detail_level + self.exclusions_clarity) / 2.0
    }
}

/// 单个供应商的比价指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorMetrics {
    pub vendor_id: String,
    pub vendor_name: String,
    pub quote_id: String,
    pub total_price: BigDecimal,
    pub budget_variance_percent: f64,
    pub completeness_score: f64,
    pub missing_budget_line_ids: Vec<String>,
    /// 由多条明细报价的预算行, 需人工复核
    pub partial_budget_line_ids: Vec<String>,
    pub extra_item_count: usize,
    pub risk_factors: Vec<RiskFactor>,
    pub quality_indicators: QualityIndicators,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Award,
    Negotiate,
    Clarify,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    // 声明顺序即排序顺序
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub priority: Priority,
    pub budget_line_id: Option<String>,
    pub vendor_id: Option<String>,
    pub title: String,
    pub description: String,
    pub potential_savings: Option<BigDecimal>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitiveAnalysis {
    pub division_id: String,
    pub quote_count: usize,
    pub budget_total: BigDecimal,
    pub price_spread: PriceSpread,
    pub scope_gaps: Vec<ScopeGap>,
    pub vendors: Vec<VendorMetrics>,
    pub recommendations: Vec<Recommendation>,
    pub mapping_version: u64,
    pub timestamp: DateTime<Utc>,
}

/// 分部分析历史中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisLogEntry {
    pub timestamp: DateTime<Utc>,
    pub mapping_version: u64,
    pub quote_count: usize,
    pub variance_percent: f64,
    pub recommended_vendor_id: Option<String>,
}

/// 只追加的分析历史, 由调用方持有
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisLog {
    entries: Vec<AnalysisLogEntry>,
}

impl AnalysisLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, analysis: &CompetitiveAnalysis) {
        let recommended_vendor_id = analysis
            .recommendations
            .iter()
            .find(|r| r.kind == RecommendationType::Award)
            .and_then(|r| r.vendor_id.clone());

        self.entries.push(AnalysisLogEntry {
            timestamp: analysis.timestamp,
            mapping_version: analysis.mapping_version,
            quote_count: analysis.quote_count,
            variance_percent: analysis.price_spread.variance_percent,
            recommended_vendor_id,
        });
    }

    pub fn entries(&self) -> &[AnalysisLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
