use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 分部状态, 只能前进
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisionStatus {
    #[default]
    NoQuotes,
    QuotesUploaded,
    WinnerSelected,
}

impl DivisionStatus {
    /// 推进到 `next` (不回退), 返回推进后的状态
    pub fn advance(&mut self, next: DivisionStatus) -> DivisionStatus {
        if next > *self {
            *self = next;
        }
        *self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DivisionStatus::NoQuotes => "no_quotes",
            DivisionStatus::QuotesUploaded => "quotes_uploaded",
            DivisionStatus::WinnerSelected => "winner_selected",
        }
    }
}

/// 核对决策时哪些预算行计入 `budget_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetBasis {
    /// 分部全部预算行
    #[default]
    AllLines,
    /// 仅已授标的预算行
    AwardedLines,
}

impl BudgetBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetBasis::AllLines => "all_lines",
            BudgetBasis::AwardedLines => "awarded_lines",
        }
    }
}

/// 单个预算行的供应商选择; `final_price` 为快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAward {
    pub budget_line_id: String,
    pub vendor_id: String,
    pub quote_id: String,
    pub quote_line_item_id: String,
    /// 供应商拆分报价时的全部明细
    pub quote_line_item_ids: Vec<String>,
    pub final_price: BigDecimal,
}

/// 单行选择的结果
#[derive(Debug, Clone, PartialEq)]
pub enum LineDecisionOutcome {
    Recorded(LineAward),
    /// 供应商已无该行映射, 未做修改
    Stale,
}

/// 已持久化的最终决策
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDecision {
    pub division_id: String,
    pub revision: u32,
    pub primary_vendor_id: Option<String>,
    pub notes: String,
    pub line_awards: Vec<LineAward>,
    pub budget_basis: BudgetBasis,
    pub total_award: BigDecimal,
    pub budget_total: BigDecimal,
    pub total_delta: BigDecimal,
    pub delta_percent: f64,
    pub saved_at: DateTime<Utc>,
}

/// 交给文档生成方的工单请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderRequest {
    pub division_id: String,
    pub decision_revision: u32,
    pub primary_vendor_id: Option<String>,
    pub notes: String,
    pub line_awards: Vec<LineAward>,
    pub total_award: BigDecimal,
}

impl From<&SavedDecision> for WorkOrderRequest {
    fn from(decision: &SavedDecision) -> Self {
        Self {
            division_id: decision.division_id.clone(),
            decision_revision: decision.revision,
            primary_vendor_id: decision.primary_vendor_id.clone(),
            notes: decision.notes.clone(),
            line_awards: decision.line_awards.clone(),
            total_award: decision.total_award.clone(),
        }
    }
}
