use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{
    AnalysisContext, AnalysisLog, AnalysisPreferences, BudgetBasis, BudgetLine,
    BudgetLineCoverage, CompetitiveAnalysis, DivisionInputs, DivisionStatus, LineAward,
    LineDecisionOutcome, Mapping, SavedDecision, VendorQuote, WorkOrderRequest,
};
use crate::service::analyzer;
use crate::service::award::AwardManager;
use crate::service::coverage;
use crate::service::mapping_store::MappingStore;

/// 分部状态快照, 用于接口返回
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionSummary {
    pub division_id: String,
    pub status: DivisionStatus,
    pub budget_line_count: usize,
    pub quote_count: usize,
    pub mapping_count: usize,
    pub mapping_version: u64,
    pub line_award_count: usize,
}

/// 单个分部的全部可变状态; 调用方负责串行访问
#[derive(Debug)]
pub struct DivisionWorkspace {
    division_id: String,
    budget_lines: Vec<BudgetLine>,
    quotes: Vec<VendorQuote>,
    mappings: MappingStore,
    awards: AwardManager,
    analysis_log: AnalysisLog,
}

impl DivisionWorkspace {
    pub fn new(inputs: DivisionInputs) -> Self {
        let DivisionInputs {
            division_id,
            budget_lines,
            quotes,
        } = inputs;

        let mappings = MappingStore::seeded(&budget_lines, &quotes);
        let mut awards = AwardManager::new(division_id.clone());
        if !quotes.is_empty() {
            awards.mark_quotes_uploaded();
        }

        tracing::info!(
            "Division {}: loaded {} budget lines, {} quotes, {} seeded mappings",
            division_id, budget_lines.len(), quotes.len(), mappings.len()
        );

        Self {
            division_id,
            budget_lines,
            quotes,
            mappings,
            awards,
            analysis_log: AnalysisLog::new(),
        }
    }

    pub fn division_id(&self) -> &str {
        &self.division_id
    }

    pub fn budget_lines(&self) -> &[BudgetLine] {
        &self.budget_lines
    }

    pub fn quotes(&self) -> &[VendorQuote] {
        &self.quotes
    }

    pub fn mappings(&self) -> &MappingStore {
        &self.mappings
    }

    pub fn awards(&self) -> &AwardManager {
        &self.awards
    }

    pub fn analysis_log(&self) -> &AnalysisLog {
        &self.analysis_log
    }

    pub fn status(&self) -> DivisionStatus {
        self.awards.status()
    }

    pub fn summary(&self) -> DivisionSummary {
        DivisionSummary {
            division_id: self.division_id.clone(),
            status: self.status(),
            budget_line_count: self.budget_lines.len(),
            quote_count: self.quotes.len(),
            mapping_count: self.mappings.len(),
            mapping_version: self.mappings.version(),
            line_award_count: self.awards.line_awards().count(),
        }
    }

    pub fn create_mapping(&mut self, budget_line_id: &str, quote_line_item_id: &str) -> AppResult<Mapping> {
        self.ensure_unlocked()?;
        self.mappings.create_mapping(budget_line_id, quote_line_item_id)
    }

    pub fn remove_mapping(&mut self, quote_line_item_id: &str) -> AppResult<Option<Mapping>> {
        self.ensure_unlocked()?;
        Ok(self.mappings.remove_mapping(quote_line_item_id))
    }

    pub fn suggest_mappings(&mut self) -> AppResult<Vec<Mapping>> {
        self.ensure_unlocked()?;
        Ok(self.mappings.suggest_mappings(&self.budget_lines, &self.quotes))
    }

    pub fn coverage(&self) -> Vec<BudgetLineCoverage> {
        coverage::coverage_matrix(&self.quotes, &self.budget_lines, &self.mappings)
    }

    /// 基于当前映射执行分析并追加到历史
    pub fn analyze(
        &mut self,
        preferences: AnalysisPreferences,
        as_of: DateTime<Utc>,
    ) -> AppResult<CompetitiveAnalysis> {
        preferences.validate()?;
        let ctx = AnalysisContext::new(preferences, as_of).with_mapping_version(self.mappings.version());
        let quotes = self.mappings.project_onto(&self.quotes);

        let analysis = analyzer::analyze(&self.division_id, &quotes, &self.budget_lines, &ctx);
        self.analysis_log.record(&analysis);
        Ok(analysis)
    }

    pub fn update_line_decision(&mut self, budget_line_id: &str, vendor_id: &str) -> AppResult<LineDecisionOutcome> {
        self.awards.update_line_decision(
            budget_line_id,
            vendor_id,
            &self.budget_lines,
            &self.quotes,
            &self.mappings,
        )
    }

    pub fn select_all_from_vendor(&mut self, vendor_id: &str) -> usize {
        self.awards
            .select_all_from_vendor(vendor_id, &self.budget_lines, &self.quotes, &self.mappings)
    }

    pub fn clear_line_decision(&mut self, budget_line_id: &str) -> Option<LineAward> {
        self.awards.clear_line_decision(budget_line_id)
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.awards.set_notes(notes);
    }

    pub fn prepare_decision(&self, basis: BudgetBasis, saved_at: DateTime<Utc>) -> AppResult<SavedDecision> {
        self.awards
            .prepare_decision(&self.budget_lines, &self.quotes, &self.mappings, basis, saved_at)
    }

    pub fn commit_decision(&mut self, decision: SavedDecision) -> &SavedDecision {
        self.awards.commit(decision)
    }

    pub fn work_order_request(&self) -> AppResult<WorkOrderRequest> {
        self.awards.work_order_request()
    }

    fn ensure_unlocked(&self) -> AppResult<()> {
        if self.awards.is_locked() {
            return Err(AppError::validation(format!(
                "Division {} has a saved decision, mappings are locked",
                self.division_id
            )));
        }
        Ok(())
    }
}
