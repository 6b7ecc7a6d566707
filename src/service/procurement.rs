use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::DivisionRepository;
use crate::error::{AppError, AppResult};
use crate::models::{
    AnalysisPreferences, BudgetBasis, BudgetLineCoverage, CompetitiveAnalysis, DivisionInputs,
    LineAward, LineDecisionOutcome, Mapping, SavedDecision, WorkOrderRequest,
};
use crate::service::work_order;
use crate::service::workspace::{DivisionSummary, DivisionWorkspace};

/// 分部注册表; 同一分部的所有操作都在其互斥锁内串行执行
///
/// 每个分部的 `Arc<Mutex<_>>` 一经插入便不再替换.
pub struct ProcurementService<R> {
    repository: R,
    divisions: DashMap<String, Arc<Mutex<DivisionWorkspace>>>,
    default_preferences: AnalysisPreferences,
    default_basis: BudgetBasis,
}

impl<R: DivisionRepository> ProcurementService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            divisions: DashMap::new(),
            default_preferences: AnalysisPreferences::default(),
            default_basis: BudgetBasis::default(),
        }
    }

    pub fn with_defaults(mut self, preferences: AnalysisPreferences, basis: BudgetBasis) -> Self {
        self.default_preferences = preferences;
        self.default_basis = basis;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// 登记上游交付的分部数据; 已有分部在其锁内原地替换
    pub async fn ingest(&self, inputs: DivisionInputs) -> AppResult<DivisionSummary> {
        let division_id = inputs.division_id.clone();

        // entry 守卫在 match 结束时释放, 不跨 await
        let slot = match self.divisions.entry(division_id.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let workspace = DivisionWorkspace::new(inputs);
                let summary = workspace.summary();
                entry.insert(Arc::new(Mutex::new(workspace)));
                return Ok(summary);
            }
        };

        let mut ws = slot.lock().await;
        if ws.awards().is_locked() {
            return Err(AppError::validation(format!(
                "Division {} has a saved decision and cannot be reloaded",
                division_id
            )));
        }
        *ws = DivisionWorkspace::new(inputs);
        Ok(ws.summary())
    }

    /// 从仓储加载分部并登记
    pub async fn load(&self, division_id: &str) -> AppResult<DivisionSummary> {
        let inputs = self
            .repository
            .load_division(division_id)
            .await?
            .ok_or_else(|| AppError::DivisionNotFound(division_id.to_string()))?;
        self.ingest(inputs).await
    }

    pub async fn summary(&self, division_id: &str) -> AppResult<DivisionSummary> {
        let ws = self.workspace(division_id)?;
        let ws = ws.lock().await;
        Ok(ws.summary())
    }

    pub async fn create_mapping(
        &self,
        division_id: &str,
        budget_line_id: &str,
        quote_line_item_id: &str,
    ) -> AppResult<Mapping> {
        let ws = self.workspace(division_id)?;
        let mut ws = ws.lock().await;
        ws.create_mapping(budget_line_id, quote_line_item_id)
    }

    pub async fn remove_mapping(&self, division_id: &str, quote_line_item_id: &str) -> AppResult<Option<Mapping>> {
        let ws = self.workspace(division_id)?;
        let mut ws = ws.lock().await;
        ws.remove_mapping(quote_line_item_id)
    }

    /// 全部映射; 指定预算行时只返回映射到该行的报价明细
    pub async fn mappings(&self, division_id: &str, budget_line_id: Option<&str>) -> AppResult<Vec<Mapping>> {
        let ws = self.workspace(division_id)?;
        let ws = ws.lock().await;
        let store = ws.mappings();
        Ok(match budget_line_id {
            Some(id) => store.get_mapped_quote_lines(id).into_iter().cloned().collect(),
            None => store.mappings().cloned().collect(),
        })
    }

    pub async fn mapped_budget_line(&self, division_id: &str, quote_line_item_id: &str) -> AppResult<Option<Mapping>> {
        let ws = self.workspace(division_id)?;
        let ws = ws.lock().await;
        Ok(ws.mappings().get_mapped_budget_line(quote_line_item_id).cloned())
    }

    pub async fn suggest_mappings(&self, division_id: &str) -> AppResult<Vec<Mapping>> {
        let ws = self.workspace(division_id)?;
        let mut ws = ws.lock().await;
        ws.suggest_mappings()
    }

    pub async fn coverage(&self, division_id: &str) -> AppResult<Vec<BudgetLineCoverage>> {
        let ws = self.workspace(division_id)?;
        let ws = ws.lock().await;
        Ok(ws.coverage())
    }

    /// 重新比价; `preferences` 缺省时使用配置默认值
    pub async fn analyze(
        &self,
        division_id: &str,
        preferences: Option<AnalysisPreferences>,
    ) -> AppResult<CompetitiveAnalysis> {
        let ws = self.workspace(division_id)?;
        let mut ws = ws.lock().await;
        let preferences = preferences.unwrap_or_else(|| self.default_preferences.clone());
        ws.analyze(preferences, Utc::now())
    }

    pub async fn update_line_decision(
        &self,
        division_id: &str,
        budget_line_id: &str,
        vendor_id: &str,
    ) -> AppResult<LineDecisionOutcome> {
        let ws = self.workspace(division_id)?;
        let mut ws = ws.lock().await;
        ws.update_line_decision(budget_line_id, vendor_id)
    }

    pub async fn clear_line_decision(&self, division_id: &str, budget_line_id: &str) -> AppResult<Option<LineAward>> {
        let ws = self.workspace(division_id)?;
        let mut ws = ws.lock().await;
        Ok(ws.clear_line_decision(budget_line_id))
    }

    pub async fn select_all_from_vendor(&self, division_id: &str, vendor_id: &str) -> AppResult<usize> {
        let ws = self.workspace(division_id)?;
        let mut ws = ws.lock().await;
        Ok(ws.select_all_from_vendor(vendor_id))
    }

    /// 校验 -> 持久化 -> 采纳; 持久化失败时状态不变
    pub async fn save_decision(
        &self,
        division_id: &str,
        notes: Option<String>,
        basis: Option<BudgetBasis>,
    ) -> AppResult<SavedDecision> {
        let ws = self.workspace(division_id)?;
        let mut ws = ws.lock().await;

        if let Some(notes) = notes {
            ws.set_notes(notes);
        }
        let decision = ws.prepare_decision(basis.unwrap_or(self.default_basis), Utc::now())?;

        if let Err(e) = self.repository.save_decision(&decision).await {
            tracing::error!("Division {}: decision save failed, nothing committed: {}", division_id, e);
            return Err(e);
        }

        Ok(ws.commit_decision(decision).clone())
    }

    pub async fn work_order(&self, division_id: &str) -> AppResult<WorkOrderRequest> {
        let ws = self.workspace(division_id)?;
        let ws = ws.lock().await;
        ws.work_order_request()
    }

    pub async fn work_order_csv(&self, division_id: &str) -> AppResult<String> {
        let request = self.work_order(division_id).await?;
        work_order::work_order_csv_string(&request)
    }

    fn find(&self, division_id: &str) -> Option<Arc<Mutex<DivisionWorkspace>>> {
        // 克隆出 Arc, 避免跨 await 持有分片锁
        self.divisions.get(division_id).map(|entry| Arc::clone(entry.value()))
    }

    fn workspace(&self, division_id: &str) -> AppResult<Arc<Mutex<DivisionWorkspace>>> {
        self.find(division_id)
            .ok_or_else(|| AppError::DivisionNotFound(division_id.to_string()))
    }
}
