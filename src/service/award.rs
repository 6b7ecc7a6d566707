use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashSet;

use crate::error::{AppError, AppResult};
use crate::models::{
    budget_total, BudgetBasis, BudgetLine, DivisionStatus, LineAward, LineDecisionOutcome,
    SavedDecision, VendorQuote, WorkOrderRequest,
};
use crate::service::analyzer::percent_of;
use crate::service::coverage::{self, MappingLookup};

/// 单个分部的授标草稿与已保存决策
#[derive(Debug, Clone)]
pub struct AwardManager {
    division_id: String,
    status: DivisionStatus,
    primary_vendor_id: Option<String>,
    notes: String,
    /// 预算行 id -> 授标, 每行至多一条
    line_awards: IndexMap<String, LineAward>,
    saved: Option<SavedDecision>,
}

impl AwardManager {
    pub fn new(division_id: impl Into<String>) -> Self {
        Self {
            division_id: division_id.into(),
            status: DivisionStatus::NoQuotes,
            primary_vendor_id: None,
            notes: String::new(),
            line_awards: IndexMap::new(),
            saved: None,
        }
    }

    pub fn division_id(&self) -> &str {
        &self.division_id
    }

    pub fn status(&self) -> DivisionStatus {
        self.status
    }

    pub fn mark_quotes_uploaded(&mut self) -> DivisionStatus {
        self.status.advance(DivisionStatus::QuotesUploaded)
    }

    /// 保存过决策后映射即冻结
    pub fn is_locked(&self) -> bool {
        self.saved.is_some()
    }

    pub fn primary_vendor_id(&self) -> Option<&str> {
        self.primary_vendor_id.as_deref()
    }

    pub fn line_awards(&self) -> impl Iterator<Item = &LineAward> {
        self.line_awards.values()
    }

    pub fn line_award(&self, budget_line_id: &str) -> Option<&LineAward> {
        self.line_awards.get(budget_line_id)
    }

    pub fn latest_decision(&self) -> Option<&SavedDecision> {
        self.saved.as_ref()
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// 将预算行授予供应商, 价格为其映射明细之和
    pub fn update_line_decision<L: MappingLookup + ?Sized>(
        &mut self,
        budget_line_id: &str,
        vendor_id: &str,
        budget_lines: &[BudgetLine],
        quotes: &[VendorQuote],
        lookup: &L,
    ) -> AppResult<LineDecisionOutcome> {
        if !budget_lines.iter().any(|b| b.id == budget_line_id) {
            return Err(AppError::validation(format!("Budget line {} does not exist", budget_line_id)));
        }

        match price_line(budget_line_id, vendor_id, quotes, lookup) {
            Some(award) => {
                tracing::info!(
                    "Division {}: budget line {} -> vendor {} at {}",
                    self.division_id, budget_line_id, vendor_id, award.final_price
                );
                self.line_awards.insert(budget_line_id.to_string(), award.clone());
                Ok(LineDecisionOutcome::Recorded(award))
            }
            None => {
                tracing::warn!(
                    "Division {}: vendor {} no longer covers budget line {}, selection ignored",
                    self.division_id, vendor_id, budget_line_id
                );
                Ok(LineDecisionOutcome::Stale)
            }
        }
    }

    /// 授予该供应商覆盖的所有行, 其余行保持不变
    pub fn select_all_from_vendor<L: MappingLookup + ?Sized>(
        &mut self,
        vendor_id: &str,
        budget_lines: &[BudgetLine],
        quotes: &[VendorQuote],
        lookup: &L,
    ) -> usize {
        if !quotes.iter().any(|q| q.vendor_id == vendor_id) {
            tracing::warn!("Division {}: vendor {} has no quote, selection ignored", self.division_id, vendor_id);
            return 0;
        }

        let mut selected = 0;
        for line in budget_lines {
            if let Some(award) = price_line(&line.id, vendor_id, quotes, lookup) {
                self.line_awards.insert(line.id.clone(), award);
                selected += 1;
            }
        }
        self.primary_vendor_id = Some(vendor_id.to_string());

        tracing::info!(
            "Division {}: selected {} of {} budget lines from vendor {}",
            self.division_id, selected, budget_lines.len(), vendor_id
        );
        selected
    }

    pub fn clear_line_decision(&mut self, budget_line_id: &str) -> Option<LineAward> {
        self.line_awards.shift_remove(budget_line_id)
    }

    /// 按当前映射重新计价草稿并与预算核对, 不修改状态
    ///
    /// 映射在首次保存前仍可编辑, 因此成交价在保存时重新取快照;
    /// 已不再覆盖该预算行的草稿被丢弃.
    pub fn prepare_decision<L: MappingLookup + ?Sized>(
        &self,
        budget_lines: &[BudgetLine],
        quotes: &[VendorQuote],
        lookup: &L,
        basis: BudgetBasis,
        saved_at: DateTime<Utc>,
    ) -> AppResult<SavedDecision> {
        if self.line_awards.is_empty() {
            return Err(AppError::validation("Cannot save a decision without line awards"));
        }

        let mut line_awards: Vec<LineAward> = Vec::with_capacity(self.line_awards.len());
        for draft in self.line_awards.values() {
            match price_line(&draft.budget_line_id, &draft.vendor_id, quotes, lookup) {
                Some(award) => line_awards.push(award),
                None => tracing::warn!(
                    "Division {}: vendor {} no longer covers budget line {}, award dropped",
                    self.division_id, draft.vendor_id, draft.budget_line_id
                ),
            }
        }
        if line_awards.is_empty() {
            return Err(AppError::validation(
                "No line award is still covered by the current mappings",
            ));
        }

        let awarded: HashSet<&str> = line_awards.iter().map(|a| a.budget_line_id.as_str()).collect();
        let total_award = line_awards
            .iter()
            .fold(BigDecimal::zero(), |acc, a| acc + &a.final_price);
        let budget = match basis {
            BudgetBasis::AllLines => budget_total(budget_lines),
            BudgetBasis::AwardedLines => {
                budget_total(budget_lines.iter().filter(|b| awarded.contains(b.id.as_str())))
            }
        };
        let total_delta = &total_award - &budget;
        let delta_percent = percent_of(&total_delta, &budget);

        Ok(SavedDecision {
            division_id: self.division_id.clone(),
            revision: self.saved.as_ref().map_or(1, |d| d.revision + 1),
            primary_vendor_id: self.primary_vendor_id.clone(),
            notes: self.notes.clone(),
            line_awards,
            budget_basis: basis,
            total_award,
            budget_total: budget,
            total_delta,
            delta_percent,
            saved_at,
        })
    }

    /// 采纳已持久化的决策, 取代上一版; 草稿同步为保存时的快照
    pub fn commit(&mut self, decision: SavedDecision) -> &SavedDecision {
        self.status.advance(DivisionStatus::WinnerSelected);
        tracing::info!(
            "Division {}: decision revision {} saved, award {} vs budget {} ({:+.2}%)",
            self.division_id, decision.revision, decision.total_award, decision.budget_total, decision.delta_percent
        );
        self.line_awards = decision
            .line_awards
            .iter()
            .map(|a| (a.budget_line_id.clone(), a.clone()))
            .collect();
        self.saved.insert(decision)
    }

    /// 一步完成 prepare + commit, 供无仓储的调用方使用
    pub fn save_decision<L: MappingLookup + ?Sized>(
        &mut self,
        budget_lines: &[BudgetLine],
        quotes: &[VendorQuote],
        lookup: &L,
        basis: BudgetBasis,
        saved_at: DateTime<Utc>,
    ) -> AppResult<&SavedDecision> {
        let decision = self.prepare_decision(budget_lines, quotes, lookup, basis, saved_at)?;
        Ok(self.commit(decision))
    }

    pub fn work_order_request(&self) -> AppResult<WorkOrderRequest> {
        self.saved
            .as_ref()
            .map(WorkOrderRequest::from)
            .ok_or_else(|| {
                AppError::validation(format!("Division {} has no saved decision", self.division_id))
            })
    }
}

/// 按供应商映射明细为预算行计价; 未覆盖时返回 `None`
fn price_line<L: MappingLookup + ?Sized>(
    budget_line_id: &str,
    vendor_id: &str,
    quotes: &[VendorQuote],
    lookup: &L,
) -> Option<LineAward> {
    quotes
        .iter()
        .filter(|q| q.vendor_id == vendor_id)
        .find_map(|quote| {
            let status = coverage::classify(quote, budget_line_id, lookup);
            let item_ids = status.quote_line_item_ids();
            let first = item_ids.first()?;

            let final_price = quote
                .line_items
                .iter()
                .filter(|i| item_ids.contains(&i.id.as_str()))
                .fold(BigDecimal::zero(), |acc, i| acc + &i.total_price);

            Some(LineAward {
                budget_line_id: budget_line_id.to_string(),
                vendor_id: vendor_id.to_string(),
                quote_id: quote.id.clone(),
                quote_line_item_id: first.to_string(),
                quote_line_item_ids: item_ids.iter().map(|s| s.to_string()).collect(),
                final_price,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::coverage::QuoteMappings;
    use crate::service::mapping_store::MappingStore;
    use crate::service::test_support::{budget_line, quote};
    use chrono::TimeZone;

    fn saved_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn fixture() -> (Vec<BudgetLine>, Vec<VendorQuote>) {
        let budget = vec![
            budget_line("b1", "Trusses", 1_000),
            budget_line("b2", "Sheathing", 500),
            budget_line("b3", "Hardware", 200),
        ];
        let quotes = vec![
            quote(
                "q1",
                "acme",
                "Acme",
                &[
                    ("a1", "Trusses", 900, Some("b1")),
                    ("a2", "Sheathing labor", 200, Some("b2")),
                    ("a3", "Sheathing material", 250, Some("b2")),
                ],
            ),
            quote(
                "q2",
                "bolt",
                "Bolt",
                &[("c1", "Trusses", 950, Some("b1")), ("c2", "Hardware", 180, Some("b3"))],
            ),
        ];
        (budget, quotes)
    }

    #[test]
    fn line_decision_sums_split_items() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");

        let outcome = manager
            .update_line_decision("b2", "acme", &budget, &quotes, &lookup)
            .unwrap();

        let LineDecisionOutcome::Recorded(award) = outcome else {
            panic!("expected a recorded award");
        };
        assert_eq!(award.final_price, BigDecimal::from(450));
        assert_eq!(award.quote_line_item_id, "a2");
        assert_eq!(award.quote_line_item_ids, vec!["a2".to_string(), "a3".to_string()]);
    }

    #[test]
    fn line_decision_overwrites_previous_vendor() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");

        manager.update_line_decision("b1", "acme", &budget, &quotes, &lookup).unwrap();
        manager.update_line_decision("b1", "bolt", &budget, &quotes, &lookup).unwrap();

        assert_eq!(manager.line_awards().count(), 1);
        assert_eq!(manager.line_award("b1").unwrap().vendor_id, "bolt");
    }

    #[test]
    fn uncovered_line_is_a_stale_noop() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");
        manager.update_line_decision("b3", "bolt", &budget, &quotes, &lookup).unwrap();

        let outcome = manager
            .update_line_decision("b3", "acme", &budget, &quotes, &lookup)
            .unwrap();

        assert_eq!(outcome, LineDecisionOutcome::Stale);
        assert_eq!(manager.line_award("b3").unwrap().vendor_id, "bolt");
    }

    #[test]
    fn unknown_budget_line_is_rejected() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");

        let err = manager
            .update_line_decision("b9", "acme", &budget, &quotes, &lookup)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn select_all_leaves_uncovered_lines_alone() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");
        manager.update_line_decision("b3", "bolt", &budget, &quotes, &lookup).unwrap();

        let selected = manager.select_all_from_vendor("acme", &budget, &quotes, &lookup);

        assert_eq!(selected, 2);
        assert_eq!(manager.primary_vendor_id(), Some("acme"));
        assert_eq!(manager.line_award("b1").unwrap().vendor_id, "acme");
        assert_eq!(manager.line_award("b2").unwrap().vendor_id, "acme");
        assert_eq!(manager.line_award("b3").unwrap().vendor_id, "bolt");
    }

    #[test]
    fn select_all_from_unknown_vendor_changes_nothing() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");

        assert_eq!(manager.select_all_from_vendor("ghost", &budget, &quotes, &lookup), 0);
        assert!(manager.primary_vendor_id().is_none());
        assert_eq!(manager.line_awards().count(), 0);
    }

    #[test]
    fn empty_decision_is_rejected() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");

        let err = manager
            .save_decision(&budget, &quotes, &lookup, BudgetBasis::AllLines, saved_at())
            .unwrap_err();
        assert!(err.is_validation());
        assert!(manager.latest_decision().is_none());
        assert_eq!(manager.status(), DivisionStatus::NoQuotes);
    }

    #[test]
    fn single_award_total_equals_its_price() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");
        manager.update_line_decision("b1", "acme", &budget, &quotes, &lookup).unwrap();

        let saved = manager
            .save_decision(&budget, &quotes, &lookup, BudgetBasis::AllLines, saved_at())
            .unwrap();

        assert_eq!(saved.total_award, BigDecimal::from(900));
        assert_eq!(saved.budget_total, BigDecimal::from(1_700));
        assert_eq!(saved.total_delta, BigDecimal::from(-800));
    }

    #[test]
    fn budget_basis_changes_reconciliation() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");
        manager.update_line_decision("b1", "acme", &budget, &quotes, &lookup).unwrap();

        let all = manager
            .prepare_decision(&budget, &quotes, &lookup, BudgetBasis::AllLines, saved_at())
            .unwrap();
        let awarded = manager
            .prepare_decision(&budget, &quotes, &lookup, BudgetBasis::AwardedLines, saved_at())
            .unwrap();

        assert_eq!(all.budget_total, BigDecimal::from(1_700));
        assert_eq!(awarded.budget_total, BigDecimal::from(1_000));
        assert_eq!(awarded.total_delta, BigDecimal::from(-100));
        assert!((awarded.delta_percent - (-10.0)).abs() < 1e-9);
        assert!(all.delta_percent < awarded.delta_percent);
    }

    #[test]
    fn saves_advance_status_and_supersede() {
        let (budget, quotes) = fixture();
        let lookup = QuoteMappings::from_quotes(&quotes, &budget);
        let mut manager = AwardManager::new("d1");
        manager.mark_quotes_uploaded();
        manager.select_all_from_vendor("bolt", &budget, &quotes, &lookup);

        assert!(manager.work_order_request().unwrap_err().is_validation());
        assert_eq!(manager.save_decision(&budget, &quotes, &lookup, BudgetBasis::AllLines, saved_at()).unwrap().revision, 1);
        assert_eq!(manager.status(), DivisionStatus::WinnerSelected);
        assert!(manager.is_locked());

        manager.update_line_decision("b2", "acme", &budget, &quotes, &lookup).unwrap();
        let second = manager
            .save_decision(&budget, &quotes, &lookup, BudgetBasis::AllLines, saved_at())
            .unwrap();
        assert_eq!(second.revision, 2);
        assert_eq!(second.line_awards.len(), 3);

        // 不会回退
        assert_eq!(manager.mark_quotes_uploaded(), DivisionStatus::WinnerSelected);

        let order = manager.work_order_request().unwrap();
        assert_eq!(order.decision_revision, 2);
        assert_eq!(order.primary_vendor_id.as_deref(), Some("bolt"));
    }

    #[test]
    fn save_reprices_against_current_mappings() {
        let (budget, quotes) = fixture();
        let mut store = MappingStore::seeded(&budget, &quotes);
        let mut manager = AwardManager::new("d1");
        assert_eq!(manager.select_all_from_vendor("acme", &budget, &quotes, &store), 2);

        // 选定后 a1 被改映射到 b2
        store.create_mapping("b2", "a1").unwrap();

        let decision = manager
            .prepare_decision(&budget, &quotes, &store, BudgetBasis::AllLines, saved_at())
            .unwrap();
        assert_eq!(decision.line_awards.len(), 1);
        let sheathing = &decision.line_awards[0];
        assert_eq!(sheathing.budget_line_id, "b2");
        assert_eq!(sheathing.quote_line_item_ids, vec!["a1".to_string(), "a2".to_string(), "a3".to_string()]);
        assert_eq!(sheathing.final_price, BigDecimal::from(1_350));
        assert_eq!(decision.total_award, BigDecimal::from(1_350));

        // prepare 不改草稿, commit 采纳快照
        assert!(manager.line_award("b1").is_some());
        manager.commit(decision);
        assert!(manager.line_award("b1").is_none());
        assert_eq!(manager.line_award("b2").unwrap().final_price, BigDecimal::from(1_350));
    }

    #[test]
    fn save_with_only_stale_awards_is_rejected() {
        let (budget, quotes) = fixture();
        let mut store = MappingStore::seeded(&budget, &quotes);
        let mut manager = AwardManager::new("d1");
        manager.update_line_decision("b3", "bolt", &budget, &quotes, &store).unwrap();

        store.remove_mapping("c2");

        let err = manager
            .prepare_decision(&budget, &quotes, &store, BudgetBasis::AllLines, saved_at())
            .unwrap_err();
        assert!(err.is_validation());
        assert!(manager.latest_decision().is_none());
    }
}
