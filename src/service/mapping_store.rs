use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};

use crate::error::{AppError, AppResult};
use crate::models::{
    BudgetLine, CoverageTag, Mapping, VendorQuote, DEFAULT_MAPPING_CONFIDENCE,
};
use crate::service::coverage::MappingLookup;

/// 启发式映射的最低描述相似度
pub const SUGGESTION_THRESHOLD: f64 = 0.3;

/// 单个分部的预算行 <-> 报价明细映射
///
/// 一条报价明细至多映射一个预算行; 一个预算行可被
/// 任意多条明细映射. 遍历保持插入顺序 (IndexMap).
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    budget_line_ids: IndexSet<String>,
    quote_line_ids: IndexSet<String>,
    /// 报价明细 id -> 映射
    mappings: IndexMap<String, Mapping>,
    /// 倒排索引: 预算行 id -> 报价明细 id
    budget_line_index: HashMap<String, IndexSet<String>>,
    version: u64,
}

impl MappingStore {
    pub fn new(budget_lines: &[BudgetLine], quotes: &[VendorQuote]) -> Self {
        Self {
            budget_line_ids: budget_lines.iter().map(|b| b.id.clone()).collect(),
            quote_line_ids: quotes
                .iter()
                .flat_map(|q| q.line_items.iter().map(|i| i.id.clone()))
                .collect(),
            ..Self::default()
        }
    }

    /// 用上游 `mapped_budget_line_ids` 提示初始化
    pub fn seeded(budget_lines: &[BudgetLine], quotes: &[VendorQuote]) -> Self {
        let mut store = Self::new(budget_lines, quotes);
        store.seed_from_quotes(quotes);
        store
    }

    /// 导入上游提示为未确认映射; 取第一个存在的预算行
    pub fn seed_from_quotes(&mut self, quotes: &[VendorQuote]) -> usize {
        let mut seeded = 0;
        for item in quotes.iter().flat_map(|q| q.line_items.iter()) {
            let target = item
                .mapped_budget_line_ids
                .iter()
                .find(|id| self.budget_line_ids.contains(id.as_str()));

            match target {
                Some(budget_line_id) => {
                    self.insert(Mapping {
                        budget_line_id: budget_line_id.clone(),
                        quote_line_item_id: item.id.clone(),
                        confidence: DEFAULT_MAPPING_CONFIDENCE,
                        user_confirmed: false,
                    });
                    seeded += 1;
                }
                None if !item.mapped_budget_line_ids.is_empty() => {
                    tracing::warn!(
                        "Quote line {} references unknown budget lines {:?}, skipping",
                        item.id, item.mapped_budget_line_ids
                    );
                }
                None => {}
            }
        }
        seeded
    }

    /// 建立映射, 覆盖该明细原有映射
    pub fn create_mapping(&mut self, budget_line_id: &str, quote_line_item_id: &str) -> AppResult<Mapping> {
        if !self.budget_line_ids.contains(budget_line_id) {
            return Err(AppError::validation(format!("Budget line {} does not exist", budget_line_id)));
        }
        if !self.quote_line_ids.contains(quote_line_item_id) {
            return Err(AppError::validation(format!("Quote line item {} does not exist", quote_line_item_id)));
        }

        self.detach(quote_line_item_id);
        let mapping = Mapping {
            budget_line_id: budget_line_id.to_string(),
            quote_line_item_id: quote_line_item_id.to_string(),
            confidence: DEFAULT_MAPPING_CONFIDENCE,
            user_confirmed: true,
        };
        self.insert(mapping.clone());

        tracing::debug!("Mapped quote line {} -> budget line {}", quote_line_item_id, budget_line_id);
        Ok(mapping)
    }

    pub fn remove_mapping(&mut self, quote_line_item_id: &str) -> Option<Mapping> {
        let removed = self.detach(quote_line_item_id);
        if removed.is_some() {
            self.version += 1;
        }
        removed
    }

    pub fn get_mapped_budget_line(&self, quote_line_item_id: &str) -> Option<&Mapping> {
        self.mappings.get(quote_line_item_id)
    }

    pub fn get_mapped_quote_lines(&self, budget_line_id: &str) -> Vec<&Mapping> {
        self.budget_line_index
            .get(budget_line_id)
            .map(|ids| ids.iter().filter_map(|id| self.mappings.get(id)).collect())
            .unwrap_or_default()
    }

    /// 按描述相似度为未映射明细生成未确认映射
    pub fn suggest_mappings(&mut self, budget_lines: &[BudgetLine], quotes: &[VendorQuote]) -> Vec<Mapping> {
        let budget_words: Vec<(&BudgetLine, HashSet<String>)> = budget_lines
            .iter()
            .filter(|b| self.budget_line_ids.contains(b.id.as_str()))
            .map(|b| (b, description_words(&b.description)))
            .collect();

        let mut suggested = Vec::new();
        for item in quotes.iter().flat_map(|q| q.line_items.iter()) {
            if self.mappings.contains_key(&item.id) || !self.quote_line_ids.contains(item.id.as_str()) {
                continue;
            }

            let item_words = description_words(&item.description);
            let mut best: Option<(&BudgetLine, f64)> = None;
            for (line, words) in &budget_words {
                let score = jaccard(&item_words, words);
                let is_better = match best {
                    None => true,
                    Some((_, best_score)) => score > best_score,
                };
                if is_better {
                    best = Some((line, score));
                }
            }

            if let Some((line, score)) = best {
                if score >= SUGGESTION_THRESHOLD {
                    let mapping = Mapping {
                        budget_line_id: line.id.clone(),
                        quote_line_item_id: item.id.clone(),
                        confidence: score,
                        user_confirmed: false,
                    };
                    self.insert(mapping.clone());
                    suggested.push(mapping);
                }
            }
        }

        tracing::info!("Suggested {} mappings", suggested.len());
        suggested
    }

    /// 将映射投影到报价: 映射 id 与覆盖标签以 store 为准
    pub fn project_onto(&self, quotes: &[VendorQuote]) -> Vec<VendorQuote> {
        quotes
            .iter()
            .map(|quote| {
                let mut quote = quote.clone();
                for item in quote.line_items.iter_mut() {
                    match self.mappings.get(&item.id) {
                        Some(m) => {
                            item.mapped_budget_line_ids = vec![m.budget_line_id.clone()];
                            item.coverage = CoverageTag::Required;
                        }
                        None => {
                            item.mapped_budget_line_ids.clear();
                            item.coverage = CoverageTag::Extra;
                        }
                    }
                }
                quote
            })
            .collect()
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.values()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// 每次修改递增
    pub fn version(&self) -> u64 {
        self.version
    }

    fn insert(&mut self, mapping: Mapping) {
        self.detach(&mapping.quote_line_item_id);
        self.budget_line_index
            .entry(mapping.budget_line_id.clone())
            .or_default()
            .insert(mapping.quote_line_item_id.clone());
        self.mappings.insert(mapping.quote_line_item_id.clone(), mapping);
        self.version += 1;
    }

    fn detach(&mut self, quote_line_item_id: &str) -> Option<Mapping> {
        let removed = self.mappings.shift_remove(quote_line_item_id)?;
        if let Some(ids) = self.budget_line_index.get_mut(&removed.budget_line_id) {
            ids.shift_remove(quote_line_item_id);
            if ids.is_empty() {
                self.budget_line_index.remove(&removed.budget_line_id);
            }
        }
        Some(removed)
    }
}

impl MappingLookup for MappingStore {
    fn mapped_budget_line(&self, quote_line_item_id: &str) -> Option<&str> {
        self.mappings
            .get(quote_line_item_id)
            .map(|m| m.budget_line_id.as_str())
    }
}

fn description_words(description: &str) -> HashSet<String> {
    description
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}
