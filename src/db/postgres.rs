use sqlx::PgPool;
use std::collections::HashMap;

use crate::db::{queries, DivisionRepository};
use crate::error::AppResult;
use crate::models::{DivisionInputs, QuoteLineItem, SavedDecision};

/// 基于 PostgreSQL 的仓储
#[derive(Debug, Clone)]
pub struct PgDivisionRepository {
    pool: PgPool,
}

impl PgDivisionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DivisionRepository for PgDivisionRepository {
    async fn load_division(&self, division_id: &str) -> AppResult<Option<DivisionInputs>> {
        let (exists, budget_lines, quote_rows) = futures::try_join!(
            queries::division_exists(&self.pool, division_id),
            queries::list_budget_lines(&self.pool, division_id),
            queries::list_quotes(&self.pool, division_id),
        )?;

        if !exists {
            return Ok(None);
        }

        let quote_ids: Vec<String> = quote_rows.iter().map(|q| q.id.clone()).collect();
        let item_rows = queries::list_quote_items(&self.pool, &quote_ids).await?;

        let mut items_by_quote: HashMap<String, Vec<QuoteLineItem>> = HashMap::new();
        for row in item_rows {
            items_by_quote
                .entry(row.quote_id.clone())
                .or_default()
                .push(row.into());
        }

        let quotes = quote_rows
            .into_iter()
            .map(|row| {
                let items = items_by_quote.remove(&row.id).unwrap_or_default();
                row.into_quote(items)
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "Loaded division {}: {} budget lines, {} quotes, {} quote items",
            division_id,
            budget_lines.len(),
            quotes.len(),
            quotes.iter().map(|q| q.line_items.len()).sum::<usize>()
        );

        Ok(Some(DivisionInputs {
            division_id: division_id.to_string(),
            budget_lines,
            quotes,
        }))
    }

    async fn save_decision(&self, decision: &SavedDecision) -> AppResult<()> {
        queries::save_decision(&self.pool, decision).await?;
        Ok(())
    }
}
