use bigdecimal::BigDecimal;
use sqlx::{FromRow, PgConnection, PgPool};
use std::time::Duration;

use crate::models::{BudgetLine, CoverageTag, DivisionStatus, QuoteLineItem, SavedDecision, VendorQuote};

/// 决策保存事务的总超时
const SAVE_TIMEOUT: Duration = Duration::from_secs(30);

/// 供应商报价主表行
#[derive(Debug, Clone, FromRow)]
pub struct QuoteRow {
    pub id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub division_id: String,
    pub status: String,
    pub exclusions: Option<Vec<String>>,
    pub quote_level_total: Option<BigDecimal>,
}

/// 报价明细行; 最多携带一个上游映射提示
#[derive(Debug, Clone, FromRow)]
pub struct QuoteItemRow {
    pub id: String,
    pub quote_id: String,
    pub description: String,
    pub quantity: Option<BigDecimal>,
    pub unit: Option<String>,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub coverage: Option<String>,
    pub mapped_budget_line_id: Option<String>,
}

impl From<QuoteItemRow> for QuoteLineItem {
    fn from(row: QuoteItemRow) -> Self {
        let coverage = match row.coverage.as_deref() {
            Some("required") => CoverageTag::Required,
            Some("extra") => CoverageTag::Extra,
            _ => CoverageTag::Unknown,
        };
        Self {
            id: row.id,
            quote_id: row.quote_id,
            description: row.description,
            quantity: row.quantity,
            unit: row.unit,
            unit_price: row.unit_price,
            total_price: row.total_price,
            coverage,
            mapped_budget_line_ids: row.mapped_budget_line_id.into_iter().collect(),
        }
    }
}

impl QuoteRow {
    pub fn into_quote(self, line_items: Vec<QuoteLineItem>) -> VendorQuote {
        VendorQuote {
            id: self.id,
            vendor_id: self.vendor_id,
            vendor_name: self.vendor_name,
            division_id: self.division_id,
            status: self.status,
            exclusions: self.exclusions,
            quote_level_total: self.quote_level_total,
            line_items,
        }
    }
}

pub async fn division_exists(pool: &PgPool, division_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(SELECT 1 FROM bl_division WHERE id = $1)
        "#,
    )
    .bind(division_id)
    .fetch_one(pool)
    .await
}

/// 按预算顺序返回预算行
pub async fn list_budget_lines(pool: &PgPool, division_id: &str) -> Result<Vec<BudgetLine>, sqlx::Error> {
    sqlx::query_as::<_, BudgetLine>(
        r#"
        SELECT id, code, description, quantity, unit, total_cost
        FROM bl_budget_line
        WHERE division_id = $1
        ORDER BY sort_order, id
        "#,
    )
    .bind(division_id)
    .fetch_all(pool)
    .await
}

/// 仅返回已解析的报价, 跳过仍在处理中的
pub async fn list_quotes(pool: &PgPool, division_id: &str) -> Result<Vec<QuoteRow>, sqlx::Error> {
    sqlx::query_as::<_, QuoteRow>(
        r#"
        SELECT id, vendor_id, vendor_name, division_id, status, exclusions, quote_level_total
        FROM bl_vendor_quote
        WHERE division_id = $1
          AND status <> 'processing'
        ORDER BY created_at, id
        "#,
    )
    .bind(division_id)
    .fetch_all(pool)
    .await
}

pub async fn list_quote_items(pool: &PgPool, quote_ids: &[String]) -> Result<Vec<QuoteItemRow>, sqlx::Error> {
    sqlx::query_as::<_, QuoteItemRow>(
        r#"
        SELECT id, quote_id, description, quantity, unit, unit_price, total_price,
               coverage, mapped_budget_line_id
        FROM bl_quote_line_item
        WHERE quote_id = ANY($1)
        ORDER BY quote_id, sort_order, id
        "#,
    )
    .bind(quote_ids)
    .fetch_all(pool)
    .await
}

async fn insert_decision_header(conn: &mut PgConnection, decision: &SavedDecision) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO bl_decision (
            division_id, revision, primary_vendor_id, notes, budget_basis,
            total_award, budget_total, total_delta, delta_percent, saved_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&decision.division_id)
    .bind(decision.revision as i32)
    .bind(&decision.primary_vendor_id)
    .bind(&decision.notes)
    .bind(decision.budget_basis.as_str())
    .bind(decision.total_award.clone())
    .bind(decision.budget_total.clone())
    .bind(decision.total_delta.clone())
    .bind(decision.delta_percent)
    .bind(decision.saved_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_line_awards(conn: &mut PgConnection, decision: &SavedDecision) -> Result<(), sqlx::Error> {
    if decision.line_awards.is_empty() {
        return Ok(());
    }

    let mut query_builder = sqlx::QueryBuilder::new(
        "INSERT INTO bl_line_award (
            division_id, revision, budget_line_id, vendor_id, quote_id,
            quote_line_item_id, quote_line_item_ids, final_price
        ) ",
    );

    query_builder.push_values(&decision.line_awards, |mut b, award| {
        b.push_bind(&decision.division_id)
            .push_bind(decision.revision as i32)
            .push_bind(&award.budget_line_id)
            .push_bind(&award.vendor_id)
            .push_bind(&award.quote_id)
            .push_bind(&award.quote_line_item_id)
            .push_bind(award.quote_line_item_ids.clone())
            .push_bind(award.final_price.clone());
    });

    let result = query_builder.build().execute(conn).await?;
    tracing::debug!("Inserted {} line awards", result.rows_affected());
    Ok(())
}

async fn upsert_division_status(
    conn: &mut PgConnection,
    division_id: &str,
    status: DivisionStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO bl_division (id, status) VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status
        "#,
    )
    .bind(division_id)
    .bind(status.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

/// 单事务保存决策; 失败时不写入任何数据
pub async fn save_decision(pool: &PgPool, decision: &SavedDecision) -> Result<(), sqlx::Error> {
    let start_time = std::time::Instant::now();

    let write = async {
        let mut tx = pool.begin().await?;
        insert_decision_header(&mut tx, decision).await?;
        insert_line_awards(&mut tx, decision).await?;
        upsert_division_status(&mut tx, &decision.division_id, DivisionStatus::WinnerSelected).await?;
        tx.commit().await
    };

    match tokio::time::timeout(SAVE_TIMEOUT, write).await {
        Ok(Ok(())) => {
            tracing::info!(
                "✓ Decision {} rev {} saved ({} line awards), took {:?}",
                decision.division_id,
                decision.revision,
                decision.line_awards.len(),
                start_time.elapsed()
            );
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!("✗ Decision save failed after {:?}: {:?}", start_time.elapsed(), e);
            Err(e)
        }
        Err(_) => {
            // 事务被 drop 时自动回滚
            tracing::error!("✗ Decision save timed out (>{:?})", SAVE_TIMEOUT);
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}
