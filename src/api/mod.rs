pub mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::db::DivisionRepository;
use crate::service::ProcurementService;

pub use handlers::*;

/// 所有路由共享同一个服务实例
pub fn router<R: DivisionRepository>(service: Arc<ProcurementService<R>>) -> Router {
    let division_routes = Router::new()
        .route("/api/divisions/:division_id", put(ingest_division::<R>).get(division_summary::<R>))
        .route("/api/divisions/:division_id/load", post(load_division::<R>))
        .route(
            "/api/divisions/:division_id/mappings",
            get(list_mappings::<R>).post(create_mapping::<R>),
        )
        .route("/api/divisions/:division_id/mappings/suggest", post(suggest_mappings::<R>))
        .route(
            "/api/divisions/:division_id/mappings/:quote_line_item_id",
            get(mapped_budget_line::<R>).delete(remove_mapping::<R>),
        )
        .route("/api/divisions/:division_id/coverage", get(coverage::<R>))
        .route("/api/divisions/:division_id/analysis", post(analyze::<R>))
        .route(
            "/api/divisions/:division_id/decision/lines/:budget_line_id",
            put(update_line_decision::<R>).delete(clear_line_decision::<R>),
        )
        .route("/api/divisions/:division_id/decision/select-all", post(select_all_from_vendor::<R>))
        .route("/api/divisions/:division_id/decision/save", post(save_decision::<R>))
        .route("/api/divisions/:division_id/work-order", get(work_order::<R>))
        .route("/api/divisions/:division_id/work-order.csv", get(work_order_csv::<R>))
        .with_state(service);

    Router::new()
        .route("/health", get(health_check))
        .merge(division_routes)
}
