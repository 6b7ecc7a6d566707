use crate::db::DivisionRepository;
use crate::error::AppError;
use crate::models::{AnalysisPreferences, BudgetBasis, DivisionInputs, LineDecisionOutcome};
use crate::service::ProcurementService;
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 所有接口共用的响应结构
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(message: impl Into<String>, data: T) -> Response {
        let body = ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DivisionNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
        }
        let body = ApiResponse::<()> {
            success: false,
            message: format!("Error: {}", self),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

type Shared<R> = State<Arc<ProcurementService<R>>>;
type HandlerResult = Result<Response, AppError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMappingRequest {
    pub budget_line_id: String,
    pub quote_line_item_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingQuery {
    pub budget_line_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSelectionRequest {
    pub vendor_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDecisionRequest {
    pub notes: Option<String>,
    pub budget_basis: Option<BudgetBasis>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDecisionResponse {
    pub recorded: bool,
    pub award: Option<crate::models::LineAward>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn ingest_division<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
    Json(mut inputs): Json<DivisionInputs>,
) -> HandlerResult {
    inputs.division_id = division_id;
    let summary = service.ingest(inputs).await?;
    Ok(ApiResponse::ok(
        format!("Division {} ingested with {} quotes", summary.division_id, summary.quote_count),
        summary,
    ))
}

pub async fn load_division<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
) -> HandlerResult {
    let summary = service.load(&division_id).await?;
    Ok(ApiResponse::ok(format!("Division {} loaded", division_id), summary))
}

pub async fn division_summary<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
) -> HandlerResult {
    let summary = service.summary(&division_id).await?;
    Ok(ApiResponse::ok("OK", summary))
}

pub async fn create_mapping<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
    Json(req): Json<CreateMappingRequest>,
) -> HandlerResult {
    let mapping = service
        .create_mapping(&division_id, &req.budget_line_id, &req.quote_line_item_id)
        .await?;
    Ok(ApiResponse::ok("Mapping created", mapping))
}

pub async fn list_mappings<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
    Query(query): Query<MappingQuery>,
) -> HandlerResult {
    let mappings = service
        .mappings(&division_id, query.budget_line_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(format!("{} mappings", mappings.len()), mappings))
}

pub async fn mapped_budget_line<R: DivisionRepository>(
    State(service): Shared<R>,
    Path((division_id, quote_line_item_id)): Path<(String, String)>,
) -> HandlerResult {
    let mapping = service.mapped_budget_line(&division_id, &quote_line_item_id).await?;
    let message = if mapping.is_some() { "OK" } else { "Quote line is not mapped" };
    Ok(ApiResponse::ok(message, mapping))
}

pub async fn remove_mapping<R: DivisionRepository>(
    State(service): Shared<R>,
    Path((division_id, quote_line_item_id)): Path<(String, String)>,
) -> HandlerResult {
    let removed = service.remove_mapping(&division_id, &quote_line_item_id).await?;
    let message = if removed.is_some() {
        "Mapping removed"
    } else {
        "Quote line was not mapped"
    };
    Ok(ApiResponse::ok(message, removed))
}

pub async fn suggest_mappings<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
) -> HandlerResult {
    let suggested = service.suggest_mappings(&division_id).await?;
    Ok(ApiResponse::ok(format!("{} mappings suggested", suggested.len()), suggested))
}

pub async fn coverage<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
) -> HandlerResult {
    let matrix = service.coverage(&division_id).await?;
    Ok(ApiResponse::ok("OK", matrix))
}

/// 请求体可选; 缺省时使用配置中的默认偏好
pub async fn analyze<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
    preferences: Option<Json<AnalysisPreferences>>,
) -> HandlerResult {
    let analysis = service
        .analyze(&division_id, preferences.map(|Json(p)| p))
        .await?;
    Ok(ApiResponse::ok(
        format!(
            "{} quotes analyzed, {} recommendations",
            analysis.quote_count,
            analysis.recommendations.len()
        ),
        analysis,
    ))
}

pub async fn update_line_decision<R: DivisionRepository>(
    State(service): Shared<R>,
    Path((division_id, budget_line_id)): Path<(String, String)>,
    Json(req): Json<VendorSelectionRequest>,
) -> HandlerResult {
    let outcome = service
        .update_line_decision(&division_id, &budget_line_id, &req.vendor_id)
        .await?;
    let (message, response) = match outcome {
        LineDecisionOutcome::Recorded(award) => (
            "Line decision recorded",
            LineDecisionResponse { recorded: true, award: Some(award) },
        ),
        LineDecisionOutcome::Stale => (
            "Vendor no longer covers this line; nothing changed",
            LineDecisionResponse { recorded: false, award: None },
        ),
    };
    Ok(ApiResponse::ok(message, response))
}

pub async fn clear_line_decision<R: DivisionRepository>(
    State(service): Shared<R>,
    Path((division_id, budget_line_id)): Path<(String, String)>,
) -> HandlerResult {
    let removed = service.clear_line_decision(&division_id, &budget_line_id).await?;
    Ok(ApiResponse::ok("Line decision cleared", removed))
}

pub async fn select_all_from_vendor<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
    Json(req): Json<VendorSelectionRequest>,
) -> HandlerResult {
    let selected = service.select_all_from_vendor(&division_id, &req.vendor_id).await?;
    Ok(ApiResponse::ok(
        format!("Selected {} budget lines from vendor {}", selected, req.vendor_id),
        selected,
    ))
}

pub async fn save_decision<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
    req: Option<Json<SaveDecisionRequest>>,
) -> HandlerResult {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let decision = service
        .save_decision(&division_id, req.notes, req.budget_basis)
        .await?;
    Ok(ApiResponse::ok(
        format!(
            "Decision revision {} saved: {} line awards, total {}",
            decision.revision,
            decision.line_awards.len(),
            decision.total_award
        ),
        decision,
    ))
}

pub async fn work_order<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
) -> HandlerResult {
    let request = service.work_order(&division_id).await?;
    Ok(ApiResponse::ok("OK", request))
}

pub async fn work_order_csv<R: DivisionRepository>(
    State(service): Shared<R>,
    Path(division_id): Path<String>,
) -> HandlerResult {
    let csv = service.work_order_csv(&division_id).await?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response())
}
