use std::sync::Arc;
use bid_leveling_rust::{api, create_pool, AppConfig, PgDivisionRepository, ProcurementService};
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    let service = Arc::new(
        ProcurementService::new(PgDivisionRepository::new(pool))
            .with_defaults(config.analysis.clone(), config.decision.budget_basis),
    );

    let app = api::router(service).layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  PUT    /api/divisions/:id                       - ingest division inputs");
    info!("  POST   /api/divisions/:id/load                  - load division from database");
    info!("  POST   /api/divisions/:id/mappings              - map quote line to budget line");
    info!("  POST   /api/divisions/:id/analysis              - competitive analysis");
    info!("  PUT    /api/divisions/:id/decision/lines/:line  - select vendor for a line");
    info!("  POST   /api/divisions/:id/decision/save         - save decision");
    info!("  GET    /api/divisions/:id/work-order.csv        - export work order");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
