use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use dex_router::cache::RouteCache;
use dex_router::orchestrator::get_route_quote;
use dex_router::types::{QuoteRequest, QuoteResponse, ResponseSwap, RouterConfig};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct RouterState {
    config: Arc<RouterConfig>,
    cache: Arc<RouteCache>,
}

#[derive(OpenApi)]
#[openapi(
    paths(get_route),
    components(schemas(QuoteRequest, QuoteResponse, ResponseSwap)),
    tags(
        (name = "route", description = "Best swap route for a token pair")
    )
)]
struct ApiDoc;

#[utoipa::path(
    get,
    path = "/route",
    params(QuoteRequest),
    responses(
        (status = 200, description = "Route quote", body = QuoteResponse),
        (status = 400, description = "No route or invalid request", body = String)
    ),
    tag = "route"
)]
async fn get_route(
    State(state): State<RouterState>,
    Query(params): Query<QuoteRequest>,
) -> Result<Json<QuoteResponse>, (StatusCode, String)> {
    // Route search is CPU bound
    let result = tokio::task::spawn_blocking(move || {
        get_route_quote(state.config.as_ref(), state.cache.as_ref(), params)
    })
    .await;

    match result {
        Ok(Ok(response)) => Ok(Json(response)),
        Ok(Err(e)) => {
            info!(error = %format!("{:#}", e), "route request rejected");
            Err((StatusCode::BAD_REQUEST, format!("{:#}", e)))
        }
        Err(e) => {
            error!(error = %e, "route task failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()))
        }
    }
}

fn tracing_subscriber_init() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber_init();

    let openapi = ApiDoc::openapi();
    let config_path = PathBuf::from("router_config.toml");
    let config = RouterConfig::load_from(config_path)?;
    let listen_addr = config.listen_addr.clone();
    let cache = RouteCache::new(config.cache.capacity)?;

    let state = RouterState {
        config: Arc::new(config),
        cache: Arc::new(cache),
    };
    let app = Router::new()
        .route("/route", get(get_route))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Server running on http://{}", listen_addr);
    info!("Swagger UI available at http://{}/swagger-ui/", listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
