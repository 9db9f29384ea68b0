use crate::api::routes::auth::auth_routes;
use crate::api::routes::task::tasks_routes;
use crate::store::core::StoreContext;
use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::middleware::{Compress, NormalizePath, TrailingSlash};
use actix_web::{middleware, web::Data, App, HttpServer};
use actix_web::{web, HttpResponse};
use anyhow::Error;
use log::info;
use shared::models::api::{ErrorResponse, HealthResponse};
use shared::security::bearer_auth_middleware::BearerAuthMiddleware;
use std::sync::Arc;

pub const DEFAULT_PAYLOAD_LIMIT: usize = 2_097_152;

pub struct AppState {
    pub store_context: Arc<StoreContext>,
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "OK".to_string(),
        message: "Task Manager API is running".to_string(),
    })
}

/// Rejects undecodable JSON bodies with the same `{"error": ...}` shape the
/// handlers use.
fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let response = ErrorResponse::new(err.to_string()).with_status(StatusCode::BAD_REQUEST);
            InternalError::from_response(err, response).into()
        })
}

/// Registers state, routes and the fallback handler. Shared by the server and
/// the integration tests.
pub fn configure_app(
    cfg: &mut web::ServiceConfig,
    app_state: Data<AppState>,
    payload_limit: usize,
) {
    let auth = Arc::new(BearerAuthMiddleware::new(
        app_state.store_context.user_store.clone(),
    ));

    cfg.app_data(app_state)
        .app_data(json_config(payload_limit))
        .app_data(web::PayloadConfig::default().limit(payload_limit))
        .route("/api/health", web::get().to(health_check))
        .service(auth_routes(auth.clone()))
        .service(tasks_routes().wrap(auth))
        .default_service(web::route().to(|| async {
            ErrorResponse::new("Resource not found").with_status(StatusCode::NOT_FOUND)
        }));
}

pub async fn start_server(
    host: &str,
    port: u16,
    store_context: Arc<StoreContext>,
    payload_limit: usize,
) -> Result<(), Error> {
    info!("Starting server at http://{}:{}", host, port);
    let app_state = Data::new(AppState { store_context });

    HttpServer::new(move || {
        let app_state = app_state.clone();
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(Compress::default())
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .configure(|cfg| configure_app(cfg, app_state, payload_limit))
    })
    .bind((host, port))?
    .run()
    .await?;
    Ok(())
}
