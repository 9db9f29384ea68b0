use crate::api::server::AppState;
use crate::store::domains::user_store::UserStoreError;
use actix_web::{
    http::StatusCode,
    web::{self, get, post, Data, ReqData},
    HttpResponse, Scope,
};
use log::{info, warn};
use shared::models::api::ErrorResponse;
use shared::models::user::{AuthResponse, LoginRequest, RegisterRequest};
use shared::security::bearer_auth_middleware::{AuthenticatedUser, BearerAuthMiddleware};
use std::sync::Arc;

fn error_response(err: UserStoreError) -> HttpResponse {
    let status = match err {
        UserStoreError::MissingCredentials => StatusCode::BAD_REQUEST,
        UserStoreError::AlreadyExists => StatusCode::CONFLICT,
        UserStoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
    };
    ErrorResponse::new(err.to_string()).with_status(status)
}

async fn register(request: web::Json<RegisterRequest>, app_state: Data<AppState>) -> HttpResponse {
    let user_store = app_state.store_context.user_store.clone();
    match user_store.register(request.into_inner()) {
        Ok((user, token)) => {
            info!("Registered user {}", user.id);
            HttpResponse::Created().json(AuthResponse { token, user })
        }
        Err(err) => error_response(err),
    }
}

async fn login(request: web::Json<LoginRequest>, app_state: Data<AppState>) -> HttpResponse {
    let user_store = app_state.store_context.user_store.clone();
    match user_store.login(request.into_inner()) {
        Ok((user, token)) => HttpResponse::Ok().json(AuthResponse { token, user }),
        Err(err) => {
            warn!("Login failed: {}", err);
            error_response(err)
        }
    }
}

async fn me(user: ReqData<AuthenticatedUser>, app_state: Data<AppState>) -> HttpResponse {
    match app_state.store_context.user_store.get_user(&user.user_id) {
        Some(user) => HttpResponse::Ok().json(user),
        None => ErrorResponse::new("User not found").with_status(StatusCode::NOT_FOUND),
    }
}

pub(crate) fn auth_routes(auth: Arc<BearerAuthMiddleware>) -> Scope {
    web::scope("/api/auth")
        .route("/register", post().to(register))
        .route("/login", post().to(login))
        .service(web::resource("/me").route(get().to(me)).wrap(auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::helper::create_test_app_state;
    use actix_web::test;
    use actix_web::App;
    use serde_json::json;
    use shared::models::user::User;

    #[actix_web::test]
    async fn test_register_login_me() {
        let app_state = create_test_app_state();
        let auth = Arc::new(BearerAuthMiddleware::new(
            app_state.store_context.user_store.clone(),
        ));
        let app = test::init_service(
            App::new()
                .app_data(app_state.clone())
                .service(auth_routes(auth)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": "test@example.com",
                "password": "password123",
                "name": "Test User"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let registered: AuthResponse = test::read_body_json(resp).await;
        assert_eq!(registered.user.email, "test@example.com");
        assert_eq!(registered.user.name.as_deref(), Some("Test User"));

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "test@example.com", "password": "password123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let logged_in: AuthResponse = test::read_body_json(resp).await;
        assert_eq!(logged_in.user, registered.user);

        for token in [&registered.token, &logged_in.token] {
            let req = test::TestRequest::get()
                .uri("/api/auth/me")
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request();
            let me: User = test::call_and_read_body_json(&app, req).await;
            assert_eq!(me, registered.user);
        }
    }

    #[actix_web::test]
    async fn test_auth_errors() {
        let app_state = create_test_app_state();
        let auth = Arc::new(BearerAuthMiddleware::new(
            app_state.store_context.user_store.clone(),
        ));
        let app = test::init_service(
            App::new()
                .app_data(app_state.clone())
                .service(auth_routes(auth)),
        )
        .await;

        let cases = [
            ("/api/auth/register", json!({ "email": "a@x.io" }), StatusCode::BAD_REQUEST),
            ("/api/auth/register", json!({ "email": "a@x.io", "password": "pw" }), StatusCode::CREATED),
            ("/api/auth/register", json!({ "email": "a@x.io", "password": "pw" }), StatusCode::CONFLICT),
            ("/api/auth/login", json!({ "email": "a@x.io", "password": "nope" }), StatusCode::UNAUTHORIZED),
            ("/api/auth/login", json!({ "password": "pw" }), StatusCode::BAD_REQUEST),
        ];
        for (uri, payload, expected) in cases {
            let req = test::TestRequest::post()
                .uri(uri)
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "{uri}");
        }

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
