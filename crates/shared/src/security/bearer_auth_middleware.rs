use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header::AUTHORIZATION, StatusCode},
    Error, HttpMessage,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use log::warn;

use crate::models::api::ErrorResponse;

pub const MISSING_TOKEN: &str = "Access denied. No token provided.";
pub const INVALID_TOKEN: &str = "Invalid token";

/// Maps an opaque bearer token to the id of the user it was issued to.
pub trait TokenResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Option<String>;
}

/// Identity of the caller, placed in the request extensions once the bearer
/// token has been resolved. Handlers read it with `web::ReqData`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

pub struct BearerAuthMiddleware {
    resolver: Arc<dyn TokenResolver>,
}

impl BearerAuthMiddleware {
    pub fn new(resolver: Arc<dyn TokenResolver>) -> Self {
        Self { resolver }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = BearerAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddlewareService {
            service,
            resolver: self.resolver.clone(),
        }))
    }
}

pub struct BearerAuthMiddlewareService<S> {
    service: S,
    resolver: Arc<dyn TokenResolver>,
}

/// Pulls the token out of an `Authorization: Bearer <token>` header. The
/// scheme is matched case-insensitively.
fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    let auth_str = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    if auth_str.len() <= 7 {
        return None;
    }
    let (scheme, token) = auth_str.split_at(7);
    if scheme.eq_ignore_ascii_case("Bearer ") {
        Some(token.trim())
    } else {
        None
    }
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let resolved = match bearer_token(&req) {
            Some(token) => self.resolver.resolve(token).ok_or(INVALID_TOKEN),
            None => Err(MISSING_TOKEN),
        };

        match resolved {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser { user_id });
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(message) => {
                warn!("Rejected {} {}: {}", req.method(), req.path(), message);
                let response = ErrorResponse::new(message)
                    .with_status(StatusCode::UNAUTHORIZED)
                    .map_into_right_body();
                let (request, _payload) = req.into_parts();
                Box::pin(async move { Ok(ServiceResponse::new(request, response)) })
            }
        }
    }
}
