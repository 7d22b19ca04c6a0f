use crate::handlers::auth::{validate_jwt, TokenError};
use crate::models::all_models::AuthenticatedUser;
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    web, Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ok, Ready};
use serde_json::json;
use sqlx::PgPool;
use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

/// Middleware for bearer-token authentication
pub struct AuthMiddleware;

// Rejections carry the same {"message"} body shape as the handlers
fn unauthorized(message: &'static str) -> Error {
    InternalError::from_response(
        message,
        HttpResponse::Unauthorized().json(json!({"message": message})),
    )
    .into()
}

fn server_error(message: &'static str) -> Error {
    InternalError::from_response(
        message,
        HttpResponse::InternalServerError().json(json!({"message": message})),
    )
    .into()
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareMiddleware<S> {
    pub service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            // Pull the bearer token off the Authorization header
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(|token| token.to_owned());

            let token = match token {
                Some(token) => token,
                None => {
                    return Err(unauthorized("Access Denied. No token provided."));
                }
            };

            let claims = match validate_jwt(&token) {
                Ok(claims) => claims,
                Err(TokenError::Expired) => {
                    return Err(unauthorized("Token has expired"));
                }
                Err(TokenError::Invalid) => {
                    return Err(unauthorized("Invalid token"));
                }
            };

            let pool = match req.app_data::<web::Data<PgPool>>() {
                Some(pool) => pool.clone(),
                None => {
                    log::error!("Database pool missing from app data");
                    return Err(server_error("Server configuration error"));
                }
            };

            // The token only proves identity at login time; resolve the current row
            let user = match sqlx::query_as::<_, AuthenticatedUser>(
                "SELECT id, name, email, role FROM users WHERE id = $1",
            )
            .bind(claims.id)
            .fetch_optional(pool.get_ref())
            .await
            {
                Ok(Some(user)) => user,
                Ok(None) => {
                    return Err(unauthorized("Invalid token"));
                }
                Err(e) => {
                    log::error!("Failed to load user {} during auth: {}", claims.id, e);
                    return Err(server_error("Failed to authenticate request"));
                }
            };

            req.extensions_mut().insert(claims);
            req.extensions_mut().insert(user);

            service.call(req).await
        })
    }
}
