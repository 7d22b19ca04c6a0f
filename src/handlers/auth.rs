use crate::models::all_models::{AuthenticatedUser, UserRole};
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use dotenvy::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::fmt;

/// Structure representing JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: i32,        // User ID
    pub role: UserRole, // Role at login time
    pub exp: usize,     // Expiration timestamp
}

/// Why a token failed validation
#[derive(Debug, PartialEq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Generates a JWT token for a given user
pub fn generate_jwt(user_id: i32, role: UserRole) -> Result<String, jsonwebtoken::errors::Error> {
    dotenv().ok();
    let secret_key = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let expiration = Utc::now() + Duration::hours(1);
    let claims = Claims {
        id: user_id,
        role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret_key.as_ref()),
    )
}

/// Validates a JWT token and extracts the claims
pub fn validate_jwt(token: &str) -> Result<Claims, TokenError> {
    dotenv().ok();

    let secret_key = match env::var("JWT_SECRET") {
        Ok(secret) => secret,
        Err(e) => {
            log::error!("Failed to retrieve JWT_SECRET: {}", e);
            return Err(TokenError::Invalid);
        }
    };

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_key.as_ref()),
        &Validation::new(jsonwebtoken::Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    Ok(token_data.claims)
}

/// Checks that the request carries an authenticated admin.
/// The role comes from the user row the middleware resolved, not the raw claim.
pub async fn ensure_admin(req: &HttpRequest) -> Result<(), HttpResponse> {
    if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
        if user.role == UserRole::Admin {
            Ok(())
        } else {
            Err(HttpResponse::Forbidden().json(json!({"message": "Access Forbidden: Admins only"})))
        }
    } else {
        Err(HttpResponse::Unauthorized().json(json!({"message": "Authentication required"})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn set_test_secret() {
        env::set_var("JWT_SECRET", "job-portal-test-secret");
    }

    #[test]
    fn generated_token_round_trips() {
        set_test_secret();
        let token = generate_jwt(42, UserRole::Manager).unwrap();
        let claims = validate_jwt(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.role, UserRole::Manager);
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        set_test_secret();
        let claims = Claims {
            id: 1,
            role: UserRole::User,
            exp: (Utc::now() - Duration::minutes(5)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("job-portal-test-secret".as_ref()),
        )
        .unwrap();
        assert!(matches!(validate_jwt(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn tampered_token_is_rejected_as_invalid() {
        set_test_secret();
        let mut token = generate_jwt(7, UserRole::User).unwrap();
        token.push('x');
        assert!(matches!(validate_jwt(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_token_is_rejected_as_invalid() {
        set_test_secret();
        assert!(matches!(validate_jwt("not-a-jwt"), Err(TokenError::Invalid)));
    }

    #[actix_web::test]
    async fn ensure_admin_accepts_admin_user() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthenticatedUser {
            id: 1,
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
        });
        assert!(ensure_admin(&req).await.is_ok());
    }

    #[actix_web::test]
    async fn ensure_admin_forbids_non_admin() {
        for role in [UserRole::User, UserRole::Manager] {
            let req = TestRequest::default().to_http_request();
            req.extensions_mut().insert(AuthenticatedUser {
                id: 2,
                name: "User".to_string(),
                email: "user@example.com".to_string(),
                role,
            });
            let response = ensure_admin(&req).await.unwrap_err();
            assert_eq!(response.status(), actix_web::http::StatusCode::FORBIDDEN);
        }
    }

    #[actix_web::test]
    async fn ensure_admin_requires_authentication() {
        let req = TestRequest::default().to_http_request();
        let response = ensure_admin(&req).await.unwrap_err();
        assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }
}
