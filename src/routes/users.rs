use crate::handlers::auth::{ensure_admin, generate_jwt, Claims};
use crate::handlers::password::{hash_password, verify_password};
use crate::middleware::auth_middleware::AuthMiddleware;
use crate::models::all_models::{AuthenticatedUser, UserRole};
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;

//Register Request
#[derive(Deserialize, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
}

//Register
//Register Input: RegisterRequest
//Register Output: Confirmation message
pub async fn register(
    pool: web::Data<PgPool>,
    payload: web::Json<RegisterRequest>,
) -> impl Responder {
    let existing =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&payload.email)
            .fetch_one(pool.get_ref())
            .await;

    match existing {
        Ok(true) => {
            return HttpResponse::BadRequest().json(json!({"message": "User already exists"}));
        }
        Ok(false) => {}
        Err(e) => {
            log::error!("Error checking for existing user: {}", e);
            return HttpResponse::InternalServerError()
                .json(json!({"message": "Error registering user"}));
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(json!({"message": "Failed to hash password"}));
        }
    };

    let role = payload.role.unwrap_or(UserRole::User);

    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4)",
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(password_hash)
    .bind(role)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => HttpResponse::Created().json(json!({"message": "User registered successfully"})),
        Err(e) => {
            // A concurrent registration can still hit the unique index
            if e.as_database_error()
                .map(|db_err| db_err.is_unique_violation())
                .unwrap_or(false)
            {
                return HttpResponse::BadRequest().json(json!({"message": "User already exists"}));
            }
            log::error!("Error registering user: {}", e);
            HttpResponse::InternalServerError().json(json!({"message": "Error registering user"}))
        }
    }
}

//Login Request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

//User Auth
#[derive(sqlx::FromRow)]
struct UserAuth {
    pub id: i32,
    pub password_hash: String,
    pub role: UserRole,
}

//Login Response
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: UserRole,
    pub user_id: i32,
}

//Login
//Login Input: LoginRequest
//Login Output: LoginResponse
pub async fn login(pool: web::Data<PgPool>, payload: web::Json<LoginRequest>) -> impl Responder {
    let user = sqlx::query_as::<_, UserAuth>(
        "SELECT id, password_hash, role FROM users WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(pool.get_ref())
    .await;

    match user {
        Ok(Some(user)) => {
            let verified = match verify_password(&payload.password, &user.password_hash) {
                Ok(r) => r,
                Err(_) => {
                    return HttpResponse::InternalServerError()
                        .json(json!({"message": "Error verifying password"}));
                }
            };

            if verified {
                match generate_jwt(user.id, user.role) {
                    Ok(token) => HttpResponse::Ok().json(LoginResponse {
                        token,
                        role: user.role,
                        user_id: user.id,
                    }),
                    Err(e) => {
                        log::error!("Error generating token: {}", e);
                        HttpResponse::InternalServerError()
                            .json(json!({"message": "Error logging in"}))
                    }
                }
            } else {
                HttpResponse::Unauthorized().json(json!({"message": "Invalid credentials"}))
            }
        }
        Ok(None) => HttpResponse::Unauthorized().json(json!({"message": "Invalid credentials"})),
        Err(e) => {
            log::error!("Error retrieving user during login: {}", e);
            HttpResponse::InternalServerError().json(json!({"message": "Error logging in"}))
        }
    }
}

//User Profile
#[derive(Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub skills: Option<Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

//Get Profile
//Get Profile Input: HttpRequest(JWT Token)
//Get Profile Output: UserProfile
pub async fn get_profile(pool: web::Data<PgPool>, req: HttpRequest) -> impl Responder {
    let user_id = match req.extensions().get::<Claims>() {
        Some(claims) => claims.id,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({"message": "Authentication required"}));
        }
    };

    let result = sqlx::query_as::<_, UserProfile>(
        "SELECT id, name, email, role, phone, address, bio, profile_picture, skills,
            created_at, updated_at
        FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await;

    match result {
        Ok(Some(profile)) => HttpResponse::Ok().json(profile),
        Ok(None) => HttpResponse::NotFound().json(json!({"message": "User not found"})),
        Err(e) => {
            log::error!("Error fetching profile for user {}: {}", user_id, e);
            HttpResponse::InternalServerError()
                .json(json!({"message": "Failed to retrieve profile"}))
        }
    }
}

//Get Basic Profile
//Get Basic Profile Input: HttpRequest(JWT Token)
//Get Basic Profile Output: AuthenticatedUser
pub async fn get_basic_profile(req: HttpRequest) -> impl Responder {
    if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
        HttpResponse::Ok().json(user)
    } else {
        HttpResponse::Unauthorized().json(json!({"message": "Authentication required"}))
    }
}

//Update Profile Request
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub skills: Option<Value>,
}

//Update Profile
//Update Profile Input: HttpRequest(JWT Token), UpdateProfileRequest
//Update Profile Output: Confirmation message + UserProfile
pub async fn update_profile(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    payload: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let user_id = match req.extensions().get::<Claims>() {
        Some(claims) => claims.id,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({"message": "Authentication required"}));
        }
    };

    let result = sqlx::query_as::<_, UserProfile>(
        "UPDATE users
        SET name = COALESCE($1, name),
            phone = COALESCE($2, phone),
            address = COALESCE($3, address),
            bio = COALESCE($4, bio),
            profile_picture = COALESCE($5, profile_picture),
            skills = COALESCE($6, skills),
            updated_at = NOW()
        WHERE id = $7
        RETURNING id, name, email, role, phone, address, bio, profile_picture, skills,
            created_at, updated_at",
    )
    .bind(payload.name.as_ref())
    .bind(payload.phone.as_ref())
    .bind(payload.address.as_ref())
    .bind(payload.bio.as_ref())
    .bind(payload.profile_picture.as_ref())
    .bind(payload.skills.as_ref())
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await;

    match result {
        Ok(Some(profile)) => HttpResponse::Ok()
            .json(json!({"message": "Profile updated successfully", "user": profile})),
        Ok(None) => HttpResponse::NotFound().json(json!({"message": "User not found"})),
        Err(e) => {
            log::error!("Error updating profile for user {}: {}", user_id, e);
            HttpResponse::InternalServerError()
                .json(json!({"message": "Failed to update profile"}))
        }
    }
}

//List Users
//List Users Input: HttpRequest(JWT Token, Admin)
//List Users Output: Vec<UserProfile>
pub async fn list_users(pool: web::Data<PgPool>, req: HttpRequest) -> impl Responder {
    // Check if user is admin
    if let Err(response) = ensure_admin(&req).await {
        return response;
    }

    let result = sqlx::query_as::<_, UserProfile>(
        "SELECT id, name, email, role, phone, address, bio, profile_picture, skills,
            created_at, updated_at
        FROM users ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await;

    match result {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(e) => {
            log::error!("Error listing users: {}", e);
            HttpResponse::InternalServerError().json(json!({"message": "Failed to retrieve users"}))
        }
    }
}

//Config User Routes
// POST /users/register
// POST /users/login
// GET  /users/profile
// PUT  /users/profile
// GET  /users/profile/basic
// GET  /users (admin)
pub fn config_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .service(
                web::scope("/profile")
                    .wrap(AuthMiddleware)
                    .route("/basic", web::get().to(get_basic_profile))
                    .service(
                        web::resource("")
                            .route(web::get().to(get_profile))
                            .route(web::put().to(update_profile)),
                    ),
            )
            .service(
                web::resource("")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(list_users)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Service;
    use actix_web::test::{init_service, TestRequest};
    use actix_web::App;

    #[actix_web::test]
    async fn profile_routes_require_a_token() {
        std::env::set_var("JWT_SECRET", "job-portal-test-secret");
        let app = init_service(App::new().configure(config_user_routes)).await;

        for req in [
            TestRequest::get().uri("/users/profile").to_request(),
            TestRequest::put().uri("/users/profile").to_request(),
            TestRequest::get().uri("/users/profile/basic").to_request(),
            TestRequest::get().uri("/users").to_request(),
        ] {
            let status = match app.call(req).await {
                Ok(res) => res.status(),
                Err(err) => HttpResponse::from_error(err).status(),
            };
            assert_eq!(status, actix_web::http::StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn login_response_uses_the_expected_keys() {
        let response = LoginResponse {
            token: "abc".to_string(),
            role: UserRole::Admin,
            user_id: 9,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["token"], "abc");
        assert_eq!(value["role"], "admin");
        assert_eq!(value["user_id"], 9);
    }

    #[test]
    fn register_request_role_is_optional() {
        let without_role: RegisterRequest = serde_json::from_str(
            r#"{"name":"A","email":"a@b.com","password":"pw"}"#,
        )
        .unwrap();
        assert!(without_role.role.is_none());

        let with_role: RegisterRequest = serde_json::from_str(
            r#"{"name":"A","email":"a@b.com","password":"pw","role":"manager"}"#,
        )
        .unwrap();
        assert_eq!(with_role.role, Some(UserRole::Manager));
    }

    #[test]
    fn update_profile_request_accepts_camel_case_fields() {
        let payload: UpdateProfileRequest = serde_json::from_str(
            r#"{"profilePicture":"https://example.com/a.png","skills":["Rust","SQL"]}"#,
        )
        .unwrap();
        assert_eq!(
            payload.profile_picture.as_deref(),
            Some("https://example.com/a.png")
        );
        assert!(payload.skills.is_some());
        assert!(payload.name.is_none());
    }
}
