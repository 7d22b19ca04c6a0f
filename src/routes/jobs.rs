use crate::handlers::auth::{ensure_admin, Claims};
use crate::middleware::auth_middleware::AuthMiddleware;
use crate::models::all_models::{Job, JobMapping, JobType};
use actix_web::{guard, web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Row};

//Create Job Request
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    pub salary: Option<i32>,
    pub job_type: JobType,
}

//Create Job
//Create Job Input: HttpRequest(JWT Token, Admin), CreateJobRequest
//Create Job Output: Job
pub async fn create_job(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    payload: web::Json<CreateJobRequest>,
) -> impl Responder {
    // Check if user is admin
    if let Err(response) = ensure_admin(&req).await {
        return response;
    }

    let result = sqlx::query_as::<_, Job>(
        "INSERT INTO jobs (title, description, company, location, salary, job_type)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, description, company, location, salary, job_type,
            created_at, updated_at",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.company)
    .bind(&payload.location)
    .bind(payload.salary)
    .bind(payload.job_type)
    .fetch_one(pool.get_ref())
    .await;

    match result {
        Ok(job) => HttpResponse::Created().json(job),
        Err(e) => {
            log::error!("Error creating job: {}", e);
            HttpResponse::InternalServerError().json(json!({"message": "Error creating job"}))
        }
    }
}

//List Jobs
//List Jobs Input: None
//List Jobs Output: Vec<Job>
pub async fn list_jobs(pool: web::Data<PgPool>) -> impl Responder {
    let result = sqlx::query_as::<_, Job>(
        "SELECT id, title, description, company, location, salary, job_type,
            created_at, updated_at
        FROM jobs ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await;

    match result {
        Ok(jobs) => HttpResponse::Ok().json(jobs),
        Err(e) => {
            log::error!("Error listing jobs: {}", e);
            HttpResponse::InternalServerError().json(json!({"message": "Failed to retrieve jobs"}))
        }
    }
}

//Get Job
//Get Job Input: Path (/jobs/{id})
//Get Job Output: Job
pub async fn get_job(pool: web::Data<PgPool>, path: web::Path<i32>) -> impl Responder {
    let job_id = path.into_inner();

    let result = sqlx::query_as::<_, Job>(
        "SELECT id, title, description, company, location, salary, job_type,
            created_at, updated_at
        FROM jobs WHERE id = $1",
    )
    .bind(job_id)
    .fetch_optional(pool.get_ref())
    .await;

    match result {
        Ok(Some(job)) => HttpResponse::Ok().json(job),
        Ok(None) => HttpResponse::NotFound().json(json!({"message": "Job not found"})),
        Err(e) => {
            log::error!("Error fetching job {}: {}", job_id, e);
            HttpResponse::InternalServerError().json(json!({"message": "Failed to retrieve job"}))
        }
    }
}

//Update Job Request
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<i32>,
    pub job_type: Option<JobType>,
}

//Update Job
//Update Job Input: HttpRequest(JWT Token, Admin), Path (/jobs/{id}), UpdateJobRequest
//Update Job Output: Confirmation message + Job
pub async fn update_job(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    path: web::Path<i32>,
    payload: web::Json<UpdateJobRequest>,
) -> impl Responder {
    // Check if user is admin
    if let Err(response) = ensure_admin(&req).await {
        return response;
    }

    let job_id = path.into_inner();

    let result = sqlx::query_as::<_, Job>(
        "UPDATE jobs
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            company = COALESCE($3, company),
            location = COALESCE($4, location),
            salary = COALESCE($5, salary),
            job_type = COALESCE($6, job_type),
            updated_at = NOW()
        WHERE id = $7
        RETURNING id, title, description, company, location, salary, job_type,
            created_at, updated_at",
    )
    .bind(payload.title.as_ref())
    .bind(payload.description.as_ref())
    .bind(payload.company.as_ref())
    .bind(payload.location.as_ref())
    .bind(payload.salary)
    .bind(payload.job_type)
    .bind(job_id)
    .fetch_optional(pool.get_ref())
    .await;

    match result {
        Ok(Some(job)) => {
            HttpResponse::Ok().json(json!({"message": "Job updated successfully", "job": job}))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({"message": "Job not found"})),
        Err(e) => {
            log::error!("Error updating job {}: {}", job_id, e);
            HttpResponse::InternalServerError().json(json!({"message": "Error updating job"}))
        }
    }
}

//Delete Job
//Delete Job Input: HttpRequest(JWT Token, Admin), Path (/jobs/{id})
//Delete Job Output: Confirmation message
pub async fn delete_job(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> impl Responder {
    // Check if user is admin
    if let Err(response) = ensure_admin(&req).await {
        return response;
    }

    let job_id = path.into_inner();

    let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(job_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            HttpResponse::NotFound().json(json!({"message": "Job not found"}))
        }
        Ok(_) => HttpResponse::Ok().json(json!({"message": "Job deleted successfully"})),
        Err(e) => {
            log::error!("Error deleting job {}: {}", job_id, e);
            HttpResponse::InternalServerError().json(json!({"message": "Error deleting job"}))
        }
    }
}

//Apply Job Request
#[derive(Deserialize, Serialize)]
pub struct ApplyJobRequest {
    pub job_id: i32,
}

//Apply To Job
//Apply To Job Input: HttpRequest(JWT Token), ApplyJobRequest
//Apply To Job Output: JobMapping
pub async fn apply_to_job(
    pool: web::Data<PgPool>,
    req: HttpRequest,
    payload: web::Json<ApplyJobRequest>,
) -> impl Responder {
    // The applicant is always the token holder
    let user_id = match req.extensions().get::<Claims>() {
        Some(claims) => claims.id,
        None => {
            return HttpResponse::Unauthorized()
                .json(json!({"message": "Authentication required"}));
        }
    };

    let result = sqlx::query_as::<_, JobMapping>(
        "INSERT INTO job_mappings (user_id, job_id)
        VALUES ($1, $2)
        RETURNING id, user_id, job_id, status, created_at, updated_at",
    )
    .bind(user_id)
    .bind(payload.job_id)
    .fetch_one(pool.get_ref())
    .await;

    match result {
        Ok(mapping) => HttpResponse::Created().json(mapping),
        Err(e) => {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return HttpResponse::BadRequest()
                        .json(json!({"message": "Already applied to this job"}));
                }
                if db_err.is_foreign_key_violation() {
                    return HttpResponse::NotFound().json(json!({"message": "Job not found"}));
                }
            }
            log::error!("Error applying to job {}: {}", payload.job_id, e);
            HttpResponse::InternalServerError().json(json!({"message": "Error applying to job"}))
        }
    }
}

//List Applied Jobs
//List Applied Jobs Input: None
//List Applied Jobs Output: Vec<JobMapping with User and Job details>
pub async fn list_applied_jobs(pool: web::Data<PgPool>) -> impl Responder {
    let query = r#"
        SELECT
            m.id,
            m.user_id,
            m.job_id,
            m.status,
            m.created_at,
            m.updated_at,
            u.name AS user_name,
            u.email AS user_email,
            j.title AS job_title,
            j.company AS job_company
        FROM
            job_mappings m
        JOIN
            users u ON m.user_id = u.id
        JOIN
            jobs j ON m.job_id = j.id
        ORDER BY
            m.id
    "#;

    match sqlx::query(query).fetch_all(pool.get_ref()).await {
        Ok(rows) => {
            let applications = rows
                .iter()
                .map(|row| {
                    json!({
                        "id": row.get::<i32, _>("id"),
                        "user_id": row.get::<i32, _>("user_id"),
                        "job_id": row.get::<i32, _>("job_id"),
                        "status": row.get::<String, _>("status"),
                        "createdAt": row.get::<NaiveDateTime, _>("created_at"),
                        "updatedAt": row.get::<NaiveDateTime, _>("updated_at"),
                        "User": {
                            "id": row.get::<i32, _>("user_id"),
                            "name": row.get::<String, _>("user_name"),
                            "email": row.get::<String, _>("user_email"),
                        },
                        "Job": {
                            "id": row.get::<i32, _>("job_id"),
                            "title": row.get::<String, _>("job_title"),
                            "company": row.get::<String, _>("job_company"),
                        },
                    })
                })
                .collect::<Vec<_>>();

            HttpResponse::Ok().json(applications)
        }
        Err(e) => {
            log::error!("Error listing applications: {}", e);
            HttpResponse::InternalServerError()
                .json(json!({"message": "Failed to retrieve applications"}))
        }
    }
}

//Config Job Routes
// POST   /jobs/apply
// GET    /jobs/applied
// GET    /jobs
// POST   /jobs (admin)
// GET    /jobs/{id}
// PUT    /jobs/{id} (admin)
// DELETE /jobs/{id} (admin)
pub fn config_job_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/jobs")
            .service(
                web::resource("/apply")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(apply_to_job)),
            )
            .route("/applied", web::get().to(list_applied_jobs))
            .service(
                web::resource("")
                    .guard(guard::Get())
                    .route(web::get().to(list_jobs)),
            )
            .service(
                web::resource("")
                    .guard(guard::Post())
                    .wrap(AuthMiddleware)
                    .route(web::post().to(create_job)),
            )
            .service(
                web::resource("/{id}")
                    .guard(guard::Get())
                    .route(web::get().to(get_job)),
            )
            .service(
                web::resource("/{id}")
                    .wrap(AuthMiddleware)
                    .route(web::put().to(update_job))
                    .route(web::delete().to(delete_job)),
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
    async fn mutating_job_routes_require_a_token() {
        std::env::set_var("JWT_SECRET", "job-portal-test-secret");
        let app = init_service(App::new().configure(config_job_routes)).await;

        for req in [
            TestRequest::post().uri("/jobs").to_request(),
            TestRequest::put().uri("/jobs/1").to_request(),
            TestRequest::delete().uri("/jobs/1").to_request(),
            TestRequest::post().uri("/jobs/apply").to_request(),
        ] {
            let status = match app.call(req).await {
                Ok(res) => res.status(),
                Err(err) => HttpResponse::from_error(err).status(),
            };
            assert_eq!(status, actix_web::http::StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn job_listing_is_not_behind_auth() {
        std::env::set_var("JWT_SECRET", "job-portal-test-secret");
        let app = init_service(App::new().configure(config_job_routes)).await;

        for req in [
            TestRequest::get().uri("/jobs").to_request(),
            TestRequest::get().uri("/jobs/1").to_request(),
            TestRequest::get().uri("/jobs/applied").to_request(),
        ] {
            let status = match app.call(req).await {
                Ok(res) => res.status(),
                Err(err) => HttpResponse::from_error(err).status(),
            };
            assert_ne!(status, actix_web::http::StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn create_job_request_requires_job_type() {
        let missing = serde_json::from_str::<CreateJobRequest>(
            r#"{"title":"Eng","description":"d","company":"C","location":"L"}"#,
        );
        assert!(missing.is_err());

        let full: CreateJobRequest = serde_json::from_str(
            r#"{"title":"Eng","description":"d","company":"C","location":"L","jobType":"full-time"}"#,
        )
        .unwrap();
        assert_eq!(full.job_type, JobType::FullTime);
        assert!(full.salary.is_none());
    }

    #[test]
    fn update_job_request_is_fully_partial() {
        let payload: UpdateJobRequest =
            serde_json::from_str(r#"{"salary":120000,"jobType":"contract"}"#).unwrap();
        assert_eq!(payload.salary, Some(120000));
        assert_eq!(payload.job_type, Some(JobType::Contract));
        assert!(payload.title.is_none());
    }

    #[test]
    fn apply_request_carries_only_the_job_id() {
        let payload: ApplyJobRequest = serde_json::from_str(r#"{"job_id":3}"#).unwrap();
        assert_eq!(payload.job_id, 3);
    }
}
