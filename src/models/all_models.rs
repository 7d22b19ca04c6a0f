use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};

//  USER ROLES

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Display, EnumString, PartialEq,Clone,Copy)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Manager,
}

//  AUTHENTICATED USER (populated by the auth middleware)

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

//  JOBS

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Display, EnumString, PartialEq,Clone,Copy)]
#[sqlx(type_name = "job_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    pub salary: Option<i32>,
    pub job_type: JobType,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

//  JOB APPLICATIONS
//  The user_id/job_id columns keep their snake_case names on the wire.

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct JobMapping {
    pub id: i32,
    pub user_id: i32,
    pub job_id: i32,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    pub updated_at: NaiveDateTime,
}
