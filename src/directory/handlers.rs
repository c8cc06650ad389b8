use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthGuard;
use crate::directory::UserUpdate;
use crate::AppState;
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: String,
    pub password: String,
}

pub async fn list_users(_guard: AuthGuard, state: web::Data<AppState>) -> Result<HttpResponse> {
    let users = state.directory.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn create_user(
    _guard: AuthGuard,
    req: web::Json<CreateUserRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("Received create request for email: {}", req.email);
    state
        .directory
        .create(&req.name, &req.email, &req.role, &req.password)
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User created successfully"
    })))
}

pub async fn update_user(
    _guard: AuthGuard,
    path: web::Path<String>,
    req: web::Json<UserUpdate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let email = path.into_inner();
    info!("Received update request for email: {}", email);
    state.directory.update(&email, req.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "User updated successfully"
    })))
}

pub async fn delete_user(
    _guard: AuthGuard,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let email = path.into_inner();
    info!("Received delete request for email: {}", email);
    state.directory.delete(&email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "User removed successfully"
    })))
}
