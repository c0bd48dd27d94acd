use axum::{response::IntoResponse, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthStatus {
    status: &'static str,
}

pub async fn healthcheck() -> impl IntoResponse {
    Json(HealthStatus {
        status: "available",
    })
}
