use axum::Json;
use serde::Serialize;

use crate::config::APP_VERSION;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn check() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        version: APP_VERSION,
    })
}
