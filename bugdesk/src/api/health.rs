use axum::Json;

use super::envelope::Envelope;

pub async fn health_check() -> Json<Envelope<()>> {
    Json(Envelope::message("API is running"))
}
