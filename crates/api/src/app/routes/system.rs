use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::authz;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    let permissions = authz::permissions_for_role(principal.role());
    Json(serde_json::json!({
        "user_id": principal.user_id(),
        "role": principal.role().as_str(),
        "permissions": permissions.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
    }))
}
