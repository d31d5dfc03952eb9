use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use agrisync_core::FieldId;
use agrisync_crops::{FieldPatch, NewField};

use super::route_both;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::{self, perms};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    let router = route_both(Router::new(), "/fields", get(list_fields).post(create_field));
    route_both(
        router,
        "/fields/:id",
        get(get_field)
            .put(replace_field)
            .patch(patch_field)
            .delete(delete_field),
    )
}

pub async fn list_fields(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::FIELDS_READ) {
        return errors::forbidden(e);
    }

    match services.store.list_fields().await {
        Ok(fields) => (StatusCode::OK, Json(fields)).into_response(),
        Err(e) => errors::store_error_to_response("field", e),
    }
}

pub async fn create_field(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::FieldRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::FIELDS_WRITE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let new = match NewField::new(&body.name, body.location_description.as_deref()) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.create_field(new).await {
        Ok(field) => (StatusCode::CREATED, Json(field)).into_response(),
        Err(e) => errors::store_error_to_response("field", e),
    }
}

pub async fn get_field(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::FIELDS_READ) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<FieldId>() else {
        return errors::invalid_id("field");
    };

    match services.store.get_field(id).await {
        Ok(field) => (StatusCode::OK, Json(field)).into_response(),
        Err(e) => errors::store_error_to_response("field", e),
    }
}

pub async fn replace_field(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::FieldRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::FIELDS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<FieldId>() else {
        return errors::invalid_id("field");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let new = match NewField::new(&body.name, body.location_description.as_deref()) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.update_field(id, new).await {
        Ok(field) => (StatusCode::OK, Json(field)).into_response(),
        Err(e) => errors::store_error_to_response("field", e),
    }
}

pub async fn patch_field(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::FieldPatchRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::FIELDS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<FieldId>() else {
        return errors::invalid_id("field");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let current = match services.store.get_field(id).await {
        Ok(f) => f,
        Err(e) => return errors::store_error_to_response("field", e),
    };
    let new = match FieldPatch::from(body).apply(&current) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.update_field(id, new).await {
        Ok(field) => (StatusCode::OK, Json(field)).into_response(),
        Err(e) => errors::store_error_to_response("field", e),
    }
}

pub async fn delete_field(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::FIELDS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<FieldId>() else {
        return errors::invalid_id("field");
    };

    match services.store.delete_field(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response("field", e),
    }
}
