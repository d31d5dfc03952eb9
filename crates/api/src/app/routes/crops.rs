use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use agrisync_core::CropId;
use agrisync_crops::{CropPatch, InputUsedRequest, NewCrop};

use super::route_both;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::{self, perms};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    let router = route_both(Router::new(), "/crops", get(list_crops).post(create_crop));
    let router = route_both(
        router,
        "/crops/:id",
        get(get_crop)
            .put(replace_crop)
            .patch(patch_crop)
            .delete(delete_crop),
    );
    route_both(router, "/crops/:id/add_input", post(add_input))
}

pub async fn list_crops(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::CROPS_READ) {
        return errors::forbidden(e);
    }

    let crops = match services.store.list_crops().await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response("crop", e),
    };

    let mut details = Vec::with_capacity(crops.len());
    for crop in crops {
        match services.crop_detail(crop).await {
            Ok(d) => details.push(d),
            Err(e) => return errors::store_error_to_response("crop", e),
        }
    }

    (StatusCode::OK, Json(details)).into_response()
}

pub async fn create_crop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CropRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::CROPS_WRITE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let new = match NewCrop::new(
        &body.name,
        body.field_id,
        body.planting_date,
        body.expected_harvest_date,
        body.status.as_deref(),
    ) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let crop = match services.store.create_crop(new).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response("crop", e),
    };

    match services.crop_detail(crop).await {
        Ok(detail) => {
            tracing::info!(crop_id = %detail.crop.id, crop = %detail.describe(), "crop created");
            (StatusCode::CREATED, Json(detail)).into_response()
        }
        Err(e) => errors::store_error_to_response("crop", e),
    }
}

pub async fn get_crop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::CROPS_READ) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<CropId>() else {
        return errors::invalid_id("crop");
    };

    match services.crop_detail_by_id(id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => errors::store_error_to_response("crop", e),
    }
}

pub async fn replace_crop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::CropRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::CROPS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<CropId>() else {
        return errors::invalid_id("crop");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let new = match NewCrop::new(
        &body.name,
        body.field_id,
        body.planting_date,
        body.expected_harvest_date,
        body.status.as_deref(),
    ) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    update_and_render(&services, id, new).await
}

pub async fn patch_crop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::CropPatchRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::CROPS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<CropId>() else {
        return errors::invalid_id("crop");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let current = match services.store.get_crop(id).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response("crop", e),
    };
    let new = match CropPatch::from(body).apply(&current) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    update_and_render(&services, id, new).await
}

async fn update_and_render(services: &AppServices, id: CropId, new: NewCrop) -> axum::response::Response {
    let crop = match services.store.update_crop(id, new).await {
        Ok(c) => c,
        Err(e) => return errors::store_error_to_response("crop", e),
    };

    match services.crop_detail(crop).await {
        Ok(detail) => {
            tracing::info!(crop_id = %detail.crop.id, crop = %detail.describe(), "crop updated");
            (StatusCode::OK, Json(detail)).into_response()
        }
        Err(e) => errors::store_error_to_response("crop", e),
    }
}

pub async fn delete_crop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::CROPS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<CropId>() else {
        return errors::invalid_id("crop");
    };

    match services.store.delete_crop(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response("crop", e),
    }
}

/// Record that an inventory input was applied to this crop.
pub async fn add_input(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::AddInputRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::CROPS_INPUTS_RECORD) {
        return errors::forbidden(e);
    }
    let Ok(crop_id) = id.parse::<CropId>() else {
        return errors::invalid_id("crop");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let request = match InputUsedRequest::new(body.inventory_item_id, body.amount_used, body.date_used) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.recorder.record_input(crop_id, request).await {
        Ok(detail) => (StatusCode::CREATED, Json(detail)).into_response(),
        Err(e) => errors::record_error_to_response(e),
    }
}
