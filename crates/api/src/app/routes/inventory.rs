use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use agrisync_core::InventoryItemId;
use agrisync_inventory::{InventoryItemPatch, NewInventoryItem};

use super::route_both;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::{self, perms};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    let router = route_both(
        Router::new(),
        "/inventory/items",
        get(list_items).post(create_item),
    );
    let router = route_both(
        router,
        "/inventory/items/:id",
        get(get_item).patch(patch_item).delete(delete_item),
    );
    route_both(router, "/inventory/items/:id/adjust", post(adjust_stock))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::INVENTORY_READ) {
        return errors::forbidden(e);
    }

    match services.store.list_items().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::store_error_to_response("item", e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateItemRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::INVENTORY_WRITE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let new = match NewInventoryItem::new(&body.name, body.quantity) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.create_item(new).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::store_error_to_response("item", e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::INVENTORY_READ) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<InventoryItemId>() else {
        return errors::invalid_id("item");
    };

    match services.store.get_item(id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::store_error_to_response("item", e),
    }
}

/// Writes only the supplied attributes; a quantity edit made against a
/// balance that has since moved is a `409 conflict`.
pub async fn patch_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::ItemPatchRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::INVENTORY_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<InventoryItemId>() else {
        return errors::invalid_id("item");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let current = match services.store.get_item(id).await {
        Ok(i) => i,
        Err(e) => return errors::store_error_to_response("item", e),
    };
    let update = match InventoryItemPatch::from(body).plan(&current) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.update_item(update).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::store_error_to_response("item", e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::INVENTORY_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<InventoryItemId>() else {
        return errors::invalid_id("item");
    };

    match services.store.delete_item(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response("item", e),
    }
}

/// Apply a signed stock correction; the balance may not go negative.
pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::AdjustStockRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::INVENTORY_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<InventoryItemId>() else {
        return errors::invalid_id("item");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let item = match services.store.get_item(id).await {
        Ok(i) => i,
        Err(e) => return errors::store_error_to_response("item", e),
    };
    let change = match item.plan_adjustment(body.delta) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.update_balance(change).await {
        Ok(item) => {
            tracing::info!(item_id = %id, delta = %body.delta, quantity = %item.quantity, "stock adjusted");
            (StatusCode::OK, Json(item)).into_response()
        }
        Err(e) => errors::store_error_to_response("item", e),
    }
}
