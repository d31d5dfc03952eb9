use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};

use agrisync_core::{TaskId, UserId};
use agrisync_infra::TaskFilter;
use agrisync_tasks::{NewTask, Task, TaskPatch};

use super::route_both;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::{self, perms};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    let router = route_both(Router::new(), "/tasks/tasks", get(list_tasks).post(create_task));
    let router = route_both(
        router,
        "/tasks/tasks/:id",
        get(get_task)
            .put(replace_task)
            .patch(patch_task)
            .delete(delete_task),
    );
    route_both(router, "/tasks/update-status/:id", patch(update_status))
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::TaskListQuery>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::TASKS_READ) {
        return errors::forbidden(e);
    }

    let assigned_to = match query.assigned_to.as_deref().map(str::parse::<UserId>) {
        None => None,
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => return errors::invalid_id("user"),
    };

    let tasks = match services.store.list_tasks(TaskFilter { assigned_to }).await {
        Ok(t) => t,
        Err(e) => return errors::store_error_to_response("task", e),
    };

    let mut views = Vec::with_capacity(tasks.len());
    for task in tasks {
        match services.task_view(task).await {
            Ok(v) => views.push(v),
            Err(e) => return errors::store_error_to_response("task", e),
        }
    }

    (StatusCode::OK, Json(views)).into_response()
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::TaskRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::TASKS_WRITE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let new = match new_task(&body) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.create_task(new).await {
        Ok(task) => render(&services, task, StatusCode::CREATED).await,
        Err(e) => errors::store_error_to_response("task", e),
    }
}

pub async fn get_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::TASKS_READ) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<TaskId>() else {
        return errors::invalid_id("task");
    };

    match services.task_view_by_id(id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::store_error_to_response("task", e),
    }
}

pub async fn replace_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::TaskRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::TASKS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<TaskId>() else {
        return errors::invalid_id("task");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let new = match new_task(&body) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.update_task(id, new).await {
        Ok(task) => render(&services, task, StatusCode::OK).await,
        Err(e) => errors::store_error_to_response("task", e),
    }
}

pub async fn patch_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::TaskPatchRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::TASKS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<TaskId>() else {
        return errors::invalid_id("task");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    apply_patch(&services, id, TaskPatch::from(body)).await
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::TASKS_WRITE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<TaskId>() else {
        return errors::invalid_id("task");
    };

    match services.store.delete_task(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response("task", e),
    }
}

/// Status-only update, allowed for the task's assignee or an admin.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::TaskStatusRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, &perms::TASKS_STATUS_UPDATE) {
        return errors::forbidden(e);
    }
    let Ok(id) = id.parse::<TaskId>() else {
        return errors::invalid_id("task");
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let task = match services.store.get_task(id).await {
        Ok(t) => t,
        Err(e) => return errors::store_error_to_response("task", e),
    };
    if let Err(e) = task.ensure_can_update_status(principal.user_id(), principal.role().is_admin()) {
        return errors::domain_error_to_response(e);
    }

    apply_patch(&services, id, TaskPatch::status_only(&body.status)).await
}

fn new_task(body: &dto::TaskRequest) -> agrisync_core::DomainResult<NewTask> {
    NewTask::new(
        &body.title,
        body.description.as_deref(),
        body.assigned_to_id,
        body.due_date,
        body.status.as_deref(),
    )
}

async fn apply_patch(services: &AppServices, id: TaskId, patch: TaskPatch) -> axum::response::Response {
    let current = match services.store.get_task(id).await {
        Ok(t) => t,
        Err(e) => return errors::store_error_to_response("task", e),
    };
    let new = match patch.apply(&current) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store.update_task(id, new).await {
        Ok(task) => render(services, task, StatusCode::OK).await,
        Err(e) => errors::store_error_to_response("task", e),
    }
}

async fn render(services: &AppServices, task: Task, status: StatusCode) -> axum::response::Response {
    match services.task_view(task).await {
        Ok(view) => (status, Json(view)).into_response(),
        Err(e) => errors::store_error_to_response("task", e),
    }
}
