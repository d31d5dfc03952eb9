//! Storage wiring and the read helpers shared by several routes.

use std::sync::Arc;

use anyhow::Context;

use agrisync_auth::User;
use agrisync_core::{CropId, TaskId, UserId};
use agrisync_crops::{Crop, CropDetail};
use agrisync_infra::config::{AppConfig, StorageBackend};
use agrisync_infra::{
    FarmStore, InMemoryFarmStore, InputRecorder, PostgresFarmStore, StoreError, StoreResult,
};
use agrisync_tasks::Task;

use super::dto::TaskView;

#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn FarmStore>,
    pub recorder: InputRecorder<dyn FarmStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn FarmStore>) -> Self {
        let recorder = InputRecorder::new(Arc::clone(&store));
        Self { store, recorder }
    }

    /// A crop with its field and input history expanded.
    pub async fn crop_detail(&self, crop: Crop) -> StoreResult<CropDetail> {
        let field = self.store.get_field(crop.field_id).await?;
        let inputs = self.store.list_inputs_for_crop(crop.id).await?;
        Ok(CropDetail::new(crop, field, inputs))
    }

    pub async fn crop_detail_by_id(&self, id: CropId) -> StoreResult<CropDetail> {
        let crop = self.store.get_crop(id).await?;
        self.crop_detail(crop).await
    }

    /// A task with its assignee expanded.
    ///
    /// An assignee that vanished between the two reads renders as `null`.
    pub async fn task_view(&self, task: Task) -> StoreResult<TaskView> {
        let assignee = match task.assigned_to {
            Some(id) => self.assignee(id).await?,
            None => None,
        };
        Ok(TaskView::new(task, assignee))
    }

    pub async fn task_view_by_id(&self, id: TaskId) -> StoreResult<TaskView> {
        let task = self.store.get_task(id).await?;
        self.task_view(task).await
    }

    async fn assignee(&self, id: UserId) -> StoreResult<Option<User>> {
        match self.store.get_user(id).await {
            Ok(user) => Ok(Some(user)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Open the configured storage backend.
///
/// Postgres connects eagerly and applies the schema before returning.
pub async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn FarmStore>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::info!("using in-memory storage");
            Ok(Arc::new(InMemoryFarmStore::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .database_url()
                .context("storage is 'postgres' but no database_url is set")?;
            let store = PostgresFarmStore::connect(url, config.db_max_connections)
                .await
                .context("failed to connect to postgres")?;
            store.migrate().await.context("failed to apply schema")?;
            tracing::info!("using postgres storage");
            Ok(Arc::new(store))
        }
    }
}
