//! In-memory farm store for tests/dev.
//!
//! All tables live behind one `RwLock`; every write, including the
//! consumption commit, happens under a single write guard.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use agrisync_auth::{NewUser, User};
use agrisync_core::{CropId, FieldId, InputUsedId, InventoryItemId, TaskId, UserId};
use agrisync_crops::{
    Consumption, Crop, Field, InputUsed, InputUsedDetail, NewCrop, NewField, sort_for_display,
};
use agrisync_inventory::{BalanceChange, InventoryItem, ItemUpdate, NewInventoryItem};
use agrisync_tasks::{NewTask, Task};

use super::{
    CropStore, FieldStore, InputLedger, InventoryStore, StoreError, StoreResult, TaskFilter,
    TaskStore, UserStore,
};

#[derive(Debug, Default)]
struct Sequences {
    field: i64,
    crop: i64,
    item: i64,
    input: i64,
    task: i64,
    user: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn ensure_observed(item: &InventoryItem, change: BalanceChange) -> StoreResult<()> {
    if item.quantity != change.observed {
        return Err(StoreError::Conflict(format!(
            "balance of item {} changed (expected {}, found {})",
            change.item_id, change.observed, item.quantity
        )));
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Tables {
    seq: Sequences,
    fields: BTreeMap<FieldId, Field>,
    crops: BTreeMap<CropId, Crop>,
    items: BTreeMap<InventoryItemId, InventoryItem>,
    inputs: BTreeMap<InputUsedId, InputUsed>,
    tasks: BTreeMap<TaskId, Task>,
    users: BTreeMap<UserId, User>,
}

impl Tables {
    fn detail(&self, input: &InputUsed) -> InputUsedDetail {
        InputUsedDetail {
            input: input.clone(),
            inventory_item: input
                .inventory_item_id
                .and_then(|id| self.items.get(&id).cloned()),
        }
    }

    fn ensure_field(&self, id: FieldId) -> StoreResult<()> {
        if self.fields.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(format!("field {id} does not exist")))
        }
    }

    fn ensure_user(&self, id: Option<UserId>) -> StoreResult<()> {
        match id {
            Some(id) if !self.users.contains_key(&id) => {
                Err(StoreError::MissingReference(format!("user {id} does not exist")))
            }
            _ => Ok(()),
        }
    }

    fn remove_crop_cascade(&mut self, id: CropId) {
        self.crops.remove(&id);
        self.inputs.retain(|_, input| input.crop_id != id);
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFarmStore {
    inner: RwLock<Tables>,
}

impl InMemoryFarmStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl FieldStore for InMemoryFarmStore {
    async fn create_field(&self, new: NewField) -> StoreResult<Field> {
        let mut t = self.write()?;
        let field = Field {
            id: FieldId::new(next(&mut t.seq.field)),
            name: new.name,
            location_description: new.location_description,
        };
        t.fields.insert(field.id, field.clone());
        Ok(field)
    }

    async fn list_fields(&self) -> StoreResult<Vec<Field>> {
        Ok(self.read()?.fields.values().cloned().collect())
    }

    async fn get_field(&self, id: FieldId) -> StoreResult<Field> {
        self.read()?.fields.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_field(&self, id: FieldId, new: NewField) -> StoreResult<Field> {
        let mut t = self.write()?;
        let field = t.fields.get_mut(&id).ok_or(StoreError::NotFound)?;
        field.name = new.name;
        field.location_description = new.location_description;
        Ok(field.clone())
    }

    async fn delete_field(&self, id: FieldId) -> StoreResult<()> {
        let mut t = self.write()?;
        t.fields.remove(&id).ok_or(StoreError::NotFound)?;
        let crops: Vec<CropId> = t
            .crops
            .values()
            .filter(|c| c.field_id == id)
            .map(|c| c.id)
            .collect();
        for crop_id in crops {
            t.remove_crop_cascade(crop_id);
        }
        Ok(())
    }
}

#[async_trait]
impl CropStore for InMemoryFarmStore {
    async fn create_crop(&self, new: NewCrop) -> StoreResult<Crop> {
        let mut t = self.write()?;
        t.ensure_field(new.field_id)?;
        let crop = Crop {
            id: CropId::new(next(&mut t.seq.crop)),
            name: new.name,
            field_id: new.field_id,
            planting_date: new.planting_date,
            expected_harvest_date: new.expected_harvest_date,
            status: new.status,
        };
        t.crops.insert(crop.id, crop.clone());
        Ok(crop)
    }

    async fn list_crops(&self) -> StoreResult<Vec<Crop>> {
        Ok(self.read()?.crops.values().cloned().collect())
    }

    async fn get_crop(&self, id: CropId) -> StoreResult<Crop> {
        self.read()?.crops.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_crop(&self, id: CropId, new: NewCrop) -> StoreResult<Crop> {
        let mut t = self.write()?;
        if !t.crops.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        t.ensure_field(new.field_id)?;
        let crop = t.crops.get_mut(&id).ok_or(StoreError::NotFound)?;
        crop.name = new.name;
        crop.field_id = new.field_id;
        crop.planting_date = new.planting_date;
        crop.expected_harvest_date = new.expected_harvest_date;
        crop.status = new.status;
        Ok(crop.clone())
    }

    async fn delete_crop(&self, id: CropId) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.crops.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        t.remove_crop_cascade(id);
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for InMemoryFarmStore {
    async fn create_item(&self, new: NewInventoryItem) -> StoreResult<InventoryItem> {
        let mut t = self.write()?;
        let item = InventoryItem {
            id: InventoryItemId::new(next(&mut t.seq.item)),
            name: new.name,
            quantity: new.quantity,
        };
        t.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>> {
        Ok(self.read()?.items.values().cloned().collect())
    }

    async fn get_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem> {
        self.read()?.items.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_item(&self, update: ItemUpdate) -> StoreResult<InventoryItem> {
        let mut t = self.write()?;
        let item = t.items.get_mut(&update.item_id).ok_or(StoreError::NotFound)?;
        if let Some(change) = update.balance {
            ensure_observed(item, change)?;
            item.quantity = change.new;
        }
        if let Some(name) = update.name {
            item.name = name;
        }
        Ok(item.clone())
    }

    async fn delete_item(&self, id: InventoryItemId) -> StoreResult<()> {
        let mut t = self.write()?;
        t.items.remove(&id).ok_or(StoreError::NotFound)?;
        for input in t.inputs.values_mut() {
            if input.inventory_item_id == Some(id) {
                input.inventory_item_id = None;
            }
        }
        Ok(())
    }

    async fn update_balance(&self, change: BalanceChange) -> StoreResult<InventoryItem> {
        let mut t = self.write()?;
        let item = t.items.get_mut(&change.item_id).ok_or(StoreError::NotFound)?;
        ensure_observed(item, change)?;
        item.quantity = change.new;
        Ok(item.clone())
    }
}

#[async_trait]
impl InputLedger for InMemoryFarmStore {
    async fn list_inputs_for_crop(&self, crop_id: CropId) -> StoreResult<Vec<InputUsedDetail>> {
        let t = self.read()?;
        let mut entries: Vec<InputUsedDetail> = t
            .inputs
            .values()
            .filter(|i| i.crop_id == crop_id)
            .map(|i| t.detail(i))
            .collect();
        sort_for_display(&mut entries);
        Ok(entries)
    }

    async fn commit_consumption(&self, consumption: Consumption) -> StoreResult<InputUsedDetail> {
        let mut t = self.write()?;
        if !t.crops.contains_key(&consumption.crop_id) {
            return Err(StoreError::NotFound);
        }

        let change = consumption.balance;
        let item = t.items.get_mut(&change.item_id).ok_or_else(|| {
            StoreError::MissingReference(format!("inventory item {} does not exist", change.item_id))
        })?;
        ensure_observed(item, change)?;
        item.quantity = change.new;
        let item = item.clone();

        let input = InputUsed {
            id: InputUsedId::new(next(&mut t.seq.input)),
            crop_id: consumption.crop_id,
            inventory_item_id: Some(consumption.inventory_item_id),
            amount_used: consumption.amount_used,
            date_used: consumption.date_used,
        };
        t.inputs.insert(input.id, input.clone());

        Ok(InputUsedDetail {
            input,
            inventory_item: Some(item),
        })
    }
}

#[async_trait]
impl TaskStore for InMemoryFarmStore {
    async fn create_task(&self, new: NewTask) -> StoreResult<Task> {
        let mut t = self.write()?;
        t.ensure_user(new.assigned_to)?;
        let task = Task {
            id: TaskId::new(next(&mut t.seq.task)),
            title: new.title,
            description: new.description,
            assigned_to: new.assigned_to,
            due_date: new.due_date,
            status: new.status,
            created_at: Utc::now(),
        };
        t.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let t = self.read()?;
        let mut tasks: Vec<Task> = t
            .tasks
            .values()
            .filter(|task| filter.assigned_to.is_none() || task.assigned_to == filter.assigned_to)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn get_task(&self, id: TaskId) -> StoreResult<Task> {
        self.read()?.tasks.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_task(&self, id: TaskId, new: NewTask) -> StoreResult<Task> {
        let mut t = self.write()?;
        if !t.tasks.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        t.ensure_user(new.assigned_to)?;
        let task = t.tasks.get_mut(&id).ok_or(StoreError::NotFound)?;
        task.title = new.title;
        task.description = new.description;
        task.assigned_to = new.assigned_to;
        task.due_date = new.due_date;
        task.status = new.status;
        Ok(task.clone())
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        self.write()?
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UserStore for InMemoryFarmStore {
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.write()?;
        if t.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' is already taken",
                new.username
            )));
        }
        let user = User {
            id: UserId::new(next(&mut t.seq.user)),
            username: new.username,
            email: new.email,
            role: new.role,
        };
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.read()?.users.get(&id).cloned().ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrisync_core::Quantity;
    use agrisync_inventory::InventoryItemPatch;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    async fn seeded() -> (InMemoryFarmStore, Field, Crop, InventoryItem) {
        let store = InMemoryFarmStore::new();
        let field = store.create_field(NewField::new("North", None).unwrap()).await.unwrap();
        let crop = store
            .create_crop(NewCrop::new("Maize", field.id, date(), date(), None).unwrap())
            .await
            .unwrap();
        let item = store
            .create_item(NewInventoryItem::new("Urea", dec!(100)).unwrap())
            .await
            .unwrap();
        (store, field, crop, item)
    }

    fn consumption(crop: &Crop, item: &InventoryItem, amount: rust_decimal::Decimal) -> Consumption {
        let amount = Quantity::positive("amount_used", amount).unwrap();
        Consumption {
            crop_id: crop.id,
            inventory_item_id: item.id,
            amount_used: amount,
            date_used: date(),
            balance: item.plan_consumption(amount).unwrap(),
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_per_table() {
        let store = InMemoryFarmStore::new();
        let a = store.create_field(NewField::new("A", None).unwrap()).await.unwrap();
        let b = store.create_field(NewField::new("B", None).unwrap()).await.unwrap();
        assert_eq!((a.id.get(), b.id.get()), (1, 2));
    }

    #[tokio::test]
    async fn crop_requires_existing_field() {
        let store = InMemoryFarmStore::new();
        let err = store
            .create_crop(NewCrop::new("Maize", FieldId::new(9), date(), date(), None).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }

    #[tokio::test]
    async fn stale_commit_is_a_conflict_and_writes_nothing() {
        let (store, _, crop, item) = seeded().await;
        let first = consumption(&crop, &item, dec!(10));
        let stale = consumption(&crop, &item, dec!(20));

        store.commit_consumption(first).await.unwrap();
        let err = store.commit_consumption(stale).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert_eq!(store.get_item(item.id).await.unwrap().quantity.value(), dec!(90));
        assert_eq!(store.list_inputs_for_crop(crop.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_field_cascades_to_crops_and_inputs() {
        let (store, field, crop, item) = seeded().await;
        store.commit_consumption(consumption(&crop, &item, dec!(5))).await.unwrap();

        store.delete_field(field.id).await.unwrap();

        assert_eq!(store.get_crop(crop.id).await, Err(StoreError::NotFound));
        assert!(store.list_inputs_for_crop(crop.id).await.unwrap().is_empty());
        // consumed stock is not restored
        assert_eq!(store.get_item(item.id).await.unwrap().quantity.value(), dec!(95));
    }

    #[tokio::test]
    async fn deleting_item_keeps_history_with_null_reference() {
        let (store, _, crop, item) = seeded().await;
        store.commit_consumption(consumption(&crop, &item, dec!(5))).await.unwrap();

        store.delete_item(item.id).await.unwrap();

        let entries = store.list_inputs_for_crop(crop.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].input.inventory_item_id, None);
        assert_eq!(entries[0].inventory_item, None);
    }

    #[tokio::test]
    async fn update_balance_is_compare_and_set() {
        let (store, _, _, item) = seeded().await;
        let change = item.plan_adjustment(dec!(-30)).unwrap();
        assert_eq!(store.update_balance(change).await.unwrap().quantity.value(), dec!(70));
        assert!(matches!(store.update_balance(change).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn rename_after_consumption_keeps_the_decrement() {
        let (store, _, crop, item) = seeded().await;
        let read = store.get_item(item.id).await.unwrap();
        store.commit_consumption(consumption(&crop, &item, dec!(40))).await.unwrap();

        let rename = InventoryItemPatch {
            name: Some("Urea 46%".to_string()),
            quantity: None,
        }
        .plan(&read)
        .unwrap();
        let renamed = store.update_item(rename).await.unwrap();

        assert_eq!(renamed.name, "Urea 46%");
        assert_eq!(renamed.quantity.value(), dec!(60));
        assert_eq!(store.list_inputs_for_crop(crop.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_quantity_edit_is_a_conflict_and_writes_nothing() {
        let (store, _, crop, item) = seeded().await;
        let read = store.get_item(item.id).await.unwrap();
        store.commit_consumption(consumption(&crop, &item, dec!(40))).await.unwrap();

        let edit = InventoryItemPatch {
            name: Some("Renamed".to_string()),
            quantity: Some(dec!(250)),
        }
        .plan(&read)
        .unwrap();
        assert!(matches!(store.update_item(edit).await, Err(StoreError::Conflict(_))));

        let current = store.get_item(item.id).await.unwrap();
        assert_eq!(current.name, "Urea");
        assert_eq!(current.quantity.value(), dec!(60));

        let fresh = InventoryItemPatch {
            name: None,
            quantity: Some(dec!(250)),
        }
        .plan(&current)
        .unwrap();
        assert_eq!(store.update_item(fresh).await.unwrap().quantity.value(), dec!(250));
    }

    #[tokio::test]
    async fn update_of_missing_item_is_not_found() {
        let (store, _, _, item) = seeded().await;
        store.delete_item(item.id).await.unwrap();
        let rename = InventoryItemPatch {
            name: Some("Gone".to_string()),
            quantity: None,
        }
        .plan(&item)
        .unwrap();
        assert_eq!(store.update_item(rename).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn task_filter_and_order() {
        let store = InMemoryFarmStore::new();
        let amina = store.create_user(NewUser::new("amina", None, None).unwrap()).await.unwrap();
        let t1 = store
            .create_task(NewTask::new("Weed", None, Some(amina.id), None, None).unwrap())
            .await
            .unwrap();
        store
            .create_task(NewTask::new("Spray", None, None, None, None).unwrap())
            .await
            .unwrap();
        let t3 = store
            .create_task(NewTask::new("Harvest", None, Some(amina.id), None, None).unwrap())
            .await
            .unwrap();

        let mine = store
            .list_tasks(TaskFilter { assigned_to: Some(amina.id) })
            .await
            .unwrap();
        let ids: Vec<TaskId> = mine.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![t3.id, t1.id]);
        assert_eq!(store.list_tasks(TaskFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = InMemoryFarmStore::new();
        store.create_user(NewUser::new("amina", None, None).unwrap()).await.unwrap();
        let err = store
            .create_user(NewUser::new("amina", None, Some("admin")).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn task_assignee_must_exist() {
        let store = InMemoryFarmStore::new();
        let err = store
            .create_task(NewTask::new("Weed", None, Some(UserId::new(4)), None, None).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
    }
}
