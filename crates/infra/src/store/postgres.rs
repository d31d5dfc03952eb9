//! Postgres-backed farm store.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError         | Scenario                                   |
//! |-----------------------|--------------------|--------------------------------------------|
//! | `23503`               | `MissingReference` | referenced field / user / crop is absent   |
//! | `23505`               | `Conflict`         | duplicate username                         |
//! | `40001`               | `Conflict`         | serialization failure                      |
//! | `23514`               | `Backend`          | check constraint (e.g. negative quantity)  |
//! | any other / non-DB    | `Backend`          | connection failures, decode errors, etc.   |
//!
//! ## Consumption commit
//!
//! `commit_consumption` runs one transaction: a guarded
//! `UPDATE ... WHERE quantity = $observed` followed by the `INSERT`. The row
//! lock taken by the update serialises concurrent writers on the same item;
//! a writer that loses the race sees zero affected rows and gets `Conflict`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::{Span, instrument};

use agrisync_auth::{NewUser, Role, User};
use agrisync_core::{CropId, FieldId, InputUsedId, InventoryItemId, Quantity, TaskId, UserId};
use agrisync_crops::{Consumption, Crop, CropStatus, Field, InputUsed, InputUsedDetail, NewCrop, NewField};
use agrisync_inventory::{BalanceChange, InventoryItem, ItemUpdate, NewInventoryItem};
use agrisync_tasks::{NewTask, Task, TaskStatus};

use super::{
    CropStore, FieldStore, InputLedger, InventoryStore, StoreError, StoreResult, TaskFilter,
    TaskStore, UserStore,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PostgresFarmStore {
    pool: PgPool,
}

impl PostgresFarmStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema (idempotent).
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl FieldStore for PostgresFarmStore {
    #[instrument(skip(self), err)]
    async fn create_field(&self, new: NewField) -> StoreResult<Field> {
        let row = sqlx::query(
            r#"
            INSERT INTO fields (name, location_description)
            VALUES ($1, $2)
            RETURNING id, name, location_description
            "#,
        )
        .bind(&new.name)
        .bind(&new.location_description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_field", e))?;

        decode::<FieldRow, Field>(&row)
    }

    async fn list_fields(&self) -> StoreResult<Vec<Field>> {
        let rows = sqlx::query("SELECT id, name, location_description FROM fields ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_fields", e))?;

        rows.iter().map(decode::<FieldRow, Field>).collect()
    }

    async fn get_field(&self, id: FieldId) -> StoreResult<Field> {
        let row = sqlx::query("SELECT id, name, location_description FROM fields WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_field", e))?
            .ok_or(StoreError::NotFound)?;

        decode::<FieldRow, Field>(&row)
    }

    #[instrument(skip(self), fields(field_id = %id), err)]
    async fn update_field(&self, id: FieldId, new: NewField) -> StoreResult<Field> {
        let row = sqlx::query(
            r#"
            UPDATE fields SET name = $2, location_description = $3
            WHERE id = $1
            RETURNING id, name, location_description
            "#,
        )
        .bind(id.get())
        .bind(&new.name)
        .bind(&new.location_description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_field", e))?
        .ok_or(StoreError::NotFound)?;

        decode::<FieldRow, Field>(&row)
    }

    #[instrument(skip(self), fields(field_id = %id), err)]
    async fn delete_field(&self, id: FieldId) -> StoreResult<()> {
        delete_by_id(&self.pool, "DELETE FROM fields WHERE id = $1", id.get(), "delete_field").await
    }
}

const CROP_COLUMNS: &str = "id, name, field_id, planting_date, expected_harvest_date, status";

#[async_trait::async_trait]
impl CropStore for PostgresFarmStore {
    #[instrument(skip(self), fields(field_id = %new.field_id), err)]
    async fn create_crop(&self, new: NewCrop) -> StoreResult<Crop> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO crops (name, field_id, planting_date, expected_harvest_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CROP_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(new.field_id.get())
        .bind(new.planting_date)
        .bind(new.expected_harvest_date)
        .bind(new.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_crop", e))?;

        decode::<CropRow, Crop>(&row)
    }

    async fn list_crops(&self) -> StoreResult<Vec<Crop>> {
        let rows = sqlx::query(&format!("SELECT {CROP_COLUMNS} FROM crops ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_crops", e))?;

        rows.iter().map(decode::<CropRow, Crop>).collect()
    }

    async fn get_crop(&self, id: CropId) -> StoreResult<Crop> {
        let row = sqlx::query(&format!("SELECT {CROP_COLUMNS} FROM crops WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_crop", e))?
            .ok_or(StoreError::NotFound)?;

        decode::<CropRow, Crop>(&row)
    }

    #[instrument(skip(self), fields(crop_id = %id), err)]
    async fn update_crop(&self, id: CropId, new: NewCrop) -> StoreResult<Crop> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE crops
            SET name = $2, field_id = $3, planting_date = $4, expected_harvest_date = $5, status = $6
            WHERE id = $1
            RETURNING {CROP_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(&new.name)
        .bind(new.field_id.get())
        .bind(new.planting_date)
        .bind(new.expected_harvest_date)
        .bind(new.status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_crop", e))?
        .ok_or(StoreError::NotFound)?;

        decode::<CropRow, Crop>(&row)
    }

    #[instrument(skip(self), fields(crop_id = %id), err)]
    async fn delete_crop(&self, id: CropId) -> StoreResult<()> {
        delete_by_id(&self.pool, "DELETE FROM crops WHERE id = $1", id.get(), "delete_crop").await
    }
}

#[async_trait::async_trait]
impl InventoryStore for PostgresFarmStore {
    #[instrument(skip(self), err)]
    async fn create_item(&self, new: NewInventoryItem) -> StoreResult<InventoryItem> {
        let row = sqlx::query(
            "INSERT INTO inventory_items (name, quantity) VALUES ($1, $2) RETURNING id, name, quantity",
        )
        .bind(&new.name)
        .bind(new.quantity.value())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        decode::<ItemRow, InventoryItem>(&row)
    }

    async fn list_items(&self) -> StoreResult<Vec<InventoryItem>> {
        let rows = sqlx::query("SELECT id, name, quantity FROM inventory_items ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(decode::<ItemRow, InventoryItem>).collect()
    }

    async fn get_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem> {
        let row = sqlx::query("SELECT id, name, quantity FROM inventory_items WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?
            .ok_or(StoreError::NotFound)?;

        decode::<ItemRow, InventoryItem>(&row)
    }

    #[instrument(skip(self), fields(item_id = %update.item_id), err)]
    async fn update_item(&self, update: ItemUpdate) -> StoreResult<InventoryItem> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Absent attributes keep their stored value; a balance edit only
        // matches while the stored balance is the observed one.
        let row = sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = COALESCE($2, name), quantity = COALESCE($4, quantity)
            WHERE id = $1 AND ($3::NUMERIC IS NULL OR quantity = $3)
            RETURNING id, name, quantity
            "#,
        )
        .bind(update.item_id.get())
        .bind(update.name.as_deref())
        .bind(update.balance.map(|c| c.observed.value()))
        .bind(update.balance.map(|c| c.new.value()))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        let item = match row {
            Some(row) => decode::<ItemRow, InventoryItem>(&row)?,
            None => {
                let exists = item_exists(&mut tx, update.item_id).await?;
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(match update.balance {
                    Some(change) if exists => balance_conflict(change),
                    _ => StoreError::NotFound,
                });
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete_item(&self, id: InventoryItemId) -> StoreResult<()> {
        delete_by_id(
            &self.pool,
            "DELETE FROM inventory_items WHERE id = $1",
            id.get(),
            "delete_item",
        )
        .await
    }

    #[instrument(
        skip(self),
        fields(item_id = %change.item_id, observed = %change.observed, new = %change.new),
        err
    )]
    async fn update_balance(&self, change: BalanceChange) -> StoreResult<InventoryItem> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let item = match guarded_decrement(&mut tx, change).await? {
            Some(item) => item,
            None => {
                let exists = item_exists(&mut tx, change.item_id).await?;
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(if exists {
                    balance_conflict(change)
                } else {
                    StoreError::NotFound
                });
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(item)
    }
}

#[async_trait::async_trait]
impl InputLedger for PostgresFarmStore {
    #[instrument(skip(self), fields(crop_id = %crop_id, entry_count = tracing::field::Empty), err)]
    async fn list_inputs_for_crop(&self, crop_id: CropId) -> StoreResult<Vec<InputUsedDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT
                i.id,
                i.crop_id,
                i.inventory_item_id,
                i.amount_used,
                i.date_used,
                it.name AS item_name,
                it.quantity AS item_quantity
            FROM inputs_used i
            LEFT JOIN inventory_items it ON it.id = i.inventory_item_id
            WHERE i.crop_id = $1
            ORDER BY i.date_used DESC, i.id DESC
            "#,
        )
        .bind(crop_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inputs_for_crop", e))?;

        let entries = rows
            .iter()
            .map(decode::<InputRow, InputUsedDetail>)
            .collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("entry_count", entries.len());
        Ok(entries)
    }

    #[instrument(
        skip(self),
        fields(
            crop_id = %consumption.crop_id,
            inventory_item_id = %consumption.inventory_item_id,
            amount_used = %consumption.amount_used
        ),
        err
    )]
    async fn commit_consumption(&self, consumption: Consumption) -> StoreResult<InputUsedDetail> {
        let change = consumption.balance;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let item = match guarded_decrement(&mut tx, change).await? {
            Some(item) => item,
            None => {
                let exists = item_exists(&mut tx, change.item_id).await?;
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(if exists {
                    balance_conflict(change)
                } else {
                    StoreError::MissingReference(format!(
                        "inventory item {} does not exist",
                        change.item_id
                    ))
                });
            }
        };

        let row = sqlx::query(
            r#"
            INSERT INTO inputs_used (crop_id, inventory_item_id, amount_used, date_used)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(consumption.crop_id.get())
        .bind(consumption.inventory_item_id.get())
        .bind(consumption.amount_used.value())
        .bind(consumption.date_used)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // the crop was deleted after it was resolved
            if is_foreign_key_violation(&e) {
                StoreError::NotFound
            } else {
                map_sqlx_error("insert_input", e)
            }
        })?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert_input", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(InputUsedDetail {
            input: InputUsed {
                id: InputUsedId::new(id),
                crop_id: consumption.crop_id,
                inventory_item_id: Some(consumption.inventory_item_id),
                amount_used: consumption.amount_used,
                date_used: consumption.date_used,
            },
            inventory_item: Some(item),
        })
    }
}

const TASK_COLUMNS: &str = "id, title, description, assigned_to, due_date, status, created_at";

#[async_trait::async_trait]
impl TaskStore for PostgresFarmStore {
    #[instrument(skip(self), err)]
    async fn create_task(&self, new: NewTask) -> StoreResult<Task> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tasks (title, description, assigned_to, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.assigned_to.map(|u| u.get()))
        .bind(new.due_date)
        .bind(new.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_task", e))?;

        decode::<TaskRow, Task>(&row)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE ($1::BIGINT IS NULL OR assigned_to = $1)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.assigned_to.map(|u| u.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tasks", e))?;

        rows.iter().map(decode::<TaskRow, Task>).collect()
    }

    async fn get_task(&self, id: TaskId) -> StoreResult<Task> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_task", e))?
            .ok_or(StoreError::NotFound)?;

        decode::<TaskRow, Task>(&row)
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn update_task(&self, id: TaskId, new: NewTask) -> StoreResult<Task> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, assigned_to = $4, due_date = $5, status = $6
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.assigned_to.map(|u| u.get()))
        .bind(new.due_date)
        .bind(new.status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_task", e))?
        .ok_or(StoreError::NotFound)?;

        decode::<TaskRow, Task>(&row)
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        delete_by_id(&self.pool, "DELETE FROM tasks WHERE id = $1", id.get(), "delete_task").await
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresFarmStore {
    #[instrument(skip(self), fields(username = %new.username), err)]
    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, email, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, role
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("username '{}' is already taken", new.username))
            } else {
                map_sqlx_error("create_user", e)
            }
        })?;

        decode::<UserRow, User>(&row)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query("SELECT id, username, email, role FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(decode::<UserRow, User>).collect()
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        let row = sqlx::query("SELECT id, username, email, role FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?
            .ok_or(StoreError::NotFound)?;

        decode::<UserRow, User>(&row)
    }
}

/// `UPDATE ... WHERE quantity = observed`; `None` when no row matched.
async fn guarded_decrement(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    change: BalanceChange,
) -> StoreResult<Option<InventoryItem>> {
    let row = sqlx::query(
        r#"
        UPDATE inventory_items
        SET quantity = $3
        WHERE id = $1 AND quantity = $2
        RETURNING id, name, quantity
        "#,
    )
    .bind(change.item_id.get())
    .bind(change.observed.value())
    .bind(change.new.value())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("update_balance", e))?;

    row.as_ref().map(decode::<ItemRow, InventoryItem>).transpose()
}

async fn item_exists(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: InventoryItemId,
) -> StoreResult<bool> {
    let row = sqlx::query("SELECT 1 FROM inventory_items WHERE id = $1")
        .bind(id.get())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("item_exists", e))?;
    Ok(row.is_some())
}

fn balance_conflict(change: BalanceChange) -> StoreError {
    StoreError::Conflict(format!(
        "balance of item {} changed since it was read (expected {})",
        change.item_id, change.observed
    ))
}

async fn delete_by_id(pool: &PgPool, sql: &'static str, id: i64, operation: &str) -> StoreResult<()> {
    let result = sqlx::query(sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23503") => StoreError::MissingReference(
                    db_err
                        .constraint()
                        .map(|c| format!("referenced record does not exist ({c})"))
                        .unwrap_or(msg),
                ),
                Some("23505") | Some("40001") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some("23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some("23503")
}

/// Decode a row through its row struct into the domain type.
fn decode<R, T>(row: &PgRow) -> StoreResult<T>
where
    R: for<'r> FromRow<'r, PgRow>,
    T: TryFrom<R, Error = StoreError>,
{
    let raw = R::from_row(row).map_err(|e| map_sqlx_error("decode_row", e))?;
    T::try_from(raw)
}

fn corrupt(what: &str, detail: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("stored {what} is invalid: {detail}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

struct FieldRow {
    id: i64,
    name: String,
    location_description: String,
}

impl<'r> FromRow<'r, PgRow> for FieldRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(FieldRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            location_description: row.try_get("location_description")?,
        })
    }
}

impl TryFrom<FieldRow> for Field {
    type Error = StoreError;

    fn try_from(row: FieldRow) -> Result<Self, Self::Error> {
        Ok(Field {
            id: FieldId::new(row.id),
            name: row.name,
            location_description: row.location_description,
        })
    }
}

struct CropRow {
    id: i64,
    name: String,
    field_id: i64,
    planting_date: NaiveDate,
    expected_harvest_date: NaiveDate,
    status: String,
}

impl<'r> FromRow<'r, PgRow> for CropRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CropRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            field_id: row.try_get("field_id")?,
            planting_date: row.try_get("planting_date")?,
            expected_harvest_date: row.try_get("expected_harvest_date")?,
            status: row.try_get("status")?,
        })
    }
}

impl TryFrom<CropRow> for Crop {
    type Error = StoreError;

    fn try_from(row: CropRow) -> Result<Self, Self::Error> {
        Ok(Crop {
            id: CropId::new(row.id),
            name: row.name,
            field_id: FieldId::new(row.field_id),
            planting_date: row.planting_date,
            expected_harvest_date: row.expected_harvest_date,
            status: CropStatus::parse(&row.status).map_err(|e| corrupt("crop status", e))?,
        })
    }
}

struct ItemRow {
    id: i64,
    name: String,
    quantity: Decimal,
}

impl<'r> FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(InventoryItem {
            id: InventoryItemId::new(row.id),
            name: row.name,
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt("quantity", e))?,
        })
    }
}

struct InputRow {
    id: i64,
    crop_id: i64,
    inventory_item_id: Option<i64>,
    amount_used: Decimal,
    date_used: NaiveDate,
    item_name: Option<String>,
    item_quantity: Option<Decimal>,
}

impl<'r> FromRow<'r, PgRow> for InputRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(InputRow {
            id: row.try_get("id")?,
            crop_id: row.try_get("crop_id")?,
            inventory_item_id: row.try_get("inventory_item_id")?,
            amount_used: row.try_get("amount_used")?,
            date_used: row.try_get("date_used")?,
            item_name: row.try_get("item_name")?,
            item_quantity: row.try_get("item_quantity")?,
        })
    }
}

impl TryFrom<InputRow> for InputUsedDetail {
    type Error = StoreError;

    fn try_from(row: InputRow) -> Result<Self, Self::Error> {
        let inventory_item = match (row.inventory_item_id, row.item_name, row.item_quantity) {
            (Some(id), Some(name), Some(quantity)) => Some(InventoryItem::try_from(ItemRow {
                id,
                name,
                quantity,
            })?),
            _ => None,
        };

        Ok(InputUsedDetail {
            input: InputUsed {
                id: InputUsedId::new(row.id),
                crop_id: CropId::new(row.crop_id),
                inventory_item_id: row.inventory_item_id.map(InventoryItemId::new),
                amount_used: Quantity::positive("amount_used", row.amount_used)
                    .map_err(|e| corrupt("amount_used", e))?,
                date_used: row.date_used,
            },
            inventory_item,
        })
    }
}

struct TaskRow {
    id: i64,
    title: String,
    description: String,
    assigned_to: Option<i64>,
    due_date: Option<NaiveDate>,
    status: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TaskRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TaskRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            assigned_to: row.try_get("assigned_to")?,
            due_date: row.try_get("due_date")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: TaskId::new(row.id),
            title: row.title,
            description: row.description,
            assigned_to: row.assigned_to.map(UserId::new),
            due_date: row.due_date,
            status: TaskStatus::parse(&row.status).map_err(|e| corrupt("task status", e))?,
            created_at: row.created_at,
        })
    }
}

struct UserRow {
    id: i64,
    username: String,
    email: String,
    role: String,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            role: Role::assignable(&row.role).map_err(|e| corrupt("role", e))?,
        })
    }
}
