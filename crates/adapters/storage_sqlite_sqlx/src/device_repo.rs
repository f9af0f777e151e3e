//! `SQLite` implementation of [`DeviceRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use scenehub_app::ports::DeviceRepository;
use scenehub_domain::device::Device;
use scenehub_domain::error::HubError;
use scenehub_domain::id::DeviceId;

use crate::error::StorageError;

struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let device_type: String = row.try_get("device_type")?;
        let config_json: Option<String> = row.try_get("config")?;
        let created_at: String = row.try_get("created_at")?;

        let config = config_json
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.to_utc())
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Device {
            id: DeviceId::new(id),
            name,
            device_type,
            config,
            created_at,
        }))
    }
}

/// `SQLite`-backed device repository.
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    async fn get_all(&self) -> Result<Vec<Device>, HubError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM devices ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_by_id(&self, id: &DeviceId) -> Result<Option<Device>, HubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM devices WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn save(&self, device: Device) -> Result<Device, HubError> {
        let config_json = device
            .config
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::from)?;

        sqlx::query(
            "INSERT INTO devices (id, name, device_type, config, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 device_type = excluded.device_type,
                 config = excluded.config",
        )
        .bind(device.id.as_str())
        .bind(&device.name)
        .bind(&device.device_type)
        .bind(&config_json)
        .bind(device.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(device)
    }

    async fn delete(&self, id: &DeviceId) -> Result<bool, HubError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
