//! `SQLite` implementation of [`SceneRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use scenehub_app::ports::SceneRepository;
use scenehub_domain::error::HubError;
use scenehub_domain::id::SceneId;
use scenehub_domain::scene::{Scene, SceneDefinition};

use crate::error::StorageError;

struct Wrapper(Scene);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Scene> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let description: Option<String> = row.try_get("description")?;
        let definition_json: String = row.try_get("definition")?;
        let is_active: bool = row.try_get("is_active")?;
        let created_at: String = row.try_get("created_at")?;

        let definition: SceneDefinition = serde_json::from_str(&definition_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.to_utc())
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Scene {
            id: SceneId::new(id),
            name,
            description,
            definition,
            is_active,
            created_at,
        }))
    }
}

/// `SQLite`-backed scene repository.
pub struct SqliteSceneRepository {
    pool: SqlitePool,
}

impl SqliteSceneRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl SceneRepository for SqliteSceneRepository {
    async fn get_all(&self, active_only: bool) -> Result<Vec<Scene>, HubError> {
        let query = if active_only {
            "SELECT * FROM scenes WHERE is_active = 1 ORDER BY name"
        } else {
            "SELECT * FROM scenes ORDER BY name"
        };
        let rows: Vec<Wrapper> = sqlx::query_as(query)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_by_id(&self, id: &SceneId) -> Result<Option<Scene>, HubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM scenes WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn save(&self, scene: Scene) -> Result<Scene, HubError> {
        let definition_json =
            serde_json::to_string(&scene.definition).map_err(StorageError::from)?;

        sqlx::query(
            "INSERT INTO scenes (id, name, description, definition, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 description = excluded.description,
                 definition = excluded.definition,
                 is_active = excluded.is_active",
        )
        .bind(scene.id.as_str())
        .bind(&scene.name)
        .bind(&scene.description)
        .bind(&definition_json)
        .bind(scene.is_active)
        .bind(scene.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(scene)
    }

    async fn set_active(&self, id: &SceneId, is_active: bool) -> Result<(), HubError> {
        sqlx::query("UPDATE scenes SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn delete(&self, id: &SceneId) -> Result<bool, HubError> {
        let result = sqlx::query("DELETE FROM scenes WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteSceneRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteSceneRepository::new(db.pool().clone())
    }

    fn scene(id: &str, is_active: bool) -> Scene {
        Scene {
            id: SceneId::new(id),
            name: format!("scene {id}"),
            description: Some("turn the lights on".to_string()),
            definition: SceneDefinition::parse(serde_json::json!({
                "triggers": [{"type": "time", "cron": "0 18 * * *"}],
                "conditions": {
                    "operator": "and",
                    "items": [
                        {
                            "type": "device_state",
                            "device_id": "light_sensor_01",
                            "condition": {"operator": "lt", "attribute": "brightness", "value": 50}
                        }
                    ]
                },
                "actions": [
                    {"type": "device_control", "device_id": "light_01", "command": {"state": "on"}}
                ]
            }))
            .unwrap(),
            is_active,
            created_at: scenehub_domain::time::now(),
        }
    }

    #[tokio::test]
    async fn should_save_and_load_scene_with_full_definition() {
        let repo = setup().await;
        let stored = scene("scene_001", true);
        repo.save(stored.clone()).await.unwrap();

        let loaded = repo
            .get_by_id(&SceneId::new("scene_001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.name, stored.name);
        assert_eq!(loaded.definition, stored.definition);
        assert!(loaded.is_active);
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_scene() {
        let repo = setup().await;
        let loaded = repo.get_by_id(&SceneId::new("ghost")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn should_replace_scene_on_conflicting_save() {
        let repo = setup().await;
        let mut stored = scene("scene_001", true);
        repo.save(stored.clone()).await.unwrap();

        stored.name = "renamed".to_string();
        repo.save(stored).await.unwrap();

        let all = repo.get_all(false).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "renamed");
    }

    #[tokio::test]
    async fn should_filter_by_activation_when_requested() {
        let repo = setup().await;
        repo.save(scene("scene_001", true)).await.unwrap();
        repo.save(scene("scene_002", false)).await.unwrap();

        let active = repo.get_all(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, SceneId::new("scene_001"));

        let all = repo.get_all(false).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn should_update_activation_flag() {
        let repo = setup().await;
        repo.save(scene("scene_001", true)).await.unwrap();

        repo.set_active(&SceneId::new("scene_001"), false)
            .await
            .unwrap();
        let loaded = repo
            .get_by_id(&SceneId::new("scene_001"))
            .await
            .unwrap()
            .unwrap();
        assert!(!loaded.is_active);
    }

    #[tokio::test]
    async fn should_report_deletion_of_unknown_scene_as_false() {
        let repo = setup().await;
        repo.save(scene("scene_001", true)).await.unwrap();

        assert!(repo.delete(&SceneId::new("scene_001")).await.unwrap());
        assert!(!repo.delete(&SceneId::new("scene_001")).await.unwrap());
    }
}
