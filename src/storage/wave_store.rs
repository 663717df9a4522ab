//! Wave storage.
//!
//! Provides the [`WaveRepository`] contract and its SQLite implementation,
//! [`WaveStore`]. Every statement binds user-supplied values as parameters.

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

use crate::storage::StorageError;
use crate::storage::db::SqlitePool;
use crate::storage::types::{Wave, format_wave_date, parse_wave_date};

// =============================================================================
// Repository Contract
// =============================================================================

/// Data access contract for waves.
///
/// A missing row is reported as `Ok(None)` on reads and as
/// [`StorageError::NotFound`] on updates.
#[async_trait]
pub trait WaveRepository: Send + Sync + 'static {
    /// Ids of every stored wave, in no particular order.
    async fn list_ids(&self) -> Result<Vec<Uuid>, StorageError>;

    /// Fetch a wave by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Wave>, StorageError>;

    /// Insert a new wave and return it as stored, with the date truncated
    /// to whole seconds.
    ///
    /// # Errors
    /// - [`StorageError::Conflict`] if the id is already stored
    /// - [`StorageError::InvalidOperation`] if the name is empty
    async fn create(&self, wave: &Wave) -> Result<Wave, StorageError>;

    /// Replace name and date of an existing wave and return it as stored.
    ///
    /// # Errors
    /// [`StorageError::NotFound`] if no row has `wave.id`.
    async fn update(&self, wave: &Wave) -> Result<Wave, StorageError>;

    /// Whether a wave with this id is stored.
    async fn exists(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Every stored wave, in no particular order.
    ///
    /// The default body lists ids and fetches each one, silently skipping ids
    /// that no longer resolve. Implementations with a bulk query should
    /// override it.
    async fn list_all(&self) -> Result<Vec<Wave>, StorageError> {
        let ids = self.list_ids().await?;
        let mut waves = Vec::with_capacity(ids.len());

        for id in ids {
            match self.get_by_id(id).await? {
                Some(wave) => waves.push(wave),
                None => tracing::warn!(%id, "Wave disappeared between listing and fetch, skipping"),
            }
        }

        Ok(waves)
    }
}

// =============================================================================
// SQLite Store
// =============================================================================

/// SQLite-backed wave repository.
///
/// Each operation acquires its own pooled connection and returns it when the
/// guard drops, on success and on error alike.
#[derive(Clone, Debug)]
pub struct WaveStore {
    pool: SqlitePool,
}

impl WaveStore {
    /// Create a new wave store on an initialized pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|e| StorageError::InvalidData(format!("wave id '{raw}': {e}")))
}

fn wave_from_row(row: &SqliteRow) -> Result<Wave, StorageError> {
    let id: String = row.try_get("id")?;
    let name: Option<String> = row.try_get("name")?;
    let date: Option<String> = row.try_get("wavedate")?;

    let id = parse_id(&id)?;
    let date = date.unwrap_or_default();
    let wave_date = parse_wave_date(&date).ok_or_else(|| {
        StorageError::InvalidData(format!("wave {id}: unparseable wavedate '{date}'"))
    })?;

    Ok(Wave {
        id,
        name: name.unwrap_or_default(),
        wave_date,
    })
}

#[async_trait]
impl WaveRepository for WaveStore {
    async fn list_ids(&self) -> Result<Vec<Uuid>, StorageError> {
        let mut conn = self.pool.inner().acquire().await?;

        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM waves")
            .fetch_all(&mut *conn)
            .await?;

        rows.iter().map(|(id,)| parse_id(id)).collect()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Wave>, StorageError> {
        let mut conn = self.pool.inner().acquire().await?;

        let row = sqlx::query("SELECT id, name, wavedate FROM waves WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

        row.as_ref().map(wave_from_row).transpose()
    }

    async fn create(&self, wave: &Wave) -> Result<Wave, StorageError> {
        if wave.name.is_empty() {
            return Err(StorageError::InvalidOperation(format!(
                "wave {} has no name",
                wave.id
            )));
        }

        let wave = Wave::new(wave.id, wave.name.as_str(), wave.wave_date);
        let mut conn = self.pool.inner().acquire().await?;

        sqlx::query("INSERT INTO waves (id, name, wavedate) VALUES (?1, ?2, ?3)")
            .bind(wave.id.to_string())
            .bind(wave.name.as_str())
            .bind(format_wave_date(&wave.wave_date))
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::from_insert(e, wave.id))?;

        tracing::debug!(id = %wave.id, "Inserted wave");
        Ok(wave)
    }

    async fn update(&self, wave: &Wave) -> Result<Wave, StorageError> {
        let wave = Wave::new(wave.id, wave.name.as_str(), wave.wave_date);
        let mut conn = self.pool.inner().acquire().await?;

        let result = sqlx::query("UPDATE waves SET name = ?1, wavedate = ?2 WHERE id = ?3")
            .bind(wave.name.as_str())
            .bind(format_wave_date(&wave.wave_date))
            .bind(wave.id.to_string())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(wave.id));
        }

        tracing::debug!(id = %wave.id, "Updated wave");
        Ok(wave)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut conn = self.pool.inner().acquire().await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM waves WHERE id = ?1")
            .bind(id.to_string())
            .fetch_one(&mut *conn)
            .await?;

        Ok(count > 0)
    }

    async fn list_all(&self) -> Result<Vec<Wave>, StorageError> {
        let mut conn = self.pool.inner().acquire().await?;

        let rows = sqlx::query("SELECT id, name, wavedate FROM waves")
            .fetch_all(&mut *conn)
            .await?;

        rows.iter().map(wave_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::init_schema;
    use crate::storage::types::{WAVE_DATE_FORMAT, truncate_to_seconds};
    use chrono::{Duration, Local, NaiveDateTime, Timelike};
    use tempfile::{TempDir, tempdir};

    async fn create_test_store() -> (WaveStore, SqlitePool, TempDir) {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("waves_test.db").display());
        let pool = SqlitePool::connect(&url).await.unwrap();
        init_schema(&pool).await.unwrap();

        // Return dir to keep the database file alive
        (WaveStore::new(pool.clone()), pool, dir)
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    async fn insert_raw(pool: &SqlitePool, id: &str, name: &str, date: &str) {
        sqlx::query("INSERT INTO waves (id, name, wavedate) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(name)
            .bind(date)
            .execute(pool.inner())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_ids_empty() {
        let (store, _pool, _dir) = create_test_store().await;
        assert!(store.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_ids_returns_all_rows() {
        let (store, pool, _dir) = create_test_store().await;
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        for (i, id) in ids.iter().enumerate() {
            let date = format_wave_date(&(now() - Duration::days(i as i64)));
            insert_raw(&pool, &id.to_string(), &format!("Wave {}", i + 1), &date).await;
        }

        let listed = store.list_ids().await.unwrap();
        assert_eq!(listed.len(), 3);
        for id in ids {
            assert!(listed.contains(&id));
        }
    }

    #[tokio::test]
    async fn test_get_by_id_existing() {
        let (store, pool, _dir) = create_test_store().await;
        let id = Uuid::new_v4();
        let date = now() - Duration::days(3);
        insert_raw(&pool, &id.to_string(), "Test Wave", &format_wave_date(&date)).await;

        let wave = store.get_by_id(id).await.unwrap().expect("wave should exist");
        assert_eq!(wave.id, id);
        assert_eq!(wave.name, "Test Wave");
        assert_eq!(wave.wave_date.date(), date.date());
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_none() {
        let (store, _pool, _dir) = create_test_store().await;
        assert!(store.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_roundtrip() {
        let (store, _pool, _dir) = create_test_store().await;
        let wave = Wave::with_random_id("New Wave", now());

        let created = store.create(&wave).await.unwrap();
        assert_eq!(created, wave);

        let fetched = store.get_by_id(wave.id).await.unwrap();
        assert_eq!(fetched, Some(wave));
    }

    #[tokio::test]
    async fn test_create_persists_fixed_date_layout() {
        let (store, pool, _dir) = create_test_store().await;
        let date = NaiveDateTime::parse_from_str("2023-07-14 09:05:03", WAVE_DATE_FORMAT).unwrap();
        let wave = Wave::with_random_id("Layout", date);
        store.create(&wave).await.unwrap();

        let (raw,): (String,) = sqlx::query_as("SELECT wavedate FROM waves WHERE id = ?1")
            .bind(wave.id.to_string())
            .fetch_one(pool.inner())
            .await
            .unwrap();
        assert_eq!(raw, "2023-07-14 09:05:03");
    }

    #[tokio::test]
    async fn test_create_empty_name_is_invalid_operation() {
        let (store, _pool, _dir) = create_test_store().await;
        let wave = Wave::with_random_id("", now());

        let err = store.create(&wave).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidOperation(_)));
        assert!(!store.exists(wave.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let (store, _pool, _dir) = create_test_store().await;
        let wave = Wave::with_random_id("First", now());
        store.create(&wave).await.unwrap();

        let dup = Wave::new(wave.id, "Second", now());
        let err = store.create(&dup).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(id) if id == wave.id));

        let kept = store.get_by_id(wave.id).await.unwrap().unwrap();
        assert_eq!(kept.name, "First");
    }

    #[tokio::test]
    async fn test_create_multiple() {
        let (store, _pool, _dir) = create_test_store().await;
        for name in ["Wave 1", "Wave 2", "Wave 3"] {
            store.create(&Wave::with_random_id(name, now())).await.unwrap();
        }
        assert_eq!(store.list_ids().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_existing() {
        let (store, _pool, _dir) = create_test_store().await;
        let mut wave = Wave::with_random_id("Original Name", now());
        store.create(&wave).await.unwrap();

        wave.name = "Updated Name".to_string();
        wave.wave_date = truncate_to_seconds(now() + Duration::days(1));
        let updated = store.update(&wave).await.unwrap();
        assert_eq!(updated.name, "Updated Name");

        let fetched = store.get_by_id(wave.id).await.unwrap().unwrap();
        assert_eq!(fetched, wave);
    }

    #[tokio::test]
    async fn test_struct_literal_subseconds_roundtrip() {
        let (store, _pool, _dir) = create_test_store().await;
        let precise = NaiveDateTime::parse_from_str("2024-03-01 10:20:30", WAVE_DATE_FORMAT)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        let wave = Wave {
            id: Uuid::new_v4(),
            name: "Precise".to_string(),
            wave_date: precise,
        };

        let created = store.create(&wave).await.unwrap();
        assert_eq!(created.wave_date, truncate_to_seconds(precise));
        assert_eq!(store.get_by_id(wave.id).await.unwrap(), Some(created));

        let renamed = Wave {
            name: "Precise again".to_string(),
            ..wave
        };
        let updated = store.update(&renamed).await.unwrap();
        assert_eq!(updated.wave_date.nanosecond(), 0);
        assert_eq!(store.get_by_id(renamed.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (store, _pool, _dir) = create_test_store().await;
        let wave = Wave::with_random_id("Nonexistent Wave", now());

        let err = store.update(&wave).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(id) if id == wave.id));
    }

    #[tokio::test]
    async fn test_update_with_sql_in_name() {
        let (store, _pool, _dir) = create_test_store().await;
        let mut wave = Wave::with_random_id("Original", now());
        store.create(&wave).await.unwrap();

        wave.name = "Updated'; DROP TABLE waves;--".to_string();
        let updated = store.update(&wave).await.unwrap();
        assert_eq!(updated.name, wave.name);

        let fetched = store.get_by_id(wave.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, wave.name);
    }

    #[tokio::test]
    async fn test_create_with_sql_in_name() {
        let (store, _pool, _dir) = create_test_store().await;
        let wave = Wave::with_random_id("Robert'); DROP TABLE waves;--", now());
        store.create(&wave).await.unwrap();

        let fetched = store.get_by_id(wave.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Robert'); DROP TABLE waves;--");
        assert_eq!(store.list_ids().await.unwrap(), vec![wave.id]);
    }

    #[tokio::test]
    async fn test_exists() {
        let (store, _pool, _dir) = create_test_store().await;
        let wave = Wave::with_random_id("Test Wave", now());
        assert!(!store.exists(wave.id).await.unwrap());

        store.create(&wave).await.unwrap();
        assert!(store.exists(wave.id).await.unwrap());
        assert!(!store.exists(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_all_bulk() {
        let (store, _pool, _dir) = create_test_store().await;
        let a = Wave::with_random_id("Wave1", now());
        let b = Wave::with_random_id("Wave2", now() - Duration::hours(5));
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&a));
        assert!(all.contains(&b));
    }

    #[tokio::test]
    async fn test_rows_written_elsewhere() {
        let (store, pool, _dir) = create_test_store().await;
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO waves (id, name, wavedate) VALUES (?1, NULL, '2022-02-02')")
            .bind(id.to_string())
            .execute(pool.inner())
            .await
            .unwrap();

        let wave = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(wave.name, "");
        assert_eq!(format_wave_date(&wave.wave_date), "2022-02-02 00:00:00");
    }

    #[tokio::test]
    async fn test_corrupt_date_is_invalid_data() {
        let (store, pool, _dir) = create_test_store().await;
        let id = Uuid::new_v4();
        insert_raw(&pool, &id.to_string(), "Broken", "sometime").await;

        let err = store.get_by_id(id).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }
}
