use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use solicitud_contract::{Folio, Submission};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use tracing::info;

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl StorageConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connectivity(#[source] sqlx::Error),
    #[error("invalid database configuration: {0}")]
    Config(#[source] sqlx::Error),
    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),
    #[error("stored folio {0} is not a six-digit number")]
    InvalidFolio(i64),
}

impl StoreError {
    /// Timeouts and socket-level failures: the caller may retry later.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Connectivity(error),
            sqlx::Error::Configuration(_) => StoreError::Config(error),
            other => StoreError::Query(other),
        }
    }
}

/// Row about to be written to `Solicitudes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub nombre: String,
    pub email: String,
    pub foto1: String,
    pub identificacion: String,
    pub acta_nacimiento: String,
    pub oficio_solicitud: String,
    pub folio: Folio,
}

impl NewSubmission {
    pub fn from_submission(submission: &Submission, folio: Folio) -> Self {
        let path = |doc: &solicitud_contract::StagedDocument| doc.path.to_string_lossy().into_owned();
        Self {
            nombre: submission.applicant.nombre.clone(),
            email: submission.applicant.email.clone(),
            foto1: path(&submission.selfie),
            identificacion: path(&submission.identificacion),
            acta_nacimiento: path(&submission.acta_nacimiento),
            oficio_solicitud: path(&submission.oficio_solicitud),
            folio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub nombre: String,
    pub email: String,
    pub foto1: String,
    pub identificacion: String,
    pub acta_nacimiento: String,
    pub oficio_solicitud: String,
    pub folio: Folio,
    pub registered_at: String,
}

impl SubmissionRecord {
    pub fn from_new(id: i64, row: &NewSubmission, registered_at: String) -> Self {
        Self {
            id,
            nombre: row.nombre.clone(),
            email: row.email.clone(),
            foto1: row.foto1.clone(),
            identificacion: row.identificacion.clone(),
            acta_nacimiento: row.acta_nacimiento.clone(),
            oficio_solicitud: row.oficio_solicitud.clone(),
            folio: row.folio,
            registered_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: i64,
    nombre: String,
    email: String,
    foto1: String,
    identificacion: String,
    acta_nacimiento: String,
    oficio_solicitud: String,
    folio: i64,
    registered_at: String,
}

impl TryFrom<SubmissionRow> for SubmissionRecord {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let folio = u32::try_from(row.folio)
            .ok()
            .and_then(|raw| Folio::new(raw).ok())
            .ok_or(StoreError::InvalidFolio(row.folio))?;
        Ok(Self {
            id: row.id,
            nombre: row.nombre,
            email: row.email,
            foto1: row.foto1,
            identificacion: row.identificacion,
            acta_nacimiento: row.acta_nacimiento,
            oficio_solicitud: row.oficio_solicitud,
            folio,
            registered_at: row.registered_at,
        })
    }
}

/// Persistence seam used by the submission handler.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Round-trips to the database without touching any table.
    async fn check_connection(&self) -> Result<(), StoreError>;

    async fn insert_submission(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, StoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteSubmissionStore {
    pool: SqlitePool,
}

impl SqliteSubmissionStore {
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        let uri = normalize_sqlite_uri(&config.database_url);
        let options = SqliteConnectOptions::from_str(&uri)
            .map_err(StoreError::Config)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA_SQL.split(';') {
            let sql = statement.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql).execute(&self.pool).await?;
        }
        info!("Solicitudes schema ready");
        Ok(())
    }

    pub async fn find_by_folio(&self, folio: Folio) -> Result<Vec<SubmissionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            "SELECT Id AS id, Nombre AS nombre, Email AS email, Foto1 AS foto1, Identificacion AS identificacion, ActaNacimiento AS acta_nacimiento, OficioSolicitud AS oficio_solicitud, Folio AS folio, FechaRegistro AS registered_at FROM Solicitudes WHERE Folio = ? ORDER BY Id ASC",
        )
        .bind(i64::from(folio.get()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SubmissionRecord::try_from).collect()
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM Solicitudes")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

#[async_trait]
impl SubmissionStore for SqliteSubmissionStore {
    async fn check_connection(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_submission(
        &self,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, StoreError> {
        let registered_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO Solicitudes (Nombre, Email, Foto1, Identificacion, ActaNacimiento, OficioSolicitud, Folio, FechaRegistro) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.nombre)
        .bind(&submission.email)
        .bind(&submission.foto1)
        .bind(&submission.identificacion)
        .bind(&submission.acta_nacimiento)
        .bind(&submission.oficio_solicitud)
        .bind(i64::from(submission.folio.get()))
        .bind(&registered_at)
        .execute(&self.pool)
        .await?;

        Ok(SubmissionRecord::from_new(
            result.last_insert_rowid(),
            submission,
            registered_at,
        ))
    }
}

fn normalize_sqlite_uri(raw: &str) -> String {
    if raw.starts_with("sqlite:") {
        raw.to_string()
    } else {
        format!("sqlite://{raw}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(folio: u32, nombre: &str) -> NewSubmission {
        NewSubmission {
            nombre: nombre.to_string(),
            email: "ana@example.com".to_string(),
            foto1: "uploads/a".to_string(),
            identificacion: "uploads/b".to_string(),
            acta_nacimiento: "uploads/c".to_string(),
            oficio_solicitud: "uploads/d".to_string(),
            folio: Folio::new(folio).expect("folio"),
        }
    }

    async fn temp_store(dir: &tempfile::TempDir) -> SqliteSubmissionStore {
        let path = dir.path().join("solicitudes.db");
        SqliteSubmissionStore::connect(&StorageConfig::new(path.to_string_lossy()))
            .await
            .expect("connect")
    }

    #[tokio::test]
    async fn insert_then_lookup_by_folio() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = temp_store(&dir).await;

        store.check_connection().await.expect("ping");
        let record = store
            .insert_submission(&row(654_321, "Ana"))
            .await
            .expect("insert");
        assert_eq!(record.folio.get(), 654_321);
        assert!(record.id > 0);

        let found = store
            .find_by_folio(record.folio)
            .await
            .expect("lookup");
        assert_eq!(found, vec![record]);
        assert_eq!(store.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn values_are_bound_not_interpolated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = temp_store(&dir).await;

        let hostile = "O'Brien'); DROP TABLE Solicitudes; --";
        store
            .insert_submission(&row(111_111, hostile))
            .await
            .expect("insert");

        let found = store
            .find_by_folio(Folio::new(111_111).expect("folio"))
            .await
            .expect("lookup");
        assert_eq!(found[0].nombre, hostile);
        assert_eq!(store.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn duplicate_folios_are_not_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = temp_store(&dir).await;

        store.insert_submission(&row(222_222, "Ana")).await.expect("first");
        store.insert_submission(&row(222_222, "Luis")).await.expect("second");

        let found = store
            .find_by_folio(Folio::new(222_222).expect("folio"))
            .await
            .expect("lookup");
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = temp_store(&dir).await;
        store.migrate().await.expect("second migrate");
        assert_eq!(store.count().await.expect("count"), 0);
    }

    #[test]
    fn pool_failures_classify_as_connectivity() {
        assert!(StoreError::from(sqlx::Error::PoolTimedOut).is_connectivity());
        assert!(StoreError::from(sqlx::Error::PoolClosed).is_connectivity());
        assert!(StoreError::from(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused"
        )))
        .is_connectivity());
        assert!(!StoreError::from(sqlx::Error::RowNotFound).is_connectivity());
    }

    fn stored_row(folio: i64) -> SubmissionRow {
        SubmissionRow {
            id: 1,
            nombre: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            foto1: "uploads/a".to_string(),
            identificacion: "uploads/b".to_string(),
            acta_nacimiento: "uploads/c".to_string(),
            oficio_solicitud: "uploads/d".to_string(),
            folio,
            registered_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn out_of_range_stored_folio_keeps_its_value() {
        for bad in [5_000_000_000_i64, -7, 42] {
            let err = SubmissionRecord::try_from(stored_row(bad)).expect_err("invalid folio");
            assert!(matches!(err, StoreError::InvalidFolio(value) if value == bad));
            assert!(err.to_string().contains(&bad.to_string()));
        }

        let record = SubmissionRecord::try_from(stored_row(654_321)).expect("valid row");
        assert_eq!(record.folio.get(), 654_321);
    }

    #[test]
    fn sqlite_uri_is_normalized() {
        assert_eq!(normalize_sqlite_uri("data/app.db"), "sqlite://data/app.db");
        assert_eq!(normalize_sqlite_uri("sqlite::memory:"), "sqlite::memory:");
    }
}
