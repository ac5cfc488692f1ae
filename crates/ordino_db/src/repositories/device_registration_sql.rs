//! SQL implementation of the device registration repository

use crate::error::DbError;
use crate::repositories::device_registration::{DeviceRegistration, DeviceRegistrationRepository};
use crate::DbClient;
use chrono::{DateTime, Utc};
use ordino_common::services::{BoxFuture, BoxedError, TokenRegistry};
use ordino_common::token_prefix;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error};

/// SQL implementation of the device registration repository
#[derive(Debug, Clone)]
pub struct SqlDeviceRegistrationRepository {
    /// The database client
    db_client: DbClient,
}

impl SqlDeviceRegistrationRepository {
    /// Create a new SQL device registration repository
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

// Timestamps are stored as RFC 3339 text: the Any driver cannot decode
// DateTime<Utc> directly, and text round-trips identically on SQLite and
// PostgreSQL.
fn timestamp_to_text(ts: Option<DateTime<Utc>>) -> String {
    ts.unwrap_or_else(Utc::now).to_rfc3339()
}

fn text_to_timestamp(row: &AnyRow, column: &str) -> Option<DateTime<Utc>> {
    row.try_get::<String, _>(column)
        .ok()
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_registration(row: &AnyRow) -> DeviceRegistration {
    DeviceRegistration {
        id: row.try_get("id").ok(),
        fcm_token: row.try_get("fcm_token").unwrap_or_default(),
        user_id: row.try_get::<Option<String>, _>("user_id").ok().flatten(),
        platform: row.try_get::<Option<String>, _>("platform").ok().flatten(),
        created_at: text_to_timestamp(row, "created_at"),
        updated_at: text_to_timestamp(row, "updated_at"),
    }
}

impl DeviceRegistrationRepository for SqlDeviceRegistrationRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing device registration schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fcm_token TEXT NOT NULL UNIQUE,
                user_id TEXT,
                platform TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;

        self.db_client.execute(query).await?;
        Ok(())
    }

    async fn register_device(
        &self,
        registration: DeviceRegistration,
    ) -> Result<DeviceRegistration, DbError> {
        debug!(
            "Registering device token: {}...",
            token_prefix(&registration.fcm_token)
        );

        // Upsert keyed on the token. created_at survives a conflict, so a
        // refreshed token keeps its original registration time.
        let query = r#"
            INSERT INTO devices (fcm_token, user_id, platform, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (fcm_token) DO UPDATE SET
                user_id = excluded.user_id,
                platform = excluded.platform,
                updated_at = excluded.updated_at
            RETURNING id, fcm_token, user_id, platform, created_at, updated_at
        "#;

        let row = sqlx::query(query)
            .bind(&registration.fcm_token)
            .bind(&registration.user_id)
            .bind(&registration.platform)
            .bind(timestamp_to_text(registration.created_at))
            .bind(timestamp_to_text(registration.updated_at))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to upsert device registration: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(row_to_registration(&row))
    }

    async fn remove_token(&self, token: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM devices WHERE fcm_token = $1")
            .bind(token)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to delete device registration: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<DeviceRegistration>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, fcm_token, user_id, platform, created_at, updated_at
            FROM devices
            WHERE fcm_token = $1
        "#,
        )
        .bind(token)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(row.as_ref().map(row_to_registration))
    }

    async fn find_all(&self) -> Result<Vec<DeviceRegistration>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, fcm_token, user_id, platform, created_at, updated_at
            FROM devices
            ORDER BY id
        "#,
        )
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(rows.iter().map(row_to_registration).collect())
    }
}

// The dispatcher and the client listener reach the registry through the
// TokenRegistry seam; this is the durable implementation of it.
impl TokenRegistry for SqlDeviceRegistrationRepository {
    type Error = BoxedError;

    fn register(
        &self,
        registration: DeviceRegistration,
    ) -> BoxFuture<'_, DeviceRegistration, Self::Error> {
        Box::pin(async move {
            self.register_device(registration)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn remove(&self, token: &str) -> BoxFuture<'_, bool, Self::Error> {
        let token = token.to_string();
        Box::pin(async move {
            self.remove_token(&token)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn list_all(&self) -> BoxFuture<'_, Vec<DeviceRegistration>, Self::Error> {
        Box::pin(async move {
            self.find_all()
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}
