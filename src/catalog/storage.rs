/// SQLite persistence for connectors and the action catalog
///
/// The catalog is append-only: seeding upserts the built-in definitions and
/// nothing mutates entries afterwards. Connector rows only change through the
/// explicit connect/disconnect operations.

use chrono::Utc;
use sqlx::{sqlite::SqlitePool, Row};

use crate::catalog::types::{
    ActionCatalogEntry, ActionExamples, ActionType, Connector, ConnectorStatus,
};
use crate::error::WorkflowError;

/// SQLite-backed catalog and connector store
#[derive(Debug, Clone)]
pub struct CatalogStorage {
    pool: SqlitePool,
}

impl CatalogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the connector and catalog tables
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<(), WorkflowError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS connectors (
                key TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'not_connected',
                connected_at TEXT,
                disconnected_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS action_catalog (
                key TEXT PRIMARY KEY,
                connector_key TEXT NOT NULL REFERENCES connectors(key),
                type TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                input_contract JSON,
                output_contract JSON,
                examples JSON,
                seq INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert the built-in connectors and catalog entries
    ///
    /// Idempotent; existing connector status and timestamps are preserved so a
    /// restart does not reset connections.
    pub async fn seed_builtin(&self) -> Result<(), WorkflowError> {
        for (key, name) in crate::catalog::seed::builtin_connectors() {
            sqlx::query(
                r#"
                INSERT INTO connectors (key, name)
                VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET name = excluded.name
                "#,
            )
            .bind(key)
            .bind(name)
            .execute(&self.pool)
            .await?;
        }

        for (seq, entry) in crate::catalog::seed::builtin_actions().into_iter().enumerate() {
            let input = entry
                .input_contract
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            let output = entry
                .output_contract
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            let examples = entry
                .examples
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            sqlx::query(
                r#"
                INSERT INTO action_catalog
                    (key, connector_key, type, title, description,
                     input_contract, output_contract, examples, seq)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    connector_key = excluded.connector_key,
                    type = excluded.type,
                    title = excluded.title,
                    description = excluded.description,
                    input_contract = excluded.input_contract,
                    output_contract = excluded.output_contract,
                    examples = excluded.examples,
                    seq = excluded.seq
                "#,
            )
            .bind(&entry.key)
            .bind(&entry.connector_key)
            .bind(entry.action_type.as_str())
            .bind(&entry.title)
            .bind(&entry.description)
            .bind(input)
            .bind(output)
            .bind(examples)
            .bind(seq as i64)
            .execute(&self.pool)
            .await?;
        }

        tracing::info!("Seeded action catalog");
        Ok(())
    }

    /// Load all catalog entries in stable seed order
    pub async fn load_all_entries(&self) -> Result<Vec<ActionCatalogEntry>, WorkflowError> {
        let rows = sqlx::query(
            r#"
            SELECT key, connector_key, type, title, description,
                   input_contract, output_contract, examples
            FROM action_catalog
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(Self::entry_from_row(&row)?);
        }
        Ok(entries)
    }

    /// Look up a single catalog entry by key
    pub async fn find_by_key(&self, key: &str) -> Result<Option<ActionCatalogEntry>, WorkflowError> {
        let row = sqlx::query(
            r#"
            SELECT key, connector_key, type, title, description,
                   input_contract, output_contract, examples
            FROM action_catalog
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::entry_from_row(&r)).transpose()
    }

    fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ActionCatalogEntry, WorkflowError> {
        let type_str: String = row.get("type");
        let action_type = ActionType::parse(&type_str).ok_or_else(|| {
            WorkflowError::NotFound(format!("unknown catalog action type: {type_str}"))
        })?;

        let input_contract: Option<String> = row.get("input_contract");
        let output_contract: Option<String> = row.get("output_contract");
        let examples: Option<String> = row.get("examples");

        Ok(ActionCatalogEntry {
            key: row.get("key"),
            connector_key: row.get("connector_key"),
            action_type,
            title: row.get("title"),
            description: row.get("description"),
            input_contract: input_contract.map(|s| serde_json::from_str(&s)).transpose()?,
            output_contract: output_contract.map(|s| serde_json::from_str(&s)).transpose()?,
            examples: examples
                .map(|s| serde_json::from_str::<ActionExamples>(&s))
                .transpose()?,
        })
    }

    /// List all connectors in key order
    pub async fn list_connectors(&self) -> Result<Vec<Connector>, WorkflowError> {
        let rows = sqlx::query(
            "SELECT key, name, status, connected_at, disconnected_at FROM connectors ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut connectors = Vec::with_capacity(rows.len());
        for row in rows {
            connectors.push(Self::connector_from_row(&row)?);
        }
        Ok(connectors)
    }

    /// Mark a connector connected, stamping connected_at
    pub async fn connect_connector(&self, key: &str) -> Result<Connector, WorkflowError> {
        let result = sqlx::query(
            r#"
            UPDATE connectors
            SET status = 'connected', connected_at = ?, disconnected_at = NULL
            WHERE key = ?
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WorkflowError::NotFound(format!("Connector not found: {key}")));
        }
        self.get_connector(key).await
    }

    /// Mark a connector disconnected, stamping disconnected_at
    pub async fn disconnect_connector(&self, key: &str) -> Result<Connector, WorkflowError> {
        let result = sqlx::query(
            r#"
            UPDATE connectors
            SET status = 'not_connected', disconnected_at = ?
            WHERE key = ?
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(key)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WorkflowError::NotFound(format!("Connector not found: {key}")));
        }
        self.get_connector(key).await
    }

    async fn get_connector(&self, key: &str) -> Result<Connector, WorkflowError> {
        let row = sqlx::query(
            "SELECT key, name, status, connected_at, disconnected_at FROM connectors WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WorkflowError::NotFound(format!("Connector not found: {key}")))?;

        Self::connector_from_row(&row)
    }

    fn connector_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Connector, WorkflowError> {
        let status_str: String = row.get("status");
        let status = ConnectorStatus::parse(&status_str).unwrap_or(ConnectorStatus::NotConnected);

        let connected_at: Option<String> = row.get("connected_at");
        let disconnected_at: Option<String> = row.get("disconnected_at");

        Ok(Connector {
            key: row.get("key"),
            name: row.get("name"),
            status,
            connected_at: connected_at.and_then(|s| s.parse().ok()),
            disconnected_at: disconnected_at.and_then(|s| s.parse().ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn storage() -> CatalogStorage {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let storage = CatalogStorage::new(pool);
        storage.init_schema().await.unwrap();
        storage.seed_builtin().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let storage = storage().await;
        storage.seed_builtin().await.unwrap();

        let entries = storage.load_all_entries().await.unwrap();
        assert_eq!(entries.len(), crate::catalog::seed::builtin_actions().len());
    }

    #[tokio::test]
    async fn find_by_key_roundtrips_contracts() {
        let storage = storage().await;
        let entry = storage
            .find_by_key("stripe.verify_payment")
            .await
            .unwrap()
            .expect("seeded entry");
        assert_eq!(entry.action_type, ActionType::Action);
        assert!(entry.input_contract.is_some());
        assert!(entry.output_contract.is_some());
        assert!(storage.find_by_key("acme.unknown_action").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn connector_lifecycle() {
        let storage = storage().await;

        let connector = storage.connect_connector("stripe").await.unwrap();
        assert_eq!(connector.status, ConnectorStatus::Connected);
        assert!(connector.connected_at.is_some());
        assert!(connector.disconnected_at.is_none());

        let connector = storage.disconnect_connector("stripe").await.unwrap();
        assert_eq!(connector.status, ConnectorStatus::NotConnected);
        assert!(connector.disconnected_at.is_some());

        let err = storage.connect_connector("acme").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
