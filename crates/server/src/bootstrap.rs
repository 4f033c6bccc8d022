use std::sync::Arc;

use clientele_core::config::{AppConfig, ConfigError};
use clientele_core::{Argon2CredentialIssuer, CustomerService, SystemClock};
use clientele_db::{connect_with_settings, migrations, DbPool, SqlCustomerRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: CustomerService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let service = CustomerService::new(
        Arc::new(SqlCustomerRepository::new(db_pool.clone())),
        Arc::new(SystemClock),
        Arc::new(Argon2CredentialIssuer),
    );

    Ok(Application { config, db_pool, service })
}

#[cfg(test)]
mod tests {
    use clientele_core::config::AppConfig;
    use clientele_core::CustomerInput;

    use super::{bootstrap_with_config, BootstrapError};

    fn config_with_url(database_url: &str) -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = database_url.to_string();
        config
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_non_sqlite_url() {
        let result = bootstrap_with_config(config_with_url("postgres://localhost/clientele")).await;

        let error = result.err().expect("non-sqlite url should be rejected");
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("database.url"));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_service() {
        let app = bootstrap_with_config(config_with_url("sqlite::memory:"))
            .await
            .expect("bootstrap should succeed with in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'customer'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("customer table lookup");
        assert_eq!(table_count, 1);

        let created = app
            .service
            .create(CustomerInput {
                user_name: "Aiyan".to_string(),
                customer_age: 2,
                customer_mobile_number: "0987654321".to_string(),
                customer_email_address: "Aiyan@x.com".to_string(),
                customer_address: "town".to_string(),
                ..CustomerInput::default()
            })
            .await
            .expect("create through bootstrapped service");
        assert_eq!(created.user_name, "Aiyan");

        let stored_hash: String =
            sqlx::query_scalar("SELECT credential_hash FROM customer WHERE user_name = 'Aiyan'")
                .fetch_one(&app.db_pool)
                .await
                .expect("credential column");
        assert!(stored_hash.starts_with("$argon2id$"));

        app.db_pool.close().await;
    }
}
