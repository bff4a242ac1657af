use std::sync::Arc;

use tracing::info;

use roster_sdk::RosterClientV1;

use crate::config::RosterConfig;
use crate::domain::service::Service;
use crate::infra::hashing::BcryptPasswordHasher;
use crate::infra::storage::{self, SeaOrmMemberStore};
use crate::local_client::RosterLocalClient;

/// Roster module: owns the member store connection and exposes the client.
pub struct RosterModule {
    client: Arc<dyn RosterClientV1>,
}

impl RosterModule {
    /// Connect to the member database, run migrations and wire the service.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or migrations fail.
    pub async fn init(config: &RosterConfig) -> anyhow::Result<Self> {
        info!("Initializing roster module");

        info!("Running roster database migrations");
        let db = storage::connect(&config.database).await?;
        info!("Roster database migrations completed successfully");

        let store = Arc::new(SeaOrmMemberStore::new(db));
        let hasher = Arc::new(BcryptPasswordHasher::new(config.password_hash_cost));
        let service = Arc::new(Service::new(store, hasher));
        let client: Arc<dyn RosterClientV1> =
            Arc::new(RosterLocalClient::new(service, config.batch_timeout));

        info!(
            batch_timeout_secs = config.batch_timeout.as_secs(),
            "Roster module initialized"
        );
        Ok(Self { client })
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn RosterClientV1> {
        Arc::clone(&self.client)
    }
}
