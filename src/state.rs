use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CodeService, QrService, SeaOrmAuthService, SeaOrmCodeService, provision_admin,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub code_service: Arc<dyn CodeService>,

    pub auth_service: Arc<dyn AuthService>,

    pub qr: Arc<QrService>,
}

impl SharedState {
    /// Opens the store, runs migrations and provisions the admin account.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let code_service = Arc::new(SeaOrmCodeService::new(store.clone(), config.codes.clone()))
            as Arc<dyn CodeService + Send + Sync + 'static>;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        provision_admin(auth_service.as_ref(), &config.bootstrap)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to provision admin account: {e}"))?;

        let qr = Arc::new(QrService::new(&config.qr));

        Ok(Self {
            config: Arc::new(config),
            store,
            code_service,
            auth_service,
            qr,
        })
    }
}
