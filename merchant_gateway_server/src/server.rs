use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use merchant_gateway_engine::{
    events::EventProducers,
    traits::{GatewayBackend, OrderManagement},
    CallbackDispatcher,
    ConfigGatewayStore,
    FileKeychainAllocator,
    GatewayApi,
    ReqwestCallbackClient,
    RetryPolicy,
    SqliteDatabase,
};

use crate::{
    callbacks::create_callback_event_handlers,
    config::{ConfigError, GatewayBackendKind, ServerConfig},
    errors::ServerError,
    routes::{health, CreateOrderRoute, OrderByIdRoute, UpdateOrderStatusRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        info!("🗃️ Database migrations are up to date");
    }
    let producers = start_callback_handlers(&config, db.clone()).await?;
    let srv = match config.gateway_backend {
        GatewayBackendKind::Config => {
            let store = load_gateway_file(&config).await?;
            create_server_instance(config, GatewayApi::new(store, db, producers))?
        },
        GatewayBackendKind::Database => {
            info!("🗂️ Gateways will be read from the database at {}", db.url());
            create_server_instance(config, GatewayApi::new(db.clone(), db, producers))?
        },
    };
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Starts the callback delivery handlers, returning the producers that feed them.
pub async fn start_callback_handlers(
    config: &ServerConfig,
    db: SqliteDatabase,
) -> Result<EventProducers, ServerError> {
    let client =
        ReqwestCallbackClient::new(config.callback_timeout).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let policy = RetryPolicy::with_delay(config.callback_retry_delay);
    info!(
        "📞️ Callbacks get {} attempts, {} s apart, with a {} s timeout each",
        policy.max_attempts(),
        config.callback_retry_delay.as_secs(),
        config.callback_timeout.as_secs()
    );
    let handlers = create_callback_event_handlers(CallbackDispatcher::new(db, client, policy));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    Ok(producers)
}

/// Loads the gateway definitions named in `config`, with keychain counters in the configured directory.
pub async fn load_gateway_file(config: &ServerConfig) -> Result<ConfigGatewayStore, ServerError> {
    let keychain = match &config.keychain_dir {
        Some(dir) => FileKeychainAllocator::new(dir.clone()),
        None => FileKeychainAllocator::from_env_or_default(),
    };
    let store = ConfigGatewayStore::load(&config.gateways_file, keychain)
        .await
        .map_err(|e| ConfigError::GatewaysFile(config.gateways_file.display().to_string(), e.to_string()))?;
    info!(
        "🗂️ Loaded {} gateway(s) from {}. Keychain counters live in {}",
        store.len(),
        config.gateways_file.display(),
        store.keychain().dir().display()
    );
    Ok(store)
}

pub fn create_server_instance<B, O>(config: ServerConfig, api: GatewayApi<B, O>) -> Result<Server, ServerError>
where
    B: GatewayBackend + Clone + Send + 'static,
    O: OrderManagement + Clone + Send + 'static,
{
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mpg::access_log"))
            .app_data(web::Data::new(api.clone()))
            .service(health)
            .service(CreateOrderRoute::<B, O>::new())
            .service(OrderByIdRoute::<B, O>::new())
            .service(UpdateOrderStatusRoute::<B, O>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
