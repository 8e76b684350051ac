use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use wallet_engine::api::dto::{
    CashOutRequestRequest, CashOutRequestResponse, CashOutVerifyRequest, CashOutVerifyResponse,
    CreateWalletRequest, ProcessActionRequest, ProcessActionResponse, TransferRequest,
    TransferResponse,
};
use wallet_engine::api::http_routes::{routes, AppState};
use wallet_engine::api::response::ApiResponse;
use wallet_engine::config::Config;
use wallet_engine::domain::directory::UserDirectory;
use wallet_engine::facade::{EngineConfig, WalletEngine};
use wallet_engine::infrastructure::cache::transaction_list_cache::TransactionListCache;
use wallet_engine::infrastructure::notification::channel_sink::{
    run_notification_consumer, ChannelNotificationSink,
};
use wallet_engine::infrastructure::persistence::atomic_unit::PostgresAtomicUnitFactory;
use wallet_engine::infrastructure::persistence::idempotency_store::PostgresIdempotencyStore;
use wallet_engine::infrastructure::persistence::transaction_repository::PostgresTransactionRepository;
use wallet_engine::infrastructure::persistence::user_directory::PostgresUserDirectory;
use wallet_engine::infrastructure::persistence::wallet_repository::PostgresWalletRepository;
use wallet_engine::jobs::expiry_worker::ExpiryWorker;

/// Notifications are fanned out onto a bounded channel; this is how deep the consumer is
/// allowed to fall behind a burst of commits before `publish` starts dropping events.
const NOTIFICATION_CHANNEL_CAPACITY: usize = 1024;

#[derive(OpenApi)]
#[openapi(components(schemas(
    CreateWalletRequest,
    TransferRequest,
    TransferResponse,
    ProcessActionRequest,
    ProcessActionResponse,
    CashOutRequestRequest,
    CashOutRequestResponse,
    CashOutVerifyRequest,
    CashOutVerifyResponse,
    ApiResponse<serde_json::Value>,
)))]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    info!("starting wallet engine");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    info!("connected to database");

    let wallet_repo = Arc::new(PostgresWalletRepository::new(pool.clone()));
    let transaction_repo = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let atomic_units = Arc::new(PostgresAtomicUnitFactory::new(pool.clone()));
    let directory = Arc::new(PostgresUserDirectory::new(pool.clone()));
    let idempotency = Arc::new(PostgresIdempotencyStore::new(
        pool.clone(),
        config.idempotency_ttl_hours,
    ));
    let cache = Arc::new(TransactionListCache::new(Duration::from_secs(
        config.list_cache_ttl_seconds,
    )));
    let (notifications, notification_receiver) =
        ChannelNotificationSink::new(NOTIFICATION_CHANNEL_CAPACITY);
    let notifications = Arc::new(notifications);

    let engine = Arc::new(WalletEngine::new(
        wallet_repo.clone(),
        transaction_repo.clone(),
        atomic_units.clone(),
        idempotency,
        directory.clone() as Arc<dyn UserDirectory>,
        notifications.clone(),
        cache.clone(),
        EngineConfig {
            cash_out_expiry_minutes: config.cash_out_expiry_minutes,
            transfer_expiry_hours: config.transfer_expiry_hours,
            paysend_webhook_secret: config.paysend_webhook_secret.clone(),
            webhook_ip_whitelist: config.ip_whitelist.clone(),
        },
    ));

    tokio::spawn(run_notification_consumer(notification_receiver));

    let expiry_worker = ExpiryWorker::new(
        transaction_repo,
        wallet_repo,
        atomic_units,
        notifications,
        cache,
    );
    let expiry_period = Duration::from_secs(config.expiry_worker_period_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(expiry_period);
        loop {
            interval.tick().await;
            let expired = expiry_worker.run().await;
            info!(expired, "expiry worker pass complete");
        }
    });

    let state = Arc::new(AppState { engine });
    let app = routes(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let addr = format!("{}:{}", config.host, config.port);
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
