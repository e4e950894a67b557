use actix_web::{middleware, web, App, HttpServer};
use netting_checker::consumer::TriggerConsumer;
use netting_checker::{
    handlers, CompletionChecker, Config, NatsOutcomePublisher, RedisSetStore, SetStore, StoreStatusLogger,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting Netting Status Checker...");

    let config = Config::from_env()?;
    info!("Configuration loaded (claim mode: {:?})", config.checker.claim_mode);

    info!("Connecting to Redis at {}", config.redis.url);
    let store: Arc<dyn SetStore> =
        Arc::new(RedisSetStore::connect(&config.redis.url, config.redis.marker_ttl()).await?);
    if let Err(e) = store.ping().await {
        error!("Redis health check failed: {}", e);
        return Err(e.into());
    }
    info!("Connected to Redis");

    let nats_client = async_nats::connect(config.nats.url.as_str()).await?;
    info!("Connected to NATS: {}", config.nats.url);

    let publisher = Arc::new(NatsOutcomePublisher::new(nats_client.clone()));
    let status_log = Arc::new(StoreStatusLogger::new(store.clone()));
    let checker = Arc::new(CompletionChecker::new(
        store.clone(),
        publisher,
        status_log,
        config.nats.outcome_subject.clone(),
        config.checker.claim_mode,
    ));

    let consumer = TriggerConsumer::new(checker, &config.checker);
    let nats_config = config.nats.clone();
    tokio::spawn(async move {
        if let Err(e) = consumer.run(nats_client, &nats_config).await {
            error!("Trigger consumer stopped: {}", e);
        }
    });

    info!("Starting HTTP server on {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
