use axum::routing::{get, post};
use axum::Router;
use checkout_payments::config::AppConfig;
use checkout_payments::domain::orders::OrderPlacement;
use checkout_payments::repo::commerce_repo::CommerceRepo;
use checkout_payments::repo::ledger_repo::{LedgerRepo, LedgerStore};
use checkout_payments::repo::processor_config_repo::ProcessorConfigRepo;
use checkout_payments::resolver::BasketResolver;
use checkout_payments::service::checkout_service::CheckoutService;
use checkout_payments::service::notifications::NotificationDispatcher;
use checkout_payments::service::postback_service::PostbackService;
use checkout_payments::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let client = reqwest::Client::new();

    let config_repo = ProcessorConfigRepo { pool: pool.clone() };
    let ledger: Arc<dyn LedgerStore> = Arc::new(LedgerRepo { pool: pool.clone() });
    let commerce: Arc<dyn OrderPlacement> = Arc::new(CommerceRepo {
        pool: pool.clone(),
        receipt_base_url: cfg.public_base_url.clone(),
    });

    let notifications = NotificationDispatcher {
        client: client.clone(),
        campaign_event_url: cfg.campaign_event_url.clone(),
        campaign_account_id: cfg.campaign_account_id.clone(),
        campaign_key: cfg.campaign_key.clone(),
        notification_api_url: cfg.notification_api_url.clone(),
    };

    let resolver = BasketResolver {
        ledger: ledger.clone(),
        commerce: commerce.clone(),
    };

    let checkout = CheckoutService {
        config_repo: config_repo.clone(),
        ledger: ledger.clone(),
        commerce: commerce.clone(),
        client: client.clone(),
        public_base_url: cfg.public_base_url.clone(),
    };

    let postbacks = PostbackService {
        ledger: ledger.clone(),
        commerce: commerce.clone(),
        resolver,
        notifications,
    };

    let state = AppState {
        checkout,
        postbacks,
        config_repo,
        commerce,
        ledger,
        client,
        public_base_url: cfg.public_base_url.clone(),
        pool,
    };

    let app = Router::new()
        .route("/health", get(checkout_payments::http::handlers::checkout::health))
        .route(
            "/checkout/:processor",
            post(checkout_payments::http::handlers::checkout::initiate),
        )
        .route(
            "/postback/easypaisa",
            get(checkout_payments::http::handlers::postback::easypaisa_postback)
                .post(checkout_payments::http::handlers::postback::easypaisa_postback),
        )
        .route(
            "/postback/postex",
            get(checkout_payments::http::handlers::postback::postex_ipn)
                .post(checkout_payments::http::handlers::postback::postex_ipn),
        )
        .route(
            "/postback/postex/redirect",
            get(checkout_payments::http::handlers::postback::postex_redirect),
        )
        .route(
            "/postback/postex/cod",
            post(checkout_payments::http::handlers::postback::postex_cod),
        )
        .route(
            "/postback/xstack",
            post(checkout_payments::http::handlers::postback::xstack_intent),
        )
        .route(
            "/postback/xstack/order",
            post(checkout_payments::http::handlers::postback::xstack_order),
        )
        .route("/ops/readiness", get(checkout_payments::http::handlers::ops::readiness))
        .route("/ops/liveness", get(checkout_payments::http::handlers::ops::liveness))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
