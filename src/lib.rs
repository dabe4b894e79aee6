pub mod codec;
pub mod config;
pub mod domain {
    pub mod basket;
    pub mod error;
    pub mod orders;
}
pub mod http {
    pub mod handlers {
        pub mod checkout;
        pub mod ops;
        pub mod postback;
    }
}
pub mod processors;
pub mod repo {
    pub mod commerce_repo;
    pub mod ledger_repo;
    pub mod processor_config_repo;
}
pub mod resolver;
pub mod service {
    pub mod checkout_service;
    pub mod notifications;
    pub mod postback_service;
}

use crate::domain::orders::OrderPlacement;
use crate::repo::ledger_repo::LedgerStore;
use crate::repo::processor_config_repo::ProcessorConfigRepo;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub checkout: service::checkout_service::CheckoutService,
    pub postbacks: service::postback_service::PostbackService,
    pub config_repo: ProcessorConfigRepo,
    pub commerce: Arc<dyn OrderPlacement>,
    pub ledger: Arc<dyn LedgerStore>,
    pub client: reqwest::Client,
    pub public_base_url: String,
    pub pool: sqlx::PgPool,
}
