use super::config::Config;
use getset::Getters;
use log::info;
use request_guard::GuardedClient;
use std::sync::Arc;

#[derive(Getters)]
#[get = "pub"]
pub struct Context {
    client: GuardedClient,
    config: Config,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let client = GuardedClient::with_config(config.client().clone());

        info!(
            "Initialized GuardedClient (base URL: {}, timeout: {:?}, guard enabled: {})",
            config.client().base_url.as_deref().unwrap_or("<none>"),
            config.client().timeout(),
            config.client().guard.enabled
        );

        Self { client, config }
    }
}

pub type ContextPointer = Arc<Context>;
