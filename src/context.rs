//! Application context providing dependency injection root.

use std::sync::Arc;

use crate::auth::ApiKey;
use crate::backend::fetch::FetchClient;
use crate::backend::graph::GraphClient;
use crate::backend::provision::ProvisionClient;
use crate::config::Config;
use crate::di::FromRef;
use crate::error::GatewayError;

/// Root application context.
///
/// Holds the shared configuration, the backend clients, and the validated
/// gateway credential. Backend clients are cheap to clone (shared connection
/// pools), so tool handlers resolve them by value via [`FromRef`].
#[derive(Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Graph API client for data operations.
    pub graph: GraphClient,
    /// Provisioning API client for infrastructure operations.
    pub provision: ProvisionClient,
    /// HTTP client for the URL fetch utility.
    pub fetch: FetchClient,
    /// Shape-validated gateway API key, forwarded to the Graph API.
    pub credential: ApiKey,
}

impl Context {
    /// Creates a new context, building the backend clients from config.
    pub fn new(config: Config, credential: ApiKey) -> Result<Self, GatewayError> {
        let graph = GraphClient::new(&config)?;
        let provision = ProvisionClient::new(&config)?;
        let fetch = FetchClient::new(&config)?;

        Ok(Self {
            config: Arc::new(config),
            graph,
            provision,
            fetch,
            credential,
        })
    }
}

impl FromRef<Context> for GraphClient {
    fn from_ref(ctx: &Context) -> Self {
        ctx.graph.clone()
    }
}

impl FromRef<Context> for ProvisionClient {
    fn from_ref(ctx: &Context) -> Self {
        ctx.provision.clone()
    }
}

impl FromRef<Context> for FetchClient {
    fn from_ref(ctx: &Context) -> Self {
        ctx.fetch.clone()
    }
}

impl FromRef<Context> for Arc<Config> {
    fn from_ref(ctx: &Context) -> Self {
        Arc::clone(&ctx.config)
    }
}
