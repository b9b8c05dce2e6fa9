//! Application struct that encapsulates server assembly and serving logic.

use crate::cli::RunArgs;
use relay_core::config::Config;
use relay_core::lifecycle::signal::SignalHandler;
use relay_core::profile::ProfileRegistry;
use relay_provider::HttpForwarder;
use std::sync::Arc;

pub struct Application {
    config: Arc<Config>,
    registry: Arc<ProfileRegistry>,
    app_router: axum::Router,
}

impl Application {
    /// Apply CLI overrides, build the profile registry and the shared HTTP
    /// client, and assemble the router.
    pub fn build(mut config: Config, args: &RunArgs) -> anyhow::Result<Self> {
        if let Some(ref host) = args.host {
            config.host = host.clone();
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        if args.verbose {
            config.verbose = true;
        }

        let registry = Arc::new(ProfileRegistry::from_config(&config)?);
        if registry.is_empty() {
            tracing::warn!("No profiles configured; every request will return 404");
        }
        let forwarder = Arc::new(HttpForwarder::from_config(&config)?);
        let config = Arc::new(config);

        let state = relay_server::AppState {
            config: config.clone(),
            registry: registry.clone(),
            forwarder,
        };
        let app_router = relay_server::build_router(state);

        Ok(Self {
            config,
            registry,
            app_router,
        })
    }

    /// Bind, log the profile summary, and serve until SIGINT/SIGTERM.
    pub async fn serve(self) -> anyhow::Result<()> {
        let Self {
            config,
            registry,
            app_router,
        } = self;

        let (signal_handler, mut shutdown_rx) = SignalHandler::new();
        tokio::spawn(signal_handler.run());

        let addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Starting HTTP server on {addr}");
        log_profile_summary(&config, &registry);

        let shutdown = async move {
            let _ = shutdown_rx.wait_for(|v| *v).await;
        };

        axum::serve(listener, app_router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shut down.");
        Ok(())
    }
}

fn log_profile_summary(config: &Config, registry: &ProfileRegistry) {
    let default = registry.default_profile().map(|p| p.name.as_str());
    let base = format!("http://{}:{}", config.host, config.port);

    for profile in registry.list() {
        let marker = if Some(profile.name.as_str()) == default {
            " (default)"
        } else {
            ""
        };
        let key_status = if profile.has_credential() {
            "API key set"
        } else {
            "API key missing"
        };
        tracing::info!(
            "  {}{marker}: {base}/{} -> {} [{key_status}]",
            profile.display_name,
            profile.name,
            profile.base_url,
        );
    }
    if let Some(name) = default {
        tracing::info!("  /default routes to '{name}'");
    }
    if config.proxy_url.is_some() {
        tracing::info!("  Outbound requests go through the configured proxy_url");
    }
}
