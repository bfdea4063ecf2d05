use anyhow::{Context, Result};
use phyto_core::config::GatewayConfig;
use phyto_interaction::{OllamaAdvisor, SubprocessClassifier};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::app::AppState;

/// Wires configured backends into the handler state.
pub struct AppBootstrap {
    pub app_state: AppState,
    pub bind: SocketAddr,
}

impl AppBootstrap {
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let bind: SocketAddr = config
            .server
            .bind
            .parse()
            .with_context(|| format!("invalid bind address '{}'", config.server.bind))?;

        let classifier = SubprocessClassifier::from_config(&config.classifier)
            .context("failed to configure classification engine")?;
        let advisor = OllamaAdvisor::from_config(&config.advisor);

        if !config.classifier.model_path.exists() {
            tracing::warn!(
                model_path = %config.classifier.model_path.display(),
                "Model artifact not found; classifications will fail until it exists"
            );
        }

        tracing::info!(
            engine = ?config.classifier.command,
            model_path = %config.classifier.model_path.display(),
            classify_timeout_secs = config.classifier.timeout_secs,
            advisor_url = %advisor.generate_url(),
            advisor_model = %config.advisor.model,
            advise_timeout_secs = config.advisor.timeout_secs,
            "[Bootstrap] Backends configured"
        );

        let app_state = AppState::new(Arc::new(classifier), Arc::new(advisor))
            .with_max_image_bytes(config.classifier.max_image_bytes);

        Ok(Self { app_state, bind })
    }
}
