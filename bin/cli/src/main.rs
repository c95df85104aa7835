mod commands;
mod config;
mod error;
mod repl;

use crate::config::{ModelConfig, TutorConfig};
use crate::error::CliError;
use crate::repl::Repl;
use pidgin_tutor_ai::{HttpBackendConfig, ModelHandle};
use pidgin_tutor_conversation::{InMemorySessionStore, Responder, TutorService};
use pidgin_tutor_core::CallerId;
use rootcause::prelude::Report;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Report<CliError>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TutorConfig::from_env().map_err(CliError::from)?;
    info!(
        history_capacity = config.history.capacity,
        model_endpoint = config.model.endpoint(),
        "Loaded configuration"
    );

    let model = load_model(&config.model).await;
    let responder = Responder::new(model)
        .with_params(config.model.generation_params())
        .with_tokens(config.model.tokens());
    let store = InMemorySessionStore::with_history_capacity(config.history.capacity);
    let repl = Repl::new(
        TutorService::new(responder, store),
        CallerId::from(config.caller.name.as_str()),
        config.snapshot.dir.clone(),
    );

    let mut stdout = tokio::io::stdout();
    repl.greet(&mut stdout, Some(&config.caller.name)).await?;

    tokio::select! {
        result = repl.run(BufReader::new(tokio::io::stdin()), &mut stdout) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    info!("Goodbye");
    Ok(())
}

/// Connects to the configured generation server, falling back to the rule
/// table when none is configured or it cannot be reached.
async fn load_model(config: &ModelConfig) -> ModelHandle {
    let backend_config = config.endpoint().map(|endpoint| {
        HttpBackendConfig::new(endpoint)
            .with_request_timeout(config.request_timeout())
            .with_stop(config.tokens().end_of_text)
    });
    ModelHandle::connect(backend_config).await
}
