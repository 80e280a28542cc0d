use tracing_subscriber::EnvFilter;

use maisense::api::{start_api_server, ApiContext};
use maisense::config::{self, Config};
use maisense::detector::Lexicon;
use maisense::narration::{HttpNarrator, Narrator};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = Config::from_env();

    // A broken lexicon file is reported loudly but is not fatal: the
    // engine runs with zero matches rather than refusing to start.
    let lexicon = match &config.lexicon_path {
        Some(path) => match Lexicon::load(path) {
            Ok(lexicon) => lexicon,
            Err(e) => {
                tracing::error!(error = %e, "Lexicon load failed, running with an empty lexicon");
                Lexicon::empty()
            }
        },
        None => Lexicon::builtin(),
    };
    tracing::info!(
        findings = lexicon.finding_count(),
        phrases = lexicon.phrase_count(),
        "Lexicon ready"
    );

    let narrator = if config.detector.narration_enabled {
        Narrator::Http(HttpNarrator::new(config.speech_url.clone()))
    } else {
        Narrator::Disabled
    };

    let port = config.listen_port;
    let ctx = ApiContext::new(config, lexicon, narrator);

    let server = match start_api_server(ctx.clone(), port).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, port, "Cannot bind API server");
            return;
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Signal handler failed");
    }

    tracing::info!("Shutting down");
    ctx.end_all().await;
    server.shutdown().await;
}
