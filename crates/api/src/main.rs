use anyhow::Context;
use clap::Parser;
use clientbench_core::config::Settings;
use clientbench_core::service::{FinancialDataService, UpdateMode};
use clientbench_core::storage::{seed, InMemoryRepository};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod extract;
mod routes;

#[derive(Debug, Parser)]
#[command(name = "clientbench_api")]
struct Args {
    /// Interface to bind. Overrides HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind. Overrides PORT.
    #[arg(long)]
    port: Option<u16>,

    /// JSON seed to serve instead of the embedded dataset.
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// `acknowledge` echoes submitted metrics; `apply` stores them.
    #[arg(long)]
    update_mode: Option<UpdateMode>,

    /// Validate the seed and exit without serving.
    #[arg(long)]
    check_seed: bool,
}

impl Args {
    fn apply_to(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.host = host;
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(path) = self.seed_file {
            settings.seed_file = Some(path);
        }
        if let Some(mode) = self.update_mode {
            settings.update_mode = mode;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let check_seed = args.check_seed;
    args.apply_to(&mut settings);

    // A bad seed must stop the process rather than serve partial data.
    let datasets = match seed::load(settings.seed_file.as_deref()) {
        Ok(d) => d,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "seed rejected");
            return Err(e);
        }
    };
    let dataset_count = datasets.len();

    if check_seed {
        let periods: usize = datasets.iter().map(|d| d.financial_metrics.len()).sum();
        tracing::info!(
            datasets = dataset_count,
            periods,
            seed_file = ?settings.seed_file,
            "seed ok"
        );
        return Ok(());
    }

    let repo = InMemoryRepository::from_datasets(datasets)?;
    let service = FinancialDataService::new(Arc::new(repo), settings.update_mode);
    let cors = routes::cors_layer(&settings.cors_allowed_origins)?;

    tracing::info!(
        datasets = dataset_count,
        backend = service.backend_name(),
        update_mode = %service.update_mode(),
        cors_origins = ?settings.cors_allowed_origins,
        "financial data loaded"
    );

    let app = routes::router(routes::AppState { service }, cors);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
