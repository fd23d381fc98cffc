//! Etalon HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use etalon::classifier::{BuildContext, build_classifiers};
use etalon::config::{ClassifiersFile, Config, SysPubMapping};
use etalon::gateway::{AppState, create_router_with_state};
use etalon::normalize::MystemLemmatizer;
use etalon::retrieval::{ElasticClient, RetrievalBackend};
use etalon::scenario::{Orchestrator, ScenarioTable};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        es_url = %config.es_url,
        "Etalon starting"
    );

    let classifiers_file = ClassifiersFile::load(&config.classifiers_config, &config.data_dir)?;

    let mapping = match &config.sys_pub_mapping {
        Some(path) => SysPubMapping::load(path)?,
        None => {
            tracing::warn!("No ETALON_SYS_PUB_MAPPING configured, requests without sys_id use the default scenario");
            SysPubMapping::default()
        }
    };

    let backend = ElasticClient::new(config.elastic_config())?;
    if let Err(e) = backend.health_check().await {
        tracing::warn!(error = %e, "Search backend is not reachable yet");
    }

    let lemmatizer = Arc::new(MystemLemmatizer::start(config.mystem_path.clone())?);
    let mut ctx = BuildContext::new(
        backend.clone(),
        lemmatizer,
        config.data_dir.clone(),
        config.models_dir.clone(),
    )
    .with_max_hits(backend.max_hits())
    .with_embedding_cache_capacity(config.embedding_cache_capacity);

    let classifiers = build_classifiers(&mut ctx, &classifiers_file)?;
    let table = ScenarioTable::from_section(&classifiers_file.scenarios);
    let orchestrator = Orchestrator::new(classifiers, table)?;

    tracing::info!(
        classifiers = orchestrator.classifier_names().count(),
        "Classifiers loaded"
    );

    let state = AppState::new(Arc::new(orchestrator), Arc::new(mapping), backend);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Etalon shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("ETALON_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
