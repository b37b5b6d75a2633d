/**
 * SOLAR KERNEL - Point d'entrée principal du service
 *
 * RÔLE : Orchestration de tous les modules : config, collecte UVS232, sauvegarde, HTTP.
 * Bootstrap du système complet avec gestion d'erreurs et logging.
 *
 * ARCHITECTURE : une tâche de collecte (seul écrivain) + une tâche de sauvegarde
 * + le serveur HTTP, qui ne partagent que le `SnapshotStore`.
 * ARRÊT : SIGINT/SIGTERM -> arrêt des ticks -> dernière sauvegarde -> sortie.
 */

use anyhow::Context;
use solar_kernel::backup::{finish_backup, run_backup};
use solar_kernel::config::load_config;
use solar_kernel::http::{self, AppState};
use solar_kernel::persist::load_record;
use solar_kernel::runtime::RuntimeTracks;
use solar_kernel::{Collector, SnapshotStore, Uvs232Client};

use std::net::SocketAddr;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    let cfg = load_config().await;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("solar kernel {} starting", http::VERSION);
    cfg.validate().context("invalid configuration")?;

    // seule erreur fatale : impossible de relire les compteurs
    let record = load_record(&cfg.data_file)
        .await
        .with_context(|| format!("can't open data file {}", cfg.data_file.display()))?;
    info!(
        "loaded runtimes: overall {:.2}h, brine pump {:.2}h, solar pump {:.2}h",
        record.runtime, record.brine_pump_runtime, record.solar_pump_runtime
    );

    let store = SnapshotStore::from_record(&record);
    let tracks = RuntimeTracks::seeded(&record, OffsetDateTime::now_utc());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // collecte
    let client = Uvs232Client::new(cfg.uvs232_url.clone());
    info!("reading UVS232 at {}", client.url());
    let collector = Collector::new(client, tracks, store.clone());
    let collector_task = tokio::spawn(collector.run(cfg.collection_interval(), shutdown_rx.clone()));

    // sauvegarde périodique
    let backup_task = tokio::spawn(run_backup(
        store.clone(),
        cfg.data_file.clone(),
        cfg.backup_interval(),
        shutdown_rx.clone(),
    ));

    // HTTP
    let app = http::build_router(AppState { store: store.clone() }, &cfg);
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.webserver.port));
    let listener = TcpListener::bind(addr).await.with_context(|| format!("can't bind {addr}"))?;
    info!("listening on http://{addr}");

    let mut server_shutdown = shutdown_rx.clone();
    let server_task = tokio::spawn(async move {
        let graceful = async move {
            let _ = server_shutdown.changed().await;
        };
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(graceful).await {
            error!("web server error: {e}");
        }
    });

    let sig = wait_for_signal().await;
    info!("got {sig} signal, aborting...");
    let _ = shutdown_tx.send(true);

    // le cycle en cours se termine (borné par le timeout du fetch)
    if let Err(e) = collector_task.await {
        error!("collector task failed: {e}");
    }

    // la boucle de sauvegarde sort d'elle-même, puis dernière écriture.
    // best effort : l'échec est loggé par persist_now, on sort quand même
    let _ = finish_backup(backup_task, &store, &cfg.data_file).await;

    server_task.abort();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("can't install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
            return "interrupt";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "interrupt",
        _ = term.recv() => "terminate",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "interrupt"
}
