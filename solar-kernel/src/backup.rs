use crate::persist::{save_record, PersistError};
use crate::state::SnapshotStore;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Sauvegarde unique : copie de l'agrégat puis écriture hors verrou
pub async fn persist_now(store: &SnapshotStore, path: &Path) -> Result<(), PersistError> {
    let record = store.record();
    debug!("save measurements to {}", path.display());
    save_record(path, &record).await.inspect_err(|e| error!("backup measurements: {e}"))
}

/// Boucle de sauvegarde périodique. Le premier tick tombe après une période complète.
pub async fn run_backup(store: SnapshotStore, path: PathBuf, period: Duration, mut shutdown: watch::Receiver<bool>) {
    info!("backing up runtimes to {} every {:?}", path.display(), period);
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // l'erreur est déjà loggée, le cycle suivant réessaiera
                let _ = persist_now(&store, &path).await;
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Arrêt : attend la fin de la boucle (déjà signalée) puis fait la dernière sauvegarde.
/// Aucune écriture périodique ne peut plus passer après celle-ci.
pub async fn finish_backup(task: JoinHandle<()>, store: &SnapshotStore, path: &Path) -> Result<(), PersistError> {
    if let Err(e) = task.await {
        error!("backup task failed: {e}");
    }
    persist_now(store, path).await
}
