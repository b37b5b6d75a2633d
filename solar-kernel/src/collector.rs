/**
 * COLLECTOR - Boucle de collecte périodique
 *
 * RÔLE : Seul écrivain de l'agrégat courant.
 * Lecture UVS232 -> dérivation d'état -> compteurs de marche -> publication atomique.
 *
 * Un fetch en échec (timeout, transport, payload) saute le cycle entier :
 * compteurs et agrégat restent ceux du cycle précédent.
 */

use crate::models::Sample;
use crate::runtime::RuntimeTracks;
use crate::solar::{FetchError, SampleSource};
use crate::state::SnapshotStore;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub struct Collector<S> {
    source: S,
    tracks: RuntimeTracks,
    store: SnapshotStore,
}

impl<S: SampleSource> Collector<S> {
    pub fn new(source: S, tracks: RuntimeTracks, store: SnapshotStore) -> Self {
        Self { source, tracks, store }
    }

    pub fn tracks(&self) -> &RuntimeTracks {
        &self.tracks
    }

    /// Un cycle complet. Les compteurs utilisent l'horloge murale au retour du fetch.
    pub async fn collect_once(&mut self) -> Result<(), FetchError> {
        debug!("get data");
        let sample = self.source.fetch().await?;
        let now = OffsetDateTime::now_utc();
        self.apply(sample, now);
        Ok(())
    }

    fn apply(&mut self, sample: Sample, now: OffsetDateTime) {
        debug!("calc runtime (state: {:?})", sample.state);
        let runtimes = self.tracks.observe(&sample, now);
        self.store.apply(&sample, runtimes);
    }

    /// Tourne jusqu'au signal d'arrêt. Premier tick immédiat.
    pub async fn run(mut self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("collecting data every {:?}", period);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.collect_once().await {
                        warn!("get solar data: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    info!("collector stopped");
                    break;
                }
            }
        }
    }
}
