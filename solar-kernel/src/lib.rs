/*!
# Solar Kernel

Suivi des temps de marche d'une installation solaire / pompe à chaleur à partir
d'un contrôleur UVS232 :
- lecture périodique du contrôleur (timeout borné)
- dérivation de l'état global depuis les deux pompes
- compteurs d'heures de marche persistants entre redémarrages
- API JSON en lecture seule
*/

pub mod backup;
pub mod collector;
pub mod config;
pub mod http;
pub mod models;
pub mod persist;
pub mod runtime;
pub mod solar;
pub mod state;

pub use collector::Collector;
pub use models::{CurrentAggregate, OperationalState, PersistedRecord, Sample};
pub use solar::{FetchError, SampleSource, Uvs232Client};
pub use state::SnapshotStore;
