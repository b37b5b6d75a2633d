/*!
# Solar DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant le développement et les tests du kernel solaire avec:
- Stub HTTP du contrôleur UVS232 (sans matériel)
- Builder de payloads JSON au format du contrôleur
*/

pub mod sensor_stub;
pub mod payload;

pub use sensor_stub::SensorStub;
pub use payload::Uvs232PayloadBuilder;

/// Init logging pour tests (idempotent)
pub fn init_test_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}
