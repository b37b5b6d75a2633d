/**
 * API REST SOLAR - Surface de lecture du kernel
 *
 * RÔLE :
 * Exposer l'agrégat courant et la version du service, en lecture seule.
 *
 * FONCTIONNEMENT :
 * - GET /currentdata : agrégat complet (mesures + compteurs) en JSON indenté
 * - GET /version : chaîne de version statique
 * - GET /health : toujours accessible
 * - Chaque route /version, /currentdata n'est montée que si activée dans `webserver.webservices`
 *
 * L'agrégat est copié puis le verrou relâché avant toute sérialisation.
 * Pas d'authentification : réseau local uniquement.
 */

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{extract::State, routing::get, Router};
use crate::config::KernelConfig;
use crate::state::SnapshotStore;
use tracing::error;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub store: SnapshotStore,
}

pub fn build_router(app_state: AppState, cfg: &KernelConfig) -> Router {
    let mut router = Router::new().route("/health", get(|| async { "ok" }));

    if cfg.webservice_enabled("version") {
        router = router.route("/version", get(get_version));
    }
    if cfg.webservice_enabled("currentdata") {
        router = router.route("/currentdata", get(get_current_data));
    }

    router.with_state(app_state)
}

// GET /version
async fn get_version() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], VERSION)
}

// GET /currentdata
async fn get_current_data(State(app): State<AppState>) -> Response {
    let snapshot = app.store.snapshot();

    match serde_json::to_vec_pretty(&snapshot) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!("serialize current data: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrentAggregate, OperationalState};
    use std::collections::HashMap;
    use tokio::net::TcpListener;

    async fn serve(store: SnapshotStore, cfg: &KernelConfig) -> String {
        let app = build_router(AppState { store }, cfg);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_current_data_returns_full_aggregate() {
        let store = SnapshotStore::new(CurrentAggregate {
            collector_temp: 64.5,
            state: OperationalState::HeatingUpHotWater,
            solar_pump_state: OperationalState::On,
            runtime: 120.25,
            ..CurrentAggregate::default()
        });
        let base = serve(store, &KernelConfig::default()).await;

        let res = reqwest::get(format!("{base}/currentdata")).await.unwrap();
        assert_eq!(res.status(), 200);
        let json: serde_json::Value = res.json().await.unwrap();

        assert_eq!(json["CollectorTemp"], 64.5);
        assert_eq!(json["State"], "heating up hot water");
        assert_eq!(json["SolarPumpState"], "on");
        assert_eq!(json["BrinePumpState"], "off");
        assert_eq!(json["Runtime"], 120.25);
        assert!(json.get("BrineFlow").is_some());
        assert!(json.get("Timestamp").is_some());
    }

    #[tokio::test]
    async fn test_version() {
        let base = serve(SnapshotStore::new(CurrentAggregate::default()), &KernelConfig::default()).await;
        let body = reqwest::get(format!("{base}/version")).await.unwrap().text().await.unwrap();
        assert_eq!(body, VERSION);
    }

    #[tokio::test]
    async fn test_disabled_webservice_is_not_routed() {
        let mut cfg = KernelConfig::default();
        cfg.webserver.webservices = HashMap::from([("currentdata".to_string(), false)]);
        let base = serve(SnapshotStore::new(CurrentAggregate::default()), &cfg).await;

        assert_eq!(reqwest::get(format!("{base}/currentdata")).await.unwrap().status(), 404);
        assert_eq!(reqwest::get(format!("{base}/version")).await.unwrap().status(), 404);
        assert_eq!(reqwest::get(format!("{base}/health")).await.unwrap().status(), 200);
    }
}
