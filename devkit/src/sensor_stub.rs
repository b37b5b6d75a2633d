/*!
Faux contrôleur UVS232 pour développement sans matériel

Serveur HTTP local (port éphémère) qui répond à tout GET avec une réponse
scriptable : body JSON ou brut, statut HTTP, délai avant réponse.
Compte les requêtes reçues pour les assertions de tests.
*/

use axum::{extract::State, http::StatusCode, response::IntoResponse, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use anyhow::Result;

// réponse courante, modifiée par les setters de `SensorStub`
#[derive(Debug, Clone)]
struct StubResponse {
    status: u16,
    body: String,
    delay: Duration,
}

impl Default for StubResponse {
    fn default() -> Self {
        Self {
            status: 200,
            body: crate::payload::Uvs232PayloadBuilder::new().build().to_string(),
            delay: Duration::ZERO,
        }
    }
}

#[derive(Clone, Default)]
struct StubState {
    response: Arc<Mutex<StubResponse>>,
    requests: Arc<AtomicUsize>,
}

/// Serveur stub qui imite l'endpoint JSON du contrôleur
pub struct SensorStub {
    addr: SocketAddr,
    state: StubState,
    task: JoinHandle<()>,
}

impl SensorStub {
    /// Démarre le serveur sur 127.0.0.1 avec un port libre
    pub async fn start() -> Result<Self> {
        crate::init_test_logging();
        let state = StubState::default();
        let app = Router::new().fallback(serve_reading).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::warn!("[STUB] server stopped: {}", e);
            }
        });

        log::info!("🌞 [STUB] UVS232 stub listening on {}", addr);
        Ok(Self { addr, state, task })
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Répond avec ce JSON (statut 200)
    pub fn respond_json(&self, payload: Value) {
        let mut response = self.state.response.lock().unwrap();
        response.status = 200;
        response.body = payload.to_string();
    }

    /// Répond avec un body brut et un statut arbitraire
    pub fn respond_raw<S: Into<String>>(&self, status: u16, body: S) {
        let mut response = self.state.response.lock().unwrap();
        response.status = status;
        response.body = body.into();
    }

    /// Retarde chaque réponse (simulation de contrôleur lent)
    pub fn set_delay(&self, delay: Duration) {
        self.state.response.lock().unwrap().delay = delay;
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        *self.state.response.lock().unwrap() = StubResponse::default();
        self.state.requests.store(0, Ordering::SeqCst);
    }
}

impl Drop for SensorStub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_reading(State(state): State<StubState>) -> impl IntoResponse {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let response = state.response.lock().unwrap().clone();

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    log::info!("📤 [STUB] {} ({} bytes)", status, response.body.len());
    (status, [("content-type", "application/json")], response.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_serves_scripted_body() {
        let stub = SensorStub::start().await.unwrap();
        stub.respond_json(serde_json::json!({"hello": "uvs"}));

        let body = reqwest::get(stub.url()).await.unwrap().text().await.unwrap();
        assert_eq!(body, r#"{"hello":"uvs"}"#);
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn test_stub_status_and_reset() {
        let stub = SensorStub::start().await.unwrap();
        stub.respond_raw(502, "bad gateway");

        let res = reqwest::get(format!("{}any/path", stub.url())).await.unwrap();
        assert_eq!(res.status().as_u16(), 502);

        stub.reset();
        assert_eq!(stub.request_count(), 0);
        let res = reqwest::get(stub.url()).await.unwrap();
        assert_eq!(res.status().as_u16(), 200);
    }
}
