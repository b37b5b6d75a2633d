/**
 * UVS232 CLIENT - Lecture du contrôleur solaire
 *
 * RÔLE : Un GET HTTP par cycle vers le contrôleur, décodage JSON, mapping des sorties relais.
 *
 * FONCTIONNEMENT :
 * - Requête + lecture du body + décodage bornés par un seul timeout (10s par défaut)
 * - Au timeout la future de la requête est abandonnée : un résultat tardif n'est jamais appliqué
 * - Pas de retry : le prochain tick de collecte fait office de nouvelle tentative
 *
 * MAPPING : Temperature1 = capteur collecteur, Temperature2 = ballon,
 * Temperature3/4 = départ/retour saumure, Out1 = pompe solaire, Out2 = pompe saumure.
 */

use crate::models::{OperationalState, Sample};
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::{debug, trace};

pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("timeout during receive data (after {0:?})")]
    Timeout(Duration),
    /// connexion, DNS ou statut HTTP non-2xx
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source de lectures pour la boucle de collecte
pub trait SampleSource {
    fn fetch(&self) -> impl Future<Output = Result<Sample, FetchError>> + Send;
}

// Payload brut du contrôleur. `Runtime` et `Data.RotationSpeed` sont ignorés.
#[derive(Debug, Deserialize)]
struct Uvs232Body {
    #[serde(rename = "Timestamp", with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    #[serde(rename = "Data")]
    measurand: Measurand,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Measurand {
    temperature1: f64,
    temperature2: f64,
    temperature3: f64,
    temperature4: f64,
    out1: bool,
    out2: bool,
}

impl Uvs232Body {
    fn into_sample(self) -> Sample {
        let m = self.measurand;
        let solar_pump_state = OperationalState::from_output(m.out1);
        let brine_pump_state = OperationalState::from_output(m.out2);
        Sample {
            timestamp: self.timestamp,
            collector_temp: m.temperature1,
            boiler_temp: m.temperature2,
            solar_flow: 0.0,
            solar_return: 0.0,
            brine_flow: m.temperature3,
            brine_return: m.temperature4,
            solar_pump_state,
            brine_pump_state,
            state: OperationalState::derive(solar_pump_state, brine_pump_state),
        }
    }
}

#[derive(Clone)]
pub struct Uvs232Client {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl Uvs232Client {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, HTTP_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn read(&self) -> Result<Sample, FetchError> {
        let start = Instant::now();

        let body = tokio::time::timeout(self.timeout, self.request())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        debug!("runtime to request data: {:.3}s", start.elapsed().as_secs_f64());
        Ok(body.into_sample())
    }

    async fn request(&self) -> Result<Uvs232Body, FetchError> {
        trace!("performing http get: {}", self.url);

        let response = self.http.get(&self.url).send().await?.error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl SampleSource for Uvs232Client {
    fn fetch(&self) -> impl Future<Output = Result<Sample, FetchError>> + Send {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_devkit::{SensorStub, Uvs232PayloadBuilder};
    use time::macros::datetime;

    #[tokio::test]
    async fn test_read_maps_payload() {
        let payload = Uvs232PayloadBuilder::new()
            .timestamp(datetime!(2020-12-27 13:45:10 UTC))
            .temperatures(65.2, 47.9, 8.4, 5.1)
            .outputs(true, false)
            .runtime(18342.5)
            .rotation_speed(70.0)
            .build();
        let stub = SensorStub::start().await.unwrap();
        stub.respond_json(payload);

        let client = Uvs232Client::new(stub.url());
        let sample = client.read().await.unwrap();

        assert_eq!(sample.timestamp, datetime!(2020-12-27 13:45:10 UTC));
        assert_eq!(sample.collector_temp, 65.2);
        assert_eq!(sample.boiler_temp, 47.9);
        assert_eq!(sample.brine_flow, 8.4);
        assert_eq!(sample.brine_return, 5.1);
        assert_eq!(sample.solar_pump_state, OperationalState::On);
        assert_eq!(sample.brine_pump_state, OperationalState::Off);
        assert_eq!(sample.state, OperationalState::HeatingUpHotWater);
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn test_read_malformed_body_is_decode_error() {
        let stub = SensorStub::start().await.unwrap();
        stub.respond_raw(200, "{\"Timestamp\": 42");

        let err = Uvs232Client::new(stub.url()).read().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_read_non_success_status_is_transport_error() {
        let stub = SensorStub::start().await.unwrap();
        stub.respond_raw(503, "busy");

        let err = Uvs232Client::new(stub.url()).read().await.unwrap_err();
        match err {
            FetchError::Transport(e) => assert_eq!(e.status().map(|s| s.as_u16()), Some(503)),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_connection_refused_is_transport_error() {
        // port réservé puis libéré : personne n'écoute
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let err = Uvs232Client::new(url).read().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_read_slow_endpoint_times_out() {
        let stub = SensorStub::start().await.unwrap();
        stub.respond_json(Uvs232PayloadBuilder::new().build());
        stub.set_delay(Duration::from_secs(2));

        let client = Uvs232Client::with_timeout(stub.url(), Duration::from_millis(100));
        let start = Instant::now();
        let err = client.read().await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout(_)), "got {err:?}");
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
