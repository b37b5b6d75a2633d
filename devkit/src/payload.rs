/*!
Builder de payloads UVS232

Construit des documents JSON au format du contrôleur :
`{ "Timestamp", "Runtime", "Data": { Temperature1..4, Out1, Out2, RotationSpeed } }`
*/

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Uvs232PayloadBuilder {
    timestamp: OffsetDateTime,
    runtime: f64,
    temperatures: [f64; 4],
    out1: bool,
    out2: bool,
    rotation_speed: f64,
}

impl Uvs232PayloadBuilder {
    pub fn new() -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            runtime: 0.0,
            temperatures: [20.0, 45.0, 8.0, 5.0],
            out1: false,
            out2: false,
            rotation_speed: 0.0,
        }
    }

    pub fn timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// collecteur, ballon, départ saumure, retour saumure
    pub fn temperatures(mut self, collector: f64, boiler: f64, brine_flow: f64, brine_return: f64) -> Self {
        self.temperatures = [collector, boiler, brine_flow, brine_return];
        self
    }

    /// Out1 = pompe solaire, Out2 = pompe saumure
    pub fn outputs(mut self, solar_pump: bool, brine_pump: bool) -> Self {
        self.out1 = solar_pump;
        self.out2 = brine_pump;
        self
    }

    pub fn runtime(mut self, runtime: f64) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn rotation_speed(mut self, speed: f64) -> Self {
        self.rotation_speed = speed;
        self
    }

    pub fn build(&self) -> Value {
        let [t1, t2, t3, t4] = self.temperatures;
        serde_json::json!({
            "Timestamp": self.timestamp.format(&Rfc3339).unwrap_or_default(),
            "Runtime": self.runtime,
            "Data": {
                "Temperature1": t1,
                "Temperature2": t2,
                "Temperature3": t3,
                "Temperature4": t4,
                "Out1": self.out1,
                "Out2": self.out2,
                "RotationSpeed": self.rotation_speed
            }
        })
    }
}

impl Default for Uvs232PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}
