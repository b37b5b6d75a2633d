use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// État de fonctionnement global, réutilisé tel quel pour l'état de chaque pompe (On/Off)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperationalState {
    #[default]
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "on")]
    On,
    #[serde(rename = "heating up hot water")]
    HeatingUpHotWater,
    #[serde(rename = "heat recovery")]
    HeatRecovery,
}

pub type PumpState = OperationalState;

impl OperationalState {
    /// Tout sauf `Off` compte comme temps de marche
    pub fn is_active(self) -> bool {
        !matches!(self, OperationalState::Off)
    }

    /// Sortie relais brute du contrôleur -> état de pompe
    pub fn from_output(on: bool) -> PumpState {
        if on {
            OperationalState::On
        } else {
            OperationalState::Off
        }
    }

    /// Règle de dérivation : seule la pompe solaire en marche produit un état actif.
    /// Pompe solaire Off + pompe à saumure On donne bien `Off`.
    pub fn derive(solar_pump: PumpState, brine_pump: PumpState) -> OperationalState {
        match (solar_pump, brine_pump) {
            (OperationalState::On, OperationalState::On) => OperationalState::HeatRecovery,
            (OperationalState::On, OperationalState::Off) => OperationalState::HeatingUpHotWater,
            _ => OperationalState::Off,
        }
    }
}

/// Une lecture du contrôleur UVS232, produite à chaque fetch réussi
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: OffsetDateTime,
    pub collector_temp: f64,
    pub boiler_temp: f64,
    pub solar_flow: f64,    // non fourni par l'UVS232, toujours 0
    pub solar_return: f64,  // idem
    pub brine_flow: f64,
    pub brine_return: f64,
    pub solar_pump_state: PumpState,
    pub brine_pump_state: PumpState,
    pub state: OperationalState,
}

/// Heures de marche cumulées des trois compteurs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Runtimes {
    pub overall: f64,
    pub brine_pump: f64,
    pub solar_pump: f64,
}

/// Agrégat courant exposé par /currentdata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrentAggregate {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub collector_temp: f64,
    pub boiler_temp: f64,
    pub state: OperationalState,
    pub runtime: f64,
    pub solar_flow: f64,
    pub solar_return: f64,
    pub solar_pump_state: PumpState,
    pub solar_pump_runtime: f64,
    pub brine_flow: f64,
    pub brine_return: f64,
    pub brine_pump_state: PumpState,
    pub brine_pump_runtime: f64,
}

impl Default for CurrentAggregate {
    fn default() -> Self {
        Self {
            timestamp: OffsetDateTime::UNIX_EPOCH,
            collector_temp: 0.0,
            boiler_temp: 0.0,
            state: OperationalState::Off,
            runtime: 0.0,
            solar_flow: 0.0,
            solar_return: 0.0,
            solar_pump_state: OperationalState::Off,
            solar_pump_runtime: 0.0,
            brine_flow: 0.0,
            brine_return: 0.0,
            brine_pump_state: OperationalState::Off,
            brine_pump_runtime: 0.0,
        }
    }
}

impl CurrentAggregate {
    /// Agrégat de démarrage : compteurs repris du dernier enregistrement, capteurs à zéro
    pub fn from_record(record: &PersistedRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            runtime: record.runtime,
            brine_pump_runtime: record.brine_pump_runtime,
            solar_pump_runtime: record.solar_pump_runtime,
            ..Self::default()
        }
    }

    pub fn to_record(&self) -> PersistedRecord {
        PersistedRecord {
            timestamp: self.timestamp,
            runtime: self.runtime,
            brine_pump_runtime: self.brine_pump_runtime,
            solar_pump_runtime: self.solar_pump_runtime,
        }
    }

    pub fn runtimes(&self) -> Runtimes {
        Runtimes {
            overall: self.runtime,
            brine_pump: self.brine_pump_runtime,
            solar_pump: self.solar_pump_runtime,
        }
    }
}

/// Sous-ensemble durable de l'agrégat (les mesures capteurs ne sont pas sauvegardées).
/// Une clé absente du fichier vaut sa valeur par défaut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PersistedRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub runtime: f64,
    pub brine_pump_runtime: f64,
    pub solar_pump_runtime: f64,
}

impl Default for PersistedRecord {
    fn default() -> Self {
        Self {
            timestamp: OffsetDateTime::UNIX_EPOCH,
            runtime: 0.0,
            brine_pump_runtime: 0.0,
            solar_pump_runtime: 0.0,
        }
    }
}
