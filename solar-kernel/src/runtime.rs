/**
 * RUNTIME ACCUMULATOR - Compteurs d'heures de marche
 *
 * RÔLE : Attribuer le temps écoulé entre deux lectures au bon état de marche.
 *
 * FONCTIONNEMENT :
 * - Un même type `RuntimeTrack` instancié trois fois (état global, pompe saumure, pompe solaire)
 * - Passage inactif -> actif : la référence est remise à `now`, le tick de transition ne crédite rien
 * - Actif -> actif : on ajoute `now - référence` puis la référence avance à `now`
 * - Inactif : rien n'est ajouté
 *
 * Les tracks appartiennent exclusivement à la boucle de collecte, aucun verrou ici.
 */

use crate::models::{OperationalState, PersistedRecord, Runtimes, Sample};
use time::OffsetDateTime;

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeTrack {
    cumulative_hours: f64,
    last_state: OperationalState,
    last_active_transition: OffsetDateTime,
}

impl RuntimeTrack {
    /// Après un redémarrage seules les heures cumulées sont reprises, l'état repart de `Off`
    pub fn new(cumulative_hours: f64, now: OffsetDateTime) -> Self {
        Self {
            cumulative_hours,
            last_state: OperationalState::Off,
            last_active_transition: now,
        }
    }

    pub fn cumulative_hours(&self) -> f64 {
        self.cumulative_hours
    }

    pub fn last_state(&self) -> OperationalState {
        self.last_state
    }

    pub fn last_active_transition(&self) -> OffsetDateTime {
        self.last_active_transition
    }

    /// Retourne les heures ajoutées par ce tick
    pub fn update(&mut self, new_state: OperationalState, now: OffsetDateTime) -> f64 {
        let mut added = 0.0;

        if new_state.is_active() {
            if !self.last_state.is_active() {
                self.last_active_transition = now;
            }
            // une horloge qui recule ne doit jamais faire baisser le compteur
            added = ((now - self.last_active_transition).as_seconds_f64() / SECONDS_PER_HOUR).max(0.0);
            self.cumulative_hours += added;
            self.last_active_transition = now;
        }

        self.last_state = new_state;
        added
    }
}

/// Les trois compteurs mis à jour à chaque cycle de collecte
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeTracks {
    pub overall: RuntimeTrack,
    pub brine_pump: RuntimeTrack,
    pub solar_pump: RuntimeTrack,
}

impl RuntimeTracks {
    pub fn seeded(record: &PersistedRecord, now: OffsetDateTime) -> Self {
        Self {
            overall: RuntimeTrack::new(record.runtime, now),
            brine_pump: RuntimeTrack::new(record.brine_pump_runtime, now),
            solar_pump: RuntimeTrack::new(record.solar_pump_runtime, now),
        }
    }

    pub fn observe(&mut self, sample: &Sample, now: OffsetDateTime) -> Runtimes {
        self.overall.update(sample.state, now);
        self.brine_pump.update(sample.brine_pump_state, now);
        self.solar_pump.update(sample.solar_pump_state, now);
        self.totals()
    }

    pub fn totals(&self) -> Runtimes {
        Runtimes {
            overall: self.overall.cumulative_hours(),
            brine_pump: self.brine_pump.cumulative_hours(),
            solar_pump: self.solar_pump.cumulative_hours(),
        }
    }
}
