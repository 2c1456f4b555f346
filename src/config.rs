/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::ConfigError;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub building: BuildingConfig,
    pub elevator: ElevatorConfig,
    pub door: DoorConfig,
    pub rider: RiderConfig,
    pub dispatch: DispatchConfig,
    pub simulation: SimulationConfig,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BuildingConfig {
    pub floors_above_ground: u8,
    pub floors_below_ground: u8,
    pub floor_height: f64,
    pub n_elevators: u8,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ElevatorConfig {
    pub capacity: usize,
    pub max_speed: f64,
    pub acceleration: f64,
    pub deceleration_threshold: f64,
    pub creep_speed: f64,
    pub tick_ms: u64,
}

/// Simulated duration of every door phase, in milliseconds.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DoorConfig {
    pub opening_start_ms: u64,
    pub opening_ms: u64,
    pub opened_ms: u64,
    pub waiting_start_ms: u64,
    pub waiting_ms: u64,
    pub waiting_finished_ms: u64,
    pub closing_start_ms: u64,
    pub closing_ms: u64,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct RiderConfig {
    pub poll_ms: u64,
    pub call_delay_ms: u64,
    pub cabin_button_delay_ms: u64,
    pub exit_delay_ms: u64,
    pub recall_timeout_ms: u64,
    pub repeat_journeys: bool,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DispatchConfig {
    pub poll_interval_ms: u64,
    pub reserve_on_assign: bool,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub workers: usize,
    pub speedup: f64,
    pub duration_secs: u64,
    pub status_interval_ms: u64,
    pub min_interval_ms: u64,
    pub density_ms: u64,
    pub ground_floor_ratio: f64,
}

/***************************************/
/*             Defaults                */
/***************************************/
impl Default for BuildingConfig {
    fn default() -> Self {
        BuildingConfig {
            floors_above_ground: 15,
            floors_below_ground: 2,
            floor_height: 3.0,
            n_elevators: 3,
        }
    }
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        ElevatorConfig {
            capacity: 15,
            max_speed: 2.5,
            acceleration: 1.0,
            deceleration_threshold: 1.0,
            creep_speed: 0.3,
            tick_ms: 50,
        }
    }
}

impl Default for DoorConfig {
    fn default() -> Self {
        DoorConfig {
            opening_start_ms: 100,
            opening_ms: 2000,
            opened_ms: 0,
            waiting_start_ms: 100,
            waiting_ms: 3000,
            waiting_finished_ms: 0,
            closing_start_ms: 0,
            closing_ms: 2000,
        }
    }
}

impl Default for RiderConfig {
    fn default() -> Self {
        RiderConfig {
            poll_ms: 50,
            call_delay_ms: 500,
            cabin_button_delay_ms: 1000,
            exit_delay_ms: 500,
            recall_timeout_ms: 60_000,
            repeat_journeys: false,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            poll_interval_ms: 100,
            reserve_on_assign: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            seed: 42,
            workers: 4,
            speedup: 10.0,
            duration_secs: 600,
            status_interval_ms: 5000,
            min_interval_ms: 2000,
            density_ms: 15_000,
            ground_floor_ratio: 0.5,
        }
    }
}

impl ElevatorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/***************************************/
/*             Public API              */
/***************************************/
impl Config {
    /// Rejects configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.building.floors_above_ground == 0 {
            return invalid("building.floors_above_ground must be at least 1");
        }
        if self.building.n_elevators == 0 {
            return invalid("building.n_elevators must be at least 1");
        }
        if !(self.building.floor_height > 0.0) {
            return invalid("building.floor_height must be positive");
        }
        if self.elevator.capacity == 0 {
            return invalid("elevator.capacity must be at least 1");
        }
        if !(self.elevator.max_speed > 0.0) || !(self.elevator.acceleration > 0.0) {
            return invalid("elevator.max_speed and elevator.acceleration must be positive");
        }
        if !(self.elevator.creep_speed > 0.0) {
            return invalid("elevator.creep_speed must be positive");
        }
        if self.elevator.tick_ms == 0 || self.rider.poll_ms == 0 {
            return invalid("elevator.tick_ms and rider.poll_ms must be non-zero");
        }
        if self.dispatch.poll_interval_ms == 0 {
            return invalid("dispatch.poll_interval_ms must be non-zero");
        }
        if self.simulation.workers == 0 {
            return invalid("simulation.workers must be at least 1");
        }
        if self.simulation.density_ms < self.simulation.min_interval_ms {
            return invalid("simulation.density_ms must not be below simulation.min_interval_ms");
        }
        if !(0.0..=1.0).contains(&self.simulation.ground_floor_ratio) {
            return invalid("simulation.ground_floor_ratio must be within [0, 1]");
        }
        Ok(())
    }
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.building.floors_above_ground, 15);
        assert_eq!(config.elevator.tick_ms, 50);
        assert_eq!(config.door.waiting_ms, 3000);
        assert!(!config.dispatch.reserve_on_assign);
    }

    #[test]
    fn test_partial_section_overrides() {
        let config = parse_config(
            "[building]\nn_elevators = 1\n\n[elevator]\ncapacity = 2\n",
        )
        .unwrap();

        assert_eq!(config.building.n_elevators, 1);
        assert_eq!(config.building.floors_above_ground, 15);
        assert_eq!(config.elevator.capacity, 2);
        assert_eq!(config.elevator.max_speed, 2.5);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            parse_config("[building]\nn_elevators = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse_config("[elevator]\ncapacity = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse_config("[building]\nfloor_height = -1.0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            parse_config("[building\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_repository_config_file_is_valid() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")).unwrap();

        assert_eq!(config.building.n_elevators, 3);
        assert_eq!(config.door.opening_ms, 2000);
    }
}
