/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{info, warn};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub building: BuildingConfig,
    pub elevator: ElevatorConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BuildingConfig {
    pub min_floor: i32,
    pub max_floors: i32,
    pub elevator_count: u32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ElevatorConfig {
    pub floor_travel_time_ms: u64,
    pub door_action_time_ms: u64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        BuildingConfig {
            min_floor: 1,
            max_floors: 10,
            elevator_count: 3,
        }
    }
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        ElevatorConfig {
            floor_travel_time_ms: 1000,
            door_action_time_ms: 2000,
        }
    }
}

impl BuildingConfig {
    pub fn contains(&self, floor: i32) -> bool {
        floor >= self.min_floor && floor <= self.max_floors
    }

    /// Elevators start on floor 1, pulled into range for buildings that don't have one.
    pub fn start_floor(&self) -> i32 {
        1.clamp(self.min_floor, self.max_floors)
    }
}

impl ElevatorConfig {
    pub fn travel_interval(&self) -> Duration {
        Duration::from_millis(self.floor_travel_time_ms)
    }

    pub fn door_interval(&self) -> Duration {
        Duration::from_millis(self.door_action_time_ms)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {key} has invalid value {value:?}")]
    Env { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/***************************************/
/*             Public API              */
/***************************************/

/// Reads `path`, applies environment overrides, and validates the result.
/// A missing file is not an error; defaults are used instead.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = match fs::read_to_string(path) {
        Ok(config_str) => parse_config(&config_str)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                "No configuration file at {}, using default settings",
                path.display()
            );
            Config::default()
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let config = apply_overrides(config, |key| env::var(key).ok())?;
    config.validate()?;

    info!(
        "Loaded configuration: floors {}..={}, {} elevators, travel {} ms, doors {} ms",
        config.building.min_floor,
        config.building.max_floors,
        config.building.elevator_count,
        config.elevator.floor_travel_time_ms,
        config.elevator.door_action_time_ms
    );
    Ok(config)
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(config_str)?)
}

/// Overrides file values with `FLOOR_TRAVEL_TIME_MS`, `DOOR_ACTION_TIME_MS`,
/// `MAX_FLOORS`, `MIN_FLOOR` and `ELEVATOR_COUNT` as returned by `lookup`.
pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = parse_var(&lookup, "FLOOR_TRAVEL_TIME_MS")? {
        config.elevator.floor_travel_time_ms = v;
    }
    if let Some(v) = parse_var(&lookup, "DOOR_ACTION_TIME_MS")? {
        config.elevator.door_action_time_ms = v;
    }
    if let Some(v) = parse_var(&lookup, "MAX_FLOORS")? {
        config.building.max_floors = v;
    }
    if let Some(v) = parse_var(&lookup, "MIN_FLOOR")? {
        config.building.min_floor = v;
    }
    if let Some(v) = parse_var(&lookup, "ELEVATOR_COUNT")? {
        config.building.elevator_count = v;
    }
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.building.max_floors < self.building.min_floor {
            return Err(ConfigError::Invalid(format!(
                "max_floors ({}) is below min_floor ({})",
                self.building.max_floors, self.building.min_floor
            )));
        }
        if self.building.elevator_count == 0 {
            return Err(ConfigError::Invalid(
                "elevator_count must be at least 1".to_string(),
            ));
        }
        if self.elevator.floor_travel_time_ms == 0 || self.elevator.door_action_time_ms == 0 {
            return Err(ConfigError::Invalid(
                "travel and door times must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/***************************************/
/*          Private helpers            */
/***************************************/
fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::Env {
                key: key.to_string(),
                value,
            }),
        },
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
