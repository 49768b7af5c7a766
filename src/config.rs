//! Controller configuration.
//!
//! [`ControllerConfig`] is the raw, serde-facing shape of the configuration
//! file.  Every tunable is optional there; [`ControllerConfig::validate`]
//! resolves defaults, range-checks values, normalizes the factor maps and
//! resolves every point mapping, producing an immutable [`Settings`].
//! Anything wrong at this stage is a [`ConfigFault`] and is fatal.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigFault;
use crate::zones::{FloorZone, RadiatorZone, Valve};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_CYCLE_TIME_SECS: u32 = 60;
pub const DEFAULT_WARM_FLAG_OFFSET: f64 = 0.0;
pub const DEFAULT_FREEZING_FLAG_OFFSET: f64 = 0.0;
pub const DEFAULT_UPDATE_THRESHOLD: f64 = 0.5;
pub const DEFAULT_FORCE_FLOW_OFFSET: f64 = 0.0;
pub const DEFAULT_RADIATOR_BOOST_THRESHOLD: f64 = 0.0;
pub const DEFAULT_FORCED_BURN_FACTOR: f64 = 1.0;
pub const DEFAULT_FORCED_BURN_THRESHOLD: f64 = 0.0;
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u32 = 30 * 60;
pub const DEFAULT_WARM_WATER_DURATION_SECS: u32 = 15 * 60;

pub const DEFAULT_WARM_WATER_REQUEST: &str = "input_boolean.temporary_ww";
pub const DEFAULT_WARM_WATER_STATE: &str = "input_boolean.ww_state";

const FLOOR_FACTORS: &str = "floor_factors";
const RADIATOR_FACTORS: &str = "radiator_factors";

// ---------------------------------------------------------------------------
// Raw file shape
// ---------------------------------------------------------------------------

/// Configuration as it appears on disk (JSON or YAML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default, alias = "config")]
    pub tuning: TuningConfig,
    /// Raw floor-heating factors keyed by [`FloorZone::name`].
    #[serde(default, alias = "wam_factors")]
    pub floor_factors: Option<BTreeMap<String, f64>>,
    /// Raw radiator factors keyed by [`RadiatorZone::name`].
    #[serde(default, alias = "rads_factors")]
    pub radiator_factors: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub points: PointConfig,
}

/// Tunables.  Missing entries fall back to the `DEFAULT_*` constants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuningConfig {
    #[serde(alias = "cycle_time")]
    pub cycle_time_secs: Option<u32>,
    pub warm_flag_offset: Option<f64>,
    #[serde(alias = "frezzing_flag_offset")]
    pub freezing_flag_offset: Option<f64>,
    #[serde(alias = "error_offset_update_threshold")]
    pub update_threshold: Option<f64>,
    #[serde(alias = "force_flow_off")]
    pub force_flow_offset: Option<f64>,
    pub radiator_boost_threshold: Option<f64>,
    #[serde(alias = "rads_error_factor")]
    pub forced_burn_factor: Option<f64>,
    #[serde(alias = "force_burn_thres")]
    pub forced_burn_threshold: Option<f64>,
    pub heartbeat_interval_secs: Option<u32>,
    pub warm_water_duration_secs: Option<u32>,
}

/// Entity ids of every point the controller reads or writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointConfig {
    /// Temperature error entities keyed by floor *and* radiator zone name.
    #[serde(default)]
    pub zone_errors: BTreeMap<String, String>,
    /// Valve position entities keyed by [`Valve::name`].
    #[serde(default)]
    pub valve_positions: BTreeMap<String, String>,
    /// Climate entities receiving boost presets, keyed by valve name.
    /// Optional; defaults to `climate.<valve>_trv`.
    #[serde(default)]
    pub valve_climates: BTreeMap<String, String>,
    /// User-facing setpoint entities keyed by radiator zone name.
    #[serde(default)]
    pub setpoint_inputs: BTreeMap<String, String>,
    /// Valve setpoint entities keyed by valve name.
    #[serde(default)]
    pub setpoint_outputs: BTreeMap<String, String>,

    pub warm_flag: Option<String>,
    pub freezing_flag: Option<String>,
    pub force_flow_flag: Option<String>,
    pub corridor_setpoint: Option<String>,
    pub thermostat_setpoint: Option<String>,
    pub wam_value: Option<String>,
    pub setpoint_offset: Option<String>,
    pub warm_water_request: Option<String>,
    pub warm_water_state: Option<String>,
}

// ---------------------------------------------------------------------------
// Validated settings
// ---------------------------------------------------------------------------

/// Normalized weights: non-negative sum of raw factors mapped to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightVector<const N: usize>([f64; N]);

impl<const N: usize> WeightVector<N> {
    /// Normalize raw factors looked up by `keys` (index, name).
    fn from_factors(
        map_name: &'static str,
        factors: Option<&BTreeMap<String, f64>>,
        keys: impl IntoIterator<Item = (usize, &'static str)>,
    ) -> Result<Self, ConfigFault> {
        let factors = match factors {
            Some(f) if !f.is_empty() => f,
            _ => return Err(ConfigFault::MissingFactors(map_name)),
        };

        let keys: Vec<(usize, &'static str)> = keys.into_iter().collect();
        let zones: Vec<&str> = keys.iter().map(|&(_, zone)| zone).collect();
        for name in unknown_factor_keys(factors, &zones) {
            warn!("Config: '{map_name}.{name}' is not a zone; it still counts toward the factor sum");
        }

        let sum: f64 = factors.values().sum();
        if !sum.is_finite() || sum <= 0.0 {
            return Err(ConfigFault::NonPositiveFactorSum(map_name));
        }

        let mut weights = [0.0; N];
        for (idx, zone) in keys {
            let raw = *factors.get(zone).ok_or(ConfigFault::MissingFactor {
                map: map_name,
                zone,
            })?;
            let weight = raw / sum;
            if !raw.is_finite() || !weight.is_finite() {
                return Err(ConfigFault::NonFiniteFactor { map: map_name, zone });
            }
            weights[idx] = weight;
        }
        Ok(Self(weights))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, idx: usize) -> f64 {
        self.0[idx]
    }
}

/// Factor keys that name no zone, in map order.
fn unknown_factor_keys<'a>(
    factors: &'a BTreeMap<String, f64>,
    zones: &'a [&str],
) -> impl Iterator<Item = &'a str> {
    factors
        .keys()
        .map(String::as_str)
        .filter(move |name| !zones.contains(name))
}

pub type FloorWeights = WeightVector<{ FloorZone::COUNT }>;
pub type RadiatorWeights = WeightVector<{ RadiatorZone::COUNT }>;

/// Fully-resolved entity ids.
#[derive(Debug, Clone, PartialEq)]
pub struct PointTable {
    pub floor_errors: [String; FloorZone::COUNT],
    pub radiator_errors: [String; RadiatorZone::COUNT],
    pub valve_positions: [String; Valve::COUNT],
    pub valve_climates: [String; Valve::COUNT],
    pub setpoint_inputs: [String; RadiatorZone::COUNT],
    pub setpoint_outputs: [String; Valve::COUNT],
    pub warm_flag: String,
    pub freezing_flag: String,
    pub force_flow_flag: String,
    pub corridor_setpoint: String,
    pub thermostat_setpoint: String,
    pub wam_value: String,
    pub setpoint_offset: String,
    pub warm_water_request: String,
    pub warm_water_state: String,
}

/// Immutable, validated configuration used by the running controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub cycle_time_secs: u32,
    pub warm_flag_offset: f64,
    pub freezing_flag_offset: f64,
    pub update_threshold: f64,
    pub force_flow_offset: f64,
    pub radiator_boost_threshold: f64,
    pub forced_burn_factor: f64,
    pub forced_burn_threshold: f64,
    pub heartbeat_interval_secs: u32,
    pub warm_water_duration_secs: u32,
    pub floor_weights: FloorWeights,
    pub radiator_weights: RadiatorWeights,
    pub points: PointTable,
}

impl Settings {
    /// Log the active tunables at debug level.
    pub fn log_summary(&self) {
        debug!("Config: cycle_time_secs: {}", self.cycle_time_secs);
        debug!("Config: warm_flag_offset: {}", self.warm_flag_offset);
        debug!("Config: freezing_flag_offset: {}", self.freezing_flag_offset);
        debug!("Config: update_threshold: {}", self.update_threshold);
        debug!("Config: force_flow_offset: {}", self.force_flow_offset);
        debug!("Config: radiator_boost_threshold: {}", self.radiator_boost_threshold);
        debug!("Config: forced_burn_factor: {}", self.forced_burn_factor);
        debug!("Config: forced_burn_threshold: {}", self.forced_burn_threshold);
        debug!("Config: floor_weights: {:?}", self.floor_weights.as_slice());
        debug!("Config: radiator_weights: {:?}", self.radiator_weights.as_slice());
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn or_default<T: Copy + core::fmt::Display>(key: &str, value: Option<T>, default: T) -> T {
    value.unwrap_or_else(|| {
        warn!("Config missing: 'tuning.{key}'. Using default {default}.");
        default
    })
}

fn require(
    section: &'static str,
    key: &'static str,
    value: Option<&String>,
) -> Result<String, ConfigFault> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(ConfigFault::MissingPoint { section, key }),
    }
}

fn resolve_map<const N: usize>(
    section: &'static str,
    map: &BTreeMap<String, String>,
    keys: impl IntoIterator<Item = (usize, &'static str)>,
) -> Result<[String; N], ConfigFault> {
    let mut out: [String; N] = core::array::from_fn(|_| String::new());
    for (idx, key) in keys {
        out[idx] = require(section, key, map.get(key))?;
    }
    Ok(out)
}

fn finite(value: f64, msg: &'static str) -> Result<f64, ConfigFault> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigFault::InvalidValue(msg))
    }
}

fn floor_keys() -> impl Iterator<Item = (usize, &'static str)> {
    FloorZone::ALL.into_iter().map(|z| (z.index(), z.name()))
}

fn radiator_keys() -> impl Iterator<Item = (usize, &'static str)> {
    RadiatorZone::ALL.into_iter().map(|z| (z.index(), z.name()))
}

fn valve_keys() -> impl Iterator<Item = (usize, &'static str)> {
    Valve::ALL.into_iter().map(|v| (v.index(), v.name()))
}

impl PointConfig {
    fn resolve(&self) -> Result<PointTable, ConfigFault> {
        let mut valve_climates: [String; Valve::COUNT] = core::array::from_fn(|_| String::new());
        for valve in Valve::ALL {
            valve_climates[valve.index()] = match self.valve_climates.get(valve.name()) {
                Some(id) if !id.trim().is_empty() => id.clone(),
                _ => format!("climate.{}_trv", valve.name()),
            };
        }

        Ok(PointTable {
            floor_errors: resolve_map("zone_errors", &self.zone_errors, floor_keys())?,
            radiator_errors: resolve_map("zone_errors", &self.zone_errors, radiator_keys())?,
            valve_positions: resolve_map("valve_positions", &self.valve_positions, valve_keys())?,
            valve_climates,
            setpoint_inputs: resolve_map("setpoint_inputs", &self.setpoint_inputs, radiator_keys())?,
            setpoint_outputs: resolve_map("setpoint_outputs", &self.setpoint_outputs, valve_keys())?,
            warm_flag: require("points", "warm_flag", self.warm_flag.as_ref())?,
            freezing_flag: require("points", "freezing_flag", self.freezing_flag.as_ref())?,
            force_flow_flag: require("points", "force_flow_flag", self.force_flow_flag.as_ref())?,
            corridor_setpoint: require("points", "corridor_setpoint", self.corridor_setpoint.as_ref())?,
            thermostat_setpoint: require(
                "points",
                "thermostat_setpoint",
                self.thermostat_setpoint.as_ref(),
            )?,
            wam_value: require("points", "wam_value", self.wam_value.as_ref())?,
            setpoint_offset: require("points", "setpoint_offset", self.setpoint_offset.as_ref())?,
            warm_water_request: self
                .warm_water_request
                .clone()
                .unwrap_or_else(|| DEFAULT_WARM_WATER_REQUEST.to_owned()),
            warm_water_state: self
                .warm_water_state
                .clone()
                .unwrap_or_else(|| DEFAULT_WARM_WATER_STATE.to_owned()),
        })
    }
}

impl ControllerConfig {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigFault> {
        serde_json::from_str(text).map_err(|e| ConfigFault::Parse(e.to_string()))
    }

    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigFault> {
        serde_yaml::from_str(text).map_err(|e| ConfigFault::Parse(e.to_string()))
    }

    /// Resolve defaults, range-check and normalize into [`Settings`].
    pub fn validate(&self) -> Result<Settings, ConfigFault> {
        let t = &self.tuning;

        let cycle_time_secs = or_default("cycle_time_secs", t.cycle_time_secs, DEFAULT_CYCLE_TIME_SECS);
        if !(1..=3600).contains(&cycle_time_secs) {
            return Err(ConfigFault::InvalidValue("cycle_time_secs must be 1–3600"));
        }

        let update_threshold = finite(
            or_default("update_threshold", t.update_threshold, DEFAULT_UPDATE_THRESHOLD),
            "update_threshold must be finite",
        )?;
        if update_threshold < 0.0 {
            return Err(ConfigFault::InvalidValue("update_threshold must be >= 0"));
        }

        let heartbeat_interval_secs = or_default(
            "heartbeat_interval_secs",
            t.heartbeat_interval_secs,
            DEFAULT_HEARTBEAT_INTERVAL_SECS,
        );
        if heartbeat_interval_secs == 0 {
            return Err(ConfigFault::InvalidValue("heartbeat_interval_secs must be >= 1"));
        }

        let warm_water_duration_secs = or_default(
            "warm_water_duration_secs",
            t.warm_water_duration_secs,
            DEFAULT_WARM_WATER_DURATION_SECS,
        );
        if warm_water_duration_secs == 0 {
            return Err(ConfigFault::InvalidValue("warm_water_duration_secs must be >= 1"));
        }

        Ok(Settings {
            cycle_time_secs,
            warm_flag_offset: finite(
                or_default("warm_flag_offset", t.warm_flag_offset, DEFAULT_WARM_FLAG_OFFSET),
                "warm_flag_offset must be finite",
            )?,
            freezing_flag_offset: finite(
                or_default(
                    "freezing_flag_offset",
                    t.freezing_flag_offset,
                    DEFAULT_FREEZING_FLAG_OFFSET,
                ),
                "freezing_flag_offset must be finite",
            )?,
            update_threshold,
            force_flow_offset: finite(
                or_default("force_flow_offset", t.force_flow_offset, DEFAULT_FORCE_FLOW_OFFSET),
                "force_flow_offset must be finite",
            )?,
            radiator_boost_threshold: finite(
                or_default(
                    "radiator_boost_threshold",
                    t.radiator_boost_threshold,
                    DEFAULT_RADIATOR_BOOST_THRESHOLD,
                ),
                "radiator_boost_threshold must be finite",
            )?,
            forced_burn_factor: finite(
                or_default("forced_burn_factor", t.forced_burn_factor, DEFAULT_FORCED_BURN_FACTOR),
                "forced_burn_factor must be finite",
            )?,
            forced_burn_threshold: finite(
                or_default(
                    "forced_burn_threshold",
                    t.forced_burn_threshold,
                    DEFAULT_FORCED_BURN_THRESHOLD,
                ),
                "forced_burn_threshold must be finite",
            )?,
            heartbeat_interval_secs,
            warm_water_duration_secs,
            floor_weights: WeightVector::from_factors(
                FLOOR_FACTORS,
                self.floor_factors.as_ref(),
                floor_keys(),
            )?,
            radiator_weights: WeightVector::from_factors(
                RADIATOR_FACTORS,
                self.radiator_factors.as_ref(),
                radiator_keys(),
            )?,
            points: self.points.resolve()?,
        })
    }

    /// A complete configuration with equal factors and conventional entity
    /// ids.  Useful as a starting point for a real file.
    pub fn sample() -> Self {
        let floor_factors = FloorZone::ALL
            .iter()
            .map(|z| (z.name().to_owned(), 1.0))
            .collect();
        let radiator_factors = RadiatorZone::ALL
            .iter()
            .map(|z| (z.name().to_owned(), 1.0))
            .collect();

        let zone_errors = FloorZone::ALL
            .iter()
            .map(|z| z.name())
            .chain(RadiatorZone::ALL.iter().map(|z| z.name()))
            .map(|name| (name.to_owned(), format!("sensor.{name}_terror")))
            .collect();
        let valve_positions = Valve::ALL
            .iter()
            .map(|v| (v.name().to_owned(), format!("sensor.{}_trv_position", v.name())))
            .collect();
        let setpoint_inputs = RadiatorZone::ALL
            .iter()
            .map(|z| (z.name().to_owned(), format!("input_number.{}_setpoint", z.name())))
            .collect();
        let setpoint_outputs = Valve::ALL
            .iter()
            .map(|v| (v.name().to_owned(), format!("climate.{}_trv", v.name())))
            .collect();

        Self {
            tuning: TuningConfig {
                cycle_time_secs: Some(DEFAULT_CYCLE_TIME_SECS),
                warm_flag_offset: Some(DEFAULT_WARM_FLAG_OFFSET),
                freezing_flag_offset: Some(DEFAULT_FREEZING_FLAG_OFFSET),
                update_threshold: Some(DEFAULT_UPDATE_THRESHOLD),
                force_flow_offset: Some(DEFAULT_FORCE_FLOW_OFFSET),
                radiator_boost_threshold: Some(DEFAULT_RADIATOR_BOOST_THRESHOLD),
                forced_burn_factor: Some(DEFAULT_FORCED_BURN_FACTOR),
                forced_burn_threshold: Some(DEFAULT_FORCED_BURN_THRESHOLD),
                heartbeat_interval_secs: Some(DEFAULT_HEARTBEAT_INTERVAL_SECS),
                warm_water_duration_secs: Some(DEFAULT_WARM_WATER_DURATION_SECS),
            },
            floor_factors: Some(floor_factors),
            radiator_factors: Some(radiator_factors),
            points: PointConfig {
                zone_errors,
                valve_positions,
                valve_climates: BTreeMap::new(),
                setpoint_inputs,
                setpoint_outputs,
                warm_flag: Some("input_boolean.make_warm".to_owned()),
                freezing_flag: Some("input_boolean.freezing_forecast".to_owned()),
                force_flow_flag: Some("input_boolean.force_flow".to_owned()),
                corridor_setpoint: Some("input_number.corridor_setpoint".to_owned()),
                thermostat_setpoint: Some("number.thermostat_setpoint".to_owned()),
                wam_value: Some("input_number.sh_wam_value".to_owned()),
                setpoint_offset: Some("input_number.sh_setpoint_offset".to_owned()),
                warm_water_request: None,
                warm_water_state: None,
            },
        }
    }
}
