//! Point access on top of [`DevicePort`].
//!
//! Reads coerce raw entity states into numbers and flags, degrading to a
//! per-field default when a device is unavailable.  Numeric writes are
//! routed by the target's domain.  A blank point id is always a
//! [`HardwareFault::MissingPoint`]; nothing here guesses an entity.

use log::{debug, error, warn};

use crate::app::ports::{is_unavailable, DevicePort, DeviceError, NumericDomain, ServiceCall};
use crate::config::PointTable;
use crate::error::HardwareFault;
use crate::fsm::context::{CycleInputs, Flags, DEFAULT_VALVE_POSITION};
use crate::zones::{FloorZone, RadiatorZone, Valve};

/// Default for unreadable zone errors.
pub const DEFAULT_ERROR: f64 = 0.0;
/// Default for unreadable setpoints.
pub const DEFAULT_SETPOINT: f64 = 0.0;

fn require_point(entity: &str, op: &str) -> Result<(), HardwareFault> {
    if entity.trim().is_empty() {
        error!("HAL entity is missing for {op}.");
        return Err(HardwareFault::MissingPoint);
    }
    Ok(())
}

/// Parse a numeric state.  `None` for states that are not numbers.
pub fn parse_number(state: &str) -> Option<f64> {
    state.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a number, falling back to `default` when the entity is unavailable
/// or its state is not numeric.
pub fn read_number(
    dev: &impl DevicePort,
    entity: &str,
    default: f64,
) -> Result<f64, HardwareFault> {
    require_point(entity, "value lookup")?;
    let state = dev.state(entity);
    if is_unavailable(state.as_deref()) {
        error!("HAL state invalid for '{entity}': {state:?}");
        return Ok(default);
    }
    let raw = state.unwrap_or_default();
    Ok(parse_number(&raw).unwrap_or_else(|| {
        warn!("Could not convert '{raw}' from '{entity}' to a number; using {default}");
        default
    }))
}

/// Read an on/off flag.  Anything but `on` reads as off.
pub fn read_flag(dev: &impl DevicePort, entity: &str) -> Result<bool, HardwareFault> {
    require_point(entity, "flag lookup")?;
    let state = dev.state(entity);
    if is_unavailable(state.as_deref()) {
        error!("HAL state invalid for '{entity}': {state:?}");
        return Ok(false);
    }
    Ok(state.as_deref() == Some("on"))
}

/// Issue a service call, mapping platform errors to a fault.
pub fn call(dev: &mut impl DevicePort, call: &ServiceCall) -> Result<(), HardwareFault> {
    require_point(call.entity(), "service call")?;
    dev.call_service(call).map_err(|e: DeviceError| {
        error!("{} on '{}' failed: {e}", call.service(), call.entity());
        HardwareFault::DeviceCallFailed
    })
}

/// Write a number to an `input_number.*` or `number.*` entity, optionally
/// raised to at least `min`.
pub fn write_number(
    dev: &mut impl DevicePort,
    entity: &str,
    value: f64,
    min: Option<f64>,
) -> Result<(), HardwareFault> {
    require_point(entity, "set operation")?;
    let value = min.map_or(value, |m| value.max(m));
    let Some(domain) = NumericDomain::of(entity) else {
        error!("Unsupported entity domain for set_value: '{entity}'");
        return Err(HardwareFault::UnsupportedTarget);
    };
    call(
        dev,
        &ServiceCall::SetValue {
            domain,
            entity: entity.to_owned(),
            value,
        },
    )
}

/// Read every input of a cycle.
pub fn collect_inputs(
    dev: &impl DevicePort,
    points: &PointTable,
) -> Result<CycleInputs, HardwareFault> {
    let mut inputs = CycleInputs {
        thermostat_setpoint: read_number(dev, &points.thermostat_setpoint, DEFAULT_SETPOINT)?,
        corridor_setpoint: read_number(dev, &points.corridor_setpoint, DEFAULT_SETPOINT)?,
        flags: Flags {
            warm: read_flag(dev, &points.warm_flag)?,
            freezing: read_flag(dev, &points.freezing_flag)?,
            force_flow: read_flag(dev, &points.force_flow_flag)?,
        },
        ..CycleInputs::default()
    };

    for zone in FloorZone::ALL {
        let i = zone.index();
        inputs.floor_errors[i] = read_number(dev, &points.floor_errors[i], DEFAULT_ERROR)?;
    }
    for zone in RadiatorZone::ALL {
        let i = zone.index();
        inputs.radiator_errors[i] = read_number(dev, &points.radiator_errors[i], DEFAULT_ERROR)?;
    }
    for valve in Valve::ALL {
        let i = valve.index();
        inputs.valve_positions[i] =
            read_number(dev, &points.valve_positions[i], DEFAULT_VALVE_POSITION)?;
    }

    debug!("Variable: thermostat_setpoint: {}", inputs.thermostat_setpoint);
    debug!("Variable: corridor_setpoint: {}", inputs.corridor_setpoint);
    debug!("Variable: floor_errors: {:?}", inputs.floor_errors);
    debug!("Variable: radiator_errors: {:?}", inputs.radiator_errors);
    debug!("Variable: flags: {:?}", inputs.flags);
    debug!("Variable: valve_positions: {:?}", inputs.valve_positions);
    Ok(inputs)
}
