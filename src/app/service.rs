//! Application service: the hexagonal core.
//!
//! [`HeatingService`] owns the FSM, the cycle context, the safety
//! supervisor and the scheduler.  All I/O flows through port traits
//! injected at call sites, so the entire service is testable with mock
//! adapters.
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!  DevicePort ◀──▶│        HeatingService        │ ──▶ EventSink
//!                 │ FSM · Safety · Scheduler     │
//!  AppCommand ──▶ │ Warm water · Output memory   │
//!                 └──────────────────────────────┘
//! ```
//!
//! One cycle: read every input → evaluate (rule chain, boost policy,
//! gate) → write diagnostics, boosts, offset and thermostat → report.
//! Any fault inside a cycle, panics included, latches `Safe` and cancels
//! the cycle and heartbeat timers.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::config::{ControllerConfig, PointTable, Settings};
use crate::control::gate::MIN_SETPOINT;
use crate::control::CycleDecision;
use crate::diagnostics::{panic_reason, HeartbeatData, LoopTiming, OutputMemory};
use crate::error::{ConfigFault, Error, HardwareFault};
use crate::fsm::context::CycleContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::hal;
use crate::safety::SafetySupervisor;
use crate::scheduler::{Schedule, ScheduleKind, ScheduleSlot, Scheduler};
use crate::warm_water::{WarmWaterAction, WarmWaterTimer, WARM_WATER_LABEL};
use crate::zones::{RadiatorZone, Valve};

use super::commands::AppCommand;
use super::events::{AppEvent, OutputReport};
use super::ports::{
    is_unavailable, DevicePort, EventSink, ScheduleFiredKind, SchedulerDelegate, ServiceCall,
};

/// Scheduler label of the control cycle.
pub const MAIN_LOOP_LABEL: &str = "main_loop";
/// Scheduler label of the health report.
pub const HEARTBEAT_LABEL: &str = "heartbeat";

/// Preset sent to valves that need boosting.
pub const BOOST_PRESET: &str = "boost";

// ───────────────────────────────────────────────────────────────
// Timer dispatch
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    MainLoop,
    Heartbeat,
    WarmWater,
}

/// Collects fired timers during a scheduler tick.
#[derive(Default)]
struct FiredTimers(heapless::Vec<Timer, 4>);

impl SchedulerDelegate for FiredTimers {
    fn on_schedule_fired(&mut self, label: &str, _kind: ScheduleFiredKind) {
        let timer = match label {
            MAIN_LOOP_LABEL => Timer::MainLoop,
            HEARTBEAT_LABEL => Timer::Heartbeat,
            WARM_WATER_LABEL => Timer::WarmWater,
            other => {
                warn!("Unknown schedule '{other}' fired");
                return;
            }
        };
        let _ = self.0.push(timer);
    }
}

// ───────────────────────────────────────────────────────────────
// HeatingService
// ───────────────────────────────────────────────────────────────

/// The heating controller.
pub struct HeatingService {
    fsm: Fsm,
    ctx: CycleContext,
    safety: SafetySupervisor,
    scheduler: Scheduler,
    warm_water: WarmWaterTimer,
    outputs: OutputMemory,
    timing: LoopTiming,
    main_slot: Option<ScheduleSlot>,
    heartbeat_slot: Option<ScheduleSlot>,
    cycle_count: u64,
}

impl HeatingService {
    /// Construct the service from validated settings.
    ///
    /// Does **not** start anything: call [`start`](Self::start) next.
    pub fn new(settings: Settings) -> Self {
        let warm_water = WarmWaterTimer::new(settings.warm_water_duration_secs);
        Self {
            fsm: Fsm::new(build_state_table(), StateId::Idle),
            ctx: CycleContext::new(settings),
            safety: SafetySupervisor::new(),
            scheduler: Scheduler::new(),
            warm_water,
            outputs: OutputMemory::new(),
            timing: LoopTiming::new(),
            main_slot: None,
            heartbeat_slot: None,
            cycle_count: 0,
        }
    }

    /// Validate a raw configuration and construct the service.
    pub fn from_config(config: &ControllerConfig) -> Result<Self, ConfigFault> {
        config.validate().map(Self::new)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Register timers and initialize the warm-water request entity.
    ///
    /// Any failure here is fatal; the caller must not keep polling.
    pub fn start(
        &mut self,
        dev: &mut impl DevicePort,
        sink: &mut impl EventSink,
    ) -> crate::error::Result<()> {
        self.fsm.start(&mut self.ctx);
        self.outputs = OutputMemory::new();

        let settings = &self.ctx.settings;
        self.main_slot = self.scheduler.add(Schedule {
            label: MAIN_LOOP_LABEL,
            kind: ScheduleKind::Periodic {
                interval_secs: settings.cycle_time_secs,
            },
        });
        self.heartbeat_slot = self.scheduler.add(Schedule {
            label: HEARTBEAT_LABEL,
            kind: ScheduleKind::Periodic {
                interval_secs: settings.heartbeat_interval_secs,
            },
        });

        let request = settings.points.warm_water_request.clone();
        dev.set_state(&request, "off").map_err(|e| {
            error!("Could not initialize '{request}': {e}");
            Error::Hardware(HardwareFault::DeviceCallFailed)
        })?;
        info!("Temporary warm water initialized on '{request}'");

        debug!("Initialization finished");
        self.ctx.settings.log_summary();

        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("HeatingService started in {:?}", self.fsm.current_state());
        Ok(())
    }

    /// Advance all timers by `tick_secs` and run whatever fired.
    pub fn poll(&mut self, tick_secs: f64, dev: &mut impl DevicePort, sink: &mut impl EventSink) {
        let mut fired = FiredTimers::default();
        self.scheduler.tick(tick_secs, &mut fired);

        for timer in fired.0 {
            match timer {
                Timer::MainLoop => self.run_cycle(dev, sink),
                Timer::Heartbeat => self.heartbeat(sink),
                Timer::WarmWater => self.warm_water_expired(dev, sink),
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external notification.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        dev: &mut impl DevicePort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::RunCycle => self.run_cycle(dev, sink),
            AppCommand::StateChanged { entity, old, new } => {
                self.on_state_changed(&entity, old.as_deref(), new.as_deref(), dev, sink);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Latched fault bitmask (0 = healthy).
    pub fn fault_flags(&self) -> u8 {
        self.safety.faults()
    }

    pub fn settings(&self) -> &Settings {
        &self.ctx.settings
    }

    /// Decision of the last successful cycle.
    pub fn last_decision(&self) -> Option<&CycleDecision> {
        self.ctx.decision.as_ref()
    }

    pub fn outputs(&self) -> &OutputMemory {
        &self.outputs
    }

    /// Cycles attempted since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Whether the control cycle timer is still registered.
    pub fn cycle_timer_active(&self) -> bool {
        self.main_slot.is_some_and(|s| self.scheduler.is_live(s))
    }

    /// Whether the heartbeat timer is still registered.
    pub fn heartbeat_timer_active(&self) -> bool {
        self.heartbeat_slot.is_some_and(|s| self.scheduler.is_live(s))
    }

    /// Whether a temporary warm-water expiry is pending.
    pub fn warm_water_active(&self) -> bool {
        self.warm_water.is_running(&self.scheduler)
    }

    /// Entities whose changes [`handle_command`](Self::handle_command)
    /// reacts to.
    pub fn watched_entities(&self) -> Vec<String> {
        let p = &self.ctx.settings.points;
        let mut out = vec![
            p.warm_flag.clone(),
            p.freezing_flag.clone(),
            p.force_flow_flag.clone(),
            p.warm_water_request.clone(),
        ];
        out.extend(p.setpoint_inputs.iter().cloned());
        out
    }

    // ── Control cycle ─────────────────────────────────────────

    fn run_cycle(&mut self, dev: &mut impl DevicePort, sink: &mut impl EventSink) {
        if self.fsm.current_state() == StateId::Safe {
            debug!("Cycle skipped: controller is in safe state");
            return;
        }

        let start = Instant::now();
        let prev = self.fsm.current_state();
        self.cycle_count += 1;

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.cycle_body(dev, sink))) {
            Ok(outcome) => outcome.map_err(|f| (f, f.to_string())),
            Err(payload) => Err((
                HardwareFault::CycleAborted,
                panic_reason(payload.as_ref()).to_owned(),
            )),
        };

        if let Err((fault, detail)) = outcome {
            self.enter_safe_state(fault, &detail, sink);
        }
        self.timing.record(start);

        let now = self.fsm.current_state();
        if now != prev {
            sink.emit(&AppEvent::StateChanged { from: prev, to: now });
        }
    }

    fn cycle_body(
        &mut self,
        dev: &mut impl DevicePort,
        sink: &mut impl EventSink,
    ) -> Result<(), HardwareFault> {
        self.ctx.inputs = hal::collect_inputs(dev, &self.ctx.settings.points)?;

        self.fsm.force_transition(StateId::Running, &mut self.ctx);
        self.fsm.tick(&mut self.ctx);

        let Some(decision) = self.ctx.decision.as_ref() else {
            let fault = HardwareFault::ALL
                .into_iter()
                .find(|f| self.ctx.has_fault(*f))
                .unwrap_or(HardwareFault::CycleAborted);
            return Err(fault);
        };

        Self::apply(&self.ctx.settings.points, decision, dev)?;

        let inputs = &self.ctx.inputs;
        if self.outputs.update(
            decision.offset,
            decision.gate.candidate,
            decision.gate.write(),
            &decision.reasons,
        ) {
            sink.emit(&AppEvent::OutputChanged(OutputReport {
                offset: decision.offset,
                setpoint: decision.gate.candidate,
                written: decision.gate.write(),
                reasons: decision.reasons.clone(),
                corridor_setpoint: inputs.corridor_setpoint,
                wam: decision.wam,
                max_radiator_error: inputs.max_radiator_error(),
                force_flow: inputs.flags.force_flow,
            }));
        }
        Ok(())
    }

    /// Push a decision to the devices: diagnostics value, valve boosts,
    /// offset, then the thermostat if the gate opened.
    fn apply(
        points: &PointTable,
        decision: &CycleDecision,
        dev: &mut impl DevicePort,
    ) -> Result<(), HardwareFault> {
        hal::write_number(dev, &points.wam_value, decision.wam, None)?;

        for valve in Valve::ALL {
            if decision.boosts[valve.index()] {
                hal::call(
                    dev,
                    &ServiceCall::SetPresetMode {
                        entity: points.valve_climates[valve.index()].clone(),
                        preset: BOOST_PRESET.to_owned(),
                    },
                )?;
                debug!("Forcing boost for {}", valve.name());
            }
        }

        hal::write_number(dev, &points.setpoint_offset, decision.offset, None)?;

        if let Some(setpoint) = decision.gate.setpoint {
            hal::write_number(dev, &points.thermostat_setpoint, setpoint, Some(MIN_SETPOINT))?;
            debug!("Thermostat setpoint written: {setpoint}");
        } else {
            debug!(
                "Thermostat setpoint held: candidate {} within threshold",
                decision.gate.candidate
            );
        }
        Ok(())
    }

    fn enter_safe_state(&mut self, fault: HardwareFault, detail: &str, sink: &mut impl EventSink) {
        error!("HW ERROR: {detail}");
        if self.safety.record(fault, detail) {
            sink.emit(&AppEvent::FaultDetected(fault));
        }
        self.ctx.fault_flags = self.safety.faults();
        self.fsm.force_transition(StateId::Safe, &mut self.ctx);

        if let Some(slot) = self.main_slot.take() {
            self.scheduler.remove(slot);
            error!("Safe state: main loop timer cancelled.");
        }
        if let Some(slot) = self.heartbeat_slot.take() {
            self.scheduler.remove(slot);
            error!("Safe state: heartbeat timer cancelled.");
        }
        sink.emit(&AppEvent::EnteredSafeState(self.safety.faults()));
    }

    // ── Heartbeat ─────────────────────────────────────────────

    fn heartbeat(&self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Heartbeat(HeartbeatData::collect(
            &self.outputs,
            &self.timing,
        )));
    }

    // ── State-change listeners ────────────────────────────────

    fn on_state_changed(
        &mut self,
        entity: &str,
        old: Option<&str>,
        new: Option<&str>,
        dev: &mut impl DevicePort,
        sink: &mut impl EventSink,
    ) {
        let points = &self.ctx.settings.points;

        if [&points.warm_flag, &points.freezing_flag, &points.force_flow_flag]
            .iter()
            .any(|f| f.as_str() == entity)
        {
            Self::flag_changed(entity, old, new, sink);
        }

        if let Some(zone) = RadiatorZone::ALL
            .into_iter()
            .find(|z| points.setpoint_inputs[z.index()] == entity)
        {
            Self::relay_setpoint(points, zone, entity, new, dev, sink);
        }

        if points.warm_water_request == entity {
            self.warm_water_request(old, new, dev, sink);
        }
    }

    fn flag_changed(entity: &str, old: Option<&str>, new: Option<&str>, sink: &mut impl EventSink) {
        if is_unavailable(old) && is_unavailable(new) {
            return;
        }
        if old != new {
            sink.emit(&AppEvent::FlagChanged {
                entity: entity.to_owned(),
                old: old.map(str::to_owned),
                new: new.map(str::to_owned),
            });
        }
    }

    /// Forward a zone's user setpoint to each of its valves.
    fn relay_setpoint(
        points: &PointTable,
        zone: RadiatorZone,
        entity: &str,
        new: Option<&str>,
        dev: &mut impl DevicePort,
        sink: &mut impl EventSink,
    ) {
        debug!("Setpoint update entity:{entity} zone:{} new:{new:?}", zone.name());
        if is_unavailable(new) {
            error!("Setpoint update ignored due to invalid state for {entity}: {new:?}");
            return;
        }
        let raw = new.unwrap_or_default();
        let Some(temperature) = hal::parse_number(raw) else {
            error!("Setpoint update ignored due to non-numeric state for {entity}: '{raw}'");
            return;
        };

        for valve in zone.valves() {
            let target = points.setpoint_outputs[valve.index()].clone();
            let call = ServiceCall::SetTemperature {
                entity: target.clone(),
                temperature,
            };
            match hal::call(dev, &call) {
                Ok(()) => sink.emit(&AppEvent::SetpointRelayed {
                    entity: target,
                    temperature,
                }),
                Err(fault) => error!("Setpoint relay to '{target}' failed: {fault}"),
            }
        }
    }

    // ── Temporary warm water ──────────────────────────────────

    fn warm_water_request(
        &mut self,
        old: Option<&str>,
        new: Option<&str>,
        dev: &mut impl DevicePort,
        sink: &mut impl EventSink,
    ) {
        match self.warm_water.on_request(old, new, &mut self.scheduler) {
            WarmWaterAction::Started => sink.emit(&AppEvent::WarmWaterStarted {
                duration_secs: self.warm_water.duration_secs(),
            }),
            WarmWaterAction::Stop => self.warm_water_off(false, dev, sink),
            WarmWaterAction::Ignore => {}
        }
    }

    fn warm_water_expired(&mut self, dev: &mut impl DevicePort, sink: &mut impl EventSink) {
        self.warm_water.on_expired();
        self.warm_water_off(true, dev, sink);
    }

    fn warm_water_off(&self, expired: bool, dev: &mut impl DevicePort, sink: &mut impl EventSink) {
        let call = ServiceCall::TurnOff {
            entity: self.ctx.settings.points.warm_water_state.clone(),
        };
        match hal::call(dev, &call) {
            Ok(()) => {
                info!("Warm water turned off.");
                sink.emit(&AppEvent::WarmWaterStopped { expired });
            }
            Err(fault) => error!("Could not turn warm water off: {fault}"),
        }
    }
}
