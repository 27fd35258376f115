//! Per-vehicle drive-state machine: Stop, Go and Slowdown.
//!
//! Each state is a priority-ordered decision table over two inputs (the
//! governing signal color, if any, and the forward sensor reading) with one
//! output, the commanded target speed. The condition order inside each table
//! determines observable behavior for the tick after a signal change and
//! must not be rearranged.

use bevy::prelude::*;

use crate::simulation::motion::Speed;
use crate::simulation::sensing::SensorReading;
use crate::simulation::signals::{SignalColor, TrafficSignal};
use crate::simulation::zones::ActiveSignal;

/// Marker for entities driven by the drive-state machine.
#[derive(Component)]
pub struct CarDriver;

/// Authoring-time speed and rate parameters. Immutable during a run.
#[derive(Component, Clone)]
pub struct DriveConfig {
    /// Cruising target speed while in Go (units/sec).
    pub go_speed: f32,
    /// Reduced target speed while in Slowdown.
    pub slow_speed: f32,
    /// Speed gain rate when below target (units/sec^2).
    pub accel: f32,
    /// Speed loss rate when above target.
    pub brake: f32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            go_speed: 12.0,
            slow_speed: 6.0,
            accel: 8.0,
            brake: 14.0,
        }
    }
}

/// Everything a drive state reads when deciding what to do this tick.
#[derive(Clone, Copy, Debug)]
pub struct DriverInputs {
    /// Color of the signal governing the vehicle, `None` outside any zone.
    pub signal: Option<SignalColor>,
    pub obstacle_ahead: bool,
    pub obstacle_stopped_close: bool,
}

impl DriverInputs {
    fn red(&self) -> bool {
        self.signal == Some(SignalColor::Red)
    }

    fn orange(&self) -> bool {
        self.signal == Some(SignalColor::Orange)
    }

    fn green(&self) -> bool {
        self.signal == Some(SignalColor::Green)
    }
}

/// Behavioral states of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveState {
    /// Braking to a standstill; held by a red signal or a stopped car ahead.
    Stop,
    /// Cruising at the configured go speed.
    Go,
    /// Rolling at the reduced speed behind traffic or through an orange.
    Slowdown,
}

impl DriveState {
    /// Runs this state's decision table for one tick. Writes the commanded
    /// target speed through `target` and returns the requested transition
    /// (`None` = stay). The first matching condition wins.
    fn tick(self, inputs: &DriverInputs, config: &DriveConfig, target: &mut f32) -> Option<DriveState> {
        match self {
            DriveState::Stop => {
                // Braking engages before any exit condition is considered.
                *target = 0.0;

                if inputs.red() || inputs.obstacle_stopped_close {
                    return None;
                }
                if inputs.orange() || inputs.obstacle_ahead {
                    return Some(DriveState::Slowdown);
                }
                Some(DriveState::Go)
            }
            DriveState::Go => {
                if inputs.red() || inputs.obstacle_stopped_close {
                    return Some(DriveState::Stop);
                }
                if inputs.orange() || inputs.obstacle_ahead {
                    return Some(DriveState::Slowdown);
                }
                *target = config.go_speed;
                None
            }
            DriveState::Slowdown => {
                if inputs.red() || inputs.obstacle_stopped_close {
                    return Some(DriveState::Stop);
                }

                // Speed is committed before the exit checks below, so the
                // vehicle still rolls slow for the tick it leaves on.
                *target = config.slow_speed;

                if !inputs.obstacle_ahead && inputs.green() {
                    return Some(DriveState::Go);
                }
                // Outside any zone the signal imposes nothing; a clear road
                // is enough to speed back up.
                if inputs.signal.is_none() && !inputs.obstacle_ahead {
                    return Some(DriveState::Go);
                }
                None
            }
        }
    }

    /// Reserved hook, invoked once when switching into this state.
    fn enter(self) {
        trace!("drive state enter: {:?}", self);
    }

    /// Reserved hook, invoked once when switching out of this state.
    fn exit(self) {
        trace!("drive state exit: {:?}", self);
    }
}

/// Owns a vehicle's current drive state and performs guarded transitions.
#[derive(Component)]
pub struct StateMachine {
    current: Option<DriveState>,
    transitions: u32,
}

impl StateMachine {
    /// A machine already switched into Stop, the safe initial state: a
    /// freshly spawned vehicle never moves before its first full tick.
    pub fn new() -> Self {
        let mut machine = Self {
            current: None,
            transitions: 0,
        };
        machine.change(Some(DriveState::Stop));
        machine
    }

    pub fn current(&self) -> Option<DriveState> {
        self.current
    }

    /// Total completed transitions, including the initial switch into Stop.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Switches to `next`. Absent and same-state requests are no-ops; a real
    /// transition runs the outgoing state's exit hook before the incoming
    /// state's enter hook, in that order, never skipping either. Returns
    /// whether a transition happened.
    pub fn change(&mut self, next: Option<DriveState>) -> bool {
        let Some(next) = next else { return false };
        if self.current == Some(next) {
            return false;
        }

        if let Some(previous) = self.current {
            previous.exit();
        }
        self.current = Some(next);
        next.enter();
        self.transitions += 1;
        true
    }

    /// Runs one tick of the active state (no-op when uninitialized) and
    /// applies whatever transition it requests.
    pub fn tick(&mut self, inputs: &DriverInputs, config: &DriveConfig, target: &mut f32) {
        let Some(state) = self.current else { return };
        let next = state.tick(inputs, config, target);
        self.change(next);
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Ticks every vehicle's state machine against its sensor reading and the
/// signal currently governing it, if any.
pub fn tick_drivers(
    mut cars: Query<
        (&DriveConfig, &SensorReading, &ActiveSignal, &mut StateMachine, &mut Speed),
        With<CarDriver>,
    >,
    signals: Query<&TrafficSignal>,
) {
    for (config, reading, active, mut machine, mut speed) in cars.iter_mut() {
        // A stale reference to a despawned signal reads as no signal at all.
        let signal = active
            .get()
            .and_then(|entity| signals.get(entity).ok())
            .map(|signal| signal.color());

        let inputs = DriverInputs {
            signal,
            obstacle_ahead: reading.obstacle_ahead,
            obstacle_stopped_close: reading.obstacle_stopped_close,
        };

        let mut target = speed.target;
        machine.tick(&inputs, config, &mut target);
        speed.target = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(
        signal: Option<SignalColor>,
        obstacle_ahead: bool,
        obstacle_stopped_close: bool,
    ) -> DriverInputs {
        DriverInputs {
            signal,
            obstacle_ahead,
            obstacle_stopped_close,
        }
    }

    /// Runs one machine tick and returns (state afterwards, commanded target).
    fn tick_once(machine: &mut StateMachine, inputs: DriverInputs) -> (Option<DriveState>, f32) {
        let config = DriveConfig::default();
        let mut target = f32::NAN;
        machine.tick(&inputs, &config, &mut target);
        (machine.current(), target)
    }

    fn machine_in(state: DriveState) -> StateMachine {
        let mut machine = StateMachine::new();
        machine.change(Some(state));
        machine
    }

    #[test]
    fn starts_stopped() {
        assert_eq!(StateMachine::new().current(), Some(DriveState::Stop));
    }

    #[test]
    fn change_to_same_state_is_noop() {
        let mut machine = StateMachine::new();
        let before = machine.transitions();
        assert!(!machine.change(Some(DriveState::Stop)));
        assert_eq!(machine.transitions(), before);
    }

    #[test]
    fn change_to_none_is_noop() {
        let mut machine = StateMachine::new();
        let before = machine.transitions();
        assert!(!machine.change(None));
        assert_eq!(machine.current(), Some(DriveState::Stop));
        assert_eq!(machine.transitions(), before);
    }

    #[test]
    fn stop_holds_on_red_and_keeps_braking() {
        let mut machine = machine_in(DriveState::Stop);
        let (state, target) = tick_once(&mut machine, inputs(Some(SignalColor::Red), false, false));
        assert_eq!(state, Some(DriveState::Stop));
        assert_eq!(target, 0.0);
    }

    #[test]
    fn stop_holds_on_stopped_car_close_even_when_green() {
        let mut machine = machine_in(DriveState::Stop);
        let (state, target) = tick_once(&mut machine, inputs(Some(SignalColor::Green), true, true));
        assert_eq!(state, Some(DriveState::Stop));
        assert_eq!(target, 0.0);
    }

    #[test]
    fn stop_exits_to_slowdown_on_orange() {
        let mut machine = machine_in(DriveState::Stop);
        let (state, target) = tick_once(&mut machine, inputs(Some(SignalColor::Orange), false, false));
        assert_eq!(state, Some(DriveState::Slowdown));
        // Braking still commanded on the exit tick.
        assert_eq!(target, 0.0);
    }

    #[test]
    fn stop_exits_to_slowdown_on_moving_car_ahead() {
        let mut machine = machine_in(DriveState::Stop);
        let (state, _) = tick_once(&mut machine, inputs(None, true, false));
        assert_eq!(state, Some(DriveState::Slowdown));
    }

    #[test]
    fn stop_exits_to_go_when_clear() {
        let mut machine = machine_in(DriveState::Stop);
        let (state, target) = tick_once(&mut machine, inputs(Some(SignalColor::Green), false, false));
        assert_eq!(state, Some(DriveState::Go));
        assert_eq!(target, 0.0);
    }

    #[test]
    fn go_cruises_when_clear() {
        let mut machine = machine_in(DriveState::Go);
        let (state, target) = tick_once(&mut machine, inputs(Some(SignalColor::Green), false, false));
        assert_eq!(state, Some(DriveState::Go));
        assert_eq!(target, DriveConfig::default().go_speed);
    }

    #[test]
    fn go_stops_for_red_before_considering_orange_rules() {
        let mut machine = machine_in(DriveState::Go);
        let (state, _) = tick_once(&mut machine, inputs(Some(SignalColor::Red), true, false));
        assert_eq!(state, Some(DriveState::Stop));
    }

    #[test]
    fn go_stops_for_stopped_car_close() {
        let mut machine = machine_in(DriveState::Go);
        let (state, _) = tick_once(&mut machine, inputs(None, true, true));
        assert_eq!(state, Some(DriveState::Stop));
    }

    #[test]
    fn go_slows_for_orange() {
        let mut machine = machine_in(DriveState::Go);
        let (state, _) = tick_once(&mut machine, inputs(Some(SignalColor::Orange), false, false));
        assert_eq!(state, Some(DriveState::Slowdown));
    }

    #[test]
    fn go_slows_for_car_ahead_outside_any_zone() {
        let mut machine = machine_in(DriveState::Go);
        let (state, _) = tick_once(&mut machine, inputs(None, true, false));
        assert_eq!(state, Some(DriveState::Slowdown));
    }

    #[test]
    fn slowdown_holds_slow_speed_through_orange() {
        let mut machine = machine_in(DriveState::Slowdown);
        let (state, target) = tick_once(&mut machine, inputs(Some(SignalColor::Orange), false, false));
        assert_eq!(state, Some(DriveState::Slowdown));
        assert_eq!(target, DriveConfig::default().slow_speed);
    }

    #[test]
    fn slowdown_stops_for_red() {
        let mut machine = machine_in(DriveState::Slowdown);
        let (state, target) = tick_once(&mut machine, inputs(Some(SignalColor::Red), false, false));
        assert_eq!(state, Some(DriveState::Stop));
        // Red wins before the slow speed is committed.
        assert!(target.is_nan());
    }

    #[test]
    fn slowdown_resumes_go_on_green_when_clear() {
        let mut machine = machine_in(DriveState::Slowdown);
        let (state, target) = tick_once(&mut machine, inputs(Some(SignalColor::Green), false, false));
        assert_eq!(state, Some(DriveState::Go));
        // The slow speed still stands for the tick it leaves on.
        assert_eq!(target, DriveConfig::default().slow_speed);
    }

    #[test]
    fn slowdown_stays_on_green_while_car_ahead() {
        let mut machine = machine_in(DriveState::Slowdown);
        let (state, _) = tick_once(&mut machine, inputs(Some(SignalColor::Green), true, false));
        assert_eq!(state, Some(DriveState::Slowdown));
    }

    #[test]
    fn slowdown_resumes_go_outside_zone_once_road_clears() {
        let mut machine = machine_in(DriveState::Slowdown);
        let (state, _) = tick_once(&mut machine, inputs(None, false, false));
        assert_eq!(state, Some(DriveState::Go));
    }

    #[test]
    fn settles_to_go_on_an_open_road() {
        // Fresh vehicle, no signal, no obstacle: Stop -> Go, then stays.
        let mut machine = StateMachine::new();
        let clear = inputs(None, false, false);

        let (state, target) = tick_once(&mut machine, clear);
        assert_eq!(state, Some(DriveState::Go));
        assert_eq!(target, 0.0);

        for _ in 0..3 {
            let (state, target) = tick_once(&mut machine, clear);
            assert_eq!(state, Some(DriveState::Go));
            assert_eq!(target, DriveConfig::default().go_speed);
        }
    }

    #[test]
    fn next_state_is_pure_in_current_inputs() {
        // Same (state, inputs) tuple, different histories: identical result.
        let scenario = inputs(Some(SignalColor::Orange), true, false);

        let mut via_stop = machine_in(DriveState::Stop);
        via_stop.change(Some(DriveState::Go));
        let mut direct = machine_in(DriveState::Go);

        assert_eq!(tick_once(&mut via_stop, scenario).0, tick_once(&mut direct, scenario).0);
    }

    #[test]
    fn orange_then_orange_keeps_slow_speed() {
        // Go -> Slowdown on the orange tick, slow speed commanded next tick.
        let mut machine = machine_in(DriveState::Go);
        let orange = inputs(Some(SignalColor::Orange), false, false);

        let (state, _) = tick_once(&mut machine, orange);
        assert_eq!(state, Some(DriveState::Slowdown));

        let (state, target) = tick_once(&mut machine, orange);
        assert_eq!(state, Some(DriveState::Slowdown));
        assert_eq!(target, DriveConfig::default().slow_speed);
    }
}
