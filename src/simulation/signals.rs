//! Traffic signals: the color state vehicles read, plus the host-side
//! drivers that mutate it (a fixed cycle timer and manual override keys).

use bevy::prelude::*;

use crate::simulation::SimulationConfig;

/// Discrete signal color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignalColor {
    #[default]
    Red,
    Orange,
    Green,
}

/// One traffic light. Read-only from the vehicles' perspective; color
/// changes come only from [`SignalCycle`] or the override keys.
#[derive(Component)]
pub struct TrafficSignal {
    color: SignalColor,
}

impl TrafficSignal {
    pub fn new(color: SignalColor) -> Self {
        Self { color }
    }

    pub fn color(&self) -> SignalColor {
        self.color
    }

    pub fn is_red(&self) -> bool {
        self.color == SignalColor::Red
    }

    pub fn is_orange(&self) -> bool {
        self.color == SignalColor::Orange
    }

    pub fn is_green(&self) -> bool {
        self.color == SignalColor::Green
    }

    pub fn set_color(&mut self, color: SignalColor) {
        if self.color != color {
            debug!("signal turned {:?}", color);
        }
        self.color = color;
    }
}

/// Fixed-cycle color driver: Green -> Orange -> Red -> Green.
#[derive(Component)]
pub struct SignalCycle {
    /// Seconds elapsed in the current phase.
    pub timer: f32,
    pub green_duration: f32,
    pub orange_duration: f32,
    pub red_duration: f32,
    /// Cleared by the override keys, restored with T.
    pub running: bool,
}

impl Default for SignalCycle {
    fn default() -> Self {
        Self {
            timer: 0.0,
            green_duration: 8.0,
            orange_duration: 2.0,
            red_duration: 6.0,
            running: true,
        }
    }
}

impl SignalCycle {
    /// Advances the phase clock and returns the color to switch to once the
    /// current phase has run out.
    pub fn advance(&mut self, current: SignalColor, dt: f32) -> Option<SignalColor> {
        self.timer += dt;
        let duration = match current {
            SignalColor::Green => self.green_duration,
            SignalColor::Orange => self.orange_duration,
            SignalColor::Red => self.red_duration,
        };
        if self.timer < duration {
            return None;
        }
        self.timer = 0.0;
        Some(match current {
            SignalColor::Green => SignalColor::Orange,
            SignalColor::Orange => SignalColor::Red,
            SignalColor::Red => SignalColor::Green,
        })
    }
}

/// Ticks every cycling signal through its color sequence.
pub fn advance_signal_cycles(
    time: Res<Time>,
    config: Res<SimulationConfig>,
    mut signals: Query<(&mut TrafficSignal, &mut SignalCycle)>,
) {
    let dt = time.delta_secs() * config.speed;

    for (mut signal, mut cycle) in signals.iter_mut() {
        if !cycle.running {
            continue;
        }
        if let Some(next) = cycle.advance(signal.color(), dt) {
            signal.set_color(next);
        }
    }
}

/// R/O/G force a color on every signal and suspend cycling; T resumes it.
pub fn signal_override_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut signals: Query<(&mut TrafficSignal, Option<&mut SignalCycle>)>,
) {
    let forced = if keyboard.just_pressed(KeyCode::KeyR) {
        Some(SignalColor::Red)
    } else if keyboard.just_pressed(KeyCode::KeyO) {
        Some(SignalColor::Orange)
    } else if keyboard.just_pressed(KeyCode::KeyG) {
        Some(SignalColor::Green)
    } else {
        None
    };

    if let Some(color) = forced {
        for (mut signal, cycle) in signals.iter_mut() {
            signal.set_color(color);
            if let Some(mut cycle) = cycle {
                cycle.running = false;
            }
        }
        info!("Signals forced to {:?} (press T to resume cycling)", color);
    }

    if keyboard.just_pressed(KeyCode::KeyT) {
        for (_, cycle) in signals.iter_mut() {
            if let Some(mut cycle) = cycle {
                cycle.running = true;
                cycle.timer = 0.0;
            }
        }
        info!("Signal cycling resumed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_predicates_follow_color() {
        let mut signal = TrafficSignal::new(SignalColor::Red);
        assert!(signal.is_red() && !signal.is_orange() && !signal.is_green());

        signal.set_color(SignalColor::Green);
        assert!(signal.is_green() && !signal.is_red());
        assert_eq!(signal.color(), SignalColor::Green);
    }

    #[test]
    fn cycle_sequences_green_orange_red() {
        let mut cycle = SignalCycle {
            green_duration: 2.0,
            orange_duration: 1.0,
            red_duration: 3.0,
            ..default()
        };

        // Mid-phase: no change yet.
        assert_eq!(cycle.advance(SignalColor::Green, 1.0), None);
        assert_eq!(
            cycle.advance(SignalColor::Green, 1.0),
            Some(SignalColor::Orange)
        );
        assert_eq!(
            cycle.advance(SignalColor::Orange, 1.5),
            Some(SignalColor::Red)
        );
        assert_eq!(cycle.advance(SignalColor::Red, 2.9), None);
        assert_eq!(
            cycle.advance(SignalColor::Red, 0.1),
            Some(SignalColor::Green)
        );
    }

    #[test]
    fn cycle_resets_timer_on_phase_change() {
        let mut cycle = SignalCycle::default();
        cycle.advance(SignalColor::Green, cycle.green_duration + 0.5);
        assert_eq!(cycle.timer, 0.0);
    }
}
