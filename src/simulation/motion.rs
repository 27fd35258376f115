//! Speed integration and vehicle motion.
//!
//! Drive states only command a target speed; the actual speed approaches it
//! at a bounded rate (acceleration upward, braking downward) with no
//! overshoot, and position advances along the vehicle's forward axis.

use bevy::prelude::*;

use crate::simulation::driver::{CarDriver, DriveConfig};
use crate::simulation::SimulationConfig;

/// Current and commanded speed for one vehicle.
#[derive(Component, Clone, Copy, Default, Debug)]
pub struct Speed {
    /// Speed the vehicle is actually moving at (units/sec, never negative).
    pub current: f32,
    /// Speed the active drive state is asking for.
    pub target: f32,
}

/// Moves `current` toward `target` by at most `max_delta`, clamping exactly
/// at the target.
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// One integrator step: accelerates when below target, brakes when above.
pub fn step_speed(current: f32, target: f32, config: &DriveConfig, dt: f32) -> f32 {
    let rate = if target > current {
        config.accel
    } else {
        config.brake
    };
    move_toward(current, target, rate * dt)
}

/// Advances each vehicle's speed toward its commanded target.
pub fn integrate_speed(
    time: Res<Time>,
    config: Res<SimulationConfig>,
    mut vehicles: Query<(&DriveConfig, &mut Speed), With<CarDriver>>,
) {
    let dt = time.delta_secs() * config.speed;

    for (drive, mut speed) in vehicles.iter_mut() {
        speed.current = step_speed(speed.current, speed.target, drive, dt);
    }
}

/// Moves each vehicle along its forward axis at its current speed.
pub fn advance_vehicles(
    time: Res<Time>,
    config: Res<SimulationConfig>,
    mut vehicles: Query<(&Speed, &mut Transform), With<CarDriver>>,
) {
    let dt = time.delta_secs() * config.speed;

    for (speed, mut transform) in vehicles.iter_mut() {
        if speed.current <= 0.0 {
            continue;
        }
        let step = transform.forward() * (speed.current * dt);
        transform.translation += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_toward_clamps_at_target() {
        assert_eq!(move_toward(0.0, 12.0, 1.0), 1.0);
        assert_eq!(move_toward(11.5, 12.0, 1.0), 12.0);
        assert_eq!(move_toward(12.0, 12.0, 1.0), 12.0);
    }

    #[test]
    fn move_toward_works_downward() {
        assert_eq!(move_toward(12.0, 0.0, 1.4), 10.6);
        assert_eq!(move_toward(0.5, 0.0, 1.4), 0.0);
    }

    #[test]
    fn accelerates_at_accel_rate_and_brakes_at_brake_rate() {
        let config = DriveConfig {
            accel: 8.0,
            brake: 14.0,
            ..default()
        };
        let dt = 0.1;

        let rising = step_speed(5.0, 12.0, &config, dt);
        assert!((rising - 5.8).abs() < 1e-5);

        let falling = step_speed(5.0, 0.0, &config, dt);
        assert!((falling - 3.6).abs() < 1e-5);
    }

    #[test]
    fn gap_to_target_shrinks_monotonically_without_sign_change() {
        let config = DriveConfig::default();
        let target = config.go_speed;
        let mut current = 0.0;
        let mut gap = target - current;

        for _ in 0..200 {
            current = step_speed(current, target, &config, 0.016);
            let next_gap = target - current;
            assert!(next_gap >= 0.0, "speed overshot the target");
            assert!(next_gap <= gap, "gap to target grew");
            gap = next_gap;
        }
        assert_eq!(current, target);
    }

    #[test]
    fn converges_within_the_bounded_tick_count() {
        // From standstill to go_speed takes ceil(go_speed / (accel * dt)) ticks.
        let config = DriveConfig::default();
        let dt = 0.1;
        let bound = (config.go_speed / (config.accel * dt)).ceil() as usize;

        let mut current = 0.0;
        for _ in 0..bound {
            current = step_speed(current, config.go_speed, &config, dt);
        }
        assert_eq!(current, config.go_speed);
    }
}
