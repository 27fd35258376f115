//! Vehicle behavior simulation: sensing, signals, zones, drive states, motion.
//!
//! The per-tick order is fixed and load-bearing: zone membership is applied
//! before any state evaluation, and every vehicle's sensor is refreshed
//! before any vehicle's state or speed mutates. A probe therefore always
//! reads the speed another vehicle ended the previous tick with.

use bevy::prelude::*;

pub mod driver;
pub mod motion;
pub mod sensing;
pub mod signals;
pub mod zones;

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>()
            .add_event::<zones::ZoneEntered>()
            .add_event::<zones::ZoneExited>()
            .add_systems(
                Update,
                (
                    zones::track_zone_membership,
                    zones::apply_zone_events,
                    sensing::refresh_sensors,
                    driver::tick_drivers,
                    motion::integrate_speed,
                    motion::advance_vehicles,
                )
                    .chain()
                    .run_if(simulation_running),
            )
            .add_systems(
                Update,
                (
                    signals::advance_signal_cycles.run_if(simulation_running),
                    signals::signal_override_controls,
                    simulation_controls,
                ),
            );
    }
}

/// Global simulation controls.
#[derive(Resource)]
pub struct SimulationConfig {
    /// Speed multiplier applied to the host frame time (1.0 = realtime).
    pub speed: f32,
    /// Whether the simulation is paused.
    pub paused: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            paused: false,
        }
    }
}

/// Run condition: vehicle systems advance only while unpaused.
pub fn simulation_running(config: Res<SimulationConfig>) -> bool {
    !config.paused
}

/// Keyboard controls for simulation speed and pause.
fn simulation_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut config: ResMut<SimulationConfig>,
) {
    // Space: Toggle pause
    if keyboard.just_pressed(KeyCode::Space) {
        config.paused = !config.paused;
        if config.paused {
            info!("Simulation PAUSED");
        } else {
            info!("Simulation RESUMED ({}x speed)", config.speed);
        }
    }

    // Number keys for speed presets
    if keyboard.just_pressed(KeyCode::Digit1) {
        config.speed = 1.0;
        info!("Simulation speed: 1x");
    }
    if keyboard.just_pressed(KeyCode::Digit2) {
        config.speed = 2.0;
        info!("Simulation speed: 2x");
    }
    if keyboard.just_pressed(KeyCode::Digit3) {
        config.speed = 3.0;
        info!("Simulation speed: 3x");
    }
    if keyboard.just_pressed(KeyCode::Digit4) {
        config.speed = 4.0;
        info!("Simulation speed: 4x");
    }
}
