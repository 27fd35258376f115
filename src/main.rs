//! CrossingSim - signalized intersection driving simulator
//!
//! A Bevy-based behavioral simulation where each vehicle senses the car
//! ahead, obeys the traffic signal of the intersection zone it is inside,
//! and drives via a per-vehicle Stop/Go/Slowdown state machine.

use bevy::prelude::*;

mod camera;
mod render;
mod scenario;
mod simulation;
mod ui;

fn main() {
    // Force Vulkan backend on Windows (DX12 causes crashes on some systems)
    #[cfg(target_os = "windows")]
    std::env::set_var("WGPU_BACKEND", "vulkan");
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "CrossingSim".into(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        // Viewer camera
        .add_plugins(camera::CameraPlugin)
        // Scene dressing and signal visuals
        .add_plugins(render::RenderPlugin)
        // Vehicle behavior core
        .add_plugins(simulation::SimulationPlugin)
        // Demo scene authoring
        .add_plugins(scenario::ScenarioPlugin)
        // HUD
        .add_plugins(ui::UiPlugin)
        .run();
}
