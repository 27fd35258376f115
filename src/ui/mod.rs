//! HUD: frame rate, per-state vehicle counts and signal status.

use bevy::{
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

use crate::simulation::driver::{DriveState, StateMachine};
use crate::simulation::signals::TrafficSignal;
use crate::simulation::SimulationConfig;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(FrameTimeDiagnosticsPlugin::default())
            .add_systems(Startup, setup_hud)
            .add_systems(
                Update,
                (
                    update_fps_counter,
                    update_state_counts,
                    update_signal_status,
                    update_sim_status,
                ),
            );
    }
}

/// Marker for the FPS text entity.
#[derive(Component)]
struct FpsText;

/// Marker for the drive-state tally text.
#[derive(Component)]
struct StateCountsText;

/// Marker for the signal status text.
#[derive(Component)]
struct SignalStatusText;

/// Marker for the simulation status text.
#[derive(Component)]
struct SimStatusText;

fn setup_hud(mut commands: Commands) {
    let panel_bg = Color::srgb(0.04, 0.05, 0.06);
    let border = Color::srgb(0.0, 0.75, 0.35);
    let retro_green = Color::srgb(0.4, 0.95, 0.6);
    let retro_orange = Color::srgb(1.0, 0.6, 0.2);

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                right: Val::Px(10.0),
                padding: UiRect::axes(Val::Px(12.0), Val::Px(10.0)),
                border: UiRect::all(Val::Px(1.0)),
                row_gap: Val::Px(6.0),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BackgroundColor(panel_bg),
            BorderColor(border),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("CROSSINGSIM // TRAFFIC MONITOR"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(retro_orange),
            ));

            parent.spawn((
                Text::new("FPS: --"),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(retro_green),
                FpsText,
            ));

            parent.spawn((
                Text::new("STOP 0 | SLOW 0 | GO 0"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(retro_green),
                StateCountsText,
            ));

            parent.spawn((
                Text::new("SIGNAL: --"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(retro_green),
                SignalStatusText,
            ));

            parent.spawn((
                Text::new("SIM: 1.0x"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(0.75, 0.95, 0.8)),
                SimStatusText,
            ));
        });
}

fn update_fps_counter(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                **text = format!("FPS: {:.0}", value);
            }
        }
    }
}

fn update_state_counts(
    machines: Query<&StateMachine>,
    mut query: Query<&mut Text, With<StateCountsText>>,
) {
    let mut stop = 0;
    let mut slow = 0;
    let mut go = 0;
    let mut transitions = 0;
    for machine in machines.iter() {
        match machine.current() {
            Some(DriveState::Stop) => stop += 1,
            Some(DriveState::Slowdown) => slow += 1,
            Some(DriveState::Go) => go += 1,
            None => {}
        }
        transitions += machine.transitions();
    }

    for mut text in &mut query {
        **text = format!(
            "STOP {} | SLOW {} | GO {} | SWITCHES {}",
            stop, slow, go, transitions
        );
    }
}

fn update_signal_status(
    signals: Query<&TrafficSignal>,
    mut query: Query<&mut Text, With<SignalStatusText>>,
) {
    let status: Vec<String> = signals
        .iter()
        .map(|signal| format!("{:?}", signal.color()).to_uppercase())
        .collect();

    for mut text in &mut query {
        **text = if status.is_empty() {
            "SIGNAL: --".to_string()
        } else {
            format!("SIGNAL: {}", status.join(" | "))
        };
    }
}

fn update_sim_status(
    config: Res<SimulationConfig>,
    mut query: Query<&mut Text, With<SimStatusText>>,
) {
    if config.is_changed() {
        let status = if config.paused { "PAUSED" } else { "LIVE" };
        for mut text in &mut query {
            **text = format!("SIM: {} | {:.1}x", status, config.speed);
        }
    }
}
