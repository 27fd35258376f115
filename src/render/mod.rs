//! Scene dressing: ground, roadways and lighting.

use bevy::prelude::*;

use crate::scenario::ScenarioConfig;

pub mod sensor_gizmos;
pub mod signal_lights;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(signal_lights::SignalLightsPlugin)
            .add_plugins(sensor_gizmos::SensorGizmosPlugin)
            .add_systems(Startup, setup_scene);
    }
}

fn setup_scene(
    mut commands: Commands,
    scenario: Res<ScenarioConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.85, 0.9, 1.0),
        brightness: 250.0,
    });
    commands.spawn((
        DirectionalLight {
            illuminance: 9_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(30.0, 50.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Grass base
    let road_length = scenario.road_half_length * 2.0;
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(road_length + 40.0, 120.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.16, 0.27, 0.15),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::from_xyz(0.0, -0.03, 0.0),
    ));

    let asphalt = materials.add(StandardMaterial {
        base_color: Color::srgb(0.16, 0.16, 0.17),
        perceptual_roughness: 0.9,
        ..default()
    });

    // Main road along X, crossing road along Z
    let road_width = 7.0;
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(road_length, 0.05, road_width))),
        MeshMaterial3d(asphalt.clone()),
        Transform::from_xyz(0.0, 0.0, 0.0),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(road_width, 0.05, 80.0))),
        MeshMaterial3d(asphalt),
        Transform::from_xyz(0.0, -0.005, 0.0),
    ));

    // Stop line on the signalized approach
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(0.4, 0.06, road_width))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.9, 0.9, 0.88),
            perceptual_roughness: 0.8,
            ..default()
        })),
        Transform::from_xyz(-3.2, 0.0, 0.0),
    ));
}
