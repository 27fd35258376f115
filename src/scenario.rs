//! Demo scenario: a straight road through one signalized intersection.
//!
//! Stands in for an authored scene: one signal with a cycle timer, the zone
//! that scopes it, and a column of vehicles with seeded per-car variation.
//! Vehicles that drive off the far end wrap back to the start so the column
//! keeps flowing through the intersection.

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::simulation::driver::{CarDriver, DriveConfig, StateMachine};
use crate::simulation::motion::Speed;
use crate::simulation::sensing::{CollisionBody, ForwardSensor, SensorReading, CAR_LAYER};
use crate::simulation::signals::{SignalColor, SignalCycle, TrafficSignal};
use crate::simulation::zones::{SignalZone, ZoneOccupants, ActiveSignal};

pub struct ScenarioPlugin;

impl Plugin for ScenarioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScenarioConfig>()
            .add_systems(Startup, spawn_scenario)
            .add_systems(Update, recycle_vehicles);
    }
}

/// Authoring parameters for the demo scene.
#[derive(Resource)]
pub struct ScenarioConfig {
    pub car_count: usize,
    /// Road runs along X from -half_length to +half_length.
    pub road_half_length: f32,
    /// Nominal gap between spawned cars.
    pub car_spacing: f32,
    /// Per-car go-speed variation (+/- fraction of the base).
    pub speed_variation: f32,
    pub car_length: f32,
    pub car_width: f32,
    pub car_height: f32,
    /// Approach region governed by the intersection signal.
    pub zone_center: Vec3,
    pub zone_half_extents: Vec2,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            car_count: 8,
            road_half_length: 60.0,
            car_spacing: 9.0,
            speed_variation: 0.15,
            car_length: 4.2,
            car_width: 1.7,
            car_height: 1.3,
            zone_center: Vec3::new(-4.0, 0.0, 0.0),
            zone_half_extents: Vec2::new(4.5, 3.5),
            seed: 4242,
        }
    }
}

// Car body palette, light variation applied per car.
const CAR_COLORS: &[(f32, f32, f32)] = &[
    (0.12, 0.12, 0.14), // Black
    (0.88, 0.88, 0.9),  // White
    (0.55, 0.57, 0.6),  // Silver
    (0.45, 0.1, 0.12),  // Dark red
    (0.12, 0.22, 0.42), // Dark blue
    (0.35, 0.3, 0.22),  // Tan
];

fn spawn_scenario(
    mut commands: Commands,
    config: Res<ScenarioConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // The intersection signal, cycling on its own timer, placed at the
    // near-side corner of the crossing.
    let signal = commands
        .spawn((
            TrafficSignal::new(SignalColor::Red),
            SignalCycle::default(),
            Transform::from_xyz(1.5, 0.0, 4.0),
        ))
        .id();

    // The approach zone that hands that signal to vehicles inside it.
    commands.spawn((
        SignalZone {
            signal,
            half_extents: config.zone_half_extents,
        },
        ZoneOccupants::default(),
        Transform::from_translation(config.zone_center),
    ));

    // Column of cars heading +X toward the intersection.
    let mut rng = StdRng::seed_from_u64(config.seed);
    let perlin = Perlin::new(config.seed as u32);

    let body_mesh = meshes.add(Cuboid::new(
        config.car_width,
        config.car_height * 0.6,
        config.car_length,
    ));
    let cabin_mesh = meshes.add(Cuboid::new(
        config.car_width * 0.9,
        config.car_height * 0.4,
        config.car_length * 0.5,
    ));
    let window_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.1, 0.15, 0.2, 0.8),
        perceptual_roughness: 0.1,
        metallic: 0.3,
        ..default()
    });

    for i in 0..config.car_count {
        let base_x = -config.road_half_length + 4.0 + i as f32 * config.car_spacing;
        // Perlin jitter keeps the column from looking machine-placed.
        let jitter = perlin.get([i as f64 * 0.37, 0.5]) as f32 * config.car_spacing * 0.25;
        let x = base_x + jitter;

        let (r, g, b) = CAR_COLORS[rng.gen_range(0..CAR_COLORS.len())];
        let tint = 1.0 + perlin.get([i as f64 * 0.61, 7.3]) as f32 * 0.12;
        let body_material = materials.add(StandardMaterial {
            base_color: Color::srgb(r * tint, g * tint, b * tint),
            perceptual_roughness: 0.4,
            metallic: 0.6,
            ..default()
        });

        let speed_mult = 1.0 + rng.gen_range(-config.speed_variation..config.speed_variation);
        let drive = DriveConfig {
            go_speed: 12.0 * speed_mult,
            ..default()
        };

        let body_y = config.car_height * 0.3;
        commands
            .spawn((
                Mesh3d(body_mesh.clone()),
                MeshMaterial3d(body_material),
                Transform::from_xyz(x, body_y, 0.0).looking_to(Vec3::X, Vec3::Y),
                CarDriver,
                drive,
                ForwardSensor {
                    // Probe from the front bumper.
                    origin_offset: Some(Vec3::new(0.0, 0.0, -config.car_length * 0.5)),
                    ..default()
                },
                SensorReading::default(),
                ActiveSignal::default(),
                Speed::default(),
                StateMachine::new(),
                CollisionBody {
                    layer: CAR_LAYER,
                    radius: config.car_length * 0.5,
                },
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh3d(cabin_mesh.clone()),
                    MeshMaterial3d(window_material.clone()),
                    Transform::from_xyz(0.0, config.car_height * 0.5, 0.2),
                ));
            });
    }

    info!(
        "Scenario ready: {} cars, one signalized intersection",
        config.car_count
    );
}

/// Wraps vehicles that drive off the far end back to the start of the road.
/// Both road ends are outside the zone, so wrapping never skips an exit.
fn recycle_vehicles(
    config: Res<ScenarioConfig>,
    mut vehicles: Query<&mut Transform, With<CarDriver>>,
) {
    for mut transform in vehicles.iter_mut() {
        if transform.translation.x > config.road_half_length {
            transform.translation.x -= 2.0 * config.road_half_length;
            debug!("recycled a vehicle to the road start");
        }
    }
}
