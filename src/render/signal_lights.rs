//! Signal poles and lamp housings, with lamps lit to match the live color.

use bevy::prelude::*;

use crate::simulation::signals::{SignalColor, TrafficSignal};

pub struct SignalLightsPlugin;

impl Plugin for SignalLightsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SignalLightConfig>().add_systems(
            Update,
            (
                spawn_signal_visuals.run_if(visuals_missing),
                sync_signal_lamps,
            ),
        );
    }
}

#[derive(Resource)]
pub struct SignalLightConfig {
    pub pole_height: f32,
    pub pole_radius: f32,
    pub box_width: f32,
    pub box_height: f32,
    pub box_depth: f32,
    pub lamp_radius: f32,
}

impl Default for SignalLightConfig {
    fn default() -> Self {
        Self {
            pole_height: 4.5,
            pole_radius: 0.1,
            box_width: 0.55,
            box_height: 1.35,
            box_depth: 0.45,
            lamp_radius: 0.16,
        }
    }
}

/// One lamp sphere on a signal housing.
#[derive(Component)]
pub struct SignalLamp {
    pub signal: Entity,
    pub color: SignalColor,
}

/// Lit/dark material pairs for the three lamps.
#[derive(Resource)]
pub struct LampMaterials {
    red_lit: Handle<StandardMaterial>,
    red_dark: Handle<StandardMaterial>,
    orange_lit: Handle<StandardMaterial>,
    orange_dark: Handle<StandardMaterial>,
    green_lit: Handle<StandardMaterial>,
    green_dark: Handle<StandardMaterial>,
}

impl LampMaterials {
    fn pick(&self, color: SignalColor, lit: bool) -> &Handle<StandardMaterial> {
        match (color, lit) {
            (SignalColor::Red, true) => &self.red_lit,
            (SignalColor::Red, false) => &self.red_dark,
            (SignalColor::Orange, true) => &self.orange_lit,
            (SignalColor::Orange, false) => &self.orange_dark,
            (SignalColor::Green, true) => &self.green_lit,
            (SignalColor::Green, false) => &self.green_dark,
        }
    }
}

/// Run condition: signals exist but their visuals haven't been built yet.
fn visuals_missing(
    signals: Query<(), With<TrafficSignal>>,
    lamps: Query<(), With<SignalLamp>>,
) -> bool {
    !signals.is_empty() && lamps.is_empty()
}

fn spawn_signal_visuals(
    mut commands: Commands,
    config: Res<SignalLightConfig>,
    signals: Query<(Entity, &Transform), With<TrafficSignal>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let pole_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.15, 0.15, 0.15),
        perceptual_roughness: 0.5,
        metallic: 0.6,
        ..default()
    });
    let box_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.08, 0.08, 0.09),
        perceptual_roughness: 0.7,
        metallic: 0.3,
        ..default()
    });

    let lamp = |materials: &mut Assets<StandardMaterial>, r: f32, g: f32, b: f32, lit: bool| {
        materials.add(StandardMaterial {
            base_color: if lit {
                Color::srgb(r, g, b)
            } else {
                Color::srgb(r * 0.25, g * 0.25, b * 0.25)
            },
            emissive: if lit {
                LinearRgba::new(r * 1.4, g * 1.4, b * 1.4, 1.0)
            } else {
                LinearRgba::BLACK
            },
            ..default()
        })
    };
    let lamp_materials = LampMaterials {
        red_lit: lamp(&mut materials, 1.0, 0.12, 0.1, true),
        red_dark: lamp(&mut materials, 1.0, 0.12, 0.1, false),
        orange_lit: lamp(&mut materials, 1.0, 0.65, 0.1, true),
        orange_dark: lamp(&mut materials, 1.0, 0.65, 0.1, false),
        green_lit: lamp(&mut materials, 0.12, 1.0, 0.25, true),
        green_dark: lamp(&mut materials, 0.12, 1.0, 0.25, false),
    };

    let pole_mesh = meshes.add(Cylinder::new(config.pole_radius, config.pole_height));
    let box_mesh = meshes.add(Cuboid::new(
        config.box_width,
        config.box_height,
        config.box_depth,
    ));
    let lamp_mesh = meshes.add(Sphere::new(config.lamp_radius));

    let mut count = 0;
    for (signal, transform) in signals.iter() {
        let base = transform.translation;

        commands.spawn((
            Mesh3d(pole_mesh.clone()),
            MeshMaterial3d(pole_material.clone()),
            Transform::from_translation(base + Vec3::Y * (config.pole_height * 0.5)),
        ));

        let housing_center = base + Vec3::Y * (config.pole_height + config.box_height * 0.5);
        commands.spawn((
            Mesh3d(box_mesh.clone()),
            MeshMaterial3d(box_material.clone()),
            Transform::from_translation(housing_center),
        ));

        // Red on top, green at the bottom, facing the approach.
        let face = housing_center - Vec3::Z * (config.box_depth * 0.5 + 0.02);
        for (color, y_offset) in [
            (SignalColor::Red, 0.4),
            (SignalColor::Orange, 0.0),
            (SignalColor::Green, -0.4),
        ] {
            commands.spawn((
                Mesh3d(lamp_mesh.clone()),
                MeshMaterial3d(lamp_materials.pick(color, false).clone()),
                Transform::from_translation(face + Vec3::Y * y_offset),
                SignalLamp { signal, color },
            ));
        }
        count += 1;
    }

    commands.insert_resource(lamp_materials);
    info!("Built visuals for {} traffic signals", count);
}

/// Keeps each lamp's material in step with its signal's current color.
fn sync_signal_lamps(
    lamp_materials: Option<Res<LampMaterials>>,
    signals: Query<&TrafficSignal>,
    mut lamps: Query<(&SignalLamp, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    let Some(lamp_materials) = lamp_materials else {
        return;
    };

    for (lamp, mut material) in lamps.iter_mut() {
        let Ok(signal) = signals.get(lamp.signal) else {
            continue;
        };
        let lit = match lamp.color {
            SignalColor::Red => signal.is_red(),
            SignalColor::Orange => signal.is_orange(),
            SignalColor::Green => signal.is_green(),
        };
        let wanted = lamp_materials.pick(lamp.color, lit);
        if material.0 != *wanted {
            material.0 = wanted.clone();
        }
    }
}
