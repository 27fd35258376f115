//! Debug overlays: forward probe rays and zone bounds (F3 to toggle).

use bevy::prelude::*;

use crate::simulation::driver::CarDriver;
use crate::simulation::sensing::{probe_origin, ForwardSensor, SensorReading};
use crate::simulation::zones::SignalZone;

pub struct SensorGizmosPlugin;

impl Plugin for SensorGizmosPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugOverlay>()
            .add_systems(Update, (toggle_overlay, draw_probe_rays, draw_zone_bounds));
    }
}

/// Whether the debug overlay is drawn.
#[derive(Resource, Default)]
pub struct DebugOverlay {
    pub show: bool,
}

fn toggle_overlay(keyboard: Res<ButtonInput<KeyCode>>, mut overlay: ResMut<DebugOverlay>) {
    if keyboard.just_pressed(KeyCode::F3) {
        overlay.show = !overlay.show;
        info!(
            "Debug overlay {}",
            if overlay.show { "ON" } else { "OFF" }
        );
    }
}

/// Draws each vehicle's probe ray, colored by what the sensor saw this tick.
fn draw_probe_rays(
    overlay: Res<DebugOverlay>,
    mut gizmos: Gizmos,
    vehicles: Query<(&Transform, &ForwardSensor, &SensorReading), With<CarDriver>>,
) {
    if !overlay.show {
        return;
    }

    for (transform, sensor, reading) in vehicles.iter() {
        let color = if reading.obstacle_stopped_close {
            Color::srgb(1.0, 0.2, 0.2)
        } else if reading.obstacle_ahead {
            Color::srgb(1.0, 0.6, 0.1)
        } else {
            Color::srgb(0.3, 0.9, 0.4)
        };

        let origin = probe_origin(transform, sensor);
        let end = origin + *transform.forward() * sensor.range;
        gizmos.line(origin, end, color);
    }
}

/// Outlines each signal zone on the road surface.
fn draw_zone_bounds(
    overlay: Res<DebugOverlay>,
    mut gizmos: Gizmos,
    zones: Query<(&Transform, &SignalZone)>,
) {
    if !overlay.show {
        return;
    }

    let color = Color::srgb(0.2, 0.6, 1.0);
    for (transform, zone) in zones.iter() {
        let center = transform.translation + Vec3::Y * 0.1;
        let (hx, hz) = (zone.half_extents.x, zone.half_extents.y);

        let corners = [
            center + Vec3::new(-hx, 0.0, -hz),
            center + Vec3::new(hx, 0.0, -hz),
            center + Vec3::new(hx, 0.0, hz),
            center + Vec3::new(-hx, 0.0, hz),
        ];
        for i in 0..4 {
            gizmos.line(corners[i], corners[(i + 1) % 4], color);
        }
    }
}
