//! Forward obstacle sensing.
//!
//! Each tick a vehicle probes straight ahead for the nearest other vehicle
//! inside a narrow corridor and classifies it into two booleans: something
//! is ahead, and that something is stopped close enough to force a stop.
//! The reading is overwritten every tick; nothing is carried across ticks.

use bevy::prelude::*;

use crate::simulation::driver::CarDriver;
use crate::simulation::motion::Speed;

/// A vehicle moving at or below this speed counts as stopped.
pub const STOPPED_SPEED: f32 = 0.1;

/// Collision category occupied by vehicles.
pub const CAR_LAYER: u32 = 1 << 0;

/// What a probe can hit: the entity's collision category plus a rough body
/// radius, so hit distances measure to the surface rather than the center.
#[derive(Component, Clone, Copy)]
pub struct CollisionBody {
    pub layer: u32,
    pub radius: f32,
}

/// Probe parameters for a vehicle's forward sensor.
#[derive(Component, Clone)]
pub struct ForwardSensor {
    /// Maximum probe length.
    pub range: f32,
    /// Hits within this distance count as close enough to force a stop.
    pub stop_distance: f32,
    /// Lateral half-width of the probe corridor.
    pub half_width: f32,
    /// Probe start in the vehicle's local frame (the front bumper). The
    /// probe starts at the vehicle's own transform when absent.
    pub origin_offset: Option<Vec3>,
    /// Categories the probe reacts to.
    pub mask: u32,
}

impl Default for ForwardSensor {
    fn default() -> Self {
        Self {
            range: 6.0,
            stop_distance: 2.0,
            half_width: 1.0,
            origin_offset: None,
            mask: CAR_LAYER,
        }
    }
}

/// Per-tick sensor output.
#[derive(Component, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct SensorReading {
    /// The probe hit another vehicle within range.
    pub obstacle_ahead: bool,
    /// That vehicle is stopped and within the stop distance. Implies
    /// `obstacle_ahead` by construction.
    pub obstacle_stopped_close: bool,
}

/// Candidate the probe scans.
#[derive(Clone, Copy, Debug)]
pub struct ProbeTarget {
    pub entity: Entity,
    pub position: Vec3,
    pub layer: u32,
    pub radius: f32,
}

/// Nearest hit returned by the probe. `distance` is measured from the probe
/// origin to the target's surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    pub entity: Entity,
    pub distance: f32,
}

/// World-space probe start for a vehicle, honoring the optional bumper
/// offset.
pub fn probe_origin(transform: &Transform, sensor: &ForwardSensor) -> Vec3 {
    match sensor.origin_offset {
        Some(offset) => transform.transform_point(offset),
        None => transform.translation,
    }
}

/// Scans `targets` for the nearest one ahead of `origin` along `dir`,
/// within `range`, inside the lateral corridor, and matching `mask`.
pub fn cast_forward(
    origin: Vec3,
    dir: Vec3,
    range: f32,
    half_width: f32,
    mask: u32,
    targets: impl IntoIterator<Item = ProbeTarget>,
) -> Option<ProbeHit> {
    let mut nearest: Option<ProbeHit> = None;

    for target in targets {
        if target.layer & mask == 0 {
            continue;
        }

        let to_target = target.position - origin;
        let along = to_target.dot(dir);
        if along <= 0.0 {
            continue;
        }

        let distance = (along - target.radius).max(0.0);
        if distance > range {
            continue;
        }

        let lateral = (to_target - dir * along).length();
        if lateral > half_width {
            continue;
        }

        if nearest.map_or(true, |hit| distance < hit.distance) {
            nearest = Some(ProbeHit {
                entity: target.entity,
                distance,
            });
        }
    }

    nearest
}

/// Classifies a probe hit into the two sensor booleans.
pub fn classify_hit(distance: f32, other_speed: f32, stop_distance: f32) -> SensorReading {
    let stopped = other_speed <= STOPPED_SPEED;
    let close = distance <= stop_distance;
    SensorReading {
        obstacle_ahead: true,
        obstacle_stopped_close: stopped && close,
    }
}

/// Refreshes every vehicle's sensor reading from a fresh forward probe.
pub fn refresh_sensors(
    mut sensors: Query<(Entity, &Transform, &ForwardSensor, &mut SensorReading), With<CarDriver>>,
    obstacles: Query<(Entity, &Transform, &CollisionBody)>,
    speeds: Query<&Speed>,
) {
    for (vehicle, transform, sensor, mut reading) in sensors.iter_mut() {
        let origin = probe_origin(transform, sensor);
        let dir = *transform.forward();

        let hit = cast_forward(
            origin,
            dir,
            sensor.range,
            sensor.half_width,
            sensor.mask,
            obstacles
                .iter()
                .filter(|(other, _, _)| *other != vehicle)
                .map(|(entity, transform, body)| ProbeTarget {
                    entity,
                    position: transform.translation,
                    layer: body.layer,
                    radius: body.radius,
                }),
        );

        *reading = match hit {
            Some(hit) => {
                // The hit entity's speed is whatever it ended last tick
                // with; an entity with no speed reads as stationary.
                let other_speed = speeds.get(hit.entity).map(|s| s.current).unwrap_or(0.0);
                classify_hit(hit.distance, other_speed, sensor.stop_distance)
            }
            None => SensorReading::default(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: u32 = u32::MAX;

    fn target(index: u32, position: Vec3) -> ProbeTarget {
        ProbeTarget {
            entity: Entity::from_raw(index),
            position,
            layer: CAR_LAYER,
            radius: 0.0,
        }
    }

    #[test]
    fn probe_misses_when_nothing_in_range() {
        let hit = cast_forward(
            Vec3::ZERO,
            Vec3::X,
            6.0,
            1.0,
            ALL,
            [target(1, Vec3::new(9.0, 0.0, 0.0))],
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn probe_ignores_targets_behind() {
        let hit = cast_forward(
            Vec3::ZERO,
            Vec3::X,
            6.0,
            1.0,
            ALL,
            [target(1, Vec3::new(-2.0, 0.0, 0.0))],
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn probe_ignores_targets_outside_corridor() {
        let hit = cast_forward(
            Vec3::ZERO,
            Vec3::X,
            6.0,
            1.0,
            ALL,
            [target(1, Vec3::new(3.0, 0.0, 2.5))],
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn probe_returns_nearest_of_several() {
        let hit = cast_forward(
            Vec3::ZERO,
            Vec3::X,
            6.0,
            1.0,
            ALL,
            [
                target(1, Vec3::new(4.0, 0.0, 0.0)),
                target(2, Vec3::new(2.5, 0.0, 0.3)),
                target(3, Vec3::new(5.5, 0.0, -0.4)),
            ],
        )
        .expect("nearest target should hit");
        assert_eq!(hit.entity, Entity::from_raw(2));
        assert!((hit.distance - 2.5).abs() < 1e-5);
    }

    #[test]
    fn probe_respects_category_mask() {
        let hit = cast_forward(
            Vec3::ZERO,
            Vec3::X,
            6.0,
            1.0,
            CAR_LAYER,
            [ProbeTarget {
                layer: 1 << 3,
                ..target(1, Vec3::new(3.0, 0.0, 0.0))
            }],
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn hit_distance_is_measured_to_the_surface() {
        let hit = cast_forward(
            Vec3::ZERO,
            Vec3::X,
            6.0,
            1.0,
            ALL,
            [ProbeTarget {
                radius: 2.1,
                ..target(1, Vec3::new(5.0, 0.0, 0.0))
            }],
        )
        .expect("surface inside range should hit");
        assert!((hit.distance - 2.9).abs() < 1e-5);

        // The center can be out of range as long as the surface is not.
        let hit = cast_forward(
            Vec3::ZERO,
            Vec3::X,
            6.0,
            1.0,
            ALL,
            [ProbeTarget {
                radius: 2.1,
                ..target(1, Vec3::new(7.5, 0.0, 0.0))
            }],
        );
        assert!(hit.is_some());
    }

    #[test]
    fn stopped_car_inside_stop_distance_reads_stopped_close() {
        let reading = classify_hit(1.5, 0.05, 2.0);
        assert!(reading.obstacle_ahead);
        assert!(reading.obstacle_stopped_close);
    }

    #[test]
    fn stopped_car_beyond_stop_distance_is_only_detected() {
        let reading = classify_hit(3.5, 0.0, 2.0);
        assert!(reading.obstacle_ahead);
        assert!(!reading.obstacle_stopped_close);
    }

    #[test]
    fn moving_car_close_is_only_detected() {
        let reading = classify_hit(1.5, 4.0, 2.0);
        assert!(reading.obstacle_ahead);
        assert!(!reading.obstacle_stopped_close);
    }

    #[test]
    fn stopped_close_always_implies_detected() {
        for distance in [0.5, 1.9, 2.0, 2.1, 5.0] {
            for speed in [0.0, 0.1, 0.11, 3.0] {
                let reading = classify_hit(distance, speed, 2.0);
                assert!(reading.obstacle_ahead || !reading.obstacle_stopped_close);
            }
        }
    }

    #[test]
    fn probe_origin_falls_back_to_transform() {
        let transform = Transform::from_xyz(3.0, 0.0, 1.0);
        let sensor = ForwardSensor::default();
        assert_eq!(probe_origin(&transform, &sensor), transform.translation);
    }

    #[test]
    fn probe_origin_applies_local_offset() {
        // Facing +X, a local -Z offset lands ahead of the vehicle.
        let transform = Transform::from_xyz(3.0, 0.0, 1.0).looking_to(Vec3::X, Vec3::Y);
        let sensor = ForwardSensor {
            origin_offset: Some(Vec3::new(0.0, 0.0, -2.0)),
            ..default()
        };
        let origin = probe_origin(&transform, &sensor);
        assert!((origin - Vec3::new(5.0, 0.0, 1.0)).length() < 1e-5);
    }
}
