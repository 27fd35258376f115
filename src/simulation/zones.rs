//! Zone-scoped signal membership.
//!
//! A zone is a spatial region bound to one signal. Vehicles inside a zone
//! obey that signal; everyone else ignores it completely. Enter/exit edges
//! are derived host-side by diffing vehicle positions against each zone's
//! occupant set, standing in for the host's trigger volumes.

use std::collections::HashSet;

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::simulation::driver::CarDriver;

/// Spatial region that binds vehicles inside it to a signal. The region is
/// an axis-aligned box on the XZ plane centered on the zone's transform.
#[derive(Component)]
pub struct SignalZone {
    /// The signal this zone hands to vehicles inside it.
    pub signal: Entity,
    /// Box half-extents along world X and Z.
    pub half_extents: Vec2,
}

/// Vehicles currently inside a zone.
#[derive(Component, Default)]
pub struct ZoneOccupants(HashSet<Entity>);

/// The signal currently governing a vehicle. `None` outside any zone.
#[derive(Component, Default)]
pub struct ActiveSignal(Option<Entity>);

impl ActiveSignal {
    pub fn get(&self) -> Option<Entity> {
        self.0
    }

    /// Zone entry: the newest zone always wins, overwriting any prior value.
    pub fn bind(&mut self, signal: Entity) {
        self.0 = Some(signal);
    }

    /// Zone exit: releases only the matching signal, so an exit from a
    /// non-active zone cannot stomp a reference set by a different,
    /// still-active zone.
    pub fn release(&mut self, signal: Entity) {
        if self.0 == Some(signal) {
            self.0 = None;
        }
    }
}

/// A vehicle crossed into a zone.
#[derive(Event)]
pub struct ZoneEntered {
    pub vehicle: Entity,
    pub signal: Entity,
}

/// A vehicle crossed out of a zone.
#[derive(Event)]
pub struct ZoneExited {
    pub vehicle: Entity,
    pub signal: Entity,
}

/// True when `point` is inside the zone's box centered at `zone_pos`.
pub fn zone_contains(zone: &SignalZone, zone_pos: Vec3, point: Vec3) -> bool {
    (point.x - zone_pos.x).abs() <= zone.half_extents.x
        && (point.z - zone_pos.z).abs() <= zone.half_extents.y
}

/// Diffs vehicle positions against each zone's occupant set and emits
/// enter/exit events.
pub fn track_zone_membership(
    mut zones: Query<(&Transform, &SignalZone, &mut ZoneOccupants)>,
    vehicles: Query<(Entity, &Transform), With<CarDriver>>,
    mut entered: EventWriter<ZoneEntered>,
    mut exited: EventWriter<ZoneExited>,
) {
    for (zone_transform, zone, mut occupants) in zones.iter_mut() {
        let zone_pos = zone_transform.translation;

        let mut arrivals: SmallVec<[Entity; 8]> = SmallVec::new();
        for (vehicle, transform) in vehicles.iter() {
            if zone_contains(zone, zone_pos, transform.translation)
                && !occupants.0.contains(&vehicle)
            {
                arrivals.push(vehicle);
            }
        }

        // Anything tracked but no longer inside (or despawned) has left.
        let mut departures: SmallVec<[Entity; 8]> = SmallVec::new();
        for &vehicle in occupants.0.iter() {
            let still_inside = vehicles
                .get(vehicle)
                .is_ok_and(|(_, transform)| zone_contains(zone, zone_pos, transform.translation));
            if !still_inside {
                departures.push(vehicle);
            }
        }

        for vehicle in arrivals {
            occupants.0.insert(vehicle);
            entered.send(ZoneEntered {
                vehicle,
                signal: zone.signal,
            });
        }
        for vehicle in departures {
            occupants.0.remove(&vehicle);
            exited.send(ZoneExited {
                vehicle,
                signal: zone.signal,
            });
        }
    }
}

/// Applies membership changes to each vehicle's active signal. Events naming
/// a despawned vehicle are dropped by the failed lookup.
pub fn apply_zone_events(
    mut exited: EventReader<ZoneExited>,
    mut entered: EventReader<ZoneEntered>,
    mut vehicles: Query<&mut ActiveSignal>,
) {
    for event in exited.read() {
        if let Ok(mut active) = vehicles.get_mut(event.vehicle) {
            active.release(event.signal);
        }
    }
    for event in entered.read() {
        if let Ok(mut active) = vehicles.get_mut(event.vehicle) {
            active.bind(event.signal);
        }
    }
}
