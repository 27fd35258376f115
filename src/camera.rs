//! Perspective viewer camera with keyboard pan and scroll zoom.

use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera)
            .add_systems(Update, (camera_pan, camera_zoom));
    }
}

const PAN_SPEED: f32 = 20.0;
const MIN_DISTANCE: f32 = 8.0;
const MAX_DISTANCE: f32 = 90.0;

/// Viewer state: the ground point looked at and the boom distance.
#[derive(Component)]
struct ViewerCamera {
    focus: Vec3,
    distance: f32,
}

fn boom_offset(distance: f32) -> Vec3 {
    Vec3::new(-0.3, 0.75, 0.6).normalize() * distance
}

fn setup_camera(mut commands: Commands) {
    let focus = Vec3::new(-4.0, 0.0, 0.0);
    let distance = 32.0;

    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(focus + boom_offset(distance)).looking_at(focus, Vec3::Y),
        ViewerCamera { focus, distance },
    ));
}

/// WASD pans the focus point over the ground plane; Home recenters it.
fn camera_pan(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut cameras: Query<(&mut ViewerCamera, &mut Transform)>,
) {
    let mut delta = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyA) {
        delta.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        delta.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyW) {
        delta.z -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        delta.z += 1.0;
    }

    let recenter = keyboard.just_pressed(KeyCode::Home);
    if delta == Vec3::ZERO && !recenter {
        return;
    }

    for (mut camera, mut transform) in cameras.iter_mut() {
        if recenter {
            camera.focus = Vec3::new(-4.0, 0.0, 0.0);
        } else {
            let step = delta.normalize() * PAN_SPEED * time.delta_secs();
            camera.focus += step;
        }
        let focus = camera.focus;
        transform.translation = focus + boom_offset(camera.distance);
        transform.look_at(focus, Vec3::Y);
    }
}

/// Scroll wheel moves the camera along its boom.
fn camera_zoom(
    mut wheel: EventReader<MouseWheel>,
    mut cameras: Query<(&mut ViewerCamera, &mut Transform)>,
) {
    let scroll: f32 = wheel.read().map(|event| event.y).sum();
    if scroll == 0.0 {
        return;
    }

    for (mut camera, mut transform) in cameras.iter_mut() {
        camera.distance = (camera.distance - scroll * 3.0).clamp(MIN_DISTANCE, MAX_DISTANCE);
        let focus = camera.focus;
        transform.translation = focus + boom_offset(camera.distance);
        transform.look_at(focus, Vec3::Y);
    }
}
