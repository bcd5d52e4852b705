//! Camera, lights and the black hole at the origin.
//!
//! The camera looks straight down −Z from [`GalleryConfig::camera_position`]
//! with the configured vertical FOV.  Screen↔world conversions in
//! [`crate::projectile::unproject`] and [`crate::pointer::project`] assume
//! exactly this setup.

use bevy::prelude::*;

use crate::config::GalleryConfig;
use crate::projectile::Attractor;

/// The event-horizon sphere.
#[derive(Component)]
pub struct BlackHole;

pub fn setup_camera(mut commands: Commands, config: Res<GalleryConfig>) {
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: config.fov_radians(),
            ..default()
        }),
        Transform::from_translation(config.camera_position()),
    ));
    info!(
        "Camera at {:?}, fov {}°",
        config.camera_position(),
        config.camera_fov_degrees
    );
}

/// Dim ambient plus one point light; space should stay dark.
pub fn setup_lights(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 40.0,
        ..default()
    });
    commands.spawn((
        PointLight {
            intensity: 300_000.0,
            color: Color::WHITE,
            ..default()
        },
        Transform::from_xyz(10.0, 10.0, 10.0),
    ));
}

pub fn spawn_black_hole(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GalleryConfig>,
    attractor: Res<Attractor>,
) {
    commands.spawn((
        BlackHole,
        Mesh3d(meshes.add(Sphere::new(config.black_hole_radius).mesh().uv(64, 32))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::BLACK,
            unlit: true,
            ..default()
        })),
        Transform::from_translation(attractor.position),
    ));
}
