//! Projectiles: screen-space aiming, black-hole attraction and culling.
//!
//! ## Units
//!
//! Velocities are **world units per tick**, not per second.  One tick is one
//! `Update` pass, so `position(n+1) = position(n) + velocity(n+1)` holds
//! exactly and the attraction constant is tuned against that step.
//!
//! ## Aiming
//!
//! Both screen points (turret barrel tip and cursor) are unprojected onto the
//! plane `start_depth` in front of the camera.  The lateral direction is the
//! unit vector between them; depth speed is inversely proportional to the
//! on-screen distance, so aiming close to the turret sends the shot deep into
//! the scene quickly.
//!
//! | Per tick | Step |
//! |---|---|
//! | 1 | `velocity += k · dir(attractor) / (d² + ε)` |
//! | 2 | `position += velocity` |
//! | 3 | cull when expired, swallowed, out of bounds or hit |

use bevy::prelude::*;

use crate::config::GalleryConfig;
use crate::particle_source::ReloadParticles;

// ── Components & resources ────────────────────────────────────────────────────

/// A live shot.  Position lives in the entity's `Transform`.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Projectile {
    /// Monotonic id, unique for the lifetime of the app.
    pub id: u64,
    /// World units per tick.
    pub velocity: Vec3,
    /// Scene time (s) the projectile was fired.
    pub created_at: f32,
    /// Set by collision detection; culled the same tick.
    pub hit: bool,
}

/// Allocates projectile ids and counts shots for the HUD.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ProjectileCounter {
    next_id: u64,
}

impl ProjectileCounter {
    pub fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Total shots fired so far.
    #[inline]
    pub fn fired(&self) -> u64 {
        self.next_id
    }
}

/// Point every projectile falls toward.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct Attractor {
    pub position: Vec3,
}

/// Request to fire one projectile from `origin` toward `aim` (both in
/// logical window pixels, origin top-left).
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct FireProjectile {
    pub origin: Vec2,
    pub aim: Vec2,
    pub viewport: Vec2,
}

/// Shared projectile sphere, created once at startup.
#[derive(Resource)]
pub struct ProjectileAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

// ── Launch ────────────────────────────────────────────────────────────────────

/// Unproject a screen point onto the plane `depth` units in front of the
/// camera.  The camera sits at [`GalleryConfig::camera_position`] looking
/// down −Z with the configured vertical FOV.
pub fn unproject(screen: Vec2, viewport: Vec2, depth: f32, config: &GalleryConfig) -> Vec3 {
    let width = viewport.x.max(1.0);
    let height = viewport.y.max(1.0);
    let aspect = width / height;
    let ndc_x = screen.x / width * 2.0 - 1.0;
    let ndc_y = 1.0 - screen.y / height * 2.0;
    let half_height = (config.fov_radians() * 0.5).tan() * depth;
    let half_width = half_height * aspect;
    config.camera_position() + Vec3::new(ndc_x * half_width, ndc_y * half_height, -depth)
}

/// Launch position and per-tick velocity for a shot from `origin` toward `aim`.
///
/// A sub-pixel aim distance falls back to the configured barrel direction.
pub fn launch(origin: Vec2, aim: Vec2, viewport: Vec2, config: &GalleryConfig) -> (Vec3, Vec3) {
    let start = unproject(origin, viewport, config.start_depth, config);
    let screen_distance = origin.distance(aim);

    if !screen_distance.is_finite() || screen_distance < config.min_aim_distance_px {
        return (start, config.barrel_dir() * config.max_depth_speed);
    }

    let target = unproject(aim, viewport, config.start_depth, config);
    let lateral = (target - start).truncate().normalize_or_zero();
    let depth_speed = (config.depth_speed_factor / screen_distance)
        .clamp(config.min_depth_speed, config.max_depth_speed);

    let velocity = lateral.extend(0.0) * config.lateral_speed + Vec3::NEG_Z * depth_speed;
    (start, velocity)
}

// ── Integration ───────────────────────────────────────────────────────────────

/// Velocity after one tick of attraction toward `attractor`.
///
/// Softened inverse square: the `ε` term keeps the pull finite at the centre.
pub fn attract(position: Vec3, velocity: Vec3, attractor: Vec3, config: &GalleryConfig) -> Vec3 {
    let offset = attractor - position;
    let d2 = offset.length_squared();
    let pull = offset.normalize_or_zero() * config.attractor_strength
        / (d2 + config.attractor_softening);
    velocity + pull
}

/// Why a projectile left the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullReason {
    Hit,
    Expired,
    Swallowed,
    OutOfBounds,
}

/// First matching cull condition, if any.
pub fn cull_reason(
    projectile: &Projectile,
    position: Vec3,
    now: f32,
    attractor: Vec3,
    config: &GalleryConfig,
) -> Option<CullReason> {
    if projectile.hit {
        return Some(CullReason::Hit);
    }
    if now - projectile.created_at > config.projectile_lifetime {
        return Some(CullReason::Expired);
    }
    if position.distance(attractor) < config.event_horizon_radius {
        return Some(CullReason::Swallowed);
    }
    let out_of_bounds = position.z.abs() > config.bound_depth
        || position.x.abs() > config.bound_width
        || position.y.abs() > config.bound_height;
    out_of_bounds.then_some(CullReason::OutOfBounds)
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Create the shared projectile mesh and material.
pub fn init_projectile_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GalleryConfig>,
) {
    commands.insert_resource(ProjectileAssets {
        mesh: meshes.add(Sphere::new(config.projectile_radius)),
        material: materials.add(StandardMaterial {
            base_color: Color::srgb(1.0, 0.85, 0.3),
            emissive: LinearRgba::rgb(4.0, 3.0, 1.0),
            unlit: true,
            ..default()
        }),
    });
}

/// Spawn one projectile per [`FireProjectile`] request.
pub fn spawn_projectiles_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GalleryConfig>,
    mut requests: MessageReader<FireProjectile>,
    mut counter: ResMut<ProjectileCounter>,
    assets: Option<Res<ProjectileAssets>>,
) {
    let now = time.elapsed_secs();
    for request in requests.read() {
        let (position, velocity) = launch(request.origin, request.aim, request.viewport, &config);
        let projectile = Projectile {
            id: counter.next(),
            velocity,
            created_at: now,
            hit: false,
        };
        let mut entity = commands.spawn((
            projectile,
            Transform::from_translation(position),
            Visibility::default(),
        ));
        if let Some(assets) = assets.as_ref() {
            entity.insert((
                Mesh3d(assets.mesh.clone()),
                MeshMaterial3d(assets.material.clone()),
            ));
        }
    }
}

/// Apply attraction, then move.
pub fn projectile_integrate_system(
    config: Res<GalleryConfig>,
    attractor: Res<Attractor>,
    mut query: Query<(&mut Projectile, &mut Transform)>,
) {
    for (mut projectile, mut transform) in query.iter_mut() {
        if projectile.hit {
            continue;
        }
        projectile.velocity = attract(
            transform.translation,
            projectile.velocity,
            attractor.position,
            &config,
        );
        transform.translation += projectile.velocity;
    }
}

/// Despawn projectiles that hit, expired, fell in, or left the scene box.
pub fn projectile_cull_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GalleryConfig>,
    attractor: Res<Attractor>,
    query: Query<(Entity, &Projectile, &Transform)>,
) {
    let now = time.elapsed_secs();
    for (entity, projectile, transform) in query.iter() {
        if let Some(reason) = cull_reason(
            projectile,
            transform.translation,
            now,
            attractor.position,
            &config,
        ) {
            trace!("projectile {} culled: {reason:?}", projectile.id);
            commands.entity(entity).despawn();
        }
    }
}

/// A scene reload also clears every projectile in flight.
pub fn despawn_projectiles_on_reload(
    mut commands: Commands,
    mut reloads: MessageReader<ReloadParticles>,
    query: Query<Entity, With<Projectile>>,
) {
    if reloads.read().count() == 0 {
        return;
    }
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}
