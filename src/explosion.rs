//! Explosion bursts: short-lived cube fragments thrown out of a destroyed cube.
//!
//! ## Design
//!
//! Fragments are lightweight ECS entities with a [`Fragment`] component that
//! stores motion state (velocity, age, start delay, colour).  A two-system
//! pipeline handles them:
//!
//! | System                        | Purpose                                        |
//! |-------------------------------|------------------------------------------------|
//! | `attach_fragment_mesh_system` | Attach `Mesh3d` to freshly-spawned fragments    |
//! | `fragment_update_system`      | Wait out the delay, move, fade, despawn         |
//!
//! [`spawn_explosion_burst`] only needs `&mut Commands`, so the cube lifecycle
//! can trigger a burst without touching `Assets`.  Each fragment gets its own
//! material so its alpha fades independently; the mesh is shared.

use bevy::prelude::*;
use rand::Rng;

use crate::config::GalleryConfig;

// ── Resources ────────────────────────────────────────────────────────────────

/// Shared unit cube used by every fragment (scaled per fragment).
#[derive(Resource)]
pub struct FragmentMesh(pub Handle<Mesh>);

// ── Component ────────────────────────────────────────────────────────────────

/// One piece of an explosion burst.
#[derive(Component, Debug, Clone)]
pub struct Fragment {
    /// World units per second.
    pub velocity: Vec3,
    /// Spin rate (rad/s) around `spin_axis`.
    pub spin: f32,
    pub spin_axis: Vec3,
    /// Time since the burst was spawned (s), including the delay.
    pub age: f32,
    /// Fragment stays hidden and still until `age >= delay`.
    pub delay: f32,
    /// Visible lifetime after the delay (s).
    pub lifetime: f32,
    pub color: Color,
    /// Edge length (world units).
    pub size: f32,
    /// `None` until `attach_fragment_mesh_system` runs.
    pub material: Option<Handle<StandardMaterial>>,
}

impl Fragment {
    /// Progress through the visible lifetime, `0..=1`; `None` while delayed.
    pub fn progress(&self) -> Option<f32> {
        if self.age < self.delay {
            return None;
        }
        if self.lifetime <= 0.0 {
            return Some(1.0);
        }
        Some(((self.age - self.delay) / self.lifetime).clamp(0.0, 1.0))
    }

    /// Whether the fragment has finished and should be despawned.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age >= self.delay + self.lifetime
    }
}

// ── Spawn helper ──────────────────────────────────────────────────────────────

/// Spawn `config.burst_fragments` fragments at `pos` in the cube's `color`.
///
/// Each fragment gets an independent random delay, direction, speed and size.
/// Returns the number spawned.
pub fn spawn_explosion_burst(
    commands: &mut Commands,
    pos: Vec3,
    color: Color,
    config: &GalleryConfig,
    rng: &mut impl Rng,
) -> u32 {
    let count = config.burst_fragments;
    for _ in 0..count {
        let direction = random_unit_vector(rng);
        let speed = sample_between(rng, config.fragment_speed_min, config.fragment_speed_max);
        let size = sample_between(rng, config.fragment_size_min, config.fragment_size_max);
        let delay = sample_between(rng, 0.0, config.fragment_max_delay.max(0.0));
        // Slight brightness variation so the burst doesn't read as flat.
        let tint = rng.gen_range(0.8_f32..=1.2_f32);
        let fragment_color = tint_color(color, tint);

        commands.spawn((
            Fragment {
                velocity: direction * speed,
                spin: rng.gen_range(2.0_f32..8.0_f32),
                spin_axis: random_unit_vector(rng),
                age: 0.0,
                delay,
                lifetime: config.fragment_lifetime,
                color: fragment_color,
                size,
                material: None,
            },
            Transform::from_translation(pos).with_scale(Vec3::splat(size)),
            Visibility::Hidden,
        ));
    }
    count
}

/// Uniform sample between two bounds given in either order.
fn sample_between(rng: &mut impl Rng, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.gen_range(lo..=hi)
}

fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    // Uniform on the sphere: uniform z and azimuth.
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

fn tint_color(color: Color, factor: f32) -> Color {
    let c = color.to_srgba();
    Color::srgba(
        (c.red * factor).clamp(0.0, 1.0),
        (c.green * factor).clamp(0.0, 1.0),
        (c.blue * factor).clamp(0.0, 1.0),
        c.alpha,
    )
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Create the shared fragment mesh.
pub fn init_fragment_mesh(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    let handle = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    commands.insert_resource(FragmentMesh(handle));
}

/// Attach `Mesh3d` + `MeshMaterial3d` to every newly-spawned [`Fragment`].
pub fn attach_fragment_mesh_system(
    mut commands: Commands,
    fragment_mesh: Option<Res<FragmentMesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut query: Query<(Entity, &mut Fragment), Added<Fragment>>,
) {
    let Some(fragment_mesh) = fragment_mesh else {
        return;
    };
    for (entity, mut fragment) in query.iter_mut() {
        let handle = materials.add(StandardMaterial {
            base_color: fragment.color,
            emissive: fragment.color.to_linear() * 2.0,
            unlit: true,
            alpha_mode: AlphaMode::Blend,
            ..default()
        });
        fragment.material = Some(handle.clone());
        commands
            .entity(entity)
            .insert((Mesh3d(fragment_mesh.0.clone()), MeshMaterial3d(handle)));
    }
}

/// Age every fragment; once its delay is over, move, spin, shrink and fade it,
/// and despawn it at the end of its lifetime.
pub fn fragment_update_system(
    mut commands: Commands,
    time: Res<Time>,
    mut materials: Option<ResMut<Assets<StandardMaterial>>>,
    mut query: Query<(Entity, &mut Transform, &mut Visibility, &mut Fragment)>,
) {
    let dt = time.delta_secs();

    for (entity, mut transform, mut visibility, mut fragment) in query.iter_mut() {
        fragment.age += dt;

        if fragment.is_expired() {
            commands.entity(entity).despawn();
            continue;
        }
        let Some(t) = fragment.progress() else {
            continue;
        };

        *visibility = Visibility::Inherited;
        transform.translation += fragment.velocity * dt;
        // Ease out: fragments slow down as they spread.
        fragment.velocity *= 1.0 - (2.5 * dt).min(1.0);
        let spin = Quat::from_axis_angle(fragment.spin_axis, fragment.spin * dt);
        transform.rotation = spin * transform.rotation;
        transform.scale = Vec3::splat(fragment.size * (1.0 - 0.5 * t));

        // Quadratic fade: bright at birth, rapid fade at the end.
        let alpha = (1.0 - t).powi(2);
        if let (Some(materials), Some(handle)) = (materials.as_mut(), fragment.material.as_ref()) {
            if let Some(mat) = materials.get_mut(handle) {
                mat.base_color = fragment.color.with_alpha(alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn burst_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            50,
        )));
        app.add_systems(Update, fragment_update_system);
        app
    }

    fn fragment_count(app: &mut App) -> usize {
        app.world_mut()
            .query::<&Fragment>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn burst_spawns_configured_fragment_count_within_ranges() {
        let config = GalleryConfig::default();
        let mut app = burst_app();
        let burst_config = config.clone();
        let spawned = app
            .world_mut()
            .run_system_once(move |mut commands: Commands| {
                spawn_explosion_burst(
                    &mut commands,
                    Vec3::new(1.0, 2.0, 3.0),
                    Color::srgb(0.0, 0.96, 1.0),
                    &burst_config,
                    &mut rand::thread_rng(),
                )
            })
            .unwrap();
        assert_eq!(spawned, config.burst_fragments);

        let world = app.world_mut();
        let mut q = world.query::<(&Fragment, &Transform)>();
        let mut seen = 0;
        for (f, t) in q.iter(world) {
            seen += 1;
            assert_eq!(t.translation, Vec3::new(1.0, 2.0, 3.0));
            let speed = f.velocity.length();
            assert!(speed >= config.fragment_speed_min - 1e-4);
            assert!(speed <= config.fragment_speed_max + 1e-4);
            assert!((config.fragment_size_min..=config.fragment_size_max).contains(&f.size));
            assert!((0.0..=config.fragment_max_delay).contains(&f.delay));
        }
        assert_eq!(seen, config.burst_fragments as usize);
    }

    #[test]
    fn swapped_range_overrides_still_burst() {
        let config = GalleryConfig {
            fragment_speed_min: 3.0,
            fragment_speed_max: 1.0,
            fragment_size_min: 0.08,
            fragment_size_max: 0.02,
            fragment_max_delay: -0.5,
            ..GalleryConfig::default()
        };
        let mut app = burst_app();
        let burst_config = config.clone();
        app.world_mut()
            .run_system_once(move |mut commands: Commands| {
                spawn_explosion_burst(
                    &mut commands,
                    Vec3::ZERO,
                    Color::WHITE,
                    &burst_config,
                    &mut rand::thread_rng(),
                )
            })
            .unwrap();

        let world = app.world_mut();
        let mut q = world.query::<&Fragment>();
        for f in q.iter(world) {
            let speed = f.velocity.length();
            assert!((1.0 - 1e-4..=3.0 + 1e-4).contains(&speed));
            assert!((0.02..=0.08).contains(&f.size));
            assert_eq!(f.delay, 0.0);
        }
        assert_eq!(fragment_count(&mut app), config.burst_fragments as usize);
    }

    #[test]
    fn fragments_despawn_after_their_lifetime() {
        let config = GalleryConfig::default();
        let mut app = burst_app();
        app.world_mut().spawn((
            Fragment {
                velocity: Vec3::X,
                spin: 1.0,
                spin_axis: Vec3::Y,
                age: 0.0,
                delay: 0.1,
                lifetime: config.fragment_lifetime,
                color: Color::WHITE,
                size: 0.05,
                material: None,
            },
            Transform::default(),
            Visibility::Hidden,
        ));

        // 0.1 s delay + 0.9 s lifetime = 20 ticks of 50 ms; allow the first
        // zero-length tick.
        for _ in 0..10 {
            app.update();
        }
        assert_eq!(fragment_count(&mut app), 1);
        for _ in 0..15 {
            app.update();
        }
        assert_eq!(fragment_count(&mut app), 0);
    }

    #[test]
    fn delayed_fragment_reports_no_progress() {
        let f = Fragment {
            velocity: Vec3::ZERO,
            spin: 0.0,
            spin_axis: Vec3::Y,
            age: 0.05,
            delay: 0.1,
            lifetime: 1.0,
            color: Color::WHITE,
            size: 0.05,
            material: None,
        };
        assert_eq!(f.progress(), None);
        assert!(!f.is_expired());
        let later = Fragment { age: 0.6, ..f };
        assert!((later.progress().unwrap() - 0.5).abs() < 1e-6);
    }
}
