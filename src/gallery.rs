//! Scene modes and plugin wiring.
//!
//! ## Tick order
//!
//! Everything that touches cube or projectile state runs in one chained
//! `Update` pipeline so each stage sees the previous stage's writes:
//!
//! | # | System | Reads | Writes |
//! |---|--------|-------|--------|
//! | 1 | `despawn_cubes_on_reload` / `spawn_cubes_on_load` | feed messages | cubes, projectiles |
//! | 2 | `orbit_motion_system` | lifecycle | transforms, `CubePositions` |
//! | 3 | `pointer_pick_system` (Explore) | `CubePositions` | `CubePointer` |
//! | 4 | `turret_input_system` (Gallery) | cursor | `FireProjectile` |
//! | 5 | `spawn_projectiles_system` + `projectile_integrate_system` | | projectiles |
//! | 6 | `collision_detection_system` | both tables | `CubeHit` |
//! | 7 | `cube_lifecycle_system` | `CubePointer`, `CubeHit` | lifecycle, bursts, content queue |
//! | 8 | cull, fragment aging, content release | | |
//!
//! [`GalleryCorePlugin`] holds only that pipeline and needs no renderer, so
//! headless tests can drive it with `MinimalPlugins`.  [`GalleryPlugin`] adds
//! the feed, camera, meshes and UI on top.

use bevy::prelude::*;

use crate::backdrop;
use crate::collision::{self, CubeHit, CubePositions, HitStats};
use crate::config::load_gallery_config;
use crate::content::{self, ActiveContent, ContentQueue, ContentRequest, OpenLink};
use crate::explosion;
use crate::hud;
use crate::orbit::{self, RingRotation};
use crate::particle_source::{self, ParticleFeedPlugin, ParticlesLoaded, ReloadParticles};
use crate::pointer::{self, CubePointer, CursorState, PointerTarget};
use crate::prefs::{self, PrefsPath};
use crate::projectile::{self, Attractor, FireProjectile, ProjectileCounter};
use crate::starfield;
use crate::turret::{self, TurretState};

/// Pointer interaction vs. turret shooting.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SceneMode {
    /// Hover, click and vibrate cubes with the pointer.
    #[default]
    Explore,
    /// Drag the turret and shoot cubes.
    Gallery,
}

impl SceneMode {
    pub fn toggled(self) -> Self {
        match self {
            SceneMode::Explore => SceneMode::Gallery,
            SceneMode::Gallery => SceneMode::Explore,
        }
    }
}

/// `G` switches between Explore and Gallery.
pub fn toggle_mode_system(
    keys: Res<ButtonInput<KeyCode>>,
    mode: Res<State<SceneMode>>,
    mut next_mode: ResMut<NextState<SceneMode>>,
) {
    if keys.just_pressed(KeyCode::KeyG) {
        let next = mode.get().toggled();
        info!("Switching to {next:?} mode");
        next_mode.set(next);
    }
}

// ── Core pipeline ─────────────────────────────────────────────────────────────

/// Orbit, projectiles, collision, lifecycle and content queue.
///
/// Expects `ButtonInput<KeyCode>` / `ButtonInput<MouseButton>` and a
/// [`crate::config::GalleryConfig`] resource to exist.
pub struct GalleryCorePlugin;

impl Plugin for GalleryCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<SceneMode>()
            .init_resource::<CubePositions>()
            .init_resource::<HitStats>()
            .init_resource::<RingRotation>()
            .init_resource::<ContentQueue>()
            .init_resource::<ActiveContent>()
            .init_resource::<ProjectileCounter>()
            .init_resource::<Attractor>()
            .init_resource::<CursorState>()
            .init_resource::<PointerTarget>()
            .init_resource::<TurretState>()
            .add_message::<ParticlesLoaded>()
            .add_message::<ReloadParticles>()
            .add_message::<CubeHit>()
            .add_message::<CubePointer>()
            .add_message::<FireProjectile>()
            .add_message::<ContentRequest>()
            .add_message::<OpenLink>()
            .add_systems(
                Update,
                (
                    toggle_mode_system,
                    orbit::despawn_cubes_on_reload
                        .after(particle_source::reload_hotkey_system)
                        .after(particle_source::poll_particle_feed_system),
                    projectile::despawn_projectiles_on_reload,
                    orbit::spawn_cubes_on_load,
                    orbit::orbit_motion_system,
                    pointer::pointer_pick_system.run_if(in_state(SceneMode::Explore)),
                    turret::turret_input_system.run_if(in_state(SceneMode::Gallery)),
                    projectile::spawn_projectiles_system,
                    projectile::projectile_integrate_system,
                    collision::collision_detection_system,
                    orbit::cube_lifecycle_system,
                    projectile::projectile_cull_system,
                    explosion::fragment_update_system,
                    content::release_due_content_system,
                    content::open_content_system,
                    content::close_content_on_escape,
                )
                    .chain(),
            )
            .add_systems(OnExit(SceneMode::Explore), pointer::release_pointer_system)
            .add_systems(OnExit(SceneMode::Gallery), turret::reset_turret_system);
    }
}

// ── Full scene ────────────────────────────────────────────────────────────────

/// Everything: feed loading, backdrop, meshes, UI.
pub struct GalleryPlugin;

impl Plugin for GalleryPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((ParticleFeedPlugin, GalleryCorePlugin))
            .init_resource::<PrefsPath>()
            .add_systems(
                Startup,
                (
                    backdrop::setup_camera,
                    backdrop::setup_lights,
                    backdrop::spawn_black_hole,
                    starfield::spawn_star_field,
                    orbit::init_cube_meshes,
                    explosion::init_fragment_mesh,
                    projectile::init_projectile_assets,
                    prefs::load_preferences_system,
                    hud::setup_hud.after(prefs::load_preferences_system),
                )
                    .after(load_gallery_config),
            )
            .add_systems(
                Update,
                (
                    pointer::track_cursor_system.before(orbit::orbit_motion_system),
                    orbit::attach_cube_mesh_system.after(orbit::spawn_cubes_on_load),
                    orbit::cube_hover_highlight_system.after(orbit::cube_lifecycle_system),
                    explosion::attach_fragment_mesh_system
                        .after(orbit::cube_lifecycle_system)
                        .before(explosion::fragment_update_system),
                    (
                        starfield::refresh_star_positions_system,
                        starfield::star_twinkle_system,
                        starfield::star_field_rotation_system,
                    ),
                    content::launch_links_system.after(content::open_content_system),
                    (
                        content::content_close_button_system,
                        content::sync_content_panel_system,
                    )
                        .chain()
                        .after(content::close_content_on_escape),
                    (
                        hud::legend_system,
                        hud::hit_counter_system,
                        hud::mode_hint_system,
                    )
                        .after(content::close_content_on_escape),
                    turret::sync_turret_ui_system
                        .after(turret::turret_input_system)
                        .run_if(in_state(SceneMode::Gallery)),
                ),
            )
            .add_systems(
                OnEnter(SceneMode::Gallery),
                (turret::spawn_turret_ui, prefs::mark_gallery_hint_seen),
            )
            .add_systems(OnExit(SceneMode::Gallery), turret::despawn_turret_ui);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_returns_to_explore() {
        assert_eq!(SceneMode::Explore.toggled(), SceneMode::Gallery);
        assert_eq!(SceneMode::Explore.toggled().toggled(), SceneMode::Explore);
    }
}
