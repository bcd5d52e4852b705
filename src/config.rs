//! Runtime scene configuration loaded from `assets/gallery.toml`.
//!
//! [`GalleryConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_gallery_config`] reads
//! `assets/gallery.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the constants you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<GalleryConfig>` to any system parameter list and read values
//! with `config.vibration_duration`, `config.collision_radius`, etc.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `GalleryConfig::default()`.

use crate::constants::*;
use crate::error::GalleryResult;
use bevy::prelude::*;
use serde::Deserialize;

/// Path of the optional override file.
pub const CONFIG_PATH: &str = "assets/gallery.toml";

/// Which source the particle loader tries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimarySource {
    #[default]
    Local,
    Remote,
}

/// Runtime-tunable scene and gameplay configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.  Override any subset by setting the value in
/// `assets/gallery.toml`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    // ── Camera / Projection ──────────────────────────────────────────────────
    pub camera_distance: f32,
    pub camera_height: f32,
    pub camera_fov_degrees: f32,

    // ── Cube orbit ───────────────────────────────────────────────────────────
    pub orbit_speed_min: f32,
    pub orbit_speed_range: f32,
    pub vertical_offset_range: f32,
    pub orbit_tilt_range: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    pub ring_rotation_speed: f32,
    pub cube_size: f32,

    // ── Cube lifecycle ───────────────────────────────────────────────────────
    pub vibration_duration: f32,
    pub cooldown_duration: f32,
    pub cooldown_rest_epsilon: f32,
    pub explode_delay: f32,
    pub respawn_delay: f32,
    pub content_open_delay: f32,
    pub jitter_max_amplitude: f32,
    pub jitter_min_frequency: f32,
    pub jitter_max_frequency: f32,

    // ── Pointer ──────────────────────────────────────────────────────────────
    pub pick_radius_px: f32,

    // ── Attractor ────────────────────────────────────────────────────────────
    pub black_hole_radius: f32,
    pub attractor_strength: f32,
    pub attractor_softening: f32,
    pub event_horizon_radius: f32,

    // ── Projectiles ──────────────────────────────────────────────────────────
    pub start_depth: f32,
    pub lateral_speed: f32,
    pub depth_speed_factor: f32,
    pub min_depth_speed: f32,
    pub max_depth_speed: f32,
    pub min_aim_distance_px: f32,
    pub barrel_direction: [f32; 3],
    pub projectile_lifetime: f32,
    pub auto_fire_interval: f32,
    pub bound_depth: f32,
    pub bound_width: f32,
    pub bound_height: f32,
    pub projectile_radius: f32,

    // ── Collision ────────────────────────────────────────────────────────────
    pub collision_radius: f32,

    // ── Explosion burst ──────────────────────────────────────────────────────
    pub burst_fragments: u32,
    pub fragment_lifetime: f32,
    pub fragment_max_delay: f32,
    pub fragment_speed_min: f32,
    pub fragment_speed_max: f32,
    pub fragment_size_min: f32,
    pub fragment_size_max: f32,

    // ── Turret ───────────────────────────────────────────────────────────────
    pub turret_grab_radius_px: f32,
    pub turret_barrel_length_px: f32,

    // ── Star field ───────────────────────────────────────────────────────────
    pub star_sphere_radius: f32,
    pub observer_longitude: f64,
    pub star_refresh_secs: f32,
    pub star_rotation_speed: f32,

    // ── Particle loader ──────────────────────────────────────────────────────
    pub particles_source: PrimarySource,
    pub particles_local_path: String,
    pub particles_remote_url: String,
    pub particles_fallback: bool,
    pub particles_cache_secs: f32,
    pub particles_http_timeout_secs: f32,

    // ── HUD ──────────────────────────────────────────────────────────────────
    pub hud_font_size: f32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            // Camera / Projection
            camera_distance: CAMERA_DISTANCE,
            camera_height: CAMERA_HEIGHT,
            camera_fov_degrees: CAMERA_FOV_DEGREES,
            // Cube orbit
            orbit_speed_min: ORBIT_SPEED_MIN,
            orbit_speed_range: ORBIT_SPEED_RANGE,
            vertical_offset_range: VERTICAL_OFFSET_RANGE,
            orbit_tilt_range: ORBIT_TILT_RANGE,
            bob_amplitude: BOB_AMPLITUDE,
            bob_frequency: BOB_FREQUENCY,
            ring_rotation_speed: RING_ROTATION_SPEED,
            cube_size: CUBE_SIZE,
            // Cube lifecycle
            vibration_duration: VIBRATION_DURATION,
            cooldown_duration: COOLDOWN_DURATION,
            cooldown_rest_epsilon: COOLDOWN_REST_EPSILON,
            explode_delay: EXPLODE_DELAY,
            respawn_delay: RESPAWN_DELAY,
            content_open_delay: CONTENT_OPEN_DELAY,
            jitter_max_amplitude: JITTER_MAX_AMPLITUDE,
            jitter_min_frequency: JITTER_MIN_FREQUENCY,
            jitter_max_frequency: JITTER_MAX_FREQUENCY,
            // Pointer
            pick_radius_px: PICK_RADIUS_PX,
            // Attractor
            black_hole_radius: BLACK_HOLE_RADIUS,
            attractor_strength: ATTRACTOR_STRENGTH,
            attractor_softening: ATTRACTOR_SOFTENING,
            event_horizon_radius: EVENT_HORIZON_RADIUS,
            // Projectiles
            start_depth: START_DEPTH,
            lateral_speed: LATERAL_SPEED,
            depth_speed_factor: DEPTH_SPEED_FACTOR,
            min_depth_speed: MIN_DEPTH_SPEED,
            max_depth_speed: MAX_DEPTH_SPEED,
            min_aim_distance_px: MIN_AIM_DISTANCE_PX,
            barrel_direction: BARREL_DIRECTION,
            projectile_lifetime: PROJECTILE_LIFETIME,
            auto_fire_interval: AUTO_FIRE_INTERVAL,
            bound_depth: BOUND_DEPTH,
            bound_width: BOUND_WIDTH,
            bound_height: BOUND_HEIGHT,
            projectile_radius: PROJECTILE_RADIUS,
            // Collision
            collision_radius: COLLISION_RADIUS,
            // Explosion burst
            burst_fragments: BURST_FRAGMENTS,
            fragment_lifetime: FRAGMENT_LIFETIME,
            fragment_max_delay: FRAGMENT_MAX_DELAY,
            fragment_speed_min: FRAGMENT_SPEED_MIN,
            fragment_speed_max: FRAGMENT_SPEED_MAX,
            fragment_size_min: FRAGMENT_SIZE_MIN,
            fragment_size_max: FRAGMENT_SIZE_MAX,
            // Turret
            turret_grab_radius_px: TURRET_GRAB_RADIUS_PX,
            turret_barrel_length_px: TURRET_BARREL_LENGTH_PX,
            // Star field
            star_sphere_radius: STAR_SPHERE_RADIUS,
            observer_longitude: OBSERVER_LONGITUDE,
            star_refresh_secs: STAR_REFRESH_SECS,
            star_rotation_speed: STAR_ROTATION_SPEED,
            // Particle loader
            particles_source: PrimarySource::default(),
            particles_local_path: PARTICLES_LOCAL_PATH.to_string(),
            particles_remote_url: PARTICLES_REMOTE_URL.to_string(),
            particles_fallback: true,
            particles_cache_secs: PARTICLES_CACHE_SECS,
            particles_http_timeout_secs: PARTICLES_HTTP_TIMEOUT_SECS,
            // HUD
            hud_font_size: HUD_FONT_SIZE,
        }
    }
}

impl GalleryConfig {
    /// Parse a config from TOML text; absent keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> GalleryResult<Self> {
        Ok(toml::from_str::<GalleryConfig>(contents)?)
    }

    /// Vertical field of view in radians.
    #[inline]
    pub fn fov_radians(&self) -> f32 {
        self.camera_fov_degrees.to_radians()
    }

    /// World position of the camera eye.
    #[inline]
    pub fn camera_position(&self) -> Vec3 {
        Vec3::new(0.0, self.camera_height, self.camera_distance)
    }

    /// Barrel fallback direction as a unit vector (−Z if the configured one is degenerate).
    pub fn barrel_dir(&self) -> Vec3 {
        let [x, y, z] = self.barrel_direction;
        Vec3::new(x, y, z).try_normalize().unwrap_or(Vec3::NEG_Z)
    }
}

/// Startup system: attempt to load `assets/gallery.toml` and overwrite the
/// `GalleryConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  TOML parse errors are logged
/// but do not abort the app.  A missing file is not an error.
pub fn load_gallery_config(mut config: ResMut<GalleryConfig>) {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => match GalleryConfig::from_toml_str(&contents) {
            Ok(loaded) => {
                *config = loaded;
                info!("Loaded gallery config from {CONFIG_PATH}");
            }
            Err(e) => {
                warn!("Failed to parse {CONFIG_PATH}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {CONFIG_PATH} found; using compiled defaults");
        }
    }
}
