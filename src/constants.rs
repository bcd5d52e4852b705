//! Centralised scene and gameplay constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! Every constant is mirrored by a field in [`crate::config::GalleryConfig`]
//! and can be overridden from `assets/gallery.toml` without recompiling.

// ── Camera / Projection ──────────────────────────────────────────────────────

/// Distance of the camera from the origin along +Z (world units).
pub const CAMERA_DISTANCE: f32 = 10.0;

/// Height of the camera above the orbital plane.
pub const CAMERA_HEIGHT: f32 = 2.0;

/// Vertical field of view in degrees, shared by the camera and the fire
/// projection so shots line up with what is on screen.
pub const CAMERA_FOV_DEGREES: f32 = 75.0;

/// Aspect ratio used when no window is available (tests, headless runs).
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

// ── Cube orbit ───────────────────────────────────────────────────────────────

/// Lower bound of the randomised per-cube orbit speed (rad/s of orbit clock).
pub const ORBIT_SPEED_MIN: f32 = 0.1;

/// Width of the random orbit speed range; speed ∈ [MIN, MIN + RANGE).
pub const ORBIT_SPEED_RANGE: f32 = 0.15;

/// Half-width of the random vertical offset range.
pub const VERTICAL_OFFSET_RANGE: f32 = 1.0;

/// Half-width of the random orbit tilt range.
pub const ORBIT_TILT_RANGE: f32 = 0.25;

/// Amplitude of the vertical bobbing term.
pub const BOB_AMPLITUDE: f32 = 0.3;

/// Frequency of the vertical bobbing term (rad per orbit-clock second).
pub const BOB_FREQUENCY: f32 = 0.5;

/// Visual rotation of the whole cube ring (rad/s).  Does not affect the
/// published world positions' orbit math, only the group transform.
pub const RING_ROTATION_SPEED: f32 = 0.02;

/// Edge length of interactive cubes.  Decorative cubes are half this size.
pub const CUBE_SIZE: f32 = 0.2;

/// Fallback color for records without a (valid) color.
pub const DEFAULT_CUBE_COLOR: &str = "#00f5ff";

// ── Cube lifecycle ───────────────────────────────────────────────────────────

/// Length of the vibration ramp before a decorative cube explodes (s).
pub const VIBRATION_DURATION: f32 = 3.5;

/// Linear decay time from full intensity back to rest (s).
pub const COOLDOWN_DURATION: f32 = 0.5;

/// Intensity at or below which a cooling cube resumes orbiting.
pub const COOLDOWN_REST_EPSILON: f32 = 0.01;

/// Delay between the explosion burst and the cube disappearing (s).
pub const EXPLODE_DELAY: f32 = 0.1;

/// Time a destroyed cube stays hidden before respawning (s).
pub const RESPAWN_DELAY: f32 = 3.0;

/// Delay between an interactive cube's explosion and its content opening (s).
pub const CONTENT_OPEN_DELAY: f32 = 0.45;

/// Peak jitter displacement at full vibration intensity (world units).
pub const JITTER_MAX_AMPLITUDE: f32 = 0.08;

/// Jitter frequency at zero / full intensity (Hz).
pub const JITTER_MIN_FREQUENCY: f32 = 8.0;
pub const JITTER_MAX_FREQUENCY: f32 = 40.0;

// ── Pointer picking ──────────────────────────────────────────────────────────

/// Screen-space radius around a projected cube that counts as "over" it (px).
pub const PICK_RADIUS_PX: f32 = 18.0;

// ── Attractor ("black hole") ─────────────────────────────────────────────────

/// Visual radius of the black hole sphere.
pub const BLACK_HOLE_RADIUS: f32 = 1.5;

/// Strength `k` of the inward pull applied to projectile velocity.
pub const ATTRACTOR_STRENGTH: f32 = 0.004;

/// Softening term `ε` added to d² so the pull stays finite near the centre.
pub const ATTRACTOR_SOFTENING: f32 = 0.5;

/// Projectiles closer than this to the attractor are swallowed.
pub const EVENT_HORIZON_RADIUS: f32 = 1.6;

// ── Projectiles ──────────────────────────────────────────────────────────────

/// Distance in front of the camera at which projectiles are spawned.
pub const START_DEPTH: f32 = 2.0;

/// Lateral speed of a projectile along its screen-space aim (units/tick).
pub const LATERAL_SPEED: f32 = 0.05;

/// Numerator of the inverse depth-speed law: `depth = factor / screen_px`.
pub const DEPTH_SPEED_FACTOR: f32 = 12.0;

/// Clamp range for the receding speed (units/tick).
pub const MIN_DEPTH_SPEED: f32 = 0.04;
pub const MAX_DEPTH_SPEED: f32 = 0.4;

/// Screen distances below this are treated as "aimed at the barrel" (px).
pub const MIN_AIM_DISTANCE_PX: f32 = 1.0;

/// Direction used when the aim point sits on the barrel tip (no usable
/// screen-space direction).  Mostly into the scene, slightly upward.
pub const BARREL_DIRECTION: [f32; 3] = [0.0, 0.25, -1.0];

/// Projectile lifetime before it is culled (s).
pub const PROJECTILE_LIFETIME: f32 = 15.0;

/// Auto-fire interval while the fire input is held (s).
pub const AUTO_FIRE_INTERVAL: f32 = 0.15;

/// Culling bounds: projectiles beyond these are removed.
pub const BOUND_DEPTH: f32 = 60.0;
pub const BOUND_WIDTH: f32 = 40.0;
pub const BOUND_HEIGHT: f32 = 30.0;

/// Projectile render radius.
pub const PROJECTILE_RADIUS: f32 = 0.05;

// ── Collision ────────────────────────────────────────────────────────────────

/// A projectile within this distance of a cube centre hits it.
pub const COLLISION_RADIUS: f32 = 0.35;

// ── Explosion burst ──────────────────────────────────────────────────────────

/// Number of fragments per burst.
pub const BURST_FRAGMENTS: u32 = 24;

/// Fragment lifetime after its start delay (s).
pub const FRAGMENT_LIFETIME: f32 = 0.9;

/// Maximum random start delay per fragment (s).
pub const FRAGMENT_MAX_DELAY: f32 = 0.12;

/// Fragment outward speed range (units/s).
pub const FRAGMENT_SPEED_MIN: f32 = 0.8;
pub const FRAGMENT_SPEED_MAX: f32 = 2.6;

/// Fragment edge-length range.
pub const FRAGMENT_SIZE_MIN: f32 = 0.02;
pub const FRAGMENT_SIZE_MAX: f32 = 0.07;

// ── Turret ───────────────────────────────────────────────────────────────────

/// Grab radius around the turret's screen position for dragging (px).
pub const TURRET_GRAB_RADIUS_PX: f32 = 28.0;

/// Distance from the turret pivot to its barrel tip (px).
pub const TURRET_BARREL_LENGTH_PX: f32 = 30.0;

// ── Star field ───────────────────────────────────────────────────────────────

/// Radius of the celestial sphere the catalog is projected onto.
pub const STAR_SPHERE_RADIUS: f32 = 80.0;

/// Observer longitude (degrees east) used for Local Sidereal Time.
pub const OBSERVER_LONGITUDE: f64 = 29.0;

/// Seconds between star position refreshes.
pub const STAR_REFRESH_SECS: f32 = 3600.0;

/// Slow sky rotation (rad/s).
pub const STAR_ROTATION_SPEED: f32 = 0.002;

// ── Particle loader ──────────────────────────────────────────────────────────

/// Path of the local particle feed.
pub const PARTICLES_LOCAL_PATH: &str = "assets/particles.json";

/// Remote particle feed.
pub const PARTICLES_REMOTE_URL: &str = "http://localhost:8080/particles";

/// Freshness window of the loader cache (s).
pub const PARTICLES_CACHE_SECS: f32 = 300.0;

/// HTTP timeout for the remote source (s).
pub const PARTICLES_HTTP_TIMEOUT_SECS: f32 = 10.0;

// ── HUD ──────────────────────────────────────────────────────────────────────

pub const HUD_FONT_SIZE: f32 = 14.0;
