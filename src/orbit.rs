//! Orbiting cubes: orbital motion and the per-cube lifecycle state machine.
//!
//! ## Lifecycle
//!
//! | From | Input | To | Effect |
//! |------|-------|----|--------|
//! | `Orbiting` | pointer enter (interactive) | `Hovered` | — |
//! | `Hovered` | pointer leave | `Orbiting` | — |
//! | `Orbiting`/`Hovered` | pointer down (interactive) | unchanged | open content |
//! | `Orbiting` | pointer down (decorative) | `Vibrating` | — |
//! | `Vibrating` | ramp elapsed | `Exploding` | burst |
//! | `Vibrating` | pointer up / leave | `CoolingDown` | — |
//! | `CoolingDown` | intensity ≈ 0 | `Orbiting` | — |
//! | any visible | projectile hit | `Exploding` | burst (+ delayed content if interactive) |
//! | `Exploding` | explode delay | `Destroyed` | — |
//! | `Destroyed` | respawn delay | `Orbiting` | fresh orbit |
//!
//! Timed states carry their own start time, so there are no timers to cancel:
//! despawning a cube drops its pending transitions with it.
//!
//! The orbit clock only advances while the cube is not frozen
//! (`Hovered | Vibrating | CoolingDown`), so an interrupted cube resumes exactly
//! where it stopped.

use std::f32::consts::TAU;

use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::{Indices, PrimitiveTopology};
use rand::Rng;

use crate::collision::{CubeHit, CubePositions};
use crate::config::GalleryConfig;
use crate::content::{ContentPayload, ContentQueue};
use crate::explosion::spawn_explosion_burst;
use crate::particle_source::{ParticleId, ParticleRecord, ParticlesLoaded, ReloadParticles};
use crate::pointer::{CubePointer, PointerAction};

// ── Orbit math ────────────────────────────────────────────────────────────────

/// Per-instance random orbit parameters, rolled once per spawn/respawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParams {
    pub initial_angle: f32,
    pub orbit_speed: f32,
    pub vertical_offset: f32,
    pub orbit_tilt: f32,
    /// Orbital radius from the record.
    pub distance: f32,
    /// Position in the feed; phase-shifts the vertical bob.
    pub index: usize,
}

impl OrbitParams {
    pub fn roll(rng: &mut impl Rng, config: &GalleryConfig, distance: f32, index: usize) -> Self {
        Self {
            initial_angle: rng.gen_range(0.0..TAU),
            orbit_speed: config.orbit_speed_min + rng.gen::<f32>() * config.orbit_speed_range,
            vertical_offset: rng.gen_range(-1.0..1.0) * config.vertical_offset_range,
            orbit_tilt: rng.gen_range(-1.0..1.0) * config.orbit_tilt_range,
            distance,
            index,
        }
    }

    /// Orbit angle after `clock` seconds of unfrozen orbit time.
    #[inline]
    pub fn angle(&self, clock: f32) -> f32 {
        self.initial_angle + clock * self.orbit_speed
    }

    /// Position on the (tilted, bobbing) orbit, before ring rotation.
    pub fn position(&self, clock: f32, bob_amplitude: f32, bob_frequency: f32) -> Vec3 {
        let angle = self.angle(clock);
        let x = angle.cos() * self.distance;
        let z = angle.sin() * self.distance;
        let y = self.vertical_offset
            + (clock * bob_frequency + self.index as f32).sin() * bob_amplitude
            + z * self.orbit_tilt;
        Vec3::new(x, y, z)
    }
}

/// Accumulated orbit time plus the cosmetic spin angle.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitClock {
    /// Seconds of orbit time; constant while frozen.
    pub elapsed: f32,
    /// Self-rotation clock (slowed while hovered, never frozen).
    pub spin: f32,
}

impl OrbitClock {
    pub fn advance(&mut self, dt: f32, state: &CubeState) {
        if !state.is_frozen() {
            self.elapsed += dt;
        }
        let spin_rate = if matches!(state, CubeState::Hovered) { 0.1 } else { 1.0 };
        self.spin += dt * spin_rate;
    }
}

// ── Lifecycle state machine ───────────────────────────────────────────────────

/// Timing constants the transition function needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleTimings {
    pub vibration: f32,
    pub cooldown: f32,
    pub rest_epsilon: f32,
    pub explode_delay: f32,
    pub respawn_delay: f32,
}

impl From<&GalleryConfig> for LifecycleTimings {
    fn from(config: &GalleryConfig) -> Self {
        Self {
            vibration: config.vibration_duration,
            cooldown: config.cooldown_duration,
            rest_epsilon: config.cooldown_rest_epsilon,
            explode_delay: config.explode_delay,
            respawn_delay: config.respawn_delay,
        }
    }
}

/// One cube's lifecycle.  Timestamps are scene seconds (`Time::elapsed_secs`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CubeState {
    #[default]
    Orbiting,
    Hovered,
    Vibrating {
        since: f32,
    },
    CoolingDown {
        since: f32,
        /// Intensity reached when the pointer let go.
        from: f32,
    },
    Exploding {
        since: f32,
    },
    Destroyed {
        since: f32,
    },
}

/// Everything that can drive a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeInput {
    PointerEnter,
    PointerLeave,
    PointerDown,
    PointerUp,
    Hit,
    /// Time passed; resolves timed transitions.
    Tick,
}

impl From<PointerAction> for CubeInput {
    fn from(action: PointerAction) -> Self {
        match action {
            PointerAction::Enter => CubeInput::PointerEnter,
            PointerAction::Leave => CubeInput::PointerLeave,
            PointerAction::Down => CubeInput::PointerDown,
            PointerAction::Up => CubeInput::PointerUp,
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeEffect {
    /// Spawn an explosion burst; also open content after a delay when set.
    Burst { open_content: bool },
    /// Open content right away (interactive click).
    OpenContent,
    /// The cube came back; reset its orbit.
    Respawn,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next: CubeState,
    pub effect: Option<CubeEffect>,
}

impl Transition {
    fn stay(state: CubeState) -> Self {
        Self {
            next: state,
            effect: None,
        }
    }

    fn to(next: CubeState) -> Self {
        Self { next, effect: None }
    }

    fn with(next: CubeState, effect: CubeEffect) -> Self {
        Self {
            next,
            effect: Some(effect),
        }
    }
}

impl CubeState {
    /// Orbit time stands still in these states.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        matches!(
            self,
            CubeState::Hovered | CubeState::Vibrating { .. } | CubeState::CoolingDown { .. }
        )
    }

    /// Whether the cube can be hit and picked (and publishes its position).
    #[inline]
    pub fn is_targetable(&self) -> bool {
        !matches!(self, CubeState::Exploding { .. } | CubeState::Destroyed { .. })
    }

    /// Whether the cube mesh is drawn.
    #[inline]
    pub fn is_visible(&self) -> bool {
        !matches!(self, CubeState::Destroyed { .. })
    }

    /// Jitter intensity in `0..=1` at time `now`.
    pub fn intensity(&self, now: f32, t: &LifecycleTimings) -> f32 {
        match *self {
            CubeState::Vibrating { since } => ramp(now - since, t.vibration),
            CubeState::CoolingDown { since, from } => {
                (from * (1.0 - ramp(now - since, t.cooldown))).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// The single transition function for a cube.
    pub fn step(
        self,
        input: CubeInput,
        now: f32,
        interactive: bool,
        t: &LifecycleTimings,
    ) -> Transition {
        use CubeInput::*;
        use CubeState::*;

        match (self, input) {
            // Gone or going: nothing but time affects it.
            (Exploding { since }, Tick) if now - since >= t.explode_delay => Transition::to(
                Destroyed {
                    since: since + t.explode_delay,
                },
            ),
            (Destroyed { since }, Tick) if now - since >= t.respawn_delay => {
                Transition::with(Orbiting, CubeEffect::Respawn)
            }
            (Exploding { .. } | Destroyed { .. }, _) => Transition::stay(self),

            // A hit skips whatever was going on.
            (_, Hit) => Transition::with(
                Exploding { since: now },
                CubeEffect::Burst {
                    open_content: interactive,
                },
            ),

            // Interactive cubes: hover and click.
            (Orbiting, PointerEnter) if interactive => Transition::to(Hovered),
            (Hovered, PointerLeave) => Transition::to(Orbiting),
            (Orbiting | Hovered, PointerDown) if interactive => {
                Transition::with(self, CubeEffect::OpenContent)
            }

            // Decorative cubes: press to vibrate.
            (Orbiting, PointerDown) => Transition::to(Vibrating { since: now }),
            (Vibrating { since }, _) if now - since >= t.vibration => Transition::with(
                Exploding {
                    since: since + t.vibration,
                },
                CubeEffect::Burst {
                    open_content: false,
                },
            ),
            (Vibrating { since }, PointerUp | PointerLeave) => Transition::to(CoolingDown {
                since: now,
                from: ramp(now - since, t.vibration),
            }),
            (CoolingDown { .. }, Tick) if self.intensity(now, t) <= t.rest_epsilon => {
                Transition::to(Orbiting)
            }

            _ => Transition::stay(self),
        }
    }
}

/// Linear 0→1 progress over `duration`, clamped.
#[inline]
fn ramp(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

/// Positional jitter for a vibrating / cooling cube.
///
/// Amplitude and frequency both grow with `intensity`; the three axes use
/// detuned phases so the shake does not look like a straight line.
pub fn jitter_offset(intensity: f32, now: f32, config: &GalleryConfig) -> Vec3 {
    if intensity <= 0.0 {
        return Vec3::ZERO;
    }
    let amplitude = intensity * config.jitter_max_amplitude;
    let frequency = config.jitter_min_frequency
        + (config.jitter_max_frequency - config.jitter_min_frequency) * intensity;
    let w = now * frequency * TAU;
    Vec3::new(w.sin(), (w * 1.3 + 1.7).sin(), (w * 0.7 + 4.1).sin()) * amplitude
}

// ── Components & resources ────────────────────────────────────────────────────

/// A cube driven by one particle record.
#[derive(Component, Debug, Clone)]
pub struct OrbitingCube {
    pub record: ParticleRecord,
    pub params: OrbitParams,
    pub color: Color,
}

impl OrbitingCube {
    #[inline]
    pub fn id(&self) -> ParticleId {
        self.record.id
    }
}

/// Mutable per-cube runtime state.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct CubeLifecycle {
    pub state: CubeState,
    /// Last rendered world position; bursts spawn here.
    pub world_position: Vec3,
}

/// Material handles of a cube, filled in by [`attach_cube_mesh_system`].
#[derive(Component, Debug, Clone)]
pub struct CubeVisual {
    pub edges: Handle<StandardMaterial>,
}

/// Marker for the edge-line child of a cube.
#[derive(Component)]
pub struct CubeEdges;

/// Shared cube geometry, created once at startup.
#[derive(Resource)]
pub struct CubeMeshes {
    pub interactive_face: Handle<Mesh>,
    pub interactive_edges: Handle<Mesh>,
    pub decoy_face: Handle<Mesh>,
    pub decoy_edges: Handle<Mesh>,
}

/// Visual rotation of the whole ring about +Y.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct RingRotation {
    pub angle: f32,
}

impl RingRotation {
    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.angle)
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Create the shared cube geometry.
pub fn init_cube_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    config: Res<GalleryConfig>,
) {
    let big = config.cube_size;
    let small = config.cube_size * 0.5;
    commands.insert_resource(CubeMeshes {
        interactive_face: meshes.add(Cuboid::new(big, big, big)),
        interactive_edges: meshes.add(cube_edges_mesh(big)),
        decoy_face: meshes.add(Cuboid::new(small, small, small)),
        decoy_edges: meshes.add(cube_edges_mesh(small)),
    });
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Spawn one cube entity per record.  Meshes are attached a frame later.
pub fn spawn_cube(
    commands: &mut Commands,
    record: &ParticleRecord,
    index: usize,
    config: &GalleryConfig,
    rng: &mut impl Rng,
) -> Entity {
    let params = OrbitParams::roll(rng, config, record.distance, index);
    let position = params.position(0.0, config.bob_amplitude, config.bob_frequency);
    commands
        .spawn((
            OrbitingCube {
                record: record.clone(),
                params,
                color: record.color(),
            },
            OrbitClock::default(),
            CubeLifecycle {
                state: CubeState::Orbiting,
                world_position: position,
            },
            Transform::from_translation(position),
            Visibility::default(),
        ))
        .id()
}

/// Tear the ring down as soon as a reload is requested.
pub fn despawn_cubes_on_reload(
    mut commands: Commands,
    mut reloads: MessageReader<ReloadParticles>,
    cubes: Query<Entity, With<OrbitingCube>>,
    mut positions: ResMut<CubePositions>,
    mut queue: ResMut<ContentQueue>,
) {
    if reloads.read().count() == 0 {
        return;
    }
    for entity in cubes.iter() {
        commands.entity(entity).despawn();
    }
    positions.clear();
    queue.clear();
}

/// Replace the ring with the freshly loaded records.
pub fn spawn_cubes_on_load(
    mut commands: Commands,
    mut loaded: MessageReader<ParticlesLoaded>,
    cubes: Query<Entity, With<OrbitingCube>>,
    mut positions: ResMut<CubePositions>,
    config: Res<GalleryConfig>,
) {
    let Some(ParticlesLoaded(records)) = loaded.read().last() else {
        return;
    };
    for entity in cubes.iter() {
        commands.entity(entity).despawn();
    }
    positions.clear();

    let mut rng = rand::thread_rng();
    for (index, record) in records.iter().enumerate() {
        spawn_cube(&mut commands, record, index, &config, &mut rng);
    }
    info!("Spawned {} orbiting cubes", records.len());
}

/// Attach face + edge meshes to freshly spawned cubes.
pub fn attach_cube_mesh_system(
    mut commands: Commands,
    cube_meshes: Option<Res<CubeMeshes>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    query: Query<(Entity, &OrbitingCube), Added<OrbitingCube>>,
) {
    let Some(cube_meshes) = cube_meshes else {
        return;
    };
    for (entity, cube) in query.iter() {
        let interactive = cube.record.is_interactive();
        let (face_mesh, edge_mesh, face_alpha, edge_alpha) = if interactive {
            (&cube_meshes.interactive_face, &cube_meshes.interactive_edges, 0.3, 0.8)
        } else {
            (&cube_meshes.decoy_face, &cube_meshes.decoy_edges, 0.1, 0.6)
        };
        let face_color = if interactive { cube.color } else { Color::WHITE };

        let face = materials.add(unlit_material(face_color.with_alpha(face_alpha)));
        let edges = materials.add(unlit_material(face_color.with_alpha(edge_alpha)));

        commands
            .entity(entity)
            .insert((
                Mesh3d(face_mesh.clone()),
                MeshMaterial3d(face),
                CubeVisual {
                    edges: edges.clone(),
                },
            ))
            .with_children(|parent| {
                parent.spawn((
                    CubeEdges,
                    Mesh3d(edge_mesh.clone()),
                    MeshMaterial3d(edges),
                    Transform::default(),
                ));
            });
    }
}

fn unlit_material(color: Color) -> StandardMaterial {
    StandardMaterial {
        base_color: color,
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        ..default()
    }
}

// ── Per-tick systems ──────────────────────────────────────────────────────────

/// Advance orbit clocks, place cubes, and publish their world positions.
///
/// First stage of the tick: everything downstream (projectiles, collision,
/// lifecycle) sees this frame's positions.
pub fn orbit_motion_system(
    time: Res<Time>,
    config: Res<GalleryConfig>,
    mut ring: ResMut<RingRotation>,
    mut positions: ResMut<CubePositions>,
    mut query: Query<(
        &OrbitingCube,
        &mut OrbitClock,
        &mut CubeLifecycle,
        &mut Transform,
        &mut Visibility,
    )>,
) {
    let dt = time.delta_secs();
    let now = time.elapsed_secs();
    let timings = LifecycleTimings::from(&*config);
    ring.angle += dt * config.ring_rotation_speed;
    let ring_rotation = ring.rotation();

    for (cube, mut clock, mut lifecycle, mut transform, mut visibility) in query.iter_mut() {
        let state = lifecycle.state;
        clock.advance(dt, &state);

        let orbit = cube
            .params
            .position(clock.elapsed, config.bob_amplitude, config.bob_frequency);
        let jitter = jitter_offset(state.intensity(now, &timings), now, &config);
        let world = ring_rotation * orbit + jitter;

        if state.is_targetable() {
            lifecycle.world_position = world;
            positions.publish(cube.id(), world);
        } else {
            positions.withdraw(cube.id());
        }

        transform.translation = lifecycle.world_position;
        transform.rotation = Quat::from_euler(
            EulerRot::XYZ,
            clock.spin * 0.5,
            clock.spin * 0.3,
            clock.spin * 0.2,
        );
        let hovered = matches!(state, CubeState::Hovered);
        transform.scale = if cube.record.is_interactive() {
            Vec3::splat(if hovered { 1.5 } else { 1.0 + (now * 3.0).sin() * 0.1 })
        } else {
            Vec3::ONE
        };

        *visibility = if state.is_visible() {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

/// Feed pointer input and projectile hits through each cube's state machine,
/// then resolve timed transitions and carry out the resulting effects.
#[allow(clippy::too_many_arguments)]
pub fn cube_lifecycle_system(
    mut commands: Commands,
    time: Res<Time>,
    config: Res<GalleryConfig>,
    mut hits: MessageReader<CubeHit>,
    mut pointer: MessageReader<CubePointer>,
    mut queue: ResMut<ContentQueue>,
    mut positions: ResMut<CubePositions>,
    mut query: Query<(&mut OrbitingCube, &mut OrbitClock, &mut CubeLifecycle)>,
) {
    let now = time.elapsed_secs();
    let timings = LifecycleTimings::from(&*config);

    let mut inputs: Vec<(ParticleId, CubeInput)> = pointer
        .read()
        .map(|event| (event.particle, CubeInput::from(event.action)))
        .collect();
    inputs.extend(hits.read().map(|hit| (hit.particle, CubeInput::Hit)));

    let mut rng = rand::thread_rng();
    for (mut cube, mut clock, mut lifecycle) in query.iter_mut() {
        let id = cube.id();
        let interactive = cube.record.is_interactive();
        let cube_inputs = inputs
            .iter()
            .filter(|(target, _)| *target == id)
            .map(|(_, input)| *input)
            .chain(std::iter::once(CubeInput::Tick));

        for input in cube_inputs {
            let transition = lifecycle.state.step(input, now, interactive, &timings);
            lifecycle.state = transition.next;

            match transition.effect {
                None => {}
                Some(CubeEffect::Burst { open_content }) => {
                    positions.withdraw(id);
                    spawn_explosion_burst(
                        &mut commands,
                        lifecycle.world_position,
                        cube.color,
                        &config,
                        &mut rng,
                    );
                    debug!("cube {} exploded", id.0);
                    if open_content {
                        queue.schedule(
                            ContentPayload::from_record(&cube.record, cube.color),
                            now + config.content_open_delay,
                        );
                    }
                }
                Some(CubeEffect::OpenContent) => {
                    queue.schedule(ContentPayload::from_record(&cube.record, cube.color), now);
                }
                Some(CubeEffect::Respawn) => {
                    let (distance, index) = (cube.params.distance, cube.params.index);
                    cube.params = OrbitParams::roll(&mut rng, &config, distance, index);
                    *clock = OrbitClock::default();
                    debug!("cube {} respawned", id.0);
                }
            }
        }
    }
}

/// Edge color follows hover: white while hovered, record color otherwise.
pub fn cube_hover_highlight_system(
    mut materials: ResMut<Assets<StandardMaterial>>,
    query: Query<(&OrbitingCube, &CubeLifecycle, &CubeVisual), Changed<CubeLifecycle>>,
) {
    for (cube, lifecycle, visual) in query.iter() {
        let Some(material) = materials.get_mut(&visual.edges) else {
            continue;
        };
        let base = if cube.record.is_interactive() {
            cube.color
        } else {
            Color::WHITE
        };
        let alpha = material.base_color.alpha();
        material.base_color = if matches!(lifecycle.state, CubeState::Hovered) {
            Color::WHITE.with_alpha(alpha)
        } else {
            base.with_alpha(alpha)
        };
    }
}

// ── Mesh helper ───────────────────────────────────────────────────────────────

/// Build the 12 edges of an axis-aligned cube of edge length `size` as a line list.
pub fn cube_edges_mesh(size: f32) -> Mesh {
    let h = size * 0.5;
    let positions: Vec<[f32; 3]> = vec![
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];
    let normals: Vec<[f32; 3]> = positions
        .iter()
        .map(|p| Vec3::from_array(*p).normalize_or_zero().to_array())
        .collect();
    let indices: Vec<u32> = vec![
        0, 1, 1, 2, 2, 3, 3, 0, // back face
        4, 5, 5, 6, 6, 7, 7, 4, // front face
        0, 4, 1, 5, 2, 6, 3, 7, // connecting edges
    ];

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}
