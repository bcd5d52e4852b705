//! Headless tests for the orbit → projectile → collision → lifecycle pipeline.
//!
//! These tests drive [`GalleryCorePlugin`] under [`MinimalPlugins`] with a
//! fixed 50 ms tick, so every timed transition lands on a predictable frame.
//! No window, renderer or asset server is created; cube meshes are never
//! attached, which the core pipeline does not need.
//!
//! Covered scenarios:
//! 1. A feed load spawns one cube per record and publishes their positions.
//! 2. A projectile sitting on a cube destroys it and spawns one burst.
//! 3. The destroyed cube comes back after the explode and respawn delays
//!    with a restarted, running orbit clock.
//! 4. Shooting an interactive cube opens its content after the open delay.
//! 5. Shooting a link cube sends its target to the browser, not the panel.
//! 6. Clicking an interactive cube opens its content on the same frame.
//! 7. A reload clears cubes, projectiles and pending content.

use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use orbit_gallery::collision::{CubePositions, HitStats};
use orbit_gallery::config::GalleryConfig;
use orbit_gallery::content::{self, ActiveContent, ContentQueue, OpenLink};
use orbit_gallery::explosion::Fragment;
use orbit_gallery::gallery::GalleryCorePlugin;
use orbit_gallery::orbit::{CubeLifecycle, CubeState, OrbitClock, OrbitingCube};
use orbit_gallery::particle_source::{parse_feed, ParticleId, ParticlesLoaded, ReloadParticles};
use orbit_gallery::pointer::{project, CursorState};
use orbit_gallery::projectile::Projectile;

const TICK: Duration = Duration::from_millis(50);

const FEED: &str = r##"[
    { "id": 1, "name": "About", "type": "html", "src": "<p>hi</p>", "color": "#ff8800", "distance": 4.0, "isListed": true },
    { "id": 2, "name": null, "type": null, "src": null, "color": null, "distance": 6.0 },
    { "id": 3, "name": "Projects", "type": "link", "src": "https://example.org/projects", "distance": 5.0 }
]"##;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn gallery_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(TICK));
    app.insert_resource(GalleryConfig::default());
    app.init_resource::<ButtonInput<KeyCode>>();
    app.init_resource::<ButtonInput<MouseButton>>();
    app.add_plugins(GalleryCorePlugin);
    app.init_resource::<OpenedLinks>();
    app.add_systems(Update, record_links.after(content::open_content_system));
    app
}

/// Links the scene asked the browser to open.
#[derive(Resource, Default)]
struct OpenedLinks(Vec<String>);

fn record_links(mut links: MessageReader<OpenLink>, mut opened: ResMut<OpenedLinks>) {
    opened.0.extend(links.read().map(|link| link.0.clone()));
}

/// App with the test feed loaded and one frame run.
fn loaded_app() -> App {
    let mut app = gallery_app();
    let records = parse_feed(FEED).unwrap();
    app.world_mut().write_message(ParticlesLoaded(records));
    app.update();
    app
}

fn run(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

fn cube_state(app: &mut App, id: u64) -> CubeState {
    let mut query = app.world_mut().query::<(&OrbitingCube, &CubeLifecycle)>();
    query
        .iter(app.world())
        .find(|(cube, _)| cube.id() == ParticleId(id))
        .map(|(_, lifecycle)| lifecycle.state)
        .expect("cube should exist")
}

fn orbit_clock(app: &mut App, id: u64) -> OrbitClock {
    let mut query = app.world_mut().query::<(&OrbitingCube, &OrbitClock)>();
    query
        .iter(app.world())
        .find(|(cube, _)| cube.id() == ParticleId(id))
        .map(|(_, clock)| *clock)
        .expect("cube should exist")
}

fn count<C: Component>(app: &mut App) -> usize {
    let mut query = app.world_mut().query::<&C>();
    query.iter(app.world()).count()
}

/// Park a motionless projectile on the cube's last published position.
fn shoot_at(app: &mut App, id: u64) {
    let position = app
        .world()
        .resource::<CubePositions>()
        .get(ParticleId(id))
        .expect("cube should be published");
    let now = app.world().resource::<Time>().elapsed_secs();
    app.world_mut().spawn((
        Projectile {
            id: 900 + id,
            created_at: now,
            ..default()
        },
        Transform::from_translation(position),
    ));
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn feed_load_spawns_and_publishes_cubes() {
    let mut app = loaded_app();

    assert_eq!(count::<OrbitingCube>(&mut app), 3);
    let positions = app.world().resource::<CubePositions>();
    assert_eq!(positions.len(), 3);
    let about = positions.get(ParticleId(1)).unwrap();
    let radial = Vec2::new(about.x, about.z).length();
    assert!((radial - 4.0).abs() < 1e-3, "radius {radial}");
}

#[test]
fn projectile_on_a_cube_destroys_it() {
    let mut app = loaded_app();
    shoot_at(&mut app, 2);
    app.update();

    assert_eq!(app.world().resource::<HitStats>().hits, 1);
    assert!(matches!(cube_state(&mut app, 2), CubeState::Exploding { .. }));
    assert!(app.world().resource::<CubePositions>().get(ParticleId(2)).is_none());
    assert_eq!(
        count::<Fragment>(&mut app),
        GalleryConfig::default().burst_fragments as usize,
        "exactly one burst"
    );
    assert_eq!(count::<Projectile>(&mut app), 0, "hit projectile is culled");

    // The untouched cube keeps orbiting.
    assert_eq!(cube_state(&mut app, 1), CubeState::Orbiting);
}

#[test]
fn destroyed_cube_respawns_after_delays() {
    let mut app = loaded_app();
    shoot_at(&mut app, 2);
    app.update();

    // explode_delay 0.1 s
    run(&mut app, 3);
    assert!(matches!(cube_state(&mut app, 2), CubeState::Destroyed { .. }));

    let before = orbit_clock(&mut app, 2).elapsed;
    assert!(before > 0.0);

    // respawn_delay 3 s
    run(&mut app, 62);
    assert_eq!(cube_state(&mut app, 2), CubeState::Orbiting);
    assert!(app.world().resource::<CubePositions>().get(ParticleId(2)).is_some());
    assert_eq!(count::<Fragment>(&mut app), 0, "burst has faded out");

    // Fresh phase: the clock restarted at respawn and is running again.
    let fresh = orbit_clock(&mut app, 2).elapsed;
    assert!(fresh < 0.25, "clock not reset: {fresh}");
    run(&mut app, 4);
    let later = orbit_clock(&mut app, 2).elapsed;
    assert!((later - fresh - 0.2).abs() < 1e-3, "clock frozen: {fresh} -> {later}");
}

#[test]
fn shooting_interactive_cube_opens_content_after_delay() {
    let mut app = loaded_app();
    shoot_at(&mut app, 1);
    app.update();

    assert_eq!(app.world().resource::<ContentQueue>().len(), 1);
    assert!(!app.world().resource::<ActiveContent>().is_open());

    run(&mut app, 5);
    assert!(!app.world().resource::<ActiveContent>().is_open());

    run(&mut app, 6);
    let active = app.world().resource::<ActiveContent>();
    let payload = active.0.as_ref().expect("content should be open");
    assert_eq!(payload.name, "About");
    assert_eq!(payload.particle, ParticleId(1));
    assert!(app.world().resource::<ContentQueue>().is_empty());
}

#[test]
fn shooting_link_cube_opens_the_browser_instead_of_a_panel() {
    let mut app = loaded_app();
    shoot_at(&mut app, 3);
    app.update();
    run(&mut app, 12);

    assert!(!app.world().resource::<ActiveContent>().is_open());
    assert_eq!(
        app.world().resource::<OpenedLinks>().0,
        vec!["https://example.org/projects".to_string()]
    );
}

#[test]
fn clicking_interactive_cube_opens_content_immediately() {
    let mut app = loaded_app();
    let config = GalleryConfig::default();
    let position = app
        .world()
        .resource::<CubePositions>()
        .get(ParticleId(1))
        .unwrap();
    let viewport = app.world().resource::<CursorState>().viewport;
    let screen = project(position, viewport, &config).expect("cube is in front of the camera");
    app.world_mut().resource_mut::<CursorState>().position = Some(screen);

    app.update();
    assert_eq!(cube_state(&mut app, 1), CubeState::Hovered);

    app.world_mut()
        .resource_mut::<ButtonInput<MouseButton>>()
        .press(MouseButton::Left);
    app.update();

    let active = app.world().resource::<ActiveContent>();
    assert_eq!(active.0.as_ref().map(|p| p.name.as_str()), Some("About"));
    assert_eq!(app.world().resource::<HitStats>().hits, 0);
}

#[test]
fn reload_clears_cubes_projectiles_and_pending_content() {
    let mut app = loaded_app();
    shoot_at(&mut app, 1);
    app.update();
    shoot_at(&mut app, 2);
    assert_eq!(app.world().resource::<ContentQueue>().len(), 1);

    app.world_mut().write_message(ReloadParticles);
    app.update();

    assert_eq!(count::<OrbitingCube>(&mut app), 0);
    assert_eq!(count::<Projectile>(&mut app), 0);
    assert!(app.world().resource::<CubePositions>().is_empty());
    assert!(app.world().resource::<ContentQueue>().is_empty());

    run(&mut app, 12);
    assert!(!app.world().resource::<ActiveContent>().is_open());
}
