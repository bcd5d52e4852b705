//! Star field: bright catalog stars placed where they are in tonight's sky.
//!
//! Each star's right ascension is offset by the Local Sidereal Time for the
//! current UTC instant at a fixed observer longitude, then projected onto a
//! sphere of radius `star_sphere_radius` around the origin.  Positions are
//! recomputed every `star_refresh_secs`; in between, the whole field turns
//! very slowly about +Y and each star twinkles on its own phase.
//!
//! | Class | Colour (sRGB) |
//! |-------|---------------|
//! | O/B   | blue-white    |
//! | A     | white         |
//! | F     | yellow-white  |
//! | G     | yellow        |
//! | K     | orange        |
//! | M     | red           |

use std::f32::consts::TAU;
use std::time::{SystemTime, UNIX_EPOCH};

use bevy::prelude::*;
use rand::Rng;

use crate::config::GalleryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralClass {
    OB,
    A,
    F,
    G,
    K,
    M,
}

impl SpectralClass {
    pub fn color(self) -> Color {
        match self {
            SpectralClass::OB => Color::srgb(0.6, 0.7, 1.0),
            SpectralClass::A => Color::srgb(0.9, 0.9, 1.0),
            SpectralClass::F => Color::srgb(1.0, 0.95, 0.8),
            SpectralClass::G => Color::srgb(1.0, 0.9, 0.6),
            SpectralClass::K => Color::srgb(1.0, 0.7, 0.4),
            SpectralClass::M => Color::srgb(1.0, 0.5, 0.3),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpectralClass::OB => "O/B",
            SpectralClass::A => "A",
            SpectralClass::F => "F",
            SpectralClass::G => "G",
            SpectralClass::K => "K",
            SpectralClass::M => "M",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogStar {
    /// Right ascension (hours).
    pub ra_hours: f32,
    /// Declination (degrees).
    pub dec_deg: f32,
    /// Apparent magnitude (lower is brighter).
    pub magnitude: f32,
    pub name: &'static str,
    pub class: SpectralClass,
}

const fn star(
    ra_hours: f32,
    dec_deg: f32,
    magnitude: f32,
    name: &'static str,
    class: SpectralClass,
) -> CatalogStar {
    CatalogStar {
        ra_hours,
        dec_deg,
        magnitude,
        name,
        class,
    }
}

use SpectralClass::*;

/// Bright-star subset of the HYG catalog.
pub const BRIGHT_STARS: &[CatalogStar] = &[
    star(6.752, -16.72, -1.46, "Sirius", A),
    star(6.399, -52.70, -0.72, "Canopus", F),
    star(14.660, -60.83, -0.27, "Alpha Centauri", G),
    star(18.616, 38.78, 0.03, "Vega", A),
    star(5.278, 45.99, 0.08, "Capella", G),
    star(5.242, -8.20, 0.12, "Rigel", OB),
    star(7.655, 5.22, 0.34, "Procyon", F),
    star(1.628, -57.24, 0.46, "Achernar", OB),
    star(5.919, 7.41, 0.50, "Betelgeuse", M),
    star(14.063, 19.18, 0.98, "Arcturus", K),
    star(14.040, -60.37, 0.61, "Hadar", OB),
    star(19.846, 8.87, 0.77, "Altair", A),
    star(4.598, 16.51, 0.85, "Aldebaran", K),
    star(16.490, -26.43, 0.96, "Antares", M),
    star(13.419, -11.16, 0.97, "Spica", OB),
    star(7.577, 31.89, 1.14, "Pollux", K),
    star(22.960, -29.62, 1.16, "Fomalhaut", A),
    star(20.691, 45.28, 1.25, "Deneb", A),
    star(12.443, -63.10, 1.30, "Mimosa", OB),
    star(12.795, -59.69, 1.33, "Acrux", OB),
    star(10.139, 11.97, 1.35, "Regulus", OB),
    star(2.530, 89.26, 1.98, "Polaris", F),
    star(5.419, 6.35, 1.64, "Bellatrix", OB),
    star(5.604, -1.20, 1.69, "Alnilam", OB),
    star(11.062, 61.75, 1.79, "Dubhe", K),
    star(13.792, 49.31, 1.86, "Alkaid", OB),
    star(10.372, 41.50, 3.45, "Psi UMa", K),
    star(10.284, 42.91, 3.48, "Mu UMa", M),
    star(11.897, 47.78, 3.17, "Nu UMa", K),
    star(12.191, 57.03, 3.65, "Xi UMa", G),
    star(9.526, 63.06, 3.32, "Theta UMa", F),
];

// ── Astronomy ─────────────────────────────────────────────────────────────────

/// Seconds since the Unix epoch, as `f64`.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Julian date for a Unix timestamp.
#[inline]
pub fn julian_date(unix_secs: f64) -> f64 {
    unix_secs / 86_400.0 + 2_440_587.5
}

/// Local Sidereal Time in degrees, `[0, 360)`.
pub fn local_sidereal_degrees(unix_secs: f64, longitude_deg: f64) -> f64 {
    let days = julian_date(unix_secs) - 2_451_545.0;
    let centuries = days / 36_525.0;
    let lst = 280.460_618_37
        + 360.985_647_366_29 * days
        + 0.000_387_933 * centuries * centuries
        + longitude_deg;
    lst.rem_euclid(360.0)
}

/// Position of `star` on a sphere of `radius` for the given sidereal time.
pub fn star_position(star: &CatalogStar, lst_deg: f64, radius: f32) -> Vec3 {
    let ra = ((star.ra_hours as f64 * 15.0 - lst_deg) as f32).to_radians();
    let dec = star.dec_deg.to_radians();
    Vec3::new(
        radius * dec.cos() * ra.cos(),
        radius * dec.sin(),
        radius * dec.cos() * ra.sin(),
    )
}

/// Relative brightness from magnitude, floor 0.4.
#[inline]
pub fn star_brightness(magnitude: f32) -> f32 {
    (1.0 - (magnitude + 1.5) / 5.0).clamp(0.4, 1.0)
}

/// Rendered radius from magnitude: brighter stars are bigger.
#[inline]
pub fn star_size(magnitude: f32) -> f32 {
    (0.4 - magnitude * 0.05).max(0.15)
}

// ── Components & resources ────────────────────────────────────────────────────

/// Parent of every star; rotated slowly.
#[derive(Component)]
pub struct StarField;

#[derive(Component, Debug, Clone, Copy)]
pub struct Star {
    /// Index into [`BRIGHT_STARS`].
    pub catalog_index: usize,
    pub size: f32,
    pub twinkle_speed: f32,
    pub phase: f32,
}

/// Counts down to the next recomputation of star positions.
#[derive(Resource)]
pub struct StarRefreshTimer(pub Timer);

// ── Systems ───────────────────────────────────────────────────────────────────

pub fn spawn_star_field(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GalleryConfig>,
) {
    let lst = local_sidereal_degrees(unix_now(), config.observer_longitude);
    let mesh = meshes.add(Sphere::new(1.0).mesh().uv(8, 6));
    let mut rng = rand::thread_rng();

    commands
        .spawn((StarField, Transform::default(), Visibility::default()))
        .with_children(|field| {
            for (index, catalog) in BRIGHT_STARS.iter().enumerate() {
                let brightness = star_brightness(catalog.magnitude);
                let color = catalog.class.color();
                let material = materials.add(StandardMaterial {
                    base_color: color,
                    emissive: color.to_linear() * (brightness * 3.0),
                    unlit: true,
                    ..default()
                });
                let size = star_size(catalog.magnitude);
                field.spawn((
                    Star {
                        catalog_index: index,
                        size,
                        twinkle_speed: rng.gen_range(2.0..5.0),
                        phase: rng.gen_range(0.0..TAU),
                    },
                    Name::new(format!("{} ({})", catalog.name, catalog.class.label())),
                    Mesh3d(mesh.clone()),
                    MeshMaterial3d(material),
                    Transform::from_translation(star_position(
                        catalog,
                        lst,
                        config.star_sphere_radius,
                    ))
                    .with_scale(Vec3::splat(size)),
                ));
            }
        });

    commands.insert_resource(StarRefreshTimer(Timer::from_seconds(
        config.star_refresh_secs,
        TimerMode::Repeating,
    )));
    info!("Star field placed for LST {lst:.2}°");
}

/// Move every star to where the sky is now, once per refresh period.
pub fn refresh_star_positions_system(
    time: Res<Time>,
    config: Res<GalleryConfig>,
    mut timer: ResMut<StarRefreshTimer>,
    mut stars: Query<(&Star, &mut Transform)>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }
    let lst = local_sidereal_degrees(unix_now(), config.observer_longitude);
    for (star, mut transform) in stars.iter_mut() {
        if let Some(catalog) = BRIGHT_STARS.get(star.catalog_index) {
            transform.translation = star_position(catalog, lst, config.star_sphere_radius);
        }
    }
    info!("Star positions updated for LST {lst:.2}°");
}

pub fn star_twinkle_system(time: Res<Time>, mut stars: Query<(&Star, &mut Transform)>) {
    let t = time.elapsed_secs();
    for (star, mut transform) in stars.iter_mut() {
        let twinkle = 0.7 + 0.3 * (t * star.twinkle_speed + star.phase).sin();
        transform.scale = Vec3::splat(star.size * twinkle);
    }
}

pub fn star_field_rotation_system(
    time: Res<Time>,
    config: Res<GalleryConfig>,
    mut fields: Query<&mut Transform, (With<StarField>, Without<Star>)>,
) {
    let angle = time.elapsed_secs() * config.star_rotation_speed;
    for mut transform in fields.iter_mut() {
        transform.rotation = Quat::from_rotation_y(angle);
    }
}
