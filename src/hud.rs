//! HUD: side legend of listed records, hit counter, and the mode hint line.

use bevy::prelude::*;

use crate::collision::HitStats;
use crate::config::GalleryConfig;
use crate::gallery::SceneMode;
use crate::particle_source::LoadedParticles;
use crate::prefs::Preferences;
use crate::projectile::ProjectileCounter;

/// Column of listed record names, left edge.
#[derive(Component)]
pub struct HudLegend;

/// One legend line; replaced whenever the feed reloads.
#[derive(Component)]
pub struct LegendEntry;

#[derive(Component)]
pub struct HudHitCounter;

#[derive(Component)]
pub struct HudModeHint;

/// Hint line for `mode`; first-time visitors get the Gallery teaser.
pub fn hint_text(mode: SceneMode, gallery_hint_seen: bool) -> &'static str {
    match (mode, gallery_hint_seen) {
        (SceneMode::Explore, false) => "Press G to enter gallery mode and shoot the cubes  ·  R reload",
        (SceneMode::Explore, true) => "G gallery  ·  R reload",
        (SceneMode::Gallery, _) => "Drag the turret  ·  hold to fire  ·  G explore",
    }
}

pub fn setup_hud(
    mut commands: Commands,
    config: Res<GalleryConfig>,
    prefs: Option<Res<Preferences>>,
) {
    let font_size = config.hud_font_size;

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
            HudHitCounter,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Hits: 0  Shots: 0"),
                TextFont {
                    font_size,
                    ..default()
                },
                TextColor(Color::srgb(0.95, 0.88, 0.45)),
            ));
        });

    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Percent(35.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            ..default()
        },
        HudLegend,
    ));

    let seen = prefs.is_some_and(|p| p.gallery_hint_seen);
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                bottom: Val::Px(10.0),
                ..default()
            },
            HudModeHint,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(hint_text(SceneMode::Explore, seen)),
                TextFont {
                    font_size: font_size * 0.9,
                    ..default()
                },
                TextColor(Color::srgb(0.55, 0.6, 0.7)),
            ));
        });
}

/// Rebuild the legend after every feed load.
pub fn legend_system(
    mut commands: Commands,
    config: Res<GalleryConfig>,
    loaded: Res<LoadedParticles>,
    legends: Query<Entity, With<HudLegend>>,
    entries: Query<Entity, With<LegendEntry>>,
) {
    if !loaded.is_changed() {
        return;
    }
    for entity in entries.iter() {
        commands.entity(entity).despawn();
    }
    let Ok(legend) = legends.single() else {
        return;
    };
    commands.entity(legend).with_children(|parent| {
        for record in loaded.0.iter().filter(|r| r.is_listed) {
            parent.spawn((
                LegendEntry,
                Text::new(format!("■ {}", record.label())),
                TextFont {
                    font_size: config.hud_font_size,
                    ..default()
                },
                TextColor(record.color()),
            ));
        }
    });
}

pub fn hit_counter_system(
    stats: Res<HitStats>,
    counter: Res<ProjectileCounter>,
    parent_query: Query<&Children, With<HudHitCounter>>,
    mut text_query: Query<&mut Text>,
) {
    if !stats.is_changed() && !counter.is_changed() {
        return;
    }
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(format!("Hits: {}  Shots: {}", stats.hits, counter.fired()));
            }
        }
    }
}

pub fn mode_hint_system(
    mode: Res<State<SceneMode>>,
    prefs: Option<Res<Preferences>>,
    parent_query: Query<&Children, With<HudModeHint>>,
    mut text_query: Query<&mut Text>,
) {
    let prefs_changed = prefs.as_ref().is_some_and(|p| p.is_changed());
    if !mode.is_changed() && !prefs_changed {
        return;
    }
    let seen = prefs.is_some_and(|p| p.gallery_hint_seen);
    let line = hint_text(*mode.get(), seen);
    for children in parent_query.iter() {
        for child in children.iter() {
            if let Ok(mut text) = text_query.get_mut(child) {
                *text = Text::new(line);
            }
        }
    }
}
