use bevy::prelude::*;
use bevy::window::WindowResolution;

use orbit_gallery::config::{self, GalleryConfig};
use orbit_gallery::gallery::GalleryPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Orbit Gallery".into(),
                resolution: WindowResolution::new(1280, 720),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .insert_resource(ClearColor(Color::BLACK))
        // Insert GalleryConfig with compiled defaults; load_gallery_config will
        // overwrite it from assets/gallery.toml (if present) in the Startup schedule.
        .insert_resource(GalleryConfig::default())
        .add_systems(Startup, config::load_gallery_config)
        .add_plugins(GalleryPlugin)
        .run();
}
