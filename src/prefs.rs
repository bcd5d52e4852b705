//! Persisted user preferences (`saves/prefs.toml`).
//!
//! The only flag today is whether the Gallery-mode hint has been seen.  Read
//! and write failures are logged and never fatal: the scene just runs with
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::GalleryResult;

fn save_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_prefs_path() -> PathBuf {
    save_dir().join("prefs.toml")
}

/// Where preferences are read from and written to.
#[derive(Resource, Debug, Clone)]
pub struct PrefsPath(pub PathBuf);

impl Default for PrefsPath {
    fn default() -> Self {
        Self(default_prefs_path())
    }
}

#[derive(Resource, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    pub gallery_hint_seen: bool,
}

impl Preferences {
    /// Read preferences; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> GalleryResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn save_to(&self, path: &Path) -> GalleryResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }
}

/// Startup system: load preferences into the world.
pub fn load_preferences_system(mut commands: Commands, path: Res<PrefsPath>) {
    let prefs = Preferences::load_from(&path.0).unwrap_or_else(|err| {
        warn!("failed to read {}: {err}; using defaults", path.0.display());
        Preferences::default()
    });
    commands.insert_resource(prefs);
}

/// Entering Gallery mode for the first time retires the hint for good.
pub fn mark_gallery_hint_seen(mut prefs: ResMut<Preferences>, path: Res<PrefsPath>) {
    if prefs.gallery_hint_seen {
        return;
    }
    prefs.gallery_hint_seen = true;
    if let Err(err) = prefs.save_to(&path.0) {
        warn!("failed to write {}: {err}", path.0.display());
    }
}
