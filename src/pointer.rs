//! Pointer picking for cubes in Explore mode.
//!
//! Cubes are picked in screen space: every position in [`CubePositions`] is
//! projected through the same perspective the camera uses and the nearest one
//! within `pick_radius_px` of the cursor is hovered.  [`PointerTarget`] turns
//! hover/press changes into [`CubePointer`] messages for the lifecycle system.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::collision::CubePositions;
use crate::config::GalleryConfig;
use crate::constants::DEFAULT_ASPECT;
use crate::content::ActiveContent;
use crate::particle_source::ParticleId;

/// Pointer action aimed at one cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Enter,
    Leave,
    Down,
    Up,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubePointer {
    pub particle: ParticleId,
    pub action: PointerAction,
}

impl CubePointer {
    fn new(particle: ParticleId, action: PointerAction) -> Self {
        Self { particle, action }
    }
}

/// Cursor position (logical pixels, origin top-left) and window size.
///
/// Written by [`track_cursor_system`]; headless tests set it directly.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CursorState {
    pub position: Option<Vec2>,
    pub viewport: Vec2,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            position: None,
            viewport: Vec2::new(1280.0, 1280.0 / DEFAULT_ASPECT),
        }
    }
}

/// Which cube is under the pointer and which one the button went down on.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerTarget {
    pub hovered: Option<ParticleId>,
    pub pressed: Option<ParticleId>,
}

impl PointerTarget {
    /// Apply this frame's hover and button state, returning the messages to send.
    pub fn update(
        &mut self,
        hovered: Option<ParticleId>,
        just_pressed: bool,
        just_released: bool,
    ) -> Vec<CubePointer> {
        let mut out = Vec::new();
        if hovered != self.hovered {
            if let Some(old) = self.hovered {
                out.push(CubePointer::new(old, PointerAction::Leave));
            }
            if let Some(new) = hovered {
                out.push(CubePointer::new(new, PointerAction::Enter));
            }
            self.hovered = hovered;
        }
        if just_pressed {
            if let Some(target) = self.hovered {
                out.push(CubePointer::new(target, PointerAction::Down));
                self.pressed = Some(target);
            }
        }
        if just_released {
            if let Some(target) = self.pressed.take() {
                out.push(CubePointer::new(target, PointerAction::Up));
            }
        }
        out
    }

    /// Let go of everything (mode switch, panel opened).
    pub fn release_all(&mut self) -> Vec<CubePointer> {
        let mut out = Vec::new();
        if let Some(target) = self.pressed.take() {
            out.push(CubePointer::new(target, PointerAction::Up));
        }
        if let Some(target) = self.hovered.take() {
            out.push(CubePointer::new(target, PointerAction::Leave));
        }
        out
    }
}

/// Project a world point to screen pixels, or `None` when behind the camera.
///
/// Inverse of [`crate::projectile::unproject`]: camera at
/// [`GalleryConfig::camera_position`] looking down −Z.
pub fn project(world: Vec3, viewport: Vec2, config: &GalleryConfig) -> Option<Vec2> {
    let rel = world - config.camera_position();
    let depth = -rel.z;
    if depth <= 0.01 {
        return None;
    }
    let width = viewport.x.max(1.0);
    let height = viewport.y.max(1.0);
    let half_height = (config.fov_radians() * 0.5).tan() * depth;
    let half_width = half_height * width / height;
    let ndc = Vec2::new(rel.x / half_width, rel.y / half_height);
    Some(Vec2::new(
        (ndc.x + 1.0) * 0.5 * width,
        (1.0 - ndc.y) * 0.5 * height,
    ))
}

/// Nearest published cube within `config.pick_radius_px` of `cursor`.
pub fn pick_cube(
    cursor: Vec2,
    viewport: Vec2,
    cubes: &CubePositions,
    config: &GalleryConfig,
) -> Option<ParticleId> {
    let radius_sq = config.pick_radius_px * config.pick_radius_px;
    cubes
        .iter()
        .filter_map(|(id, pos)| {
            let screen = project(pos, viewport, config)?;
            let d2 = screen.distance_squared(cursor);
            (d2 <= radius_sq).then_some((id, d2))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Copy the primary window's cursor and size into [`CursorState`].
pub fn track_cursor_system(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cursor: ResMut<CursorState>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    cursor.position = window.cursor_position();
    cursor.viewport = Vec2::new(window.width(), window.height());
}

/// Hover and press cubes under the cursor.  Nothing is picked while the
/// content panel is open.
pub fn pointer_pick_system(
    config: Res<GalleryConfig>,
    cursor: Res<CursorState>,
    buttons: Res<ButtonInput<MouseButton>>,
    cubes: Res<CubePositions>,
    content: Res<ActiveContent>,
    mut target: ResMut<PointerTarget>,
    mut out: MessageWriter<CubePointer>,
) {
    let hovered = if content.is_open() {
        None
    } else {
        cursor
            .position
            .and_then(|pos| pick_cube(pos, cursor.viewport, &cubes, &config))
    };
    let messages = target.update(
        hovered,
        buttons.just_pressed(MouseButton::Left),
        buttons.just_released(MouseButton::Left),
    );
    out.write_batch(messages);
}

/// Leaving Explore mode releases whatever the pointer was holding.
pub fn release_pointer_system(
    mut target: ResMut<PointerTarget>,
    mut out: MessageWriter<CubePointer>,
) {
    out.write_batch(target.release_all());
}
