//! Draggable screen-space turret (Gallery mode).
//!
//! Left press inside the grab radius picks the turret up; a press anywhere
//! else fires from the barrel tip toward the cursor and keeps firing every
//! `auto_fire_interval` while held.  The repeat timer resets on release and
//! whenever Gallery mode is left.

use bevy::prelude::*;

use crate::config::GalleryConfig;
use crate::pointer::CursorState;
use crate::projectile::FireProjectile;

/// Distance of the turret base from the bottom edge of the window.
const BOTTOM_MARGIN_PX: f32 = 80.0;

/// One frame of pointer input as the turret sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurretInput {
    pub cursor: Option<Vec2>,
    pub just_pressed: bool,
    pub pressed: bool,
    pub just_released: bool,
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct TurretState {
    /// Base position in window pixels; placed bottom-centre on first use.
    pub position: Option<Vec2>,
    /// Cursor-to-base offset while dragging.
    pub drag_offset: Option<Vec2>,
    pub firing: bool,
    /// Seconds until the next automatic shot.
    pub repeat: f32,
}

impl TurretState {
    /// Slack for float drift when the repeat timer lands on zero.
    const REPEAT_TOLERANCE: f32 = 1e-5;

    /// Base position, defaulting to bottom-centre of `viewport`.
    pub fn base(&self, viewport: Vec2) -> Vec2 {
        self.position
            .unwrap_or(Vec2::new(viewport.x * 0.5, viewport.y - BOTTOM_MARGIN_PX))
    }

    /// Barrel tip: `barrel_length` from the base toward `aim` (straight up
    /// when there is no aim or it sits on the base).
    pub fn barrel_tip(&self, viewport: Vec2, aim: Option<Vec2>, barrel_length: f32) -> Vec2 {
        let base = self.base(viewport);
        let dir = aim
            .map(|a| (a - base).normalize_or_zero())
            .filter(|d| *d != Vec2::ZERO)
            .unwrap_or(Vec2::NEG_Y);
        base + dir * barrel_length
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_offset.is_some()
    }

    /// Stop firing and dragging; the next press starts a fresh repeat cycle.
    pub fn reset(&mut self) {
        self.firing = false;
        self.drag_offset = None;
        self.repeat = 0.0;
    }

    /// Advance one frame; returns how many shots to fire.
    pub fn step(
        &mut self,
        input: TurretInput,
        dt: f32,
        viewport: Vec2,
        config: &GalleryConfig,
    ) -> u32 {
        let mut shots = 0;

        if input.just_pressed {
            if let Some(cursor) = input.cursor {
                let base = self.base(viewport);
                // Presses inside the barrel would aim backwards past the tip.
                let grab_radius = config
                    .turret_grab_radius_px
                    .max(config.turret_barrel_length_px);
                if cursor.distance(base) <= grab_radius {
                    self.drag_offset = Some(base - cursor);
                } else {
                    self.firing = true;
                    self.repeat = config.auto_fire_interval;
                    shots += 1;
                }
            }
        } else if input.pressed && self.firing {
            self.repeat -= dt;
            while self.repeat <= Self::REPEAT_TOLERANCE {
                shots += 1;
                self.repeat += config.auto_fire_interval.max(0.001);
            }
        }

        if input.pressed {
            if let (Some(offset), Some(cursor)) = (self.drag_offset, input.cursor) {
                self.position = Some((cursor + offset).clamp(Vec2::ZERO, viewport));
            }
        }

        if input.just_released || (!input.pressed && !input.just_pressed) {
            self.reset();
        }
        shots
    }
}

/// Root node of the turret UI; only exists in Gallery mode.
#[derive(Component)]
pub struct TurretRoot;

#[derive(Component)]
pub struct TurretBase;

#[derive(Component)]
pub struct TurretTip;

const BASE_SIZE_PX: f32 = 28.0;
const TIP_SIZE_PX: f32 = 8.0;

// ── Systems ───────────────────────────────────────────────────────────────────

/// Drag the turret or fire from it.
pub fn turret_input_system(
    time: Res<Time>,
    config: Res<GalleryConfig>,
    cursor: Res<CursorState>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut turret: ResMut<TurretState>,
    mut fire: MessageWriter<FireProjectile>,
) {
    let input = TurretInput {
        cursor: cursor.position,
        just_pressed: buttons.just_pressed(MouseButton::Left),
        pressed: buttons.pressed(MouseButton::Left),
        just_released: buttons.just_released(MouseButton::Left),
    };
    let shots = turret.step(input, time.delta_secs(), cursor.viewport, &config);
    if shots == 0 {
        return;
    }
    let origin = turret.barrel_tip(cursor.viewport, cursor.position, config.turret_barrel_length_px);
    let aim = cursor.position.unwrap_or(origin);
    for _ in 0..shots {
        fire.write(FireProjectile {
            origin,
            aim,
            viewport: cursor.viewport,
        });
    }
}

/// Leaving Gallery mode stops auto-fire and drops the turret.
pub fn reset_turret_system(mut turret: ResMut<TurretState>) {
    turret.reset();
}

pub fn spawn_turret_ui(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            TurretRoot,
        ))
        .with_children(|root| {
            root.spawn((
                Node {
                    position_type: PositionType::Absolute,
                    width: Val::Px(BASE_SIZE_PX),
                    height: Val::Px(BASE_SIZE_PX),
                    border: UiRect::all(Val::Px(2.0)),
                    ..default()
                },
                BackgroundColor(Color::srgba(0.05, 0.9, 1.0, 0.15)),
                BorderColor::all(Color::srgb(0.0, 0.96, 1.0)),
                TurretBase,
            ));
            root.spawn((
                Node {
                    position_type: PositionType::Absolute,
                    width: Val::Px(TIP_SIZE_PX),
                    height: Val::Px(TIP_SIZE_PX),
                    ..default()
                },
                BackgroundColor(Color::srgb(1.0, 0.85, 0.3)),
                TurretTip,
            ));
        });
}

pub fn despawn_turret_ui(mut commands: Commands, query: Query<Entity, With<TurretRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

/// Place the base and tip nodes.
pub fn sync_turret_ui_system(
    config: Res<GalleryConfig>,
    cursor: Res<CursorState>,
    turret: Res<TurretState>,
    mut bases: Query<&mut Node, (With<TurretBase>, Without<TurretTip>)>,
    mut tips: Query<&mut Node, (With<TurretTip>, Without<TurretBase>)>,
) {
    let base = turret.base(cursor.viewport);
    let tip = turret.barrel_tip(cursor.viewport, cursor.position, config.turret_barrel_length_px);
    for mut node in bases.iter_mut() {
        node.left = Val::Px(base.x - BASE_SIZE_PX * 0.5);
        node.top = Val::Px(base.y - BASE_SIZE_PX * 0.5);
    }
    for mut node in tips.iter_mut() {
        node.left = Val::Px(tip.x - TIP_SIZE_PX * 0.5);
        node.top = Val::Px(tip.y - TIP_SIZE_PX * 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1600.0, 900.0);

    fn press(at: Vec2) -> TurretInput {
        TurretInput {
            cursor: Some(at),
            just_pressed: true,
            pressed: true,
            just_released: false,
        }
    }

    fn hold(at: Vec2) -> TurretInput {
        TurretInput {
            cursor: Some(at),
            just_pressed: false,
            pressed: true,
            just_released: false,
        }
    }

    fn release(at: Vec2) -> TurretInput {
        TurretInput {
            cursor: Some(at),
            just_pressed: false,
            pressed: false,
            just_released: true,
        }
    }

    #[test]
    fn holding_fires_once_per_interval() {
        let cfg = GalleryConfig::default();
        let mut t = TurretState::default();
        let aim = Vec2::new(300.0, 200.0);

        let mut shots = t.step(press(aim), 0.0, VIEWPORT, &cfg);
        assert_eq!(shots, 1, "press fires immediately");
        for _ in 0..20 {
            shots += t.step(hold(aim), 0.05, VIEWPORT, &cfg);
        }
        // 1 s held at 150 ms: the initial shot plus six repeats.
        assert_eq!(shots, 7);
    }

    #[test]
    fn release_resets_the_repeat_timer() {
        let cfg = GalleryConfig::default();
        let mut t = TurretState::default();
        let aim = Vec2::new(300.0, 200.0);
        t.step(press(aim), 0.0, VIEWPORT, &cfg);
        t.step(hold(aim), 0.1, VIEWPORT, &cfg);
        t.step(release(aim), 0.0, VIEWPORT, &cfg);
        assert!(!t.firing);
        assert_eq!(t.repeat, 0.0);

        // A fresh press fires immediately and waits a full interval again.
        assert_eq!(t.step(press(aim), 0.0, VIEWPORT, &cfg), 1);
        assert_eq!(t.step(hold(aim), 0.1, VIEWPORT, &cfg), 0);
    }

    #[test]
    fn press_on_base_drags_instead_of_firing() {
        let cfg = GalleryConfig::default();
        let mut t = TurretState::default();
        let base = t.base(VIEWPORT);

        assert_eq!(t.step(press(base + Vec2::new(5.0, 0.0)), 0.0, VIEWPORT, &cfg), 0);
        assert!(t.is_dragging());
        assert_eq!(
            t.step(hold(Vec2::new(405.0, 300.0)), 0.05, VIEWPORT, &cfg),
            0
        );
        assert_eq!(t.base(VIEWPORT), Vec2::new(400.0, 300.0));

        t.step(release(Vec2::new(405.0, 300.0)), 0.0, VIEWPORT, &cfg);
        assert!(!t.is_dragging());
        assert_eq!(t.base(VIEWPORT), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn press_inside_the_barrel_grabs_instead_of_firing_backwards() {
        let cfg = GalleryConfig::default();
        let mut t = TurretState::default();
        let base = t.base(VIEWPORT);
        let inside_barrel = base - Vec2::new(0.0, cfg.turret_barrel_length_px - 1.0);

        assert_eq!(t.step(press(inside_barrel), 0.0, VIEWPORT, &cfg), 0);
        assert!(t.is_dragging());
        assert!(!t.firing);
    }

    #[test]
    fn barrel_tip_points_at_the_cursor() {
        let t = TurretState {
            position: Some(Vec2::new(100.0, 100.0)),
            ..Default::default()
        };
        let tip = t.barrel_tip(VIEWPORT, Some(Vec2::new(200.0, 100.0)), 30.0);
        assert_eq!(tip, Vec2::new(130.0, 100.0));
        let idle = t.barrel_tip(VIEWPORT, None, 30.0);
        assert_eq!(idle, Vec2::new(100.0, 70.0));
    }
}
