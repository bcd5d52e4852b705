//! Projectile–cube collision detection.
//!
//! Cubes publish their world positions into [`CubePositions`] (one writer per
//! key: the cube's own entry); [`collision_detection_system`] is the only
//! reader.  Each tick every live, not-yet-hit projectile is compared against
//! every published cube in ascending particle-id order and the first cube
//! inside [`GalleryConfig::collision_radius`] wins.
//!
//! ## Scale
//!
//! The scan is O(projectiles × cubes).  At the feed sizes this scene sees
//! (tens of cubes, tens of projectiles in flight) that is a few hundred
//! distance checks per frame.  A uniform grid only starts paying for itself
//! somewhere past ~1 000 × 1 000 pairs per tick.
//!
//! ## Duplicate hits
//!
//! Hits are deduplicated per projectile (a projectile hits at most one cube),
//! not per cube: two projectiles reaching the same cube in one tick are both
//! marked hit and both produce a [`CubeHit`].  The cube's state machine
//! absorbs the second one (an `Exploding` cube ignores hits), so only one
//! burst is spawned.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::config::GalleryConfig;
use crate::particle_source::ParticleId;
use crate::projectile::Projectile;

/// Shared table of targetable cube positions, keyed by particle id.
#[derive(Resource, Debug, Clone, Default)]
pub struct CubePositions {
    entries: BTreeMap<ParticleId, Vec3>,
}

impl CubePositions {
    /// Insert or overwrite a cube's position for this tick.
    pub fn publish(&mut self, id: ParticleId, position: Vec3) {
        self.entries.insert(id, position);
    }

    /// Remove a cube that can no longer be hit.
    pub fn withdraw(&mut self, id: ParticleId) {
        self.entries.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: ParticleId) -> Option<Vec3> {
        self.entries.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, Vec3)> + '_ {
        self.entries.iter().map(|(id, pos)| (*id, *pos))
    }
}

/// One-shot hit notification consumed by the cube lifecycle.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeHit {
    pub particle: ParticleId,
    pub projectile: u64,
}

/// First cube (in table order) strictly within `radius` of `point`.
pub fn first_cube_within(cubes: &CubePositions, point: Vec3, radius: f32) -> Option<ParticleId> {
    let radius_sq = radius * radius;
    cubes
        .iter()
        .find(|(_, pos)| pos.distance_squared(point) < radius_sq)
        .map(|(id, _)| id)
}

/// Running totals shown by the HUD.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct HitStats {
    pub hits: u32,
}

/// Mark projectiles that reached a cube and announce each hit.
pub fn collision_detection_system(
    config: Res<GalleryConfig>,
    cubes: Res<CubePositions>,
    mut projectiles: Query<(&mut Projectile, &Transform)>,
    mut hits: MessageWriter<CubeHit>,
    mut stats: ResMut<HitStats>,
) {
    if cubes.is_empty() {
        return;
    }
    for (mut projectile, transform) in projectiles.iter_mut() {
        if projectile.hit {
            continue;
        }
        let Some(particle) =
            first_cube_within(&cubes, transform.translation, config.collision_radius)
        else {
            continue;
        };
        projectile.hit = true;
        stats.hits += 1;
        hits.write(CubeHit {
            particle,
            projectile: projectile.id,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(u64, Vec3)]) -> CubePositions {
        let mut t = CubePositions::default();
        for (id, pos) in entries {
            t.publish(ParticleId(*id), *pos);
        }
        t
    }

    #[test]
    fn hit_inside_radius_miss_on_boundary() {
        let t = table(&[(1, Vec3::new(1.0, 0.0, 0.0))]);
        assert_eq!(
            first_cube_within(&t, Vec3::new(1.2, 0.0, 0.0), 0.35),
            Some(ParticleId(1))
        );
        assert_eq!(first_cube_within(&t, Vec3::new(1.35, 0.0, 0.0), 0.35), None);
    }

    #[test]
    fn overlapping_cubes_resolve_to_lowest_id() {
        let t = table(&[
            (9, Vec3::new(0.1, 0.0, 0.0)),
            (4, Vec3::new(-0.1, 0.0, 0.0)),
        ]);
        assert_eq!(first_cube_within(&t, Vec3::ZERO, 0.35), Some(ParticleId(4)));
    }

    #[test]
    fn withdrawn_cube_cannot_be_hit() {
        let mut t = table(&[(1, Vec3::ZERO)]);
        t.withdraw(ParticleId(1));
        assert_eq!(first_cube_within(&t, Vec3::ZERO, 1.0), None);
        assert!(t.is_empty());
    }

    fn collision_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<CubeHit>();
        app.insert_resource(GalleryConfig::default());
        app.init_resource::<HitStats>();
        app.add_systems(Update, collision_detection_system);
        app
    }

    fn spawn_projectile(app: &mut App, id: u64, at: Vec3) -> Entity {
        app.world_mut()
            .spawn((
                Projectile {
                    id,
                    ..Default::default()
                },
                Transform::from_translation(at),
            ))
            .id()
    }

    fn drain_hits(app: &mut App) -> Vec<CubeHit> {
        app.world_mut()
            .resource_mut::<Messages<CubeHit>>()
            .drain()
            .collect()
    }

    #[test]
    fn two_projectiles_on_one_cube_are_both_marked() {
        let mut app = collision_app();
        app.insert_resource(table(&[(1, Vec3::new(0.0, 0.0, -3.0))]));
        let a = spawn_projectile(&mut app, 10, Vec3::new(0.05, 0.0, -3.0));
        let b = spawn_projectile(&mut app, 11, Vec3::new(-0.05, 0.0, -3.0));
        let far = spawn_projectile(&mut app, 12, Vec3::new(5.0, 0.0, -3.0));

        app.update();

        let world = app.world();
        assert!(world.get::<Projectile>(a).unwrap().hit);
        assert!(world.get::<Projectile>(b).unwrap().hit);
        assert!(!world.get::<Projectile>(far).unwrap().hit);
        assert_eq!(world.resource::<HitStats>().hits, 2);

        let mut hits = drain_hits(&mut app);
        hits.sort_by_key(|h| h.projectile);
        assert_eq!(
            hits,
            vec![
                CubeHit {
                    particle: ParticleId(1),
                    projectile: 10
                },
                CubeHit {
                    particle: ParticleId(1),
                    projectile: 11
                },
            ]
        );
    }

    #[test]
    fn already_hit_projectile_is_not_reported_twice() {
        let mut app = collision_app();
        app.insert_resource(table(&[(1, Vec3::ZERO)]));
        spawn_projectile(&mut app, 1, Vec3::ZERO);

        app.update();
        assert_eq!(drain_hits(&mut app).len(), 1);
        app.update();
        assert!(drain_hits(&mut app).is_empty());
    }
}
