// tactical_bots_core/bots/src/world/map_generator.rs
//! Demo arena: two walled bases on the X extremes, three objectives along the
//! diagonal, lane dividers and scattered cover.

use rand::Rng;

use crate::core::types::{Aabb, LevelDescription, Objective, SurfaceTags, Team, TeamSpawn, Vec2, Vec3};
use crate::world::obstacle_index::TaggedBox;

pub const ARENA_HALF_X: f32 = 40.0;
pub const ARENA_HALF_Z: f32 = 25.0;
const WALL_HEIGHT: f32 = 3.0;
const COVER_HEIGHT: f32 = 1.3;

pub struct GeneratedLevel {
    pub level: LevelDescription,
    pub boxes: Vec<TaggedBox>,
}

impl GeneratedLevel {
    pub fn solids(&self) -> Vec<Aabb> {
        self.boxes.iter().filter(|b| b.blocks_movement()).map(|b| b.bounds).collect()
    }
}

pub struct MapGenerator;

impl MapGenerator {
    pub fn generate_arena(rng: &mut impl Rng) -> GeneratedLevel {
        let objectives = Self::objectives();
        let spawns = Self::team_spawns();

        let mut boxes = Vec::new();
        boxes.extend(Self::create_border_walls());
        boxes.extend(Self::create_team_bases());
        boxes.extend(Self::create_central_pillars());
        boxes.extend(Self::create_lane_dividers());
        boxes.extend(Self::create_cover(rng, &objectives, &spawns));
        boxes.extend(Self::create_decorations());

        GeneratedLevel {
            level: LevelDescription {
                objectives,
                spawns,
                bounds_min: Vec2::new(-ARENA_HALF_X, -ARENA_HALF_Z),
                bounds_max: Vec2::new(ARENA_HALF_X, ARENA_HALF_Z),
            },
            boxes,
        }
    }

    fn wall(min_x: f32, min_z: f32, max_x: f32, max_z: f32, height: f32) -> TaggedBox {
        TaggedBox::solid(Aabb::new(Vec3::new(min_x, 0.0, min_z), Vec3::new(max_x, height, max_z)))
    }

    fn create_border_walls() -> Vec<TaggedBox> {
        let (x, z, t) = (ARENA_HALF_X, ARENA_HALF_Z, 1.0);
        vec![
            Self::wall(-x, -z, x, -z + t, WALL_HEIGHT),
            Self::wall(-x, z - t, x, z, WALL_HEIGHT),
            Self::wall(-x, -z, -x + t, z, WALL_HEIGHT),
            Self::wall(x - t, -z, x, z, WALL_HEIGHT),
        ]
    }

    fn create_team_bases() -> Vec<TaggedBox> {
        let mut walls = Vec::new();
        for sign in [-1.0_f32, 1.0] {
            let front = sign * (ARENA_HALF_X - 9.0);
            // Front wall with a 6 m doorway in the middle.
            walls.push(Self::wall(front - 0.5, -10.0, front + 0.5, -3.0, WALL_HEIGHT));
            walls.push(Self::wall(front - 0.5, 3.0, front + 0.5, 10.0, WALL_HEIGHT));
            let (lo, hi) = if sign < 0.0 { (-ARENA_HALF_X + 1.0, front) } else { (front, ARENA_HALF_X - 1.0) };
            walls.push(Self::wall(lo, -10.5, hi, -10.0, WALL_HEIGHT));
            walls.push(Self::wall(lo, 10.0, hi, 10.5, WALL_HEIGHT));
        }
        walls
    }

    fn create_central_pillars() -> Vec<TaggedBox> {
        [(-4.0, -4.0), (4.0, -4.0), (-4.0, 4.0), (4.0, 4.0)]
            .into_iter()
            .map(|(x, z)| Self::wall(x - 0.75, z - 0.75, x + 0.75, z + 0.75, WALL_HEIGHT))
            .collect()
    }

    fn create_lane_dividers() -> Vec<TaggedBox> {
        vec![
            Self::wall(-22.0, -17.0, -12.0, -16.5, WALL_HEIGHT),
            Self::wall(12.0, 16.5, 22.0, 17.0, WALL_HEIGHT),
            Self::wall(-9.0, 15.0, -8.5, 24.0, WALL_HEIGHT),
            Self::wall(8.5, -24.0, 9.0, -15.0, WALL_HEIGHT),
        ]
    }

    fn create_cover(rng: &mut impl Rng, objectives: &[Objective], spawns: &[TeamSpawn]) -> Vec<TaggedBox> {
        let mut cover = Vec::new();
        let mut attempts = 0;
        while cover.len() < 10 && attempts < 60 {
            attempts += 1;
            let x = rng.gen_range(-26.0..26.0);
            let z = rng.gen_range(-20.0..20.0);
            let centre = Vec3::new(x, 0.0, z);
            let near_objective = objectives.iter().any(|o| o.center.distance(centre) < o.radius + 2.0);
            let near_spawn = spawns.iter().any(|s| s.position.distance(centre) < 4.0);
            if near_objective || near_spawn {
                continue;
            }
            let w = rng.gen_range(1.0..2.5);
            let d = rng.gen_range(0.6..1.2);
            cover.push(Self::wall(x - w * 0.5, z - d * 0.5, x + w * 0.5, z + d * 0.5, COVER_HEIGHT));
        }
        cover
    }

    /// Scorch decals on the floor and an overhead beam; neither blocks walking.
    fn create_decorations() -> Vec<TaggedBox> {
        let decal = SurfaceTags { decal: true, ..SurfaceTags::SOLID };
        vec![
            TaggedBox { bounds: Aabb::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, 0.02, 2.0)), tags: decal },
            TaggedBox { bounds: Aabb::new(Vec3::new(-30.0, 0.0, 0.0), Vec3::new(-28.0, 0.02, 1.5)), tags: decal },
            TaggedBox::solid(Aabb::new(Vec3::new(-12.0, 3.2, -0.25), Vec3::new(12.0, 3.6, 0.25))),
        ]
    }

    pub fn objectives() -> Vec<Objective> {
        vec![
            Objective { id: 1, center: Vec3::new(-16.0, 0.0, -12.0), radius: 4.0 },
            Objective { id: 2, center: Vec3::new(0.0, 0.0, 0.0), radius: 3.0 },
            Objective { id: 3, center: Vec3::new(16.0, 0.0, 12.0), radius: 4.0 },
        ]
    }

    pub fn team_spawns() -> Vec<TeamSpawn> {
        let mut spawns = Vec::new();
        for (team, x) in [(Team::Red, -ARENA_HALF_X + 4.5), (Team::Blue, ARENA_HALF_X - 4.5)] {
            for z in [-6.0, -3.0, 0.0, 3.0, 6.0] {
                spawns.push(TeamSpawn { team, position: Vec3::new(x, 0.0, z) });
            }
        }
        spawns
    }
}
