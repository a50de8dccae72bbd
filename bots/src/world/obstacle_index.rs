// tactical_bots_core/bots/src/world/obstacle_index.rs
use rstar::{RTree, RTreeObject, AABB};
use tracing::{debug, trace};

use crate::core::constants::AGENT_FOOT_CLEARANCE;
use crate::core::services::WorldQuery;
use crate::core::types::{Aabb, RayHit, SurfaceTags, Vec2, Vec3};

const PUSH_OUT_PASSES: usize = 3;

/// Static level box with the surface tags a raycast reports.
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedBox {
    pub bounds: Aabb,
    pub tags: SurfaceTags,
}

impl TaggedBox {
    pub fn solid(bounds: Aabb) -> Self {
        TaggedBox { bounds, tags: SurfaceTags::SOLID }
    }

    /// Decals are the only surfaces agents walk through.
    pub fn blocks_movement(&self) -> bool {
        !self.tags.decal
    }
}

#[derive(Clone, Debug)]
struct SpatialBox {
    item: TaggedBox,
}

impl RTreeObject for SpatialBox {
    type Envelope = AABB<[f32; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.item.bounds.min.to_array(), self.item.bounds.max.to_array())
    }
}

/// R-tree backed `WorldQuery` over axis-aligned level geometry.
pub struct StaticWorld {
    rtree: RTree<SpatialBox>,
}

impl StaticWorld {
    pub fn new(boxes: Vec<TaggedBox>) -> Self {
        let mut world = StaticWorld { rtree: RTree::new() };
        world.rebuild(boxes);
        world
    }

    pub fn from_solids(solids: &[Aabb]) -> Self {
        StaticWorld::new(solids.iter().copied().map(TaggedBox::solid).collect())
    }

    pub fn rebuild(&mut self, boxes: Vec<TaggedBox>) {
        self.rtree = RTree::bulk_load(boxes.into_iter().map(|item| SpatialBox { item }).collect());
        debug!("Static world index rebuilt with {} boxes", self.rtree.size());
    }

    pub fn insert(&mut self, item: TaggedBox) {
        self.rtree.insert(SpatialBox { item });
    }

    pub fn size(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }

    pub fn query_aabb(&self, min: Vec3, max: Vec3) -> impl Iterator<Item = &TaggedBox> {
        let envelope = AABB::from_corners(min.to_array(), max.to_array());
        self.rtree.locate_in_envelope_intersecting(&envelope).map(|s| &s.item)
    }

    fn push_out(&self, position: Vec3, radius: f32, half_height: f32) -> Vec3 {
        let low = position.y + AGENT_FOOT_CLEARANCE;
        let high = position.y + half_height * 2.0;
        let reach = Vec3::new(radius, 0.0, radius);
        let centre = Vec2::new(position.x, position.z);
        let mut correction = Vec3::ZERO;
        for candidate in self.query_aabb(
            Vec3::new(position.x, low, position.z) - reach,
            Vec3::new(position.x, high, position.z) + reach,
        ) {
            if !candidate.blocks_movement() || !candidate.bounds.overlaps_vertical(low, high) {
                continue;
            }
            let b = &candidate.bounds;
            let closest = Vec2::new(centre.x.clamp(b.min.x, b.max.x), centre.y.clamp(b.min.z, b.max.z));
            let offset = centre - closest;
            let distance = offset.length();
            let push = if distance > f32::EPSILON {
                if distance >= radius {
                    continue;
                }
                offset / distance * (radius - distance)
            } else {
                // Centre inside the footprint: leave through the nearest face.
                let exits = [
                    (centre.x - b.min.x + radius, Vec2::NEG_X),
                    (b.max.x - centre.x + radius, Vec2::X),
                    (centre.y - b.min.z + radius, Vec2::NEG_Y),
                    (b.max.z - centre.y + radius, Vec2::Y),
                ];
                let (depth, dir) = exits
                    .into_iter()
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .unwrap_or((0.0, Vec2::ZERO));
                dir * depth
            };
            correction += Vec3::new(push.x, 0.0, push.y);
        }
        correction
    }
}

impl WorldQuery for StaticWorld {
    fn obstacles(&self) -> Vec<Aabb> {
        self.rtree.iter().filter(|s| s.item.blocks_movement()).map(|s| s.item.bounds).collect()
    }

    fn resolve_capsule_collision(&self, position: Vec3, radius: f32, half_height: f32) -> Vec3 {
        let mut total = Vec3::ZERO;
        for _ in 0..PUSH_OUT_PASSES {
            let step = self.push_out(position + total, radius, half_height);
            if step.length_squared() < 1e-8 {
                break;
            }
            total += step;
        }
        if total != Vec3::ZERO {
            trace!("Capsule at {:?} pushed out by {:?}", position, total);
        }
        total
    }

    fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RayHit> {
        let end = origin + dir * max_distance;
        self.query_aabb(origin.min(end), origin.max(end))
            .filter_map(|candidate| {
                candidate.bounds.ray_distance(origin, dir, max_distance).map(|distance| RayHit {
                    point: origin + dir * distance,
                    distance,
                    tags: candidate.tags,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
