// tactical_bots_core/bots/src/core/types.rs
use serde::{Deserialize, Serialize};

pub use glam::{Vec2, Vec3};

/// Index of a bot inside the controller's agent array. Stable for the
/// lifetime of a match; dead bots keep their slot.
pub type AgentId = usize;

// --- Teams ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Red, Team::Blue];

    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }
}

// --- Weapons ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    Rifle,
    Smg,
    Pistol,
    Marksman,
}

impl Default for WeaponKind {
    fn default() -> Self {
        WeaponKind::Rifle
    }
}

impl WeaponKind {
    pub const LOADOUT: [WeaponKind; 4] = [
        WeaponKind::Rifle,
        WeaponKind::Smg,
        WeaponKind::Rifle,
        WeaponKind::Marksman,
    ];

    /// Minimum seconds between two shots of the same burst.
    pub fn cadence_seconds(self) -> f32 {
        match self {
            WeaponKind::Rifle => 0.11,
            WeaponKind::Smg => 0.075,
            WeaponKind::Pistol => 0.3,
            WeaponKind::Marksman => 0.55,
        }
    }

    pub fn damage(self) -> f32 {
        match self {
            WeaponKind::Rifle => 24.0,
            WeaponKind::Smg => 17.0,
            WeaponKind::Pistol => 20.0,
            WeaponKind::Marksman => 55.0,
        }
    }

    /// Multiplier applied to the profile's engagement range.
    pub fn range_factor(self) -> f32 {
        match self {
            WeaponKind::Rifle => 1.0,
            WeaponKind::Smg => 0.7,
            WeaponKind::Pistol => 0.6,
            WeaponKind::Marksman => 1.4,
        }
    }
}

// --- Geometry ---
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Aabb::new(center - half_extents, center + half_extents)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Grows the footprint by `radius` on X and Z; the vertical extent is untouched.
    pub fn inflated_xz(&self, radius: f32) -> Aabb {
        let pad = Vec3::new(radius, 0.0, radius);
        Aabb { min: self.min - pad, max: self.max + pad }
    }

    pub fn overlaps_vertical(&self, low: f32, high: f32) -> bool {
        self.max.y > low && self.min.y < high
    }

    /// Strict overlap against an XZ rectangle; touching edges do not count.
    pub fn overlaps_rect_xz(&self, min: Vec2, max: Vec2) -> bool {
        self.min.x < max.x && self.max.x > min.x && self.min.z < max.y && self.max.z > min.y
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Slab test. Returns the entry distance along `dir` (unit length) when the
    /// ray hits within `max_distance`; a ray starting inside reports `0.0`.
    pub fn ray_distance(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let lo = self.min[axis];
            let hi = self.max[axis];
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

// --- Level description ---
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: u32,
    pub center: Vec3,
    pub radius: f32,
}

impl Objective {
    pub fn contains(&self, point: Vec3) -> bool {
        horizontal_distance(self.center, point) <= self.radius
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamSpawn {
    pub team: Team,
    pub position: Vec3,
}

/// Static level data supplied by the host before `init()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDescription {
    pub objectives: Vec<Objective>,
    pub spawns: Vec<TeamSpawn>,
    /// XZ footprint of the playable area.
    pub bounds_min: Vec2,
    pub bounds_max: Vec2,
}

impl LevelDescription {
    pub fn spawns_for(&self, team: Team) -> impl Iterator<Item = &TeamSpawn> {
        self.spawns.iter().filter(move |s| s.team == team)
    }
}

// --- Combat ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatTarget {
    Agent(AgentId),
    Player,
}

/// Damage metadata forwarded to the damage service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInfo {
    pub source: AgentId,
    pub source_team: Team,
    pub weapon: WeaponKind,
    pub amount: f32,
    pub headshot: bool,
}

// --- Raycasts ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceTags {
    pub decal: bool,
    pub agent_body: bool,
    pub non_blocking: bool,
}

impl SurfaceTags {
    pub const SOLID: SurfaceTags = SurfaceTags { decal: false, agent_body: false, non_blocking: false };

    pub fn blocks_sight(&self) -> bool {
        !(self.decal || self.agent_body || self.non_blocking)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    pub tags: SurfaceTags,
}

// --- Status effects and tactical items ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEffectKind {
    /// Perception disabled for the duration.
    Blind,
    /// Smoke volume that blocks line of sight for everyone.
    Obscure,
    /// No movement and no firing.
    Stun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TacticalItemKind {
    Frag,
    Flash,
    Smoke,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinimapMarker {
    pub agent: AgentId,
    pub position: Vec3,
    pub team: Team,
}

// --- Helpers ---
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(b - a).length()
}

/// Unit facing vector for a yaw measured from +X toward +Z.
pub fn yaw_to_forward(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, yaw.sin())
}

pub fn forward_to_yaw(dir: Vec3) -> f32 {
    dir.z.atan2(dir.x)
}

/// Signed shortest angle from `from` to `to`, in `[-PI, PI]`.
pub fn angle_delta(from: f32, to: f32) -> f32 {
    let tau = std::f32::consts::TAU;
    let mut d = (to - from) % tau;
    if d > std::f32::consts::PI {
        d -= tau;
    } else if d < -std::f32::consts::PI {
        d += tau;
    }
    d
}

/// Left-hand perpendicular on the ground plane.
pub fn lateral(dir: Vec3) -> Vec3 {
    Vec3::new(-dir.z, 0.0, dir.x)
}
