//! ArenaWorld: reference `SpatialQuery` provider (headless, без физ. движка).
//!
//! Geometry:
//! - ground spans: горизонтальные отрезки (`LAYER_GROUND`)
//! - obstacles: axis-aligned boxes (`LAYER_OBSTACLE`)
//! - agent circles: зеркало registry через `sync_agents` (`LAYER_ENEMY` / `LAYER_PLAYER`)
//!
//! Используется headless runner'ом и тестами; engine-backed хост подставляет
//! свой provider за тем же trait.

use bevy::prelude::*;

use super::capabilities::{
    AgentCollider, ColliderId, RaycastHit, SpatialQuery, LAYER_GROUND, LAYER_OBSTACLE,
};
use crate::components::AgentId;

/// Horizontal walkable segment `[x_min, x_max]` at height `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSpan {
    pub id: u32,
    pub x_min: f32,
    pub x_max: f32,
    pub y: f32,
}

/// Axis-aligned box blocking line of sight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub id: u32,
    pub min: Vec2,
    pub max: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct ArenaWorld {
    ground: Vec<GroundSpan>,
    obstacles: Vec<Obstacle>,
    /// Sorted by id (детерминированный порядок overlap результатов)
    agents: Vec<AgentCollider>,
    next_static_id: u32,
}

impl ArenaWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat floor at `y` spanning `[-half_width, half_width]`.
    pub fn flat(y: f32, half_width: f32) -> Self {
        let mut world = Self::new();
        world.add_ground(-half_width, half_width, y);
        world
    }

    pub fn add_ground(&mut self, x_min: f32, x_max: f32, y: f32) -> u32 {
        let id = self.next_static_id;
        self.next_static_id += 1;
        self.ground.push(GroundSpan {
            id,
            x_min: x_min.min(x_max),
            x_max: x_min.max(x_max),
            y,
        });
        id
    }

    pub fn add_obstacle(&mut self, min: Vec2, max: Vec2) -> u32 {
        let id = self.next_static_id;
        self.next_static_id += 1;
        self.obstacles.push(Obstacle {
            id,
            min: min.min(max),
            max: min.max(max),
        });
        id
    }

    pub fn ground(&self) -> &[GroundSpan] {
        &self.ground
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn agents(&self) -> &[AgentCollider] {
        &self.agents
    }
}

impl SpatialQuery for ArenaWorld {
    fn overlap_circle(&self, center: Vec2, radius: f32, filter: u32) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|a| a.layer & filter != 0)
            .filter(|a| a.center.distance_squared(center) <= (radius + a.radius).powi(2))
            .map(|a| a.id)
            .collect()
    }

    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32, filter: u32) -> Option<RaycastHit> {
        let dir = direction.try_normalize()?;
        if max_distance <= 0.0 {
            return None;
        }

        let mut best: Option<(f32, ColliderId)> = None;
        let mut consider = |t: f32, collider: ColliderId| {
            if t >= 0.0 && t <= max_distance && best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, collider));
            }
        };

        if filter & LAYER_GROUND != 0 {
            for span in &self.ground {
                if let Some(t) = ray_vs_span(origin, dir, span) {
                    consider(t, ColliderId::Static(span.id));
                }
            }
        }

        if filter & LAYER_OBSTACLE != 0 {
            for obstacle in &self.obstacles {
                if let Some(t) = ray_vs_box(origin, dir, obstacle.min, obstacle.max) {
                    consider(t, ColliderId::Static(obstacle.id));
                }
            }
        }

        for agent in self.agents.iter().filter(|a| a.layer & filter != 0) {
            if let Some(t) = ray_vs_circle(origin, dir, agent.center, agent.radius) {
                consider(t, ColliderId::Agent(agent.id));
            }
        }

        best.map(|(distance, collider)| RaycastHit {
            collider,
            point: origin + dir * distance,
            distance,
        })
    }

    fn sync_agents(&mut self, agents: &[AgentCollider]) {
        self.agents.clear();
        self.agents.extend_from_slice(agents);
        self.agents.sort_by_key(|a| a.id);
    }
}

// ============================================================================
// Ray casts (dir нормализован, возвращают t ≥ 0 или None)
// ============================================================================

fn ray_vs_span(origin: Vec2, dir: Vec2, span: &GroundSpan) -> Option<f32> {
    if dir.y.abs() <= f32::EPSILON {
        return None;
    }
    let t = (span.y - origin.y) / dir.y;
    if t < 0.0 {
        return None;
    }
    let x = origin.x + dir.x * t;
    (x >= span.x_min && x <= span.x_max).then_some(t)
}

/// Slab test; origin inside the box → t = 0.
fn ray_vs_box(origin: Vec2, dir: Vec2, min: Vec2, max: Vec2) -> Option<f32> {
    let mut t_enter = 0.0_f32;
    let mut t_exit = f32::INFINITY;

    for axis in 0..2 {
        let (o, d, lo, hi) = (origin[axis], dir[axis], min[axis], max[axis]);
        if d.abs() <= f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (t1, t2) = ((lo - o) * inv, (hi - o) * inv);
        t_enter = t_enter.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

fn ray_vs_circle(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let to_origin = origin - center;
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = to_origin.dot(dir);
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{LAYER_ENEMY, LAYER_PLAYER, MASK_GROUND, MASK_LINE_OF_SIGHT};

    fn collider(id: u32, x: f32, layer: u32) -> AgentCollider {
        AgentCollider {
            id: AgentId(id),
            center: Vec2::new(x, 0.5),
            radius: 0.3,
            layer,
        }
    }

    #[test]
    fn test_ground_raycast_down() {
        let world = ArenaWorld::flat(0.0, 50.0);

        let hit = world
            .raycast(Vec2::new(3.0, 20.0), Vec2::NEG_Y, 40.0, MASK_GROUND)
            .expect("floor under candidate");
        assert!((hit.point.y - 0.0).abs() < 1e-5);
        assert!((hit.distance - 20.0).abs() < 1e-4);

        // За краем пола: промах
        assert!(world
            .raycast(Vec2::new(60.0, 20.0), Vec2::NEG_Y, 40.0, MASK_GROUND)
            .is_none());
    }

    #[test]
    fn test_obstacle_blocks_line_of_sight() {
        let mut world = ArenaWorld::flat(0.0, 50.0);
        let wall = world.add_obstacle(Vec2::new(0.4, 0.0), Vec2::new(0.6, 2.0));

        let hit = world
            .raycast(Vec2::new(0.0, 0.5), Vec2::X, 1.0, MASK_LINE_OF_SIGHT)
            .expect("wall between");
        assert_eq!(hit.collider, ColliderId::Static(wall));
        assert!((hit.distance - 0.4).abs() < 1e-5);

        // Луч короче расстояния до стены
        assert!(world
            .raycast(Vec2::new(0.0, 0.5), Vec2::X, 0.3, MASK_LINE_OF_SIGHT)
            .is_none());
    }

    #[test]
    fn test_overlap_circle_respects_layers_and_order() {
        let mut world = ArenaWorld::new();
        world.sync_agents(&[
            collider(3, 0.5, LAYER_ENEMY),
            collider(1, 0.0, LAYER_ENEMY),
            collider(2, 0.2, LAYER_PLAYER),
            collider(4, 5.0, LAYER_ENEMY),
        ]);

        let hits = world.overlap_circle(Vec2::new(0.0, 0.5), 1.0, LAYER_ENEMY);
        assert_eq!(hits, vec![AgentId(1), AgentId(3)]);
    }

    #[test]
    fn test_ray_hits_nearest_agent() {
        let mut world = ArenaWorld::new();
        world.sync_agents(&[collider(1, 2.0, LAYER_ENEMY), collider(2, 4.0, LAYER_ENEMY)]);

        let hit = world
            .raycast(Vec2::new(0.0, 0.5), Vec2::X, 10.0, LAYER_ENEMY)
            .expect("agent on ray");
        assert_eq!(hit.collider, ColliderId::Agent(AgentId(1)));
        assert!((hit.distance - 1.7).abs() < 1e-4);
    }
}
