//! Agents, hazards and projectiles, plus their per-tick motion rules.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AGENT_HEIGHT, AGENT_LANE_Y, AGENT_VELOCITY, AGENT_WIDTH, ARENA_WIDTH, FIRE_COOLDOWN_TICKS,
    HAZARD_VELOCITY, PROJECTILE_CAP, PROJECTILE_HEIGHT, PROJECTILE_VELOCITY, PROJECTILE_WIDTH,
};
use crate::geometry::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HazardId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

impl fmt::Display for HazardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hazard#{}", self.0)
    }
}

/// Where a hazard stops being part of the arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExitThreshold {
    /// Exits once `y` is past a fixed line.
    Fixed(f64),
    /// Exits once `y` is past the agent lane by the hazard's own size.
    LanePlusSize,
}

impl ExitThreshold {
    #[inline]
    pub fn limit_for(self, size: f64) -> f64 {
        match self {
            Self::Fixed(limit) => limit,
            Self::LanePlusSize => AGENT_LANE_Y + size,
        }
    }
}

/// A falling square on a fixed straight-line trajectory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hazard {
    pub id: HazardId,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub angle: f64,
}

impl Hazard {
    /// Aims once at `target_x`, measured over the fall distance plus the
    /// hazard's own size. The angle never changes afterwards.
    pub fn aimed(id: HazardId, spawn_x: f64, size: f64, target_x: f64, vertical_span: f64) -> Self {
        let angle = ((target_x - spawn_x) / (vertical_span + size)).atan();
        Self {
            id,
            x: spawn_x,
            y: -size,
            size,
            angle,
        }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.size, self.size)
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        self.rect().center()
    }

    #[inline]
    pub fn has_exited(&self, threshold: ExitThreshold) -> bool {
        self.y > threshold.limit_for(self.size)
    }

    #[inline]
    pub fn advance(&mut self) {
        self.x += HAZARD_VELOCITY * self.angle.sin();
        self.y += HAZARD_VELOCITY * self.angle.cos();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub x: f64,
    pub y: f64,
}

impl Projectile {
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, PROJECTILE_WIDTH, PROJECTILE_HEIGHT)
    }

    #[inline]
    pub fn advance(&mut self) {
        self.y -= PROJECTILE_VELOCITY;
    }

    /// Fully above the top edge of the arena.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.y < -PROJECTILE_HEIGHT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
    Hold,
}

/// Horizontally mobile shooter sitting on the agent lane.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub x: f64,
    pub y: f64,
    pub projectiles: Vec<Projectile>,
    /// Ticks elapsed since the last successful shot.
    pub cooldown_ticks: u32,
    pub score: u32,
    /// Hazards currently relevant to this agent, oldest first.
    pub visible: Vec<HazardId>,
    next_projectile_id: u32,
}

impl Agent {
    pub fn new(id: AgentId, x: f64) -> Self {
        Self {
            id,
            x,
            y: AGENT_LANE_Y,
            projectiles: Vec::with_capacity(PROJECTILE_CAP + 1),
            cooldown_ticks: 0,
            score: 0,
            visible: Vec::new(),
            next_projectile_id: 0,
        }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, AGENT_WIDTH, AGENT_HEIGHT)
    }

    pub fn steer(&mut self, steer: Steer) {
        match steer {
            Steer::Right => self.move_right(),
            Steer::Left => self.move_left(),
            Steer::Hold => {}
        }
    }

    pub fn move_right(&mut self) {
        self.x = (self.x + AGENT_VELOCITY).min(ARENA_WIDTH - AGENT_WIDTH);
    }

    pub fn move_left(&mut self) {
        self.x = (self.x - AGENT_VELOCITY).max(0.0);
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown_ticks >= FIRE_COOLDOWN_TICKS && self.projectiles.len() <= PROJECTILE_CAP
    }

    /// Spawns a projectile at the agent's centre column, just above its top
    /// edge, when the cooldown and cap allow it.
    pub fn try_fire(&mut self) -> Option<ProjectileId> {
        if !self.can_fire() {
            return None;
        }

        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile {
            id,
            x: self.x + (AGENT_WIDTH / 2.0).floor(),
            y: self.y - PROJECTILE_HEIGHT,
        });
        self.cooldown_ticks = 0;
        Some(id)
    }

    #[inline]
    pub fn tick_cooldown(&mut self) {
        self.cooldown_ticks = self.cooldown_ticks.saturating_add(1);
    }

    pub fn forget_hazard(&mut self, hazard: HazardId) -> bool {
        match self.visible.iter().position(|entry| *entry == hazard) {
            Some(index) => {
                self.visible.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn drop_projectile(&mut self, projectile: ProjectileId) -> bool {
        match self.projectiles.iter().position(|entry| entry.id == projectile) {
            Some(index) => {
                self.projectiles.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLAY_VERTICAL_SPAN;

    #[test]
    fn straight_down_hazard_only_moves_in_y() {
        let mut hazard = Hazard::aimed(HazardId(0), 100.0, 60.0, 100.0, PLAY_VERTICAL_SPAN);
        assert_eq!(hazard.angle, 0.0);
        assert_eq!(hazard.y, -60.0);

        for step in 1..=10 {
            hazard.advance();
            assert_eq!(hazard.x, 100.0);
            assert_eq!(hazard.y, -60.0 + 5.0 * step as f64);
        }
    }

    #[test]
    fn angled_hazard_keeps_constant_speed() {
        let mut hazard = Hazard::aimed(HazardId(1), 0.0, 50.0, 300.0, PLAY_VERTICAL_SPAN);
        let expected = (300.0f64 / 500.0).atan();
        assert!((hazard.angle - expected).abs() < 1e-12);

        let (x0, y0) = (hazard.x, hazard.y);
        hazard.advance();
        let travelled = ((hazard.x - x0).powi(2) + (hazard.y - y0).powi(2)).sqrt();
        assert!((travelled - HAZARD_VELOCITY).abs() < 1e-9);
        assert!(hazard.x > x0);
    }

    #[test]
    fn exit_thresholds() {
        let mut hazard = Hazard::aimed(HazardId(2), 10.0, 70.0, 10.0, PLAY_VERTICAL_SPAN);
        hazard.y = 600.0;
        assert!(!hazard.has_exited(ExitThreshold::Fixed(600.0)));
        assert!(hazard.has_exited(ExitThreshold::LanePlusSize));
        hazard.y = 520.0;
        assert!(!hazard.has_exited(ExitThreshold::LanePlusSize));
        hazard.y = 520.5;
        assert!(hazard.has_exited(ExitThreshold::LanePlusSize));
    }

    #[test]
    fn agent_movement_is_clamped_to_arena() {
        let mut agent = Agent::new(AgentId(0), 2.0);
        agent.move_left();
        assert_eq!(agent.x, 0.0);
        agent.move_left();
        assert_eq!(agent.x, 0.0);

        agent.x = ARENA_WIDTH - AGENT_WIDTH - 1.0;
        agent.move_right();
        assert_eq!(agent.x, ARENA_WIDTH - AGENT_WIDTH);
        assert!(agent.rect().right() <= ARENA_WIDTH);
    }

    #[test]
    fn firing_respects_cooldown_and_cap() {
        let mut agent = Agent::new(AgentId(0), 100.0);
        assert!(agent.try_fire().is_none());

        agent.cooldown_ticks = FIRE_COOLDOWN_TICKS;
        let id = agent.try_fire().expect("cooldown elapsed");
        assert_eq!(agent.cooldown_ticks, 0);
        let projectile = agent.projectiles[0];
        assert_eq!(projectile.id, id);
        assert_eq!(projectile.x, 134.0);
        assert_eq!(projectile.y, AGENT_LANE_Y - PROJECTILE_HEIGHT);

        for _ in 0..3 {
            agent.cooldown_ticks = FIRE_COOLDOWN_TICKS;
            assert!(agent.try_fire().is_some());
        }
        assert_eq!(agent.projectiles.len(), PROJECTILE_CAP + 1);
        agent.cooldown_ticks = FIRE_COOLDOWN_TICKS;
        assert!(agent.try_fire().is_none());
    }

    #[test]
    fn forgetting_unknown_entities_is_a_noop() {
        let mut agent = Agent::new(AgentId(3), 50.0);
        agent.visible.push(HazardId(4));
        assert!(!agent.forget_hazard(HazardId(9)));
        assert!(agent.forget_hazard(HazardId(4)));
        assert!(!agent.forget_hazard(HazardId(4)));
        assert!(!agent.drop_projectile(ProjectileId(0)));
    }
}
