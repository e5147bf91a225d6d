//! Spawn placement under a circular exclusion zone.
//!
//! One uniform draw per entity; a rejected draw is final.  Density just outside
//! the safe zone is therefore slightly lower than elsewhere, and a level may
//! contain fewer entities than were requested.

use bevy::prelude::*;
use rand::Rng;

/// Circle around the player's start that large bodies must stay out of.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnConstraint {
    pub center: Vec2,
    pub exclusion_radius: f32,
}

impl SpawnConstraint {
    pub fn new(center: Vec2, exclusion_radius: f32) -> Self {
        Self {
            center,
            exclusion_radius,
        }
    }

    /// Distance from the centre to the near edge of a body's bounding circle.
    pub fn clearance(&self, position: Vec2, radius: f32) -> f32 {
        self.center.distance(position) - radius
    }

    pub fn accepts(&self, position: Vec2, radius: f32) -> bool {
        self.clearance(position, radius) > self.exclusion_radius
    }
}

/// Accept `candidate` iff its clearance exceeds the exclusion radius.
pub fn evaluate_candidate(
    candidate: Vec2,
    constraint: &SpawnConstraint,
    radius: f32,
) -> Option<Vec2> {
    constraint.accepts(candidate, radius).then_some(candidate)
}

/// Draw one uniform candidate in `[0, world_size)²` and evaluate it.
pub fn place(
    rng: &mut impl Rng,
    world_size: f32,
    constraint: &SpawnConstraint,
    radius: f32,
) -> Option<Vec2> {
    let candidate = Vec2::new(
        rng.gen_range(0.0..world_size),
        rng.gen_range(0.0..world_size),
    );
    evaluate_candidate(candidate, constraint, radius)
}

/// Outcome counts for one batch of spawn attempts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpawnTally {
    pub spawned: usize,
    /// Placement fell inside the exclusion zone.
    pub rejected: usize,
    /// Outline could not be turned into a body.
    pub malformed: usize,
}

impl SpawnTally {
    pub fn attempts(&self) -> usize {
        self.spawned + self.rejected + self.malformed
    }
}
