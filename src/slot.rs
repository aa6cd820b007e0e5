use itertools::iproduct;
use serde::Serialize;

use crate::clock::Timestamp;

pub type SlotId = usize;

/// Height of an empty hole, below the ground plane.
const HOLE_Y: f32 = -0.5;
/// Distance between neighbouring holes along x and z.
const HOLE_SPACING: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One hole of the board
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnSlot {
    pub id: SlotId,
    pub position: Position,
    active: bool,
    active_until: Option<Timestamp>,
}

impl SpawnSlot {
    pub fn new(id: SlotId, position: Position) -> Self {
        Self {
            id,
            position,
            active: false,
            active_until: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn active_until(&self) -> Option<Timestamp> {
        self.active_until
    }

    pub fn has_expired(&self, now: Timestamp) -> bool {
        matches!(self.active_until, Some(until) if self.active && now > until)
    }

    pub(crate) fn activate(&mut self, until: Timestamp) {
        self.active = true;
        self.active_until = Some(until);
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.active_until = None;
    }
}

/// Builds a square board of `size * size` holes centred on the origin.
///
/// Ids run x-major: the x coordinate is the outer loop, z the inner one.
pub fn build_grid(size: usize) -> Vec<SpawnSlot> {
    let offset = size.saturating_sub(1) as f32 / 2.0;
    let coord = move |i: usize| (i as f32 - offset) * HOLE_SPACING;

    iproduct!(0..size, 0..size)
        .enumerate()
        .map(|(id, (xi, zi))| {
            SpawnSlot::new(
                id,
                Position {
                    x: coord(xi),
                    y: HOLE_Y,
                    z: coord(zi),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_by_three_layout() {
        let grid = build_grid(3);
        assert_eq!(grid.len(), 9);

        let ids: Vec<SlotId> = grid.iter().map(|s| s.id).collect();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());

        assert_eq!(
            grid[0].position,
            Position {
                x: -2.0,
                y: -0.5,
                z: -2.0
            }
        );
        assert_eq!(grid[1].position.x, -2.0);
        assert_eq!(grid[1].position.z, 0.0);
        assert_eq!(grid[4].position.x, 0.0);
        assert_eq!(grid[4].position.z, 0.0);
        assert_eq!(grid[8].position.x, 2.0);
        assert_eq!(grid[8].position.z, 2.0);
        assert!(grid.iter().all(|s| s.position.y == -0.5));
        assert!(grid.iter().all(|s| !s.is_active()));
    }

    #[test]
    fn single_hole_sits_at_origin() {
        let grid = build_grid(1);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].position.x, 0.0);
        assert_eq!(grid[0].position.z, 0.0);
    }

    #[test]
    fn activation_lifecycle() {
        let mut slot = SpawnSlot::new(
            0,
            Position {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
        );
        assert!(!slot.has_expired(u64::MAX));

        slot.activate(2_000);
        assert!(slot.is_active());
        assert_eq!(slot.active_until(), Some(2_000));
        assert!(!slot.has_expired(1_999));
        assert!(!slot.has_expired(2_000));
        assert!(slot.has_expired(2_001));

        slot.deactivate();
        assert!(!slot.is_active());
        assert_eq!(slot.active_until(), None);
    }
}
