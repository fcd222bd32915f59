//! Geometry shared by the scanner, conditions, and accessors.
//!
//! Coordinates use the host's block grid: `x`/`z` horizontal, `y` vertical.
//! Integer arithmetic saturates at the `i32` bounds so a corrupt position can
//! never panic the tick loop.

use serde::{Deserialize, Serialize};

/// Integer coordinate of a single block cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl BlockPos {
    /// Create a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Return this position shifted by `(dx, dy, dz)`, saturating.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// The block directly below.
    #[must_use]
    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Centre of the cell in continuous coordinates.
    pub fn center(self) -> Position {
        Position {
            x: f64::from(self.x) + 0.5,
            y: f64::from(self.y) + 0.5,
            z: f64::from(self.z) + 0.5,
        }
    }
}

/// Continuous world position of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// East-west axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// North-south axis.
    pub z: f64,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The block cell containing this position (floor on every axis).
    pub fn block_pos(self) -> BlockPos {
        BlockPos {
            x: floor_to_i32(self.x),
            y: floor_to_i32(self.y),
            z: floor_to_i32(self.z),
        }
    }

    /// Distance to `other` ignoring the vertical axis.
    pub fn horizontal_distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }
}

/// Floor a coordinate into the `i32` grid, clamping non-finite and
/// out-of-range values.
#[allow(clippy::cast_possible_truncation)]
fn floor_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    // `as` saturates at the i32 bounds for out-of-range floats.
    value.floor() as i32
}

/// Axis-aligned box of block cells, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Lowest corner (inclusive).
    pub min: BlockPos,
    /// Highest corner (inclusive).
    pub max: BlockPos,
}

/// Extent of a region along each axis, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Cells along x.
    pub x: u32,
    /// Cells along y.
    pub y: u32,
    /// Cells along z.
    pub z: u32,
}

impl Extent {
    /// Create an extent.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

impl Region {
    /// Build a region of the given extent centred on `center`.
    ///
    /// For odd extents the centre cell sits exactly in the middle; for even
    /// extents the extra cell is on the positive side. An extent of 0 on an
    /// axis is treated as 1.
    pub fn centered(center: BlockPos, extent: Extent) -> Self {
        let (min_x, max_x) = axis_bounds(center.x, extent.x);
        let (min_y, max_y) = axis_bounds(center.y, extent.y);
        let (min_z, max_z) = axis_bounds(center.z, extent.z);
        Self {
            min: BlockPos::new(min_x, min_y, min_z),
            max: BlockPos::new(max_x, max_y, max_z),
        }
    }

    /// Whether `pos` lies inside the region.
    pub const fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    /// Iterate every cell, x fastest, then z, then y.
    pub fn cells(&self) -> impl Iterator<Item = BlockPos> + '_ {
        (self.min.y..=self.max.y).flat_map(move |y| {
            (self.min.z..=self.max.z)
                .flat_map(move |z| (self.min.x..=self.max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

/// Inclusive `(min, max)` along one axis for a centred extent.
fn axis_bounds(center: i32, extent: u32) -> (i32, i32) {
    let extent = i32::try_from(extent.max(1)).unwrap_or(i32::MAX);
    let below = extent.saturating_sub(1) / 2;
    let above = extent.saturating_sub(1).saturating_sub(below);
    (center.saturating_sub(below), center.saturating_add(above))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn position_floors_negative_coordinates() {
        let pos = Position::new(-0.5, 64.9, 3.0);
        assert_eq!(pos.block_pos(), BlockPos::new(-1, 64, 3));
    }

    #[test]
    fn nan_position_maps_to_origin_axis() {
        let pos = Position::new(f64::NAN, 1.0, 2.0);
        assert_eq!(pos.block_pos(), BlockPos::new(0, 1, 2));
    }

    #[test]
    fn odd_region_is_symmetric() {
        let region = Region::centered(BlockPos::new(10, 64, -5), Extent::new(11, 9, 11));
        assert_eq!(region.min, BlockPos::new(5, 60, -10));
        assert_eq!(region.max, BlockPos::new(15, 68, 0));
        assert_eq!(region.cells().count(), 11 * 9 * 11);
    }

    #[test]
    fn even_region_extends_positive() {
        let region = Region::centered(BlockPos::new(0, 0, 0), Extent::new(2, 1, 4));
        assert_eq!(region.min, BlockPos::new(0, 0, -1));
        assert_eq!(region.max, BlockPos::new(1, 0, 2));
        assert_eq!(region.cells().count(), 8);
    }

    #[test]
    fn zero_extent_is_single_cell() {
        let region = Region::centered(BlockPos::new(3, 3, 3), Extent::new(0, 0, 0));
        assert_eq!(region.cells().collect::<Vec<_>>(), vec![BlockPos::new(3, 3, 3)]);
    }

    #[test]
    fn region_contains_its_corners() {
        let region = Region::centered(BlockPos::default(), Extent::new(3, 3, 3));
        assert!(region.contains(region.min));
        assert!(region.contains(region.max));
        assert!(!region.contains(BlockPos::new(2, 0, 0)));
    }

    #[test]
    fn offset_saturates() {
        let pos = BlockPos::new(i32::MAX, 0, i32::MIN);
        assert_eq!(pos.offset(1, 0, -1), pos);
    }

    #[test]
    fn horizontal_distance_ignores_height() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 100.0, 4.0);
        assert!((a.horizontal_distance(b) - 5.0).abs() < 1e-9);
    }
}
