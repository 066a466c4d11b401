//! Patch grid layout.
//!
//! The farm has 20 patches in three columns. Two 2-wide blocks of eight sit
//! on the west side, stacked 15 tiles apart, and a single column of four sits
//! 10 tiles east of the corner. Tiles are produced in working order:
//!
//! ```text
//! block 1 (anchor = corner)          block 2 (anchor = corner - (0, 15))
//!   0  1                               8  9
//!   2  3                              10 11
//!   4  5                              12 13
//!   6  7                              14 15
//! last column (corner + (10, -9)), walked upwards: 16 17 18 19
//! ```

use tracing::warn;

use crate::core::types::Tile;

/// Hard cap on the working set.
pub const MAX_PATCHES: usize = 20;

pub const DEFAULT_PATCHES: usize = 16;

const BLOCK_SPACING: i32 = 15;
const COLUMN_GAP: i32 = 5;
const ROW_GAP: i32 = 3;
const ROWS_PER_BLOCK: i32 = 4;
const LAST_COLUMN_DX: i32 = 10;
const LAST_COLUMN_DY: i32 = -9;

/// Clamp a configured working-set size into `1..=MAX_PATCHES`.
pub fn clamp_patch_count(requested: usize) -> usize {
    let clamped = requested.clamp(1, MAX_PATCHES);
    if clamped != requested {
        warn!(requested, clamped, "patch count out of range, clamping");
    }
    clamped
}

/// Corner anchor of the grid: smallest x and largest y among the patch tiles.
pub fn corner_tile<I: IntoIterator<Item = Tile>>(tiles: I) -> Option<Tile> {
    let mut iter = tiles.into_iter();
    let first = iter.next()?;
    let (min_x, max_y) = iter.fold((first.x, first.y), |(min_x, max_y), tile| {
        (min_x.min(tile.x), max_y.max(tile.y))
    });
    Some(Tile::new(min_x, max_y, 0))
}

/// The first `count` patch tiles for the grid anchored at `corner`.
///
/// `count` is clamped to the working-set range, so the result always has
/// between 1 and [`MAX_PATCHES`] unique tiles.
pub fn patch_tiles(corner: Tile, count: usize) -> Vec<Tile> {
    let count = clamp_patch_count(count);
    let anchors = [corner, Tile::new(corner.x, corner.y - BLOCK_SPACING, 0)];

    let mut tiles = Vec::with_capacity(MAX_PATCHES);
    for anchor in anchors {
        for row in 0..ROWS_PER_BLOCK {
            let y = anchor.y - row * ROW_GAP;
            tiles.push(Tile::new(anchor.x, y, anchor.plane));
            tiles.push(Tile::new(anchor.x + COLUMN_GAP, y, anchor.plane));
        }
    }

    let last = corner.derive(LAST_COLUMN_DX, LAST_COLUMN_DY);
    for row in 0..ROWS_PER_BLOCK {
        tiles.push(Tile::new(last.x, last.y + row * ROW_GAP, last.plane));
    }

    tiles.truncate(count);
    tiles
}
