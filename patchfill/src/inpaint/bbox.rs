#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::image::Pixel;
use super::patch::PatchGrid;

/// Axis-aligned half-open rectangle `[x_min, x_max) x [y_min, y_max)`.
///
/// The engine's box ranges over patch anchors, not pixels: every anchor whose
/// patch may touch a remaining hole lies inside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        x_min: 0,
        x_max: 0,
        y_min: 0,
        y_max: 0,
    };

    pub const fn new(x_min: usize, x_max: usize, y_min: usize, y_max: usize) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    /// Box spanning a whole `width x height` image.
    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, width, 0, height)
    }

    /// A degenerate box is the engine's terminal signal.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x_max <= self.x_min || self.y_max <= self.y_min
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.x_max.saturating_sub(self.x_min)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.y_max.saturating_sub(self.y_min)
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x_min && x < self.x_max && y >= self.y_min && y < self.y_max
    }

    pub fn intersect(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.max(other.x_min),
            x_max: self.x_max.min(other.x_max),
            y_min: self.y_min.max(other.y_min),
            y_max: self.y_max.min(other.y_max),
        }
    }

    /// Pixels covered by patches anchored anywhere in this box.
    pub fn footprint(&self, grid: &PatchGrid) -> BoundingBox {
        if self.is_empty() {
            return BoundingBox::EMPTY;
        }
        BoundingBox {
            x_min: self.x_min,
            x_max: (self.x_max + grid.size - 1).min(grid.width),
            y_min: self.y_min,
            y_max: (self.y_max + grid.size - 1).min(grid.height),
        }
    }
}

/// Compute the anchor box for the hole pixels of `mask` within `prev`'s footprint.
///
/// The tight hole extent is grown by `size - 1` on every side so patches that
/// straddle the hole boundary stay reachable, clamped to the valid anchor
/// range, and intersected with `prev` so the box never regrows. Returns a
/// degenerate box when no hole pixels remain.
pub fn hole_bounding_box(mask: &[Pixel], grid: &PatchGrid, prev: &BoundingBox) -> BoundingBox {
    let area = prev.footprint(grid);

    let mut xmin = usize::MAX;
    let mut ymin = usize::MAX;
    let mut xmax = 0;
    let mut ymax = 0;
    let mut found = false;

    for y in area.y_min..area.y_max {
        let row = &mask[grid.index(0, y)..grid.index(0, y) + grid.width];
        for x in area.x_min..area.x_max {
            if row[x].is_hole() {
                found = true;
                xmin = xmin.min(x);
                xmax = xmax.max(x);
                ymin = ymin.min(y);
                ymax = ymax.max(y);
            }
        }
    }

    if !found {
        return BoundingBox::EMPTY;
    }

    let margin = grid.size - 1;
    let grown = BoundingBox {
        x_min: xmin.saturating_sub(margin),
        x_max: (xmax + 1 + margin).min(grid.anchor_width()),
        y_min: ymin.saturating_sub(margin),
        y_max: (ymax + 1 + margin).min(grid.anchor_height()),
    };
    grown.intersect(prev)
}
