#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::bbox::BoundingBox;
use super::distance::{patch_distance, Score};
use super::image::Pixel;
use super::nnf::NearestNeighborField;
use super::patch::{Anchor, PatchGrid};

/// Per-pixel weighted color sums: `[r * w, g * w, b * w, w]`.
#[derive(Debug, Clone)]
pub struct Accumulator {
    cells: Vec<[f64; 4]>,
}

impl Accumulator {
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![[0.0; 4]; len],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill([0.0; 4]);
    }

    #[inline]
    pub fn deposit(&mut self, i: usize, px: Pixel, weight: f64) {
        let cell = &mut self.cells[i];
        cell[0] += px.r as f64 * weight;
        cell[1] += px.g as f64 * weight;
        cell[2] += px.b as f64 * weight;
        cell[3] += weight;
    }

    /// Weighted mean color of cell `i`. A cell with no weight resolves to black.
    #[inline]
    pub fn resolve(&self, i: usize) -> Pixel {
        let [r, g, b, w] = self.cells[i];
        let w = if w != 0.0 { w } else { 1.0 };
        let channel = |v: f64| (v / w).round().clamp(0.0, 255.0) as u8;
        Pixel::new(channel(r), channel(g), channel(b))
    }
}

/// Result of one blend pass.
#[derive(Debug, Clone)]
pub struct Blended {
    pub image: Vec<Pixel>,
    pub mask: Vec<Pixel>,
    /// Hole pixels cleared in the new mask.
    pub filled: usize,
}

/// Feathering weight for offset (dx, dy) inside a patch.
#[inline]
fn center_weight(dx: usize, dy: usize, half: usize) -> f64 {
    let ox = dx.abs_diff(half);
    let oy = dy.abs_diff(half);
    1.0 / (1.0 + (ox * ox + oy * oy) as f64)
}

/// Deposit every usable match in `bbox` into `accum`, composite the blended
/// colors into the hole pixels, and rescore the field against the result.
///
/// Source pixels whose own stored score is `Invalid` do not contribute.
/// Known pixels are never overwritten. Every pixel that received a
/// contribution is cleared in the returned mask.
pub fn blend(
    nnf: &mut NearestNeighborField,
    accum: &mut Accumulator,
    image: &[Pixel],
    mask: &[Pixel],
    grid: &PatchGrid,
    bbox: &BoundingBox,
) -> Blended {
    accum.clear();
    let mut new_mask = mask.to_vec();
    let mut filled = 0;
    let half = grid.size / 2;

    for ay in bbox.y_min..bbox.y_max {
        for ax in bbox.x_min..bbox.x_max {
            let target = Anchor::new(ax, ay);
            if grid.corners_are_holes(mask, target) {
                continue;
            }
            let source = nnf.source(grid.anchor_index(target));
            for dy in 0..grid.size {
                for dx in 0..grid.size {
                    let si = grid.index(source.x + dx, source.y + dy);
                    if nnf.score(si) == Score::Invalid {
                        continue;
                    }
                    let ti = grid.index(ax + dx, ay + dy);
                    accum.deposit(ti, image[si], center_weight(dx, dy, half));
                    if new_mask[ti].is_hole() {
                        new_mask[ti] = Pixel::BLACK;
                        filled += 1;
                    }
                }
            }
        }
    }

    let mut new_image = image.to_vec();
    let area = bbox.footprint(grid);
    let composite_row = |y: usize, row: &mut [Pixel]| {
        for x in area.x_min..area.x_max {
            let i = grid.index(x, y);
            if mask[i].is_hole() {
                row[x] = accum.resolve(i);
            }
        }
    };

    #[cfg(feature = "parallel")]
    new_image
        .par_chunks_mut(grid.width)
        .enumerate()
        .skip(area.y_min)
        .take(area.height())
        .for_each(|(y, row)| composite_row(y, row));

    #[cfg(not(feature = "parallel"))]
    new_image
        .chunks_mut(grid.width)
        .enumerate()
        .skip(area.y_min)
        .take(area.height())
        .for_each(|(y, row)| composite_row(y, row));

    rescore(nnf, &new_image, &new_mask, grid, bbox);

    Blended {
        image: new_image,
        mask: new_mask,
        filled,
    }
}

/// Recompute every in-box score against `image` and `mask`.
fn rescore(
    nnf: &mut NearestNeighborField,
    image: &[Pixel],
    mask: &[Pixel],
    grid: &PatchGrid,
    bbox: &BoundingBox,
) {
    let (sources, scores) = nnf.parts_mut();
    let rescore_row = |ay: usize, row: &mut [Score]| {
        for ax in bbox.x_min..bbox.x_max {
            let target = Anchor::new(ax, ay);
            let source = sources[grid.anchor_index(target)];
            row[ax] = patch_distance(image, image, mask, grid, target, source, Score::Invalid);
        }
    };

    #[cfg(feature = "parallel")]
    scores
        .par_chunks_mut(grid.width)
        .enumerate()
        .skip(bbox.y_min)
        .take(bbox.height())
        .for_each(|(y, row)| rescore_row(y, row));

    #[cfg(not(feature = "parallel"))]
    scores
        .chunks_mut(grid.width)
        .enumerate()
        .skip(bbox.y_min)
        .take(bbox.height())
        .for_each(|(y, row)| rescore_row(y, row));
}
