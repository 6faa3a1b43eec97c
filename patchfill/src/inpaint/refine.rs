use rand::Rng;

use super::bbox::BoundingBox;
use super::distance::{patch_distance, Score};
use super::image::Pixel;
use super::nnf::NearestNeighborField;
use super::patch::{Anchor, PatchGrid};

/// Best match found so far for one target anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Best {
    source: Anchor,
    score: Score,
}

/// Read-only view of the state a refinement pass searches over.
struct Search<'a> {
    image: &'a [Pixel],
    mask: &'a [Pixel],
    grid: &'a PatchGrid,
    bbox: &'a BoundingBox,
}

impl Search<'_> {
    /// Score `candidate` for `target` and adopt it if strictly better.
    ///
    /// Candidates inside the box are never adopted; the target is always one
    /// of them. A perfect score is also rejected when the target's anchor
    /// pixel is a hole.
    fn improve(&self, target: Anchor, best: &mut Best, candidate: Anchor) {
        if self.bbox.contains(candidate.x, candidate.y) {
            return;
        }
        let score = patch_distance(
            self.image, self.image, self.mask, self.grid, target, candidate, best.score,
        );
        if score >= best.score {
            return;
        }
        if score == Score::ZERO && self.mask[self.grid.anchor_index(target)].is_hole() {
            return;
        }
        *best = Best { source: candidate, score };
    }
}

/// Run one propagation + random-search pass over `bbox`.
///
/// Scans top-to-bottom, left-to-right, or the exact reverse when `reverse`
/// is set. Each anchor's entry is written back before the scan moves on, so
/// later anchors propagate from fresh values.
pub fn refine<R: Rng>(
    nnf: &mut NearestNeighborField,
    image: &[Pixel],
    mask: &[Pixel],
    grid: &PatchGrid,
    bbox: &BoundingBox,
    reverse: bool,
    rng: &mut R,
) {
    let search = Search { image, mask, grid, bbox };
    let aw = grid.anchor_width() as isize;
    let ah = grid.anchor_height() as isize;
    let step: isize = if reverse { -1 } else { 1 };
    let search_radius = grid.width.max(grid.height);

    for row in 0..bbox.height() {
        let ay = if reverse { bbox.y_max - 1 - row } else { bbox.y_min + row };
        for col in 0..bbox.width() {
            let ax = if reverse { bbox.x_max - 1 - col } else { bbox.x_min + col };
            let target = Anchor::new(ax, ay);
            if grid.corners_are_holes(mask, target) {
                continue;
            }

            let i = grid.anchor_index(target);
            let mut best = Best {
                source: nnf.source(i),
                score: nnf.score(i),
            };

            // Propagation from the previous anchor along the row.
            let nx = ax as isize - step;
            if nx >= 0 && bbox.contains(nx as usize, ay) {
                let n = nnf.source(grid.index(nx as usize, ay));
                let cx = n.x as isize + step;
                if cx >= 0 && cx < aw {
                    search.improve(target, &mut best, Anchor::new(cx as usize, n.y));
                }
            }

            // Propagation from the previous row.
            let ny = ay as isize - step;
            if ny >= 0 && bbox.contains(ax, ny as usize) {
                let n = nnf.source(grid.index(ax, ny as usize));
                let cy = n.y as isize + step;
                if cy >= 0 && cy < ah {
                    search.improve(target, &mut best, Anchor::new(n.x, cy as usize));
                }
            }

            // Random search in windows halving around the current best.
            let mut radius = search_radius;
            while radius >= 1 {
                let x_lo = best.source.x.saturating_sub(radius);
                let x_hi = (best.source.x + radius + 1).min(aw as usize);
                let y_lo = best.source.y.saturating_sub(radius);
                let y_hi = (best.source.y + radius + 1).min(ah as usize);
                let candidate = Anchor::new(rng.random_range(x_lo..x_hi), rng.random_range(y_lo..y_hi));
                search.improve(target, &mut best, candidate);
                radius /= 2;
            }

            nnf.set(i, best.source, best.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const HOLE: Pixel = Pixel::gray(255);

    /// Image with a distinctive texture so that exact matches are unique.
    fn textured(grid: &PatchGrid) -> Vec<Pixel> {
        (0..grid.pixel_count())
            .map(|i| {
                let x = i % grid.width;
                let y = i / grid.width;
                Pixel::new((x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x * y) % 256) as u8)
            })
            .collect()
    }

    #[test]
    fn refinement_never_worsens_scores() {
        let grid = PatchGrid::new(24, 24, 3);
        let image = textured(&grid);
        let mut mask = vec![Pixel::BLACK; grid.pixel_count()];
        for y in 10..13 {
            for x in 10..13 {
                mask[grid.index(x, y)] = HOLE;
            }
        }
        let bbox = BoundingBox::new(8, 15, 8, 15);
        let mut rng = Pcg32::seed_from_u64(0);
        let mut nnf = NearestNeighborField::new(grid.pixel_count());
        nnf.initialize(&image, &mask, &grid, &bbox, &mut rng);
        let before: Vec<Score> = (0..grid.pixel_count()).map(|i| nnf.score(i)).collect();

        refine(&mut nnf, &image, &mask, &grid, &bbox, false, &mut rng);
        refine(&mut nnf, &image, &mask, &grid, &bbox, true, &mut rng);

        for ay in bbox.y_min..bbox.y_max {
            for ax in bbox.x_min..bbox.x_max {
                let i = grid.index(ax, ay);
                assert!(nnf.score(i) <= before[i]);
                let s = nnf.source(i);
                assert!(!bbox.contains(s.x, s.y));
                assert_ne!(s, Anchor::new(ax, ay));
            }
        }
    }

    #[test]
    fn stored_scores_match_stored_sources() {
        let grid = PatchGrid::new(20, 20, 3);
        let image = textured(&grid);
        let mask = vec![Pixel::BLACK; grid.pixel_count()];
        let bbox = BoundingBox::new(6, 12, 6, 12);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut nnf = NearestNeighborField::new(grid.pixel_count());
        nnf.initialize(&image, &mask, &grid, &bbox, &mut rng);
        refine(&mut nnf, &image, &mask, &grid, &bbox, false, &mut rng);

        for ay in bbox.y_min..bbox.y_max {
            for ax in bbox.x_min..bbox.x_max {
                let i = grid.index(ax, ay);
                let expected = patch_distance(
                    &image, &image, &mask, &grid, Anchor::new(ax, ay), nnf.source(i), Score::Invalid,
                );
                assert_eq!(nnf.score(i), expected);
            }
        }
    }

    #[test]
    fn uniform_image_converges_to_zero() {
        let grid = PatchGrid::new(16, 16, 3);
        let image = vec![Pixel::gray(90); grid.pixel_count()];
        let mask = vec![Pixel::BLACK; grid.pixel_count()];
        let bbox = BoundingBox::new(5, 9, 5, 9);
        let mut rng = Pcg32::seed_from_u64(5);
        let mut nnf = NearestNeighborField::new(grid.pixel_count());
        nnf.initialize(&image, &mask, &grid, &bbox, &mut rng);
        refine(&mut nnf, &image, &mask, &grid, &bbox, false, &mut rng);
        for ay in bbox.y_min..bbox.y_max {
            for ax in bbox.x_min..bbox.x_max {
                assert_eq!(nnf.score(grid.index(ax, ay)), Score::ZERO);
            }
        }
    }

    #[test]
    fn fully_covered_anchor_is_skipped() {
        let grid = PatchGrid::new(12, 12, 3);
        let image = textured(&grid);
        let mut mask = vec![Pixel::BLACK; grid.pixel_count()];
        mask[grid.index(5, 5)] = HOLE;
        mask[grid.index(7, 7)] = HOLE;
        let bbox = BoundingBox::new(3, 8, 3, 8);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut nnf = NearestNeighborField::new(grid.pixel_count());
        nnf.initialize(&image, &mask, &grid, &bbox, &mut rng);
        let i = grid.index(5, 5);
        let before = (nnf.source(i), nnf.score(i));
        refine(&mut nnf, &image, &mask, &grid, &bbox, false, &mut rng);
        assert_eq!((nnf.source(i), nnf.score(i)), before);
    }

    /// `textured` repeated every `period` columns.
    fn periodic(grid: &PatchGrid, period: usize) -> Vec<Pixel> {
        let tile = textured(grid);
        (0..grid.pixel_count())
            .map(|i| tile[grid.index(i % grid.width % period, i / grid.width)])
            .collect()
    }

    #[test]
    fn perfect_match_rejected_for_hole_anchor() {
        let grid = PatchGrid::new(10, 10, 2);
        let image = vec![Pixel::gray(50); grid.pixel_count()];
        let mut mask = vec![Pixel::BLACK; grid.pixel_count()];
        mask[grid.index(4, 4)] = HOLE;
        let bbox = BoundingBox::new(3, 6, 3, 6);
        let search = Search { image: &image, mask: &mask, grid: &grid, bbox: &bbox };
        let seeded = Best { source: Anchor::new(8, 0), score: Score::Valid(1000) };

        let mut best = seeded;
        search.improve(Anchor::new(4, 4), &mut best, Anchor::new(0, 0));
        assert_eq!(best, seeded);

        let mut best = seeded;
        search.improve(Anchor::new(3, 3), &mut best, Anchor::new(3, 3));
        assert_eq!(best, seeded);

        let mut best = seeded;
        search.improve(Anchor::new(3, 3), &mut best, Anchor::new(0, 0));
        assert_eq!(best, Best { source: Anchor::new(0, 0), score: Score::ZERO });
    }

    #[test]
    fn hole_anchor_keeps_seeded_source_through_refinement() {
        let grid = PatchGrid::new(10, 10, 2);
        let image = vec![Pixel::gray(50); grid.pixel_count()];
        let mut mask = vec![Pixel::BLACK; grid.pixel_count()];
        mask[grid.index(4, 4)] = HOLE;
        let bbox = BoundingBox::new(3, 6, 3, 6);
        let mut nnf = NearestNeighborField::new(grid.pixel_count());
        let i = grid.index(4, 4);
        nnf.set(i, Anchor::new(8, 1), Score::Valid(1000));

        let mut rng = Pcg32::seed_from_u64(2);
        refine(&mut nnf, &image, &mask, &grid, &bbox, false, &mut rng);
        refine(&mut nnf, &image, &mask, &grid, &bbox, true, &mut rng);
        assert_eq!(nnf.source(i), Anchor::new(8, 1));
        assert_eq!(nnf.score(i), Score::Valid(1000));
    }

    #[test]
    fn reverse_pass_propagates_from_the_right() {
        let grid = PatchGrid::new(20, 20, 3);
        let image = periodic(&grid, 7);
        let mask = vec![Pixel::BLACK; grid.pixel_count()];
        let bbox = BoundingBox::new(8, 12, 8, 12);
        let mut nnf = NearestNeighborField::new(grid.pixel_count());

        // Anchor (10, 9) already holds its exact match one period to the left.
        let right = Anchor::new(3, 9);
        let right_score =
            patch_distance(&image, &image, &mask, &grid, Anchor::new(10, 9), right, Score::Invalid);
        assert_eq!(right_score, Score::ZERO);
        nnf.set(grid.index(10, 9), right, right_score);

        let target = Anchor::new(9, 9);
        let seeded = Anchor::new(0, 0);
        let seeded_score = patch_distance(&image, &image, &mask, &grid, target, seeded, Score::Invalid);
        assert!(seeded_score > Score::ZERO);
        let i = grid.anchor_index(target);
        nnf.set(i, seeded, seeded_score);

        let mut rng = Pcg32::seed_from_u64(4);
        refine(&mut nnf, &image, &mask, &grid, &bbox, true, &mut rng);
        assert_eq!(nnf.source(i), Anchor::new(2, 9));
        assert_eq!(nnf.score(i), Score::ZERO);
    }
}
