//! Boundary tracing for labeled regions
//!
//! Moore-neighbor tracing producing a closed outline of boundary pixel
//! centers in clockwise order. The walk is a deterministic function of
//! (pixel, backtrack direction), so tracing stops as soon as a state
//! repeats; this also terminates on one-pixel-wide appendages where the
//! classic stop-at-start criterion can loop.

use std::collections::HashSet;

use crate::detection::BoundingBox;

/// Clockwise 8-neighborhood starting east, offsets as (drow, dcol)
const NBRS: [(isize, isize); 8] = [
    (0, 1),   // E
    (1, 1),   // SE
    (1, 0),   // S
    (1, -1),  // SW
    (0, -1),  // W
    (-1, -1), // NW
    (-1, 0),  // N
    (-1, 1),  // NE
];

fn offset_index(delta: (isize, isize)) -> usize {
    NBRS.iter().position(|&d| d == delta).unwrap_or(4)
}

/// Trace the outer boundary of a region.
///
/// `pixels` must be the region's pixels as (row, col) in row-major order
/// (as produced by [`crate::regions::label_components`]); `bbox` its pixel
/// bounding box. Returns a closed ring (first == last) of boundary pixel
/// centers as (x, y) coordinates.
pub fn trace_region_boundary(pixels: &[(usize, usize)], bbox: &BoundingBox) -> Vec<(usize, usize)> {
    if pixels.is_empty() {
        return Vec::new();
    }
    if pixels.len() == 1 {
        let (r, c) = pixels[0];
        return vec![(c, r), (c, r)];
    }

    // Local occupancy grid over the bounding box
    let mut grid = vec![false; bbox.width * bbox.height];
    for &(r, c) in pixels {
        grid[(r - bbox.y) * bbox.width + (c - bbox.x)] = true;
    }
    let in_region = |r: isize, c: isize| -> bool {
        let lr = r - bbox.y as isize;
        let lc = c - bbox.x as isize;
        lr >= 0
            && lc >= 0
            && (lr as usize) < bbox.height
            && (lc as usize) < bbox.width
            && grid[lr as usize * bbox.width + lc as usize]
    };

    // Row-major input makes pixels[0] the topmost-leftmost pixel, so its
    // west neighbor is guaranteed outside the region.
    let start = (pixels[0].0 as isize, pixels[0].1 as isize);
    let mut cur = start;
    let mut backtrack = 4; // W

    let mut contour = vec![(pixels[0].1, pixels[0].0)];
    let mut seen: HashSet<((isize, isize), usize)> = HashSet::new();
    seen.insert((cur, backtrack));

    'walk: loop {
        for k in 1..=8 {
            let idx = (backtrack + k) % 8;
            let next = (cur.0 + NBRS[idx].0, cur.1 + NBRS[idx].1);
            if !in_region(next.0, next.1) {
                continue;
            }

            // Last outside cell scanned before entering `next`
            let prev_idx = (backtrack + k - 1) % 8;
            let outside = (cur.0 + NBRS[prev_idx].0, cur.1 + NBRS[prev_idx].1);
            let new_backtrack = offset_index((outside.0 - next.0, outside.1 - next.1));

            if !seen.insert((next, new_backtrack)) {
                break 'walk; // cycle closed
            }

            contour.push((next.1 as usize, next.0 as usize));
            cur = next;
            backtrack = new_backtrack;
            continue 'walk;
        }

        break; // no reachable neighbor (cannot happen for len > 1 components)
    }

    if contour.first() != contour.last() {
        let first = contour[0];
        contour.push(first);
    }
    contour
}
