//! Joint-count clustering score for binary masks.
//!
//! Each set pixel contributes the mean of the mask over the 2×2 window
//! spanning rows `r-1..=r` and columns `c-1..=c`. Cells outside the image
//! are dropped from the window rather than padded, so a corner pixel's
//! window is just itself and an edge pixel's window has two cells. The
//! contributions are scaled by 100 and averaged over the set pixels.

use crate::types::BinaryMask;

/// Returns NaN when the mask has no set pixels.
pub fn joint_count(mask: &BinaryMask) -> f64 {
    let values = mask.as_array();
    let (rows, cols) = values.dim();

    let mut total = 0.0;
    let mut set = 0usize;
    for r in 0..rows {
        for c in 0..cols {
            if !values[[r, c]] {
                continue;
            }
            set += 1;
            total += window_mean(mask, r, c) * 100.0;
        }
    }

    if set == 0 {
        return f64::NAN;
    }
    total / set as f64
}

fn window_mean(mask: &BinaryMask, r: usize, c: usize) -> f64 {
    let values = mask.as_array();
    let mut cells = 0u32;
    let mut hits = 0u32;
    for y in r.saturating_sub(1)..=r {
        for x in c.saturating_sub(1)..=c {
            cells += 1;
            if values[[y, x]] {
                hits += 1;
            }
        }
    }
    hits as f64 / cells as f64
}
