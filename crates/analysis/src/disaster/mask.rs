//! Binary morphology over damage masks
//!
//! 3x3 square structuring element, which is what the damage-mask cleanup
//! needs. Out-of-bounds neighbors count as background.

use terrashift_core::Raster;

fn is_set(mask: &Raster<u8>, row: isize, col: isize) -> bool {
    let (rows, cols) = mask.shape();
    row >= 0
        && col >= 0
        && (row as usize) < rows
        && (col as usize) < cols
        && unsafe { mask.get_unchecked(row as usize, col as usize) } != 0
}

/// Binary dilation with a 3x3 square element
pub fn binary_dilate(mask: &Raster<u8>) -> Raster<u8> {
    let (rows, cols) = mask.shape();
    let mut out = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let mut any = false;
            'scan: for dr in -1isize..=1 {
                for dc in -1isize..=1 {
                    if is_set(mask, row as isize + dr, col as isize + dc) {
                        any = true;
                        break 'scan;
                    }
                }
            }
            unsafe { out.set_unchecked(row, col, u8::from(any)) };
        }
    }
    out
}

/// Binary erosion with a 3x3 square element
pub fn binary_erode(mask: &Raster<u8>) -> Raster<u8> {
    let (rows, cols) = mask.shape();
    let mut out = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let mut all = true;
            'scan: for dr in -1isize..=1 {
                for dc in -1isize..=1 {
                    if !is_set(mask, row as isize + dr, col as isize + dc) {
                        all = false;
                        break 'scan;
                    }
                }
            }
            unsafe { out.set_unchecked(row, col, u8::from(all)) };
        }
    }
    out
}

/// Binary closing: dilation followed by erosion.
///
/// Bridges small gaps and fills pinholes without growing the mask overall.
pub fn binary_closing(mask: &Raster<u8>) -> Raster<u8> {
    binary_erode(&binary_dilate(mask))
}
