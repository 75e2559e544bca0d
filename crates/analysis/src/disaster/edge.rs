//! Sobel edge detection over grayscale imagery
//!
//! Structural-damage signals come from edge density: collapsed structures
//! lose the sharp edges they had before the event.

use ndarray::Array2;
use terrashift_core::{Error, Raster, Result};

use crate::maybe_rayon::*;

/// Sobel gradient magnitude.
///
/// `G = sqrt(Gx² + Gy²)` with the 3x3 Sobel kernels; border pixels are NaN.
pub fn sobel_magnitude(gray: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = gray.shape();
    if rows < 3 || cols < 3 {
        return Err(Error::Algorithm("Sobel requires at least a 3x3 raster".into()));
    }

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            if row == 0 || row == rows - 1 {
                return row_data;
            }

            for col in 1..(cols - 1) {
                let z = |r: usize, c: usize| -> f64 {
                    let v = unsafe { gray.get_unchecked(r, c) };
                    if v.is_nan() {
                        0.0
                    } else {
                        v
                    }
                };

                let z1 = z(row - 1, col - 1);
                let z2 = z(row - 1, col);
                let z3 = z(row - 1, col + 1);
                let z4 = z(row, col - 1);
                let z6 = z(row, col + 1);
                let z7 = z(row + 1, col - 1);
                let z8 = z(row + 1, col);
                let z9 = z(row + 1, col + 1);

                let gx = (z3 + 2.0 * z6 + z9) - (z1 + 2.0 * z4 + z7);
                let gy = (z7 + 2.0 * z8 + z9) - (z1 + 2.0 * z2 + z3);

                row_data[col] = (gx * gx + gy * gy).sqrt();
            }

            row_data
        })
        .collect();

    let mut output = Raster::new(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

/// Binary edge mask: 1 where the Sobel magnitude exceeds `threshold`
pub fn edge_mask(gray: &Raster<f64>, threshold: f64) -> Result<Raster<u8>> {
    let magnitude = sobel_magnitude(gray)?;
    let (rows, cols) = magnitude.shape();

    let mut mask = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let v = unsafe { magnitude.get_unchecked(row, col) };
            unsafe { mask.set_unchecked(row, col, u8::from(v > threshold)) };
        }
    }
    Ok(mask)
}

/// Fraction of image pixels that are edges at the given threshold
pub fn edge_density(gray: &Raster<f64>, threshold: f64) -> Result<f64> {
    let mask = edge_mask(gray, threshold)?;
    Ok(mask.fraction_where(|v| v != 0))
}
