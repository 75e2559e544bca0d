//! Change map construction from two segmentation grids

use ndarray::Array2;
use terrashift_core::{Algorithm, Error, Raster, Result};

use crate::maybe_rayon::*;

/// Binary change mask: 1 where the label differs between epochs.
///
/// Hard error when the grids disagree in shape.
pub fn change_mask(before: &Raster<u16>, after: &Raster<u16>) -> Result<Raster<u8>> {
    let (rows, cols) = before.shape();
    if after.shape() != (rows, cols) {
        return Err(Error::shape_mismatch((rows, cols), after.shape()));
    }

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut out = Vec::with_capacity(cols);
            for col in 0..cols {
                let b = unsafe { before.get_unchecked(row, col) };
                let a = unsafe { after.get_unchecked(row, col) };
                out.push(u8::from(b != a));
            }
            out
        })
        .collect();

    let mut mask = Raster::new(rows, cols);
    *mask.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(mask)
}

/// Transition code map: `before * 100 + after` per pixel.
///
/// With labels below 100 every (before, after) pair gets a unique code.
pub fn transition_map(before: &Raster<u16>, after: &Raster<u16>) -> Result<Raster<u16>> {
    let (rows, cols) = before.shape();
    if after.shape() != (rows, cols) {
        return Err(Error::shape_mismatch((rows, cols), after.shape()));
    }

    let data: Vec<u16> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut out = Vec::with_capacity(cols);
            for col in 0..cols {
                let b = unsafe { before.get_unchecked(row, col) };
                let a = unsafe { after.get_unchecked(row, col) };
                out.push(b * 100 + a);
            }
            out
        })
        .collect();

    let mut map = Raster::new(rows, cols);
    *map.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(map)
}

/// [`Algorithm`] producing the change mask and the transition code map
pub struct ChangeMapBuilder;

impl Algorithm for ChangeMapBuilder {
    type Input = (Raster<u16>, Raster<u16>);
    type Output = (Raster<u8>, Raster<u16>);
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "change_map"
    }

    fn description(&self) -> &'static str {
        "Binary change mask and class transition codes from two label grids"
    }

    fn execute(&self, input: Self::Input, _params: ()) -> Result<Self::Output> {
        let (before, after) = input;
        Ok((
            change_mask(&before, &after)?,
            transition_map(&before, &after)?,
        ))
    }
}
