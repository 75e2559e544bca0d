//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for basic TIFF I/O: single-band label grids and
//! masks, interleaved RGB imagery, and a tiepoint/scale-tag reader that
//! recovers a [`GeoBounds`] when the file carries georeferencing tags.

use crate::error::{Error, Result};
use crate::geo::GeoBounds;
use crate::raster::{Raster, RasterElement};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// Read a single-band GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let mut decoder = new_decoder(file)?;
    let (rows, cols) = dimensions(&mut decoder)?;

    let data = decode_band(&mut decoder)?;
    if data.len() != rows * cols {
        return Err(Error::UnsupportedDataType(format!(
            "expected 1 sample per pixel, got {}",
            data.len() / (rows * cols).max(1)
        )));
    }

    Raster::from_vec(cast_band(&data), rows, cols)
}

/// Read an interleaved RGB GeoTIFF into (red, green, blue) band rasters
pub fn read_rgb_geotiff<P: AsRef<Path>>(
    path: P,
) -> Result<(Raster<f64>, Raster<f64>, Raster<f64>)> {
    let file = File::open(path.as_ref())?;
    let mut decoder = new_decoder(file)?;
    let (rows, cols) = dimensions(&mut decoder)?;

    let data = decode_band(&mut decoder)?;
    if data.len() != rows * cols * 3 {
        return Err(Error::UnsupportedDataType(format!(
            "expected 3 samples per pixel, got {}",
            data.len() / (rows * cols).max(1)
        )));
    }

    let mut red = Vec::with_capacity(rows * cols);
    let mut green = Vec::with_capacity(rows * cols);
    let mut blue = Vec::with_capacity(rows * cols);

    for px in data.chunks_exact(3) {
        red.push(px[0]);
        green.push(px[1]);
        blue.push(px[2]);
    }

    Ok((
        Raster::from_vec(red, rows, cols)?,
        Raster::from_vec(green, rows, cols)?,
        Raster::from_vec(blue, rows, cols)?,
    ))
}

/// Attempt to read a [`GeoBounds`] from GeoTIFF tags.
///
/// Uses ModelTiepointTag (33922) + ModelPixelScaleTag (33550) and the image
/// dimensions. Returns `Ok(None)` when the file carries no usable tags.
pub fn read_geo_bounds<P: AsRef<Path>>(path: P) -> Result<Option<GeoBounds>> {
    let file = File::open(path.as_ref())?;
    let mut decoder = new_decoder(file)?;
    let (rows, cols) = dimensions(&mut decoder)?;

    let scale = decoder.get_tag_f64_vec(Tag::Unknown(33550));
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(33922));

    let (scale, tiepoint) = match (scale, tiepoint) {
        (Ok(s), Ok(t)) if s.len() >= 2 && t.len() >= 6 => (s, t),
        _ => return Ok(None),
    };

    // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
    let west = tiepoint[3] - tiepoint[0] * scale[0];
    let north = tiepoint[4] + tiepoint[1] * scale[1];
    let east = west + cols as f64 * scale[0];
    let south = north - rows as f64 * scale[1];

    Ok(Some(GeoBounds::new(north, south, east, west)))
}

/// Write a Raster to a GeoTIFF file (32-bit float, optionally georeferenced)
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, bounds: Option<&GeoBounds>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    if let Some(b) = bounds {
        let scale = vec![
            b.lon_span() / cols.max(1) as f64,
            b.lat_span() / rows.max(1) as f64,
            0.0,
        ];
        image
            .encoder()
            .write_tag(Tag::Unknown(33550), scale.as_slice())
            .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

        let tiepoint = vec![0.0, 0.0, 0.0, b.west, b.north, 0.0];
        image
            .encoder()
            .write_tag(Tag::Unknown(33922), tiepoint.as_slice())
            .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;
    }

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

fn new_decoder(file: File) -> Result<Decoder<File>> {
    Decoder::new(file).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))
}

fn dimensions(decoder: &mut Decoder<File>) -> Result<(usize, usize)> {
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    Ok((height as usize, width as usize))
}

/// Decode the image payload into f64 samples regardless of storage type
fn decode_band(decoder: &mut Decoder<File>) -> Result<Vec<f64>> {
    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data = match result {
        DecodingResult::U8(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::U16(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::U32(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::I8(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::I16(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::I32(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::F32(buf) => buf.iter().map(|&v| v as f64).collect(),
        DecodingResult::F64(buf) => buf,
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    Ok(data)
}

fn cast_band<T: RasterElement>(data: &[f64]) -> Vec<T> {
    data.iter()
        .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}
