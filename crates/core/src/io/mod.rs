//! I/O operations for reading and writing raster data

mod native;

pub use native::{read_geo_bounds, read_geotiff, read_rgb_geotiff, write_geotiff};
