//! # Terrashift Core
//!
//! Core types and I/O for the terrashift change-analytics engine.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type (label grids, band data, masks)
//! - `GeoBounds` / `BoundsTransform`: bounding-box georeferencing
//! - Algorithm traits for consistent API
//! - Native GeoTIFF I/O

pub mod error;
pub mod geo;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use geo::{BoundsTransform, GeoBounds, GeoCoordinate};
pub use raster::{Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geo::{BoundsTransform, GeoBounds, GeoCoordinate};
    pub use crate::raster::{Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in terrashift.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
