//! Flux spectrum pipeline: parse raw multi-group flux text into a
//! zone x group matrix, reduce it to per-zone spectral shapes and combine
//! zone totals with a pulse schedule into time-averaged magnitudes.

#![deny(missing_docs)]

mod average;
mod matrix;
mod normalize;
mod parse;

pub use average::{
    average, average_grid, average_on_off, average_whole_period, AverageFluxGrid,
    AveragingStrategy,
};
pub use matrix::FluxMatrix;
pub use normalize::{normalize, total_flux, NormalizedFluxShape, ShapeConvention};
pub use parse::{parse_flux_file, parse_flux_lines, parse_flux_str};
