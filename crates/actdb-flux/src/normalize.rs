use actdb_core::errors::{ActError, ErrorInfo};
use actdb_core::GroupStructure;
use serde::{Deserialize, Serialize};

use crate::matrix::FluxMatrix;

/// How a zone row is turned into a spectral shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShapeConvention {
    /// Row divided by the zone total; entries sum to one.
    Fractional,
    /// Row divided element-wise by bin widths, then by the zone total.
    #[default]
    PerUnitEnergy,
}

/// Sum over energy groups for every zone.
pub fn total_flux(matrix: &FluxMatrix) -> Vec<f64> {
    matrix.rows().map(|row| row.iter().sum()).collect()
}

/// Per-zone spectral shapes together with the totals they were scaled by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFluxShape {
    convention: ShapeConvention,
    groups: usize,
    values: Vec<f64>,
    total_flux: Vec<f64>,
}

impl NormalizedFluxShape {
    /// Convention the shape was built with.
    pub fn convention(&self) -> ShapeConvention {
        self.convention
    }

    /// Number of zones.
    pub fn zones(&self) -> usize {
        self.total_flux.len()
    }

    /// Shape of one zone.
    pub fn row(&self, zone: usize) -> Option<&[f64]> {
        let start = zone.checked_mul(self.groups)?;
        self.values.get(start..start + self.groups)
    }

    /// Zone totals of the unnormalized matrix.
    pub fn total_flux(&self) -> &[f64] {
        &self.total_flux
    }

    /// Multiplies each shape back by its zone total (and bin widths when the
    /// per-unit-energy convention is in use).
    pub fn reconstruct(&self, groups: &GroupStructure) -> Result<FluxMatrix, ActError> {
        check_groups(self.groups, groups)?;
        let widths = groups.bin_widths();
        let mut values = Vec::with_capacity(self.values.len());
        for (row, total) in self.values.chunks_exact(self.groups).zip(&self.total_flux) {
            for (value, width) in row.iter().zip(widths) {
                let scaled = match self.convention {
                    ShapeConvention::Fractional => value * total,
                    ShapeConvention::PerUnitEnergy => value * width * total,
                };
                values.push(scaled);
            }
        }
        FluxMatrix::from_flat(values, self.groups)
    }
}

fn check_groups(columns: usize, groups: &GroupStructure) -> Result<(), ActError> {
    if columns != groups.group_count() {
        return Err(ActError::MisalignedFluxData(
            ErrorInfo::new(
                "flux.group-mismatch",
                "flux matrix columns do not match the group structure",
            )
            .with_context("columns", columns)
            .with_context("groups", groups.group_count())
            .with_context("group_structure", groups.name()),
        ));
    }
    Ok(())
}

/// Rescales every zone of `matrix` into a dimensionless shape.
///
/// The input matrix is left untouched so that totals can be recomputed from
/// it later.
pub fn normalize(
    matrix: &FluxMatrix,
    groups: &GroupStructure,
    convention: ShapeConvention,
) -> Result<NormalizedFluxShape, ActError> {
    check_groups(matrix.groups(), groups)?;
    let totals = total_flux(matrix);
    if let Some(zone) = totals.iter().position(|total| *total == 0.0) {
        return Err(ActError::ZeroFlux(
            ErrorInfo::new("flux.zero-total", "zone total flux is zero")
                .with_context("zone", zone)
                .with_hint("a zone without flux has no spectral shape"),
        ));
    }
    let widths = groups.bin_widths();
    let mut values = Vec::with_capacity(matrix.as_slice().len());
    for (row, total) in matrix.rows().zip(&totals) {
        for (value, width) in row.iter().zip(widths) {
            let shaped = match convention {
                ShapeConvention::Fractional => value / total,
                ShapeConvention::PerUnitEnergy => value / width / total,
            };
            values.push(shaped);
        }
    }
    Ok(NormalizedFluxShape {
        convention,
        groups: matrix.groups(),
        values,
        total_flux: totals,
    })
}
