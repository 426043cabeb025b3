use actdb_core::errors::{ActError, ErrorInfo};
use serde::Serialize;

/// Zone x energy-group flux values stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxMatrix {
    groups: usize,
    values: Vec<f64>,
}

impl FluxMatrix {
    /// Reshapes a flat sample into rows of `groups` values.
    ///
    /// The sample length must be a non-zero multiple of `groups` and every
    /// value must be finite and non-negative.
    pub fn from_flat(values: Vec<f64>, groups: usize) -> Result<Self, ActError> {
        if values.is_empty() {
            return Err(ActError::EmptyFluxData(ErrorInfo::new(
                "flux.empty",
                "flux sample contains no values",
            )));
        }
        if groups == 0 || values.len() % groups != 0 {
            return Err(ActError::MisalignedFluxData(
                ErrorInfo::new(
                    "flux.misaligned",
                    "flux value count is not a multiple of the group count",
                )
                .with_context("values", values.len())
                .with_context("groups", groups)
                .with_context("remainder", values.len() % groups.max(1)),
            ));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
            let message = if values[idx].is_finite() {
                "flux value must be non-negative"
            } else {
                "flux value must be finite"
            };
            return Err(ActError::FluxParse(
                ErrorInfo::new("flux.value", message)
                    .with_context("zone", idx / groups)
                    .with_context("group", idx % groups)
                    .with_context("value", values[idx]),
            ));
        }
        Ok(Self { groups, values })
    }

    /// Builds a matrix from explicit rows of equal length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ActError> {
        let groups = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(zone) = rows.iter().position(|row| row.len() != groups) {
            return Err(ActError::MisalignedFluxData(
                ErrorInfo::new("flux.ragged-rows", "flux rows differ in length")
                    .with_context("zone", zone)
                    .with_context("groups", groups),
            ));
        }
        Self::from_flat(rows.into_iter().flatten().collect(), groups)
    }

    /// Number of zones (rows).
    pub fn zones(&self) -> usize {
        self.values.len() / self.groups
    }

    /// Number of energy groups (columns).
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// Flux values of one zone.
    pub fn row(&self, zone: usize) -> Option<&[f64]> {
        let start = zone.checked_mul(self.groups)?;
        self.values.get(start..start + self.groups)
    }

    /// Iterator over zone rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.groups)
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Copies the matrix into nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_values_are_rejected_with_position() {
        let err = FluxMatrix::from_rows(vec![vec![1.0, 1.0, 1.0], vec![2.0, -1.0, 1.0]]).unwrap_err();
        assert!(matches!(err, ActError::FluxParse(_)));
        assert_eq!(err.context("zone"), Some("1"));
        assert_eq!(err.context("group"), Some("1"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let err = FluxMatrix::from_flat(vec![1.0, f64::NAN, 1.0], 3).unwrap_err();
        assert!(matches!(err, ActError::FluxParse(_)));
        assert_eq!(err.context("group"), Some("1"));
        assert!(FluxMatrix::from_flat(vec![1.0, f64::INFINITY], 2).is_err());
    }

    #[test]
    fn zero_values_are_accepted() {
        let matrix = FluxMatrix::from_flat(vec![0.0, 0.0, 3.0, 1.0], 2).unwrap();
        assert_eq!(matrix.zones(), 2);
        assert_eq!(matrix.row(1), Some(&[3.0, 1.0][..]));
    }
}
