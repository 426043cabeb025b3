//! Energy group structures supplied by the caller.

use serde::{Deserialize, Serialize};

use crate::errors::{ActError, ErrorInfo};

fn group_error(code: &str, message: impl Into<String>, name: &str) -> ErrorInfo {
    ErrorInfo::new(code, message).with_context("name", name)
}

/// Raw on-disk form of a group structure.
#[derive(Debug, Clone, Deserialize)]
struct GroupStructureFile {
    name: String,
    boundaries: Vec<f64>,
}

/// Ordered energy bin boundaries identified by a structure name.
///
/// Holds `N + 1` strictly increasing boundaries describing `N` contiguous
/// bins. The value is immutable once built and is passed explicitly to every
/// component that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GroupStructureFile")]
pub struct GroupStructure {
    name: String,
    boundaries: Vec<f64>,
    #[serde(skip_serializing)]
    widths: Vec<f64>,
}

impl TryFrom<GroupStructureFile> for GroupStructure {
    type Error = ActError;

    fn try_from(raw: GroupStructureFile) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.boundaries)
    }
}

impl GroupStructure {
    /// Builds a group structure from its boundaries.
    ///
    /// Only the structural requirements the flux pipeline depends on are
    /// checked: at least two finite boundaries in strictly increasing order.
    pub fn new(name: impl Into<String>, boundaries: Vec<f64>) -> Result<Self, ActError> {
        let name = name.into();
        if boundaries.len() < 2 {
            return Err(ActError::InvalidGroupStructure(group_error(
                "groups.too-few-boundaries",
                format!(
                    "a group structure needs at least two boundaries, got {}",
                    boundaries.len()
                ),
                &name,
            )));
        }
        if let Some(idx) = boundaries.iter().position(|b| !b.is_finite()) {
            return Err(ActError::InvalidGroupStructure(
                group_error("groups.non-finite", "boundaries must be finite", &name)
                    .with_context("index", idx),
            ));
        }
        let widths: Vec<f64> = boundaries.windows(2).map(|pair| pair[1] - pair[0]).collect();
        if let Some(idx) = widths.iter().position(|w| *w <= 0.0) {
            return Err(ActError::InvalidGroupStructure(
                group_error(
                    "groups.not-increasing",
                    "boundaries must be strictly increasing",
                    &name,
                )
                .with_context("index", idx),
            ));
        }
        Ok(Self {
            name,
            boundaries,
            widths,
        })
    }

    /// Parses a YAML document of the form `{name: ..., boundaries: [...]}`.
    pub fn from_yaml_str(text: &str) -> Result<Self, ActError> {
        serde_yaml::from_str(text).map_err(|err| {
            ActError::InvalidGroupStructure(
                ErrorInfo::new("groups.yaml", "failed to read group structure")
                    .with_hint(err.to_string()),
            )
        })
    }

    /// Name of the structure (for example `VITAMIN-J-175`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bin boundaries in increasing order.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Number of energy groups, one less than the boundary count.
    pub fn group_count(&self) -> usize {
        self.widths.len()
    }

    /// Width of every bin in boundary order.
    pub fn bin_widths(&self) -> &[f64] {
        &self.widths
    }
}
