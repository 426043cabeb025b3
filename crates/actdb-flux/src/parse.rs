use std::fs;
use std::path::Path;

use actdb_core::errors::{ActError, ErrorInfo};
use actdb_core::GroupStructure;
use tracing::debug;

use crate::matrix::FluxMatrix;

fn token_error(code: &str, message: &str, line: usize, token: &str) -> ActError {
    ActError::FluxParse(
        ErrorInfo::new(code, message)
            .with_context("line", line)
            .with_context("token", token),
    )
}

/// Parses whitespace-delimited flux lines into a zone x group matrix.
///
/// Tokens from every non-blank line are concatenated in order, so line breaks
/// carry no meaning. Each consecutive run of `group_count` values becomes one
/// zone row.
pub fn parse_flux_lines<I, S>(lines: I, groups: &GroupStructure) -> Result<FluxMatrix, ActError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut values = Vec::new();
    let mut last_line = 0;
    for (idx, line) in lines.into_iter().enumerate() {
        let line_no = idx + 1;
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }
        for token in line.split_whitespace() {
            let value: f64 = token
                .parse()
                .map_err(|_| token_error("flux.token", "flux token is not a number", line_no, token))?;
            if !value.is_finite() {
                return Err(token_error("flux.non-finite", "flux value must be finite", line_no, token));
            }
            if value < 0.0 {
                return Err(token_error("flux.negative", "flux value must be non-negative", line_no, token));
            }
            values.push(value);
        }
        last_line = line_no;
    }
    if values.is_empty() {
        return Err(ActError::EmptyFluxData(
            ErrorInfo::new("flux.empty", "flux input contains no tokens")
                .with_context("group_structure", groups.name()),
        ));
    }
    let group_count = groups.group_count();
    if values.len() % group_count != 0 {
        return Err(ActError::MisalignedFluxData(
            ErrorInfo::new(
                "flux.misaligned",
                "flux token count is not a multiple of the group count",
            )
            .with_context("tokens", values.len())
            .with_context("groups", group_count)
            .with_context("remainder", values.len() % group_count)
            .with_context("last_line", last_line)
            .with_context("group_structure", groups.name()),
        ));
    }
    let matrix = FluxMatrix::from_flat(values, group_count)?;
    debug!(
        zones = matrix.zones(),
        groups = group_count,
        "parsed flux spectrum"
    );
    Ok(matrix)
}

/// Parses flux text held in memory.
pub fn parse_flux_str(text: &str, groups: &GroupStructure) -> Result<FluxMatrix, ActError> {
    parse_flux_lines(text.lines(), groups)
}

/// Reads and parses a UTF-8 flux file.
pub fn parse_flux_file(path: &Path, groups: &GroupStructure) -> Result<FluxMatrix, ActError> {
    let text = fs::read_to_string(path).map_err(|err| {
        ActError::FluxParse(
            ErrorInfo::new("flux.read", "failed to read flux file")
                .with_context("path", path.display())
                .with_hint(err.to_string()),
        )
    })?;
    parse_flux_str(&text, groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_groups() -> GroupStructure {
        GroupStructure::new("toy-3", vec![0.0, 1.0, 2.0, 4.0]).unwrap()
    }

    #[test]
    fn reshapes_row_major() {
        let matrix = parse_flux_str("1 2 3\n4 5 6\n", &three_groups()).unwrap();
        assert_eq!(matrix.to_rows(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn line_breaks_do_not_matter() {
        let groups = three_groups();
        let wrapped = parse_flux_str("1 2\n\n   \n3 4\n5\t6", &groups).unwrap();
        let flat = parse_flux_str("1 2 3 4 5 6", &groups).unwrap();
        assert_eq!(wrapped, flat);
    }

    #[test]
    fn blank_input_is_empty() {
        let err = parse_flux_str("\n  \n\t\n", &three_groups()).unwrap_err();
        assert!(matches!(err, ActError::EmptyFluxData(_)));
    }

    #[test]
    fn leftover_tokens_are_misaligned() {
        let err = parse_flux_str("1 2 3\n4 5\n", &three_groups()).unwrap_err();
        assert!(matches!(err, ActError::MisalignedFluxData(_)));
        assert_eq!(err.context("tokens"), Some("5"));
        assert_eq!(err.context("remainder"), Some("2"));
    }

    #[test]
    fn bad_tokens_report_line() {
        let err = parse_flux_str("1 2 3\n4 x 6\n", &three_groups()).unwrap_err();
        assert!(matches!(err, ActError::FluxParse(_)));
        assert_eq!(err.context("line"), Some("2"));
        assert_eq!(err.context("token"), Some("x"));

        let err = parse_flux_str("1 -2 3\n", &three_groups()).unwrap_err();
        assert_eq!(err.info().code, "flux.negative");
    }

    #[test]
    fn scientific_notation_is_accepted() {
        let matrix = parse_flux_str("1.5E+10 2.0e-3 0", &three_groups()).unwrap();
        assert_eq!(matrix.row(0).unwrap(), &[1.5e10, 2.0e-3, 0.0]);
    }
}
