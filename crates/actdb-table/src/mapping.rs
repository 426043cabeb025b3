use actdb_core::errors::ActError;
use serde::{Deserialize, Serialize};

use crate::table::ActivationTable;

/// What happens to a column of the raw activation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAction {
    /// Remove the column.
    Drop,
    /// Rename the column.
    Rename(String),
}

/// One entry of a [`ColumnMapping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRule {
    /// Column of the raw table the rule applies to.
    pub column: String,
    /// Action applied to it.
    pub action: ColumnAction,
}

impl ColumnRule {
    /// Rule removing `column`.
    pub fn drop(column: &str) -> Self {
        Self {
            column: column.to_string(),
            action: ColumnAction::Drop,
        }
    }

    /// Rule renaming `column` to `to`.
    pub fn rename(column: &str, to: &str) -> Self {
        Self {
            column: column.to_string(),
            action: ColumnAction::Rename(to.to_string()),
        }
    }
}

/// Ordered drop/rename rules applied to a finished activation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    rules: Vec<ColumnRule>,
}

impl Default for ColumnMapping {
    /// `value` becomes a number-density column; time and block metadata go.
    fn default() -> Self {
        let mut rules = vec![ColumnRule::rename("value", "num_dens_(atoms/cm3)")];
        rules.extend(
            ["time", "time_unit", "variable", "var_unit", "block", "block_num"]
                .into_iter()
                .map(ColumnRule::drop),
        );
        Self { rules }
    }
}

impl ColumnMapping {
    /// Builds a mapping from explicit rules.
    pub fn new(rules: Vec<ColumnRule>) -> Self {
        Self { rules }
    }

    /// Rules in application order.
    pub fn rules(&self) -> &[ColumnRule] {
        &self.rules
    }

    /// Applies every rule in order. A rule naming a column the table lacks
    /// is an error.
    pub fn apply(&self, table: &mut ActivationTable) -> Result<(), ActError> {
        for rule in &self.rules {
            match &rule.action {
                ColumnAction::Drop => table.drop_column(&rule.column)?,
                ColumnAction::Rename(to) => table.rename_column(&rule.column, to)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    #[test]
    fn default_mapping_matches_output_schema() {
        let columns = [
            "time", "time_unit", "nuclide", "value", "variable", "var_unit", "block", "block_num",
        ];
        let mut table = ActivationTable::new(columns.iter().map(|c| c.to_string()).collect());
        table
            .push_row(vec![
                Cell::Integer(1),
                Cell::from("y"),
                Cell::from("h3"),
                Cell::Real(2.5),
                Cell::from("Number Density"),
                Cell::from("atoms/cm3"),
                Cell::from("Interval"),
                Cell::Integer(1),
            ])
            .unwrap();
        ColumnMapping::default().apply(&mut table).unwrap();
        assert_eq!(table.columns(), &["nuclide", "num_dens_(atoms/cm3)"]);
        assert_eq!(table.rows()[0], vec![Cell::from("h3"), Cell::Real(2.5)]);
    }
}
