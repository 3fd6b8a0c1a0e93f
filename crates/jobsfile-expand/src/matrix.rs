//! Matrix axis/option model and cartesian-product row enumeration.
//!
//! A matrix axis (e.g. `platform`) has one or more options (e.g. `linux`,
//! `windows`), and each option may itself be a comma-separated list of
//! aliases (e.g. `gcc-4.8, gcc`): the first alias is the option's canonical
//! name, used for job naming and `{placeholder}` substitution; every alias
//! is a valid match target for a conditional key's pattern.

use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::ExpandError;

/// One axis's declared options, each a non-empty list of aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub name: String,
    pub options: Vec<Vec<String>>,
}

/// The full matrix declared by a jobs-file document: one [`Axis`] per
/// declared dimension, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Matrix {
    axes: Vec<Axis>,
}

impl Matrix {
    pub fn new() -> Self {
        Matrix { axes: Vec::new() }
    }

    /// Builds a matrix from an ordered map of axis name -> list of options,
    /// where each option is a comma-separated alias string (e.g.
    /// `"gcc-4.8, gcc"`).
    pub fn from_raw(raw: IndexMap<String, Vec<String>>) -> Result<Self, ExpandError> {
        let mut axes = Vec::with_capacity(raw.len());
        for (name, values) in raw {
            if values.is_empty() {
                return Err(ExpandError::EmptyAxis(name));
            }
            let options = values
                .into_iter()
                .map(|value| {
                    value
                        .split(',')
                        .map(|alias| alias.trim().to_string())
                        .collect::<Vec<_>>()
                })
                .collect();
            axes.push(Axis { name, options });
        }
        Ok(Matrix { axes })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Names of axes that declared more than one option, i.e. the axes
    /// that actually distinguish one matrix row from another. Axes with
    /// exactly one option are omitted from job naming and the default
    /// per-job node label.
    pub fn multi_valued_axes(&self) -> Vec<String> {
        self.axes.iter().filter(|axis| axis.options.len() > 1).map(|axis| axis.name.clone()).collect()
    }

    /// Every alias ever declared for `axis_name`, used by the unmatchable-
    /// condition precheck.
    pub fn known_values(&self, axis_name: &str) -> Option<Vec<&str>> {
        self.axes.iter().find(|a| a.name == axis_name).map(|axis| {
            axis.options
                .iter()
                .flat_map(|aliases| aliases.iter().map(String::as_str))
                .collect()
        })
    }

    /// Enumerates every row of the matrix's cartesian product. An empty
    /// matrix produces exactly one row with no axis values, matching the
    /// original behavior where a jobs-file with no `matrix` key still
    /// compiles to a single job.
    pub fn rows(&self) -> Vec<MatrixRow> {
        if self.axes.is_empty() {
            return vec![MatrixRow {
                full: IndexMap::new(),
                simple: IndexMap::new(),
            }];
        }

        self.axes
            .iter()
            .map(|axis| axis.options.iter())
            .multi_cartesian_product()
            .map(|combination| {
                let mut full = IndexMap::new();
                let mut simple = IndexMap::new();
                for (axis, aliases) in self.axes.iter().zip(combination) {
                    full.insert(axis.name.clone(), aliases.join(","));
                    simple.insert(axis.name.clone(), aliases[0].clone());
                }
                MatrixRow { full, simple }
            })
            .collect()
    }
}

/// One row of the matrix's cartesian product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    /// axis name -> comma-joined aliases for the option chosen in this row.
    pub full: IndexMap<String, String>,
    /// axis name -> canonical (first) alias for the option chosen in this row.
    pub simple: IndexMap<String, String>,
}

impl MatrixRow {
    /// The aliases declared for `axis_name` in this row, used when matching
    /// a condition's pattern against every alias rather than just the
    /// canonical name.
    pub fn aliases(&self, axis_name: &str) -> Vec<&str> {
        self.full
            .get(axis_name)
            .map(|joined| joined.split(',').collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(name: &str, options: &[&str]) -> (String, Vec<String>) {
        (name.to_string(), options.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn empty_matrix_yields_single_row() {
        let matrix = Matrix::new();
        assert_eq!(matrix.rows().len(), 1);
    }

    #[test]
    fn single_axis_yields_one_row_per_option() {
        let mut raw = IndexMap::new();
        let (name, opts) = axis("platform", &["linux", "windows"]);
        raw.insert(name, opts);
        let matrix = Matrix::from_raw(raw).unwrap();
        assert_eq!(matrix.rows().len(), 2);
    }

    #[test]
    fn two_axes_yield_cartesian_product() {
        let mut raw = IndexMap::new();
        let (n1, o1) = axis("platform", &["linux", "windows"]);
        let (n2, o2) = axis("compiler", &["gcc", "msvc", "clang"]);
        raw.insert(n1, o1);
        raw.insert(n2, o2);
        let matrix = Matrix::from_raw(raw).unwrap();
        assert_eq!(matrix.rows().len(), 6);
    }

    #[test]
    fn aliases_split_by_comma_canonical_is_first() {
        let mut raw = IndexMap::new();
        let (name, opts) = axis("compiler", &["gcc-4.8, gcc"]);
        raw.insert(name, opts);
        let matrix = Matrix::from_raw(raw).unwrap();
        let row = &matrix.rows()[0];
        assert_eq!(row.simple["compiler"], "gcc-4.8");
        assert_eq!(row.aliases("compiler"), vec!["gcc-4.8", "gcc"]);
    }

    #[test]
    fn empty_axis_is_rejected() {
        let mut raw = IndexMap::new();
        raw.insert("platform".to_string(), Vec::new());
        assert_eq!(
            Matrix::from_raw(raw).unwrap_err(),
            ExpandError::EmptyAxis("platform".to_string())
        );
    }
}
