//! Per-class metric values.

use std::fmt;

/// Metric names in reporting order.
pub const METRIC_NAMES: [&str; 7] = ["wmc", "dit", "noc", "cbo", "rfc", "ca", "npm"];

/// Object-oriented design metrics for one class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassMetrics {
    /// Weighted methods per class (unit weight per declared method)
    pub wmc: usize,
    /// Depth of inheritance tree
    pub dit: usize,
    /// Number of direct subclasses among the analyzed classes
    pub noc: usize,
    /// Coupling between object classes, both directions
    pub cbo: usize,
    /// Response for a class
    pub rfc: usize,
    /// Afferent couplings
    pub ca: usize,
    /// Number of public methods
    pub npm: usize,
}

impl ClassMetrics {
    /// Values in the order of [`METRIC_NAMES`].
    pub fn values(&self) -> [usize; 7] {
        [
            self.wmc, self.dit, self.noc, self.cbo, self.rfc, self.ca, self.npm,
        ]
    }
}

impl fmt::Display for ClassMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_values_in_reporting_order() {
        let metrics = ClassMetrics {
            wmc: 3,
            dit: 1,
            noc: 0,
            cbo: 2,
            rfc: 7,
            ca: 1,
            npm: 2,
        };
        assert_eq!(metrics.to_string(), "3 1 0 2 7 1 2");
        assert_eq!(metrics.values().len(), METRIC_NAMES.len());
    }
}
