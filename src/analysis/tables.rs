//! Shared staging lookup tables
//!
//! Point tables, numeric orderings and stage-class predicates used by more
//! than one analyzer. Every table is an exhaustive match so adding a TNM
//! category fails to compile until each table handles it.

use crate::entities::staging::{MetastasisCategory, NodeCategory, TumorCategory};

impl TumorCategory {
    /// Surgical risk points contributed by the tumor category
    pub fn surgical_risk_points(self) -> f64 {
        match self {
            TumorCategory::T0 | TumorCategory::T1 | TumorCategory::T1a => 5.0,
            TumorCategory::T1b => 10.0,
            TumorCategory::T2 => 20.0,
            TumorCategory::T3 => 40.0,
            TumorCategory::T4 | TumorCategory::T4a => 60.0,
            TumorCategory::T4b => 80.0,
            TumorCategory::Tis | TumorCategory::Tx => 30.0,
        }
    }

    /// Ordering used to detect downstaging (subdivisions sort within a major)
    pub fn numeric_order(self) -> f64 {
        match self {
            TumorCategory::T0 => 0.0,
            TumorCategory::Tis => 0.5,
            TumorCategory::T1 => 1.0,
            TumorCategory::T1a => 1.1,
            TumorCategory::T1b => 1.2,
            TumorCategory::T2 => 2.0,
            TumorCategory::T3 => 3.0,
            TumorCategory::T4 => 4.0,
            TumorCategory::T4a => 4.1,
            TumorCategory::T4b => 4.2,
            TumorCategory::Tx => 0.0,
        }
    }

    /// Major T number, `None` when the tumor was not assessed
    pub fn major(self) -> Option<u8> {
        match self {
            TumorCategory::T0 | TumorCategory::Tis => Some(0),
            TumorCategory::T1 | TumorCategory::T1a | TumorCategory::T1b => Some(1),
            TumorCategory::T2 => Some(2),
            TumorCategory::T3 => Some(3),
            TumorCategory::T4 | TumorCategory::T4a | TumorCategory::T4b => Some(4),
            TumorCategory::Tx => None,
        }
    }

    /// T1, T1a or T1b
    pub fn is_t1_class(self) -> bool {
        matches!(
            self,
            TumorCategory::T1 | TumorCategory::T1a | TumorCategory::T1b
        )
    }

    /// T4, T4a or T4b
    pub fn is_t4_class(self) -> bool {
        matches!(
            self,
            TumorCategory::T4 | TumorCategory::T4a | TumorCategory::T4b
        )
    }

    /// Locally advanced: T3 or any T4
    pub fn is_advanced(self) -> bool {
        self == TumorCategory::T3 || self.is_t4_class()
    }
}

impl NodeCategory {
    /// Surgical risk points contributed by the node category
    pub fn surgical_risk_points(self) -> f64 {
        match self {
            NodeCategory::N0 => 5.0,
            NodeCategory::N1 => 15.0,
            NodeCategory::N2 => 30.0,
            NodeCategory::N3 | NodeCategory::N3a => 50.0,
            NodeCategory::N3b => 70.0,
            NodeCategory::Nx => 25.0,
        }
    }

    pub fn numeric_order(self) -> f64 {
        match self {
            NodeCategory::N0 => 0.0,
            NodeCategory::N1 => 1.0,
            NodeCategory::N2 => 2.0,
            NodeCategory::N3 => 3.0,
            NodeCategory::N3a => 3.1,
            NodeCategory::N3b => 3.2,
            NodeCategory::Nx => 0.0,
        }
    }

    /// N3, N3a or N3b
    pub fn is_n3_class(self) -> bool {
        matches!(self, NodeCategory::N3 | NodeCategory::N3a | NodeCategory::N3b)
    }

    /// N2 or any N3
    pub fn is_extensive(self) -> bool {
        self == NodeCategory::N2 || self.is_n3_class()
    }

    /// N0 or N1
    pub fn is_limited(self) -> bool {
        matches!(self, NodeCategory::N0 | NodeCategory::N1)
    }

    /// Any assessed nodal involvement
    pub fn is_positive(self) -> bool {
        !matches!(self, NodeCategory::N0 | NodeCategory::Nx)
    }
}

impl MetastasisCategory {
    /// M1, M1a or M1b
    pub fn is_metastatic(self) -> bool {
        matches!(
            self,
            MetastasisCategory::M1 | MetastasisCategory::M1a | MetastasisCategory::M1b
        )
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Median of an unsorted sample; mean of the middle pair for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
