//! TNM staging value types and the derived stage group

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::error::StageParseError;

/// Primary tumor (T) category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TumorCategory {
    T0,
    /// Carcinoma in situ
    Tis,
    T1,
    T1a,
    T1b,
    T2,
    T3,
    T4,
    T4a,
    T4b,
    /// Primary tumor cannot be assessed
    Tx,
}

impl std::fmt::Display for TumorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TumorCategory::T0 => "T0",
            TumorCategory::Tis => "Tis",
            TumorCategory::T1 => "T1",
            TumorCategory::T1a => "T1a",
            TumorCategory::T1b => "T1b",
            TumorCategory::T2 => "T2",
            TumorCategory::T3 => "T3",
            TumorCategory::T4 => "T4",
            TumorCategory::T4a => "T4a",
            TumorCategory::T4b => "T4b",
            TumorCategory::Tx => "Tx",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TumorCategory {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_uppercase();
        let body = token.strip_prefix('T').unwrap_or(&token);
        match body {
            "0" => Ok(TumorCategory::T0),
            "IS" => Ok(TumorCategory::Tis),
            "1" => Ok(TumorCategory::T1),
            "1A" => Ok(TumorCategory::T1a),
            "1B" => Ok(TumorCategory::T1b),
            "2" => Ok(TumorCategory::T2),
            "3" => Ok(TumorCategory::T3),
            "4" => Ok(TumorCategory::T4),
            "4A" => Ok(TumorCategory::T4a),
            "4B" => Ok(TumorCategory::T4b),
            "X" => Ok(TumorCategory::Tx),
            _ => Err(StageParseError::UnknownTumor {
                raw: s.to_string(),
                token,
            }),
        }
    }
}

/// Regional lymph node (N) category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeCategory {
    N0,
    N1,
    N2,
    N3,
    N3a,
    N3b,
    /// Regional nodes cannot be assessed
    Nx,
}

impl std::fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeCategory::N0 => "N0",
            NodeCategory::N1 => "N1",
            NodeCategory::N2 => "N2",
            NodeCategory::N3 => "N3",
            NodeCategory::N3a => "N3a",
            NodeCategory::N3b => "N3b",
            NodeCategory::Nx => "Nx",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for NodeCategory {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_uppercase();
        let body = token.strip_prefix('N').unwrap_or(&token);
        match body {
            "0" => Ok(NodeCategory::N0),
            "1" => Ok(NodeCategory::N1),
            "2" => Ok(NodeCategory::N2),
            "3" => Ok(NodeCategory::N3),
            "3A" => Ok(NodeCategory::N3a),
            "3B" => Ok(NodeCategory::N3b),
            "X" => Ok(NodeCategory::Nx),
            _ => Err(StageParseError::UnknownNode {
                raw: s.to_string(),
                token,
            }),
        }
    }
}

/// Distant metastasis (M) category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetastasisCategory {
    M0,
    M1,
    M1a,
    M1b,
    Mx,
}

impl std::fmt::Display for MetastasisCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MetastasisCategory::M0 => "M0",
            MetastasisCategory::M1 => "M1",
            MetastasisCategory::M1a => "M1a",
            MetastasisCategory::M1b => "M1b",
            MetastasisCategory::Mx => "Mx",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for MetastasisCategory {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_uppercase();
        let body = token.strip_prefix('M').unwrap_or(&token);
        match body {
            "0" => Ok(MetastasisCategory::M0),
            "1" => Ok(MetastasisCategory::M1),
            "1A" => Ok(MetastasisCategory::M1a),
            "1B" => Ok(MetastasisCategory::M1b),
            "X" => Ok(MetastasisCategory::Mx),
            _ => Err(StageParseError::UnknownMetastasis {
                raw: s.to_string(),
                token,
            }),
        }
    }
}

/// Clinical stage group derived from a TNM triple
///
/// Ordering follows severity, with `Unknown` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageGroup {
    #[serde(rename = "Stage I")]
    I,
    #[serde(rename = "Stage II")]
    II,
    #[serde(rename = "Stage III")]
    III,
    #[serde(rename = "Stage IV")]
    IV,
    #[serde(rename = "Stage Unknown")]
    Unknown,
}

impl StageGroup {
    /// Numeric rank (1-4), `None` for an unknown group
    pub fn rank(self) -> Option<u8> {
        match self {
            StageGroup::I => Some(1),
            StageGroup::II => Some(2),
            StageGroup::III => Some(3),
            StageGroup::IV => Some(4),
            StageGroup::Unknown => None,
        }
    }
}

impl std::fmt::Display for StageGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageGroup::I => write!(f, "Stage I"),
            StageGroup::II => write!(f, "Stage II"),
            StageGroup::III => write!(f, "Stage III"),
            StageGroup::IV => write!(f, "Stage IV"),
            StageGroup::Unknown => write!(f, "Stage Unknown"),
        }
    }
}

/// A TNM staging triple
///
/// The stage group is always computed from the triple. On disk a staging
/// may be written either as a string (`T3N1M0`) or as a mapping with
/// `tumor`, `node` and `metastasis` keys; any `stage_group` key in the input
/// is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StagingRepr", into = "StagingRepr")]
pub struct TnmStaging {
    pub tumor: TumorCategory,
    pub node: NodeCategory,
    pub metastasis: MetastasisCategory,
}

impl TnmStaging {
    pub fn new(tumor: TumorCategory, node: NodeCategory, metastasis: MetastasisCategory) -> Self {
        Self {
            tumor,
            node,
            metastasis,
        }
    }

    /// Derive the stage group; the first matching rule wins
    pub fn stage_group(&self) -> StageGroup {
        use MetastasisCategory as M;
        use NodeCategory as N;
        use TumorCategory as T;

        if matches!(self.metastasis, M::M1 | M::M1a | M::M1b) {
            return StageGroup::IV;
        }
        if matches!(self.tumor, T::T4 | T::T4a | T::T4b)
            || matches!(self.node, N::N3 | N::N3a | N::N3b)
        {
            return StageGroup::III;
        }
        if matches!(self.tumor, T::T2 | T::T3) || matches!(self.node, N::N1 | N::N2) {
            return StageGroup::II;
        }
        if matches!(self.tumor, T::T1 | T::T1a | T::T1b) {
            return StageGroup::I;
        }
        StageGroup::Unknown
    }
}

impl std::fmt::Display for TnmStaging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.tumor, self.node, self.metastasis)
    }
}

impl FromStr for TnmStaging {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::analysis::stage_parser::parse_stage(s)
    }
}

/// Wire representation accepted for a staging field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StagingRepr {
    Text(String),
    Fields {
        tumor: TumorCategory,
        node: NodeCategory,
        metastasis: MetastasisCategory,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stage_group: Option<StageGroup>,
    },
}

impl TryFrom<StagingRepr> for TnmStaging {
    type Error = StageParseError;

    fn try_from(repr: StagingRepr) -> Result<Self, Self::Error> {
        match repr {
            StagingRepr::Text(s) => s.parse(),
            StagingRepr::Fields {
                tumor,
                node,
                metastasis,
                ..
            } => Ok(TnmStaging::new(tumor, node, metastasis)),
        }
    }
}

impl From<TnmStaging> for StagingRepr {
    fn from(staging: TnmStaging) -> Self {
        StagingRepr::Fields {
            tumor: staging.tumor,
            node: staging.node,
            metastasis: staging.metastasis,
            stage_group: Some(staging.stage_group()),
        }
    }
}
