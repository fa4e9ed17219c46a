//! Build system declaration and distribution file rules

use super::Requirement;
use serde::Serialize;

/// The `[build-system]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSystem {
    /// Requirements needed to run the backend
    pub requires: Vec<Requirement>,
    /// Import path of the backend (`hatchling.build`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

/// File rules for the wheel target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WheelTarget {
    /// Package directories copied into the wheel under their basename
    pub packages: Vec<String>,
}

/// File rules for the source distribution target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SdistTarget {
    /// Include rules; a leading `/` anchors the rule at the project root
    pub include: Vec<String>,
    /// Exclude rules, applied after includes
    pub exclude: Vec<String>,
}

/// Which files go into which distribution artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildTargets {
    pub wheel: WheelTarget,
    pub sdist: SdistTarget,
}

impl BuildTargets {
    /// Returns true if no rules are declared for either target
    pub fn is_empty(&self) -> bool {
        self.wheel.packages.is_empty()
            && self.sdist.include.is_empty()
            && self.sdist.exclude.is_empty()
    }
}

/// Distribution artifact kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Wheel,
    Sdist,
}

impl TargetKind {
    pub fn all() -> &'static [TargetKind] {
        &[TargetKind::Sdist, TargetKind::Wheel]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TargetKind::Wheel => "wheel",
            TargetKind::Sdist => "sdist",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
