//! Constraint violation reporting.

/// Which rule a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViolationKind {
    Boundary,
    Overlap,
    Setback,
    FireSeparation,
    Slope,
    Coverage,
    FloorAreaRatio,
}

impl ViolationKind {
    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::Boundary | ViolationKind::Overlap => Severity::Critical,
            ViolationKind::Setback | ViolationKind::FireSeparation => Severity::Major,
            ViolationKind::Slope | ViolationKind::Coverage | ViolationKind::FloorAreaRatio => Severity::Minor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    /// Multiplier applied to a violation's magnitude in the penalty sum.
    pub fn weight(self) -> f64 {
        match self {
            Severity::Critical => 3.0,
            Severity::Major => 2.0,
            Severity::Minor => 1.0,
        }
    }
}

/// A single named violation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Violation {
    pub kind: ViolationKind,
    /// Building ids involved (empty for site-wide rules).
    pub subjects: Vec<String>,
    /// Shortfall in the rule's native unit (meters, percent, ratio points).
    pub magnitude: f64,
}

impl Violation {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn weighted(&self) -> f64 {
        self.magnitude * self.severity().weight()
    }
}

/// All violations of one layout, with the derived penalty.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintReport {
    pub violations: Vec<Violation>,
    /// Severity-weighted sum of magnitudes.
    pub weighted_magnitude: f64,
    /// Penalty in `[0, cap)`.
    pub penalty: f64,
}

impl ConstraintReport {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn magnitude_of(&self, kind: ViolationKind) -> f64 {
        self.violations
            .iter()
            .filter(|v| v.kind == kind)
            .map(|v| v.magnitude)
            .sum()
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.violations.iter().map(Violation::severity).max()
    }

    /// Violations that mention the given building.
    pub fn involving<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations
            .iter()
            .filter(move |v| v.subjects.iter().any(|s| s == id))
    }
}
