use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::QuadrantThresholds;

/// Impact/effort bucket of an initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    /// High impact, low effort
    QuickWin,
    /// High impact, high effort
    MajorProject,
    /// Low impact, low effort
    FillIn,
    /// Low impact, high effort
    TimeSink,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::QuickWin,
        Quadrant::MajorProject,
        Quadrant::FillIn,
        Quadrant::TimeSink,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::QuickWin => "Quick Win",
            Quadrant::MajorProject => "Major Project",
            Quadrant::FillIn => "Fill-in",
            Quadrant::TimeSink => "Time Sink",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether both axes fell inside a core band or one was resolved to the
/// nearest band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Core,
    Nearest,
}

/// Classify an impact/effort pair.
///
/// Impact is high at or above the midpoint of `[low_impact, high_impact)`
/// and effort is low at or below the midpoint of `(low_effort, high_effort)`.
/// With the default 4/7 thresholds both midpoints are 5.5, so:
///
/// | impact      | effort      | quadrant                  |
/// |-------------|-------------|---------------------------|
/// | ≥ 7         | ≤ 4         | QuickWin (core)           |
/// | ≥ 7         | ≥ 7         | MajorProject (core)       |
/// | < 4         | ≤ 4         | FillIn (core)             |
/// | < 4         | ≥ 7         | TimeSink (core)           |
/// | [5.5, 7)    | any         | high-impact side (nearest) |
/// | [4, 5.5)    | any         | low-impact side (nearest)  |
/// | any         | (4, 5.5]    | low-effort side (nearest)  |
/// | any         | (5.5, 7)    | high-effort side (nearest) |
pub fn classify_quadrant(impact: f64, effort: f64, thresholds: &QuadrantThresholds) -> (Quadrant, Placement) {
    let high_impact = impact >= thresholds.impact_split();
    let low_effort = effort <= thresholds.effort_split();

    let impact_core = impact >= thresholds.high_impact || impact < thresholds.low_impact;
    let effort_core = effort <= thresholds.low_effort || effort >= thresholds.high_effort;

    let quadrant = match (high_impact, low_effort) {
        (true, true) => Quadrant::QuickWin,
        (true, false) => Quadrant::MajorProject,
        (false, true) => Quadrant::FillIn,
        (false, false) => Quadrant::TimeSink,
    };
    let placement = if impact_core && effort_core {
        Placement::Core
    } else {
        Placement::Nearest
    };
    (quadrant, placement)
}
