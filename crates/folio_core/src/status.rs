//! Story lifecycle status and the allowed-transition table.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a story as it moves through the pipeline.
///
/// The happy path runs left to right:
///
/// ```text
/// planning -> building_spreads -> spreads_ready -> scenes_ready
///   -> needs_style -> generating_covers -> covers_ready -> done
/// ```
///
/// Every stage is additionally permitted to fall back to its pre-stage value
/// on hard failure, which is encoded in [`StoryStatus::allowed_predecessors`].
/// The status column is the coarse mutex of the pipeline: it is only ever
/// written through a single compare-and-set guarded by this table.
///
/// # Examples
///
/// ```
/// use folio_core::StoryStatus;
///
/// assert!(StoryStatus::SpreadsReady.is_allowed_from(StoryStatus::BuildingSpreads));
/// assert!(!StoryStatus::CoversReady.is_allowed_from(StoryStatus::Planning));
///
/// // Fallback edge: a failed planner run reverts to planning.
/// assert!(StoryStatus::Planning.is_allowed_from(StoryStatus::BuildingSpreads));
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Initial state: pages exist, nothing derived yet.
    #[display("planning")]
    Planning,
    /// SpreadPlanner run in flight.
    #[display("building_spreads")]
    BuildingSpreads,
    /// Spreads and page links persisted.
    #[display("spreads_ready")]
    SpreadsReady,
    /// Presence and scene rows persisted for every spread.
    #[display("scenes_ready")]
    ScenesReady,
    /// Waiting on an external style reference before cover generation.
    #[display("needs_style")]
    NeedsStyle,
    /// Cover fan-out dispatched; at least one cover URL still missing.
    #[display("generating_covers")]
    GeneratingCovers,
    /// Both cover URLs populated.
    #[display("covers_ready")]
    CoversReady,
    /// Dossier complete.
    #[display("done")]
    Done,
}

impl StoryStatus {
    /// Statuses from which a transition into `self` is permitted.
    ///
    /// Forward edges follow the pipeline order; backward edges are the
    /// per-stage failure fallbacks.
    pub fn allowed_predecessors(&self) -> &'static [StoryStatus] {
        match self {
            // Fallback target of a failed planner run.
            StoryStatus::Planning => &[StoryStatus::BuildingSpreads],
            StoryStatus::BuildingSpreads => &[StoryStatus::Planning, StoryStatus::SpreadsReady],
            // Forward from a planner run, or fallback from a failed scene run
            // that had already advanced (scene failures normally leave the
            // status untouched, but a crashed finalize reverts here).
            StoryStatus::SpreadsReady => &[StoryStatus::BuildingSpreads, StoryStatus::ScenesReady],
            StoryStatus::ScenesReady => &[StoryStatus::SpreadsReady, StoryStatus::NeedsStyle],
            StoryStatus::NeedsStyle => &[StoryStatus::ScenesReady, StoryStatus::GeneratingCovers],
            StoryStatus::GeneratingCovers => &[StoryStatus::NeedsStyle, StoryStatus::CoversReady],
            StoryStatus::CoversReady => &[StoryStatus::GeneratingCovers],
            StoryStatus::Done => &[StoryStatus::CoversReady],
        }
    }

    /// Check whether a transition `from -> self` is permitted.
    pub fn is_allowed_from(&self, from: StoryStatus) -> bool {
        self.allowed_predecessors().contains(&from)
    }

    /// Database column representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Planning => "planning",
            StoryStatus::BuildingSpreads => "building_spreads",
            StoryStatus::SpreadsReady => "spreads_ready",
            StoryStatus::ScenesReady => "scenes_ready",
            StoryStatus::NeedsStyle => "needs_style",
            StoryStatus::GeneratingCovers => "generating_covers",
            StoryStatus::CoversReady => "covers_ready",
            StoryStatus::Done => "done",
        }
    }
}

impl std::str::FromStr for StoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(StoryStatus::Planning),
            "building_spreads" => Ok(StoryStatus::BuildingSpreads),
            "spreads_ready" => Ok(StoryStatus::SpreadsReady),
            "scenes_ready" => Ok(StoryStatus::ScenesReady),
            "needs_style" => Ok(StoryStatus::NeedsStyle),
            "generating_covers" => Ok(StoryStatus::GeneratingCovers),
            "covers_ready" => Ok(StoryStatus::CoversReady),
            "done" => Ok(StoryStatus::Done),
            other => Err(format!("Unknown story status: {}", other)),
        }
    }
}
