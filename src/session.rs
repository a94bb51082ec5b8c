use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::analysis::{AnalysisLibrary, Atlas, Decomposition, MatchResult};
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// UI setting and upload slots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Analysis,
    Comparison,
    MatchModes,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Analysis => write!(f, "Analysis"),
            Mode::Comparison => write!(f, "Comparison"),
            Mode::MatchModes => write!(f, "Mode Matching"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage: which analysis objects exist for the current setting
// ---------------------------------------------------------------------------

pub type Shared = Arc<Decomposition>;

/// Match target and the result derived from it always exist together.
#[derive(Debug, Clone)]
pub struct Matched {
    pub target: Shared,
    pub result: Arc<MatchResult>,
}

#[derive(Debug, Clone, Default)]
pub enum Stage {
    #[default]
    Idle,
    Analysis {
        reference: Option<Shared>,
    },
    Comparison {
        reference: Option<Shared>,
        comparison: Option<Shared>,
    },
    Matching {
        reference: Option<Shared>,
        matched: Option<Matched>,
    },
}

impl Stage {
    /// Empty stage for `mode`, carrying `reference` over.
    pub fn for_mode(mode: Option<Mode>, reference: Option<Shared>) -> Self {
        match mode {
            None => Stage::Idle,
            Some(Mode::Analysis) => Stage::Analysis { reference },
            Some(Mode::Comparison) => Stage::Comparison {
                reference,
                comparison: None,
            },
            Some(Mode::MatchModes) => Stage::Matching {
                reference,
                matched: None,
            },
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        match self {
            Stage::Idle => None,
            Stage::Analysis { .. } => Some(Mode::Analysis),
            Stage::Comparison { .. } => Some(Mode::Comparison),
            Stage::Matching { .. } => Some(Mode::MatchModes),
        }
    }

    pub fn reference(&self) -> Option<&Shared> {
        match self {
            Stage::Idle => None,
            Stage::Analysis { reference }
            | Stage::Comparison { reference, .. }
            | Stage::Matching { reference, .. } => reference.as_ref(),
        }
    }

    pub fn comparison(&self) -> Option<&Shared> {
        match self {
            Stage::Comparison { comparison, .. } => comparison.as_ref(),
            _ => None,
        }
    }

    pub fn matched(&self) -> Option<&Matched> {
        match self {
            Stage::Matching { matched, .. } => matched.as_ref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress counter
// ---------------------------------------------------------------------------

/// Advisory progress shared between the dispatcher and the UI poll loop.
/// Stored as `f64` bits so fractional increments accumulate exactly as the
/// figure loop produces them.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter(Arc<AtomicU64>);

impl ProgressCounter {
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn add(&self, delta: f64) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Displayed percentage and label for an internal progress value:
/// `min(progress mod 110, 100)`, label blank below 5 %.
pub fn progress_display(progress: f64) -> (u32, String) {
    let shown = (progress.rem_euclid(110.0)).min(100.0).floor() as u32;
    let label = if shown >= 5 {
        format!("{shown} %")
    } else {
        String::new()
    };
    (shown, label)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Mode count used to approximate a match, from a percentage of the atlas.
pub fn approx_mode_count(degree: u32, atlas_size: usize) -> usize {
    degree.min(100) as usize * atlas_size / 100
}

/// The analysis objects currently loaded, owned by the controller.
#[derive(Debug, Default)]
pub struct Session {
    pub stage: Stage,
    /// Atlas of the most recently parsed batch.
    pub atlas: Option<Atlas>,
    pub progress: ProgressCounter,
    pub show_imaginary: bool,
    /// Inputs validated; figure computation may proceed.
    pub valid: bool,
}

impl Session {
    pub fn new(progress: ProgressCounter) -> Self {
        Session {
            progress,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        self.stage.mode()
    }

    pub fn reference(&self) -> Option<&Shared> {
        self.stage.reference()
    }

    pub fn comparison(&self) -> Option<&Shared> {
        self.stage.comparison()
    }

    pub fn match_target(&self) -> Option<&Shared> {
        self.stage.matched().map(|m| &m.target)
    }

    pub fn match_result(&self) -> Option<&Arc<MatchResult>> {
        self.stage.matched().map(|m| &m.result)
    }

    /// Switch setting. The reference survives; everything derived does not.
    pub fn set_mode(&mut self, mode: Option<Mode>) {
        if self.mode() == mode {
            return;
        }
        let reference = self.reference().cloned();
        self.stage = Stage::for_mode(mode, reference);
        self.valid = false;
    }

    /// Back to the empty state. The progress handle stays shared with the UI.
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.atlas = None;
        self.progress.set(0.0);
        self.show_imaginary = false;
        self.valid = false;
    }

    /// Match `target` onto the loaded reference, approximating with
    /// `degree` percent of the target atlas' regions as modes.
    pub fn compute_match(
        &self,
        library: &dyn AnalysisLibrary,
        target: &Decomposition,
        degree: u32,
    ) -> Result<MatchResult> {
        let reference = self.reference().ok_or(DashboardError::MissingReference)?;
        match_against(library, reference, target, degree)
    }
}

/// Match `target` onto an explicit `reference`, which need not be loaded yet.
pub fn match_against(
    library: &dyn AnalysisLibrary,
    reference: &Decomposition,
    target: &Decomposition,
    degree: u32,
) -> Result<MatchResult> {
    let atlas_size = target.atlas().size();
    let modes = approx_mode_count(degree, atlas_size);
    log::info!("Matching modes with {modes} reference modes ({degree} % of {atlas_size})");
    Ok(library.compute_match(reference, target, modes)?)
}
