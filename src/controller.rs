use std::sync::Arc;

use crate::analysis::{AnalysisLibrary, Decomposition, ModeRow};
use crate::data::ingest::parse_batch;
use crate::data::payload::UploadBatch;
use crate::error::{DashboardError, Result};
use crate::figures::{self, FigureSet};
use crate::session::{
    Matched, Mode, ProgressCounter, Session, Slot, Stage, match_against, progress_display,
};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Every input the dashboard reacts to. Handled one at a time by
/// [`Controller::handle`].
#[derive(Debug, Clone)]
pub enum Event {
    ModeSelected(Option<Mode>),
    FilesUploaded {
        slot: Slot,
        batch: UploadBatch,
        sampling_time: f64,
        approx_degree: u32,
    },
    /// Re-ingest the batches already uploaded with a new sampling time.
    SamplingTimeChanged {
        sampling_time: f64,
        approx_degree: u32,
    },
    ImaginaryToggled(bool),
    RunRequested,
    FiguresRequested {
        mode_count: usize,
    },
    ResetRequested,
}

impl Event {
    /// Figure failures are reported next to the Run button, everything else
    /// under the file selection.
    fn reports_to_message_alert(&self) -> bool {
        matches!(self, Event::FiguresRequested { .. })
    }
}

// ---------------------------------------------------------------------------
// Per-mode layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ModeLayout {
    pub upload_visible: [bool; 2],
    pub approx_visible: bool,
    pub group_titles: [Option<&'static str>; 2],
    pub upload_prompts: [&'static str; 2],
    pub tab_labels: [&'static str; 2],
}

impl ModeLayout {
    pub fn for_mode(mode: Option<Mode>) -> Self {
        match mode {
            None => ModeLayout {
                upload_visible: [false, false],
                approx_visible: false,
                group_titles: [Some("Selected files"), None],
                upload_prompts: ["", ""],
                tab_labels: ["Group A", "Group B"],
            },
            Some(Mode::Analysis) => ModeLayout {
                upload_visible: [true, false],
                approx_visible: false,
                group_titles: [Some("Selected files"), None],
                upload_prompts: ["Drag and Drop or Select Files", ""],
                tab_labels: ["Modes", ""],
            },
            Some(Mode::Comparison) => ModeLayout {
                upload_visible: [true, true],
                approx_visible: false,
                group_titles: [Some("Group 1"), Some("Group 2")],
                upload_prompts: [
                    "Group 1: Drag and Drop or Select Files",
                    "Group 2: Drag and Drop or Select Files",
                ],
                tab_labels: ["Group 1", "Group 2"],
            },
            Some(Mode::MatchModes) => ModeLayout {
                upload_visible: [true, true],
                approx_visible: true,
                group_titles: [Some("Reference Group"), Some("Match Group")],
                upload_prompts: [
                    "Reference Group: Drag and Drop or Select Files",
                    "Match Group: Drag and Drop or Select Files",
                ],
                tab_labels: ["Reference", "Match"],
            },
        }
    }
}

impl Default for ModeLayout {
    fn default() -> Self {
        Self::for_mode(None)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Missing inputs found by a Run request, accumulated into one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deficiency(Vec<&'static str>);

impl Deficiency {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empty when nothing is missing.
    pub fn message(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let mut message: String = self.0.concat();
        message.push_str("Check log for more info.");
        message
    }
}

pub fn validate(session: &Session) -> Deficiency {
    let mut missing = Vec::new();
    match &session.stage {
        Stage::Idle => missing.push("No setting chosen. "),
        Stage::Analysis { reference } => {
            if reference.is_none() {
                missing.push("No file(s) chosen. ");
            }
        }
        Stage::Comparison {
            reference,
            comparison,
        } => {
            if comparison.is_none() {
                missing.push("Group 2 missing. ");
            } else if reference.is_none() {
                missing.push("Group 1 missing. ");
            }
        }
        Stage::Matching { reference, matched } => {
            if reference.is_none() {
                missing.push("Reference group missing. ");
            }
            if matched.is_none() {
                missing.push("Match group is loading. Please wait. ");
            }
        }
    }
    Deficiency(missing)
}

// ---------------------------------------------------------------------------
// View snapshot
// ---------------------------------------------------------------------------

/// Everything the renderer needs, detached from the session.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub mode: Option<Mode>,
    pub layout: ModeLayout,
    pub files: [Vec<String>; 2],
    pub skipped: [Vec<String>; 2],
    pub table1: Option<Vec<ModeRow>>,
    /// Comparison table or match table; the tab is disabled without it.
    pub table2: Option<Vec<ModeRow>>,
    pub import_alert: Option<String>,
    pub message_alert: Option<String>,
    pub valid: bool,
    pub show_imaginary: bool,
    pub atlas_name: Option<String>,
    pub figures: Option<Arc<FigureSet>>,
}

impl SessionView {
    /// The upload row hides once inputs are validated.
    pub fn upload_row_visible(&self) -> bool {
        !self.valid
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct Controller {
    session: Session,
    library: Arc<dyn AnalysisLibrary>,
    /// Last accepted batch per slot, kept for sampling-time changes.
    batches: [Option<UploadBatch>; 2],
    skipped: [Vec<String>; 2],
    import_alert: Option<String>,
    message_alert: Option<String>,
    figures: Option<Arc<FigureSet>>,
}

impl Controller {
    pub fn new(library: Arc<dyn AnalysisLibrary>, progress: ProgressCounter) -> Self {
        Controller {
            session: Session::new(progress),
            library,
            batches: [None, None],
            skipped: [Vec::new(), Vec::new()],
            import_alert: None,
            message_alert: None,
            figures: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Dispatch one event. Errors are logged and turned into an alert before
    /// being returned; the session is left as it was for the failing slot.
    pub fn handle(&mut self, event: Event) -> Result<()> {
        let to_message = event.reports_to_message_alert();

        let result = match event {
            Event::ModeSelected(mode) => {
                self.on_mode_selected(mode);
                Ok(())
            }
            Event::FilesUploaded {
                slot,
                batch,
                sampling_time,
                approx_degree,
            } => {
                self.import_alert = None;
                self.upload(slot, batch, sampling_time, approx_degree)
            }
            Event::SamplingTimeChanged {
                sampling_time,
                approx_degree,
            } => {
                self.import_alert = None;
                self.reingest(sampling_time, approx_degree)
            }
            Event::ImaginaryToggled(on) => {
                self.on_imaginary_toggled(on);
                Ok(())
            }
            Event::RunRequested => {
                self.on_run_requested();
                Ok(())
            }
            Event::FiguresRequested { mode_count } => self.on_figures_requested(mode_count),
            Event::ResetRequested => {
                self.on_reset();
                Ok(())
            }
        };

        if let Err(e) = &result {
            log::error!("{e} ({e:?})");
            let text = format!("{e} Check log for more info.");
            if to_message {
                self.message_alert = Some(text);
            } else {
                self.import_alert = Some(text);
            }
        }
        result
    }

    /// Displayed value and label of the progress bar.
    pub fn progress_tick(&self) -> (u32, String) {
        progress_display(self.session.progress.get())
    }

    pub fn view(&self) -> SessionView {
        let session = &self.session;
        let mode = session.mode();
        let table2 = session
            .comparison()
            .map(|d| d.table().to_vec())
            .or_else(|| session.match_result().map(|r| r.table.clone()));

        SessionView {
            mode,
            layout: ModeLayout::for_mode(mode),
            files: [
                self.batches[0].as_ref().map(UploadBatch::names).unwrap_or_default(),
                self.batches[1].as_ref().map(UploadBatch::names).unwrap_or_default(),
            ],
            skipped: self.skipped.clone(),
            table1: session.reference().map(|d| d.table().to_vec()),
            table2,
            import_alert: self.import_alert.clone(),
            message_alert: self.message_alert.clone(),
            valid: session.valid,
            show_imaginary: session.show_imaginary,
            atlas_name: session.atlas.as_ref().map(|a| a.name.clone()),
            figures: self.figures.clone(),
        }
    }

    // -- handlers --

    fn on_mode_selected(&mut self, mode: Option<Mode>) {
        if self.session.mode() == mode {
            return;
        }
        match mode {
            Some(m) => log::info!("Setting changed to {m}"),
            None => log::info!("Setting cleared"),
        }
        self.session.set_mode(mode);
        if mode.is_none() {
            self.batches[0] = None;
            self.skipped[0].clear();
        }
        self.batches[1] = None;
        self.skipped[1].clear();
        self.import_alert = None;
        self.message_alert = None;
        self.figures = None;
    }

    fn group_name(mode: Mode, slot: Slot) -> &'static str {
        match (mode, slot) {
            (Mode::Comparison, Slot::First) => "Group 1",
            (Mode::Comparison, Slot::Second) => "Group 2",
            (_, Slot::First) => "Reference Group",
            (_, Slot::Second) => "Match Group",
        }
    }

    fn upload(
        &mut self,
        slot: Slot,
        batch: UploadBatch,
        sampling_time: f64,
        approx_degree: u32,
    ) -> Result<()> {
        let mode = self.session.mode().ok_or(DashboardError::NoModeSelected)?;
        log::info!("Adding contents to {}.", Self::group_name(mode, slot));

        match (mode, slot) {
            (_, Slot::First) => {
                let ingested = parse_batch(&batch, sampling_time, self.library.as_ref())?;
                let reference = Arc::new(ingested.decomposition);

                // The old match was derived from the previous reference. The
                // retained Match Group is re-matched before anything is stored.
                let rematched = match (mode, self.batches[1].clone()) {
                    (Mode::MatchModes, Some(target)) => {
                        log::info!("Re-matching the Match Group against the new reference.");
                        let matched =
                            self.match_batch(&reference, &target, sampling_time, approx_degree)?;
                        Some((target, matched))
                    }
                    _ => None,
                };

                let atlas = reference.atlas().clone();
                match &mut self.session.stage {
                    Stage::Analysis { reference: r } | Stage::Comparison { reference: r, .. } => {
                        *r = Some(reference);
                    }
                    Stage::Matching { reference: r, matched } => {
                        *r = Some(reference);
                        *matched = None;
                    }
                    Stage::Idle => return Err(DashboardError::NoModeSelected),
                }
                self.session.atlas = Some(atlas);
                self.accept(slot, batch, ingested.skipped);

                if let Some((target, (matched, skipped))) = rematched {
                    self.commit_match(target, matched, skipped);
                }
                Ok(())
            }
            (Mode::Analysis, Slot::Second) => Err(DashboardError::SlotUnavailable),
            (Mode::Comparison, Slot::Second) => {
                let ingested = parse_batch(&batch, sampling_time, self.library.as_ref())?;
                let comparison = Arc::new(ingested.decomposition);
                self.session.atlas = Some(comparison.atlas().clone());
                if let Stage::Comparison { comparison: c, .. } = &mut self.session.stage {
                    *c = Some(comparison);
                }
                self.accept(slot, batch, ingested.skipped);
                Ok(())
            }
            (Mode::MatchModes, Slot::Second) => {
                let reference = self
                    .session
                    .reference()
                    .cloned()
                    .ok_or(DashboardError::MissingReference)?;
                let (matched, skipped) =
                    self.match_batch(&reference, &batch, sampling_time, approx_degree)?;
                self.commit_match(batch, matched, skipped);
                Ok(())
            }
        }
    }

    /// Parse a Match Group batch and match it onto `reference` without
    /// touching the session.
    fn match_batch(
        &self,
        reference: &Decomposition,
        batch: &UploadBatch,
        sampling_time: f64,
        approx_degree: u32,
    ) -> Result<(Matched, Vec<String>)> {
        let ingested = parse_batch(batch, sampling_time, self.library.as_ref())?;
        let target = Arc::new(ingested.decomposition);
        let result = match_against(self.library.as_ref(), reference, &target, approx_degree)?;
        let matched = Matched {
            target,
            result: Arc::new(result),
        };
        Ok((matched, ingested.skipped))
    }

    fn commit_match(&mut self, batch: UploadBatch, matched: Matched, skipped: Vec<String>) {
        self.session.atlas = Some(matched.target.atlas().clone());
        if let Stage::Matching { matched: m, .. } = &mut self.session.stage {
            *m = Some(matched);
        }
        self.accept(Slot::Second, batch, skipped);
    }

    /// Record a batch that made it into the session.
    fn accept(&mut self, slot: Slot, batch: UploadBatch, skipped: Vec<String>) {
        if !skipped.is_empty() {
            self.import_alert = Some(format!(
                "Skipped unsupported file(s): {}",
                skipped.join(", ")
            ));
        }
        self.skipped[slot.index()] = skipped;
        self.batches[slot.index()] = Some(batch);
    }

    /// Every retained batch is attempted. The first failure is reported and
    /// the slots that failed keep their previous data.
    fn reingest(&mut self, sampling_time: f64, approx_degree: u32) -> Result<()> {
        let mut first_error = None;
        if let Some(batch) = self.batches[0].clone() {
            // Slot 1 re-matches slot 2 itself in MatchModes.
            if let Err(e) = self.upload(Slot::First, batch, sampling_time, approx_degree) {
                first_error = Some(e);
            } else if self.session.mode() == Some(Mode::MatchModes) {
                return Ok(());
            }
        }
        if let Some(batch) = self.batches[1].clone() {
            if let Err(e) = self.upload(Slot::Second, batch, sampling_time, approx_degree) {
                if first_error.is_some() {
                    log::error!("Re-ingesting the second slot also failed: {e}");
                } else {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn on_imaginary_toggled(&mut self, on: bool) {
        self.session.show_imaginary = on;
        if on {
            log::info!("Plotting imaginary values");
        } else {
            log::info!("Not plotting imaginary values");
        }
    }

    fn on_run_requested(&mut self) {
        let deficiency = validate(&self.session);
        if deficiency.is_empty() {
            log::info!("Inputs validated");
            self.session.valid = true;
            self.message_alert = None;
        } else {
            let message = deficiency.message();
            log::warn!("{message}");
            self.message_alert = Some(message);
        }
    }

    fn on_figures_requested(&mut self, mode_count: usize) -> Result<()> {
        self.message_alert = None;
        match figures::compute(&self.session, mode_count)? {
            Some(set) => self.figures = Some(Arc::new(set)),
            None => log::debug!("Figures requested before validation, ignored"),
        }
        Ok(())
    }

    fn on_reset(&mut self) {
        log::info!("Resetting application");
        self.session.reset();
        self.batches = [None, None];
        self.skipped = [Vec::new(), Vec::new()];
        self.import_alert = None;
        self.message_alert = None;
        self.figures = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use nalgebra::{Complex, DMatrix};

    use super::*;
    use crate::analysis::{AnalysisError, Atlas, Decomposition, MatchResult};
    use crate::data::payload::UploadedFile;

    /// Decomposes into a one-mode result sized by the input; records the
    /// match mode counts it was asked for.
    #[derive(Default)]
    struct FakeLibrary {
        match_calls: Mutex<Vec<usize>>,
        /// Matches fail once this many have succeeded.
        fail_match_after: Option<usize>,
        /// Decomposing a table with this many rows fails.
        fail_regions: Mutex<Option<usize>>,
    }

    impl AnalysisLibrary for FakeLibrary {
        fn decompose(
            &self,
            data: Vec<DMatrix<f64>>,
            sampling_time: f64,
        ) -> std::result::Result<Decomposition, AnalysisError> {
            let regions = data[0].nrows();
            if *self.fail_regions.lock().unwrap() == Some(regions) {
                return Err(AnalysisError::Numerical("rank deficient".into()));
            }
            Ok(Decomposition::new(
                vec![ModeRow::from_eigenvalue(1, Complex::new(0.9, 0.2), sampling_time)],
                Atlas::for_regions(regions),
                DMatrix::identity(regions, regions),
                sampling_time,
                data[0].ncols(),
            ))
        }

        fn compute_match(
            &self,
            _reference: &Decomposition,
            _target: &Decomposition,
            modes: usize,
        ) -> std::result::Result<MatchResult, AnalysisError> {
            let mut calls = self.match_calls.lock().unwrap();
            if self.fail_match_after.is_some_and(|n| calls.len() >= n) {
                return Err(AnalysisError::Numerical("singular basis".into()));
            }
            calls.push(modes);
            Ok(MatchResult {
                table: vec![ModeRow::from_eigenvalue(1, Complex::new(0.8, 0.0), 1.0)],
                approximated: vec![0.8],
                real: vec![0.9],
            })
        }
    }

    fn controller() -> Controller {
        Controller::new(Arc::new(FakeLibrary::default()), ProgressCounter::default())
    }

    /// Well-formed 10 × 10 numeric table.
    fn csv_batch(name: &str) -> UploadBatch {
        csv_batch_with_rows(name, 10)
    }

    fn csv_batch_with_rows(name: &str, rows: usize) -> UploadBatch {
        let mut text = String::new();
        for r in 0..rows {
            let row: Vec<String> = (0..10).map(|c| format!("{}", (r * 10 + c) as f64 * 0.5)).collect();
            text.push_str(&row.join(","));
            text.push('\n');
        }
        UploadBatch::new(vec![UploadedFile::from_bytes(name, text.as_bytes())])
    }

    fn upload(c: &mut Controller, slot: Slot, name: &str) -> Result<()> {
        c.handle(Event::FilesUploaded {
            slot,
            batch: csv_batch(name),
            sampling_time: 0.72,
            approx_degree: 50,
        })
    }

    #[test]
    fn analysis_upload_then_run() {
        let mut c = controller();
        c.handle(Event::ModeSelected(Some(Mode::Analysis))).unwrap();
        upload(&mut c, Slot::First, "subject.csv").unwrap();

        assert!(c.session().reference().is_some());
        assert!(!c.session().valid);
        assert_eq!(c.session().atlas.as_ref().unwrap().size(), 10);

        c.handle(Event::RunRequested).unwrap();
        assert!(c.session().valid);
        let view = c.view();
        assert!(view.message_alert.is_none());
        assert!(!view.upload_row_visible());
        assert_eq!(view.files[0], vec!["subject.csv".to_string()]);
        assert!(view.table1.is_some());
        assert!(view.table2.is_none());
    }

    #[test]
    fn match_before_reference_is_rejected() {
        let mut c = controller();
        c.handle(Event::ModeSelected(Some(Mode::MatchModes))).unwrap();
        let err = upload(&mut c, Slot::Second, "match.csv").unwrap_err();

        assert!(matches!(err, DashboardError::MissingReference));
        assert!(c.session().match_target().is_none());
        assert!(c.view().files[1].is_empty());
        assert!(c.view().import_alert.unwrap().ends_with("Check log for more info."));
    }

    #[test]
    fn match_after_reference_populates_result() {
        let library = Arc::new(FakeLibrary::default());
        let mut c = Controller::new(library.clone(), ProgressCounter::default());
        c.handle(Event::ModeSelected(Some(Mode::MatchModes))).unwrap();
        upload(&mut c, Slot::First, "ref.csv").unwrap();
        upload(&mut c, Slot::Second, "match.csv").unwrap();

        assert!(c.session().match_target().is_some());
        assert!(c.session().match_result().is_some());
        // 50 % of a 10-region atlas.
        assert_eq!(*library.match_calls.lock().unwrap(), vec![5]);
        assert_eq!(c.view().table2.unwrap().len(), 1);

        c.handle(Event::RunRequested).unwrap();
        assert!(c.session().valid);
    }

    #[test]
    fn failed_match_leaves_slot_untouched() {
        let library = Arc::new(FakeLibrary {
            fail_match_after: Some(0),
            ..Default::default()
        });
        let mut c = Controller::new(library, ProgressCounter::default());
        c.handle(Event::ModeSelected(Some(Mode::MatchModes))).unwrap();
        upload(&mut c, Slot::First, "ref.csv").unwrap();
        let err = upload(&mut c, Slot::Second, "match.csv").unwrap_err();

        assert!(matches!(err, DashboardError::AnalysisLibraryFailure(_)));
        assert!(c.session().match_target().is_none());
        assert!(c.session().reference().is_some());
    }

    #[test]
    fn slot_two_in_analysis_is_unavailable() {
        let mut c = controller();
        c.handle(Event::ModeSelected(Some(Mode::Analysis))).unwrap();
        assert!(matches!(
            upload(&mut c, Slot::Second, "x.csv"),
            Err(DashboardError::SlotUnavailable)
        ));
    }

    #[test]
    fn upload_without_mode_is_rejected() {
        let mut c = controller();
        assert!(matches!(
            upload(&mut c, Slot::First, "x.csv"),
            Err(DashboardError::NoModeSelected)
        ));
    }

    #[test]
    fn parse_error_keeps_previous_reference() {
        let mut c = controller();
        c.handle(Event::ModeSelected(Some(Mode::Analysis))).unwrap();
        upload(&mut c, Slot::First, "good.csv").unwrap();
        let before = c.session().reference().cloned().unwrap();

        let bad = UploadBatch::new(vec![UploadedFile::from_bytes("bad.csv", b"")]);
        let err = c
            .handle(Event::FilesUploaded {
                slot: Slot::First,
                batch: bad,
                sampling_time: 0.72,
                approx_degree: 5,
            })
            .unwrap_err();
        assert!(matches!(err, DashboardError::MalformedCsv { .. }));
        assert!(Arc::ptr_eq(c.session().reference().unwrap(), &before));
        assert_eq!(c.view().files[0], vec!["good.csv".to_string()]);
    }

    #[test]
    fn validation_messages_accumulate() {
        let mut c = controller();
        c.handle(Event::RunRequested).unwrap();
        assert_eq!(
            c.view().message_alert.as_deref(),
            Some("No setting chosen. Check log for more info.")
        );

        c.handle(Event::ModeSelected(Some(Mode::MatchModes))).unwrap();
        c.handle(Event::RunRequested).unwrap();
        assert_eq!(
            c.view().message_alert.as_deref(),
            Some("Reference group missing. Match group is loading. Please wait. Check log for more info.")
        );
        assert!(!c.session().valid);

        c.handle(Event::ModeSelected(Some(Mode::Comparison))).unwrap();
        upload(&mut c, Slot::First, "a.csv").unwrap();
        c.handle(Event::RunRequested).unwrap();
        assert_eq!(
            c.view().message_alert.as_deref(),
            Some("Group 2 missing. Check log for more info.")
        );
    }

    #[test]
    fn comparison_and_match_are_exclusive() {
        let mut c = controller();
        c.handle(Event::ModeSelected(Some(Mode::Comparison))).unwrap();
        upload(&mut c, Slot::First, "a.csv").unwrap();
        upload(&mut c, Slot::Second, "b.csv").unwrap();
        assert!(c.session().comparison().is_some());

        c.handle(Event::ModeSelected(Some(Mode::MatchModes))).unwrap();
        assert!(c.session().comparison().is_none());
        assert!(c.session().reference().is_some());
        assert!(c.view().files[1].is_empty());
        assert!(c.view().table2.is_none());
    }

    #[test]
    fn figures_are_gated_on_validation() {
        let mut c = controller();
        c.handle(Event::ModeSelected(Some(Mode::Analysis))).unwrap();
        upload(&mut c, Slot::First, "a.csv").unwrap();

        c.handle(Event::FiguresRequested { mode_count: 1 }).unwrap();
        assert!(c.view().figures.is_none());

        c.handle(Event::RunRequested).unwrap();
        c.handle(Event::FiguresRequested { mode_count: 1 }).unwrap();
        assert!(c.view().figures.is_some());
        assert_eq!(c.progress_tick(), (100, "100 %".to_string()));
    }

    #[test]
    fn sampling_time_change_reingests() {
        let mut c = controller();
        c.handle(Event::ModeSelected(Some(Mode::Comparison))).unwrap();
        upload(&mut c, Slot::First, "a.csv").unwrap();
        upload(&mut c, Slot::Second, "b.csv").unwrap();

        c.handle(Event::SamplingTimeChanged {
            sampling_time: 2.0,
            approx_degree: 5,
        })
        .unwrap();
        assert_eq!(c.session().reference().unwrap().sampling_time(), 2.0);
        assert_eq!(c.session().comparison().unwrap().sampling_time(), 2.0);
    }

    #[test]
    fn new_reference_rematches_target() {
        let library = Arc::new(FakeLibrary::default());
        let mut c = Controller::new(library.clone(), ProgressCounter::default());
        c.handle(Event::ModeSelected(Some(Mode::MatchModes))).unwrap();
        upload(&mut c, Slot::First, "ref.csv").unwrap();
        upload(&mut c, Slot::Second, "match.csv").unwrap();
        upload(&mut c, Slot::First, "ref2.csv").unwrap();

        assert!(c.session().match_result().is_some());
        assert_eq!(library.match_calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn failed_rematch_keeps_previous_reference_and_match() {
        let library = Arc::new(FakeLibrary {
            fail_match_after: Some(1),
            ..Default::default()
        });
        let mut c = Controller::new(library, ProgressCounter::default());
        c.handle(Event::ModeSelected(Some(Mode::MatchModes))).unwrap();
        upload(&mut c, Slot::First, "ref.csv").unwrap();
        upload(&mut c, Slot::Second, "match.csv").unwrap();
        let reference = c.session().reference().cloned().unwrap();
        let result = c.session().match_result().cloned().unwrap();

        let err = upload(&mut c, Slot::First, "ref2.csv").unwrap_err();
        assert!(matches!(err, DashboardError::AnalysisLibraryFailure(_)));
        assert!(Arc::ptr_eq(c.session().reference().unwrap(), &reference));
        assert!(Arc::ptr_eq(c.session().match_result().unwrap(), &result));
        let view = c.view();
        assert_eq!(view.files[0], vec!["ref.csv".to_string()]);
        assert_eq!(view.files[1], vec!["match.csv".to_string()]);
        assert!(view.import_alert.unwrap().ends_with("Check log for more info."));
    }

    #[test]
    fn sampling_time_change_updates_second_slot_when_first_fails() {
        let library = Arc::new(FakeLibrary::default());
        let mut c = Controller::new(library.clone(), ProgressCounter::default());
        c.handle(Event::ModeSelected(Some(Mode::Comparison))).unwrap();
        c.handle(Event::FilesUploaded {
            slot: Slot::First,
            batch: csv_batch_with_rows("a.csv", 12),
            sampling_time: 0.72,
            approx_degree: 50,
        })
        .unwrap();
        upload(&mut c, Slot::Second, "b.csv").unwrap();

        *library.fail_regions.lock().unwrap() = Some(12);
        let err = c
            .handle(Event::SamplingTimeChanged {
                sampling_time: 2.0,
                approx_degree: 50,
            })
            .unwrap_err();
        assert!(matches!(err, DashboardError::AnalysisLibraryFailure(_)));
        assert_eq!(c.session().reference().unwrap().sampling_time(), 0.72);
        assert_eq!(c.session().comparison().unwrap().sampling_time(), 2.0);
        assert!(c.view().import_alert.is_some());
    }

    #[test]
    fn reset_clears_everything() {
        let mut c = controller();
        c.handle(Event::ModeSelected(Some(Mode::Analysis))).unwrap();
        upload(&mut c, Slot::First, "a.csv").unwrap();
        c.handle(Event::ImaginaryToggled(true)).unwrap();
        c.handle(Event::RunRequested).unwrap();

        c.handle(Event::ResetRequested).unwrap();
        let view = c.view();
        assert!(view.mode.is_none());
        assert!(view.table1.is_none());
        assert!(view.files[0].is_empty());
        assert!(!view.valid);
        assert!(!view.show_imaginary);
        assert_eq!(view.layout, ModeLayout::for_mode(None));
    }

    #[test]
    fn layout_follows_mode() {
        let analysis = ModeLayout::for_mode(Some(Mode::Analysis));
        assert_eq!(analysis.upload_visible, [true, false]);
        assert!(!analysis.approx_visible);

        let matching = ModeLayout::for_mode(Some(Mode::MatchModes));
        assert_eq!(matching.upload_visible, [true, true]);
        assert!(matching.approx_visible);
        assert_eq!(matching.tab_labels, ["Reference", "Match"]);

        let none = ModeLayout::for_mode(None);
        assert_eq!(none.upload_visible, [false, false]);
        assert!(!none.approx_visible);
    }
}
