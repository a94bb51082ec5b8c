use eframe::egui::Rect;

use crate::config::AppConfig;
use crate::controller::Event;
use crate::session::{Mode, Slot};

// ---------------------------------------------------------------------------
// UI state
// ---------------------------------------------------------------------------

/// Tabs of the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Graphs,
    Cortical,
    Table1,
    Table2,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpWindow {
    General,
    Selection,
}

/// Form inputs and widget bookkeeping, independent of rendering. Session
/// data lives in the dispatcher; widgets only queue [`Event`]s here.
pub struct UiState {
    pub mode: Option<Mode>,
    pub sampling_time: f64,
    pub mode_count: usize,
    pub approx_degree: u32,
    pub show_imaginary: bool,

    pub tab: Tab,
    pub help: Option<HelpWindow>,

    /// Screen area of each upload region, for routing dropped files.
    pub drop_zones: [Option<Rect>; 2],

    /// Export or file picking problems, shown in the top bar.
    pub status_message: Option<String>,

    /// Figures were requested and have not arrived yet.
    pub computing: bool,

    outbox: Vec<Event>,
}

impl UiState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            mode: None,
            sampling_time: config.sampling_time,
            mode_count: config.mode_count,
            approx_degree: config.approx_degree,
            show_imaginary: false,
            tab: Tab::Graphs,
            help: Some(HelpWindow::General),
            drop_zones: [None, None],
            status_message: None,
            computing: false,
            outbox: Vec::new(),
        }
    }

    pub fn send(&mut self, event: Event) {
        self.outbox.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    pub fn select_mode(&mut self, mode: Option<Mode>) {
        if self.mode != mode {
            self.mode = mode;
            self.send(Event::ModeSelected(mode));
        }
    }

    pub fn upload(&mut self, slot: Slot, batch: crate::data::payload::UploadBatch) {
        let event = Event::FilesUploaded {
            slot,
            batch,
            sampling_time: self.sampling_time,
            approx_degree: self.approx_degree,
        };
        self.send(event);
    }

    pub fn sampling_time_changed(&mut self) {
        self.send(Event::SamplingTimeChanged {
            sampling_time: self.sampling_time,
            approx_degree: self.approx_degree,
        });
    }

    /// Validate, then build figures if validation passed.
    pub fn run(&mut self) {
        self.send(Event::RunRequested);
        self.request_figures();
    }

    pub fn request_figures(&mut self) {
        self.computing = true;
        self.send(Event::FiguresRequested {
            mode_count: self.mode_count,
        });
    }

    pub fn reset(&mut self, config: &AppConfig) {
        *self = Self {
            help: None,
            ..Self::new(config)
        };
        self.send(Event::ResetRequested);
    }

    /// Slot a file dropped at `pos` belongs to, if any region is under it.
    pub fn drop_target(&self, pos: Option<eframe::egui::Pos2>) -> Option<Slot> {
        let pos = pos?;
        [Slot::First, Slot::Second]
            .into_iter()
            .find(|slot| self.drop_zones[slot.index()].is_some_and(|r| r.contains(pos)))
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, Rect};

    use super::*;

    #[test]
    fn mode_selection_queues_once() {
        let mut state = UiState::new(&AppConfig::default());
        state.select_mode(Some(Mode::Analysis));
        state.select_mode(Some(Mode::Analysis));
        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::ModeSelected(Some(Mode::Analysis))));
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn run_queues_validation_then_figures() {
        let mut state = UiState::new(&AppConfig::default());
        state.mode_count = 3;
        state.run();
        let events = state.take_events();
        assert!(matches!(events[0], Event::RunRequested));
        assert!(matches!(events[1], Event::FiguresRequested { mode_count: 3 }));
        assert!(state.computing);
    }

    #[test]
    fn reset_restores_config_defaults() {
        let config = AppConfig::default();
        let mut state = UiState::new(&config);
        state.sampling_time = 2.0;
        state.select_mode(Some(Mode::Comparison));
        state.reset(&config);
        assert_eq!(state.sampling_time, 0.72);
        assert!(state.mode.is_none());
        assert!(state.help.is_none());
        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::ResetRequested));
    }

    #[test]
    fn drops_route_to_hovered_zone() {
        let mut state = UiState::new(&AppConfig::default());
        state.drop_zones = [
            Some(Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 50.0))),
            Some(Rect::from_min_max(pos2(110.0, 0.0), pos2(210.0, 50.0))),
        ];
        assert_eq!(state.drop_target(Some(pos2(10.0, 10.0))), Some(Slot::First));
        assert_eq!(state.drop_target(Some(pos2(150.0, 10.0))), Some(Slot::Second));
        assert_eq!(state.drop_target(Some(pos2(105.0, 10.0))), None);
        assert_eq!(state.drop_target(None), None);
    }
}
