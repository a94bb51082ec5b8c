use std::sync::Arc;
use std::time::Instant;

use eframe::egui;

use crate::analysis::AnalysisLibrary;
use crate::config::{AppConfig, Paths};
use crate::controller::{Controller, SessionView};
use crate::dispatch::{self, DispatcherHandle};
use crate::log_relay::LogRelay;
use crate::session::{ProgressCounter, Slot};
use crate::state::{Tab, UiState};
use crate::ui::{help, panels, plot, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    config: AppConfig,
    state: UiState,
    view: SessionView,
    dispatcher: Option<DispatcherHandle>,
    log: LogRelay,
    last_log_poll: Instant,
}

impl DashboardApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        paths: &Paths,
        library: Arc<dyn AnalysisLibrary>,
    ) -> Self {
        let controller = Controller::new(library, ProgressCounter::default());
        let ctx = cc.egui_ctx.clone();
        let dispatcher = dispatch::spawn(controller, move || ctx.request_repaint());

        let mut log = LogRelay::new(&paths.log_file);
        if let Err(e) = log.poll() {
            log::warn!("Could not read {}: {e}", log.path().display());
        }

        log::info!("Setting Application Layout");
        Self {
            state: UiState::new(&config),
            config,
            view: SessionView::default(),
            dispatcher: Some(dispatcher),
            log,
            last_log_poll: Instant::now(),
        }
    }

    fn receive_updates(&mut self) {
        let Some(dispatcher) = &self.dispatcher else {
            return;
        };
        for update in dispatcher.drain() {
            if let Err(e) = &update.outcome {
                log::debug!("Event failed: {e}");
            }
            if update.ends_computation() {
                self.state.computing = false;
            }
            self.view = update.view;
        }
    }

    fn send_events(&mut self) {
        let events = self.state.take_events();
        if let Some(dispatcher) = &self.dispatcher {
            for event in events {
                dispatcher.send(event);
            }
        }
    }

    fn poll_log(&mut self) {
        if self.last_log_poll.elapsed() < self.config.log_poll_interval() {
            return;
        }
        self.last_log_poll = Instant::now();
        if let Err(e) = self.log.poll() {
            log::warn!("Could not read {}: {e}", self.log.path().display());
        }
    }

    /// Files dropped on the window go to the region under the pointer, or to
    /// the first visible region.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let (dropped, pointer) = ctx.input(|i| {
            (
                i.raw.dropped_files.clone(),
                i.pointer.hover_pos().or(i.pointer.interact_pos()),
            )
        });
        if dropped.is_empty() {
            return;
        }
        let paths: Vec<_> = dropped.into_iter().filter_map(|f| f.path).collect();
        let slot = self.state.drop_target(pointer).or_else(|| {
            [Slot::First, Slot::Second]
                .into_iter()
                .find(|s| self.view.layout.upload_visible[s.index()] && self.view.upload_row_visible())
        });
        let Some(slot) = slot else {
            log::warn!("Dropped {} file(s) with no upload region open", paths.len());
            return;
        };
        if let Some(batch) = panels::batch_from_paths(&paths, &mut self.state) {
            self.state.upload(slot, batch);
        }
    }

    fn progress(&self) -> (u32, String) {
        self.dispatcher
            .as_ref()
            .map(DispatcherHandle::progress)
            .unwrap_or_default()
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive_updates();
        self.poll_log();
        self.handle_dropped_files(ctx);

        // ---- Top panel: title, help, reset ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state, &self.view, &self.config);
        });

        // ---- Left side panel: setting and selection ----
        egui::SidePanel::left("selection_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::selection_panel(ui, &mut self.state, &self.view);
            });

        // ---- Central panel: upload row and tabs ----
        let progress = self.progress();
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::upload_row(ui, &mut self.state, &self.view);
            ui.add_space(4.0);

            let labels = self.view.layout.tab_labels;
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.state.tab, Tab::Graphs, "Graphs");
                ui.selectable_value(&mut self.state.tab, Tab::Cortical, "Cortical Plots");
                ui.add_enabled_ui(self.view.table1.is_some(), |ui| {
                    ui.selectable_value(&mut self.state.tab, Tab::Table1, labels[0]);
                });
                ui.add_enabled_ui(self.view.table2.is_some(), |ui| {
                    ui.selectable_value(&mut self.state.tab, Tab::Table2, labels[1]);
                });
                ui.selectable_value(&mut self.state.tab, Tab::Log, "Log");
            });
            ui.separator();

            match self.state.tab {
                Tab::Graphs => plot::graphs_tab(ui, &mut self.state, &self.view),
                Tab::Cortical => plot::cortical_tab(ui, &mut self.state, &self.view, &progress),
                Tab::Table1 => tables::mode_table(
                    ui,
                    &mut self.state,
                    self.view.table1.as_deref(),
                    "table-1",
                ),
                Tab::Table2 => tables::mode_table(
                    ui,
                    &mut self.state,
                    self.view.table2.as_deref(),
                    "table-2",
                ),
                Tab::Log => tables::log_view(ui, self.log.lines()),
            }
        });

        help::help_window(ctx, &mut self.state);
        self.send_events();

        if self.state.computing {
            ctx.request_repaint_after(self.config.progress_poll_interval());
        } else {
            ctx.request_repaint_after(self.config.log_poll_interval());
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.shutdown();
        }
        log::info!("Application closed");
    }
}
