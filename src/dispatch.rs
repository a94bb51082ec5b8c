use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::controller::{Controller, Event, SessionView};
use crate::session::{progress_display, ProgressCounter, Slot};

/// Result of one handled event, plus the view it left behind.
#[derive(Debug, Clone)]
pub struct Update {
    pub outcome: Result<(), String>,
    pub view: SessionView,
}

impl Update {
    /// Whether a pending figure computation is over.
    pub fn ends_computation(&self) -> bool {
        self.outcome.is_err() || self.view.figures.is_some() || !self.view.valid
    }
}

/// UI side of the dispatcher thread. The thread owns the controller, so
/// session state is only ever written from one place.
pub struct DispatcherHandle {
    events: Sender<Event>,
    updates: Receiver<Update>,
    progress: ProgressCounter,
    worker: Option<JoinHandle<()>>,
}

/// Start the dispatcher. `notify` runs after every handled event, typically
/// to request a repaint.
pub fn spawn(controller: Controller, notify: impl Fn() + Send + 'static) -> DispatcherHandle {
    let (event_tx, event_rx) = mpsc::channel::<Event>();
    let (update_tx, update_rx) = mpsc::channel::<Update>();
    let progress = controller.session().progress.clone();

    let worker = thread::spawn(move || run(controller, event_rx, update_tx, notify));

    DispatcherHandle {
        events: event_tx,
        updates: update_rx,
        progress,
        worker: Some(worker),
    }
}

fn run(
    mut controller: Controller,
    events: Receiver<Event>,
    updates: Sender<Update>,
    notify: impl Fn(),
) {
    // Blocks until the next event; ends when the UI drops its sender.
    while let Ok(first) = events.recv() {
        let mut queue = vec![first];
        loop {
            match events.try_recv() {
                Ok(event) => queue.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }

        for event in coalesce(queue) {
            let outcome = controller.handle(event).map_err(|e| e.to_string());
            let update = Update {
                outcome,
                view: controller.view(),
            };
            if updates.send(update).is_err() {
                log::debug!("UI gone, dispatcher stopping");
                return;
            }
            notify();
        }
    }
    log::debug!("Event channel closed, dispatcher stopping");
}

/// Drop uploads superseded by a later upload to the same slot. A mode change
/// or reset in between keeps both, since the earlier one lands in a
/// different session.
pub fn coalesce(queue: Vec<Event>) -> Vec<Event> {
    let superseded: Vec<bool> = (0..queue.len())
        .map(|i| {
            let Event::FilesUploaded { slot, .. } = &queue[i] else {
                return false;
            };
            for later in &queue[i + 1..] {
                match later {
                    Event::ModeSelected(_) | Event::ResetRequested => return false,
                    Event::FilesUploaded { slot: s, .. } if s == slot => return true,
                    _ => {}
                }
            }
            false
        })
        .collect();

    queue
        .into_iter()
        .zip(superseded)
        .filter_map(|(event, drop)| {
            if drop {
                if let Event::FilesUploaded { slot, batch, .. } = &event {
                    log::info!(
                        "Upload of {} file(s) to {} superseded before processing",
                        batch.len(),
                        slot_name(*slot)
                    );
                }
                None
            } else {
                Some(event)
            }
        })
        .collect()
}

fn slot_name(slot: Slot) -> &'static str {
    match slot {
        Slot::First => "slot 1",
        Slot::Second => "slot 2",
    }
}

impl DispatcherHandle {
    pub fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            log::error!("Dispatcher thread is not running, event dropped");
        }
    }

    /// Every update produced since the last call, oldest first.
    pub fn drain(&self) -> Vec<Update> {
        self.updates.try_iter().collect()
    }

    /// Progress bar value and label, read without waiting on the dispatcher.
    pub fn progress(&self) -> (u32, String) {
        progress_display(self.progress.get())
    }

    /// Close the event channel and wait for the thread to finish.
    pub fn shutdown(self) {
        let DispatcherHandle { events, worker, .. } = self;
        drop(events);
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::error!("Dispatcher thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use nalgebra::{Complex, DMatrix};

    use super::*;
    use crate::analysis::{AnalysisError, AnalysisLibrary, Atlas, Decomposition, MatchResult, ModeRow};
    use crate::data::payload::{UploadBatch, UploadedFile};
    use crate::session::Mode;

    fn upload(slot: Slot, name: &str) -> Event {
        Event::FilesUploaded {
            slot,
            batch: UploadBatch::new(vec![UploadedFile::from_bytes(name, b"1,2\n3,4\n")]),
            sampling_time: 1.0,
            approx_degree: 5,
        }
    }

    fn names(events: &[Event]) -> Vec<String> {
        events
            .iter()
            .map(|e| match e {
                Event::FilesUploaded { batch, .. } => batch.names().join(","),
                Event::ModeSelected(_) => "mode".to_string(),
                Event::ResetRequested => "reset".to_string(),
                _ => "other".to_string(),
            })
            .collect()
    }

    #[test]
    fn failed_update_ends_computation() {
        let valid = SessionView {
            valid: true,
            ..Default::default()
        };
        let pending = Update {
            outcome: Ok(()),
            view: valid.clone(),
        };
        assert!(!pending.ends_computation());

        let failed = Update {
            outcome: Err("radar needs a shared atlas".into()),
            view: valid,
        };
        assert!(failed.ends_computation());

        let rejected = Update {
            outcome: Ok(()),
            view: SessionView::default(),
        };
        assert!(rejected.ends_computation());
    }

    #[test]
    fn later_upload_supersedes_earlier() {
        let out = coalesce(vec![
            upload(Slot::First, "a.csv"),
            upload(Slot::Second, "b.csv"),
            upload(Slot::First, "c.csv"),
        ]);
        assert_eq!(names(&out), vec!["b.csv", "c.csv"]);
    }

    #[test]
    fn mode_change_or_reset_blocks_supersession() {
        let out = coalesce(vec![
            upload(Slot::First, "a.csv"),
            Event::ModeSelected(Some(Mode::Comparison)),
            upload(Slot::First, "b.csv"),
            Event::ResetRequested,
            upload(Slot::First, "c.csv"),
        ]);
        assert_eq!(names(&out), vec!["a.csv", "mode", "b.csv", "reset", "c.csv"]);
    }

    #[test]
    fn non_upload_events_pass_through() {
        let out = coalesce(vec![
            Event::RunRequested,
            Event::ImaginaryToggled(true),
            Event::RunRequested,
        ]);
        assert_eq!(out.len(), 3);
    }

    struct TinyLibrary;

    impl AnalysisLibrary for TinyLibrary {
        fn decompose(
            &self,
            data: Vec<DMatrix<f64>>,
            sampling_time: f64,
        ) -> Result<Decomposition, AnalysisError> {
            let regions = data[0].nrows();
            Ok(Decomposition::new(
                vec![ModeRow::from_eigenvalue(1, Complex::new(0.5, 0.0), sampling_time)],
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
            _modes: usize,
        ) -> Result<MatchResult, AnalysisError> {
            Err(AnalysisError::NoData)
        }
    }

    #[test]
    fn dispatcher_processes_events_in_order() {
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        let controller = Controller::new(Arc::new(TinyLibrary), ProgressCounter::default());
        let handle = spawn(controller, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        handle.send(Event::ModeSelected(Some(Mode::Analysis)));
        handle.send(upload(Slot::First, "a.csv"));
        handle.send(Event::RunRequested);

        let mut updates = Vec::new();
        for _ in 0..200 {
            updates.extend(handle.drain());
            if updates.last().is_some_and(|u: &Update| u.view.valid) {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let last = updates.last().unwrap();
        assert!(last.outcome.is_ok());
        assert!(last.view.valid);
        assert_eq!(last.view.files[0], vec!["a.csv".to_string()]);

        handle.shutdown();
        assert_eq!(notified.load(Ordering::SeqCst), 3);
    }
}
