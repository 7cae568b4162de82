use sqlgrid_core::{GridEvent, GridView};
use std::sync::{Arc, Mutex, MutexGuard};

/// [`GridView`] that keeps every event it receives.
///
/// Clones share one event log, so a test can hand one clone to the grid and
/// inspect another.
#[derive(Clone, Default)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<GridEvent>>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn GridView> {
        Box::new(self.clone())
    }

    pub fn events(&self) -> Vec<GridEvent> {
        lock(&self.events).clone()
    }

    /// Events that changed the row count.
    pub fn count_changes(&self) -> Vec<GridEvent> {
        lock(&self.events)
            .iter()
            .filter(|event| !matches!(event, GridEvent::Refresh))
            .cloned()
            .collect()
    }

    pub fn refresh_count(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|event| matches!(event, GridEvent::Refresh))
            .count()
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl GridView for RecordingView {
    fn handle_event(&mut self, event: &GridEvent) {
        lock(&self.events).push(event.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}
