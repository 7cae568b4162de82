pub mod fake_storage;
pub mod fixtures;
pub mod recording_view;

pub use fake_storage::{FakeStorage, FakeStorageStats, FakeWrite};
pub use recording_view::RecordingView;
