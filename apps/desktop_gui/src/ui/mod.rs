pub mod app;

pub use app::{OrderBoardApp, PersistedGuiSettings, SETTINGS_STORAGE_KEY};
