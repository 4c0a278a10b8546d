//! Operations module
//!
//! Sync, removal, patching and ejection of vendored files

pub mod banner;
pub mod dependencies;
pub mod editor;
pub mod eject;
pub mod hooks;
pub mod patch;
pub mod remove;
pub mod source;
pub mod sync;

pub use eject::eject;
pub use patch::{apply_patch, create_diff};
pub use remove::remove_managed;
pub use source::fetch_source;
pub use sync::{SyncOperation, SyncReport, sync, sync_file};
