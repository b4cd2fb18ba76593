//! A directory-backed add-on host.
//!
//! Add-ons live as unpacked folders under one root, with the pending
//! install/remove bookkeeping persisted next to them as JSON.

mod host;
mod state;

pub use host::{FsAddonHost, PENDING_INSTALL_SUFFIX};
pub use state::{AddonsState, STATE_FILE_NAME, StateError};
