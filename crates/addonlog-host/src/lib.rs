//! The host side of add-on installation, expressed as an explicit extension
//! point: the traits a host implements, the records it passes around, and the
//! registry through which plugins override the two install entry points.

mod error;
mod hooks;
pub mod messages;
mod stock;
mod traits;
mod types;

pub use error::HostError;
pub use hooks::{HookHandle, HookKind, HookRegistry};
pub use stock::{
    ON_INSTALL_TASK, StockBundleInstaller, StockPathInstaller, complete_bundle_install,
    open_bundle_or_report, replace_previous,
};
pub use traits::{AddonHost, BundleInstaller, Dialogs, PathInstaller};
pub use types::{Addon, AddonBundle, InstallOutcome};
