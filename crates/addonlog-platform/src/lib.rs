mod codepage;
mod paths;

pub use codepage::decode_oem;
pub use paths::{AppPaths, AppPathsError};
