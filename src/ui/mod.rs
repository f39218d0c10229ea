//! Status output for the CLI
//!
//! Status lines go to stderr so that stdout stays free for entry bytes
//! (`buildcache get KEY > file`). Styling is dropped when stderr is not a
//! terminal or when running in CI.

mod context;
mod output;

pub use context::UiContext;
pub use output::{step_ok_detail, step_warn};
