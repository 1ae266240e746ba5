//! CLI domain: parse, route and output only.

mod output;
mod parse;
mod route;

pub use output::{format_report, map_error};
pub use parse::{Cli, DEFAULT_VERSION_TAG};
pub use route::RunContext;
