mod banner;
mod error;
mod progress;
mod tables;

use std::io::{self, IsTerminal};

pub use banner::{banner_for_help, print_banner};
pub use error::print_error;
pub use progress::Progress;
pub use tables::{print_edge_table, print_element_distribution, print_graph_info, print_summary};

/// How much decoration the terminal can take.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Banner and progress go to stderr only when it is a terminal.
    pub interactive: bool,
}

impl Context {
    pub fn detect() -> Self {
        Self {
            interactive: io::stderr().is_terminal(),
        }
    }

    /// `--quiet` turns an interactive context into a plain one.
    pub fn with_quiet(self, quiet: bool) -> Self {
        Self {
            interactive: self.interactive && !quiet,
        }
    }
}
