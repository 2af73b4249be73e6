mod featurize;
mod inspect;

use featurize::run_featurize;
use inspect::run_inspect;

use std::fs;

use anyhow::{Context, Result};
use molgraph::featurize::{FeaturizerConfig, load_config};

use crate::cli::{Command, FeaturizerOptions};
use crate::display::Context as DisplayContext;

pub fn dispatch(command: Command, ctx: DisplayContext) -> Result<()> {
    match command {
        Command::Featurize(args) => run_featurize(args, ctx),
        Command::Inspect(args) => run_inspect(args, ctx),
    }
}

/// The custom configuration named by `--config`, or the embedded default.
fn read_featurizer_config(options: &FeaturizerOptions) -> Result<FeaturizerConfig> {
    let custom = options
        .config
        .as_ref()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read featurizer config: {}", path.display()))
        })
        .transpose()?;
    load_config(custom.as_deref()).context("Invalid featurizer configuration")
}
