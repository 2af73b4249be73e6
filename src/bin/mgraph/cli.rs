use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mgraph",
    about = "Molecular graph featurization and batching",
    version,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Featurize a CSV of SMILES into batched graphs and report batch statistics
    #[command(visible_alias = "f")]
    Featurize(FeaturizeArgs),

    /// Print the graph built from a single structure
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),
}

/// Featurizer options shared by all commands.
#[derive(Args)]
#[command(next_help_heading = "Featurizer Options")]
pub struct FeaturizerOptions {
    /// Custom featurizer configuration (TOML file)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Add implicit hydrogens as explicit atoms before featurizing
    #[arg(long = "explicit-hydrogens")]
    pub explicit_hydrogens: bool,
}

#[derive(Args)]
pub struct FeaturizeArgs {
    /// Input CSV file with a header row
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Column holding the SMILES strings
    #[arg(long = "smiles-column", value_name = "NAME", default_value = "smiles")]
    pub smiles_column: String,

    /// Target columns, comma-separated
    #[arg(long, value_name = "COLS", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Number of records per batch
    #[arg(
        short,
        long = "batch-size",
        value_name = "N",
        default_value = "64",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub batch_size: u32,

    /// Skip records that fail to parse or featurize instead of aborting
    #[arg(long = "skip-invalid")]
    pub skip_invalid: bool,

    /// Build samples sequentially even when databases allow parallel reads
    #[arg(long)]
    pub sequential: bool,

    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub featurizer: FeaturizerOptions,

    #[command(flatten)]
    pub descriptors: DescriptorOptions,
}

/// Precomputed descriptor table joined by key.
#[derive(Args)]
#[command(next_help_heading = "Descriptor Options")]
pub struct DescriptorOptions {
    /// CSV of precomputed descriptors, joined to records by SMILES
    #[arg(long = "descriptors", value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Column of the descriptor table holding the lookup key
    #[arg(
        long = "key-column",
        value_name = "NAME",
        default_value = "smiles"
    )]
    pub key_column: String,

    /// Descriptor columns to keep, comma-separated (all if omitted)
    #[arg(
        long = "descriptor-columns",
        value_name = "COLS",
        value_delimiter = ',',
        requires = "path"
    )]
    pub columns: Vec<String>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// SMILES string to inspect
    #[arg(value_name = "SMILES", required_unless_present = "input", conflicts_with = "input")]
    pub smiles: Option<String>,

    /// Structure file (SDF/MOL or SMILES; first record only)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Maximum number of directed edges to list
    #[arg(long = "max-edges", value_name = "N", default_value = "24")]
    pub max_edges: usize,

    /// Suppress the banner
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub featurizer: FeaturizerOptions,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn featurize_splits_target_list() {
        let cli = Cli::try_parse_from([
            "mgraph", "featurize", "-i", "data.csv", "--targets", "logp,tpsa", "-b", "8",
        ])
        .unwrap();
        let Command::Featurize(args) = cli.command else {
            panic!("expected featurize");
        };
        assert_eq!(args.targets, vec!["logp", "tpsa"]);
        assert_eq!(args.batch_size, 8);
        assert_eq!(args.smiles_column, "smiles");
        assert!(args.descriptors.path.is_none());
    }

    #[test]
    fn batch_size_must_be_positive() {
        let result = Cli::try_parse_from(["mgraph", "featurize", "-i", "x.csv", "-b", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn inspect_needs_smiles_or_file() {
        assert!(Cli::try_parse_from(["mgraph", "inspect"]).is_err());
        assert!(Cli::try_parse_from(["mgraph", "inspect", "CCO"]).is_ok());
        assert!(Cli::try_parse_from(["mgraph", "inspect", "-i", "mol.sdf"]).is_ok());
        assert!(Cli::try_parse_from(["mgraph", "inspect", "CCO", "-i", "mol.sdf"]).is_err());
    }

    #[test]
    fn verbosity_is_global() {
        let cli = Cli::try_parse_from(["mgraph", "inspect", "C", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
