use std::fs::File;
use std::io::{self, BufReader, Write};

use anyhow::{Context, Result};

use molgraph::Molecule;
use molgraph::graph::MolGraphFeaturizer;
use molgraph::io::{Error as IoError, Format, read_molecule, smiles};

use super::read_featurizer_config;
use crate::cli::InspectArgs;
use crate::display::{
    Context as DisplayContext, print_edge_table, print_element_distribution, print_graph_info,
};

pub fn run_inspect(args: InspectArgs, _ctx: DisplayContext) -> Result<()> {
    let mut mol = read_structure(&args)?;
    if args.featurizer.explicit_hydrogens {
        mol = mol.with_explicit_hydrogens();
    }

    let config = read_featurizer_config(&args.featurizer)?;
    let featurizer = MolGraphFeaturizer::from_config(&config);
    let graph = featurizer
        .featurize(&mol)
        .context("Failed to build the molecular graph")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_graph_info(&mut out, &mol, &graph);
    print_element_distribution(&mut out, &mol);
    print_edge_table(&mut out, &graph, args.max_edges);
    out.flush()?;

    Ok(())
}

fn read_structure(args: &InspectArgs) -> Result<Molecule> {
    if let Some(smi) = &args.smiles {
        let mut mol = smiles::parse(smi).context("Failed to parse SMILES")?;
        mol.name = smi.clone();
        return Ok(mol);
    }

    let Some(path) = &args.input else {
        anyhow::bail!("Either a SMILES string or --input is required");
    };
    let format = match Format::from_path(path) {
        Some(format @ (Format::Sdf | Format::Smiles)) => format,
        Some(other) => return Err(IoError::UnsupportedReadFormat(other).into()),
        None => Format::Sdf,
    };
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    read_molecule(BufReader::new(file), format)
        .with_context(|| format!("Failed to read {} structure from {}", format, path.display()))
}
