use std::io;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use molgraph::data::{Batch, DatabaseManager, Dataset, DatasetBuilder, TransformManager};
use molgraph::database::{Database, DescriptorTable};
use molgraph::io::table::read_records_from_path;
use molgraph::transform::{Collated, MolToGraph, Sample, SmilesToMol, Transform};

use super::read_featurizer_config;
use crate::cli::FeaturizeArgs;
use crate::display::{Context as DisplayContext, Progress, print_summary};
use crate::util::text::grouped;

const TOTAL_STEPS: u8 = 3;

const TARGET_GROUP: &str = "targets";
const DESCRIPTOR_DATABASE: &str = "descriptors";

pub fn run_featurize(args: FeaturizeArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading records");
    let records = read_records_from_path(&args.input)
        .with_context(|| format!("Failed to read records from {}", args.input.display()))?;
    if records.is_empty() {
        bail!("No records found in {}", args.input.display());
    }
    let read_substep = format!("{} records from {}", grouped(records.len()), args.input.display());
    progress.complete_step("Reading records", &[&read_substep]);

    progress.step("Building dataset");
    let config = read_featurizer_config(&args.featurizer)?;
    let to_graph = MolToGraph::from_config(&config);
    let graph_key = to_graph.out_key().to_string();
    let node_dim = to_graph.featurizer().node_dim();
    let edge_dim = to_graph.featurizer().edge_dim();
    let dataset = build_dataset(&args, records, to_graph)?;

    let build_substeps = build_dataset_substeps(&args, node_dim, edge_dim, &dataset);
    let build_substeps_ref: Vec<&str> = build_substeps.iter().map(|s| s.as_str()).collect();
    progress.complete_step("Building dataset", &build_substeps_ref);

    let batch_size = args.batch_size as usize;
    let total_batches = dataset.len().div_ceil(batch_size);
    progress.counted_step("Featurizing batches", total_batches as u64);
    let mut stats = RunStats::new(dataset.len(), node_dim, edge_dim);
    let indices: Vec<usize> = (0..dataset.len()).collect();
    for chunk in indices.chunks(batch_size) {
        if let Some(batch) = load_chunk(&dataset, chunk, args.skip_invalid, &mut stats)? {
            stats.record(&batch, &graph_key)?;
        }
        progress.tick();
    }
    let batch_substep = format!(
        "{} batches of up to {} records",
        grouped(stats.batches),
        batch_size
    );
    progress.complete_step("Featurizing batches", &[&batch_substep]);
    progress.finish();

    if stats.molecules == 0 {
        bail!("Every record failed; no batches were produced");
    }

    let rows = stats.rows(&args);
    print_summary(&mut io::stdout().lock(), "Batch Statistics", &rows);
    Ok(())
}

fn build_dataset(
    args: &FeaturizeArgs,
    records: Vec<Sample>,
    to_graph: MolToGraph,
) -> Result<Dataset> {
    let to_mol = if args.featurizer.explicit_hydrogens {
        SmilesToMol::with_hydrogens()
    } else {
        SmilesToMol::new()
    };

    let mut builder = DatasetBuilder::new(records)
        .transform(TransformManager::new(to_mol).reading(&args.smiles_column))
        .transform(TransformManager::new(to_graph))
        .parallel(!args.sequential);

    if !args.targets.is_empty() {
        builder = builder.target(TARGET_GROUP, args.targets.clone());
    }

    if let Some(path) = &args.descriptors.path {
        let key_column = &args.descriptors.key_column;
        let mut table = DescriptorTable::new(DESCRIPTOR_DATABASE, path, key_column)
            .with_context(|| format!("Failed to read descriptor table: {}", path.display()))?;
        if !args.descriptors.columns.is_empty() {
            table = table.with_columns(args.descriptors.columns.clone())?;
        }
        debug!(columns = table.width(), rows = table.len(), "descriptor table ready");
        builder = builder.database(DatabaseManager::new(table, &args.smiles_column));
    }

    builder.build().context("Invalid dataset configuration")
}

fn build_dataset_substeps(
    args: &FeaturizeArgs,
    node_dim: usize,
    edge_dim: usize,
    dataset: &Dataset,
) -> Vec<String> {
    let mut steps = Vec::new();

    if args.featurizer.config.is_some() {
        steps.push(format!("Featurizer (custom): {node_dim} atom / {edge_dim} bond features"));
    } else {
        steps.push(format!("Featurizer (default): {node_dim} atom / {edge_dim} bond features"));
    }
    if !args.targets.is_empty() {
        steps.push(format!("Targets: {}", args.targets.join(", ")));
    }
    for manager in dataset.databases() {
        steps.push(format!(
            "Join '{}' on column '{}'",
            manager.database().name(),
            args.smiles_column
        ));
    }
    let mode = if dataset.runs_parallel() {
        "parallel"
    } else {
        "sequential"
    };
    steps.push(format!("Sample assembly: {mode}"));

    steps
}

/// Loads one chunk of records. With `skip_invalid`, failing records are
/// logged and dropped; a chunk with no surviving record yields `None`.
fn load_chunk(
    dataset: &Dataset,
    indices: &[usize],
    skip_invalid: bool,
    stats: &mut RunStats,
) -> Result<Option<Batch>> {
    if !skip_invalid {
        return Ok(Some(dataset.load_batch(indices)?));
    }

    let mut kept = Vec::with_capacity(indices.len());
    for sample in dataset.load_samples(indices)? {
        match sample {
            Ok(sample) => kept.push(sample),
            Err(molgraph::Error::Record { index, source }) => {
                warn!(record = index, reason = %source, "skipping invalid record");
                stats.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if kept.is_empty() {
        return Ok(None);
    }
    Ok(Some(dataset.collate(&kept)?))
}

struct RunStats {
    records: usize,
    molecules: usize,
    skipped: usize,
    batches: usize,
    nodes: usize,
    edges: usize,
    node_dim: usize,
    edge_dim: usize,
    largest_batch_nodes: usize,
    missing_targets: usize,
    descriptor_width: Option<usize>,
}

impl RunStats {
    fn new(records: usize, node_dim: usize, edge_dim: usize) -> Self {
        Self {
            records,
            molecules: 0,
            skipped: 0,
            batches: 0,
            nodes: 0,
            edges: 0,
            node_dim,
            edge_dim,
            largest_batch_nodes: 0,
            missing_targets: 0,
            descriptor_width: None,
        }
    }

    fn record(&mut self, batch: &Batch, graph_key: &str) -> Result<()> {
        let graphs = batch
            .input(graph_key)
            .and_then(Collated::as_graphs)
            .with_context(|| format!("Batch has no graphs under '{graph_key}'"))?;

        self.batches += 1;
        self.molecules += graphs.num_graphs();
        self.nodes += graphs.num_nodes();
        self.edges += graphs.num_edges();
        self.largest_batch_nodes = self.largest_batch_nodes.max(graphs.num_nodes());

        if let Some(targets) = batch.target(TARGET_GROUP).and_then(Collated::as_matrix) {
            self.missing_targets += targets.iter().filter(|v| v.is_nan()).count();
        }
        if let Some(descriptors) = batch.input(DESCRIPTOR_DATABASE).and_then(Collated::as_matrix) {
            self.descriptor_width = Some(descriptors.ncols());
        }

        debug!(
            batch = self.batches,
            graphs = graphs.num_graphs(),
            nodes = graphs.num_nodes(),
            edges = graphs.num_edges(),
            "collated batch"
        );
        Ok(())
    }

    fn rows(&self, args: &FeaturizeArgs) -> Vec<(&'static str, String)> {
        let mean_atoms = if self.molecules == 0 {
            0.0
        } else {
            self.nodes as f64 / self.molecules as f64
        };

        let mut rows = vec![
            ("Records", grouped(self.records)),
            ("Featurized", grouped(self.molecules)),
            ("Skipped", grouped(self.skipped)),
            ("Batches", grouped(self.batches)),
            ("Nodes", grouped(self.nodes)),
            ("Directed Edges", grouped(self.edges)),
            ("Mean Atoms/Mol", format!("{mean_atoms:.1}")),
            ("Largest Batch", format!("{} nodes", grouped(self.largest_batch_nodes))),
            ("Node Features", self.node_dim.to_string()),
            ("Edge Features", self.edge_dim.to_string()),
        ];
        if !args.targets.is_empty() {
            rows.push(("Targets", args.targets.join(", ")));
            rows.push(("Missing Targets", grouped(self.missing_targets)));
        }
        if let Some(width) = self.descriptor_width {
            rows.push(("Descriptors", width.to_string()));
        }
        rows
    }
}
