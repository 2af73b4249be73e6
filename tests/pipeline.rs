use approx::assert_relative_eq;
use molgraph::Error;
use molgraph::data::{DatabaseManager, Dataset, DatasetBuilder, TransformManager};
use molgraph::database::MemoryDatabase;
use molgraph::featurize::load_config;
use molgraph::io::table::read_records;
use molgraph::transform::{Chain, Collated, MolToGraph, Sample, SmilesToMol, Transform, Value};

const CSV: &str = "\
smiles,logp,tpsa,id
CCO,-0.31,20.23,1
c1ccccc1,1.69,0.0,2
CC(=O)O,-0.17,,3
C1CC1,1.72,0.0,4
O,-1.38,25.3,5
";

fn dataset(parallel: bool) -> Dataset {
    let records = read_records(CSV.as_bytes()).unwrap();
    DatasetBuilder::new(records)
        .transform(TransformManager::new(SmilesToMol::new()).reading("smiles"))
        .transform(TransformManager::new(MolToGraph::default()))
        .target("props", ["logp", "tpsa"])
        .parallel(parallel)
        .build()
        .unwrap()
}

#[test]
fn csv_records_batch_into_disjoint_graphs() {
    let dataset = dataset(true);
    assert_eq!(dataset.len(), 5);

    let batches: Vec<_> = dataset.batches(2).collect::<Result<_, _>>().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(
        batches.iter().map(|b| b.size()).collect::<Vec<_>>(),
        vec![2, 2, 1]
    );

    let first = batches[0].input("G").and_then(Collated::as_graphs).unwrap();
    assert_eq!(first.num_graphs(), 2);
    assert_eq!(first.num_nodes(), 3 + 6);
    assert_eq!(first.num_edges(), 2 * (2 + 6));
    assert_eq!(first.batch().to_vec(), vec![0, 0, 0, 1, 1, 1, 1, 1, 1]);

    let last = batches[2].input("G").and_then(Collated::as_graphs).unwrap();
    assert_eq!(last.num_nodes(), 1);
    assert_eq!(last.num_edges(), 0);
}

#[test]
fn targets_stack_per_sample_with_nan_for_empty_cells() {
    let batch = dataset(false).load_batch(&[0, 2]).unwrap();
    let targets = batch.target("props").and_then(Collated::as_matrix).unwrap();

    assert_eq!(targets.dim(), (2, 2));
    assert_relative_eq!(targets[[0, 0]], -0.31);
    assert_relative_eq!(targets[[0, 1]], 20.23);
    assert_relative_eq!(targets[[1, 0]], -0.17);
    assert!(targets[[1, 1]].is_nan());
}

#[test]
fn parallel_and_sequential_loading_agree() {
    let indices = [4, 0, 3, 1, 2];
    let parallel = dataset(true).load_batch(&indices).unwrap();
    let sequential = dataset(false).load_batch(&indices).unwrap();
    assert_eq!(
        parallel.input("G").and_then(Collated::as_graphs),
        sequential.input("G").and_then(Collated::as_graphs)
    );
}

#[test]
fn invalid_record_is_reported_by_index() {
    let records = read_records("smiles,y\nCCO,1\nC1CC,2\nCC,3\n".as_bytes()).unwrap();
    let dataset = DatasetBuilder::new(records)
        .transform(TransformManager::new(SmilesToMol::new()).reading("smiles"))
        .transform(TransformManager::new(MolToGraph::default()))
        .target("y", ["y"])
        .build()
        .unwrap();

    let err = dataset.load_batch(&[0, 1, 2]).unwrap_err();
    assert!(matches!(err, Error::Record { index: 1, .. }));
    assert!(matches!(err.root(), Error::Structure(_)));

    let samples = dataset.load_samples(&[0, 1, 2]).unwrap();
    let kept: Vec<Sample> = samples.into_iter().filter_map(Result::ok).collect();
    assert_eq!(kept.len(), 2);
    let batch = dataset.collate(&kept).unwrap();
    assert_eq!(batch.size(), 2);
}

#[test]
fn missing_raw_key_names_the_first_step() {
    let records = vec![Sample::new().with("other", "CCO")];
    let dataset = DatasetBuilder::new(records)
        .input_keys(["raw", "other"])
        .transform(TransformManager::new(SmilesToMol::new()).named("T1").reading("raw"))
        .transform(TransformManager::new(MolToGraph::default()).named("T2"))
        .build()
        .unwrap();

    let err = dataset.get(0).unwrap_err();
    match err.root() {
        Error::MissingKey { key, step, producer } => {
            assert_eq!(key, "raw");
            assert_eq!(step, "T1");
            assert!(producer.is_none());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("record 0"));
}

#[test]
fn undeclared_column_fails_when_building() {
    let records = read_records(CSV.as_bytes()).unwrap();
    let err = DatasetBuilder::new(records.clone())
        .transform(TransformManager::new(SmilesToMol::new()))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::DanglingKey { ref key, .. } if key == "smi"));

    let err = DatasetBuilder::new(records)
        .transform(TransformManager::new(SmilesToMol::new()).reading("smiles"))
        .target("props", ["logd"])
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::MissingColumn(ref c) if c == "logd"));
}

#[test]
fn database_values_join_by_record_key() {
    let records = read_records(CSV.as_bytes()).unwrap();
    let fingerprints = MemoryDatabase::new(
        "fp",
        (1..=5).map(|i| (i.to_string(), Value::Vector(vec![i as f32, 0.5]))),
    );
    let dataset = DatasetBuilder::new(records)
        .transform(TransformManager::new(SmilesToMol::new()).reading("smiles"))
        .database(DatabaseManager::new(fingerprints, "id"))
        .build()
        .unwrap();

    let batch = dataset.load_batch(&[1, 3]).unwrap();
    let fp = batch.input("fp").and_then(Collated::as_matrix).unwrap();
    assert_eq!(fp.dim(), (2, 2));
    assert_relative_eq!(fp[[0, 0]], 2.0);
    assert_relative_eq!(fp[[1, 0]], 4.0);
    assert!(!dataset.databases()[0].database().is_open());
}

#[test]
fn chain_runs_as_a_single_step() {
    let chain = Chain::new(
        "smi_to_graph",
        vec![
            Box::new(SmilesToMol::new()) as Box<dyn Transform>,
            Box::new(MolToGraph::default()),
        ],
    )
    .unwrap();
    assert_eq!(chain.in_key(), "smi");
    assert_eq!(chain.out_key(), "G");

    let records = vec![
        Sample::new().with("smi", "CN"),
        Sample::new().with("smi", "CCC"),
    ];
    let dataset = DatasetBuilder::new(records)
        .transform(TransformManager::new(chain))
        .build()
        .unwrap();
    let batch = dataset.load_batch(&[0, 1]).unwrap();
    let graphs = batch.input("G").and_then(Collated::as_graphs).unwrap();
    assert_eq!(graphs.num_nodes(), 5);
    assert_eq!(batch.len(), 1);
}

#[test]
fn custom_config_changes_feature_widths() {
    let config = load_config(Some(
        r#"
        [[atom]]
        kind = "element"
        choices = ["C", "O"]
        unknown = false

        [[atom]]
        kind = "aromatic"

        [[bond]]
        kind = "in_ring"
        "#,
    ))
    .unwrap();

    let records = vec![Sample::new().with("smi", "c1ccoc1")];
    let dataset = DatasetBuilder::new(records)
        .transform(TransformManager::new(SmilesToMol::new()))
        .transform(TransformManager::new(MolToGraph::from_config(&config)))
        .build()
        .unwrap();
    let batch = dataset.load_batch(&[0]).unwrap();
    let graphs = batch.input("G").and_then(Collated::as_graphs).unwrap();
    assert_eq!(graphs.node_dim(), 3);
    assert_eq!(graphs.edge_dim(), 1);
    assert!(graphs.edges().iter().all(|&v| v == 1.0));

    let records = vec![Sample::new().with("smi", "CN")];
    let dataset = DatasetBuilder::new(records)
        .transform(TransformManager::new(SmilesToMol::new()))
        .transform(TransformManager::new(MolToGraph::from_config(&config)))
        .build()
        .unwrap();
    let err = dataset.load_batch(&[0]).unwrap_err();
    assert!(matches!(err.root(), Error::Encoding { index: 1, .. }));
}
