use std::io::{self, Write};

use anyhow::Error;

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    let hints = hints_for(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

/// Hints for the innermost typed error in the chain.
fn hints_for(err: &Error) -> Vec<String> {
    let mut hints = Vec::new();

    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<molgraph::Error>() {
            if matches!(e, molgraph::Error::Record { .. }) {
                hints.push("Use --skip-invalid to drop failing records and continue".to_string());
                continue;
            }
            graph_hints(e, &mut hints);
            return hints;
        }
        if let Some(e) = cause.downcast_ref::<molgraph::io::Error>() {
            structure_hints(e, &mut hints);
            return hints;
        }
        if let Some(e) = cause.downcast_ref::<std::io::Error>() {
            std_io_hints(e, &mut hints);
            return hints;
        }
    }

    hints
}

fn graph_hints(err: &molgraph::Error, hints: &mut Vec<String>) {
    use molgraph::Error as E;

    match err {
        E::Encoding { .. } => {
            hints.push("A value is outside a one-hot vocabulary without an unknown slot".into());
            hints.push("Add the value to `choices` or set `unknown = true` in --config".into());
        }
        E::InvalidShape { .. } => {
            hints.push("All graphs in a batch must share node and edge feature widths".into());
        }
        E::MissingKey { .. } | E::DanglingKey { .. } => {
            hints.push("Check --smiles-column against the CSV header".into());
        }
        E::MissingColumn(column) => {
            hints.push(format!("Column '{}' is not in the header row", column));
            hints.push("Column names are matched exactly after trimming whitespace".into());
        }
        E::InvalidTarget { .. } => {
            hints.push(
                "Target cells must be numbers; leave a cell empty for a missing value".into(),
            );
        }
        E::KeyNotFound { .. } => {
            hints.push("Every record needs a row in the descriptor table".into());
            hints.push("Check --key-column and that keys are spelled identically".into());
        }
        E::Config(_) => {
            hints.push(
                "Featurizer configuration has invalid TOML or an unknown feature kind".into(),
            );
            hints.push(
                "Atom kinds: element, degree, formal_charge, hydrogens, aromatic, in_ring, mass"
                    .into(),
            );
            hints.push("Bond kinds: order, aromatic, in_ring".into());
        }
        E::Csv(_) => {
            hints.push("Every CSV row must have as many cells as the header".into());
        }
        E::Structure(e) => structure_hints(e, hints),
        E::Io(e) => std_io_hints(e, hints),
        _ => {}
    }
}

fn structure_hints(err: &molgraph::io::Error, hints: &mut Vec<String>) {
    use molgraph::io::Error as E;

    match err {
        E::Syntax { position, .. } => {
            hints.push(format!("Inspect the SMILES around character {}", position));
            hints.push("Check ring-closure digits and bracket atoms".into());
        }
        E::Parse { line, .. } => {
            hints.push(format!("Inspect the file around line {}", line));
            hints.push("SDF: verify the V2000 counts line and atom block columns".into());
        }
        E::UnsupportedReadFormat(_) => {
            hints.push("Supported structure files: .sdf, .mol, .smi".into());
        }
        E::Io { source } => std_io_hints(source, hints),
    }
}

fn std_io_hints(err: &std::io::Error, hints: &mut Vec<String>) {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => {
            hints.push("Check that the file path is correct".into());
        }
        ErrorKind::PermissionDenied => {
            hints.push("Check file permissions with `ls -la`".into());
        }
        ErrorKind::InvalidData => {
            hints.push("The file is not valid UTF-8 text".into());
        }
        _ => {}
    }
}
