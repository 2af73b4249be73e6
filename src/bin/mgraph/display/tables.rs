use std::collections::BTreeMap;
use std::io::Write;

use molgraph::{Graph, Molecule};

use crate::util::text::truncate;

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

const MAX_DISTRIBUTION_ROWS: usize = 15;

pub fn print_graph_info(out: &mut impl Write, mol: &Molecule, graph: &Graph) {
    let mut rows = Vec::new();
    if !mol.name.is_empty() {
        rows.push(("Name", mol.name.clone()));
    }
    rows.extend([
        ("Atoms", mol.atom_count().to_string()),
        ("Heavy Atoms", mol.heavy_atom_count().to_string()),
        ("Bonds", mol.bond_count().to_string()),
        ("Nodes", format!("{} × {}", graph.num_nodes(), graph.node_dim())),
        ("Directed Edges", format!("{} × {}", graph.num_edges(), graph.edge_dim())),
    ]);
    for (key, value) in &mol.properties {
        rows.push((key.as_str(), value.clone()));
    }

    print_kv_table(out, "Graph Summary", &rows);
}

pub fn print_summary(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    print_kv_table(out, title, rows);
}

pub fn print_element_distribution(out: &mut impl Write, mol: &Molecule) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for atom in &mol.atoms {
        *counts.entry(atom.element.symbol()).or_insert(0) += 1;
    }

    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(symbol, count)| (symbol.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    print_distribution_table(out, "Element Distribution", &sorted, mol.atom_count());
}

fn print_distribution_table(
    out: &mut impl Write,
    title: &str,
    data: &[(String, usize)],
    total: usize,
) {
    let name_w = 10usize;
    let count_w = 8usize;
    let sep_overhead = 6;
    let dist_w = SAFE_TABLE_WIDTH.saturating_sub(name_w + count_w + sep_overhead);
    let max_bar_width = dist_w.saturating_sub(8).min(20);
    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{INDENT}{left}{}{mid}{}{mid}{}{right}",
            "─".repeat(name_w + 2),
            "─".repeat(count_w + 2),
            "─".repeat(dist_w + 2)
        )
    };

    let _ = writeln!(out, "{}┌─ {} ─┐", INDENT, truncate(title, SAFE_TABLE_WIDTH - 6));
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
        "Element", "Count", "Distribution"
    );
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for (name, count) in data.iter().take(MAX_DISTRIBUTION_ROWS) {
        let pct = if total == 0 {
            0.0
        } else {
            (*count as f64 / total as f64) * 100.0
        };
        let dist_cell = format!("{}  {:>5.1}%", make_bar(pct, max_bar_width), pct);
        let _ = writeln!(
            out,
            "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            truncate(name, name_w),
            count,
            dist_cell
        );
    }

    if data.len() > MAX_DISTRIBUTION_ROWS {
        let _ = writeln!(
            out,
            "{INDENT}│ {:<name_w$} │ {:>count_w$} │ {:<dist_w$} │",
            "...",
            "...",
            format!("({} more)", data.len() - MAX_DISTRIBUTION_ROWS)
        );
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

/// Lists directed edges as `position │ source → target │ reverse`.
pub fn print_edge_table(out: &mut impl Write, graph: &Graph, max_rows: usize) {
    let pos_w = 8usize;
    let pair_w = 16usize;
    let sep_overhead = 6;
    let rev_w = SAFE_TABLE_WIDTH.saturating_sub(pos_w + pair_w + sep_overhead);
    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{INDENT}{left}{}{mid}{}{mid}{}{right}",
            "─".repeat(pos_w + 2),
            "─".repeat(pair_w + 2),
            "─".repeat(rev_w + 2)
        )
    };

    let _ = writeln!(out, "{}┌─ Directed Edges ─┐", INDENT);
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(
        out,
        "{INDENT}│ {:>pos_w$} │ {:<pair_w$} │ {:>rev_w$} │",
        "Edge", "Atoms", "Reverse"
    );
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    let edges = graph.edge_index().iter().zip(graph.rev_index());
    for (p, ([src, dst], rev)) in edges.enumerate().take(max_rows) {
        let _ = writeln!(
            out,
            "{INDENT}│ {:>pos_w$} │ {:<pair_w$} │ {:>rev_w$} │",
            p,
            format!("{src} → {dst}"),
            rev
        );
    }

    if graph.num_edges() > max_rows {
        let _ = writeln!(
            out,
            "{INDENT}│ {:>pos_w$} │ {:<pair_w$} │ {:>rev_w$} │",
            "...",
            format!("({} more)", graph.num_edges() - max_rows),
            ""
        );
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);
    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{INDENT}{left}{}{mid}{}{right}",
            "─".repeat(key_w + 2),
            "─".repeat(val_w + 2)
        )
    };

    let _ = writeln!(out, "{}┌─ {} ─┐", INDENT, truncate(title, SAFE_TABLE_WIDTH - 6));
    let _ = writeln!(out, "{}", rule("┌", "┬", "┐"));
    let _ = writeln!(out, "{INDENT}│ {:<key_w$} │ {:>val_w$} │", "Metric", "Value");
    let _ = writeln!(out, "{}", rule("├", "┼", "┤"));

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{INDENT}│ {:<key_w$} │ {:>val_w$} │",
            truncate(key, key_w),
            truncate(val, val_w)
        );
    }

    let _ = writeln!(out, "{}", rule("└", "┴", "┘"));
}

fn make_bar(pct: f64, max_width: usize) -> String {
    let filled = ((pct / 100.0) * max_width as f64).round() as usize;
    let filled = filled.min(max_width);
    format!("{}{}", "█".repeat(filled), "░".repeat(max_width - filled))
}
