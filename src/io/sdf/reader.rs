use std::io::BufRead;

use crate::io::{Format, error::Error};
use crate::model::{
    atom::Atom,
    molecule::{Bond, Molecule},
    types::{BondOrder, Element},
};

type Line = (usize, String);

pub fn read<R: BufRead>(reader: R) -> Result<Molecule, Error> {
    let mut blocks = Blocks::new(reader);
    match blocks.next_block()? {
        Some(lines) => parse_block(&lines),
        None => Err(Error::parse(Format::Sdf, 1, "input contains no molecule block")),
    }
}

pub fn read_all<R: BufRead>(reader: R) -> Result<Vec<Molecule>, Error> {
    let mut blocks = Blocks::new(reader);
    let mut molecules = Vec::new();
    while let Some(lines) = blocks.next_block()? {
        molecules.push(parse_block(&lines)?);
    }
    Ok(molecules)
}

/// Splits an SDF stream into `$$$$`-terminated blocks, keeping line numbers.
struct Blocks<R> {
    lines: std::iter::Enumerate<std::io::Lines<R>>,
}

impl<R: BufRead> Blocks<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines().enumerate(),
        }
    }

    fn next_block(&mut self) -> Result<Option<Vec<Line>>, Error> {
        let mut block = Vec::new();
        for (i, line) in self.lines.by_ref() {
            let content = line.map_err(|e| Error::Io { source: e })?;
            if content.trim() == "$$$$" {
                return Ok(Some(block));
            }
            block.push((i + 1, content));
        }

        if block.iter().all(|(_, l)| l.trim().is_empty()) {
            Ok(None)
        } else {
            Ok(Some(block))
        }
    }
}

fn parse_block(lines: &[Line]) -> Result<Molecule, Error> {
    if lines.len() < 4 {
        return Err(Error::parse(
            Format::Sdf,
            lines.first().map(|(ln, _)| *ln).unwrap_or(1),
            "SDF block must contain at least a header and counts line",
        ));
    }

    let counts_line_no = lines[3].0;
    let counts_line = &lines[3].1;
    if counts_line.contains("V3000") {
        return Err(Error::parse(
            Format::Sdf,
            counts_line_no,
            "V3000 is not supported",
        ));
    }

    let (atom_count, bond_count) = parse_counts(counts_line, counts_line_no)?;
    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    let props_start = bond_start + bond_count;

    if lines.len() < props_start {
        return Err(Error::parse(
            Format::Sdf,
            lines.last().map(|(ln, _)| *ln).unwrap_or(counts_line_no),
            "SDF block ended before atoms/bonds were fully specified",
        ));
    }

    let mut atoms = parse_atoms(&lines[atom_start..bond_start])?;
    let bonds = parse_bonds(&lines[bond_start..props_start], atom_count)?;
    let data_start = apply_property_lines(&lines[props_start..], &mut atoms)?;

    let mut mol = Molecule {
        name: lines[0].1.trim().to_string(),
        atoms,
        bonds,
        properties: parse_data_items(&lines[props_start + data_start..]),
    };

    let mask = vec![true; mol.atoms.len()];
    mol.assign_implicit_hydrogens(&mask);

    Ok(mol)
}

fn parse_counts(line: &str, line_no: usize) -> Result<(usize, usize), Error> {
    let padded = format!("{line:<6}");
    let field = |range: std::ops::Range<usize>| padded.get(range).map(str::trim).unwrap_or("");
    let atoms = field(0..3)
        .parse::<usize>()
        .map_err(|_| Error::parse(Format::Sdf, line_no, "invalid atom count"))?;
    let bonds = field(3..6)
        .parse::<usize>()
        .map_err(|_| Error::parse(Format::Sdf, line_no, "invalid bond count"))?;
    Ok((atoms, bonds))
}

fn parse_atoms(lines: &[Line]) -> Result<Vec<Atom>, Error> {
    let mut atoms = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        if !raw.is_ascii() {
            return Err(Error::parse(Format::Sdf, *ln, "atom line contains non-ASCII text"));
        }
        let padded = format!("{raw:<40}");
        let x = parse_coord(&padded[0..10], *ln, "x")?;
        let y = parse_coord(&padded[10..20], *ln, "y")?;
        let z = parse_coord(&padded[20..30], *ln, "z")?;

        let symbol = padded[31..34].trim();
        let element = symbol.parse::<Element>().map_err(|_| {
            Error::parse(Format::Sdf, *ln, format!("unknown element symbol '{symbol}'"))
        })?;

        let charge_code = padded[36..39].trim();
        let formal_charge = if charge_code.is_empty() {
            0
        } else {
            let code = charge_code
                .parse::<u8>()
                .map_err(|_| Error::parse(Format::Sdf, *ln, "invalid charge code in atom line"))?;
            charge_from_ctfile(code)
                .ok_or_else(|| Error::parse(Format::Sdf, *ln, "unsupported charge code"))?
        };

        atoms.push(Atom::new(element, [x, y, z]).with_charge(formal_charge));
    }
    Ok(atoms)
}

fn parse_coord(field: &str, line_no: usize, axis: &str) -> Result<f64, Error> {
    field.trim().parse::<f64>().map_err(|_| {
        Error::parse(
            Format::Sdf,
            line_no,
            format!("invalid {axis} coordinate in atom line"),
        )
    })
}

fn parse_bonds(lines: &[Line], atom_count: usize) -> Result<Vec<Bond>, Error> {
    let mut bonds = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        let padded = format!("{raw:<9}");
        let field = |range: std::ops::Range<usize>| padded.get(range).map(str::trim).unwrap_or("");

        let a1 = field(0..3)
            .parse::<usize>()
            .map_err(|_| Error::parse(Format::Sdf, *ln, "invalid first atom index"))?;
        let a2 = field(3..6)
            .parse::<usize>()
            .map_err(|_| Error::parse(Format::Sdf, *ln, "invalid second atom index"))?;
        let order_val = field(6..9)
            .parse::<i32>()
            .map_err(|_| Error::parse(Format::Sdf, *ln, "invalid bond order value"))?;

        let order = bond_order_from_ctfile(order_val)
            .ok_or_else(|| Error::parse(Format::Sdf, *ln, "unsupported bond order in bond line"))?;

        if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count {
            return Err(Error::parse(
                Format::Sdf,
                *ln,
                "bond references atom outside declared range",
            ));
        }

        bonds.push(Bond::new(a1 - 1, a2 - 1, order));
    }
    Ok(bonds)
}

/// Applies `M  CHG` lines up to `M  END`; returns the number of lines consumed.
///
/// Per the CTfile convention, any `M  CHG` line supersedes all atom-block charges.
fn apply_property_lines(lines: &[Line], atoms: &mut [Atom]) -> Result<usize, Error> {
    let mut charges_reset = false;
    for (offset, (ln, raw)) in lines.iter().enumerate() {
        if raw.starts_with("M  END") {
            return Ok(offset + 1);
        }
        if !raw.starts_with("M  CHG") {
            continue;
        }

        if !charges_reset {
            atoms.iter_mut().for_each(|a| a.formal_charge = 0);
            charges_reset = true;
        }

        let tokens: Vec<&str> = raw[6..].split_whitespace().collect();
        let count = tokens
            .first()
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or_else(|| Error::parse(Format::Sdf, *ln, "invalid entry count in M  CHG line"))?;
        if tokens.len() < 1 + 2 * count {
            return Err(Error::parse(Format::Sdf, *ln, "truncated M  CHG line"));
        }
        for pair in tokens[1..1 + 2 * count].chunks(2) {
            let idx = pair[0]
                .parse::<usize>()
                .ok()
                .filter(|&i| i >= 1 && i <= atoms.len())
                .ok_or_else(|| Error::parse(Format::Sdf, *ln, "M  CHG references unknown atom"))?;
            let charge = pair[1]
                .parse::<i8>()
                .map_err(|_| Error::parse(Format::Sdf, *ln, "invalid charge in M  CHG line"))?;
            atoms[idx - 1].formal_charge = charge;
        }
    }
    Ok(lines.len())
}

fn parse_data_items(lines: &[Line]) -> std::collections::BTreeMap<String, String> {
    let mut items = std::collections::BTreeMap::new();
    let mut iter = lines.iter().peekable();
    while let Some((_, raw)) = iter.next() {
        let Some(name) = data_header_name(raw) else {
            continue;
        };
        let mut value = Vec::new();
        while let Some((_, next)) = iter.peek() {
            if next.trim().is_empty() || data_header_name(next).is_some() {
                break;
            }
            value.push(next.trim_end().to_string());
            iter.next();
        }
        items.insert(name.to_string(), value.join("\n"));
    }
    items
}

fn data_header_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('>')?;
    let start = rest.find('<')? + 1;
    let end = start + rest[start..].find('>')?;
    Some(&rest[start..end])
}

fn bond_order_from_ctfile(value: i32) -> Option<BondOrder> {
    match value {
        1 => Some(BondOrder::Single),
        2 => Some(BondOrder::Double),
        3 => Some(BondOrder::Triple),
        4 => Some(BondOrder::Aromatic),
        _ => None,
    }
}

fn charge_from_ctfile(code: u8) -> Option<i8> {
    match code {
        0 | 4 => Some(0),
        1 => Some(3),
        2 => Some(2),
        3 => Some(1),
        5 => Some(-1),
        6 => Some(-2),
        7 => Some(-3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACETATE: &str = "\
acetate
  handwritten

  4  3  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.2000    1.1000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    2.2000   -1.1000    0.0000 O   0  5  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  2  0
  2  4  1  0
M  END
> <pIC50>
6.5

> <note>
first line
second line

$$$$
water
  handwritten

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
M  END
$$$$
";

    #[test]
    fn reads_first_block() {
        let mol = read(ACETATE.as_bytes()).unwrap();
        assert_eq!(mol.name, "acetate");
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(mol.bonds[1], Bond::new(1, 2, BondOrder::Double));
        assert_eq!(mol.atoms[3].formal_charge, -1);
        assert_eq!(mol.atoms[0].hydrogens, 3);
        assert_eq!(mol.atoms[3].hydrogens, 0);
    }

    #[test]
    fn reads_data_items() {
        let mol = read(ACETATE.as_bytes()).unwrap();
        assert_eq!(mol.properties.get("pIC50").map(String::as_str), Some("6.5"));
        assert_eq!(
            mol.properties.get("note").map(String::as_str),
            Some("first line\nsecond line")
        );
    }

    #[test]
    fn reads_all_blocks() {
        let mols = read_all(ACETATE.as_bytes()).unwrap();
        assert_eq!(mols.len(), 2);
        assert_eq!(mols[1].name, "water");
        assert_eq!(mols[1].atoms[0].hydrogens, 2);
    }

    #[test]
    fn charge_lines_override_atom_block() {
        let block = "\
ammonium


  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  5  0  0  0  0  0  0  0  0  0  0
M  CHG  1   1   1
M  END
";
        let mol = read(block.as_bytes()).unwrap();
        assert_eq!(mol.atoms[0].formal_charge, 1);
        assert_eq!(mol.atoms[0].hydrogens, 4);
    }

    #[test]
    fn rejects_out_of_range_bond() {
        let block = "\
bad


  1  1  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
M  END
";
        let err = read(block.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 6, .. }));
    }

    #[test]
    fn rejects_v3000() {
        let block = "x\n\n\n  0  0  0     0  0            999 V3000\nM  END\n";
        assert!(read(block.as_bytes()).is_err());
    }

    #[test]
    fn empty_input_has_no_molecule() {
        assert!(read("".as_bytes()).is_err());
        assert!(read_all("\n\n".as_bytes()).unwrap().is_empty());
    }
}
