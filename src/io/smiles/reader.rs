use std::collections::BTreeMap;

use crate::io::{Format, error::Error};
use crate::model::{
    atom::Atom,
    molecule::{Bond, Molecule},
    types::{BondOrder, Element},
};

/// Parses a SMILES string into a [`Molecule`].
///
/// Atoms and bonds are numbered in order of appearance. Atoms written in the
/// organic subset receive implicit hydrogens from their default valences;
/// bracket atoms carry exactly the hydrogens they declare. Stereo markers
/// (`@`, `/`, `\`) are accepted and ignored.
pub fn parse(smiles: &str) -> Result<Molecule, Error> {
    Parser::new(smiles).run()
}

struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
    position: usize,
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
    mol: Molecule,
    organic: Vec<bool>,
    prev: Option<usize>,
    branches: Vec<(usize, usize)>,
    pending: Option<(BondOrder, usize)>,
    rings: BTreeMap<u32, RingOpening>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
            mol: Molecule::new(),
            organic: Vec::new(),
            prev: None,
            branches: Vec::new(),
            pending: None,
            rings: BTreeMap::new(),
        }
    }

    fn error(&self, position: usize, details: impl Into<String>) -> Error {
        Error::syntax(Format::Smiles, self.input, position, details)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn run(mut self) -> Result<Molecule, Error> {
        if self.chars.is_empty() {
            return Err(self.error(0, "empty SMILES string"));
        }

        while let Some(c) = self.peek() {
            match c {
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.push_atom(atom, false)?;
                }
                '(' => {
                    let prev = self
                        .prev
                        .ok_or_else(|| self.error(self.pos, "branch opened before any atom"))?;
                    if self.pending.is_some() {
                        return Err(self.error(self.pos, "bond symbol before branch"));
                    }
                    self.branches.push((prev, self.pos));
                    self.pos += 1;
                }
                ')' => {
                    if self.pending.is_some() {
                        return Err(self.error(self.pos, "bond symbol without a following atom"));
                    }
                    let (atom, _) = self
                        .branches
                        .pop()
                        .ok_or_else(|| self.error(self.pos, "unmatched ')'"))?;
                    self.prev = Some(atom);
                    self.pos += 1;
                }
                '-' | '=' | '#' | ':' | '/' | '\\' | '$' => self.bond_symbol(c)?,
                '0'..='9' | '%' => self.ring_closure()?,
                '.' => {
                    if self.pending.is_some() {
                        return Err(self.error(self.pos, "bond symbol before '.'"));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                _ if c.is_ascii_alphabetic() => {
                    let atom = self.organic_atom()?;
                    self.push_atom(atom, true)?;
                }
                _ => return Err(self.error(self.pos, format!("unexpected character '{c}'"))),
            }
        }

        if let Some((_, position)) = self.pending {
            return Err(self.error(position, "bond symbol without a following atom"));
        }
        if let Some(&(_, position)) = self.branches.last() {
            return Err(self.error(position, "unclosed branch"));
        }
        if let Some((label, opening)) = self.rings.iter().next() {
            return Err(self.error(opening.position, format!("unclosed ring bond {label}")));
        }

        let mut mol = self.mol;
        mol.assign_implicit_hydrogens(&self.organic);
        Ok(mol)
    }

    fn push_atom(&mut self, atom: Atom, organic: bool) -> Result<(), Error> {
        self.mol.atoms.push(atom);
        self.organic.push(organic);
        let idx = self.mol.atoms.len() - 1;

        if let Some(prev) = self.prev {
            let order = match self.pending.take() {
                Some((order, _)) => order,
                None => self.default_order(prev, idx),
            };
            self.mol.bonds.push(Bond::new(prev, idx, order));
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.mol.atoms[a].aromatic && self.mol.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn bond_symbol(&mut self, c: char) -> Result<(), Error> {
        if self.prev.is_none() {
            return Err(self.error(self.pos, "bond symbol before any atom"));
        }
        if self.pending.is_some() {
            return Err(self.error(self.pos, "consecutive bond symbols"));
        }
        let order = match c {
            '-' | '/' | '\\' => BondOrder::Single,
            '=' => BondOrder::Double,
            '#' => BondOrder::Triple,
            ':' => BondOrder::Aromatic,
            _ => return Err(self.error(self.pos, "quadruple bonds are not supported")),
        };
        self.pending = Some((order, self.pos));
        self.pos += 1;
        Ok(())
    }

    fn ring_closure(&mut self) -> Result<(), Error> {
        let start = self.pos;
        let atom = self
            .prev
            .ok_or_else(|| self.error(start, "ring bond before any atom"))?;

        let label = if self.peek() == Some('%') {
            let digits: String = self.chars[start + 1..]
                .iter()
                .take(2)
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.len() != 2 {
                return Err(self.error(start, "'%' must be followed by two digits"));
            }
            self.pos += 3;
            digits.parse::<u32>().map_err(|_| self.error(start, "invalid ring label"))?
        } else {
            let digit = self.chars[start].to_digit(10).unwrap_or(0);
            self.pos += 1;
            digit
        };

        let order = self.pending.take().map(|(order, _)| order);
        match self.rings.remove(&label) {
            Some(opening) => {
                if opening.atom == atom {
                    let details = format!("ring bond {label} closes on its own atom");
                    return Err(self.error(start, details));
                }
                let order = match (opening.order, order) {
                    (Some(a), Some(b)) if a != b => {
                        let details = format!("conflicting bond orders for ring bond {label}");
                        return Err(self.error(start, details));
                    }
                    (Some(a), _) | (None, Some(a)) => a,
                    (None, None) => self.default_order(opening.atom, atom),
                };
                self.mol.bonds.push(Bond::new(opening.atom, atom, order));
            }
            None => {
                self.rings.insert(
                    label,
                    RingOpening {
                        atom,
                        order,
                        position: start,
                    },
                );
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, Error> {
        let start = self.pos;
        let c = self.chars[start];
        let next = self.chars.get(start + 1).copied();

        let (symbol, aromatic, len) = match (c, next) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('B', _) => ("B", false, 1),
            ('C', _) => ("C", false, 1),
            ('N', _) => ("N", false, 1),
            ('O', _) => ("O", false, 1),
            ('P', _) => ("P", false, 1),
            ('S', _) => ("S", false, 1),
            ('F', _) => ("F", false, 1),
            ('I', _) => ("I", false, 1),
            ('b', _) => ("B", true, 1),
            ('c', _) => ("C", true, 1),
            ('n', _) => ("N", true, 1),
            ('o', _) => ("O", true, 1),
            ('p', _) => ("P", true, 1),
            ('s', _) => ("S", true, 1),
            _ => {
                return Err(self.error(
                    start,
                    format!("'{c}' is not in the organic subset; use a bracket atom"),
                ));
            }
        };

        self.pos += len;
        let element = symbol
            .parse::<Element>()
            .map_err(|e| self.error(start, e.to_string()))?;
        Ok(Atom::bare(element).with_aromatic(aromatic))
    }

    fn bracket_atom(&mut self) -> Result<Atom, Error> {
        let open = self.pos;
        let close = self.chars[open..]
            .iter()
            .position(|&c| c == ']')
            .map(|off| open + off)
            .ok_or_else(|| self.error(open, "unclosed bracket atom"))?;
        self.pos = open + 1;

        // Isotope.
        while self.pos < close && self.chars[self.pos].is_ascii_digit() {
            self.pos += 1;
        }

        let (element, aromatic) = self.bracket_symbol(close)?;

        // Chirality, including extended forms such as @TH1 or @@.
        if self.peek() == Some('@') {
            while self.pos < close && self.chars[self.pos] == '@' {
                self.pos += 1;
            }
            if self.pos + 1 < close
                && self.chars[self.pos].is_ascii_uppercase()
                && self.chars[self.pos + 1].is_ascii_uppercase()
            {
                self.pos += 2;
                while self.pos < close && self.chars[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }

        let mut hydrogens = 0u8;
        if self.pos < close && self.chars[self.pos] == 'H' {
            self.pos += 1;
            let start = self.pos;
            let count = self.read_count(close)?.unwrap_or(1);
            hydrogens = u8::try_from(count)
                .map_err(|_| self.error(start, format!("hydrogen count {count} out of range")))?;
        }

        let mut charge: i64 = 0;
        if self.pos < close && matches!(self.chars[self.pos], '+' | '-') {
            let sign_char = self.chars[self.pos];
            let sign = if sign_char == '+' { 1 } else { -1 };
            self.pos += 1;
            let mut magnitude = 1;
            if let Some(n) = self.read_count(close)? {
                magnitude = n;
            } else {
                while self.pos < close && self.chars[self.pos] == sign_char {
                    magnitude += 1;
                    self.pos += 1;
                }
            }
            charge = sign * i64::from(magnitude);
        }

        // Atom class.
        if self.pos < close && self.chars[self.pos] == ':' {
            self.pos += 1;
            if self.read_count(close)?.is_none() {
                return Err(self.error(self.pos, "atom class must be a number"));
            }
        }

        if self.pos != close {
            return Err(self.error(
                self.pos,
                format!("unexpected '{}' in bracket atom", self.chars[self.pos]),
            ));
        }
        let formal_charge =
            i8::try_from(charge).map_err(|_| self.error(open, "formal charge out of range"))?;
        self.pos = close + 1;

        Ok(Atom::bare(element)
            .with_aromatic(aromatic)
            .with_charge(formal_charge)
            .with_hydrogens(hydrogens))
    }

    fn bracket_symbol(&mut self, close: usize) -> Result<(Element, bool), Error> {
        let start = self.pos;
        let rest: String = self.chars[start..close].iter().take(2).collect();

        for (text, symbol) in [("se", "Se"), ("as", "As")] {
            if rest.starts_with(text) {
                self.pos += 2;
                let element = symbol
                    .parse::<Element>()
                    .map_err(|e| self.error(start, e.to_string()))?;
                return Ok((element, true));
            }
        }

        let first = self
            .peek()
            .filter(|_| start < close)
            .ok_or_else(|| self.error(start, "bracket atom without element symbol"))?;

        if first.is_ascii_lowercase() {
            let symbol = first.to_ascii_uppercase().to_string();
            if !matches!(first, 'b' | 'c' | 'n' | 'o' | 'p' | 's') {
                return Err(self.error(start, format!("'{first}' cannot be aromatic")));
            }
            self.pos += 1;
            let element = symbol
                .parse::<Element>()
                .map_err(|e| self.error(start, e.to_string()))?;
            return Ok((element, true));
        }

        if !first.is_ascii_uppercase() {
            return Err(self.error(start, "bracket atom without element symbol"));
        }

        if rest.len() == 2 {
            if let Ok(element) = rest.parse::<Element>() {
                self.pos += 2;
                return Ok((element, false));
            }
        }
        let element = first
            .to_string()
            .parse::<Element>()
            .map_err(|e| self.error(start, e.to_string()))?;
        self.pos += 1;
        Ok((element, false))
    }

    /// Reads an optional run of digits ending before `limit`.
    fn read_count(&mut self, limit: usize) -> Result<Option<u32>, Error> {
        let start = self.pos;
        while self.pos < limit && self.chars[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos == start {
            return Ok(None);
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<u32>()
            .map(Some)
            .map_err(|_| self.error(start, format!("number {digits} is too large")))
    }
}
