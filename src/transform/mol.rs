use super::{Transform, Value, expect_text};
use crate::error::Error;
use crate::io::{sdf, smiles};

/// Parses a SMILES string (`smi → mol`).
#[derive(Debug, Clone, Default)]
pub struct SmilesToMol {
    /// Turn implicit hydrogens into explicit atoms after parsing.
    pub add_hydrogens: bool,
}

impl SmilesToMol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hydrogens() -> Self {
        Self { add_hydrogens: true }
    }
}

impl Transform for SmilesToMol {
    fn name(&self) -> &str {
        "smi_to_mol"
    }

    fn in_key(&self) -> &str {
        "smi"
    }

    fn out_key(&self) -> &str {
        "mol"
    }

    fn apply(&self, key: &str, value: &Value) -> Result<Value, Error> {
        let mol = smiles::parse(expect_text(key, value)?)?;
        let mol = if self.add_hydrogens {
            mol.with_explicit_hydrogens()
        } else {
            mol
        };
        Ok(Value::Molecule(mol))
    }
}

/// Parses a MOL block (`molblock → mol`).
#[derive(Debug, Clone, Default)]
pub struct MolBlockToMol;

impl Transform for MolBlockToMol {
    fn name(&self) -> &str {
        "molblock_to_mol"
    }

    fn in_key(&self) -> &str {
        "molblock"
    }

    fn out_key(&self) -> &str {
        "mol"
    }

    fn apply(&self, key: &str, value: &Value) -> Result<Value, Error> {
        let block = expect_text(key, value)?;
        Ok(Value::Molecule(sdf::read(block.as_bytes())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Element;

    #[test]
    fn smiles_to_mol() {
        let out = SmilesToMol::new().apply("smi", &Value::from("CO")).unwrap();
        let mol = out.as_molecule().unwrap();
        assert_eq!(mol.atom_count(), 2);
    }

    #[test]
    fn smiles_to_mol_with_hydrogens() {
        let out = SmilesToMol::with_hydrogens()
            .apply("smi", &Value::from("CO"))
            .unwrap();
        let mol = out.as_molecule().unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.atoms.iter().filter(|a| a.element == Element::H).count(), 4);
    }

    #[test]
    fn non_text_input_is_a_type_mismatch() {
        let err = SmilesToMol::new().apply("smi", &Value::from(1.0)).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { expected: "text", found: "number", .. }
        ));
    }

    #[test]
    fn bad_smiles_is_a_structure_error() {
        let err = SmilesToMol::new().apply("smi", &Value::from("C1CC")).unwrap_err();
        assert!(matches!(err, Error::Structure(_)));
    }

    #[test]
    fn molblock_to_mol() {
        let block = "\
methane
  test

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
M  END
";
        let out = MolBlockToMol.apply("molblock", &Value::from(block)).unwrap();
        let mol = out.as_molecule().unwrap();
        assert_eq!(mol.atom_count(), 1);
        assert_eq!(mol.atoms[0].hydrogens, 4);
    }
}
