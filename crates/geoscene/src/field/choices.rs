//! Enumerated string choices with aliases.

/// A closed set of canonical keys, each with a list of accepted aliases.
///
/// Matching ignores case and surrounding whitespace. The stored value is
/// always the canonical key.
#[derive(Debug)]
pub struct Choices {
    pub options: &'static [(&'static str, &'static [&'static str])],
}

impl Choices {
    /// Resolves `input` to its canonical key.
    pub fn resolve(&self, input: &str) -> Option<&'static str> {
        let needle = input.trim().to_uppercase();
        self.options.iter().find_map(|(key, aliases)| {
            let hit = key.eq_ignore_ascii_case(&needle)
                || aliases.iter().any(|alias| alias.eq_ignore_ascii_case(&needle));
            hit.then_some(*key)
        })
    }

    /// Canonical keys joined for error messages.
    pub fn describe(&self) -> String {
        self.options
            .iter()
            .map(|(k, _)| *k)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Binding location: node or cell-center.
pub static LOCATION: Choices = Choices {
    options: &[
        ("N", &["NODE", "VERTEX", "CORNER"]),
        ("CC", &["CELLCENTER", "CELL-CENTER", "FACE", "CELL"]),
    ],
};

/// Memory order of data arrays.
pub static ORDER: Choices = Choices {
    options: &[
        ("c", &["C-STYLE", "NUMPY", "ROW-MAJOR", "ROW"]),
        ("f", &["FORTRAN", "MATLAB", "COLUMN-MAJOR", "COLUMN", "COL"]),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_key() {
        for alias in ["numpy", " Row-Major ", "row", "C"] {
            assert_eq!(ORDER.resolve(alias), Some("c"), "alias {}", alias);
        }
        assert_eq!(ORDER.resolve("matlab"), Some("f"));
        assert_eq!(LOCATION.resolve("cell-center"), Some("CC"));
        assert_eq!(LOCATION.resolve("vertex"), Some("N"));
        assert_eq!(LOCATION.resolve("edge"), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(LOCATION.describe(), "N, CC");
        assert_eq!(ORDER.describe(), "c, f");
    }
}
