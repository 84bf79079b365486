/// Fold one uppercased character to its unaccented base form.
fn fold_diacritic(c: char) -> char {
    match c {
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ñ' => 'N',
        'Ç' => 'C',
        other => other,
    }
}

/// Normalize a raw answer into its comparison key: uppercase, accents
/// folded, everything outside `[A-Z0-9]` dropped.
///
/// An empty result means no match is possible for this input.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .map(fold_diacritic)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercases_and_strips_spaces() {
        assert_eq!(normalize("  perro callejero "), "PERROCALLEJERO");
    }

    #[test]
    fn folds_accents() {
        assert_eq!(normalize("camión"), "CAMION");
        assert_eq!(normalize("AÑO"), "ANO");
        assert_eq!(normalize("pingüino"), "PINGUINO");
    }

    #[test]
    fn drops_symbols_keeps_digits() {
        assert_eq!(normalize("¡héroe-99!"), "HEROE99");
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ???"), "");
    }

    #[test]
    fn idempotent() {
        for raw in ["Güiro", "lápiz", "  dos palabras  ", "ñandú"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
        }
    }
}
