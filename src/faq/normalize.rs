//! Text normalization shared by questions and keywords.
//!
//! Both sides go through the same pipeline so a keyword like "almoço"
//! matches a question typed as "ALMOCO?".

/// Lowercase, strip diacritics, turn punctuation into spaces, collapse
/// whitespace and trim.
///
/// ```
/// use portal_store::faq::normalize;
///
/// assert_eq!(normalize("  Qual é o horário do almoço?! "), "qual e o horario do almoco");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if is_combining_mark(c) {
            continue;
        }
        match fold(c) {
            Folded::One(f) if f.is_alphanumeric() => folded.push(f),
            Folded::One(_) => folded.push(' '),
            Folded::Many(s) => folded.push_str(s),
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

enum Folded {
    One(char),
    Many(&'static str),
}

const fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

fn fold(c: char) -> Folded {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        'ß' => return Folded::Many("ss"),
        'æ' => return Folded::Many("ae"),
        'œ' => return Folded::Many("oe"),
        other => other,
    };
    Folded::One(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_portuguese_diacritics() {
        assert_eq!(normalize("Férias, recesso e feriados"), "ferias recesso e feriados");
        assert_eq!(normalize("CRACHÁ"), "cracha");
        assert_eq!(normalize("informação"), "informacao");
    }

    #[test]
    fn test_strips_combining_marks() {
        // "e" followed by U+0301 COMBINING ACUTE ACCENT
        assert_eq!(normalize("cafe\u{0301}"), "cafe");
    }

    #[test]
    fn test_punctuation_becomes_space() {
        assert_eq!(normalize("wi-fi"), "wi fi");
        assert_eq!(normalize("vale-refeição!!"), "vale refeicao");
        assert_eq!(normalize("¿Qué?"), "que");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize(" \t a \n\n b  "), "a b");
        assert_eq!(normalize("?!..."), "");
    }

    #[test]
    fn test_keeps_digits() {
        assert_eq!(normalize("Bolsa de 5º dia"), "bolsa de 5º dia");
    }
}
