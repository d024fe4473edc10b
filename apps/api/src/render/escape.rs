//! LaTeX escaping and small text formatters shared by the assembler.

/// Escapes LaTeX's reserved characters so `text` typesets literally.
///
/// Single pass: every reserved character maps to its literal-producing
/// sequence, everything else is copied through. Applying it twice escapes the
/// backslashes introduced by the first pass, so call it exactly once per value.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '_' => out.push_str("\\_"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '&' => out.push_str("\\&"),
            '#' => out.push_str("\\#"),
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            _ => out.push(c),
        }
    }
    out
}

/// `start -- end`. A dangling start reads as ongoing (`Present`); either side
/// alone renders alone. Inputs are raw text; the result is unescaped.
pub fn date_range(start: &str, end: &str) -> String {
    match (start.trim(), end.trim()) {
        ("", "") => String::new(),
        (start, "") => format!("{start} -- Present"),
        ("", end) => end.to_string(),
        (start, end) => format!("{start} -- {end}"),
    }
}

/// Joins the non-blank parts with `sep`.
pub fn join_non_empty<'a, I>(parts: I, sep: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESERVED: [char; 10] = ['\\', '%', '$', '_', '{', '}', '&', '#', '^', '~'];

    #[test]
    fn test_escape_empty_is_empty() {
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_escape_each_reserved_character() {
        assert_eq!(escape("\\"), "\\textbackslash{}");
        assert_eq!(escape("%"), "\\%");
        assert_eq!(escape("$"), "\\$");
        assert_eq!(escape("_"), "\\_");
        assert_eq!(escape("{"), "\\{");
        assert_eq!(escape("}"), "\\}");
        assert_eq!(escape("&"), "\\&");
        assert_eq!(escape("#"), "\\#");
        assert_eq!(escape("^"), "\\textasciicircum{}");
        assert_eq!(escape("~"), "\\textasciitilde{}");
    }

    #[test]
    fn test_escape_leaves_other_characters_untouched() {
        let plain = "Jane Doe, Ünïcødé — résumé (2024) <ok> 'quotes' \"dq\" @ ! ? 123";
        assert_eq!(escape(plain), plain);
    }

    #[test]
    fn test_escape_mixed_text() {
        assert_eq!(
            escape("R&D: cut costs 40% for $5M_ARR #1"),
            "R\\&D: cut costs 40\\% for \\$5M\\_ARR \\#1"
        );
    }

    #[test]
    fn test_escape_is_not_idempotent() {
        let once = escape("50%");
        assert_eq!(once, "50\\%");
        assert_eq!(escape(&once), "50\\textbackslash{}\\%");
    }

    /// Every reserved character in the output must come from an escape
    /// sequence, i.e. removing the known sequences leaves none behind.
    #[test]
    fn test_escape_never_leaves_reserved_characters_bare() {
        let input: String = RESERVED.iter().cycle().take(40).collect::<String>() + "abc";
        let escaped = escape(&input);
        let stripped = escaped
            .replace("\\textbackslash{}", "")
            .replace("\\textasciicircum{}", "")
            .replace("\\textasciitilde{}", "")
            .replace("\\%", "")
            .replace("\\$", "")
            .replace("\\_", "")
            .replace("\\{", "")
            .replace("\\}", "")
            .replace("\\&", "")
            .replace("\\#", "");
        assert_eq!(stripped, "abc");
    }

    #[test]
    fn test_date_range_variants() {
        assert_eq!(date_range("Jan 2020", "Mar 2022"), "Jan 2020 -- Mar 2022");
        assert_eq!(date_range("Jan 2020", ""), "Jan 2020 -- Present");
        assert_eq!(date_range("", "2019"), "2019");
        assert_eq!(date_range("  ", " "), "");
    }

    #[test]
    fn test_join_non_empty_skips_blanks() {
        assert_eq!(join_non_empty(["a", "", "  ", "b"], " | "), "a | b");
        assert_eq!(join_non_empty(Vec::<&str>::new(), ", "), "");
    }
}
