use regex::Regex;
use std::sync::OnceLock;

fn digit_comma() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d),(\d)").expect("static pattern"))
}

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"))
}

/// Turns a layer identifier into a lowercase, hyphen-delimited ASCII slug.
///
/// Non-ASCII text is transliterated first (`Ørland` becomes `orland`), so
/// Norwegian and other accented names keep their letters. Commas inside
/// numbers are dropped (`1,000` becomes `1000`). The result never starts or
/// ends with a hyphen and never contains two in a row; it is empty when the
/// identifier has no letters or digits at all.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text);
    // Applied twice so that overlapping groups like "1,2,3" collapse fully.
    let joined = digit_comma().replace_all(&ascii, "$1$2");
    let joined = digit_comma().replace_all(&joined, "$1$2");
    let lower = joined.to_lowercase();

    disallowed()
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}
