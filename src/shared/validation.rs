use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches any text holding at least one non-whitespace character
    /// - Valid: "Safety", "  HR basics "
    /// - Invalid: "", "   ", "\t\n"
    pub static ref NON_BLANK_REGEX: Regex = Regex::new(r"\S").unwrap();
}
