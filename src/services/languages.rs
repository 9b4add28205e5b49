//! Dubbing language reference data.
//!
//! ISO 639-1 codes mapped to display names for every language the pipeline
//! can translate into. The configured `supported_languages` list is a subset
//! of these codes; anything outside the table is rejected at submission.

use crate::models::dubbing::LanguageInfo;

/// Languages the translation and synthesis providers handle well.
pub const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("hi", "Hindi"),
    ("ar", "Arabic"),
];

/// Display name for a language code, if known.
pub fn display_name(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Display name for a language code, falling back to the code itself.
/// Translation prompts use this so an unknown code still produces a
/// meaningful instruction.
pub fn display_name_or_code(code: &str) -> String {
    display_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

/// Resolve the configured language codes into `{code, name}` pairs,
/// skipping codes the table does not know.
pub fn catalog(supported: &[String]) -> Vec<LanguageInfo> {
    supported
        .iter()
        .filter_map(|code| {
            let code = code.trim().to_lowercase();
            display_name(&code).map(|name| LanguageInfo {
                code,
                name: name.to_string(),
            })
        })
        .collect()
}
