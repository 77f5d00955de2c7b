use platform_windows::Category;

use super::types::OutputFormat;

pub(super) fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

pub(super) fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(Some(v)))
}

pub(super) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

pub(super) fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "enabled" | "on"
    )
}

pub(super) fn parse_output(raw: &str) -> Option<OutputFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "table" | "text" => Some(OutputFormat::Table),
        "json" => Some(OutputFormat::Json),
        _ => None,
    }
}

pub(super) fn parse_level(raw: &str) -> Option<tracing::Level> {
    raw.trim().parse::<tracing::Level>().ok()
}

/// Parse category names, returning the known ones and the rejects.
pub(super) fn parse_categories<I, S>(names: I) -> (Vec<Category>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut known = Vec::new();
    let mut skipped = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        match name.parse::<Category>() {
            Ok(category) => known.push(category),
            Err(_) => skipped.push(name.to_string()),
        }
    }
    (known, skipped)
}
