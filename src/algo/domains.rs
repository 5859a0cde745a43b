use url::Url;

/// Publishing site of a link, for tallying web hits by source:
/// - Add `https://` if the scheme is missing
/// - Lowercase the host (the URL parser does this)
/// - Strip a leading `www.`
///
/// Returns `None` for empty input, unparsable links and host-less URLs.
pub fn source_domain(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if !trimmed.contains("://") {
        format!("https://{trimmed}")
    } else {
        trimmed.to_string()
    };

    let parsed = Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
