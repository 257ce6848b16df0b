//! DOI normalization and paper identity.
//!
//! Evaluation sessions on the same paper are merged by DOI, so two spellings
//! of one DOI must always normalize to the same key.

use super::types::{PaperId, PaperRecord};

const DOI_PREFIXES: [&str; 5] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Normalize a DOI: trim, lowercase, strip resolver prefixes.
///
/// Prefixes are stripped repeatedly so the function is idempotent even for
/// doubled prefixes.
pub fn normalize_doi(raw: &str) -> String {
    let mut doi = raw.trim().to_lowercase();
    while let Some(rest) = DOI_PREFIXES
        .iter()
        .find_map(|prefix| doi.strip_prefix(prefix))
    {
        doi = rest.trim().to_string();
    }
    doi
}

/// Paper identity for a session: normalized DOI, else trimmed token.
///
/// Returns `None` when the session carries neither.
pub fn paper_id(record: &PaperRecord) -> Option<PaperId> {
    let from_doi = record
        .doi
        .as_deref()
        .map(normalize_doi)
        .filter(|doi| !doi.is_empty());

    from_doi
        .or_else(|| {
            record
                .token
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| format!("token:{token}"))
        })
        .map(PaperId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_resolver_prefix_and_case() {
        assert_eq!(
            normalize_doi("https://doi.org/10.1/ABC"),
            normalize_doi("10.1/abc")
        );
        assert_eq!(normalize_doi("  DOI:10.5555/XyZ "), "10.5555/xyz");
        assert_eq!(normalize_doi("http://dx.doi.org/10.1/a"), "10.1/a");
    }

    #[test]
    fn test_idempotent_on_doubled_prefix() {
        let once = normalize_doi("https://doi.org/ https://doi.org/10.1/X");
        assert_eq!(once, "10.1/x");
        assert_eq!(normalize_doi(&once), once);
    }

    #[test]
    fn test_paper_id_falls_back_to_token() {
        let record = PaperRecord {
            doi: Some("   ".into()),
            token: Some("abc123".into()),
            ..Default::default()
        };
        assert_eq!(paper_id(&record), Some(PaperId::new("token:abc123")));
    }

    #[test]
    fn test_paper_id_none_without_doi_or_token() {
        assert_eq!(paper_id(&PaperRecord::default()), None);
    }
}
