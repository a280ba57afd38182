use regex::Regex;
use std::sync::LazyLock;

static PROFILE_USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)linkedin\.com/in/([^/?#]+)").expect("profile username pattern is valid")
});

static PATH_USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/in/([^/?#]+)").expect("path username pattern is valid"));

/// Extract the lowercased profile username from a LinkedIn URL
///
/// Accepts full URLs and bare `/in/<name>` paths; trailing slashes,
/// query strings and fragments are ignored.
pub fn extract_username(url: &str) -> Option<String> {
    PROFILE_USERNAME
        .captures(url)
        .or_else(|| PATH_USERNAME.captures(url))
        .map(|caps| caps[1].to_lowercase())
}

/// Canonical profile URL: `https://www.linkedin.com/in/<username>/`
///
/// The username is the cross-campaign equality key; everything else in
/// the URL is presentation.
pub fn normalize_profile_url(url: &str) -> Option<String> {
    extract_username(url).map(|username| format!("https://www.linkedin.com/in/{}/", username))
}

/// Whether two URLs point at the same profile
pub fn same_profile(a: &str, b: &str) -> bool {
    match (extract_username(a), extract_username(b)) {
        (Some(ua), Some(ub)) => ua == ub,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_username_variants() {
        assert_eq!(
            extract_username("https://www.linkedin.com/in/jane-doe-123/"),
            Some("jane-doe-123".to_string())
        );
        assert_eq!(
            extract_username("https://linkedin.com/in/JaneDoe?trk=profile"),
            Some("janedoe".to_string())
        );
        assert_eq!(
            extract_username("/in/jane.doe#about"),
            Some("jane.doe".to_string())
        );
        assert_eq!(extract_username("https://example.com/jane"), None);
    }

    #[test]
    fn test_normalize_profile_url() {
        assert_eq!(
            normalize_profile_url("https://LinkedIn.com/in/Jane-Doe?src=feed"),
            Some("https://www.linkedin.com/in/jane-doe/".to_string())
        );
        assert_eq!(normalize_profile_url("not a profile"), None);
    }

    #[test]
    fn test_normalize_is_stable_under_extraction() {
        let url = "https://www.linkedin.com/in/Jane-Doe/?utm=x";
        let normalized = normalize_profile_url(url).unwrap();
        assert_eq!(extract_username(&normalized), extract_username(url));
    }

    #[test]
    fn test_same_profile() {
        assert!(same_profile(
            "https://www.linkedin.com/in/jane-doe/",
            "https://linkedin.com/in/JANE-DOE?x=1"
        ));
        assert!(!same_profile(
            "https://www.linkedin.com/in/jane-doe/",
            "https://www.linkedin.com/in/john-smith/"
        ));
        // Non-profile URLs fall back to exact comparison
        assert!(same_profile("opaque", "opaque"));
    }
}
