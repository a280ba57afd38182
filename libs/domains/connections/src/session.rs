use automation::{SessionCookie, SessionData};
use domain_accounts::SessionBundle;

/// Map a persisted account session bundle into the automation layer's
/// session input
pub fn to_session_data(bundle: &SessionBundle) -> SessionData {
    SessionData {
        cookies: bundle
            .cookies
            .iter()
            .map(|cookie| SessionCookie {
                name: cookie.name.clone(),
                value: cookie.value.clone(),
                domain: cookie.domain.clone(),
                path: cookie.path.clone(),
                expires: cookie.expires,
                http_only: cookie.http_only,
                secure: cookie.secure,
                same_site: cookie.same_site.clone(),
            })
            .collect(),
        local_storage: bundle.local_storage.clone(),
        session_storage: bundle.session_storage.clone(),
        user_agent: bundle.user_agent.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_conversion_preserves_fields() {
        let bundle = SessionBundle {
            cookies: vec![domain_accounts::SessionCookie {
                name: "li_at".to_string(),
                value: "token".to_string(),
                domain: Some(".linkedin.com".to_string()),
                path: Some("/".to_string()),
                expires: Some(1_900_000_000.0),
                http_only: true,
                secure: true,
                same_site: Some("Lax".to_string()),
            }],
            local_storage: [("k".to_string(), "v".to_string())].into(),
            session_storage: Default::default(),
            user_agent: Some("Mozilla/5.0".to_string()),
        };

        let data = to_session_data(&bundle);
        assert_eq!(data.cookies.len(), 1);
        assert_eq!(data.cookies[0].name, "li_at");
        assert!(data.cookies[0].http_only);
        assert_eq!(data.local_storage.get("k").map(String::as_str), Some("v"));
        assert_eq!(data.user_agent.as_deref(), Some("Mozilla/5.0"));
    }
}
