//! Session validation: restore a saved LinkedIn session and confirm it
//! still authenticates

use chromiumoxide::cdp::browser_protocol::network::{CookieParam, CookieSameSite, TimeSinceEpoch};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::browser::{self, BrowserSession};
use crate::error::{AutomationError, AutomationResult};
use crate::selectors::{FEED_URL, is_authenticated_url, is_login_url};

/// A cookie from the persisted session bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

/// The session state restored into a fresh browser context
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub cookies: Vec<SessionCookie>,
    pub local_storage: HashMap<String, String>,
    pub session_storage: HashMap<String, String>,
    pub user_agent: Option<String>,
}

/// Outcome of a validation attempt
pub enum SessionVerdict {
    /// The session authenticates; carries the live session when the
    /// caller asked to keep it open
    Valid {
        session: Option<BrowserSession>,
        reason: String,
    },
    Invalid {
        reason: String,
    },
}

impl SessionVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionVerdict::Valid { .. })
    }
}

/// Restores a persisted session into a profile-scoped context and
/// classifies where the feed navigation lands
pub struct SessionValidator {
    navigation_timeout: Duration,
    /// Grace period for post-load auth redirects
    redirect_grace: Duration,
}

impl Default for SessionValidator {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(45),
            redirect_grace: Duration::from_secs(3),
        }
    }
}

impl SessionValidator {
    pub fn new(navigation_timeout: Duration, redirect_grace: Duration) -> Self {
        Self {
            navigation_timeout,
            redirect_grace,
        }
    }

    /// Validate a session bundle against the authenticated feed
    ///
    /// With `keep_open` the live context is returned for immediate use;
    /// otherwise it is closed and only the verdict survives. Every error
    /// path closes the context.
    pub async fn validate(
        &self,
        profile_dir: &Path,
        data: &SessionData,
        keep_open: bool,
    ) -> SessionVerdict {
        let session = match BrowserSession::launch(profile_dir, data.user_agent.as_deref()).await {
            Ok(session) => session,
            Err(e) => {
                return SessionVerdict::Invalid {
                    reason: format!("browser launch failed: {}", e),
                };
            }
        };

        match self.restore_and_classify(&session, data).await {
            Ok(reason) => {
                info!(reason = %reason, "Session validated");
                if keep_open {
                    SessionVerdict::Valid {
                        session: Some(session),
                        reason,
                    }
                } else {
                    session.close().await;
                    SessionVerdict::Valid {
                        session: None,
                        reason,
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Session validation failed");
                session.close().await;
                SessionVerdict::Invalid {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn restore_and_classify(
        &self,
        session: &BrowserSession,
        data: &SessionData,
    ) -> AutomationResult<String> {
        let page = session.page();

        if !data.cookies.is_empty() {
            page.set_cookies(to_cookie_params(&data.cookies)).await?;
        }

        // Origin storage is not persisted across the about:blank → feed
        // hop; re-inject on every new document
        let script = storage_init_script(&data.local_storage, &data.session_storage);
        page.evaluate_on_new_document(
            AddScriptToEvaluateOnNewDocumentParams::builder()
                .source(script)
                .build()
                .map_err(AutomationError::Browser)?,
        )
        .await?;

        browser::goto_with_timeout(page, FEED_URL, self.navigation_timeout).await?;
        tokio::time::sleep(self.redirect_grace).await;

        let url = browser::current_url(page).await;

        if is_login_url(&url) {
            return Err(AutomationError::SessionInvalid(
                "redirected to login".to_string(),
            ));
        }

        if is_authenticated_url(&url) {
            return Ok(format!("authenticated surface reached: {}", url));
        }

        Err(AutomationError::SessionInvalid(format!(
            "unexpected page: {}",
            url
        )))
    }
}

/// Close a kept-open session, swallowing errors
pub async fn cleanup(session: BrowserSession) {
    session.close().await;
}

fn to_cookie_params(cookies: &[SessionCookie]) -> Vec<CookieParam> {
    cookies
        .iter()
        .filter_map(|cookie| {
            let mut builder = CookieParam::builder()
                .name(&cookie.name)
                .value(&cookie.value)
                .secure(cookie.secure)
                .http_only(cookie.http_only);

            if let Some(ref domain) = cookie.domain {
                builder = builder.domain(domain);
            }
            if let Some(ref path) = cookie.path {
                builder = builder.path(path);
            }
            if let Some(expires) = cookie.expires {
                builder = builder.expires(TimeSinceEpoch::new(expires));
            }
            if let Some(same_site) = cookie.same_site.as_deref().and_then(parse_same_site) {
                builder = builder.same_site(same_site);
            }

            match builder.build() {
                Ok(param) => Some(param),
                Err(e) => {
                    warn!(cookie = %cookie.name, error = %e, "Skipping unbuildable cookie");
                    None
                }
            }
        })
        .collect()
}

fn parse_same_site(value: &str) -> Option<CookieSameSite> {
    match value.to_lowercase().as_str() {
        "strict" => Some(CookieSameSite::Strict),
        "lax" => Some(CookieSameSite::Lax),
        "none" | "no_restriction" => Some(CookieSameSite::None),
        _ => None,
    }
}

/// JS injected before every document: replays both storage scopes
fn storage_init_script(
    local_storage: &HashMap<String, String>,
    session_storage: &HashMap<String, String>,
) -> String {
    let local_json = serde_json::to_string(local_storage).unwrap_or_else(|_| "{}".to_string());
    let session_json = serde_json::to_string(session_storage).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"(() => {{
    try {{
        const localEntries = {local_json};
        for (const [key, value] of Object.entries(localEntries)) {{
            window.localStorage.setItem(key, value);
        }}
        const sessionEntries = {session_json};
        for (const [key, value] of Object.entries(sessionEntries)) {{
            window.sessionStorage.setItem(key, value);
        }}
    }} catch (e) {{}}
}})();"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_script_embeds_entries() {
        let mut local = HashMap::new();
        local.insert("li_theme".to_string(), "dark".to_string());
        let mut session = HashMap::new();
        session.insert("sid".to_string(), "abc123".to_string());

        let script = storage_init_script(&local, &session);

        assert!(script.contains("li_theme"));
        assert!(script.contains("dark"));
        assert!(script.contains("abc123"));
        assert!(script.contains("localStorage.setItem"));
        assert!(script.contains("sessionStorage.setItem"));
    }

    #[test]
    fn test_storage_script_escapes_via_json() {
        let mut local = HashMap::new();
        local.insert("k".to_string(), "va\"lue".to_string());

        let script = storage_init_script(&local, &HashMap::new());
        assert!(script.contains(r#"va\"lue"#));
    }

    #[test]
    fn test_parse_same_site() {
        assert_eq!(parse_same_site("Lax"), Some(CookieSameSite::Lax));
        assert_eq!(parse_same_site("STRICT"), Some(CookieSameSite::Strict));
        assert_eq!(parse_same_site("no_restriction"), Some(CookieSameSite::None));
        assert_eq!(parse_same_site("weird"), None);
    }

    #[test]
    fn test_cookie_params_skip_nameless() {
        let cookies = vec![
            SessionCookie {
                name: "li_at".to_string(),
                value: "token".to_string(),
                domain: Some(".linkedin.com".to_string()),
                path: Some("/".to_string()),
                expires: Some(1_900_000_000.0),
                http_only: true,
                secure: true,
                same_site: Some("Lax".to_string()),
            },
        ];

        let params = to_cookie_params(&cookies);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "li_at");
    }
}
