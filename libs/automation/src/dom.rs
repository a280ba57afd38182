//! Element-level helpers over the CDP primitives

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use std::time::Duration;
use tracing::debug;

use crate::error::{AutomationError, AutomationResult};
use crate::pacing;

const VISIBLE_AND_ENABLED_FN: &str = r#"
function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    const visible = rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden'
        && style.display !== 'none';
    const enabled = !this.disabled && this.getAttribute('aria-disabled') !== 'true';
    return visible && enabled;
}"#;

const FORCE_CLICK_FN: &str = "function() { this.click(); }";

const DISPATCH_CLICK_FN: &str = r#"
function() {
    this.dispatchEvent(new MouseEvent('click', { bubbles: true, cancelable: true, view: window }));
}"#;

const CLEAR_EDITABLE_FN: &str = r#"
function() {
    this.innerHTML = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
}"#;

/// Whether the element is laid out, not hidden, and not disabled
pub async fn is_visible_and_enabled(element: &Element) -> bool {
    match element.call_js_fn(VISIBLE_AND_ENABLED_FN, false).await {
        Ok(ret) => ret
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// Trimmed visible text, empty when unavailable
pub async fn inner_text(element: &Element) -> String {
    match element.inner_text().await {
        Ok(Some(text)) => text.trim().to_string(),
        _ => String::new(),
    }
}

/// Attribute value, empty when absent
pub async fn attribute(element: &Element, name: &str) -> String {
    match element.attribute(name).await {
        Ok(Some(value)) => value,
        _ => String::new(),
    }
}

/// All elements matching a selector; an unmatched selector is an empty set
pub async fn find_all(page: &Page, selector: &str) -> Vec<Element> {
    page.find_elements(selector).await.unwrap_or_default()
}

/// All descendants of `scope` matching a selector
pub async fn find_all_in(scope: &Element, selector: &str) -> Vec<Element> {
    scope.find_elements(selector).await.unwrap_or_default()
}

/// Click ladder: trusted click, then JS click, then a dispatched
/// MouseEvent. The first non-failing attempt wins.
pub async fn click_with_fallbacks(element: &Element) -> AutomationResult<()> {
    if element.click().await.is_ok() {
        return Ok(());
    }
    debug!("Native click failed, forcing via JS");

    if element.call_js_fn(FORCE_CLICK_FN, false).await.is_ok() {
        return Ok(());
    }
    debug!("Forced click failed, dispatching MouseEvent");

    element
        .call_js_fn(DISPATCH_CLICK_FN, false)
        .await
        .map_err(|e| AutomationError::Browser(format!("all click strategies failed: {}", e)))?;

    Ok(())
}

/// Empty a contenteditable area and fire an input event
pub async fn clear_editable(element: &Element) -> AutomationResult<()> {
    element.call_js_fn(CLEAR_EDITABLE_FN, false).await?;
    Ok(())
}

/// Type character by character with human typing cadence
pub async fn type_text(element: &Element, text: &str) -> AutomationResult<()> {
    element.focus().await?;

    for ch in text.chars() {
        element.type_str(ch.to_string()).await?;
        tokio::time::sleep(pacing::typing_delay()).await;
    }

    Ok(())
}

/// Poll for the first visible element matching any selector, in order,
/// until the timeout lapses
pub async fn wait_for_any(
    page: &Page,
    selectors: &[&str],
    timeout: Duration,
) -> Option<Element> {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        for selector in selectors {
            for element in find_all(page, *selector).await {
                if is_visible_and_enabled(&element).await {
                    return Some(element);
                }
            }
        }

        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Scroll the window by a pixel delta
pub async fn scroll_by(page: &Page, pixels: i64) -> AutomationResult<()> {
    page.evaluate(format!("window.scrollBy(0, {})", pixels))
        .await?;
    Ok(())
}

/// All anchor hrefs on the page containing `fragment`
pub async fn anchor_hrefs_containing(page: &Page, fragment: &str) -> Vec<String> {
    let script = format!(
        r#"Array.from(document.querySelectorAll('a[href*="{}"]')).map(a => a.href)"#,
        fragment
    );

    match page.evaluate(script).await {
        Ok(result) => result.into_value().unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}
