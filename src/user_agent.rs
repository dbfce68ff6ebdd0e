//! Shared User-Agent string for provider requests.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/yibeichen/pubsync";

/// Default User-Agent for every outbound request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pubsync/{version} (publication-sync; +{PROJECT_UA_URL})")
}
