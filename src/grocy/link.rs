//! Deep link into the Grocy web UI's chores overview.

/// Build the chores overview URL from the configured API URL.
///
/// A trailing `/api` is removed so the link points at the web UI root. The
/// `user` filter is only added for a known, positive user id.
pub fn web_link(grocy_url: &str, user_id: Option<i64>) -> String {
    let trimmed = grocy_url.trim_end_matches('/');
    let base = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    match user_id {
        Some(id) if id > 0 => format!("{}/choresoverview?user={}", base, id),
        _ => format!("{}/choresoverview", base),
    }
}
