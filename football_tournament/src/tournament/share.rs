//! Share links: `<base>?tournament=<id>`.

use super::models::TournamentId;

/// Query parameter carrying the tournament ID
pub const SHARE_PARAM: &str = "tournament";

/// Build a share link for a tournament
pub fn share_link(base_url: &str, tournament_id: &str) -> String {
    let base = base_url.split(['?', '#']).next().unwrap_or(base_url);
    format!("{}?{}={}", base, SHARE_PARAM, tournament_id)
}

/// Extract the tournament ID from a share link or a bare query string.
///
/// Returns `None` when the parameter is absent or empty.
pub fn parse_share_link(link: &str) -> Option<TournamentId> {
    let without_fragment = link.split('#').next().unwrap_or(link);
    let query = match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None => without_fragment,
    };

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
}
