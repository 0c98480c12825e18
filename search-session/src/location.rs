//! Deep-link locations: `/?search=<query>` is the only persisted client state.

use url::{Position, Url};

/// Origin used to resolve relative locations.
const LOCAL_ORIGIN: &str = "http://localhost/";

/// Location that reopens the search page on `query`. Page numbers are never encoded.
pub fn search_location(query: &str) -> String {
    let query = format!("search={}", urlencoding::encode(query));
    match Url::parse(LOCAL_ORIGIN) {
        Ok(mut loc) => {
            loc.set_query(Some(&query));
            loc[Position::BeforePath..].to_string()
        }
        Err(_) => format!("/?{query}"),
    }
}

/// Extracts the `search` parameter from a location or full URL.
///
/// Returns `None` when the location does not parse or the parameter is
/// missing or empty.
pub fn query_from_location(location: &str) -> Option<String> {
    let url = Url::parse(LOCAL_ORIGIN).ok()?.join(location).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "search")
        .map(|(_, v)| v.into_owned())
        .filter(|s| !s.is_empty())
}
