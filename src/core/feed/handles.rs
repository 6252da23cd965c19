// Turn the free-form arguments of `~follow` / `~followremove` into handles.

use lazy_regex::lazy_regex;

static RE_PROFILE_URL: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"twitter\.com/([a-zA-Z0-9_]+)");
static RE_HANDLE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"[a-zA-Z0-9_]+");

/// Extract a handle from a profile link (`https://twitter.com/jack?s=09`)
/// or a bare name (`jack`, `@jack`). Returns `None` for tokens without one.
pub fn extract_handle(token: &str) -> Option<String> {
    if let Some(caps) = RE_PROFILE_URL.captures(token) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    RE_HANDLE.find(token).map(|m| m.as_str().to_string())
}

/// Split command arguments on spaces and extract every handle, in order.
pub fn extract_handles(args: &str) -> Vec<String> {
    args.split(' ').filter_map(extract_handle).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_urls() {
        assert_eq!(
            extract_handle("https://twitter.com/TwitterAPI?s=09").as_deref(),
            Some("TwitterAPI")
        );
        assert_eq!(
            extract_handle("twitter.com/jack").as_deref(),
            Some("jack")
        );
    }

    #[test]
    fn test_bare_names() {
        assert_eq!(extract_handle("jack").as_deref(), Some("jack"));
        assert_eq!(extract_handle("@some_user").as_deref(), Some("some_user"));
        assert_eq!(extract_handle("!!"), None);
        assert_eq!(extract_handle(""), None);
    }

    #[test]
    fn test_mixed_argument_list() {
        let handles = extract_handles(
            "https://twitter.com/Twitter https://twitter.com/TwitterAPI?s=09  jack",
        );
        assert_eq!(handles, vec!["Twitter", "TwitterAPI", "jack"]);
    }
}
