use url::Url;

/// Resolve a requested post-auth destination against the app's base URL.
///
/// Path-relative targets are joined onto `base_url`, absolute targets on the same
/// origin pass through, and everything else (other origins, unparsable input,
/// ASCII control characters) falls back to `base_url`.
pub fn normalize_redirect(url: &str, base_url: &str) -> String {
    if url.chars().any(|c| c.is_ascii_control()) {
        return base_url.to_string();
    }

    if url.starts_with('/') {
        return format!("{}{}", base_url.trim_end_matches('/'), url);
    }

    if same_origin(url, base_url) {
        return url.to_string();
    }

    base_url.to_string()
}

fn same_origin(url: &str, base_url: &str) -> bool {
    match (Url::parse(url), Url::parse(base_url)) {
        (Ok(target), Ok(base)) => {
            let origin = target.origin();
            origin.is_tuple() && origin == base.origin()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://app.example";

    #[test]
    fn test_relative_path_joined() {
        assert_eq!(
            normalize_redirect("/dashboard", BASE),
            "https://app.example/dashboard"
        );
    }

    #[test]
    fn test_relative_path_with_trailing_slash_base() {
        assert_eq!(
            normalize_redirect("/dashboard?tab=mail", "https://app.example/"),
            "https://app.example/dashboard?tab=mail"
        );
    }

    #[test]
    fn test_foreign_origin_rejected() {
        assert_eq!(normalize_redirect("https://evil.example/phish", BASE), BASE);
    }

    #[test]
    fn test_same_origin_passes_through() {
        assert_eq!(
            normalize_redirect("https://app.example/x", BASE),
            "https://app.example/x"
        );
    }

    #[test]
    fn test_lookalike_hosts_rejected() {
        assert_eq!(normalize_redirect("https://app.example.evil.com/x", BASE), BASE);
        assert_eq!(normalize_redirect("https://app.example@evil.com/x", BASE), BASE);
        assert_eq!(normalize_redirect("http://app.example/x", BASE), BASE);
        assert_eq!(normalize_redirect("https://app.example:8443/x", BASE), BASE);
    }

    #[test]
    fn test_malformed_input_falls_back() {
        assert_eq!(normalize_redirect("", BASE), BASE);
        assert_eq!(normalize_redirect("dashboard", BASE), BASE);
        assert_eq!(normalize_redirect("javascript:alert(1)", BASE), BASE);
        assert_eq!(normalize_redirect("https://app.example/x", "not a url"), "not a url");
    }

    #[test]
    fn test_control_characters_fall_back() {
        assert_eq!(normalize_redirect("/x\r\nX: 1", BASE), BASE);
        assert_eq!(normalize_redirect("/x\0", BASE), BASE);
        assert_eq!(normalize_redirect("https://app.example/\tx", BASE), BASE);
    }
}
