use url::Url;

/// Resolves `href` against `base`.
///
/// Absolute hrefs are returned unchanged. A relative href is joined onto
/// `base` when `base` parses as an absolute URL; otherwise (no base, or a
/// base that is itself relative) the href is returned as written and a
/// debug event is logged.
///
/// # Examples
///
/// ```
/// use atomutil::util::resolve_href;
///
/// assert_eq!(
///     resolve_href(Some("http://example.org/app/service"), "cats.xml"),
///     "http://example.org/app/cats.xml"
/// );
/// assert_eq!(resolve_href(None, "cats.xml"), "cats.xml");
/// ```
pub fn resolve_href(base: Option<&str>, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    let Some(base) = base else {
        return href.to_string();
    };
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::debug!(base = %base, href = %href, error = %e, "Cannot resolve relative href");
            href.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_href_unchanged() {
        assert_eq!(
            resolve_href(Some("http://example.org/"), "https://other.example/x"),
            "https://other.example/x"
        );
    }

    #[test]
    fn test_relative_href_joined() {
        assert_eq!(
            resolve_href(Some("http://example.org/blog/service.xml"), "/cats"),
            "http://example.org/cats"
        );
        assert_eq!(
            resolve_href(Some("http://example.org/blog/"), "entries/1"),
            "http://example.org/blog/entries/1"
        );
    }

    #[test]
    fn test_relative_base_leaves_href() {
        assert_eq!(resolve_href(Some("service.xml"), "cats"), "cats");
    }
}
