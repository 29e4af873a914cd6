use url::Url;

/// Page numbers advertised by a GitHub `Link` header.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<u32>,
    pub last: Option<u32>,
}

/// Parses `<https://...?page=2>; rel="next", <https://...?page=9>; rel="last"`.
/// Unknown relations and links without a `page` parameter are skipped.
pub fn parse_link_header(header: &str) -> PageLinks {
    let mut links = PageLinks::default();

    for entry in header.split(',') {
        let mut parts = entry.split(';');
        let Some(target) = parts.next() else {
            continue;
        };
        let Some(page) = page_param(target) else {
            continue;
        };

        for param in parts {
            match relation(param) {
                Some("next") => links.next = Some(page),
                Some("last") => links.last = Some(page),
                _ => {}
            }
        }
    }

    links
}

fn page_param(target: &str) -> Option<u32> {
    let raw = target.trim().strip_prefix('<')?.strip_suffix('>')?;
    let url = Url::parse(raw).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

fn relation(param: &str) -> Option<&str> {
    let (name, value) = param.trim().split_once('=')?;
    (name.trim() == "rel").then(|| value.trim().trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_next_and_last() {
        let header = r#"<https://api.github.com/repositories/1/commits?per_page=1&page=2>; rel="next", <https://api.github.com/repositories/1/commits?per_page=1&page=4021>; rel="last""#;

        assert_eq!(
            parse_link_header(header),
            PageLinks {
                next: Some(2),
                last: Some(4021)
            }
        );
    }

    #[test]
    fn test_parse_last_page_has_prev_and_first_only() {
        let header = r#"<https://api.github.com/x?page=3>; rel="prev", <https://api.github.com/x?page=1>; rel="first""#;

        assert_eq!(parse_link_header(header), PageLinks::default());
    }

    #[test]
    fn test_parse_ignores_links_without_page() {
        let header = r#"<https://api.github.com/x?cursor=abc>; rel="next""#;

        assert_eq!(parse_link_header(header), PageLinks::default());
    }

    #[test]
    fn test_parse_empty_header() {
        assert_eq!(parse_link_header(""), PageLinks::default());
    }

    #[test]
    fn test_parse_tolerates_unquoted_relation() {
        let header = "<https://api.github.com/x?page=5>; rel=last";

        assert_eq!(parse_link_header(header).last, Some(5));
    }
}
