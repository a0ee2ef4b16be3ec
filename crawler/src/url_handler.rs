use url::Url;

use crate::error::Error;

/// Normalize a url by stripping any passive parameters that do not change
/// the page content.
///
/// Also strips fragment identifiers (e.g. `https://example.com/data.csv#row=4`
/// is normalized as `https://example.com/data.csv`), since these usually
/// do not change page content.
pub fn normalize_url(url: Url) -> Result<Url, Box<Error>> {
    if url.query().is_none() && url.fragment().is_none() {
        return Ok(url);
    }

    let domain = url.domain();

    let domain = match domain {
        Some(domain) => domain,
        None => return Ok(url),
    };

    let path = url.path();
    let params: Vec<_> = url
        .query_pairs()
        .filter(|(query, _)| !query_is_passive(query))
        .collect();

    let mut url = if !params.is_empty() {
        Url::parse_with_params(format!("https://{}{}", domain, path).as_str(), params)
            .expect("normalized URL must be a valid url")
    } else {
        Url::parse(format!("https://{}{}", domain, path).as_str())
            .expect("normalized URL must be a valid url")
    };

    url.set_fragment(None);

    Ok(url)
}

fn query_is_passive(query: &str) -> bool {
    query.contains("utm") || query == "id" || query == "t"
}

/// The dedupe key used for the visited set: the scheme and a leading `www.`
/// are stripped so that `https://www.muhlenberg.edu` and
/// `http://muhlenberg.edu` are treated as the same page.
pub fn visited_key(url: &Url) -> String {
    let as_str = url.as_str();

    for prefix in ["https://www.", "http://www.", "https://", "http://"] {
        if let Some(stripped) = as_str.strip_prefix(prefix) {
            return stripped.trim_end_matches('/').to_lowercase();
        }
    }

    as_str.trim_end_matches('/').to_lowercase()
}

/// A domain/keyword substring filter applied to every outbound link before
/// it is queued.
#[derive(Clone, Debug)]
pub struct LinkFilter {
    pub allowed_domain: String,
    pub blocked_keyword: Option<String>,
}

impl Default for LinkFilter {
    fn default() -> Self {
        LinkFilter {
            allowed_domain: "muhlenberg.edu".to_string(),
            blocked_keyword: Some("keyword".to_string()),
        }
    }
}

impl LinkFilter {
    /// A link is crawlable if its lowercased form contains the allowed
    /// domain and does not contain the blocked keyword.
    pub fn allows(&self, url: &Url) -> bool {
        let lowercase = url.as_str().to_lowercase();

        if !lowercase.contains(&self.allowed_domain.to_lowercase()) {
            return false;
        }

        if let Some(keyword) = &self.blocked_keyword
            && lowercase.contains(&keyword.to_lowercase())
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    mod normalize_url {
        use url::Url;

        use crate::url_handler::normalize_url;

        #[test]
        fn test_url_with_no_params() {
            let url = Url::parse("https://safe.com").unwrap();

            assert_eq!(normalize_url(url.clone()).unwrap().as_str(), url.as_str());
        }

        #[test]
        fn test_url_with_active_params() {
            let url = Url::parse("https://safe.com?filter=automatic&rating=5").unwrap();

            assert_eq!(normalize_url(url.clone()).unwrap().as_str(), url.as_str());
        }

        #[test]
        fn test_url_with_passive_params() {
            let url =
                Url::parse("https://safe.com?utm_source=newsletter&id=seranking&t=60s").unwrap();

            assert_eq!(
                normalize_url(url.clone()).unwrap().as_str(),
                Url::parse("https://safe.com").unwrap().as_str()
            );
        }

        #[test]
        fn test_url_with_fragment() {
            let url = Url::parse("https://safe.com#Header").unwrap();

            assert_eq!(
                normalize_url(url.clone()).unwrap().as_str(),
                Url::parse("https://safe.com").unwrap().as_str()
            );
        }

        #[test]
        fn test_url_with_fragment_and_params() {
            let url = Url::parse("https://safe.com?utm_source=newsletter&rating=5#Header").unwrap();

            assert_eq!(
                normalize_url(url.clone()).unwrap().as_str(),
                Url::parse("https://safe.com?rating=5").unwrap().as_str()
            );
        }
    }

    mod visited_key {
        use url::Url;

        use crate::url_handler::visited_key;

        #[test]
        fn test_strips_scheme_and_www() {
            let a = Url::parse("https://www.muhlenberg.edu/about").unwrap();
            let b = Url::parse("http://muhlenberg.edu/about").unwrap();

            assert_eq!(visited_key(&a), visited_key(&b));
        }

        #[test]
        fn test_strips_trailing_slash() {
            let a = Url::parse("https://muhlenberg.edu/about").unwrap();
            let b = Url::parse("https://muhlenberg.edu/about/").unwrap();

            assert_eq!(visited_key(&a), visited_key(&b));
        }
    }

    mod link_filter {
        use url::Url;

        use crate::url_handler::LinkFilter;

        #[test]
        fn test_allows_matching_domain() {
            let filter = LinkFilter::default();
            let url = Url::parse("https://www.muhlenberg.edu/admissions").unwrap();

            assert!(filter.allows(&url));
        }

        #[test]
        fn test_rejects_other_domain() {
            let filter = LinkFilter::default();
            let url = Url::parse("https://example.com").unwrap();

            assert!(!filter.allows(&url));
        }

        #[test]
        fn test_rejects_blocked_keyword() {
            let filter = LinkFilter::default();
            let url = Url::parse("https://www.muhlenberg.edu/keyword-stuffed-page").unwrap();

            assert!(!filter.allows(&url));
        }
    }
}
