use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::{CompositorError, ConfigError, FetchError, Result};

/// Web image-search backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Bing,
    Google,
    Baidu,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Bing, Provider::Google, Provider::Baidu];

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Bing => "bing",
            Provider::Google => "google",
            Provider::Baidu => "baidu",
        }
    }

    /// Search endpoint queried page by page
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Provider::Bing => "https://www.bing.com/images/async",
            Provider::Google => "https://www.google.com/search",
            Provider::Baidu => "https://image.baidu.com/search/acjson",
        }
    }

    /// Results returned per page
    pub fn page_size(&self) -> usize {
        match self {
            Provider::Bing => 35,
            Provider::Google => 100,
            Provider::Baidu => 30,
        }
    }

    /// URL of result page `page` (zero-based) for `query`
    pub fn search_url(&self, endpoint: &str, query: &str, page: usize) -> Result<Url> {
        let offset = (page * self.page_size()).to_string();
        let page_size = self.page_size().to_string();
        let page_index = page.to_string();

        let params: Vec<(&str, &str)> = match self {
            Provider::Bing => vec![
                ("q", query),
                ("first", &offset),
                ("count", &page_size),
                ("adlt", "off"),
            ],
            Provider::Google => vec![
                ("q", query),
                ("tbm", "isch"),
                ("ijn", &page_index),
                ("start", &offset),
            ],
            Provider::Baidu => vec![
                ("tn", "resultjson_com"),
                ("ipn", "rj"),
                ("word", query),
                ("queryWord", query),
                ("pn", &offset),
                ("rn", &page_size),
                ("ie", "utf-8"),
                ("oe", "utf-8"),
            ],
        };

        Url::parse_with_params(endpoint, &params).map_err(|_| {
            FetchError::InvalidUrl { url: endpoint.to_string() }.into()
        })
    }

    /// Pull full-size image URLs out of a result page, in page order
    pub fn parse_image_urls(&self, body: &str) -> Vec<String> {
        let mut urls: Vec<String> = match self {
            Provider::Bing => capture_all(bing_pattern(), body, unescape_html),
            Provider::Google => capture_all(google_pattern(), body, unescape_js),
            Provider::Baidu => parse_baidu(body),
        };

        let mut seen = std::collections::HashSet::new();
        urls.retain(|url| url.starts_with("http") && seen.insert(url.clone()));
        urls
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bing" => Ok(Provider::Bing),
            "google" => Ok(Provider::Google),
            "baidu" => Ok(Provider::Baidu),
            _ => Err(ConfigError::UnsupportedProvider { name: s.to_string() }.into()),
        }
    }
}

fn bing_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"murl(?:&quot;|"):(?:&quot;|")(.+?)(?:&quot;|")"#)
            .expect("bing murl regex should compile")
    })
}

fn google_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\["(https?://[^"]+?\.(?i:jpe?g|png|webp|bmp|tiff?)[^"]*)",\d+,\d+\]"#)
            .expect("google image url regex should compile")
    })
}

/// First capture group of every match, passed through `unescape`
fn capture_all(pattern: &Regex, body: &str, unescape: fn(&str) -> String) -> Vec<String> {
    pattern.captures_iter(body).map(|c| unescape(&c[1])).collect()
}

fn parse_baidu(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Vec::new();
    };

    value
        .get("data")
        .and_then(|data| data.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    ["middleURL", "thumbURL"]
                        .iter()
                        .find_map(|key| item.get(*key).and_then(|v| v.as_str()))
                        .filter(|url| !url.is_empty())
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn unescape_html(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn unescape_js(value: &str) -> String {
    value
        .replace("\\u003d", "=")
        .replace("\\u0026", "&")
        .replace("\\/", "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("bing".parse::<Provider>().unwrap(), Provider::Bing);
        assert_eq!("Google".parse::<Provider>().unwrap(), Provider::Google);
        assert_eq!(" baidu ".parse::<Provider>().unwrap(), Provider::Baidu);

        let err = "yahoo".parse::<Provider>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_names_round_trip() {
        for provider in Provider::ALL {
            assert_eq!(provider.to_string().parse::<Provider>().unwrap(), provider);
        }
    }

    #[test]
    fn test_bing_search_url() {
        let url = Provider::Bing
            .search_url(Provider::Bing.default_endpoint(), "sunset beach", 2)
            .unwrap();
        assert_eq!(url.host_str(), Some("www.bing.com"));
        let query = url.query().unwrap();
        assert!(query.contains("q=sunset+beach"));
        assert!(query.contains("first=70"));
    }

    #[test]
    fn test_bing_parsing() {
        let body = r#"<a class="iusc" m="{&quot;murl&quot;:&quot;https://a.example/1.jpg?x=1&amp;y=2&quot;,&quot;turl&quot;:&quot;t&quot;}"></a>
<a class="iusc" m="{&quot;murl&quot;:&quot;https://b.example/2.png&quot;}"></a>
<a class="iusc" m="{&quot;murl&quot;:&quot;https://b.example/2.png&quot;}"></a>"#;
        assert_eq!(
            Provider::Bing.parse_image_urls(body),
            vec!["https://a.example/1.jpg?x=1&y=2", "https://b.example/2.png"]
        );
    }

    #[test]
    fn test_google_parsing() {
        let body = r#"AF_initDataCallback([1,["https://img.example/cat.JPG",900,1200],["https://img.example/page.html",1,1],["https://img.example/dog.png?w=400&h=300",400,300]]);"#;
        assert_eq!(
            Provider::Google.parse_image_urls(body),
            vec![
                "https://img.example/cat.JPG",
                "https://img.example/dog.png?w=400&h=300"
            ]
        );
    }

    #[test]
    fn test_baidu_parsing() {
        let body = r#"{"data":[{"thumbURL":"https://t.example/1.jpg","middleURL":"https://m.example/1.jpg"},{"thumbURL":"https://t.example/2.jpg"},{}]}"#;
        assert_eq!(
            Provider::Baidu.parse_image_urls(body),
            vec!["https://m.example/1.jpg", "https://t.example/2.jpg"]
        );
        assert!(Provider::Baidu.parse_image_urls("<html>").is_empty());
    }
}
