use serde_json::{Map, Value};
use url::Url;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum UrlError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),
    /// Only a JSON object maps onto query pairs.
    #[error("query params must be a JSON object, got {0}")]
    InvalidParams(String),
}

/// Resolve `path` against an optional base URL and append `params` as query pairs.
///
/// An absolute `path` ignores the base. Otherwise base and path are concatenated
/// with exactly one `/` between them, so a base carrying a path prefix keeps it.
/// `params`, when present, must be an object.
pub fn build_url(base: Option<&str>, path: &str, params: Option<&Value>) -> Result<Url, UrlError> {
    let mut url = match Url::parse(path) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) if !base.is_empty() => Url::parse(&format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ))?,
            _ => return Err(url::ParseError::RelativeUrlWithoutBase.into()),
        },
        Err(err) => return Err(err.into()),
    };

    if let Some(params) = params {
        let Value::Object(params) = params else {
            return Err(UrlError::InvalidParams(params.to_string()));
        };
        let pairs = query_pairs(params);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
    }

    Ok(url)
}

/// Flatten a JSON object into query pairs.
///
/// `null` values are skipped and arrays repeat their bare key once per element.
pub fn query_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = vec![];
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    pairs.push((key.clone(), scalar(item)));
                }
            }
            other => pairs.push((key.clone(), scalar(other))),
        }
    }
    pairs
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_and_path_are_joined_once() {
        let url = build_url(Some("http://localhost:8080/"), "/dsod/patients/report", None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/dsod/patients/report");

        let url = build_url(Some("http://localhost:8080/api"), "items", None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/items");
    }

    #[test]
    fn test_absolute_path_ignores_base() {
        let url = build_url(Some("http://localhost:8080"), "https://example.org/x", None).unwrap();
        assert_eq!(url.as_str(), "https://example.org/x");
    }

    #[test]
    fn test_relative_path_without_base_fails() {
        assert_eq!(
            build_url(None, "/items", None),
            Err(UrlError::Parse(url::ParseError::RelativeUrlWithoutBase))
        );
        assert_eq!(
            build_url(Some(""), "/items", None),
            Err(UrlError::Parse(url::ParseError::RelativeUrlWithoutBase))
        );
    }

    #[test]
    fn test_non_object_params_are_rejected() {
        for params in [json!([1, 2]), json!("page=1"), json!(3), json!(null)] {
            assert!(matches!(
                build_url(Some("http://h"), "/items", Some(&params)),
                Err(UrlError::InvalidParams(_))
            ));
        }
    }

    #[test]
    fn test_params_are_flattened() {
        let params = json!({
            "page": 1,
            "pageSize": 20,
            "role": "",
            "missing": null,
            "ids": [3, null, 4],
        });
        let url = build_url(Some("http://h"), "/dsod/manage/feedback", Some(&params)).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("page".to_string(), "1".to_string())));
        assert!(pairs.contains(&("pageSize".to_string(), "20".to_string())));
        assert!(pairs.contains(&("role".to_string(), "".to_string())));
        assert!(pairs.contains(&("ids".to_string(), "3".to_string())));
        assert!(pairs.contains(&("ids".to_string(), "4".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "missing"));
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn test_empty_params_leave_no_query() {
        let url = build_url(Some("http://h"), "/items", Some(&json!({}))).unwrap();
        assert_eq!(url.query(), None);
    }
}
