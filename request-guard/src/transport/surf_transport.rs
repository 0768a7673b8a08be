use super::{Transport, TransportResponse};
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::request::{Body, Method, RequestDescriptor};
use ::utils::surf_logging::SurfLogging;
use ::utils::url_builder::build_url;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use surf::http::headers::{HeaderName, HeaderValue, CONTENT_TYPE};
use surf::Client;

impl From<Method> for surf::http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => surf::http::Method::Get,
            Method::Post => surf::http::Method::Post,
            Method::Put => surf::http::Method::Put,
            Method::Patch => surf::http::Method::Patch,
            Method::Delete => surf::http::Method::Delete,
            Method::Head => surf::http::Method::Head,
            Method::Options => surf::http::Method::Options,
        }
    }
}

/// [`Transport`] backed by a surf client.
///
/// Applies the configured base URL, default headers and timeout. Responses
/// outside 2xx become [`TransportError::Status`].
#[derive(Clone)]
pub struct SurfTransport {
    http: Client,
    base_url: Option<String>,
    timeout: Option<Duration>,
    default_headers: BTreeMap<String, String>,
}

impl Default for SurfTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl SurfTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            http: Client::new().with(SurfLogging),
            base_url: config.base_url.clone().filter(|base| !base.is_empty()),
            timeout: config.timeout(),
            default_headers: config.default_headers.clone(),
        }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Translate a descriptor into a surf request without sending it.
    pub fn build_request(&self, request: &RequestDescriptor) -> Result<surf::Request, TransportError> {
        let url = build_url(
            self.base_url.as_deref(),
            request.url(),
            request.params().as_ref(),
        )
        .map_err(|err| TransportError::InvalidRequest(format!("{}: {}", request.url(), err)))?;

        let mut req = surf::Request::new((*request.method()).into(), url);

        match request.body() {
            Body::Empty => {}
            Body::Json(value) => {
                let body = surf::Body::from_json(value)
                    .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;
                req.set_body(body);
            }
            Body::Text { content_type, text } => {
                let content_type = header_value(CONTENT_TYPE.as_str(), content_type)?;
                req.set_body(surf::Body::from_string(text.clone()));
                req.insert_header(CONTENT_TYPE, content_type);
            }
            Body::Bytes {
                content_type,
                bytes,
            } => {
                let content_type = header_value(CONTENT_TYPE.as_str(), content_type)?;
                req.set_body(surf::Body::from_bytes(bytes.clone()));
                req.insert_header(CONTENT_TYPE, content_type);
            }
        }

        // request headers come last so they win over the defaults
        let headers = self
            .default_headers
            .iter()
            .chain(request.headers().iter().map(|(name, value)| (name, value)));
        for (name, value) in headers {
            let header = HeaderName::from_str(name).map_err(|err| {
                TransportError::InvalidRequest(format!("header {}: {}", name, err))
            })?;
            req.insert_header(header, header_value(name, value)?);
        }

        Ok(req)
    }

    async fn exchange(&self, req: surf::Request) -> Result<TransportResponse, TransportError> {
        let mut res = self
            .http
            .send(req)
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = u16::from(res.status());
        let headers = res
            .iter()
            .map(|(name, values)| {
                let joined = values
                    .iter()
                    .map(HeaderValue::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                (name.as_str().to_string(), joined)
            })
            .collect();
        let body = res
            .body_bytes()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        Ok(TransportResponse::new(status, headers, body))
    }
}

// http-types panics on non-ASCII values at insert time, so they are parsed up front.
fn header_value(name: &str, value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|err| TransportError::InvalidRequest(format!("header {}: {}", name, err)))
}

#[async_trait]
impl Transport for SurfTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse, TransportError> {
        let req = self.build_request(&request)?;

        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.exchange(req))
                .await
                .map_err(|_| TransportError::Timeout(limit))??,
            None => self.exchange(req).await?,
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(TransportError::Status {
                status: response.status(),
                body: String::from_utf8_lossy(response.bytes()).into_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transport() -> SurfTransport {
        let mut config = ClientConfig::new("http://localhost:8080");
        config
            .default_headers
            .insert("token".to_string(), "default".to_string());
        config
            .default_headers
            .insert("x-client".to_string(), "dsod".to_string());
        SurfTransport::new(&config)
    }

    fn header(req: &surf::Request, name: &str) -> Option<String> {
        req.header(name).map(|values| values.last().as_str().to_string())
    }

    #[test]
    fn test_build_request_applies_base_url_and_params() {
        let request = RequestDescriptor::get("/dsod/manage/page/alluserlist")
            .with_params(json!({"page": 2, "role": ""}));
        let req = transport().build_request(&request).unwrap();

        assert_eq!(req.method(), surf::http::Method::Get);
        assert_eq!(req.url().path(), "/dsod/manage/page/alluserlist");
        assert_eq!(req.url().host_str(), Some("localhost"));
        let query = req.url().query().unwrap();
        assert!(query.contains("page=2"));
        assert!(query.contains("role="));
    }

    #[test]
    fn test_request_headers_override_defaults() {
        let request = RequestDescriptor::get("/dsod/patients/report").with_header("token", "session");
        let req = transport().build_request(&request).unwrap();

        assert_eq!(header(&req, "token").as_deref(), Some("session"));
        assert_eq!(header(&req, "x-client").as_deref(), Some("dsod"));
    }

    #[test]
    fn test_bytes_body_keeps_content_type() {
        let request = RequestDescriptor::post("/dsod/guest/analyze").with_body(Body::Bytes {
            content_type: "multipart/form-data; boundary=abc".to_string(),
            bytes: b"--abc--".to_vec(),
        });
        let req = transport().build_request(&request).unwrap();

        assert_eq!(req.method(), surf::http::Method::Post);
        assert_eq!(
            header(&req, "content-type").as_deref(),
            Some("multipart/form-data; boundary=abc")
        );
    }

    #[test]
    fn test_non_ascii_header_value_is_invalid() {
        let request = RequestDescriptor::get("/items").with_header("x-user", "张三");
        match transport().build_request(&request) {
            Err(TransportError::InvalidRequest(message)) => assert!(message.contains("x-user")),
            other => panic!("expected invalid request, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_ascii_content_type_is_invalid() {
        let request = RequestDescriptor::post("/dsod/guest/analyze").with_body(Body::Bytes {
            content_type: "multipart/form-data; boundary=边界".to_string(),
            bytes: vec![],
        });
        assert!(matches!(
            transport().build_request(&request),
            Err(TransportError::InvalidRequest(_))
        ));

        let request = RequestDescriptor::post("/ai/chat").with_body(Body::Text {
            content_type: "text/plain; charset=ütf-8".to_string(),
            text: "hi".to_string(),
        });
        assert!(matches!(
            transport().build_request(&request),
            Err(TransportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_non_object_params_are_invalid() {
        let request = RequestDescriptor::get("/items").with_params(json!([1, 2]));
        assert!(matches!(
            transport().build_request(&request),
            Err(TransportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_relative_url_without_base_is_invalid() {
        let transport = SurfTransport::default();
        assert_eq!(transport.base_url(), None);

        let err = transport
            .build_request(&RequestDescriptor::get("/items"))
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[test]
    fn test_timeout_comes_from_config() {
        let mut config = ClientConfig::default();
        assert_eq!(
            SurfTransport::new(&config).timeout(),
            Some(Duration::from_millis(1_000_000))
        );

        config.timeout_ms = 0;
        assert_eq!(SurfTransport::new(&config).timeout(), None);
    }
}
