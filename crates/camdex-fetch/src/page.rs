//! Page decoding and the fetch-all loop.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info};

use camdex_core::{
    camera_id_of, IndexError, Page, PageFetcher, RawCamera, Result, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};

const RECORD_KEYS: &[&str] = &["cameras", "devices"];
const TOKEN_KEYS: &[&str] = &["next_page_token", "nextPageToken", "next_page", "nextPage"];

/// Sniff for an HTML page served in place of JSON (e.g. a web app login).
pub fn looks_like_html(content_type: &str, body: &[u8]) -> bool {
    let ct = content_type.to_ascii_lowercase();
    if ct.contains("text/html") || ct.contains("application/xhtml") {
        return true;
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim().to_ascii_lowercase();
    text.starts_with("<!doctype html")
        || text.starts_with("<html")
        || text.contains("<title>verkada</title>")
}

/// Extract records and the continuation token from a JSON page body.
///
/// Records come from `cameras`, else `devices`; non-object entries are
/// dropped. A body with neither array is an error, never an empty page.
pub fn parse_page(body: &[u8]) -> Result<(Vec<RawCamera>, String)> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| IndexError::unexpected_response(format!("invalid camera JSON: {}", e)))?;

    let Value::Object(root) = value else {
        return Err(IndexError::unexpected_response(
            "camera response is not a JSON object",
        ));
    };

    let items = RECORD_KEYS
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_array))
        .ok_or_else(|| IndexError::unexpected_response("missing cameras array"))?;

    let records: Vec<RawCamera> = items
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect();

    let token = TOKEN_KEYS
        .iter()
        .filter_map(|key| root.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or_default()
        .to_string();

    Ok((records, token))
}

/// Validate a raw HTTP response and decode it into a [`Page`].
pub fn decode_page(status: u16, content_type: &str, body: &[u8]) -> Result<Page> {
    if looks_like_html(content_type, body) {
        return Err(IndexError::unexpected_response(
            "received HTML instead of camera JSON (check the base URL and auth headers)",
        ));
    }
    if status >= 400 {
        return Err(IndexError::RemoteStatus { status });
    }

    let (records, next_page_token) = parse_page(body)?;
    Ok(Page {
        records,
        next_page_token,
        status,
    })
}

/// Fetch every page and return all records sorted by camera ID.
///
/// `page_size` of 0 selects the default; larger values are capped.
/// A continuation token seen earlier in the same run is an error.
pub async fn fetch_all_cameras(
    fetcher: &dyn PageFetcher,
    page_size: u32,
) -> Result<Vec<RawCamera>> {
    let page_size = match page_size {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    };

    let mut all: Vec<RawCamera> = Vec::with_capacity(256);
    let mut token = String::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = fetcher.fetch_page(&token, page_size).await?;
        if page.status >= 400 {
            return Err(IndexError::RemoteStatus {
                status: page.status,
            });
        }

        pages += 1;
        debug!("Fetched page {} with {} records", pages, page.records.len());
        all.extend(page.records);

        let next = page.next_page_token.trim();
        if next.is_empty() {
            break;
        }
        if !seen.insert(next.to_string()) {
            return Err(IndexError::unexpected_response(format!(
                "pagination token {:?} repeated",
                next
            )));
        }
        token = next.to_string();
    }

    all.sort_by_cached_key(camera_id_of);

    info!("Fetched {} cameras in {} pages", all.len(), pages);
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubFetcher {
        pages: Vec<(&'static str, Value, &'static str)>,
        calls: Mutex<Vec<(String, u32)>>,
    }

    impl StubFetcher {
        fn new(pages: Vec<(&'static str, Value, &'static str)>) -> Self {
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch_page(&self, page_token: &str, page_size: u32) -> Result<Page> {
            self.calls
                .lock()
                .unwrap()
                .push((page_token.to_string(), page_size));

            let (_, body, next) = self
                .pages
                .iter()
                .find(|(token, _, _)| *token == page_token)
                .cloned()
                .expect("unexpected page token");

            let records = body
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_object().unwrap().clone())
                .collect();

            Ok(Page {
                records,
                next_page_token: next.to_string(),
                status: 200,
            })
        }
    }

    #[test]
    fn test_parse_cameras_key() {
        let body =
            br#"{"cameras":[{"camera_id":"a"},42,{"camera_id":"b"}],"next_page_token":"t2"}"#;
        let (records, token) = parse_page(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(token, "t2");
    }

    #[test]
    fn test_parse_devices_fallback_and_camel_token() {
        let body = br#"{
            "devices": [{"cameraId": "x"}],
            "nextPageToken": "  ",
            " next_page": "ignored",
            "nextPage": "p3"
        }"#;
        let (records, token) = parse_page(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(token, "p3");
    }

    #[test]
    fn test_parse_requires_records_array() {
        let err = parse_page(br#"{"message":"rate limited"}"#).unwrap_err();
        assert_eq!(err.error_code(), "UNEXPECTED_RESPONSE");
        assert!(err.to_string().contains("missing cameras array"));

        assert!(parse_page(br#"{"cameras":{"camera_id":"a"}}"#).is_err());

        let (records, _) = parse_page(br#"{"cameras":[]}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_page(b"[1,2]").is_err());
        assert!(parse_page(b"not json").is_err());
    }

    #[test]
    fn test_html_detection() {
        assert!(looks_like_html("text/html; charset=utf-8", b"{}"));
        assert!(looks_like_html("", b"  <!DOCTYPE html><html></html>"));
        assert!(looks_like_html("application/json", b"<html><body/></html>"));
        assert!(!looks_like_html("application/json", br#"{"cameras":[]}"#));
        assert!(!looks_like_html("", b""));
    }

    #[test]
    fn test_decode_page_errors() {
        let err = decode_page(200, "text/html", b"<html/>").unwrap_err();
        assert_eq!(err.error_code(), "UNEXPECTED_RESPONSE");

        let err = decode_page(401, "application/json", br#"{"message":"nope"}"#).unwrap_err();
        assert_eq!(err.error_code(), "REMOTE_STATUS");

        let body = br#"{"cameras":[{"id":"z"}]}"#;
        let page = decode_page(200, "application/json", body).unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(page.next_page_token.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_follows_tokens_and_sorts() {
        let fetcher = StubFetcher::new(vec![
            ("", json!([{"camera_id": "cam-3"}, {"camera_id": "cam-1"}]), "p2"),
            ("p2", json!([{"cameraId": "cam-2"}]), ""),
        ]);

        let all = fetch_all_cameras(&fetcher, 0).await.unwrap();
        let ids: Vec<String> = all.iter().map(camera_id_of).collect();
        assert_eq!(ids, vec!["cam-1", "cam-2", "cam-3"]);

        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                (String::new(), DEFAULT_PAGE_SIZE),
                ("p2".to_string(), DEFAULT_PAGE_SIZE)
            ]
        );
    }

    #[tokio::test]
    async fn test_page_size_capped() {
        let fetcher = StubFetcher::new(vec![("", json!([]), "")]);
        fetch_all_cameras(&fetcher, 5_000).await.unwrap();
        assert_eq!(fetcher.calls.lock().unwrap()[0].1, MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_repeated_token_is_an_error() {
        let fetcher = StubFetcher::new(vec![
            ("", json!([]), "loop"),
            ("loop", json!([]), "loop"),
        ]);
        let err = fetch_all_cameras(&fetcher, 10).await.unwrap_err();
        assert_eq!(err.error_code(), "UNEXPECTED_RESPONSE");
    }

    #[tokio::test]
    async fn test_token_cycle_is_an_error() {
        let fetcher = StubFetcher::new(vec![
            ("", json!([{"camera_id": "cam-1"}]), "a"),
            ("a", json!([]), "b"),
            ("b", json!([]), "a"),
        ]);
        let err = fetch_all_cameras(&fetcher, 10).await.unwrap_err();
        assert_eq!(err.error_code(), "UNEXPECTED_RESPONSE");
        assert_eq!(fetcher.calls.lock().unwrap().len(), 3);
    }
}
