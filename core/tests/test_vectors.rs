//! Verify request building and response parsing against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use serde_json::Value;
use tasklist_core::client::parse_response;
use tasklist_core::{HttpClient, HttpError, HttpMethod, HttpResponse};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let client = HttpClient::new(vectors["base_url"].as_str().unwrap());
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let body = Some(&case["body"]).filter(|b| !b.is_null());

        let req = client
            .build_request(method, case["path"].as_str().unwrap(), body)
            .unwrap();
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.method.as_str(), case["method"], "{name}: method name");
        assert_eq!(req.url, case["expected_url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.header("content-type"), Some("application/json"), "{name}: content-type");
        assert_eq!(req.header("accept"), Some("application/json"), "{name}: accept");

        match body {
            Some(expected) => {
                let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&sent, expected, "{name}: body");
            }
            None => assert!(req.body.is_none(), "{name}: body should be absent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let headers = case["content_type"]
            .as_str()
            .map(|ct| vec![("Content-Type".to_string(), ct.to_string())])
            .unwrap_or_default();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers,
            body: case["body"].as_str().unwrap().to_string(),
        };

        let result = parse_response::<Value>(response);
        if let Some(expected) = case.get("expected_error") {
            let expected = HttpError::new(
                expected["message"].as_str().unwrap(),
                expected["status"].as_u64().unwrap() as u16,
            );
            assert_eq!(result.unwrap_err(), expected, "{name}: error");
        } else {
            assert_eq!(result.unwrap(), case["expected_value"], "{name}: value");
        }
    }
}
