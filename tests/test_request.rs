use rotor::http::request::{Method, Request, RequestBuilder};

fn request_with_headers(headers: Vec<(&str, &str)>) -> Request {
    Request {
        method: Method::GET,
        path: "/".to_string(),
        version: "HTTP/1.1".to_string(),
        headers: headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: vec![],
    }
}

#[test]
fn test_request_header_retrieval() {
    let req = request_with_headers(vec![
        ("Host", "example.com"),
        ("Content-Type", "application/json"),
    ]);

    assert_eq!(req.header("Host"), Some("example.com"));
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_header_lookup_case_insensitive() {
    let req = request_with_headers(vec![("X-Test", "v1")]);

    assert_eq!(req.header("x-test"), Some("v1"));
    assert_eq!(req.header("X-TEST"), Some("v1"));
}

#[test]
fn test_request_duplicate_header_first_wins() {
    let req = request_with_headers(vec![("X-Tag", "one"), ("X-Tag", "two")]);

    assert_eq!(req.header("X-Tag"), Some("one"));
}

#[test]
fn test_request_content_length_parsing() {
    let req = request_with_headers(vec![("Content-Length", "42")]);

    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_request_content_length_missing() {
    let req = request_with_headers(vec![]);

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_content_length_invalid() {
    let req = request_with_headers(vec![("Content-Length", "not-a-number")]);

    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_keep_alive_http11_default() {
    // HTTP/1.1 defaults to keep-alive
    let req = request_with_headers(vec![]);

    assert!(req.keep_alive());
}

#[test]
fn test_request_keep_alive_explicit_header() {
    let req = request_with_headers(vec![("Connection", "keep-alive")]);

    assert!(req.keep_alive());
}

#[test]
fn test_request_keep_alive_close() {
    let req = request_with_headers(vec![("Connection", "close")]);

    assert!(!req.keep_alive());
}

#[test]
fn test_request_keep_alive_case_insensitive() {
    let req = request_with_headers(vec![("Connection", "Keep-Alive")]);

    assert!(req.keep_alive());
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Method::GET);
    assert_eq!(Method::from_str("POST"), Method::POST);
    // Anything else is carried through verbatim
    assert_eq!(Method::from_str("PURGE"), Method::Other("PURGE".to_string()));
    assert_eq!(Method::from_str("get"), Method::Other("get".to_string()));
}

#[test]
fn test_request_method_as_str_round_trip() {
    assert_eq!(Method::from_str("DELETE").as_str(), "DELETE");
    assert_eq!(Method::from_str("PURGE").as_str(), "PURGE");
}

#[test]
fn test_request_builder() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("/api")
        .header("X-Test", "v1")
        .header("X-Test", "v2")
        .body(b"hello".to_vec())
        .build()
        .unwrap();

    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/api");
    assert_eq!(req.version, "HTTP/1.1"); // default
    assert_eq!(req.headers.len(), 2);
    assert_eq!(req.body, b"hello".to_vec());
}

#[test]
fn test_request_builder_missing_method() {
    let result = RequestBuilder::new().path("/").build();

    assert!(result.is_err());
}
