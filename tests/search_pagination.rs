#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use mockito::Matcher;
use serde_json::json;

use guildgrep::api::SearchClient;
use guildgrep::search::{self, SearchOutcome};

const GUILD_ID: &str = "1037340874172014652";

fn client(server: &mockito::Server) -> SearchClient {
    SearchClient::with_base_url("secret-token", &server.url()).unwrap()
}

fn message(n: usize) -> serde_json::Value {
    json!([{
        "timestamp": format!("2025-01-01T00:00:{:02}Z", n % 60),
        "author": {"username": format!("user{n}"), "discriminator": "1234"},
        "content": format!("message {n}")
    }])
}

fn page_body(count: usize, start: usize) -> String {
    let messages: Vec<serde_json::Value> = (start..start + count).map(message).collect();
    json!({"messages": messages, "total_results": 60}).to_string()
}

fn mock_page(server: &mut mockito::Server, offset: usize, body: &str) -> mockito::Mock {
    server
        .mock("GET", format!("/guilds/{GUILD_ID}/messages/search").as_str())
        .match_query(Matcher::UrlEncoded("offset".into(), offset.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create()
}

// --- pagination ---

#[test]
fn paginates_until_empty_page() {
    let mut server = mockito::Server::new();
    let mocks = [
        mock_page(&mut server, 0, &page_body(25, 0)),
        mock_page(&mut server, 25, &page_body(25, 25)),
        mock_page(&mut server, 50, &page_body(10, 50)),
        mock_page(&mut server, 60, &page_body(0, 0)),
    ];

    let mut out = Vec::new();
    let outcome = search::run(&client(&server), GUILD_ID, "needle", &mut out, false).unwrap();

    match outcome {
        SearchOutcome::Exhausted { total } => assert_eq!(total, 60),
        other => panic!("expected Exhausted, got {other:?}"),
    }
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 60);
    assert!(text.lines().next().unwrap().contains("user0#1234: message 0"));
    for mock in &mocks {
        mock.assert();
    }
}

#[test]
fn empty_first_page_fetches_nothing() {
    let mut server = mockito::Server::new();
    let mock = mock_page(&mut server, 0, &page_body(0, 0));

    let mut out = Vec::new();
    let outcome = search::run(&client(&server), GUILD_ID, "needle", &mut out, false).unwrap();

    match outcome {
        SearchOutcome::Exhausted { total } => assert_eq!(total, 0),
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert!(out.is_empty());
    mock.assert();
}

#[test]
fn skips_empty_entries_and_advances_by_actual_count() {
    let mut server = mockito::Server::new();
    let body = json!({
        "messages": [message(0), json!([]), message(1)],
        "total_results": 2
    })
    .to_string();
    let first = mock_page(&mut server, 0, &body);
    // Two entries flattened, so the next request lands at offset 2.
    let second = mock_page(&mut server, 2, &page_body(0, 0));

    let mut out = Vec::new();
    let outcome = search::run(&client(&server), GUILD_ID, "needle", &mut out, false).unwrap();

    assert_eq!(outcome.total(), 2);
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    first.assert();
    second.assert();
}

// --- error handling ---

#[test]
fn transport_error_on_page_two_keeps_page_one() {
    let mut server = mockito::Server::new();
    let ok = mock_page(&mut server, 0, &page_body(25, 0));
    let failing = server
        .mock("GET", format!("/guilds/{GUILD_ID}/messages/search").as_str())
        .match_query(Matcher::UrlEncoded("offset".into(), "25".into()))
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "You are being rate limited.", "retry_after": 1.2}"#)
        .expect(1)
        .create();

    let mut out = Vec::new();
    let outcome = search::run(&client(&server), GUILD_ID, "needle", &mut out, false).unwrap();

    match outcome {
        SearchOutcome::TransportError { total, error } => {
            assert_eq!(total, 25);
            let text = error.to_string();
            assert!(text.contains("429"), "error should mention status: {text}");
            assert!(
                text.contains("rate limited"),
                "error should carry the server payload: {text}"
            );
        }
        other => panic!("expected TransportError, got {other:?}"),
    }
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 25);
    ok.assert();
    failing.assert();
}

#[test]
fn non_json_error_body_surfaced_as_raw_text() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", format!("/guilds/{GUILD_ID}/messages/search").as_str())
        .match_query(Matcher::Any)
        .with_status(502)
        .with_header("content-type", "text/html")
        .with_body("bad gateway, try later")
        .expect(1)
        .create();

    let mut out = Vec::new();
    let outcome = search::run(&client(&server), GUILD_ID, "needle", &mut out, false).unwrap();

    match outcome {
        SearchOutcome::TransportError { total, error } => {
            assert_eq!(total, 0);
            let text = error.to_string();
            assert!(text.contains("502"), "got: {text}");
            assert!(text.contains("bad gateway, try later"), "got: {text}");
        }
        other => panic!("expected TransportError, got {other:?}"),
    }
    assert!(out.is_empty());
    mock.assert();
}

// --- request shape ---

#[test]
fn sends_token_and_fixed_query_params() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", format!("/guilds/{GUILD_ID}/messages/search").as_str())
        .match_header("authorization", "secret-token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("content".into(), "hello world".into()),
            Matcher::UrlEncoded("include_nsfw".into(), "true".into()),
            Matcher::UrlEncoded("limit".into(), "25".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(&page_body(0, 0))
        .expect(1)
        .create();

    let mut out = Vec::new();
    let outcome =
        search::run(&client(&server), GUILD_ID, "hello world", &mut out, false).unwrap();

    assert_eq!(outcome.total(), 0);
    mock.assert();
}

#[test]
fn newline_in_content_stays_on_one_line() {
    let mut server = mockito::Server::new();
    let body = json!({
        "messages": [[{
            "timestamp": "2025-01-01T00:00:00Z",
            "author": {"username": "alice", "discriminator": "1234"},
            "content": "first line\nsecond line"
        }]],
        "total_results": 1
    })
    .to_string();
    let first = mock_page(&mut server, 0, &body);
    let second = mock_page(&mut server, 1, &page_body(0, 0));

    let mut out = Vec::new();
    let outcome = search::run(&client(&server), GUILD_ID, "line", &mut out, false).unwrap();

    assert_eq!(outcome.total(), 1);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert_eq!(
        text.trim_end(),
        "[2025-01-01T00:00:00Z] alice#1234: first line second line"
    );
    first.assert();
    second.assert();
}
