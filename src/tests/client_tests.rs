/// Tests for backend and price-API payload handling and URL building.
use std::collections::HashMap;

use reqwest::StatusCode;
use rust_decimal_macros::dec;

use chrono::{TimeZone, Utc};

use crate::backend::{error_message, parse_created, parse_player, table_url, SupabaseBackend};
use crate::config::Config;
use crate::error::GameError;
use crate::price::parse_price;

fn test_config(url: &str) -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("SUPABASE_URL", url),
        ("SUPABASE_ANON_KEY", "anon"),
        ("BTC_PRICE_API", "https://prices.example/btc"),
    ]);
    Config::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap()
}

// ── players table ─────────────────────────────────────────────────────────────

#[test]
fn created_row_with_uuid_id() {
    let body = r#"[{"id":"6f1c2f4e-8a7b-4c55-9d2e-1f0a9b3c7d11","score":0,"updated_at":"2024-05-01T12:00:00+00:00"}]"#;
    let player = parse_created(body).unwrap();
    assert_eq!(player.id, "6f1c2f4e-8a7b-4c55-9d2e-1f0a9b3c7d11");
    assert_eq!(player.score, 0);
    assert_eq!(player.updated_at, Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
}

#[test]
fn created_row_with_numeric_id() {
    let player = parse_created(r#"[{"id":42,"score":0}]"#).unwrap();
    assert_eq!(player.id, "42");
    assert_eq!(player.updated_at, None);
}

#[test]
fn create_with_no_rows_is_an_error() {
    assert!(matches!(parse_created("[]"), Err(GameError::Backend(_))));
}

#[test]
fn create_with_null_id_is_an_error() {
    assert!(matches!(parse_created(r#"[{"id":null,"score":0}]"#), Err(GameError::Backend(_))));
}

#[test]
fn player_read_returns_first_row() {
    let body = r#"[{"id":"p7","score":-3,"updated_at":"2024-05-01T12:00:00.123456+00:00"}]"#;
    let player = parse_player(body, "read").unwrap().unwrap();
    assert_eq!(player.id, "p7");
    assert_eq!(player.score, -3);
    assert!(player.updated_at.is_some());
}

#[test]
fn player_read_with_no_rows_is_unknown_player() {
    assert_eq!(parse_player("[]", "read").unwrap(), None);
}

#[test]
fn postgrest_error_message_is_surfaced() {
    let body = r#"{"code":"42501","details":null,"hint":null,"message":"permission denied for table players"}"#;
    assert_eq!(
        error_message(StatusCode::UNAUTHORIZED, body),
        "permission denied for table players"
    );
}

#[test]
fn non_json_error_falls_back_to_status_and_body() {
    assert_eq!(
        error_message(StatusCode::BAD_GATEWAY, "upstream down"),
        "backend returned 502 Bad Gateway: upstream down"
    );
    assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "backend returned 502 Bad Gateway");
}

#[test]
fn table_url_tolerates_trailing_slash() {
    let a = table_url("https://abc.supabase.co/", "players").unwrap();
    let b = table_url("https://abc.supabase.co", "players").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "https://abc.supabase.co/rest/v1/players");
}

#[test]
fn table_url_rejects_garbage() {
    assert!(table_url("not a url", "players").is_err());
}

#[test]
fn row_url_filters_by_id() {
    let backend = SupabaseBackend::new(reqwest::Client::new(), &test_config("https://abc.supabase.co")).unwrap();
    let url = backend.row_url("6f1c2f4e");
    assert_eq!(url.as_str(), "https://abc.supabase.co/rest/v1/players?id=eq.6f1c2f4e");
}

// ── price API ─────────────────────────────────────────────────────────────────

#[test]
fn price_parsed_from_bitcoin_usd() {
    assert_eq!(parse_price(r#"{"bitcoin":{"usd":65432.1}}"#).unwrap(), dec!(65432.1));
    assert_eq!(parse_price(r#"{"bitcoin":{"usd":65000}}"#).unwrap(), dec!(65000));
}

#[test]
fn price_with_wrong_shape_is_an_error() {
    assert!(matches!(parse_price(r#"{"ethereum":{"usd":3000}}"#), Err(GameError::Price(_))));
    assert!(matches!(parse_price(r#"{"bitcoin":{}}"#), Err(GameError::Price(_))));
    assert!(matches!(parse_price("<html>rate limited</html>"), Err(GameError::Price(_))));
}

#[test]
fn negative_price_is_rejected() {
    assert!(matches!(parse_price(r#"{"bitcoin":{"usd":-1}}"#), Err(GameError::Price(_))));
}
