//! Mock ORCID responses and a configuration pointed at the mock server.

use std::time::Duration;

use pubsync_core::IngestConfig;
use pubsync_core::config::{
    ENV_API_BASE, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_RESEARCHER_ID, ENV_TOKEN_URL,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RESEARCHER: &str = "0000-0003-2882-0900";
pub const TOKEN: &str = "test-token-123";

pub fn works_path() -> String {
    format!("/v3.0/{RESEARCHER}/works")
}

pub fn work_path(put_code: u64) -> String {
    format!("/v3.0/{RESEARCHER}/work/{put_code}")
}

/// Configuration aimed at `server` with default retry settings.
pub fn config_for(server: &MockServer) -> IngestConfig {
    let uri = server.uri();
    IngestConfig::from_lookup(|name| match name {
        ENV_RESEARCHER_ID => Some(RESEARCHER.to_string()),
        ENV_CLIENT_ID => Some("APP-TEST".to_string()),
        ENV_CLIENT_SECRET => Some("s3cret".to_string()),
        ENV_API_BASE => Some(format!("{uri}/v3.0")),
        ENV_TOKEN_URL => Some(format!("{uri}/oauth/token")),
        _ => None,
    })
    .expect("mock config is valid")
    .with_request_timeout(Duration::from_secs(5))
    .expect("timeout is positive")
}

pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "scope": "/read-public",
        })))
        .mount(server)
        .await;
}

/// Listing body: one group per `(put_code, title, year)`.
pub fn works_body(works: &[(u64, &str, &str)]) -> Value {
    let groups: Vec<Value> = works
        .iter()
        .map(|(put_code, title, year)| {
            json!({
                "work-summary": [{
                    "put-code": put_code,
                    "path": format!("/{RESEARCHER}/work/{put_code}"),
                    "title": { "title": { "value": title } },
                    "publication-date": { "year": { "value": year } },
                }]
            })
        })
        .collect();
    json!({ "group": groups })
}

/// Detail body with credit-named contributors, a journal and an optional DOI.
pub fn detail_body(authors: &[&str], journal: &str, doi: Option<&str>) -> Value {
    let contributors: Vec<Value> = authors
        .iter()
        .map(|name| json!({ "credit-name": { "value": name } }))
        .collect();
    let external_ids: Vec<Value> = doi
        .into_iter()
        .map(|doi| json!({ "external-id-type": "doi", "external-id-value": doi }))
        .collect();
    json!({
        "journal-title": { "value": journal },
        "contributors": { "contributor": contributors },
        "external-ids": { "external-id": external_ids },
    })
}

pub async fn mount_works(server: &MockServer, works: &[(u64, &str, &str)]) {
    Mock::given(method("GET"))
        .and(path(works_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(works_body(works)))
        .mount(server)
        .await;
}

pub async fn mount_detail(server: &MockServer, put_code: u64, body: Value) {
    Mock::given(method("GET"))
        .and(path(work_path(put_code)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
