// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use seedcrawl::application::fetch_processor::FetchProcessor;
use seedcrawl::domain::models::crawl_result::CrawlResult;
use seedcrawl::domain::models::seed::Seed;
use seedcrawl::domain::services::seed_processor::SeedProcessor;
use seedcrawl::net::client::{HttpClientGenerator, ReqwestClientGenerator};
use seedcrawl::net::session::Session;
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Session {
    let client = ReqwestClientGenerator::new("seedcrawl-test", Duration::from_secs(5))
        .generate(None)
        .unwrap();
    Session::new(client, None, None)
}

#[tokio::test]
async fn test_fetch_emits_item_and_same_host_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/a">a</a><a href="/b">b</a><a href="http://elsewhere.test/">x</a>"#,
        ))
        .mount(&server)
        .await;

    let mut seed = Seed::new(format!("{}/", server.uri()));
    seed.start().unwrap();
    let mut session = session();
    let mut result = CrawlResult::new();

    FetchProcessor::new(1)
        .process(&mut seed, &mut session, &mut result)
        .await
        .unwrap();

    let item: Value = serde_json::from_str(&result.items()[0]).unwrap();
    assert_eq!(item["status"], 200);
    assert_eq!(result.seeds().len(), 2);
    assert!(result.seeds().iter().all(|s| s.depth == 1));
    assert_eq!(result.seeds()[0].data, format!("{}/a", server.uri()));
}

#[tokio::test]
async fn test_depth_limit_stops_link_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/deeper">d</a>"#))
        .mount(&server)
        .await;

    let mut seed = Seed::new(format!("{}/page", server.uri())).with_depth(1);
    seed.start().unwrap();
    let mut result = CrawlResult::new();

    FetchProcessor::new(1)
        .process(&mut seed, &mut session(), &mut result)
        .await
        .unwrap();

    assert_eq!(result.items().len(), 1);
    assert!(result.seeds().is_empty());
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut seed = Seed::new(server.uri());
    seed.start().unwrap();
    let mut result = CrawlResult::new();

    let err = FetchProcessor::new(1)
        .process(&mut seed, &mut session(), &mut result)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));
    assert!(result.is_empty());
}
