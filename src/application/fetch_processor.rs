// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_result::CrawlResult;
use crate::domain::models::seed::Seed;
use crate::domain::services::seed_processor::SeedProcessor;
use crate::net::session::Session;
use anyhow::{bail, Context};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

static HREF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href\s*=\s*["']([^"'#\s]+)["']"#).expect("Failed to compile href regex")
});

/// 演示用抓取处理器
///
/// 使用会话的客户端GET种子URL，输出状态和正文长度，
/// 并把同站链接作为派生种子（不超过最大深度）。
#[derive(Debug, Clone)]
pub struct FetchProcessor {
    max_depth: u32,
}

impl FetchProcessor {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }
}

#[async_trait]
impl SeedProcessor for FetchProcessor {
    async fn process(
        &self,
        seed: &mut Seed,
        session: &mut Session,
        result: &mut CrawlResult,
    ) -> anyhow::Result<()> {
        let url = Url::parse(&seed.data).with_context(|| format!("invalid seed url {}", seed.data))?;

        let response = session
            .client()
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if status.is_server_error() {
            bail!("server error {} from {}", status, url);
        }

        let body = response.text().await.context("failed to read response body")?;
        result.add_item(
            json!({
                "url": url.as_str(),
                "status": status.as_u16(),
                "length": body.len(),
            })
            .to_string(),
        );

        if seed.depth >= self.max_depth {
            return Ok(());
        }

        let links = extract_links(&url, &body);
        debug!("Found {} same-host links on {}", links.len(), url);
        for link in links {
            result.add_seed(seed.derive(link));
        }
        Ok(())
    }
}

/// 抽取页面中与`base`同主机的链接
pub fn extract_links(base: &Url, body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HREF_REGEX
        .captures_iter(body)
        .filter_map(|cap| cap.get(1))
        .filter_map(|m| base.join(m.as_str()).ok())
        .filter(|link| matches!(link.scheme(), "http" | "https"))
        .filter(|link| link.host_str() == base.host_str())
        .map(|mut link| {
            link.set_fragment(None);
            link.to_string()
        })
        .filter(|link| link != base.as_str() && seen.insert(link.clone()))
        .collect()
}
