// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::HttpSettings;
use crate::net::proxy::Proxy;
use crate::utils::errors::NetError;
use std::time::Duration;

/// HTTP客户端生成器特质
///
/// 为每个会话生成独立的HTTP客户端
pub trait HttpClientGenerator: Send + Sync {
    /// 生成绑定到指定代理的客户端
    ///
    /// # 参数
    ///
    /// * `proxy` - 会话绑定的代理，直连时为None
    fn generate(&self, proxy: Option<&Proxy>) -> Result<reqwest::Client, NetError>;
}

/// 基于reqwest的客户端生成器
///
/// 每个客户端拥有独立的cookie存储，会话之间互不影响
#[derive(Debug, Clone)]
pub struct ReqwestClientGenerator {
    user_agent: String,
    timeout: Duration,
}

impl ReqwestClientGenerator {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &HttpSettings) -> Self {
        Self::new(
            settings.user_agent.clone(),
            Duration::from_millis(settings.timeout_ms),
        )
    }
}

impl HttpClientGenerator for ReqwestClientGenerator {
    fn generate(&self, proxy: Option<&Proxy>) -> Result<reqwest::Client, NetError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.timeout)
            .cookie_store(true);

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy.url())
                .map_err(|e| NetError::InvalidProxy(format!("{}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}
