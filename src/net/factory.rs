// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::net::client::{HttpClientGenerator, ReqwestClientGenerator};
use crate::net::proxy::{DefaultProxyPlanner, IpPool, ProxyPlanner, ProxyStrategy, StaticIpPool};
use crate::net::session::Session;
use crate::utils::errors::NetError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// 会话工厂特质
///
/// 会话池通过它创建新会话，创建可能失败
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// 创建一个新会话
    async fn create(&self) -> Result<Session, NetError>;
}

/// 组合代理策略、IP池、代理规划器和HTTP客户端生成器的会话工厂
pub struct ProxySessionFactory {
    generator: Arc<dyn HttpClientGenerator>,
    strategy: ProxyStrategy,
    ip_pool: Option<Arc<dyn IpPool>>,
    planner: Arc<dyn ProxyPlanner>,
}

impl ProxySessionFactory {
    /// 创建直连会话工厂
    pub fn new(generator: Arc<dyn HttpClientGenerator>) -> Self {
        Self {
            generator,
            strategy: ProxyStrategy::Direct,
            ip_pool: None,
            planner: Arc::new(DefaultProxyPlanner),
        }
    }

    /// 设置代理策略和IP池
    pub fn with_proxy(mut self, strategy: ProxyStrategy, ip_pool: Arc<dyn IpPool>) -> Self {
        self.strategy = strategy;
        self.ip_pool = Some(ip_pool);
        self
    }

    /// 替换代理规划器
    pub fn with_planner(mut self, planner: Arc<dyn ProxyPlanner>) -> Self {
        self.planner = planner;
        self
    }

    /// 根据配置构建会话工厂
    ///
    /// # 返回值
    ///
    /// * `Ok(ProxySessionFactory)` - 构建成功
    /// * `Err(NetError)` - 代理列表中存在无效URL
    pub fn from_settings(settings: &Settings) -> Result<Self, NetError> {
        let generator = Arc::new(ReqwestClientGenerator::from_settings(&settings.http));
        let factory = Self::new(generator);
        if settings.proxy.urls.is_empty() {
            return Ok(factory);
        }

        let ip_pool = Arc::new(StaticIpPool::from_urls(&settings.proxy.urls)?);
        Ok(factory.with_proxy(settings.proxy.strategy, ip_pool))
    }
}

#[async_trait]
impl SessionFactory for ProxySessionFactory {
    async fn create(&self) -> Result<Session, NetError> {
        let (proxy, ip_pool) = match (self.strategy, &self.ip_pool) {
            (ProxyStrategy::Direct, _) => (None, None),
            (ProxyStrategy::Session, None) => return Err(NetError::NoProxyAvailable),
            (ProxyStrategy::Session, Some(pool)) => {
                let proxy = self
                    .planner
                    .plan(pool.as_ref())
                    .ok_or(NetError::NoProxyAvailable)?;
                (Some(proxy), Some(pool.clone()))
            }
        };

        let client = match self.generator.generate(proxy.as_ref()) {
            Ok(client) => client,
            Err(e) => {
                if let (Some(pool), Some(proxy)) = (&ip_pool, &proxy) {
                    pool.release(proxy);
                }
                return Err(e);
            }
        };

        let session = Session::new(client, proxy, ip_pool);
        debug!("Created session {:?}", session);
        Ok(session)
    }
}
