// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::NetError;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use url::Url;

/// 代理地址
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proxy {
    /// 协议 (http, https, socks5)
    pub scheme: String,
    /// 主机
    pub host: String,
    /// 端口
    pub port: u16,
    /// 认证用户名
    pub username: Option<String>,
    /// 认证密码
    pub password: Option<String>,
}

impl Proxy {
    /// 创建一个HTTP代理
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "http".to_string(),
            host: host.into(),
            port,
            username: None,
            password: None,
        }
    }

    /// 代理的完整URL，包含认证信息
    ///
    /// 用户名和密码按URL userinfo规则做百分号编码
    pub fn url(&self) -> String {
        let base = format!("{}://{}:{}", self.scheme, self.host, self.port);
        let mut url = match Url::parse(&base) {
            Ok(url) => url,
            Err(_) => return base,
        };
        if let Some(user) = &self.username {
            if url.set_username(user).is_err() {
                debug!("Proxy {} cannot carry a username", base);
            }
        }
        if let Some(pass) = &self.password {
            if url.set_password(Some(pass)).is_err() {
                debug!("Proxy {} cannot carry a password", base);
            }
        }
        url.as_str().trim_end_matches('/').to_string()
    }

    /// 代理的唯一键 (host:port)
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Proxy {
    // Credentials are never printed
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl FromStr for Proxy {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s).map_err(|e| NetError::InvalidProxy(format!("{}: {}", s, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| NetError::InvalidProxy(format!("{}: missing host", s)))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| NetError::InvalidProxy(format!("{}: missing port", s)))?;
        let username = Some(decode_userinfo(s, url.username())?).filter(|u| !u.is_empty());
        let password = url.password().map(|p| decode_userinfo(s, p)).transpose()?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
            username,
            password,
        })
    }
}

fn decode_userinfo(proxy: &str, value: &str) -> Result<String, NetError> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|e| NetError::InvalidProxy(format!("{}: {}", proxy, e)))
}

/// 代理切换策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProxyStrategy {
    /// 直连，不绑定代理
    #[default]
    Direct,
    /// 每个会话绑定一个代理，直到会话销毁
    Session,
}

/// IP池特质
///
/// 决定新会话使用哪个代理，并接收会话使用结果的反馈
pub trait IpPool: Send + Sync {
    /// 取出一个可用代理
    fn acquire(&self) -> Option<Proxy>;

    /// 归还代理（会话销毁时调用）
    fn release(&self, proxy: &Proxy);

    /// 上报代理的一次使用结果
    fn feedback(&self, proxy: &Proxy, success: bool);
}

/// 代理规划器特质
pub trait ProxyPlanner: Send + Sync {
    /// 为新会话规划代理
    fn plan(&self, ip_pool: &dyn IpPool) -> Option<Proxy>;
}

/// 默认代理规划器，直接从IP池获取
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProxyPlanner;

impl ProxyPlanner for DefaultProxyPlanner {
    fn plan(&self, ip_pool: &dyn IpPool) -> Option<Proxy> {
        ip_pool.acquire()
    }
}

/// 单个代理的使用统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyUsage {
    /// 当前绑定的会话数
    pub in_use: usize,
    /// 成功次数
    pub successes: u64,
    /// 失败次数
    pub failures: u64,
}

/// 固定代理列表的IP池
///
/// 按轮转顺序分配代理，列表在创建时打乱，
/// 避免多个进程总是从同一个代理开始。
pub struct StaticIpPool {
    proxies: Vec<Proxy>,
    cursor: AtomicUsize,
    usage: DashMap<String, ProxyUsage>,
}

impl StaticIpPool {
    /// 使用代理列表创建IP池
    pub fn new(mut proxies: Vec<Proxy>) -> Self {
        proxies.shuffle(&mut rand::rng());
        let usage = DashMap::new();
        for proxy in &proxies {
            usage.insert(proxy.key(), ProxyUsage::default());
        }

        Self {
            proxies,
            cursor: AtomicUsize::new(0),
            usage,
        }
    }

    /// 从代理URL列表创建IP池
    ///
    /// # 返回值
    ///
    /// * `Ok(StaticIpPool)` - 创建成功
    /// * `Err(NetError)` - 存在无法解析的代理URL
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> Result<Self, NetError> {
        let proxies = urls
            .iter()
            .map(|u| u.as_ref().parse::<Proxy>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(proxies))
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// 查询代理的使用统计
    pub fn usage(&self, proxy: &Proxy) -> Option<ProxyUsage> {
        self.usage.get(&proxy.key()).map(|u| *u)
    }
}

impl IpPool for StaticIpPool {
    fn acquire(&self) -> Option<Proxy> {
        if self.proxies.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.proxies.len();
        let proxy = self.proxies[index].clone();
        if let Some(mut usage) = self.usage.get_mut(&proxy.key()) {
            usage.in_use += 1;
        }
        debug!("Proxy {} acquired", proxy);
        Some(proxy)
    }

    fn release(&self, proxy: &Proxy) {
        if let Some(mut usage) = self.usage.get_mut(&proxy.key()) {
            usage.in_use = usage.in_use.saturating_sub(1);
        }
    }

    fn feedback(&self, proxy: &Proxy, success: bool) {
        if let Some(mut usage) = self.usage.get_mut(&proxy.key()) {
            if success {
                usage.successes += 1;
            } else {
                usage.failures += 1;
            }
        }
    }
}
