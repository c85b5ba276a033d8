// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use seedcrawl::net::factory::SessionFactory;
use seedcrawl::net::session::Session;
use seedcrawl::utils::errors::NetError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 计数的会话工厂，可切换为总是失败
#[derive(Default)]
pub struct MockSessionFactory {
    attempts: AtomicUsize,
    created: AtomicUsize,
    failing: AtomicBool,
}

impl MockSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let factory = Self::default();
        factory.set_failing(true);
        factory
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn create(&self) -> Result<Session, NetError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NetError::Rejected("mock factory failure".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Session::new(reqwest::Client::new(), None, None))
    }
}
