//! Deep-fetch scheduling
//!
//! Profile page fetches are throttled at two levels:
//! - A global semaphore bounds how many are in flight across all categories
//! - A per-category rate limiter spaces out the starts of fetches within one
//!   category by at least the configured inter-request delay
//!
//! Listing fetches are not scheduled here; there is only one per category.

use crate::config::CrawlerConfig;
use crate::record::Category;
use governor::{Quota, RateLimiter};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

type CategoryLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Held for the duration of one profile fetch
pub struct FetchPermit {
    pub category: Category,
    _permit: OwnedSemaphorePermit,
}

/// Hands out permits for profile fetches
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// Pool size the semaphore was created with
    pool_size: usize,

    /// One limiter per category; absent when the delay is zero
    limiters: HashMap<Category, Arc<CategoryLimiter>>,
}

impl Scheduler {
    /// Creates a scheduler for the given categories
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the pool size and inter-request delay
    /// * `categories` - Categories that will request permits
    pub fn new(config: &CrawlerConfig, categories: impl IntoIterator<Item = Category>) -> Self {
        let pool_size = config.worker_pool_size.max(1) as usize;

        // `with_period` is None for a zero delay, which disables spacing
        let limiters = match Quota::with_period(config.inter_request_delay()) {
            Some(quota) => categories
                .into_iter()
                .map(|category| (category, Arc::new(RateLimiter::direct(quota))))
                .collect(),
            None => HashMap::new(),
        };

        Self {
            global_semaphore: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            limiters,
        }
    }

    /// Waits until a fetch for `category` may start
    ///
    /// The category's limiter is waited on first, so a task sleeping out one
    /// category's delay never holds a pool slot another category could use.
    ///
    /// # Returns
    ///
    /// * `Some(FetchPermit)` - The fetch may proceed
    /// * `None` - The scheduler was closed
    pub async fn acquire(&self, category: Category) -> Option<FetchPermit> {
        if let Some(limiter) = self.limiters.get(&category) {
            limiter.until_ready().await;
        }

        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;

        Some(FetchPermit {
            category,
            _permit: permit,
        })
    }

    /// Refuses all further permits; waiting callers get `None`
    pub fn close(&self) {
        self.global_semaphore.close();
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Number of permits not currently held
    pub fn available_permits(&self) -> usize {
        self.global_semaphore.available_permits()
    }

    pub fn is_rate_limited(&self, category: Category) -> bool {
        self.limiters.contains_key(&category)
    }
}
