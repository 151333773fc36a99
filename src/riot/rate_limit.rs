//! Sliding-window limiter for outbound Riot API requests

use crate::error::{BotError, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Thread-safe sliding-window rate limiter.
///
/// At most `max_requests` permits are handed out in any `window`; callers over the
/// limit sleep until the oldest permit leaves the window.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    issued: Arc<Mutex<VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            issued: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Take a permit if one is free, otherwise report how long to wait
    pub fn try_acquire(&self) -> Result<std::result::Result<(), Duration>> {
        let mut issued = self.issued.lock().map_err(|_| BotError::InternalError {
            message: "Failed to acquire rate limiter lock".to_string(),
        })?;
        let now = Instant::now();

        // Remove expired entries
        while let Some(oldest) = issued.front() {
            if now.duration_since(*oldest) >= self.window {
                issued.pop_front();
            } else {
                break;
            }
        }

        if issued.len() < self.max_requests {
            issued.push_back(now);
            return Ok(Ok(()));
        }

        let oldest = issued.front().copied().unwrap_or(now);
        Ok(Err(self.window.saturating_sub(now.duration_since(oldest))))
    }

    /// Wait for a permit. Returns true when the caller had to wait.
    pub async fn acquire(&self) -> Result<bool> {
        let mut waited = false;
        loop {
            match self.try_acquire()? {
                Ok(()) => return Ok(waited),
                Err(wait) => {
                    debug!("Riot rate limit reached, waiting {:?}", wait);
                    waited = true;
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Permits issued within the current window
    pub fn current_count(&self) -> usize {
        let now = Instant::now();
        self.issued
            .lock()
            .map(|issued| {
                issued
                    .iter()
                    .filter(|t| now.duration_since(**t) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_within_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.try_acquire().unwrap().is_ok());
        }
        assert_eq!(limiter.current_count(), 3);
    }

    #[test]
    fn test_denies_over_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        limiter.try_acquire().unwrap().unwrap();
        limiter.try_acquire().unwrap().unwrap();

        let wait = limiter.try_acquire().unwrap().unwrap_err();
        assert!(wait <= Duration::from_secs(60));
        assert!(wait > Duration::from_secs(59));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_waits_for_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(500));

        assert!(!limiter.acquire().await.unwrap());

        let started = Instant::now();
        assert!(limiter.acquire().await.unwrap());
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        limiter.acquire().await.unwrap();
        tokio::time::advance(Duration::from_millis(600)).await;
        limiter.acquire().await.unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;

        // The first permit has expired
        assert_eq!(limiter.current_count(), 1);
        assert!(limiter.try_acquire().unwrap().is_ok());
    }
}
