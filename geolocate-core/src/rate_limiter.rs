use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Sliding-window admission gate: at most `qps` admissions per trailing second
///
/// Keeps the instants of the last `qps` admissions. When the window is full and
/// its oldest entry is younger than one second, the caller sleeps out the
/// remainder. The lock is held across that sleep so admissions are handed out
/// in arrival order and the window never over-admits.
#[derive(Debug)]
pub struct RateLimiter {
    qps: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// `qps` must be non-zero; the resolver config validates this.
    pub fn new(qps: usize) -> Self {
        let qps = qps.max(1);
        Self {
            qps,
            window: Duration::from_secs(1),
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    pub fn qps(&self) -> usize {
        self.qps
    }

    /// Wait for an admission slot and record it
    pub async fn wait(&self) {
        let mut timestamps = self.timestamps.lock().await;

        if timestamps.len() >= self.qps {
            if let Some(&oldest) = timestamps.front() {
                let elapsed = oldest.elapsed();
                if elapsed < self.window {
                    let delay = self.window - elapsed;
                    log::trace!("Rate limit reached, waiting {:?}", delay);
                    sleep(delay).await;
                }
            }
            timestamps.pop_front();
        }

        timestamps.push_back(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn assert_window_respected(admissions: &[Instant], qps: usize) {
        for pair in admissions.windows(qps + 1) {
            let span = pair[qps] - pair[0];
            assert!(
                span >= Duration::from_secs(1),
                "{} admissions within {:?}",
                qps + 1,
                span
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_up_to_qps_is_immediate() {
        let limiter = RateLimiter::new(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_admission_waits_for_window() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();
        for _ in 0..4 {
            limiter.wait().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_admissions_never_exceed_qps() {
        let limiter = RateLimiter::new(3);
        let mut admissions = Vec::new();
        for _ in 0..12 {
            limiter.wait().await;
            admissions.push(Instant::now());
        }
        assert_window_respected(&admissions, 3);
        // 12 admissions at 3/s need at least three full windows
        assert!(admissions[11] - admissions[0] >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_admissions_never_exceed_qps() {
        let limiter = Arc::new(RateLimiter::new(4));
        let admissions = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = Arc::clone(&limiter);
            let admissions = Arc::clone(&admissions);
            handles.push(tokio::spawn(async move {
                limiter.wait().await;
                admissions.lock().await.push(Instant::now());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut admissions = admissions.lock().await.clone();
        admissions.sort();
        assert_eq!(admissions.len(), 20);
        assert_window_respected(&admissions, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_qps_does_not_preallocate() {
        let limiter = RateLimiter::new(usize::MAX);
        limiter.wait().await;
        assert_eq!(limiter.timestamps.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_window_does_not_delay() {
        let limiter = RateLimiter::new(2);
        limiter.wait().await;
        limiter.wait().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
