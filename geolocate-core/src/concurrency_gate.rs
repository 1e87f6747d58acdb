use crate::error::GeocodeError;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Bounds how many geocoding requests are on the wire at once
///
/// Independent of the rate limiter: this caps simultaneous in-flight work,
/// the limiter caps how fast new requests start.
#[derive(Debug)]
pub struct ConcurrencyGate {
    max: usize,
    semaphore: Semaphore,
}

/// Slot in the gate, released on drop on every exit path
#[derive(Debug)]
pub struct GatePermit<'a> {
    _permit: SemaphorePermit<'a>,
}

impl ConcurrencyGate {
    /// `max` is clamped to `1..=Semaphore::MAX_PERMITS`; the resolver config
    /// rejects values outside that range before it gets here.
    pub fn new(max: usize) -> Self {
        let max = max.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            max,
            semaphore: Semaphore::new(max),
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Requests currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.max - self.semaphore.available_permits()
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<GatePermit<'_>, GeocodeError> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| GeocodeError::GateClosed)?;
        Ok(GatePermit { _permit: permit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permits_released_on_drop() {
        let gate = ConcurrencyGate::new(2);
        {
            let _a = gate.acquire().await.unwrap();
            let _b = gate.acquire().await.unwrap();
            assert_eq!(gate.in_flight(), 2);
            assert!(gate.semaphore.try_acquire().is_err());
        }
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_waiter_admitted_after_release() {
        let gate = std::sync::Arc::new(ConcurrencyGate::new(1));
        let first = gate.acquire().await.unwrap();

        let waiter = {
            let gate = std::sync::Arc::clone(&gate);
            tokio::spawn(async move {
                let _permit = gate.acquire().await.unwrap();
                gate.in_flight()
            })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(first);
        assert_eq!(waiter.await.unwrap(), 1);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_bounds_are_clamped() {
        assert_eq!(ConcurrencyGate::new(0).max(), 1);
        assert_eq!(ConcurrencyGate::new(usize::MAX).max(), Semaphore::MAX_PERMITS);
    }

    #[tokio::test]
    async fn test_closed_gate_is_an_error() {
        let gate = ConcurrencyGate::new(1);
        gate.semaphore.close();
        assert!(matches!(gate.acquire().await, Err(GeocodeError::GateClosed)));
    }
}
