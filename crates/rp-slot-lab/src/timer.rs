//! Clock used to wait out reel offsets

use std::future::Future;
use std::time::Duration;

/// Sleep provider for the draw driver
pub trait ReelTimer: Clone + Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Tokio clock; honours `tokio::time::pause` in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl ReelTimer for TokioTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
