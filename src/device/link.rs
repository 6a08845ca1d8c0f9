use async_trait::async_trait;

use crate::device::types::LinkObserver;
use crate::error::LinkError;

/// Finds the radio and opens a link to it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Scan for a peripheral advertising exactly `name_filter` and connect to it.
    ///
    /// Implementations must hand `observer` to their disconnect detection before touching any
    /// characteristic, so that losing the radio is reported no matter when it happens.
    async fn discover_and_connect(
        &self,
        name_filter: &str,
        observer: LinkObserver,
    ) -> Result<Box<dyn LinkHandle>, LinkError>;
}

/// A connected radio: one characteristic to write commands to, one to receive notifications from.
#[async_trait]
pub trait LinkHandle: Send + Sync {
    async fn write(&self, bytes: &[u8]) -> Result<(), LinkError>;

    /// Forward notifications to `observer`. Replaces any previous subscription.
    async fn subscribe(&mut self, observer: LinkObserver) -> Result<(), LinkError>;

    async fn disconnect(&self) -> Result<(), LinkError>;
}
