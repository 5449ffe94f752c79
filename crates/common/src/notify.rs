use async_trait::async_trait;

/// Fire-and-forget delivery of operator messages.
///
/// Implementations log delivery failures themselves; nothing is returned to
/// the caller, so a broken chat channel never changes a pass outcome.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str);
}
