pub mod protocol;
pub mod ws;

use async_trait::async_trait;

use crate::error::FeedError;
use protocol::FeedRequest;

/// One live bidirectional channel to the upstream feed.
///
/// `request` writes one frame and returns the next data frame read back.
/// Replies are paired with requests purely by arrival order: upstream answers
/// `getSymbol`/`getCurrency` before it pushes anything unrelated on the same
/// socket. This is a property of this feed, not a general RPC guarantee.
#[async_trait]
pub trait FeedConnection: Send + 'static {
    async fn request(&mut self, req: &FeedRequest) -> Result<String, FeedError>;

    /// Release the transport. Calling it again is a no-op.
    async fn close(&mut self);
}

/// Dials new feed connections. Each subscription owns the connection it opens.
#[async_trait]
pub trait FeedConnector: Send + Sync + 'static {
    type Connection: FeedConnection;

    async fn open(&self) -> Result<Self::Connection, FeedError>;
}
