use std::sync::Arc;

use crate::events::ClientSink;

/// One registered connection: its outbound sink and current interest.
///
/// Ephemeral by design; the record (and its presence contribution) is
/// released when the transport drops the connection.
pub(crate) struct Connection {
    pub sink: Arc<dyn ClientSink>,
    pub interest: Option<String>,
}

/// Result of a subscribe call: the property the connection was interested
/// in before, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChange {
    pub previous: Option<String>,
}
