//! Channel-backed host event sink.

use bridge_traits::{
    error::{BridgeError, Result},
    HostEventSink, HostMessage,
};
use tokio::sync::mpsc;
use tracing::trace;

/// Delivers host messages over an unbounded channel.
///
/// The receiving half is handed to the embedding application, which drains
/// it on its own schedule.
#[derive(Debug, Clone)]
pub struct ChannelHostEventSink {
    sender: mpsc::UnboundedSender<HostMessage>,
}

impl ChannelHostEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl HostEventSink for ChannelHostEventSink {
    fn send(&self, message: HostMessage) -> Result<()> {
        trace!(alarm_id = %message.id, method = ?message.method, "Forwarding host message");
        self.sender
            .send(message)
            .map_err(|_| BridgeError::OperationFailed("host event receiver dropped".to_string()))
    }
}
