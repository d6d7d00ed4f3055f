use crate::train::log::IterationStats;

/// Notification sent on a network's event channel, see
/// [`Network::set_event_sender`](crate::Network::set_event_sender).
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    /// A prediction finished; read [`Network::node_values`](crate::Network::node_values)
    /// for the activations.
    Predicted,
    /// A single-example training step finished.
    Fitted(IterationStats),
}
