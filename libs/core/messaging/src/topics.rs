//! The closed set of pub/sub topics.

use strum::{Display, EnumIter, EnumString};

/// A named broker channel. The set is fixed at configuration time; each
/// topic carries exactly one payload envelope type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Topic {
    DataChanges,
    UserDataAggregation,
    OutboundEmail,
    WebhookExecution,
    SearchIndex,
}

impl Topic {
    /// The Redis stream key this topic maps onto.
    pub fn stream_name(&self) -> String {
        self.to_string()
    }
}
