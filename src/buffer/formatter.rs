use crate::domain::Message;
use futures::future::{self, BoxFuture};

/// Turns a message into the text of a log event.
///
/// Returning `Ok(None)`, an empty string or an error drops that one message.
pub trait MessageFormatter: Send + Sync {
    fn format<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, anyhow::Result<Option<String>>>;
}

/// Serialises the message wire record as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl MessageFormatter for JsonFormatter {
    fn format<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, anyhow::Result<Option<String>>> {
        let text = serde_json::to_string(&message.to_wire_record())
            .map(Some)
            .map_err(anyhow::Error::from);
        Box::pin(future::ready(text))
    }
}

impl<F> MessageFormatter for F
where
    F: Fn(&Message) -> anyhow::Result<Option<String>> + Send + Sync,
{
    fn format<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, anyhow::Result<Option<String>>> {
        Box::pin(future::ready(self(message)))
    }
}
