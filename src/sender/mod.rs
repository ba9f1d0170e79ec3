pub mod delivery;
pub mod http;
pub mod stats;
pub mod transport;

pub use delivery::{DeliveryFailure, DeliveryOutcome, LOG_STREAM_NAME_KEY, SEQUENCE_TOKEN_KEY, Sender};
pub use http::{HttpTransport, HttpTransportConfig};
pub use stats::{DeliveryStats, DeliveryStatsSnapshot};
pub use transport::{
    CreateLogStreamRequest, LogTransport, PutLogEventsRequest, PutLogEventsResponse,
    TransportError,
};
