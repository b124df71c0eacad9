pub mod errors;
pub mod fetcher;
pub mod normalize;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use errors::FetchError;
pub use fetcher::SourceFetcher;
pub use normalize::{PayloadShape, normalize};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{
    NormalizedPayload, Price, SentimentRecord, ServerStatus, Signal, SourceKind, TrackRecord,
};
