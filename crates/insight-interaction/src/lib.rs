//! Remote inference transport.
//!
//! [`ReplicateBackend`] speaks the hosted prediction API over HTTP and
//! [`PredictionClient`] turns its asynchronous job model into a single
//! awaited result.

pub mod prediction_client;
pub mod replicate_backend;

pub use prediction_client::PredictionClient;
pub use replicate_backend::ReplicateBackend;
