//! Weft Transform
//!
//! Client side of the Transform Service, the backend that performs the actual
//! dataset operations (merge, concatenate, standardize, split).
//!
//! The orchestrator talks to the service through the [`TransformService`]
//! trait. [`HttpTransformService`] is the production implementation; tests use
//! in-memory fakes.

mod error;
mod http;
mod request;
mod service;

pub use error::TransformError;
pub use http::HttpTransformService;
pub use request::{
  AddressSplitRequest, ConcatenateRequest, DatasetDetails, MergeRequest, SplitRequest,
  StandardizeRequest, TransformRequest,
};
pub use service::TransformService;
