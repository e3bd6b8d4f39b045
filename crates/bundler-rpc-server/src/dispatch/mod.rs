//! Dispatch: the request pipeline and the seams it calls out through.
//!
//! Transports hand one `RpcInput` plus a reply adapter to `RequestPipeline`;
//! business logic plugs in as a `MethodHandler`, error tracking as an
//! `ErrorReporter`.

pub mod error_map;
pub mod handler;
pub mod pipeline;

pub use error_map::{map_failure, ErrorBody, Failure, MappedError, PanicError};
pub use handler::{BoxError, ErrorReport, ErrorReporter, HandlerError, LogReporter, MethodHandler};
pub use pipeline::{RawBody, RequestPipeline, RpcInput, Transport};
