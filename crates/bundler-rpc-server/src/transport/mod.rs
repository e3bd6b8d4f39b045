//! Transport layer (HTTP + WebSocket).
//!
//! Each inbound unit of work (an HTTP request, or one socket frame) gets the
//! matching reply adapter and is handed to the request pipeline. Socket frames
//! are decoded once by `codec` before they reach the pipeline.

pub mod codec;
pub mod http;
pub mod reply;
pub mod ws;
