//! Static chain-info handler served by the stock binary.
//!
//! Answers the two methods that need nothing but configuration. A node with
//! a mempool and an executor plugs in its own `MethodHandler` instead.

use async_trait::async_trait;
use serde_json::Value;

use bundler_rpc_core::protocol::bundler::Address;
use bundler_rpc_core::protocol::{BundlerCall, BundlerRequest};
use bundler_rpc_core::{ApiVersion, RpcError};

use crate::config::ChainSection;
use crate::dispatch::{HandlerError, MethodHandler};

#[derive(Debug, Clone)]
pub struct ChainInfoHandler {
    chain_id: u64,
    entry_points: Vec<Address>,
}

impl ChainInfoHandler {
    pub fn new(chain: &ChainSection) -> Self {
        Self {
            chain_id: chain.chain_id,
            entry_points: chain.entry_points.clone(),
        }
    }
}

#[async_trait]
impl MethodHandler for ChainInfoHandler {
    async fn handle_method(
        &self,
        request: &BundlerRequest,
        _version: ApiVersion,
    ) -> Result<Value, HandlerError> {
        match request.call() {
            BundlerCall::ChainId => Ok(Value::String(format!("{:#x}", self.chain_id))),
            BundlerCall::SupportedEntryPoints => Ok(Value::Array(
                self.entry_points
                    .iter()
                    .map(|a| Value::from(a.as_str()))
                    .collect(),
            )),
            other => Err(RpcError::invalid_request(format!(
                "method {} is not served by this node",
                other.method()
            ))
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundler_rpc_core::protocol::JsonRpcRequest;
    use bundler_rpc_core::ErrorCode;
    use serde_json::json;

    fn request(body: Value) -> BundlerRequest {
        BundlerRequest::try_from(JsonRpcRequest::from_value(body).unwrap()).unwrap()
    }

    fn handler() -> ChainInfoHandler {
        ChainInfoHandler::new(&ChainSection {
            chain_id: 11_155_111,
            ..ChainSection::default()
        })
    }

    #[tokio::test]
    async fn chain_id_is_hex() {
        let req = request(json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId"}));
        let out = handler().handle_method(&req, ApiVersion::V1).await.unwrap();
        assert_eq!(out, json!("0xaa36a7"));
    }

    #[tokio::test]
    async fn lists_configured_entry_points() {
        let req = request(json!({"jsonrpc": "2.0", "id": 1, "method": "eth_supportedEntryPoints", "params": []}));
        let out = handler().handle_method(&req, ApiVersion::V2).await.unwrap();
        assert_eq!(out, json!(["0x0000000071727De22E5E9d8BAf0edAc6f37da032"]));
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        let req = request(json!({"jsonrpc": "2.0", "id": 1, "method": "debug_bundler_clearState"}));
        let err = handler().handle_method(&req, ApiVersion::V1).await.unwrap_err();
        let HandlerError::Rpc(e) = err else {
            panic!("expected rpc error");
        };
        assert_eq!(e.code, ErrorCode::InvalidRequest);
        assert_eq!(e.message, "method debug_bundler_clearState is not served by this node");
    }
}
