//! Request validation vector tests (envelope + bundler schema).

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use bundler_rpc_core::protocol::{BundlerRequest, JsonRpcRequest};
use bundler_rpc_core::RpcError;

mod vector_loader;
use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

/// Run both validation stages, returning the error id alongside the error.
fn validate(raw: &[u8]) -> Result<BundlerRequest, (serde_json::Value, RpcError)> {
    let req = JsonRpcRequest::from_slice(raw).map_err(|e| (e.id.to_value(), e.error))?;
    let id = req.id.to_value();
    BundlerRequest::try_from(req).map_err(|e| (id, e.into()))
}

#[test]
fn request_vectors() {
    let files = [
        "supported_entry_points.json",
        "send_user_operation.json",
        "not_json.json",
        "wrong_jsonrpc_version.json",
        "unknown_method.json",
        "receipt_missing_hash.json",
        "receipt_bad_hash.json",
        "estimate_bad_sender.json",
    ];

    for f in files {
        let v = load(f);
        let res = validate(&v.body.decode());

        if let Some(err) = v.expect_error {
            let (id, e) = res.expect_err("expected error");
            assert_eq!(e.code.as_str(), err.code, "vector={}", v.description);
            assert_eq!(id, err.id, "vector={}", v.description);
            if let Some(msg) = err.message {
                assert_eq!(e.message, msg, "vector={}", v.description);
            }
            continue;
        }

        let req = res.expect("expected ok request");
        let ex = v.expect.expect("missing expect block");
        assert_eq!(req.method().as_str(), ex["method"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(req.id().to_value(), ex["id"], "vector={}", v.description);
    }
}
