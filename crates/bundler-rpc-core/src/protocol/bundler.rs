//! Bundler method/params schema (second validation stage).
//!
//! A `JsonRpcRequest` becomes a `BundlerRequest` only if its method is in the
//! closed method set and its positional params match that method's shape.
//! Params are strongly typed so handlers never re-validate.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::envelope::{JsonRpcRequest, RequestId};
use crate::error::RpcError;

/// Fixed message for a missing or malformed userOpHash param.
pub const MISSING_USER_OP_HASH: &str = "Missing/invalid userOpHash";

fn address_digits(d: &str) -> bool {
    d.len() == 40
}

fn hash_digits(d: &str) -> bool {
    d.len() == 64
}

fn quantity_digits(d: &str) -> bool {
    !d.is_empty()
}

fn data_digits(d: &str) -> bool {
    d.len() % 2 == 0
}

macro_rules! hex_string {
    ($(#[$meta:meta])* $name:ident, $what:literal, $digits_ok:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let ok = s
                    .strip_prefix("0x")
                    .map(|d| d.bytes().all(|b| b.is_ascii_hexdigit()) && $digits_ok(d))
                    .unwrap_or(false);
                if ok {
                    Ok(Self(s.to_string()))
                } else {
                    Err(format!("invalid {}: {s:?}", $what))
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

hex_string!(
    /// 20-byte account / contract address.
    Address,
    "address",
    address_digits
);
hex_string!(
    /// 32-byte user operation hash.
    UserOpHash,
    "userOpHash",
    hash_digits
);
hex_string!(
    /// Hex-encoded unsigned quantity (may exceed 128 bits, e.g. nonces).
    Quantity,
    "quantity",
    quantity_digits
);
hex_string!(
    /// Hex-encoded byte string.
    HexData,
    "hex data",
    data_digits
);

/// User operation as submitted by clients (v0.6 and v0.7 layouts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: Quantity,
    pub call_data: HexData,
    pub signature: HexData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_gas_limit: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_gas_limit: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_verification_gas: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<Quantity>,

    // v0.6
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_code: Option<HexData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_and_data: Option<HexData>,

    // v0.7
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<HexData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<HexData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eip7702_auth: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundlingMode {
    Auto,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReputationEntry {
    pub address: Address,
    pub ops_seen: Quantity,
    pub ops_included: Quantity,
}

macro_rules! bundler_methods {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Closed set of supported RPC method names.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BundlerMethod {
            $($variant),+
        }

        impl BundlerMethod {
            pub const ALL: &'static [BundlerMethod] = &[$(BundlerMethod::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(BundlerMethod::$variant => $name),+
                }
            }
        }
    };
}

bundler_methods! {
    ChainId => "eth_chainId",
    SupportedEntryPoints => "eth_supportedEntryPoints",
    EstimateUserOperationGas => "eth_estimateUserOperationGas",
    SendUserOperation => "eth_sendUserOperation",
    GetUserOperationByHash => "eth_getUserOperationByHash",
    GetUserOperationReceipt => "eth_getUserOperationReceipt",
    DebugClearState => "debug_bundler_clearState",
    DebugClearMempool => "debug_bundler_clearMempool",
    DebugDumpMempool => "debug_bundler_dumpMempool",
    DebugSendBundleNow => "debug_bundler_sendBundleNow",
    DebugSetBundlingMode => "debug_bundler_setBundlingMode",
    DebugSetReputation => "debug_bundler_setReputation",
    DebugDumpReputation => "debug_bundler_dumpReputation",
    DebugGetStakeStatus => "debug_bundler_getStakeStatus",
    PimlicoGetUserOperationGasPrice => "pimlico_getUserOperationGasPrice",
    PimlicoGetUserOperationStatus => "pimlico_getUserOperationStatus",
    PimlicoSendUserOperationNow => "pimlico_sendUserOperationNow",
}

impl fmt::Display for BundlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BundlerMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BundlerMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown method: {s}"))
    }
}

/// Method together with its typed params.
#[derive(Debug, Clone, PartialEq)]
pub enum BundlerCall {
    ChainId,
    SupportedEntryPoints,
    EstimateUserOperationGas {
        user_operation: UserOperation,
        entry_point: Address,
        state_overrides: Option<Value>,
    },
    SendUserOperation {
        user_operation: UserOperation,
        entry_point: Address,
    },
    GetUserOperationByHash(UserOpHash),
    GetUserOperationReceipt(UserOpHash),
    DebugClearState,
    DebugClearMempool,
    DebugDumpMempool(Address),
    DebugSendBundleNow,
    DebugSetBundlingMode(BundlingMode),
    DebugSetReputation {
        entries: Vec<ReputationEntry>,
        entry_point: Address,
    },
    DebugDumpReputation(Address),
    DebugGetStakeStatus {
        address: Address,
        entry_point: Address,
    },
    PimlicoGetUserOperationGasPrice,
    PimlicoGetUserOperationStatus(UserOpHash),
    PimlicoSendUserOperationNow {
        user_operation: UserOperation,
        entry_point: Address,
    },
}

impl BundlerCall {
    pub fn method(&self) -> BundlerMethod {
        match self {
            BundlerCall::ChainId => BundlerMethod::ChainId,
            BundlerCall::SupportedEntryPoints => BundlerMethod::SupportedEntryPoints,
            BundlerCall::EstimateUserOperationGas { .. } => BundlerMethod::EstimateUserOperationGas,
            BundlerCall::SendUserOperation { .. } => BundlerMethod::SendUserOperation,
            BundlerCall::GetUserOperationByHash(_) => BundlerMethod::GetUserOperationByHash,
            BundlerCall::GetUserOperationReceipt(_) => BundlerMethod::GetUserOperationReceipt,
            BundlerCall::DebugClearState => BundlerMethod::DebugClearState,
            BundlerCall::DebugClearMempool => BundlerMethod::DebugClearMempool,
            BundlerCall::DebugDumpMempool(_) => BundlerMethod::DebugDumpMempool,
            BundlerCall::DebugSendBundleNow => BundlerMethod::DebugSendBundleNow,
            BundlerCall::DebugSetBundlingMode(_) => BundlerMethod::DebugSetBundlingMode,
            BundlerCall::DebugSetReputation { .. } => BundlerMethod::DebugSetReputation,
            BundlerCall::DebugDumpReputation(_) => BundlerMethod::DebugDumpReputation,
            BundlerCall::DebugGetStakeStatus { .. } => BundlerMethod::DebugGetStakeStatus,
            BundlerCall::PimlicoGetUserOperationGasPrice => BundlerMethod::PimlicoGetUserOperationGasPrice,
            BundlerCall::PimlicoGetUserOperationStatus(_) => BundlerMethod::PimlicoGetUserOperationStatus,
            BundlerCall::PimlicoSendUserOperationNow { .. } => BundlerMethod::PimlicoSendUserOperationNow,
        }
    }
}

/// Validated bundler request; immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct BundlerRequest {
    id: RequestId,
    call: BundlerCall,
}

impl BundlerRequest {
    pub fn new(id: RequestId, call: BundlerCall) -> Self {
        Self { id, call }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn call(&self) -> &BundlerCall {
        &self.call
    }

    pub fn method(&self) -> BundlerMethod {
        self.call.method()
    }
}

/// Why the second validation stage rejected a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing/invalid userOpHash")]
    MissingUserOpHash,
    #[error("{0}")]
    UnknownMethod(String),
    #[error("invalid params for {method}: {reason}")]
    InvalidParams {
        method: BundlerMethod,
        reason: String,
    },
}

impl From<SchemaError> for RpcError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::MissingUserOpHash => RpcError::invalid_fields(MISSING_USER_OP_HASH),
            other => RpcError::invalid_request(other.to_string()),
        }
    }
}

/// Positional params cursor.
struct Params {
    method: BundlerMethod,
    items: std::vec::IntoIter<Value>,
    index: usize,
    total: usize,
}

impl Params {
    fn new(method: BundlerMethod, params: Vec<Value>) -> Self {
        let total = params.len();
        Self {
            method,
            items: params.into_iter(),
            index: 0,
            total,
        }
    }

    fn invalid(&self, reason: String) -> SchemaError {
        SchemaError::InvalidParams {
            method: self.method,
            reason,
        }
    }

    fn required<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, SchemaError> {
        let i = self.index;
        self.index += 1;
        let v = self
            .items
            .next()
            .ok_or_else(|| self.invalid(format!("missing params[{i}] ({name})")))?;
        serde_json::from_value(v).map_err(|e| self.invalid(format!("params[{i}] ({name}): {e}")))
    }

    fn optional<T: DeserializeOwned>(&mut self, name: &str) -> Result<Option<T>, SchemaError> {
        let i = self.index;
        self.index += 1;
        match self.items.next() {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v)
                .map(Some)
                .map_err(|e| self.invalid(format!("params[{i}] ({name}): {e}"))),
        }
    }

    fn user_op_hash(&mut self) -> Result<UserOpHash, SchemaError> {
        self.index += 1;
        self.items
            .next()
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or(SchemaError::MissingUserOpHash)
    }

    fn finish(self) -> Result<(), SchemaError> {
        if self.total > self.index {
            return Err(self.invalid(format!(
                "expected at most {} params, got {}",
                self.index, self.total
            )));
        }
        Ok(())
    }
}

fn parse_call(method: BundlerMethod, params: Vec<Value>) -> Result<BundlerCall, SchemaError> {
    use BundlerMethod as M;

    let mut p = Params::new(method, params);
    let call = match method {
        M::ChainId => BundlerCall::ChainId,
        M::SupportedEntryPoints => BundlerCall::SupportedEntryPoints,
        M::EstimateUserOperationGas => BundlerCall::EstimateUserOperationGas {
            user_operation: p.required("userOperation")?,
            entry_point: p.required("entryPoint")?,
            state_overrides: p.optional("stateOverrides")?,
        },
        M::SendUserOperation => BundlerCall::SendUserOperation {
            user_operation: p.required("userOperation")?,
            entry_point: p.required("entryPoint")?,
        },
        M::GetUserOperationByHash => BundlerCall::GetUserOperationByHash(p.user_op_hash()?),
        M::GetUserOperationReceipt => BundlerCall::GetUserOperationReceipt(p.user_op_hash()?),
        M::DebugClearState => BundlerCall::DebugClearState,
        M::DebugClearMempool => BundlerCall::DebugClearMempool,
        M::DebugDumpMempool => BundlerCall::DebugDumpMempool(p.required("entryPoint")?),
        M::DebugSendBundleNow => BundlerCall::DebugSendBundleNow,
        M::DebugSetBundlingMode => BundlerCall::DebugSetBundlingMode(p.required("bundlingMode")?),
        M::DebugSetReputation => BundlerCall::DebugSetReputation {
            entries: p.required("reputations")?,
            entry_point: p.required("entryPoint")?,
        },
        M::DebugDumpReputation => BundlerCall::DebugDumpReputation(p.required("entryPoint")?),
        M::DebugGetStakeStatus => BundlerCall::DebugGetStakeStatus {
            address: p.required("address")?,
            entry_point: p.required("entryPoint")?,
        },
        M::PimlicoGetUserOperationGasPrice => BundlerCall::PimlicoGetUserOperationGasPrice,
        M::PimlicoGetUserOperationStatus => BundlerCall::PimlicoGetUserOperationStatus(p.user_op_hash()?),
        M::PimlicoSendUserOperationNow => BundlerCall::PimlicoSendUserOperationNow {
            user_operation: p.required("userOperation")?,
            entry_point: p.required("entryPoint")?,
        },
    };
    p.finish()?;
    Ok(call)
}

impl TryFrom<JsonRpcRequest> for BundlerRequest {
    type Error = SchemaError;

    fn try_from(req: JsonRpcRequest) -> Result<Self, Self::Error> {
        let method: BundlerMethod = req.method.parse().map_err(SchemaError::UnknownMethod)?;
        let call = parse_call(method, req.params)?;
        Ok(BundlerRequest { id: req.id, call })
    }
}
