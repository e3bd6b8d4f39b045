//! API version negotiated via the URL path (`/v1/rpc`, `/v2/rpc`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RpcError;

/// Revision of the bundler RPC surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 2] = [ApiVersion::V1, ApiVersion::V2];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token that does not name any known version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown api version `{0}`, expected one of v1, v2")]
pub struct UnknownVersion(pub String);

impl FromStr for ApiVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ApiVersion::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVersion(s.to_string()))
    }
}

/// Resolve the version for one request.
///
/// An absent path token falls back to `default`. Unknown or unsupported
/// versions fail with `InvalidFields`.
pub fn resolve(
    token: Option<&str>,
    default: ApiVersion,
    supported: &[ApiVersion],
) -> std::result::Result<ApiVersion, RpcError> {
    let version = match token {
        Some(t) => t
            .parse::<ApiVersion>()
            .map_err(|e| RpcError::invalid_fields(format!("invalid version {e}")))?,
        None => default,
    };

    if !supported.contains(&version) {
        return Err(RpcError::invalid_fields(format!("unsupported version {version}")));
    }
    Ok(version)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn missing_token_uses_default() {
        let v = resolve(None, ApiVersion::V2, &ApiVersion::ALL).unwrap();
        assert_eq!(v, ApiVersion::V2);
    }

    #[test]
    fn unknown_token_names_the_version() {
        let err = resolve(Some("v9"), ApiVersion::V1, &ApiVersion::ALL).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFields);
        assert!(err.message.contains("v9"), "{}", err.message);
    }

    #[test]
    fn known_but_unsupported_is_rejected() {
        let err = resolve(Some("v2"), ApiVersion::V1, &[ApiVersion::V1]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFields);
        assert_eq!(err.message, "unsupported version v2");
    }

    #[test]
    fn default_must_also_be_supported() {
        let err = resolve(None, ApiVersion::V2, &[ApiVersion::V1]).unwrap_err();
        assert_eq!(err.message, "unsupported version v2");
    }
}
