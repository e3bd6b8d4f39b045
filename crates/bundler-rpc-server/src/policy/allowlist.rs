//! Method allow-list compilation and matching.
//!
//! Entries are exact bundler method names. Unknown names fail compilation so
//! a typo in config cannot silently disable a method.

use std::collections::HashSet;

use bundler_rpc_core::error::{BundlerRpcError, Result};
use bundler_rpc_core::protocol::BundlerMethod;

/// Compiled allow-list. `All` permits every method in the bundler set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodAllowList {
    All,
    Only(HashSet<BundlerMethod>),
}

impl MethodAllowList {
    pub fn compile(raw: Option<&[String]>) -> Result<Self> {
        let Some(raw) = raw else {
            return Ok(MethodAllowList::All);
        };

        let mut out = HashSet::with_capacity(raw.len());
        for s in raw {
            let m: BundlerMethod = s.parse().map_err(|_| {
                BundlerRpcError::InvalidConfig(format!("invalid rpc.methods entry: {s}"))
            })?;
            out.insert(m);
        }
        Ok(MethodAllowList::Only(out))
    }

    pub fn is_allowed(&self, method: BundlerMethod) -> bool {
        match self {
            MethodAllowList::All => true,
            MethodAllowList::Only(set) => set.contains(&method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_list_allows_everything() {
        let list = MethodAllowList::compile(None).unwrap();
        assert!(BundlerMethod::ALL.iter().all(|m| list.is_allowed(*m)));
    }

    #[test]
    fn explicit_list_is_exact() {
        let raw = vec!["eth_chainId".to_string()];
        let list = MethodAllowList::compile(Some(raw.as_slice())).unwrap();
        assert!(list.is_allowed(BundlerMethod::ChainId));
        assert!(!list.is_allowed(BundlerMethod::SendUserOperation));
    }

    #[test]
    fn empty_list_denies_everything() {
        let list = MethodAllowList::compile(Some(&[][..])).unwrap();
        assert!(!list.is_allowed(BundlerMethod::ChainId));
    }

    #[test]
    fn unknown_entry_fails() {
        let raw = vec!["eth_chainid".to_string()];
        let err = MethodAllowList::compile(Some(raw.as_slice())).unwrap_err();
        assert!(err.to_string().contains("eth_chainid"));
    }
}
