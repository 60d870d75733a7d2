//! Governance proposal encoding.
//!
//! A GovernorAlpha proposal is a list of (target, value, signature, calldata)
//! actions plus a free-form description. The calldata carries the ABI-encoded
//! arguments only: the timelock prepends the 4-byte selector derived from the
//! signature when it executes the action.

pub mod actions;

#[cfg(test)]
mod proptests;

use crate::contracts::IGovernorAlpha;
use alloy::primitives::{keccak256, Address, Bytes, Selector, U256};
use serde::Serialize;
use std::fmt;

/// GovernorAlpha `proposalMaxOperations()`.
pub const MAX_OPERATIONS: usize = 10;

/// Proposal construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalError {
    #[error("proposal must provide at least one action")]
    NoActions,

    #[error("too many actions: {0} (governor accepts at most {MAX_OPERATIONS})")]
    TooManyActions(usize),

    #[error("invalid function signature: {0:?}")]
    InvalidSignature(String),
}

/// One governance call: the GovernorAlpha 4-tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalAction {
    pub target: Address,
    pub value: U256,
    pub signature: String,
    pub calldata: Bytes,
}

impl ProposalAction {
    /// Build an action, validating that `signature` looks like a canonical
    /// Solidity signature (`name(type,...)`, no whitespace).
    pub fn new(
        target: Address,
        value: U256,
        signature: impl Into<String>,
        calldata: impl Into<Bytes>,
    ) -> Result<Self, ProposalError> {
        let signature = signature.into();
        if !is_canonical_signature(&signature) {
            return Err(ProposalError::InvalidSignature(signature));
        }

        Ok(Self {
            target,
            value,
            signature,
            calldata: calldata.into(),
        })
    }

    /// First four bytes of `keccak256(signature)`.
    pub fn selector(&self) -> Selector {
        Selector::from_slice(&keccak256(self.signature.as_bytes())[..4])
    }

    /// Selector followed by the encoded arguments, i.e. what the timelock
    /// ends up sending to `target`.
    pub fn full_calldata(&self) -> Bytes {
        let mut data = Vec::with_capacity(4 + self.calldata.len());
        data.extend_from_slice(self.selector().as_slice());
        data.extend_from_slice(&self.calldata);
        data.into()
    }
}

impl fmt::Display for ProposalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (value {}, {} bytes calldata)",
            self.target,
            self.signature,
            self.value,
            self.calldata.len()
        )
    }
}

/// Signatures must be `name(args)` with a non-empty identifier name and no
/// whitespace anywhere.
fn is_canonical_signature(signature: &str) -> bool {
    let Some(open) = signature.find('(') else {
        return false;
    };
    let name = &signature[..open];

    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && signature.ends_with(')')
        && !signature.chars().any(char::is_whitespace)
}

/// A complete proposal, ready to be submitted to the governor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    pub actions: Vec<ProposalAction>,
    pub description: String,
}

impl Proposal {
    /// Create a proposal. GovernorAlpha rejects empty proposals and
    /// proposals with more than [`MAX_OPERATIONS`] actions, so do we.
    pub fn new(
        description: impl Into<String>,
        actions: Vec<ProposalAction>,
    ) -> Result<Self, ProposalError> {
        if actions.is_empty() {
            return Err(ProposalError::NoActions);
        }
        if actions.len() > MAX_OPERATIONS {
            return Err(ProposalError::TooManyActions(actions.len()));
        }

        Ok(Self {
            actions,
            description: description.into(),
        })
    }

    /// Single-action proposal.
    pub fn single(description: impl Into<String>, action: ProposalAction) -> Self {
        Self {
            actions: vec![action],
            description: description.into(),
        }
    }

    /// Build the `propose(...)` call with the actions split into the four
    /// parallel arrays the governor expects.
    pub fn propose_call(&self) -> IGovernorAlpha::proposeCall {
        let mut targets = Vec::with_capacity(self.actions.len());
        let mut values = Vec::with_capacity(self.actions.len());
        let mut signatures = Vec::with_capacity(self.actions.len());
        let mut calldatas = Vec::with_capacity(self.actions.len());

        for action in &self.actions {
            targets.push(action.target);
            values.push(action.value);
            signatures.push(action.signature.clone());
            calldatas.push(action.calldata.clone());
        }

        IGovernorAlpha::proposeCall {
            targets,
            values,
            signatures,
            calldatas,
            description: self.description.clone(),
        }
    }
}
