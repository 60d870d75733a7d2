//! Governance lifecycle driving.
//!
//! Takes a [`Proposal`](crate::proposal::Proposal) through GovernorAlpha and
//! its timelock on a fork node: propose, vote, queue, wait out the delay,
//! execute. Blocks and time are advanced with node cheatcodes in between.

pub mod state;
pub mod walker;

pub use state::{ProposalId, ProposalState};
pub use walker::{GovernanceWalker, PassedProposal};

use crate::node::ForkError;
use alloy::primitives::{utils::parse_ether, Address, U256};

/// Timelock revert reason when the target call of a queued transaction
/// reverts.
pub const TIMELOCK_EXECUTION_REVERTED: &str =
    "Timelock::executeTransaction: Transaction execution reverted.";

/// Voters and funding used to push proposals through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceSettings {
    /// Accounts with enough delegated votes to reach quorum together.
    /// The first one proposes, queues and executes.
    pub voters: Vec<Address>,

    /// ETH sent to each voter for gas before the flow starts.
    pub voter_funding: U256,
}

impl GovernanceSettings {
    pub fn new(voters: Vec<Address>) -> Self {
        Self {
            voters,
            voter_funding: default_voter_funding(),
        }
    }

    pub fn with_funding(mut self, voter_funding: U256) -> Self {
        self.voter_funding = voter_funding;
        self
    }
}

/// 100 ETH per voter.
pub fn default_voter_funding() -> U256 {
    parse_ether("100").unwrap_or(U256::ZERO)
}

/// Governance lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GovernanceError {
    #[error(transparent)]
    Fork(#[from] ForkError),

    #[error("no voters configured (set [governance].voters)")]
    NoVoters,

    #[error("proposal {id} is {found}, expected {expected}")]
    UnexpectedState {
        id: ProposalId,
        expected: ProposalState,
        found: ProposalState,
    },

    #[error("governor returned unknown proposal state {0}")]
    UnknownState(u8),

    #[error("governor has no proposal from {0}")]
    ProposalNotFound(Address),
}

impl GovernanceError {
    /// Revert reason if the failure was an on-chain revert.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::Fork(e) => e.revert_reason(),
            _ => None,
        }
    }
}
