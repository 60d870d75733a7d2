//! Propose → vote → queue → execute.
//!
//! Each step checks `state(id)` first, so a flow that went wrong stops with
//! the state it found instead of an opaque governor revert.

use super::{GovernanceError, GovernanceSettings, ProposalId, ProposalState};
use crate::contracts::{ContractAddresses, IGovernorAlpha, ITimelock};
use crate::node::{default_account, transact, view, ForkClient, TxCall};
use crate::proposal::Proposal;
use alloy::primitives::{Address, B256, U256};
use futures::future::try_join_all;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, GovernanceError>;

/// Outcome of a fully executed proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassedProposal {
    pub id: ProposalId,
    pub description: String,
    pub proposed_at_block: u64,
    pub executed_at_block: u64,
    pub execution_tx: B256,
}

/// Drives proposals through GovernorAlpha + Timelock on a fork node.
pub struct GovernanceWalker<'a, C: ForkClient + ?Sized> {
    client: &'a C,
    governor: Address,
    timelock: Address,
    settings: GovernanceSettings,
}

fn to_u64_saturating(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

impl<'a, C: ForkClient + ?Sized> GovernanceWalker<'a, C> {
    pub fn new(client: &'a C, contracts: &ContractAddresses, settings: GovernanceSettings) -> Self {
        Self {
            client,
            governor: contracts.governor,
            timelock: contracts.timelock,
            settings,
        }
    }

    /// The first configured voter submits, queues and executes.
    pub fn proposer(&self) -> Result<Address> {
        self.settings
            .voters
            .first()
            .copied()
            .ok_or(GovernanceError::NoVoters)
    }

    /// Current governor state of `id`.
    pub async fn state(&self, id: ProposalId) -> Result<ProposalState> {
        let raw = view(
            self.client,
            self.governor,
            &IGovernorAlpha::stateCall { proposalId: id.0 },
        )
        .await?;
        ProposalState::try_from(raw).map_err(GovernanceError::UnknownState)
    }

    async fn require_state(&self, id: ProposalId, expected: ProposalState) -> Result<()> {
        let found = self.state(id).await?;
        if found != expected {
            return Err(GovernanceError::UnexpectedState {
                id,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Impersonate every voter and fund it from the node's first account.
    ///
    /// Returns the funding account.
    pub async fn prepare_voters(&self) -> Result<Address> {
        if self.settings.voters.is_empty() {
            return Err(GovernanceError::NoVoters);
        }

        try_join_all(
            self.settings
                .voters
                .iter()
                .map(|voter| self.client.impersonate(*voter)),
        )
        .await?;

        // Sequential: all transfers come from the same account.
        let funder = default_account(self.client).await?;
        for voter in &self.settings.voters {
            self.client
                .send(TxCall::transfer(funder, *voter, self.settings.voter_funding))
                .await?;
            debug!(%voter, funding = %self.settings.voter_funding, "voter funded");
        }

        info!(
            voters = self.settings.voters.len(),
            %funder,
            "voters impersonated and funded"
        );
        Ok(funder)
    }

    /// Submit `proposal` and mine through the voting delay.
    ///
    /// One block past the delay is mined so that `state()` already reads
    /// Active at the latest block.
    pub async fn propose(&self, proposal: &Proposal) -> Result<ProposalId> {
        self.submit(proposal).await.map(|(id, _)| id)
    }

    async fn submit(&self, proposal: &Proposal) -> Result<(ProposalId, u64)> {
        let proposer = self.proposer()?;

        let outcome = transact(self.client, proposer, self.governor, &proposal.propose_call()).await?;

        let delay = view(self.client, self.governor, &IGovernorAlpha::votingDelayCall {}).await?;
        self.client.mine(to_u64_saturating(delay).saturating_add(1)).await?;

        let id = view(
            self.client,
            self.governor,
            &IGovernorAlpha::latestProposalIdsCall { proposer },
        )
        .await?;
        if id.is_zero() {
            return Err(GovernanceError::ProposalNotFound(proposer));
        }

        let id = ProposalId(id);
        let state = self.state(id).await?;
        info!(
            proposal = %id,
            %state,
            description = %proposal.description,
            actions = proposal.actions.len(),
            block = outcome.block_number,
            "proposal submitted"
        );
        Ok((id, outcome.block_number))
    }

    /// Every voter votes in favour, then the voting period is mined out.
    pub async fn vote(&self, id: ProposalId) -> Result<()> {
        self.require_state(id, ProposalState::Active).await?;

        for voter in &self.settings.voters {
            transact(
                self.client,
                *voter,
                self.governor,
                &IGovernorAlpha::castVoteCall {
                    proposalId: id.0,
                    support: true,
                },
            )
            .await?;
            debug!(proposal = %id, %voter, "vote cast");
        }

        let period = view(self.client, self.governor, &IGovernorAlpha::votingPeriodCall {}).await?;
        self.client.mine(to_u64_saturating(period)).await?;

        let state = self.state(id).await?;
        info!(
            proposal = %id,
            %state,
            votes = self.settings.voters.len(),
            block = self.client.block_number().await?,
            "voting period over"
        );
        Ok(())
    }

    /// Queue a succeeded proposal in the timelock.
    pub async fn queue(&self, id: ProposalId) -> Result<()> {
        self.require_state(id, ProposalState::Succeeded).await?;

        let outcome = transact(
            self.client,
            self.proposer()?,
            self.governor,
            &IGovernorAlpha::queueCall { proposalId: id.0 },
        )
        .await?;

        let state = self.state(id).await?;
        info!(proposal = %id, %state, block = outcome.block_number, "proposal queued");
        Ok(())
    }

    /// Advance the node clock by the timelock delay and mine a block.
    pub async fn await_timelock(&self, id: ProposalId) -> Result<()> {
        self.require_state(id, ProposalState::Queued).await?;

        let delay = view(self.client, self.timelock, &ITimelock::delayCall {}).await?;
        let seconds = to_u64_saturating(delay);

        self.client.increase_time(seconds).await?;
        self.client.mine(1).await?;

        let state = self.state(id).await?;
        info!(
            proposal = %id,
            %state,
            seconds,
            block = self.client.block_number().await?,
            "timelock delay elapsed"
        );
        Ok(())
    }

    /// Execute a queued proposal. Reverts inside the timelock surface as
    /// `GovernanceError::Fork(ForkError::Reverted(..))`.
    pub async fn execute(&self, id: ProposalId) -> Result<(u64, B256)> {
        self.require_state(id, ProposalState::Queued).await?;

        let outcome = transact(
            self.client,
            self.proposer()?,
            self.governor,
            &IGovernorAlpha::executeCall { proposalId: id.0 },
        )
        .await?;

        let state = self.state(id).await?;
        info!(proposal = %id, %state, block = outcome.block_number, "proposal executed");
        Ok((outcome.block_number, outcome.hash))
    }

    /// Everything up to (not including) execution.
    pub async fn pass_until_queued(&self, proposal: &Proposal) -> Result<ProposalId> {
        self.run_until_queued(proposal).await.map(|(id, _)| id)
    }

    async fn run_until_queued(&self, proposal: &Proposal) -> Result<(ProposalId, u64)> {
        self.prepare_voters().await?;
        let (id, proposed_at_block) = self.submit(proposal).await?;
        self.vote(id).await?;
        self.queue(id).await?;
        self.await_timelock(id).await?;
        Ok((id, proposed_at_block))
    }

    /// Full lifecycle.
    pub async fn pass(&self, proposal: &Proposal) -> Result<PassedProposal> {
        let (id, proposed_at_block) = self.run_until_queued(proposal).await?;
        let (executed_at_block, execution_tx) = self.execute(id).await?;

        Ok(PassedProposal {
            id,
            description: proposal.description.clone(),
            proposed_at_block,
            executed_at_block,
            execution_tx,
        })
    }
}
