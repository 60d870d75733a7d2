//! Mock fork node for testing.
//!
//! Models what the YIP210 flows observe on a mainnet fork:
//! - automining (every transaction mines one block) and a block clock
//! - unlocked accounts, impersonation and ETH balances
//! - ERC-20 balances, Lido `submit` and Chainlink answers
//! - GovernorAlpha/Timelock proposal state transitions
//!
//! Calls arrive as ABI calldata and are decoded with the same `sol!`
//! bindings the RPC client encodes with. Actions executed through the
//! timelock are recorded. The target contracts' logic is external, so a
//! test queues the balance changes an execution should apply with
//! [`MockForkClient::on_execute`].

use super::traits::*;
use crate::contracts::{
    AggregatorV3Interface, ContractAddresses, IERC20, IGovernorAlpha, ILido, ITimelock,
};
use crate::governance::{ProposalState, TIMELOCK_EXECUTION_REVERTED};
use alloy::primitives::{keccak256, Address, Bytes, B256, I256, U256};
use alloy::sol_types::{SolCall, SolInterface, SolValue};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Fork block of the YIP210 test suite.
pub const MOCK_START_BLOCK: u64 = 17_153_676;
const MOCK_START_TIMESTAMP: u64 = 1_682_899_200;
const SECONDS_PER_BLOCK: u64 = 12;

/// Governor and timelock parameters of the mock.
#[derive(Debug, Clone)]
pub struct MockGovernanceParams {
    pub voting_delay: u64,
    pub voting_period: u64,
    pub quorum_votes: U256,
    pub timelock_delay: u64,
    pub grace_period: u64,
}

impl Default for MockGovernanceParams {
    fn default() -> Self {
        Self {
            voting_delay: 1,
            voting_period: 17_280,
            quorum_votes: U256::from(200_000u64) * U256::from(10u64).pow(U256::from(18)),
            timelock_delay: 2 * 24 * 60 * 60,
            grace_period: 14 * 24 * 60 * 60,
        }
    }
}

/// A timelock transaction the mock executed on behalf of the governor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedAction {
    pub proposal_id: U256,
    pub target: Address,
    pub value: U256,
    pub signature: String,
    pub calldata: Bytes,
    pub block_number: u64,
}

/// Token balance change applied when a timelock action executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub token: Address,
    pub holder: Address,
    pub credit: U256,
    pub debit: U256,
}

impl BalanceChange {
    pub fn credit(token: Address, holder: Address, amount: U256) -> Self {
        Self {
            token,
            holder,
            credit: amount,
            debit: U256::ZERO,
        }
    }

    pub fn debit(token: Address, holder: Address, amount: U256) -> Self {
        Self {
            token,
            holder,
            credit: U256::ZERO,
            debit: amount,
        }
    }
}

#[derive(Debug, Clone)]
struct MockProposal {
    targets: Vec<Address>,
    values: Vec<U256>,
    signatures: Vec<String>,
    calldatas: Vec<Bytes>,
    start_block: u64,
    end_block: u64,
    for_votes: U256,
    against_votes: U256,
    eta: u64,
    executed: bool,
    voted: HashSet<Address>,
}

struct MockChain {
    contracts: ContractAddresses,
    params: MockGovernanceParams,
    block: u64,
    timestamp: u64,
    pending_time: u64,
    accounts: Vec<Address>,
    impersonated: HashSet<Address>,
    eth: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    code: HashMap<Address, Bytes>,
    tokens: HashMap<(Address, Address), U256>,
    prices: HashMap<Address, I256>,
    voting_power: HashMap<Address, U256>,
    proposals: Vec<MockProposal>,
    latest_proposal: HashMap<Address, U256>,
    revert_signatures: HashSet<String>,
    execution_effects: HashMap<String, VecDeque<Vec<BalanceChange>>>,
    executed: Vec<ExecutedAction>,
    sent: Vec<TxCall>,
}

/// Mock fork client for testing.
#[derive(Clone)]
pub struct MockForkClient {
    chain: Arc<Mutex<MockChain>>,
}

/// Balance every unlocked account starts with (10 000 ETH, like Anvil).
fn default_account_balance() -> U256 {
    U256::from(10_000u64) * U256::from(10u64).pow(U256::from(18))
}

impl MockForkClient {
    /// Create a mock with ten unlocked, funded accounts and the given
    /// contract layout.
    pub fn new(contracts: ContractAddresses) -> Self {
        Self::with_params(contracts, MockGovernanceParams::default())
    }

    pub fn with_params(contracts: ContractAddresses, params: MockGovernanceParams) -> Self {
        let accounts: Vec<Address> = (1..=10u8)
            .map(|i| Address::with_last_byte(i).create(0))
            .collect();
        let eth = accounts
            .iter()
            .map(|a| (*a, default_account_balance()))
            .collect();

        let mut code = HashMap::new();
        for contract in [
            contracts.governor,
            contracts.timelock,
            contracts.reserves,
            contracts.usdc,
            contracts.steth,
            contracts.weth,
            contracts.steth_usd_feed,
            contracts.usdc_usd_feed,
        ] {
            code.insert(contract, Bytes::from_static(&[0xfe]));
        }

        Self {
            chain: Arc::new(Mutex::new(MockChain {
                contracts,
                params,
                block: MOCK_START_BLOCK,
                timestamp: MOCK_START_TIMESTAMP,
                pending_time: 0,
                accounts,
                impersonated: HashSet::new(),
                eth,
                nonces: HashMap::new(),
                code,
                tokens: HashMap::new(),
                prices: HashMap::new(),
                voting_power: HashMap::new(),
                proposals: Vec::new(),
                latest_proposal: HashMap::new(),
                revert_signatures: HashSet::new(),
                execution_effects: HashMap::new(),
                executed: Vec::new(),
                sent: Vec::new(),
            })),
        }
    }

    /// Give `voter` delegated votes (for test setup).
    pub fn set_voting_power(&self, voter: Address, votes: U256) {
        self.chain.lock().unwrap().voting_power.insert(voter, votes);
    }

    /// Set an ERC-20 balance (for test setup).
    pub fn set_token_balance(&self, token: Address, holder: Address, amount: U256) {
        self.chain
            .lock()
            .unwrap()
            .tokens
            .insert((token, holder), amount);
    }

    /// Set a Chainlink answer (for test setup).
    pub fn set_price(&self, feed: Address, answer: I256) {
        self.chain.lock().unwrap().prices.insert(feed, answer);
    }

    /// Make every timelock execution of `signature` revert, as a YIP210
    /// `execute()` does when the reserves are already within range.
    pub fn revert_on_signature(&self, signature: &str) {
        self.chain
            .lock()
            .unwrap()
            .revert_signatures
            .insert(signature.to_string());
    }

    pub fn clear_revert_on_signature(&self, signature: &str) {
        self.chain
            .lock()
            .unwrap()
            .revert_signatures
            .remove(signature);
    }

    /// Queue the balance changes the next timelock execution of `signature`
    /// applies. Each queued set is used by one execution, in order. A debit
    /// larger than the balance makes the execution revert.
    pub fn on_execute(&self, signature: &str, changes: Vec<BalanceChange>) {
        self.chain
            .lock()
            .unwrap()
            .execution_effects
            .entry(signature.to_string())
            .or_default()
            .push_back(changes);
    }

    pub fn token_balance(&self, token: Address, holder: Address) -> U256 {
        let chain = self.chain.lock().unwrap();
        chain.token_balance(token, holder)
    }

    pub fn eth_balance(&self, account: Address) -> U256 {
        let chain = self.chain.lock().unwrap();
        chain.eth.get(&account).copied().unwrap_or_default()
    }

    pub fn is_impersonated(&self, account: Address) -> bool {
        self.chain.lock().unwrap().impersonated.contains(&account)
    }

    /// Actions executed through the timelock, in execution order.
    pub fn executed_actions(&self) -> Vec<ExecutedAction> {
        self.chain.lock().unwrap().executed.clone()
    }

    /// Every transaction successfully sent, in order.
    pub fn sent_transactions(&self) -> Vec<TxCall> {
        self.chain.lock().unwrap().sent.clone()
    }

    pub fn proposal_count(&self) -> usize {
        self.chain.lock().unwrap().proposals.len()
    }

    /// Governor state of proposal `id` as the contract would report it.
    pub fn proposal_state(&self, id: U256) -> Option<ProposalState> {
        let chain = self.chain.lock().unwrap();
        chain.proposal(id).ok().map(|(_, p)| chain.state_of(p))
    }
}

impl MockChain {
    fn token_balance(&self, token: Address, holder: Address) -> U256 {
        self.tokens
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    fn is_unlocked(&self, account: &Address) -> bool {
        self.accounts.contains(account) || self.impersonated.contains(account)
    }

    fn proposal(&self, id: U256) -> ForkResult<(usize, &MockProposal)> {
        let index = usize::try_from(id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .filter(|i| *i < self.proposals.len())
            .ok_or_else(|| {
                ForkError::Reverted("GovernorAlpha::state: invalid proposal id".to_string())
            })?;
        Ok((index, &self.proposals[index]))
    }

    fn state_of(&self, p: &MockProposal) -> ProposalState {
        if self.block <= p.start_block {
            ProposalState::Pending
        } else if self.block <= p.end_block {
            ProposalState::Active
        } else if p.for_votes <= p.against_votes || p.for_votes < self.params.quorum_votes {
            ProposalState::Defeated
        } else if p.eta == 0 {
            ProposalState::Succeeded
        } else if p.executed {
            ProposalState::Executed
        } else if self.timestamp >= p.eta + self.params.grace_period {
            ProposalState::Expired
        } else {
            ProposalState::Queued
        }
    }

    /// Mine the block a transaction lands in.
    fn advance_block(&mut self) {
        self.block += 1;
        self.timestamp += SECONDS_PER_BLOCK + std::mem::take(&mut self.pending_time);
    }

    fn debit_eth(&mut self, from: Address, value: U256) -> ForkResult<()> {
        let balance = self.eth.entry(from).or_default();
        if *balance < value {
            return Err(ForkError::Rpc(format!(
                "insufficient funds for transfer from {}",
                from
            )));
        }
        *balance -= value;
        Ok(())
    }

    fn apply(&mut self, tx: &TxCall) -> ForkResult<Option<Address>> {
        self.debit_eth(tx.from, tx.value)?;

        let Some(to) = tx.to else {
            let nonce = self.nonces.get(&tx.from).copied().unwrap_or_default();
            let created = tx.from.create(nonce);
            self.code.insert(created, tx.data.clone());
            return Ok(Some(created));
        };

        *self.eth.entry(to).or_default() += tx.value;

        if to == self.contracts.governor {
            self.apply_governor(tx.from, &tx.data)?;
        } else if to == self.contracts.steth && tx.data.starts_with(&ILido::submitCall::SELECTOR) {
            // 1:1 share rate is enough for the flows under test
            *self.tokens.entry((to, tx.from)).or_default() += tx.value;
        } else if let Ok(IERC20::IERC20Calls::transfer(call)) =
            IERC20::IERC20Calls::abi_decode(&tx.data)
        {
            let from_balance = self.token_balance(to, tx.from);
            if from_balance < call.amount {
                return Err(ForkError::Reverted(
                    "ERC20: transfer amount exceeds balance".to_string(),
                ));
            }
            self.tokens.insert((to, tx.from), from_balance - call.amount);
            *self.tokens.entry((to, call.to)).or_default() += call.amount;
        }

        Ok(None)
    }

    fn apply_governor(&mut self, sender: Address, data: &[u8]) -> ForkResult<()> {
        let call = IGovernorAlpha::IGovernorAlphaCalls::abi_decode(data)
            .map_err(|e| ForkError::Reverted(format!("unknown governor call: {}", e)))?;

        match call {
            IGovernorAlpha::IGovernorAlphaCalls::propose(c) => self.propose(sender, c),
            IGovernorAlpha::IGovernorAlphaCalls::castVote(c) => {
                self.cast_vote(sender, c.proposalId, c.support)
            }
            IGovernorAlpha::IGovernorAlphaCalls::queue(c) => self.queue(c.proposalId),
            IGovernorAlpha::IGovernorAlphaCalls::execute(c) => self.execute(c.proposalId),
            _ => Err(ForkError::Reverted(
                "governor view function sent as transaction".to_string(),
            )),
        }
    }

    fn propose(&mut self, proposer: Address, c: IGovernorAlpha::proposeCall) -> ForkResult<()> {
        let n = c.targets.len();
        if n != c.values.len() || n != c.signatures.len() || n != c.calldatas.len() {
            return Err(ForkError::Reverted(
                "GovernorAlpha::propose: proposal function information arity mismatch"
                    .to_string(),
            ));
        }
        if n == 0 {
            return Err(ForkError::Reverted(
                "GovernorAlpha::propose: must provide actions".to_string(),
            ));
        }
        if n > crate::proposal::MAX_OPERATIONS {
            return Err(ForkError::Reverted(
                "GovernorAlpha::propose: too many actions".to_string(),
            ));
        }

        if let Some(latest) = self.latest_proposal.get(&proposer).copied() {
            let (_, previous) = self.proposal(latest)?;
            let state = self.state_of(previous);
            if matches!(state, ProposalState::Active | ProposalState::Pending) {
                return Err(ForkError::Reverted(
                    "GovernorAlpha::propose: one live proposal per proposer".to_string(),
                ));
            }
        }

        let start_block = self.block + self.params.voting_delay;
        self.proposals.push(MockProposal {
            targets: c.targets,
            values: c.values,
            signatures: c.signatures,
            calldatas: c.calldatas,
            start_block,
            end_block: start_block + self.params.voting_period,
            for_votes: U256::ZERO,
            against_votes: U256::ZERO,
            eta: 0,
            executed: false,
            voted: HashSet::new(),
        });
        self.latest_proposal
            .insert(proposer, U256::from(self.proposals.len()));
        Ok(())
    }

    fn cast_vote(&mut self, voter: Address, id: U256, support: bool) -> ForkResult<()> {
        let (index, proposal) = self.proposal(id)?;
        if self.state_of(proposal) != ProposalState::Active {
            return Err(ForkError::Reverted(
                "GovernorAlpha::_castVote: voting is closed".to_string(),
            ));
        }
        if proposal.voted.contains(&voter) {
            return Err(ForkError::Reverted(
                "GovernorAlpha::_castVote: voter already voted".to_string(),
            ));
        }

        let votes = self.voting_power.get(&voter).copied().unwrap_or_default();
        let proposal = &mut self.proposals[index];
        proposal.voted.insert(voter);
        if support {
            proposal.for_votes += votes;
        } else {
            proposal.against_votes += votes;
        }
        Ok(())
    }

    fn queue(&mut self, id: U256) -> ForkResult<()> {
        let (index, proposal) = self.proposal(id)?;
        if self.state_of(proposal) != ProposalState::Succeeded {
            return Err(ForkError::Reverted(
                "GovernorAlpha::queue: proposal can only be queued if it is succeeded"
                    .to_string(),
            ));
        }
        self.proposals[index].eta = self.timestamp + self.params.timelock_delay;
        Ok(())
    }

    fn execute(&mut self, id: U256) -> ForkResult<()> {
        let (index, proposal) = self.proposal(id)?;
        if self.state_of(proposal) != ProposalState::Queued {
            return Err(ForkError::Reverted(
                "GovernorAlpha::execute: proposal can only be executed if it is queued"
                    .to_string(),
            ));
        }
        if self.timestamp < proposal.eta {
            return Err(ForkError::Reverted(
                "Timelock::executeTransaction: Transaction hasn't surpassed time lock."
                    .to_string(),
            ));
        }
        if proposal
            .signatures
            .iter()
            .any(|s| self.revert_signatures.contains(s))
        {
            return Err(ForkError::Reverted(TIMELOCK_EXECUTION_REVERTED.to_string()));
        }

        let signatures = proposal.signatures.clone();
        let block_number = self.block;
        let actions: Vec<ExecutedAction> = (0..proposal.targets.len())
            .map(|i| ExecutedAction {
                proposal_id: id,
                target: proposal.targets[i],
                value: proposal.values[i],
                signature: proposal.signatures[i].clone(),
                calldata: proposal.calldatas[i].clone(),
                block_number,
            })
            .collect();

        self.apply_execution_effects(&signatures)?;
        self.executed.extend(actions);
        self.proposals[index].executed = true;
        Ok(())
    }

    /// Apply the queued effects of every executed signature, all or nothing.
    fn apply_execution_effects(&mut self, signatures: &[String]) -> ForkResult<()> {
        let mut taken: HashMap<&str, usize> = HashMap::new();
        let mut updated: HashMap<(Address, Address), U256> = HashMap::new();

        for signature in signatures {
            let n = taken.entry(signature.as_str()).or_default();
            let Some(changes) = self
                .execution_effects
                .get(signature)
                .and_then(|queue| queue.get(*n))
            else {
                continue;
            };
            *n += 1;

            for change in changes {
                let key = (change.token, change.holder);
                let current = updated
                    .get(&key)
                    .copied()
                    .unwrap_or_else(|| self.token_balance(change.token, change.holder));
                let next = current
                    .checked_add(change.credit)
                    .and_then(|v| v.checked_sub(change.debit))
                    .ok_or_else(|| ForkError::Reverted(TIMELOCK_EXECUTION_REVERTED.to_string()))?;
                updated.insert(key, next);
            }
        }

        for (signature, n) in taken {
            if let Some(queue) = self.execution_effects.get_mut(signature) {
                for _ in 0..n {
                    queue.pop_front();
                }
            }
        }
        self.tokens.extend(updated);
        Ok(())
    }

    fn view(&self, to: Address, data: &[u8]) -> ForkResult<Vec<u8>> {
        if to == self.contracts.governor {
            let call = IGovernorAlpha::IGovernorAlphaCalls::abi_decode(data)
                .map_err(|e| ForkError::Reverted(format!("unknown governor call: {}", e)))?;
            return match call {
                IGovernorAlpha::IGovernorAlphaCalls::state(c) => {
                    let (_, proposal) = self.proposal(c.proposalId)?;
                    Ok(U256::from(self.state_of(proposal) as u8).abi_encode())
                }
                IGovernorAlpha::IGovernorAlphaCalls::latestProposalIds(c) => Ok(self
                    .latest_proposal
                    .get(&c.proposer)
                    .copied()
                    .unwrap_or_default()
                    .abi_encode()),
                IGovernorAlpha::IGovernorAlphaCalls::votingDelay(_) => {
                    Ok(U256::from(self.params.voting_delay).abi_encode())
                }
                IGovernorAlpha::IGovernorAlphaCalls::votingPeriod(_) => {
                    Ok(U256::from(self.params.voting_period).abi_encode())
                }
                _ => Err(ForkError::Reverted(
                    "state-changing governor call made as eth_call".to_string(),
                )),
            };
        }

        if to == self.contracts.timelock {
            if data.starts_with(&ITimelock::delayCall::SELECTOR) {
                return Ok(U256::from(self.params.timelock_delay).abi_encode());
            }
            if data.starts_with(&ITimelock::GRACE_PERIODCall::SELECTOR) {
                return Ok(U256::from(self.params.grace_period).abi_encode());
            }
        }

        if data.starts_with(&AggregatorV3Interface::latestRoundDataCall::SELECTOR) {
            if let Some(answer) = self.prices.get(&to) {
                let round = U256::from(1u64);
                let updated = U256::from(self.timestamp);
                return Ok((round, answer.into_raw(), updated, updated, round).abi_encode_params());
            }
        }

        if let Ok(IERC20::IERC20Calls::balanceOf(c)) = IERC20::IERC20Calls::abi_decode(data) {
            return Ok(self.token_balance(to, c.account).abi_encode());
        }

        Err(ForkError::Reverted(format!(
            "mock has no view for {} at {}",
            data.get(..4).map(hex::encode).unwrap_or_default(),
            to
        )))
    }
}

#[async_trait]
impl ForkClient for MockForkClient {
    async fn accounts(&self) -> ForkResult<Vec<Address>> {
        Ok(self.chain.lock().unwrap().accounts.clone())
    }

    async fn block_number(&self) -> ForkResult<u64> {
        Ok(self.chain.lock().unwrap().block)
    }

    async fn timestamp(&self) -> ForkResult<u64> {
        Ok(self.chain.lock().unwrap().timestamp)
    }

    async fn impersonate(&self, account: Address) -> ForkResult<()> {
        self.chain.lock().unwrap().impersonated.insert(account);
        Ok(())
    }

    async fn mine(&self, blocks: u64) -> ForkResult<()> {
        let mut chain = self.chain.lock().unwrap();
        for _ in 0..blocks {
            chain.advance_block();
        }
        Ok(())
    }

    async fn increase_time(&self, seconds: u64) -> ForkResult<()> {
        self.chain.lock().unwrap().pending_time += seconds;
        Ok(())
    }

    async fn send(&self, tx: TxCall) -> ForkResult<TxOutcome> {
        let mut chain = self.chain.lock().unwrap();
        if !chain.is_unlocked(&tx.from) {
            return Err(ForkError::NotUnlocked(tx.from));
        }

        // Execute against the next block; a revert leaves the chain untouched.
        let (block, timestamp, pending_time) = (chain.block, chain.timestamp, chain.pending_time);
        let eth = chain.eth.clone();
        let tokens = chain.tokens.clone();
        chain.advance_block();

        let contract_address = match chain.apply(&tx) {
            Ok(created) => created,
            Err(e) => {
                chain.block = block;
                chain.timestamp = timestamp;
                chain.pending_time = pending_time;
                chain.eth = eth;
                chain.tokens = tokens;
                return Err(e);
            }
        };

        let nonce = chain.nonces.entry(tx.from).or_default();
        let hash = keccak256((tx.from, U256::from(*nonce)).abi_encode());
        *nonce += 1;

        let block_number = chain.block;
        chain.sent.push(tx);

        Ok(TxOutcome {
            hash: B256::from(hash),
            block_number,
            contract_address,
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> ForkResult<Bytes> {
        let chain = self.chain.lock().unwrap();
        chain.view(to, &data).map(Bytes::from)
    }

    async fn code_at(&self, address: Address) -> ForkResult<Bytes> {
        let chain = self.chain.lock().unwrap();
        Ok(chain.code.get(&address).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{default_account, transact, view};
    use alloy::primitives::address;

    const STRANGER: Address = address!("00000000000000000000000000000000deadbeef");

    fn mock() -> (MockForkClient, ContractAddresses) {
        let contracts = ContractAddresses::default();
        (MockForkClient::new(contracts), contracts)
    }

    #[tokio::test]
    async fn test_send_requires_unlocked_sender() {
        let (client, _) = mock();
        let result = client.send(TxCall::transfer(STRANGER, STRANGER, U256::ZERO)).await;
        assert_eq!(result, Err(ForkError::NotUnlocked(STRANGER)));

        client.impersonate(STRANGER).await.unwrap();
        assert!(client.is_impersonated(STRANGER));
        assert!(client
            .send(TxCall::transfer(STRANGER, STRANGER, U256::ZERO))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_transfer_moves_eth_and_mines_block() {
        let (client, _) = mock();
        let funder = default_account(&client).await.unwrap();
        let start = client.block_number().await.unwrap();

        let outcome = client
            .send(TxCall::transfer(funder, STRANGER, U256::from(100)))
            .await
            .unwrap();

        assert_eq!(outcome.block_number, start + 1);
        assert_eq!(client.eth_balance(STRANGER), U256::from(100));
        assert_eq!(
            client.eth_balance(funder),
            default_account_balance() - U256::from(100)
        );
    }

    #[tokio::test]
    async fn test_revert_does_not_mine() {
        let (client, contracts) = mock();
        let funder = default_account(&client).await.unwrap();
        let start = client.block_number().await.unwrap();

        let err = transact(
            &client,
            funder,
            contracts.governor,
            &IGovernorAlpha::queueCall {
                proposalId: U256::from(1),
            },
        )
        .await
        .unwrap_err();

        assert!(err.revert_reason().is_some());
        assert_eq!(client.block_number().await.unwrap(), start);
        assert!(client.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_increase_time_applies_on_next_block() {
        let (client, _) = mock();
        let t0 = client.timestamp().await.unwrap();

        client.increase_time(1000).await.unwrap();
        assert_eq!(client.timestamp().await.unwrap(), t0);

        client.mine(1).await.unwrap();
        assert_eq!(client.timestamp().await.unwrap(), t0 + 1000 + SECONDS_PER_BLOCK);
    }

    #[tokio::test]
    async fn test_create_assigns_address_and_code() {
        let (client, _) = mock();
        let deployer = default_account(&client).await.unwrap();

        let outcome = client
            .send(TxCall::create(deployer, vec![0x60u8, 0x80]))
            .await
            .unwrap();

        let created = outcome.contract_address.unwrap();
        assert_eq!(created, deployer.create(0));
        assert_eq!(
            client.code_at(created).await.unwrap(),
            Bytes::from(vec![0x60u8, 0x80])
        );
    }

    #[tokio::test]
    async fn test_erc20_views_and_transfer() {
        let (client, contracts) = mock();
        let holder = default_account(&client).await.unwrap();
        client.set_token_balance(contracts.usdc, holder, U256::from(500));

        transact(
            &client,
            holder,
            contracts.usdc,
            &IERC20::transferCall {
                to: contracts.reserves,
                amount: U256::from(200),
            },
        )
        .await
        .unwrap();

        let reserves_balance = view(
            &client,
            contracts.usdc,
            &IERC20::balanceOfCall {
                account: contracts.reserves,
            },
        )
        .await
        .unwrap();
        assert_eq!(reserves_balance, U256::from(200));
        assert_eq!(client.token_balance(contracts.usdc, holder), U256::from(300));

        let overdraw = transact(
            &client,
            holder,
            contracts.usdc,
            &IERC20::transferCall {
                to: contracts.reserves,
                amount: U256::from(301),
            },
        )
        .await;
        assert!(matches!(overdraw, Err(ForkError::Reverted(_))));
    }

    #[tokio::test]
    async fn test_lido_submit_mints_steth() {
        let (client, contracts) = mock();
        let sender = default_account(&client).await.unwrap();

        let call = ILido::submitCall {
            referral: Address::ZERO,
        };
        client
            .send(TxCall::call(sender, contracts.steth, call.abi_encode()).with_value(U256::from(7)))
            .await
            .unwrap();

        assert_eq!(client.token_balance(contracts.steth, sender), U256::from(7));
    }

    #[tokio::test]
    async fn test_price_feed_view() {
        let (client, contracts) = mock();
        client.set_price(contracts.steth_usd_feed, I256::try_from(190_000_000_000i64).unwrap());

        let round = view(
            &client,
            contracts.steth_usd_feed,
            &AggregatorV3Interface::latestRoundDataCall {},
        )
        .await
        .unwrap();

        assert_eq!(round.answer, I256::try_from(190_000_000_000i64).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_view_reverts() {
        let (client, _) = mock();
        let result = client.call(STRANGER, Bytes::from(vec![1u8, 2, 3, 4])).await;
        assert!(matches!(result, Err(ForkError::Reverted(_))));
    }

    #[tokio::test]
    async fn test_invalid_proposal_id_reverts() {
        let (client, contracts) = mock();
        let result = view(
            &client,
            contracts.governor,
            &IGovernorAlpha::stateCall {
                proposalId: U256::from(9),
            },
        )
        .await;
        assert_eq!(
            result,
            Err(ForkError::Reverted(
                "GovernorAlpha::state: invalid proposal id".to_string()
            ))
        );
    }
}
