//! YIP210 proposal tooling
//!
//! Encodes the governance calls of the YIP210 treasury rebalancing proposal
//! and walks them through YAM's GovernorAlpha and Timelock on a mainnet fork.
//!
//! - [`proposal`]: (target, value, signature, calldata) actions
//! - [`governance`]: propose → vote → queue → execute with block/time advancement
//! - [`node`]: fork node access (JSON-RPC or in-memory mock)
//! - [`treasury`]: reserves valuation and the 70/30 band
//! - [`deploy`]: YIP210 deployment with reusable records
//! - [`scenario`]: the end-to-end YIP210 flows
//!
//! The rebalancing logic itself lives in the YIP210 contract.

pub mod contracts;
pub mod deploy;
pub mod governance;
pub mod node;
pub mod proposal;
pub mod scenario;
pub mod treasury;
