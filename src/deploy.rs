//! YIP210 deployment with fixture semantics.
//!
//! A deployment is recorded under `<deployments_dir>/<network>/YIP210.json`.
//! Later runs reuse the recorded address as long as the node still has code
//! there, so a long-lived fork only deploys once.

use crate::node::{default_account, ForkClient, ForkError, TxCall};
use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONTRACT_NAME: &str = "YIP210";

/// Deployment errors.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("invalid deployment record {path}: {source}")]
    InvalidRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("creation transaction {0} produced no contract address")]
    NoContractAddress(B256),

    #[error(transparent)]
    Fork(#[from] ForkError),
}

type Result<T> = std::result::Result<T, DeployError>;

/// What gets written to the deployments directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: Address,
    pub deployer: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
}

impl DeploymentRecord {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| DeployError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| DeployError::InvalidRecord {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| DeployError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| {
            DeployError::InvalidRecord {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, content).map_err(io_err)
    }
}

/// A YIP210 instance on the node, fresh or reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub record: DeploymentRecord,
    pub reused: bool,
}

/// `<deployments_dir>/<network>/YIP210.json`
pub fn record_path(deployments_dir: &Path, network: &str) -> PathBuf {
    deployments_dir
        .join(network)
        .join(format!("{}.json", CONTRACT_NAME))
}

/// Creation bytecode from a Hardhat (`"bytecode": "0x.."`) or Foundry
/// (`"bytecode": {"object": "0x.."}`) artifact.
pub fn load_bytecode(path: &Path) -> Result<Bytes> {
    let content = fs::read_to_string(path).map_err(|source| DeployError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let invalid = |reason: String| DeployError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    };

    let json: Value = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    let code = match &json["bytecode"] {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj
            .get("object")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("bytecode.object missing".to_string()))?,
        _ => return Err(invalid("bytecode missing".to_string())),
    };

    let code = code.strip_prefix("0x").unwrap_or(code);
    if code.is_empty() {
        return Err(invalid("bytecode is empty (abstract contract?)".to_string()));
    }

    hex::decode(code)
        .map(Bytes::from)
        .map_err(|e| invalid(format!("bytecode is not hex: {}", e)))
}

/// Deploy YIP210 unless a recorded deployment still has code on the node.
pub async fn ensure_deployed<C: ForkClient + ?Sized>(
    client: &C,
    artifact: &Path,
    deployments_dir: &Path,
    network: &str,
) -> Result<Deployment> {
    let path = record_path(deployments_dir, network);

    if path.exists() {
        let record = DeploymentRecord::load(&path)?;
        if !client.code_at(record.address).await?.is_empty() {
            info!(address = %record.address, "reusing deployed YIP210");
            return Ok(Deployment {
                record,
                reused: true,
            });
        }
        info!(address = %record.address, "recorded YIP210 has no code, redeploying");
    }

    let bytecode = load_bytecode(artifact)?;
    let deployer = default_account(client).await?;

    info!(%deployer, "Deploying YIP210...");
    let outcome = client.send(TxCall::create(deployer, bytecode)).await?;
    let address = outcome
        .contract_address
        .ok_or(DeployError::NoContractAddress(outcome.hash))?;

    let record = DeploymentRecord {
        address,
        deployer,
        transaction_hash: outcome.hash,
        block_number: outcome.block_number,
    };
    record.save(&path)?;

    info!(%address, block = outcome.block_number, "YIP210 deployed");
    Ok(Deployment {
        record,
        reused: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::ContractAddresses;
    use crate::node::MockForkClient;
    use tempfile::TempDir;

    fn write_artifact(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("YIP210.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_load_hardhat_artifact() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path(), r#"{"contractName":"YIP210","bytecode":"0x6080604052"}"#);
        assert_eq!(
            load_bytecode(&path).unwrap(),
            Bytes::from(vec![0x60u8, 0x80, 0x60, 0x40, 0x52])
        );
    }

    #[test]
    fn test_load_foundry_artifact() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path(), r#"{"bytecode":{"object":"0x6080","linkReferences":{}}}"#);
        assert_eq!(load_bytecode(&path).unwrap(), Bytes::from(vec![0x60u8, 0x80]));
    }

    #[test]
    fn test_load_rejects_bad_artifacts() {
        let dir = TempDir::new().unwrap();
        for bad in [
            r#"{"abi":[]}"#,
            r#"{"bytecode":"0x"}"#,
            r#"{"bytecode":"0xzz"}"#,
            r#"{"bytecode":{}}"#,
            "not json",
        ] {
            let path = write_artifact(dir.path(), bad);
            assert!(
                matches!(load_bytecode(&path), Err(DeployError::InvalidArtifact { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_artifact_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = load_bytecode(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(DeployError::Io { .. })));
    }

    #[test]
    fn test_record_path_layout() {
        assert_eq!(
            record_path(Path::new("deployments"), "localhost"),
            PathBuf::from("deployments/localhost/YIP210.json")
        );
    }

    #[tokio::test]
    async fn test_deploys_once_then_reuses() {
        let dir = TempDir::new().unwrap();
        let artifact = write_artifact(dir.path(), r#"{"bytecode":"0x6080604052"}"#);
        let deployments = dir.path().join("deployments");
        let client = MockForkClient::new(ContractAddresses::default());

        let first = ensure_deployed(&client, &artifact, &deployments, "localhost")
            .await
            .unwrap();
        assert!(!first.reused);
        assert_eq!(first.record.address, first.record.deployer.create(0));
        assert!(record_path(&deployments, "localhost").exists());

        let second = ensure_deployed(&client, &artifact, &deployments, "localhost")
            .await
            .unwrap();
        assert!(second.reused);
        assert_eq!(second.record, first.record);
        assert_eq!(client.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_record_redeploys() {
        let dir = TempDir::new().unwrap();
        let artifact = write_artifact(dir.path(), r#"{"bytecode":"0x6080604052"}"#);
        let deployments = dir.path().join("deployments");

        // Recorded on a fork that no longer exists
        let stale = DeploymentRecord {
            address: Address::with_last_byte(0x42),
            deployer: Address::with_last_byte(0x01),
            transaction_hash: B256::ZERO,
            block_number: 1,
        };
        stale.save(&record_path(&deployments, "localhost")).unwrap();

        let client = MockForkClient::new(ContractAddresses::default());
        let deployment = ensure_deployed(&client, &artifact, &deployments, "localhost")
            .await
            .unwrap();

        assert!(!deployment.reused);
        assert_ne!(deployment.record.address, stale.address);
        assert_eq!(
            DeploymentRecord::load(&record_path(&deployments, "localhost")).unwrap(),
            deployment.record
        );
    }

    #[test]
    fn test_record_json_field_names() {
        let record = DeploymentRecord {
            address: Address::ZERO,
            deployer: Address::ZERO,
            transaction_hash: B256::ZERO,
            block_number: 7,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("transactionHash").is_some());
        assert_eq!(json["blockNumber"], 7);
    }
}
