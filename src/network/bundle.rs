use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::ModelError;
use crate::network::network::Network;
use crate::network::topology::ModelTopology;

/// Manifest file name inside a model bundle.
pub const MANIFEST_FILE: &str = "model.json";

/// Shard name used by `save_bundle`.
const SHARD_FILE: &str = "group1-shard1of1.bin";

/// Where a model bundle lives: a local directory or a static base URL.
///
/// Either form may also point straight at the manifest
/// (`.../models/model.json`); shard paths resolve against its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Directory(PathBuf),
    Url(String),
}

impl ModelSource {
    /// `http://` and `https://` locations are URLs, anything else a path.
    pub fn parse(location: &str) -> ModelSource {
        if location.starts_with("http://") || location.starts_with("https://") {
            ModelSource::Url(location.to_owned())
        } else {
            ModelSource::Directory(PathBuf::from(location))
        }
    }

    /// Fetches the manifest and every shard, then assembles the network.
    pub async fn load(&self, client: &reqwest::Client) -> Result<Network, ModelError> {
        let (manifest, shards) = match self {
            ModelSource::Directory(dir) => {
                let (manifest_path, base) = split_manifest_path(dir);
                let manifest = read_file(&manifest_path).await?;
                let topology = ModelTopology::from_json(&manifest)?;
                let mut shards = Vec::new();
                for name in shard_names(&topology) {
                    let path = base.join(&name);
                    shards.push((name, read_file(&path).await?));
                }
                (topology, shards)
            }
            ModelSource::Url(url) => {
                let (manifest_url, base) = split_manifest_url(url);
                let manifest = fetch(client, &manifest_url).await?;
                let topology = ModelTopology::from_json(&manifest)?;
                let mut shards = Vec::new();
                for name in shard_names(&topology) {
                    let shard_url = format!("{}/{}", base, name);
                    shards.push((name, fetch(client, &shard_url).await?));
                }
                (topology, shards)
            }
        };

        let mut values = Vec::new();
        for (name, bytes) in &shards {
            values.extend(decode_shard(name, bytes)?);
        }
        debug!("model {}: {} weight values across {} shard(s)", manifest.name, values.len(), shards.len());
        let network = Network::from_topology(&manifest, &values)?;
        info!("loaded model \"{}\" ({} layers)", network.name, network.layers.len());
        if let Some(description) = &network.metadata.description {
            debug!("model description: {}", description);
        }
        Ok(network)
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::Directory(p) => write!(f, "{}", p.display()),
            ModelSource::Url(u) => f.write_str(u),
        }
    }
}

/// Writes `network` as `model.json` plus a single weight shard into `dir`,
/// creating the directory if needed.
pub fn save_bundle(network: &Network, dir: &Path) -> Result<(), ModelError> {
    std::fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    let (topology, values) = network.to_topology(SHARD_FILE);

    let manifest_path = dir.join(MANIFEST_FILE);
    std::fs::write(&manifest_path, topology.to_json_pretty()?)
        .map_err(|e| io_error(&manifest_path, e))?;

    let shard_path = dir.join(SHARD_FILE);
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(&shard_path, bytes).map_err(|e| io_error(&shard_path, e))
}

/// Reinterprets shard bytes as little-endian f32 values.
fn decode_shard(name: &str, bytes: &[u8]) -> Result<Vec<f32>, ModelError> {
    if bytes.len() % 4 != 0 {
        return Err(ModelError::ShardLength { name: name.to_owned(), len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn shard_names(topology: &ModelTopology) -> Vec<String> {
    topology.weights_manifest.iter().flat_map(|g| g.paths.iter().cloned()).collect()
}

fn split_manifest_path(location: &Path) -> (PathBuf, PathBuf) {
    if location.extension().and_then(|e| e.to_str()) == Some("json") {
        let base = location.parent().map(Path::to_path_buf).unwrap_or_default();
        (location.to_path_buf(), base)
    } else {
        (location.join(MANIFEST_FILE), location.to_path_buf())
    }
}

fn split_manifest_url(location: &str) -> (String, String) {
    let trimmed = location.trim_end_matches('/');
    if trimmed.ends_with(".json") {
        let base = trimmed.rsplit_once('/').map(|(b, _)| b).unwrap_or("");
        (trimmed.to_owned(), base.to_owned())
    } else {
        (format!("{}/{}", trimmed, MANIFEST_FILE), trimmed.to_owned())
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ModelError> {
    tokio::fs::read(path).await.map_err(|e| io_error(path, e))
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ModelError> {
    let fetch_error = |e: reqwest::Error| ModelError::Fetch { url: url.to_owned(), message: e.to_string() };
    let response = client.get(url).send().await.map_err(fetch_error)?;
    let response = response.error_for_status().map_err(fetch_error)?;
    let bytes = response.bytes().await.map_err(fetch_error)?;
    Ok(bytes.to_vec())
}

fn io_error(path: &Path, source: std::io::Error) -> ModelError {
    ModelError::Io { path: path.to_path_buf(), source }
}
