//! Dataset upload under `<prefix>/<split>/<file_name>`.

use std::path::Path;

use pickups2deepar_core::DatasetSplit;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::store::ObjectStore;

/// Remote key for a dataset file. Empty prefixes are skipped so the key
/// never starts with "/".
pub fn dataset_key(prefix: &str, split: DatasetSplit, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", split.as_str(), file_name)
    } else {
        format!("{}/{}/{}", prefix, split.as_str(), file_name)
    }
}

/// Put a local file at `key`, overwriting whatever is there.
///
/// The local file is left in place whether or not the upload succeeds.
pub async fn upload_file(store: &ObjectStore, local: &Path, key: &str) -> Result<u64> {
    let data = std::fs::read(local).map_err(|e| StorageError::local_io(local, e))?;
    let bytes = data.len() as u64;

    if store.exists(key).await? {
        debug!(key, "Replacing existing object");
    }
    info!("uploading {} => {}", local.display(), key);
    store.put(key, data).await?;
    info!(key, bytes, "Upload complete");

    Ok(bytes)
}
