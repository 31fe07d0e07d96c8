// src/prepare.rs

//! Converts hosts files (`127.0.0.1<TAB>host` entries) into plain target lists.

use std::path::{Path, PathBuf};
use tracing::{error, info};

const HOSTS_PREFIX: &str = "127.0.0.1\t";
const PREPARED_MARKER: &str = "-prepared";

/// Keeps the host part of every non-comment `127.0.0.1<TAB>` entry.
pub fn prepare_hosts(contents: &str) -> String {
    contents
        .split_inclusive('\n')
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once(HOSTS_PREFIX).map(|(_, host)| host))
        .collect()
}

/// `<stem>-prepared<ext>` next to `input`, or `None` if `input` is already prepared.
pub fn prepared_path(input: &Path) -> Option<PathBuf> {
    if input.to_string_lossy().contains(PREPARED_MARKER) {
        return None;
    }
    let stem = input.file_stem()?.to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{PREPARED_MARKER}.{}", ext.to_string_lossy()),
        None => format!("{stem}{PREPARED_MARKER}"),
    };
    Some(input.with_file_name(name))
}

/// Prepares every file in turn. A file that fails is logged and skipped.
pub async fn prepare_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut written = Vec::new();
    for input in inputs {
        let Some(output) = prepared_path(input) else {
            info!(input = %input.display(), "Already prepared, skipping.");
            continue;
        };

        info!(input = %input.display(), "Preparing file...");
        match prepare_file(input, &output).await {
            Ok(()) => {
                info!(output = %output.display(), "Done!");
                written.push(output);
            }
            Err(e) => error!(input = %input.display(), error = %e, "Could not prepare file, skipping!"),
        }
    }
    written
}

async fn prepare_file(input: &Path, output: &Path) -> std::io::Result<()> {
    let bytes = tokio::fs::read(input).await?;
    let contents = String::from_utf8_lossy(&bytes);
    tokio::fs::write(output, prepare_hosts(&contents)).await
}
