//! Demo assets for the classification variant: a sample image and the
//! class-label table, downloaded into the working directory, plus the
//! label CSV derived locally from the table.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{BuildError, Result};

pub const IMAGE_URL: &str = "https://github.com/dmlc/mxnet.js/blob/master/data/cat.png?raw=true";
pub const LABELS_URL: &str = concat!(
    "https://gist.githubusercontent.com/zhreshold/",
    "4d0b62f3d01426887599d4f7ede23ee5/",
    "raw/596b27d23537e5a1b5751d2b0481ef172f58b539/",
    "imagenet1000_clsid_to_human.txt",
);

pub const IMAGE_FILE: &str = "cat.png";
pub const LABELS_FILE: &str = "synset.txt";
pub const LABELS_CSV_FILE: &str = "synset.csv";

#[derive(Clone, Debug)]
pub struct DemoAssets {
    pub image: PathBuf,
    pub labels: PathBuf,
    pub labels_csv: PathBuf,
}

/// Downloads the image and label table into `workdir` (skipping files that
/// are already present) and derives the label CSV from the table.
pub async fn fetch_assets(workdir: &Path) -> Result<DemoAssets> {
    let client = Client::new();

    let image = workdir.join(IMAGE_FILE);
    download(&client, IMAGE_URL, &image).await?;

    let labels = workdir.join(LABELS_FILE);
    download(&client, LABELS_URL, &labels).await?;

    let labels_csv = workdir.join(LABELS_CSV_FILE);
    if !labels_csv.is_file() {
        let table = tokio::fs::read_to_string(&labels).await?;
        let entries = parse_label_table(&table)?;
        tokio::fs::write(&labels_csv, derive_label_csv(&entries)).await?;
        info!(labels = entries.len(), csv = %labels_csv.display(), "derived label CSV");
    }

    Ok(DemoAssets {
        image,
        labels,
        labels_csv,
    })
}

async fn download(client: &Client, url: &str, dest: &Path) -> Result<()> {
    if dest.is_file() {
        debug!(file = %dest.display(), "already present, skipping download");
        return Ok(());
    }
    info!(%url, file = %dest.display(), "downloading");

    let wrap = |source: reqwest::Error| BuildError::Download {
        url: url.to_string(),
        source,
    };
    let response = client.get(url).send().await.map_err(wrap)?;
    let response = response.error_for_status().map_err(wrap)?;

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk.map_err(wrap)?).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Parses the upstream label table, a Python dict literal mapping class
/// index to a human-readable name, one entry per line.
pub fn parse_label_table(table: &str) -> Result<Vec<(usize, String)>> {
    let mut entries = Vec::new();
    for line in table.lines() {
        let line = line
            .trim()
            .trim_start_matches('{')
            .trim_end_matches('}')
            .trim_end_matches(',');
        if line.is_empty() {
            continue;
        }
        let (index, label) = line
            .split_once(':')
            .ok_or_else(|| BuildError::BadLabelTable(format!("no separator in `{line}`")))?;
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| BuildError::BadLabelTable(format!("bad class index in `{line}`")))?;
        let label = unquote(label.trim());
        entries.push((index, label.to_string()));
    }
    if entries.is_empty() {
        return Err(BuildError::BadLabelTable("no entries".to_string()));
    }
    Ok(entries)
}

fn unquote(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

/// `index,label` rows; labels containing commas or quotes are double-quoted.
pub fn derive_label_csv(entries: &[(usize, String)]) -> String {
    let mut csv = String::new();
    for (index, label) in entries {
        if label.contains(',') || label.contains('"') {
            csv.push_str(&format!("{index},\"{}\"\n", label.replace('"', "\"\"")));
        } else {
            csv.push_str(&format!("{index},{label}\n"));
        }
    }
    csv
}
