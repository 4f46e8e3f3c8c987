//! Inspect command implementation.

use super::CliError;
use localdb_core::{layout, sniff_format, Database, Instance};
use serde::Serialize;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::info;

/// Instance inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Path stem on disk.
    pub path: String,
    /// Whether the instance was reached through a link.
    pub link: bool,
    /// Unique id.
    pub guid: String,
    /// Primary type name; empty if no payload was written.
    pub type_name: String,
    /// Payload details, if a payload was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadInfo>,
    /// Secondary blobs.
    pub blobs: Vec<BlobInfo>,
}

/// Payload file details.
#[derive(Debug, Serialize)]
pub struct PayloadInfo {
    /// Encoding detected from the file header.
    pub format: String,
    /// Size in bytes.
    pub size: u64,
}

/// Blob file details.
#[derive(Debug, Serialize)]
pub struct BlobInfo {
    /// Blob name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last write time, seconds since the Unix epoch.
    pub modified: u64,
}

/// Looks up an instance by a `/`-separated path relative to the root.
pub fn locate(db: &Database, instance_path: &str) -> Result<Instance, Box<dyn std::error::Error>> {
    let mut parts: Vec<&str> = instance_path.split('/').filter(|p| !p.is_empty()).collect();
    let name = parts.pop().ok_or(CliError::EmptyInstancePath)?;

    let mut group = db.root_group();
    for part in parts {
        group = group.group(part)?;
    }
    Ok(group.instance(name)?)
}

/// Collects what `inspect` reports about `instance`.
pub fn describe(db: &Database, instance: &Instance) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let fs = db.context().fs();
    let type_name = instance.primary_type_name()?;

    let payload = if type_name.is_empty() {
        None
    } else {
        Some(PayloadInfo {
            format: sniff_format(fs, instance.path())?.to_string(),
            size: fs.metadata(instance.path())?.len,
        })
    };

    let mut blobs = Vec::new();
    for name in instance.data_names()? {
        let size = fs.metadata(&layout::data_path(instance.path(), &name))?.len;
        let modified = instance
            .data_last_write_time(&name)?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        blobs.push(BlobInfo { name, size, modified });
    }

    Ok(InspectResult {
        path: instance.path().display().to_string(),
        link: instance.is_link(),
        guid: instance.guid()?.to_string(),
        type_name,
        payload,
        blobs,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, instance_path: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Inspecting {} in {:?}", instance_path, path);
    let db = super::open_existing(path)?;
    let instance = locate(&db, instance_path)?;
    let result = describe(&db, &instance)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("LocalDB Instance Inspection");
    println!("===========================");
    println!();
    println!("Path: {}", result.path);
    if result.link {
        println!("      (reached through a link)");
    }
    println!("Guid: {}", result.guid);
    println!();
    println!("Payload:");
    match &result.payload {
        Some(payload) => {
            println!("  Type:   {}", result.type_name);
            println!("  Format: {}", payload.format);
            println!("  Size:   {}", format_size(payload.size));
        }
        None => println!("  (none)"),
    }
    println!();
    println!("Blobs:");
    if result.blobs.is_empty() {
        println!("  (none)");
    }
    for blob in &result.blobs {
        println!(
            "  {:<16} {:>10}  modified {}",
            blob.name,
            format_size(blob.size),
            blob.modified
        );
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
