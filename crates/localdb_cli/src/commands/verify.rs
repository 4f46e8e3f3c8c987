//! Verify command implementation.

use super::CliError;
use localdb_core::layout::{
    self, GROUP_LINK_EXTENSION, INSTANCE_LINK_EXTENSION, META_EXTENSION, TEMP_SUFFIX,
};
use localdb_core::{CoreResult, Database, FileLink, InstanceMeta};
use localdb_storage::FileSystem;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// One problem found on disk.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    /// Offending path.
    pub path: String,
    /// What is wrong with it.
    pub problem: String,
}

/// Verification result.
#[derive(Debug, Default, Serialize)]
pub struct VerifyResult {
    /// Number of group directories scanned.
    pub groups_checked: usize,
    /// Number of meta files checked.
    pub instances_checked: usize,
    /// Number of link files checked.
    pub links_checked: usize,
    /// List of problems found.
    pub issues: Vec<Issue>,
}

impl VerifyResult {
    /// True if nothing was found.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    fn report(&mut self, path: &Path, problem: impl Into<String>) {
        self.issues.push(Issue {
            path: path.display().to_string(),
            problem: problem.into(),
        });
    }
}

/// Scans the whole tree below the store root.
///
/// Link targets are checked for existence but never descended into.
pub fn check(db: &Database) -> CoreResult<VerifyResult> {
    let mut result = VerifyResult::default();
    scan(db.context().fs(), db.root(), &mut result)?;
    Ok(result)
}

fn scan(fs: &dyn FileSystem, dir: &Path, result: &mut VerifyResult) -> CoreResult<()> {
    result.groups_checked += 1;

    for entry in fs.read_dir(dir)? {
        let path = entry.path.as_path();
        if layout::is_transient(path) {
            let name = layout::file_name(path);
            if name.ends_with(TEMP_SUFFIX) {
                result.report(path, "leftover temp file");
            } else {
                result.report(path, "leftover backup");
            }
            continue;
        }
        if entry.is_dir {
            scan(fs, path, result)?;
            continue;
        }

        match entry.extension() {
            Some(META_EXTENSION) => check_instance(fs, path, result),
            Some(GROUP_LINK_EXTENSION) => check_link(fs, path, true, result),
            Some(INSTANCE_LINK_EXTENSION) => check_link(fs, path, false, result),
            _ => {}
        }
    }
    Ok(())
}

fn check_instance(fs: &dyn FileSystem, meta_path: &Path, result: &mut VerifyResult) {
    result.instances_checked += 1;

    let meta = match InstanceMeta::read(fs, meta_path) {
        Ok(meta) => meta,
        Err(e) => {
            result.report(meta_path, format!("undecodable meta: {e}"));
            return;
        }
    };

    let stem = meta_path.with_extension("");
    if !meta.primary_type.is_empty() && !fs.is_file(&stem) {
        result.report(&stem, format!("payload of type `{}` missing", meta.primary_type));
    }
    for blob in &meta.blobs {
        let blob_path = layout::data_path(&stem, blob);
        if !fs.is_file(&blob_path) {
            result.report(&blob_path, format!("blob `{blob}` missing"));
        }
    }
}

fn check_link(fs: &dyn FileSystem, link_path: &Path, group: bool, result: &mut VerifyResult) {
    result.links_checked += 1;

    let link = match FileLink::read(fs, link_path) {
        Ok(link) => link,
        Err(e) => {
            result.report(link_path, format!("undecodable link: {e}"));
            return;
        }
    };

    let target = link.resolve(link_path);
    let exists = if group {
        fs.is_dir(&target)
    } else {
        fs.is_file(&layout::meta_path(&target))
    };
    if !exists {
        result.report(link_path, format!("dangling link to {}", target.display()));
    }
}

/// Runs the verify command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Verifying store at {:?}", path);
    let db = super::open_existing(path)?;
    let result = check(&db)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_result(&result);
        }
    }

    if result.is_ok() {
        Ok(())
    } else {
        Err(CliError::VerificationFailed(result.issues.len()).into())
    }
}

fn print_result(result: &VerifyResult) {
    println!("Groups:    {}", result.groups_checked);
    println!("Instances: {}", result.instances_checked);
    println!("Links:     {}", result.links_checked);
    println!();

    for issue in &result.issues {
        println!("  {}: {}", issue.path, issue.problem);
    }
    if result.is_ok() {
        println!("✓ Store verification passed");
    } else {
        println!("✗ Store verification failed");
    }
}
