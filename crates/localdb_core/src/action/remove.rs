use super::preserve::{discard_all, restore_all, Preserved};
use super::{Action, ActionKind};
use crate::context::Context;
use crate::error::CoreResult;
use crate::layout;
use crate::meta::InstanceMeta;
use localdb_storage::FileSystem;
use std::path::{Path, PathBuf};

/// Deletes an instance: meta, payload and every blob.
///
/// Files are moved to backups during execute and only deleted by clean.
#[derive(Debug)]
pub struct Remove {
    stem: PathBuf,
    preserved: Vec<Preserved>,
}

impl Remove {
    /// Creates the action removing the instance at `stem`.
    pub fn new(stem: impl Into<PathBuf>) -> Self {
        Self {
            stem: stem.into(),
            preserved: Vec::new(),
        }
    }

    /// Every existing file of the instance, meta first.
    pub(crate) fn instance_files(fs: &dyn FileSystem, stem: &Path) -> CoreResult<Vec<PathBuf>> {
        let meta_path = layout::meta_path(stem);
        let meta = InstanceMeta::read(fs, &meta_path)?;

        let mut files = vec![meta_path, layout::object_path(stem)];
        files.extend(meta.blobs.iter().map(|blob| layout::data_path(stem, blob)));
        files.retain(|path| fs.exists(path));
        Ok(files)
    }
}

impl Action for Remove {
    fn kind(&self) -> ActionKind {
        ActionKind::Remove
    }

    fn target(&self) -> &Path {
        &self.stem
    }

    fn execute(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        let files = Self::instance_files(fs, &self.stem)?;
        self.preserved = Preserved::preserve_all(fs, &files)?;
        Ok(())
    }

    fn undo(&mut self, ctx: &Context) -> CoreResult<()> {
        restore_all(ctx.fs(), &mut self.preserved)
    }

    fn clean(&mut self, ctx: &Context) {
        discard_all(ctx.fs(), &self.preserved);
        self.preserved.clear();
    }

    fn redundant(&self, _candidate: &dyn Action) -> bool {
        false
    }
}
