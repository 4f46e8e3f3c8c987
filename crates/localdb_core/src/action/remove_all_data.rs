use super::preserve::{discard_all, restore_all, revert_or_wrap, Preserved, Replacement};
use super::{Action, ActionKind};
use crate::context::Context;
use crate::error::CoreResult;
use crate::layout;
use crate::meta::InstanceMeta;
use std::path::{Path, PathBuf};

/// Deletes every secondary blob and empties the meta blob set.
#[derive(Debug)]
pub struct RemoveAllData {
    stem: PathBuf,
    blobs: Vec<Preserved>,
    meta: Option<Replacement>,
}

impl RemoveAllData {
    /// Creates the action for the instance at `stem`.
    pub fn new(stem: impl Into<PathBuf>) -> Self {
        Self {
            stem: stem.into(),
            blobs: Vec::new(),
            meta: None,
        }
    }
}

impl Action for RemoveAllData {
    fn kind(&self) -> ActionKind {
        ActionKind::RemoveAllData
    }

    fn target(&self) -> &Path {
        &self.stem
    }

    fn execute(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        let meta_path = layout::meta_path(&self.stem);
        let mut meta = InstanceMeta::read(fs, &meta_path)?;
        if meta.blobs.is_empty() {
            return Ok(());
        }

        let files: Vec<PathBuf> = meta
            .blobs
            .iter()
            .map(|blob| layout::data_path(&self.stem, blob))
            .filter(|path| fs.exists(path))
            .collect();
        meta.blobs.clear();
        let buffer = meta.encode(ctx.format())?;

        let mut blobs = Preserved::preserve_all(fs, &files)?;
        match Replacement::apply(fs, &meta_path, &buffer) {
            Ok(replacement) => {
                self.blobs = blobs;
                self.meta = Some(replacement);
                Ok(())
            }
            Err(e) => Err(revert_or_wrap(e, restore_all(fs, &mut blobs))),
        }
    }

    fn undo(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        if let Some(meta) = &self.meta {
            meta.revert(fs)?;
            self.meta = None;
        }
        restore_all(fs, &mut self.blobs)
    }

    fn clean(&mut self, ctx: &Context) {
        let fs = ctx.fs();
        if let Some(meta) = self.meta.take() {
            meta.discard(fs);
        }
        discard_all(fs, &self.blobs);
        self.blobs.clear();
    }
}
