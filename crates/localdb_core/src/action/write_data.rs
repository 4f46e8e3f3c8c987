use super::preserve::{revert_or_wrap, Replacement};
use super::{Action, ActionKind};
use crate::context::Context;
use crate::error::CoreResult;
use crate::layout;
use crate::meta::InstanceMeta;
use std::path::{Path, PathBuf};

/// Replaces one secondary blob and registers its name in the meta.
#[derive(Debug)]
pub struct WriteData {
    stem: PathBuf,
    name: String,
    buffer: Vec<u8>,
    blob: Option<Replacement>,
    meta: Option<Replacement>,
}

impl WriteData {
    /// Creates the action writing `buffer` as blob `name` of `stem`.
    pub fn new(stem: impl Into<PathBuf>, name: impl Into<String>, buffer: Vec<u8>) -> Self {
        Self {
            stem: stem.into(),
            name: name.into(),
            buffer,
            blob: None,
            meta: None,
        }
    }
}

impl Action for WriteData {
    fn kind(&self) -> ActionKind {
        ActionKind::WriteData
    }

    fn target(&self) -> &Path {
        &self.stem
    }

    fn data_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn execute(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        let meta_path = layout::meta_path(&self.stem);
        let mut meta = InstanceMeta::read(fs, &meta_path)?;

        let blob = Replacement::apply(
            fs,
            &layout::data_path(&self.stem, &self.name),
            &self.buffer,
        )?;

        if meta.blobs.insert(self.name.clone()) {
            let updated = meta
                .encode(ctx.format())
                .and_then(|buffer| Replacement::apply(fs, &meta_path, &buffer));
            match updated {
                Ok(replacement) => self.meta = Some(replacement),
                Err(e) => return Err(revert_or_wrap(e, blob.revert(fs))),
            }
        }

        self.blob = Some(blob);
        Ok(())
    }

    fn undo(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        if let Some(meta) = &self.meta {
            meta.revert(fs)?;
            self.meta = None;
        }
        if let Some(blob) = &self.blob {
            blob.revert(fs)?;
            self.blob = None;
        }
        Ok(())
    }

    fn clean(&mut self, ctx: &Context) {
        let fs = ctx.fs();
        for replacement in [self.meta.take(), self.blob.take()].into_iter().flatten() {
            replacement.discard(fs);
        }
    }
}
