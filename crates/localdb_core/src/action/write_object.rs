use super::preserve::{revert_or_wrap, Replacement};
use super::{Action, ActionKind};
use crate::context::Context;
use crate::error::CoreResult;
use crate::layout;
use crate::meta::InstanceMeta;
use std::path::{Path, PathBuf};

/// Replaces the payload and records its type name in the meta.
///
/// The buffer is serialized when the action is queued, so a codec failure
/// never reaches the disk.
#[derive(Debug)]
pub struct WriteObject {
    stem: PathBuf,
    buffer: Vec<u8>,
    type_name: String,
    payload: Option<Replacement>,
    meta: Option<Replacement>,
}

impl WriteObject {
    /// Creates the action writing `buffer` as the payload of `stem`.
    pub fn new(stem: impl Into<PathBuf>, buffer: Vec<u8>, type_name: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            buffer,
            type_name: type_name.into(),
            payload: None,
            meta: None,
        }
    }
}

impl Action for WriteObject {
    fn kind(&self) -> ActionKind {
        ActionKind::WriteObject
    }

    fn target(&self) -> &Path {
        &self.stem
    }

    fn execute(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        let meta_path = layout::meta_path(&self.stem);
        let mut meta = InstanceMeta::read(fs, &meta_path)?;

        let payload = Replacement::apply(fs, &layout::object_path(&self.stem), &self.buffer)?;

        if meta.primary_type != self.type_name {
            meta.primary_type.clone_from(&self.type_name);
            let updated = meta
                .encode(ctx.format())
                .and_then(|buffer| Replacement::apply(fs, &meta_path, &buffer));
            match updated {
                Ok(replacement) => self.meta = Some(replacement),
                Err(e) => return Err(revert_or_wrap(e, payload.revert(fs))),
            }
        }

        self.payload = Some(payload);
        Ok(())
    }

    fn undo(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        if let Some(meta) = &self.meta {
            meta.revert(fs)?;
            self.meta = None;
        }
        if let Some(payload) = &self.payload {
            payload.revert(fs)?;
            self.payload = None;
        }
        Ok(())
    }

    fn clean(&mut self, ctx: &Context) {
        let fs = ctx.fs();
        for replacement in [self.meta.take(), self.payload.take()].into_iter().flatten() {
            replacement.discard(fs);
        }
    }
}
