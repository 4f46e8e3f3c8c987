use super::preserve::{discard_all, revert_or_wrap, Preserved};
use super::{Action, ActionKind};
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::guid::Guid;
use crate::layout;
use crate::meta::InstanceMeta;
use localdb_storage::FileSystem;
use std::path::{Path, PathBuf};

/// Writes the instance meta with a new id.
///
/// With `is_create` the meta must not exist yet and a fresh one is written.
/// Otherwise the existing meta is moved to a backup and rewritten with the
/// new id, keeping its primary type and blob set.
#[derive(Debug)]
pub struct SetGuid {
    stem: PathBuf,
    guid: Guid,
    is_create: bool,
    done: Option<Done>,
}

#[derive(Debug)]
enum Done {
    Created,
    Replaced(Preserved),
}

impl SetGuid {
    /// Creates the action for the instance at `stem`.
    pub fn new(stem: impl Into<PathBuf>, guid: Guid, is_create: bool) -> Self {
        Self {
            stem: stem.into(),
            guid,
            is_create,
            done: None,
        }
    }

    /// The id being written.
    #[must_use]
    pub fn guid(&self) -> Guid {
        self.guid
    }

    fn write_meta(&self, ctx: &Context, meta: &InstanceMeta) -> CoreResult<()> {
        let path = layout::meta_path(&self.stem);
        let buffer = meta.encode(ctx.format())?;
        if let Err(e) = ctx.fs().write(&path, &buffer) {
            return Err(revert_or_wrap(e.into(), remove_partial(ctx.fs(), &path)));
        }
        Ok(())
    }
}

fn remove_partial(fs: &dyn FileSystem, path: &Path) -> CoreResult<()> {
    if fs.exists(path) {
        fs.remove_file(path)?;
    }
    Ok(())
}

impl Action for SetGuid {
    fn kind(&self) -> ActionKind {
        ActionKind::SetGuid
    }

    fn target(&self) -> &Path {
        &self.stem
    }

    fn execute(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        let meta_path = layout::meta_path(&self.stem);

        if self.is_create {
            if fs.exists(&meta_path) {
                return Err(CoreError::already_exists(&meta_path));
            }
            self.write_meta(ctx, &InstanceMeta::new(self.guid))?;
            self.done = Some(Done::Created);
            return Ok(());
        }

        let mut meta = InstanceMeta::read(fs, &meta_path)?;
        meta.guid = self.guid;
        let preserved = Preserved::preserve(fs, &meta_path)?;
        if let Err(e) = self.write_meta(ctx, &meta) {
            return Err(revert_or_wrap(e, preserved.restore(fs)));
        }
        self.done = Some(Done::Replaced(preserved));
        Ok(())
    }

    fn undo(&mut self, ctx: &Context) -> CoreResult<()> {
        let fs = ctx.fs();
        let meta_path = layout::meta_path(&self.stem);
        match &self.done {
            None => {}
            Some(Done::Created) => fs.remove_file(&meta_path)?,
            Some(Done::Replaced(preserved)) => preserved.restore(fs)?,
        }
        self.done = None;
        Ok(())
    }

    fn clean(&mut self, ctx: &Context) {
        if let Some(Done::Replaced(preserved)) = self.done.take() {
            discard_all(ctx.fs(), &[preserved]);
        }
    }
}
