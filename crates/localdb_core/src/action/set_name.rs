use super::{Action, ActionKind};
use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::layout;
use crate::meta::InstanceMeta;
use localdb_storage::FileSystem;
use std::path::{Path, PathBuf};

/// Renames the meta, the payload and every blob of an instance.
///
/// Nothing is touched if the new name is already claimed in the group or
/// any destination file already exists. Each completed
/// rename is recorded so undo moves back exactly those files.
#[derive(Debug)]
pub struct SetName {
    stem: PathBuf,
    new_stem: PathBuf,
    moved: Vec<(PathBuf, PathBuf)>,
}

impl SetName {
    /// Creates the action renaming the instance at `stem` to `new_name`.
    pub fn new(stem: impl Into<PathBuf>, new_name: &str) -> Self {
        let stem = stem.into();
        let new_stem = stem.with_file_name(new_name);
        Self {
            stem,
            new_stem,
            moved: Vec::new(),
        }
    }

    /// The stem the instance ends up at.
    #[must_use]
    pub fn new_stem(&self) -> &Path {
        &self.new_stem
    }

    fn planned_moves(&self, fs: &dyn FileSystem) -> CoreResult<Vec<(PathBuf, PathBuf)>> {
        let meta = InstanceMeta::read(fs, &layout::meta_path(&self.stem))?;
        layout::ensure_free(fs, &self.new_stem)?;

        let mut moves = vec![(
            layout::meta_path(&self.stem),
            layout::meta_path(&self.new_stem),
        )];
        let payload = layout::object_path(&self.stem);
        if fs.exists(&payload) {
            moves.push((payload, layout::object_path(&self.new_stem)));
        }
        for blob in &meta.blobs {
            let from = layout::data_path(&self.stem, blob);
            if fs.exists(&from) {
                moves.push((from, layout::data_path(&self.new_stem, blob)));
            }
        }

        if let Some((_, taken)) = moves.iter().find(|(_, to)| fs.exists(to)) {
            return Err(CoreError::already_exists(taken));
        }
        Ok(moves)
    }

    fn move_back(&mut self, fs: &dyn FileSystem) -> CoreResult<()> {
        while let Some((from, to)) = self.moved.last() {
            fs.rename(to, from)?;
            self.moved.pop();
        }
        Ok(())
    }
}

impl Action for SetName {
    fn kind(&self) -> ActionKind {
        ActionKind::SetName
    }

    fn target(&self) -> &Path {
        &self.stem
    }

    fn execute(&mut self, ctx: &Context) -> CoreResult<()> {
        if self.stem == self.new_stem {
            return Ok(());
        }
        let fs = ctx.fs();
        for (from, to) in self.planned_moves(fs)? {
            if let Err(e) = fs.rename(&from, &to) {
                let e = CoreError::from(e);
                return Err(match self.move_back(fs) {
                    Ok(()) => e,
                    Err(undo) => e.with_failed_revert(undo),
                });
            }
            self.moved.push((from, to));
        }
        Ok(())
    }

    fn undo(&mut self, ctx: &Context) -> CoreResult<()> {
        self.move_back(ctx.fs())
    }

    fn clean(&mut self, _ctx: &Context) {
        self.moved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::{memory_context, seed_instance};
    use localdb_storage::FaultInjectingFileSystem;
    use std::sync::Arc;

    #[test]
    fn renames_every_file() {
        let (mem, ctx) = memory_context();
        seed_instance(mem.as_ref(), Path::new("/db/Foo"), &["thumb", "icon"]);

        let mut action = SetName::new("/db/Foo", "Bar");
        action.execute(&ctx).unwrap();
        action.clean(&ctx);

        for path in ["/db/Bar", "/db/Bar.xdm", "/db/Bar.thumb", "/db/Bar.icon"] {
            assert!(mem.exists(Path::new(path)), "{path} missing");
        }
        let leftovers: Vec<_> = mem
            .read_dir(Path::new("/db"))
            .unwrap()
            .into_iter()
            .filter(|e| e.path.to_string_lossy().contains("Foo"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn refuses_taken_destination() {
        let (mem, ctx) = memory_context();
        seed_instance(mem.as_ref(), Path::new("/db/Foo"), &["thumb"]);
        mem.write(Path::new("/db/Bar.thumb"), b"other").unwrap();
        let before = mem.snapshot();

        let mut action = SetName::new("/db/Foo", "Bar");
        assert!(matches!(action.execute(&ctx), Err(CoreError::AlreadyExists { .. })));
        assert_eq!(mem.snapshot(), before);
    }

    #[test]
    fn partial_rename_is_reverted() {
        let (mem, _) = memory_context();
        seed_instance(mem.as_ref(), Path::new("/db/Foo"), &["thumb"]);
        let before = mem.snapshot();

        let faulty = Arc::new(FaultInjectingFileSystem::new(mem.clone()));
        faulty.fail_at_mutation(2);
        let ctx = Context::new(faulty);

        let mut action = SetName::new("/db/Foo", "Bar");
        assert!(action.execute(&ctx).is_err());
        assert_eq!(mem.snapshot(), before);
    }

    #[test]
    fn refuses_name_claimed_by_group_or_link() {
        let (mem, ctx) = memory_context();
        seed_instance(mem.as_ref(), Path::new("/db/Foo"), &[]);
        mem.remove_file(Path::new("/db/Foo")).unwrap();
        mem.create_dir(Path::new("/db/Bar")).unwrap();
        mem.write(Path::new("/db/Baz.xil"), b"link").unwrap();
        mem.write(Path::new("/db/Qux.xgl"), b"link").unwrap();
        let before = mem.snapshot();

        for name in ["Bar", "Baz", "Qux"] {
            let mut action = SetName::new("/db/Foo", name);
            assert!(
                matches!(action.execute(&ctx), Err(CoreError::AlreadyExists { .. })),
                "{name} was not refused"
            );
        }
        assert_eq!(mem.snapshot(), before);
    }

    #[test]
    fn failed_revert_is_reported() {
        let (mem, _) = memory_context();
        seed_instance(mem.as_ref(), Path::new("/db/Foo"), &["thumb"]);
        mem.remove_file(Path::new("/db/Foo")).unwrap();

        let faulty = Arc::new(FaultInjectingFileSystem::new(mem.clone()));
        faulty.fail_path("/db/Bar.thumb");
        faulty.fail_at_mutation(2);
        let ctx = Context::new(faulty);

        let mut action = SetName::new("/db/Foo", "Bar");
        let err = action.execute(&ctx).unwrap_err();
        assert!(err.is_revert_failure(), "unexpected {err:?}");
        assert!(mem.exists(Path::new("/db/Bar.xdm")));
    }

    #[test]
    fn undo_moves_back() {
        let (mem, ctx) = memory_context();
        seed_instance(mem.as_ref(), Path::new("/db/Foo"), &["thumb"]);
        let before = mem.snapshot();

        let mut action = SetName::new("/db/Foo", "Bar");
        action.execute(&ctx).unwrap();
        action.undo(&ctx).unwrap();
        assert_eq!(mem.snapshot(), before);
    }

    #[test]
    fn same_name_is_a_no_op() {
        let (mem, ctx) = memory_context();
        seed_instance(mem.as_ref(), Path::new("/db/Foo"), &[]);
        let before = mem.snapshot();

        let mut action = SetName::new("/db/Foo", "Foo");
        action.execute(&ctx).unwrap();
        assert_eq!(mem.snapshot(), before);
    }
}
