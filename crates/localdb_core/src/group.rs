//! Group handle: a directory of instances, sub-groups and links.

use crate::context::Context;
use crate::error::{CoreError, CoreResult};
use crate::guid::Guid;
use crate::instance::Instance;
use crate::layout::{self, GROUP_LINK_EXTENSION, INSTANCE_LINK_EXTENSION, META_EXTENSION};
use crate::link::FileLink;
use localdb_storage::DirEntry;
use std::path::{Path, PathBuf};

/// One entry of [`Group::children`].
#[derive(Debug)]
pub enum Child {
    /// A sub-directory, or the target of a group link.
    Group(Group),
    /// An instance, or the target of an instance link.
    Instance(Instance),
}

impl Child {
    /// Name of the child.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Group(g) => g.name(),
            Self::Instance(i) => i.name(),
        }
    }
}

/// A directory in the store.
///
/// Groups are produced on demand and never cached; every call re-reads
/// the directory.
#[derive(Debug, Clone)]
pub struct Group {
    context: Context,
    path: PathBuf,
    is_link: bool,
}

impl Group {
    pub(crate) fn new(context: Context, path: PathBuf, is_link: bool) -> Self {
        Self {
            context,
            path,
            is_link,
        }
    }

    /// Group name (the final component of its directory).
    #[must_use]
    pub fn name(&self) -> String {
        layout::file_name(&self.path)
    }

    /// Directory of the group.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if this handle was produced by dereferencing a group link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.is_link
    }

    /// Lists sub-groups, instances and link targets with one directory scan.
    ///
    /// Links are dereferenced exactly once. Undecodable links are skipped.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be read.
    pub fn children(&self) -> CoreResult<Vec<Child>> {
        let entries = self.context.fs().read_dir(&self.path)?;
        Ok(entries
            .iter()
            .filter_map(|entry| self.classify(entry))
            .collect())
    }

    fn classify(&self, entry: &DirEntry) -> Option<Child> {
        if entry.is_dir {
            return Some(Child::Group(Group::new(
                self.context.clone(),
                entry.path.clone(),
                false,
            )));
        }
        match entry.extension()? {
            META_EXTENSION => Some(Child::Instance(Instance::new(
                self.context.clone(),
                entry.path.with_extension(""),
                false,
            ))),
            GROUP_LINK_EXTENSION => {
                let target = self.dereference(&entry.path)?;
                Some(Child::Group(Group::new(self.context.clone(), target, true)))
            }
            INSTANCE_LINK_EXTENSION => {
                let target = self.dereference(&entry.path)?;
                Some(Child::Instance(Instance::new(
                    self.context.clone(),
                    target,
                    true,
                )))
            }
            _ => None,
        }
    }

    fn dereference(&self, link_path: &Path) -> Option<PathBuf> {
        match FileLink::read(self.context.fs(), link_path) {
            Ok(link) => Some(link.resolve(link_path)),
            Err(e) => {
                tracing::warn!(link = %link_path.display(), error = %e, "skipping unreadable link");
                None
            }
        }
    }

    /// Sub-groups, including group link targets.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be read.
    pub fn child_groups(&self) -> CoreResult<Vec<Group>> {
        Ok(self
            .children()?
            .into_iter()
            .filter_map(|c| match c {
                Child::Group(g) => Some(g),
                Child::Instance(_) => None,
            })
            .collect())
    }

    /// Instances, including instance link targets.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be read.
    pub fn child_instances(&self) -> CoreResult<Vec<Instance>> {
        Ok(self
            .children()?
            .into_iter()
            .filter_map(|c| match c {
                Child::Instance(i) => Some(i),
                Child::Group(_) => None,
            })
            .collect())
    }

    /// Looks up the sub-group or group link called `name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `NotFound`, or a codec error for a bad link.
    pub fn group(&self, name: &str) -> CoreResult<Group> {
        layout::validate_name(name)?;
        let fs = self.context.fs();
        let path = self.path.join(name);
        if fs.is_dir(&path) {
            return Ok(Group::new(self.context.clone(), path, false));
        }
        let link_path = layout::with_extension(&path, GROUP_LINK_EXTENSION);
        if fs.is_file(&link_path) {
            let target = FileLink::read(fs, &link_path)?.resolve(&link_path);
            return Ok(Group::new(self.context.clone(), target, true));
        }
        Err(CoreError::not_found("group", path))
    }

    /// Looks up the instance or instance link called `name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `NotFound`, or a codec error for a bad link.
    pub fn instance(&self, name: &str) -> CoreResult<Instance> {
        layout::validate_name(name)?;
        let fs = self.context.fs();
        let stem = self.path.join(name);
        if fs.is_file(&layout::meta_path(&stem)) {
            return Ok(Instance::new(self.context.clone(), stem, false));
        }
        let link_path = layout::with_extension(&stem, INSTANCE_LINK_EXTENSION);
        if fs.is_file(&link_path) {
            let target = FileLink::read(fs, &link_path)?.resolve(&link_path);
            return Ok(Instance::new(self.context.clone(), target, true));
        }
        Err(CoreError::not_found("instance", stem))
    }

    /// Fails if any file or link would collide with child `name`.
    fn ensure_free(&self, name: &str) -> CoreResult<PathBuf> {
        layout::validate_name(name)?;
        let path = self.path.join(name);
        layout::ensure_free(self.context.fs(), &path)?;
        Ok(path)
    }

    /// Creates an empty sub-group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `AlreadyExists`, or a storage error.
    pub fn create_group(&self, name: &str) -> CoreResult<Group> {
        let path = self.ensure_free(name)?;
        self.context.fs().create_dir(&path)?;
        tracing::debug!(group = %path.display(), "group created");
        Ok(Group::new(self.context.clone(), path, false))
    }

    /// Returns a new instance whose creation is queued in an open
    /// transaction. Nothing is written until it is committed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `AlreadyExists`, or `LockTimeout`.
    pub fn create_instance(&self, name: &str, guid: Guid) -> CoreResult<Instance> {
        let stem = self.ensure_free(name)?;
        Instance::create(self.context.clone(), stem, guid)
    }

    /// Writes `<name>.xgl` pointing at the group directory `target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `AlreadyExists`, or a storage error.
    pub fn create_group_link(&self, name: &str, target: impl Into<PathBuf>) -> CoreResult<()> {
        self.create_link(name, target.into(), GROUP_LINK_EXTENSION)
    }

    /// Writes `<name>.xil` pointing at the instance stem `target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `AlreadyExists`, or a storage error.
    pub fn create_instance_link(&self, name: &str, target: impl Into<PathBuf>) -> CoreResult<()> {
        self.create_link(name, target.into(), INSTANCE_LINK_EXTENSION)
    }

    fn create_link(&self, name: &str, target: PathBuf, extension: &str) -> CoreResult<()> {
        let path = self.ensure_free(name)?;
        let link_path = layout::with_extension(&path, extension);
        FileLink::new(target).write(self.context.fs(), &link_path, self.context.format())
    }

    /// Renames the group directory within its parent.
    ///
    /// A group reached through a link cannot be renamed; rename the link's
    /// target group instead.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName`, `AlreadyExists` if the new name is taken by any
    /// entry, meta or link, `InvalidOperation` for a linked group, or a
    /// storage error.
    pub fn rename(&mut self, name: &str) -> CoreResult<()> {
        layout::validate_name(name)?;
        if self.is_link {
            return Err(CoreError::invalid_operation(format!(
                "cannot rename linked group {}",
                self.path.display()
            )));
        }
        let new_path = self.path.with_file_name(name);
        if new_path == self.path {
            return Ok(());
        }
        let fs = self.context.fs();
        layout::ensure_free(fs, &new_path)?;
        fs.rename(&self.path, &new_path)?;
        tracing::debug!(from = %self.path.display(), to = %new_path.display(), "group renamed");
        self.path = new_path;
        Ok(())
    }

    /// Removes the group directory. Only empty groups can be removed.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotEmpty`, or a storage error.
    pub fn remove(self) -> CoreResult<()> {
        let fs = self.context.fs();
        if !fs.read_dir(&self.path)?.is_empty() {
            return Err(CoreError::GroupNotEmpty { path: self.path });
        }
        fs.remove_dir(&self.path)?;
        tracing::debug!(group = %self.path.display(), "group removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localdb_codec::Format;
    use localdb_storage::{FileSystem, InMemoryFileSystem};
    use std::sync::Arc;

    fn root() -> (Arc<InMemoryFileSystem>, Group) {
        let mem = Arc::new(InMemoryFileSystem::new());
        mem.create_dir(Path::new("/db")).unwrap();
        let ctx = Context::new(mem.clone());
        (mem, Group::new(ctx, PathBuf::from("/db"), false))
    }

    fn committed_instance(group: &Group, name: &str) -> Instance {
        let mut instance = group.create_instance(name, Guid::new()).unwrap();
        instance.commit_transaction().unwrap();
        instance
    }

    #[test]
    fn children_classifies_entries() {
        let (mem, root) = root();
        root.create_group("Sub").unwrap();
        committed_instance(&root, "Foo");
        mem.write(Path::new("/db/stray.bin"), b"ignored").unwrap();
        mem.write(Path::new("/db/Foo.xdm~"), b"ignored").unwrap();

        let mut names: Vec<_> = root.children().unwrap().iter().map(Child::name).collect();
        names.sort();
        assert_eq!(names, vec!["Foo".to_string(), "Sub".to_string()]);
    }

    #[test]
    fn links_are_dereferenced_once() {
        let (mem, root) = root();
        let shared = root.create_group("Shared").unwrap();
        committed_instance(&shared, "Rock");
        let level = root.create_group("Level").unwrap();

        level.create_group_link("Textures", "/db/Shared").unwrap();
        level.create_instance_link("Boulder", "../Shared/Rock").unwrap();
        mem.write(Path::new("/db/Level/Broken.xil"), b"not a link").unwrap();

        let children = level.children().unwrap();
        assert_eq!(children.len(), 2);
        for child in children {
            match child {
                Child::Group(g) => {
                    assert!(g.is_link());
                    assert_eq!(g.path(), Path::new("/db/Shared"));
                }
                Child::Instance(i) => {
                    assert!(i.is_link());
                    assert_eq!(i.path(), Path::new("/db/Shared/Rock"));
                }
            }
        }
    }

    #[test]
    fn lookup_by_name() {
        let (_mem, root) = root();
        let sub = root.create_group("Sub").unwrap();
        committed_instance(&sub, "Foo");
        root.create_group_link("Alias", "/db/Sub").unwrap();

        let alias = root.group("Alias").unwrap();
        assert!(alias.is_link());
        assert_eq!(alias.instance("Foo").unwrap().name(), "Foo");
        assert!(root.instance("Foo").unwrap_err().is_not_found());
        assert!(root.group("Nope").unwrap_err().is_not_found());
    }

    #[test]
    fn create_refuses_existing_paths() {
        let (_mem, root) = root();
        root.create_group("Sub").unwrap();
        committed_instance(&root, "Foo");
        root.create_instance_link("Alias", "/db/Foo").unwrap();

        assert!(matches!(root.create_group("Sub"), Err(CoreError::AlreadyExists { .. })));
        assert!(matches!(
            root.create_instance("Foo", Guid::new()),
            Err(CoreError::AlreadyExists { .. })
        ));
        assert!(matches!(
            root.create_group("Alias"),
            Err(CoreError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn created_instance_is_invisible_until_commit() {
        let (_mem, root) = root();
        let mut instance = root.create_instance("Foo", Guid::new()).unwrap();
        assert!(instance.is_transaction_open());
        assert!(root.children().unwrap().is_empty());

        instance.commit_transaction().unwrap();
        assert_eq!(root.child_instances().unwrap().len(), 1);
    }

    #[test]
    fn rename_and_remove_group() {
        let (mem, root) = root();
        let mut sub = root.create_group("Sub").unwrap();
        sub.rename("Renamed").unwrap();
        assert_eq!(sub.path(), Path::new("/db/Renamed"));
        assert!(mem.is_dir(Path::new("/db/Renamed")));

        committed_instance(&sub, "Foo");
        assert!(matches!(
            sub.clone().remove(),
            Err(CoreError::GroupNotEmpty { .. })
        ));

        let mut foo = sub.instance("Foo").unwrap();
        foo.open_transaction().unwrap();
        foo.remove().unwrap();
        foo.commit_transaction().unwrap();
        sub.remove().unwrap();
        assert!(root.child_groups().unwrap().is_empty());
    }

    #[test]
    fn rename_refuses_names_taken_by_instances_and_links() {
        let (mem, root) = root();
        let mut sub = root.create_group("Sub").unwrap();
        committed_instance(&root, "Foo");
        root.create_group_link("Shared", "/db/Sub").unwrap();
        root.create_instance_link("Alias", "/db/Foo").unwrap();
        let before = mem.snapshot();

        for (name, occupied) in [
            ("Foo", "/db/Foo.xdm"),
            ("Shared", "/db/Shared.xgl"),
            ("Alias", "/db/Alias.xil"),
        ] {
            match sub.rename(name) {
                Err(CoreError::AlreadyExists { path }) => assert_eq!(path, Path::new(occupied)),
                other => panic!("{name}: unexpected {other:?}"),
            }
        }
        assert_eq!(sub.path(), Path::new("/db/Sub"));
        assert_eq!(mem.snapshot(), before);
    }

    #[test]
    fn linked_group_cannot_be_renamed() {
        let (mem, root) = root();
        root.create_group("Target").unwrap();
        root.create_group_link("Alias", "/db/Target").unwrap();

        let mut alias = root.group("Alias").unwrap();
        assert!(matches!(
            alias.rename("Moved"),
            Err(CoreError::InvalidOperation { .. })
        ));
        assert!(mem.is_dir(Path::new("/db/Target")));
        assert_eq!(root.group("Alias").unwrap().path(), Path::new("/db/Target"));
    }

    #[test]
    fn text_links_are_readable() {
        let (mem, root) = root();
        root.create_group("Target").unwrap();
        FileLink::new("/db/Target")
            .write(mem.as_ref(), Path::new("/db/Text.xgl"), Format::Text)
            .unwrap();

        assert_eq!(root.group("Text").unwrap().path(), Path::new("/db/Target"));
    }
}
