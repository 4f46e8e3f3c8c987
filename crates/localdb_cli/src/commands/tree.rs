//! Tree command implementation.

use localdb_core::{Child, CoreResult, Group};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A group directory.
    Group,
    /// An instance.
    Instance,
}

/// One node of the printed hierarchy.
#[derive(Debug, Serialize)]
pub struct TreeNode {
    /// Display name.
    pub name: String,
    /// Group or instance.
    pub kind: NodeKind,
    /// True if reached through a link file.
    pub link: bool,
    /// Children, for groups that were expanded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Builds the hierarchy below `group`.
///
/// Linked groups are listed but never expanded, so link cycles terminate.
pub fn build(group: &Group, depth: Option<usize>) -> CoreResult<TreeNode> {
    let mut node = TreeNode {
        name: group.name(),
        kind: NodeKind::Group,
        link: group.is_link(),
        children: Vec::new(),
    };
    if depth == Some(0) || group.is_link() {
        return Ok(node);
    }

    let next = depth.map(|d| d - 1);
    for child in group.children()? {
        match child {
            Child::Group(sub) => node.children.push(build(&sub, next)?),
            Child::Instance(instance) => node.children.push(TreeNode {
                name: instance.name(),
                kind: NodeKind::Instance,
                link: instance.is_link(),
                children: Vec::new(),
            }),
        }
    }
    Ok(node)
}

/// Runs the tree command.
pub fn run(path: &Path, depth: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Reading tree of {:?}", path);
    let db = super::open_existing(path)?;
    let root = build(&db.root_group(), depth)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&root)?);
        }
        _ => {
            let mut out = String::new();
            render(&root, 0, &mut out);
            print!("{out}");
        }
    }

    Ok(())
}

fn render(node: &TreeNode, level: usize, out: &mut String) {
    let indent = "  ".repeat(level);
    let suffix = if node.kind == NodeKind::Group { "/" } else { "" };
    let marker = if node.link { " [link]" } else { "" };
    out.push_str(&format!("{indent}{}{suffix}{marker}\n", node.name));
    for child in &node.children {
        render(child, level + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localdb_core::{Database, Guid};

    fn sample_tree() -> Database {
        let db = Database::open_in_memory().unwrap();
        let root = db.root_group();
        let levels = root.create_group("Levels").unwrap();
        let one = levels.create_group("One").unwrap();
        let mut player = one.create_instance("Player", Guid::new()).unwrap();
        player.commit_transaction().unwrap();
        root.create_group_link("Shortcut", "/Levels").unwrap();
        db
    }

    #[test]
    fn builds_nested_hierarchy() {
        let db = sample_tree();
        let tree = build(&db.root_group(), None).unwrap();

        let levels = tree.children.iter().find(|c| !c.link).unwrap();
        assert_eq!(levels.name, "Levels");
        assert_eq!(levels.children[0].name, "One");
        assert_eq!(levels.children[0].children[0].kind, NodeKind::Instance);
    }

    #[test]
    fn linked_groups_are_not_expanded() {
        let db = sample_tree();
        let tree = build(&db.root_group(), None).unwrap();

        let link = tree.children.iter().find(|c| c.link).unwrap();
        assert_eq!(link.kind, NodeKind::Group);
        assert!(link.children.is_empty());
    }

    #[test]
    fn depth_limits_descent() {
        let db = sample_tree();
        let tree = build(&db.root_group(), Some(1)).unwrap();

        assert_eq!(tree.children.len(), 2);
        assert!(tree.children.iter().all(|c| c.children.is_empty()));
    }

    #[test]
    fn text_rendering_marks_groups_and_links() {
        let node = TreeNode {
            name: "root".into(),
            kind: NodeKind::Group,
            link: false,
            children: vec![TreeNode {
                name: "Shared".into(),
                kind: NodeKind::Group,
                link: true,
                children: Vec::new(),
            }],
        };
        let mut out = String::new();
        render(&node, 0, &mut out);
        assert_eq!(out, "root/\n  Shared/ [link]\n");
    }
}
