//! Assembles flat folder and file listings into a forest.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{Document, DocumentNode};

/// Build the forest below `parent_id` (`None` for the project root).
///
/// At every level folders come before files, and each group is ordered by
/// name case-insensitively, falling back to the exact name and then the id so
/// the result is deterministic.
pub fn build_tree(
    folders: &[Document],
    files: &[Document],
    parent_id: Option<&str>,
) -> Vec<DocumentNode> {
    let mut folders_by_parent: HashMap<Option<&str>, Vec<&Document>> = HashMap::new();
    for folder in folders {
        folders_by_parent
            .entry(folder.parent_id.as_deref())
            .or_default()
            .push(folder);
    }

    let mut files_by_parent: HashMap<Option<&str>, Vec<&Document>> = HashMap::new();
    for file in files {
        files_by_parent
            .entry(file.parent_id.as_deref())
            .or_default()
            .push(file);
    }

    let mut path: Vec<&str> = parent_id.into_iter().collect();
    build_level(&folders_by_parent, &files_by_parent, parent_id, &mut path)
}

fn build_level<'a>(
    folders_by_parent: &HashMap<Option<&'a str>, Vec<&'a Document>>,
    files_by_parent: &HashMap<Option<&'a str>, Vec<&'a Document>>,
    parent_id: Option<&'a str>,
    path: &mut Vec<&'a str>,
) -> Vec<DocumentNode> {
    let mut level_folders = folders_by_parent
        .get(&parent_id)
        .cloned()
        .unwrap_or_default();
    level_folders.sort_by(|a, b| compare_names(a, b));

    let mut level_files = files_by_parent.get(&parent_id).cloned().unwrap_or_default();
    level_files.sort_by(|a, b| compare_names(a, b));

    let mut nodes = Vec::with_capacity(level_folders.len() + level_files.len());

    for folder in level_folders {
        // A parent cycle would otherwise recurse forever
        if path.contains(&folder.id.as_str()) {
            continue;
        }
        path.push(folder.id.as_str());
        let mut node = DocumentNode::from(folder);
        node.children = build_level(
            folders_by_parent,
            files_by_parent,
            Some(folder.id.as_str()),
            path,
        );
        path.pop();
        nodes.push(node);
    }

    nodes.extend(level_files.into_iter().map(DocumentNode::from));
    nodes
}

fn compare_names(a: &Document, b: &Document) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str, is_folder: bool, parent_id: Option<&str>) -> Document {
        Document {
            id: id.to_string(),
            project_id: "p1".to_string(),
            owner_id: "o1".to_string(),
            title: title.to_string(),
            is_folder,
            parent_id: parent_id.map(str::to_string),
            tags: Vec::new(),
            doc_type: crate::models::FILE_LINK_TYPE.to_string(),
            url: (!is_folder).then(|| format!("https://files.example.com/{id}")),
            created_at: "2026-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000000Z".to_string(),
        }
    }

    fn names(nodes: &[DocumentNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_folders_first_then_files_by_name() {
        let folders = vec![doc("f1", "Zebra", true, None), doc("f2", "Apple", true, None)];
        let files = vec![doc("d1", "b.txt", false, None), doc("d2", "a.txt", false, None)];

        let tree = build_tree(&folders, &files, None);

        assert_eq!(names(&tree), vec!["Apple", "Zebra", "a.txt", "b.txt"]);
        assert!(tree[0].is_folder && tree[1].is_folder);
        assert!(tree[2].url.is_some());
    }

    #[test]
    fn test_ordering_ignores_case() {
        let files = vec![
            doc("d1", "beta.pdf", false, None),
            doc("d2", "Alpha.pdf", false, None),
            doc("d3", "alpha.pdf", false, None),
        ];

        let tree = build_tree(&[], &files, None);

        assert_eq!(names(&tree), vec!["Alpha.pdf", "alpha.pdf", "beta.pdf"]);
    }

    #[test]
    fn test_nested_children_are_attached() {
        let folders = vec![
            doc("root", "Root", true, None),
            doc("child", "Child", true, Some("root")),
        ];
        let files = vec![
            doc("leaf", "leaf.txt", false, Some("child")),
            doc("top", "top.txt", false, None),
        ];

        let tree = build_tree(&folders, &files, None);

        assert_eq!(names(&tree), vec!["Root", "top.txt"]);
        assert_eq!(names(&tree[0].children), vec!["Child"]);
        assert_eq!(names(&tree[0].children[0].children), vec!["leaf.txt"]);
        assert_eq!(tree[0].children[0].parent_id.as_deref(), Some("root"));
    }

    #[test]
    fn test_subtree_from_parent() {
        let folders = vec![
            doc("root", "Root", true, None),
            doc("child", "Child", true, Some("root")),
        ];
        let files = vec![doc("leaf", "leaf.txt", false, Some("root"))];

        let tree = build_tree(&folders, &files, Some("root"));

        assert_eq!(names(&tree), vec!["Child", "leaf.txt"]);
    }

    #[test]
    fn test_parent_cycle_terminates() {
        let folders = vec![doc("a", "A", true, Some("b")), doc("b", "B", true, Some("a"))];

        let tree = build_tree(&folders, &[], Some("a"));

        assert_eq!(names(&tree), vec!["B"]);
        assert!(tree[0].children.is_empty());
    }
}
