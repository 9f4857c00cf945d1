//! Tests for flat-list and hierarchical reconstruction

use super::*;
use crate::models::{FlatNode, NodeType, TreeNode};
use crate::tree::{assign_ids, flatten_tree};

fn flat(id: &str, next: Option<&str>) -> FlatNode {
    FlatNode {
        id: id.to_string(),
        add_date: None,
        last_modified: None,
        ns_root: None,
        title: Some(id.to_uppercase()),
        node_type: NodeType::Bookmark,
        icon: None,
        url: Some(format!("https://{id}.example")),
        tags: Vec::new(),
        next_node: next.map(str::to_string),
        first_child: None,
    }
}

fn folder(id: &str, next: Option<&str>, first_child: Option<&str>) -> FlatNode {
    FlatNode {
        node_type: NodeType::Folder,
        url: None,
        first_child: first_child.map(str::to_string),
        ..flat(id, next)
    }
}

fn ids(nodes: &[FlatNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.id.as_str()).collect()
}

/// Shape of a tree as (id, nested shape) pairs, ignoring everything else
#[derive(Debug, PartialEq)]
struct Shape(Vec<(String, Option<Shape>)>);

fn shape(nodes: &[TreeNode]) -> Shape {
    Shape(
        nodes
            .iter()
            .map(|n| {
                (
                    n.id.clone().unwrap_or_default(),
                    n.contents.as_deref().map(shape),
                )
            })
            .collect(),
    )
}

/// Deterministic tree with mixed depth, empty folders and long sibling lists
fn generated_tree(seed: u64, depth: usize) -> Vec<TreeNode> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    fn grow(next: &mut dyn FnMut() -> usize, depth: usize) -> Vec<TreeNode> {
        let width = next() % 5;
        (0..width)
            .map(|i| {
                if depth > 0 && next() % 3 == 0 {
                    TreeNode::folder(format!("folder-{depth}-{i}"), grow(next, depth - 1))
                } else {
                    TreeNode::bookmark(format!("bm-{depth}-{i}"), "https://gen.example")
                }
            })
            .collect()
    }

    let mut tree = grow(&mut next, depth);
    tree.push(TreeNode::bookmark("anchor", "https://anchor.example"));
    tree
}

// ---------------------------------------------------------------------------
// Flat-list mode
// ---------------------------------------------------------------------------

#[test]
fn test_flat_list_follows_chain_order() {
    let rows = vec![
        flat("c", None),
        flat("a", Some("b")),
        flat("b", Some("c")),
    ];

    let ordered = build_flat_list(rows).unwrap();
    assert_eq!(ids(&ordered), vec!["a", "b", "c"]);
}

#[test]
fn test_flat_list_single_node() {
    let ordered = build_flat_list(vec![flat("only", None)]).unwrap();
    assert_eq!(ids(&ordered), vec!["only"]);
}

#[test]
fn test_flat_list_long_chain_returns_every_node() {
    let n = 500;
    let mut rows: Vec<FlatNode> = (0..n)
        .map(|i| {
            let next = (i + 1 < n).then(|| format!("n{}", i + 1));
            flat(&format!("n{i}"), next.as_deref())
        })
        .collect();
    rows.reverse();

    let ordered = build_flat_list(rows).unwrap();
    assert_eq!(ordered.len(), n);
    assert_eq!(ordered[0].id, "n0");
    assert_eq!(ordered[n - 1].id, format!("n{}", n - 1));
}

#[test]
fn test_flat_list_empty_input_is_corrupted() {
    assert_eq!(build_flat_list(Vec::new()), Err(StructureError::NoHead));
}

#[test]
fn test_flat_list_two_chains_are_corrupted() {
    let rows = vec![
        flat("a", Some("b")),
        flat("b", None),
        flat("x", Some("y")),
        flat("y", None),
    ];

    assert_eq!(
        build_flat_list(rows),
        Err(StructureError::MultipleHeads { count: 2 })
    );
}

#[test]
fn test_flat_list_full_cycle_has_no_head() {
    let rows = vec![flat("a", Some("b")), flat("b", Some("c")), flat("c", Some("a"))];
    assert_eq!(build_flat_list(rows), Err(StructureError::NoHead));
}

#[test]
fn test_flat_list_cycle_behind_head_is_detected() {
    // a -> b -> c -> b: "a" is the only head, the walk loops back to b
    let rows = vec![flat("a", Some("b")), flat("b", Some("c")), flat("c", Some("b"))];
    assert_eq!(
        build_flat_list(rows),
        Err(StructureError::Cycle {
            node_id: "b".to_string()
        })
    );
}

#[test]
fn test_flat_list_detached_cycle_is_detected() {
    // valid chain a -> b plus an island x <-> y that references only itself
    let rows = vec![
        flat("a", Some("b")),
        flat("b", None),
        flat("x", Some("y")),
        flat("y", Some("x")),
    ];

    assert!(matches!(
        build_flat_list(rows),
        Err(StructureError::Cycle { .. })
    ));
}

#[test]
fn test_flat_list_dangling_pointer() {
    let rows = vec![flat("a", Some("ghost"))];
    assert_eq!(
        build_flat_list(rows),
        Err(StructureError::DanglingPointer {
            from: "a".to_string(),
            to: "ghost".to_string()
        })
    );
}

// ---------------------------------------------------------------------------
// Hierarchical mode
// ---------------------------------------------------------------------------

#[test]
fn test_build_tree_example() {
    let rows = vec![
        flat("b", None),
        folder("f", None, Some("b")),
        flat("a", Some("f")),
    ];

    let root = build_tree(rows, Some("a")).unwrap();

    assert_eq!(root.id.as_deref(), Some(ROOT_NODE_ID));
    assert_eq!(root.title.as_deref(), Some(""));
    let top = root.children();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].id.as_deref(), Some("a"));
    assert!(!top[0].is_folder());
    assert_eq!(top[1].id.as_deref(), Some("f"));
    assert_eq!(top[1].children().len(), 1);
    assert_eq!(top[1].children()[0].id.as_deref(), Some("b"));
}

#[test]
fn test_build_tree_without_head_is_empty_root() {
    let root = build_tree(Vec::new(), None).unwrap();
    assert_eq!(root.contents, Some(Vec::new()));
    assert_eq!(root.node_type, Some(NodeType::Folder));
}

#[test]
fn test_build_tree_keeps_empty_folders() {
    let rows = vec![folder("empty", None, None)];
    let root = build_tree(rows, Some("empty")).unwrap();

    assert_eq!(root.children()[0].contents, Some(Vec::new()));
}

#[test]
fn test_build_tree_skips_unreachable_rows() {
    let rows = vec![flat("a", None), flat("stale", None)];
    let root = build_tree(rows, Some("a")).unwrap();

    assert_eq!(root.children().len(), 1);
    assert_eq!(root.children()[0].id.as_deref(), Some("a"));
}

#[test]
fn test_build_tree_detects_folder_inside_itself() {
    let rows = vec![folder("f", None, Some("f"))];
    assert_eq!(
        build_tree(rows, Some("f")),
        Err(StructureError::Cycle {
            node_id: "f".to_string()
        })
    );
}

#[test]
fn test_build_tree_detects_missing_head() {
    let rows = vec![flat("a", None)];
    assert_eq!(
        build_tree(rows, Some("gone")),
        Err(StructureError::DanglingPointer {
            from: ROOT_NODE_ID.to_string(),
            to: "gone".to_string()
        })
    );
}

#[test]
fn test_build_tree_drops_pointer_fields_from_output() {
    let rows = vec![flat("a", Some("b")), flat("b", None)];
    let root = build_tree(rows, Some("a")).unwrap();

    let json = serde_json::to_value(&root).unwrap();
    let first = &json["contents"][0];
    assert!(first.get("next_node").is_none());
    assert!(first.get("first_child").is_none());
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn test_round_trip_example_tree() {
    let mut tree = vec![
        TreeNode::bookmark("A", "https://a.example"),
        TreeNode::folder("F", vec![TreeNode::bookmark("B", "https://b.example")]),
    ];
    assign_ids(&mut tree);

    let rows = flatten_tree(tree.clone());
    let head = rows[0].id.clone();
    let root = build_tree(rows, Some(&head)).unwrap();

    assert_eq!(shape(root.children()), shape(&tree));
    assert_eq!(root.children()[1].children()[0].title.as_deref(), Some("B"));
}

#[test]
fn test_round_trip_generated_trees() {
    for seed in 0..50 {
        let mut tree = generated_tree(seed, 4);
        assign_ids(&mut tree);

        let mut rows = flatten_tree(tree.clone());
        let head = rows[0].id.clone();
        // storage order is arbitrary
        rows.reverse();

        let root = build_tree(rows, Some(&head)).unwrap();
        assert_eq!(shape(root.children()), shape(&tree), "seed {seed}");
    }
}

#[test]
fn test_round_trip_preserves_content_fields() {
    let mut node = TreeNode::bookmark("Rust", "https://www.rust-lang.org").with_tags(["lang"]);
    node.add_date = Some(1_700_000_000_000_000);
    node.last_modified = Some(1_700_000_000_000_001);
    node.ns_root = Some("toolbar".to_string());
    node.icon = Some("data:image/png;base64,AAAA".to_string());
    let mut tree = vec![node];
    assign_ids(&mut tree);

    let rows = flatten_tree(tree.clone());
    let head = rows[0].id.clone();
    let root = build_tree(rows, Some(&head)).unwrap();

    assert_eq!(root.children()[0], tree[0]);
}

#[test]
fn test_flat_round_trip_of_bookmark_only_list() {
    let mut tree: Vec<TreeNode> = (0..10)
        .map(|i| TreeNode::bookmark(format!("B{i}"), "https://x.example"))
        .collect();
    assign_ids(&mut tree);

    let mut rows = flatten_tree(tree.clone());
    rows.rotate_left(4);

    let ordered = build_flat_list(rows).unwrap();
    let expected: Vec<_> = tree.iter().map(|n| n.id.clone().unwrap_or_default()).collect();
    let actual: Vec<_> = ordered.into_iter().map(|n| n.id).collect();
    assert_eq!(actual, expected);
}
