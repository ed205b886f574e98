//! Stateless audit-path verification.

use crate::tree::{leaf_hash, node_hash};

/// Verify that `leaf` sits at `index` in the tree of `num_leaves` leaves
/// committed to by `root`.
///
/// Pure function of its arguments; the path is consumed nearest sibling
/// first, mirroring [`DataTree::prove`](crate::DataTree::prove). The
/// `(index, num_leaves)` pair drives the left/right folding, so a valid
/// path only checks out at its own position.
pub fn verify_inclusion(
    root: &[u8; 32],
    leaf: &[u8],
    path: &[[u8; 32]],
    index: u64,
    num_leaves: u64,
) -> bool {
    if num_leaves == 0 || index >= num_leaves {
        return false;
    }

    let mut node = leaf_hash(leaf);
    let mut position = index;
    let mut upper = num_leaves - 1;
    for sibling in path {
        if upper == 0 {
            // the path claims more levels than the tree has
            return false;
        }
        if position & 1 == 1 || position == upper {
            node = node_hash(sibling, &node);
            if position & 1 == 0 {
                while position & 1 == 0 && position != 0 {
                    position >>= 1;
                    upper >>= 1;
                }
            }
        } else {
            node = node_hash(&node, sibling);
        }
        position >>= 1;
        upper >>= 1;
    }

    upper == 0 && node == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataTree;

    fn filled(n: usize) -> DataTree {
        let mut tree = DataTree::new();
        for i in 0..n {
            tree.push(&[i as u8; 16]);
        }
        tree
    }

    #[test]
    fn all_indices_verify_for_all_widths() {
        for n in 1..=8usize {
            let tree = filled(n);
            let root = tree.root();
            for i in 0..n {
                let path = tree.prove(i).unwrap();
                assert!(
                    verify_inclusion(&root, &[i as u8; 16], &path, i as u64, n as u64),
                    "leaf {i} of {n} should verify"
                );
            }
        }
    }

    #[test]
    fn wrong_leaf_bytes_fail() {
        let tree = filled(4);
        let path = tree.prove(2).unwrap();
        assert!(!verify_inclusion(&tree.root(), b"tampered", &path, 2, 4));
    }

    #[test]
    fn wrong_position_fails() {
        let tree = filled(4);
        let path = tree.prove(2).unwrap();
        assert!(!verify_inclusion(&tree.root(), &[2u8; 16], &path, 1, 4));
        assert!(!verify_inclusion(&tree.root(), &[2u8; 16], &path, 2, 5));
    }

    #[test]
    fn wrong_root_fails() {
        let tree = filled(4);
        let path = tree.prove(0).unwrap();
        assert!(!verify_inclusion(&[0u8; 32], &[0u8; 16], &path, 0, 4));
    }

    #[test]
    fn path_of_wrong_length_fails() {
        let tree = filled(4);
        let mut path = tree.prove(0).unwrap();
        path.push([7u8; 32]);
        assert!(!verify_inclusion(&tree.root(), &[0u8; 16], &path, 0, 4));

        let mut path = tree.prove(0).unwrap();
        path.pop();
        assert!(!verify_inclusion(&tree.root(), &[0u8; 16], &path, 0, 4));
    }

    #[test]
    fn out_of_range_index_fails() {
        let tree = filled(2);
        let path = tree.prove(1).unwrap();
        assert!(!verify_inclusion(&tree.root(), &[1u8; 16], &path, 2, 2));
        assert!(!verify_inclusion(&tree.root(), &[1u8; 16], &path, 0, 0));
    }
}
