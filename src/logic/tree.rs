use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Split a dotted index ("1.2.10") into its numeric segments
pub fn index_segments(index: &str) -> Option<Vec<u64>> {
    index
        .split('.')
        .map(|segment| {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                segment.parse::<u64>().ok()
            }
        })
        .collect()
}

/// Order dotted indices segment by segment, numerically.
///
/// A prefix sorts before any index that extends it. Indices that are not
/// well formed fall back to plain string order.
pub fn compare_indices(a: &str, b: &str) -> Ordering {
    match (index_segments(a), index_segments(b)) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => a.cmp(b),
    }
}

/// Index of the enclosing assembly, or `None` for a top-level index
pub fn parent_index(index: &str) -> Option<&str> {
    index.rsplit_once('.').map(|(parent, _)| parent)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<T> {
    pub record: T,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Parent-linked arena of records. Slots are assigned in sorted index order,
/// so a parent's slot is always lower than its children's.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest<T> {
    nodes: Vec<TreeNode<T>>,
    roots: Vec<usize>,
}

impl<T> Forest<T> {
    /// Build a forest from records carrying dotted indices.
    ///
    /// A record whose parent index is not present becomes a root.
    pub fn build<F>(records: Vec<T>, index_of: F) -> Self
    where
        F: Fn(&T) -> &str,
    {
        let sorted = records
            .into_iter()
            .sorted_by(|a, b| compare_indices(index_of(a), index_of(b)));

        let mut nodes: Vec<TreeNode<T>> = Vec::new();
        let mut roots = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();

        for record in sorted {
            let index = index_of(&record).to_string();
            let slot = nodes.len();
            let parent = parent_index(&index).and_then(|p| slots.get(p).copied());

            nodes.push(TreeNode {
                record,
                parent,
                children: Vec::new(),
            });

            match parent {
                Some(parent) => nodes[parent].children.push(slot),
                None => roots.push(slot),
            }
            slots.insert(index, slot);
        }

        Self { nodes, roots }
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn node(&self, slot: usize) -> &TreeNode<T> {
        &self.nodes[slot]
    }

    pub fn nodes(&self) -> &[TreeNode<T>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
