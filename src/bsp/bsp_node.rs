//! src/bsp/bsp_node.rs

use crate::utils::Rect;

/// Which way a node was cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    /// Cut across the width: the corridor runs north-south.
    Vertical,
    /// Cut across the height: the corridor runs east-west.
    Horizontal,
}

impl SplitAxis {
    pub fn other(self) -> SplitAxis {
        match self {
            SplitAxis::Vertical => SplitAxis::Horizontal,
            SplitAxis::Horizontal => SplitAxis::Vertical,
        }
    }

    /// Length of `rect` along the dimension this axis cuts.
    pub fn extent_of(self, rect: &Rect) -> f64 {
        match self {
            SplitAxis::Vertical => rect.width,
            SplitAxis::Horizontal => rect.height,
        }
    }
}

/// The cut made at an internal node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub axis: SplitAxis,
    /// Road strip removed between the two children.
    pub corridor: Rect,
}

/// A node in the partition tree. Each node has:
/// - the rectangle it covers,
/// - an optional `split` (None for leaves),
/// - a `front` child (low side of the cut) and a `back` child (high side).
#[derive(Debug, Clone)]
pub struct PartitionNode {
    pub rect: Rect,
    pub split: Option<Split>,
    pub front: Option<Box<PartitionNode>>,
    pub back: Option<Box<PartitionNode>>,
}

impl PartitionNode {
    pub fn create_leaf(rect: Rect) -> Self {
        PartitionNode { rect, split: None, front: None, back: None }
    }

    pub fn create_node(rect: Rect, split: Split, front: PartitionNode, back: PartitionNode) -> Self {
        PartitionNode {
            rect,
            split: Some(split),
            front: Some(Box::new(front)),
            back: Some(Box::new(back)),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    pub fn children(&self) -> impl Iterator<Item = &PartitionNode> {
        self.front.iter().chain(self.back.iter()).map(|b| b.as_ref())
    }

    /// Leaves in depth-first, front-first order. Only leaves receive plots.
    pub fn leaves(&self) -> Vec<&PartitionNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                out.push(node);
                continue;
            }
            stack.extend(node.back.as_deref());
            stack.extend(node.front.as_deref());
        }
        out
    }

    /// Every corridor carved anywhere below this node.
    pub fn corridors(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let Some(split) = &node.split {
                out.push(split.corridor);
            }
        });
        out
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| count += 1);
        count
    }

    /// Pre-order walk.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a PartitionNode)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_in_half() -> PartitionNode {
        let rect = Rect::new(0.0, 0.0, 10.0, 4.0);
        let split = Split { axis: SplitAxis::Vertical, corridor: Rect::new(4.0, 0.0, 2.0, 4.0) };
        PartitionNode::create_node(
            rect,
            split,
            PartitionNode::create_leaf(Rect::new(0.0, 0.0, 4.0, 4.0)),
            PartitionNode::create_leaf(Rect::new(6.0, 0.0, 4.0, 4.0)),
        )
    }

    #[test]
    fn test_leaves_front_first() {
        let root = split_in_half();
        let leaves = root.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].rect.x, 0.0);
        assert_eq!(leaves[1].rect.x, 6.0);
        assert!(!root.is_leaf());
    }

    #[test]
    fn test_corridors_and_count() {
        let root = split_in_half();
        assert_eq!(root.corridors(), vec![Rect::new(4.0, 0.0, 2.0, 4.0)]);
        assert_eq!(root.node_count(), 3);
        assert_eq!(SplitAxis::Vertical.extent_of(&root.rect), 10.0);
        assert_eq!(SplitAxis::Vertical.other(), SplitAxis::Horizontal);
    }
}
