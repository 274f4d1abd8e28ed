use super::Node;

/// An iterator that iteratively traverses the tree of nodes in left-to-right post-order
/// (i.e. depth-first).
///
/// This iterator is created by [`Node::post_order_iter`]. Nodes shared between several positions
/// of the tree are visited once per position.
pub struct PostOrder<'a> {
    /// Nodes whose children are being visited, along with the index of the next child to visit.
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> PostOrder<'a> {
    /// Creates a new iterator over the given tree.
    pub fn new(node: &'a Node) -> Self {
        Self { stack: vec![(node, 0)] }
    }
}

impl<'a> Iterator for PostOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, next_child) = self.stack.last_mut()?;
            let node: &'a Node = *node;
            match node.children().get(*next_child) {
                Some(child) => {
                    *next_child += 1;
                    self.stack.push((child, 0));
                },
                None => {
                    self.stack.pop();
                    return Some(node);
                },
            }
        }
    }
}
