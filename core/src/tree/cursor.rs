use super::Node;

/// A stateful walker over a subtree.
///
/// The cursor keeps the path from its starting node, so moving to a parent
/// or sibling is constant time, unlike [`Node::parent`].
#[derive(Debug, Clone)]
pub struct TreeCursor<'t> {
    /// Nodes from the starting node down, each with its index in the one above.
    path: Vec<(Node<'t>, usize)>,
}

impl<'t> TreeCursor<'t> {
    pub(crate) fn new(node: Node<'t>) -> Self {
        Self {
            path: vec![(node, 0)],
        }
    }

    pub fn node(&self) -> Node<'t> {
        // The path is never empty: goto_parent keeps the starting node.
        self.path[self.path.len() - 1].0
    }

    pub fn field_name(&self) -> Option<&'t str> {
        if self.path.len() < 2 {
            return None;
        }
        self.node().field_name()
    }

    /// Depth below the node the cursor started at.
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn goto_first_child(&mut self) -> bool {
        match self.node().child(0) {
            Some(child) => {
                self.path.push((child, 0));
                true
            }
            None => false,
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.path.len() < 2 {
            return false;
        }
        let (_, index) = self.path[self.path.len() - 1];
        let parent = self.path[self.path.len() - 2].0;
        match parent.child(index + 1) {
            Some(sibling) => {
                let last = self.path.len() - 1;
                self.path[last] = (sibling, index + 1);
                true
            }
            None => false,
        }
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.path.len() < 2 {
            return false;
        }
        self.path.pop();
        true
    }

    /// Restarts the walk at `node`.
    pub fn reset(&mut self, node: Node<'t>) {
        self.path.clear();
        self.path.push((node, 0));
    }

    /// Visits every node of the subtree in pre-order.
    pub fn preorder(mut self) -> impl Iterator<Item = Node<'t>> {
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }
            let node = self.node();
            if self.goto_first_child() {
                return Some(node);
            }
            while !self.goto_next_sibling() {
                if !self.goto_parent() {
                    done = true;
                    break;
                }
            }
            Some(node)
        })
    }
}
