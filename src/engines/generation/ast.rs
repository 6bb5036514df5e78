use crate::engines::generation::template::Template;

/// Which child an edge leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Left,
    Right,
}

/// Edge sequence from the root to a node; empty for the root itself.
pub type NodePath = Vec<Branch>;

/// Binary arithmetic syntax tree persisted by the `expr` generator.
///
/// A leaf owns a bound [`Template`] (its own substitution points included),
/// so rendering never regenerates a leaf.
#[derive(Debug, Clone)]
pub enum ExprNode {
    Leaf(Template),
    Internal {
        left: Box<ExprNode>,
        op: char,
        right: Box<ExprNode>,
    },
}

impl ExprNode {
    pub fn internal(left: ExprNode, op: char, right: ExprNode) -> Self {
        ExprNode::Internal {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Number of nodes, leaves included.
    pub fn size(&self) -> usize {
        match self {
            ExprNode::Leaf(_) => 1,
            ExprNode::Internal { left, right, .. } => 1 + left.size() + right.size(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            ExprNode::Leaf(_) => 0,
            ExprNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Every node in pre-order, as `(path, depth)`.
    pub fn enumerate(&self) -> Vec<(NodePath, usize)> {
        let mut out = Vec::with_capacity(self.size());
        let mut stack: Vec<(&ExprNode, NodePath)> = vec![(self, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if let ExprNode::Internal { left, right, .. } = node {
                let mut right_path = path.clone();
                right_path.push(Branch::Right);
                stack.push((right, right_path));
                let mut left_path = path.clone();
                left_path.push(Branch::Left);
                stack.push((left, left_path));
            }
            let depth = path.len();
            out.push((path, depth));
        }
        out
    }

    pub fn node_at(&self, path: &[Branch]) -> Option<&ExprNode> {
        let mut node = self;
        for branch in path {
            node = match (node, branch) {
                (ExprNode::Internal { left, .. }, Branch::Left) => left,
                (ExprNode::Internal { right, .. }, Branch::Right) => right,
                (ExprNode::Leaf(_), _) => return None,
            };
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[Branch]) -> Option<&mut ExprNode> {
        let mut node = self;
        for branch in path {
            node = match (node, branch) {
                (ExprNode::Internal { left, .. }, Branch::Left) => left,
                (ExprNode::Internal { right, .. }, Branch::Right) => right,
                (ExprNode::Leaf(_), _) => return None,
            };
        }
        Some(node)
    }

    /// In-order rendering; leaves print their last output and internal
    /// nodes are wrapped in `open`/`close`.
    pub fn render(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        self.render_into(open, close, &mut out);
        out
    }

    fn render_into(&self, open: &str, close: &str, out: &mut String) {
        match self {
            ExprNode::Leaf(template) => out.push_str(&template.output()),
            ExprNode::Internal { left, op, right } => {
                out.push_str(open);
                left.render_into(open, close, out);
                out.push(' ');
                out.push(*op);
                out.push(' ');
                right.render_into(open, close, out);
                out.push_str(close);
            }
        }
    }
}

/// Selection weight of each depth when every edge multiplies the running
/// weight by `child_weight` (root weight 1).
///
/// Computed in log space and normalised to the heaviest node, so deep trees
/// with a large factor do not overflow.
pub fn depth_weights(depths: &[usize], child_weight: f64) -> Vec<f64> {
    let log_factor = child_weight.ln();
    let max_log = depths
        .iter()
        .map(|&d| d as f64 * log_factor)
        .fold(f64::NEG_INFINITY, f64::max);
    depths
        .iter()
        .map(|&d| (d as f64 * log_factor - max_log).exp())
        .collect()
}
