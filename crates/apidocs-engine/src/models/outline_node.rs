use serde::Serialize;

/// A node in the navigable heading outline
///
/// Outlines are derived from document text and never persisted. The `id` is a
/// slug suitable for deep links and scroll targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub id: String,
    pub title: String,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }

    /// Visit every node depth-first, yielding it together with its depth
    pub fn walk(&self) -> Vec<(usize, &OutlineNode)> {
        let mut out = Vec::new();
        self.walk_into(0, &mut out);
        out
    }

    fn walk_into<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a OutlineNode)>) {
        out.push((depth, self));
        for child in &self.children {
            child.walk_into(depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_is_depth_first() {
        let mut root = OutlineNode::new("intro", "Intro");
        let mut setup = OutlineNode::new("setup", "Setup");
        setup.children.push(OutlineNode::new("install", "Install"));
        root.children.push(setup);
        root.children.push(OutlineNode::new("usage", "Usage"));

        let visited: Vec<(usize, &str)> = root
            .walk()
            .into_iter()
            .map(|(depth, node)| (depth, node.id.as_str()))
            .collect();

        assert_eq!(
            visited,
            vec![(0, "intro"), (1, "setup"), (2, "install"), (1, "usage")]
        );
    }
}
