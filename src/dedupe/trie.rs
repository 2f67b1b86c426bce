//! Label trie keyed by domain labels, TLD first

use std::collections::HashMap;

/// One node of the label trie
///
/// Children are owned exclusively by their parent node.
#[derive(Debug, Default)]
struct Node {
    terminal: bool,
    children: HashMap<String, Node>,
}

/// Outcome of inserting one domain into the trie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// The domain ends on a new terminal node
    Accepted,

    /// A shorter domain already covers this one
    ///
    /// `depth` is the number of labels (from the TLD) of the covering domain.
    Covered { depth: usize },

    /// The exact same domain was inserted before
    Duplicate,
}

/// Trie of reversed domain labels
///
/// A terminal node marks the end of an accepted domain. Any later domain whose
/// path runs through a terminal node is a subdomain of that accepted domain.
/// Correct redundancy detection requires inserting domains in ascending label
/// count, which [`dedupe`](super::dedupe) takes care of.
#[derive(Debug, Default)]
pub struct LabelTrie {
    root: Node,
    accepted: usize,
}

impl LabelTrie {
    /// Creates an empty trie
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a domain given as labels ordered TLD first
    ///
    /// Walks from the root. Meeting a terminal node before the last label means
    /// the domain is covered; ending on an already terminal node means it is a
    /// duplicate. Otherwise the final node is marked terminal.
    pub fn insert<S: AsRef<str>>(&mut self, labels: &[S]) -> Insertion {
        let mut node = &mut self.root;

        for (depth, label) in labels.iter().enumerate() {
            if node.terminal {
                return Insertion::Covered { depth };
            }
            node = node
                .children
                .entry(label.as_ref().to_string())
                .or_default();
        }

        if node.terminal {
            return Insertion::Duplicate;
        }

        node.terminal = true;
        self.accepted += 1;
        Insertion::Accepted
    }

    /// Returns true if the domain, or one of its parents, was accepted
    pub fn covers<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        let mut node = &self.root;

        for label in labels {
            if node.terminal {
                return true;
            }
            match node.children.get(label.as_ref()) {
                Some(child) => node = child,
                None => return false,
            }
        }

        node.terminal
    }

    /// Number of accepted domains
    pub fn len(&self) -> usize {
        self.accepted
    }

    /// Returns true if no domain has been accepted
    pub fn is_empty(&self) -> bool {
        self.accepted == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_into_empty_trie() {
        let mut trie = LabelTrie::new();
        assert!(trie.is_empty());
        assert_eq!(trie.insert(&["com", "example"]), Insertion::Accepted);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_subdomain_is_covered() {
        let mut trie = LabelTrie::new();
        trie.insert(&["com", "example"]);

        assert_eq!(
            trie.insert(&["com", "example", "www"]),
            Insertion::Covered { depth: 2 }
        );
        assert_eq!(
            trie.insert(&["com", "example", "a", "b"]),
            Insertion::Covered { depth: 2 }
        );
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_duplicate() {
        let mut trie = LabelTrie::new();
        trie.insert(&["com", "example"]);
        assert_eq!(trie.insert(&["com", "example"]), Insertion::Duplicate);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_siblings_are_independent() {
        let mut trie = LabelTrie::new();
        assert_eq!(trie.insert(&["com", "a"]), Insertion::Accepted);
        assert_eq!(trie.insert(&["com", "b"]), Insertion::Accepted);
        assert_eq!(trie.insert(&["org", "a"]), Insertion::Accepted);
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn test_tld_covers_everything_below() {
        let mut trie = LabelTrie::new();
        trie.insert(&["cn"]);
        assert_eq!(
            trie.insert(&["cn", "gov", "www"]),
            Insertion::Covered { depth: 1 }
        );
    }

    #[test]
    fn test_covers() {
        let mut trie = LabelTrie::new();
        trie.insert(&["com", "example"]);

        assert!(trie.covers(&["com", "example"]));
        assert!(trie.covers(&["com", "example", "api"]));
        assert!(!trie.covers(&["com"]));
        assert!(!trie.covers(&["com", "other"]));
        assert!(!trie.covers(&["org", "example"]));
    }

    #[test]
    fn test_longer_first_leaves_parent_unmarked() {
        // Out-of-order insertion accepts both; `dedupe` sorts to prevent this.
        let mut trie = LabelTrie::new();
        assert_eq!(trie.insert(&["com", "a", "b"]), Insertion::Accepted);
        assert_eq!(trie.insert(&["com", "a"]), Insertion::Accepted);
    }
}
