//! Parse-tree nodes and semantic actions.

use crate::lexer::FileLoc;

use super::grammar::ProductionId;

/// An owned parse tree: every node owns its children, the caller owns the
/// root. Terminals become leaves carrying their matched text and location.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseTree {
    Leaf {
        text: String,
        location: FileLoc,
    },
    Node {
        production: ProductionId,
        children: Vec<ParseTree>,
    },
}

impl ParseTree {
    pub fn children(&self) -> &[ParseTree] {
        match self {
            ParseTree::Leaf { .. } => &[],
            ParseTree::Node { children, .. } => children,
        }
    }

    pub fn production(&self) -> Option<ProductionId> {
        match self {
            ParseTree::Leaf { .. } => None,
            ParseTree::Node { production, .. } => Some(*production),
        }
    }
}

/// Per-production reduction hook: receives the finished child nodes in
/// left-to-right order and returns the node standing for the production.
/// Productions without a registered action get a plain [`ParseTree::Node`].
pub type SemanticAction = Box<dyn Fn(Vec<ParseTree>) -> ParseTree>;
