//! Grammar-definition files: `//` comments and four fixed sections.
//!
//! ```text
//! INCLUDES
//!   <lines copied verbatim into any generated code>
//! TERMINALS
//!   name
//! NONTERMINALS
//!   start_name
//! PRODUCTIONS
//!   lhs : r1 r2 ... rn
//!   { ... opaque semantic-action body ... }
//! ```
//!
//! The first non-terminal is the start symbol. Each production line is
//! followed by a brace-delimited semantic-action body whose opening and
//! closing lines begin with `{` and `}` at column 0; the body text is opaque
//! here and is carried through for external code generators.

use crate::loader::{line_span, lines_with_offsets, log::Logs, COMMENT_START};

pub const INCLUDES_START: &str = "INCLUDES";
pub const TERMINALS_START: &str = "TERMINALS";
pub const NON_TERMINALS_START: &str = "NONTERMINALS";
pub const PRODUCTIONS_START: &str = "PRODUCTIONS";
pub const PRODUCTION_LR_SEP: char = ':';
pub const SEMANTIC_RULE_START: &str = "{";
pub const SEMANTIC_RULE_END: &str = "}";

/// One `lhs : r1 r2 ...` line, still in textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProduction {
    pub lhs: String,
    pub rhs: Vec<String>,
}

/// Parsed grammar definition. Symbol resolution and the well-formedness
/// rules live in [`crate::parser::grammar::Grammar::build`].
#[derive(Debug, Default)]
pub struct GrammarDecl {
    pub includes: Vec<String>,
    pub terminals: Vec<String>,
    pub non_terminals: Vec<String>,
    pub productions: Vec<RawProduction>,
    pub actions: Vec<String>,
}

enum Section {
    None,
    Includes,
    Terminals,
    NonTerminals,
    Productions,
}

pub fn parse(src: &str, logs: &mut Logs<'_>) -> Option<GrammarDecl> {
    let mut decl = GrammarDecl::default();
    let mut section = Section::None;

    let lines: Vec<(usize, &str)> = lines_with_offsets(src).collect();
    let mut i = 0;
    while i < lines.len() {
        let (offset, raw) = lines[i];
        let line = raw.trim();
        let span = line_span(offset, raw);
        i += 1;

        if line.is_empty() || line.starts_with(COMMENT_START) {
            continue;
        }
        if line.starts_with(INCLUDES_START) {
            section = Section::Includes;
            continue;
        }
        if line.starts_with(TERMINALS_START) {
            section = Section::Terminals;
            continue;
        }
        if line.starts_with(NON_TERMINALS_START) {
            section = Section::NonTerminals;
            continue;
        }
        if line.starts_with(PRODUCTIONS_START) {
            section = Section::Productions;
            continue;
        }

        match section {
            Section::None => {}
            Section::Includes => decl.includes.push(raw.to_string()),
            Section::Terminals => {
                if line.split_whitespace().count() != 1 {
                    logs.emit_error(format!("'{line}' is not a terminal"), span);
                    continue;
                }
                decl.terminals.push(line.to_string());
            }
            Section::NonTerminals => {
                if line.split_whitespace().count() != 1 {
                    logs.emit_error(format!("'{line}' is not a non-terminal"), span);
                    continue;
                }
                decl.non_terminals.push(line.to_string());
            }
            Section::Productions => {
                let Some(sep) = line.find(PRODUCTION_LR_SEP) else {
                    logs.emit_error(
                        format!("cannot find '{PRODUCTION_LR_SEP}' separator in production"),
                        span,
                    );
                    continue;
                };
                let lhs = line[..sep].trim();
                if lhs.is_empty() || lhs.split_whitespace().count() != 1 {
                    logs.emit_error("left side of a production must be a single word", span);
                    continue;
                }
                let rhs: Vec<String> = line[sep + 1..]
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                decl.productions.push(RawProduction {
                    lhs: lhs.to_string(),
                    rhs,
                });

                // The brace-delimited semantic-action body follows the
                // production line; a missing body leaves the action count
                // short, which the grammar builder rejects.
                while i < lines.len() && lines[i].1.trim().is_empty() {
                    i += 1;
                }
                if i < lines.len() && lines[i].1.starts_with(SEMANTIC_RULE_START) {
                    let mut body = String::new();
                    while i < lines.len() {
                        let (_, body_line) = lines[i];
                        body.push_str(body_line);
                        body.push('\n');
                        i += 1;
                        if body_line.starts_with(SEMANTIC_RULE_END) {
                            break;
                        }
                    }
                    decl.actions.push(body);
                }
            }
        }
    }

    (!logs.contains_errors()).then_some(decl)
}
