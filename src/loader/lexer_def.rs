//! Lexer-definition files: `//` comments and three fixed sections.
//!
//! ```text
//! DEFINITION
//!   TOKEN_NAME : { regex }
//! KEYWORDS
//!   TOKEN_NAME
//! SYMBOLS
//!   TOKEN_NAME
//! ```
//!
//! Order inside `DEFINITION` is the precedence used to break scanner ties.
//! `KEYWORDS` and `SYMBOLS` are metadata for callers that want to tell
//! reserved words apart from identifier-shaped lexemes; they do not affect
//! scanning.

use std::collections::HashSet;

use crate::loader::{line_span, lines_with_offsets, log::Logs, COMMENT_START};

pub const DEFINITION_START: &str = "DEFINITION";
pub const KEYWORD_START: &str = "KEYWORDS";
pub const SYMBOL_START: &str = "SYMBOLS";
pub const TOKEN_REGEX_SEP: char = ':';

/// Parsed lexer definition: token regexes in declaration (= precedence)
/// order plus the keyword/symbol token-name sets.
#[derive(Debug, Default)]
pub struct LexerDef {
    pub tokens: Vec<(String, String)>,
    pub keywords: HashSet<String>,
    pub symbols: HashSet<String>,
}

enum Section {
    None,
    Definition,
    Keywords,
    Symbols,
}

/// Parse a definition file. Syntax problems are reported through `logs`;
/// `None` is returned when any of them was an error.
pub fn parse(src: &str, logs: &mut Logs<'_>) -> Option<LexerDef> {
    let mut def = LexerDef::default();
    let mut section = Section::None;

    for (offset, raw) in lines_with_offsets(src) {
        let line = raw.trim();
        let span = line_span(offset, raw);

        if line.is_empty() || line.starts_with(COMMENT_START) {
            continue;
        }
        if line.starts_with(DEFINITION_START) {
            section = Section::Definition;
            continue;
        }
        if line.starts_with(KEYWORD_START) {
            section = Section::Keywords;
            continue;
        }
        if line.starts_with(SYMBOL_START) {
            section = Section::Symbols;
            continue;
        }

        match section {
            // Lines before the first section header carry no meaning.
            Section::None => {}
            Section::Definition => {
                let Some(sep) = line.find(TOKEN_REGEX_SEP) else {
                    logs.emit_error(
                        format!("cannot find '{TOKEN_REGEX_SEP}' separator"),
                        span,
                    );
                    continue;
                };
                let name = line[..sep].trim();
                let body = line[sep + 1..].trim();
                if name.is_empty() || name.split_whitespace().count() != 1 {
                    logs.emit_error("token name must be a single word", span);
                    continue;
                }
                if body.len() < 2 || !body.starts_with('{') || !body.ends_with('}') {
                    logs.emit_error("regex body must be enclosed in braces", span);
                    continue;
                }
                // Not nesting-aware: everything between the outermost braces.
                let regex = &body[1..body.len() - 1];
                def.tokens.push((name.to_string(), regex.to_string()));
            }
            Section::Keywords => {
                def.keywords.insert(line.to_string());
            }
            Section::Symbols => {
                def.symbols.insert(line.to_string());
            }
        }
    }

    (!logs.contains_errors()).then_some(def)
}
