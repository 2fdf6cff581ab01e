//! The predictive parser: a stack machine over the LL(1) tables.

use crate::lexer::Lexeme;

use super::grammar::{Grammar, ProductionId, Sym};
use super::table::ParseTables;
use super::tree::{ParseTree, SemanticAction};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParserState {
    Processing,
    Finished,
    Error,
}

/// Recorded when the driver moves to [`ParserState::Error`]: the failing
/// lexeme and what the stack expected there.
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub lexeme: Lexeme,
}

enum StackEntry {
    /// Sits above an expanded entry; reaching it means every symbol of the
    /// expansion has been matched and the production can be reduced.
    Marker,
    Entry {
        sym: Sym,
        /// Filled in when a non-terminal entry is expanded.
        production: Option<ProductionId>,
    },
}

/// Drives one parse. Feed lexemes through [`Driver::process`]; each call
/// consumes exactly one lexeme or latches the error state. End of input is
/// signalled with the synthetic `$` lexeme, after which the driver reaches
/// [`ParserState::Finished`] and the tree can be taken.
pub struct Driver<'g> {
    grammar: &'g Grammar,
    tables: &'g ParseTables,
    actions: Vec<Option<SemanticAction>>,
    state: ParserState,
    stack: Vec<StackEntry>,
    store: Vec<ParseTree>,
    error: Option<ParseError>,
}

impl<'g> Driver<'g> {
    pub fn new(grammar: &'g Grammar, tables: &'g ParseTables) -> Driver<'g> {
        Driver {
            grammar,
            tables,
            actions: (0..grammar.productions().len()).map(|_| None).collect(),
            state: ParserState::Processing,
            stack: vec![StackEntry::Entry {
                sym: Sym::NonTerminal(grammar.start()),
                production: None,
            }],
            store: Vec::new(),
            error: None,
        }
    }

    /// Register a reduction hook for one production.
    pub fn set_action(&mut self, production: ProductionId, action: SemanticAction) {
        self.actions[production] = Some(action);
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Consume one lexeme. Pending reductions are drained both before the
    /// lexeme is matched and after, so consuming `$` settles the stack and
    /// finishes the parse in the same call.
    pub fn process(&mut self, lexeme: &Lexeme) -> ParserState {
        if self.state != ParserState::Processing {
            return self.state;
        }

        let mut consumed = false;
        loop {
            // Copy the top out so the stack can be reshaped in the arms.
            let top = match self.stack.last() {
                None => {
                    self.state = ParserState::Finished;
                    break;
                }
                Some(StackEntry::Marker) => None,
                Some(StackEntry::Entry { sym, .. }) => Some(*sym),
            };

            match top {
                None => self.reduce(),
                Some(sym) => {
                    if consumed {
                        break;
                    }
                    match sym {
                        Sym::Terminal(t) => {
                            // Matching is by token name, not lexeme text.
                            if self.grammar.terminal_name(t) == lexeme.token {
                                self.stack.pop();
                                self.store.push(ParseTree::Leaf {
                                    text: lexeme.text.clone(),
                                    location: lexeme.location.clone(),
                                });
                                consumed = true;
                            } else {
                                self.fail(
                                    format!(
                                        "expected '{}', found '{}'",
                                        self.grammar.terminal_name(t),
                                        lexeme.token
                                    ),
                                    lexeme,
                                );
                                break;
                            }
                        }
                        Sym::NonTerminal(nt) => {
                            let Some(t) = self.grammar.terminal_id(&lexeme.token) else {
                                self.fail(
                                    format!("'{}' is not a terminal of the grammar", lexeme.token),
                                    lexeme,
                                );
                                break;
                            };
                            let cell = self.tables.cell(nt, t);
                            if cell.len() == 1 {
                                self.expand(cell[0]);
                            } else {
                                self.fail(
                                    format!(
                                        "no production of '{}' starts with '{}'",
                                        self.grammar.non_terminal_name(nt),
                                        lexeme.token
                                    ),
                                    lexeme,
                                );
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.state
    }

    /// Take the finished parse tree.
    pub fn into_tree(mut self) -> Option<ParseTree> {
        if self.state == ParserState::Finished && self.store.len() == 1 {
            self.store.pop()
        } else {
            None
        }
    }

    /// Replace the top entry's pending production id, then push the marker
    /// and the right side in reverse so the leftmost symbol ends on top.
    /// An ε right side leaves the marker directly above the entry, so the
    /// next loop turn reduces immediately.
    fn expand(&mut self, production: ProductionId) {
        if let Some(StackEntry::Entry {
            production: slot, ..
        }) = self.stack.last_mut()
        {
            *slot = Some(production);
        }
        self.stack.push(StackEntry::Marker);
        for &sym in self.grammar.production(production).rhs.iter().rev() {
            self.stack.push(StackEntry::Entry {
                sym,
                production: None,
            });
        }
    }

    /// Pop the marker and the expanded entry beneath it, feed the last
    /// `|rhs|` nodes (oldest first) to the production's semantic action,
    /// and push the resulting node back for the enclosing reduction.
    fn reduce(&mut self) {
        self.stack.pop();
        let Some(StackEntry::Entry {
            production: Some(production),
            ..
        }) = self.stack.pop()
        else {
            // A marker always sits above its expanded entry.
            self.state = ParserState::Error;
            return;
        };

        let arity = self.grammar.production(production).rhs.len();
        let children = self.store.split_off(self.store.len().saturating_sub(arity));
        let node = match &self.actions[production] {
            Some(action) => action(children),
            None => ParseTree::Node {
                production,
                children,
            },
        };
        self.store.push(node);
    }

    fn fail(&mut self, message: String, lexeme: &Lexeme) {
        log::debug!(
            "parse error at {}:{}: {message}",
            lexeme.location.line,
            lexeme.location.column
        );
        self.state = ParserState::Error;
        self.error = Some(ParseError {
            message,
            lexeme: lexeme.clone(),
        });
    }
}
