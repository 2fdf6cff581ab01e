//! The grammar model: declaration-ordered symbol tables, productions with
//! stable ids, and the well-formedness rules.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::loader::grammar_def::GrammarDecl;

/// Spelling of the ε marker in grammar text. It never becomes a terminal;
/// a production whose right side is `%empty` compiles to an empty rhs.
pub const EMPTY_TERMINAL: &str = "%empty";
/// Spelling of the end-of-input terminal appended to the terminal table and
/// to the start production.
pub const END_TERMINAL: &str = "$";

/// A grammar symbol, interned: ids index the terminal and non-terminal
/// tables of the owning [`Grammar`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sym {
    Terminal(u32),
    NonTerminal(u32),
}

pub type ProductionId = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Production {
    pub lhs: u32,
    /// Empty rhs denotes ε.
    pub rhs: Vec<Sym>,
}

pub struct Grammar {
    terminals: Vec<String>,
    non_terminals: Vec<String>,
    productions: Vec<Production>,
    actions: Vec<String>,
    includes: Vec<String>,
    start: u32,
    terminal_ids: HashMap<String, u32>,
    non_terminal_ids: HashMap<String, u32>,
    productions_of: Vec<Vec<ProductionId>>,
    end_terminal: u32,
}

impl Grammar {
    /// Compile a declaration: intern the symbol tables, resolve every
    /// production, then append `$` to the terminal table and to the single
    /// start production.
    pub fn build(decl: GrammarDecl) -> Result<Grammar> {
        let mut terminals = Vec::new();
        let mut terminal_ids = HashMap::new();
        for name in &decl.terminals {
            if name == EMPTY_TERMINAL {
                // The ε marker is reserved; older grammar files list it
                // among the terminals, which is harmless.
                continue;
            }
            if name == END_TERMINAL {
                return Err(Error::GrammarMalformed(format!(
                    "'{END_TERMINAL}' is reserved for end of input"
                )));
            }
            if terminal_ids
                .insert(name.clone(), terminals.len() as u32)
                .is_some()
            {
                return Err(Error::GrammarMalformed(format!(
                    "duplicate terminal '{name}'"
                )));
            }
            terminals.push(name.clone());
        }

        let mut non_terminals = Vec::new();
        let mut non_terminal_ids = HashMap::new();
        for name in &decl.non_terminals {
            if terminal_ids.contains_key(name) {
                return Err(Error::GrammarMalformed(format!(
                    "'{name}' is already registered as a terminal"
                )));
            }
            if non_terminal_ids
                .insert(name.clone(), non_terminals.len() as u32)
                .is_some()
            {
                return Err(Error::GrammarMalformed(format!(
                    "duplicate non-terminal '{name}'"
                )));
            }
            non_terminals.push(name.clone());
        }

        if non_terminals.is_empty() {
            return Err(Error::GrammarMalformed(
                "no non-terminals declared".to_string(),
            ));
        }
        // The first declared non-terminal is the start symbol.
        let start = 0u32;

        if decl.productions.len() != decl.actions.len() {
            return Err(Error::GrammarMalformed(format!(
                "found {} productions but {} semantic rules",
                decl.productions.len(),
                decl.actions.len()
            )));
        }

        let mut productions = Vec::new();
        for raw in &decl.productions {
            let Some(&lhs) = non_terminal_ids.get(&raw.lhs) else {
                return Err(Error::GrammarMalformed(if terminal_ids.contains_key(&raw.lhs) {
                    format!("'{}' : left side of a production is not a non-terminal", raw.lhs)
                } else {
                    format!("'{}' : unknown symbol on the left of a production", raw.lhs)
                }));
            };

            let mut rhs = Vec::with_capacity(raw.rhs.len());
            for name in &raw.rhs {
                if name == EMPTY_TERMINAL {
                    if raw.rhs.len() != 1 {
                        return Err(Error::GrammarMalformed(format!(
                            "production '{} : {}' mixes {EMPTY_TERMINAL} with other symbols",
                            raw.lhs,
                            raw.rhs.join(" ")
                        )));
                    }
                    // Sole %empty: the rhs stays empty.
                    continue;
                }
                if let Some(&t) = terminal_ids.get(name) {
                    rhs.push(Sym::Terminal(t));
                } else if let Some(&nt) = non_terminal_ids.get(name) {
                    rhs.push(Sym::NonTerminal(nt));
                } else {
                    return Err(Error::GrammarMalformed(format!(
                        "in '{} : {}' | '{name}' is neither a terminal nor a non-terminal",
                        raw.lhs,
                        raw.rhs.join(" ")
                    )));
                }
            }
            productions.push(Production { lhs, rhs });
        }

        let start_productions = productions
            .iter()
            .filter(|p| p.lhs == start)
            .count();
        if start_productions != 1 {
            return Err(Error::GrammarMalformed(format!(
                "start symbol must have exactly one production, found {start_productions}"
            )));
        }

        // Append end-of-input to the terminal table and to the start
        // production's right side.
        let end_terminal = terminals.len() as u32;
        terminal_ids.insert(END_TERMINAL.to_string(), end_terminal);
        terminals.push(END_TERMINAL.to_string());
        for production in &mut productions {
            if production.lhs == start {
                production.rhs.push(Sym::Terminal(end_terminal));
                break;
            }
        }

        let mut productions_of = vec![Vec::new(); non_terminals.len()];
        for (id, production) in productions.iter().enumerate() {
            productions_of[production.lhs as usize].push(id);
        }

        Ok(Grammar {
            terminals,
            non_terminals,
            productions,
            actions: decl.actions,
            includes: decl.includes,
            start,
            terminal_ids,
            non_terminal_ids,
            productions_of,
            end_terminal,
        })
    }

    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &[String] {
        &self.non_terminals
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id]
    }

    pub fn productions_of(&self, nt: u32) -> &[ProductionId] {
        &self.productions_of[nt as usize]
    }

    pub fn action(&self, id: ProductionId) -> &str {
        &self.actions[id]
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end_terminal(&self) -> u32 {
        self.end_terminal
    }

    pub fn terminal_id(&self, name: &str) -> Option<u32> {
        self.terminal_ids.get(name).copied()
    }

    pub fn non_terminal_id(&self, name: &str) -> Option<u32> {
        self.non_terminal_ids.get(name).copied()
    }

    pub fn terminal_name(&self, id: u32) -> &str {
        &self.terminals[id as usize]
    }

    pub fn non_terminal_name(&self, id: u32) -> &str {
        &self.non_terminals[id as usize]
    }

    pub fn symbol_name(&self, sym: Sym) -> &str {
        match sym {
            Sym::Terminal(t) => self.terminal_name(t),
            Sym::NonTerminal(nt) => self.non_terminal_name(nt),
        }
    }

    pub fn production_display(&self, id: ProductionId) -> String {
        let production = &self.productions[id];
        let mut out = format!("{} ->", self.non_terminal_name(production.lhs));
        if production.rhs.is_empty() {
            out.push_str(" %empty");
        }
        for sym in &production.rhs {
            out.push(' ');
            out.push_str(self.symbol_name(*sym));
        }
        out
    }

    pub fn dump(&self) {
        log::debug!("terminals: {:?}", self.terminals);
        log::debug!("non-terminals: {:?}", self.non_terminals);
        for id in 0..self.productions.len() {
            log::debug!("production {id}: {}", self.production_display(id));
        }
        log::debug!("start symbol: {}", self.non_terminal_name(self.start));
    }
}
