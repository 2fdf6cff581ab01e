//! FIRST and FOLLOW set engines over a compiled grammar.

use std::collections::BTreeSet;

use super::grammar::{Grammar, Sym};

/// FIRST sets, split into the terminal sets proper and a nullability flag
/// per non-terminal: `EMPTY ∈ FIRST(N)` exactly when `nullable(N)`. For a
/// terminal `t`, `FIRST(t) = {t}` and it is never nullable.
pub struct Firsts {
    nt_first: Vec<BTreeSet<u32>>,
    nt_nullable: Vec<bool>,
}

impl Firsts {
    /// Memoized structural recursion. Each non-terminal is marked before
    /// its productions are descended, so the recursion is bounded even on
    /// grammars outside the supported (non-left-recursive) class.
    pub fn compute(grammar: &Grammar) -> Firsts {
        let n = grammar.non_terminals().len();
        let mut firsts = Firsts {
            nt_first: vec![BTreeSet::new(); n],
            nt_nullable: vec![false; n],
        };
        let mut done = vec![false; n];
        for nt in 0..n as u32 {
            firsts.first_nt(grammar, nt, &mut done);
        }
        firsts
    }

    fn first_nt(&mut self, grammar: &Grammar, nt: u32, done: &mut [bool]) -> bool {
        if done[nt as usize] {
            return self.nt_nullable[nt as usize];
        }
        done[nt as usize] = true;

        let mut nullable = false;
        for &id in grammar.productions_of(nt) {
            // The whole rhs is nullable until a non-nullable symbol stops
            // the walk; the empty rhs is nullable outright.
            let mut all_nullable = true;
            for &sym in &grammar.production(id).rhs {
                match sym {
                    Sym::Terminal(t) => {
                        self.nt_first[nt as usize].insert(t);
                        all_nullable = false;
                    }
                    Sym::NonTerminal(m) => {
                        let m_nullable = self.first_nt(grammar, m, done);
                        let m_first = self.nt_first[m as usize].clone();
                        self.nt_first[nt as usize].extend(m_first);
                        all_nullable = m_nullable;
                    }
                }
                if !all_nullable {
                    break;
                }
            }
            nullable |= all_nullable;
        }

        self.nt_nullable[nt as usize] = nullable;
        nullable
    }

    pub fn nullable(&self, nt: u32) -> bool {
        self.nt_nullable[nt as usize]
    }

    pub fn nullable_symbol(&self, sym: Sym) -> bool {
        match sym {
            Sym::Terminal(_) => false,
            Sym::NonTerminal(nt) => self.nullable(nt),
        }
    }

    pub fn of_symbol(&self, sym: Sym) -> BTreeSet<u32> {
        match sym {
            Sym::Terminal(t) => BTreeSet::from([t]),
            Sym::NonTerminal(nt) => self.nt_first[nt as usize].clone(),
        }
    }

    /// FIRST of a symbol sequence by the longest-nullable-prefix rule,
    /// with EMPTY reported as the nullability flag.
    pub fn of_sequence(&self, rhs: &[Sym]) -> (BTreeSet<u32>, bool) {
        let mut first = BTreeSet::new();
        for &sym in rhs {
            first.extend(self.of_symbol(sym));
            if !self.nullable_symbol(sym) {
                return (first, false);
            }
        }
        (first, true)
    }

    /// FIRST of a non-terminal by name, `%empty` included when nullable.
    /// Intended for inspection and tests.
    pub fn names(&self, grammar: &Grammar, nt_name: &str) -> BTreeSet<String> {
        let Some(nt) = grammar.non_terminal_id(nt_name) else {
            return BTreeSet::new();
        };
        let mut names: BTreeSet<String> = self.nt_first[nt as usize]
            .iter()
            .map(|&t| grammar.terminal_name(t).to_string())
            .collect();
        if self.nullable(nt) {
            names.insert(super::grammar::EMPTY_TERMINAL.to_string());
        }
        names
    }
}

/// FOLLOW sets per non-terminal. Never contains EMPTY; `$` enters through
/// the start production's appended end-of-input terminal.
pub struct Follows {
    nt_follow: Vec<BTreeSet<u32>>,
}

impl Follows {
    /// Fixed point: run passes until no set grows.
    pub fn compute(grammar: &Grammar, firsts: &Firsts) -> Follows {
        let mut follows = Follows {
            nt_follow: vec![BTreeSet::new(); grammar.non_terminals().len()],
        };
        let mut total = usize::MAX;
        loop {
            follows.pass(grammar, firsts);
            let grown: usize = follows.nt_follow.iter().map(BTreeSet::len).sum();
            if grown == total {
                break;
            }
            log::debug!("follow sets grew to {grown} items");
            total = grown;
        }
        follows
    }

    fn pass(&mut self, grammar: &Grammar, firsts: &Firsts) {
        for production in grammar.productions() {
            for (i, &sym) in production.rhs.iter().enumerate() {
                let Sym::NonTerminal(x) = sym else {
                    continue;
                };

                // FIRST of the tail after x, up to its first non-nullable
                // symbol.
                let mut j = i + 1;
                while let Some(&next) = production.rhs.get(j) {
                    let first = firsts.of_symbol(next);
                    self.nt_follow[x as usize].extend(first);
                    if !firsts.nullable_symbol(next) {
                        break;
                    }
                    j += 1;
                }

                // The tail was nullable all the way: whatever follows the
                // left side follows x as well, except through the
                // self-recursive case.
                if j == production.rhs.len() && production.lhs != x {
                    let from_lhs = self.nt_follow[production.lhs as usize].clone();
                    self.nt_follow[x as usize].extend(from_lhs);
                }
            }
        }
    }

    pub fn of(&self, nt: u32) -> &BTreeSet<u32> {
        &self.nt_follow[nt as usize]
    }

    /// FOLLOW of a non-terminal by name, for inspection and tests.
    pub fn names(&self, grammar: &Grammar, nt_name: &str) -> BTreeSet<String> {
        let Some(nt) = grammar.non_terminal_id(nt_name) else {
            return BTreeSet::new();
        };
        self.nt_follow[nt as usize]
            .iter()
            .map(|&t| grammar.terminal_name(t).to_string())
            .collect()
    }
}

pub fn dump(grammar: &Grammar, firsts: &Firsts, follows: &Follows) {
    for name in grammar.non_terminals() {
        log::debug!("first({name}) = {:?}", firsts.names(grammar, name));
    }
    for name in grammar.non_terminals() {
        log::debug!("follow({name}) = {:?}", follows.names(grammar, name));
    }
}
