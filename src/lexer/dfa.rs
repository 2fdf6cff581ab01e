//! Deterministic finite automata compiled directly from regex trees.
//!
//! The construction is the direct one: `nullable`, `firstpos` and `lastpos`
//! are derived bottom-up over the tree, `followpos` falls out of the `Cat`
//! and `Star` cases, and the subset construction runs over followpos sets
//! without ever materialising an NFA.

use std::collections::{BTreeSet, HashMap};

use crate::error::Result;

use super::charclass;
use super::regex::{self, RegexNode};

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct State(pub u32);

/// Immutable transition table. Build once, then share freely; stepping
/// state lives in [`DfaCursor`]. A missing edge is the implicit error
/// state.
#[derive(Debug)]
pub struct Dfa {
    start: State,
    accepting: Vec<bool>,
    transitions: HashMap<(State, u8), State>,
}

struct Attrs {
    nullable: bool,
    first: BTreeSet<u32>,
    last: BTreeSet<u32>,
}

/// One pass: attributes bottom-up, followpos filled at every `Cat`/`Star`.
fn analyze(node: &RegexNode, follow: &mut [BTreeSet<u32>]) -> Attrs {
    match node {
        RegexNode::Leaf { pos, .. } => Attrs {
            nullable: false,
            first: BTreeSet::from([*pos]),
            last: BTreeSet::from([*pos]),
        },
        RegexNode::Or(left, right) => {
            let l = analyze(left, follow);
            let r = analyze(right, follow);
            Attrs {
                nullable: l.nullable || r.nullable,
                first: l.first.union(&r.first).copied().collect(),
                last: l.last.union(&r.last).copied().collect(),
            }
        }
        RegexNode::Cat(left, right) => {
            let l = analyze(left, follow);
            let r = analyze(right, follow);
            for &p in &l.last {
                follow[p as usize - 1].extend(r.first.iter().copied());
            }
            Attrs {
                nullable: l.nullable && r.nullable,
                first: if l.nullable {
                    l.first.union(&r.first).copied().collect()
                } else {
                    l.first
                },
                last: if r.nullable {
                    r.last.union(&l.last).copied().collect()
                } else {
                    r.last
                },
            }
        }
        RegexNode::Star(child) => {
            let c = analyze(child, follow);
            for &p in &c.last {
                follow[p as usize - 1].extend(c.first.iter().copied());
            }
            Attrs {
                nullable: true,
                first: c.first,
                last: c.last,
            }
        }
    }
}

impl Dfa {
    /// Compile a pattern. The alphabet is enumerated in ascending byte
    /// order and states are numbered in the order first seen, so two
    /// compilations of the same pattern produce identical tables.
    pub fn compile(pattern: &str) -> Result<Dfa> {
        let parsed = regex::parse(pattern)?;
        let mut follow = vec![BTreeSet::new(); parsed.positions.len()];
        let attrs = analyze(&parsed.root, &mut follow);

        let alphabet = charclass::alphabet();

        let seed: Vec<u32> = attrs.first.iter().copied().collect();
        let mut ids: HashMap<Vec<u32>, State> = HashMap::new();
        let mut sets: Vec<Vec<u32>> = Vec::new();
        ids.insert(seed.clone(), State(0));
        sets.push(seed);

        let mut transitions = HashMap::new();
        let mut visited = 0;
        while visited < sets.len() {
            let current = sets[visited].clone();
            for &byte in &alphabet {
                let mut union = BTreeSet::new();
                for &p in &current {
                    if parsed.positions[p as usize - 1].contains(&byte) {
                        union.extend(follow[p as usize - 1].iter().copied());
                    }
                }
                if union.is_empty() {
                    continue;
                }
                let key: Vec<u32> = union.into_iter().collect();
                let next = match ids.get(&key) {
                    Some(&state) => state,
                    None => {
                        let state = State(sets.len() as u32);
                        ids.insert(key.clone(), state);
                        sets.push(key);
                        state
                    }
                };
                transitions.insert((State(visited as u32), byte), next);
            }
            visited += 1;
        }

        let accepting = sets
            .iter()
            .map(|set| set.binary_search(&parsed.sentinel).is_ok())
            .collect::<Vec<_>>();

        log::debug!(
            "compiled /{pattern}/: {} states, {} transitions",
            sets.len(),
            transitions.len()
        );

        Ok(Dfa {
            start: State(0),
            accepting,
            transitions,
        })
    }

    pub fn cursor(&self) -> DfaCursor<'_> {
        DfaCursor {
            dfa: self,
            state: Some(self.start),
        }
    }

    /// Reset, step through `input`, report acceptance.
    pub fn run(&self, input: &str) -> bool {
        let mut cursor = self.cursor();
        for byte in input.bytes() {
            cursor.step(byte);
        }
        cursor.accepting()
    }

    pub fn state_count(&self) -> usize {
        self.accepting.len()
    }
}

/// Stepwise execution over a shared [`Dfa`]. Once an input byte has no
/// edge the cursor stays in the error state until [`DfaCursor::reset`].
pub struct DfaCursor<'a> {
    dfa: &'a Dfa,
    state: Option<State>,
}

impl<'a> DfaCursor<'a> {
    pub fn reset(&mut self) {
        self.state = Some(self.dfa.start);
    }

    pub fn step(&mut self, byte: u8) -> Option<State> {
        self.state = self
            .state
            .and_then(|s| self.dfa.transitions.get(&(s, byte)).copied());
        self.state
    }

    pub fn accepting(&self) -> bool {
        self.state
            .is_some_and(|s| self.dfa.accepting[s.0 as usize])
    }

    pub fn errored(&self) -> bool {
        self.state.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_language(pattern: &str, accepts: &[&str], rejects: &[&str]) {
        let dfa = Dfa::compile(pattern).unwrap();
        for input in accepts {
            assert!(dfa.run(input), "/{pattern}/ should accept {input:?}");
        }
        for input in rejects {
            assert!(!dfa.run(input), "/{pattern}/ should reject {input:?}");
        }
    }

    #[test]
    fn alternation_under_star() {
        assert_language(
            "(a|b)*abb",
            &["abb", "aabb", "babb", "ababb"],
            &["abba", "bbba", ""],
        );
    }

    #[test]
    fn integers_without_leading_zeros() {
        assert_language(
            "(0|[1-9][0-9]*)",
            &["0", "10", "900200"],
            &["", "00", "01", "00123"],
        );
    }

    #[test]
    fn keyword_case_alternatives() {
        assert_language(
            "(class|Class)",
            &["class", "Class"],
            &["class1", "CLASS", "clASs"],
        );
    }

    #[test]
    fn identifiers_and_type_names() {
        assert_language(
            "[a-z]([A-Za-z_]*)",
            &["a", "aA", "aAF", "aA_", "a_AF_"],
            &["A", "Aa", "ABC", "ABC__", ""],
        );
        assert_language(
            "[A-Z]([A-Za-z_]*)",
            &["A", "Aa", "ABC", "A_B_C_"],
            &["a", "aA", ""],
        );
    }

    #[test]
    fn fixed_words() {
        assert_language("SELF_TYPE", &["SELF_TYPE"], &["ELF_TYPE", "SELF_TYP", ""]);
    }

    #[test]
    fn quoted_strings() {
        assert_language(
            "\"(((\\\\.)|([^\\\\\"])|([W-S]))*)\"",
            &[
                "\"\"",
                "\"a\"",
                "\"abc. abc\"",
                "\"abc\\nabc\"",
                "\"Hello\\\", World.\\n\"",
                "\" inherits Closure {\n\"",
            ],
            &["", "\"hello", "\"abc\x08abc\""],
        );
    }

    #[test]
    fn line_comments() {
        assert_language(
            "--(([^E-LE-F])*)([E-L]|[E-F])",
            &["-- hello \n", "--hello\n", "-- List.\n"],
            &["-- hello", "hello\n", "-hello\n"],
        );
    }

    #[test]
    fn block_comment_delimiters() {
        assert_language("\\(\\*", &["(*"], &[" (*", "( *", "(* "]);
        assert_language("\\*\\)", &["*)"], &[" *)", "* )", "*) "]);
    }

    #[test]
    fn cursor_latches_the_error_state() {
        let dfa = Dfa::compile("ab").unwrap();
        let mut cursor = dfa.cursor();
        assert!(!cursor.errored());
        cursor.step(b'x');
        assert!(cursor.errored());
        // Stays errored even on a byte that would otherwise make progress.
        cursor.step(b'a');
        assert!(cursor.errored());
        assert!(!cursor.accepting());

        cursor.reset();
        cursor.step(b'a');
        cursor.step(b'b');
        assert!(cursor.accepting());
        assert!(!cursor.errored());
    }

    #[test]
    fn construction_is_deterministic() {
        let a = Dfa::compile("(a|b)*abb").unwrap();
        let b = Dfa::compile("(a|b)*abb").unwrap();
        assert_eq!(a.state_count(), b.state_count());
        assert_eq!(a.transitions, b.transitions);
        assert_eq!(a.accepting, b.accepting);
    }

    #[test]
    fn bytes_outside_every_leaf_are_errors() {
        let dfa = Dfa::compile("a").unwrap();
        assert!(!dfa.run("b"));
        assert!(!dfa.run("aa"));
        assert!(dfa.run("a"));
    }
}
