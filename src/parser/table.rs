//! The LL(1) predictive parsing table and its persisted form.

use serde::Serialize;

use crate::error::{Error, Result};

use super::grammar::{Grammar, ProductionId, Sym};
use super::sets::{Firsts, Follows};

/// Two-dimensional table indexed by `(non-terminal id, terminal id)`;
/// each cell lists the production ids that apply, in registration order.
/// A valid LL(1) table has at most one id per cell.
#[derive(Debug)]
pub struct ParseTables {
    table: Vec<Vec<Vec<ProductionId>>>,
}

impl ParseTables {
    pub fn build(grammar: &Grammar, firsts: &Firsts, follows: &Follows) -> Result<ParseTables> {
        let mut table =
            vec![vec![Vec::new(); grammar.terminals().len()]; grammar.non_terminals().len()];

        for (id, production) in grammar.productions().iter().enumerate() {
            let (first, nullable) = firsts.of_sequence(&production.rhs);
            let nt = production.lhs as usize;

            for &t in &first {
                table[nt][t as usize].push(id);
            }
            if nullable {
                for &t in follows.of(production.lhs) {
                    table[nt][t as usize].push(id);
                }
            }
        }

        for (nt, row) in table.iter().enumerate() {
            for (t, cell) in row.iter().enumerate() {
                if cell.len() > 1 {
                    return Err(Error::GrammarAmbiguous {
                        non_terminal: grammar.non_terminal_name(nt as u32).to_string(),
                        terminal: grammar.terminal_name(t as u32).to_string(),
                        productions: cell.clone(),
                    });
                }
            }
        }

        Ok(ParseTables { table })
    }

    pub fn cell(&self, nt: u32, t: u32) -> &[ProductionId] {
        &self.table[nt as usize][t as usize]
    }

    /// Language-neutral dump for external code generators. Deterministic:
    /// every collection is a vector in declaration or registration order.
    pub fn dump_json(&self, grammar: &Grammar) -> serde_json::Result<String> {
        let productions = grammar
            .productions()
            .iter()
            .enumerate()
            .map(|(id, production)| ProductionDump {
                id,
                lhs: grammar.non_terminal_name(production.lhs),
                rhs: production
                    .rhs
                    .iter()
                    .map(|&sym| SymbolDump {
                        kind: match sym {
                            Sym::Terminal(_) => "terminal",
                            Sym::NonTerminal(_) => "non-terminal",
                        },
                        name: grammar.symbol_name(sym),
                    })
                    .collect(),
                action: grammar.action(id),
            })
            .collect();

        serde_json::to_string_pretty(&TablesDump {
            terminals: grammar.terminals(),
            non_terminals: grammar.non_terminals(),
            start: grammar.non_terminal_name(grammar.start()),
            includes: grammar.includes(),
            productions,
            table: &self.table,
        })
    }

    pub fn dump(&self, grammar: &Grammar) {
        for (nt, row) in self.table.iter().enumerate() {
            for (t, cell) in row.iter().enumerate() {
                if let Some(&id) = cell.first() {
                    log::debug!(
                        "table[{}][{}] = {}",
                        grammar.non_terminal_name(nt as u32),
                        grammar.terminal_name(t as u32),
                        grammar.production_display(id)
                    );
                }
            }
        }
    }
}

#[derive(Serialize)]
struct TablesDump<'a> {
    terminals: &'a [String],
    non_terminals: &'a [String],
    start: &'a str,
    includes: &'a [String],
    productions: Vec<ProductionDump<'a>>,
    table: &'a Vec<Vec<Vec<ProductionId>>>,
}

#[derive(Serialize)]
struct ProductionDump<'a> {
    id: ProductionId,
    lhs: &'a str,
    rhs: Vec<SymbolDump<'a>>,
    action: &'a str,
}

#[derive(Serialize)]
struct SymbolDump<'a> {
    kind: &'a str,
    name: &'a str,
}


#[cfg(test)]
mod tests {
    use super::test_support::{arith, arith_tables};
    use super::*;
    use crate::parser::grammar::test_support::grammar;

    fn cell_ids(tables: &ParseTables, g: &Grammar, nt: &str, t: &str) -> Vec<ProductionId> {
        tables
            .cell(
                g.non_terminal_id(nt).unwrap(),
                g.terminal_id(t).unwrap(),
            )
            .to_vec()
    }

    #[test]
    fn arithmetic_grammar_cells() {
        let g = arith();
        let tables = arith_tables(&g);

        // E' on ')' and '$' chooses the ε production (id 3).
        assert_eq!(cell_ids(&tables, &g, "E_DASH", ")"), vec![3]);
        assert_eq!(cell_ids(&tables, &g, "E_DASH", "$"), vec![3]);
        // E' on '+' expands the recursion.
        assert_eq!(cell_ids(&tables, &g, "E_DASH", "+"), vec![2]);
        // F on '(' is the parenthesised production, on 'id' the leaf.
        assert_eq!(cell_ids(&tables, &g, "F", "("), vec![7]);
        assert_eq!(cell_ids(&tables, &g, "F", "id"), vec![8]);
        // T on 'id' and '(' goes through F T'.
        assert_eq!(cell_ids(&tables, &g, "T", "id"), vec![4]);
        assert_eq!(cell_ids(&tables, &g, "T", "("), vec![4]);
        // S and E start on the same lookaheads.
        assert_eq!(cell_ids(&tables, &g, "S", "id"), vec![0]);
        assert_eq!(cell_ids(&tables, &g, "S", "("), vec![0]);
        assert_eq!(cell_ids(&tables, &g, "E", "id"), vec![1]);

        // Cells with no applicable production stay empty.
        assert!(cell_ids(&tables, &g, "E", "+").is_empty());
        assert!(cell_ids(&tables, &g, "S", "*").is_empty());
        assert!(cell_ids(&tables, &g, "T_DASH", "id").is_empty());
    }

    #[test]
    fn every_first_entry_points_at_its_production() {
        let g = arith();
        let firsts = Firsts::compute(&g);
        let follows = Follows::compute(&g, &firsts);
        let tables = ParseTables::build(&g, &firsts, &follows).unwrap();

        for (id, production) in g.productions().iter().enumerate() {
            let (first, _) = firsts.of_sequence(&production.rhs);
            for t in first {
                assert!(
                    tables.cell(production.lhs, t).contains(&id),
                    "table[{}][{}] should contain production {id}",
                    g.non_terminal_name(production.lhs),
                    g.terminal_name(t),
                );
            }
        }
    }

    #[test]
    fn ambiguous_grammars_are_rejected() {
        // Two productions of A both start with 'a'.
        let g = grammar(
            &["a"],
            &["S", "A"],
            &[
                ("S", &["A"] as &[&str]),
                ("A", &["a"]),
                ("A", &["a", "a"]),
            ],
        )
        .unwrap();
        let firsts = Firsts::compute(&g);
        let follows = Follows::compute(&g, &firsts);
        match ParseTables::build(&g, &firsts, &follows) {
            Err(Error::GrammarAmbiguous {
                non_terminal,
                terminal,
                productions,
            }) => {
                assert_eq!(non_terminal, "A");
                assert_eq!(terminal, "a");
                assert_eq!(productions, vec![1, 2]);
            }
            other => panic!("expected an ambiguity error, got {other:?}"),
        }
    }

    #[test]
    fn dump_is_deterministic() {
        let g = arith();
        let a = arith_tables(&g).dump_json(&g).unwrap();
        let b = arith_tables(&g).dump_json(&g).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"start\": \"S\""));
        assert!(a.contains("\"E_DASH\""));
    }
}
