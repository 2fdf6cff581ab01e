//! Compiler front-end construction toolkit for the COOL teaching language.
//!
//! Two textual definitions go in: a *lexer definition* (token names with
//! regular expressions) and a *grammar definition* (terminals,
//! non-terminals, productions with semantic-action bodies). Out come a
//! longest-match scanner backed by one DFA per token, and an LL(1)
//! predictive parser with reusable tables, which together turn a source
//! buffer into a token stream and a parse tree.
//!
//! The lexing side compiles each regex straight to a DFA through the
//! nullable/firstpos/lastpos/followpos attributes; no NFA is simulated.
//! The parsing side derives FIRST and FOLLOW sets, fills the predictive
//! table, and drives a stack machine that dispatches per-production
//! semantic actions.

pub mod error;
pub mod lexer;
pub mod linemap;
pub mod loader;
pub mod parser;

pub use error::Error;

#[cfg(test)]
mod tests {
    use crate::lexer::{end_of_input, Scanner};
    use crate::loader::log::Logs;
    use crate::loader::{grammar_def, lexer_def};
    use crate::parser::sets::{Firsts, Follows};
    use crate::parser::{Driver, Grammar, ParseTables, ParserState};

    const LEXER_DEF: &str = "\
DEFINITION
  WS : {[W-S][W-S]*}
  id : {[a-z]([a-z0-9_]*)}
  + : {\\+}
  * : {\\*}
  ( : {\\(}
  ) : {\\)}
SYMBOLS
  +
  *
  (
  )
";

    const GRAMMAR_DEF: &str = "\
TERMINALS
  +
  *
  (
  )
  id
NONTERMINALS
  S
  E
  E_DASH
  T
  T_DASH
  F
PRODUCTIONS
  S : E
{
}
  E : T E_DASH
{
}
  E_DASH : + T E_DASH
{
}
  E_DASH : %empty
{
}
  T : F T_DASH
{
}
  T_DASH : * F T_DASH
{
}
  T_DASH : %empty
{
}
  F : ( E )
{
}
  F : id
{
}
";

    #[test]
    fn scan_and_parse_an_expression() {
        let mut def_logs = Logs::new("arith.cclexdef", LEXER_DEF);
        let def = lexer_def::parse(LEXER_DEF, &mut def_logs).unwrap();
        let scanner = Scanner::from_def(&def).unwrap();

        let mut grammar_logs = Logs::new("arith.grammar", GRAMMAR_DEF);
        let decl = grammar_def::parse(GRAMMAR_DEF, &mut grammar_logs).unwrap();
        let grammar = Grammar::build(decl).unwrap();
        let firsts = Firsts::compute(&grammar);
        let follows = Follows::compute(&grammar, &firsts);
        let tables = ParseTables::build(&grammar, &firsts, &follows).unwrap();

        let buffer = "a+b*c";
        let run = scanner.scan("test.cl", buffer);
        assert!(!run.logs.contains_errors());
        let names: Vec<&str> = run.lexemes.iter().map(|l| l.token.as_str()).collect();
        assert_eq!(names, vec!["id", "+", "id", "*", "id"]);

        let mut driver = Driver::new(&grammar, &tables);
        for lexeme in &run.lexemes {
            assert_eq!(driver.process(lexeme), ParserState::Processing);
        }
        let state = driver.process(&end_of_input("test.cl", buffer));
        assert_eq!(state, ParserState::Finished);

        let root = driver.into_tree().unwrap();
        // Root is the start production; its first child expands E -> T E'.
        assert_eq!(root.production(), Some(0));
        let e = &root.children()[0];
        assert_eq!(e.production(), Some(1));
        // The multiplication is grouped inside the T reached through
        // E' -> + T E', tighter than the addition.
        let e_dash = &e.children()[1];
        assert_eq!(e_dash.production(), Some(2));
        let t_after_plus = &e_dash.children()[1];
        assert_eq!(t_after_plus.production(), Some(4));
        let t_dash = &t_after_plus.children()[1];
        assert_eq!(t_dash.production(), Some(5));
    }

    #[test]
    fn parse_errors_surface_the_failing_location() {
        let mut def_logs = Logs::new("arith.cclexdef", LEXER_DEF);
        let def = lexer_def::parse(LEXER_DEF, &mut def_logs).unwrap();
        let scanner = Scanner::from_def(&def).unwrap();

        let mut grammar_logs = Logs::new("arith.grammar", GRAMMAR_DEF);
        let decl = grammar_def::parse(GRAMMAR_DEF, &mut grammar_logs).unwrap();
        let grammar = Grammar::build(decl).unwrap();
        let firsts = Firsts::compute(&grammar);
        let follows = Follows::compute(&grammar, &firsts);
        let tables = ParseTables::build(&grammar, &firsts, &follows).unwrap();

        let buffer = "a+*c";
        let run = scanner.scan("test.cl", buffer);
        let mut driver = Driver::new(&grammar, &tables);
        let mut state = ParserState::Processing;
        for lexeme in &run.lexemes {
            state = driver.process(lexeme);
            if state != ParserState::Processing {
                break;
            }
        }
        assert_eq!(state, ParserState::Error);
        let err = driver.error().unwrap();
        assert_eq!(err.lexeme.token, "*");
        assert_eq!(err.lexeme.location.offset, 2);
    }
}
