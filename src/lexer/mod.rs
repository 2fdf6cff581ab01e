//! Lexical analysis: a bank of per-token DFAs run in parallel with
//! longest-match semantics, declaration order breaking ties.

pub mod charclass;
pub mod dfa;
pub mod regex;

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::linemap::LineMap;
use crate::loader::lexer_def::LexerDef;
use crate::loader::log::Logs;
use crate::loader::Span;

use dfa::Dfa;

/// Token whose lexeme text is written to the sidecar with its surrounding
/// quotes stripped.
pub const STRING_TOKEN: &str = "STRING";

/// Position of a lexeme in its source file. `line` is 1-based, `column`
/// 0-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileLoc {
    pub file: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub line_text: String,
}

/// One scanner result. An empty `text` (and `token`) means no automaton
/// matched at this location; the scanner has already advanced one byte to
/// recover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lexeme {
    pub text: String,
    pub token: String,
    pub location: FileLoc,
}

/// Token names the filtering pass treats specially. Whitespace and line
/// comments are dropped; the block tokens maintain the nesting counter.
#[derive(Clone, Debug)]
pub struct FilterTokens {
    pub whitespace: String,
    pub comment_line: String,
    pub comment_block_start: String,
    pub comment_block_end: String,
}

impl Default for FilterTokens {
    fn default() -> Self {
        Self {
            whitespace: "WS".to_string(),
            comment_line: "COMMENT_LINE".to_string(),
            comment_block_start: "COMMENT_BLOCK_START".to_string(),
            comment_block_end: "COMMENT_BLOCK_END".to_string(),
        }
    }
}

struct TokenDfa {
    name: String,
    dfa: Dfa,
}

/// The compiled lexer: one DFA per token, in declaration (= precedence)
/// order, plus the keyword/symbol metadata sets.
pub struct Scanner {
    tokens: Vec<TokenDfa>,
    keywords: HashSet<String>,
    symbols: HashSet<String>,
}

/// Result of scanning a whole buffer with filtering applied.
pub struct ScanRun {
    pub lexemes: Vec<Lexeme>,
    pub logs: Logs<'static>,
}

impl Scanner {
    pub fn from_def(def: &LexerDef) -> Result<Scanner> {
        let mut tokens = Vec::with_capacity(def.tokens.len());
        for (name, pattern) in &def.tokens {
            log::debug!("token {name} regex {pattern}");
            let dfa = Dfa::compile(pattern).map_err(|err| match err {
                Error::InvalidRegex(msg) => {
                    Error::InvalidRegex(format!("token {name}: {msg}"))
                }
                other => other,
            })?;
            tokens.push(TokenDfa {
                name: name.clone(),
                dfa,
            });
        }
        Ok(Scanner {
            tokens,
            keywords: def.keywords.clone(),
            symbols: def.symbols.clone(),
        })
    }

    pub fn keywords(&self) -> &HashSet<String> {
        &self.keywords
    }

    pub fn symbols(&self) -> &HashSet<String> {
        &self.symbols
    }

    /// Raw lexeme iteration without any filtering.
    pub fn cursor<'a>(&'a self, file: &str, buffer: &'a str) -> Cursor<'a> {
        Cursor {
            scanner: self,
            file: file.to_string(),
            buffer,
            linemap: LineMap::new(buffer),
            pos: 0,
        }
    }

    pub fn scan(&self, file: &str, buffer: &str) -> ScanRun {
        self.scan_with(&FilterTokens::default(), file, buffer)
    }

    /// Scan the whole buffer, dropping whitespace and comments and
    /// reporting lexical problems through the returned diagnostics.
    pub fn scan_with(&self, filters: &FilterTokens, file: &str, buffer: &str) -> ScanRun {
        let mut logs = Logs::new(file, buffer.to_string());
        let mut cursor = self.cursor(file, buffer);
        let mut block_starts: Vec<usize> = Vec::new();
        let mut lexemes = Vec::new();

        while let Some(lexeme) = cursor.next_lexeme() {
            let offset = lexeme.location.offset;
            if lexeme.text.is_empty() {
                // Inside a block comment anything unrecognised is comment
                // text; elsewhere it is a real problem.
                if block_starts.is_empty() {
                    logs.emit_error("cannot identify token", Span(offset, offset + 1));
                }
                continue;
            }
            if lexeme.token == filters.whitespace || lexeme.token == filters.comment_line {
                continue;
            }
            if lexeme.token == filters.comment_block_end {
                if block_starts.pop().is_none() {
                    logs.emit_error(
                        "cannot match comment block parens",
                        Span(offset, offset + lexeme.text.len()),
                    );
                }
                continue;
            }
            if lexeme.token == filters.comment_block_start {
                block_starts.push(offset);
                continue;
            }
            if !block_starts.is_empty() {
                continue;
            }
            lexemes.push(lexeme);
        }

        if let Some(&open) = block_starts.last() {
            logs.emit_error("cannot identify a matching end token", Span(open, open + 1));
        }

        ScanRun {
            lexemes,
            logs: logs.into_owned(),
        }
    }

    /// Scan `buffer` as the contents of `path` and write the `.cclex`
    /// companion file next to it.
    pub fn scan_to_sidecar(&self, path: &std::path::Path, buffer: &str) -> Result<ScanRun> {
        let run = self.scan(&path.display().to_string(), buffer);
        let sidecar_path = format!("{}.cclex", path.display());
        std::fs::write(&sidecar_path, self.sidecar(&run))?;
        log::info!("wrote {sidecar_path}");
        Ok(run)
    }

    /// Companion-file text for a scan: per lexeme the 1-based line number
    /// and the lower-cased token name, plus the lexeme text when the token
    /// is neither a keyword nor a symbol.
    pub fn sidecar(&self, run: &ScanRun) -> String {
        let mut out = String::new();
        for lexeme in &run.lexemes {
            let _ = writeln!(out, "{}", lexeme.location.line);
            let _ = writeln!(out, "{}", lexeme.token.to_lowercase());

            let named = self.keywords.contains(&lexeme.token)
                || self.symbols.contains(&lexeme.token);
            if !named {
                if lexeme.token == STRING_TOKEN && lexeme.text.len() >= 2 {
                    let _ = writeln!(out, "{}", &lexeme.text[1..lexeme.text.len() - 1]);
                } else {
                    let _ = writeln!(out, "{}", lexeme.text);
                }
            }
        }
        out
    }
}

/// Mutable scan position over an immutable buffer.
pub struct Cursor<'a> {
    scanner: &'a Scanner,
    file: String,
    buffer: &'a str,
    linemap: LineMap,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Produce the next lexeme, or `None` at end of buffer.
    ///
    /// Every call runs all automata in parallel from the current position
    /// and keeps the last position where at least one of them accepted;
    /// the first token in declaration order wins a tie. With no accepting
    /// position at all, a zero-length lexeme is produced and the position
    /// advances one byte.
    pub fn next_lexeme(&mut self) -> Option<Lexeme> {
        let bytes = self.buffer.as_bytes();
        if self.pos >= bytes.len() {
            return None;
        }

        let mut live: Vec<(usize, dfa::DfaCursor<'a>)> = self
            .scanner
            .tokens
            .iter()
            .enumerate()
            .map(|(index, token)| (index, token.dfa.cursor()))
            .collect();

        let mut last_accept: Option<(usize, usize)> = None; // (end, winning token index)
        let mut probe = self.pos;
        while probe < bytes.len() && !live.is_empty() {
            let byte = bytes[probe];
            live.retain_mut(|(_, cursor)| {
                cursor.step(byte);
                !cursor.errored()
            });
            if let Some(&(index, _)) = live.iter().find(|(_, cursor)| cursor.accepting()) {
                last_accept = Some((probe, index));
            }
            probe += 1;
        }

        let location = self.location(self.pos);
        match last_accept {
            None => {
                self.pos += 1;
                Some(Lexeme {
                    text: String::new(),
                    token: String::new(),
                    location,
                })
            }
            Some((end, index)) => {
                let text = self.buffer[self.pos..=end].to_string();
                self.pos = end + 1;
                Some(Lexeme {
                    text,
                    token: self.scanner.tokens[index].name.clone(),
                    location,
                })
            }
        }
    }

    pub fn location(&self, offset: usize) -> FileLoc {
        let (line, column) = self.linemap.line_col(offset);
        FileLoc {
            file: self.file.clone(),
            offset,
            line: line + 1,
            column,
            line_text: self.linemap.line_text(self.buffer, line).to_string(),
        }
    }
}

/// The synthetic end-of-input lexeme fed to the parser once the scanner is
/// exhausted.
pub fn end_of_input(file: &str, buffer: &str) -> Lexeme {
    let linemap = LineMap::new(buffer);
    let offset = buffer.len();
    let (line, column) = linemap.line_col(offset);
    Lexeme {
        text: "$".to_string(),
        token: "$".to_string(),
        location: FileLoc {
            file: file.to_string(),
            offset,
            line: line + 1,
            column,
            line_text: linemap.line_text(buffer, line).to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::lexer_def;

    const DEF: &str = "\
DEFINITION
  WS : {[W-S][W-S]*}
  CLASS : {(class|Class)}
  IDENTIFIER : {[a-z]([A-Za-z_0-9]*)}
  NUMBER : {(0|[1-9][0-9]*)}
  PLUS : {\\+}
  TIMES : {\\*}
  LPAREN : {\\(}
  RPAREN : {\\)}
  COMMENT_LINE : {--(([^E-LE-F])*)([E-L]|[E-F])}
  COMMENT_BLOCK_START : {\\(\\*}
  COMMENT_BLOCK_END : {\\*\\)}
KEYWORDS
  CLASS
SYMBOLS
  PLUS
  TIMES
  LPAREN
  RPAREN
";

    fn scanner() -> Scanner {
        let mut logs = Logs::new("test.cclexdef", DEF);
        let def = lexer_def::parse(DEF, &mut logs).unwrap();
        Scanner::from_def(&def).unwrap()
    }

    fn tokens(buffer: &str) -> Vec<(String, String)> {
        let scanner = scanner();
        let run = scanner.scan("test.cl", buffer);
        assert!(!run.logs.contains_errors());
        run.lexemes
            .into_iter()
            .map(|l| (l.token, l.text))
            .collect()
    }

    #[test]
    fn longest_match_wins() {
        assert_eq!(
            tokens("classes"),
            vec![("IDENTIFIER".to_string(), "classes".to_string())]
        );
    }

    #[test]
    fn declaration_order_breaks_ties() {
        // CLASS and IDENTIFIER both accept "class" with the same length;
        // CLASS is declared first.
        assert_eq!(
            tokens("class"),
            vec![("CLASS".to_string(), "class".to_string())]
        );
    }

    #[test]
    fn expression_stream() {
        let toks = tokens("a + b12 * (c)");
        let names: Vec<&str> = toks.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "IDENTIFIER",
                "PLUS",
                "IDENTIFIER",
                "TIMES",
                "LPAREN",
                "IDENTIFIER",
                "RPAREN"
            ]
        );
    }

    #[test]
    fn consumed_text_round_trips() {
        let buffer = "class a(x)";
        let scanner = scanner();
        let mut cursor = scanner.cursor("test.cl", buffer);
        let mut consumed = String::new();
        while let Some(lexeme) = cursor.next_lexeme() {
            consumed.push_str(&lexeme.text);
        }
        assert_eq!(consumed, buffer);
    }

    #[test]
    fn no_match_emits_a_zero_length_lexeme_and_recovers() {
        let scanner = scanner();
        let mut cursor = scanner.cursor("test.cl", "a@b");
        assert_eq!(cursor.next_lexeme().unwrap().token, "IDENTIFIER");
        let stuck = cursor.next_lexeme().unwrap();
        assert_eq!(stuck.text, "");
        assert_eq!(stuck.token, "");
        assert_eq!(stuck.location.offset, 1);
        assert_eq!(cursor.next_lexeme().unwrap().text, "b");

        let run = scanner.scan("test.cl", "a@b");
        assert!(run.logs.contains_errors());
        assert_eq!(run.lexemes.len(), 2);
    }

    #[test]
    fn locations_track_lines_and_columns() {
        let scanner = scanner();
        let run = scanner.scan("test.cl", "a +\nbb\n");
        let locs: Vec<(usize, usize)> = run
            .lexemes
            .iter()
            .map(|l| (l.location.line, l.location.column))
            .collect();
        assert_eq!(locs, vec![(1, 0), (1, 2), (2, 0)]);
        assert_eq!(run.lexemes[2].location.line_text, "bb");
        assert_eq!(run.lexemes[2].location.file, "test.cl");
    }

    #[test]
    fn comments_and_whitespace_are_dropped() {
        assert_eq!(
            tokens("a -- trailing comment\nb\n"),
            vec![
                ("IDENTIFIER".to_string(), "a".to_string()),
                ("IDENTIFIER".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn block_comments_nest_and_suppress() {
        assert_eq!(
            tokens("a (* one (* two *) still out? *) b"),
            vec![
                ("IDENTIFIER".to_string(), "a".to_string()),
                ("IDENTIFIER".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn unmatched_block_delimiters_are_diagnosed() {
        let scanner = scanner();
        let run = scanner.scan("test.cl", "a *) b");
        assert!(run.logs.contains_errors());

        let run = scanner.scan("test.cl", "a (* b");
        assert!(run.logs.contains_errors());
    }

    #[test]
    fn sidecar_format() {
        let scanner = scanner();
        assert!(scanner.keywords().contains("CLASS"));
        assert!(scanner.symbols().contains("PLUS"));
        let run = scanner.scan("test.cl", "class a\n+ 12\n");
        let sidecar = scanner.sidecar(&run);
        assert_eq!(sidecar, "1\nclass\n1\nidentifier\na\n2\nplus\n2\nnumber\n12\n");
    }

    #[test]
    fn sidecar_file_lands_next_to_the_source() {
        let scanner = scanner();
        let path = std::env::temp_dir().join("coolcc_scan_to_sidecar_test.cl");
        let run = scanner.scan_to_sidecar(&path, "class a\n").unwrap();
        assert_eq!(run.lexemes.len(), 2);

        let sidecar_path = format!("{}.cclex", path.display());
        let written = std::fs::read_to_string(&sidecar_path).unwrap();
        assert_eq!(written, "1\nclass\n1\nidentifier\na\n");
        let _ = std::fs::remove_file(&sidecar_path);
    }

    #[test]
    fn bytes_outside_the_alphabet_stall_the_scanner() {
        let scanner = scanner();
        let run = scanner.scan("test.cl", "a\rb");
        // '\r' is outside the supported alphabet: one no-match diagnostic.
        assert!(run.logs.contains_errors());
        assert_eq!(run.lexemes.len(), 2);
    }
}
