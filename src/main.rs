use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::Parser;

use coolcc::lexer::{end_of_input, Scanner};
use coolcc::loader::log::Logs;
use coolcc::loader::{grammar_def, lexer_def, Span};
use coolcc::parser::sets::{self, Firsts, Follows};
use coolcc::parser::{Driver, Grammar, ParseTables, ParserState};

/// COOL compiler front-end driver: builds the lexer and parser from their
/// definition files and runs the selected stages over a source file.
#[derive(Parser)]
#[command(name = "cool-cc", version)]
struct Args {
    /// COOL source file
    #[arg(short = 'f')]
    file: Option<PathBuf>,

    /// File defining the tokens and the corresponding regexes
    #[arg(long)]
    lexer_definition_filename: Option<PathBuf>,

    /// File defining terminals, non-terminals and productions
    #[arg(long)]
    grammar_definition_filename: Option<PathBuf>,

    /// Run the lexer and write the .cclex sidecar
    #[arg(long)]
    lexer: bool,

    /// Run the parser over the scanned tokens (implies --lexer)
    #[arg(long)]
    parser: bool,

    /// Write the parsing tables as JSON for external generators
    #[arg(long)]
    write_tables: Option<PathBuf>,

    /// Raise the log level (repeat for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Info,
        _ => simplelog::LevelFilter::Debug,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    run(args)
}

fn run(args: Args) -> Result<()> {
    let scanner = build_scanner(&args)?;

    let grammar_objects = if args.parser || args.write_tables.is_some() {
        Some(build_parser_objects(&args)?)
    } else {
        None
    };

    if let (Some(path), Some((grammar, tables))) = (&args.write_tables, &grammar_objects) {
        let dump = tables
            .dump_json(grammar)
            .context("serialising the parsing tables")?;
        fs::write(path, dump)
            .with_context(|| format!("writing tables to {}", path.display()))?;
        log::info!("wrote parsing tables to {}", path.display());
    }

    if !(args.lexer || args.parser) {
        return Ok(());
    }

    let Some(source_path) = &args.file else {
        bail!("-f <file> is required to run the lexer or parser");
    };
    let buffer = fs::read_to_string(source_path)
        .with_context(|| format!("reading {}", source_path.display()))?;
    let file_name = source_path.display().to_string();

    let scanned = scanner
        .scan_to_sidecar(source_path, &buffer)
        .with_context(|| format!("scanning {}", source_path.display()))?;
    for entry in scanned.logs.displayable() {
        eprint!("{entry}");
    }

    let mut failed = scanned.logs.contains_errors();

    if args.parser {
        let Some((grammar, tables)) = &grammar_objects else {
            unreachable!("--parser forces the grammar objects to be built");
        };
        let mut driver = Driver::new(grammar, tables);
        let mut state = ParserState::Processing;
        for lexeme in &scanned.lexemes {
            state = driver.process(lexeme);
            if state != ParserState::Processing {
                break;
            }
        }
        if state == ParserState::Processing {
            state = driver.process(&end_of_input(&file_name, &buffer));
        }

        match state {
            ParserState::Finished => log::info!("parse finished"),
            _ => {
                failed = true;
                if let Some(err) = driver.error() {
                    let mut logs = Logs::new(file_name.as_str(), buffer.as_str());
                    let at = err.lexeme.location.offset;
                    logs.emit_error(err.message.clone(), Span(at, at + 1));
                    for entry in logs.displayable() {
                        eprint!("{entry}");
                    }
                }
            }
        }
    }

    if failed {
        bail!("{} did not pass the front end", source_path.display());
    }
    Ok(())
}

fn build_scanner(args: &Args) -> Result<Scanner> {
    let Some(path) = &args.lexer_definition_filename else {
        bail!("--lexer-definition-filename is required");
    };
    let src =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut logs = Logs::new(path.display().to_string(), src.as_str());
    let def = lexer_def::parse(&src, &mut logs);
    for entry in logs.displayable() {
        eprint!("{entry}");
    }
    let Some(def) = def else {
        bail!("invalid lexer definition {}", path.display());
    };

    log::info!(
        "lexer definition {}: {} tokens",
        path.display(),
        def.tokens.len()
    );
    Ok(Scanner::from_def(&def)?)
}

fn build_parser_objects(args: &Args) -> Result<(Grammar, ParseTables)> {
    let Some(path) = &args.grammar_definition_filename else {
        bail!("--grammar-definition-filename is required");
    };
    let src =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut logs = Logs::new(path.display().to_string(), src.as_str());
    let decl = grammar_def::parse(&src, &mut logs);
    for entry in logs.displayable() {
        eprint!("{entry}");
    }
    let Some(decl) = decl else {
        bail!("invalid grammar definition {}", path.display());
    };

    let grammar = Grammar::build(decl)?;
    grammar.dump();

    let firsts = Firsts::compute(&grammar);
    let follows = Follows::compute(&grammar, &firsts);
    sets::dump(&grammar, &firsts, &follows);

    let tables = ParseTables::build(&grammar, &firsts, &follows)?;
    tables.dump(&grammar);

    Ok((grammar, tables))
}
