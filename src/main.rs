mod ast;
mod diagnostics;
mod numeral;
mod parser;
mod printer;
mod tokenizer;
mod tree;
mod vocabulary;

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::Context;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::diagnostics::CompilerDiagnostic;

fn main() -> ExitCode {
    initialize_logging();

    let cli = parse_cli(env::args_os().collect());

    let diagnostic = match std::panic::catch_unwind(|| run(&cli)) {
        Ok(Ok(())) => return ExitCode::SUCCESS,
        Ok(Err(diagnostic)) => diagnostic,
        Err(payload) => CompilerDiagnostic::from_panic(payload),
    };
    eprintln!("{}", diagnostic.render_terminal_auto());
    ExitCode::FAILURE
}

fn run(cli: &Cli) -> Result<(), CompilerDiagnostic> {
    info!(
        input = %cli.input.display(),
        output = %cli.output.display(),
        "Starting front end"
    );

    let source = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read source {}", cli.input.display()))
        .map_err(|err| CompilerDiagnostic::from_io(&err))?;
    trace!(source_len = source.len(), "Read input file");

    let tokens = tokenizer::tokenize(&source)
        .map_err(|err| CompilerDiagnostic::from_source_error(&source, &cli.input, &err))?;
    info!(
        tokens = tokens.tokens.len() - 1,
        identifiers = tokens.names.len(),
        "Tokenized source file"
    );
    if !tokens.names.is_empty() {
        debug!(names = ?tokens.names.iter().collect::<Vec<_>>(), "Interned identifiers");
    }

    if cli.list_tokens {
        println!(
            "Found {} tokens, {} identifiers.",
            tokens.tokens.len() - 1,
            tokens.names.len()
        );
        print!("{}", tokens.listing());
    }
    if let Some(tokens_path) = &cli.tokens {
        write_tokens(&tokens, tokens_path).map_err(|err| CompilerDiagnostic::from_io(&err))?;
        debug!(tokens_path = %tokens_path.display(), "Wrote token list");
    }

    let ast = parser::parse(tokens)
        .map_err(|err| CompilerDiagnostic::from_source_error(&source, &cli.input, &err))?;

    printer::save_dot(&ast, &cli.dot).map_err(|err| CompilerDiagnostic::from_io(&err))?;
    debug!(dot_path = %cli.dot.display(), "Wrote AST graph");

    printer::save_text(&ast, &cli.output).map_err(|err| CompilerDiagnostic::from_io(&err))?;
    info!(output = %cli.output.display(), "AST saved");

    Ok(())
}

fn write_tokens(tokens: &tokenizer::TokenList, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(tokens)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write tokens to {}", path.display()))
}

/// Parses the command line, warning about and dropping arguments clap does
/// not recognise.
fn parse_cli(mut args: Vec<OsString>) -> Cli {
    loop {
        let err = match Cli::try_parse_from(&args) {
            Ok(cli) => return cli,
            Err(err) => err,
        };
        if err.kind() != ErrorKind::UnknownArgument {
            err.exit();
        }
        let Some(ContextValue::String(invalid)) = err.get(ContextKind::InvalidArg) else {
            err.exit();
        };
        let with_value = format!("{invalid}=");
        let Some(index) = args.iter().skip(1).position(|arg| {
            arg.to_str()
                .is_some_and(|arg| arg == invalid.as_str() || arg.starts_with(&with_value))
        }) else {
            err.exit();
        };
        warn!(argument = %invalid, "Ignoring unrecognized argument");
        args.remove(index + 1);
    }
}

fn initialize_logging() {
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter = EnvFilter::from_str(&env_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

#[derive(clap::Parser, Debug)]
#[clap(
    name = "chemc",
    about = "Turn a chem source file into a bracketed AST."
)]
struct Cli {
    /// Source file to parse
    #[clap(short, long, default_value = "input.chem")]
    input: PathBuf,

    /// Where to write the bracketed AST
    #[clap(short, long, default_value = "output.ast")]
    output: PathBuf,

    /// Graphviz dump of the AST
    #[clap(long, default_value = "dump.dot")]
    dot: PathBuf,

    /// Also write the token list and name table as JSON
    #[clap(long)]
    tokens: Option<PathBuf>,

    /// Print the numbered token listing to stdout
    #[clap(long, default_value = "false")]
    list_tokens: bool,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::diagnostics::DiagnosticStage;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[test]
    fn defaults_match_conventional_file_names() {
        let cli = parse_cli(args(&["chemc"]));
        assert_eq!(cli.input, PathBuf::from("input.chem"));
        assert_eq!(cli.output, PathBuf::from("output.ast"));
        assert_eq!(cli.dot, PathBuf::from("dump.dot"));
        assert_eq!(cli.tokens, None);
        assert!(!cli.list_tokens);
    }

    #[test]
    fn unknown_flags_are_dropped() {
        let cli = parse_cli(args(&[
            "chemc", "--bogus", "-i", "prog.chem", "--also=1", "-o", "prog.ast",
        ]));
        assert_eq!(cli.input, PathBuf::from("prog.chem"));
        assert_eq!(cli.output, PathBuf::from("prog.ast"));
    }

    fn cli_in(dir: &Path, source: &str) -> Cli {
        let input = dir.join("input.chem");
        fs::write(&input, source).expect("write input");
        Cli {
            input,
            output: dir.join("output.ast"),
            dot: dir.join("dump.dot"),
            tokens: Some(dir.join("tokens.json")),
            list_tokens: false,
        }
    }

    #[test]
    fn run_writes_ast_graph_and_tokens() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let cli = cli_in(
            tmp.path(),
            "labassistant main_babka_labka ( )\nlabprotocol\n  explode ;\nendprotocol\n",
        );
        run(&cli).expect("run");

        assert_eq!(
            fs::read_to_string(&cli.output).expect("read output"),
            "{ PROGRAM_ROOT { @ } { DECLARATION { @ } { FUNCTION { VARLIST } \
             { main { @ } { BLOCK { @ } { OP { @ } { EXPLODE } } } } } } } "
        );
        let dot = fs::read_to_string(&cli.dot).expect("read dot");
        assert!(dot.contains("{ EXPLODE }"));

        let tokens: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join("tokens.json")).expect("read"))
                .expect("json");
        assert_eq!(tokens["names"], serde_json::json!(["main"]));
        assert_eq!(tokens["tokens"].as_array().map(Vec::len), Some(9));
    }

    #[test]
    fn run_reports_parse_errors() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let cli = cli_in(tmp.path(), "labassistant f ( ) labprotocol report ; endprotocol");
        let diagnostic = run(&cli).expect_err("parse should fail");
        assert_eq!(diagnostic.stage, DiagnosticStage::Parse);
        assert!(!cli.output.exists());
    }

    #[test]
    fn run_reports_lexical_errors() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let cli = cli_in(tmp.path(), "labassistant f ( ) labprotocol x is 1 ; endprotocol");
        let diagnostic = run(&cli).expect_err("tokenize should fail");
        assert_eq!(diagnostic.stage, DiagnosticStage::Tokenize);
    }

    #[test]
    fn run_reports_missing_input() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let cli = Cli {
            input: tmp.path().join("missing.chem"),
            output: tmp.path().join("output.ast"),
            dot: tmp.path().join("dump.dot"),
            tokens: None,
            list_tokens: false,
        };
        let diagnostic = run(&cli).expect_err("missing input");
        assert_eq!(diagnostic.stage, DiagnosticStage::Io);
        assert!(diagnostic.message.contains("missing.chem"), "{}", diagnostic.message);
    }
}
