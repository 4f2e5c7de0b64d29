//! # Diamant
//!
//! This binary drives the Diamant front-end (lexer, parser, annotator) from
//! the command line, dumping whichever stage was asked for.

mod cli;

use cli::*;

use std::fs;

use log::info;

use diamant::error::Error;

fn main() {
    let args = Cli::init();

    simple_logger::init_with_level((&args.verbosity).into()).unwrap();

    let file = match &args.command {
        Commands::Source(a)
        | Commands::Lex(a)
        | Commands::Parse(a)
        | Commands::Annotate(a)
        | Commands::Pp(a) => &a.file,
    };

    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            log::error!("failed to read {}: {e}", file.display());
            std::process::exit(-1);
        }
    };

    if let Err(e) = run(&args.command, &source, args.json) {
        log::error!("{}", e.position().render(&e.to_string(), &source));
        std::process::exit(-1);
    }
}

fn run(command: &Commands, source: &str, json: bool) -> Result<(), Error> {
    match command {
        Commands::Source(_) => {
            info!("source:\n{source}");
            Ok(())
        }
        Commands::Lex(_) => {
            let tokens = diamant::lex(source)?;
            dump("tokens", &tokens, json);
            Ok(())
        }
        Commands::Parse(_) => {
            let ast = diamant::parse(source)?;
            dump("ast", &ast, json);
            Ok(())
        }
        Commands::Annotate(_) | Commands::Pp(_) => {
            let annotated = diamant::annotate(source)?;
            dump("annotated ast", &annotated, json);
            Ok(())
        }
    }
}

/// Dumps a pipeline stage's result as Rust debug output, or with `--json`
/// as pretty-printed JSON via `serde_json` for tooling that wants to
/// consume the result rather than read it.
fn dump<T: std::fmt::Debug + serde::Serialize>(label: &str, value: &T, json: bool) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(rendered) => info!("{label} (json):\n{rendered}"),
            Err(e) => log::error!("failed to serialize {label} as json: {e}"),
        }
    } else {
        info!("{label}:\n{value:#?}");
    }
}
