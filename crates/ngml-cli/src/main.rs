use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Parser)]
#[command(name = "ngml")]
#[command(about = "NGML — component language compiler front end")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check an .ngml file for syntax errors
    Check {
        /// Input .ngml file
        path: String,
    },

    /// Parse an .ngml file and dump its AST
    Ast {
        /// Input .ngml file
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Check { path } => cmd_check(&path),
        Command::Ast { path } => cmd_ast(&path),
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_check(path: &str) {
    let source = read_source(path);
    let result = ngml_parser::parse(&source);

    for diagnostic in &result.diagnostics {
        eprintln!("{path}: {diagnostic}");
    }

    if result.has_errors() {
        std::process::exit(1);
    }
    eprintln!("Ok: {path}");
}

fn cmd_ast(path: &str) {
    let source = read_source(path);
    let result = ngml_parser::parse(&source);

    for diagnostic in &result.diagnostics {
        eprintln!("{path}: {diagnostic}");
    }

    println!("{:#?}", result.program);

    if result.has_errors() {
        std::process::exit(1);
    }
}
