use clap::{Parser as ClapParser, Subcommand};
use jmespath_lang::{
    FunctionRegistry,
    cli::{self, CliError, SearchOptions, SearchResult},
    output::{to_json, to_json_pretty},
};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "jp")]
#[command(about = "jp - Query JSON documents with JMESPath expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against JSON input
    Search {
        /// The expression to evaluate
        expression: String,

        /// JSON input (reads from stdin if neither this nor --filename is given)
        #[arg(short, long, conflicts_with = "filename")]
        input: Option<String>,

        /// Read JSON input from a file
        #[arg(short, long)]
        filename: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the syntax tree of an expression
    Ast {
        /// The expression to parse
        expression: String,
    },

    /// List the available functions and their signatures
    Functions,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search {
            expression,
            input,
            filename,
            pretty,
        } => run_search(expression, input, filename, pretty),
        Commands::Ast { expression } => run_ast(expression),
        Commands::Functions => {
            print!("{}", cli::describe_functions(FunctionRegistry::builtins()));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_input(input: Option<String>, filename: Option<PathBuf>) -> Result<Option<String>, CliError> {
    if let Some(s) = input {
        return Ok(Some(s));
    }
    if let Some(path) = filename {
        return Ok(Some(fs::read_to_string(path)?));
    }
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(Some(buffer))
}

fn run_search(
    expression: String,
    input: Option<String>,
    filename: Option<PathBuf>,
    pretty: bool,
) -> Result<(), CliError> {
    let options = SearchOptions {
        expression,
        input: read_input(input, filename)?,
        ast_only: false,
    };

    if let SearchResult::Value(value) = cli::execute_search(&options)? {
        let json = if pretty {
            to_json_pretty(&value)
        } else {
            to_json(&value)
        };
        println!("{}", json);
    }
    Ok(())
}

fn run_ast(expression: String) -> Result<(), CliError> {
    let options = SearchOptions {
        expression,
        input: None,
        ast_only: true,
    };

    if let SearchResult::Ast(ast) = cli::execute_search(&options)? {
        println!("{:#?}", ast);
    }
    Ok(())
}
