//! Simple CLI for evaluating expressions
//!
//! A command-line interface for evaluating Simple expressions and predicates
//! against a message assembled from the arguments.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use simple_lang::{
    LanguageConfig, Message, SimpleLanguage, SimpleValue, change_function_end_token,
    change_function_start_token,
};
use std::fs;
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(name = "simple")]
#[command(about = "Evaluate Simple expressions and predicates against a message")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    /// Token that opens an embedded function (default `${`)
    #[arg(long, global = true)]
    start: Option<String>,
    /// Token that closes an embedded function (default `}`)
    #[arg(long, global = true)]
    end: Option<String>,
    /// Disable `\n`, `\t` and `\r` escapes in constant text
    #[arg(long, global = true)]
    no_escape: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression and print the result
    Evaluate {
        /// Expression to evaluate, e.g. `Hello ${body}`
        expression: String,
        #[command(flatten)]
        message: MessageArgs,
        /// Print the result as JSON
        #[arg(short, long)]
        pretty: bool,
    },
    /// Evaluate a predicate and print `true` or `false`
    Predicate {
        /// Predicate to evaluate, e.g. `${header.foo} == 'abc'`
        predicate: String,
        #[command(flatten)]
        message: MessageArgs,
    },
    /// Compile an expression and print its tree
    Parse {
        /// Expression to compile
        expression: String,
        /// Compile the text as a predicate
        #[arg(long)]
        predicate: bool,
        /// Suppress informational messages
        #[arg(short, long)]
        quiet: bool,
    },
}

#[derive(Args)]
struct MessageArgs {
    /// Message body (reads from stdin when `-` is given)
    #[arg(short, long)]
    body: Option<String>,
    /// Read the message body from a file
    #[arg(short, long, conflicts_with = "body")]
    file: Option<String>,
    /// Parse the body as JSON so accessor paths can navigate it
    #[arg(long)]
    json: bool,
    /// Message header as `name=value` (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE")]
    headers: Vec<String>,
    /// Exchange property as `name=value` (repeatable)
    #[arg(short = 'P', long = "property", value_name = "NAME=VALUE")]
    properties: Vec<String>,
}

fn main() {
    // Setup human-panic for better error messages
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();
    if let Some(start) = &cli.start {
        change_function_start_token(&[start]);
    }
    if let Some(end) = &cli.end {
        change_function_end_token(&[end]);
    }
    let language = SimpleLanguage::with_config(LanguageConfig {
        allow_escape: !cli.no_escape,
        ..LanguageConfig::default()
    })
    .with_file_functions();

    let outcome = match cli.command {
        Commands::Evaluate {
            expression,
            message,
            pretty,
        } => handle_evaluate(&language, &expression, &message, pretty),
        Commands::Predicate { predicate, message } => {
            handle_predicate(&language, &predicate, &message)
        }
        Commands::Parse {
            expression,
            predicate,
            quiet,
        } => handle_parse(&language, &expression, predicate, quiet),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn handle_evaluate(
    language: &SimpleLanguage,
    expression: &str,
    args: &MessageArgs,
    pretty: bool,
) -> Result<()> {
    let message = build_message(args)?;
    let result = language.evaluate(expression, &message)?;
    if pretty {
        println!("{}", serde_json::to_string_pretty(&result.to_json())?);
    } else {
        println!("{}", result.to_text());
    }
    Ok(())
}

fn handle_predicate(language: &SimpleLanguage, predicate: &str, args: &MessageArgs) -> Result<()> {
    let message = build_message(args)?;
    let matched = language.matches(predicate, &message)?;
    println!("{matched}");
    if !matched {
        process::exit(2);
    }
    Ok(())
}

fn handle_parse(
    language: &SimpleLanguage,
    expression: &str,
    predicate: bool,
    quiet: bool,
) -> Result<()> {
    let compiled = if predicate {
        language.compile_predicate(expression)?.expression().clone()
    } else {
        language.compile_expression(expression)?.as_ref().clone()
    };
    if quiet {
        println!("OK");
    } else {
        println!("✓ Expression compiled successfully");
        println!("Expression: {expression}");
        println!("Tree: {compiled:#?}");
    }
    Ok(())
}

fn build_message(args: &MessageArgs) -> Result<Message> {
    let body_text = match (&args.body, &args.file) {
        (Some(body), _) if body == "-" => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Error reading body from stdin")?;
            Some(buffer)
        }
        (Some(body), _) => Some(body.clone()),
        (None, Some(file)) => Some(
            fs::read_to_string(file).with_context(|| format!("Error reading file '{file}'"))?,
        ),
        (None, None) => None,
    };

    let body = match body_text {
        Some(text) if args.json => {
            let json: serde_json::Value =
                serde_json::from_str(&text).context("Error parsing JSON body")?;
            SimpleValue::from(json)
        }
        Some(text) => SimpleValue::String(text),
        None => SimpleValue::Null,
    };

    let mut message = Message::new().with_body(body);
    for header in &args.headers {
        let (name, value) = split_pair(header)?;
        message = message.with_header(name, value);
    }
    for property in &args.properties {
        let (name, value) = split_pair(property)?;
        message = message.with_property(name, value);
    }
    Ok(message)
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("Expected NAME=VALUE but was '{pair}'"),
    }
}
