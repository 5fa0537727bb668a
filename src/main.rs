use std::{path::PathBuf, process};

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use vm_translator::{translate_path, BootstrapPolicy, DriverOptions, TranslatorConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Bootstrap {
    Auto,
    Always,
    Never,
}

impl From<Bootstrap> for BootstrapPolicy {
    fn from(b: Bootstrap) -> Self {
        match b {
            Bootstrap::Auto => BootstrapPolicy::Auto,
            Bootstrap::Always => BootstrapPolicy::Always,
            Bootstrap::Never => BootstrapPolicy::Never,
        }
    }
}

/// Translate VM code into Hack assembly.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// A .vm file or a directory of .vm files
    input: PathBuf,

    /// Output file (defaults to <stem>.asm or <dir>/<dir>.asm)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// When to emit the bootstrap prologue
    #[arg(long, value_enum, default_value_t = Bootstrap::Auto)]
    bootstrap: Bootstrap,

    /// Function the bootstrap calls
    #[arg(long, default_value = "Sys.init")]
    entry: String,

    /// Initial stack pointer set by the bootstrap
    #[arg(long, default_value_t = 256)]
    stack_origin: u16,

    /// Omit the comment restating each VM command
    #[arg(long)]
    no_comments: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let options = DriverOptions {
        bootstrap: args.bootstrap.into(),
        output: args.output,
        translator: TranslatorConfig {
            stack_origin: args.stack_origin,
            entry_function: args.entry,
            annotate: !args.no_comments,
        },
    };

    match translate_path(&args.input, &options) {
        Ok(output) => println!("{}", output.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
