//! pgparmor CLI - OpenPGP-style ASCII armor
//!
//! Command-line interface for wrapping binary files in armored text
//! envelopes and for extracting and inspecting armored blocks.

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process;

use pgparmor::{BlockType, Dearmorer, file_ops};

#[derive(Parser)]
#[command(name = "pgparmor")]
#[command(version)]
#[command(about = "OpenPGP-style ASCII armor encoding and decoding.", long_about = None)]
struct Cli {
    /// Fail on envelopes cut off by the end of the input instead of skipping them
    #[arg(long, global = true)]
    strict: bool,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Armor a binary file as a single block
    #[command(alias = "a")]
    Armor {
        /// Path to the file whose contents is to be armored
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the armored text to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Block type named in the delimiter lines
        #[arg(short = 't', long = "type", value_enum, default_value_t = Kind::Message)]
        kind: Kind,

        /// Header to include, as KEY=VALUE (repeatable)
        #[arg(short = 'H', long = "header", value_name = "KEY=VALUE", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },

    /// Write the raw contents of one armored block to a file
    #[command(alias = "d")]
    Dearmor {
        /// Path to the armored file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the decoded contents to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Which block to extract, counting from 0 in file order
        #[arg(short, long, default_value_t = 0)]
        block: usize,
    },

    /// List the blocks in an armored file
    #[command(alias = "l")]
    List {
        /// Path to the armored file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Message,
    PublicKey,
    PrivateKey,
    Signature,
}

impl From<Kind> for BlockType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Message => BlockType::Message,
            Kind::PublicKey => BlockType::PublicKey,
            Kind::PrivateKey => BlockType::PrivateKey,
            Kind::Signature => BlockType::Signature,
        }
    }
}

fn parse_header(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg))?;
    Ok((key.to_string(), value.to_string()))
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let dearmorer = Dearmorer::new().strict(cli.strict);

    let result = match cli.command {
        Commands::Armor {
            input,
            output,
            kind,
            headers,
        } => file_ops::armor_file(&input, &output, kind.into(), &headers),
        Commands::Dearmor {
            input,
            output,
            block,
        } => file_ops::dearmor_file(&input, &output, block, &dearmorer).map(|block| {
            info!(
                "wrote {} bytes of {} block to {}",
                block.contents().len(),
                block.block_type(),
                output.display()
            );
        }),
        Commands::List { input } => file_ops::read_blocks(&input, &dearmorer).map(|blocks| {
            for (index, block) in blocks.iter().enumerate() {
                println!(
                    "{}: {} ({} bytes)",
                    index,
                    block.block_type(),
                    block.contents().len()
                );
                for (key, value) in block.headers() {
                    println!("    {}: {}", key, value);
                }
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}
