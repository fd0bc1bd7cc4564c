//! calldec CLI: decode Ethereum calldata against a contract ABI.
//!
//! # Commands
//! ```text
//! calldec decode-call        --calldata <hex> --abi <path.json>
//! calldec decode-constructor --data <hex> --abi <path.json>
//! calldec decode-batch       --input <file> --abi <path.json> [--mode skip|collect|throw]
//! calldec encode-call        --function <name> --args <json> --abi <path.json>
//! calldec selectors          --abi <path.json>
//! calldec test               --fixtures <dir>
//! calldec info
//! ```

use anyhow::{Context, Result};
use calldec_core::{decoder::ErrorMode, error::BatchDecodeError};
use calldec_evm::{decode_batch_chunked, encode_call, value_from_json, CallDecoder};
use calldec_observability::{init_tracing, CallDecoderMetrics};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(
    name = "calldec",
    about = "Ethereum calldata decoder",
    long_about = "
calldec: decode Ethereum transaction calldata and constructor arguments
against a contract ABI, encode calls, and list function selectors.

ENVIRONMENT VARIABLES:
  CALLDEC_CONFIG    Path to a YAML config file (overridden by --config)
",
    version
)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode function call calldata using an ABI JSON file
    #[command(name = "decode-call")]
    DecodeCall {
        /// Raw calldata (0x-prefixed hex)
        #[arg(long)]
        calldata: String,
        /// Path to the ABI JSON file
        #[arg(long)]
        abi: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode constructor arguments (no selector) using an ABI JSON file
    #[command(name = "decode-constructor")]
    DecodeConstructor {
        /// ABI-encoded constructor arguments (0x-prefixed hex)
        #[arg(long)]
        data: String,
        /// Path to the ABI JSON file
        #[arg(long)]
        abi: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a file of calldata payloads (one per line) in parallel
    #[command(name = "decode-batch")]
    DecodeBatch {
        /// Input file; blank lines and lines starting with '#' are ignored
        #[arg(long)]
        input: PathBuf,
        /// Path to the ABI JSON file
        #[arg(long)]
        abi: PathBuf,
        /// What to do with payloads that fail: skip | collect | throw
        #[arg(long, default_value = "collect")]
        mode: ErrorMode,
        /// Number of parallel Rayon threads (0 = use default)
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode a function call to ABI calldata
    #[command(name = "encode-call")]
    EncodeCall {
        /// Function name
        #[arg(long)]
        function: String,
        /// JSON array of arguments, e.g. '["0xabc...", "1000000"]'
        #[arg(long)]
        args: String,
        /// Path to the ABI JSON file
        #[arg(long)]
        abi: PathBuf,
    },

    /// List the function selectors of an ABI
    Selectors {
        /// Path to the ABI JSON file
        #[arg(long)]
        abi: PathBuf,
    },

    /// Run golden test fixtures
    Test {
        /// Directory containing fixture JSON files
        #[arg(long, default_value = "./fixtures/calls")]
        fixtures: PathBuf,
        /// Only run fixtures expecting this function name
        #[arg(long)]
        function: Option<String>,
    },

    /// Show calldec build and capability info
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if cli.verbose {
        config.log.level = "debug".into();
    }
    if cli.log_json {
        config.log.json = true;
    }
    // A subscriber may already be installed when embedded; keep going.
    if let Err(e) = init_tracing(&config.log) {
        eprintln!("warning: tracing not initialised: {e}");
    }
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::DecodeCall { calldata, abi, json } => {
            cmd_decode_call(&calldata, &abi, &config, json)
        }

        Commands::DecodeConstructor { data, abi, json } => {
            cmd_decode_constructor(&data, &abi, &config, json)
        }

        Commands::DecodeBatch { input, abi, mode, threads, json } => {
            cmd_decode_batch(&input, &abi, mode, threads, &config, json)
        }

        Commands::EncodeCall { function, args, abi } => cmd_encode_call(&function, &args, &abi),

        Commands::Selectors { abi } => cmd_selectors(&abi),

        Commands::Test { fixtures, function } => {
            cmd_test::run(&fixtures, function.as_deref(), config.decoder, cli.verbose)
        }

        Commands::Info => cmd_info(),
    }
}

// ─── Command implementations ─────────────────────────────────────────────────

fn load_decoder(abi_path: &Path, config: &CliConfig) -> Result<CallDecoder> {
    let abi_json = std::fs::read_to_string(abi_path)
        .with_context(|| format!("read ABI file '{}'", abi_path.display()))?;
    CallDecoder::from_abi_json(&abi_json, config.decoder)
        .with_context(|| format!("index ABI '{}'", abi_path.display()))
}

fn cmd_decode_call(calldata: &str, abi_path: &Path, config: &CliConfig, as_json: bool) -> Result<()> {
    let decoder = load_decoder(abi_path, config)?;
    let metrics = CallDecoderMetrics::global();

    let start = Instant::now();
    let result = decoder.decode_call(calldata);
    metrics.record_result(&result, start.elapsed());
    let decoded = result.context("decode calldata")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&decoded)?);
    } else {
        print!("{decoded}");
    }
    Ok(())
}

fn cmd_decode_constructor(
    data: &str,
    abi_path: &Path,
    config: &CliConfig,
    as_json: bool,
) -> Result<()> {
    let decoder = load_decoder(abi_path, config)?;
    let decoded = decoder
        .decode_constructor(data)
        .context("decode constructor arguments")?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&decoded)?);
    } else {
        println!("Constructor");
        println!("Inputs:");
        for arg in &decoded.args {
            println!("  {} ({}): {}", arg.name, arg.ty, arg.value);
        }
    }
    Ok(())
}

/// Non-empty, non-comment lines of a batch input file.
fn read_batch_input(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read batch input '{}'", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn cmd_decode_batch(
    input: &Path,
    abi_path: &Path,
    mode: ErrorMode,
    threads: usize,
    config: &CliConfig,
    as_json: bool,
) -> Result<()> {
    let decoder = load_decoder(abi_path, config)?;
    let calldatas = read_batch_input(input)?;

    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    let start = Instant::now();
    let result = match decode_batch_chunked(&decoder, &calldatas, mode, config.batch.chunk_size) {
        Ok(r) => r,
        Err(BatchDecodeError::ItemFailed { index, source }) => {
            anyhow::bail!("line {} failed to decode: {}", index + 1, source)
        }
        Err(e) => return Err(e.into()),
    };
    let elapsed = start.elapsed();
    CallDecoderMetrics::global().record_batch(&result);

    if as_json {
        let calls: Vec<_> = result
            .calls
            .iter()
            .map(|(i, call)| serde_json::json!({ "index": i, "call": call }))
            .collect();
        let errors: Vec<_> = result
            .errors
            .iter()
            .map(|(i, e)| serde_json::json!({ "index": i, "kind": e.kind(), "error": e.to_string() }))
            .collect();
        let out = serde_json::json!({
            "total": result.total_input,
            "calls": calls,
            "errors": errors,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (i, call) in &result.calls {
            println!("[{}] {}", i, call.summary());
        }
        for (i, e) in &result.errors {
            eprintln!("[{}] error: {}", i, e);
        }
        println!();
        println!("Results:");
        println!("  Total:    {}", result.total_input);
        println!("  Decoded:  {} ({} unknown selector)", result.calls.len(), result.unknown_count());
        println!("  Errors:   {}", result.errors.len());
        println!("  Duration: {:.3}s", elapsed.as_secs_f64());
    }
    Ok(())
}

fn cmd_encode_call(function: &str, args_json: &str, abi_path: &Path) -> Result<()> {
    let abi_json = std::fs::read_to_string(abi_path)
        .with_context(|| format!("read ABI file '{}'", abi_path.display()))?;
    let index = calldec_evm::SelectorIndex::from_abi_json(&abi_json)?;

    let raw: Vec<serde_json::Value> = serde_json::from_str(args_json).context("parse args JSON")?;
    let func = index
        .by_name(function)
        .with_context(|| format!("function '{}' not found in ABI", function))?;
    if raw.len() != func.params.len() {
        anyhow::bail!(
            "{} expects {} arguments, got {}",
            func.signature,
            func.params.len(),
            raw.len()
        );
    }

    let args = func
        .params
        .iter()
        .zip(&raw)
        .map(|((name, ty), json)| {
            value_from_json(ty, json).with_context(|| format!("argument '{}'", name))
        })
        .collect::<Result<Vec<_>>>()?;

    let calldata = encode_call(&index, function, &args)?;
    println!("0x{}", hex::encode(&calldata));
    Ok(())
}

fn cmd_selectors(abi_path: &Path) -> Result<()> {
    let abi_json = std::fs::read_to_string(abi_path)
        .with_context(|| format!("read ABI file '{}'", abi_path.display()))?;
    let index = calldec_evm::SelectorIndex::from_abi_json(&abi_json)?;

    println!("{} functions in '{}'", index.len(), abi_path.display());
    for (selector, func) in index.functions() {
        println!("  0x{}  {}", hex::encode(selector), func.signature);
    }
    if let Some(ctor) = index.constructor() {
        let types: Vec<_> = ctor.params.iter().map(|(_, ty)| ty.to_string()).collect();
        println!("  constructor({})", types.join(","));
    }
    Ok(())
}

fn cmd_info() -> Result<()> {
    println!("calldec v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Capabilities:");
    println!("  ✓ Function call decoding   (selector index, keccak256)");
    println!("  ✓ Constructor decoding     (raw ABI-encoded args)");
    println!("  ✓ ABI encoding             (head/tail layout)");
    println!("  ✓ Parallel batch decode    (Rayon)");
    println!("  ✓ Golden fixture runner    (calldec test)");
    println!();
    println!("Supported types:             uint<M>, int<M>, address, bool, bytes<M>, function,");
    println!("                             bytes, string, T[k], T[], tuples");
    println!("Unknown selectors:           decoded as 'unknown' with no arguments");
    Ok(())
}
