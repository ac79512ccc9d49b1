//! satchel: command-line driver for address derivation, script decoding,
//! address validation, and UTXO selection.

mod config;

use std::io::BufRead;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

use satchel_core::address::{Address, AddressFormat, Network, is_valid_base58};
use satchel_core::script::decode_script_for;
use satchel_wallet::{
    ChildNumber, HttpUtxoSource, UtxoSelector, derive_address_for, derive_public_key,
    path_for_format,
};

/// Multi-format Bitcoin address engine.
#[derive(Parser)]
#[command(name = "satchel")]
#[command(version, about = "Derive, decode, and validate Bitcoin addresses; select UTXOs.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive an address from a mnemonic.
    Derive(DeriveArgs),
    /// Decode a hex output script to an address.
    DecodeScript(DecodeScriptArgs),
    /// Check whether an address string is valid.
    Validate(ValidateArgs),
    /// Select spendable UTXOs for an address.
    SelectUtxos(SelectArgs),
}

#[derive(Args)]
struct DeriveArgs {
    /// Mnemonic phrase. Read from stdin when omitted.
    #[arg(short, long, env = "SATCHEL_MNEMONIC", hide_env_values = true)]
    mnemonic: Option<String>,

    /// Address format (P2PKH, P2SH-P2WPKH, P2WPKH, P2TR, Counterwallet, CounterwalletSegwit).
    #[arg(short, long, default_value = "P2WPKH")]
    format: String,

    /// Full derivation path. Defaults to the format's account path plus `--index`.
    #[arg(short, long)]
    path: Option<String>,

    /// Address index appended to the default path.
    #[arg(short, long, default_value_t = 0)]
    index: u32,

    /// Network (mainnet or testnet).
    #[arg(short, long, default_value = "mainnet")]
    network: String,

    /// Print JSON including the public key.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DecodeScriptArgs {
    /// Hex-encoded scriptPubKey.
    script: String,

    /// Network (mainnet or testnet).
    #[arg(short, long, default_value = "mainnet")]
    network: String,
}

#[derive(Args)]
struct ValidateArgs {
    address: String,
}

#[derive(Args)]
struct SelectArgs {
    address: String,

    /// Override SATCHEL_MAX_UTXOS.
    #[arg(long)]
    max_utxos: Option<usize>,

    /// Override SATCHEL_MIN_UTXOS.
    #[arg(long)]
    min_utxos: Option<usize>,

    /// Include mempool outputs.
    #[arg(long)]
    allow_unconfirmed: bool,

    /// Override SATCHEL_ESPLORA_URL.
    #[arg(long)]
    esplora_url: Option<String>,

    /// Override SATCHEL_COUNTERPARTY_URL.
    #[arg(long)]
    counterparty_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Derive(args) => derive(args),
        Commands::DecodeScript(args) => decode(args),
        Commands::Validate(args) => validate(args),
        Commands::SelectUtxos(args) => select(args).await,
    }
}

fn derive(args: DeriveArgs) -> Result<()> {
    let format: AddressFormat = args.format.parse()?;
    let network = parse_network(&args.network)?;

    let path = match args.path {
        Some(p) => p,
        None => path_for_format(format)
            .child(ChildNumber::normal(args.index)?)
            .to_string(),
    };

    let mnemonic = match args.mnemonic {
        Some(m) => m,
        None => read_stdin_line().context("Failed to read mnemonic from stdin")?,
    };

    let address = derive_address_for(network, &mnemonic, &path, format)
        .with_context(|| format!("Failed to derive {format} address at {path}"))?;

    if args.json {
        let pubkey = derive_public_key(&mnemonic, &path, format)?;
        let out = json!({
            "format": format,
            "path": path,
            "network": network_name(network),
            "public_key": pubkey.to_string(),
            "address": address,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{address}");
    }
    Ok(())
}

fn decode(args: DecodeScriptArgs) -> Result<()> {
    let network = parse_network(&args.network)?;
    match decode_script_for(&args.script, network) {
        Some(address) => {
            println!("{address}");
            Ok(())
        }
        None => bail!("Not a standard P2PKH/P2SH/P2WPKH/P2TR output script"),
    }
}

fn validate(args: ValidateArgs) -> Result<()> {
    match Address::decode(&args.address) {
        Ok(address) => {
            let kind = match address.payload() {
                satchel_core::Payload::PubkeyHash(_) => "P2PKH",
                satchel_core::Payload::ScriptHash(_) => "P2SH",
                satchel_core::Payload::WitnessV0KeyHash(_) => "P2WPKH",
                satchel_core::Payload::Taproot(_) => "P2TR",
            };
            println!("valid {kind} ({})", network_name(address.network()));
            Ok(())
        }
        Err(e) => {
            let hint = if is_valid_base58(&args.address) {
                " (Base58 characters and length are fine; checksum or version is not)"
            } else {
                ""
            };
            bail!("Invalid address: {e}{hint}")
        }
    }
}

async fn select(args: SelectArgs) -> Result<()> {
    let mut config = config::Config::from_env()?;
    if let Some(url) = args.esplora_url {
        config.esplora_url = url;
    }
    if let Some(url) = args.counterparty_url {
        config.counterparty_url = url;
    }
    if let Some(max) = args.max_utxos {
        config.max_utxos = max;
    }
    if let Some(min) = args.min_utxos {
        config.min_utxos = min;
    }

    info!(
        esplora = %config.esplora_url,
        counterparty = %config.counterparty_url,
        address = %args.address,
        "Selecting UTXOs"
    );

    let source = HttpUtxoSource::new(config.http_source()).context("Failed to build HTTP client")?;
    let selector_config = config.selector(args.allow_unconfirmed);
    selector_config
        .validate()
        .context("Invalid --max-utxos/--min-utxos combination")?;
    let selector = UtxoSelector::new(selector_config);
    let selection = selector
        .select(&source, &args.address)
        .await
        .with_context(|| format!("UTXO selection failed for {}", args.address))?;

    let out = json!({
        "inputs_set": selection.inputs_set(),
        "count": selection.len(),
        "total_value": selection.total_value,
        "excluded_with_assets": selection.excluded_with_assets,
        "utxos": selection.utxos,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        bail!("Empty mnemonic");
    }
    Ok(trimmed.to_string())
}

/// Parse a network name string.
fn parse_network(s: &str) -> Result<Network> {
    match s.to_lowercase().as_str() {
        "mainnet" => Ok(Network::Mainnet),
        "testnet" => Ok(Network::Testnet),
        _ => bail!("Invalid network (must be 'mainnet' or 'testnet')"),
    }
}

/// Human-readable network name.
fn network_name(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "Mainnet",
        Network::Testnet => "Testnet",
    }
}
