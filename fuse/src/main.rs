use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use log::*;
use url::Url;

use fuse::fuse_lightning::bitcoin::Amount;
use fuse::fuse_lightning::lnurl::Metadata;
use fuse::fuse_lightning::{Invoice, LightningProvider, MilliSatoshi, Vertex};
use fuse::fuse_lnd::{LndArgs, LndProvider};
use fuse::responses::*;
use fuse::util::setup_logging;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(flatten)]
    lnd: LndArgs,

    #[clap(
        long,
        help = "set the logging level",
        value_name = "LEVEL",
        default_value = "info",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"],
    )]
    log_level: String,

    #[clap(long, help = "directory for the log file", value_name = "DIR", default_value = ".fuse")]
    datadir: String,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Confirmed on-chain balance
    #[clap(name = "balance")]
    Balance,
    /// Issue or inspect invoices
    #[clap(name = "invoice")]
    Invoice(InvoiceArgs),
    /// Pay an invoice
    #[clap(name = "pay")]
    Pay { invoice: String },
    /// Manage peers
    #[clap(name = "peer")]
    Peer(PeerArgs),
    /// Manage channels
    #[clap(name = "channel")]
    Channel(ChannelArgs),
    /// LNURL-pay payloads
    #[clap(name = "lnurlp")]
    Lnurlp(LnurlpArgs),
}

#[derive(Args)]
struct InvoiceArgs {
    #[clap(subcommand)]
    command: InvoiceCommands,
}

#[derive(Subcommand)]
enum InvoiceCommands {
    /// Create an invoice for an amount in millisatoshis
    #[clap(name = "new")]
    New {
        msat: u64,
        #[clap(long, default_value = "")]
        memo: String,
        #[clap(long, value_name = "HEX", help = "commit to this hash instead of the memo")]
        description_hash: Option<String>,
    },
    /// Decode a payment request for the configured network
    #[clap(name = "decode")]
    Decode { invoice: String },
}

#[derive(Args)]
struct PeerArgs {
    #[clap(subcommand)]
    command: PeerCommands,
}

#[derive(Subcommand)]
enum PeerCommands {
    /// Connected peers
    #[clap(name = "list")]
    List,
    /// Connect to PUBKEY@HOST:PORT
    #[clap(name = "connect")]
    Connect { address: String },
}

#[derive(Args)]
struct ChannelArgs {
    #[clap(subcommand)]
    command: ChannelCommands,
}

#[derive(Subcommand)]
enum ChannelCommands {
    /// Open a channel funded with SAT satoshis
    #[clap(name = "new")]
    New {
        #[clap(value_parser = Vertex::from_str)]
        pubkey: Vertex,
        sat: u64,
        #[clap(long, default_value_t = 0)]
        push: u64,
        #[clap(long)]
        private: bool,
    },
    /// List channels
    #[clap(name = "list")]
    List {
        #[clap(long)]
        active_only: bool,
        #[clap(long)]
        public_only: bool,
    },
}

#[derive(Args)]
struct LnurlpArgs {
    #[clap(subcommand)]
    command: LnurlpCommands,
}

#[derive(Subcommand)]
enum LnurlpCommands {
    /// The pay-parameters response for a text/plain description
    #[clap(name = "params")]
    Params { callback: Url, min: i64, max: i64, text: String },
    /// The callback response, with an invoice committing to the description
    #[clap(name = "callback")]
    Callback { msat: u64, text: String },
    /// The LUD-01 code for an LNURL-pay endpoint
    #[clap(name = "code")]
    Code { url: Url },
}

fn dump_response<R: Render>(response: &R) -> anyhow::Result<()> {
    println!("{}", response.render_pretty()?);
    Ok(())
}

async fn connect(args: &LndArgs) -> anyhow::Result<Arc<dyn LightningProvider>> {
    let provider = LndProvider::connect(args).await.context("connecting to lnd")?;
    Ok(Arc::new(provider))
}

fn parse_peer_address(address: &str) -> anyhow::Result<(Vertex, String)> {
    let (pubkey, host) =
        address.split_once('@').ok_or_else(|| anyhow!("expected PUBKEY@HOST, got {}", address))?;
    Ok((pubkey.parse()?, host.to_string()))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Balance => {
            let provider = connect(&cli.lnd).await?;
            dump_response(&WalletBalanceResponse::new(provider.wallet_balance().await?))
        }
        Commands::Invoice(InvoiceArgs { command: InvoiceCommands::New { msat, memo, description_hash } }) => {
            let hash = match description_hash {
                Some(h) => hex::decode(h).context("description hash")?,
                None => Vec::new(),
            };
            let provider = connect(&cli.lnd).await?;
            let invoice = provider.add_invoice(MilliSatoshi(msat), &memo, &hash).await?;
            dump_response(&CreateInvoiceResponse::new(&invoice))
        }
        Commands::Invoice(InvoiceArgs { command: InvoiceCommands::Decode { invoice } }) => {
            let invoice = Invoice::decode(&invoice, cli.lnd.network)?;
            println!("{:#?}", invoice);
            Ok(())
        }
        Commands::Pay { invoice } => {
            let provider = connect(&cli.lnd).await?;
            let invoice = Invoice::decode(&invoice, provider.network())?;
            let result = provider.pay_invoice(&invoice).await?;
            dump_response(&PayResponse::new(&result))
        }
        Commands::Peer(PeerArgs { command: PeerCommands::List }) => {
            let provider = connect(&cli.lnd).await?;
            dump_response(&ListPeersResponse::new(&provider.list_peers().await?))
        }
        Commands::Peer(PeerArgs { command: PeerCommands::Connect { address } }) => {
            let (pubkey, host) = parse_peer_address(&address)?;
            let provider = connect(&cli.lnd).await?;
            provider.connect_peer(pubkey, &host).await?;
            info!("connected to {}", address);
            Ok(())
        }
        Commands::Channel(ChannelArgs { command: ChannelCommands::New { pubkey, sat, push, private } }) => {
            let provider = connect(&cli.lnd).await?;
            let (txid, index) = provider
                .open_channel(pubkey, Amount::from_sat(sat), Amount::from_sat(push), private)
                .await?;
            dump_response(&OpenChannelResponse::new(txid, index))
        }
        Commands::Channel(ChannelArgs {
            command: ChannelCommands::List { active_only, public_only },
        }) => {
            let provider = connect(&cli.lnd).await?;
            let channels = provider.list_channels(active_only, public_only).await?;
            dump_response(&ListChannelsResponse::new(&channels))
        }
        Commands::Lnurlp(LnurlpArgs { command: LnurlpCommands::Params { callback, min, max, text } }) => {
            let metadata = Metadata::text(&text);
            dump_response(&LnurlPayResponse::new(
                callback.as_str(),
                min,
                max,
                &metadata,
                PAY_REQUEST_TAG,
            ))
        }
        Commands::Lnurlp(LnurlpArgs { command: LnurlpCommands::Callback { msat, text } }) => {
            let metadata = Metadata::text(&text);
            let provider = connect(&cli.lnd).await?;
            let invoice = provider
                .add_invoice(MilliSatoshi(msat), "", &metadata.description_hash())
                .await?;
            dump_response(&LnurlPayCallbackResponse::new(&invoice))
        }
        Commands::Lnurlp(LnurlpArgs { command: LnurlpCommands::Code { url } }) => {
            dump_response(&LnurlpCodeResponse::new(url.as_str())?)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.datadir, "fuse", &cli.log_level)?;
    let result = run(cli).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
