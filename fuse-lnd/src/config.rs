use std::path::PathBuf;
use std::str::FromStr as _;

use clap::Args;
use fuse_lightning::bitcoin::Amount;
use fuse_lightning::Network;

/// Default lnd gRPC endpoint
pub const DEFAULT_LND_ADDRESS: &str = "localhost:10009";

/// Default routing fee ceiling for outgoing payments, in satoshis
pub const DEFAULT_MAX_FEE_SAT: u64 = 100;

/// How to reach lnd.
///
/// Every flag can also be set through the environment.
#[derive(Args, Clone, Debug)]
pub struct LndArgs {
    /// lnd gRPC address
    #[clap(long, env = "LND_ADDRESS", value_name = "HOST:PORT", default_value = DEFAULT_LND_ADDRESS)]
    pub lnd_address: String,

    /// Chain the node runs on
    #[clap(
        short,
        long,
        env = "LND_NETWORK",
        value_name = "NETWORK",
        default_value = "mainnet",
        value_parser = Network::from_str,
    )]
    pub network: Network,

    /// Admin macaroon
    #[clap(long, env = "LND_MACAROON_PATH", value_name = "FILE")]
    pub macaroon_path: PathBuf,

    /// lnd TLS certificate
    #[clap(long, env = "LND_TLS_PATH", value_name = "FILE")]
    pub tls_path: PathBuf,

    /// Maximum routing fee for outgoing payments
    #[clap(long, env = "LND_MAX_FEE_SAT", value_name = "SATS", default_value_t = DEFAULT_MAX_FEE_SAT)]
    pub max_fee_sat: u64,
}

impl LndArgs {
    /// Routing fee ceiling
    pub fn max_fee(&self) -> Amount {
        Amount::from_sat(self.max_fee_sat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use test_log::test;

    #[derive(Parser)]
    struct Cli {
        #[clap(flatten)]
        lnd: LndArgs,
    }

    #[test]
    fn defaults_test() {
        let cli = Cli::try_parse_from([
            "fuse",
            "--macaroon-path",
            "/tmp/admin.macaroon",
            "--tls-path",
            "/tmp/tls.cert",
        ])
        .unwrap();
        assert_eq!(cli.lnd.lnd_address, DEFAULT_LND_ADDRESS);
        assert_eq!(cli.lnd.network, Network::Mainnet);
        assert_eq!(cli.lnd.max_fee(), Amount::from_sat(100));
    }

    #[test]
    fn network_flag_test() {
        let cli = Cli::try_parse_from([
            "fuse",
            "--network",
            "regtest",
            "--macaroon-path",
            "m",
            "--tls-path",
            "t",
            "--max-fee-sat",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.lnd.network, Network::Regtest);
        assert_eq!(cli.lnd.max_fee_sat, 7);

        assert!(Cli::try_parse_from([
            "fuse",
            "--network",
            "dogecoin",
            "--macaroon-path",
            "m",
            "--tls-path",
            "t"
        ])
        .is_err());
    }
}
