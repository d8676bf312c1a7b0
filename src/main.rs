mod cli;
mod error;
mod output;

use std::sync::Arc;

use adx402::utils::{parse_list, shorten_address};
use adx402::{
    AdUpload, Adx402, Adx402Config, KeypairWallet, PaymentReceipt, SubmissionState,
    SubmissionTracker, SubmitOptions, WalletSession,
};
use clap::Parser;
use cli::{Cli, Command};
use error::CliError;
use output::Outcome;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG, when set, takes precedence over --log-level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let _ = dotenvy::dotenv();

    let config = match Adx402Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    info!(api = %config.api_base_url, network = %config.network, "adx starting");

    let flow = cli.command.name();
    if let Err(e) = run(cli.command, cli.json, config).await {
        error!(flow, error = %e, "{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(command: Command, json: bool, config: Adx402Config) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();

    if let Command::DecodeReceipt(args) = &command {
        let receipt = PaymentReceipt::decode(&args.header)?;
        let url = Adx402::new(config).settlement_url(&receipt.transaction);
        output::write_receipt(&mut stdout, &receipt, &url, json)?;
        return Ok(());
    }

    let wallet = load_wallet()?;
    let mut session = WalletSession::connected(&wallet.pubkey());
    let client = Adx402::with_wallet(config, wallet.clone());

    let flow = command.name();
    let tracker = SubmissionTracker::new();
    tokio::spawn(log_progress(tracker.subscribe()));
    let opts = SubmitOptions {
        abort: Some(abort_on_signal(flow)),
        progress: Some(tracker),
    };

    match command {
        Command::Verify => {
            let role = client.verify_wallet(&mut session, &*wallet).await?;
            let address = shorten_address(&wallet.pubkey().to_string());
            output::write_verified(&mut stdout, &address, role, json)?;
        }

        Command::UploadAd(args) => {
            let ad = AdUpload::from_path(&args.file, &args.target_url, parse_list(&args.tags))
                .await?;
            let resp = client.upload_ad(&session, &ad, &opts).await?;
            let url = resp.settlement_id().map(|tx| client.settlement_url(tx));
            output::write_outcome(
                &mut stdout,
                &Outcome {
                    action: flow,
                    message: &resp.body.message,
                    id: Some(&resp.body.image_url),
                    settlement: resp.settlement_id(),
                    explorer_url: url.as_deref(),
                },
                json,
            )?;
        }

        Command::RegisterPublisher(args) => {
            let resp = client
                .register_publisher(&session, &args.domain, parse_list(&args.tags), &opts)
                .await?;
            let url = resp.settlement_id().map(|tx| client.settlement_url(tx));
            output::write_outcome(
                &mut stdout,
                &Outcome {
                    action: flow,
                    message: &resp.body.message,
                    id: resp.body.publisher_id.as_deref(),
                    settlement: resp.settlement_id(),
                    explorer_url: url.as_deref(),
                },
                json,
            )?;
        }

        Command::CreateSlot(args) => {
            let resp = client
                .create_slot(
                    &session,
                    &args.slot_id,
                    parse_list(&args.tags),
                    args.aspect_ratios,
                    &opts,
                )
                .await?;
            let url = resp.settlement_id().map(|tx| client.settlement_url(tx));
            output::write_outcome(
                &mut stdout,
                &Outcome {
                    action: flow,
                    message: &resp.body.message,
                    id: resp.body.slot_id.as_deref(),
                    settlement: resp.settlement_id(),
                    explorer_url: url.as_deref(),
                },
                json,
            )?;
        }

        Command::DecodeReceipt(_) => {}
    }

    Ok(())
}

fn load_wallet() -> Result<Arc<KeypairWallet>, CliError> {
    let private_key = std::env::var("PRIVATE_KEY").map_err(|_| CliError::MissingPrivateKey)?;
    let wallet = KeypairWallet::from_private_key(&private_key)?;
    info!(wallet = %shorten_address(&wallet.pubkey().to_string()), "wallet loaded");
    Ok(Arc::new(wallet))
}

/// Log submission phase changes until the tracker is dropped.
async fn log_progress(mut rx: watch::Receiver<SubmissionState>) {
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        match state {
            SubmissionState::Signing => info!("waiting for wallet signature"),
            SubmissionState::Submitting => info!("submitting"),
            other => debug!(state = ?other, "submission state"),
        }
    }
}

/// Token that fires on Ctrl-C or SIGTERM. A pending wallet prompt or
/// in-flight request for `flow` then resolves as cancelled.
fn abort_on_signal(flow: &'static str) -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        let signal = tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = terminated() => "SIGTERM",
        };
        warn!(flow, signal, "aborting");
        token.cancel();
    });
    cancel
}

#[cfg(unix)]
async fn terminated() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sig) => {
            sig.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending::<()>().await;
}
