use std::path::PathBuf;

use adx402::AspectRatio;
use clap::{Parser, Subcommand};

/// adx: command-line client for the Adx402 advertising network.
#[derive(Parser, Debug)]
#[command(name = "adx", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Print results as JSON instead of TSV
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prove ownership of the PRIVATE_KEY wallet and show its role
    Verify,

    /// Upload an ad creative as a brand (paid)
    UploadAd(UploadAdArgs),

    /// Register a publisher domain (paid)
    RegisterPublisher(RegisterPublisherArgs),

    /// Create an ad slot on a publisher site (paid)
    CreateSlot(CreateSlotArgs),

    /// Decode an X-PAYMENT-RESPONSE header value
    DecodeReceipt(DecodeReceiptArgs),
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::UploadAd(_) => "upload-ad",
            Self::RegisterPublisher(_) => "register-publisher",
            Self::CreateSlot(_) => "create-slot",
            Self::DecodeReceipt(_) => "decode-receipt",
        }
    }
}

/// Arguments for the `upload-ad` subcommand.
#[derive(Parser, Debug)]
pub struct UploadAdArgs {
    /// Image file (png, jpg, gif, webp, svg)
    pub file: PathBuf,

    /// Landing page the ad links to
    #[arg(long, default_value = "")]
    pub target_url: String,

    /// Comma-separated tags (e.g. "defi, nft")
    #[arg(long, default_value = "")]
    pub tags: String,
}

/// Arguments for the `register-publisher` subcommand.
#[derive(Parser, Debug)]
pub struct RegisterPublisherArgs {
    /// Site domain (e.g. news.example)
    pub domain: String,

    /// Comma-separated content tags
    #[arg(long, default_value = "")]
    pub tags: String,
}

/// Arguments for the `create-slot` subcommand.
#[derive(Parser, Debug)]
pub struct CreateSlotArgs {
    /// Slot identifier, unique per publisher
    pub slot_id: String,

    /// Comma-separated content tags
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Accepted aspect ratios (16x9, 1x1, 5x6, 4x3, auto)
    #[arg(long, value_delimiter = ',', default_value = "auto")]
    pub aspect_ratios: Vec<AspectRatio>,
}

/// Arguments for the `decode-receipt` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeReceiptArgs {
    /// Base64 header value
    pub header: String,
}
