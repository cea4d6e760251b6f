//! CLI module - Command-line interface for qrpromo
//!
//! Structured CLI using clap. Every subcommand goes through the same
//! services as the HTTP API.

mod commands;

use clap::{Parser, Subcommand};

/// qrpromo - single-use promotional codes with QR rendering
#[derive(Debug, Parser)]
#[command(name = "qrpromo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the web console and API (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Generate new promotional codes
    #[command(alias = "gen")]
    Generate {
        /// How many codes to create
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=1000))]
        count: u32,
    },

    /// List promotional codes
    #[command(alias = "ls")]
    List {
        /// Only `used` or `unused` codes
        #[arg(long)]
        status: Option<String>,
        /// Substring the code must contain
        #[arg(long)]
        search: Option<String>,
        /// Sort order: created_desc, created_asc, code_asc, code_desc
        #[arg(long, default_value = "created_desc")]
        sort: String,
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },

    /// Validate and redeem a code
    Redeem {
        /// Code to redeem (case-insensitive)
        code: String,
    },

    /// Show usage statistics
    Stats,
}

pub use commands::*;
