//! CLI module - Command-line interface for siteadmin
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// siteadmin - admin panel authentication service
#[derive(Parser)]
#[command(name = "siteadmin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Create default config file
    Init,

    /// Manage admin identities
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Manage login sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create a new admin identity
    Create {
        /// Username (case-sensitive, cannot be changed later)
        username: String,
        /// Initial password
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Delete sessions that have already expired
    Prune,
}

pub use commands::*;
