//! CLI module - Command-line interface for Habitrack
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Habitrack - habit tracker with Telegram reminders
#[derive(Parser)]
#[command(name = "habitrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web API and the reminder scheduler
    #[command(alias = "daemon", alias = "-d")]
    Serve,

    /// Run a single reminder sweep and exit
    #[command(alias = "check")]
    Notify,

    /// Write a default config.toml
    #[command(alias = "--init")]
    Init,

    /// Create an account with staff rights
    CreateStaff {
        email: String,
        password: String,
        /// Telegram username, with or without the leading @
        tg_username: String,
    },
}

pub use commands::*;
