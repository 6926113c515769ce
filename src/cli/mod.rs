//! CLI module - Command-line interface for chamcong
//!
//! Operator commands act on the local database; client commands talk to a
//! running portal over HTTP.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Role;

/// chamcong - attendance and order portal backend
#[derive(Parser)]
#[command(name = "chamcong")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    #[command(alias = "web")]
    Serve {
        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create default config file with a generated token secret
    #[command(alias = "--init")]
    Init,

    /// Create a portal account
    CreateUser {
        username: String,
        email: String,
        /// Display name
        name: String,
        #[arg(long, default_value = "viewer")]
        role: Role,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Enable or disable an account by username or email
    SetActive {
        identifier: String,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },

    /// Change an account's role
    SetRole { identifier: String, role: Role },

    /// List accounts
    #[command(alias = "ls")]
    Users,

    /// Log in to a portal and store the session token
    Login {
        /// Username or email
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
        /// Override `client.server_url`
        #[arg(long)]
        server: Option<String>,
    },

    /// Verify the stored token and show the resulting session
    Status {
        #[arg(long)]
        server: Option<String>,
    },

    /// Forget the stored session token
    Logout,
}

pub use commands::*;
