//! # Command-Line Interface
//!
//! One subcommand per mutation operation. The CLI is the plain-data
//! boundary of the tool: names, methods, paths and values arrive as
//! arguments, and every operation runs as a single read-modify-write pass
//! over the project in the current (or `--project`) directory.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scaffold and incrementally edit AWS SAM projects
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Show a diff of the template change
    #[arg(long, global = true)]
    pub diff: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a new project with its first Lambda
    Init {
        /// Project name; also names the first Lambda
        name: String,
        /// Timeout in seconds for the first Lambda
        #[arg(long, default_value_t = 30)]
        timeout: u32,
        /// Environment variables (from .env) to wire into the first Lambda
        #[arg(long = "env-var")]
        env_vars: Vec<String>,
        /// Skip the default gateway and /hello endpoint
        #[arg(long)]
        no_gateway: bool,
    },
    /// Manage Lambda functions
    Lambda {
        #[command(subcommand)]
        command: LambdaCommand,
    },
    /// Manage API Gateway endpoints
    Endpoint {
        #[command(subcommand)]
        command: EndpointCommand,
    },
    /// Manage API Gateways
    Gateway {
        #[command(subcommand)]
        command: GatewayCommand,
    },
    /// Manage Lambda layers
    Layer {
        #[command(subcommand)]
        command: LayerCommand,
    },
    /// Manage DynamoDB tables
    Table {
        #[command(subcommand)]
        command: TableCommand,
    },
    /// Manage gateway authorization
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Manage environment variables
    Env {
        #[command(subcommand)]
        command: EnvCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum LambdaCommand {
    /// Add a Lambda with its log group and handler sources
    Add {
        name: String,
        #[arg(long, default_value_t = 30)]
        timeout: u32,
        /// Environment variables (from .env) to wire in
        #[arg(long = "env-var")]
        env_vars: Vec<String>,
    },
    /// Delete a Lambda, its log group and its sources
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum EndpointCommand {
    /// Bind a method + path on a gateway to a Lambda
    Add {
        #[arg(long)]
        api: String,
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        method: String,
        #[arg(long)]
        path: String,
    },
    /// Rewrite an existing binding, optionally moving it to another Lambda
    Update {
        #[arg(long)]
        api: String,
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        event: String,
        /// Move the endpoint to this Lambda
        #[arg(long)]
        to_lambda: Option<String>,
        #[arg(long)]
        method: String,
        #[arg(long)]
        path: String,
    },
    /// Remove a binding
    Delete {
        #[arg(long)]
        api: String,
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        event: String,
    },
    /// List bindings, optionally for one gateway
    List {
        #[arg(long)]
        api: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum GatewayCommand {
    /// Create a gateway and its Url output
    Add { name: String },
    /// Delete a gateway, cascading over endpoints and outputs
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum LayerCommand {
    /// Create a layer and its sources
    Add { name: String },
    /// Delete a layer (refused while attached to any Lambda)
    Delete { name: String },
    /// Attach a layer to a Lambda
    Attach {
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        layer: String,
    },
    /// Detach a layer from a Lambda
    Detach {
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        layer: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TableCommand {
    /// Create a table, its access policy and its helper sources
    Add {
        name: String,
        /// Primary key path: 'partition' or 'partition#sort'
        #[arg(long)]
        key: String,
    },
    /// Delete a table (refused while attached to any Lambda)
    Delete { name: String },
    /// Grant a Lambda access to a table
    Attach {
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        table: String,
    },
    /// Revoke a Lambda's access to a table
    Detach {
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        table: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Protect a gateway with the shared basic authorizer
    Basic { api: String },
    /// Protect a gateway with a new Cognito user pool
    Cognito {
        api: String,
        #[arg(long)]
        pool: String,
    },
    /// Remove a gateway's Auth block (and unused shared pieces)
    Remove { api: String },
}

#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// Reconcile the template with .env (new / changed / removed)
    Sync {
        /// Confirm removal of variables missing from .env
        #[arg(long)]
        yes: bool,
    },
    /// Wire a synced variable into a Lambda
    Add {
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        key: String,
    },
    /// Unwire a variable from a Lambda
    Remove {
        #[arg(long)]
        lambda: String,
        #[arg(long)]
        key: String,
    },
}
