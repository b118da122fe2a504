//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Sync drawing strokes from a local file to a remote surface store
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: strokesync.toml)
    #[arg(
        short = 'C',
        long,
        default_value = "strokesync.toml",
        value_hint = clap::ValueHint::FilePath
    )]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub auth: AuthArgs,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Credentials for commands that talk to protected routes.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Account email (overrides `auth.email`)
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Account password (overrides `auth.password`)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Use an existing ID token instead of signing in
    #[arg(long, global = true, requires = "user_id")]
    pub token: Option<String>,

    /// User id the token belongs to
    #[arg(long, global = true, requires = "token")]
    pub user_id: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create an account, then sign in
    Register {
        /// Account display name
        #[arg(long)]
        name: String,
    },

    /// Sign in and print the user id
    SignIn,

    /// Register or list surfaces
    #[command(visible_alias = "sf")]
    Surface {
        #[command(subcommand)]
        action: SurfaceCommand,
    },

    /// Send or read back strokes
    #[command(visible_alias = "st")]
    Stroke {
        #[command(subcommand)]
        action: StrokeCommand,
    },

    /// Watch the stroke file and sync every change until Ctrl+C
    #[command(visible_alias = "w")]
    Watch {
        /// Sync to an existing surface instead of registering a new one
        #[arg(short, long)]
        surface: Option<String>,

        /// Directory containing the stroke file (overrides `watch.dir`)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,

        /// Stroke file name (overrides `watch.file`)
        #[arg(short, long)]
        file: Option<String>,

        /// Attribution name for sent strokes
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SurfaceCommand {
    /// Register a surface built from `[surface]` and print its uid
    Create {
        /// Client-side id (default: prefix plus a random 4-digit suffix)
        #[arg(long)]
        local_id: Option<String>,
    },

    /// List every surface in the store
    List,
}

#[derive(Subcommand, Debug, Clone)]
pub enum StrokeCommand {
    /// Decode strokes and send each one to a surface
    Send {
        /// Target surface uid
        #[arg(short, long)]
        surface: String,

        #[command(flatten)]
        input: StrokeInput,

        /// Attribution name for sent strokes
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Read back strokes a user drew on a surface
    List {
        /// Surface uid
        #[arg(short, long)]
        surface: String,

        /// User id (default: the signed-in user)
        #[arg(short, long)]
        user: Option<String>,
    },
}

/// Raw stroke payload, inline or from a file.
#[derive(clap::Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct StrokeInput {
    /// JSON object or array of strokes
    #[arg(long)]
    pub json: Option<String>,

    /// File containing a JSON object or array of strokes
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub file: Option<PathBuf>,
}
