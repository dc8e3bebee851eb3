//! SignDev command-line client

mod commands;
mod console;

use anyhow::Context;
use clap::{Parser, Subcommand};
use signdev_client::ClientConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "signdev")]
#[command(version, about = "Sign PDF documents with a SignDev server")]
struct Cli {
    /// API root, e.g. http://localhost:5000/api/
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory holding the saved session
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Signature fonts on offer: web or system
    #[arg(long, global = true)]
    font_source: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Email a password reset code
    Reset {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with an emailed code
    VerifyOtp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
        #[arg(long)]
        new_password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List your documents
    Docs,
    /// List the signature fonts on offer
    Fonts,
    /// Upload a new PDF with signatures placed on it
    Sign {
        file: PathBuf,
        #[command(flatten)]
        signature: commands::SignatureArgs,
    },
    /// Sign a stored document, replacing it
    SignExisting {
        document_id: String,
        #[command(flatten)]
        signature: commands::SignatureArgs,
    },
    /// Show a document's view URL and audit trail
    View { document_id: String },
    /// Show a document's audit trail
    Audit { document_id: String },
    /// Email someone a link to sign a document
    Share {
        document_id: String,
        recipient_email: String,
    },
    /// Sign a document through a share link token
    PublicSign {
        token: String,
        #[command(flatten)]
        signature: commands::SignatureArgs,
    },
}

impl Cli {
    fn config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::from_env().context("Invalid SIGNDEV_* environment")?;
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        if let Some(source) = &self.font_source {
            config = config.with_font_source(source.parse()?);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Notices go to stdout; logs stay on stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config()?;
    tracing::debug!(base_url = %config.base_url, data_dir = %config.data_dir.display(), "Loaded configuration");

    let app = commands::App::open(config)?;
    app.run(cli.command).await
}
