//! Command implementations

use crate::console::{self, ConsoleNotifier};
use crate::Command;
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use signdev_client::{
    auth, status_label, ApiClient, AuditTrail, ClientConfig, Dashboard, EditorOptions,
    FileStorage, PdfFile, PreviewRegistry, PublicSigner, PublicSignerState, SessionStore,
    SignatureEditor,
};
use signdev_types::{Document, DocumentStatus};
use std::sync::Arc;

/// A placement given on the command line as `PAGE:X:Y`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceArg {
    pub page: u32,
    pub x: f64,
    pub y: f64,
}

pub fn parse_place(value: &str) -> std::result::Result<PlaceArg, String> {
    let parts: Vec<&str> = value.split(':').collect();
    let [page, x, y] = parts.as_slice() else {
        return Err(format!("expected PAGE:X:Y, got '{}'", value));
    };
    let page: u32 = page
        .trim()
        .parse()
        .map_err(|_| format!("invalid page number '{}'", page))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid x '{}'", x))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid y '{}'", y))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("coordinates must be finite, got '{}'", value));
    }
    Ok(PlaceArg { page, x, y })
}

#[derive(Args, Debug)]
pub struct SignatureArgs {
    /// Where to put the signature, as PAGE:X:Y from the top-left of the rendered page
    #[arg(long, required = true, value_parser = parse_place)]
    pub place: Vec<PlaceArg>,

    /// Signature text
    #[arg(long)]
    pub text: Option<String>,

    /// Signature font
    #[arg(long)]
    pub font: Option<String>,
}

impl SignatureArgs {
    fn apply(&self, editor: &mut SignatureEditor) -> Result<()> {
        if let Some(text) = &self.text {
            editor.set_text(text);
        }
        if let Some(font) = &self.font {
            editor.select_font(font)?;
        }
        for place in &self.place {
            editor
                .place(place.page, place.x, place.y)
                .with_context(|| format!("Cannot place on page {}", place.page))?;
        }
        Ok(())
    }
}

pub struct App {
    config: ClientConfig,
    session: Arc<SessionStore>,
    client: ApiClient,
    notifier: ConsoleNotifier,
    registry: PreviewRegistry,
}

impl App {
    pub fn open(config: ClientConfig) -> Result<Self> {
        let storage = FileStorage::new(config.session_path());
        let session = Arc::new(SessionStore::load(Box::new(storage)).context("Failed to load session")?);
        let client = ApiClient::new(&config, session.clone())?;
        Ok(Self {
            config,
            session,
            client,
            notifier: ConsoleNotifier,
            registry: PreviewRegistry::new(),
        })
    }

    fn editor_options(&self) -> EditorOptions {
        EditorOptions::from_config(&self.config)
    }

    fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.editor_options(), self.registry.clone())
    }

    fn require_login(&self) -> Result<()> {
        auth::require_session(&self.session)
            .map(|_| ())
            .map_err(|_| anyhow!("Not logged in. Run `signdev login` first."))
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login { email, password } => {
                let user =
                    auth::login(&self.client, &self.session, &self.notifier, &email, &password)
                        .await?;
                println!("Logged in as {} <{}>", user.name, user.email);
            }
            Command::Register {
                name,
                email,
                password,
            } => {
                auth::register(&self.client, &self.notifier, &name, &email, &password).await?;
            }
            Command::Reset { email } => {
                auth::request_reset(&self.client, &self.notifier, &email).await?;
            }
            Command::VerifyOtp {
                email,
                otp,
                new_password,
            } => {
                auth::verify_otp(&self.client, &self.notifier, &email, &otp, &new_password)
                    .await?;
            }
            Command::Logout => {
                self.session.logout()?;
                println!("Logged out");
            }
            Command::Whoami => match self.session.current() {
                Some(session) => match session.user {
                    Some(user) => println!("{} <{}>", user.name, user.email),
                    None => println!("Logged in"),
                },
                None => println!("Not logged in"),
            },
            Command::Docs => {
                self.require_login()?;
                let mut dashboard = self.dashboard();
                dashboard.refresh(&self.client).await;
                console::print_documents(&dashboard);
            }
            Command::Fonts => {
                for font in self.config.font_source.fonts() {
                    match &font.stylesheet_url {
                        Some(url) => println!("{:<16} {}", font.name, url),
                        None => println!("{}", font.name),
                    }
                }
            }
            Command::Sign { file, signature } => {
                self.require_login()?;
                let file = PdfFile::from_path(&file)?;
                let mut dashboard = self.dashboard();
                dashboard.accept_upload(Some(file), &self.notifier)?;
                let editor = dashboard
                    .upload_session_mut()
                    .ok_or_else(|| anyhow!("Upload was not accepted"))?;
                signature.apply(editor)?;
                let outcome = dashboard.save_upload(&self.client, &self.notifier).await?;
                println!("Document id: {}", outcome.document_id);
            }
            Command::SignExisting {
                document_id,
                signature,
            } => {
                self.require_login()?;
                let mut dashboard = self.dashboard();
                dashboard.refresh(&self.client).await;
                let doc = find_document(&dashboard, &document_id);
                dashboard
                    .start_signing(&self.client, &self.notifier, &doc)
                    .await?;
                let session = dashboard
                    .signing_mut()
                    .ok_or_else(|| anyhow!("Signing session did not open"))?;
                signature.apply(&mut session.editor)?;
                dashboard.save_signing(&self.client, &self.notifier).await?;
            }
            Command::View { document_id } => {
                self.require_login()?;
                let mut dashboard = self.dashboard();
                println!("{}", dashboard.inline_view_url(&self.client, &document_id));
                dashboard.open_inline(&self.client, &document_id).await;
                console::print_audit(dashboard.audit_trail());
            }
            Command::Audit { document_id } => {
                self.require_login()?;
                let mut trail = AuditTrail::new();
                trail.load(&self.client, &document_id).await;
                console::print_audit(&trail);
            }
            Command::Share {
                document_id,
                recipient_email,
            } => {
                self.require_login()?;
                let mut dashboard = self.dashboard();
                dashboard.refresh(&self.client).await;
                let doc = find_document(&dashboard, &document_id);
                dashboard.open_share(&doc);
                dashboard.set_recipient_email(&recipient_email);
                if !dashboard.send_share(&self.client, &self.notifier).await? {
                    bail!("A recipient email is required");
                }
            }
            Command::PublicSign { token, signature } => {
                let mut signer = PublicSigner::new(&token);
                let state = signer
                    .resolve(&self.client, &self.registry, self.editor_options())
                    .await;
                if let PublicSignerState::Failed(message) = state {
                    bail!("{}", message);
                }
                if let Some(signing) = signer.signing() {
                    println!("Signing: {}", signing.file_name);
                }
                let editor = signer
                    .editor_mut()
                    .ok_or_else(|| anyhow!("Share link did not resolve"))?;
                signature.apply(editor)?;
                signer.save(&self.client, &self.notifier).await?;
            }
        }
        Ok(())
    }
}

/// The listed document with this id, or a bare stand-in when the list lacks it
fn find_document(dashboard: &Dashboard, id: &str) -> Document {
    dashboard
        .documents()
        .iter()
        .find(|d| d.id == id)
        .cloned()
        .unwrap_or_else(|| Document {
            id: id.to_string(),
            file_name: format!("{}.pdf", id),
            status: DocumentStatus::Pending,
            owner: None,
        })
}

/// Status column text
pub fn status_column(doc: &Document) -> String {
    format!("[{}]", status_label(doc))
}
