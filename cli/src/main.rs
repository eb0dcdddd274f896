use std::process::ExitCode;

use clap::{Parser, Subcommand};
use oakcan::config::ConfigError;
use oakcan::net::types::ItemView;
use oakcan::util::forms::{self, Feedback, FormKind};
use oakcan::{ClientConfig, ClientError, HttpTransport, JarTokenStore, SessionService};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("{field}: {message}")]
    Field { field: &'static str, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("signed in, but the home folder is unavailable; pass a folder id")]
    NoHomeFolder,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CliError {
    /// Attribute a login/registration failure the way the forms would.
    fn from_form(form: FormKind, error: ClientError) -> Self {
        if !matches!(error, ClientError::Api(_)) {
            return Self::Client(error);
        }
        match forms::map_client_error(form, &error) {
            Feedback::Field { field, message } => Self::Field { field, message },
            Feedback::Banner(message) => Self::Rejected(message),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "oakcan", about = "Oakcan file storage CLI")]
struct Cli {
    /// Overrides `OAKCAN_API_BASE_URL` from the environment or `.env`.
    #[arg(long)]
    base_url: Option<String>,

    /// Cookies from a previous `login`, as `name=value`.
    #[arg(long = "cookie", env = "OAKCAN_COOKIES", value_delimiter = ';')]
    cookies: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current session.
    Whoami,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    ResendVerification {
        #[arg(long)]
        email: String,
    },
    /// Print the Google sign-in redirect URL.
    GoogleUrl,
    /// List a folder; defaults to the home folder.
    Ls {
        folder_id: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    Mkdir {
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    Rename {
        item_id: String,
        name: String,
    },
    /// Print a presigned upload URL for a file name.
    Presign {
        file_name: String,
    },
}

struct CliContext {
    service: SessionService,
    jar: JarTokenStore,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = connect(cli.base_url.as_deref(), &cli.cookies)?;

    match cli.command {
        Command::Whoami => run_whoami(&ctx).await,
        Command::Login { email, password } => run_login(&ctx, &email, &password).await,
        Command::Logout => {
            ctx.service.logout().await?;
            println!("logged out");
            Ok(())
        }
        Command::Register { name, email, password } => run_register(&ctx, &name, &email, &password).await,
        Command::ResendVerification { email } => {
            ctx.service.store().set_pending_verification_email(&email);
            ctx.service.resend_verification().await?;
            println!("verification email sent to {email}");
            Ok(())
        }
        Command::GoogleUrl => {
            println!("{}", ctx.service.google_sign_in_url().await?);
            Ok(())
        }
        Command::Ls { folder_id, password } => run_ls(&ctx, folder_id, password.as_deref()).await,
        Command::Mkdir { name, parent } => run_mkdir(&ctx, &name, parent).await,
        Command::Rename { item_id, name } => {
            let name = forms::validate_item_name(&name).map_err(ClientError::from)?;
            println!("{}", ctx.service.api().rename(&item_id, name).await?);
            Ok(())
        }
        Command::Presign { file_name } => {
            println!("{}", ctx.service.api().presigned_upload_url(&file_name).await?);
            Ok(())
        }
    }
}

fn connect(base_url: Option<&str>, cookies: &[String]) -> Result<CliContext, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = base_url {
        config = config.with_base_url(url)?;
    }

    let transport = HttpTransport::new(&config).map_err(ClientError::from)?;
    for cookie in cookies.iter().map(String::as_str).map(str::trim).filter(|c| !c.is_empty()) {
        transport.seed_cookie(cookie);
    }
    let jar = transport.token_store();
    let service = oakcan::assemble(&config, transport);
    Ok(CliContext { service, jar })
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    let session = ctx.service.ensure_session().await?;
    print_json(&serde_json::to_value(&session)?)
}

async fn run_login(ctx: &CliContext, email: &str, password: &str) -> Result<(), CliError> {
    let session = ctx
        .service
        .login(email, password)
        .await
        .map_err(|e| CliError::from_form(FormKind::Login, e))?;

    if let Some(user) = &session.authenticated_user {
        eprintln!("signed in as {} <{}>", user.full_name, user.email);
    }
    if let Some(cookies) = ctx.jar.cookie_header() {
        println!("OAKCAN_COOKIES=\"{cookies}\"");
    }
    Ok(())
}

async fn run_register(ctx: &CliContext, name: &str, email: &str, password: &str) -> Result<(), CliError> {
    let registered = ctx
        .service
        .register(name, email, password)
        .await
        .map_err(|e| CliError::from_form(FormKind::Register, e))?;
    println!("registered {}; check your inbox to verify", registered.email);
    Ok(())
}

async fn run_ls(ctx: &CliContext, folder_id: Option<String>, password: Option<&str>) -> Result<(), CliError> {
    let folder_id = match folder_id {
        Some(id) => id,
        None => home_folder(ctx).await?,
    };
    let view = ctx.service.api().list_folder(&folder_id, password).await?;
    print_listing(&view);
    Ok(())
}

async fn run_mkdir(ctx: &CliContext, name: &str, parent: Option<String>) -> Result<(), CliError> {
    let name = forms::validate_item_name(name).map_err(ClientError::from)?;
    let parent = match parent {
        Some(id) => id,
        None => home_folder(ctx).await?,
    };
    let created = ctx.service.api().create_folder(name, Some(&parent)).await?;
    println!("{}", if created { "created" } else { "not created" });
    Ok(())
}

async fn home_folder(ctx: &CliContext) -> Result<String, CliError> {
    let session = ctx.service.ensure_session().await?;
    session.home.filter(|home| !home.is_empty()).ok_or(CliError::NoHomeFolder)
}

fn print_listing(view: &ItemView) {
    println!("{} ({})", view.name, view.item_id);
    for child in &view.children {
        let kind = if child.is_folder() { "dir " } else { "file" };
        let star = if child.starred() { "*" } else { " " };
        println!("{kind} {star} {}  {}", child.item_id, child.name);
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
