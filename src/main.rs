use anyhow::{Context as _, Result};
use axis_auth::{AuthenticatedClient, ClientSettings, Credentials};
use axis_config::Config;
use axis_store::SqliteSessionStore;
use axis_transport::ReqwestTransport;
use axis_types::{ApiRequest, TenantStore, TokenStore};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "axis", about = "Authenticated client for the Axis API")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// SQLite session database (default: ~/.axis/session.db).
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one request and print the response body.
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE …).
        method: String,
        /// Path relative to the configured base URL (e.g. `clients/`).
        path: String,
        /// JSON request body.
        #[arg(short, long)]
        data: Option<String>,
        /// Extra header, `Name: value`. May be repeated.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// Exchange credentials for an access token.
    Login {
        #[arg(long)]
        email: String,
        /// Password (falls back to `AXIS_PASSWORD`).
        #[arg(long, env = "AXIS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Remove the stored token and tenant.
    Logout,
    /// Show the stored session state.
    Status,
    /// Manage the tenant (client organisation) context.
    Tenant {
        #[command(subcommand)]
        action: TenantAction,
    },
}

#[derive(Subcommand, Debug)]
enum TenantAction {
    /// Select the tenant sent with every request.
    Set { id: String },
    /// Stop sending a tenant header.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("config error")?;
    init_tracing(&config);

    let store = Arc::new(open_store(cli.db.clone().or_else(|| config.session_db.clone())).await?);

    match cli.command {
        Commands::Request {
            method,
            path,
            data,
            headers,
        } => cmd_request(&config, store, &method, path, data, &headers).await,
        Commands::Login { email, password } => {
            let client = build_client(&config, store)?;
            client
                .login(&Credentials::new(email, password))
                .await
                .context("login failed")?;
            eprintln!("logged in");
            Ok(())
        }
        Commands::Logout => {
            build_client(&config, store)?
                .logout()
                .await
                .context("logout failed")?;
            Ok(())
        }
        Commands::Status => cmd_status(&config, &store).await,
        Commands::Tenant { action } => match action {
            TenantAction::Set { id } => {
                store.set(&id).await.context("failed to store tenant")?;
                eprintln!("tenant set to {id}");
                Ok(())
            }
            TenantAction::Clear => {
                TenantStore::clear(store.as_ref())
                    .await
                    .context("failed to clear tenant")?;
                eprintln!("tenant cleared");
                Ok(())
            }
        },
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_client(config: &Config, store: Arc<SqliteSessionStore>) -> Result<AuthenticatedClient> {
    let settings = ClientSettings::from_config(config)?;
    let transport = ReqwestTransport::new()?;
    Ok(AuthenticatedClient::new(
        settings,
        Arc::new(transport),
        store.clone(),
        store,
        Arc::new(|| {
            tracing::warn!("session ended; run `axis login` to sign in again");
        }),
    ))
}

async fn cmd_request(
    config: &Config,
    store: Arc<SqliteSessionStore>,
    method: &str,
    path: String,
    data: Option<String>,
    headers: &[String],
) -> Result<()> {
    let method = method
        .to_ascii_uppercase()
        .parse::<http::Method>()
        .map_err(|e| anyhow::anyhow!("invalid method '{method}': {e}"))?;
    let mut request = ApiRequest::new(method, path);
    if let Some(data) = data {
        let body: serde_json::Value =
            serde_json::from_str(&data).context("--data must be valid JSON")?;
        request = request.json(&body)?;
    }
    for raw in headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("header '{raw}' must look like 'Name: value'"))?;
        request = request.header(name.trim(), value.trim())?;
    }

    let client = build_client(config, store)?;
    let response = client.request(request).await?;
    eprintln!("{}", response.status);
    println!("{}", response.text());
    Ok(())
}

async fn cmd_status(config: &Config, store: &SqliteSessionStore) -> Result<()> {
    let token = TokenStore::load(store).await?;
    let tenant = store.current().await?;
    println!("base url: {}", config.base_url()?);
    println!(
        "session:  {}",
        if token.is_some() {
            "authenticated"
        } else {
            "not authenticated"
        }
    );
    println!("tenant:   {}", tenant.as_deref().unwrap_or("(none)"));
    Ok(())
}

async fn open_store(db: Option<PathBuf>) -> Result<SqliteSessionStore> {
    let path = db.unwrap_or_else(default_db_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let url = format!("sqlite://{}", path.display());
    SqliteSessionStore::new(&url)
        .await
        .map_err(|e| anyhow::anyhow!("database error: {e}"))
}

fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".axis").join("session.db")
}
