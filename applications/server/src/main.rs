/// Ensemble Server - club playlist, board and member management
use anyhow::Context;
use clap::{Parser, Subcommand};
use ensemble_club::{Club, NewUser, SyncHandle};
use ensemble_core::types::ADMIN_NAME;
use ensemble_core::views::admin::render_users;
use ensemble_core::{Actor, Backend, MemberPart};
use ensemble_server::{services::AuthService, state::AppState, ServerConfig};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ensemble-server")]
#[command(about = "Ensemble club server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "ENSEMBLE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create an approved member account
    AddUser {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Password
        #[arg(short, long)]
        password: String,
        /// Login address (cloud backend)
        #[arg(short, long)]
        email: Option<String>,
        /// Department
        #[arg(short, long, default_value = "")]
        dept: String,
        /// Part, e.g. 보컬 or 기타
        #[arg(long, default_value = "")]
        part: String,
        /// Free-text part when `--part 직접입력`
        #[arg(long, default_value = "")]
        part_custom: String,
    },
    /// List all member accounts
    ListUsers,
    /// Write the audit log as JSON
    ExportLogs {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove every stored collection
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ensemble_server=info,ensemble_club=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::AddUser {
            name,
            password,
            email,
            dept,
            part,
            part_custom,
        } => {
            let form = NewUser {
                name,
                email,
                password,
                dept,
                part: MemberPart::from_input(&part, &part_custom),
            };
            add_user(&config, form).await?;
        }
        Commands::ListUsers => list_users(&config).await?,
        Commands::ExportLogs { output } => export_logs(&config, output.as_deref()).await?,
        Commands::Reset { yes } => reset(&config, yes).await?,
    }

    Ok(())
}

fn auth_service(config: &ServerConfig) -> Arc<AuthService> {
    Arc::new(
        AuthService::new(
            config.auth.jwt_secret.clone(),
            config.auth.jwt_expiration_hours,
            config.auth.jwt_refresh_expiration_days,
        )
        .with_bcrypt_cost(config.auth.bcrypt_cost),
    )
}

async fn open_club(config: &ServerConfig, auth_service: Arc<AuthService>) -> anyhow::Result<Arc<Club>> {
    let store =
        ensemble_storage::open_store(config.storage.backend, &config.storage.database_url).await?;
    let club = Club::open(store, config.club_config(), auth_service).await?;
    Ok(Arc::new(club))
}

/// Sign in as the admin account for command-line maintenance
async fn admin_actor(club: &Club, config: &ServerConfig) -> anyhow::Result<Actor> {
    let login = match config.storage.backend {
        Backend::Local => ADMIN_NAME,
        Backend::Cloud => config
            .auth
            .admin_email
            .as_deref()
            .context("admin email is required for the cloud backend")?,
    };
    Ok(club.authenticate(login, &config.auth.admin_password).await?)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Ensemble Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);
    tracing::info!("Backend: {:?}", config.storage.backend);

    let auth_service = auth_service(&config);
    let club = open_club(&config, Arc::clone(&auth_service)).await?;
    tracing::info!("Club loaded");

    // Keep the mirror in step with pushes from the document store
    let _sync: Option<SyncHandle> = match config.storage.backend {
        Backend::Cloud => Some(club.spawn_sync().await?),
        Backend::Local => None,
    };

    let app = ensemble_server::app(
        AppState::new(club, auth_service),
        config.server.web_dir.clone(),
    );

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn add_user(config: &ServerConfig, form: NewUser) -> anyhow::Result<()> {
    let club = open_club(config, auth_service(config)).await?;
    let admin = admin_actor(&club, config).await?;

    let user = club.create_user(&admin, form).await?;
    println!("Created {} ({})", user.name, user.id);

    Ok(())
}

async fn list_users(config: &ServerConfig) -> anyhow::Result<()> {
    let club = open_club(config, auth_service(config)).await?;
    let admin = admin_actor(&club, config).await?;

    let users = club.users(&admin).await?;

    println!("Users:");
    for row in render_users(&users) {
        let status = if row.approved { "" } else { " (pending)" };
        println!(
            "  {} - {} [{} / {}]{}",
            row.id, row.name, row.dept, row.part, status
        );
    }

    Ok(())
}

async fn export_logs(config: &ServerConfig, output: Option<&Path>) -> anyhow::Result<()> {
    let club = open_club(config, auth_service(config)).await?;
    let admin = admin_actor(&club, config).await?;

    let json = club.export_logs(&admin).await?;
    match output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn reset(config: &ServerConfig, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("refusing to remove all data without --yes");
    }

    let store =
        ensemble_storage::open_store(config.storage.backend, &config.storage.database_url).await?;
    Club::reset_store(store.as_ref()).await?;
    println!("All data removed");

    Ok(())
}
