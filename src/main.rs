use clap::Parser;
use studydesk::{db::Db, names, services::auth::TokenTtl, AppState};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// SQLite database URL, e.g. `sqlite://studydesk.db`.
    #[clap(env)]
    database_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:8000")]
    address: String,

    /// Lifetime of access tokens, in minutes.
    #[arg(long, env, default_value_t = names::DEFAULT_ACCESS_TOKEN_TTL_MINUTES)]
    access_token_ttl_minutes: i64,

    /// Lifetime of refresh tokens, in minutes.
    #[arg(long, env, default_value_t = names::DEFAULT_REFRESH_TOKEN_TTL_MINUTES)]
    refresh_token_ttl_minutes: i64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,axum=debug,studydesk=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(&args.database_url).await?;
    let ttl = TokenTtl {
        access_minutes: args.access_token_ttl_minutes,
        refresh_minutes: args.refresh_token_ttl_minutes,
    };
    let app = studydesk::router(AppState::new(db, ttl));

    let address = args.address.parse::<std::net::SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("listening on http://{address} (v{})", studydesk::utils::VERSION);
    axum::serve(listener, app).await?;

    Ok(())
}
