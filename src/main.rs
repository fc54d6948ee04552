use clap::Parser;
use quizcase::{db::Db, AppState};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// libSQL URL; `file:<path>` opens a local database
    #[clap(env)]
    url: String,

    /// libSQL authentication token, needed for remote databases.
    #[clap(long, env)]
    auth_token: Option<String>,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// Sets the admin password at startup.
    #[clap(long, env)]
    admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,axum=info,quizcase=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(args.url, args.auth_token).await?;

    if let Some(password) = args.admin_password {
        db.set_admin_password(&password).await?;
    } else if !db.admin_password_set().await? {
        tracing::warn!("no admin password set; admin routes are unreachable until ADMIN_PASSWORD is given");
    }

    let app = quizcase::router(AppState::new(db));

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("could not listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("could not listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
}
