//! Server binary: opens the store, serves the REST API and static files, and runs the console.

use bookstore::{app_router, AppConfig, AppState, Console, CrudService, PgStore, Store};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bookstore=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let store = match PgStore::open(&config).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, "cannot start without a database connection");
            std::process::exit(1);
        }
    };

    let result = serve(&config, store.clone()).await;
    store.close().await;
    if config.console {
        // The console thread may still be blocked on stdin and would hold the runtime open.
        if let Err(e) = &result {
            tracing::error!(error = %e, "server stopped with an error");
            std::process::exit(1);
        }
        std::process::exit(0);
    }
    result
}

async fn serve(config: &AppConfig, store: Arc<PgStore>) -> Result<(), Box<dyn std::error::Error>> {
    let service = Arc::new(CrudService::new(store, config.store_timeout));
    let app = app_router(AppState::new(service.clone()), config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    if config.console {
        let runtime = tokio::runtime::Handle::current();
        let console = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            let mut console = Console::new(service, runtime, stdin.lock(), std::io::stdout());
            console.run()
        });
        tokio::select! {
            joined = console => {
                joined??;
                tracing::info!("console closed, shutting down");
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("interrupt received, shutting down");
            }
        }
    } else {
        tokio::signal::ctrl_c().await?;
        tracing::info!("interrupt received, shutting down");
    }

    let _ = stop_tx.send(());
    server.await??;
    Ok(())
}
