use std::{future::IntoFuture, process, sync::Arc};

use stampa::{
    application::{error::AppError, export::PdfExportService, renderer::PdfRenderer},
    config::{self, Settings},
    infra::{
        chromium::ChromiumRenderer,
        error::InfraError,
        http::{self, HttpState},
        storage::OutputStore,
        telemetry,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Prune(_) => run_prune(settings).await,
    }
}

fn open_store(settings: &Settings) -> Result<Arc<OutputStore>, AppError> {
    let store = OutputStore::new(
        settings.output.directory.clone(),
        settings.output.keep_count.get(),
    )
    .map_err(InfraError::from)?;
    Ok(Arc::new(store))
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let store = open_store(&settings)?;
    let renderer: Arc<dyn PdfRenderer> = Arc::new(ChromiumRenderer::new(&settings.render));
    let exports = Arc::new(PdfExportService::new(renderer, store));

    let state = HttpState {
        exports,
        expose_render_errors: settings.api.expose_render_errors,
    };
    // Validated to fit in usize while loading settings.
    let body_limit = settings.server.max_request_bytes.get() as usize;
    let router = http::build_router(state, body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        addr = %settings.server.addr,
        output = %settings.output.directory.display(),
        keep_count = settings.output.keep_count.get(),
        "stampa listening"
    );

    let (signalled_tx, mut signalled_rx) = watch::channel(false);
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(true);
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    let drain_deadline = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| InfraError::server(err.to_string()))?;
        }
        _ = drain_deadline => {
            warn!(
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping in-flight requests"
            );
        }
    }

    info!("stampa stopped");
    Ok(())
}

async fn run_prune(settings: Settings) -> Result<(), AppError> {
    let store = open_store(&settings)?;
    store
        .evict()
        .await
        .map_err(|err| AppError::unexpected(format!("retention pass failed: {err}")))?;
    info!(
        output = %store.root().display(),
        keep_count = store.keep_count(),
        "retention pass complete"
    );
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; draining connections");
}
