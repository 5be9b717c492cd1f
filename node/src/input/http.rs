use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{Router, extract::State, http::StatusCode, routing::post};
use chain::traits::TransactionsInput;
use slog::Logger;
use tokio::{net::TcpListener, sync::mpsc};
use tokio_util::sync::CancellationToken;

const CHANNEL_CAPACITY: usize = 100;

#[derive(Clone)]
struct HttpState {
    messages: mpsc::Sender<String>,
    logger: Logger,
}

/// Accepts messages as the body of `POST /`.
///
/// The listener is bound in [`HttpInput::bind`] so address conflicts surface
/// at startup. Other methods on `/` get `405 Method Not Allowed`.
pub struct HttpInput {
    listener: TcpListener,
    logger: Logger,
}

impl HttpInput {
    pub async fn bind(addr: SocketAddr, logger: Logger) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind HTTP input on {addr}"))?;
        Ok(Self { listener, logger })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

impl TransactionsInput for HttpInput {
    fn input_channel(self: Box<Self>, cancel: CancellationToken) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let Self { listener, logger } = *self;
        let router = Router::new()
            .route("/", post(submit_message))
            .with_state(HttpState {
                messages: tx,
                logger: logger.clone(),
            });

        if let Ok(addr) = listener.local_addr() {
            slog::info!(logger, "HTTP input listening"; "addr" => %addr);
        }
        tokio::spawn(async move {
            let shutdown = async move { cancel.cancelled().await };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                slog::error!(logger, "HTTP input stopped"; "error" => %e);
            }
        });
        rx
    }
}

async fn submit_message(State(state): State<HttpState>, body: String) -> StatusCode {
    if body.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    match state.messages.send(body).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => {
            slog::warn!(state.logger, "Message dropped, node is shutting down");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
