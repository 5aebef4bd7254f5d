// ABOUTME: HTTP listener receiving push webhooks and dispatching pipeline runs.
// ABOUTME: Verifies signatures, resolves per-project config, spawns one task per event.

mod signature;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use signature::{sign, verify_signature};

use crate::config::{AppConfig, PipelineConfig};
use crate::pipeline::{FailureEscalator, PipelineOrchestrator};
use crate::types::{ProjectIdentity, VerifiedEvent};

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// The webhook entrypoint.
///
/// Each accepted event is verified, resolved to a pipeline
/// configuration, and handed to the orchestrator on its own task; the
/// HTTP response returns as soon as the run is dispatched. A failing run
/// never takes the listener down with it.
pub struct Gateway {
    config: Arc<AppConfig>,
    orchestrator: Arc<PipelineOrchestrator>,
    escalator: Arc<FailureEscalator>,
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("static response parts are valid")
}

impl Gateway {
    pub fn new(
        config: Arc<AppConfig>,
        orchestrator: Arc<PipelineOrchestrator>,
        escalator: Arc<FailureEscalator>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            escalator,
        }
    }

    /// Accept connections forever, one http1 connection task each.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> std::io::Result<()> {
        tracing::info!(
            "Listening for webhooks on {}",
            listener.local_addr()?
        );

        loop {
            let (stream, peer) = listener.accept().await?;
            let gateway = self.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let gateway = gateway.clone();
                    async move { Ok::<_, Infallible>(gateway.handle(req).await) }
                });

                if let Err(e) = hyper::server::conn::http1::Builder::new()
                    .serve_connection(io, service)
                    .await
                {
                    tracing::debug!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }

    async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        match (req.method(), req.uri().path()) {
            (&Method::POST, "/webhook") => self.receive(req, false).await,
            (&Method::POST, "/webhook/compose") => self.receive(req, true).await,
            (&Method::GET, "/healthz") => text_response(StatusCode::OK, "ok\n"),
            _ => text_response(StatusCode::NOT_FOUND, "not found\n"),
        }
    }

    /// Verify, resolve, dispatch. `compose` forces the compose pipeline
    /// regardless of the project's configured stages.
    async fn receive(&self, req: Request<Incoming>, compose: bool) -> Response<Full<Bytes>> {
        let header = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return text_response(
                    StatusCode::BAD_REQUEST,
                    &format!("could not read body: {}\n", e),
                );
            }
        };

        let Some(ref secret) = self.config.webhook_secret else {
            tracing::error!("Webhook received but no secret is configured, rejecting");
            return text_response(StatusCode::FORBIDDEN, "signature verification unavailable\n");
        };

        let verified = header
            .as_deref()
            .is_some_and(|h| verify_signature(secret, &body, h));
        if !verified {
            tracing::warn!("Rejected webhook with missing or invalid signature");
            return text_response(StatusCode::FORBIDDEN, "invalid signature\n");
        }

        let event = match VerifiedEvent::from_push_payload(&body) {
            Ok(event) => event,
            Err(e) => return text_response(StatusCode::BAD_REQUEST, &format!("{}\n", e)),
        };

        // Reject events whose owner/repo cannot form a container name
        // before committing a task to them.
        if let Err(e) = ProjectIdentity::from_event(&event) {
            return text_response(StatusCode::BAD_REQUEST, &format!("{}\n", e));
        }

        let project_dir = self.config.project_dir(&event.full_name);
        let pipeline = match PipelineConfig::discover(&project_dir) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                tracing::warn!("No pipeline for {}: {}", event.full_name, e);
                return text_response(StatusCode::UNPROCESSABLE_ENTITY, &format!("{}\n", e));
            }
        };
        let pipeline = if compose {
            pipeline.compose_only()
        } else {
            pipeline
        };

        let orchestrator = self.orchestrator.clone();
        let escalator = self.escalator.clone();
        let full_name = event.full_name.clone();

        tokio::spawn(async move {
            match orchestrator.run(event, pipeline).await {
                Ok(run) => {
                    escalator.finalize(&run).await;
                }
                // Unreachable: identity was validated before dispatch.
                Err(e) => tracing::error!("Run for {} never started: {}", full_name, e),
            }
        });

        text_response(StatusCode::ACCEPTED, "dispatched\n")
    }
}
