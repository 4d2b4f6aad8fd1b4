//! Stand-in for the remote analysis service
//!
//! A throwaway axum server on an ephemeral port that answers
//! `POST /v1/products/:product_id/reviews/analysis` with a scripted status
//! and a body streamed chunk by chunk.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use bytes::Bytes;

/// Scripted body piece
#[derive(Debug, Clone)]
pub enum Chunk {
    Data(String),
    /// Abort the response mid-stream
    Fail,
}

impl From<&str> for Chunk {
    fn from(value: &str) -> Self {
        Chunk::Data(value.to_string())
    }
}

#[derive(Clone)]
struct Script {
    status: StatusCode,
    chunks: Arc<Vec<Chunk>>,
    requests: Arc<AtomicUsize>,
    last_product: Arc<AtomicUsize>,
}

/// Running fake analysis service
pub struct FakeAnalysis {
    pub base_url: String,
    requests: Arc<AtomicUsize>,
    last_product: Arc<AtomicUsize>,
}

impl FakeAnalysis {
    /// Number of analysis requests received
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Product id of the last request
    pub fn last_product(&self) -> usize {
        self.last_product.load(Ordering::SeqCst)
    }
}

async fn analysis(State(script): State<Script>, Path(product_id): Path<usize>) -> Response {
    script.requests.fetch_add(1, Ordering::SeqCst);
    script.last_product.store(product_id, Ordering::SeqCst);

    let chunks = script.chunks.clone();
    let stream = async_stream::stream! {
        for chunk in chunks.iter() {
            tokio::time::sleep(Duration::from_millis(5)).await;
            match chunk {
                Chunk::Data(text) => yield Ok::<Bytes, std::io::Error>(Bytes::from(text.clone())),
                Chunk::Fail => {
                    yield Err(std::io::Error::new(std::io::ErrorKind::Other, "connection dropped"));
                    break;
                }
            }
        }
    };

    Response::builder()
        .status(script.status)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(stream))
        .unwrap()
}

/// Start a fake analysis service answering with `status` and `chunks`
pub async fn spawn_fake_analysis<C>(status: StatusCode, chunks: Vec<C>) -> FakeAnalysis
where
    C: Into<Chunk>,
{
    let script = Script {
        status,
        chunks: Arc::new(chunks.into_iter().map(Into::into).collect()),
        requests: Arc::new(AtomicUsize::new(0)),
        last_product: Arc::new(AtomicUsize::new(0)),
    };
    let requests = script.requests.clone();
    let last_product = script.last_product.clone();

    let app = Router::new()
        .route("/v1/products/:product_id/reviews/analysis", post(analysis))
        .with_state(script);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeAnalysis {
        base_url: format!("http://{}", addr),
        requests,
        last_product,
    }
}

/// One `data:` frame
pub fn frame(progress: f64, message: &str, step: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "progress": progress, "message": message, "step": step })
    )
}
