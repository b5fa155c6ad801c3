/// MCP Tool handlers.
///
/// 1. ingest_files   – ingest local PDF / DOCX / TXT files into the knowledge base
/// 2. ask            – answer a question from the ingested documents
/// 3. list_documents – list archived source documents
///
/// The core is blocking, so every handler hops onto the blocking pool.
use crate::app::App;
use crate::ingest::UploadedFile;
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct IngestParams {
    /// Paths of the files to ingest (.pdf, .docx, .txt)
    paths: Vec<String>,
}

#[derive(Deserialize, JsonSchema)]
struct AskParams {
    /// Question in natural language
    question: String,
}

// ── Response helpers ─────────────────────────────────────────────────

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&value).unwrap_or_default(),
    )]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

/// Run blocking core work off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, McpError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| McpError::internal_error(format!("worker task failed: {e}"), None))
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub app: App,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {}

#[tool_router]
impl AppTools {
    pub fn new(app: App) -> Self {
        Self {
            app,
            tool_router: Self::tool_router(),
        }
    }

    // ── Tool 1: ingest_files ────────────────────────────────────────

    #[tool(
        description = "Ingest local files (.pdf, .docx, .txt) into the knowledge base. Other file types are accepted but contribute no text."
    )]
    async fn ingest_files(
        &self,
        params: Parameters<IngestParams>,
    ) -> Result<CallToolResult, McpError> {
        let paths = params.0.paths;
        if paths.is_empty() {
            return error_result("paths is required");
        }

        let mut files = Vec::with_capacity(paths.len());
        for p in &paths {
            match UploadedFile::from_path(Path::new(p)) {
                Ok(f) => files.push(f),
                Err(e) => return error_result(&format!("cannot read {p}: {e}")),
            }
        }

        let app = self.app.clone();
        match blocking(move || app.ingest(&files)).await? {
            Ok(report) => json_result(serde_json::json!({
                "status": "ok",
                "files": report.files,
                "documents": report.documents,
                "chunks": report.chunks,
            })),
            Err(e) => {
                warn!("ingest_files failed: {e}");
                error_result(&format!("ingestion failed: {e}"))
            }
        }
    }

    // ── Tool 2: ask ─────────────────────────────────────────────────

    #[tool(description = "Answer a question using only the ingested documents as context")]
    async fn ask(&self, params: Parameters<AskParams>) -> Result<CallToolResult, McpError> {
        let question = params.0.question;
        if question.trim().is_empty() {
            return error_result("question is required");
        }

        let app = self.app.clone();
        match blocking(move || app.ask(&question)).await? {
            Ok(answer) => json_result(serde_json::json!({ "answer": answer })),
            Err(e) => {
                warn!("ask failed: {e}");
                error_result("Failed to generate an answer. Please try again later.")
            }
        }
    }

    // ── Tool 3: list_documents ──────────────────────────────────────

    #[tool(description = "List the source documents kept in the knowledge base")]
    async fn list_documents(&self) -> Result<CallToolResult, McpError> {
        let app = self.app.clone();
        let docs = blocking(move || app.documents())
            .await?
            .map_err(|e| McpError::internal_error(format!("list failed: {e}"), None))?;

        json_result(serde_json::json!({
            "total": docs.len(),
            "documents": docs,
        }))
    }
}
