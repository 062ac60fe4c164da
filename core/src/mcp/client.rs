use crate::error::{NewsdeskError, Result};
use crate::mcp::protocol::{
    CallToolResult, JsonRpcMessage, PROTOCOL_VERSION, ToolsListResult,
};
use crate::traits::{ToolResult, ToolSession, ToolSpec};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "newsdesk";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Picks the launcher for a tool-hosting script: `.py` runs under `python`,
/// a path without extension is executed directly, anything else runs under
/// `node`.
pub fn launch_command(script: &str) -> (String, Vec<String>) {
    match Path::new(script).extension().and_then(|e| e.to_str()) {
        Some("py") => ("python".to_string(), vec![script.to_string()]),
        None => (script.to_string(), vec![]),
        Some(_) => ("node".to_string(), vec![script.to_string()]),
    }
}

struct SessionIo {
    writer: BoxedWriter,
    reader: Lines<BufReader<BoxedReader>>,
}

impl SessionIo {
    async fn send(&mut self, message: &JsonRpcMessage) -> Result<()> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn recv_response(&mut self, id: u64) -> Result<JsonRpcMessage> {
        loop {
            let line = self.reader.next_line().await?.ok_or_else(|| {
                NewsdeskError::Connection("tool server closed the connection".to_string())
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let message: JsonRpcMessage = match serde_json::from_str(line) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Skipping malformed line from tool server: {}", e);
                    continue;
                }
            };

            if message.is_response_to(id) {
                return Ok(message);
            }
            if let Some(method) = message.method.as_deref() {
                debug!("Ignoring server message: method={}", method);
            } else {
                warn!("Received response for unknown request ID: {:?}", message.id);
            }
        }
    }
}

/// Tool session over a child process's stdin/stdout.
pub struct StdioSession {
    io: Mutex<SessionIo>,
    child: Mutex<Option<Child>>,
    next_id: AtomicU64,
    request_timeout: Duration,
    tool_call_timeout: Duration,
}

impl StdioSession {
    /// Spawns the tool-hosting script and performs the `initialize` handshake.
    pub async fn connect(script: &str, request_timeout: Duration) -> Result<Self> {
        let (program, args) = launch_command(script);
        info!("Launching tool server: {} {:?}", program, args);

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NewsdeskError::Connection(format!("failed to launch {program}: {e}")))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            NewsdeskError::Connection("tool server stdin unavailable".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            NewsdeskError::Connection("tool server stdout unavailable".to_string())
        })?;

        let session = Self::from_streams(stdout, stdin, request_timeout);
        *session.child.lock().await = Some(child);

        if let Err(e) = session.initialize().await {
            let _ = session.close().await;
            return Err(match e {
                NewsdeskError::Connection(_) => e,
                other => NewsdeskError::Connection(other.to_string()),
            });
        }
        Ok(session)
    }

    /// Wraps an already-open byte stream pair. No process is owned.
    pub fn from_streams<R, W>(reader: R, writer: W, request_timeout: Duration) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        let writer: BoxedWriter = Box::new(writer);
        Self {
            io: Mutex::new(SessionIo {
                writer,
                reader: BufReader::new(reader).lines(),
            }),
            child: Mutex::new(None),
            next_id: AtomicU64::new(1),
            request_timeout,
            tool_call_timeout: request_timeout,
        }
    }

    /// Sets the bound for `tools/call`. Tools may run far longer than the
    /// handshake or a listing, so this is tracked separately.
    pub fn with_tool_call_timeout(mut self, timeout: Duration) -> Self {
        self.tool_call_timeout = timeout;
        self
    }

    pub async fn initialize(&self) -> Result<Value> {
        let result = self
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": CLIENT_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                })),
            )
            .await?;

        self.notify("notifications/initialized", None).await?;

        if let Some(name) = result.pointer("/serverInfo/name").and_then(Value::as_str) {
            info!("Initialized session with {}", name);
        }
        Ok(result)
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let message = JsonRpcMessage::notification(method, params);
        self.io.lock().await.send(&message).await
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.request_within(self.request_timeout, method, params).await
    }

    async fn request_within(
        &self,
        timeout: Duration,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = JsonRpcMessage::request(id, method, params);

        let mut io = self.io.lock().await;
        io.send(&message).await?;

        let response = tokio::time::timeout(timeout, io.recv_response(id))
            .await
            .map_err(|_| {
                NewsdeskError::ToolSession(format!("Request timeout for method: {method}"))
            })??;

        if let Some(error) = response.error {
            return Err(NewsdeskError::ToolSession(format!(
                "{method} failed: {} (code {})",
                error.message, error.code
            )));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ToolSession for StdioSession {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>> {
        let result = self.request("tools/list", None).await?;
        let listed: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| NewsdeskError::Protocol(format!("invalid tools/list result: {e}")))?;
        Ok(listed.tools.into_iter().map(ToolSpec::from).collect())
    }

    async fn call_tool(&self, name: &str, args: &Map<String, Value>) -> Result<ToolResult> {
        let result = self
            .request_within(
                self.tool_call_timeout,
                "tools/call",
                Some(json!({ "name": name, "arguments": args })),
            )
            .await?;
        let result: CallToolResult = serde_json::from_value(result)
            .map_err(|e| NewsdeskError::Protocol(format!("invalid tools/call result: {e}")))?;
        Ok(result.into())
    }

    /// Closes the child's stdin and waits briefly for it to exit before
    /// killing it. Safe to call more than once.
    async fn close(&self) -> Result<()> {
        if let Err(e) = self.io.lock().await.writer.shutdown().await {
            debug!("Tool server stdin already closed: {}", e);
        }

        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(status) => {
                info!("Tool server exited: {}", status?);
            }
            Err(_) => {
                warn!("Tool server did not exit in time, killing it");
                child.kill().await?;
            }
        }
        Ok(())
    }
}
