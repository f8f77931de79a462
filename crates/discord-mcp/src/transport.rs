//! Newline-delimited JSON-RPC transport.
//!
//! One request per line in, one response per line out. Requests are handled
//! strictly in order; the next line is not read until the previous response
//! has been flushed.

use crate::server::McpServer;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Serve requests from `reader` until end of input.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = server.handle_line(&line).await {
            debug!("Writing {} byte response", response.len());
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    info!("Input closed; shutting down");
    Ok(())
}

/// Serve requests over the process's stdin and stdout.
pub async fn serve_stdio(server: &McpServer) -> io::Result<()> {
    let reader = BufReader::new(io::stdin());
    let writer = io::BufWriter::new(io::stdout());
    serve(server, reader, writer).await
}
