use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_stream::wrappers::SplitStream;
use tokio_stream::StreamExt;

use crate::jsonrpc::{parse_request, JsonRpcResponse};
use crate::server::McpServer;

/// Serve newline-delimited JSON-RPC over `reader`/`writer` until EOF.
///
/// Each non-blank line is one request; each response is written as one line.
/// Lines are handed to the parser as raw bytes, so a frame that is not UTF-8
/// gets a parse-error response like any other malformed frame.
/// Nothing other than responses is ever written to `writer`.
///
/// # Errors
///
/// Returns an error when reading or writing the underlying streams fails.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frames = SplitStream::new(reader.split(b'\n'));

    while let Some(frame) = frames.next().await {
        let frame = frame?;
        if frame.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let response = match parse_request(&frame) {
            Ok(req) => server.handle(req).await,
            Err(err) => {
                tracing::warn!("rejected frame: {:?}", err.error.as_ref().map(|e| &e.message));
                Some(err)
            }
        };

        if let Some(response) = response {
            write_response(&mut writer, &response).await?;
        }
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Serve on the process's stdin and stdout.
///
/// # Errors
///
/// Returns an error when stdin or stdout fails.
pub async fn serve_stdio(server: &McpServer) -> io::Result<()> {
    serve(
        server,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> io::Result<()> {
    let mut frame = serde_json::to_vec(response)?;
    frame.push(b'\n');
    writer.write_all(&frame).await?;
    writer.flush().await
}
