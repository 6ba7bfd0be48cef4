// src/exec/drain.rs

//! Line-by-line draining of a job's stdout / stderr into its record.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, warn};

use crate::job::SharedRecord;
use crate::types::StreamSource;

/// Read `reader` until end-of-stream, feeding every non-empty line into the
/// job record.
///
/// Carriage returns are dropped and lines trimmed. Invalid UTF-8 is
/// replaced rather than treated as an error. A read error stops this stream
/// only; the job keeps going.
pub async fn drain_stream<R>(reader: R, source: StreamSource, record: SharedRecord)
where
    R: AsyncRead + Unpin,
{
    let job_id = record.lock().id().to_string();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let decoded = String::from_utf8_lossy(&buf).replace('\r', "");
                let line = decoded.trim();
                if line.is_empty() {
                    continue;
                }

                debug!(job = %job_id, stream = %source, "{}", line);
                record.lock().ingest_line(line, source);
            }
            Err(e) => {
                warn!(
                    job = %job_id,
                    stream = %source,
                    error = %e,
                    "stream read failed; no more output from this stream"
                );
                break;
            }
        }
    }

    debug!(job = %job_id, stream = %source, "stream drained");
}

/// Drain both pipes concurrently; returns once both reached end-of-stream.
///
/// Lines keep their order within a stream; there is no ordering between
/// the two streams.
pub async fn drain_both<O, E>(stdout: Option<O>, stderr: Option<E>, record: &SharedRecord)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let out_record = record.clone();
    let err_record = record.clone();

    tokio::join!(
        async move {
            if let Some(stdout) = stdout {
                drain_stream(stdout, StreamSource::Stdout, out_record).await;
            }
        },
        async move {
            if let Some(stderr) = stderr {
                drain_stream(stderr, StreamSource::Stderr, err_record).await;
            }
        },
    );
}
