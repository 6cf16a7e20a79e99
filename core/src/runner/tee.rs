use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::RunnerError;

pub(super) type Sink = Box<dyn AsyncWrite + Unpin + Send>;

/// Captured bytes of one stream plus the read error that ended it early, if any.
pub(super) type PumpOutput = (Vec<u8>, Option<RunnerError>);

/// A running pump. Firing `stop` makes it return what it captured so far
/// instead of waiting for EOF.
pub(super) struct Pump {
    pub(super) handle: JoinHandle<PumpOutput>,
    pub(super) stop: oneshot::Sender<()>,
}

pub(super) fn parent_stdout(silent: bool) -> Sink {
    if silent {
        Box::new(tokio::io::sink())
    } else {
        Box::new(tokio::io::stdout())
    }
}

pub(super) fn parent_stderr(silent: bool) -> Sink {
    if silent {
        Box::new(tokio::io::sink())
    } else {
        Box::new(tokio::io::stderr())
    }
}

/// Reads `reader` line by line until EOF or until `stop` fires. Every
/// non-empty line goes to the capture buffer and to `sink`. The buffer is
/// owned by the task and only handed out through the join handle.
pub(super) fn pump<R>(reader: R, mut sink: Sink, stream: &'static str) -> Pump
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let stop = async move {
            if stop_rx.await.is_err() {
                // Sender dropped without firing: run to EOF.
                std::future::pending::<()>().await;
            }
        };
        tokio::pin!(stop);

        let mut reader = BufReader::new(reader);
        let mut captured = Vec::new();
        let mut line = Vec::new();
        let mut echo = true;

        loop {
            line.clear();
            let read = tokio::select! {
                res = reader.read_until(b'\n', &mut line) => Some(res),
                _ = &mut stop => None,
            };

            let text = match read {
                Some(Ok(0)) => break,
                Some(Ok(_)) => trim_line_ending(&line),
                Some(Err(source)) => {
                    return (captured, Some(RunnerError::StreamIo { stream, source }));
                }
                None => {
                    // Keep a line the child never terminated.
                    let partial = trim_line_ending(&line);
                    if !partial.is_empty() {
                        captured.extend_from_slice(partial);
                        captured.push(b'\n');
                    }
                    tracing::debug!(stream, "pump stopped before EOF");
                    break;
                }
            };
            if text.is_empty() {
                continue;
            }
            captured.extend_from_slice(text);
            captured.push(b'\n');

            if echo {
                if let Err(e) = write_line(&mut sink, text).await {
                    // Parent stream is gone; keep draining the child.
                    tracing::debug!(stream, error = %e, "parent stream closed, echo disabled");
                    echo = false;
                }
            }
        }

        (captured, None)
    });

    Pump {
        handle,
        stop: stop_tx,
    }
}

async fn write_line(sink: &mut Sink, text: &[u8]) -> std::io::Result<()> {
    sink.write_all(text).await?;
    sink.write_all(b"\n").await?;
    sink.flush().await
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
