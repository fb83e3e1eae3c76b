use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

use super::store::ScanWriter;

type Chunk = std::io::Result<Vec<u8>>;

/// Streams the child's stdout and stderr into the scan output, one line at a
/// time, until both pipes are closed.
///
/// Each pipe has its own reader task; lines meet in a single channel so the
/// caller stays the only writer of the record. Lines from one pipe keep their
/// order, interleaving between the two follows arrival. Invalid UTF-8 is
/// replaced, not rejected.
pub async fn stream_output(child: &mut Child, writer: &ScanWriter) -> std::io::Result<()> {
    let (tx, mut rx) = mpsc::channel::<Chunk>(64);
    if let Some(stdout) = child.stdout.take() {
        spawn_line_reader(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_reader(stderr, tx.clone());
    }
    drop(tx);

    while let Some(chunk) = rx.recv().await {
        let bytes = chunk?;
        writer.append(&String::from_utf8_lossy(&bytes)).await;
    }
    Ok(())
}

fn spawn_line_reader<R>(pipe: R, tx: mpsc::Sender<Chunk>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Ok(line)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });
}
