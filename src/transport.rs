//! Line transport to the engine.
//!
//! The engine speaks one newline-terminated line in each direction per turn. [`Transport`] is
//! that contract; [`StreamTransport`] binds it to any buffered reader/writer pair (standard
//! streams in production, in-memory buffers in tests) and [`SocketTransport`] to a TCP
//! connection towards a local intermediary.

use std::io::{self, BufRead, BufReader, Stdout, StdinLock, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, instrument, trace};

/// One line in, one line out.
pub trait Transport {
    /// Blocks for the next line and returns it without its terminator.
    ///
    /// An empty string means the engine closed the stream.
    fn read_line(&mut self) -> anyhow::Result<String>;

    /// Writes `line` followed by a newline and flushes.
    fn write_line(&mut self, line: &str) -> anyhow::Result<()>;
}

/// Transport over a buffered reader and a writer.
#[derive(Debug)]
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StreamTransport<R, W> {
    /// Wraps an already buffered reader and a writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Everything written so far.
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Consumes the transport, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl StreamTransport<StdinLock<'static>, Stdout> {
    /// Binds the process's standard input and output.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Transport for StreamTransport<R, W> {
    fn read_line(&mut self) -> anyhow::Result<String> {
        read_trimmed_line(&mut self.reader)
    }

    fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        write_flushed_line(&mut self.writer, line)
    }
}

/// Transport over a TCP connection to a local intermediary.
#[derive(Debug)]
pub struct SocketTransport {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl SocketTransport {
    const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(100);
    const RETRY_DELAY: Duration = Duration::from_millis(10);

    /// Connects to `addr`, retrying until the peer accepts.
    ///
    /// There is no retry limit: this only happens once, before the first turn. Errors after
    /// the connection is made (socket setup) are returned.
    #[instrument]
    pub fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let mut attempts: u64 = 0;
        let stream = loop {
            attempts += 1;
            match TcpStream::connect_timeout(&addr, Self::ATTEMPT_TIMEOUT) {
                Ok(stream) => break stream,
                Err(err) => {
                    debug!(attempts, %err, "intermediary not accepting yet");
                    thread::sleep(Self::RETRY_DELAY);
                }
            }
        };
        debug!(attempts, "connected to intermediary");
        Self::from_stream(stream)
    }

    /// Wraps an established connection.
    pub fn from_stream(stream: TcpStream) -> anyhow::Result<Self> {
        stream
            .set_nodelay(true)
            .context("setting TCP_NODELAY on engine connection")?;
        let reader = stream
            .try_clone()
            .context("cloning engine connection for reading")?;
        Ok(Self {
            reader: BufReader::new(reader),
            writer: stream,
        })
    }
}

impl Transport for SocketTransport {
    fn read_line(&mut self) -> anyhow::Result<String> {
        read_trimmed_line(&mut self.reader)
    }

    fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        write_flushed_line(&mut self.writer, line)
    }
}

fn read_trimmed_line(reader: &mut impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .context("reading line from engine")?;
    trace!(read, "line received");
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(line)
}

fn write_flushed_line(writer: &mut impl Write, line: &str) -> anyhow::Result<()> {
    writer
        .write_all(line.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .context("writing line to engine")?;
    writer.flush().context("flushing line to engine")?;
    trace!(len = line.len(), "line sent");
    Ok(())
}
