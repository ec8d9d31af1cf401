//! Outbound transport for serialized readings.

use std::io::{self, Write};

use thiserror::Error;

/// A message could not be delivered. Recoverable: the caller logs and moves on.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to write message for topic {topic}: {source}")]
    Io {
        topic: String,
        #[source]
        source: io::Error,
    },
    #[error("transport rejected message for topic {topic}: {reason}")]
    Rejected { topic: String, reason: String },
}

/// Sink that delivers one payload to one topic.
///
/// Implementations are called from the tick loop and must not block for long.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        (**self).publish(topic, payload)
    }
}

/// Writes each message as one `topic<TAB>payload` line.
#[derive(Debug)]
pub struct WriterPublisher<W: Write> {
    writer: W,
}

impl<W: Write> WriterPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Publisher for WriterPublisher<W> {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let io_err = |source| PublishError::Io {
            topic: topic.to_string(),
            source,
        };
        self.writer.write_all(topic.as_bytes()).map_err(io_err)?;
        self.writer.write_all(b"\t").map_err(io_err)?;
        self.writer.write_all(payload).map_err(io_err)?;
        self.writer.write_all(b"\n").map_err(io_err)?;
        self.writer.flush().map_err(io_err)
    }
}

/// Publishes to standard output.
pub type StdoutPublisher = WriterPublisher<io::Stdout>;

impl StdoutPublisher {
    pub fn stdout() -> Self {
        WriterPublisher::new(io::stdout())
    }
}
