//! STDIO Transport
//!
//! This module implements the framed transport over a pair of byte streams:
//! the process's own stdin/stdout for servers, a child's pipes for clients,
//! or in-memory pipes in tests.

use std::sync::Arc;

use futures_util::{ SinkExt, Stream, StreamExt };
use serde_json::Value;
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio::sync::Mutex;
use tokio_util::codec::{ FramedRead, FramedWrite };

use async_trait::async_trait;

use crate::errors::Error;
use crate::messages::Message;
use crate::transport::Transport;
use crate::transport::codec::ContentLengthCodec;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Reading half: a lazy sequence of decoded JSON frames
pub struct FrameReader<R> {
    inner: FramedRead<R, ContentLengthCodec>,
}

impl<R> FrameReader<R> where R: AsyncRead + Unpin {
    /// Create a new frame reader over a byte stream
    pub fn new(reader: R) -> Self {
        Self {
            inner: FramedRead::new(reader, ContentLengthCodec::new()),
        }
    }

    /// Next frame that parses as JSON, or `None` at end of stream
    ///
    /// Frames whose body is not valid JSON are logged and skipped.
    pub async fn next_message(&mut self) -> Option<Value> {
        loop {
            match self.inner.next().await? {
                Ok(body) =>
                    match serde_json::from_slice::<Value>(&body) {
                        Ok(value) => {
                            tracing::debug!("Received frame: {}", value);
                            return Some(value);
                        }
                        Err(e) => {
                            tracing::warn!("Skipping frame with invalid JSON: {}", e);
                        }
                    }
                Err(e) => {
                    tracing::error!("Transport read failed: {}", e);
                    return None;
                }
            }
        }
    }

    /// Turn the reader into a stream of frames
    pub fn into_stream(mut self) -> impl Stream<Item = Value> {
        async_stream::stream! {
            while let Some(value) = self.next_message().await {
                yield value;
            }
        }
    }
}

/// Writing half, shared by every sender on a connection
///
/// Each frame is written and flushed under one lock, so concurrent senders
/// never interleave a header with another frame's body.
#[derive(Clone)]
pub struct FrameWriter {
    inner: Arc<Mutex<FramedWrite<BoxedWriter, ContentLengthCodec>>>,
}

impl FrameWriter {
    /// Create a new frame writer over a byte sink
    pub fn new<W>(writer: W) -> Self where W: AsyncWrite + Send + Unpin + 'static {
        let writer: BoxedWriter = Box::new(writer);
        Self {
            inner: Arc::new(Mutex::new(FramedWrite::new(writer, ContentLengthCodec::new()))),
        }
    }

    /// Write any serializable value as one frame
    pub async fn send_value(&self, value: &Value) -> Result<(), Error> {
        let mut writer = self.inner.lock().await;
        writer.send(value).await
    }
}

#[async_trait]
impl Transport for FrameWriter {
    async fn send(&self, message: &Message) -> Result<(), Error> {
        tracing::debug!("Sending frame: {:?}", message);
        let mut writer = self.inner.lock().await;
        writer.send(message).await
    }

    async fn close(&self) -> Result<(), Error> {
        let mut writer = self.inner.lock().await;
        SinkExt::<&Message>::close(&mut *writer).await
    }
}

/// A transport implementation over a reader and a writer
pub struct StdioTransport<R> {
    reader: FrameReader<R>,
    writer: FrameWriter,
}

impl StdioTransport<tokio::io::Stdin> {
    /// Transport over this process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R> StdioTransport<R> where R: AsyncRead + Unpin {
    /// Create a new transport over arbitrary streams
    pub fn new<W>(reader: R, writer: W) -> Self where W: AsyncWrite + Send + Unpin + 'static {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Split into the reading and writing halves
    pub fn split(self) -> (FrameReader<R>, FrameWriter) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::AsyncWriteExt;

    use crate::errors::ErrorCode;
    use crate::messages::{ ErrorData, Notification, Request, Response };

    #[tokio::test]
    async fn test_reader_skips_invalid_json() {
        let mock = tokio_test::io::Builder
            ::new()
            .read(b"Content-Length: 3\r\n\r\n{x}")
            .read(b"Content-Length: 0\r\n\r\n")
            .read(b"Content-Length: 16\r\n\r\n{\"method\":\"ok\"}\n")
            .build();

        let mut reader = FrameReader::new(mock);
        assert_eq!(reader.next_message().await, Some(json!({ "method": "ok" })));
        assert_eq!(reader.next_message().await, None);
    }

    #[tokio::test]
    async fn test_reader_handles_split_reads() {
        let mock = tokio_test::io::Builder
            ::new()
            .read(b"Content-Len")
            .read(b"gth: 7\r")
            .read(b"\n\r\n[1,")
            .read(b"2,3]")
            .build();

        let values: Vec<Value> = FrameReader::new(mock).into_stream().collect().await;
        assert_eq!(values, vec![json!([1, 2, 3])]);
    }

    #[tokio::test]
    async fn test_writer_emits_content_length_frame() {
        let mock = tokio_test::io::Builder
            ::new()
            .write(b"Content-Length: 40\r\n\r\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}")
            .build();

        let writer = FrameWriter::new(mock);
        writer.send(&Request::new(1, "ping", None).into()).await.unwrap();
    }

    #[tokio::test]
    async fn test_round_trip_over_duplex() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, _server_write) = tokio::io::split(server);
        let (_client_read, client_write) = tokio::io::split(client);

        let writer = FrameWriter::new(client_write);
        let mut reader = FrameReader::new(server_read);

        let message: Message = Notification::new("note", Some(json!({ "n": "ü" }))).into();
        writer.send(&message).await.unwrap();
        writer.send(&message).await.unwrap();

        let first = reader.next_message().await.unwrap();
        assert_eq!(Message::from_value(first).unwrap(), message);
        let second = reader.next_message().await.unwrap();
        assert_eq!(second, message.to_value().unwrap());
    }

    #[tokio::test]
    async fn test_responses_round_trip_over_duplex() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, _server_write) = tokio::io::split(server);
        let (_client_read, client_write) = tokio::io::split(client);

        let writer = FrameWriter::new(client_write);
        let mut reader = FrameReader::new(server_read);

        let success: Message = Response::success(4, json!({ "tools": [] })).into();
        let failure: Message = Response::error(
            Some(5),
            ErrorData::new(ErrorCode::MethodNotFound, "Tool not found: nope")
        ).into();

        for message in [success, failure] {
            writer.send(&message).await.unwrap();
            let decoded = reader.next_message().await.unwrap();

            let has_result = decoded.get("result").is_some();
            let has_error = decoded.get("error").is_some();
            assert!(has_result != has_error, "exactly one of result/error in {}", decoded);
            assert_eq!(Message::from_value(decoded).unwrap(), message);
        }
    }

    #[tokio::test]
    async fn test_concurrent_senders_do_not_interleave() {
        let (client, server) = tokio::io::duplex(64);
        let (server_read, _server_write) = tokio::io::split(server);
        let (_client_read, client_write) = tokio::io::split(client);

        let writer = FrameWriter::new(client_write);
        let mut tasks = Vec::new();
        for i in 0..20 {
            let writer = writer.clone();
            tasks.push(
                tokio::spawn(async move {
                    let text = "x".repeat(100 + i);
                    writer.send(&Notification::new("n", Some(json!({ "i": i, "text": text }))).into()).await
                })
            );
        }

        let mut reader = FrameReader::new(server_read);
        let mut seen = Vec::new();
        for _ in 0..20 {
            let value = reader.next_message().await.unwrap();
            seen.push(value["params"]["i"].as_i64().unwrap());
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        seen.sort();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_reader_ends_when_writer_closes() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server);

        client.write_all(b"Content-Length: 2\r\n\r\n{}").await.unwrap();
        drop(client);

        assert_eq!(reader.next_message().await, Some(json!({})));
        assert_eq!(reader.next_message().await, None);
    }
}
