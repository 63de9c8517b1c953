//! STDIO client connection
//!
//! Spawns a server as a child process, speaks the framed protocol over its
//! stdin/stdout and runs the read loop that feeds responses to the client.

use std::collections::HashMap;
use std::ops::Deref;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::process::{ Child, Command };
use tokio::task::JoinHandle;
use tracing::{ debug, info, warn };

use crate::errors::Error;
use crate::transport::{ FrameReader, FrameWriter, StdioTransport, Transport };

use super::client::{ Client, ClientConfig };

/// How long `shutdown` waits for the child to exit on its own
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The server process to spawn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StdioServerParams {
    /// Program to run
    pub command: String,
    /// Program arguments
    pub args: Vec<String>,
    /// Extra environment variables for the child
    pub env: HashMap<String, String>,
}

impl StdioServerParams {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self where I: IntoIterator<Item = S>, S: Into<String> {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Feed every frame from `reader` into `client` until the stream ends
pub fn spawn_reader<R, T>(reader: FrameReader<R>, client: Arc<Client<T>>) -> JoinHandle<()>
    where R: AsyncRead + Unpin + Send + 'static, T: Transport + 'static
{
    tokio::spawn(async move {
        let mut reader = reader;
        while let Some(frame) = reader.next_message().await {
            client.handle_incoming(frame);
        }
        debug!("Server output closed");
    })
}

/// A client connected to a child process
pub struct StdioClient {
    client: Arc<Client<FrameWriter>>,
    child: Child,
    reader_task: JoinHandle<()>,
}

impl StdioClient {
    /// Shared handle to the client
    pub fn client(&self) -> Arc<Client<FrameWriter>> {
        self.client.clone()
    }

    /// OS process id of the child, if it is still running
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Close the client, stop the read loop and end the child process
    pub async fn shutdown(mut self) -> Result<(), Error> {
        self.client.close();
        if let Err(e) = self.client.transport().close().await {
            debug!("Closing child stdin failed: {}", e);
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Server process exited with {}", status);
            }
            Ok(Err(e)) => {
                warn!("Waiting for server process failed: {}", e);
            }
            Err(_) => {
                info!("Server process did not exit, killing it");
                self.child.kill().await?;
            }
        }

        self.reader_task.abort();
        Ok(())
    }
}

impl Deref for StdioClient {
    type Target = Client<FrameWriter>;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Spawn the server described by `params` and connect a client to it
///
/// The child's stderr is inherited so its logs stay visible.
pub async fn connect(params: StdioServerParams, config: ClientConfig) -> Result<StdioClient, Error> {
    info!("Starting server process: {} {:?}", params.command, params.args);

    let mut command = Command::new(&params.command);
    command
        .args(&params.args)
        .envs(&params.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .map_err(|e| Error::Transport(format!("Failed to spawn process: {}", e)))?;

    let stdin = child.stdin
        .take()
        .ok_or_else(|| Error::Transport("Failed to get stdin handle".to_string()))?;
    let stdout = child.stdout
        .take()
        .ok_or_else(|| Error::Transport("Failed to get stdout handle".to_string()))?;

    let (reader, writer) = StdioTransport::new(stdout, stdin).split();
    let client = Arc::new(Client::new(writer, config));
    let reader_task = spawn_reader(reader, client.clone());

    Ok(StdioClient {
        client,
        child,
        reader_task,
    })
}
