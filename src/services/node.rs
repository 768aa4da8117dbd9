//! Access to the Freenet node.
//!
//! The key editor only needs one thing from the node: a fresh SSK key pair.
//! [`NodeInterface`] is that contract; [`FcpNode`] fulfils it by talking FCP
//! 2.0 to a running node.
//!
//! FCP messages are line based:
//!
//! ```text
//! GenerateSSK
//! Identifier=sitekeys-keygen-1
//! EndMessage
//! ```

use crate::config::NodeConfig;
use crate::types::GeneratedKeyPair;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// FCP protocol version we speak
pub const FCP_VERSION: &str = "2.0";

static NEXT_IDENTIFIER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("I/O error talking to the node: {0}")]
    Io(#[from] std::io::Error),
    #[error("node did not answer within {0:?}")]
    Timeout(Duration),
    #[error("node closed the connection")]
    ConnectionClosed,
    #[error("unexpected message from node: {0}")]
    UnexpectedMessage(String),
    #[error("node message {message} lacks field {field}")]
    MissingField { message: String, field: String },
    #[error("node reported protocol error {code}: {description}")]
    Protocol { code: u32, description: String },
}

/// Something that can hand out new key pairs.
#[async_trait]
pub trait NodeInterface: Send + Sync {
    /// Generate a new key pair. Both URIs have the shape
    /// `<scheme>@<key-body>/<documentname>`.
    async fn generate_key_pair(&self) -> Result<GeneratedKeyPair, NodeError>;
}

/// A single FCP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcpMessage {
    pub name: String,
    pub fields: Vec<(String, String)>,
}

impl FcpMessage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &str) -> Result<&str, NodeError> {
        self.field(key).ok_or_else(|| NodeError::MissingField {
            message: self.name.clone(),
            field: key.to_string(),
        })
    }

    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(&self.name);
        out.push('\n');
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out.push_str("EndMessage\n");
        out
    }

    /// Turn a `ProtocolError` reply into an error; pass anything else through.
    fn into_result(self) -> Result<Self, NodeError> {
        if self.name != "ProtocolError" {
            return Ok(self);
        }
        let code = self
            .field("Code")
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let description = self
            .field("CodeDescription")
            .unwrap_or("unknown error")
            .to_string();
        Err(NodeError::Protocol { code, description })
    }
}

/// Read one message, up to and including its `EndMessage` line.
pub async fn read_message<R>(reader: &mut R) -> Result<FcpMessage, NodeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut message: Option<FcpMessage> = None;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(NodeError::ConnectionClosed);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if message.is_none() {
            if !trimmed.is_empty() {
                message = Some(FcpMessage::new(trimmed));
            }
            continue;
        }
        if trimmed == "EndMessage" || trimmed == "Data" {
            break;
        }
        let current = message.as_mut().ok_or(NodeError::ConnectionClosed)?;
        let (key, value) = trimmed.split_once('=').ok_or_else(|| {
            NodeError::UnexpectedMessage(format!(
                "malformed field line in {}: {}",
                current.name, trimmed
            ))
        })?;
        current.fields.push((key.to_string(), value.to_string()));
    }
    // The loop only breaks once a name line has been read
    message.ok_or(NodeError::ConnectionClosed)
}

/// FCP client for a Freenet node.
///
/// Each request opens its own connection, so one `FcpNode` can be shared
/// freely between tasks.
#[derive(Debug, Clone)]
pub struct FcpNode {
    address: String,
    client_name: String,
    timeout: Duration,
}

impl FcpNode {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            address: format!("{}:{}", host, port),
            client_name: "sitekeys".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new(&config.host, config.port)
            .with_client_name(&config.client_name)
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_client_name(mut self, client_name: &str) -> Self {
        self.client_name = client_name.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn next_identifier(&self) -> String {
        let n = NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed);
        format!("{}-keygen-{}-{}", self.client_name, std::process::id(), n)
    }

    async fn exchange(&self) -> Result<GeneratedKeyPair, NodeError> {
        tracing::debug!("Connecting to node at {}", self.address);
        let stream = TcpStream::connect(&self.address).await?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let hello = FcpMessage::new("ClientHello")
            .with_field("Name", &self.client_name)
            .with_field("ExpectedVersion", FCP_VERSION);
        write_half.write_all(hello.encode().as_bytes()).await?;

        let reply = read_message(&mut reader).await?.into_result()?;
        if reply.name != "NodeHello" {
            return Err(NodeError::UnexpectedMessage(reply.name));
        }
        tracing::debug!(
            version = reply.field("Version").unwrap_or("unknown"),
            "Node said hello"
        );

        let identifier = self.next_identifier();
        let request = FcpMessage::new("GenerateSSK").with_field("Identifier", &identifier);
        write_half.write_all(request.encode().as_bytes()).await?;

        loop {
            let reply = read_message(&mut reader).await?.into_result()?;
            if reply.name == "SSKKeypair" && reply.field("Identifier") == Some(identifier.as_str()) {
                let key_pair = GeneratedKeyPair {
                    insert_uri: reply.require("InsertURI")?.to_string(),
                    request_uri: reply.require("RequestURI")?.to_string(),
                };
                tracing::debug!(identifier = %identifier, "Node generated a key pair");
                return Ok(key_pair);
            }
            tracing::debug!("Ignoring unrelated node message {}", reply.name);
        }
    }
}

#[async_trait]
impl NodeInterface for FcpNode {
    async fn generate_key_pair(&self) -> Result<GeneratedKeyPair, NodeError> {
        match tokio::time::timeout(self.timeout, self.exchange()).await {
            Ok(result) => result,
            Err(_) => Err(NodeError::Timeout(self.timeout)),
        }
    }
}
