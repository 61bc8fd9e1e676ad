//! Minimal STOMP 1.2 client.
//!
//! Only what the amendment consumer needs: connect with credentials,
//! subscribe with per-message acknowledgement, receive messages, acknowledge
//! them and disconnect. Heart-beating is switched off; stray end-of-line bytes
//! between frames are skipped anyway.

use std::collections::VecDeque;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

use super::consumer::{AmendmentSession, AmendmentSource, Delivery};
use super::error::VstpError;

/// Largest frame body accepted from the broker.
pub const MAX_FRAME_BODY: usize = 4 * 1024 * 1024;

/// Connection settings for the broker.
#[derive(Debug, Clone)]
pub struct StompConfig {
    /// `host:port` of the broker
    pub address: String,
    pub login: Option<String>,
    pub passcode: Option<String>,
}

impl StompConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            login: None,
            passcode: None,
        }
    }

    /// Set the login and passcode sent with CONNECT.
    pub fn with_credentials(mut self, login: impl Into<String>, passcode: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.passcode = Some(passcode.into());
        self
    }

    fn host(&self) -> &str {
        self.address
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&self.address)
    }
}

/// One STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of a header. When a header repeats, the first occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// CONNECT and CONNECTED frames carry their headers unescaped.
    fn escapes_headers(&self) -> bool {
        !matches!(self.command.as_str(), "CONNECT" | "CONNECTED")
    }

    /// Serialize to wire format, including the trailing NUL.
    pub fn encode(&self) -> Vec<u8> {
        let escaping = self.escapes_headers();
        let mut out = Vec::with_capacity(64 + self.body.len());
        out.extend_from_slice(self.command.as_bytes());
        out.push(b'\n');
        for (name, value) in &self.headers {
            if escaping {
                out.extend_from_slice(escape(name).as_bytes());
                out.push(b':');
                out.extend_from_slice(escape(value).as_bytes());
            } else {
                out.extend_from_slice(name.as_bytes());
                out.push(b':');
                out.extend_from_slice(value.as_bytes());
            }
            out.push(b'\n');
        }
        if !self.body.is_empty() && self.header("content-length").is_none() {
            out.extend_from_slice(format!("content-length:{}\n", self.body.len()).as_bytes());
        }
        out.push(b'\n');
        out.extend_from_slice(&self.body);
        out.push(0);
        out
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> Result<String, VstpError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            other => {
                return Err(VstpError::Protocol(format!(
                    "invalid header escape sequence: \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

async fn read_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut String,
) -> Result<(), VstpError> {
    buf.clear();
    if reader.read_line(buf).await? == 0 {
        return Err(VstpError::ConnectionClosed);
    }
    let trimmed = buf.trim_end_matches(['\r', '\n']).len();
    buf.truncate(trimmed);
    Ok(())
}

/// Read one frame, skipping any heart-beat end-of-lines before it.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Frame, VstpError> {
    let mut line = String::new();

    loop {
        read_line(reader, &mut line).await?;
        if !line.is_empty() {
            break;
        }
    }
    let mut frame = Frame::new(line.clone());
    let escaping = frame.escapes_headers();

    loop {
        read_line(reader, &mut line).await?;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| VstpError::Protocol(format!("malformed header line: {line}")))?;
        if escaping {
            frame.headers.push((unescape(name)?, unescape(value)?));
        } else {
            frame.headers.push((name.to_string(), value.to_string()));
        }
    }

    match frame.header("content-length") {
        Some(len) => {
            let len: usize = len
                .trim()
                .parse()
                .map_err(|_| VstpError::Protocol(format!("invalid content-length: {len}")))?;
            if len > MAX_FRAME_BODY {
                return Err(VstpError::Protocol(format!(
                    "content-length {len} exceeds {MAX_FRAME_BODY} bytes"
                )));
            }
            let mut body = vec![0; len];
            reader.read_exact(&mut body).await?;
            if reader.read_u8().await? != 0 {
                return Err(VstpError::Protocol("frame body not NUL-terminated".into()));
            }
            frame.body = body;
        }
        None => {
            let mut body = Vec::new();
            let limit = MAX_FRAME_BODY as u64 + 1;
            (&mut *reader).take(limit).read_until(0, &mut body).await?;
            if body.pop() != Some(0) {
                if body.len() >= MAX_FRAME_BODY {
                    return Err(VstpError::Protocol(format!(
                        "frame body exceeds {MAX_FRAME_BODY} bytes"
                    )));
                }
                return Err(VstpError::ConnectionClosed);
            }
            frame.body = body;
        }
    }

    Ok(frame)
}

fn rejection(frame: &Frame) -> VstpError {
    let mut message = frame.header("message").unwrap_or("no message").to_string();
    if !frame.body.is_empty() {
        message.push_str(": ");
        message.push_str(String::from_utf8_lossy(&frame.body).trim());
    }
    VstpError::Rejected { message }
}

/// An open STOMP session over TCP.
#[derive(Debug)]
pub struct StompConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    /// Messages that arrived while waiting for a receipt.
    pending: VecDeque<Frame>,
    next_receipt: u64,
}

impl StompConnection {
    /// Open the socket and perform the CONNECT handshake.
    pub async fn connect(config: &StompConfig) -> Result<Self, VstpError> {
        let stream = TcpStream::connect(&config.address).await?;
        stream.set_nodelay(true)?;
        let (read, write) = stream.into_split();
        let mut conn = Self {
            reader: BufReader::new(read),
            writer: write,
            pending: VecDeque::new(),
            next_receipt: 0,
        };

        let mut connect = Frame::new("CONNECT")
            .with_header("accept-version", "1.2")
            .with_header("host", config.host())
            .with_header("heart-beat", "0,0");
        if let Some(login) = &config.login {
            connect = connect.with_header("login", login);
        }
        if let Some(passcode) = &config.passcode {
            connect = connect.with_header("passcode", passcode);
        }
        conn.send(&connect).await?;

        let reply = read_frame(&mut conn.reader).await?;
        match reply.command.as_str() {
            "CONNECTED" => {
                debug!(
                    address = %config.address,
                    version = reply.header("version").unwrap_or("?"),
                    "STOMP session established"
                );
                Ok(conn)
            }
            "ERROR" => Err(rejection(&reply)),
            other => Err(VstpError::Protocol(format!("expected CONNECTED, got {other}"))),
        }
    }

    async fn send(&mut self, frame: &Frame) -> Result<(), VstpError> {
        self.writer.write_all(&frame.encode()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Subscribe with per-message acknowledgement and wait for the broker's
    /// receipt. An ACK covers only the message it names, so a message left
    /// unacknowledged stays pending on the broker.
    pub async fn subscribe_to(&mut self, destination: &str, id: &str) -> Result<(), VstpError> {
        self.next_receipt += 1;
        let receipt = format!("sub-{}", self.next_receipt);
        let frame = Frame::new("SUBSCRIBE")
            .with_header("id", id)
            .with_header("destination", destination)
            .with_header("ack", "client-individual")
            .with_header("receipt", receipt.as_str());
        self.send(&frame).await?;

        loop {
            let reply = read_frame(&mut self.reader).await?;
            match reply.command.as_str() {
                "RECEIPT" if reply.header("receipt-id") == Some(receipt.as_str()) => return Ok(()),
                "MESSAGE" => self.pending.push_back(reply),
                "ERROR" => return Err(rejection(&reply)),
                other => debug!(command = other, "ignoring frame while awaiting receipt"),
            }
        }
    }

    /// Wait for the next MESSAGE frame.
    pub async fn next_message(&mut self) -> Result<Frame, VstpError> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(frame);
        }
        loop {
            let frame = read_frame(&mut self.reader).await?;
            match frame.command.as_str() {
                "MESSAGE" => return Ok(frame),
                "ERROR" => return Err(rejection(&frame)),
                other => debug!(command = other, "ignoring unexpected frame"),
            }
        }
    }

    /// Acknowledge a message by the value of its `ack` header.
    pub async fn send_ack(&mut self, ack_id: &str) -> Result<(), VstpError> {
        self.send(&Frame::new("ACK").with_header("id", ack_id)).await
    }

    /// Send DISCONNECT and close the socket. Failures are ignored.
    pub async fn disconnect(mut self) {
        if let Err(e) = self.send(&Frame::new("DISCONNECT")).await {
            debug!(error = %e, "DISCONNECT failed");
        }
        let _ = self.writer.shutdown().await;
    }
}

/// Subscription id used for the amendment topic.
const SUBSCRIPTION_ID: &str = "vstp-0";

/// Opens STOMP sessions to the configured broker.
#[derive(Debug, Clone)]
pub struct StompSource {
    config: StompConfig,
}

impl StompSource {
    pub fn new(config: StompConfig) -> Self {
        Self { config }
    }
}

impl AmendmentSource for StompSource {
    type Session = StompConnection;

    async fn connect(&self) -> Result<StompConnection, VstpError> {
        StompConnection::connect(&self.config).await
    }
}

impl AmendmentSession for StompConnection {
    async fn subscribe(&mut self, topic: &str) -> Result<(), VstpError> {
        self.subscribe_to(topic, SUBSCRIPTION_ID).await
    }

    async fn next_delivery(&mut self) -> Result<Delivery, VstpError> {
        let frame = self.next_message().await?;
        let ack_id = frame
            .header("ack")
            .or_else(|| frame.header("message-id"))
            .map(str::to_string);
        Ok(Delivery {
            body: frame.body,
            ack_id,
        })
    }

    async fn ack(&mut self, delivery: &Delivery) -> Result<(), VstpError> {
        match &delivery.ack_id {
            Some(id) => self.send_ack(id).await,
            None => Ok(()),
        }
    }

    async fn close(self) {
        self.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::net::TcpListener;

    use crate::store::{MemoryStore, ScheduleStore};
    use crate::vstp::{ConsumerState, VstpConsumer};

    const VSTP_FIXTURE: &str = include_str!("../../data/fixtures/vstp.json");

    #[tokio::test]
    async fn read_frame_with_escaped_headers_and_heartbeats() {
        let wire = b"\n\r\nMESSAGE\ndestination:/topic/VSTP\\cALL\nack:7\n\nhello\0";
        let mut reader: &[u8] = wire;
        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(frame.command, "MESSAGE");
        assert_eq!(frame.header("destination"), Some("/topic/VSTP:ALL"));
        assert_eq!(frame.header("ack"), Some("7"));
        assert_eq!(frame.body, b"hello");
    }

    #[tokio::test]
    async fn read_frame_honours_content_length() {
        let wire = b"MESSAGE\ncontent-length:5\n\na\0b\0c\0";
        let mut reader: &[u8] = wire;
        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(frame.body, b"a\0b\0c");
    }

    #[tokio::test]
    async fn first_repeated_header_wins() {
        let wire = b"MESSAGE\nfoo:1\nfoo:2\n\n\0";
        let mut reader: &[u8] = wire;
        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(frame.header("foo"), Some("1"));
        assert!(frame.body.is_empty());
    }

    #[tokio::test]
    async fn oversized_content_length_is_a_protocol_error() {
        let mut reader: &[u8] = b"MESSAGE\ncontent-length:18446744073709551615\n\n\0";
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(VstpError::Protocol(_))
        ));

        let wire = format!("MESSAGE\ncontent-length:{}\n\n", MAX_FRAME_BODY + 1);
        let mut reader: &[u8] = wire.as_bytes();
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(VstpError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn unterminated_body_is_bounded() {
        let mut wire = b"MESSAGE\n\n".to_vec();
        wire.resize(wire.len() + MAX_FRAME_BODY + 10, b'x');
        let mut reader: &[u8] = &wire;
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(VstpError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn eof_is_connection_closed() {
        let mut reader: &[u8] = b"MESSAGE\nfoo:1\n";
        assert!(matches!(
            read_frame(&mut reader).await,
            Err(VstpError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn encode_then_read_back() {
        let mut frame = Frame::new("SEND")
            .with_header("destination", "a:b")
            .with_header("note", "line\nbreak");
        frame.body = b"payload".to_vec();
        let wire = frame.encode();
        let mut reader: &[u8] = &wire;
        let decoded = read_frame(&mut reader).await.unwrap();
        assert_eq!(decoded.header("destination"), Some("a:b"));
        assert_eq!(decoded.header("note"), Some("line\nbreak"));
        assert_eq!(decoded.body, b"payload");
    }

    #[test]
    fn connect_frame_is_not_escaped() {
        let wire = Frame::new("CONNECT").with_header("passcode", "a:b").encode();
        assert_eq!(wire, b"CONNECT\npasscode:a:b\n\n\0");
    }

    #[test]
    fn bad_escape_is_rejected() {
        assert!(matches!(unescape("a\\tb"), Err(VstpError::Protocol(_))));
    }

    #[tokio::test]
    async fn session_against_local_broker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let broker = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut reader = BufReader::new(read);

            let connect = read_frame(&mut reader).await.unwrap();
            assert_eq!(connect.command, "CONNECT");
            assert_eq!(connect.header("login"), Some("user"));
            assert_eq!(connect.header("passcode"), Some("secret"));
            write.write_all(b"CONNECTED\nversion:1.2\n\n\0").await.unwrap();

            let subscribe = read_frame(&mut reader).await.unwrap();
            assert_eq!(subscribe.command, "SUBSCRIBE");
            assert_eq!(subscribe.header("ack"), Some("client-individual"));
            assert_eq!(subscribe.header("destination"), Some("/topic/VSTP_ALL"));
            let receipt = subscribe.header("receipt").unwrap().to_string();

            // A message racing ahead of the receipt must not be lost
            write
                .write_all(b"MESSAGE\nmessage-id:m1\nack:a1\n\n{}\0")
                .await
                .unwrap();
            write
                .write_all(format!("RECEIPT\nreceipt-id:{receipt}\n\n\0").as_bytes())
                .await
                .unwrap();

            let ack = read_frame(&mut reader).await.unwrap();
            assert_eq!(ack.command, "ACK");
            assert_eq!(ack.header("id"), Some("a1"));

            let disconnect = read_frame(&mut reader).await.unwrap();
            assert_eq!(disconnect.command, "DISCONNECT");
        });

        let source = StompSource::new(StompConfig::new(address).with_credentials("user", "secret"));
        let mut session = source.connect().await.unwrap();
        session.subscribe("/topic/VSTP_ALL").await.unwrap();
        let delivery = session.next_delivery().await.unwrap();
        assert_eq!(delivery.body, b"{}");
        assert_eq!(delivery.ack_id.as_deref(), Some("a1"));
        session.ack(&delivery).await.unwrap();
        session.close().await;

        broker.await.unwrap();
    }

    #[tokio::test]
    async fn unstored_message_is_not_acknowledged_by_a_later_ack() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let broker = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut reader = BufReader::new(read);

            read_frame(&mut reader).await.unwrap();
            write.write_all(b"CONNECTED\nversion:1.2\n\n\0").await.unwrap();

            let subscribe = read_frame(&mut reader).await.unwrap();
            assert_eq!(subscribe.header("ack"), Some("client-individual"));
            let receipt = subscribe.header("receipt").unwrap().to_string();
            write
                .write_all(format!("RECEIPT\nreceipt-id:{receipt}\n\n\0").as_bytes())
                .await
                .unwrap();

            for id in ["a1", "a2"] {
                let mut message = Frame::new("MESSAGE")
                    .with_header("subscription", SUBSCRIPTION_ID)
                    .with_header("message-id", id)
                    .with_header("ack", id);
                message.body = VSTP_FIXTURE.as_bytes().to_vec();
                write.write_all(&message.encode()).await.unwrap();
            }

            let ack = read_frame(&mut reader).await.unwrap();
            (ack.command.clone(), ack.header("id").map(str::to_string))
        });

        let store = Arc::new(MemoryStore::new());
        let source = StompSource::new(StompConfig::new(address));
        let mut consumer = VstpConsumer::new(source, store.clone());

        let mut state = ConsumerState::Disconnected;
        for _ in 0..3 {
            state = consumer.step(state).await;
        }
        assert_eq!(state.name(), "consuming");

        // a1 cannot be stored, a2 can
        store.set_available(false);
        state = consumer.step(state).await;
        store.set_available(true);
        state = consumer.step(state).await;
        assert_eq!(state.name(), "consuming");

        let (command, id) = broker.await.unwrap();
        assert_eq!(command, "ACK");
        assert_eq!(id.as_deref(), Some("a2"));
        assert_eq!(store.counts().await.unwrap().vstp, 1);
    }

    #[tokio::test]
    async fn error_frame_on_connect_is_a_rejection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut reader = BufReader::new(read);
            let _ = read_frame(&mut reader).await.unwrap();
            write
                .write_all(b"ERROR\nmessage:bad credentials\n\n\0")
                .await
                .unwrap();
        });

        let err = StompConnection::connect(&StompConfig::new(address))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "rejected by broker: bad credentials");
    }
}
