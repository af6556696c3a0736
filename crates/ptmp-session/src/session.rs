use std::io::{Read, Write};

use ptmp_frame::{Frame, FrameError, FrameReader, FrameWriter, LengthMode, MessageType};
use ptmp_transport::Close;
use tracing::{debug, info, warn};

use crate::auth::{
    AuthenticationChallenge, AuthenticationRequest, AuthenticationResponse, AuthenticationStatus,
    Disconnect,
};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::ipc::{IpcCallInfo, IpcCallResponseInfo};
use crate::negotiation::NegotiationInfo;
use crate::state::{Phase, SessionState};

/// A PTMP client session over a reader/writer pair.
///
/// Every operation checks the current [`SessionState`] first and fails with
/// [`SessionError::InvalidState`] without touching the wire when called out
/// of order. Keep-alive frames that arrive while a response is awaited are
/// skipped; a disconnect frame closes the session.
pub struct Session<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    config: SessionConfig,
    state: SessionState,
    server: Option<NegotiationInfo>,
    username: Option<String>,
    next_call_id: u32,
    pending_call: Option<u32>,
}

impl<R: Read, W: Write + Close> Session<R, W> {
    /// Wrap an already connected frame reader and writer.
    pub fn new(reader: FrameReader<R>, writer: FrameWriter<W>, config: SessionConfig) -> Self {
        Self {
            reader,
            writer,
            config,
            state: SessionState::Disconnected,
            server: None,
            username: None,
            next_call_id: 1,
            pending_call: None,
        }
    }

    /// Wrap raw streams, building the frame reader and writer from `config`.
    pub fn from_streams(reader: R, writer: W, config: SessionConfig) -> Self {
        let frame_config = config.frame_config();
        let mut reader = FrameReader::with_config(reader, frame_config.clone());
        let mut writer = FrameWriter::with_config(writer, frame_config);
        if let Some(observer) = &config.observer {
            reader = reader.with_observer(observer.clone());
            writer = writer.with_observer(observer.clone());
        }
        Self::new(reader, writer, config)
    }

    /// Current protocol state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Coarse phase of the current state.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The server's negotiation parameters, once received.
    pub fn server_negotiation(&self) -> Option<&NegotiationInfo> {
        self.server.as_ref()
    }

    /// The username sent in the authentication request.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Allocate the next call id. Ids start at 1 and increase per call.
    pub fn next_call_id(&mut self) -> u32 {
        let id = self.next_call_id;
        self.next_call_id = self.next_call_id.wrapping_add(1).max(1);
        id
    }

    /// Give back the frame reader and writer.
    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }

    /// Send the client's negotiation parameters. Requires `Disconnected`.
    pub fn send_negotiation_request(&mut self, info: &NegotiationInfo) -> Result<()> {
        self.expect_state("send negotiation request", &[SessionState::Disconnected])?;
        self.send(MessageType::NegotiationRequest, &info.encode_body())?;
        info!(app_id = %info.app_id, authentication = info.authentication, "negotiation request sent");
        self.state = SessionState::Negotiating;
        Ok(())
    }

    /// Read and (unless disabled) validate the server's negotiation
    /// parameters. Requires `Negotiating`; leads to `Negotiated`.
    pub fn receive_negotiation_response(&mut self) -> Result<NegotiationInfo> {
        self.expect_state("receive negotiation response", &[SessionState::Negotiating])?;
        let frame = self.receive("negotiation response", |t| {
            t == MessageType::NegotiationResponse
        })?;
        self.check_complete(&frame)?;
        let info = NegotiationInfo::decode(&frame)?;
        if self.config.validate_negotiation {
            info.validate()?;
        }
        info!(
            identifier = %info.identifier,
            version = info.version,
            app_id = %info.app_id,
            keep_alive_period = info.keep_alive_period,
            "negotiation response received"
        );
        self.server = Some(info.clone());
        self.state = SessionState::Negotiated;
        Ok(info)
    }

    /// Announce the username. Requires `Negotiated`.
    pub fn send_authentication_request(&mut self, request: &AuthenticationRequest) -> Result<()> {
        self.expect_state("send authentication request", &[SessionState::Negotiated])?;
        self.send(MessageType::AuthenticationRequest, &request.encode_body())?;
        debug!(username = %request.username, "authentication request sent");
        self.username = Some(request.username.clone());
        self.state = SessionState::AwaitingChallenge;
        Ok(())
    }

    /// Read the server's challenge. Requires `AwaitingChallenge`.
    pub fn receive_authentication_challenge(&mut self) -> Result<AuthenticationChallenge> {
        self.expect_state(
            "receive authentication challenge",
            &[SessionState::AwaitingChallenge],
        )?;
        let frame = self.receive("authentication challenge", |t| {
            t == MessageType::AuthenticationChallenge
        })?;
        self.check_complete(&frame)?;
        let challenge = AuthenticationChallenge::decode(&frame)?;
        debug!(len = challenge.challenge.len(), "authentication challenge received");
        self.state = SessionState::Challenged;
        Ok(challenge)
    }

    /// Answer the challenge. Requires `Challenged`.
    pub fn send_authentication_response(&mut self, response: &AuthenticationResponse) -> Result<()> {
        self.expect_state("send authentication response", &[SessionState::Challenged])?;
        self.send(MessageType::AuthenticationResponse, &response.encode_body())?;
        debug!(username = %response.username, "authentication response sent");
        self.state = SessionState::AwaitingStatus;
        Ok(())
    }

    /// Read the authentication verdict. Requires `AwaitingStatus`.
    ///
    /// A `false` status is returned as a value, not an error; the session
    /// moves to [`SessionState::Rejected`] and only `disconnect` remains valid.
    pub fn receive_authentication_status(&mut self) -> Result<AuthenticationStatus> {
        self.expect_state("receive authentication status", &[SessionState::AwaitingStatus])?;
        let frame = self.receive("authentication status", |t| {
            t == MessageType::AuthenticationStatus
        })?;
        self.check_complete(&frame)?;
        let status = AuthenticationStatus::decode(&frame)?;
        if status.status {
            info!(username = self.username.as_deref().unwrap_or(""), "authenticated");
            self.state = SessionState::Ready;
        } else {
            warn!(username = self.username.as_deref().unwrap_or(""), "authentication rejected");
            self.state = SessionState::Rejected;
        }
        Ok(status)
    }

    /// Send one IPC call. Requires `Ready`; leads to `AwaitingReturn`.
    pub fn send_ipc_call(&mut self, call: &IpcCallInfo) -> Result<()> {
        self.expect_state("send IPC call", &[SessionState::Ready])?;
        let body = call.encode_body()?;
        self.send(MessageType::IpcCall, &body)?;
        debug!(call_id = call.call_id, call = %call.call_name, args = call.args.len(), "IPC call sent");
        self.pending_call = Some(call.call_id);
        self.state = SessionState::AwaitingReturn;
        Ok(())
    }

    /// Read the response to the outstanding call. Requires `AwaitingReturn`.
    ///
    /// Any message type in the IPC range is accepted. Once a response frame
    /// has been read the session is back in `Ready`, even if its body fails
    /// to decode.
    pub fn receive_ipc_call_response(&mut self) -> Result<IpcCallResponseInfo> {
        self.expect_state("receive IPC call response", &[SessionState::AwaitingReturn])?;
        let frame = self.receive("IPC call response", MessageType::is_ipc)?;
        // The frame is off the wire; a body that fails to decode still ends the call.
        let pending = self.pending_call.take();
        self.state = SessionState::Ready;
        let response = IpcCallResponseInfo::decode(&frame, self.config.length_mode)?;
        if let Some(expected) = pending {
            if expected != response.call_id {
                warn!(expected, actual = response.call_id, "IPC response for a different call");
            }
        }
        debug!(call_id = response.call_id, rets = response.rets.len(), "IPC call response received");
        Ok(response)
    }

    /// Send a call and wait for its response, which must carry the same
    /// call id.
    pub fn call(&mut self, call: &IpcCallInfo) -> Result<IpcCallResponseInfo> {
        self.send_ipc_call(call)?;
        let response = self.receive_ipc_call_response()?;
        if response.call_id != call.call_id {
            return Err(SessionError::CallIdMismatch {
                expected: call.call_id,
                actual: response.call_id,
            });
        }
        Ok(response)
    }

    /// Run the full negotiation and authentication sequence.
    ///
    /// `respond` turns the server's challenge into the authentication
    /// response; digest computation is up to the caller. Returns the
    /// server's negotiation parameters.
    pub fn handshake<F>(
        &mut self,
        negotiation: &NegotiationInfo,
        username: &str,
        respond: F,
    ) -> Result<NegotiationInfo>
    where
        F: FnOnce(&AuthenticationChallenge) -> AuthenticationResponse,
    {
        self.send_negotiation_request(negotiation)?;
        let server = self.receive_negotiation_response()?;
        self.send_authentication_request(&AuthenticationRequest::new(username))?;
        let challenge = self.receive_authentication_challenge()?;
        let response = respond(&challenge);
        self.send_authentication_response(&response)?;
        if !self.receive_authentication_status()?.status {
            return Err(SessionError::AuthenticationFailed {
                username: response.username,
            });
        }
        Ok(server)
    }

    /// Send an empty keep-alive frame. Requires `Ready`.
    pub fn send_keep_alive(&mut self) -> Result<()> {
        self.expect_state("send keep-alive", &[SessionState::Ready])?;
        self.send(MessageType::KeepAlive, &[])?;
        debug!("keep-alive sent");
        Ok(())
    }

    /// Send a disconnect message and close the transport.
    ///
    /// Valid in every state except [`SessionState::Closed`]. The session is
    /// closed afterwards even if sending fails; the send error is returned.
    pub fn disconnect(&mut self, reason: &str) -> Result<()> {
        if self.state.is_terminal() {
            return Err(SessionError::InvalidState {
                operation: "disconnect",
                state: self.state,
            });
        }
        let sent = self
            .send(MessageType::Disconnect, &Disconnect::new(reason).encode_body())
            .map(|_| ());
        let closed = self.writer.close().map_err(SessionError::from);
        self.state = SessionState::Closed;
        self.pending_call = None;
        info!(reason, "session disconnected");
        sent.and(closed)
    }

    fn expect_state(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn send(&mut self, msg_type: MessageType, body: &[u8]) -> Result<usize> {
        Ok(self.writer.send(msg_type, body)?)
    }

    /// Read the next frame of an accepted type, skipping keep-alives.
    fn receive(
        &mut self,
        expected: &'static str,
        accept: impl Fn(MessageType) -> bool,
    ) -> Result<Frame> {
        loop {
            let frame = self.reader.read_frame()?;
            if accept(frame.msg_type) {
                return Ok(frame);
            }
            match frame.msg_type {
                MessageType::KeepAlive => {
                    debug!(expected, "skipping keep-alive");
                }
                MessageType::Disconnect => {
                    let reason = Disconnect::decode(&frame).reason;
                    info!(reason = %reason, "peer disconnected");
                    if let Err(err) = self.writer.close() {
                        debug!(error = %err, "close after peer disconnect failed");
                    }
                    self.state = SessionState::Closed;
                    self.pending_call = None;
                    return Err(SessionError::PeerDisconnected(reason));
                }
                actual => {
                    return Err(SessionError::UnexpectedMessage { expected, actual });
                }
            }
        }
    }

    /// In strict mode a body cut short by end of stream is an error.
    fn check_complete(&self, frame: &Frame) -> Result<()> {
        if self.config.length_mode == LengthMode::Strict && !frame.is_complete() {
            return Err(FrameError::FrameLengthMismatch {
                declared: frame.declared_body_len(),
                actual: frame.body.len(),
            }
            .into());
        }
        Ok(())
    }
}
