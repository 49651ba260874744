//! # Client
//!
//! Issues calls over one transport, one at a time. Sequence ids start at 1 and
//! increase with every message sent.

use wirepack::BinaryProtocol;
use wirepack::InputProtocol;
use wirepack::MessageHeader;
use wirepack::MessageKind;
use wirepack::OutputProtocol;
use wirepack::ProtocolConfig;
use wirepack::Transport;
use wirepack::Wire;
use wirepack::WireType;
use wirepack::skip;

use crate::error::Error;
use crate::error::Result;
use crate::exception::ApplicationErrorKind;
use crate::exception::ApplicationException;
use crate::result::MethodResult;
use crate::result::Throws;

pub struct Client<T> {
    protocol: BinaryProtocol<T>,
    seq: i32,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self { protocol: BinaryProtocol::new(transport), seq: 0 }
    }

    pub fn with_config(transport: T, config: ProtocolConfig) -> Self {
        Self { protocol: BinaryProtocol::with_config(transport, config), seq: 0 }
    }

    /// Opens the transport if it is not open yet.
    pub fn open(&mut self) -> Result<()> {
        if !self.protocol.transport().is_open() {
            self.protocol.transport_mut().open()?;
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.protocol.transport_mut().close()?;
        Ok(())
    }

    pub fn transport(&self) -> &T {
        self.protocol.transport()
    }

    pub fn into_inner(self) -> T {
        self.protocol.into_inner()
    }

    /// Calls `method` and waits for its reply.
    ///
    /// The outer `Result` carries failures of the exchange itself: an EXCEPTION reply
    /// comes back as `Error::Application` with the exception the server sent. The
    /// inner `Result` is the method's own outcome: its return value or one of its
    /// declared exceptions.
    pub fn call<A, R, E>(&mut self, method: &str, args: &A) -> Result<std::result::Result<R, E>>
    where
        A: Wire,
        R: Wire,
        E: Throws,
    {
        let seq = self.send(method, MessageKind::Call, args)?;
        let header = self.protocol.read_message_begin()?;

        let body = match header.kind {
            MessageKind::Reply => MethodResult::<R, E>::read(&mut self.protocol)?,
            MessageKind::Exception => {
                let e = ApplicationException::read(&mut self.protocol)?;
                self.protocol.read_message_end()?;
                return Err(Error::Application(e));
            },
            kind => {
                skip(&mut self.protocol, WireType::Struct)?;
                self.protocol.read_message_end()?;
                return Err(application(
                    ApplicationErrorKind::InvalidMessageType,
                    format!("expected a reply to {}, got {:?}", method, kind),
                ));
            },
        };
        self.protocol.read_message_end()?;

        if header.name != method {
            return Err(application(
                ApplicationErrorKind::WrongMethodName,
                format!("expected a reply to {}, got one to {}", method, header.name),
            ));
        }
        if header.seq != seq {
            return Err(application(
                ApplicationErrorKind::BadSequenceId,
                format!("expected sequence id {}, got {}", seq, header.seq),
            ));
        }

        match body {
            Some(MethodResult::Success(value)) => Ok(Ok(value)),
            Some(MethodResult::Declared(e)) => Ok(Err(e)),
            None => Err(application(
                ApplicationErrorKind::MissingResult,
                format!("{} returned no result", method),
            )),
        }
    }

    /// Sends `method` without waiting. No reply will come, not even for failures.
    pub fn send_oneway<A: Wire>(&mut self, method: &str, args: &A) -> Result<()> {
        self.send(method, MessageKind::Oneway, args)?;
        Ok(())
    }

    fn send<A: Wire>(&mut self, method: &str, kind: MessageKind, args: &A) -> Result<i32> {
        self.seq = self.seq.wrapping_add(1);
        self.protocol.write_message_begin(&MessageHeader::new(method, kind, self.seq))?;
        args.write(&mut self.protocol)?;
        self.protocol.write_message_end()?;
        self.protocol.flush()?;
        Ok(self.seq)
    }
}

fn application(kind: ApplicationErrorKind, message: String) -> Error {
    Error::Application(ApplicationException::new(kind, message))
}
