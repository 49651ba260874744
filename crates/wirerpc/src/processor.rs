//! # Processor
//!
//! Dispatches one message at a time from an input protocol to a registered
//! handler and writes the reply to an output protocol.
//!
//! ## Invariants
//! - Every call that is not oneway gets exactly one reply envelope, carrying the
//!   call's name and sequence id.
//! - The argument struct is always consumed, even when the method is unknown,
//!   so the next message on the stream starts where it should.
//! - Arguments that fail to decode are never answered: the stream is lost.

use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::runtime::RuntimeFlavor;
use tracing::debug;
use tracing::warn;
use wirepack::InputProtocol;
use wirepack::MessageHeader;
use wirepack::MessageKind;
use wirepack::OutputProtocol;
use wirepack::Wire;
use wirepack::WireType;
use wirepack::skip;

use crate::error::Error;
use crate::error::HandlerError;
use crate::error::Result;
use crate::exception::ApplicationErrorKind;
use crate::exception::ApplicationException;
use crate::result::MethodResult;
use crate::result::Throws;

// ============================================================================
//  HANDLERS
// ============================================================================

/// A decoded call, ready to run on any thread.
type Invocation = Box<dyn FnOnce() -> Outcome + Send>;

/// What running an invocation produced.
enum Outcome {
    /// The handler returned; the result struct is ready to write.
    Reply(Box<dyn WriteResult>),
    /// The call failed outside its declared exceptions.
    Exception(ApplicationException),
}

trait WriteResult: Send {
    fn write_result(&self, out: &mut dyn OutputProtocol, name: &str) -> wirepack::Result<()>;
}

impl<R: Wire + Send, E: Throws> WriteResult for MethodResult<R, E> {
    fn write_result(&self, out: &mut dyn OutputProtocol, name: &str) -> wirepack::Result<()> {
        self.write(out, name)
    }
}

/// A registered method with its argument and result types erased.
trait ProcessFunction: Send + Sync {
    fn read_args(&self, input: &mut dyn InputProtocol) -> wirepack::Result<Invocation>;
}

struct Handler<A, R, E, F> {
    f: Arc<F>,
    _types: std::marker::PhantomData<fn(A) -> (R, E)>,
}

impl<A, R, E, F> ProcessFunction for Handler<A, R, E, F>
where
    A: Wire + Send + 'static,
    R: Wire + Send + 'static,
    E: Throws,
    F: Fn(A) -> std::result::Result<R, HandlerError<E>> + Send + Sync + 'static,
{
    fn read_args(&self, input: &mut dyn InputProtocol) -> wirepack::Result<Invocation> {
        let args = A::read(input)?;
        let f = Arc::clone(&self.f);
        Ok(Box::new(move || match (*f)(args) {
            Ok(value) => Outcome::Reply(Box::new(MethodResult::<R, E>::Success(value))),
            Err(HandlerError::Declared(e)) => Outcome::Reply(Box::new(MethodResult::<R, E>::Declared(e))),
            Err(HandlerError::Fault(e)) => {
                Outcome::Exception(ApplicationException::new(ApplicationErrorKind::Unknown, e.to_string()))
            },
        }))
    }
}

// ============================================================================
//  PROCESSOR
// ============================================================================

/// A method table with an ordered list of fallbacks.
///
/// Lookups try the own table first, then each parent in the order added.
/// Handlers can be registered at any time, including while serving.
#[derive(Default)]
pub struct Processor {
    handlers: DashMap<String, Arc<dyn ProcessFunction>>,
    parents: Vec<Arc<Processor>>,
    handler_timeout: Option<Duration>,
}

impl Processor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fallback consulted for names this table does not know.
    pub fn with_parent(mut self, parent: Arc<Processor>) -> Self {
        self.parents.push(parent);
        self
    }

    /// Bounds handler execution time. Only enforced when processing on a
    /// multi-threaded tokio runtime; an expired handler is answered with
    /// `InternalError` and left to finish on the blocking pool.
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = Some(timeout);
        self
    }

    /// Registers `handler` under `name`, replacing any previous one.
    pub fn register<A, R, E, F>(&self, name: impl Into<String>, handler: F)
    where
        A: Wire + Send + 'static,
        R: Wire + Send + 'static,
        E: Throws,
        F: Fn(A) -> std::result::Result<R, HandlerError<E>> + Send + Sync + 'static,
    {
        let function = Handler::<A, R, E, F> { f: Arc::new(handler), _types: std::marker::PhantomData };
        self.handlers.insert(name.into(), Arc::new(function));
    }

    /// True if `name` resolves here or in a parent.
    pub fn has_method(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn ProcessFunction>> {
        if let Some(function) = self.handlers.get(name).map(|entry| Arc::clone(entry.value())) {
            return Some(function);
        }
        self.parents.iter().find_map(|parent| parent.lookup(name))
    }

    /// Processes one message.
    ///
    /// Returns `Ok(())` once an exchange completed, including those answered with
    /// a declared exception or a fault. `Err(Error::Application)` means the call
    /// failed but its bytes were consumed and any reply written. `Err(Error::Protocol)`
    /// means the connection is unusable.
    ///
    /// Blocks the current thread while the handler runs. Inside an async task on a
    /// multi-threaded runtime the worker is handed off first; on a current-thread
    /// runtime the handler timeout is not enforced.
    pub fn process(&self, input: &mut dyn InputProtocol, output: &mut dyn OutputProtocol) -> Result<()> {
        let header = input.read_message_begin()?;

        if matches!(header.kind, MessageKind::Reply | MessageKind::Exception) {
            skip(input, WireType::Struct)?;
            input.read_message_end()?;
            let e = ApplicationException::new(
                ApplicationErrorKind::InvalidMessageType,
                format!("expected a call, got {:?} for {}", header.kind, header.name),
            );
            warn!(method = %header.name, kind = ?header.kind, "unexpected message kind");
            write_exception(output, &header, &e)?;
            return Err(Error::Application(e));
        }

        let oneway = header.kind == MessageKind::Oneway;

        let Some(function) = self.lookup(&header.name) else {
            skip(input, WireType::Struct)?;
            input.read_message_end()?;
            let e = ApplicationException::new(
                ApplicationErrorKind::UnknownMethod,
                format!("unknown method {}", header.name),
            );
            warn!(method = %header.name, seq = header.seq, "unknown method");
            if !oneway {
                write_exception(output, &header, &e)?;
            }
            return Err(Error::Application(e));
        };

        let invocation = function.read_args(input)?;
        input.read_message_end()?;

        debug!(method = %header.name, seq = header.seq, oneway, "dispatch");
        let outcome = self.invoke(&header.name, invocation);

        match outcome {
            Outcome::Exception(e) => {
                warn!(method = %header.name, error = %e, "handler failed");
                if !oneway {
                    write_exception(output, &header, &e)?;
                }
            },
            Outcome::Reply(_) if oneway => {},
            Outcome::Reply(result) => {
                output.write_message_begin(&MessageHeader::new(header.name.as_str(), MessageKind::Reply, header.seq))?;
                result.write_result(output, &format!("{}_result", header.name))?;
                output.write_message_end()?;
                output.flush()?;
            },
        }
        Ok(())
    }

    /// Runs the handler, turning panics and timeouts into `InternalError`.
    fn invoke(&self, method: &str, invocation: Invocation) -> Outcome {
        let handle = match (self.handler_timeout, Handle::try_current()) {
            (Some(timeout), Ok(handle)) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Some((timeout, handle))
            },
            _ => None,
        };

        let Some((timeout, handle)) = handle else {
            return match panic::catch_unwind(AssertUnwindSafe(invocation)) {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(method, "handler panicked");
                    internal_error(format!("handler for {} panicked", method))
                },
            };
        };

        let task = handle.spawn_blocking(invocation);
        let waited = tokio::task::block_in_place(|| handle.block_on(tokio::time::timeout(timeout, task)));
        match waited {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(method, error = %e, "handler panicked");
                internal_error(format!("handler for {} panicked", method))
            },
            Err(_) => {
                warn!(method, ?timeout, "handler timed out");
                internal_error(format!("handler for {} timed out after {:?}", method, timeout))
            },
        }
    }
}

fn internal_error(message: String) -> Outcome {
    Outcome::Exception(ApplicationException::new(ApplicationErrorKind::InternalError, message))
}

fn write_exception(output: &mut dyn OutputProtocol, call: &MessageHeader, e: &ApplicationException) -> Result<()> {
    output.write_message_begin(&MessageHeader::new(call.name.as_str(), MessageKind::Exception, call.seq))?;
    e.write(output)?;
    output.write_message_end()?;
    output.flush()?;
    Ok(())
}
