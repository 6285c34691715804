// Tue Feb 10 2026 - Alex

use crate::scripting::engine::ScriptLanguage;
use log::warn;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptErrorKind {
    SyntaxError,
    RuntimeError,
    OtherError,
}

impl fmt::Display for ScriptErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScriptErrorKind::SyntaxError => "SyntaxError",
            ScriptErrorKind::RuntimeError => "RuntimeError",
            ScriptErrorKind::OtherError => "OtherError",
        };
        write!(f, "{}", name)
    }
}

/// One classified failure reported by an engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} in script {script_id}: {message}")]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub message: String,
    pub script_id: u64,
}

impl ScriptError {
    pub fn new(kind: ScriptErrorKind, script_id: u64, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            script_id,
        }
    }

    pub fn syntax(script_id: u64, message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::SyntaxError, script_id, message)
    }

    pub fn runtime(script_id: u64, message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::RuntimeError, script_id, message)
    }

    pub fn other(script_id: u64, message: impl Into<String>) -> Self {
        Self::new(ScriptErrorKind::OtherError, script_id, message)
    }
}

/// Classified failure not yet tagged with the script it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fault {
    pub kind: ScriptErrorKind,
    pub message: String,
}

impl Fault {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self {
            kind: ScriptErrorKind::SyntaxError,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ScriptErrorKind::RuntimeError,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: ScriptErrorKind::OtherError,
            message: message.into(),
        }
    }

    pub fn into_error(self, script_id: u64) -> ScriptError {
        ScriptError::new(self.kind, script_id, self.message)
    }
}

impl From<HostError> for Fault {
    fn from(err: HostError) -> Self {
        Fault::other(err.to_string())
    }
}

/// Raised by host functions. Inside a script it surfaces as an `OtherError`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("{function}: argument {index} should be {expected}, got {actual}")]
    ArgumentType {
        function: String,
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Cannot marshal {0}")]
    Unsupported(String),
    #[error("{0}")]
    Custom(String),
}

#[derive(Error, Debug)]
pub enum EngineInitError {
    #[error("Failed to create {language} interpreter: {message}")]
    Interpreter { language: ScriptLanguage, message: String },
    #[error("Failed to install host binding '{name}': {message}")]
    Binding { name: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Rc<dyn Fn(&ScriptError)>;

#[derive(Default)]
struct ChannelInner {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber)>>,
}

/// Observable error sink shared by an engine and every value it hands out.
///
/// Nothing is observed unless someone subscribes. Every report is still logged.
#[derive(Clone, Default)]
pub struct ErrorChannel {
    inner: Rc<ChannelInner>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ScriptError) + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.subscribers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    pub(crate) fn report_fault(&self, script_id: u64, fault: Fault) {
        self.report(fault.into_error(script_id));
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    pub fn report(&self, error: ScriptError) {
        warn!("{}", error);

        // Subscribers may subscribe or unsubscribe while being notified.
        let snapshot: Vec<Subscriber> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in snapshot {
            callback(&error);
        }
    }
}

impl fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
