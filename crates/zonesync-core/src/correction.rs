//! Corrections: planned, describable mutations of a remote zone
//!
//! A [`Correction`] pairs a human-readable description with an optional
//! executable. Report-only corrections carry no executable.
//!
//! The executable is an `Fn`, not an `FnOnce`: the caller may run it again
//! after a failure. Whether a second run is safe against the remote system
//! is the caller's concern.

use crate::error::Result;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Future returned by a correction's executable
pub type CorrectionFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

type Action = Box<dyn Fn() -> CorrectionFuture + Send + Sync>;

/// A planned mutation of a remote zone
pub struct Correction {
    /// Description of the mutation
    pub msg: String,
    action: Option<Action>,
}

impl Correction {
    /// Create an executable correction
    ///
    /// # Parameters
    ///
    /// - `msg`: Description shown to the operator
    /// - `action`: Produces the future that performs the mutation
    pub fn new<F, Fut>(msg: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            msg: msg.into(),
            action: Some(Box::new(move || Box::pin(action()))),
        }
    }

    /// Create an informational correction with nothing to execute
    pub fn report(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            action: None,
        }
    }

    /// True if this correction only carries a message
    pub fn is_report(&self) -> bool {
        self.action.is_none()
    }

    /// Run the mutation
    ///
    /// Reports succeed immediately. Failures are wrapped in
    /// [`crate::Error::Correction`] so they can be attributed to this
    /// correction.
    pub async fn execute(&self) -> Result<()> {
        match &self.action {
            Some(action) => action().await.map_err(|e| e.in_correction(&self.msg)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Correction")
            .field("msg", &self.msg)
            .field("executable", &self.action.is_some())
            .finish()
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

/// Corrections planned for one zone
#[derive(Debug, Default)]
pub struct Plan {
    /// Corrections in execution order
    pub corrections: Vec<Correction>,
    /// Number of actionable changes (reports excluded)
    pub change_count: usize,
}

impl Plan {
    /// True if nothing needs to be executed
    pub fn is_empty(&self) -> bool {
        self.corrections.iter().all(Correction::is_report)
    }
}
