// src/types.rs

use std::fmt;

/// Who a redirected line belongs to.
///
/// Both strings are used verbatim in every log line prefix
/// (`[<component>][<operation>]`) and the operation also ends up in the
/// buffer file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub component: String,
    pub operation: String,
}

impl Identity {
    pub fn new(component: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            operation: operation.into(),
        }
    }

    /// Identity for an operation on `T`.
    ///
    /// The component is the last path segment of `T`'s type name with any
    /// `Watcher` marker removed, so `builds::CargoWatcher` becomes `Cargo`.
    pub fn for_type<T: ?Sized>(operation: impl Into<String>) -> Self {
        Self::new(component_name::<T>(), operation)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.component, self.operation)
    }
}

/// Component name derived from a type name.
pub fn component_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    // Strip generic arguments before taking the last path segment.
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);
    short.replace("Watcher", "")
}

/// Which logging sink policy a redirection scope uses.
///
/// - `RootRedirect`: tag the shared root logger's lines with the identity.
/// - `Live`: private logger writing each line to the console immediately.
/// - `Buffered`: private logger writing to a temp file that is replayed to
///   the console as one block when the scope ends (default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    RootRedirect,
    Live,
    #[default]
    Buffered,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::RootRedirect => "root-redirect",
            PolicyKind::Live => "live",
            PolicyKind::Buffered => "buffered",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a redirected subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}
