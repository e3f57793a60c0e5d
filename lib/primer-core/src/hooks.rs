//! Lifecycle hooks.
//!
//! Hooks are callbacks the transport runs at named lifecycle events. The set
//! of events is closed: registering against any other name is an error.
//!
//! # Example
//!
//! ```
//! use primer_core::{Event, Hook, Hooks};
//!
//! let mut hooks = Hooks::default();
//! let log_status = Hook::new(|response| {
//!     let _ = response.status();
//! });
//!
//! hooks.register("response", log_status.clone()).expect("known event");
//! assert_eq!(hooks.get(Event::Response).len(), 1);
//! assert!(hooks.register("request", log_status.clone()).is_err());
//! assert!(hooks.deregister("response", &log_status));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::{Error, Response, Result};

// ============================================================================
// Events
// ============================================================================

/// A recognized lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Fired with the response once it has been received.
    Response,
}

impl Event {
    /// Every recognized event.
    pub const ALL: &'static [Self] = &[Self::Response];

    /// The event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Response => "response",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == name)
            .ok_or_else(|| Error::unsupported_event(name))
    }
}

// ============================================================================
// Hooks
// ============================================================================

type HookFn = dyn Fn(&mut Response) + Send + Sync;

/// A callback run at a lifecycle event.
///
/// Clones share the callback; equality is identity, which is what
/// [`Hooks::deregister`] matches on.
#[derive(Clone)]
pub struct Hook(Arc<HookFn>);

impl Hook {
    /// Wrap a callback.
    pub fn new(f: impl Fn(&mut Response) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Run the callback.
    pub fn call(&self, response: &mut Response) {
        (self.0)(response);
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&Arc::as_ptr(&self.0)).finish()
    }
}

/// Hooks to register in one call.
///
/// Missing entries (`None`) are skipped without error.
#[derive(Debug, Clone, Default)]
pub struct Registration(Vec<Hook>);

impl From<Hook> for Registration {
    fn from(hook: Hook) -> Self {
        Self(vec![hook])
    }
}

impl From<Option<Hook>> for Registration {
    fn from(hook: Option<Hook>) -> Self {
        Self(hook.into_iter().collect())
    }
}

impl From<Vec<Hook>> for Registration {
    fn from(hooks: Vec<Hook>) -> Self {
        Self(hooks)
    }
}

impl From<Vec<Option<Hook>>> for Registration {
    fn from(hooks: Vec<Option<Hook>>) -> Self {
        Self(hooks.into_iter().flatten().collect())
    }
}

/// Per-request hook registry.
///
/// Every recognized event starts with an empty list; each instance owns its
/// own lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Hooks {
    lists: Vec<(Event, Vec<Hook>)>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            lists: Event::ALL.iter().map(|event| (*event, Vec::new())).collect(),
        }
    }
}

impl Hooks {
    /// Create a registry with an empty list per event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::indexing_slicing)] // index was just found or pushed
    fn list_mut(&mut self, event: Event) -> &mut Vec<Hook> {
        let index = match self.lists.iter().position(|(e, _)| *e == event) {
            Some(index) => index,
            None => {
                self.lists.push((event, Vec::new()));
                self.lists.len() - 1
            }
        };
        &mut self.lists[index].1
    }

    /// Register hooks for an event name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEvent`] if `event` is not recognized.
    pub fn register(&mut self, event: &str, hooks: impl Into<Registration>) -> Result<()> {
        let event = event.parse()?;
        self.register_event(event, hooks);
        Ok(())
    }

    /// Register hooks for a known event.
    pub fn register_event(&mut self, event: Event, hooks: impl Into<Registration>) {
        let Registration(hooks) = hooks.into();
        self.list_mut(event).extend(hooks);
    }

    /// Remove the first registration of `hook` for an event.
    ///
    /// Returns `true` if a hook was removed. Unknown events and hooks that
    /// were never registered return `false`.
    pub fn deregister(&mut self, event: &str, hook: &Hook) -> bool {
        let Ok(event) = event.parse::<Event>() else {
            return false;
        };
        let list = self.list_mut(event);
        match list.iter().position(|registered| registered == hook) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Hooks registered for an event, in registration order.
    #[must_use]
    pub fn get(&self, event: Event) -> &[Hook] {
        self.lists
            .iter()
            .find(|(e, _)| *e == event)
            .map(|(_, list)| list.as_slice())
            .unwrap_or_default()
    }

    /// Append every hook of `other`, event by event.
    pub fn extend(&mut self, other: &Self) {
        for (event, hooks) in &other.lists {
            self.list_mut(*event).extend(hooks.iter().cloned());
        }
    }

    /// Total number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lists.iter().map(|(_, list)| list.len()).sum()
    }

    /// Returns `true` if no hook is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the hooks of an event, in order, on `response`.
    pub fn dispatch(&self, event: Event, response: &mut Response) {
        for hook in self.get(event) {
            hook.call(response);
        }
    }
}

// ============================================================================
// Hook owners
// ============================================================================

/// A value that owns a hook registry.
pub trait HookOwner {
    /// The owned registry.
    fn hooks_mut(&mut self) -> &mut Hooks;

    /// Register hooks for an event name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEvent`] if `event` is not recognized.
    fn register_hook(&mut self, event: &str, hooks: impl Into<Registration>) -> Result<()> {
        self.hooks_mut().register(event, hooks)
    }

    /// Remove the first registration of `hook`; returns whether one was removed.
    fn deregister_hook(&mut self, event: &str, hook: &Hook) -> bool {
        self.hooks_mut().deregister(event, hook)
    }
}

impl HookOwner for Hooks {
    fn hooks_mut(&mut self) -> &mut Hooks {
        self
    }
}
