//! Light/dark/system theme resolution.
//!
//! The stored [`ThemePreference`] is resolved against the environment's
//! "prefers dark" signal. An explicit light or dark preference always wins;
//! only `System` follows the signal. The resolver remembers the latest
//! signal value even while it is being ignored, so switching back to
//! `System` resolves against the current environment, not a stale one.

use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{ThemeError, ThemeResult};
use crate::storage::{KeyValueStore, THEME_KEY};

/// The user's stored choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the environment signal.
    #[default]
    System,
}

impl ThemePreference {
    /// The persisted literal.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Resolve against the environment signal.
    #[must_use]
    pub const fn resolve(self, prefers_dark: bool) -> ResolvedTheme {
        match self {
            Self::Light => ResolvedTheme::Light,
            Self::Dark => ResolvedTheme::Dark,
            Self::System if prefers_dark => ResolvedTheme::Dark,
            Self::System => ResolvedTheme::Light,
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both the bare literal and a JSON string
        match s.trim().trim_matches('"') {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(ThemeError::UnknownPreference(other.to_string())),
        }
    }
}

/// The theme actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    /// Light palette.
    Light,
    /// Dark palette.
    Dark,
}

impl ResolvedTheme {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl std::fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The environment's "prefers dark" signal.
///
/// Cloning shares the same signal.
#[derive(Debug, Clone)]
pub struct ThemeSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ThemeSignal {
    /// Create a signal with an initial value.
    #[must_use]
    pub fn new(prefers_dark: bool) -> Self {
        let (tx, _) = watch::channel(prefers_dark);
        Self { tx: Arc::new(tx) }
    }

    /// Current value.
    #[must_use]
    pub fn prefers_dark(&self) -> bool {
        *self.tx.borrow()
    }

    /// Change the value. Subscribers are only woken on an actual change.
    pub fn set_prefers_dark(&self, prefers_dark: bool) {
        self.tx.send_if_modified(|current| {
            if *current == prefers_dark {
                false
            } else {
                *current = prefers_dark;
                true
            }
        });
    }

    /// Receive future changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// A live subscription of a [`ThemeResolver`] to a [`ThemeSignal`].
///
/// Dropping it stops the listener.
#[derive(Debug)]
pub struct SignalSubscription {
    task: Option<JoinHandle<()>>,
}

impl SignalSubscription {
    /// Stop listening now.
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    /// Whether the listener task is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Theme signal listener stopped");
        }
    }
}

impl Drop for SignalSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy)]
struct ThemeState {
    preference: ThemePreference,
    prefers_dark: bool,
}

#[derive(Debug)]
struct ResolverInner {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<ThemeState>,
    resolved: watch::Sender<ResolvedTheme>,
}

/// Resolves and persists the theme preference.
///
/// Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct ThemeResolver {
    inner: Arc<ResolverInner>,
}

impl ThemeResolver {
    /// Read the stored preference and resolve it immediately.
    ///
    /// A missing, unreadable, or unrecognised stored value falls back to
    /// [`ThemePreference::System`].
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, prefers_dark: bool) -> Self {
        let preference = match store.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored theme: {e}");
                ThemePreference::System
            }),
            Ok(None) => ThemePreference::System,
            Err(e) => {
                tracing::warn!("Failed to read theme preference: {e}");
                ThemePreference::System
            }
        };

        let resolved = preference.resolve(prefers_dark);
        tracing::debug!("Theme preference {preference} resolved to {resolved}");
        let (tx, _) = watch::channel(resolved);

        Self {
            inner: Arc::new(ResolverInner {
                store,
                state: RwLock::new(ThemeState {
                    preference,
                    prefers_dark,
                }),
                resolved: tx,
            }),
        }
    }

    /// The stored preference.
    #[must_use]
    pub fn preference(&self) -> ThemePreference {
        self.state().preference
    }

    /// The applied theme.
    #[must_use]
    pub fn resolved(&self) -> ResolvedTheme {
        *self.inner.resolved.borrow()
    }

    /// Receive resolved-theme changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResolvedTheme> {
        self.inner.resolved.subscribe()
    }

    /// Change and persist the preference, returning the new resolved theme.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::Persistence`] if the preference could not be
    /// stored. The new preference is applied regardless.
    pub fn set_preference(&self, preference: ThemePreference) -> ThemeResult<ResolvedTheme> {
        let resolved = {
            let mut state = self
                .inner
                .state
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            state.preference = preference;
            self.publish(state.preference.resolve(state.prefers_dark))
        };
        tracing::info!("Theme preference set to {preference}");

        self.inner.store.set(THEME_KEY, preference.as_str())?;
        Ok(resolved)
    }

    /// React to a change of the environment signal.
    ///
    /// The value is always recorded; the resolved theme only changes when
    /// the preference is [`ThemePreference::System`].
    pub fn on_external_signal_changed(&self, prefers_dark: bool) -> ResolvedTheme {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.prefers_dark = prefers_dark;
        if state.preference == ThemePreference::System {
            self.publish(ThemePreference::System.resolve(prefers_dark))
        } else {
            self.resolved()
        }
    }

    /// Follow `signal` until the returned subscription is dropped.
    ///
    /// The current signal value is applied before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::NoRuntime`] outside a Tokio runtime.
    pub fn attach(&self, signal: &ThemeSignal) -> ThemeResult<SignalSubscription> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| ThemeError::NoRuntime)?;

        let mut rx = signal.subscribe();
        self.on_external_signal_changed(*rx.borrow_and_update());

        let resolver = self.clone();
        let task = handle.spawn(async move {
            while rx.changed().await.is_ok() {
                let prefers_dark = *rx.borrow_and_update();
                let resolved = resolver.on_external_signal_changed(prefers_dark);
                tracing::debug!("Environment prefers_dark={prefers_dark}, theme is {resolved}");
            }
        });

        Ok(SignalSubscription { task: Some(task) })
    }

    fn state(&self) -> ThemeState {
        *self
            .inner
            .state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn publish(&self, resolved: ResolvedTheme) -> ResolvedTheme {
        self.inner.resolved.send_if_modified(|current| {
            if *current == resolved {
                false
            } else {
                *current = resolved;
                true
            }
        });
        resolved
    }
}
