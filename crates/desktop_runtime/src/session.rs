//! Session orchestrator owning the desktop state, transient interaction state, and the store.

use platform_host::AppStateStore;

use crate::model::{DesktopState, InteractionState};
use crate::persistence::{load_session_snapshot, persist_session_snapshot};
use crate::reducer::{reduce_desktop, DesktopAction, ReducerError, RuntimeEffect};

/// A running desktop session.
///
/// [`DesktopSession::dispatch`] applies actions synchronously and only marks the session dirty;
/// the host drives [`DesktopSession::flush_persistence`] whenever it is convenient. Saves are
/// coalesced: any number of dispatches between flushes produce one write of the latest state.
pub struct DesktopSession<S: AppStateStore> {
    state: DesktopState,
    interaction: InteractionState,
    store: S,
    save_pending: bool,
    last_save_error: Option<String>,
}

impl<S: AppStateStore> DesktopSession<S> {
    /// Starts a fresh session without reading the store.
    pub fn new(store: S) -> Self {
        Self {
            state: DesktopState::default(),
            interaction: InteractionState::default(),
            store,
            save_pending: false,
            last_save_error: None,
        }
    }

    /// Starts a session from the stored snapshot, or from defaults when none is usable.
    pub async fn boot(store: S) -> Self {
        let mut session = Self::new(store);
        match load_session_snapshot(&session.store).await {
            Some(snapshot) => {
                if let Err(err) = reduce_desktop(
                    &mut session.state,
                    &mut session.interaction,
                    DesktopAction::HydrateSnapshot { snapshot },
                ) {
                    tracing::warn!(%err, "session hydration failed; starting fresh");
                }
            }
            None => tracing::info!("no stored desktop session; starting fresh"),
        }
        session
    }

    pub fn state(&self) -> &DesktopState {
        &self.state
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies `action` and schedules a save when the state changed.
    ///
    /// # Errors
    ///
    /// Propagates [`ReducerError`]; the state is unchanged in that case.
    pub fn dispatch(&mut self, action: DesktopAction) -> Result<Vec<RuntimeEffect>, ReducerError> {
        let effects = reduce_desktop(&mut self.state, &mut self.interaction, action)?;
        if effects.contains(&RuntimeEffect::PersistSession) {
            self.save_pending = true;
        }
        Ok(effects)
    }

    pub fn has_pending_save(&self) -> bool {
        self.save_pending
    }

    /// Error from the most recent failed save, cleared by the next successful one.
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Writes the latest state if a save is pending. Returns `false` when the save failed; the
    /// save stays pending so the next flush retries it.
    pub async fn flush_persistence(&mut self) -> bool {
        if !self.save_pending {
            return true;
        }
        match persist_session_snapshot(&self.store, &self.state).await {
            Ok(()) => {
                self.save_pending = false;
                self.last_save_error = None;
                true
            }
            Err(err) => {
                tracing::warn!(%err, "desktop session save failed");
                self.last_save_error = Some(err);
                false
            }
        }
    }
}
