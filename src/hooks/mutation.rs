use std::future::Future;

use tokio::sync::watch;

use super::state::{HookError, LoadingGuard, MutationState};

/// Loading/error cell for one-shot operations.
///
/// The operation's result goes back to the caller; only the loading flag
/// and the last error are kept.
#[derive(Debug)]
pub struct Mutation {
    label: &'static str,
    state: watch::Sender<MutationState>,
}

impl Mutation {
    pub fn new(label: &'static str) -> Self {
        let (state, _) = watch::channel(MutationState::default());
        Self { label, state }
    }

    /// Run `op`, tracking it in state.
    ///
    /// Any error is normalized into a [`HookError`], stored, and returned so
    /// the caller still sees the failure. Dropping the returned future
    /// clears `loading` without recording an error.
    pub async fn run<T, E, Fut>(&self, op: Fut) -> Result<T, HookError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<HookError>,
    {
        self.state.send_modify(|s| {
            s.error = None;
            s.loading = true;
        });

        let guard = LoadingGuard::new(self.label, &self.state, |s: &mut MutationState| {
            s.loading = false
        });
        let outcome = op.await;
        guard.disarm();

        match outcome {
            Ok(value) => {
                self.state.send_modify(|s| s.loading = false);
                Ok(value)
            }
            Err(err) => {
                let err: HookError = err.into();
                tracing::warn!(mutation = self.label, error = %err, "mutation failed");
                let stored = err.clone();
                self.state.send_modify(move |s| {
                    s.loading = false;
                    s.error = Some(stored);
                });
                Err(err)
            }
        }
    }

    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }
}
