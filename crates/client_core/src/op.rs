use crate::error::StoreError;

/// Lifecycle state for one asynchronous operation class. Each class owns
/// its own instance so concurrent operations of different classes never
/// clobber each other's flags.
///
/// `begin` hands out an issuance token; a resolution may only commit while
/// its token is still current, which is how superseded responses are
/// suppressed.
#[derive(Debug, Default)]
pub(crate) struct OpState {
    loading: bool,
    error: Option<StoreError>,
    token: u64,
}

impl OpState {
    pub(crate) fn begin(&mut self) -> u64 {
        self.loading = true;
        self.error = None;
        self.token += 1;
        self.token
    }

    pub(crate) fn is_current(&self, token: u64) -> bool {
        self.token == token
    }

    pub(crate) fn finish(&mut self) {
        self.loading = false;
    }

    pub(crate) fn fail(&mut self, error: StoreError) {
        self.loading = false;
        self.error = Some(error);
    }

    /// Records a rejection that never entered the pending state (the
    /// authorization precheck path). The rejection is the newest
    /// resolution of the class, so it also supersedes whatever request is
    /// still in flight; without that the snapshot would show a fresh
    /// error next to a stale `loading` flag.
    pub(crate) fn reject(&mut self, error: StoreError) {
        self.loading = false;
        self.error = Some(error);
        self.token += 1;
    }

    /// Discards the in-flight request of this class, if any. Used when the
    /// state a pending response would land in has been cleared.
    pub(crate) fn invalidate(&mut self) {
        self.loading = false;
        self.token += 1;
    }

    pub(crate) fn snapshot(&self) -> OpSnapshot {
        OpSnapshot {
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

/// Read-only view of one operation class, as exposed to the UI layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpSnapshot {
    pub loading: bool,
    pub error: Option<StoreError>,
}
