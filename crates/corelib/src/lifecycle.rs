//! Frame loop lifecycle: a single linear path with no retries.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Initializing,
    Running,
    ShuttingDown,
    Terminated,
}

impl Lifecycle {
    /// Next state on the path. `Terminated` stays `Terminated`.
    pub fn next(self) -> Self {
        match self {
            Self::Initializing => Self::Running,
            Self::Running => Self::ShuttingDown,
            Self::ShuttingDown | Self::Terminated => Self::Terminated,
        }
    }

    /// Step forward in place and log the transition.
    pub fn advance(&mut self) -> Self {
        let from = *self;
        *self = from.next();
        if from != *self {
            log::info!("Lifecycle: {} -> {}", from, self);
        }
        *self
    }

    /// Jump straight to `ShuttingDown` from any earlier state.
    /// Used when initialization fails part way.
    pub fn abort(&mut self) {
        if matches!(self, Self::Initializing | Self::Running) {
            log::info!("Lifecycle: {} -> {} (abort)", self, Self::ShuttingDown);
            *self = Self::ShuttingDown;
        }
    }

    #[inline]
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    #[inline]
    pub fn is_terminated(self) -> bool {
        self == Self::Terminated
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "Initializing",
            Self::Running => "Running",
            Self::ShuttingDown => "ShuttingDown",
            Self::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_path() {
        let mut state = Lifecycle::default();
        assert_eq!(state, Lifecycle::Initializing);
        assert_eq!(state.advance(), Lifecycle::Running);
        assert!(state.is_running());
        assert_eq!(state.advance(), Lifecycle::ShuttingDown);
        assert_eq!(state.advance(), Lifecycle::Terminated);
        assert!(state.is_terminated());
    }

    #[test]
    fn terminated_is_absorbing() {
        let mut state = Lifecycle::Terminated;
        for _ in 0..3 {
            assert_eq!(state.advance(), Lifecycle::Terminated);
        }
        state.abort();
        assert_eq!(state, Lifecycle::Terminated);
    }

    #[test]
    fn abort_skips_to_shutdown() {
        let mut state = Lifecycle::Initializing;
        state.abort();
        assert_eq!(state, Lifecycle::ShuttingDown);
        assert_eq!(state.advance(), Lifecycle::Terminated);
    }
}
