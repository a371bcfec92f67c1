use core::sync::atomic::{AtomicU8, Ordering};

/// Enumerate the scheduling state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum TaskState {
    /// Suspended, waiting for a wake-up.
    Idle,
    /// Being polled right now.
    Running,
    /// Woken while being polled; the runner polls again before returning.
    Notified,
    /// Finished or panicked. Never polled again.
    Done,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Idle,
            1 => TaskState::Running,
            2 => TaskState::Notified,
            _ => TaskState::Done,
        }
    }
}

/// A [`TaskState`] shared between the runner and its wakers.
#[derive(Debug)]
pub(crate) struct AtomicTaskState(AtomicU8);

impl AtomicTaskState {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(TaskState::Idle as u8))
    }

    #[cfg(test)]
    pub(crate) fn load(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Claim the right to poll.
    ///
    /// Returns `true` if the caller must poll now. A claim on a running task
    /// records the wake-up instead and returns `false`.
    pub(crate) fn begin(&self) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let next = match TaskState::from_u8(current) {
                TaskState::Idle => TaskState::Running,
                TaskState::Running => TaskState::Notified,
                TaskState::Notified | TaskState::Done => return false,
            };
            match self.0.compare_exchange_weak(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next == TaskState::Running,
                Err(actual) => current = actual,
            }
        }
    }

    /// Give up the right to poll after a `Pending` poll.
    ///
    /// Returns `false` if a wake-up arrived during the poll, in which case
    /// the caller keeps the right and must poll again.
    pub(crate) fn suspend(&self) -> bool {
        let parked = self
            .0
            .compare_exchange(
                TaskState::Running as u8,
                TaskState::Idle as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if !parked {
            self.0.store(TaskState::Running as u8, Ordering::Release);
        }
        parked
    }

    pub(crate) fn finish(&self) {
        self.0.store(TaskState::Done as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transitions() {
        let state = AtomicTaskState::new();
        assert!(state.begin());
        assert_eq!(state.load(), TaskState::Running);

        // A wake-up during the poll is recorded, not run.
        assert!(!state.begin());
        assert!(!state.begin());
        assert_eq!(state.load(), TaskState::Notified);
        assert!(!state.suspend());
        assert_eq!(state.load(), TaskState::Running);

        assert!(state.suspend());
        assert_eq!(state.load(), TaskState::Idle);

        state.finish();
        assert!(!state.begin());
        assert_eq!(state.load(), TaskState::Done);
    }
}
