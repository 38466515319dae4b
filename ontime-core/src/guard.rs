//! Shared-state guard with deadline-bounded acquisition
//!
//! The sampling path and the reporting/event path both touch the channel
//! state. Every access goes through [`Guard::lock_within`], which gives up
//! once the budget for that kind of access has elapsed. Callers treat a
//! timeout as "skip this cycle", never as a fault.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal_async::delay::DelayNs;

/// Lock budget for sampling, reporting and event handling
pub const ROUTINE_LOCK_TIMEOUT_MS: u32 = 300;
/// Lock budget for a cumulative reset
pub const RESET_LOCK_TIMEOUT_MS: u32 = 5_000;

/// Kind of access, which selects the acquisition deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockBudget {
    /// Periodic sampling, reporting and link events
    Routine,
    /// Operator-requested reset
    Reset,
}

impl LockBudget {
    pub const fn millis(self) -> u32 {
        match self {
            LockBudget::Routine => ROUTINE_LOCK_TIMEOUT_MS,
            LockBudget::Reset => RESET_LOCK_TIMEOUT_MS,
        }
    }
}

/// The guard could not be acquired within the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockTimeout {
    pub budget: LockBudget,
}

/// Mutex around shared state, acquired against a deadline
///
/// `D` supplies the deadline; it is cloned for every acquisition so
/// concurrent waiters each get their own timer.
pub struct Guard<M: RawMutex, S, D> {
    state: Mutex<M, S>,
    delay: D,
}

impl<M: RawMutex, S, D> Guard<M, S, D> {
    pub const fn new(state: S, delay: D) -> Self {
        Self {
            state: Mutex::new(state),
            delay,
        }
    }
}

impl<M: RawMutex, S, D: DelayNs + Clone> Guard<M, S, D> {
    /// Acquire the state, or fail once `budget` has elapsed
    ///
    /// The guard is released when the returned handle is dropped.
    pub async fn lock_within(
        &self,
        budget: LockBudget,
    ) -> Result<MutexGuard<'_, M, S>, LockTimeout> {
        let mut delay = self.delay.clone();
        match select(self.state.lock(), delay.delay_ms(budget.millis())).await {
            Either::First(guard) => Ok(guard),
            Either::Second(()) => Err(LockTimeout { budget }),
        }
    }
}
