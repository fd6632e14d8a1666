//! Write-once memoization cells.
//!
//! A [`Memo`] moves through `Unstarted -> InProgress -> Done` exactly once.
//! A cell whose computation is abandoned (the guard is dropped without a
//! value) becomes `Poisoned` and stays that way.
//!
//! Re-entry from the thread that is computing the value is reported as
//! [`Claim::Reentered`] instead of blocking, which is how recursive
//! computations over a malformed (cyclic) graph terminate. Any other thread
//! blocks until the owner settles the cell, unless the owner is itself
//! waiting, directly or through other threads, on a cell the caller owns.
//! That wait would never end, so it is reported as `Reentered` too.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Condvar, LazyLock, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Address of a [`Memo`]; stable while the cell is in progress.
type CellId = usize;

/// Who computes which cell, and who waits for which cell.
///
/// Both maps only describe cells that are in progress. Entries are changed
/// while the corresponding cell's state lock is held, so a cell's owner here
/// always matches its state.
#[derive(Default)]
struct WaitGraph {
    owners: HashMap<CellId, ThreadId>,
    waiting: HashMap<ThreadId, CellId>,
}

impl WaitGraph {
    /// Check if `me` waiting on `cell` would close a cycle of waits.
    fn would_deadlock(&self, me: ThreadId, cell: CellId) -> bool {
        let mut cell = cell;
        // Each thread waits on at most one cell, so the chain is bounded.
        for _ in 0..=self.waiting.len() {
            let Some(&owner) = self.owners.get(&cell) else {
                return false;
            };
            if owner == me {
                return true;
            }
            match self.waiting.get(&owner) {
                Some(&next) => cell = next,
                None => return false,
            }
        }
        false
    }
}

static WAIT_GRAPH: LazyLock<Mutex<WaitGraph>> = LazyLock::new(Mutex::default);

fn wait_graph() -> MutexGuard<'static, WaitGraph> {
    WAIT_GRAPH.lock().unwrap_or_else(PoisonError::into_inner)
}

enum State<T> {
    Unstarted,
    InProgress(ThreadId),
    Done(T),
    Poisoned,
}

/// A memoization cell shared between threads.
pub struct Memo<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

/// Outcome of claiming a [`Memo`].
pub enum Claim<'a, T> {
    /// The value was already computed.
    Ready(T),
    /// The calling thread is already computing this cell, or waiting for it
    /// would deadlock.
    Reentered,
    /// An earlier computation was abandoned.
    Poisoned,
    /// The caller now owns the computation and must fill the guard.
    Vacant(MemoGuard<'a, T>),
}

impl<T> Memo<T> {
    /// Create an unstarted cell.
    pub fn new() -> Self {
        Memo {
            state: Mutex::new(State::Unstarted),
            ready: Condvar::new(),
        }
    }

    fn id(&self) -> CellId {
        self as *const Self as CellId
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, next: State<T>) {
        let mut state = self.lock();
        *state = next;
        wait_graph().owners.remove(&self.id());
        drop(state);
        self.ready.notify_all();
    }
}

impl<T: Clone> Memo<T> {
    /// Claim the cell, blocking while another thread computes it.
    pub fn claim(&self) -> Claim<'_, T> {
        let me = thread::current().id();
        let mut state = self.lock();

        loop {
            let owner = match *state {
                State::Done(ref value) => return Claim::Ready(value.clone()),
                State::Poisoned => return Claim::Poisoned,
                State::InProgress(owner) => Some(owner),
                State::Unstarted => None,
            };

            match owner {
                Some(owner) if owner == me => return Claim::Reentered,
                Some(_) => {
                    {
                        let mut graph = wait_graph();
                        if graph.would_deadlock(me, self.id()) {
                            tracing::trace!("cross-thread cycle detected; not waiting");
                            return Claim::Reentered;
                        }
                        graph.waiting.insert(me, self.id());
                    }

                    state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
                    wait_graph().waiting.remove(&me);
                }
                None => {
                    *state = State::InProgress(me);
                    wait_graph().owners.insert(self.id(), me);
                    return Claim::Vacant(MemoGuard {
                        memo: self,
                        filled: false,
                    });
                }
            }
        }
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.lock() {
            State::Unstarted => "unstarted",
            State::InProgress(_) => "in-progress",
            State::Done(_) => "done",
            State::Poisoned => "poisoned",
        };
        f.debug_tuple("Memo").field(&state).finish()
    }
}

/// Exclusive right to compute a [`Memo`].
///
/// Dropping the guard without calling [`MemoGuard::fill`] poisons the cell.
pub struct MemoGuard<'a, T> {
    memo: &'a Memo<T>,
    filled: bool,
}

impl<T> MemoGuard<'_, T> {
    /// Store the computed value and wake any waiting threads.
    pub fn fill(mut self, value: T) {
        self.filled = true;
        self.memo.settle(State::Done(value));
    }
}

impl<T> Drop for MemoGuard<'_, T> {
    fn drop(&mut self) {
        if !self.filled {
            self.memo.settle(State::Poisoned);
        }
    }
}
