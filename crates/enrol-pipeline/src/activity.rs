//! Per-role in-flight indicators and generation tickets.
//!
//! An indicator is held for the duration of one operation and rejects
//! re-entry for the same (role, activity). A ticket remembers the generation
//! an operation started in; once the generation moves on (a form reset), the
//! operation's late result is dropped instead of applied.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use enrol_core::person::Role;

/// The kind of network work a role can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
  /// Upload and OCR of an identity document.
  Scanning,
  /// An existence lookup for a typed or scanned identifier.
  Verifying,
}

impl Activity {
  fn index(self) -> usize {
    match self {
      Activity::Scanning => 0,
      Activity::Verifying => 1,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket {
  role:       Role,
  activity:   Activity,
  generation: u64,
}

/// Clears its indicator when dropped.
#[derive(Debug)]
pub(crate) struct BusyGuard<'a> {
  flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) { self.flag.store(false, Ordering::Release); }
}

#[derive(Debug, Default)]
pub(crate) struct ActivityBoard {
  busy:        [[AtomicBool; 2]; 2],
  generations: [[AtomicU64; 2]; 2],
}

impl ActivityBoard {
  /// Raise the indicator, or `None` if it is already raised.
  pub fn try_begin(&self, role: Role, activity: Activity) -> Option<BusyGuard<'_>> {
    let flag = &self.busy[role.index()][activity.index()];
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| BusyGuard { flag })
  }

  pub fn is_busy(&self, role: Role, activity: Activity) -> bool {
    self.busy[role.index()][activity.index()].load(Ordering::Acquire)
  }

  /// Start a new generation for (role, activity) and return its ticket.
  pub fn issue(&self, role: Role, activity: Activity) -> Ticket {
    let counter = &self.generations[role.index()][activity.index()];
    let generation = counter.fetch_add(1, Ordering::AcqRel) + 1;
    Ticket { role, activity, generation }
  }

  pub fn is_current(&self, ticket: &Ticket) -> bool {
    self.generations[ticket.role.index()][ticket.activity.index()]
      .load(Ordering::Acquire)
      == ticket.generation
  }

  /// Make every outstanding ticket stale.
  pub fn invalidate_all(&self) {
    for row in &self.generations {
      for counter in row {
        counter.fetch_add(1, Ordering::AcqRel);
      }
    }
  }
}
