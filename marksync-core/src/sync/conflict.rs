//! Whole-snapshot conflict resolution.
//!
//! The only signal is `lastUpdate`: whichever side is newer wins the round.

use crate::models::{Snapshot, Timestamp};

/// Which way a sync round goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Patch the local tree from the remote snapshot.
    ApplyRemote,
    /// Build a snapshot stamped `last_update` and publish it. `minted` is set
    /// when neither side had a timestamp and `last_update` was just created.
    PushLocal { last_update: Timestamp, minted: bool },
    NoOp,
}

/// What is known about the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteState {
    pub present: bool,
    pub last_update: Option<Timestamp>,
}

impl RemoteState {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(last_update: Option<Timestamp>) -> Self {
        Self {
            present: true,
            last_update,
        }
    }

    pub fn of(snapshot: Option<&Snapshot>) -> Self {
        match snapshot {
            Some(snapshot) => Self::present(snapshot.last_update),
            None => Self::absent(),
        }
    }
}

/// Decides the direction of a round.
///
/// A present remote wins if it is newer or the local side has never synced.
/// An absent remote is always pushed to, minting `now` if the local side has
/// no timestamp either. Equal timestamps, or a remote without one while the
/// local side has one, mean there is nothing to do.
pub fn decide(local: Option<Timestamp>, remote: RemoteState, now: Timestamp) -> Direction {
    if !remote.present {
        return match local {
            Some(last_update) => Direction::PushLocal {
                last_update,
                minted: false,
            },
            None => Direction::PushLocal {
                last_update: now,
                minted: true,
            },
        };
    }

    match (local, remote.last_update) {
        (None, _) => Direction::ApplyRemote,
        (Some(local), Some(remote)) if remote > local => Direction::ApplyRemote,
        (Some(local), Some(remote)) if local > remote => Direction::PushLocal {
            last_update: local,
            minted: false,
        },
        _ => Direction::NoOp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = 1_000_000;

    #[test]
    fn test_remote_newer_applies() {
        assert_eq!(
            decide(Some(100), RemoteState::present(Some(200)), NOW),
            Direction::ApplyRemote
        );
    }

    #[test]
    fn test_local_newer_pushes() {
        assert_eq!(
            decide(Some(200), RemoteState::present(Some(100)), NOW),
            Direction::PushLocal {
                last_update: 200,
                minted: false
            }
        );
    }

    #[test]
    fn test_equal_is_noop() {
        assert_eq!(
            decide(Some(100), RemoteState::present(Some(100)), NOW),
            Direction::NoOp
        );
    }

    #[test]
    fn test_bootstrap_mints_timestamp() {
        assert_eq!(
            decide(None, RemoteState::absent(), NOW),
            Direction::PushLocal {
                last_update: NOW,
                minted: true
            }
        );
    }

    #[test]
    fn test_never_synced_applies_present_remote() {
        assert_eq!(
            decide(None, RemoteState::present(Some(5)), NOW),
            Direction::ApplyRemote
        );
        assert_eq!(
            decide(None, RemoteState::present(None), NOW),
            Direction::ApplyRemote
        );
    }

    #[test]
    fn test_absent_remote_pushes_existing_timestamp() {
        assert_eq!(
            decide(Some(42), RemoteState::absent(), NOW),
            Direction::PushLocal {
                last_update: 42,
                minted: false
            }
        );
    }

    #[test]
    fn test_remote_without_timestamp_is_noop_for_synced_device() {
        assert_eq!(
            decide(Some(42), RemoteState::present(None), NOW),
            Direction::NoOp
        );
    }

    #[test]
    fn test_remote_state_of_snapshot() {
        assert_eq!(RemoteState::of(None), RemoteState::absent());
        assert_eq!(
            RemoteState::of(Some(&Snapshot::new(9))),
            RemoteState::present(Some(9))
        );
    }
}
