//! The TCP lifecycle transition table (spec.md §4.7), kept separate from the
//! tracker so the table itself is unit-testable without a DashMap in play.

use super::connection::TcpState;
use crate::parser::TcpFlags;

/// The outcome of feeding one packet's flags to a connection in a given
/// state: the state to move to (if any), whether the record should be
/// removed from the map afterward, and which event (if any) to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: Option<TcpState>,
    pub terminal: bool,
    pub emit_opened: bool,
    pub emit_state_change: bool,
    pub emit_closed: bool,
}

impl Transition {
    fn none() -> Self {
        Transition {
            next: None,
            terminal: false,
            emit_opened: false,
            emit_state_change: false,
            emit_closed: false,
        }
    }

    fn to(state: TcpState) -> Self {
        Transition {
            next: Some(state),
            ..Transition::none()
        }
    }

    fn opened(state: TcpState) -> Self {
        Transition {
            emit_opened: true,
            ..Transition::to(state)
        }
    }

    fn state_change(state: TcpState) -> Self {
        Transition {
            emit_state_change: true,
            ..Transition::to(state)
        }
    }

    fn closed(state: TcpState) -> Self {
        Transition {
            terminal: true,
            emit_closed: true,
            ..Transition::to(state)
        }
    }
}

/// Drive the state machine one packet forward. A packet with RST set closes
/// the connection immediately regardless of its current state; every other
/// transition is keyed on (current state, flag pattern) alone. Flag patterns
/// that don't match any row leave the connection in its current state
/// (`next: None`) — counters still accumulate in the caller.
pub fn next_state(current: TcpState, flags: TcpFlags) -> Transition {
    if flags.rst() {
        return Transition::closed(TcpState::Closed);
    }

    match current {
        TcpState::Closed if flags.syn() && !flags.ack() => Transition::opened(TcpState::SynSent),
        TcpState::SynSent if flags.syn() && flags.ack() => Transition::to(TcpState::SynReceived),
        TcpState::SynReceived if flags.ack() && !flags.syn() => {
            Transition::state_change(TcpState::Established)
        }
        TcpState::Established if flags.fin() => Transition::to(TcpState::FinWait1),
        TcpState::FinWait1 if flags.ack() && !flags.fin() => Transition::to(TcpState::FinWait2),
        TcpState::FinWait1 if flags.fin() => Transition::to(TcpState::LastAck),
        TcpState::FinWait2 if flags.fin() => Transition::closed(TcpState::TimeWait),
        TcpState::LastAck if flags.ack() => Transition::closed(TcpState::Closed),
        _ => Transition::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_path() {
        let t = next_state(TcpState::Closed, TcpFlags(0x02));
        assert_eq!(t.next, Some(TcpState::SynSent));
        assert!(t.emit_opened);

        let t = next_state(TcpState::SynSent, TcpFlags(0x12));
        assert_eq!(t.next, Some(TcpState::SynReceived));

        let t = next_state(TcpState::SynReceived, TcpFlags(0x10));
        assert_eq!(t.next, Some(TcpState::Established));
        assert!(t.emit_state_change);
    }

    #[test]
    fn teardown_path_via_fin_wait() {
        let t = next_state(TcpState::Established, TcpFlags(0x01));
        assert_eq!(t.next, Some(TcpState::FinWait1));

        let t = next_state(TcpState::FinWait1, TcpFlags(0x10));
        assert_eq!(t.next, Some(TcpState::FinWait2));

        let t = next_state(TcpState::FinWait2, TcpFlags(0x01));
        assert_eq!(t.next, Some(TcpState::TimeWait));
        assert!(t.terminal);
        assert!(t.emit_closed);
    }

    #[test]
    fn teardown_path_via_last_ack() {
        let t = next_state(TcpState::FinWait1, TcpFlags(0x01));
        assert_eq!(t.next, Some(TcpState::LastAck));

        let t = next_state(TcpState::LastAck, TcpFlags(0x10));
        assert_eq!(t.next, Some(TcpState::Closed));
        assert!(t.terminal);
        assert!(t.emit_closed);
    }

    #[test]
    fn rst_closes_from_any_state() {
        for state in [
            TcpState::SynSent,
            TcpState::SynReceived,
            TcpState::Established,
            TcpState::FinWait1,
            TcpState::FinWait2,
            TcpState::LastAck,
        ] {
            let t = next_state(state, TcpFlags(0x04));
            assert_eq!(t.next, Some(TcpState::Closed));
            assert!(t.terminal);
            assert!(t.emit_closed);
        }
    }

    #[test]
    fn unmatched_flag_pattern_leaves_state_unchanged() {
        let t = next_state(TcpState::Established, TcpFlags(0x10));
        assert_eq!(t.next, None);
    }
}
