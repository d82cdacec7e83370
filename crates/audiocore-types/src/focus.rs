//! Interrupt (focus) arbitration vocabulary.

use crate::session::SessionId;
use crate::stream_type::StreamType;

/// Source of a capture-side interrupt request. Mirrors `StreamType` but
/// deliberately kept as its own type: a capture session's "content" is not
/// one of the fourteen playback stream types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// General voice/media capture.
    Mic,
    /// Voice call uplink capture.
    VoiceCallUp,
    /// Voice recognition capture (ducked rather than paused by default).
    VoiceRecognition,
}

/// What a session is asking the interrupt engine to arbitrate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFocusType {
    /// Playback stream type, when `is_play` is true.
    pub stream_type: StreamType,
    /// Capture source type, when `is_play` is false.
    pub source_type: Option<SourceType>,
    /// True for a renderer requesting focus, false for a capturer.
    pub is_play: bool,
}

/// Whether a client shares focus concurrently with others at its tier, or
/// expects exclusive use while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Concurrent with other sessions the policy table allows to coexist.
    Share,
    /// Exclusive: any lower-priority incumbent is always interrupted.
    Independent,
}

/// One request to the interrupt arbitration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInterrupt {
    /// Session this request is for.
    pub session_id: SessionId,
    /// What's being requested.
    pub focus_type: AudioFocusType,
    /// Whether the session should auto-pause (vs. stay active but ducked)
    /// when a conflicting higher-priority stream becomes active.
    pub pause_when_ducked: bool,
    /// Calling process id, used to scope "abandon all for pid" cleanup.
    pub pid: u32,
    /// Sharing semantics for this request.
    pub mode: FocusMode,
}

/// The effect a higher-priority incumbent has on a lower-priority request,
/// or vice versa — one row of the interrupt policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceType {
    /// No effect; both streams proceed concurrently.
    None,
    /// The lower-priority stream is ducked (volume attenuated).
    Duck,
    /// The lower-priority stream is paused; resumes when the incumbent yields.
    Pause,
    /// The lower-priority stream is stopped outright; does not auto-resume.
    Stop,
}

/// A hint carried alongside a `ForceType`, used by policy table lookups that
/// distinguish "same stream type" or "independent mode" special cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusHint {
    /// No special casing.
    None,
    /// The incoming and incumbent streams share a stream type.
    SameStreamType,
    /// The incumbent requested `FocusMode::Independent`.
    IncumbentIndependent,
}

/// One row of the static interrupt policy table: what happens to an
/// incumbent of `incumbent` type when `incoming` type requests focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEntry {
    /// Stream type already holding focus.
    pub incumbent: StreamType,
    /// Stream type requesting focus.
    pub incoming: StreamType,
    /// Effect on the incumbent.
    pub force_type: ForceType,
    /// Disambiguating hint for table lookups.
    pub hint: FocusHint,
    /// Whether the incoming request is itself allowed to proceed (false
    /// means the incoming request is rejected and never gains focus).
    pub action_on: bool,
    /// True iff the incoming request should be rejected outright rather
    /// than silently granted with no incumbent effect.
    pub is_reject: bool,
}

/// A directed edge in the focus graph: "while `from` holds focus with
/// `force_type` active against it, `to` is the incumbent responsible".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEdge {
    /// The ducked/paused session.
    pub from: SessionId,
    /// The session responsible for the effect.
    pub to: SessionId,
    /// Effect `to` has on `from`.
    pub force_type: ForceType,
    /// Disambiguating hint recorded alongside the effect.
    pub hint: FocusHint,
}

/// The live set of focus relationships, maintained by
/// `audiocore_policy::interrupt` as sessions gain and lose focus.
#[derive(Debug, Clone, Default)]
pub struct FocusGraph {
    edges: Vec<FocusEdge>,
}

impl FocusGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    /// Record that `to` is forcing `force_type` on `from`.
    pub fn add_edge(&mut self, edge: FocusEdge) {
        self.edges.push(edge);
    }

    /// Remove every edge naming `session` as either endpoint. Called when a
    /// session abandons or loses focus entirely.
    pub fn remove_session(&mut self, session: SessionId) {
        self.edges
            .retain(|e| e.from != session && e.to != session);
    }

    /// Edges where `session` is the ducked/paused party.
    pub fn incoming_effects_on(&self, session: SessionId) -> impl Iterator<Item = &FocusEdge> {
        self.edges.iter().filter(move |e| e.from == session)
    }

    /// Edges where `session` is the incumbent responsible for an effect.
    pub fn effects_caused_by(&self, session: SessionId) -> impl Iterator<Item = &FocusEdge> {
        self.edges.iter().filter(move |e| e.to == session)
    }

    /// Total edge count, mainly for tests.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_session_drops_edges_on_either_side() {
        let mut g = FocusGraph::new();
        g.add_edge(FocusEdge {
            from: SessionId(1),
            to: SessionId(2),
            force_type: ForceType::Duck,
            hint: FocusHint::None,
        });
        g.add_edge(FocusEdge {
            from: SessionId(3),
            to: SessionId(1),
            force_type: ForceType::Pause,
            hint: FocusHint::None,
        });
        assert_eq!(g.len(), 2);
        g.remove_session(SessionId(1));
        assert!(g.is_empty());
    }

    #[test]
    fn incoming_and_outgoing_queries_are_distinct() {
        let mut g = FocusGraph::new();
        g.add_edge(FocusEdge {
            from: SessionId(1),
            to: SessionId(2),
            force_type: ForceType::Duck,
            hint: FocusHint::None,
        });
        assert_eq!(g.incoming_effects_on(SessionId(1)).count(), 1);
        assert_eq!(g.effects_caused_by(SessionId(2)).count(), 1);
        assert_eq!(g.incoming_effects_on(SessionId(2)).count(), 0);
    }
}
