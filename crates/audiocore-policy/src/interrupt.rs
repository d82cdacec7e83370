//! Interrupt (focus) arbitration engine.

use crate::callback_worker::CallbackWorker;
use audiocore_types::{
    AudioFocusType, AudioInterrupt, ErrKind, FocusEdge, FocusGraph, FocusHint, FocusMode,
    ForceType, Result, SessionId, StreamType,
};
use parking_lot::Mutex;
use std::collections::HashMap;

/// `eventType` of an `InterruptEvent` dispatched to a session's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptEventType {
    /// A conflicting higher-priority session has just gained focus.
    Begin,
    /// The conflicting session has released focus; normal operation may resume.
    End,
}

/// What the incumbent/incoming session should do in response: `resume`,
/// `pause`, `stop`, `duck`, or `unduck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptHint {
    /// Stop rendering/capturing; resumable without a new focus request.
    Pause,
    /// Stop outright; requires a fresh activation to resume.
    Stop,
    /// Attenuate volume while the incumbent holds focus.
    Duck,
    /// A paused session may resume.
    Resume,
    /// A ducked session returns to full volume.
    Unduck,
}

/// One event delivered to a registered focus callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptEvent {
    /// The session this event is addressed to.
    pub session_id: SessionId,
    /// Whether the effect is starting or ending.
    pub event_type: InterruptEventType,
    /// The effect applied to `session_id`.
    pub force_type: ForceType,
    /// The corresponding client-facing hint.
    pub hint: InterruptHint,
}

/// Volume multiplier applied by the Service Adapter while a session is
/// ducked.
pub const DUCK_VOLUME: f32 = 0.2;

/// One row of the static interrupt policy table.
#[derive(Debug, Clone, Copy)]
struct PolicyRow {
    incumbent: StreamType,
    incoming: StreamType,
    force_type: ForceType,
    is_reject: bool,
}

/// The static `(incomingFocusType, activeFocusType) -> FocusEntry` table.
/// Rows not listed default to `ForceType::None` (share), never rejected:
/// voice call preempts everything; voice assistant ducks music-family
/// playback; ring/alarm coexist with lower-priority media by ducking it.
fn policy_lookup(incoming: StreamType, incumbent: StreamType) -> (ForceType, bool) {
    use StreamType::*;

    if incoming == VoiceCall {
        return match incumbent {
            VoiceCall => (ForceType::None, false),
            _ => (ForceType::Pause, false),
        };
    }
    if incumbent == VoiceCall {
        // Anything else arriving while a call is active is rejected outright.
        return (ForceType::None, true);
    }

    if incoming == VoiceAssistant {
        return match incumbent {
            Music | Movie | Game | Speech => (ForceType::Duck, false),
            _ => (ForceType::None, false),
        };
    }

    if incoming == Ring || incoming == Alarm {
        return match incumbent {
            Music | Movie | Game | Speech | Notification => (ForceType::Duck, false),
            _ => (ForceType::None, false),
        };
    }

    if incoming.priority_tier() == incumbent.priority_tier() {
        return (ForceType::None, false);
    }

    if incoming.priority_tier() < incumbent.priority_tier() {
        (ForceType::Pause, false)
    } else {
        (ForceType::None, false)
    }
}

type FocusCallback = Box<dyn FnMut(InterruptEvent) + Send>;

struct ActiveSession {
    interrupt: AudioInterrupt,
    focus_state: ActiveFocusState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveFocusState {
    Active,
    Ducked,
    Paused,
    Stopped,
}

struct Inner {
    callbacks: HashMap<SessionId, ()>,
    active: HashMap<SessionId, ActiveSession>,
    graph: FocusGraph,
}

/// `RequestAudioFocus`/`AbandonAudioFocus`'s single-slot predecessor: one
/// exclusive owner, no policy-table multiplexing.
struct LegacySlot {
    owner: Option<SessionId>,
}

/// Arbitrates focus between sessions via the static policy table, and
/// drives the legacy single-slot API for callers that don't multiplex.
pub struct InterruptEngine {
    inner: Mutex<Inner>,
    legacy: Mutex<LegacySlot>,
    dispatch: CallbackWorker<(SessionId, InterruptEvent)>,
}

impl InterruptEngine {
    /// Construct an engine whose callback worker hands every event to
    /// `on_event(session_id, event)`.
    pub fn new(mut on_event: impl FnMut(SessionId, InterruptEvent) + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                callbacks: HashMap::new(),
                active: HashMap::new(),
                graph: FocusGraph::new(),
            }),
            legacy: Mutex::new(LegacySlot { owner: None }),
            dispatch: CallbackWorker::new(move |(session, event)| on_event(session, event)),
        }
    }

    /// `SetCallback`: register that `session` has a live focus callback.
    /// Required before `activate` will accept requests for it.
    pub fn set_callback(&self, session: SessionId) {
        self.inner.lock().callbacks.insert(session, ());
    }

    /// `UnsetCallback`: only legal after the session has no active focus.
    pub fn unset_callback(&self, session: SessionId) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.active.contains_key(&session) {
            return Err(ErrKind::InvalidOperation(
                "cannot unset callback while focus is active".to_string(),
            ));
        }
        inner.callbacks.remove(&session);
        Ok(())
    }

    /// `ActivateAudioInterrupt(incoming)`.
    pub fn activate(&self, incoming: AudioInterrupt) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.callbacks.contains_key(&incoming.session_id) {
            return Err(ErrKind::InvalidOperation(
                "ActivateAudioInterrupt called without a registered callback".to_string(),
            ));
        }

        let incoming_type = incoming.focus_type.stream_type;

        let mut rejected = false;
        for active in inner.active.values() {
            let active_type = active.interrupt.focus_type.stream_type;
            let (_, is_reject) = policy_lookup(incoming_type, active_type);
            if is_reject {
                rejected = true;
                break;
            }
        }
        if rejected {
            return Err(ErrKind::InvalidOperation(
                "a higher-priority stream is holding focus".to_string(),
            ));
        }

        let mut effects = Vec::new();
        for (session, active) in inner.active.iter_mut() {
            let active_type = active.interrupt.focus_type.stream_type;
            let (force_type, _) = policy_lookup(incoming_type, active_type);
            match force_type {
                ForceType::None => continue,
                ForceType::Duck => {
                    active.focus_state = ActiveFocusState::Ducked;
                }
                ForceType::Pause | ForceType::Stop => {
                    active.focus_state = if force_type == ForceType::Stop {
                        ActiveFocusState::Stopped
                    } else {
                        ActiveFocusState::Paused
                    };
                }
            }
            let hint = match force_type {
                ForceType::Duck => InterruptHint::Duck,
                ForceType::Pause => InterruptHint::Pause,
                ForceType::Stop => InterruptHint::Stop,
                ForceType::None => unreachable!(),
            };
            effects.push((*session, force_type, hint));
        }

        for (session, force_type, hint) in &effects {
            inner.graph.add_edge(FocusEdge {
                from: *session,
                to: incoming.session_id,
                force_type: *force_type,
                hint: FocusHint::None,
            });
            self.dispatch.post((
                *session,
                InterruptEvent {
                    session_id: *session,
                    event_type: InterruptEventType::Begin,
                    force_type: *force_type,
                    hint: *hint,
                },
            ));
        }

        inner.active.insert(
            incoming.session_id,
            ActiveSession {
                interrupt: incoming,
                focus_state: ActiveFocusState::Active,
            },
        );
        Ok(())
    }

    /// `DeactivateAudioInterrupt(incoming)`.
    pub fn deactivate(&self, session_id: SessionId) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.active.contains_key(&session_id) {
            return Err(ErrKind::InvalidOperation(
                "DeactivateAudioInterrupt called without a prior successful activate".to_string(),
            ));
        }
        inner.active.remove(&session_id);

        let affected: Vec<FocusEdge> = inner
            .graph
            .effects_caused_by(session_id)
            .copied()
            .collect();
        inner.graph.remove_session(session_id);

        for edge in affected {
            if let Some(active) = inner.active.get_mut(&edge.from) {
                active.focus_state = ActiveFocusState::Active;
            }
            let hint = match edge.force_type {
                ForceType::Duck => InterruptHint::Unduck,
                _ => InterruptHint::Resume,
            };
            self.dispatch.post((
                edge.from,
                InterruptEvent {
                    session_id: edge.from,
                    event_type: InterruptEventType::End,
                    force_type: edge.force_type,
                    hint,
                },
            ));
        }
        Ok(())
    }

    /// `RequestAudioFocus`: legacy single-slot exclusive focus, independent
    /// of the policy table.
    pub fn request_legacy_focus(&self, session_id: SessionId) -> Result<()> {
        let mut slot = self.legacy.lock();
        if let Some(owner) = slot.owner {
            if owner != session_id {
                return Err(ErrKind::InvalidOperation(
                    "legacy focus already held by another session".to_string(),
                ));
            }
        }
        slot.owner = Some(session_id);
        Ok(())
    }

    /// `AbandonAudioFocus`.
    pub fn abandon_legacy_focus(&self, session_id: SessionId) {
        let mut slot = self.legacy.lock();
        if slot.owner == Some(session_id) {
            slot.owner = None;
        }
    }

    /// Current focus state for a session, for diagnostics/tests.
    pub fn focus_state_of(&self, session_id: SessionId) -> Option<()> {
        self.inner.lock().active.contains_key(&session_id).then_some(())
    }

    fn is_ducked(&self, session_id: SessionId) -> bool {
        self.inner
            .lock()
            .active
            .get(&session_id)
            .map(|s| s.focus_state == ActiveFocusState::Ducked)
            .unwrap_or(false)
    }

    fn is_paused(&self, session_id: SessionId) -> bool {
        self.inner
            .lock()
            .active
            .get(&session_id)
            .map(|s| matches!(s.focus_state, ActiveFocusState::Paused | ActiveFocusState::Stopped))
            .unwrap_or(false)
    }
}

/// Build an `AudioInterrupt` for a renderer session in `Share` mode, the
/// common case for app-initiated playback.
pub fn playback_interrupt(session_id: SessionId, stream_type: StreamType, pid: u32) -> AudioInterrupt {
    AudioInterrupt {
        session_id,
        focus_type: AudioFocusType {
            stream_type,
            source_type: None,
            is_play: true,
        },
        pause_when_ducked: false,
        pid,
        mode: FocusMode::Share,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn engine() -> (InterruptEngine, mpsc::Receiver<(SessionId, InterruptEvent)>) {
        let (tx, rx) = mpsc::channel();
        let engine = InterruptEngine::new(move |session, event| {
            let _ = tx.send((session, event));
        });
        (engine, rx)
    }

    #[test]
    fn activate_without_callback_is_rejected() {
        let (engine, _rx) = engine();
        let result = engine.activate(playback_interrupt(SessionId(1), StreamType::Music, 100));
        assert!(result.is_err());
    }

    #[test]
    fn voice_call_pauses_music() {
        let (engine, rx) = engine();
        engine.set_callback(SessionId(1));
        engine.set_callback(SessionId(2));
        engine
            .activate(playback_interrupt(SessionId(1), StreamType::Music, 100))
            .unwrap();
        engine
            .activate(playback_interrupt(SessionId(2), StreamType::VoiceCall, 200))
            .unwrap();

        let (session, event) = rx.recv().unwrap();
        assert_eq!(session, SessionId(1));
        assert_eq!(event.hint, InterruptHint::Pause);
        assert!(engine.is_paused(SessionId(1)));
    }

    #[test]
    fn voice_assistant_ducks_music_and_unducks_on_deactivate() {
        let (engine, rx) = engine();
        engine.set_callback(SessionId(1));
        engine.set_callback(SessionId(2));
        engine
            .activate(playback_interrupt(SessionId(1), StreamType::Music, 100))
            .unwrap();
        engine
            .activate(playback_interrupt(SessionId(2), StreamType::VoiceAssistant, 200))
            .unwrap();
        let (_, begin) = rx.recv().unwrap();
        assert_eq!(begin.hint, InterruptHint::Duck);
        assert!(engine.is_ducked(SessionId(1)));

        engine.deactivate(SessionId(2)).unwrap();
        let (_, end) = rx.recv().unwrap();
        assert_eq!(end.hint, InterruptHint::Unduck);
        assert!(!engine.is_ducked(SessionId(1)));
    }

    #[test]
    fn incumbent_voice_call_rejects_new_requests() {
        let (engine, _rx) = engine();
        engine.set_callback(SessionId(1));
        engine.set_callback(SessionId(2));
        engine
            .activate(playback_interrupt(SessionId(1), StreamType::VoiceCall, 100))
            .unwrap();
        let result = engine.activate(playback_interrupt(SessionId(2), StreamType::Music, 200));
        assert!(result.is_err());
    }

    #[test]
    fn unset_callback_fails_while_focus_active() {
        let (engine, _rx) = engine();
        engine.set_callback(SessionId(1));
        engine
            .activate(playback_interrupt(SessionId(1), StreamType::Music, 100))
            .unwrap();
        assert!(engine.unset_callback(SessionId(1)).is_err());
        engine.deactivate(SessionId(1)).unwrap();
        assert!(engine.unset_callback(SessionId(1)).is_ok());
    }

    #[test]
    fn deactivate_without_prior_activate_is_rejected() {
        let (engine, _rx) = engine();
        engine.set_callback(SessionId(1));
        let result = engine.deactivate(SessionId(1));
        assert!(result.is_err());
    }

    #[test]
    fn legacy_focus_is_single_slot() {
        let (engine, _rx) = engine();
        engine.request_legacy_focus(SessionId(1)).unwrap();
        assert!(engine.request_legacy_focus(SessionId(2)).is_err());
        engine.abandon_legacy_focus(SessionId(1));
        assert!(engine.request_legacy_focus(SessionId(2)).is_ok());
    }
}
