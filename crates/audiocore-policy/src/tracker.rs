//! Stream tracker: `sessionId -> StreamChangeInfo`, with
//! callbacks dispatched on every renderer/capturer state transition.

use crate::callback_worker::CallbackWorker;
use audiocore_types::{DeviceDescriptor, Result, SessionId, StreamState, StreamType};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Which tracking mode a `RegisterTracker` call is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerMode {
    /// Tracking a renderer (playback) session.
    Renderer,
    /// Tracking a capturer (recording) session.
    Capturer,
}

/// `StreamChangeInfo`: the snapshot held per tracked session.
#[derive(Debug, Clone)]
pub struct StreamChangeInfo {
    /// The session this snapshot describes.
    pub session_id: SessionId,
    /// Calling process's uid.
    pub client_uid: u32,
    /// Calling process's access token id.
    pub token_id: u64,
    /// The session's stream type.
    pub stream_type: StreamType,
    /// Current renderer or capturer state.
    pub state: StreamState,
    /// Device currently routed to this session, once selected.
    pub device: Option<DeviceDescriptor>,
}

/// What admin stop/resume (`UpdateStreamState`) asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminState {
    /// Force the matching sessions to pause.
    Pause,
    /// Resume the matching sessions.
    Resume,
}

struct Entry {
    mode: TrackerMode,
    info: StreamChangeInfo,
}

/// One event dispatched to every registered tracker listener.
#[derive(Debug, Clone)]
pub struct TrackerChangeEvent {
    /// The session whose state changed.
    pub session_id: SessionId,
    /// Whether this was a renderer or capturer session.
    pub mode: TrackerMode,
    /// The new state.
    pub state: StreamState,
}

/// Tracks every open renderer/capturer session and fans out state-change
/// notifications via a dedicated callback worker.
pub struct StreamTracker {
    entries: Mutex<HashMap<SessionId, Entry>>,
    dispatch: CallbackWorker<TrackerChangeEvent>,
}

impl StreamTracker {
    /// Construct a tracker whose callback worker hands every change event
    /// to `on_change`.
    pub fn new(mut on_change: impl FnMut(TrackerChangeEvent) + Send + 'static) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            dispatch: CallbackWorker::new(move |event| on_change(event)),
        }
    }

    /// `RegisterTracker(mode, changeInfo, clientTrackerCallback)`. The
    /// session id is assumed already derived from the sink-input index by
    /// the caller (the Service Adapter subscribe path owns that mapping).
    pub fn register(&self, mode: TrackerMode, info: StreamChangeInfo) {
        let session_id = info.session_id;
        let state = info.state;
        self.entries.lock().insert(session_id, Entry { mode, info });
        self.dispatch.post(TrackerChangeEvent {
            session_id,
            mode,
            state,
        });
    }

    /// Drop a session's tracking record (session released/disconnected).
    pub fn unregister(&self, session_id: SessionId) {
        self.entries.lock().remove(&session_id);
    }

    /// `UpdateTracker(mode, changeInfo)`: state-only update, dispatching a
    /// change event if the state actually differs.
    pub fn update(&self, session_id: SessionId, state: StreamState, device: Option<DeviceDescriptor>) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&session_id) else {
            return;
        };
        let changed = entry.info.state != state;
        entry.info.state = state;
        entry.info.device = device;
        let mode = entry.mode;
        drop(entries);
        if changed {
            self.dispatch.post(TrackerChangeEvent {
                session_id,
                mode,
                state,
            });
        }
    }

    /// `GetCurrentRendererChangeInfos()`.
    pub fn renderer_change_infos(&self) -> Vec<StreamChangeInfo> {
        self.entries
            .lock()
            .values()
            .filter(|e| e.mode == TrackerMode::Renderer)
            .map(|e| e.info.clone())
            .collect()
    }

    /// `GetCurrentCapturerChangeInfos()`.
    pub fn capturer_change_infos(&self) -> Vec<StreamChangeInfo> {
        self.entries
            .lock()
            .values()
            .filter(|e| e.mode == TrackerMode::Capturer)
            .map(|e| e.info.clone())
            .collect()
    }

    /// `UpdateStreamState(uid, setState, streamType)`: admin pause/resume
    /// used by power/UX layers, applied to every matching session for `uid`.
    pub fn update_stream_state_for_uid(
        &self,
        uid: u32,
        set_state: AdminState,
        stream_type: StreamType,
    ) -> Result<()> {
        let targets: Vec<(SessionId, StreamState, TrackerMode)> = self
            .entries
            .lock()
            .values()
            .filter(|e| e.info.client_uid == uid && e.info.stream_type == stream_type)
            .map(|e| {
                let next = apply_admin_state(e.info.state, set_state);
                (e.info.session_id, next, e.mode)
            })
            .collect();

        for (session_id, next_state, _mode) in &targets {
            self.update(*session_id, *next_state, None);
        }
        let _ = targets;
        Ok(())
    }
}

fn apply_admin_state(current: StreamState, set_state: AdminState) -> StreamState {
    use audiocore_types::{CapturerState, RendererState};
    match (current, set_state) {
        (StreamState::Renderer(RendererState::Running), AdminState::Pause) => {
            StreamState::Renderer(RendererState::Paused)
        }
        (StreamState::Renderer(RendererState::Paused), AdminState::Resume) => {
            StreamState::Renderer(RendererState::Running)
        }
        (StreamState::Capturer(CapturerState::Running), AdminState::Pause) => {
            StreamState::Capturer(CapturerState::Paused)
        }
        (StreamState::Capturer(CapturerState::Paused), AdminState::Resume) => {
            StreamState::Capturer(CapturerState::Running)
        }
        (other, _) => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiocore_types::RendererState;
    use std::sync::mpsc;

    fn info(session_id: SessionId) -> StreamChangeInfo {
        StreamChangeInfo {
            session_id,
            client_uid: 1000,
            token_id: 1,
            stream_type: StreamType::Music,
            state: StreamState::Renderer(RendererState::Prepared),
            device: None,
        }
    }

    #[test]
    fn register_and_snapshot_renderer() {
        let (tx, rx) = mpsc::channel();
        let tracker = StreamTracker::new(move |e| {
            let _ = tx.send(e);
        });
        tracker.register(TrackerMode::Renderer, info(SessionId(1)));
        let snap = tracker.renderer_change_infos();
        assert_eq!(snap.len(), 1);
        assert!(rx.recv().is_ok());
    }

    #[test]
    fn update_only_dispatches_on_real_change() {
        let (tx, rx) = mpsc::channel();
        let tracker = StreamTracker::new(move |e| {
            let _ = tx.send(e);
        });
        tracker.register(TrackerMode::Renderer, info(SessionId(1)));
        let _ = rx.recv().unwrap();

        tracker.update(
            SessionId(1),
            StreamState::Renderer(RendererState::Prepared),
            None,
        );
        assert!(rx.try_recv().is_err());

        tracker.update(
            SessionId(1),
            StreamState::Renderer(RendererState::Running),
            None,
        );
        assert!(rx.recv().is_ok());
    }

    #[test]
    fn admin_pause_resume_round_trips() {
        let (tx, _rx) = mpsc::channel();
        let tracker = StreamTracker::new(move |e| {
            let _ = tx.send(e);
        });
        let mut running = info(SessionId(1));
        running.state = StreamState::Renderer(RendererState::Running);
        tracker.register(TrackerMode::Renderer, running);

        tracker
            .update_stream_state_for_uid(1000, AdminState::Pause, StreamType::Music)
            .unwrap();
        assert_eq!(
            tracker.renderer_change_infos()[0].state,
            StreamState::Renderer(RendererState::Paused)
        );

        tracker
            .update_stream_state_for_uid(1000, AdminState::Resume, StreamType::Music)
            .unwrap();
        assert_eq!(
            tracker.renderer_change_infos()[0].state,
            StreamState::Renderer(RendererState::Running)
        );
    }

    #[test]
    fn unregister_removes_session() {
        let (tx, _rx) = mpsc::channel();
        let tracker = StreamTracker::new(move |e| {
            let _ = tx.send(e);
        });
        tracker.register(TrackerMode::Renderer, info(SessionId(1)));
        tracker.unregister(SessionId(1));
        assert!(tracker.renderer_change_infos().is_empty());
    }
}
