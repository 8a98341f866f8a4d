//! Hand-written fakes for the core traits, shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use haru_core::chat::{ChatRequest, InvocationOutcome};
use haru_core::display::{Point, Size};
use haru_core::session::{Role, Session, SessionStore, Turn, default_session_name};
use haru_core::surface::{SurfaceHost, SurfaceKind};
use haru_core::worker::{WorkerInvoker, WorkerStatus, WorkerSupervisor};
use haru_core::{HaruError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Create(SurfaceKind),
    Move(SurfaceKind, Point),
    Resize(SurfaceKind, Size),
    Show(SurfaceKind),
    Hide(SurfaceKind),
}

#[derive(Debug, Clone, Copy)]
struct FakeSurface {
    position: Point,
    size: Size,
    visible: bool,
}

impl FakeSurface {
    fn new(kind: SurfaceKind) -> Self {
        let size = match kind {
            SurfaceKind::Panel => Size::new(400, 600),
            SurfaceKind::Indicator => Size::new(80, 80),
        };
        Self {
            position: Point::default(),
            size,
            visible: false,
        }
    }
}

#[derive(Default)]
struct HostState {
    surfaces: HashMap<SurfaceKind, FakeSurface>,
    events: Vec<HostEvent>,
    fail_next: Option<SurfaceKind>,
    refuse_hide: Option<SurfaceKind>,
}

/// Records every backend call and tracks per-surface visibility.
#[derive(Default)]
pub struct FakeSurfaceHost {
    state: Mutex<HostState>,
}

impl FakeSurfaceHost {
    pub fn with_surfaces() -> Self {
        let host = Self::default();
        {
            let mut state = host.state.lock().unwrap();
            for kind in [SurfaceKind::Panel, SurfaceKind::Indicator] {
                state.surfaces.insert(kind, FakeSurface::new(kind));
            }
        }
        host
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.lock().unwrap().events.clear();
    }

    pub fn is_visible(&self, kind: SurfaceKind) -> bool {
        self.state
            .lock()
            .unwrap()
            .surfaces
            .get(&kind)
            .is_some_and(|surface| surface.visible)
    }

    pub fn position_of(&self, kind: SurfaceKind) -> Option<Point> {
        self.state
            .lock()
            .unwrap()
            .surfaces
            .get(&kind)
            .map(|surface| surface.position)
    }

    pub fn size_of(&self, kind: SurfaceKind) -> Option<Size> {
        self.state
            .lock()
            .unwrap()
            .surfaces
            .get(&kind)
            .map(|surface| surface.size)
    }

    /// Simulates the window being closed behind the controller's back.
    pub fn destroy(&self, kind: SurfaceKind) {
        self.state.lock().unwrap().surfaces.remove(&kind);
    }

    /// Simulates the window being moved by the OS.
    pub fn move_out_of_band(&self, kind: SurfaceKind, position: Point) {
        if let Some(surface) = self.state.lock().unwrap().surfaces.get_mut(&kind) {
            surface.position = position;
        }
    }

    /// The next mutating call on `kind` fails as if the window just vanished.
    pub fn fail_next_call(&self, kind: SurfaceKind) {
        self.state.lock().unwrap().fail_next = Some(kind);
    }

    /// Every hide of `kind` fails without losing the window.
    pub fn refuse_hide(&self, kind: SurfaceKind) {
        self.state.lock().unwrap().refuse_hide = Some(kind);
    }

    fn mutate(&self, kind: SurfaceKind, event: HostEvent, f: impl FnOnce(&mut FakeSurface)) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next == Some(kind) {
            state.fail_next = None;
            state.surfaces.remove(&kind);
            return Err(HaruError::surface(format!("{} window was destroyed", kind.label())));
        }
        let surface = state
            .surfaces
            .get_mut(&kind)
            .ok_or_else(|| HaruError::surface(format!("{} window missing", kind.label())))?;
        f(surface);
        state.events.push(event);
        Ok(())
    }
}

#[async_trait]
impl SurfaceHost for FakeSurfaceHost {
    async fn exists(&self, surface: SurfaceKind) -> bool {
        self.state.lock().unwrap().surfaces.contains_key(&surface)
    }

    async fn create(&self, surface: SurfaceKind) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.surfaces.insert(surface, FakeSurface::new(surface));
        state.events.push(HostEvent::Create(surface));
        Ok(())
    }

    async fn position(&self, surface: SurfaceKind) -> Result<Option<Point>> {
        Ok(self.position_of(surface))
    }

    async fn size(&self, surface: SurfaceKind) -> Result<Option<Size>> {
        Ok(self.size_of(surface))
    }

    async fn set_position(&self, surface: SurfaceKind, position: Point) -> Result<()> {
        self.mutate(surface, HostEvent::Move(surface, position), |s| {
            s.position = position;
        })
    }

    async fn set_size(&self, surface: SurfaceKind, size: Size) -> Result<()> {
        self.mutate(surface, HostEvent::Resize(surface, size), |s| s.size = size)
    }

    async fn show(&self, surface: SurfaceKind) -> Result<()> {
        self.mutate(surface, HostEvent::Show(surface), |s| s.visible = true)
    }

    async fn hide(&self, surface: SurfaceKind) -> Result<()> {
        if self.state.lock().unwrap().refuse_hide == Some(surface) {
            return Err(HaruError::internal(format!("{} refused to hide", surface.label())));
        }
        self.mutate(surface, HostEvent::Hide(surface), |s| s.visible = false)
    }
}

/// Replays queued outcomes; an empty queue means the worker cannot start.
#[derive(Default)]
pub struct ScriptedInvoker {
    outcomes: Mutex<VecDeque<InvocationOutcome>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedInvoker {
    pub fn replying(outcomes: impl IntoIterator<Item = InvocationOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn completed(stdout: &str) -> InvocationOutcome {
    InvocationOutcome::Completed {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

#[async_trait]
impl WorkerInvoker for ScriptedInvoker {
    async fn invoke(&self, request: &ChatRequest) -> InvocationOutcome {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| InvocationOutcome::SpawnFailed("no worker scripted".into()))
    }
}

/// Session store kept in memory; appends can be made to fail.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, (Session, Vec<Turn>)>>,
    fail_appends: AtomicBool,
}

impl MemorySessionStore {
    pub fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn list_sessions(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .map(|(session, _)| session.clone())
            .collect();
        sessions.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(sessions)
    }

    async fn create_session(&self) -> Result<Session> {
        let mut sessions = self.sessions.lock().unwrap();
        let now = Utc::now();
        let session = Session {
            id: format!("session_{}", sessions.len() + 1),
            name: default_session_name(now),
            created_at: now,
            modified_at: now,
        };
        sessions.insert(session.id.clone(), (session.clone(), Vec::new()));
        Ok(session)
    }

    async fn get_history(&self, session_id: &str) -> Result<Vec<Turn>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(session_id)
            .map(|(_, turns)| turns.clone())
            .unwrap_or_default())
    }

    async fn append_turn(&self, session_id: &str, role: Role, content: &str) -> Result<Turn> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(HaruError::io("disk full"));
        }
        let turn = Turn::new(role, content);
        let mut sessions = self.sessions.lock().unwrap();
        let (session, turns) = sessions
            .get_mut(session_id)
            .ok_or_else(|| HaruError::not_found("session", session_id))?;
        session.modified_at = turn.timestamp;
        turns.push(turn.clone());
        Ok(turn)
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.sessions.lock().unwrap().remove(session_id).is_some())
    }
}

/// Supervisor that only tracks state.
#[derive(Default)]
pub struct MemorySupervisor {
    statuses: Mutex<HashMap<String, WorkerStatus>>,
    stop_all_calls: Mutex<usize>,
}

impl MemorySupervisor {
    pub fn stop_all_calls(&self) -> usize {
        *self.stop_all_calls.lock().unwrap()
    }
}

#[async_trait]
impl WorkerSupervisor for MemorySupervisor {
    async fn start(&self, role: &str) -> Result<WorkerStatus> {
        let status = WorkerStatus::Running { pid: Some(4242) };
        self.statuses.lock().unwrap().insert(role.to_string(), status);
        Ok(status)
    }

    async fn stop(&self, role: &str) -> Result<bool> {
        let mut statuses = self.statuses.lock().unwrap();
        let was_running = statuses.get(role).is_some_and(WorkerStatus::is_running);
        if statuses.contains_key(role) {
            statuses.insert(role.to_string(), WorkerStatus::Stopped);
        }
        Ok(was_running)
    }

    async fn status(&self, role: &str) -> WorkerStatus {
        self.statuses
            .lock()
            .unwrap()
            .get(role)
            .copied()
            .unwrap_or(WorkerStatus::NotStarted)
    }

    async fn stop_all(&self) {
        *self.stop_all_calls.lock().unwrap() += 1;
        for status in self.statuses.lock().unwrap().values_mut() {
            *status = WorkerStatus::Stopped;
        }
    }
}
