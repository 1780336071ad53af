// Test doubles shared by the unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::popup::{CursorSource, PopupEmitter, PopupEvent};
use crate::replay::{OutputController, OutputError, OutputFactory, ReplayDispatcher, ReplayPlan, SynthKey};
use crate::shortcuts::{
    Macro, MouseButton, RegistryError, Scope, ShortcutStore, TextExpansion, TriggerLookup, TriggerSpec,
};

/// One call observed by RecordingOutput
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Press(SynthKey),
    Release(SynthKey),
    Type(String),
    Move(i32, i32),
    Click(MouseButton),
    MousePress(MouseButton),
    MouseRelease(MouseButton),
}

type CallLog = Arc<Mutex<Vec<(Call, Instant)>>>;

/// OutputController that records calls, optionally failing at the Nth attempt
pub struct RecordingOutput {
    log: CallLog,
    attempts: Arc<AtomicUsize>,
    fail_at: Option<usize>,
}

impl RecordingOutput {
    fn record(&mut self, call: Call) -> Result<(), OutputError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(attempt) {
            return Err(OutputError::Input(format!("rejected {:?}", call)));
        }
        self.log.lock().push((call, Instant::now()));
        Ok(())
    }
}

impl OutputController for RecordingOutput {
    fn press(&mut self, key: SynthKey) -> Result<(), OutputError> {
        self.record(Call::Press(key))
    }

    fn release(&mut self, key: SynthKey) -> Result<(), OutputError> {
        self.record(Call::Release(key))
    }

    fn type_text(&mut self, text: &str) -> Result<(), OutputError> {
        self.record(Call::Type(text.to_string()))
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<(), OutputError> {
        self.record(Call::Move(x, y))
    }

    fn click(&mut self, button: MouseButton, times: u32) -> Result<(), OutputError> {
        for _ in 0..times {
            self.record(Call::Click(button))?;
        }
        Ok(())
    }

    fn mouse_press(&mut self, button: MouseButton) -> Result<(), OutputError> {
        self.record(Call::MousePress(button))
    }

    fn mouse_release(&mut self, button: MouseButton) -> Result<(), OutputError> {
        self.record(Call::MouseRelease(button))
    }
}

/// Factory handing out RecordingOutputs that share one call log
pub struct RecordingFactory {
    log: CallLog,
    attempts: Arc<AtomicUsize>,
    fail_open: bool,
    fail_at: Option<usize>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
            fail_at: None,
        }
    }

    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::new()
        }
    }

    /// Outputs reject call attempt `index` (0-based, shared by all outputs);
    /// every other attempt succeeds
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new()
        }
    }

    pub fn output(&self) -> RecordingOutput {
        RecordingOutput {
            log: self.log.clone(),
            attempts: self.attempts.clone(),
            fail_at: self.fail_at,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Call, Instant)> {
        self.log.lock().clone()
    }

    /// Poll until at least `count` calls were recorded or `timeout` passes
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> Vec<Call> {
        let deadline = Instant::now() + timeout;
        while self.log.lock().len() < count && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.calls()
    }
}

impl OutputFactory for RecordingFactory {
    fn open(&self) -> Result<Box<dyn OutputController>, OutputError> {
        if self.fail_open {
            return Err(OutputError::Init("no display".to_string()));
        }
        Ok(Box::new(self.output()))
    }
}

/// ReplayDispatcher that keeps plans instead of running them
#[derive(Default)]
pub struct CapturingDispatcher {
    plans: Mutex<Vec<ReplayPlan>>,
}

impl CapturingDispatcher {
    pub fn plans(&self) -> Vec<ReplayPlan> {
        self.plans.lock().clone()
    }
}

impl ReplayDispatcher for CapturingDispatcher {
    fn dispatch(&self, plan: ReplayPlan) {
        self.plans.lock().push(plan);
    }
}

/// PopupEmitter that collects events in order
#[derive(Default)]
pub struct CollectingEmitter {
    events: Mutex<Vec<PopupEvent>>,
}

impl CollectingEmitter {
    pub fn events(&self) -> Vec<PopupEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<PopupEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl PopupEmitter for CollectingEmitter {
    fn emit(&self, event: PopupEvent) {
        self.events.lock().push(event);
    }
}

/// CursorSource with fixed answers
pub struct FixedCursor {
    pub position: Option<(i32, i32)>,
    pub screen: Option<(i32, i32)>,
}

impl CursorSource for FixedCursor {
    fn cursor_position(&self) -> Option<(i32, i32)> {
        self.position
    }

    fn screen_size(&self) -> Option<(i32, i32)> {
        self.screen
    }
}

/// TriggerLookup over fixed lists
#[derive(Default)]
pub struct StaticLookup {
    pub expansions: Mutex<Vec<TextExpansion>>,
    pub macros: Mutex<Vec<Macro>>,
    pub unavailable: AtomicBool,
}

impl StaticLookup {
    fn check(&self) -> Result<(), RegistryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable("offline".to_string()));
        }
        Ok(())
    }
}

impl TriggerLookup for StaticLookup {
    fn text_expansions(&self, _scope: &Scope) -> Result<Arc<Vec<TextExpansion>>, RegistryError> {
        self.check()?;
        Ok(Arc::new(self.expansions.lock().clone()))
    }

    fn macros(&self, _scope: &Scope) -> Result<Arc<Vec<Macro>>, RegistryError> {
        self.check()?;
        Ok(Arc::new(self.macros.lock().clone()))
    }

    fn search(&self, _scope: &Scope, query: &str) -> Result<Arc<Vec<TextExpansion>>, RegistryError> {
        self.check()?;
        Ok(Arc::new(
            self.expansions
                .lock()
                .iter()
                .filter(|e| query.is_empty() || e.matches_query(query))
                .cloned()
                .collect(),
        ))
    }
}

#[derive(Default)]
struct ScopeRecords {
    expansions: Vec<TextExpansion>,
    macros: Vec<Macro>,
}

/// In-memory ShortcutStore with call counting and an outage switch
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Scope, ScopeRecords>>,
    pub list_calls: AtomicUsize,
    pub unavailable: AtomicBool,
    pub stall: Mutex<Option<Duration>>,
}

impl MemoryStore {
    async fn check(&self) -> Result<(), RegistryError> {
        let stall = *self.stall.lock();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable("offline".to_string()));
        }
        Ok(())
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShortcutStore for MemoryStore {
    async fn list_text_expansions(&self, scope: &Scope) -> Result<Vec<TextExpansion>, RegistryError> {
        self.check().await?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .get(scope)
            .map(|r| r.expansions.clone())
            .unwrap_or_default())
    }

    async fn insert_text_expansion(&self, scope: &Scope, entry: &TextExpansion) -> Result<(), RegistryError> {
        self.check().await?;
        self.records
            .lock()
            .entry(scope.clone())
            .or_default()
            .expansions
            .push(entry.clone());
        Ok(())
    }

    async fn update_text_expansion(&self, scope: &Scope, entry: &TextExpansion) -> Result<(), RegistryError> {
        self.check().await?;
        let mut records = self.records.lock();
        let slot = records
            .get_mut(scope)
            .and_then(|r| r.expansions.iter_mut().find(|e| e.id == entry.id))
            .ok_or_else(|| RegistryError::NotFound(entry.id.clone()))?;
        *slot = entry.clone();
        Ok(())
    }

    async fn delete_text_expansion(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        self.check().await?;
        let mut records = self.records.lock();
        let r = records
            .get_mut(scope)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let before = r.expansions.len();
        r.expansions.retain(|e| e.id != id);
        if r.expansions.len() == before {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_macros(&self, scope: &Scope) -> Result<Vec<Macro>, RegistryError> {
        self.check().await?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .get(scope)
            .map(|r| r.macros.clone())
            .unwrap_or_default())
    }

    async fn get_macro(&self, scope: &Scope, id: &str) -> Result<Option<Macro>, RegistryError> {
        self.check().await?;
        Ok(self
            .records
            .lock()
            .get(scope)
            .and_then(|r| r.macros.iter().find(|m| m.id == id).cloned()))
    }

    async fn insert_macro(&self, scope: &Scope, item: &Macro) -> Result<(), RegistryError> {
        self.check().await?;
        self.records
            .lock()
            .entry(scope.clone())
            .or_default()
            .macros
            .push(item.clone());
        Ok(())
    }

    async fn update_macro(&self, scope: &Scope, item: &Macro) -> Result<Vec<String>, RegistryError> {
        self.check().await?;
        let mut records = self.records.lock();
        let r = records
            .get_mut(scope)
            .filter(|r| r.macros.iter().any(|m| m.id == item.id))
            .ok_or_else(|| RegistryError::NotFound(item.id.clone()))?;

        let mut deactivated = Vec::new();
        for m in r.macros.iter_mut() {
            if m.id == item.id {
                *m = item.clone();
            } else if let TriggerSpec::AltKey(key) = item.trigger {
                if item.active && m.active && m.trigger.is_alt_key(key) {
                    m.active = false;
                    deactivated.push(m.id.clone());
                }
            }
        }
        Ok(deactivated)
    }

    async fn delete_macro(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        self.check().await?;
        let mut records = self.records.lock();
        let r = records
            .get_mut(scope)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let before = r.macros.len();
        r.macros.retain(|m| m.id != id);
        if r.macros.len() == before {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn activate_macro(&self, scope: &Scope, id: &str) -> Result<Vec<String>, RegistryError> {
        self.check().await?;
        let mut records = self.records.lock();
        let r = records
            .get_mut(scope)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let trigger = r
            .macros
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.trigger.clone())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let mut deactivated = Vec::new();
        for m in r.macros.iter_mut() {
            if m.id == id {
                m.active = true;
            } else if let TriggerSpec::AltKey(key) = trigger {
                if m.active && m.trigger.is_alt_key(key) {
                    m.active = false;
                    deactivated.push(m.id.clone());
                }
            }
        }
        Ok(deactivated)
    }

    async fn deactivate_macro(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        self.check().await?;
        let mut records = self.records.lock();
        let m = records
            .get_mut(scope)
            .and_then(|r| r.macros.iter_mut().find(|m| m.id == id))
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        m.active = false;
        Ok(())
    }
}

pub fn expansion(name: &str, trigger: Option<&str>, replacement: &str) -> TextExpansion {
    TextExpansion {
        id: format!("te-{}", name),
        name: name.to_string(),
        trigger: trigger.map(|t| t.to_string()),
        replacement: replacement.to_string(),
    }
}
