//! The mutable world: entity registry, draw order, scenes, input and
//! timer state, variables, sound state, and the owned backends.
//!
//! Block handlers mutate the world directly; the scheduler owns the
//! iteration order. Everything that must be observed consistently by the
//! compositor lives here so the embedder can snapshot between ticks.

use std::path::PathBuf;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use core_backend::{AudioBackend, Clock, StageSize};
use core_events::{InternalEvent, KeyCode};
use core_model::{ObjectInfo, ProjectDocument, SceneInfo};
use tracing::warn;

use crate::entity::{Entity, PenKind};
use crate::thread::ThreadId;
use crate::vars::{CloudMirror, VariableStore};

/// One emitted pen segment, in stage coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PenLine {
    pub owner: String,
    pub kind: PenKind,
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub color: String,
}

/// Deferred scene transition, applied by the engine between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneRequest {
    Goto(String),
    Next,
    Prev,
}

/// Pointer state, updated from the event drain.
#[derive(Debug, Clone, Default)]
pub struct Mouse {
    pub x: f64,
    pub y: f64,
    pub on_stage: bool,
    /// Button currently held.
    pub pressed: bool,
    /// Stage received a press during the current tick's drain.
    pub pressed_this_tick: bool,
    /// Topmost entity under the pointer at press time.
    pub pressed_object_id: Option<String>,
}

/// Project timer. Reads are derived from the clock so a running timer
/// needs no per-tick bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ProjectTimer {
    pub running: bool,
    pub visible: bool,
    accumulated_ms: u64,
    started_at_ms: u64,
}

impl ProjectTimer {
    pub fn value_ms(&self, now_ms: u64) -> u64 {
        let running_part = if self.running {
            now_ms.saturating_sub(self.started_at_ms)
        } else {
            0
        };
        self.accumulated_ms + running_part
    }

    pub fn start(&mut self, now_ms: u64) {
        if !self.running {
            self.running = true;
            self.started_at_ms = now_ms;
        }
    }

    pub fn stop(&mut self, now_ms: u64) {
        if self.running {
            self.accumulated_ms += now_ms.saturating_sub(self.started_at_ms);
            self.running = false;
        }
    }

    pub fn reset(&mut self) {
        self.accumulated_ms = 0;
        self.started_at_ms = 0;
        self.running = false;
    }
}

/// Global sound state. Volume/speed are engine-wide, not per-object.
/// The relative change blocks clamp volume to [0, 1] and speed to
/// [0.5, 2.0]; the direct set blocks write through unclamped.
#[derive(Debug, Clone)]
pub struct SoundState {
    pub volume: f64,
    pub speed: f64,
    pub bgm: Option<String>,
}

impl Default for SoundState {
    fn default() -> Self {
        Self {
            volume: 1.0,
            speed: 1.0,
            bgm: None,
        }
    }
}

pub struct World {
    pub stage: StageSize,
    pub target_fps: u32,
    pub project_name: String,

    /// Authored object data by object id.
    pub objects: AHashMap<String, Arc<ObjectInfo>>,
    /// Authored object order, the draw order a fresh world starts with.
    object_order: Vec<String>,
    /// Live entities by entity id (originals share the object id).
    entities: AHashMap<String, Entity>,
    /// Back-to-front draw order of entity ids; the UI's "front" is the
    /// end of the list.
    pub draw_order: Vec<String>,

    pub scenes: Vec<SceneInfo>,
    pub current_scene_id: String,
    pub start_scene_id: String,

    pub vars: VariableStore,
    pub mouse: Mouse,
    pub keys_down: AHashSet<KeyCode>,
    pub timer: ProjectTimer,
    pub sound: SoundState,

    pub pen_lines: Vec<PenLine>,
    /// Events raised during slices, drained at the next tick start.
    pub pending_internal: Vec<InternalEvent>,
    pub pending_scene: Option<SceneRequest>,
    pub restart_requested: bool,
    pub shutdown_requested: bool,

    pub audio: Box<dyn AudioBackend>,
    clock: Box<dyn Clock>,

    next_thread: u64,
    next_clone_serial: u64,
}

impl World {
    pub fn new(
        doc: &ProjectDocument,
        audio: Box<dyn AudioBackend>,
        clock: Box<dyn Clock>,
        cloud_mirror_path: Option<PathBuf>,
    ) -> Self {
        let mut objects = AHashMap::new();
        let mut entities = AHashMap::new();
        let mut draw_order = Vec::new();
        for info in &doc.objects {
            let info = Arc::new(info.clone());
            entities.insert(info.id.clone(), Entity::from_info(Arc::clone(&info)));
            draw_order.push(info.id.clone());
            objects.insert(info.id.clone(), info);
        }
        let vars = VariableStore::from_defs(
            doc.variables.clone(),
            CloudMirror::new(cloud_mirror_path),
        );
        Self {
            stage: StageSize::default(),
            target_fps: doc.target_fps,
            project_name: doc.name.clone(),
            objects,
            object_order: draw_order.clone(),
            entities,
            draw_order,
            scenes: doc.scenes.clone(),
            current_scene_id: doc.start_scene_id.clone(),
            start_scene_id: doc.start_scene_id.clone(),
            vars,
            mouse: Mouse::default(),
            keys_down: AHashSet::new(),
            timer: ProjectTimer::default(),
            sound: SoundState::default(),
            pen_lines: Vec::new(),
            pending_internal: Vec::new(),
            pending_scene: None,
            restart_requested: false,
            shutdown_requested: false,
            audio,
            clock,
            next_thread: 0,
            next_clone_serial: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Duration of one frame at the target fps, in milliseconds.
    pub fn frame_ms(&self) -> u64 {
        (1000 / self.target_fps.max(1)) as u64
    }

    pub fn next_thread_id(&mut self) -> ThreadId {
        self.next_thread += 1;
        ThreadId(self.next_thread)
    }

    // -- entity registry -------------------------------------------------

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &String> {
        self.draw_order.iter()
    }

    /// Scene an entity belongs to (clones inherit the original's scene).
    pub fn scene_of(&self, entity_id: &str) -> Option<&str> {
        self.entities
            .get(entity_id)
            .map(|e| e.info.scene_id.as_str())
    }

    pub fn entity_in_current_scene(&self, entity_id: &str) -> bool {
        self.scene_of(entity_id) == Some(self.current_scene_id.as_str())
    }

    /// Draw-order position, front meaning the end of the list.
    pub fn draw_index(&self, entity_id: &str) -> Option<usize> {
        self.draw_order.iter().position(|id| id == entity_id)
    }

    /// Create a clone of `source_id`. The clone copies live state,
    /// shares authored data, and is placed directly behind its source in
    /// the draw order. Dispatch of `when_clone_start` is deferred to the
    /// next tick via the internal event queue.
    pub fn spawn_clone(&mut self, source_id: &str) -> Option<String> {
        let Some(source) = self.entities.get(source_id) else {
            warn!(target: "state.registry", source = %source_id, "clone source not found");
            return None;
        };
        self.next_clone_serial += 1;
        let clone_id = format!("{}#clone{}", source.original_id, self.next_clone_serial);
        let clone = Entity::clone_from(source, clone_id.clone());
        let insert_at = self.draw_index(source_id).unwrap_or(0);
        self.draw_order.insert(insert_at, clone_id.clone());
        self.entities.insert(clone_id.clone(), clone);
        self.pending_internal.push(InternalEvent::CloneStarted {
            clone_id: clone_id.clone(),
        });
        Some(clone_id)
    }

    /// Remove an entity. Thread states die with it; the caller is
    /// responsible for not resuming threads of removed entities.
    pub fn delete_entity(&mut self, entity_id: &str) -> bool {
        if let Some(mut entity) = self.entities.remove(entity_id) {
            entity.terminate_all_threads();
            self.draw_order.retain(|id| id != entity_id);
            self.audio.stop(entity_id);
            true
        } else {
            false
        }
    }

    /// Delete every clone of `original_id`, returning the removed ids.
    pub fn remove_clones_of(&mut self, original_id: &str) -> Vec<String> {
        let doomed: Vec<String> = self
            .entities
            .values()
            .filter(|e| e.is_clone && e.original_id == original_id)
            .map(|e| e.id.clone())
            .collect();
        for id in &doomed {
            self.delete_entity(id);
        }
        doomed
    }

    /// Rebuild every entity from its authored state and restore the
    /// authored draw order. Clones disappear; thread states die with
    /// their entities.
    pub fn reset_entities(&mut self) {
        self.entities.clear();
        self.draw_order = self.object_order.clone();
        for id in &self.object_order {
            if let Some(info) = self.objects.get(id) {
                self.entities
                    .insert(id.clone(), Entity::from_info(Arc::clone(info)));
            }
        }
    }

    /// Delete all clones of every object (project restart).
    pub fn remove_all_clones(&mut self) {
        let doomed: Vec<String> = self
            .entities
            .values()
            .filter(|e| e.is_clone)
            .map(|e| e.id.clone())
            .collect();
        for id in &doomed {
            self.delete_entity(id);
        }
    }

    /// Topmost visible entity of the current scene containing the stage
    /// point, front of the draw order first.
    pub fn topmost_entity_at(&self, x: f64, y: f64) -> Option<&str> {
        self.draw_order
            .iter()
            .rev()
            .filter_map(|id| self.entities.get(id))
            .find(|e| {
                e.visible && self.entity_in_current_scene(&e.id) && e.contains_point(x, y)
            })
            .map(|e| e.id.as_str())
    }

    // -- draw order mutations -------------------------------------------

    pub fn bring_to_front(&mut self, entity_id: &str) {
        if let Some(pos) = self.draw_index(entity_id) {
            let id = self.draw_order.remove(pos);
            self.draw_order.push(id);
        }
    }

    pub fn send_to_back(&mut self, entity_id: &str) {
        if let Some(pos) = self.draw_index(entity_id) {
            let id = self.draw_order.remove(pos);
            self.draw_order.insert(0, id);
        }
    }

    pub fn move_forward(&mut self, entity_id: &str) {
        if let Some(pos) = self.draw_index(entity_id)
            && pos + 1 < self.draw_order.len()
        {
            self.draw_order.swap(pos, pos + 1);
        }
    }

    pub fn move_backward(&mut self, entity_id: &str) {
        if let Some(pos) = self.draw_index(entity_id)
            && pos > 0
        {
            self.draw_order.swap(pos, pos - 1);
        }
    }

    // -- scene bookkeeping ----------------------------------------------

    pub fn scene_index(&self, scene_id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == scene_id)
    }

    pub fn scene_exists(&self, scene_id: &str) -> bool {
        self.scene_index(scene_id).is_some()
    }

    /// Wrapping next/previous scene id relative to the current scene.
    pub fn neighbor_scene_id(&self, forward: bool) -> Option<String> {
        let count = self.scenes.len();
        if count == 0 {
            return None;
        }
        let current = self.scene_index(&self.current_scene_id).unwrap_or(0);
        let target = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
        Some(self.scenes[target].id.clone())
    }

    // -- answer ----------------------------------------------------------

    /// Store submitted `ask_and_wait` text into the distinguished answer
    /// slot, if the project declares one.
    pub fn set_answer(&mut self, text: &str) {
        if let Some(entry) = self.vars.answer_entry_mut() {
            entry.value = core_value::Value::string(text.to_owned());
        }
    }

    pub fn answer(&mut self) -> String {
        self.vars
            .iter()
            .find(|e| e.kind == core_model::VariableKind::Answer)
            .map(|e| e.value.as_string())
            .unwrap_or_default()
    }
}
