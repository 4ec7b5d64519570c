//! Engine facade: input drain, trigger dispatch, tick loop, scene
//! controller, restart.

use std::path::PathBuf;
use std::sync::Arc;

use core_backend::{AudioBackend, Clock};
use core_events::{InputEvent, InternalEvent};
use core_model::{ProjectDocument, Script};
use core_state::{PenLine, SceneRequest, ScriptThreadState, ThreadId, WaitKind, World};
use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::bus::{EventBus, ScriptRef};
use crate::scheduler;

pub struct Engine {
    pub world: World,
    bus: EventBus,
    /// Host input, drained once per tick. Either fed by `inject` (tests,
    /// scripted scenarios) or a channel from the window thread.
    input_queue: Vec<InputEvent>,
    input_rx: Option<Receiver<InputEvent>>,
}

impl Engine {
    pub fn new(
        doc: &ProjectDocument,
        audio: Box<dyn AudioBackend>,
        clock: Box<dyn Clock>,
        cloud_mirror_path: Option<PathBuf>,
    ) -> Self {
        let world = World::new(doc, audio, clock, cloud_mirror_path);
        let bus = EventBus::build(world.objects.values().cloned());
        info!(
            target: "engine",
            project = %world.project_name,
            objects = world.draw_order.len(),
            scenes = world.scenes.len(),
            fps = world.target_fps,
            "engine ready"
        );
        Self {
            world,
            bus,
            input_queue: Vec::new(),
            input_rx: None,
        }
    }

    /// Attach a host input channel (the window loop's sender).
    pub fn set_input_channel(&mut self, rx: Receiver<InputEvent>) {
        self.input_rx = Some(rx);
    }

    /// Queue one input event for the next tick.
    pub fn inject(&mut self, event: InputEvent) {
        self.input_queue.push(event);
    }

    /// Fire the start trigger: every `when_run_button_click` script of an
    /// entity in the starting scene gets a fresh thread.
    pub fn start(&mut self) {
        info!(target: "engine", scene = %self.world.current_scene_id, "start clicked");
        for script_ref in self.bus.start.clone() {
            self.dispatch_scene_scoped(&script_ref);
        }
    }

    pub fn shutdown_requested(&self) -> bool {
        self.world.shutdown_requested
    }

    /// Take the pen segments accumulated since the last call; the
    /// compositor stamps them into its trail buffer.
    pub fn take_pen_lines(&mut self) -> Vec<PenLine> {
        std::mem::take(&mut self.world.pen_lines)
    }

    /// One scheduler iteration.
    pub fn tick(&mut self) {
        self.world.mouse.pressed_this_tick = false;
        self.drain_input();
        self.drain_internal();
        scheduler::run_ready_threads(&mut self.world);
        scheduler::update_dialogs(&mut self.world);
        self.apply_deferred();
    }

    // -- dispatch -------------------------------------------------------

    /// Dispatch a script on its owning entity if that entity belongs to
    /// the current scene.
    fn dispatch_scene_scoped(&mut self, script_ref: &ScriptRef) {
        if self.world.entity_in_current_scene(&script_ref.object_id) {
            Self::dispatch_on(&mut self.world, &script_ref.object_id, &script_ref.script);
        }
    }

    /// Create a thread state for `script` on `entity_id`.
    fn dispatch_on(world: &mut World, entity_id: &str, script: &Arc<Script>) -> Option<ThreadId> {
        if world.entity(entity_id).is_none() {
            warn!(target: "engine.bus", entity = %entity_id, "dispatch target missing");
            return None;
        }
        let thread_id = world.next_thread_id();
        let scene = world.current_scene_id.clone();
        let state = ScriptThreadState::new(Arc::clone(script), scene);
        world
            .entity_mut(entity_id)
            .expect("entity checked above")
            .threads
            .insert(thread_id, state);
        Some(thread_id)
    }

    // -- input ----------------------------------------------------------

    fn drain_input(&mut self) {
        if let Some(rx) = &self.input_rx {
            while let Ok(event) = rx.try_recv() {
                self.input_queue.push(event);
            }
        }
        for event in std::mem::take(&mut self.input_queue) {
            self.handle_input(event);
        }
    }

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                // Ignore auto-repeat: dispatch only on the edge.
                if self.world.keys_down.insert(key) {
                    for script_ref in self
                        .bus
                        .key_pressed
                        .get(&key)
                        .cloned()
                        .unwrap_or_default()
                    {
                        self.dispatch_scene_scoped(&script_ref);
                    }
                }
            }
            InputEvent::KeyUp(key) => {
                self.world.keys_down.remove(&key);
            }
            InputEvent::PointerMove { x, y, on_stage } => {
                self.world.mouse.x = x;
                self.world.mouse.y = y;
                self.world.mouse.on_stage = on_stage;
            }
            InputEvent::PointerDown { x, y, on_stage } => {
                self.world.mouse.x = x;
                self.world.mouse.y = y;
                self.world.mouse.on_stage = on_stage;
                self.world.mouse.pressed = true;
                if !on_stage {
                    return;
                }
                self.world.mouse.pressed_this_tick = true;
                self.world.mouse.pressed_object_id =
                    self.world.topmost_entity_at(x, y).map(str::to_owned);
                for script_ref in self.bus.stage_click.clone() {
                    self.dispatch_scene_scoped(&script_ref);
                }
                if let Some(pressed) = self.world.mouse.pressed_object_id.clone() {
                    for script_ref in self.bus.object_click.clone() {
                        if script_ref.object_id == pressed
                            || self
                                .world
                                .entity(&pressed)
                                .is_some_and(|e| e.original_id == script_ref.object_id)
                        {
                            Self::dispatch_on(&mut self.world, &pressed, &script_ref.script);
                        }
                    }
                }
            }
            InputEvent::PointerUp { x, y, on_stage } => {
                self.world.mouse.x = x;
                self.world.mouse.y = y;
                self.world.mouse.on_stage = on_stage;
                self.world.mouse.pressed = false;
                let released = self.world.mouse.pressed_object_id.take();
                if on_stage {
                    for script_ref in self.bus.stage_click_canceled.clone() {
                        self.dispatch_scene_scoped(&script_ref);
                    }
                }
                if let Some(released) = released {
                    for script_ref in self.bus.object_click_canceled.clone() {
                        if script_ref.object_id == released
                            || self
                                .world
                                .entity(&released)
                                .is_some_and(|e| e.original_id == script_ref.object_id)
                        {
                            Self::dispatch_on(&mut self.world, &released, &script_ref.script);
                        }
                    }
                }
            }
            InputEvent::TextSubmit(text) => self.submit_text(&text),
            InputEvent::Quit => {
                info!(target: "engine", "shutdown requested by host");
                self.world.shutdown_requested = true;
            }
        }
    }

    /// Store the answer and release every thread blocked on text input,
    /// closing the prompt dialogs.
    fn submit_text(&mut self, text: &str) {
        debug!(target: "engine.input", "text submitted");
        self.world.set_answer(text);
        let ids: Vec<String> = self.world.draw_order.clone();
        for id in ids {
            let Some(entity) = self.world.entity_mut(&id) else {
                continue;
            };
            let mut released = false;
            for state in entity.threads.values_mut() {
                if state
                    .wait
                    .as_ref()
                    .is_some_and(|w| w.kind == WaitKind::TextInput)
                {
                    state.clear_wait();
                    released = true;
                }
            }
            if released {
                entity.dialog = None;
            }
        }
    }

    // -- internal events ------------------------------------------------

    fn drain_internal(&mut self) {
        for event in std::mem::take(&mut self.world.pending_internal) {
            match event {
                InternalEvent::Message(message_id) => {
                    let scripts = self
                        .bus
                        .message
                        .get(&message_id)
                        .cloned()
                        .unwrap_or_default();
                    debug!(
                        target: "engine.bus",
                        message = %message_id,
                        scripts = scripts.len(),
                        "message fan-out"
                    );
                    for script_ref in scripts {
                        self.dispatch_scene_scoped(&script_ref);
                    }
                }
                InternalEvent::CloneStarted { clone_id } => {
                    let Some(original_id) =
                        self.world.entity(&clone_id).map(|e| e.original_id.clone())
                    else {
                        continue;
                    };
                    for script_ref in self
                        .bus
                        .clone_start
                        .get(&original_id)
                        .cloned()
                        .unwrap_or_default()
                    {
                        Self::dispatch_on(&mut self.world, &clone_id, &script_ref.script);
                    }
                }
            }
        }
    }

    // -- deferred transitions -------------------------------------------

    fn apply_deferred(&mut self) {
        if self.world.restart_requested {
            self.world.restart_requested = false;
            self.world.pending_scene = None;
            self.restart();
            return;
        }
        if let Some(request) = self.world.pending_scene.take() {
            let target = match request {
                SceneRequest::Goto(id) => Some(id),
                SceneRequest::Next => self.world.neighbor_scene_id(true),
                SceneRequest::Prev => self.world.neighbor_scene_id(false),
            };
            if let Some(scene_id) = target {
                self.enter_scene(&scene_id);
            }
        }
    }

    /// Switch scenes: kill threads that do not belong to the new scene,
    /// then fire `when_scene_start` for the new scene's objects. The
    /// dispatched threads run their first slice next tick.
    fn enter_scene(&mut self, scene_id: &str) {
        if !self.world.scene_exists(scene_id) {
            warn!(target: "engine.scene", scene = %scene_id, "transition to unknown scene ignored");
            return;
        }
        info!(
            target: "engine.scene",
            from = %self.world.current_scene_id,
            to = %scene_id,
            "scene transition"
        );
        let ids: Vec<String> = self.world.draw_order.clone();
        for id in ids {
            let leaving = self.world.scene_of(&id) != Some(scene_id);
            if let Some(entity) = self.world.entity_mut(&id) {
                if leaving {
                    entity.terminate_all_threads();
                    entity.dialog = None;
                } else {
                    // Stale threads dispatched under another scene die too.
                    for state in entity.threads.values_mut() {
                        if state.scene_at_dispatch != scene_id {
                            state.terminate_requested = true;
                        }
                    }
                }
            }
        }
        self.world.current_scene_id = scene_id.to_owned();
        for script_ref in self.bus.scene_start.clone() {
            self.dispatch_scene_scoped(&script_ref);
        }
    }

    /// `restart_project`: back to the load-time world, then start again.
    fn restart(&mut self) {
        info!(target: "engine", "project restart");
        self.world.audio.stop_all();
        self.world.audio.stop_bgm();
        self.world.reset_entities();
        self.world.vars.reset();
        self.world.timer.reset();
        self.world.pen_lines.clear();
        self.world.pending_internal.clear();
        self.world.sound = Default::default();
        self.world.audio.set_volume(self.world.sound.volume);
        self.world.audio.set_speed(self.world.sound.speed);
        self.world.current_scene_id = self.world.start_scene_id.clone();
        self.start();
    }
}
