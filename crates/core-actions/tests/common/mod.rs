#![allow(dead_code)] // Shared across several integration test binaries; each uses a subset.

use std::sync::Arc;

use core_actions::{SliceResult, run_slice};
use core_backend::{ManualClock, RecordingAudio};
use core_model::{ProjectDocument, Script, parse_script_source};
use core_state::{ThreadId, WaitKind, World};

/// Minimal single-scene project with two 40x40 sprites, a textbox, a
/// global variable `v`, an object-scoped list `l`, and an answer slot.
pub const PROJECT: &str = r##"{
    "name": "harness",
    "speed": 60,
    "objects": [
        {
            "id": "a", "name": "A", "objectType": "sprite", "scene": "s1",
            "selectedPictureId": "c1",
            "sprite": {
                "pictures": [
                    {"id": "c1", "name": "one", "filename": "f", "fileurl": "u"},
                    {"id": "c2", "name": "two", "filename": "f", "fileurl": "u"}
                ],
                "sounds": [
                    {"id": "snd", "name": "pop", "filename": "f", "fileurl": "u", "ext": ".mp3", "duration": 1.0}
                ]
            },
            "entity": { "x": 0, "y": 0, "regX": 0, "regY": 0, "scaleX": 1, "scaleY": 1,
                        "rotation": 0, "direction": 0, "width": 40, "height": 40, "visible": true },
            "script": ""
        },
        {
            "id": "b", "name": "B", "objectType": "sprite", "scene": "s1",
            "selectedPictureId": "",
            "sprite": { "pictures": [], "sounds": [] },
            "entity": { "x": 100, "y": 0, "regX": 0, "regY": 0, "scaleX": 1, "scaleY": 1,
                        "rotation": 0, "direction": 0, "width": 40, "height": 40, "visible": true },
            "script": ""
        },
        {
            "id": "label", "name": "Label", "objectType": "textBox", "scene": "s1",
            "selectedPictureId": "",
            "sprite": { "pictures": [], "sounds": [] },
            "entity": { "x": 0, "y": 100, "regX": 0, "regY": 0, "scaleX": 1, "scaleY": 1,
                        "rotation": 0, "direction": 0, "width": 80, "height": 20, "visible": true,
                        "text": "start", "colour": "#000000" },
            "script": ""
        }
    ],
    "scenes": [ {"id": "s1", "name": "One"} ],
    "start": "s1",
    "variables": [
        { "id": "v", "name": "v", "value": "0", "variableType": "variable",
          "isCloud": false, "visible": true, "x": 0, "y": 0 },
        { "id": "l", "name": "l", "value": "", "variableType": "list",
          "isCloud": false, "visible": true, "x": 0, "y": 0, "array": [] },
        { "id": "answer", "name": "answer", "value": "", "variableType": "answer",
          "isCloud": false, "visible": false, "x": 0, "y": 0 }
    ]
}"##;

/// Drives threads against a `World` the way the scheduler does, with a
/// manual clock pinned to the frame grid.
pub struct Harness {
    pub world: World,
    pub clock: ManualClock,
    pub audio: RecordingAudio,
    pub threads: Vec<(String, ThreadId)>,
    ticks: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_project(PROJECT)
    }

    pub fn with_project(project: &str) -> Self {
        let doc = ProjectDocument::from_json_str(project).expect("harness project parses");
        let clock = ManualClock::new();
        let audio = RecordingAudio::new();
        let world = World::new(
            &doc,
            Box::new(audio.clone()),
            Box::new(clock.clone()),
            None,
        );
        Self {
            world,
            clock,
            audio,
            threads: Vec::new(),
            ticks: 0,
        }
    }

    /// Register a script on an object. The script JSON is the usual
    /// `[[block, …]]` form whose first block is the (skipped) trigger.
    pub fn spawn(&mut self, object_id: &str, script_json: &str) -> ThreadId {
        let scripts = parse_script_source(object_id, script_json);
        assert_eq!(scripts.len(), 1, "spawn expects exactly one script");
        self.spawn_script(object_id, scripts.into_iter().next().unwrap())
    }

    pub fn spawn_script(&mut self, object_id: &str, script: Script) -> ThreadId {
        let thread_id = self.world.next_thread_id();
        let scene = self.world.current_scene_id.clone();
        let state = core_state::ScriptThreadState::new(Arc::new(script), scene);
        self.world
            .entity_mut(object_id)
            .expect("spawn target exists")
            .threads
            .insert(thread_id, state);
        self.threads.push((object_id.to_owned(), thread_id));
        thread_id
    }

    /// One scheduler turn: advance the clock one frame, clear expired
    /// waits, run one slice per runnable thread in registration order.
    pub fn tick(&mut self) {
        self.ticks += 1;
        let fps = self.world.target_fps as f64;
        self.clock
            .set_ms((self.ticks as f64 * 1000.0 / fps).round() as u64);

        let now = self.world.now_ms();
        let mut finished = Vec::new();
        for (object_id, thread_id) in self.threads.clone() {
            enum Status {
                Gone,
                Terminated,
                Waiting(core_state::WaitState),
                Ready,
            }
            let status = match self
                .world
                .entity(&object_id)
                .and_then(|e| e.threads.get(&thread_id))
            {
                None => Status::Gone,
                Some(state) if state.terminate_requested => Status::Terminated,
                Some(state) => match &state.wait {
                    Some(wait) => Status::Waiting(wait.clone()),
                    None => Status::Ready,
                },
            };
            match status {
                Status::Gone => {
                    finished.push((object_id, thread_id));
                    continue;
                }
                Status::Terminated => {
                    if let Some(entity) = self.world.entity_mut(&object_id) {
                        entity.threads.remove(&thread_id);
                    }
                    finished.push((object_id, thread_id));
                    continue;
                }
                Status::Waiting(wait) => {
                    let cleared = match &wait.kind {
                        WaitKind::ExplicitSecond | WaitKind::BlockInternal => now >= wait.end_ms,
                        WaitKind::SoundFinish { sound_id } => {
                            !self.world.audio.is_playing(&object_id, sound_id)
                        }
                        WaitKind::TextInput => false,
                    };
                    if !cleared {
                        continue;
                    }
                    if let Some(state) = self
                        .world
                        .entity_mut(&object_id)
                        .and_then(|e| e.threads.get_mut(&thread_id))
                    {
                        state.clear_wait();
                    }
                }
                Status::Ready => {}
            }
            if run_slice(&mut self.world, &object_id, thread_id) == SliceResult::Finished {
                if let Some(entity) = self.world.entity_mut(&object_id) {
                    entity.threads.remove(&thread_id);
                }
                finished.push((object_id, thread_id));
            }
        }
        self.threads.retain(|t| !finished.contains(t));

        // Dialog expiry, as the scheduler does at the end of a tick.
        let ids: Vec<String> = self.world.entity_ids().cloned().collect();
        for id in ids {
            if let Some(entity) = self.world.entity_mut(&id) {
                let expired = entity
                    .dialog
                    .as_ref()
                    .is_some_and(|d| d.duration_ms > 0 && now >= d.start_ms + d.duration_ms);
                if expired {
                    entity.dialog = None;
                }
            }
        }
    }

    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn var(&mut self, id: &str) -> String {
        self.world
            .vars
            .resolve(id, "")
            .map(|e| e.value.as_string())
            .unwrap_or_default()
    }

    pub fn list(&mut self, id: &str) -> Vec<String> {
        self.world
            .vars
            .resolve(id, "")
            .map(|e| e.items.clone())
            .unwrap_or_default()
    }

    pub fn entity_pos(&self, id: &str) -> (f64, f64) {
        let e = self.world.entity(id).expect("entity exists");
        (e.x, e.y)
    }

    pub fn thread_alive(&self, object_id: &str, thread_id: ThreadId) -> bool {
        self.world
            .entity(object_id)
            .is_some_and(|e| e.threads.contains_key(&thread_id))
    }
}

/// Compact block-JSON builders for scripts assembled in tests.
pub fn script(blocks: &[String]) -> String {
    format!("[[{}]]", blocks.join(","))
}

pub fn trigger() -> String {
    block("t0", "when_run_button_click", "[]", "")
}

pub fn block(id: &str, opcode: &str, params: &str, statements: &str) -> String {
    if statements.is_empty() {
        format!(r#"{{"id":"{id}","type":"{opcode}","params":{params},"statements":[]}}"#)
    } else {
        format!(r#"{{"id":"{id}","type":"{opcode}","params":{params},"statements":[{statements}]}}"#)
    }
}

pub fn set_v(id: &str, value: &str) -> String {
    block(id, "set_variable", &format!(r#"["v","{value}"]"#), "")
}
