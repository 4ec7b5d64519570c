#![allow(dead_code)] // Shared across integration test binaries; each uses a subset.

use std::path::PathBuf;

use core_backend::{ManualClock, RecordingAudio};
use core_engine::Engine;
use core_model::{
    EntityInit, ObjectInfo, ObjectType, ProjectDocument, SceneInfo, SpecialConfig, VariableDef,
    VariableKind, parse_script_source,
};
use core_value::Value;

/// Builds a `ProjectDocument` without JSON string-escaping gymnastics:
/// objects are assembled directly, scripts parse from plain block JSON.
pub struct ProjectBuilder {
    objects: Vec<ObjectInfo>,
    scenes: Vec<SceneInfo>,
    variables: Vec<VariableDef>,
    fps: u32,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            scenes: vec![SceneInfo {
                id: "s1".into(),
                name: "Scene 1".into(),
            }],
            variables: Vec::new(),
            fps: 60,
        }
    }

    pub fn scene(mut self, id: &str) -> Self {
        self.scenes.push(SceneInfo {
            id: id.into(),
            name: id.into(),
        });
        self
    }

    pub fn sprite(mut self, id: &str, scene: &str, script_json: &str) -> Self {
        self.objects.push(ObjectInfo {
            id: id.into(),
            name: id.into(),
            object_type: ObjectType::Sprite,
            scene_id: scene.into(),
            selected_costume_id: String::new(),
            costumes: Vec::new(),
            sounds: Vec::new(),
            text_style: None,
            init: EntityInit {
                width: 40.0,
                height: 40.0,
                direction: 0.0,
                ..EntityInit::default()
            },
            scripts: parse_script_source(id, script_json),
        });
        self
    }

    pub fn variable(mut self, id: &str) -> Self {
        self.variables.push(var_def(id, VariableKind::Variable, false));
        self
    }

    pub fn cloud_variable(mut self, id: &str) -> Self {
        self.variables.push(var_def(id, VariableKind::Variable, true));
        self
    }

    pub fn answer_slot(mut self) -> Self {
        self.variables
            .push(var_def("answer", VariableKind::Answer, false));
        self
    }

    pub fn build(self) -> ProjectDocument {
        let start = self.scenes[0].id.clone();
        ProjectDocument {
            name: "scenario".into(),
            target_fps: self.fps,
            special_config: SpecialConfig::default(),
            objects: self.objects,
            scenes: self.scenes,
            start_scene_id: start,
            variables: self.variables,
        }
    }
}

fn var_def(id: &str, kind: VariableKind, is_cloud: bool) -> VariableDef {
    VariableDef {
        id: id.into(),
        name: id.into(),
        kind,
        owner_object_id: None,
        is_cloud,
        visible: true,
        value: Value::string("0"),
        items: Vec::new(),
        x: 0.0,
        y: 0.0,
    }
}

/// Engine plus pinned clock: `tick` advances exactly one frame on the
/// 60 fps grid before running the engine tick.
pub struct EngineHarness {
    pub engine: Engine,
    pub clock: ManualClock,
    pub audio: RecordingAudio,
    ticks: u64,
}

impl EngineHarness {
    pub fn new(doc: ProjectDocument) -> Self {
        Self::with_cloud_path(doc, None)
    }

    pub fn with_cloud_path(doc: ProjectDocument, cloud: Option<PathBuf>) -> Self {
        let clock = ManualClock::new();
        let audio = RecordingAudio::new();
        let engine = Engine::new(&doc, Box::new(audio.clone()), Box::new(clock.clone()), cloud);
        Self {
            engine,
            clock,
            audio,
            ticks: 0,
        }
    }

    pub fn start(&mut self) {
        self.engine.start();
    }

    pub fn tick(&mut self) {
        self.ticks += 1;
        let fps = self.engine.world.target_fps as f64;
        self.clock
            .set_ms((self.ticks as f64 * 1000.0 / fps).round() as u64);
        self.engine.tick();
    }

    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn var(&mut self, id: &str) -> String {
        self.engine
            .world
            .vars
            .resolve(id, "")
            .map(|e| e.value.as_string())
            .unwrap_or_default()
    }

    pub fn thread_count(&self, entity_id: &str) -> usize {
        self.engine
            .world
            .entity(entity_id)
            .map(|e| e.threads.len())
            .unwrap_or(0)
    }

    pub fn entity_count(&self) -> usize {
        self.engine.world.draw_order.len()
    }
}

// -- block JSON builders ----------------------------------------------

pub fn script(blocks: &[String]) -> String {
    format!("[[{}]]", blocks.join(","))
}

pub fn scripts(list: &[String]) -> String {
    format!("[{}]", list.join(","))
}

pub fn one(blocks: &[String]) -> String {
    format!("[{}]", blocks.join(","))
}

pub fn block(id: &str, opcode: &str, params: &str, statements: &str) -> String {
    if statements.is_empty() {
        format!(r#"{{"id":"{id}","type":"{opcode}","params":{params},"statements":[]}}"#)
    } else {
        format!(r#"{{"id":"{id}","type":"{opcode}","params":{params},"statements":[{statements}]}}"#)
    }
}

pub fn start_trigger(id: &str) -> String {
    block(id, "when_run_button_click", "[]", "")
}

pub fn change_var(id: &str, var: &str, delta: f64) -> String {
    block(id, "change_variable", &format!(r#"["{var}",{delta}]"#), "")
}

pub fn set_var(id: &str, var: &str, value: &str) -> String {
    block(id, "set_variable", &format!(r#"["{var}","{value}"]"#), "")
}
