//! Project document model.
//!
//! The editor saves a single JSON document: scenes, stage objects with
//! their costume/sound tables and a *nested JSON string* of scripts, and
//! the variable table. Deserialization is tolerant: unknown fields are
//! ignored and most scalar fields have defaults, so documents from
//! slightly different editor versions still load.

use core_value::Value;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::block::Script;
use crate::script_parse::parse_script_source;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project file could not be read: {0}")]
    Io(#[from] std::io::Error),
    #[error("project document is not valid JSON: {0}")]
    Document(#[from] serde_json::Error),
    #[error("project has no scenes")]
    NoScenes,
}

/// Top-level parsed project.
#[derive(Debug, Clone)]
pub struct ProjectDocument {
    pub name: String,
    /// Target fps. The editor calls this `speed`.
    pub target_fps: u32,
    pub special_config: SpecialConfig,
    pub objects: Vec<ObjectInfo>,
    pub scenes: Vec<SceneInfo>,
    pub start_scene_id: String,
    pub variables: Vec<VariableDef>,
}

impl ProjectDocument {
    pub fn from_path(path: &std::path::Path) -> Result<Self, ProjectError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ProjectError> {
        let raw: RawProject = serde_json::from_str(text)?;
        if raw.scenes.is_empty() {
            return Err(ProjectError::NoScenes);
        }

        let scenes: Vec<SceneInfo> = raw
            .scenes
            .iter()
            .map(|s| SceneInfo {
                id: s.id.clone(),
                name: s.name.clone(),
            })
            .collect();

        let start_scene_id = raw
            .start
            .or(raw.start_scene)
            .map(|s| s.scene_id())
            .filter(|id| scenes.iter().any(|s| &s.id == id))
            .unwrap_or_else(|| scenes[0].id.clone());

        let objects = raw
            .objects
            .into_iter()
            .map(|o| o.into_object_info(&scenes))
            .collect();

        let variables = raw.variables.into_iter().map(VariableDef::from_raw).collect();

        Ok(Self {
            name: raw.name,
            target_fps: raw.speed.unwrap_or(60).max(1),
            special_config: raw.special_config,
            objects,
            scenes,
            start_scene_id,
            variables,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecialConfig {
    pub brand_name: String,
    #[serde(alias = "showProjectNameUI")]
    pub show_project_name_ui: bool,
    #[serde(alias = "showZoomSliderUI")]
    pub show_zoom_slider_ui: bool,
    #[serde(alias = "showFPS")]
    pub show_fps: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Sprite,
    TextBox,
}

/// Authored, immutable per-object data. Shared by an original and all of
/// its clones; live transforms are seeded from `init` into `core-state`
/// entities.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub id: String,
    pub name: String,
    pub object_type: ObjectType,
    pub scene_id: String,
    pub selected_costume_id: String,
    pub costumes: Vec<Costume>,
    pub sounds: Vec<SoundFile>,
    pub text_style: Option<TextStyle>,
    pub init: EntityInit,
    pub scripts: Vec<Script>,
}

impl ObjectInfo {
    pub fn costume_index(&self, costume_id: &str) -> Option<usize> {
        self.costumes
            .iter()
            .position(|c| c.id == costume_id || c.name == costume_id)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Costume {
    pub id: String,
    pub name: String,
    pub filename: String,
    pub fileurl: String,
}

impl Default for Costume {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            filename: String::new(),
            fileurl: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SoundFile {
    pub id: String,
    pub name: String,
    pub filename: String,
    pub fileurl: String,
    pub ext: String,
    pub duration: f64,
}

/// TextBox-only styling and content.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub content: String,
    pub font_color: String,
    pub background_color: String,
    pub font: String,
    pub align: i64,
}

/// Initial transform values for the live entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityInit {
    pub x: f64,
    pub y: f64,
    pub reg_x: f64,
    pub reg_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub direction: f64,
    pub width: f64,
    pub height: f64,
    pub visible: bool,
}

impl Default for EntityInit {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            reg_x: 0.0,
            reg_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            direction: 90.0,
            width: 0.0,
            height: 0.0,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    Global,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Variable,
    List,
    Timer,
    Answer,
}

/// Authored variable/list definition, including the HUD display flags the
/// core only stores and surfaces.
#[derive(Debug, Clone)]
pub struct VariableDef {
    pub id: String,
    pub name: String,
    pub kind: VariableKind,
    pub owner_object_id: Option<String>,
    pub is_cloud: bool,
    pub visible: bool,
    pub value: Value,
    pub items: Vec<String>,
    pub x: f64,
    pub y: f64,
}

impl VariableDef {
    pub fn scope(&self) -> VariableScope {
        if self.owner_object_id.is_some() {
            VariableScope::Object
        } else {
            VariableScope::Global
        }
    }

    fn from_raw(raw: RawVariable) -> Self {
        let kind = match raw.variable_type.as_str() {
            "list" => VariableKind::List,
            "timer" => VariableKind::Timer,
            "answer" => VariableKind::Answer,
            _ => VariableKind::Variable,
        };
        let items = raw
            .array
            .into_iter()
            .map(|item| match item {
                RawListItem::Keyed { data, .. } => data,
                RawListItem::Plain(s) => s,
            })
            .collect();
        Self {
            id: raw.id,
            name: raw.name,
            kind,
            owner_object_id: raw.object.filter(|o| !o.is_empty()),
            is_cloud: raw.is_cloud,
            visible: raw.visible,
            value: json_scalar_to_value(&raw.value),
            items,
            x: raw.x,
            y: raw.y,
        }
    }
}

/// Scalar JSON → `Value`, used for variable initial values and literal
/// block params.
pub(crate) fn json_scalar_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Empty,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Value::string(s.clone()),
        other => {
            warn!(target: "model", value = %other, "non-scalar variable value; coerced to string");
            Value::string(other.to_string())
        }
    }
}

// ---------------------------------------------------------------------
// Raw serde shapes
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    #[serde(default)]
    name: String,
    #[serde(default)]
    speed: Option<u32>,
    #[serde(default)]
    special_config: SpecialConfig,
    #[serde(default)]
    objects: Vec<RawObject>,
    #[serde(default)]
    scenes: Vec<RawScene>,
    #[serde(default)]
    start: Option<RawStart>,
    #[serde(default)]
    start_scene: Option<RawStart>,
    #[serde(default)]
    variables: Vec<RawVariable>,
}

#[derive(Debug, Deserialize)]
struct RawScene {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStart {
    Id(String),
    Object {
        #[serde(rename = "sceneId")]
        scene_id: String,
    },
}

impl RawStart {
    fn scene_id(self) -> String {
        match self {
            RawStart::Id(id) => id,
            RawStart::Object { scene_id } => scene_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObject {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    object_type: String,
    #[serde(default)]
    scene: String,
    #[serde(default)]
    selected_picture_id: String,
    #[serde(default)]
    sprite: RawSprite,
    #[serde(default)]
    entity: RawEntity,
    #[serde(default)]
    script: String,
}

impl RawObject {
    fn into_object_info(self, scenes: &[SceneInfo]) -> ObjectInfo {
        let object_type = match self.object_type.as_str() {
            "textBox" => ObjectType::TextBox,
            _ => ObjectType::Sprite,
        };
        let scene_id = if scenes.iter().any(|s| s.id == self.scene) {
            self.scene
        } else {
            if !self.scene.is_empty() {
                warn!(
                    target: "model",
                    object = %self.id,
                    scene = %self.scene,
                    "object references an unknown scene; assigned to the first scene"
                );
            }
            scenes[0].id.clone()
        };
        let scripts = parse_script_source(&self.id, &self.script);
        let text_style = (object_type == ObjectType::TextBox).then(|| TextStyle {
            content: self.entity.text.clone().unwrap_or_default(),
            font_color: self.entity.colour.clone().unwrap_or_else(|| "#000000".into()),
            background_color: String::new(),
            font: self.entity.font.clone().unwrap_or_default(),
            align: self.entity.text_align.unwrap_or(0),
        });
        ObjectInfo {
            id: self.id,
            name: self.name,
            object_type,
            scene_id,
            selected_costume_id: self.selected_picture_id,
            costumes: self.sprite.pictures,
            sounds: self.sprite.sounds,
            text_style,
            init: EntityInit {
                x: self.entity.x,
                y: self.entity.y,
                reg_x: self.entity.reg_x,
                reg_y: self.entity.reg_y,
                scale_x: self.entity.scale_x,
                scale_y: self.entity.scale_y,
                rotation: self.entity.rotation,
                direction: self.entity.direction,
                width: self.entity.width,
                height: self.entity.height,
                visible: self.entity.visible,
            },
            scripts,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawSprite {
    pictures: Vec<Costume>,
    sounds: Vec<SoundFile>,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawEntity {
    x: f64,
    y: f64,
    reg_x: f64,
    reg_y: f64,
    scale_x: f64,
    scale_y: f64,
    rotation: f64,
    direction: f64,
    width: f64,
    height: f64,
    visible: bool,
    text: Option<String>,
    colour: Option<String>,
    font: Option<String>,
    text_align: Option<i64>,
}

impl Default for RawEntity {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            reg_x: 0.0,
            reg_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            direction: 90.0,
            width: 0.0,
            height: 0.0,
            visible: true,
            text: None,
            colour: None,
            font: None,
            text_align: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVariable {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    variable_type: String,
    #[serde(default)]
    object: Option<String>,
    #[serde(default)]
    is_cloud: bool,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    array: Vec<RawListItem>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawListItem {
    Keyed {
        #[serde(default)]
        #[allow(dead_code)]
        key: String,
        data: String,
    },
    Plain(String),
}
