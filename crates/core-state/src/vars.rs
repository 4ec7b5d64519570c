//! Scoped variable and list store with the cloud mirror.
//!
//! Entries are keyed by `(id, owner)` where the owner is the empty
//! string for globals. Lookup resolution is always object-scoped first,
//! then global; a miss is a WARN plus a zero value, never an error.
//!
//! Cloud-flagged entries mirror to a single JSON file: every mutation
//! writes, every read re-reads (so out-of-band writers are picked up,
//! best-effort). File errors never interrupt a script.

use std::path::PathBuf;

use ahash::AHashMap;
use core_model::{VariableDef, VariableKind};
use core_value::Value;
use serde_json::json;
use tracing::warn;

/// One variable or list.
#[derive(Debug, Clone)]
pub struct VarEntry {
    pub id: String,
    pub name: String,
    pub kind: VariableKind,
    /// Empty string for globals.
    pub owner: String,
    pub is_cloud: bool,
    pub visible: bool,
    pub value: Value,
    pub items: Vec<String>,
    pub x: f64,
    pub y: f64,
}

impl VarEntry {
    fn from_def(def: &VariableDef) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            kind: def.kind,
            owner: def.owner_object_id.clone().unwrap_or_default(),
            is_cloud: def.is_cloud,
            visible: def.visible,
            value: def.value.clone(),
            items: def.items.clone(),
            x: def.x,
            y: def.y,
        }
    }
}

#[derive(Debug, Default)]
pub struct VariableStore {
    entries: AHashMap<(String, String), VarEntry>,
    /// Authored definitions, kept for `restart_project`.
    defs: Vec<VariableDef>,
    mirror: CloudMirror,
}

impl VariableStore {
    pub fn from_defs(defs: Vec<VariableDef>, mirror: CloudMirror) -> Self {
        let mut store = Self {
            entries: AHashMap::new(),
            defs,
            mirror,
        };
        store.reset();
        store
    }

    /// Restore every entry to its authored initial value.
    pub fn reset(&mut self) {
        self.entries.clear();
        for def in &self.defs {
            let entry = VarEntry::from_def(def);
            self.entries
                .insert((entry.id.clone(), entry.owner.clone()), entry);
        }
    }

    /// Object scope first, then global. Cloud entries are refreshed from
    /// the mirror before being returned.
    pub fn resolve(&mut self, id: &str, object_id: &str) -> Option<&VarEntry> {
        let key = self.resolve_key(id, object_id)?;
        if self.entries.get(&key).is_some_and(|e| e.is_cloud) {
            self.refresh_from_mirror(&key);
        }
        self.entries.get(&key)
    }

    /// Mutable resolution for read-modify-write. Cloud entries refresh
    /// from the mirror first (a `change_variable` reads before it
    /// writes); the caller must call [`VariableStore::after_write`]
    /// once done so the mutation lands back in the mirror.
    pub fn resolve_mut(&mut self, id: &str, object_id: &str) -> Option<&mut VarEntry> {
        let key = self.resolve_key(id, object_id)?;
        if self.entries.get(&key).is_some_and(|e| e.is_cloud) {
            self.refresh_from_mirror(&key);
        }
        self.entries.get_mut(&key)
    }

    /// Flush a mutated entry to the cloud mirror when flagged.
    pub fn after_write(&mut self, id: &str, object_id: &str) {
        if let Some(key) = self.resolve_key(id, object_id)
            && self.entries.get(&key).is_some_and(|e| e.is_cloud)
        {
            self.mirror.save(self.cloud_entries());
        }
    }

    fn resolve_key(&self, id: &str, object_id: &str) -> Option<(String, String)> {
        let scoped = (id.to_owned(), object_id.to_owned());
        if self.entries.contains_key(&scoped) {
            return Some(scoped);
        }
        let global = (id.to_owned(), String::new());
        self.entries.contains_key(&global).then_some(global)
    }

    fn refresh_from_mirror(&mut self, key: &(String, String)) {
        let Some(snapshot) = self.mirror.load() else {
            return;
        };
        if let Some(entry) = self.entries.get_mut(key)
            && let Some(update) = snapshot.iter().find(|u| u.id == entry.id)
        {
            match entry.kind {
                VariableKind::List => {
                    if let Some(items) = &update.items {
                        entry.items = items.clone();
                    }
                }
                _ => {
                    if let Some(value) = &update.value {
                        entry.value = Value::string(value.clone());
                    }
                }
            }
        }
    }

    fn cloud_entries(&self) -> Vec<&VarEntry> {
        let mut entries: Vec<&VarEntry> = self.entries.values().filter(|e| e.is_cloud).collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// The distinguished `ask_and_wait` answer entry, if the project
    /// declares one.
    pub fn answer_entry_mut(&mut self) -> Option<&mut VarEntry> {
        self.entries
            .values_mut()
            .find(|e| e.kind == VariableKind::Answer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VarEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VarEntry> {
        self.entries.values_mut()
    }
}

/// Cloud-variable state read back from the mirror file.
#[derive(Debug, Clone)]
pub struct CloudUpdate {
    pub id: String,
    pub value: Option<String>,
    pub items: Option<Vec<String>>,
}

/// File-backed mirror. `None` path disables mirroring entirely.
#[derive(Debug, Default)]
pub struct CloudMirror {
    path: Option<PathBuf>,
}

impl CloudMirror {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    fn save(&self, entries: Vec<&VarEntry>) {
        let Some(path) = &self.path else {
            return;
        };
        let doc: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| match e.kind {
                VariableKind::List => json!({ "id": e.id, "array": e.items }),
                _ => json!({ "id": e.id, "value": e.value.as_string() }),
            })
            .collect();
        let text = serde_json::Value::Array(doc).to_string();
        if let Err(err) = std::fs::write(path, text) {
            warn!(target: "state.cloud", path = %path.display(), %err, "cloud mirror write failed");
        }
    }

    fn load(&self) -> Option<Vec<CloudUpdate>> {
        let path = self.path.as_ref()?;
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(target: "state.cloud", path = %path.display(), %err, "cloud mirror read failed");
                return None;
            }
        };
        let doc: serde_json::Value = match serde_json::from_str(&text) {
            Ok(d) => d,
            Err(err) => {
                warn!(target: "state.cloud", path = %path.display(), %err, "cloud mirror is not valid JSON; keeping in-memory values");
                return None;
            }
        };
        let entries = doc.as_array()?;
        Some(
            entries
                .iter()
                .filter_map(|e| {
                    let id = e.get("id")?.as_str()?.to_owned();
                    let value = e.get("value").map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    });
                    let items = e.get("array").and_then(|a| a.as_array()).map(|items| {
                        items
                            .iter()
                            .map(|i| match i {
                                serde_json::Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .collect()
                    });
                    Some(CloudUpdate { id, value, items })
                })
                .collect(),
        )
    }
}
