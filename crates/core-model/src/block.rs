//! Block tree node types.

use core_value::Value;

/// One node of the program tree: an opcode plus positional params and
/// zero or more nested statement bodies.
///
/// Opcodes stay as the strings the editor wrote; the evaluator and the
/// statement dispatcher match on them directly. Null params are filtered
/// out at parse time, so positional indexing here is compact.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub opcode: String,
    pub params: Vec<ParamValue>,
    pub statements: Vec<Script>,
}

impl Block {
    /// Param at `index`, or `None` past the end. Callers that tolerate a
    /// missing param substitute a default; callers that do not raise a
    /// `ScriptError` with the block's coordinates.
    pub fn param(&self, index: usize) -> Option<&ParamValue> {
        self.params.get(index)
    }

    /// Statement body at `index` (`_if` has one, `if_else` two).
    pub fn body(&self, index: usize) -> Option<&Script> {
        self.statements.get(index)
    }
}

/// A parameter slot: a literal carried verbatim from the JSON, or a
/// nested reporter block evaluated at run time.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Block(Block),
}

impl ParamValue {
    /// Literal view for params that must not be evaluated (dropdown
    /// selections). Nested blocks read as `None`.
    pub fn as_literal(&self) -> Option<Value> {
        match self {
            ParamValue::Text(s) => Some(Value::string(s.clone())),
            ParamValue::Number(n) => Some(Value::Number(*n)),
            ParamValue::Bool(b) => Some(Value::Boolean(*b)),
            ParamValue::Block(_) => None,
        }
    }
}

/// An ordered block sequence. Top-level scripts start with an event
/// trigger block; nested statement bodies are plain sequences.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub blocks: Vec<Block>,
}

impl Script {
    /// Opcode of the first block, the script's event trigger.
    pub fn trigger_opcode(&self) -> Option<&str> {
        self.blocks.first().map(|b| b.opcode.as_str())
    }
}
