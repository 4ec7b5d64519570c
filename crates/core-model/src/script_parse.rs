//! Parsing of the nested script strings.
//!
//! Each object carries its scripts as a JSON *string* containing
//! `[ [block, …], … ]`. A block is `{id, type, params, statements}`;
//! params hold literals or nested block objects, and `null` entries are
//! dropped before positional indexing (the editor pads dropdown slots
//! with nulls, and several opcodes rely on compact indexes).

use serde_json::Value as Json;
use tracing::warn;

use crate::block::{Block, ParamValue, Script};

/// Parse an object's script source. Malformed scripts degrade to an
/// empty list with a WARN; a broken object must not take the project
/// down.
pub fn parse_script_source(object_id: &str, source: &str) -> Vec<Script> {
    if source.trim().is_empty() {
        return Vec::new();
    }
    let parsed: Json = match serde_json::from_str(source) {
        Ok(v) => v,
        Err(err) => {
            warn!(target: "model", object = %object_id, %err, "script source is not valid JSON; object has no scripts");
            return Vec::new();
        }
    };
    let Json::Array(scripts) = parsed else {
        warn!(target: "model", object = %object_id, "script source is not an array; object has no scripts");
        return Vec::new();
    };
    scripts
        .iter()
        .filter_map(|s| parse_script(object_id, s))
        .filter(|s| !s.blocks.is_empty())
        .collect()
}

fn parse_script(object_id: &str, json: &Json) -> Option<Script> {
    let Json::Array(blocks) = json else {
        warn!(target: "model", object = %object_id, "script entry is not a block array; skipped");
        return None;
    };
    Some(Script {
        blocks: blocks
            .iter()
            .filter_map(|b| parse_block(object_id, b))
            .collect(),
    })
}

fn parse_block(object_id: &str, json: &Json) -> Option<Block> {
    let Json::Object(map) = json else {
        warn!(target: "model", object = %object_id, "block entry is not an object; skipped");
        return None;
    };
    let opcode = map.get("type").and_then(Json::as_str)?.to_owned();
    let id = map
        .get("id")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_owned();

    let params = map
        .get("params")
        .and_then(Json::as_array)
        .map(|params| {
            params
                .iter()
                .filter(|p| !p.is_null())
                .filter_map(|p| parse_param(object_id, p))
                .collect()
        })
        .unwrap_or_default();

    let statements = map
        .get("statements")
        .and_then(Json::as_array)
        .map(|bodies| {
            bodies
                .iter()
                .filter_map(|body| parse_script(object_id, body))
                .collect()
        })
        .unwrap_or_default();

    Some(Block {
        id,
        opcode,
        params,
        statements,
    })
}

fn parse_param(object_id: &str, json: &Json) -> Option<ParamValue> {
    match json {
        Json::String(s) => Some(ParamValue::Text(s.clone())),
        Json::Number(n) => Some(ParamValue::Number(n.as_f64().unwrap_or(0.0))),
        Json::Bool(b) => Some(ParamValue::Bool(*b)),
        Json::Object(_) => parse_block(object_id, json).map(ParamValue::Block),
        other => {
            warn!(target: "model", object = %object_id, param = %other, "unsupported param shape; dropped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_blocks_and_filters_nulls() {
        let src = r#"[[
            {"id": "a", "type": "when_run_button_click", "params": [null], "statements": []},
            {"id": "b", "type": "move_direction",
             "params": [
                null,
                {"id": "c", "type": "calc_basic",
                 "params": ["PLUS", {"id": "d", "type": "number", "params": ["2"]}, "3"],
                 "statements": []},
                null
             ],
             "statements": []}
        ]]"#;
        let scripts = parse_script_source("obj", src);
        assert_eq!(scripts.len(), 1);
        let blocks = &scripts[0].blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].opcode, "when_run_button_click");
        assert!(blocks[0].params.is_empty());

        // Nulls removed, so the nested reporter is param 0.
        let mv = &blocks[1];
        assert_eq!(mv.params.len(), 1);
        let ParamValue::Block(calc) = &mv.params[0] else {
            panic!("expected nested block");
        };
        assert_eq!(calc.opcode, "calc_basic");
        assert_eq!(calc.params.len(), 3);
    }

    #[test]
    fn parses_statement_bodies() {
        let src = r#"[[
            {"id": "r", "type": "repeat_basic", "params": [4],
             "statements": [[
                {"id": "m", "type": "move_x", "params": [10], "statements": []}
             ]]}
        ]]"#;
        let scripts = parse_script_source("obj", src);
        let rep = &scripts[0].blocks[0];
        assert_eq!(rep.statements.len(), 1);
        assert_eq!(rep.statements[0].blocks[0].opcode, "move_x");
    }

    #[test]
    fn malformed_source_degrades_to_empty() {
        assert!(parse_script_source("obj", "not json").is_empty());
        assert!(parse_script_source("obj", "{}").is_empty());
        assert!(parse_script_source("obj", "").is_empty());
        assert!(parse_script_source("obj", "[[]]").is_empty());
    }
}
