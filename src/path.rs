//! Canonical read-set path syntax and resolution (spec §4.E, §9).
//!
//! A read-set name is a dot-separated sequence of segments; the last
//! segment names a node (possibly list-indexed), every earlier segment
//! names a submodule to descend into. `AnyIndex` (`[?]` in the textual
//! form) expands to every element of the list at that position, per
//! spec §4.E's "list expansion takes all elements as reads".

use crate::model::{Model, ModuleId, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    AnyIndex,
}

/// Parses `a.b[3].c` or `a.b[?].c` into segments. Returns `None` on a
/// malformed bracket (spec's `UnresolvedSensitivity` is raised by the
/// caller for this, not by the parser itself).
pub fn parse_path(s: &str) -> Option<Vec<PathSegment>> {
    let mut segments = Vec::new();
    for token in s.split('.') {
        if let Some(bracket) = token.find('[') {
            if !token.ends_with(']') {
                return None;
            }
            let base = &token[..bracket];
            let inside = &token[bracket + 1..token.len() - 1];
            if base.is_empty() {
                return None;
            }
            segments.push(PathSegment::Field(base.to_string()));
            if inside == "?" {
                segments.push(PathSegment::AnyIndex);
            } else {
                segments.push(PathSegment::Index(inside.parse().ok()?));
            }
        } else {
            if token.is_empty() {
                return None;
            }
            segments.push(PathSegment::Field(token.to_string()));
        }
    }
    if segments.is_empty() { None } else { Some(segments) }
}

fn find_node(model: &Model, module: ModuleId, name: &str) -> Option<NodeId> {
    model
        .module(module)
        .nodes
        .iter()
        .copied()
        .find(|&id| model.node(id).name == name)
}

fn find_submodule(model: &Model, module: ModuleId, name: &str) -> Option<ModuleId> {
    model
        .module(module)
        .submodules
        .iter()
        .copied()
        .find(|&id| model.module(id).name == name)
}

fn indexed_name(base: &str, idx: usize) -> String {
    format!("{base}[{idx}]")
}

fn find_all_indexed_nodes(model: &Model, module: ModuleId, base: &str) -> Vec<NodeId> {
    let mut out: Vec<(usize, NodeId)> = Vec::new();
    for &id in &model.module(module).nodes {
        if let Some(idx) = strip_index(&model.node(id).name, base) {
            out.push((idx, id));
        }
    }
    out.sort_by_key(|(idx, _)| *idx);
    out.into_iter().map(|(_, id)| id).collect()
}

fn find_all_indexed_submodules(model: &Model, module: ModuleId, base: &str) -> Vec<ModuleId> {
    let mut out: Vec<(usize, ModuleId)> = Vec::new();
    for &id in &model.module(module).submodules {
        if let Some(idx) = strip_index(&model.module(id).name, base) {
            out.push((idx, id));
        }
    }
    out.sort_by_key(|(idx, _)| *idx);
    out.into_iter().map(|(_, id)| id).collect()
}

fn strip_index(full: &str, base: &str) -> Option<usize> {
    let rest = full.strip_prefix(base)?.strip_prefix('[')?;
    let rest = rest.strip_suffix(']')?;
    rest.parse().ok()
}

/// Resolves a parsed path against the module tree rooted (for this call)
/// at `start`. Returns `None` if any segment fails to resolve — the
/// caller turns that into a skipped, logged `UnresolvedSensitivity`
/// warning rather than a fatal error (spec §7).
pub fn resolve(model: &Model, start: ModuleId, path: &[PathSegment]) -> Option<Vec<NodeId>> {
    let mut module = start;
    let mut i = 0;
    while i < path.len() {
        let PathSegment::Field(name) = &path[i] else {
            return None;
        };
        if i + 1 == path.len() {
            return find_node(model, module, name).map(|n| vec![n]);
        }
        match &path[i + 1] {
            PathSegment::Index(idx) => {
                let full = indexed_name(name, *idx);
                if i + 2 == path.len() {
                    return find_node(model, module, &full).map(|n| vec![n]);
                }
                module = find_submodule(model, module, &full)?;
                i += 2;
            }
            PathSegment::AnyIndex => {
                if i + 2 == path.len() {
                    let nodes = find_all_indexed_nodes(model, module, name);
                    return if nodes.is_empty() { None } else { Some(nodes) };
                }
                let mods = find_all_indexed_submodules(model, module, name);
                if mods.is_empty() {
                    return None;
                }
                let mut out = Vec::new();
                for m in mods {
                    out.extend(resolve(model, m, &path[i + 2..])?);
                }
                return Some(out);
            }
            PathSegment::Field(_) => {
                module = find_submodule(model, module, name)?;
                i += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_field() {
        assert_eq!(
            parse_path("a.b").unwrap(),
            vec![
                PathSegment::Field("a".into()),
                PathSegment::Field("b".into())
            ]
        );
    }

    #[test]
    fn parses_literal_index() {
        assert_eq!(
            parse_path("data[3]").unwrap(),
            vec![PathSegment::Field("data".into()), PathSegment::Index(3)]
        );
    }

    #[test]
    fn parses_wildcard_index() {
        assert_eq!(
            parse_path("data[?]").unwrap(),
            vec![PathSegment::Field("data".into()), PathSegment::AnyIndex]
        );
    }

    #[test]
    fn rejects_malformed_bracket() {
        assert!(parse_path("data[").is_none());
    }
}
