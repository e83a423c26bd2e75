use std::{
    cell::{Ref, RefCell, RefMut},
    collections::HashMap,
};

use log::trace;
use serde_json::{Map, Number, Value};

use crate::{
    core::node::{ArrayCursor, ContainerNode, NodeBackend, Slot},
    error::PersistError,
};

/// Step from a JSON value to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Key(String),
    Index(usize),
}

fn lookup<'a>(root: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        Segment::Key(key) => value.get(key.as_str()),
        Segment::Index(index) => value.get(*index),
    })
}

/// Walks `path` like [`lookup`], turning missing members and `null` values on
/// the way into objects, so a write through a node of an absent member
/// creates that member.
fn vivify<'a>(root: &'a mut Value, path: &[Segment]) -> Option<&'a mut Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        Segment::Key(key) => {
            if value.is_null() {
                *value = Value::Object(Map::new());
            }
            value
                .as_object_mut()
                .map(|members| members.entry(key.as_str()).or_insert(Value::Null))
        }
        Segment::Index(index) => value.get_mut(*index),
    })
}

static NULL: Value = Value::Null;

/// Value at `path`; anything missing reads as JSON `null`.
fn value_at<'a>(root: &'a Value, path: &[Segment]) -> &'a Value {
    lookup(root, path).unwrap_or(&NULL)
}

/// A JSON document tree and the paths handed out to nodes as slots.
///
/// Slot indexes point into an interned path table, so a node addresses its
/// value by key/index segments from the root. Appending to an array never
/// invalidates a path; loading a new tree bumps the generation, which makes
/// every previously issued slot stale.
#[derive(Debug)]
pub(crate) struct JsonTree {
    root: Value,
    paths: Vec<Vec<Segment>>,
    interned: HashMap<Vec<Segment>, usize>,
    generation: u32,
}

impl JsonTree {
    pub(crate) fn new(root: Value) -> Self {
        let mut tree = JsonTree {
            root,
            paths: Vec::new(),
            interned: HashMap::new(),
            generation: 0,
        };
        tree.intern(Vec::new());
        tree
    }

    pub(crate) fn root(&self) -> &Value {
        &self.root
    }

    pub(crate) fn root_slot(&self) -> Slot {
        Slot::new(0, self.generation)
    }

    /// Swaps in a freshly loaded tree and returns the slot of its root.
    pub(crate) fn replace(&mut self, root: Value) -> Slot {
        self.root = root;
        self.paths.clear();
        self.interned.clear();
        self.generation = self.generation.wrapping_add(1);
        self.intern(Vec::new())
    }

    fn intern(&mut self, path: Vec<Segment>) -> Slot {
        let index = match self.interned.get(&path) {
            Some(index) => *index,
            None => {
                let index = self.paths.len();
                self.paths.push(path.clone());
                self.interned.insert(path, index);
                index
            }
        };
        Slot::new(index, self.generation)
    }

    fn path(&self, slot: Slot) -> Option<&[Segment]> {
        if slot.generation() != self.generation {
            return None;
        }
        self.paths.get(slot.index()).map(Vec::as_slice)
    }

    fn resolve(&self, slot: Slot) -> Option<&Value> {
        lookup(&self.root, self.path(slot)?)
    }
}

fn null_node(title: &str) -> PersistError {
    PersistError::null_node(title, "parent node data is null")
}

/// Value a read addresses, and the cursor consuming it leaves behind.
struct Selection {
    path: Vec<Segment>,
    next: Option<usize>,
}

impl Selection {
    /// Moves an array cursor past the selected element. Called only once
    /// the read succeeded, so a failed conversion leaves the element unread.
    fn commit(self, node: &mut ContainerNode) -> Vec<Segment> {
        if let Some(next) = self.next {
            node.set_cursor(ArrayCursor::Index(next));
            trace!("json array cursor advanced to {}", next);
        }
        self.path
    }
}

/// Picks the value a read addresses: the named member in named-member mode,
/// the element under the cursor in array mode.
fn select(
    tree: &JsonTree,
    node: &ContainerNode,
    name: &str,
    title: &str,
) -> Result<Selection, PersistError> {
    let cursor = node.cursor();
    let Some(slot) = node.target() else {
        return Err(match cursor {
            ArrayCursor::Index(position) => PersistError::array_exhausted(title, position),
            _ => null_node(title),
        });
    };
    let mut path = tree.path(slot).ok_or_else(|| null_node(title))?.to_vec();

    match cursor {
        ArrayCursor::Index(position) => {
            let len = value_at(&tree.root, &path).as_array().map_or(0, Vec::len);
            if position >= len {
                return Err(PersistError::array_exhausted(title, position));
            }
            path.push(Segment::Index(position));
            Ok(Selection {
                path,
                next: Some(position + 1),
            })
        }
        _ => {
            path.push(Segment::Key(name.to_string()));
            Ok(Selection { path, next: None })
        }
    }
}

fn as_number(value: &Value, title: &str, name: &str) -> Result<f64, PersistError> {
    match value {
        Value::Null => Ok(0.0),
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| PersistError::type_mismatch(title, "number out of range", name)),
        _ => Err(PersistError::type_mismatch(title, "number expected", name)),
    }
}

fn as_bool(value: &Value, title: &str, name: &str) -> Result<bool, PersistError> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => Ok(number.as_f64().is_some_and(|n| n != 0.0)),
        _ => Err(PersistError::type_mismatch(title, "boolean expected", name)),
    }
}

fn as_string(value: &Value, title: &str, name: &str) -> Result<String, PersistError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text.clone()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        _ => Err(PersistError::type_mismatch(title, "string expected", name)),
    }
}

fn as_string_vector(value: &Value, title: &str, name: &str) -> Result<Vec<String>, PersistError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| as_string(item, title, name))
            .collect(),
        _ => Err(PersistError::type_mismatch(title, "array of strings expected", name)),
    }
}

/// Whole numbers become JSON integers so `14` is not written as `14.0`.
fn number_value(value: f64, name: &str) -> Result<Value, PersistError> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Ok(Value::from(value as i64));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| PersistError::write("write number", "number is not finite", name))
}

/// [`NodeBackend`] over a `serde_json` value tree.
#[derive(Debug)]
pub(crate) struct JsonBackend {
    tree: RefCell<JsonTree>,
}

impl JsonBackend {
    pub(crate) fn new(root: Value) -> Self {
        JsonBackend {
            tree: RefCell::new(JsonTree::new(root)),
        }
    }

    pub(crate) fn tree(&self) -> Ref<'_, JsonTree> {
        self.tree.borrow()
    }

    pub(crate) fn tree_mut(&self) -> RefMut<'_, JsonTree> {
        self.tree.borrow_mut()
    }

    fn read_value<T>(
        &self,
        node: &mut ContainerNode,
        name: &str,
        title: &str,
        convert: fn(&Value, &str, &str) -> Result<T, PersistError>,
    ) -> Result<T, PersistError> {
        let tree = self.tree.borrow();
        let selection = select(&tree, node, name, title)?;
        let value = convert(value_at(&tree.root, &selection.path), title, name)?;
        selection.commit(node);
        Ok(value)
    }

    /// Stores `value` as the named member, or appends it in array mode.
    /// Returns the path of the stored value.
    fn insert(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: Value,
        title: &str,
    ) -> Result<Vec<Segment>, PersistError> {
        let mut tree = self.tree.borrow_mut();
        let slot = node.target().ok_or_else(|| null_node(title))?;
        let mut path = tree.path(slot).ok_or_else(|| null_node(title))?.to_vec();
        let parent = vivify(&mut tree.root, &path)
            .ok_or_else(|| PersistError::type_mismatch(title, "object expected on path", name))?;

        match node.cursor() {
            ArrayCursor::Index(position) => {
                if parent.is_null() {
                    *parent = Value::Array(Vec::new());
                }
                let items = parent
                    .as_array_mut()
                    .ok_or_else(|| PersistError::type_mismatch(title, "array expected", name))?;
                items.push(value);
                path.push(Segment::Index(items.len() - 1));
                node.set_cursor(ArrayCursor::Index(position + 1));
                trace!("json array cursor advanced to {}", position + 1);
            }
            _ => {
                if parent.is_null() {
                    *parent = Value::Object(Map::new());
                }
                let members = parent
                    .as_object_mut()
                    .ok_or_else(|| PersistError::type_mismatch(title, "object expected", name))?;
                members.insert(name.to_string(), value);
                path.push(Segment::Key(name.to_string()));
            }
        }

        Ok(path)
    }
}

impl NodeBackend for JsonBackend {
    fn has_unread(&self, node: &ContainerNode) -> bool {
        let ArrayCursor::Index(position) = node.cursor() else {
            return false;
        };
        let tree = self.tree.borrow();
        node.target()
            .and_then(|slot| tree.resolve(slot))
            .and_then(Value::as_array)
            .is_some_and(|items| position < items.len())
    }

    fn unread_name(&self, _node: &ContainerNode) -> Result<String, PersistError> {
        // JSON array elements carry no name.
        Ok(String::new())
    }

    fn read_number(&self, node: &mut ContainerNode, name: &str) -> Result<f64, PersistError> {
        self.read_value(node, name, "read number", as_number)
    }

    fn read_bool(&self, node: &mut ContainerNode, name: &str) -> Result<bool, PersistError> {
        self.read_value(node, name, "read bool", as_bool)
    }

    fn read_string(&self, node: &mut ContainerNode, name: &str) -> Result<String, PersistError> {
        self.read_value(node, name, "read string", as_string)
    }

    fn read_string_vector(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<Vec<String>, PersistError> {
        self.read_value(node, name, "read string vector", as_string_vector)
    }

    fn read_container(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError> {
        let mut tree = self.tree.borrow_mut();
        let path = select(&tree, node, name, "read container")?.commit(node);
        let slot = tree.intern(path);
        Ok(node.derive(Some(slot), ArrayCursor::Absent))
    }

    fn read_array(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError> {
        let mut tree = self.tree.borrow_mut();
        let selection = select(&tree, node, name, "read array")?;
        if !matches!(value_at(&tree.root, &selection.path), Value::Null | Value::Array(_)) {
            return Err(PersistError::type_mismatch(
                "read array",
                "array expected",
                name,
            ));
        }
        let path = selection.commit(node);
        let slot = tree.intern(path);
        Ok(node.derive(Some(slot), ArrayCursor::Index(0)))
    }

    fn write_number(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: f64,
    ) -> Result<(), PersistError> {
        let value = number_value(value, name)?;
        self.insert(node, name, value, "write number").map(|_| ())
    }

    fn write_bool(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: bool,
    ) -> Result<(), PersistError> {
        self.insert(node, name, Value::Bool(value), "write bool")
            .map(|_| ())
    }

    fn write_string(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: &str,
    ) -> Result<(), PersistError> {
        self.insert(node, name, Value::String(value.to_string()), "write string")
            .map(|_| ())
    }

    fn write_string_vector(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: &[String],
    ) -> Result<(), PersistError> {
        let items = value.iter().cloned().map(Value::String).collect();
        self.insert(node, name, Value::Array(items), "write string vector")
            .map(|_| ())
    }

    fn write_new_container(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError> {
        let path = self.insert(node, name, Value::Object(Map::new()), "write new container")?;
        let slot = self.tree.borrow_mut().intern(path);
        Ok(node.derive(Some(slot), ArrayCursor::Absent))
    }

    fn write_new_array(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError> {
        let path = self.insert(node, name, Value::Array(Vec::new()), "write new array")?;
        let slot = self.tree.borrow_mut().intern(path);
        Ok(node.derive(Some(slot), ArrayCursor::Index(0)))
    }
}
