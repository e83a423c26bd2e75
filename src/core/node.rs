use std::{
    fmt,
    rc::{Rc, Weak},
};

use crate::{core::object::PersistentObject, error::PersistError};

/// Handle to a position inside a document tree.
///
/// The index is interpreted by the backend that issued it. The generation
/// changes each time the document loads new content, so handles taken from a
/// previous tree are recognized as stale instead of addressing the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    index: usize,
    generation: u32,
}

impl Slot {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Slot { index, generation }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

/// Array iteration state of a [`ContainerNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayCursor {
    /// Named-member mode: primitives address fields by name.
    #[default]
    Absent,
    /// Index of the next element to read, or count of appended elements (JSON).
    Index(usize),
    /// Next unread sibling element (XML), `None` once every sibling was
    /// consumed, and the number of elements consumed so far.
    Sibling { next: Option<Slot>, consumed: usize },
    /// Number of elements appended through this node (XML).
    Append(usize),
}

impl ArrayCursor {
    pub fn is_array(&self) -> bool {
        !matches!(self, ArrayCursor::Absent)
    }

    /// Elements read or appended so far.
    pub fn position(&self) -> usize {
        match *self {
            ArrayCursor::Absent => 0,
            ArrayCursor::Index(position) | ArrayCursor::Append(position) => position,
            ArrayCursor::Sibling { consumed, .. } => consumed,
        }
    }
}

/// Operation table of a document backend.
///
/// A [`ContainerNode`] dispatches every primitive through the backend that
/// created it. Implementations branch on the node's [`ArrayCursor`]: in
/// named-member mode `name` selects the field, in array mode `name` is
/// ignored by reads and the cursor advances once per successful call.
pub trait NodeBackend {
    fn has_unread(&self, node: &ContainerNode) -> bool;
    fn unread_name(&self, node: &ContainerNode) -> Result<String, PersistError>;

    fn read_number(&self, node: &mut ContainerNode, name: &str) -> Result<f64, PersistError>;
    fn read_bool(&self, node: &mut ContainerNode, name: &str) -> Result<bool, PersistError>;
    fn read_string(&self, node: &mut ContainerNode, name: &str) -> Result<String, PersistError>;
    fn read_string_vector(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<Vec<String>, PersistError>;
    fn read_container(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError>;
    fn read_array(&self, node: &mut ContainerNode, name: &str)
    -> Result<ContainerNode, PersistError>;

    fn write_number(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: f64,
    ) -> Result<(), PersistError>;
    fn write_bool(&self, node: &mut ContainerNode, name: &str, value: bool)
    -> Result<(), PersistError>;
    fn write_string(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: &str,
    ) -> Result<(), PersistError>;
    fn write_string_vector(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: &[String],
    ) -> Result<(), PersistError>;
    fn write_new_container(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError>;
    fn write_new_array(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError>;
}

/// Cursor over one position of a persistent document.
///
/// A node is a view: it refers to its backend weakly and addresses the tree
/// through a [`Slot`]. Cloning a node copies its cursor state, so two clones
/// iterate independently. A node whose document was dropped fails every
/// primitive with [`PersistError::NullNode`].
#[derive(Clone)]
pub struct ContainerNode {
    backend: Weak<dyn NodeBackend>,
    target: Option<Slot>,
    cursor: ArrayCursor,
}

impl fmt::Debug for ContainerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerNode")
            .field("target", &self.target)
            .field("cursor", &self.cursor)
            .field("attached", &(self.backend.strong_count() > 0))
            .finish()
    }
}

impl ContainerNode {
    pub(crate) fn new(
        backend: Weak<dyn NodeBackend>,
        target: Option<Slot>,
        cursor: ArrayCursor,
    ) -> Self {
        ContainerNode {
            backend,
            target,
            cursor,
        }
    }

    /// Creates a node on the same backend.
    pub(crate) fn derive(&self, target: Option<Slot>, cursor: ArrayCursor) -> Self {
        ContainerNode {
            backend: self.backend.clone(),
            target,
            cursor,
        }
    }

    pub(crate) fn target(&self) -> Option<Slot> {
        self.target
    }

    pub fn cursor(&self) -> ArrayCursor {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: ArrayCursor) {
        self.cursor = cursor;
    }

    /// Whether this node iterates an array rather than addressing named members.
    pub fn is_array(&self) -> bool {
        self.cursor.is_array()
    }

    fn backend(&self) -> Result<Rc<dyn NodeBackend>, PersistError> {
        self.backend
            .upgrade()
            .ok_or_else(|| PersistError::null_node("container node", "document is no longer alive"))
    }

    /// Whether an array-mode node still has an element to consume.
    pub fn has_unread(&self) -> bool {
        match self.backend.upgrade() {
            Some(backend) => backend.has_unread(self),
            None => false,
        }
    }

    /// Backend-native name of the next unread element (XML tag), or `""` for JSON.
    pub fn unread_name(&self) -> Result<String, PersistError> {
        self.backend()?.unread_name(self)
    }

    /// Reads the number stored under `name`, or the next array element.
    ///
    /// Missing values read as `0.0`. In array mode a read past the last
    /// element fails with [`PersistError::ArrayExhausted`].
    pub fn read_number(&mut self, name: &str) -> Result<f64, PersistError> {
        let backend = self.backend()?;
        backend.read_number(self, name)
    }

    /// [`read_number`](Self::read_number) truncated to `i32`.
    pub fn read_int(&mut self, name: &str) -> Result<i32, PersistError> {
        self.read_number(name).map(|value| value as i32)
    }

    /// [`read_number`](Self::read_number) truncated to `u32`.
    pub fn read_uint(&mut self, name: &str) -> Result<u32, PersistError> {
        self.read_number(name).map(|value| value as u32)
    }

    pub fn read_float(&mut self, name: &str) -> Result<f32, PersistError> {
        self.read_number(name).map(|value| value as f32)
    }

    /// Reads a boolean; missing values read as `false`.
    pub fn read_bool(&mut self, name: &str) -> Result<bool, PersistError> {
        let backend = self.backend()?;
        backend.read_bool(self, name)
    }

    /// Reads a string; missing values read as `""`.
    pub fn read_string(&mut self, name: &str) -> Result<String, PersistError> {
        let backend = self.backend()?;
        backend.read_string(self, name)
    }

    /// Reads a list of strings; a missing list reads as empty.
    pub fn read_string_vector(&mut self, name: &str) -> Result<Vec<String>, PersistError> {
        let backend = self.backend()?;
        backend.read_string_vector(self, name)
    }

    /// Lets `obj` read itself from this node.
    pub fn read_object(&mut self, obj: &mut dyn PersistentObject) -> Result<(), PersistError> {
        obj.read_object(self)
    }

    /// Opens the named sub-container for reading, or consumes the next array
    /// element as one. The returned node addresses members by name.
    pub fn read_container(&mut self, name: &str) -> Result<ContainerNode, PersistError> {
        let backend = self.backend()?;
        backend.read_container(self, name)
    }

    /// Opens the named array for iteration, positioned at its first element.
    ///
    /// A missing array yields a node with nothing unread. A value that is not
    /// an array fails with [`PersistError::TypeMismatch`].
    pub fn read_array(&mut self, name: &str) -> Result<ContainerNode, PersistError> {
        let backend = self.backend()?;
        backend.read_array(self, name)
    }

    /// Stores `value` under `name`, overwriting an earlier value, or appends
    /// it in array mode.
    pub fn write_number(&mut self, name: &str, value: f64) -> Result<(), PersistError> {
        let backend = self.backend()?;
        backend.write_number(self, name, value)
    }

    pub fn write_int(&mut self, name: &str, value: i32) -> Result<(), PersistError> {
        self.write_number(name, f64::from(value))
    }

    pub fn write_uint(&mut self, name: &str, value: u32) -> Result<(), PersistError> {
        self.write_number(name, f64::from(value))
    }

    pub fn write_float(&mut self, name: &str, value: f32) -> Result<(), PersistError> {
        self.write_number(name, f64::from(value))
    }

    pub fn write_bool(&mut self, name: &str, value: bool) -> Result<(), PersistError> {
        let backend = self.backend()?;
        backend.write_bool(self, name, value)
    }

    pub fn write_string(&mut self, name: &str, value: &str) -> Result<(), PersistError> {
        let backend = self.backend()?;
        backend.write_string(self, name, value)
    }

    /// Stores a list of strings under `name`, or appends it in array mode.
    pub fn write_string_vector(&mut self, name: &str, value: &[String]) -> Result<(), PersistError> {
        let backend = self.backend()?;
        backend.write_string_vector(self, name, value)
    }

    /// Lets `obj` write itself into this node.
    pub fn write_object(&mut self, obj: &dyn PersistentObject) -> Result<(), PersistError> {
        obj.write_object(self)
    }

    /// Creates an empty sub-container and returns a node for filling it.
    pub fn write_new_container(&mut self, name: &str) -> Result<ContainerNode, PersistError> {
        let backend = self.backend()?;
        backend.write_new_container(self, name)
    }

    /// Creates an empty array and returns a node that appends to it.
    pub fn write_new_array(&mut self, name: &str) -> Result<ContainerNode, PersistError> {
        let backend = self.backend()?;
        backend.write_new_array(self, name)
    }
}
