use std::path::Path;

use crate::{
    core::{node::ContainerNode, object::PersistentObject},
    error::PersistError,
};

/// A whole document: the tree, its root node, and load/save entry points.
///
/// Backends implement the load/save methods and give access to the root
/// node; every read/write method is provided and forwards to the root node.
pub trait PersistentDocument {
    /// Replaces the tree with the content of the file at `path`.
    fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PersistError>;

    /// Replaces the tree with the parsed `input`.
    fn load_string(&mut self, input: &str) -> Result<(), PersistError>;

    /// Serializes the tree into the file at `path`, creating or truncating it.
    fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError>;

    /// Serializes the tree into a string.
    fn save_string(&self) -> Result<String, PersistError>;

    fn root_container(&self) -> &ContainerNode;

    fn root_container_mut(&mut self) -> &mut ContainerNode;

    fn has_unread(&self) -> bool {
        self.root_container().has_unread()
    }

    fn unread_name(&self) -> Result<String, PersistError> {
        self.root_container().unread_name()
    }

    fn read_number(&mut self, name: &str) -> Result<f64, PersistError> {
        self.root_container_mut().read_number(name)
    }

    fn read_int(&mut self, name: &str) -> Result<i32, PersistError> {
        self.root_container_mut().read_int(name)
    }

    fn read_uint(&mut self, name: &str) -> Result<u32, PersistError> {
        self.root_container_mut().read_uint(name)
    }

    fn read_float(&mut self, name: &str) -> Result<f32, PersistError> {
        self.root_container_mut().read_float(name)
    }

    fn read_bool(&mut self, name: &str) -> Result<bool, PersistError> {
        self.root_container_mut().read_bool(name)
    }

    fn read_string(&mut self, name: &str) -> Result<String, PersistError> {
        self.root_container_mut().read_string(name)
    }

    fn read_string_vector(&mut self, name: &str) -> Result<Vec<String>, PersistError> {
        self.root_container_mut().read_string_vector(name)
    }

    fn read_object(&mut self, obj: &mut dyn PersistentObject) -> Result<(), PersistError> {
        self.root_container_mut().read_object(obj)
    }

    fn read_container(&mut self, name: &str) -> Result<ContainerNode, PersistError> {
        self.root_container_mut().read_container(name)
    }

    fn read_array(&mut self, name: &str) -> Result<ContainerNode, PersistError> {
        self.root_container_mut().read_array(name)
    }

    fn write_number(&mut self, name: &str, value: f64) -> Result<(), PersistError> {
        self.root_container_mut().write_number(name, value)
    }

    fn write_int(&mut self, name: &str, value: i32) -> Result<(), PersistError> {
        self.root_container_mut().write_int(name, value)
    }

    fn write_uint(&mut self, name: &str, value: u32) -> Result<(), PersistError> {
        self.root_container_mut().write_uint(name, value)
    }

    fn write_float(&mut self, name: &str, value: f32) -> Result<(), PersistError> {
        self.root_container_mut().write_float(name, value)
    }

    fn write_bool(&mut self, name: &str, value: bool) -> Result<(), PersistError> {
        self.root_container_mut().write_bool(name, value)
    }

    fn write_string(&mut self, name: &str, value: &str) -> Result<(), PersistError> {
        self.root_container_mut().write_string(name, value)
    }

    fn write_string_vector(&mut self, name: &str, value: &[String]) -> Result<(), PersistError> {
        self.root_container_mut().write_string_vector(name, value)
    }

    fn write_object(&mut self, obj: &dyn PersistentObject) -> Result<(), PersistError> {
        self.root_container_mut().write_object(obj)
    }

    fn write_new_container(&mut self, name: &str) -> Result<ContainerNode, PersistError> {
        self.root_container_mut().write_new_container(name)
    }

    fn write_new_array(&mut self, name: &str) -> Result<ContainerNode, PersistError> {
        self.root_container_mut().write_new_array(name)
    }
}
