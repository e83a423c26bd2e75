use crate::{core::node::ContainerNode, error::PersistError};

/// A value that serializes itself through a [`ContainerNode`].
///
/// Implementations usually open one sub-container named after themselves and
/// read or write their fields against it:
///
/// ```
/// use persistent_doc::core::{node::ContainerNode, object::PersistentObject};
/// use persistent_doc::PersistError;
///
/// struct LogConfig {
///     level: u32,
///     filename: String,
/// }
///
/// impl PersistentObject for LogConfig {
///     fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError> {
///         let mut this_node = node.read_container("LogConfig")?;
///         self.level = this_node.read_uint("level")?;
///         self.filename = this_node.read_string("filename")?;
///         Ok(())
///     }
///
///     fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError> {
///         let mut this_node = node.write_new_container("LogConfig")?;
///         this_node.write_uint("level", self.level)?;
///         this_node.write_string("filename", &self.filename)
///     }
/// }
/// ```
///
/// When `node` iterates an array, `read_container` consumes the current
/// element, so the same implementation reads one element per call.
pub trait PersistentObject {
    /// Restores `self` from `node`.
    fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError>;
    /// Stores `self` into `node`.
    fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError>;
}
