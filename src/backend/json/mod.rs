/// JSON backend for persistent documents.
///
/// The tree is a `serde_json::Value` with insertion-ordered objects. Nodes
/// address it through interned paths of object keys and array indexes, so a
/// node stays valid while siblings are appended around it.
///
/// # Module Architecture
///
/// 1. **json_node**: the tree, path interning and the `NodeBackend`
///    implementation. Named-member nodes map to JSON objects, array-mode
///    nodes map to JSON arrays and iterate them with a zero-based index.
///
/// 2. **json_document**: `JsonDocument` owns the tree, loads and saves it, and
///    exposes the root node. `JsonDocumentBuilder` picks compact or indented
///    output.
///
/// # Mapping
///
/// | Operation              | JSON                                    |
/// |------------------------|-----------------------------------------|
/// | number                 | number, integral values written as ints |
/// | bool                   | `true` / `false`                        |
/// | string                 | string                                  |
/// | string vector          | array of strings                        |
/// | container              | object                                  |
/// | array                  | array                                   |
///
/// A missing member reads like `null`: the type default (`0`, `false`, `""`
/// or an empty vector), and containers or arrays opened on it are created by
/// the first write. Reading a member of the wrong type is an error and leaves
/// an array cursor where it was.
///
/// # Examples
///
/// ```
/// use persistent_doc::backend::json::JsonDocumentBuilder;
/// use persistent_doc::core::document::PersistentDocument;
/// use persistent_doc::core::node::ContainerNode;
/// use persistent_doc::core::object::PersistentObject;
/// use persistent_doc::error::PersistError;
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl PersistentObject for Point {
///     fn read_object(&mut self, node: &mut ContainerNode) -> Result<(), PersistError> {
///         self.x = node.read_int("x")?;
///         self.y = node.read_int("y")?;
///         Ok(())
///     }
///
///     fn write_object(&self, node: &mut ContainerNode) -> Result<(), PersistError> {
///         node.write_int("x", self.x)?;
///         node.write_int("y", self.y)
///     }
/// }
///
/// let mut doc = JsonDocumentBuilder::new().pretty_formatter(false).build();
/// let mut points = doc.write_new_array("points").unwrap();
/// for point in [Point { x: 1, y: 2 }, Point { x: 3, y: 4 }] {
///     let mut node = points.write_new_container("").unwrap();
///     node.write_object(&point).unwrap();
/// }
///
/// let saved = doc.save_string().unwrap();
/// assert_eq!(saved, r#"{"points":[{"x":1,"y":2},{"x":3,"y":4}]}"#);
///
/// let mut loaded = JsonDocumentBuilder::new().build();
/// loaded.load_string(&saved).unwrap();
/// let mut points = loaded.read_array("points").unwrap();
/// let mut read_back = Vec::new();
/// while points.has_unread() {
///     let mut point = Point::default();
///     points.read_container("").unwrap().read_object(&mut point).unwrap();
///     read_back.push(point);
/// }
/// assert_eq!(read_back, vec![Point { x: 1, y: 2 }, Point { x: 3, y: 4 }]);
/// ```
pub mod json_document;
pub(crate) mod json_node;

pub use json_document::{JsonDocument, JsonDocumentBuilder};
