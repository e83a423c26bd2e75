/// XML backend for persistent documents.
///
/// The tree is an arena of elements parsed and written with `quick-xml`.
/// Elements are never moved or removed, so a node addressing an element stays
/// valid while other nodes append to the tree.
///
/// # Mapping
///
/// | Operation     | Named-member mode                         | Array mode                                  |
/// |---------------|-------------------------------------------|---------------------------------------------|
/// | number        | attribute                                 | `<item>` child with the value as text       |
/// | bool          | attribute, `true` / `false`               | `<item>` child                              |
/// | string        | attribute                                 | `<item>` child                              |
/// | string vector | child element with one `<item>` per entry | same, tagged with the name or `item`        |
/// | container     | child element                             | child element tagged with the name or `item`|
/// | array         | child element, one child per entry        | same                                        |
///
/// Reads in array mode visit the children of the array element in document
/// order, whatever their tag; [`ContainerNode::unread_name`](crate::core::node::ContainerNode::unread_name)
/// tells which tag comes next. Missing attributes read as `0`, `false` or `""`.
///
/// # Examples
///
/// ```
/// use persistent_doc::backend::xml::XmlDocument;
/// use persistent_doc::core::document::PersistentDocument;
///
/// let mut doc = XmlDocument::new();
/// doc.load_string(r#"
///     <settings>
///         <accounts>
///             <account id="1" name="alice"/>
///             <account id="2" name="bob"/>
///         </accounts>
///     </settings>"#).unwrap();
///
/// let mut accounts = doc.read_array("accounts").unwrap();
/// let mut names = Vec::new();
/// while accounts.has_unread() {
///     assert_eq!(accounts.unread_name().unwrap(), "account");
///     let mut account = accounts.read_container("").unwrap();
///     names.push(account.read_string("name").unwrap());
/// }
///
/// assert_eq!(names, vec!["alice", "bob"]);
/// ```
pub mod xml_document;
pub(crate) mod xml_node;
pub(crate) mod xml_tree;

pub use xml_document::{XmlDocument, XmlDocumentBuilder};
