use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
    rc::{Rc, Weak},
};

use log::{debug, error};

use crate::{
    backend::xml::{
        xml_node::XmlBackend,
        xml_tree::{XmlStyle, XmlTree},
    },
    core::{
        document::PersistentDocument,
        node::{ArrayCursor, ContainerNode, NodeBackend},
    },
    error::PersistError,
};

/// A persistent document backed by an XML element tree.
///
/// The root node addresses the document element. A new document holds a
/// single empty element named after the configured root tag.
///
/// # Examples
///
/// ```
/// use persistent_doc::backend::xml::XmlDocumentBuilder;
/// use persistent_doc::core::document::PersistentDocument;
///
/// let mut doc = XmlDocumentBuilder::new()
///     .root_tag("settings")
///     .pretty_formatter(false)
///     .declaration(false)
///     .build();
/// doc.write_int("level", 3).unwrap();
/// let mut servers = doc.write_new_array("servers").unwrap();
/// servers.write_string("", "sip.example.com").unwrap();
///
/// assert_eq!(
///     doc.save_string().unwrap(),
///     r#"<settings level="3"><servers><item>sip.example.com</item></servers></settings>"#
/// );
/// ```
pub struct XmlDocument {
    backend: Rc<XmlBackend>,
    root: ContainerNode,
    style: XmlStyle,
}

impl XmlDocument {
    /// Creates a document with root tag `root`, item tag `item`, indented
    /// output and an XML declaration.
    pub fn new() -> Self {
        XmlDocumentBuilder::new().build()
    }

    fn root_node(backend: &Rc<XmlBackend>) -> ContainerNode {
        let weak: Weak<dyn NodeBackend> = Rc::downgrade(backend) as Weak<dyn NodeBackend>;
        let tree = backend.tree();
        let slot = tree.slot(tree.document_element());
        ContainerNode::new(weak, Some(slot), ArrayCursor::Absent)
    }

    fn install(&mut self, tree: XmlTree, origin: &str) {
        self.backend.tree_mut().replace(tree);
        self.root = Self::root_node(&self.backend);
        debug!("xml document loaded from {}", origin);
    }

    fn render(&self, title: &str, origin: &str) -> Result<String, PersistError> {
        self.backend.tree().write(self.style).map_err(|e| {
            error!("Failed to serialize XML document: {}", e);
            PersistError::write(title, e, origin)
        })
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentDocument for XmlDocument {
    fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PersistError> {
        let title = "xml load from file";
        let file_path = path.as_ref();
        let origin = file_path.display().to_string();

        let bytes = fs::read(file_path).map_err(|e| {
            error!("Failed to read XML file {}: {}", origin, e);
            PersistError::read(title, e, &origin)
        })?;
        let content = std::str::from_utf8(&bytes).map_err(|e| {
            error!("XML file {} is not valid UTF-8: {}", origin, e);
            PersistError::parse(title, e, &origin, e.valid_up_to() as u64)
        })?;

        let tree = XmlTree::parse(content, title, &origin).inspect_err(|e| error!("{}", e))?;
        self.install(tree, &origin);
        Ok(())
    }

    fn load_string(&mut self, input: &str) -> Result<(), PersistError> {
        let title = "xml load from string";

        let tree = XmlTree::parse(input, title, "string").inspect_err(|e| error!("{}", e))?;
        self.install(tree, "string");
        Ok(())
    }

    fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let title = "xml save to file";
        let file_path = path.as_ref();
        let origin = file_path.display().to_string();

        let content = self.render(title, &origin)?;

        let file = File::create(file_path).map_err(|e| {
            error!("Failed to create XML file {}: {}", origin, e);
            PersistError::write(title, e, &origin)
        })?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(content.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| {
                error!("Failed to write XML file {}: {}", origin, e);
                PersistError::write(title, e, &origin)
            })?;

        debug!("xml document saved to {}", origin);
        Ok(())
    }

    fn save_string(&self) -> Result<String, PersistError> {
        self.render("xml save to string", "string")
    }

    fn root_container(&self) -> &ContainerNode {
        &self.root
    }

    fn root_container_mut(&mut self) -> &mut ContainerNode {
        &mut self.root
    }
}

/// Builder for [`XmlDocument`].
///
/// # Examples
///
/// ```
/// use persistent_doc::backend::xml::XmlDocumentBuilder;
/// use persistent_doc::core::document::PersistentDocument;
///
/// let mut doc = XmlDocumentBuilder::new()
///     .root_tag("config")
///     .item_tag("entry")
///     .indent(2)
///     .build();
/// let mut values = doc.write_new_array("values").unwrap();
/// values.write_int("", 1).unwrap();
///
/// let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
///                 <config>\n  <values>\n    <entry>1</entry>\n  </values>\n</config>\n";
/// assert_eq!(doc.save_string().unwrap(), expected);
/// ```
pub struct XmlDocumentBuilder {
    root_tag: String,
    item_tag: String,
    pretty_formatter: bool,
    indent: usize,
    declaration: bool,
}

impl Default for XmlDocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlDocumentBuilder {
    pub fn new() -> Self {
        Self {
            root_tag: "root".to_string(),
            item_tag: "item".to_string(),
            pretty_formatter: true,
            indent: 4,
            declaration: true,
        }
    }

    /// Tag of the document element of a new document.
    pub fn root_tag(mut self, root_tag: &str) -> Self {
        self.root_tag = root_tag.to_string();
        self
    }

    /// Tag of the elements holding array scalars and string vector entries.
    pub fn item_tag(mut self, item_tag: &str) -> Self {
        self.item_tag = item_tag.to_string();
        self
    }

    pub fn pretty_formatter(mut self, yes: bool) -> Self {
        self.pretty_formatter = yes;
        self
    }

    /// Number of spaces per nesting level when the pretty formatter is on.
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn declaration(mut self, yes: bool) -> Self {
        self.declaration = yes;
        self
    }

    pub fn build(self) -> XmlDocument {
        let backend = Rc::new(XmlBackend::new(XmlTree::new(&self.root_tag), &self.item_tag));
        let root = XmlDocument::root_node(&backend);

        debug!(
            "xml document created (root: {}, item: {}, pretty: {})",
            self.root_tag, self.item_tag, self.pretty_formatter
        );

        XmlDocument {
            backend,
            root,
            style: XmlStyle {
                pretty: self.pretty_formatter,
                indent: self.indent,
                declaration: self.declaration,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use tempfile::NamedTempFile;

    use super::*;

    fn compact() -> XmlDocument {
        XmlDocumentBuilder::new()
            .pretty_formatter(false)
            .declaration(false)
            .build()
    }

    #[test]
    fn empty_document_has_one_root_element() {
        let doc = XmlDocument::new();
        assert_eq!(
            doc.save_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root/>\n"
        );
    }

    #[test]
    fn compact_output_has_no_whitespace() -> Result<(), Box<dyn Error>> {
        let mut doc = compact();
        let mut node = doc.write_new_container("simpleContainer")?;
        node.write_int("intValue", 21)?;

        assert_eq!(
            doc.save_string()?,
            r#"<root><simpleContainer intValue="21"/></root>"#
        );
        Ok(())
    }

    #[test]
    fn root_node_addresses_the_loaded_document_element() -> Result<(), Box<dyn Error>> {
        let mut doc = compact();
        doc.load_string(r#"<?xml version="1.0"?><settings level="3"><log file="a.log"/></settings>"#)?;

        assert_eq!(doc.unread_name()?, "settings");
        assert_eq!(doc.read_int("level")?, 3);
        assert_eq!(doc.read_container("log")?.read_string("file")?, "a.log");
        Ok(())
    }

    #[test]
    fn parse_error_carries_origin_and_offset() {
        let mut doc = XmlDocument::new();
        let result = doc.load_string("<root><a></b></root>");

        match result {
            Err(PersistError::Parse { origin, line, .. }) => {
                assert_eq!(origin, "string");
                assert!(line > 0);
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn failed_load_keeps_previous_content() -> Result<(), Box<dyn Error>> {
        let mut doc = compact();
        doc.write_int("kept", 1)?;

        assert!(doc.load_string("<a/><b/>").is_err());
        assert_eq!(doc.read_int("kept")?, 1);
        Ok(())
    }

    #[test]
    fn nodes_from_a_replaced_tree_are_stale() -> Result<(), Box<dyn Error>> {
        let mut doc = compact();
        doc.load_string("<root><log level=\"1\"/></root>")?;
        let mut log = doc.read_container("log")?;

        doc.load_string("<root><log level=\"2\"/></root>")?;

        assert!(matches!(
            log.read_int("level"),
            Err(PersistError::NullNode { .. })
        ));
        Ok(())
    }

    #[test]
    fn save_and_load_file_round_trip() -> Result<(), Box<dyn Error>> {
        let temp_file = NamedTempFile::new()?;
        let mut doc = XmlDocument::new();
        doc.write_string("filename", "pjsip.log")?;
        doc.save_file(temp_file.path())?;

        let mut loaded = XmlDocument::new();
        loaded.load_file(temp_file.path())?;

        assert_eq!(loaded.read_string("filename")?, "pjsip.log");
        Ok(())
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let mut doc = XmlDocument::new();
        let result = doc.load_file("/nonexistent/directory/settings.xml");

        assert!(matches!(result, Err(PersistError::Read { .. })));
    }

    #[test]
    fn unwritable_path_is_a_write_error() {
        let doc = XmlDocument::new();
        let result = doc.save_file("/nonexistent/directory/settings.xml");

        assert!(matches!(result, Err(PersistError::Write { .. })));
    }
}
