use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
    rc::{Rc, Weak},
};

use log::{debug, error};
use serde::Serialize;
use serde_json::{Map, Serializer, Value, ser::PrettyFormatter};

use crate::{
    backend::json::json_node::JsonBackend,
    core::{
        document::PersistentDocument,
        node::{ArrayCursor, ContainerNode, NodeBackend},
    },
    error::PersistError,
};

/// A persistent document backed by a JSON tree.
///
/// A new document holds an empty object. Output is either indented (the
/// default, four spaces) or compact, as chosen at construction.
///
/// # Examples
///
/// ```
/// use persistent_doc::backend::json::JsonDocument;
/// use persistent_doc::core::document::PersistentDocument;
///
/// let mut doc = JsonDocument::compact();
/// doc.write_int("intValue", 14).unwrap();
/// doc.write_string("stringValue", "x").unwrap();
///
/// assert_eq!(doc.save_string().unwrap(), r#"{"intValue":14,"stringValue":"x"}"#);
/// ```
pub struct JsonDocument {
    backend: Rc<JsonBackend>,
    root: ContainerNode,
    use_pretty_formatter: bool,
    indent: Box<[u8]>,
}

impl JsonDocument {
    /// Creates an empty document with indented output.
    pub fn new() -> Self {
        JsonDocumentBuilder::new().build()
    }

    /// Creates an empty document with compact output.
    pub fn compact() -> Self {
        JsonDocumentBuilder::new().pretty_formatter(false).build()
    }

    fn with_options(use_pretty_formatter: bool, indent: Box<[u8]>) -> Self {
        let backend = Rc::new(JsonBackend::new(Value::Object(Map::new())));
        let root = Self::root_node(&backend, ArrayCursor::Absent);

        debug!(
            "json document created (pretty: {}, indent: {} bytes)",
            use_pretty_formatter,
            indent.len()
        );

        Self {
            backend,
            root,
            use_pretty_formatter,
            indent,
        }
    }

    fn root_node(backend: &Rc<JsonBackend>, cursor: ArrayCursor) -> ContainerNode {
        let weak: Weak<dyn NodeBackend> = Rc::downgrade(backend) as Weak<dyn NodeBackend>;
        let slot = backend.tree().root_slot();
        ContainerNode::new(weak, Some(slot), cursor)
    }

    /// Installs a parsed tree and re-derives the root node.
    fn install(&mut self, value: Value, title: &str, origin: &str) -> Result<(), PersistError> {
        let cursor = match value {
            Value::Object(_) => ArrayCursor::Absent,
            Value::Array(_) => ArrayCursor::Index(0),
            _ => {
                error!("{} error: document root is a scalar [{}]", title, origin);
                return Err(PersistError::parse(
                    title,
                    "document root must be an object or an array",
                    origin,
                    1,
                ));
            }
        };

        self.backend.tree_mut().replace(value);
        self.root = Self::root_node(&self.backend, cursor);
        debug!("json document loaded from {}", origin);
        Ok(())
    }

    fn render(&self, title: &str, origin: &str) -> Result<String, PersistError> {
        let tree = self.backend.tree();

        let rendered = if self.use_pretty_formatter {
            let mut buffer = Vec::new();
            let formatter = PrettyFormatter::with_indent(&self.indent);
            let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
            tree.root()
                .serialize(&mut serializer)
                .map_err(|e| PersistError::write(title, e, origin))?;
            buffer.push(b'\n');
            String::from_utf8(buffer).map_err(|e| PersistError::write(title, e, origin))
        } else {
            serde_json::to_string(tree.root()).map_err(|e| PersistError::write(title, e, origin))
        };

        rendered.inspect_err(|e| error!("{}", e))
    }
}

impl Default for JsonDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentDocument for JsonDocument {
    fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), PersistError> {
        let title = "json load from file";
        let file_path = path.as_ref();
        let origin = file_path.display().to_string();

        let file = File::open(file_path).map_err(|e| {
            error!("Failed to open JSON file {}: {}", origin, e);
            PersistError::read(title, e, &origin)
        })?;

        let value: Value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            error!("Failed to parse JSON file {}: {}", origin, e);
            PersistError::parse(title, &e, &origin, e.line() as u64)
        })?;

        self.install(value, title, &origin)
    }

    fn load_string(&mut self, input: &str) -> Result<(), PersistError> {
        let title = "json load from string";

        let value: Value = serde_json::from_str(input).map_err(|e| {
            error!("Failed to parse JSON string: {}", e);
            PersistError::parse(title, &e, "string", e.line() as u64)
        })?;

        self.install(value, title, "string")
    }

    fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let title = "json save to file";
        let file_path = path.as_ref();
        let origin = file_path.display().to_string();

        let content = self.render(title, &origin)?;

        let file = File::create(file_path).map_err(|e| {
            error!("Failed to create JSON file {}: {}", origin, e);
            PersistError::write(title, e, &origin)
        })?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(content.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| {
                error!("Failed to write JSON file {}: {}", origin, e);
                PersistError::write(title, e, &origin)
            })?;

        debug!("json document saved to {}", origin);
        Ok(())
    }

    fn save_string(&self) -> Result<String, PersistError> {
        self.render("json save to string", "string")
    }

    fn root_container(&self) -> &ContainerNode {
        &self.root
    }

    fn root_container_mut(&mut self) -> &mut ContainerNode {
        &mut self.root
    }
}

/// Builder for [`JsonDocument`].
///
/// # Examples
///
/// ```
/// use persistent_doc::backend::json::JsonDocumentBuilder;
/// use persistent_doc::core::document::PersistentDocument;
///
/// let mut doc = JsonDocumentBuilder::new()
///     .pretty_formatter(true)
///     .indent(b"  ")
///     .build();
/// doc.write_bool("enabled", true).unwrap();
///
/// assert_eq!(doc.save_string().unwrap(), "{\n  \"enabled\": true\n}\n");
/// ```
pub struct JsonDocumentBuilder {
    indent: Box<[u8]>,
    pretty_formatter: bool,
}

impl Default for JsonDocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonDocumentBuilder {
    /// Indented output with four spaces by default.
    pub fn new() -> JsonDocumentBuilder {
        JsonDocumentBuilder {
            indent: Box::from(b"    ".to_vec()),
            pretty_formatter: true,
        }
    }

    /// Indentation unit used when the pretty formatter is on.
    pub fn indent(mut self, indent: &[u8]) -> JsonDocumentBuilder {
        self.indent = Box::from(indent);
        self
    }

    pub fn pretty_formatter(mut self, yes: bool) -> JsonDocumentBuilder {
        self.pretty_formatter = yes;
        self
    }

    pub fn build(self) -> JsonDocument {
        JsonDocument::with_options(self.pretty_formatter, self.indent)
    }
}
