use std::cell::{Ref, RefCell, RefMut};

use log::trace;

use crate::{
    backend::xml::xml_tree::XmlTree,
    core::node::{ArrayCursor, ContainerNode, NodeBackend},
    error::PersistError,
};

/// [`NodeBackend`] over an XML element arena.
///
/// Named-member mode maps scalars to attributes of the node's element and
/// structured values to its first child element of the given name. Array mode
/// walks the element's children in document order, whatever their tag.
#[derive(Debug)]
pub(crate) struct XmlBackend {
    tree: RefCell<XmlTree>,
    item_tag: String,
}

fn null_node(title: &str) -> PersistError {
    PersistError::null_node(title, "parent node data is null")
}

fn target(tree: &XmlTree, node: &ContainerNode, title: &str) -> Result<usize, PersistError> {
    node.target()
        .and_then(|slot| tree.resolve(slot))
        .ok_or_else(|| null_node(title))
}

/// [`target`] for reads: an array node without an element has nothing to read.
fn read_target(tree: &XmlTree, node: &ContainerNode, title: &str) -> Result<usize, PersistError> {
    match node.target() {
        None if node.is_array() => Err(PersistError::array_exhausted(
            title,
            node.cursor().position(),
        )),
        _ => target(tree, node, title),
    }
}

/// Takes the element under an array cursor and moves the cursor to its next sibling.
fn consume(tree: &XmlTree, node: &mut ContainerNode, title: &str) -> Result<usize, PersistError> {
    match node.cursor() {
        ArrayCursor::Sibling { next, consumed } => {
            let current = next
                .and_then(|slot| tree.resolve(slot))
                .ok_or_else(|| PersistError::array_exhausted(title, consumed))?;
            let next = tree.next_sibling(current).map(|index| tree.slot(index));
            node.set_cursor(ArrayCursor::Sibling {
                next,
                consumed: consumed + 1,
            });
            trace!("xml array cursor advanced to {}", consumed + 1);
            Ok(current)
        }
        ArrayCursor::Append(count) | ArrayCursor::Index(count) => {
            Err(PersistError::array_exhausted(title, count))
        }
        ArrayCursor::Absent => Err(PersistError::array_exhausted(title, 0)),
    }
}

fn advance_append(node: &mut ContainerNode) {
    let count = node.cursor().position() + 1;
    node.set_cursor(ArrayCursor::Append(count));
    trace!("xml array cursor advanced to {}", count);
}

fn parse_number(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}

fn parse_bool(text: &str) -> bool {
    matches!(
        text.trim_start().chars().next(),
        Some('1' | 't' | 'T' | 'y' | 'Y')
    )
}

impl XmlBackend {
    pub(crate) fn new(tree: XmlTree, item_tag: &str) -> Self {
        XmlBackend {
            tree: RefCell::new(tree),
            item_tag: item_tag.to_string(),
        }
    }

    pub(crate) fn tree(&self) -> Ref<'_, XmlTree> {
        self.tree.borrow()
    }

    pub(crate) fn tree_mut(&self) -> RefMut<'_, XmlTree> {
        self.tree.borrow_mut()
    }

    /// Element tag for a structured write: the caller's name, or the item tag
    /// when none is given.
    fn tag<'a>(&'a self, name: &'a str) -> &'a str {
        if name.is_empty() {
            &self.item_tag
        } else {
            name
        }
    }

    /// Reads a scalar from the named attribute, or from the text of the
    /// element under the cursor. A missing attribute reads as empty text.
    fn read_text<T>(
        &self,
        node: &mut ContainerNode,
        name: &str,
        title: &str,
        convert: fn(&str) -> T,
    ) -> Result<T, PersistError> {
        let tree = self.tree.borrow();
        let parent = read_target(&tree, node, title)?;

        if node.is_array() {
            let element = consume(&tree, node, title)?;
            Ok(convert(tree.text(element)))
        } else {
            Ok(convert(tree.attribute(parent, name).unwrap_or("")))
        }
    }

    /// Element a structured read addresses: the element under the cursor, or
    /// the first child named `name`.
    fn select(
        &self,
        tree: &XmlTree,
        node: &mut ContainerNode,
        name: &str,
        title: &str,
    ) -> Result<Option<usize>, PersistError> {
        let parent = read_target(tree, node, title)?;

        if node.is_array() {
            consume(tree, node, title).map(Some)
        } else {
            Ok(tree.first_child_named(parent, name))
        }
    }

    fn write_text(
        &self,
        node: &mut ContainerNode,
        name: &str,
        title: &str,
        text: String,
    ) -> Result<(), PersistError> {
        let mut tree = self.tree.borrow_mut();
        let parent = target(&tree, node, title)?;

        if node.is_array() {
            let element = tree.append_child(parent, &self.item_tag);
            tree.set_text(element, &text);
            advance_append(node);
        } else {
            tree.set_attribute(parent, name, text);
        }
        Ok(())
    }

    /// Appends a child element for a structured write.
    fn append(
        &self,
        tree: &mut XmlTree,
        node: &mut ContainerNode,
        name: &str,
        title: &str,
    ) -> Result<usize, PersistError> {
        let parent = target(tree, node, title)?;
        let element = tree.append_child(parent, self.tag(name));
        if node.is_array() {
            advance_append(node);
        }
        Ok(element)
    }
}

impl NodeBackend for XmlBackend {
    fn has_unread(&self, node: &ContainerNode) -> bool {
        let ArrayCursor::Sibling {
            next: Some(slot), ..
        } = node.cursor()
        else {
            return false;
        };
        self.tree.borrow().resolve(slot).is_some()
    }

    fn unread_name(&self, node: &ContainerNode) -> Result<String, PersistError> {
        let title = "unread name";
        let tree = self.tree.borrow();
        let element = read_target(&tree, node, title)?;

        match node.cursor() {
            ArrayCursor::Sibling { next, consumed } => next
                .and_then(|slot| tree.resolve(slot))
                .map(|index| tree.name(index).to_string())
                .ok_or_else(|| PersistError::array_exhausted(title, consumed)),
            _ => Ok(tree.name(element).to_string()),
        }
    }

    fn read_number(&self, node: &mut ContainerNode, name: &str) -> Result<f64, PersistError> {
        self.read_text(node, name, "read number", parse_number)
    }

    fn read_bool(&self, node: &mut ContainerNode, name: &str) -> Result<bool, PersistError> {
        self.read_text(node, name, "read bool", parse_bool)
    }

    fn read_string(&self, node: &mut ContainerNode, name: &str) -> Result<String, PersistError> {
        self.read_text(node, name, "read string", str::to_string)
    }

    fn read_string_vector(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<Vec<String>, PersistError> {
        let tree = self.tree.borrow();
        let values = match self.select(&tree, node, name, "read string vector")? {
            Some(element) => tree
                .children(element)
                .map(|child| tree.text(child).to_string())
                .collect(),
            None => Vec::new(),
        };
        Ok(values)
    }

    fn read_container(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError> {
        let tree = self.tree.borrow();
        let element = self.select(&tree, node, name, "read container")?;
        Ok(node.derive(element.map(|index| tree.slot(index)), ArrayCursor::Absent))
    }

    fn read_array(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError> {
        let title = "read array";
        let tree = self.tree.borrow();
        let parent = read_target(&tree, node, title)?;

        match self.select(&tree, node, name, title)? {
            Some(element) => {
                let next = tree.first_child(element).map(|index| tree.slot(index));
                Ok(node.derive(
                    Some(tree.slot(element)),
                    ArrayCursor::Sibling { next, consumed: 0 },
                ))
            }
            None if tree.attribute(parent, name).is_some() => Err(PersistError::type_mismatch(
                title,
                "array expected, found an attribute",
                name,
            )),
            None => Ok(node.derive(
                None,
                ArrayCursor::Sibling {
                    next: None,
                    consumed: 0,
                },
            )),
        }
    }

    fn write_number(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: f64,
    ) -> Result<(), PersistError> {
        self.write_text(node, name, "write number", value.to_string())
    }

    fn write_bool(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: bool,
    ) -> Result<(), PersistError> {
        self.write_text(node, name, "write bool", value.to_string())
    }

    fn write_string(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: &str,
    ) -> Result<(), PersistError> {
        self.write_text(node, name, "write string", value.to_string())
    }

    fn write_string_vector(
        &self,
        node: &mut ContainerNode,
        name: &str,
        value: &[String],
    ) -> Result<(), PersistError> {
        let mut tree = self.tree.borrow_mut();
        let element = self.append(&mut tree, node, name, "write string vector")?;
        for entry in value {
            let child = tree.append_child(element, &self.item_tag);
            tree.set_text(child, entry);
        }
        Ok(())
    }

    fn write_new_container(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError> {
        let mut tree = self.tree.borrow_mut();
        let element = self.append(&mut tree, node, name, "write new container")?;
        Ok(node.derive(Some(tree.slot(element)), ArrayCursor::Absent))
    }

    fn write_new_array(
        &self,
        node: &mut ContainerNode,
        name: &str,
    ) -> Result<ContainerNode, PersistError> {
        let mut tree = self.tree.borrow_mut();
        let element = self.append(&mut tree, node, name, "write new array")?;
        Ok(node.derive(Some(tree.slot(element)), ArrayCursor::Append(0)))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::{Rc, Weak};

    use super::*;
    use crate::backend::xml::xml_tree::XmlStyle;

    fn backend(input: Option<&str>) -> Rc<XmlBackend> {
        let tree = match input {
            Some(input) => XmlTree::parse(input, "test", "string").unwrap(),
            None => XmlTree::new("root"),
        };
        Rc::new(XmlBackend::new(tree, "item"))
    }

    fn root_node(backend: &Rc<XmlBackend>) -> ContainerNode {
        let weak: Weak<dyn NodeBackend> = Rc::downgrade(backend) as Weak<dyn NodeBackend>;
        let tree = backend.tree();
        let slot = tree.slot(tree.document_element());
        ContainerNode::new(weak, Some(slot), ArrayCursor::Absent)
    }

    fn saved(backend: &Rc<XmlBackend>) -> String {
        backend
            .tree()
            .write(XmlStyle {
                pretty: false,
                indent: 4,
                declaration: false,
            })
            .unwrap()
    }

    #[test]
    fn named_scalars_are_attributes() {
        let backend = backend(None);
        let mut root = root_node(&backend);

        root.write_int("intValue", 14).unwrap();
        root.write_string("stringValue", "x").unwrap();
        root.write_bool("flag", true).unwrap();
        root.write_number("ratio", 2.5).unwrap();
        root.write_int("intValue", 15).unwrap();

        assert_eq!(
            saved(&backend),
            r#"<root intValue="15" stringValue="x" flag="true" ratio="2.5"/>"#
        );
        assert_eq!(root.read_int("intValue").unwrap(), 15);
        assert_eq!(root.read_number("ratio").unwrap(), 2.5);
        assert!(root.read_bool("flag").unwrap());
    }

    #[test]
    fn missing_attributes_read_as_defaults() {
        let backend = backend(None);
        let mut root = root_node(&backend);

        assert_eq!(root.read_number("missing").unwrap(), 0.0);
        assert!(!root.read_bool("missing").unwrap());
        assert_eq!(root.read_string("missing").unwrap(), "");
        assert!(root.read_string_vector("missing").unwrap().is_empty());
    }

    #[test]
    fn lenient_scalar_parsing() {
        assert!(parse_bool("yes"));
        assert!(parse_bool("True"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number("abc"), 0.0);
    }

    #[test]
    fn array_scalars_become_item_children() {
        let backend = backend(None);
        let mut root = root_node(&backend);
        let mut array = root.write_new_array("arr").unwrap();

        for value in [1, 2, 3] {
            array.write_int("ignored", value).unwrap();
        }

        assert_eq!(array.cursor(), ArrayCursor::Append(3));
        assert_eq!(
            saved(&backend),
            "<root><arr><item>1</item><item>2</item><item>3</item></arr></root>"
        );
    }

    #[test]
    fn array_reads_walk_siblings_of_any_tag() {
        let backend = backend(Some(
            "<root><list><a>1</a><b>true</b><c>text</c></list></root>",
        ));
        let mut root = root_node(&backend);
        let mut list = root.read_array("list").unwrap();

        assert_eq!(list.unread_name().unwrap(), "a");
        assert_eq!(list.read_int("").unwrap(), 1);
        assert_eq!(list.unread_name().unwrap(), "b");
        assert!(list.read_bool("").unwrap());
        assert_eq!(list.read_string("").unwrap(), "text");
        assert!(!list.has_unread());

        match list.read_string("") {
            Err(PersistError::ArrayExhausted { position, .. }) => assert_eq!(position, 3),
            other => panic!("Expected ArrayExhausted error, got {:?}", other),
        }
    }

    #[test]
    fn named_mode_unread_name_is_own_tag() {
        let backend = backend(Some("<settings><log level=\"3\"/></settings>"));
        let mut root = root_node(&backend);
        let log = root.read_container("log").unwrap();

        assert_eq!(root.unread_name().unwrap(), "settings");
        assert_eq!(log.unread_name().unwrap(), "log");
    }

    #[test]
    fn string_vectors_are_item_lists() {
        let backend = backend(None);
        let mut root = root_node(&backend);
        let values = vec!["a".to_string(), "b".to_string()];

        root.write_string_vector("names", &values).unwrap();

        assert_eq!(
            saved(&backend),
            "<root><names><item>a</item><item>b</item></names></root>"
        );
        assert_eq!(root.read_string_vector("names").unwrap(), values);
    }

    #[test]
    fn containers_in_array_mode_fall_back_to_item_tag() {
        let backend = backend(None);
        let mut root = root_node(&backend);
        let mut array = root.write_new_array("accounts").unwrap();

        let mut first = array.write_new_container("").unwrap();
        first.write_int("id", 1).unwrap();
        let mut second = array.write_new_container("account").unwrap();
        second.write_int("id", 2).unwrap();

        assert_eq!(
            saved(&backend),
            r#"<root><accounts><item id="1"/><account id="2"/></accounts></root>"#
        );
    }

    #[test]
    fn read_array_on_attribute_is_type_mismatch() {
        let backend = backend(Some(r#"<root level="3"/>"#));
        let mut root = root_node(&backend);

        assert!(matches!(
            root.read_array("level"),
            Err(PersistError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn read_array_on_missing_child_is_empty() {
        let backend = backend(None);
        let mut root = root_node(&backend);
        let mut array = root.read_array("missing").unwrap();

        assert!(array.is_array());
        assert!(!array.has_unread());
        assert!(matches!(
            array.read_number(""),
            Err(PersistError::ArrayExhausted { position: 0, .. })
        ));
        assert!(matches!(
            array.read_container(""),
            Err(PersistError::ArrayExhausted { position: 0, .. })
        ));
        assert!(matches!(
            array.unread_name(),
            Err(PersistError::ArrayExhausted { .. })
        ));
    }

    #[test]
    fn missing_container_is_a_null_node() {
        let backend = backend(None);
        let mut root = root_node(&backend);
        let mut container = root.read_container("missing").unwrap();

        assert!(matches!(
            container.read_int("x"),
            Err(PersistError::NullNode { .. })
        ));
    }

    #[test]
    fn handles_survive_appends_through_other_nodes() {
        let backend = backend(None);
        let mut root = root_node(&backend);
        let mut first = root.write_new_container("first").unwrap();
        let mut second = root.write_new_container("second").unwrap();

        second.write_int("n", 2).unwrap();
        first.write_int("n", 1).unwrap();
        root.write_new_container("third").unwrap();
        first.write_int("m", 3).unwrap();

        assert_eq!(
            saved(&backend),
            r#"<root><first n="1" m="3"/><second n="2"/><third/></root>"#
        );
    }
}
