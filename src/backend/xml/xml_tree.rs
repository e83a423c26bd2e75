use quick_xml::{
    Reader, Writer,
    escape::unescape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{core::node::Slot, error::PersistError};

/// One element of the arena. Children form a singly linked list through
/// `next_sibling`, so appending never moves existing elements.
#[derive(Debug, Clone, Default)]
pub(crate) struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    first_child: Option<usize>,
    last_child: Option<usize>,
    next_sibling: Option<usize>,
}

impl Element {
    fn new(name: &str, attributes: Vec<(String, String)>) -> Self {
        Element {
            name: name.to_string(),
            attributes,
            ..Element::default()
        }
    }
}

/// Output options for [`XmlTree::write`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct XmlStyle {
    pub(crate) pretty: bool,
    pub(crate) indent: usize,
    pub(crate) declaration: bool,
}

/// Arena of XML elements with a single document element.
#[derive(Debug)]
pub(crate) struct XmlTree {
    elements: Vec<Element>,
    document_element: usize,
    generation: u32,
}

impl XmlTree {
    /// Creates a tree holding one empty element named `root_tag`.
    pub(crate) fn new(root_tag: &str) -> Self {
        XmlTree {
            elements: vec![Element::new(root_tag, Vec::new())],
            document_element: 0,
            generation: 0,
        }
    }

    /// Installs `other` in place of this tree. Slots issued before the call
    /// stop resolving.
    pub(crate) fn replace(&mut self, other: XmlTree) {
        let generation = self.generation.wrapping_add(1);
        *self = XmlTree {
            generation,
            ..other
        };
    }

    pub(crate) fn document_element(&self) -> usize {
        self.document_element
    }

    pub(crate) fn slot(&self, index: usize) -> Slot {
        Slot::new(index, self.generation)
    }

    pub(crate) fn resolve(&self, slot: Slot) -> Option<usize> {
        (slot.generation() == self.generation && slot.index() < self.elements.len())
            .then_some(slot.index())
    }

    pub(crate) fn name(&self, index: usize) -> &str {
        &self.elements[index].name
    }

    pub(crate) fn text(&self, index: usize) -> &str {
        self.elements[index].text.as_deref().unwrap_or("")
    }

    pub(crate) fn set_text(&mut self, index: usize, text: &str) {
        self.elements[index].text = Some(text.to_string());
    }

    pub(crate) fn attribute(&self, index: usize, name: &str) -> Option<&str> {
        self.elements[index]
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Overwrites the attribute in place, or appends it.
    pub(crate) fn set_attribute(&mut self, index: usize, name: &str, value: String) {
        let attributes = &mut self.elements[index].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => attributes.push((name.to_string(), value)),
        }
    }

    pub(crate) fn first_child(&self, index: usize) -> Option<usize> {
        self.elements[index].first_child
    }

    pub(crate) fn next_sibling(&self, index: usize) -> Option<usize> {
        self.elements[index].next_sibling
    }

    pub(crate) fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.first_child(index), |&child| self.next_sibling(child))
    }

    pub(crate) fn first_child_named(&self, index: usize, name: &str) -> Option<usize> {
        self.children(index).find(|&child| self.name(child) == name)
    }

    /// Appends an empty element named `name` as the last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: usize, name: &str) -> usize {
        let index = self.elements.len();
        self.elements.push(Element::new(name, Vec::new()));
        link_child(&mut self.elements, parent, index);
        index
    }

    /// Builds a tree from XML text.
    ///
    /// Text directly inside an element is kept verbatim for leaf elements and
    /// trimmed for elements that also have children. Comments, processing
    /// instructions and the doctype are dropped.
    pub(crate) fn parse(input: &str, title: &str, origin: &str) -> Result<XmlTree, PersistError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(false);

        let mut elements: Vec<Element> = Vec::new();
        let mut document_element: Option<usize> = None;
        let mut open: Vec<(usize, String)> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                PersistError::parse(title, e, origin, reader.error_position() as u64)
            })?;
            let offset = reader.buffer_position() as u64;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let (name, attributes) =
                        parse_start(e).map_err(|reason| PersistError::parse(title, reason, origin, offset))?;
                    let parent = open.last().map(|(index, _)| *index);
                    if parent.is_none() && document_element.is_some() {
                        return Err(PersistError::parse(
                            title,
                            format!("second document element <{}>", name),
                            origin,
                            offset,
                        ));
                    }

                    let index = elements.len();
                    elements.push(Element::new(&name, attributes));
                    match parent {
                        Some(parent) => link_child(&mut elements, parent, index),
                        None => document_element = Some(index),
                    }

                    if matches!(event, Event::Start(_)) {
                        open.push((index, String::new()));
                    }
                }
                Event::End(_) => {
                    if let Some((index, text)) = open.pop() {
                        elements[index].text = finish_text(text, elements[index].first_child.is_some());
                    }
                }
                Event::Text(ref e) => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| PersistError::parse(title, e, origin, offset))?;
                    let text = unescape(raw).map_err(|e| PersistError::parse(title, e, origin, offset))?;
                    append_text(&mut open, &text, title, origin, offset)?;
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e.as_ref());
                    append_text(&mut open, &text, title, origin, offset)?;
                }
                Event::GeneralRef(ref e) => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| PersistError::parse(title, e, origin, offset))?;
                    let reference = format!("&{};", raw);
                    let text =
                        unescape(&reference).map_err(|e| PersistError::parse(title, e, origin, offset))?;
                    append_text(&mut open, &text, title, origin, offset)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let end = input.len() as u64;
        if let Some((index, _)) = open.last() {
            return Err(PersistError::parse(
                title,
                format!("unclosed element <{}>", elements[*index].name),
                origin,
                end,
            ));
        }
        let document_element = document_element
            .ok_or_else(|| PersistError::parse(title, "no document element", origin, end))?;

        Ok(XmlTree {
            elements,
            document_element,
            generation: 0,
        })
    }

    /// Serializes the tree.
    pub(crate) fn write(&self, style: XmlStyle) -> Result<String, String> {
        let mut writer = if style.pretty {
            Writer::new_with_indent(Vec::new(), b' ', style.indent)
        } else {
            Writer::new(Vec::new())
        };

        if style.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(|e| e.to_string())?;
        }
        self.write_element(&mut writer, self.document_element)?;

        let mut output = String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())?;
        if style.pretty {
            output.push('\n');
        }
        Ok(output)
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, index: usize) -> Result<(), String> {
        let element = &self.elements[index];
        let mut start = BytesStart::new(element.name.as_str());
        for (key, value) in &element.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if element.first_child.is_none() && element.text.is_none() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| e.to_string());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| e.to_string())?;
        if let Some(text) = &element.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| e.to_string())?;
        }
        for child in self.children(index) {
            self.write_element(writer, child)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(element.name.as_str())))
            .map_err(|e| e.to_string())
    }
}

fn link_child(elements: &mut [Element], parent: usize, child: usize) {
    match elements[parent].last_child {
        Some(last) => elements[last].next_sibling = Some(child),
        None => elements[parent].first_child = Some(child),
    }
    elements[parent].last_child = Some(child);
}

fn parse_start(start: &BytesStart) -> Result<(String, Vec<(String, String)>), String> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| e.to_string())?
        .to_string();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| format!("Attribute error: {}", e))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| e.to_string())?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|e| e.to_string())?
            .to_string();
        attributes.push((key, value));
    }

    Ok((name, attributes))
}

fn append_text(
    open: &mut [(usize, String)],
    text: &str,
    title: &str,
    origin: &str,
    offset: u64,
) -> Result<(), PersistError> {
    match open.last_mut() {
        Some((_, buffer)) => {
            buffer.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(PersistError::parse(
            title,
            "text outside of the document element",
            origin,
            offset,
        )),
    }
}

fn finish_text(text: String, has_children: bool) -> Option<String> {
    let text = if has_children {
        text.trim().to_string()
    } else {
        text
    };
    (!text.is_empty()).then_some(text)
}
