//! Generic decoding of an XML document into nested, ordered key-value groups
//!
//! Nothing here knows the SVD vocabulary. An element without element
//! children is a [`Node::Leaf`] holding its whitespace-normalized text, every
//! other element is a [`Node::Group`]. Inside a group each child is keyed by
//! the text of its own `name` child when it has one, by its tag otherwise.
//! Keys are not unique: siblings sharing a key are all kept, in document
//! order, and keyed lookups return the first of them.

use indexmap::IndexMap;
use roxmltree::Document;

use crate::errors::DocumentError;
use crate::util::respace;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Leaf(String),
    Group(Group),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    pub tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<(String, Node)>,
}

/// Parses `xml` and decodes its root element
pub fn parse(xml: &str) -> Result<Group, DocumentError> {
    let document = Document::parse(xml)?;
    let root = document.root_element();
    match decode(root) {
        Node::Group(group) => Ok(group),
        Node::Leaf(_) => Err(DocumentError::NotAGroup(root.tag_name().name().to_string())),
    }
}

pub fn decode(node: roxmltree::Node) -> Node {
    let mut elements = node.children().filter(|n| n.is_element()).peekable();
    if elements.peek().is_none() {
        return Node::Leaf(respace(node.text().unwrap_or_default()));
    }

    let mut group = Group {
        tag: node.tag_name().name().to_string(),
        attributes: node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        children: Vec::new(),
    };
    for element in elements {
        group.children.push((key_of(element), decode(element)));
    }
    Node::Group(group)
}

fn key_of(element: roxmltree::Node) -> String {
    element
        .children()
        .find(|n| n.has_tag_name("name") && !n.children().any(|c| c.is_element()))
        .map(|n| respace(n.text().unwrap_or_default()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| element.tag_name().name().to_string())
}

impl Node {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Node::Leaf(text) => Some(text),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Leaf(_) => None,
            Node::Group(group) => Some(group),
        }
    }
}

impl Group {
    /// First child under `key`
    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children
            .iter()
            .find_map(|(k, node)| (k == key).then_some(node))
    }

    /// Text of the leaf child under `key`
    pub fn leaf(&self, key: &str) -> Option<&str> {
        self.child(key).and_then(Node::as_leaf)
    }

    /// Like [`leaf`](Self::leaf), but an empty text counts as absent
    pub fn text(&self, key: &str) -> Option<&str> {
        self.leaf(key).filter(|text| !text.is_empty())
    }

    pub fn group(&self, key: &str) -> Option<&Group> {
        self.child(key).and_then(Node::as_group)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The `name` leaf of this group
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    /// Child groups with the given tag, in document order, with their keys
    pub fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = (&'a str, &'a Group)> + 'a {
        self.children.iter().filter_map(move |(key, node)| match node {
            Node::Group(group) if group.tag == tag => Some((key.as_str(), group)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_and_groups() {
        let root = parse(
            "<device>
                <name>STM32F0</name>
                <peripherals>
                    <peripheral derivedFrom='UART0'>
                        <name>UART1</name>
                        <baseAddress>  0x40001000 </baseAddress>
                    </peripheral>
                </peripherals>
            </device>",
        )
        .unwrap();

        assert_eq!(root.tag, "device");
        assert_eq!(root.name(), Some("STM32F0"));
        let peripherals = root.group("peripherals").unwrap();
        let uart1 = peripherals.group("UART1").unwrap();
        assert_eq!(uart1.tag, "peripheral");
        assert_eq!(uart1.attribute("derivedFrom"), Some("UART0"));
        assert_eq!(uart1.leaf("baseAddress"), Some("0x40001000"));
        assert_eq!(peripherals.tagged("peripheral").count(), 1);
    }

    #[test]
    fn single_element_child_is_a_leaf() {
        let root = parse("<a><b>text</b><c/><d><e>1</e></d></a>").unwrap();
        assert_eq!(root.child("b"), Some(&Node::Leaf("text".into())));
        assert_eq!(root.child("c"), Some(&Node::Leaf(String::new())));
        let d = root.group("d").unwrap();
        assert_eq!(d.leaf("e"), Some("1"));
        assert_eq!(root.text("c"), None);
    }

    #[test]
    fn keys_keep_document_order() {
        let root = parse(
            "<fields>
                <field><name>EN</name></field>
                <field><name>MODE</name></field>
                <field><name>ACK</name></field>
            </fields>",
        )
        .unwrap();
        let keys: Vec<_> = root.tagged("field").map(|(key, _)| key).collect();
        assert_eq!(keys, ["EN", "MODE", "ACK"]);
    }

    #[test]
    fn siblings_sharing_a_key_are_kept() {
        let root = parse(
            "<field>
                <enumeratedValues><usage>read</usage></enumeratedValues>
                <enumeratedValues><usage>write</usage></enumeratedValues>
                <value><name>A</name><value>0</value></value>
                <value><name>A</name><value>2</value></value>
            </field>",
        )
        .unwrap();
        let usages: Vec<_> = root
            .tagged("enumeratedValues")
            .map(|(key, group)| (key, group.leaf("usage")))
            .collect();
        assert_eq!(
            usages,
            [
                ("enumeratedValues", Some("read")),
                ("enumeratedValues", Some("write")),
            ]
        );
        let values: Vec<_> = root.tagged("value").map(|(_, g)| g.leaf("value")).collect();
        assert_eq!(values, [Some("0"), Some("2")]);
        assert_eq!(root.group("A").and_then(|g| g.leaf("value")), Some("0"));
    }

    #[test]
    fn malformed_document() {
        assert!(matches!(
            parse("<device><name>x</device>"),
            Err(DocumentError::Xml(_))
        ));
        assert!(matches!(
            parse("<device>just text</device>"),
            Err(DocumentError::NotAGroup(_))
        ));
    }
}
