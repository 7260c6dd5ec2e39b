//! Дерево XML-документа и доступ к нему по путям вида `Dbtr.PstlAdr.TwnNm`.
//!
//! Префиксы пространств имён отбрасываются, атрибуты хранятся отдельно от
//! текста, все значения остаются строками в том виде, в каком они записаны
//! в файле (без преобразования в числа).

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;

/// Элемент XML со своими атрибутами, текстом и дочерними элементами.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

/// Один шаг пути.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'p> {
    /// Дочерний элемент с таким локальным именем.
    Child(&'p str),
    /// Атрибут, записывается как `@Ccy`.
    Attribute(&'p str),
    /// Собственный текст элемента, записывается как `#text`.
    Text,
}

impl<'p> PathSegment<'p> {
    pub fn parse(segment: &'p str) -> Self {
        if segment == "#text" {
            PathSegment::Text
        } else if let Some(name) = segment.strip_prefix('@') {
            PathSegment::Attribute(name)
        } else {
            PathSegment::Child(segment)
        }
    }
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Первый дочерний элемент с данным именем.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Все дочерние элементы с данным именем. Одиночный элемент и список
    /// элементов обходятся одинаково.
    pub fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Спускается по цепочке дочерних элементов. Путь из атрибута или
    /// `#text` элемента не даёт.
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |element, segment| match PathSegment::parse(segment) {
                PathSegment::Child(name) => element.child(name),
                PathSegment::Attribute(_) | PathSegment::Text => None,
            })
    }

    /// Значение по пути. Если на любом шаге узла нет, возвращает `None`.
    pub fn value(&self, path: &str) -> Option<&str> {
        let (parent, last) = self.split_path(path)?;
        match last {
            PathSegment::Child(name) => parent.child(name).map(Element::text),
            PathSegment::Attribute(name) => parent.attribute(name),
            PathSegment::Text => Some(parent.text()),
        }
    }

    /// Все значения по пути, если последний элемент повторяется.
    pub fn values(&self, path: &str) -> Vec<&str> {
        let Some((parent, last)) = self.split_path(path) else {
            return Vec::new();
        };
        match last {
            PathSegment::Child(name) => parent.children_named(name).map(Element::text).collect(),
            PathSegment::Attribute(name) => parent.attribute(name).into_iter().collect(),
            PathSegment::Text => vec![parent.text()],
        }
    }

    fn split_path<'p>(&self, path: &'p str) -> Option<(&Element, PathSegment<'p>)> {
        let (parent_path, last) = match path.rsplit_once('.') {
            Some((parent_path, last)) => (parent_path, last),
            None => ("", path),
        };
        let parent = self.find(parent_path)?;
        Some((parent, PathSegment::parse(last)))
    }
}

/// Разобранный XML-документ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTree {
    root: Element,
}

impl ParsedTree {
    /// Строит дерево из текста документа.
    ///
    /// Синтаксические ошибки, незакрытые элементы и документ без корня
    /// возвращаются как [`ParseError`]: частичного результата не бывает.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(open_element(&start)?),
                Event::Empty(start) => {
                    let element = open_element(&start)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        ParseError::InvalidFormat("unexpected closing tag".to_string())
                    })?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ParseError::InvalidFormat(format!(
                "element <{}> is not closed",
                open.name
            )));
        }
        let root = root.ok_or_else(|| {
            ParseError::InvalidFormat("document has no root element".to_string())
        })?;
        Ok(ParsedTree { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }
}

fn open_element(start: &BytesStart) -> Result<Element, ParseError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn close_element(
    mut element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ParseError> {
    let trimmed = element.text.trim();
    if trimmed.len() != element.text.len() {
        element.text = trimmed.to_string();
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(ParseError::InvalidFormat(
                "document has more than one root element".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<ns:Document xmlns:ns="urn:iso:std:iso:20022:tech:xsd:pacs.008.001.08">
  <ns:Tx>
    <ns:Amt ns:Ccy="EUR">00100.50</ns:Amt>
    <ns:Nm>Smith &amp; Sons</ns:Nm>
    <ns:Note><![CDATA[<raw>]]></ns:Note>
    <ns:Ustrd>first</ns:Ustrd>
    <ns:Ustrd>second</ns:Ustrd>
    <ns:Empty/>
  </ns:Tx>
</ns:Document>"##;

    #[test]
    fn test_strips_namespace_prefixes() {
        let tree = ParsedTree::parse(SAMPLE).unwrap();
        assert_eq!(tree.root().name(), "Document");
        assert_eq!(tree.root().children()[0].name(), "Tx");
    }

    #[test]
    fn test_values_stay_raw_strings() {
        let tree = ParsedTree::parse(SAMPLE).unwrap();
        let root = tree.root();

        assert_eq!(root.value("Tx.Amt"), Some("00100.50"));
        assert_eq!(root.value("Tx.Amt.#text"), Some("00100.50"));
        assert_eq!(root.value("Tx.Amt.@Ccy"), Some("EUR"));
        assert_eq!(root.value("Tx.Nm"), Some("Smith & Sons"));
        assert_eq!(root.value("Tx.Note"), Some("<raw>"));
        assert_eq!(root.value("Tx.Empty"), Some(""));
    }

    #[test]
    fn test_missing_path_is_none() {
        let tree = ParsedTree::parse(SAMPLE).unwrap();
        let root = tree.root();

        assert_eq!(root.value("Tx.Missing.Deeper.Still"), None);
        assert_eq!(root.value("Nope.Amt"), None);
        assert_eq!(root.value("Tx.Amt.@Missing"), None);
        assert_eq!(root.find("Tx.Amt.@Ccy.Nm"), None);
        assert!(root.values("Missing.Ustrd").is_empty());
    }

    #[test]
    fn test_repeated_values() {
        let tree = ParsedTree::parse(SAMPLE).unwrap();
        assert_eq!(tree.root().values("Tx.Ustrd"), ["first", "second"]);
        assert_eq!(tree.root().value("Tx.Ustrd"), Some("first"));
    }

    #[test]
    fn test_invalid_xml_is_error() {
        assert!(ParsedTree::parse("<a><b></a>").is_err());
        assert!(ParsedTree::parse("<a><b>").is_err());
        assert!(ParsedTree::parse("").is_err());
        assert!(ParsedTree::parse("<a/><b/>").is_err());
    }
}
