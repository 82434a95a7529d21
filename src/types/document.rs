//! Content tree definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MergeValidationError;

/// Structural kind of a content node.
///
/// Known editor block and inline kinds get their own variant. Anything else
/// is kept as `Unknown` with its original tag so documents from newer editors
/// still pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Doc,
    Heading,
    Paragraph,
    Text,
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    HardBreak,
    Unknown(String),
}

impl NodeKind {
    /// The tag used in serialized trees.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Heading => "heading",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Text => "text",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::Blockquote => "blockquote",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::HardBreak => "hardBreak",
            NodeKind::Unknown(tag) => tag,
        }
    }

    /// Check if this kind is a list container.
    pub fn is_list(&self) -> bool {
        matches!(self, NodeKind::BulletList | NodeKind::OrderedList)
    }

    /// Check if this kind lives inside a text block rather than being one.
    pub fn is_inline(&self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::HardBreak)
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "doc" => NodeKind::Doc,
            "heading" => NodeKind::Heading,
            "paragraph" => NodeKind::Paragraph,
            "text" => NodeKind::Text,
            "bulletList" => NodeKind::BulletList,
            "orderedList" => NodeKind::OrderedList,
            "listItem" => NodeKind::ListItem,
            "blockquote" => NodeKind::Blockquote,
            "codeBlock" => NodeKind::CodeBlock,
            "horizontalRule" => NodeKind::HorizontalRule,
            "hardBreak" => NodeKind::HardBreak,
            _ => NodeKind::Unknown(tag),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node attributes. The pipeline reads the typed ones; every other editor
/// attribute is carried through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    /// Heading level (1-6)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    /// Code block language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// First number of an ordered list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,

    /// Attributes the pipeline does not interpret (`src`, `alt`, ids...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeAttrs {
    /// Check if no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.language.is_none()
            && self.start.is_none()
            && self.extra.is_empty()
    }
}

/// A node of the hierarchical document.
///
/// Serialized in the common rich-text editor shape:
/// `{"type": "paragraph", "content": [{"type": "text", "text": "Hi"}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "NodeAttrs::is_empty")]
    pub attrs: NodeAttrs,

    #[serde(default, rename = "content", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContentNode>,

    /// Inline marks (links, emphasis), kept as the editor sent them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Value>,
}

impl ContentNode {
    /// Create a node of the given kind with no text, attributes or children.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: None,
            attrs: NodeAttrs::default(),
            children: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// Create a document root.
    pub fn doc(children: Vec<ContentNode>) -> Self {
        Self::new(NodeKind::Doc).with_children(children)
    }

    /// Create a text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(NodeKind::Text)
        }
    }

    /// Create a paragraph holding a single text leaf.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Paragraph).with_children(vec![Self::text(text)])
    }

    /// Create a heading holding a single text leaf.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Heading).with_children(vec![Self::text(text)]);
        node.attrs.level = Some(level);
        node
    }

    /// Create a bullet list from list items.
    pub fn bullet_list(items: Vec<ContentNode>) -> Self {
        Self::new(NodeKind::BulletList).with_children(items)
    }

    /// Create an ordered list from list items.
    pub fn ordered_list(items: Vec<ContentNode>) -> Self {
        Self::new(NodeKind::OrderedList).with_children(items)
    }

    /// Create a list item from block children.
    pub fn list_item(children: Vec<ContentNode>) -> Self {
        Self::new(NodeKind::ListItem).with_children(children)
    }

    /// Create a blockquote from block children.
    pub fn blockquote(children: Vec<ContentNode>) -> Self {
        Self::new(NodeKind::Blockquote).with_children(children)
    }

    /// Create a fenced code block.
    pub fn code_block(language: Option<&str>, code: impl Into<String>) -> Self {
        let code = code.into();
        let mut node = Self::new(NodeKind::CodeBlock);
        if !code.is_empty() {
            node.children.push(Self::text(code));
        }
        node.attrs.language = language.map(String::from);
        node
    }

    /// Create a horizontal rule.
    pub fn horizontal_rule() -> Self {
        Self::new(NodeKind::HorizontalRule)
    }

    /// Create a hard line break.
    pub fn hard_break() -> Self {
        Self::new(NodeKind::HardBreak)
    }

    /// Replace the children.
    pub fn with_children(mut self, children: Vec<ContentNode>) -> Self {
        self.children = children;
        self
    }

    /// Check if this document has no top-level content.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenated text of all inline descendants. Block siblings are
    /// separated by a newline, inline siblings are joined directly.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        if self.kind == NodeKind::HardBreak {
            out.push('\n');
        }

        let mut prev_inline: Option<bool> = None;
        for child in &self.children {
            let inline = child.kind.is_inline();
            if let Some(prev) = prev_inline {
                if !(prev && inline) {
                    out.push('\n');
                }
            } else if !out.is_empty() && !inline {
                out.push('\n');
            }
            out.push_str(&child.plain_text());
            prev_inline = Some(inline);
        }
        out
    }

    /// Validate the tree against the document contract: a `doc` root,
    /// no nested documents, leaf-only text with content, list items only
    /// inside lists, and headings at levels 1-6.
    pub fn validate(&self) -> Result<(), MergeValidationError> {
        if self.kind != NodeKind::Doc {
            return Err(MergeValidationError {
                path: "root".to_string(),
                reason: format!("root has type '{}', expected 'doc'", self.kind),
            });
        }
        for (i, child) in self.children.iter().enumerate() {
            child.validate_node(&NodeKind::Doc, &format!("content[{}]", i))?;
        }
        Ok(())
    }

    fn validate_node(&self, parent: &NodeKind, path: &str) -> Result<(), MergeValidationError> {
        let invalid = |reason: String| MergeValidationError {
            path: path.to_string(),
            reason,
        };

        match &self.kind {
            NodeKind::Doc => return Err(invalid("nested document node".to_string())),
            NodeKind::Unknown(tag) if tag.is_empty() => {
                return Err(invalid("empty type tag".to_string()))
            }
            NodeKind::Text => {
                if !self.children.is_empty() {
                    return Err(invalid("text node has children".to_string()));
                }
                if self.text.as_deref().map_or(true, str::is_empty) {
                    return Err(invalid("text node has no text".to_string()));
                }
            }
            NodeKind::HardBreak | NodeKind::HorizontalRule if !self.children.is_empty() => {
                return Err(invalid(format!("{} has children", self.kind)));
            }
            NodeKind::Heading => match self.attrs.level {
                Some(1..=6) => {}
                other => return Err(invalid(format!("heading level {:?}", other))),
            },
            NodeKind::ListItem if !parent.is_list() => {
                return Err(invalid(format!("list item inside '{}'", parent)));
            }
            kind if kind.is_list() => {
                if let Some(pos) = self
                    .children
                    .iter()
                    .position(|c| c.kind != NodeKind::ListItem)
                {
                    return Err(invalid(format!(
                        "list child {} has type '{}'",
                        pos, self.children[pos].kind
                    )));
                }
            }
            _ => {}
        }

        for (i, child) in self.children.iter().enumerate() {
            child.validate_node(&self.kind, &format!("{}.content[{}]", path, i))?;
        }
        Ok(())
    }
}
