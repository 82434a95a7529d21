//! Linear text projection of a content tree, and its inverse.
//!
//! The projection is a small markdown dialect: `#` headings, `- ` and `N. `
//! list items with indented continuation lines, `> ` blockquotes, fenced
//! code blocks and `---` rules. Paragraph lines that would read as block
//! syntax are escaped with a leading backslash so the parser can always
//! tell them apart.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DelinearizationError, LinearizationError};
use crate::types::{ContentNode, NodeKind};

/// Separator between segments of different top-level nodes.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Separator between segments of the same top-level node (list items).
const ITEM_SEPARATOR: &str = "\n";

const FENCE: &str = "```";

/// Nesting deeper than this is rejected by the parser.
const MAX_PARSE_DEPTH: usize = 32;

/// Structural classification of a segment, used to rank split points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    Heading,
    HorizontalRule,
    Blockquote,
    List,
    CodeBlock,
    Paragraph,
    ListItem,
}

impl BoundaryType {
    /// Split preference; lower is better.
    pub fn priority(&self) -> u8 {
        match self {
            BoundaryType::Heading | BoundaryType::HorizontalRule => 1,
            BoundaryType::Blockquote => 2,
            BoundaryType::List | BoundaryType::CodeBlock => 3,
            BoundaryType::Paragraph => 4,
            BoundaryType::ListItem => 5,
        }
    }

    /// Check if segments of this type belong to a region whose interior
    /// must not be split.
    pub fn is_no_split(&self) -> bool {
        matches!(
            self,
            BoundaryType::List
                | BoundaryType::ListItem
                | BoundaryType::Blockquote
                | BoundaryType::CodeBlock
        )
    }
}

/// One piece of the linear projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Path into the document: top-level node index, then list item index
    pub source_path: Vec<usize>,

    /// Boundary type at the start of this segment
    pub boundary: BoundaryType,

    /// Rendered text
    pub text: String,
}

impl Segment {
    /// Index of the top-level node this segment came from.
    pub fn top_level_index(&self) -> usize {
        self.source_path[0]
    }
}

/// Flat, ordered projection of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearProjection {
    pub segments: Vec<Segment>,
}

impl LinearProjection {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The full linear text.
    pub fn text(&self) -> String {
        join_segments(&self.segments)
    }
}

/// Join segments with the separators the parser expects.
pub fn join_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            if segments[i - 1].top_level_index() == segment.top_level_index() {
                out.push_str(ITEM_SEPARATOR);
            } else {
                out.push_str(BLOCK_SEPARATOR);
            }
        }
        out.push_str(&segment.text);
    }
    out
}

/// Converter between content trees and their linear text.
///
/// Construct once and share; the compiled patterns live on the handle.
pub struct DocumentLinearizer {
    heading_regex: Regex,
    list_marker_regex: Regex,
    needs_escape_regex: Regex,
}

impl DocumentLinearizer {
    /// Create a new linearizer.
    pub fn new() -> Self {
        Self {
            heading_regex: Regex::new(r"^(#{1,6}) (.*)$").unwrap(),
            list_marker_regex: Regex::new(r"^(-|(\d{1,9})\.)(?: |$)").unwrap(),
            needs_escape_regex: Regex::new(r"^(\s|$|[#>\-*+`\\]|\d+[.)])").unwrap(),
        }
    }

    /// Project a document into segments.
    pub fn linearize(&self, doc: &ContentNode) -> Result<LinearProjection, LinearizationError> {
        if doc.kind != NodeKind::Doc {
            return Err(LinearizationError::NotADocument {
                found: doc.kind.to_string(),
            });
        }

        let mut segments = Vec::new();
        for (i, node) in doc.children.iter().enumerate() {
            let path = format!("content[{}]", i);
            match &node.kind {
                NodeKind::BulletList | NodeKind::OrderedList => {
                    if node.children.is_empty() {
                        return Err(unsupported(&path, "empty list"));
                    }
                    for (j, item) in node.children.iter().enumerate() {
                        let item_path = format!("{}.content[{}]", path, j);
                        segments.push(Segment {
                            source_path: vec![i, j],
                            boundary: if j == 0 {
                                BoundaryType::List
                            } else {
                                BoundaryType::ListItem
                            },
                            text: self.render_list_item(node, j, item, &item_path)?,
                        });
                    }
                }
                kind => {
                    let boundary = match kind {
                        NodeKind::Heading => BoundaryType::Heading,
                        NodeKind::HorizontalRule => BoundaryType::HorizontalRule,
                        NodeKind::Blockquote => BoundaryType::Blockquote,
                        NodeKind::CodeBlock => BoundaryType::CodeBlock,
                        _ => BoundaryType::Paragraph,
                    };
                    segments.push(Segment {
                        source_path: vec![i],
                        boundary,
                        text: self.render_block(node, &path)?,
                    });
                }
            }
        }

        Ok(LinearProjection { segments })
    }

    /// Linearize a run of top-level nodes that are not wrapped in a document.
    pub fn linearize_nodes(&self, nodes: &[ContentNode]) -> Result<String, LinearizationError> {
        Ok(self.linearize(&ContentNode::doc(nodes.to_vec()))?.text())
    }

    /// Parse linear text back into a document.
    pub fn delinearize(&self, text: &str) -> Result<ContentNode, DelinearizationError> {
        let lines: Vec<String> = text.lines().map(String::from).collect();
        let children = self.parse_blocks(&lines, 0, 0)?;
        Ok(ContentNode::doc(children))
    }

    fn render_block(&self, node: &ContentNode, path: &str) -> Result<String, LinearizationError> {
        match &node.kind {
            NodeKind::Heading => {
                let level = node.attrs.level.unwrap_or(1);
                if !(1..=6).contains(&level) {
                    return Err(LinearizationError::InvalidHeadingLevel {
                        path: path.to_string(),
                        level,
                    });
                }
                let text = self.render_inline(node, path)?;
                if text.contains('\n') {
                    return Err(unsupported(path, "line break inside heading"));
                }
                Ok(format!("{} {}", "#".repeat(level as usize), text))
            }
            NodeKind::Paragraph => self.render_paragraph(node, path),
            NodeKind::HorizontalRule => Ok("---".to_string()),
            NodeKind::CodeBlock => {
                let code = code_text(node);
                if code.lines().any(|l| l.trim_end() == FENCE) {
                    return Err(unsupported(path, "code contains a fence line"));
                }
                let language = node.attrs.language.as_deref().unwrap_or("");
                if code.is_empty() {
                    Ok(format!("{}{}\n{}", FENCE, language, FENCE))
                } else {
                    Ok(format!("{}{}\n{}\n{}", FENCE, language, code, FENCE))
                }
            }
            NodeKind::Blockquote => {
                let inner = self.render_children(node, path)?;
                Ok(prefix_lines(&inner, "> ", ">"))
            }
            NodeKind::BulletList | NodeKind::OrderedList => {
                if node.children.is_empty() {
                    return Err(unsupported(path, "empty list"));
                }
                let items = node
                    .children
                    .iter()
                    .enumerate()
                    .map(|(j, item)| {
                        self.render_list_item(node, j, item, &format!("{}.content[{}]", path, j))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items.join(ITEM_SEPARATOR))
            }
            NodeKind::Text | NodeKind::HardBreak => self.render_paragraph(
                &ContentNode::new(NodeKind::Paragraph).with_children(vec![node.clone()]),
                path,
            ),
            NodeKind::Unknown(tag) => {
                let text = node.plain_text();
                if text.is_empty() {
                    return Err(unsupported(path, &format!("'{}' has no text", tag)));
                }
                Ok(self.escape_lines(&text))
            }
            NodeKind::Doc | NodeKind::ListItem => {
                Err(unsupported(path, &format!("'{}' outside its container", node.kind)))
            }
        }
    }

    /// Render the block children of a container, grouping stray inline
    /// children into paragraphs.
    fn render_children(&self, node: &ContentNode, path: &str) -> Result<String, LinearizationError> {
        let mut blocks = Vec::new();
        let mut inline_run: Vec<ContentNode> = Vec::new();

        for (i, child) in node.children.iter().enumerate() {
            if child.kind.is_inline() {
                inline_run.push(child.clone());
                continue;
            }
            if !inline_run.is_empty() {
                let para = ContentNode::new(NodeKind::Paragraph)
                    .with_children(std::mem::take(&mut inline_run));
                blocks.push(self.render_paragraph(&para, path)?);
            }
            blocks.push(self.render_block(child, &format!("{}.content[{}]", path, i))?);
        }
        if !inline_run.is_empty() {
            let para = ContentNode::new(NodeKind::Paragraph).with_children(inline_run);
            blocks.push(self.render_paragraph(&para, path)?);
        }

        Ok(blocks.join(BLOCK_SEPARATOR))
    }

    fn render_list_item(
        &self,
        list: &ContentNode,
        position: usize,
        item: &ContentNode,
        path: &str,
    ) -> Result<String, LinearizationError> {
        if item.kind != NodeKind::ListItem {
            return Err(unsupported(
                path,
                &format!("list child has type '{}'", item.kind),
            ));
        }

        let marker = if list.kind == NodeKind::OrderedList {
            let start = list.attrs.start.unwrap_or(1) as usize;
            format!("{}. ", start + position)
        } else {
            "- ".to_string()
        };
        let indent = " ".repeat(marker.len());
        let body = self.render_children(item, path)?;

        let mut out = String::new();
        for (i, line) in body.split('\n').enumerate() {
            if i == 0 {
                out.push_str(&marker);
                out.push_str(line);
            } else {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&indent);
                    out.push_str(line);
                }
            }
        }
        Ok(out)
    }

    fn render_paragraph(&self, node: &ContentNode, path: &str) -> Result<String, LinearizationError> {
        let text = self.render_inline(node, path)?;
        Ok(self.escape_lines(&text))
    }

    fn render_inline(&self, node: &ContentNode, path: &str) -> Result<String, LinearizationError> {
        let mut out = String::new();
        if let Some(text) = &node.text {
            out.push_str(text);
        }
        for child in &node.children {
            match &child.kind {
                NodeKind::Text => {
                    if !child.children.is_empty() {
                        return Err(unsupported(path, "text node has children"));
                    }
                    out.push_str(child.text.as_deref().unwrap_or(""));
                }
                NodeKind::HardBreak => out.push('\n'),
                NodeKind::Unknown(_) => out.push_str(&child.plain_text()),
                other => {
                    return Err(unsupported(
                        path,
                        &format!("block '{}' inside a text block", other),
                    ))
                }
            }
        }
        Ok(out)
    }

    fn escape_lines(&self, text: &str) -> String {
        text.split('\n')
            .map(|line| {
                if self.needs_escape_regex.is_match(line) {
                    format!("\\{}", line)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn parse_blocks(
        &self,
        lines: &[String],
        first_line: usize,
        depth: usize,
    ) -> Result<Vec<ContentNode>, DelinearizationError> {
        if depth > MAX_PARSE_DEPTH {
            return Err(DelinearizationError::Malformed {
                line: first_line + 1,
                reason: format!("nesting deeper than {}", MAX_PARSE_DEPTH),
            });
        }

        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i].as_str();

            if line.trim().is_empty() {
                i += 1;
                continue;
            }

            if let Some(language) = line.strip_prefix(FENCE) {
                let close = lines[i + 1..]
                    .iter()
                    .position(|l| l.trim_end() == FENCE)
                    .map(|offset| i + 1 + offset)
                    .ok_or(DelinearizationError::UnterminatedFence {
                        line: first_line + i + 1,
                    })?;
                let code = lines[i + 1..close].join("\n");
                let language = language.trim();
                blocks.push(ContentNode::code_block(
                    (!language.is_empty()).then_some(language),
                    code,
                ));
                i = close + 1;
                continue;
            }

            if let Some(caps) = self.heading_regex.captures(line) {
                let level = caps[1].len() as u8;
                let text = &caps[2];
                let mut heading = ContentNode::new(NodeKind::Heading);
                heading.attrs.level = Some(level);
                if !text.is_empty() {
                    heading.children.push(ContentNode::text(text));
                }
                blocks.push(heading);
                i += 1;
                continue;
            }

            if line.trim_end() == "---" {
                blocks.push(ContentNode::horizontal_rule());
                i += 1;
                continue;
            }

            if line.starts_with('>') {
                let start = i;
                let mut inner = Vec::new();
                while i < lines.len() && lines[i].starts_with('>') {
                    let l = &lines[i];
                    let stripped = l.strip_prefix("> ").unwrap_or(&l[1..]);
                    inner.push(stripped.to_string());
                    i += 1;
                }
                let children = self.parse_blocks(&inner, first_line + start, depth + 1)?;
                blocks.push(ContentNode::blockquote(children));
                continue;
            }

            if self.list_marker_regex.is_match(line) {
                let (list, next) = self.parse_list(lines, i, first_line, depth)?;
                blocks.push(list);
                i = next;
                continue;
            }

            let start = i;
            while i < lines.len()
                && !lines[i].trim().is_empty()
                && (i == start || !self.is_block_start(&lines[i]))
            {
                i += 1;
            }
            blocks.push(paragraph_from_lines(&lines[start..i]));
        }

        Ok(blocks)
    }

    fn parse_list(
        &self,
        lines: &[String],
        start: usize,
        first_line: usize,
        depth: usize,
    ) -> Result<(ContentNode, usize), DelinearizationError> {
        let ordered = self
            .list_marker_regex
            .captures(&lines[start])
            .and_then(|caps| caps.get(2).map(|m| m.as_str().parse::<u32>().unwrap_or(1)));

        let mut items = Vec::new();
        let mut i = start;

        while i < lines.len() {
            let Some(caps) = self.list_marker_regex.captures(&lines[i]) else {
                break;
            };
            if caps.get(2).is_some() != ordered.is_some() {
                break;
            }

            let width = caps[1].len() + 1;
            let indent = " ".repeat(width);
            let item_start = i;
            let mut body = vec![lines[i].get(width..).unwrap_or("").to_string()];
            i += 1;

            while i < lines.len() {
                if lines[i].trim().is_empty() {
                    let next = lines[i..].iter().position(|l| !l.trim().is_empty());
                    match next {
                        Some(offset) if lines[i + offset].starts_with(&indent) => {
                            // Whitespace-only lines may be code content.
                            for blank in &lines[i..i + offset] {
                                body.push(blank.strip_prefix(&indent).unwrap_or("").to_string());
                            }
                            i += offset;
                        }
                        _ => break,
                    }
                } else if let Some(rest) = lines[i].strip_prefix(&indent) {
                    body.push(rest.to_string());
                    i += 1;
                } else {
                    break;
                }
            }

            let children = self.parse_blocks(&body, first_line + item_start, depth + 1)?;
            items.push(ContentNode::list_item(children));

            if i < lines.len() && lines[i].trim().is_empty() {
                break;
            }
        }

        let list = match ordered {
            Some(first) => {
                let mut list = ContentNode::ordered_list(items);
                if first != 1 {
                    list.attrs.start = Some(first);
                }
                list
            }
            None => ContentNode::bullet_list(items),
        };
        Ok((list, i))
    }

    fn is_block_start(&self, line: &str) -> bool {
        line.starts_with(FENCE)
            || line.starts_with('>')
            || line.trim_end() == "---"
            || self.heading_regex.is_match(line)
            || self.list_marker_regex.is_match(line)
    }
}

impl Default for DocumentLinearizer {
    fn default() -> Self {
        Self::new()
    }
}

fn unsupported(path: &str, reason: &str) -> LinearizationError {
    LinearizationError::UnsupportedShape {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn code_text(node: &ContentNode) -> String {
    let mut code = node.text.clone().unwrap_or_default();
    for child in &node.children {
        code.push_str(&child.plain_text());
    }
    code
}

fn prefix_lines(text: &str, prefix: &str, blank: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                blank.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a paragraph from raw lines, undoing escapes. Line breaks become
/// hard breaks; empty lines contribute only the break.
fn paragraph_from_lines(lines: &[String]) -> ContentNode {
    let mut children = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            children.push(ContentNode::hard_break());
        }
        let text = line.strip_prefix('\\').unwrap_or(line);
        if !text.is_empty() {
            children.push(ContentNode::text(text));
        }
    }
    ContentNode::new(NodeKind::Paragraph).with_children(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_doc() -> ContentNode {
        ContentNode::doc(vec![
            ContentNode::heading(1, "Guide"),
            ContentNode::paragraph("Intro text."),
            ContentNode::bullet_list(vec![
                ContentNode::list_item(vec![ContentNode::paragraph("first")]),
                ContentNode::list_item(vec![
                    ContentNode::paragraph("second"),
                    ContentNode::ordered_list(vec![
                        ContentNode::list_item(vec![ContentNode::paragraph("nested a")]),
                        ContentNode::list_item(vec![ContentNode::paragraph("nested b")]),
                    ]),
                ]),
            ]),
            ContentNode::blockquote(vec![
                ContentNode::paragraph("quoted"),
                ContentNode::paragraph("more quoted"),
            ]),
            ContentNode::code_block(Some("rust"), "fn main() {\n\n    println!(\"hi\");\n}"),
            ContentNode::horizontal_rule(),
            ContentNode::heading(2, "Next"),
        ])
    }

    fn top_level_kinds(doc: &ContentNode) -> Vec<NodeKind> {
        doc.children.iter().map(|c| c.kind.clone()).collect()
    }

    #[test]
    fn test_linearize_segments() {
        let linearizer = DocumentLinearizer::new();
        let projection = linearizer.linearize(&sample_doc()).unwrap();

        let boundaries: Vec<BoundaryType> =
            projection.segments.iter().map(|s| s.boundary).collect();
        assert_eq!(
            boundaries,
            vec![
                BoundaryType::Heading,
                BoundaryType::Paragraph,
                BoundaryType::List,
                BoundaryType::ListItem,
                BoundaryType::Blockquote,
                BoundaryType::CodeBlock,
                BoundaryType::HorizontalRule,
                BoundaryType::Heading,
            ]
        );
        assert_eq!(projection.segments[3].source_path, vec![2, 1]);
        assert_eq!(
            projection.segments[3].text,
            "- second\n\n  1. nested a\n  2. nested b"
        );
    }

    #[test]
    fn test_linear_text() {
        let linearizer = DocumentLinearizer::new();
        let doc = ContentNode::doc(vec![
            ContentNode::heading(2, "Title"),
            ContentNode::bullet_list(vec![
                ContentNode::list_item(vec![ContentNode::paragraph("a")]),
                ContentNode::list_item(vec![ContentNode::paragraph("b")]),
            ]),
            ContentNode::blockquote(vec![ContentNode::paragraph("q")]),
        ]);
        let text = linearizer.linearize(&doc).unwrap().text();
        assert_eq!(text, "## Title\n\n- a\n- b\n\n> q");
    }

    #[test]
    fn test_round_trip() {
        let linearizer = DocumentLinearizer::new();
        let doc = sample_doc();
        let text = linearizer.linearize(&doc).unwrap().text();
        let parsed = linearizer.delinearize(&text).unwrap();

        assert_eq!(parsed.plain_text(), doc.plain_text());
        assert_eq!(top_level_kinds(&parsed), top_level_kinds(&doc));
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_round_trip_escapes_block_syntax_in_paragraphs() {
        let linearizer = DocumentLinearizer::new();
        let doc = ContentNode::doc(vec![
            ContentNode::paragraph("# not a heading"),
            ContentNode::paragraph("- not a list"),
            ContentNode::paragraph("1. not ordered"),
            ContentNode::paragraph("> not a quote"),
            ContentNode::paragraph("---"),
            ContentNode::paragraph("\\ backslash"),
            ContentNode::paragraph("  indented"),
        ]);
        let text = linearizer.linearize(&doc).unwrap().text();
        let parsed = linearizer.delinearize(&text).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_round_trip_hard_breaks_and_blank_lines() {
        let linearizer = DocumentLinearizer::new();
        let doc = ContentNode::doc(vec![ContentNode::new(NodeKind::Paragraph).with_children(vec![
            ContentNode::text("line one"),
            ContentNode::hard_break(),
            ContentNode::text("line two"),
        ])]);
        let parsed = linearizer
            .delinearize(&linearizer.linearize(&doc).unwrap().text())
            .unwrap();
        assert_eq!(parsed, doc);

        let gap = ContentNode::doc(vec![ContentNode::paragraph("a\n\nb")]);
        let parsed = linearizer
            .delinearize(&linearizer.linearize(&gap).unwrap().text())
            .unwrap();
        assert_eq!(parsed.plain_text(), "a\n\nb");
        assert_eq!(parsed.children.len(), 1);
    }

    #[test]
    fn test_round_trip_ordered_start_and_cjk() {
        let linearizer = DocumentLinearizer::new();
        let doc = ContentNode::doc(vec![
            ContentNode::heading(3, "번역 가이드"),
            {
                let mut list = ContentNode::ordered_list(vec![
                    ContentNode::list_item(vec![ContentNode::paragraph("日本語")]),
                    ContentNode::list_item(vec![ContentNode::paragraph("中文")]),
                ]);
                list.attrs.start = Some(9);
                list
            },
        ]);
        let text = linearizer.linearize(&doc).unwrap().text();
        assert!(text.contains("10. 中文"));
        assert_eq!(linearizer.delinearize(&text).unwrap(), doc);
    }

    #[test]
    fn test_adjacent_lists_stay_separate() {
        let linearizer = DocumentLinearizer::new();
        let doc = ContentNode::doc(vec![
            ContentNode::bullet_list(vec![ContentNode::list_item(vec![
                ContentNode::paragraph("a"),
            ])]),
            ContentNode::bullet_list(vec![ContentNode::list_item(vec![
                ContentNode::paragraph("b"),
            ])]),
        ]);
        let parsed = linearizer
            .delinearize(&linearizer.linearize(&doc).unwrap().text())
            .unwrap();
        assert_eq!(parsed.children.len(), 2);
    }

    #[test]
    fn test_round_trip_code_in_list_keeps_blank_lines() {
        let linearizer = DocumentLinearizer::new();
        let doc = ContentNode::doc(vec![ContentNode::bullet_list(vec![
            ContentNode::list_item(vec![
                ContentNode::paragraph("run:"),
                ContentNode::code_block(Some("sh"), "a\n  \n\nb"),
            ]),
            ContentNode::list_item(vec![ContentNode::paragraph("done")]),
        ])]);
        let parsed = linearizer
            .delinearize(&linearizer.linearize(&doc).unwrap().text())
            .unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_unknown_node_becomes_paragraph() {
        let linearizer = DocumentLinearizer::new();
        let callout = ContentNode::new(NodeKind::Unknown("callout".to_string()))
            .with_children(vec![ContentNode::text("Heads up")]);
        let doc = ContentNode::doc(vec![callout]);

        let projection = linearizer.linearize(&doc).unwrap();
        assert_eq!(projection.segments[0].boundary, BoundaryType::Paragraph);

        let parsed = linearizer.delinearize(&projection.text()).unwrap();
        assert_eq!(parsed.children[0].kind, NodeKind::Paragraph);
        assert_eq!(parsed.plain_text(), "Heads up");
    }

    #[test]
    fn test_linearize_errors() {
        let linearizer = DocumentLinearizer::new();

        assert!(matches!(
            linearizer.linearize(&ContentNode::paragraph("x")),
            Err(LinearizationError::NotADocument { .. })
        ));

        let bad_heading = ContentNode::doc(vec![ContentNode::heading(9, "x")]);
        assert!(matches!(
            linearizer.linearize(&bad_heading),
            Err(LinearizationError::InvalidHeadingLevel { level: 9, .. })
        ));

        let image = ContentNode::doc(vec![ContentNode::new(NodeKind::Unknown("image".into()))]);
        assert!(linearizer.linearize(&image).is_err());

        let fenced = ContentNode::doc(vec![ContentNode::code_block(None, "a\n```\nb")]);
        assert!(linearizer.linearize(&fenced).is_err());

        let empty_list = ContentNode::doc(vec![ContentNode::bullet_list(vec![])]);
        assert!(linearizer.linearize(&empty_list).is_err());
    }

    #[test]
    fn test_delinearize_unterminated_fence() {
        let linearizer = DocumentLinearizer::new();
        let err = linearizer.delinearize("intro\n\n```rust\nfn x() {}").unwrap_err();
        assert_eq!(err, DelinearizationError::UnterminatedFence { line: 3 });
    }

    #[test]
    fn test_delinearize_loose_markdown() {
        let linearizer = DocumentLinearizer::new();
        let doc = linearizer
            .delinearize("# Titel\nEin Absatz\nzweite Zeile\n\n- eins\n- zwei\n\n> Zitat")
            .unwrap();
        assert_eq!(
            top_level_kinds(&doc),
            vec![
                NodeKind::Heading,
                NodeKind::Paragraph,
                NodeKind::BulletList,
                NodeKind::Blockquote,
            ]
        );
        assert_eq!(doc.children[2].children.len(), 2);
    }

    #[test]
    fn test_delinearize_empty() {
        let linearizer = DocumentLinearizer::new();
        assert!(linearizer.delinearize("").unwrap().is_empty());
        assert!(linearizer.delinearize("\n  \n").unwrap().is_empty());
    }
}
