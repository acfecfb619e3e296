//! Markdown to document tree conversion.
//!
//! Block structure only: headings, paragraphs, lists, quotes and code
//! blocks. Inline markup is flattened into the text of its block. Fenced
//! mermaid blocks become `div.mermaid` in rendered mode and stay
//! `pre > code.language-mermaid` in live preview.

use std::fs;
use std::path::Path;

use log::{debug, info};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::document::{DocumentTree, NodeId};
use crate::error::{Error, Result};
use crate::viewport::{DIAGRAM_CLASS, DocumentMode};

pub const VIEW_CLASS: &str = "markdown-view";

struct Builder<'a> {
    doc: &'a mut DocumentTree,
    mode: DocumentMode,
    /// Open container blocks; the bottom entry is the output parent.
    stack: Vec<NodeId>,
    leaf: Option<(NodeId, String)>,
    diagrams: usize,
}

impl Builder<'_> {
    fn parent(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }

    fn open_container(&mut self, tag: &str) {
        let node = self.doc.create_element(tag);
        self.stack.push(node);
    }

    fn close_container(&mut self) {
        self.close_leaf();
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(node) = self.stack.pop() {
            self.attach(node);
        }
    }

    fn open_leaf(&mut self, node: NodeId) {
        self.close_leaf();
        self.leaf = Some((node, String::new()));
    }

    fn close_leaf(&mut self) {
        if let Some((node, text)) = self.leaf.take() {
            self.doc.set_text(node, text);
            self.attach(node);
        }
    }

    fn attach(&mut self, node: NodeId) {
        if let Some(parent) = self.parent() {
            self.doc.append_child(parent, node);
        }
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.leaf {
            Some((_, buffer)) => buffer.push_str(text),
            // tight list items carry their text without a paragraph
            None => {
                let item = self.doc.create_element("span");
                self.leaf = Some((item, text.to_string()));
            }
        }
    }

    fn code_block(&mut self, language: &str) {
        let node = if language == "mermaid" && self.mode == DocumentMode::Rendered {
            self.diagrams += 1;
            let div = self.doc.create_element("div");
            self.doc.add_class(div, DIAGRAM_CLASS);
            div
        } else {
            let pre = self.doc.create_element("pre");
            let code = self.doc.create_element("code");
            if !language.is_empty() {
                self.doc.add_class(code, &format!("language-{language}"));
                if language == "mermaid" {
                    self.diagrams += 1;
                }
            }
            self.open_container_node(pre);
            code
        };
        self.open_leaf(node);
    }

    fn open_container_node(&mut self, node: NodeId) {
        self.close_leaf();
        self.stack.push(node);
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => {
                let p = self.doc.create_element("p");
                self.open_leaf(p);
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let h = self.doc.create_element(&format!("h{}", level as usize));
                self.open_leaf(h);
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match &kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };
                self.code_block(language);
            }
            Event::End(TagEnd::CodeBlock) => {
                self.close_leaf();
                // fenced blocks other than rendered diagrams sit inside a `pre`
                if self.parent().is_some_and(|p| self.doc.tag(p) == Some("pre")) {
                    self.close_container();
                }
            }
            Event::Start(Tag::List(start)) => {
                self.close_leaf();
                self.open_container(if start.is_some() { "ol" } else { "ul" });
            }
            Event::Start(Tag::Item) => {
                self.close_leaf();
                self.open_container("li");
            }
            Event::Start(Tag::BlockQuote { .. }) => {
                self.close_leaf();
                self.open_container("blockquote");
            }
            Event::End(TagEnd::List(_) | TagEnd::Item | TagEnd::BlockQuote { .. }) => {
                self.close_container();
            }
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_)) => self.close_leaf(),
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            Event::Rule => {
                self.close_leaf();
                let hr = self.doc.create_element("hr");
                self.attach(hr);
            }
            _ => {}
        }
    }
}

/// Appends the blocks of `source` to `parent`. Returns the number of
/// mermaid diagrams found.
pub fn render_markdown(
    doc: &mut DocumentTree,
    parent: NodeId,
    source: &str,
    mode: DocumentMode,
) -> usize {
    let mut builder = Builder {
        doc,
        mode,
        stack: vec![parent],
        leaf: None,
        diagrams: 0,
    };
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    for event in Parser::new_ext(source, options) {
        builder.handle(event);
    }
    builder.close_leaf();
    while builder.stack.len() > 1 {
        builder.close_container();
    }
    builder.diagrams
}

/// Reads a markdown file into a fresh view element under the document root.
pub fn load_markdown(
    path: impl AsRef<Path>,
    doc: &mut DocumentTree,
    mode: DocumentMode,
) -> Result<NodeId> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let view = doc.create_element("div");
    doc.add_class(view, VIEW_CLASS);
    let root = doc.root();
    doc.append_child(root, view);
    let diagrams = render_markdown(doc, view, &source, mode);
    info!(path = path.display().to_string(), diagrams; "Loaded document");
    Ok(view)
}

/// Replaces the content of `view` with freshly parsed markdown.
pub fn reload_markdown(
    path: impl AsRef<Path>,
    doc: &mut DocumentTree,
    view: NodeId,
    mode: DocumentMode,
) -> Result<usize> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    doc.clear_children(view);
    let diagrams = render_markdown(doc, view, &source, mode);
    debug!(path = path.display().to_string(), diagrams; "Reloaded document");
    Ok(diagrams)
}
