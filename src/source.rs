//! Attribution of profile blocks to Go function and method declarations.
//!
//! A file is parsed with tree-sitter, its top-level `func` declarations are
//! collected in source order, and every block that overlaps a declaration's
//! span contributes its execution count to the lines it covers. Both the
//! declarations and the blocks are sorted by position, so a single forward
//! cursor over the blocks is enough.

use tree_sitter::{Node, Parser, Point};

use crate::error::{Error, Result};
use crate::model::{Block, Class, Lines, Method, Profile};

/// Class name used for functions without a receiver.
pub const FREE_FUNCTION_CLASS: &str = "-";

/// How declarations are grouped into classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassGrouping {
    /// One class per receiver type; free functions share [`FREE_FUNCTION_CLASS`].
    #[default]
    ByType,
    /// One class per file, named after the file's path.
    ByFile,
}

/// A 1-based line/column position. Columns count bytes, as Go's do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl From<Point> for Position {
    fn from(p: Point) -> Self {
        Self {
            line: p.row as u32 + 1,
            col: p.column as u32 + 1,
        }
    }
}

/// A top-level `func` declaration. `end` is the position just past the
/// closing brace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// Receiver type with pointer indirection stripped, for methods.
    pub receiver: Option<String>,
    pub signature: Option<String>,
    pub start: Position,
    pub end: Position,
}

/// Parse Go source and list its function and method declarations.
pub fn parse_declarations(path: &str, source: &str) -> Result<Vec<Declaration>> {
    let failure = || Error::SourceParseFailure {
        path: path.to_string(),
    };

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|_| failure())?;
    let tree = parser.parse(source, None).ok_or_else(failure)?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(failure());
    }

    let bytes = source.as_bytes();
    let mut cursor = root.walk();
    let decls = root
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "function_declaration" | "method_declaration"))
        .map(|n| declaration(n, bytes))
        .collect();
    Ok(decls)
}

fn declaration(node: Node<'_>, src: &[u8]) -> Declaration {
    let text = |n: Node<'_>| n.utf8_text(src).unwrap_or("").to_string();

    let name = node.child_by_field_name("name").map(text).unwrap_or_default();
    let receiver = node
        .child_by_field_name("receiver")
        .and_then(|recv| receiver_type(recv, src));

    // `[T Number](xs ...T) T`
    let signature = node.child_by_field_name("parameters").map(|params| {
        let mut sig = node
            .child_by_field_name("type_parameters")
            .map(text)
            .unwrap_or_default();
        sig.push_str(&text(params));
        if let Some(result) = node.child_by_field_name("result") {
            sig.push(' ');
            sig.push_str(&text(result));
        }
        sig
    });

    Declaration {
        name,
        receiver,
        signature,
        start: node.start_position().into(),
        end: node.end_position().into(),
    }
}

/// Text of the receiver's type, e.g. `Store` for `(s *Store)`.
fn receiver_type(params: Node<'_>, src: &[u8]) -> Option<String> {
    let mut cursor = params.walk();
    let param = params
        .named_children(&mut cursor)
        .find(|n| n.kind() == "parameter_declaration")?;
    let ty = param.child_by_field_name("type")?;
    let name = ty.utf8_text(src).ok()?;
    Some(name.trim_start_matches('*').trim().to_string())
}

/// The class a declaration belongs to under `grouping`.
pub fn class_key(decl: &Declaration, file_name: &str, grouping: ClassGrouping) -> String {
    match grouping {
        ClassGrouping::ByType => decl
            .receiver
            .clone()
            .unwrap_or_else(|| FREE_FUNCTION_CLASS.to_string()),
        // Base names alone collide across packages: a/util.go vs b/util.go.
        ClassGrouping::ByFile => file_name.replace(['/', '\\'], "."),
    }
}

/// Block lies entirely before `start`.
fn ends_before(block: &Block, start: Position) -> bool {
    block.end_line < start.line || (block.end_line == start.line && block.end_col <= start.col)
}

/// Block begins at or after `end`.
fn starts_after(block: &Block, end: Position) -> bool {
    block.start_line > end.line || (block.start_line == end.line && block.start_col >= end.col)
}

fn record(lines: &mut Lines, block: &Block) {
    for number in block.start_line..=block.end_line {
        lines.add_or_update(number, block.count);
    }
}

/// Per-declaration line tables. `blocks` must be sorted by start position and
/// `decls` by source order.
pub fn attribute(decls: &[Declaration], blocks: &[Block]) -> Vec<Lines> {
    let mut first = 0;
    decls
        .iter()
        .map(|decl| {
            // Anything ending before this declaration ends before all later ones too.
            while first < blocks.len() && ends_before(&blocks[first], decl.start) {
                first += 1;
            }

            let mut lines = Lines::new();
            for block in &blocks[first..] {
                if starts_after(block, decl.end) {
                    break;
                }
                if ends_before(block, decl.start) {
                    continue;
                }
                record(&mut lines, block);
            }
            lines
        })
        .collect()
}

/// Build the classes one file contributes, in first-reference order.
pub fn map_source(
    file_name: &str,
    source: &str,
    profile: &Profile,
    grouping: ClassGrouping,
) -> Result<Vec<Class>> {
    let decls = parse_declarations(file_name, source)?;
    let tables = attribute(&decls, &profile.blocks);

    let mut classes: Vec<Class> = Vec::new();
    for (decl, lines) in decls.into_iter().zip(tables) {
        let key = class_key(&decl, file_name, grouping);
        let idx = match classes.iter().position(|c| c.name == key) {
            Some(idx) => idx,
            None => {
                classes.push(Class::new(key, file_name));
                classes.len() - 1
            }
        };
        classes[idx].methods.push(Method {
            name: decl.name,
            signature: decl.signature,
            line_rate: 0.0,
            lines,
        });
    }

    Ok(classes)
}
