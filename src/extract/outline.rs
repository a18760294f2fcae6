//! Permissive TypeScript/JavaScript outline parsing using tree-sitter.
//!
//! Pulls exported names, function/method signatures and comments out of a
//! source file without executing it. Broken or partial code still yields a
//! tree (with `ERROR` nodes), so whatever is recognizable gets extracted.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, Parser};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Grammar used to parse a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Plain `.ts` (no JSX, allows `<T>expr` casts)
    TypeScript,
    /// `.tsx`, `.js`, `.jsx` (JSX-aware superset)
    Tsx,
}

impl Dialect {
    /// Pick the grammar for a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" => Some(Dialect::TypeScript),
            "tsx" | "js" | "jsx" => Some(Dialect::Tsx),
            _ => None,
        }
    }

    fn language(&self) -> tree_sitter::Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Everything the extractor needs from the syntax tree, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    /// Exported symbol names, de-duplicated
    pub exports: Vec<String>,
    /// `name(params)` strings for functions and methods
    pub signatures: Vec<String>,
    /// First `/** ... */` block
    pub doc_comment: Option<String>,
    /// Bodies of `//` comments, marker stripped
    pub line_comments: Vec<String>,
}

/// Result of parsing a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(Outline),
    /// The parser gave up (timeout or no grammar); callers fall back to an
    /// empty outline
    Failed,
}

impl ParseOutcome {
    pub fn into_outline(self) -> Outline {
        match self {
            ParseOutcome::Parsed(outline) => outline,
            ParseOutcome::Failed => Outline::default(),
        }
    }
}

/// Parse `source` and collect its outline.
///
/// Parsing is abandoned after `timeout`; error recovery on some garbage input
/// never terminates otherwise. A zero `timeout` means no limit.
pub fn parse_outline(source: &str, dialect: Dialect, timeout: Duration) -> ParseOutcome {
    let mut parser = Parser::new();
    if parser.set_language(&dialect.language()).is_err() {
        return ParseOutcome::Failed;
    }
    parser.set_timeout_micros(u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX));
    let Some(tree) = parser.parse(source, None) else {
        return ParseOutcome::Failed;
    };

    let src = source.as_bytes();
    let root = tree.root_node();
    let mut outline = Outline::default();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "export_statement" {
            collect_exports(child, src, &mut outline.exports);
        }
    }

    visit_preorder(root, |node| match node.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "function_signature"
        | "method_definition" => {
            if let Some(sig) = named_signature(node, src) {
                outline.signatures.push(sig);
            }
        }
        "variable_declarator" => {
            if let Some(sig) = bound_function_signature(node, src) {
                outline.signatures.push(sig);
            }
        }
        "comment" => {
            let text = node_text(node, src);
            if text.starts_with("/**") {
                if outline.doc_comment.is_none() {
                    outline.doc_comment = Some(text.trim().to_string());
                }
            } else if let Some(body) = text.strip_prefix("//") {
                let body = body.trim_start_matches('/').trim();
                if !body.is_empty() {
                    outline.line_comments.push(body.to_string());
                }
            }
        }
        _ => {}
    });

    ParseOutcome::Parsed(outline)
}

// ── Exports ───────────────────────────────────────────────────────────────

fn collect_exports(node: Node, src: &[u8], exports: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declaration"
            | "generator_function_declaration"
            | "function_signature"
            | "class_declaration"
            | "abstract_class_declaration"
            | "interface_declaration"
            | "type_alias_declaration"
            | "enum_declaration"
            // `export default function name` in grammars that model it as an expression
            | "function_expression"
            | "function"
            | "class" => {
                if let Some(name) = child.child_by_field_name("name") {
                    push_unique(exports, node_text(name, src));
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                collect_binding_names(child, src, exports);
            }
            // `export declare ...`
            "ambient_declaration" => collect_exports(child, src, exports),
            _ => {}
        }
    }
}

fn collect_binding_names(declaration: Node, src: &[u8], exports: &mut Vec<String>) {
    let mut cursor = declaration.walk();
    for declarator in declaration.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator.child_by_field_name("name") else {
            continue;
        };
        if name.kind() == "identifier" {
            push_unique(exports, node_text(name, src));
        } else {
            // Destructuring pattern: every bound identifier is exported
            visit_preorder(name, |n| {
                if matches!(
                    n.kind(),
                    "identifier" | "shorthand_property_identifier_pattern"
                ) && !is_pattern_key(n)
                {
                    push_unique(exports, node_text(n, src));
                }
            });
        }
    }
}

/// `{ a: b }` binds `b`, not the key `a`
fn is_pattern_key(node: Node) -> bool {
    node.parent().is_some_and(|p| {
        p.kind() == "pair_pattern"
            && p.child_by_field_name("key")
                .is_some_and(|k| k.id() == node.id())
    })
}

// ── Signatures ────────────────────────────────────────────────────────────

fn named_signature(node: Node, src: &[u8]) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    let params = node.child_by_field_name("parameters")?;
    Some(format!(
        "{}{}",
        node_text(name, src),
        collapse_whitespace(&node_text(params, src))
    ))
}

/// `const name = (..) => ..` or `const name = function (..) {}`
fn bound_function_signature(declarator: Node, src: &[u8]) -> Option<String> {
    let name = declarator.child_by_field_name("name")?;
    if name.kind() != "identifier" {
        return None;
    }
    let value = declarator.child_by_field_name("value")?;
    if !matches!(
        value.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    ) {
        return None;
    }
    let params = match value.child_by_field_name("parameters") {
        Some(params) => collapse_whitespace(&node_text(params, src)),
        // `x => ..` has a single bare parameter
        None => format!("({})", node_text(value.child_by_field_name("parameter")?, src)),
    };
    Some(format!("{}{}", node_text(name, src), params))
}

// ── Helpers ───────────────────────────────────────────────────────────────

/// Depth-first, document-order walk of every node under `root`
fn visit_preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn node_text(node: Node, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or("").to_string()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !name.is_empty() && !names.contains(&name) {
        names.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn outline(source: &str) -> Outline {
        match parse_outline(source, Dialect::Tsx, TIMEOUT) {
            ParseOutcome::Parsed(outline) => outline,
            ParseOutcome::Failed => panic!("parse failed"),
        }
    }

    #[test]
    fn test_exported_declarations() {
        let source = r#"
export function foo(x: number) {}
export class Bar {}
export interface Props { a: string }
export type Id = string;
export enum Color { Red }
export const LIMIT = 3, other = 4;
function hidden() {}
"#;
        let outline = outline(source);
        assert_eq!(
            outline.exports,
            vec!["foo", "Bar", "Props", "Id", "Color", "LIMIT", "other"]
        );
    }

    #[test]
    fn test_default_and_destructured_exports() {
        let source = r#"
export default function Page() { return <div />; }
export const { a, b: renamed } = obj;
"#;
        let outline = outline(source);
        assert_eq!(outline.exports, vec!["Page", "a", "renamed"]);
    }

    #[test]
    fn test_signatures_in_document_order() {
        let source = r#"
function add(a: number,
             b: number) { return a + b; }
class Store {
  load(id: string) {}
}
const handler = async (event: Event) => {};
const square = x => x * x;
const notAFunction = 42;
"#;
        let outline = outline(source);
        assert_eq!(
            outline.signatures,
            vec![
                "add(a: number, b: number)",
                "load(id: string)",
                "handler(event: Event)",
                "square(x)",
            ]
        );
    }

    #[test]
    fn test_comments() {
        let source = r#"
// Dashboard card
/**
 * Renders the price chart.
 */
export function Chart() {}
/** second block */
//
/// triple slash
"#;
        let outline = outline(source);
        assert_eq!(
            outline.doc_comment.as_deref(),
            Some("/**\n * Renders the price chart.\n */")
        );
        assert_eq!(outline.line_comments, vec!["Dashboard card", "triple slash"]);
    }

    #[test]
    fn test_broken_code_still_parses() {
        let source = "export function ok(a) {}\nexport const = ;;; {{{";
        let outline = outline(source);
        assert!(outline.exports.contains(&"ok".to_string()));
    }

    #[test]
    fn test_typescript_dialect() {
        let source = "export function cast(v: unknown) { return <string>v; }";
        let outline = parse_outline(source, Dialect::TypeScript, TIMEOUT).into_outline();
        assert_eq!(outline.exports, vec!["cast"]);
        assert_eq!(outline.signatures, vec!["cast(v: unknown)"]);
    }

    #[test]
    fn test_timeout_gives_failed() {
        let source = "export function f(a, b) { return a + b; }\n".repeat(40_000);
        let started = std::time::Instant::now();
        let outcome = parse_outline(&source, Dialect::Tsx, Duration::from_micros(1));

        assert_eq!(outcome, ParseOutcome::Failed);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.into_outline(), Outline::default());
    }

    #[test]
    fn test_pathological_input_returns() {
        // Unbalanced JSX, generics and template fragments keep error recovery busy
        let chunk = "<a b={`${<c<d>(e: [f, {g = <h/>}]) => i}`} j=<k l=( m ? <n o={p as q<r>}";
        let source = chunk.repeat(40);
        let started = std::time::Instant::now();
        let _ = parse_outline(&source, Dialect::Tsx, Duration::from_millis(200));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(Dialect::from_extension("ts"), Some(Dialect::TypeScript));
        assert_eq!(Dialect::from_extension("jsx"), Some(Dialect::Tsx));
        assert_eq!(Dialect::from_extension("rs"), None);
    }
}
