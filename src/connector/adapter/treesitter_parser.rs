use async_trait::async_trait;
use tree_sitter::{Node, Parser};

use crate::application::ParserService;
use crate::domain::{DomainError, Language, Relationship, RelationshipKind, Symbol, SymbolKind};

/// AST-walking parser for Python and the JavaScript/TypeScript family (§4.1).
/// Grounded on the donor's grammar-table `TreeSitterParser`, trimmed from ten
/// languages to three and rewritten to walk the tree directly (rather than
/// compiled `Query` patterns) so enclosing-class/function resolution and
/// Python docstring/signature reconstruction fall out of a single recursive
/// descent instead of a separate scope-lookup pass.
pub struct TreeSitterParser;

impl TreeSitterParser {
    pub fn new() -> Self {
        Self
    }

    fn ts_language(language: Language) -> Option<tree_sitter::Language> {
        match language {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Unknown => None,
        }
    }

    fn parse_tree(content: &str, language: Language) -> Result<tree_sitter::Tree, DomainError> {
        let ts_lang = Self::ts_language(language).ok_or_else(|| DomainError::UnsupportedLanguage(language.to_string()))?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_lang)
            .map_err(|e| DomainError::internal(format!("failed to load grammar: {e}")))?;
        parser
            .parse(content, None)
            .ok_or_else(|| DomainError::parse_error("<unknown>", "tree-sitter returned no parse tree"))
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

fn line_of(node: Node, offset: u32) -> u32 {
    node.start_position().row as u32 + offset
}

fn node_text<'a>(node: Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

/// Strips one layer of triple or single quotes from a Python string literal.
fn strip_docstring_quotes(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.strip_prefix("r").unwrap_or(raw);
    for quote in ["\"\"\"", "'''"] {
        if let Some(inner) = raw.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner.trim().to_string();
        }
    }
    for quote in ["\"", "'"] {
        if let Some(inner) = raw.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner.trim().to_string();
        }
    }
    raw.to_string()
}

// ---------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------

fn python_docstring(body: Node, src: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first_stmt = body.named_children(&mut cursor).next()?;
    if first_stmt.kind() != "expression_statement" {
        return None;
    }
    let expr = first_stmt.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    Some(strip_docstring_quotes(node_text(expr, src)))
}

fn python_signature(node: Node, src: &str, name: &str) -> String {
    let params = node
        .child_by_field_name("parameters")
        .map(|p| node_text(p, src).to_string())
        .unwrap_or_else(|| "()".to_string());
    let return_type = node
        .child_by_field_name("return_type")
        .map(|r| format!(" -> {}", node_text(r, src)));
    format!("def {name}{params}{}", return_type.unwrap_or_default())
}

fn walk_python(node: Node, src: &str, file_path: &str, parent: Option<&str>, out: &mut Vec<Symbol>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else { continue };
                let name = node_text(name_node, src);
                let body = child.child_by_field_name("body");
                let docstring = body.and_then(|b| python_docstring(b, src));
                let kind = if parent.is_some() { SymbolKind::Method } else { SymbolKind::Function };
                let mut sym = Symbol::new(
                    name,
                    kind,
                    file_path,
                    line_of(child, 1),
                    child.end_position().row as u32 + 1,
                    node_text(child, src),
                )
                .with_signature(python_signature(child, src, name));
                if let Some(doc) = docstring {
                    sym = sym.with_docstring(doc);
                }
                if let Some(p) = parent {
                    sym = sym.with_parent(p);
                }
                out.push(sym);
                if let Some(body) = body {
                    walk_python(body, src, file_path, Some(name), out);
                }
            }
            "class_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else { continue };
                let name = node_text(name_node, src);
                let body = child.child_by_field_name("body");
                let docstring = body.and_then(|b| python_docstring(b, src));
                let mut sym = Symbol::new(name, SymbolKind::Class, file_path, line_of(child, 1), child.end_position().row as u32 + 1, node_text(child, src));
                if let Some(doc) = docstring {
                    sym = sym.with_docstring(doc);
                }
                out.push(sym);
                if let Some(body) = body {
                    walk_python(body, src, file_path, Some(name), out);
                }
            }
            "decorated_definition" => {
                walk_python(child, src, file_path, parent, out);
            }
            _ => {}
        }
    }
}

fn python_relationships(node: Node, src: &str, file_path: &str, enclosing: Option<&str>, out: &mut Vec<Relationship>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_statement" => {
                let mut ic = child.walk();
                for n in child.named_children(&mut ic) {
                    if matches!(n.kind(), "dotted_name" | "aliased_import") {
                        let target = node_text(n, src).split(" as ").next().unwrap_or("").to_string();
                        out.push(Relationship::new(RelationshipKind::Imports, file_path, target).with_source_line(line_of(child, 1)));
                    }
                }
            }
            "import_from_statement" => {
                if let Some(module) = child.child_by_field_name("module_name") {
                    out.push(Relationship::new(RelationshipKind::Imports, file_path, node_text(module, src)).with_source_line(line_of(child, 1)));
                }
            }
            "function_definition" => {
                let name = child.child_by_field_name("name").map(|n| node_text(n, src)).unwrap_or("<anonymous>");
                let qualified = match enclosing {
                    Some(parent) => format!("{parent}.{name}"),
                    None => name.to_string(),
                };
                if let Some(body) = child.child_by_field_name("body") {
                    collect_python_calls(body, src, file_path, &qualified, out);
                    python_relationships(body, src, file_path, Some(qualified.as_str()), out);
                }
            }
            "class_definition" => {
                let name = child.child_by_field_name("name").map(|n| node_text(n, src)).unwrap_or("<anonymous>");
                if let Some(bases) = child.child_by_field_name("superclasses") {
                    let mut bc = bases.walk();
                    for base in bases.named_children(&mut bc) {
                        out.push(
                            Relationship::new(RelationshipKind::Extends, file_path, node_text(base, src))
                                .with_source_symbol(name)
                                .with_source_line(line_of(child, 1)),
                        );
                    }
                }
                if let Some(body) = child.child_by_field_name("body") {
                    python_relationships(body, src, file_path, Some(name), out);
                }
            }
            _ => {}
        }
    }
}

fn collect_python_calls(node: Node, src: &str, file_path: &str, caller: &str, out: &mut Vec<Relationship>) {
    if node.kind() == "call" {
        if let Some(func) = node.child_by_field_name("function") {
            let target = match func.kind() {
                "attribute" => func.child_by_field_name("attribute").map(|a| node_text(a, src)).unwrap_or(node_text(func, src)),
                _ => node_text(func, src),
            };
            out.push(
                Relationship::new(RelationshipKind::Calls, file_path, target)
                    .with_source_symbol(caller)
                    .with_source_line(line_of(node, 1)),
            );
        }
    }
    // Stop descending into nested function/class bodies — those are handled
    // by the caller with their own qualified name.
    if matches!(node.kind(), "function_definition" | "class_definition") && node.id() != node.id() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if matches!(child.kind(), "function_definition" | "class_definition") {
            continue;
        }
        collect_python_calls(child, src, file_path, caller, out);
    }
}

// ---------------------------------------------------------------------
// JavaScript / TypeScript
// ---------------------------------------------------------------------

fn walk_js(node: Node, src: &str, file_path: &str, parent: Option<&str>, out: &mut Vec<Symbol>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else { continue };
                let name = node_text(name_node, src);
                let kind = if parent.is_some() { SymbolKind::Method } else { SymbolKind::Function };
                let mut sym = Symbol::new(name, kind, file_path, line_of(child, 1), child.end_position().row as u32 + 1, node_text(child, src));
                if let Some(p) = parent {
                    sym = sym.with_parent(p);
                }
                out.push(sym);
            }
            "class_declaration" => {
                let name_node = child.child_by_field_name("name");
                let name = name_node.map(|n| node_text(n, src)).unwrap_or("<anonymous>");
                out.push(Symbol::new(name, SymbolKind::Class, file_path, line_of(child, 1), child.end_position().row as u32 + 1, node_text(child, src)));
                if let Some(body) = child.child_by_field_name("body") {
                    let mut bc = body.walk();
                    for member in body.named_children(&mut bc) {
                        if member.kind() == "method_definition" {
                            if let Some(mname) = member.child_by_field_name("name") {
                                out.push(
                                    Symbol::new(
                                        node_text(mname, src),
                                        SymbolKind::Method,
                                        file_path,
                                        line_of(member, 1),
                                        member.end_position().row as u32 + 1,
                                        node_text(member, src),
                                    )
                                    .with_parent(name),
                                );
                            }
                        }
                    }
                }
            }
            _ => {}
        }
        walk_js(child, src, file_path, parent, out);
    }
}

fn js_relationships(node: Node, src: &str, file_path: &str, out: &mut Vec<Relationship>) {
    match node.kind() {
        "import_statement" => {
            if let Some(source) = node.child_by_field_name("source") {
                out.push(Relationship::new(RelationshipKind::Imports, file_path, strip_js_string_quotes(node_text(source, src))).with_source_line(line_of(node, 1)));
            }
        }
        "call_expression" => {
            if let Some(func) = node.child_by_field_name("function") {
                if func.kind() == "identifier" && node_text(func, src) == "require" {
                    if let Some(args) = node.child_by_field_name("arguments") {
                        if let Some(first) = args.named_child(0) {
                            out.push(
                                Relationship::new(RelationshipKind::Imports, file_path, strip_js_string_quotes(node_text(first, src)))
                                    .with_source_line(line_of(node, 1)),
                            );
                        }
                    }
                } else {
                    let target = match func.kind() {
                        "member_expression" => func.child_by_field_name("property").map(|p| node_text(p, src)).unwrap_or(node_text(func, src)),
                        _ => node_text(func, src),
                    };
                    out.push(Relationship::new(RelationshipKind::Calls, file_path, target).with_source_line(line_of(node, 1)));
                }
            }
        }
        "class_declaration" => {
            if let Some(heritage) = node.child_by_field_name("heritage") {
                if let Some(base) = heritage.named_child(0) {
                    out.push(Relationship::new(RelationshipKind::Extends, file_path, node_text(base, src)).with_source_line(line_of(node, 1)));
                }
            }
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        js_relationships(child, src, file_path, out);
    }
}

fn strip_js_string_quotes(s: &str) -> String {
    let trimmed = s.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

#[async_trait]
impl ParserService for TreeSitterParser {
    async fn extract_symbols(&self, content: &str, file_path: &str, language: Language) -> Result<Vec<Symbol>, DomainError> {
        let tree = Self::parse_tree(content, language)?;
        let mut symbols = Vec::new();
        match language {
            Language::Python => walk_python(tree.root_node(), content, file_path, None, &mut symbols),
            Language::JavaScript | Language::TypeScript => walk_js(tree.root_node(), content, file_path, None, &mut symbols),
            Language::Unknown => return Err(DomainError::UnsupportedLanguage(file_path.to_string())),
        }
        Ok(symbols)
    }

    async fn extract_relationships(&self, content: &str, file_path: &str, language: Language) -> Result<Vec<Relationship>, DomainError> {
        let tree = Self::parse_tree(content, language)?;
        let mut relationships = Vec::new();
        match language {
            Language::Python => python_relationships(tree.root_node(), content, file_path, None, &mut relationships),
            Language::JavaScript | Language::TypeScript => js_relationships(tree.root_node(), content, file_path, &mut relationships),
            Language::Unknown => return Err(DomainError::UnsupportedLanguage(file_path.to_string())),
        }
        Ok(relationships)
    }

    fn supported_languages(&self) -> Vec<Language> {
        Language::all_supported()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_python_function_and_class_with_docstring() {
        let src = "class Greeter:\n    \"\"\"Greets people.\"\"\"\n\n    def greet(self, name):\n        \"\"\"Say hello.\"\"\"\n        return f\"hi {name}\"\n";
        let parser = TreeSitterParser::new();
        let symbols = parser.extract_symbols(src, "greeter.py", Language::Python).await.unwrap();
        let class = symbols.iter().find(|s| s.kind() == SymbolKind::Class).unwrap();
        assert_eq!(class.docstring(), Some("Greets people."));
        let method = symbols.iter().find(|s| s.kind() == SymbolKind::Method).unwrap();
        assert_eq!(method.parent(), Some("Greeter"));
        assert_eq!(method.signature(), Some("def greet(self, name)"));
    }

    #[tokio::test]
    async fn extracts_python_imports_and_calls() {
        let src = "import os\nfrom pathlib import Path\n\ndef run():\n    os.getcwd()\n";
        let parser = TreeSitterParser::new();
        let rels = parser.extract_relationships(src, "run.py", Language::Python).await.unwrap();
        assert!(rels.iter().any(|r| r.kind() == RelationshipKind::Imports && r.target() == "os"));
        assert!(rels.iter().any(|r| r.kind() == RelationshipKind::Imports && r.target() == "pathlib"));
        assert!(rels.iter().any(|r| r.kind() == RelationshipKind::Calls && r.target() == "getcwd"));
    }

    #[tokio::test]
    async fn extracts_python_class_extends() {
        let src = "class Base:\n    pass\n\nclass Child(Base):\n    pass\n";
        let parser = TreeSitterParser::new();
        let rels = parser.extract_relationships(src, "x.py", Language::Python).await.unwrap();
        assert!(rels.iter().any(|r| r.kind() == RelationshipKind::Extends && r.target() == "Base"));
    }

    #[tokio::test]
    async fn extracts_js_function_and_class_method() {
        let src = "class Greeter {\n  greet(name) {\n    return `hi ${name}`;\n  }\n}\n\nfunction standalone() {}\n";
        let parser = TreeSitterParser::new();
        let symbols = parser.extract_symbols(src, "greeter.js", Language::JavaScript).await.unwrap();
        assert!(symbols.iter().any(|s| s.name() == "standalone" && s.kind() == SymbolKind::Function));
        let method = symbols.iter().find(|s| s.name() == "greet").unwrap();
        assert_eq!(method.parent(), Some("Greeter"));
    }

    #[tokio::test]
    async fn extracts_js_import_and_require() {
        let src = "import { foo } from './foo';\nconst bar = require('./bar');\n";
        let parser = TreeSitterParser::new();
        let rels = parser.extract_relationships(src, "x.js", Language::JavaScript).await.unwrap();
        assert!(rels.iter().any(|r| r.kind() == RelationshipKind::Imports && r.target() == "./foo"));
        assert!(rels.iter().any(|r| r.kind() == RelationshipKind::Imports && r.target() == "./bar"));
    }

    #[tokio::test]
    async fn unsupported_language_is_an_error() {
        let parser = TreeSitterParser::new();
        let err = parser.extract_symbols("x", "x.go", Language::Unknown).await.unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedLanguage(_)));
    }
}
