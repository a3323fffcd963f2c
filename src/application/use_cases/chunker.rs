use std::collections::HashMap;

use crate::application::use_cases::secret_scanner;
use crate::domain::{Chunk, ChunkKind, ChunkType, Language, Pattern, Symbol, SymbolKind, WEIGHT_BOOSTED};

const TEST_MARKERS: &[&str] = &[
    "test_", "_test.py", "_test.go", ".test.js", ".test.ts", ".spec.js", ".spec.ts", "/tests/", "/__tests__/",
];

/// True if the lowercased file path matches any of the test-file markers (§4.2).
pub fn is_test_path(file_path: &str) -> bool {
    let lower = file_path.to_lowercase();
    TEST_MARKERS.iter().any(|m| lower.contains(m))
}

/// Derives a dotted module path from a relative file path by stripping the
/// extension and replacing path separators with dots.
pub fn module_from_path(file_path: &str) -> String {
    let without_ext = file_path.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_path);
    without_ext.replace(['/', '\\'], ".")
}

/// Converts extracted symbols for one file into chunks, applying secret
/// redaction, test-weighting, and optional hierarchical splitting (§4.2).
pub struct Chunker {
    hierarchical: bool,
}

impl Chunker {
    pub fn new(hierarchical: bool) -> Self {
        Self { hierarchical }
    }

    pub fn chunk_file(&self, repo: &str, file_path: &str, language: Language, symbols: &[Symbol]) -> Vec<Chunk> {
        let module = module_from_path(file_path);
        let is_test = is_test_path(file_path);

        if self.hierarchical {
            self.chunk_hierarchical(repo, file_path, &module, language, symbols, is_test)
        } else {
            self.chunk_flat(repo, file_path, &module, language, symbols, is_test)
        }
    }

    fn chunk_flat(
        &self,
        repo: &str,
        file_path: &str,
        module: &str,
        language: Language,
        symbols: &[Symbol],
        is_test: bool,
    ) -> Vec<Chunk> {
        symbols
            .iter()
            .map(|sym| self.symbol_to_chunk(repo, file_path, module, language, sym, is_test))
            .collect()
    }

    fn chunk_hierarchical(
        &self,
        repo: &str,
        file_path: &str,
        module: &str,
        language: Language,
        symbols: &[Symbol],
        is_test: bool,
    ) -> Vec<Chunk> {
        let mut out = Vec::new();
        let mut methods_by_class: HashMap<&str, Vec<&Symbol>> = HashMap::new();
        let mut classes: Vec<&Symbol> = Vec::new();
        let mut non_class_non_method: Vec<&Symbol> = Vec::new();

        for sym in symbols {
            match sym.kind() {
                SymbolKind::Class => classes.push(sym),
                SymbolKind::Method => {
                    if let Some(parent) = sym.parent() {
                        methods_by_class.entry(parent).or_default().push(sym);
                    }
                }
                _ => non_class_non_method.push(sym),
            }
        }

        for sym in &non_class_non_method {
            out.push(self.symbol_to_chunk(repo, file_path, module, language, sym, is_test));
        }

        for class_sym in &classes {
            let methods: Vec<&&Symbol> = methods_by_class
                .get(class_sym.name())
                .map(|v| v.iter().collect())
                .unwrap_or_default();

            if methods.len() > 50 {
                let method_names: Vec<&str> = methods.iter().map(|m| m.name()).collect();
                let content = format!(
                    "class {}\n{}\n\nMethods: {}",
                    class_sym.name(),
                    class_sym.docstring().unwrap_or_default(),
                    method_names.join(", ")
                );
                let chunk = Chunk::new(
                    repo,
                    file_path,
                    class_sym.start_line(),
                    class_sym.end_line(),
                    ChunkType::Code,
                    ChunkKind::ClassSummary,
                    module,
                    content,
                    language,
                )
                .with_symbol_name(class_sym.name())
                .with_is_test(is_test);
                out.push(self.apply_secrets(chunk));
            } else {
                out.push(self.symbol_to_chunk(repo, file_path, module, language, class_sym, is_test));
            }

            for method in methods {
                let header = format!("# {}\n# class {}", file_path, class_sym.name());
                let mut chunk = self.symbol_to_chunk(repo, file_path, module, language, method, is_test);
                chunk = chunk.with_context_header(header);
                out.push(chunk);
            }
        }

        out
    }

    fn symbol_to_chunk(
        &self,
        repo: &str,
        file_path: &str,
        module: &str,
        language: Language,
        sym: &Symbol,
        is_test: bool,
    ) -> Chunk {
        let kind = match sym.kind() {
            SymbolKind::Function => ChunkKind::Function,
            SymbolKind::Class => ChunkKind::Class,
            SymbolKind::Method => ChunkKind::Method,
            SymbolKind::Variable => ChunkKind::Variable,
        };

        let mut chunk = Chunk::new(repo, file_path, sym.start_line(), sym.end_line(), ChunkType::Code, kind, module, sym.content(), language)
            .with_symbol_name(sym.name())
            .with_is_test(is_test);

        if let Some(sig) = sym.signature() {
            chunk = chunk.with_signature(sig);
        }
        if let Some(doc) = sym.docstring() {
            chunk = chunk.with_docstring(doc);
        }
        if sym.is_method() {
            let header = format!("# {}\n# class {}", file_path, sym.parent().unwrap_or_default());
            chunk = chunk.with_context_header(header);
        }

        self.apply_secrets(chunk)
    }

    fn apply_secrets(&self, chunk: Chunk) -> Chunk {
        let (detected, redacted) = secret_scanner::scan_and_redact(chunk.content());
        if detected {
            chunk.with_secrets(true, redacted)
        } else {
            chunk
        }
    }
}

/// Parses `AGENTS.md`/`CLAUDE.md`-style navigation documents into one doc
/// chunk per heading section (§4.2).
pub fn chunk_navigation_doc(repo: &str, file_path: &str, content: &str) -> Vec<Chunk> {
    let module = module_from_path(file_path);
    let mut sections: Vec<(Vec<String>, u32, Vec<String>)> = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current_lines: Vec<String> = Vec::new();
    let mut current_start: u32 = 1;

    let flush = |sections: &mut Vec<(Vec<String>, u32, Vec<String>)>, stack: &[String], start: u32, lines: Vec<String>| {
        if !stack.is_empty() && !lines.iter().all(|l| l.trim().is_empty()) {
            sections.push((stack.to_vec(), start, lines));
        }
    };

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx as u32 + 1;
        if let Some(heading) = parse_heading(line) {
            flush(&mut sections, &stack, current_start, std::mem::take(&mut current_lines));
            let (level, title) = heading;
            if level == 1 {
                // The h1 is the document title (§4.2), not a section of its own.
                stack.clear();
            } else {
                stack.truncate(level.saturating_sub(2));
                stack.push(title);
            }
            current_start = line_no;
        } else {
            current_lines.push(line.to_string());
        }
    }
    flush(&mut sections, &stack, current_start, current_lines);

    let title = content
        .lines()
        .find_map(|l| parse_heading(l).filter(|(lvl, _)| *lvl == 1).map(|(_, t)| t));

    sections
        .into_iter()
        .map(|(heading_stack, start_line, lines)| {
            let heading_path = heading_stack.join(" > ");
            let body = lines.join("\n");
            let description = lines.iter().find(|l| !l.trim().is_empty()).cloned().unwrap_or_default();
            let content_block = if let Some(t) = &title {
                format!("{}\n\n{}", t, body)
            } else {
                body
            };
            let end_line = start_line + lines.len() as u32;
            Chunk::new(
                repo,
                file_path,
                start_line,
                end_line,
                ChunkType::Doc,
                ChunkKind::Navigation,
                &module,
                content_block,
                Language::Unknown,
            )
            .with_heading_path(heading_path)
            .with_docstring(description)
            .with_retrieval_weight(WEIGHT_BOOSTED)
        })
        .collect()
}

fn parse_heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = trimmed[level..].trim();
    if rest.is_empty() {
        return None;
    }
    Some((level, rest.to_string()))
}

/// Builds one pattern chunk per detected pattern (§4.2).
pub fn chunk_patterns(repo: &str, patterns: &[Pattern]) -> Vec<Chunk> {
    patterns
        .iter()
        .map(|pattern| {
            Chunk::new(
                repo,
                pattern.canonical_member(),
                1,
                1,
                ChunkType::Doc,
                ChunkKind::Pattern,
                pattern.module(),
                pattern.to_markdown(),
                Language::Unknown,
            )
            .with_symbol_name(pattern.name())
            .with_retrieval_weight(WEIGHT_BOOSTED)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SymbolKind;

    #[test]
    fn flat_mode_produces_one_chunk_per_symbol() {
        let symbols = vec![
            Symbol::new("greet", SymbolKind::Function, "greeter.py", 1, 2, "def greet(): ..."),
            Symbol::new("Greeter", SymbolKind::Class, "greeter.py", 4, 10, "class Greeter: ..."),
        ];
        let chunker = Chunker::new(false);
        let chunks = chunker.chunk_file("repo", "greeter.py", Language::Python, &symbols);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_file_chunks_get_reduced_weight() {
        let symbols = vec![Symbol::new("test_greet", SymbolKind::Function, "tests/test_greeter.py", 1, 2, "def test_greet(): ...")];
        let chunker = Chunker::new(false);
        let chunks = chunker.chunk_file("repo", "tests/test_greeter.py", Language::Python, &symbols);
        assert!(chunks[0].is_test());
        assert_eq!(chunks[0].retrieval_weight(), 0.5);
    }

    #[test]
    fn hierarchical_mode_injects_context_header_on_methods() {
        let symbols = vec![
            Symbol::new("Greeter", SymbolKind::Class, "greeter.py", 1, 10, "class Greeter:"),
            Symbol::new("greet", SymbolKind::Method, "greeter.py", 2, 3, "def greet(self): ...").with_parent("Greeter"),
        ];
        let chunker = Chunker::new(true);
        let chunks = chunker.chunk_file("repo", "greeter.py", Language::Python, &symbols);
        let method_chunk = chunks.iter().find(|c| c.kind() == ChunkKind::Method).unwrap();
        assert!(method_chunk.context_header().unwrap().contains("class Greeter"));
    }

    #[test]
    fn navigation_doc_splits_by_heading() {
        let doc = "# Project\n\nIntro line.\n\n## Setup\n\nRun install.\n\n## Usage\n\nRun it.\n";
        let chunks = chunk_navigation_doc("repo", "AGENTS.md", doc);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].docstring(), Some("Run install."));
    }
}
