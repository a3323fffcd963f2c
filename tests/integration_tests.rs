//! End-to-end parser -> chunker integration tests.

use codeindex::application::Chunker;
use codeindex::application::ParserService;
use codeindex::domain::Language;
use codeindex::connector::adapter::TreeSitterParser;

const SAMPLE: &str = include_str!("fixtures/sample.py");

#[tokio::test]
async fn parses_and_chunks_a_python_module() {
    let parser = TreeSitterParser::new();
    let symbols = parser.extract_symbols(SAMPLE, "sample.py", Language::Python).await.expect("parse sample.py");

    let names: Vec<&str> = symbols.iter().map(|s| s.name()).collect();
    assert!(names.contains(&"Greeter"));
    assert!(names.contains(&"greet"));
    assert!(names.contains(&"add"));
    assert!(names.contains(&"_private_helper"));

    let greet = symbols.iter().find(|s| s.name() == "greet").expect("greet method found");
    assert!(greet.is_method());
    assert_eq!(greet.parent(), Some("Greeter"));
    assert_eq!(greet.docstring(), Some("Return a greeting for this greeter's name."));

    let chunker = Chunker::new(true);
    let chunks = chunker.chunk_file("sample-repo", "sample.py", Language::Python, &symbols);

    assert_eq!(chunks.len(), symbols.len());
    assert!(chunks.iter().all(|c| c.repo() == "sample-repo"));
    assert!(chunks.iter().any(|c| c.symbol_name() == Some("add")));
}

#[tokio::test]
async fn unsupported_language_is_rejected_before_parsing() {
    let parser = TreeSitterParser::new();
    let err = parser.extract_symbols("package main", "main.go", Language::Unknown).await.unwrap_err();
    assert!(matches!(err, codeindex::domain::DomainError::UnsupportedLanguage(_)));
}
