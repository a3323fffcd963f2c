use std::collections::{BTreeSet, HashMap};

use crate::domain::{jaccard, longest_common_suffix_name, Pattern, Symbol, SymbolKind};

/// Default minimum Jaccard similarity for two files to join a cluster.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;
/// Default minimum cluster size for a pattern to be kept.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 5;

/// Per-file signature used to cluster classes: whether it declares a class,
/// the class name, its sorted method-name set, and whether it has `__init__`.
struct FileSignature {
    file_path: String,
    has_class: bool,
    class_name: String,
    methods: BTreeSet<String>,
    has_init: bool,
}

fn build_signatures(symbols: &[Symbol]) -> Vec<FileSignature> {
    let mut by_file: HashMap<&str, Vec<&Symbol>> = HashMap::new();
    for sym in symbols {
        by_file.entry(sym.file_path()).or_default().push(sym);
    }

    let mut files: Vec<&str> = by_file.keys().copied().collect();
    files.sort();

    files
        .into_iter()
        .map(|file_path| {
            let syms = &by_file[file_path];
            let class_sym = syms.iter().find(|s| s.kind() == SymbolKind::Class);
            let methods: BTreeSet<String> = syms
                .iter()
                .filter(|s| s.kind() == SymbolKind::Method)
                .map(|s| s.name().to_string())
                .collect();
            let has_init = methods.contains("__init__") || methods.contains("constructor");
            FileSignature {
                file_path: file_path.to_string(),
                has_class: class_sym.is_some(),
                class_name: class_sym.map(|s| s.name().to_string()).unwrap_or_default(),
                methods,
                has_init,
            }
        })
        .collect()
}

/// Greedily clusters files (in lexical order) by class-method-set Jaccard
/// similarity, then names and summarizes each kept cluster (§4.4).
pub fn detect_patterns(
    repo_module: &str,
    symbols: &[Symbol],
    similarity_threshold: f64,
    min_cluster_size: usize,
) -> Vec<Pattern> {
    let signatures = build_signatures(symbols);
    let mut visited = vec![false; signatures.len()];
    let mut patterns = Vec::new();

    for seed_idx in 0..signatures.len() {
        if visited[seed_idx] || !signatures[seed_idx].has_class {
            continue;
        }
        visited[seed_idx] = true;
        let mut cluster = vec![seed_idx];

        for candidate_idx in (seed_idx + 1)..signatures.len() {
            if visited[candidate_idx] || !signatures[candidate_idx].has_class {
                continue;
            }
            let sim = jaccard(&signatures[seed_idx].methods, &signatures[candidate_idx].methods);
            if sim >= similarity_threshold {
                visited[candidate_idx] = true;
                cluster.push(candidate_idx);
            }
        }

        if cluster.len() < min_cluster_size {
            continue;
        }

        let members: Vec<String> = cluster.iter().map(|&i| signatures[i].file_path.clone()).collect();
        let class_names: Vec<String> = cluster.iter().map(|&i| signatures[i].class_name.clone()).collect();

        let min_occurrences = (cluster.len() as f64 * 0.8).ceil() as usize;
        let mut method_counts: HashMap<&str, usize> = HashMap::new();
        for &i in &cluster {
            for m in &signatures[i].methods {
                *method_counts.entry(m.as_str()).or_insert(0) += 1;
            }
        }
        let mut common_methods: Vec<String> = method_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(m, _)| m.to_string())
            .collect();
        common_methods.sort();

        let name = longest_common_suffix_name(&class_names);
        patterns.push(Pattern::new(name, repo_module, common_methods, members));
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_file(path: &str, class: &str, methods: &[&str]) -> Vec<Symbol> {
        let mut syms = vec![Symbol::new(class, SymbolKind::Class, path, 1, 100, format!("class {class}:"))];
        for m in methods {
            syms.push(
                Symbol::new(*m, SymbolKind::Method, path, 2, 3, format!("def {m}(self): ..."))
                    .with_parent(class),
            );
        }
        syms
    }

    #[test]
    fn clusters_similar_classes_into_a_named_pattern() {
        let mut symbols = Vec::new();
        symbols.extend(class_file("aws_importer.py", "AWSImporter", &["fetch", "save", "validate"]));
        symbols.extend(class_file("azure_importer.py", "AzureImporter", &["fetch", "save", "validate"]));
        symbols.extend(class_file("gcp_importer.py", "GCPImporter", &["fetch", "save", "validate"]));
        symbols.extend(class_file("ibm_importer.py", "IBMImporter", &["fetch", "save", "validate"]));
        symbols.extend(class_file("oracle_importer.py", "OracleImporter", &["fetch", "save", "validate"]));

        let patterns = detect_patterns("importers", &symbols, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_MIN_CLUSTER_SIZE);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].name(), "Importer");
        assert_eq!(patterns[0].members().len(), 5);
        assert_eq!(patterns[0].common_methods(), &["fetch".to_string(), "save".to_string(), "validate".to_string()]);
    }

    #[test]
    fn clusters_below_minimum_size_are_discarded() {
        let mut symbols = Vec::new();
        symbols.extend(class_file("a.py", "AImporter", &["fetch"]));
        symbols.extend(class_file("b.py", "BImporter", &["fetch"]));

        let patterns = detect_patterns("importers", &symbols, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_MIN_CLUSTER_SIZE);
        assert!(patterns.is_empty());
    }
}
