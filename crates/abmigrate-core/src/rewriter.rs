use regex::Regex;
use tracing::debug;

use crate::mappings::MappingTable;

/// Classification of a source line by the rewrite rule that applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `import * from ...` — names no symbols, passed through untouched.
    WildcardImport,
    /// `import { ... } from ...` — symbols in the brace body are renamed.
    BracedImport,
    /// Anything else — only call sites (`old(`) are renamed.
    Plain,
}

impl LineKind {
    pub fn is_import(self) -> bool {
        !matches!(self, LineKind::Plain)
    }
}

/// Result of rewriting one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub dirty: bool,
}

struct SymbolRule {
    /// `\bold\b`, for braced-import bodies.
    bare_word: Regex,
    /// `\bold\(`, for call sites.
    call_site: Regex,
    new_symbol: String,
    call_replacement: String,
}

/// Applies mapping-driven substitution line by line.
///
/// Matching is purely lexical: word-boundary regexes, no parsing of the
/// script grammar. A symbol used in any position other than a braced import
/// or a call site is deliberately left alone.
pub struct LineRewriter {
    wildcard_import: Regex,
    braced_import: Regex,
    rules: Vec<SymbolRule>,
}

impl LineRewriter {
    /// Compiles one pair of substitution rules per mapping entry.
    ///
    /// Identity entries (new name equals old name) exist only for file
    /// renaming and produce no rule, which also keeps the rewrite from ever
    /// chasing its own output.
    pub fn new(mappings: &MappingTable) -> Self {
        let rules = mappings
            .iter()
            .filter(|(old, entry)| entry.new_symbol != *old)
            .map(|(old, entry)| {
                let escaped = regex::escape(old);
                SymbolRule {
                    bare_word: Regex::new(&format!(r"\b{escaped}\b")).unwrap(),
                    call_site: Regex::new(&format!(r"\b{escaped}\(")).unwrap(),
                    new_symbol: entry.new_symbol.clone(),
                    call_replacement: format!("{}(", entry.new_symbol),
                }
            })
            .collect();

        Self {
            wildcard_import: Regex::new(r"^.*\bimport\s+\*\s+from\b.+$").unwrap(),
            braced_import: Regex::new(r"^(.*\bimport\s+\{)(.+)(\}\s+from\b.+)$").unwrap(),
            rules,
        }
    }

    /// Rewrites one line, given without its terminator.
    pub fn rewrite_line(&self, line: &str) -> (String, LineKind) {
        if self.wildcard_import.is_match(line) {
            return (line.to_string(), LineKind::WildcardImport);
        }
        if let Some(caps) = self.braced_import.captures(line) {
            let (head, tail) = (&caps[1], &caps[3]);
            let mut body = caps[2].to_string();
            for rule in &self.rules {
                body = rule
                    .bare_word
                    .replace_all(&body, rule.new_symbol.as_str())
                    .into_owned();
            }
            return (format!("{head}{body}{tail}"), LineKind::BracedImport);
        }
        let mut rewritten = line.to_string();
        for rule in &self.rules {
            rewritten = rule
                .call_site
                .replace_all(&rewritten, rule.call_replacement.as_str())
                .into_owned();
        }
        (rewritten, LineKind::Plain)
    }

    /// Rewrites a whole file's content, tracking import-block adjacency.
    ///
    /// An import block followed directly by a non-blank, non-import line
    /// gains exactly one separating blank line. The dirty flag covers both
    /// substitutions and that normalization.
    pub fn rewrite_content(&self, content: &str) -> Rewritten {
        let mut text = String::with_capacity(content.len());
        let mut dirty = false;
        let mut in_import_block = false;

        for raw in content.split_inclusive('\n') {
            let (body, has_newline) = match raw.strip_suffix('\n') {
                Some(body) => (body, true),
                None => (raw, false),
            };
            let (rewritten, kind) = self.rewrite_line(body);

            if in_import_block && !kind.is_import() && !body.is_empty() {
                debug!("Inserting blank line after import block");
                text.push('\n');
                dirty = true;
            }
            in_import_block = kind.is_import();

            // Braced imports are re-terminated even at end of file.
            let terminated = has_newline || kind == LineKind::BracedImport;
            if rewritten != body || terminated != has_newline {
                dirty = true;
            }
            text.push_str(&rewritten);
            if terminated {
                text.push('\n');
            }
        }

        Rewritten { text, dirty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter(mapping_text: &str) -> LineRewriter {
        let table = MappingTable::parse(mapping_text).unwrap();
        LineRewriter::new(&table)
    }

    #[test]
    fn test_wildcard_import_passthrough() {
        let rewriter = rewriter("std.ab includes contains\n");

        let (line, kind) = rewriter.rewrite_line("import * from \"std/includes\"");
        assert_eq!(line, "import * from \"std/includes\"");
        assert_eq!(kind, LineKind::WildcardImport);
    }

    #[test]
    fn test_braced_import_rewrites_symbols() {
        let rewriter = rewriter("std.ab includes contains\nstd.ab split text_split\n");

        let (line, kind) =
            rewriter.rewrite_line("import { includes, split } from \"std/text\"");
        assert_eq!(line, "import { contains, text_split } from \"std/text\"");
        assert_eq!(kind, LineKind::BracedImport);
    }

    #[test]
    fn test_braced_import_leaves_module_path_alone() {
        let rewriter = rewriter("std.ab includes contains\n");

        let (line, _) = rewriter.rewrite_line("import { includes } from \"std/includes\"");
        assert_eq!(line, "import { contains } from \"std/includes\"");
    }

    #[test]
    fn test_braced_import_word_boundaries() {
        let rewriter = rewriter("std.ab len list_len\n");

        let (line, _) = rewriter.rewrite_line("import { len, length } from \"std/list\"");
        assert_eq!(line, "import { list_len, length } from \"std/list\"");
    }

    #[test]
    fn test_call_site_rewrite() {
        let rewriter = rewriter("std.ab includes contains\n");

        let (line, kind) = rewriter.rewrite_line("if includes(names, name) {");
        assert_eq!(line, "if contains(names, name) {");
        assert_eq!(kind, LineKind::Plain);
    }

    #[test]
    fn test_bare_reference_untouched() {
        let rewriter = rewriter("std.ab includes contains\n");

        let (line, _) = rewriter.rewrite_line("let includes = 1; includes(x)");
        assert_eq!(line, "let includes = 1; contains(x)");
    }

    #[test]
    fn test_substring_untouched() {
        let rewriter = rewriter("std.ab len list_len\n");

        let (line, _) = rewriter.rewrite_line("let n = length(items) + len(items)");
        assert_eq!(line, "let n = length(items) + list_len(items)");
    }

    #[test]
    fn test_identity_entry_skipped() {
        let rewriter = rewriter("std.ab parse parse\n");

        let (line, _) = rewriter.rewrite_line("let v = parse(input)");
        assert_eq!(line, "let v = parse(input)");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let rewriter = rewriter("std.ab includes contains\nstd.ab split text_split\n");
        let content = "import { includes } from \"std/text\"\n\nsplit(line, \",\")\n";

        let once = rewriter.rewrite_content(content);
        assert!(once.dirty);
        let twice = rewriter.rewrite_content(&once.text);
        assert_eq!(twice.text, once.text);
        assert!(!twice.dirty);
    }

    #[test]
    fn test_blank_line_inserted_after_import_block() {
        let rewriter = rewriter("std.ab includes contains\n");
        let content = "import * from \"std/text\"\nmain {\n}\n";

        let result = rewriter.rewrite_content(content);
        assert!(result.dirty);
        assert_eq!(result.text, "import * from \"std/text\"\n\nmain {\n}\n");
    }

    #[test]
    fn test_existing_blank_line_preserved() {
        let rewriter = rewriter("std.ab includes contains\n");
        let content = "import * from \"std/text\"\n\nmain {\n}\n";

        let result = rewriter.rewrite_content(content);
        assert!(!result.dirty);
        assert_eq!(result.text, content);
    }

    #[test]
    fn test_no_blank_line_between_imports() {
        let rewriter = rewriter("std.ab includes contains\n");
        let content = "import * from \"std/text\"\nimport { includes } from \"std/list\"\n\nmain {\n}\n";

        let result = rewriter.rewrite_content(content);
        assert_eq!(
            result.text,
            "import * from \"std/text\"\nimport { contains } from \"std/list\"\n\nmain {\n}\n"
        );
    }

    #[test]
    fn test_braced_import_gains_terminator_at_eof() {
        let rewriter = rewriter("std.ab includes contains\n");
        let content = "import { includes } from \"std/text\"";

        let result = rewriter.rewrite_content(content);
        assert!(result.dirty);
        assert_eq!(result.text, "import { contains } from \"std/text\"\n");
    }

    #[test]
    fn test_untouched_file_is_clean() {
        let rewriter = rewriter("std.ab includes contains\n");
        let content = "main {\n    echo \"hello\"\n}\n";

        let result = rewriter.rewrite_content(content);
        assert!(!result.dirty);
        assert_eq!(result.text, content);
    }

    #[test]
    fn test_empty_file_is_clean() {
        let rewriter = rewriter("std.ab includes contains\n");

        let result = rewriter.rewrite_content("");
        assert!(!result.dirty);
        assert_eq!(result.text, "");
    }
}
