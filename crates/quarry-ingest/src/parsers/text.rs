//! Plain text and source code parser.

use super::{DocumentParser, ParsedDocument};
use crate::error::ExtractResult;
use std::path::Path;

/// Parser for plain text files, including source code.
pub struct TextParser;

impl TextParser {
    /// Programming language for a file extension, if it is code.
    pub fn detect_language(extension: &str) -> Option<&'static str> {
        match extension.to_lowercase().as_str() {
            "rs" => Some("rust"),
            "py" => Some("python"),
            "js" | "jsx" | "mjs" => Some("javascript"),
            "ts" | "tsx" => Some("typescript"),
            "go" => Some("go"),
            "c" => Some("c"),
            "cpp" | "cc" | "cxx" | "h" | "hpp" => Some("cpp"),
            "java" => Some("java"),
            "kt" => Some("kotlin"),
            "rb" => Some("ruby"),
            "php" => Some("php"),
            "swift" => Some("swift"),
            "scala" => Some("scala"),
            "sh" | "bash" | "zsh" => Some("shell"),
            "sql" => Some("sql"),
            "json" => Some("json"),
            "yaml" | "yml" => Some("yaml"),
            "toml" => Some("toml"),
            "css" | "scss" => Some("css"),
            "lua" => Some("lua"),
            "ex" | "exs" => Some("elixir"),
            "hs" => Some("haskell"),
            _ => None,
        }
    }
}

impl DocumentParser for TextParser {
    fn parse_bytes(&self, name: &str, data: &[u8]) -> ExtractResult<ParsedDocument> {
        let content = String::from_utf8_lossy(data).into_owned();
        let language = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::detect_language);

        let mut metadata = serde_json::json!({
            "format": if language.is_some() { "code" } else { "text" },
            "lines": content.lines().count(),
        });
        if let Some(lang) = language {
            metadata["language"] = serde_json::json!(lang);
        }

        Ok(ParsedDocument::new(content).with_metadata(metadata))
    }

    fn extensions(&self) -> &[&str] {
        &[
            "txt", "text", "log", "rst", "org", "adoc", // Plain text
            "rs", "py", "js", "jsx", "mjs", "ts", "tsx", "go", "c", "cc", "cpp", "cxx", "h",
            "hpp", "java", "kt", "rb", "php", "swift", "scala", "sh", "bash", "zsh", "sql",
            "json", "yaml", "yml", "toml", "css", "scss", "lua", "ex", "exs", "hs", // Code
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        let doc = TextParser
            .parse_bytes("notes.txt", b"This is a plain text file.\nWith multiple lines.")
            .unwrap();

        assert!(doc.content.contains("plain text file"));
        assert_eq!(doc.metadata["format"], "text");
        assert_eq!(doc.metadata["lines"], 2);
    }

    #[test]
    fn test_parse_code() {
        let doc = TextParser
            .parse_bytes("main.rs", b"fn main() {\n    println!(\"Hello\");\n}")
            .unwrap();

        assert_eq!(doc.metadata["format"], "code");
        assert_eq!(doc.metadata["language"], "rust");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let doc = TextParser.parse_bytes("a.txt", &[b'o', b'k', 0xff]).unwrap();
        assert!(doc.content.starts_with("ok"));
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(TextParser::detect_language("rs"), Some("rust"));
        assert_eq!(TextParser::detect_language("JS"), Some("javascript"));
        assert_eq!(TextParser::detect_language("xyz"), None);
    }
}
