//! Custom `<pre>`/`<code>`/`<samp>` handler preserving language hints from
//! `data-language` or class-name patterns, per `spec.md` §4.6's
//! `<pre><code class="language-X">` fenced-block rule.
//!
//! Adapted from the teacher's
//! `content_saver/markdown_converter/custom_handlers/code_language_handler.rs`.

use html2md::{Handle, StructuredPrinter, TagHandler, TagHandlerFactory};
use markup5ever_rcdom::NodeData;

pub struct CodeLanguageHandler {
    language: Option<String>,
    code_type: String,
    inside_code: bool,
}

impl CodeLanguageHandler {
    pub fn new() -> Self {
        Self { language: None, code_type: String::new(), inside_code: false }
    }

    fn extract_language(tag: &Handle) -> Option<String> {
        if let NodeData::Element { ref attrs, .. } = tag.data {
            let attrs = attrs.borrow();

            if let Some(attr) = attrs.iter().find(|a| &*a.name.local == "data-language") {
                let lang = attr.value.to_string();
                if !lang.is_empty() {
                    return Some(lang);
                }
            }

            if let Some(attr) = attrs.iter().find(|a| &*a.name.local == "class") {
                let classes = attr.value.to_string();
                return Self::extract_language_from_class(&classes);
            }
        }
        None
    }

    /// Supports `language-rust`, `lang-rust`, `hljs-rust`, `brush: rust`.
    fn extract_language_from_class(class: &str) -> Option<String> {
        for part in class.split_whitespace() {
            if let Some(lang) = part.strip_prefix("language-") {
                return Some(lang.to_string());
            }
            if let Some(lang) = part.strip_prefix("lang-") {
                return Some(lang.to_string());
            }
            if let Some(lang) = part.strip_prefix("hljs-") {
                return Some(lang.to_string());
            }
            if let Some(lang) = part.strip_prefix("brush:") {
                return Some(lang.trim().to_string());
            }
        }
        None
    }

    fn do_handle(&mut self, printer: &mut StructuredPrinter, at_start: bool) {
        match self.code_type.as_str() {
            "pre" => {
                if at_start {
                    printer.insert_newline();
                    printer.append_str("```");
                    if let Some(ref lang) = self.language {
                        printer.append_str(lang);
                    }
                    printer.insert_newline();
                } else {
                    printer.insert_newline();
                    printer.append_str("```");
                    printer.insert_newline();
                }
            }
            "code" | "samp" => {
                if !self.inside_code {
                    printer.append_str("`");
                }
            }
            _ => {}
        }
    }
}

impl TagHandler for CodeLanguageHandler {
    fn handle(&mut self, tag: &Handle, printer: &mut StructuredPrinter) {
        if let NodeData::Element { ref name, .. } = tag.data {
            self.code_type = name.local.to_string();

            if self.code_type == "pre" {
                self.language = Self::extract_language(tag);
            }
            if self.code_type == "code" || self.code_type == "samp" {
                self.inside_code = true;
            }

            self.do_handle(printer, true);
        }
    }

    fn after_handle(&mut self, printer: &mut StructuredPrinter) {
        self.do_handle(printer, false);
    }

    fn skip_descendants(&self) -> bool {
        false
    }
}

pub struct CodeLanguageHandlerFactory;

impl TagHandlerFactory for CodeLanguageHandlerFactory {
    fn instantiate(&self) -> Box<dyn TagHandler> {
        Box::new(CodeLanguageHandler::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn convert(html: &str) -> String {
        let mut handlers: HashMap<String, Box<dyn TagHandlerFactory>> = HashMap::new();
        handlers.insert("pre".to_string(), Box::new(CodeLanguageHandlerFactory));
        handlers.insert("code".to_string(), Box::new(CodeLanguageHandlerFactory));
        html2md::parse_html_custom(html, &handlers)
    }

    #[test]
    fn extracts_language_from_class_pattern() {
        let markdown = convert(r#"<pre><code class="language-rust">fn main() {}</code></pre>"#);
        assert!(markdown.contains("```rust"));
        assert!(markdown.contains("fn main() {}"));
    }

    #[test]
    fn data_language_attribute_takes_priority() {
        let markdown =
            convert(r#"<pre data-language="python" class="language-rust">print(1)</pre>"#);
        assert!(markdown.contains("```python"));
    }

    #[test]
    fn no_language_hint_emits_bare_fence() {
        let markdown = convert("<pre>plain text</pre>");
        assert!(markdown.contains("```\n"));
    }
}
