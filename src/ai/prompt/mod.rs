//! Prompt Builder
//!
//! Standardized prompt construction for generation requests. Sections are
//! rendered in the order they are added:
//!
//! 1. **Role**: who the model is and what it is good at
//! 2. **Context**: ordered key/value facts
//! 3. **Text / Code**: free text and fenced payloads
//! 4. **Rules**: hard constraints
//! 5. **Checklist**: numbered requirements

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with a list of strengths
    Role {
        expertise: String,
        strengths: Vec<String>,
    },
    /// Ordered key/value facts
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Code block with language
    Code { language: String, content: String },
    /// Hard constraints
    Rules(Vec<String>),
    /// Numbered requirements under a header
    Checklist { header: String, items: Vec<String> },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, strengths: &[&str]) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Add a context item; consecutive items share one context block
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let item = (key.to_string(), value.to_string());
        match self.sections.last_mut() {
            Some(PromptSection::Context(items)) => items.push(item),
            _ => self.sections.push(PromptSection::Context(vec![item])),
        }
        self
    }

    /// Add text section
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add code block
    pub fn code(mut self, language: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add hard constraints
    pub fn rules(mut self, rules: &[&str]) -> Self {
        self.sections.push(PromptSection::Rules(
            rules.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Add a numbered checklist
    pub fn checklist(mut self, header: &str, items: &[&str]) -> Self {
        self.sections.push(PromptSection::Checklist {
            header: header.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role {
                    expertise,
                    strengths,
                } => {
                    prompt.push_str(&format!("You are an expert {}.", expertise));
                    for strength in strengths {
                        prompt.push(' ');
                        prompt.push_str(&strength);
                    }
                    prompt.push_str("\n\n");
                }
                PromptSection::Context(items) => {
                    for (key, value) in items {
                        prompt.push_str(&format!("{}: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("{}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    prompt.push_str("\n```\n\n");
                }
                PromptSection::Rules(rules) => {
                    for rule in rules {
                        prompt.push_str(&format!("- {}\n", rule));
                    }
                    prompt.push('\n');
                }
                PromptSection::Checklist { header, items } => {
                    prompt.push_str(&format!("{}\n", header));
                    for (i, item) in items.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, item));
                    }
                    prompt.push('\n');
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_and_rules() {
        let prompt = PromptBuilder::new()
            .role("JSON schema designer", &["You never omit sections."])
            .rules(&["Return only JSON."])
            .build();

        assert!(prompt.starts_with("You are an expert JSON schema designer. You never omit"));
        assert!(prompt.contains("- Return only JSON."));
    }

    #[test]
    fn test_context_items_keep_order_and_merge() {
        let prompt = PromptBuilder::new()
            .context_item("Difficulty Level", "A1")
            .context_item("Module", "Greetings")
            .context_item("Topic", "Hello")
            .build();

        assert_eq!(prompt, "Difficulty Level: A1\nModule: Greetings\nTopic: Hello");
    }

    #[test]
    fn test_checklist_numbering() {
        let prompt = PromptBuilder::new()
            .checklist("REQUIREMENTS:", &["First", "Second"])
            .build();

        assert!(prompt.contains("REQUIREMENTS:\n1. First\n2. Second"));
    }

    #[test]
    fn test_code_block() {
        let prompt = PromptBuilder::new()
            .section("Schema:", "Follow it exactly.")
            .code("json", "{}")
            .build();

        assert!(prompt.contains("Schema:\n\nFollow it exactly."));
        assert!(prompt.ends_with("```json\n{}\n```"));
    }
}
