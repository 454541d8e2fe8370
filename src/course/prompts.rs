//! Generation prompts for schema synthesis and lesson content.

use super::outline::Level;
use crate::ai::PromptBuilder;

pub fn schema_system() -> String {
    PromptBuilder::new()
        .role(
            "JSON schema designer with perfect attention to detail",
            &[
                "Your task is to create JSON schemas that EXACTLY match the structure specified in prompts.",
                "You carefully extract ALL headings, subheadings, and structural elements from prompts and convert them into corresponding JSON schema properties.",
                "You are especially skilled at identifying structured content like tables and lists and representing them appropriately in the schema.",
                "You never add generic properties that aren't mentioned in the prompt.",
                "You never omit any sections mentioned in the prompt.",
                "You return only valid JSON schema without any explanations.",
            ],
        )
        .build()
}

pub fn schema_user(general_prompt: &str) -> String {
    PromptBuilder::new()
        .text(
            "You are tasked with creating a comprehensive JSON schema for a language learning course. \
             Your schema MUST EXACTLY match the structure specified in the prompt below.",
        )
        .rules(&[
            "Extract ALL headings, subheadings, sections, and structural elements from the prompt.",
            "Each heading and subheading in the prompt MUST become a property or nested object in your schema.",
            "If a section contains tables or lists, structure them as arrays of objects.",
            "Do not add generic properties that aren't mentioned in the prompt.",
            "Do not omit any sections mentioned in the prompt.",
        ])
        .section("Here is the prompt:", general_prompt)
        .build()
}

/// General prompt extended with the level-specific content request
pub fn topic_prompt(general_prompt: &str, level: Level) -> String {
    format!(
        "{}\n\nCreate COMPREHENSIVE educational content for {} level learners.\n\
         Ensure the content is immediately usable by students and contains detailed explanations, examples, and exercises.",
        general_prompt, level
    )
}

pub fn content_system() -> String {
    PromptBuilder::new()
        .role(
            "content creator for language learning courses",
            &[
                "You must generate content that EXACTLY follows the provided JSON schema structure.",
                "Every property in the schema must be included in your response with appropriate values.",
                "Populate every section with comprehensive educational content.",
                "For table-structured data (like vocabulary lists), format them as arrays of objects with all required properties.",
                "Do not add properties that aren't in the schema.",
                "Do not omit any properties from the schema.",
                "Return only valid JSON that matches the schema structure.",
            ],
        )
        .build()
}

pub fn content_user(
    enhanced_prompt: &str,
    schema_json: &str,
    level: Level,
    module: &str,
    topic: &str,
) -> String {
    PromptBuilder::new()
        .section(
            "Create detailed educational content for a language learning course with the following details:",
            enhanced_prompt,
        )
        .context_item("Difficulty Level", level.as_str())
        .context_item("Module", module)
        .context_item("Topic", topic)
        .section("You MUST follow this exact JSON schema structure:", schema_json)
        .checklist(
            "IMPORTANT REQUIREMENTS:",
            &[
                "Include ALL properties from the schema",
                "Populate ALL sections with comprehensive educational content",
                "Include all subsections of every section",
                "For table-like sections, create complete lists of uniform objects",
                "Include practical exercises with clear instructions and examples",
                "Ensure your response is valid JSON",
                "Include the metadata fields 'lessonTitle', 'difficultyLevel', and 'moduleTitle'",
            ],
        )
        .build()
}
