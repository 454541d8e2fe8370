//! JSON Extraction and Repair
//!
//! Generation service replies are free text. This module pulls the JSON
//! payload out of them and, when asked, mends the usual defects:
//! - Markdown code fence wrapping (```json ... ```)
//! - Missing closing braces/brackets
//! - Trailing commas
//! - Truncated strings
//! - Control characters in strings
//! - JSON embedded in explanatory text

use serde_json::Value;
use tracing::{debug, warn};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

// =============================================================================
// Fence Extraction
// =============================================================================

/// Isolate the JSON payload of a reply.
///
/// - ```` ```json ```` present: text after it, up to the last ```` ``` ````
/// - otherwise any ```` ``` ````: text between the first and last fence
/// - otherwise the whole reply
///
/// A fence with no closing partner yields everything after it. The result is
/// trimmed.
pub fn extract_json_block(text: &str) -> &str {
    let (start, open_len) = match text.find(JSON_FENCE) {
        Some(pos) => (pos, JSON_FENCE.len()),
        None => match text.find(FENCE) {
            Some(pos) => (pos, FENCE.len()),
            None => return text.trim(),
        },
    };

    let body_start = start + open_len;
    let end = match text.rfind(FENCE) {
        Some(last) if last >= body_start => last,
        _ => text.len(),
    };

    text[body_start..end].trim()
}

// =============================================================================
// JsonRepairer
// =============================================================================

/// JSON repair strategies, tried with increasing aggressiveness
pub struct JsonRepairer {
    max_repair_attempts: usize,
}

impl Default for JsonRepairer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepairer {
    pub fn new() -> Self {
        Self {
            max_repair_attempts: 3,
        }
    }

    /// Parse JSON, attempting repair if the initial parse fails.
    ///
    /// Returns `(value, was_repaired)`, or `None` when nothing parses.
    pub fn parse_or_repair(&self, raw: &str) -> Option<(Value, bool)> {
        let cleaned = raw.trim().trim_start_matches('\u{feff}').trim();

        if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
            return Some((value, false));
        }

        debug!("Initial JSON parse failed, attempting repair");

        for attempt in 1..=self.max_repair_attempts {
            let repaired = self.repair_attempt(cleaned, attempt);

            if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                warn!("JSON repaired on attempt {}", attempt);
                return Some((value, true));
            }
        }

        // Prose around the payload
        if let Some(extracted) = self.extract_json_from_mixed(cleaned) {
            if let Ok(value) = serde_json::from_str::<Value>(extracted) {
                warn!("JSON extracted from mixed content");
                return Some((value, true));
            }
            let repaired = self.repair_attempt(extracted, self.max_repair_attempts);
            if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                warn!("JSON extracted from mixed content and repaired");
                return Some((value, true));
            }
        }

        None
    }

    fn repair_attempt(&self, s: &str, level: usize) -> String {
        match level {
            1 => self.balance_brackets(&self.fix_trailing_commas(s)),
            2 => self.balance_brackets(&self.fix_truncated_strings(&self.fix_trailing_commas(s))),
            _ => {
                let s = self.remove_control_chars(s);
                let s = self.fix_truncated_strings(&s);
                let s = self.balance_brackets(&s);
                // Closing may expose new trailing commas ("[1, 2,]")
                self.fix_trailing_commas(&s)
            }
        }
    }

    /// Drop commas directly followed (modulo whitespace) by `]` or `}`
    fn fix_trailing_commas(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len());
        let mut in_string = false;
        let mut escape = false;

        for (i, &ch) in chars.iter().enumerate() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                ',' if !in_string => {
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next, Some(']') | Some('}')) {
                        continue;
                    }
                }
                _ => {}
            }
            result.push(ch);
        }

        result
    }

    /// Close an open string, then every open container innermost first
    fn balance_brackets(&self, s: &str) -> String {
        let mut open = Vec::new();
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' if !in_string => open.push('}'),
                '[' if !in_string => open.push(']'),
                '}' | ']' if !in_string => {
                    if open.last() == Some(&ch) {
                        open.pop();
                    }
                }
                _ => {}
            }
        }

        let mut result = s.trim_end().to_string();
        if in_string {
            result.push('"');
        }
        while let Some(closer) = open.pop() {
            result.push(closer);
        }

        result
    }

    /// Close strings left open at a line break or at end of input
    fn fix_truncated_strings(&self, s: &str) -> String {
        let mut result = String::with_capacity(s.len() + 10);
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }

            match ch {
                '\\' if in_string => {
                    escape = true;
                    result.push(ch);
                }
                '"' => {
                    in_string = !in_string;
                    result.push(ch);
                }
                '\n' | '\r' if in_string => {
                    result.push('"');
                    in_string = false;
                    result.push(ch);
                }
                _ => result.push(ch),
            }
        }

        if in_string {
            result.push('"');
        }

        result
    }

    fn remove_control_chars(&self, s: &str) -> String {
        s.chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect()
    }

    /// Slice out the first balanced object or array (e.g. explanations around JSON)
    fn extract_json_from_mixed<'a>(&self, s: &'a str) -> Option<&'a str> {
        let start = s.find(['{', '['])?;

        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s[start..].char_indices() {
            if escape {
                escape = false;
                continue;
            }

            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' | '[' if !in_string => depth += 1,
                '}' | ']' if !in_string => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(&s[start..start + i + 1]);
                    }
                }
                _ => {}
            }
        }

        // Unbalanced: hand back the tail for the repair passes
        Some(&s[start..])
    }
}
