//! Hotword correction: user-defined literal replacements applied to the raw
//! transcript before any LLM pass. Rules run in configuration order and match
//! case-insensitively, so "vox dee" can be normalized to "voxd" no matter how
//! the recognizer cased it.

use crate::config::HotwordRule;

// ---------------------------------------------------------------------------
// HotwordCorrector
// ---------------------------------------------------------------------------

/// Applies an ordered list of case-insensitive literal replacements.
pub struct HotwordCorrector {
    rules: Vec<HotwordRule>,
}

impl HotwordCorrector {
    pub fn new(rules: Vec<HotwordRule>) -> Self {
        Self { rules }
    }

    /// Apply every rule in order. Empty input and an empty rule list are
    /// both passthrough.
    pub fn apply(&self, text: &str) -> String {
        let mut result = text.to_owned();
        for rule in &self.rules {
            if rule.pattern.is_empty() {
                continue;
            }
            result = replace_case_insensitive(&result, &rule.pattern, &rule.replacement);
        }
        result
    }
}

/// Replace every case-insensitive occurrence of `pattern` in `text`.
///
/// Matching is done on the lowercased haystack but the replacement splices
/// into the original string, so unmatched text keeps its casing. Lowercasing
/// is length-preserving for the ASCII and CJK text this runs on.
fn replace_case_insensitive(text: &str, pattern: &str, replacement: &str) -> String {
    // Exotic casings (ß, İ, the Kelvin sign) change a char's byte length when
    // lowercased, so offsets into the lowercased haystack would not be char
    // boundaries of the original — even when the total length happens to come
    // out equal. Match exactly whenever any single char shifts.
    let misaligned = text
        .chars()
        .any(|c| c.to_lowercase().map(char::len_utf8).sum::<usize>() != c.len_utf8());
    if misaligned {
        return text.replace(pattern, replacement);
    }

    let haystack = text.to_lowercase();
    let needle = pattern.to_lowercase();

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(offset) = haystack[cursor..].find(&needle) {
        let start = cursor + offset;
        result.push_str(&text[cursor..start]);
        result.push_str(replacement);
        cursor = start + needle.len();
    }
    result.push_str(&text[cursor..]);
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, replacement: &str) -> HotwordRule {
        HotwordRule {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    #[test]
    fn replaces_all_occurrences_case_insensitively() {
        let corrector = HotwordCorrector::new(vec![rule("vox dee", "voxd")]);
        assert_eq!(
            corrector.apply("Vox Dee is great, I said VOX DEE"),
            "voxd is great, I said voxd"
        );
    }

    #[test]
    fn unmatched_text_keeps_its_casing() {
        let corrector = HotwordCorrector::new(vec![rule("sse", "SSE")]);
        assert_eq!(corrector.apply("the sse Stream"), "the SSE Stream");
    }

    #[test]
    fn rules_apply_in_configuration_order() {
        let corrector = HotwordCorrector::new(vec![rule("cat", "dog"), rule("dog", "bird")]);
        // The first rule's output is visible to the second.
        assert_eq!(corrector.apply("cat"), "bird");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let corrector = HotwordCorrector::new(vec![rule("a", "b")]);
        assert_eq!(corrector.apply(""), "");
    }

    #[test]
    fn no_rules_is_passthrough() {
        let corrector = HotwordCorrector::new(Vec::new());
        assert_eq!(corrector.apply("unchanged Text"), "unchanged Text");
    }

    #[test]
    fn empty_pattern_is_ignored() {
        let corrector = HotwordCorrector::new(vec![rule("", "x")]);
        assert_eq!(corrector.apply("safe"), "safe");
    }

    #[test]
    fn length_shifting_casings_fall_back_to_exact_matching() {
        // U+0130 grows and U+212A shrinks when lowercased; the two can cancel
        // out in total length while still misaligning every later offset.
        let corrector = HotwordCorrector::new(vec![rule("k", "x")]);
        assert_eq!(
            corrector.apply("\u{130}\u{130}\u{212A}"),
            "\u{130}\u{130}\u{212A}"
        );
        // The fallback still replaces exact occurrences.
        assert_eq!(corrector.apply("\u{212A}k"), "\u{212A}x");
    }

    #[test]
    fn handles_cjk_text() {
        let corrector = HotwordCorrector::new(vec![rule("大黄", "voxd")]);
        assert_eq!(corrector.apply("大黄你好"), "voxd你好");
    }
}
