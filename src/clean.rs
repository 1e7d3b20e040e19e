//! Passage text normalization.
//!
//! The visible text of a passage container carries page furniture: a
//! "Read full chapter" link, a cross-reference section, a "... in all Spanish
//! translations" comparison link, a leading verse number and inline footnote
//! markers like `(A)`. Each is removed by one named [`CleaningRule`]; the rules
//! run in a fixed order.
//!
//! | Order | Rule | Verse | Chapter |
//! |-------|------|:-----:|:-------:|
//! | 1 | `read-full-chapter` | ✓ | ✓ |
//! | 2 | `cross-references` | ✓ | ✓ |
//! | 3 | `translation-comparison` | ✓ | ✓ |
//! | 4 | `verse-number` | ✓ | |
//! | 5 | `footnote-markers` | ✓ | ✓ |
//! | 6 | `trim` | ✓ | ✓ |
//!
//! [`clean_verse`] and [`clean_chapter`] re-run their chain until the text
//! stops changing, so cleaning already-clean text is a no-op.

use regex::Regex;
use std::sync::LazyLock;

static READ_FULL_CHAPTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)read full chapter").unwrap());

static CROSS_REFERENCES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)cross references").unwrap());

static TRANSLATION_COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\d+\s+)?\S+\s+\d+:\d+\s+in all spanish translations").unwrap()
});

// Whitespace is required after the digits so numbers inside the verse
// ("42.360") survive repeated passes.
static VERSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s+").unwrap());

// Case-sensitive: markers are always a single capital letter.
static FOOTNOTE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([A-Z]\)").unwrap());

/// A pure text transform. Every rule only ever deletes text.
#[derive(Clone, Copy)]
pub struct CleaningRule {
    pub name: &'static str,
    apply: fn(&str) -> String,
}

impl CleaningRule {
    pub fn apply(&self, text: &str) -> String {
        (self.apply)(text)
    }
}

impl std::fmt::Debug for CleaningRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleaningRule")
            .field("name", &self.name)
            .finish()
    }
}

pub const READ_FULL_CHAPTER_RULE: CleaningRule = CleaningRule {
    name: "read-full-chapter",
    apply: truncate_read_full_chapter,
};

pub const CROSS_REFERENCES_RULE: CleaningRule = CleaningRule {
    name: "cross-references",
    apply: truncate_cross_references,
};

pub const TRANSLATION_COMPARISON_RULE: CleaningRule = CleaningRule {
    name: "translation-comparison",
    apply: truncate_translation_comparison,
};

pub const VERSE_NUMBER_RULE: CleaningRule = CleaningRule {
    name: "verse-number",
    apply: strip_verse_number,
};

pub const FOOTNOTE_MARKERS_RULE: CleaningRule = CleaningRule {
    name: "footnote-markers",
    apply: strip_footnote_markers,
};

pub const TRIM_RULE: CleaningRule = CleaningRule {
    name: "trim",
    apply: trim,
};

pub const VERSE_RULES: &[CleaningRule] = &[
    READ_FULL_CHAPTER_RULE,
    CROSS_REFERENCES_RULE,
    TRANSLATION_COMPARISON_RULE,
    VERSE_NUMBER_RULE,
    FOOTNOTE_MARKERS_RULE,
    TRIM_RULE,
];

pub const CHAPTER_RULES: &[CleaningRule] = &[
    READ_FULL_CHAPTER_RULE,
    CROSS_REFERENCES_RULE,
    TRANSLATION_COMPARISON_RULE,
    FOOTNOTE_MARKERS_RULE,
    TRIM_RULE,
];

fn truncate_at(re: &Regex, text: &str) -> String {
    match re.find(text) {
        Some(m) => text[..m.start()].to_string(),
        None => text.to_string(),
    }
}

/// Drop everything from the first "Read full chapter" onward.
pub fn truncate_read_full_chapter(text: &str) -> String {
    truncate_at(&READ_FULL_CHAPTER, text)
}

/// Drop everything from the first "Cross references" onward.
pub fn truncate_cross_references(text: &str) -> String {
    truncate_at(&CROSS_REFERENCES, text)
}

/// Drop everything from a "<Book> <c>:<v> in all Spanish translations" link onward.
pub fn truncate_translation_comparison(text: &str) -> String {
    truncate_at(&TRANSLATION_COMPARISON, text)
}

/// Remove one leading verse number and the whitespace after it.
pub fn strip_verse_number(text: &str) -> String {
    VERSE_NUMBER.replace(text, "").into_owned()
}

/// Remove inline markers such as `(A)`.
pub fn strip_footnote_markers(text: &str) -> String {
    FOOTNOTE_MARKER.replace_all(text, "").into_owned()
}

pub fn trim(text: &str) -> String {
    text.trim().to_string()
}

/// Run each rule once, in order.
pub fn apply_rules(rules: &[CleaningRule], text: &str) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

/// Run the chain until the text stops changing.
///
/// Terminates because rules only delete: any pass that changes the text
/// makes it strictly shorter.
pub fn clean_with(rules: &[CleaningRule], text: &str) -> String {
    let mut current = apply_rules(rules, text);
    loop {
        let next = apply_rules(rules, &current);
        if next == current {
            return current;
        }
        current = next;
    }
}

pub fn clean_verse(text: &str) -> String {
    clean_with(VERSE_RULES, text)
}

pub fn clean_chapter(text: &str) -> String {
    clean_with(CHAPTER_RULES, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_full_chapter_truncates_rest() {
        let out = truncate_read_full_chapter("Texto. Read full chapter\nJuan 3 more");
        assert_eq!(out, "Texto. ");
        assert_eq!(truncate_read_full_chapter("a READ FULL CHAPTER b"), "a ");
    }

    #[test]
    fn test_cross_references_truncates_rest() {
        let out = truncate_cross_references("Texto.\n\nCross references:\nA. Juan 1:1");
        assert_eq!(out, "Texto.\n\n");
    }

    #[test]
    fn test_translation_comparison_any_book() {
        let out = truncate_translation_comparison("Texto. Mateo 5:3 in all Spanish translations");
        assert_eq!(out, "Texto. ");
        let out = truncate_translation_comparison("Texto. Juan 3:16 IN ALL SPANISH TRANSLATIONS x");
        assert_eq!(out, "Texto. ");
    }

    #[test]
    fn test_translation_comparison_numbered_book() {
        let raw = "Dios es amor. 1 Juan 4:8 in all Spanish translations";
        assert_eq!(truncate_translation_comparison(raw), "Dios es amor. ");
        assert_eq!(clean_verse(raw), "Dios es amor.");
    }

    #[test]
    fn test_strip_verse_number_only_leading() {
        assert_eq!(strip_verse_number("16 Porque de tal"), "Porque de tal");
        assert_eq!(strip_verse_number("Porque 16 de tal"), "Porque 16 de tal");
        assert_eq!(strip_verse_number("16\n\tPorque"), "Porque");
        assert_eq!(strip_verse_number("42.360 personas"), "42.360 personas");
    }

    #[test]
    fn test_numbers_inside_verse_survive() {
        assert_eq!(
            clean_verse("64 42.360 personas en total"),
            "42.360 personas en total"
        );
        assert_eq!(clean_verse("7 3,5 años"), "3,5 años");
    }

    #[test]
    fn test_strip_footnote_markers() {
        let out = strip_footnote_markers("In the beginning (A) God created");
        assert!(!out.contains("(A)"));
        assert_eq!(out, "In the beginning  God created");
        // Lowercase and multi-letter parentheticals are content, not markers.
        assert_eq!(strip_footnote_markers("(a) (AB)"), "(a) (AB)");
    }

    #[test]
    fn test_verse_chain_on_fixture_text() {
        let raw = "16 Porque de tal manera amó Dios... (A) Read full chapter";
        assert_eq!(clean_verse(raw), "Porque de tal manera amó Dios...");
    }

    #[test]
    fn test_chapter_chain_keeps_verse_numbers() {
        let raw = "1 En el principio (A) creó Dios.\n2 Y la tierra... Cross references\nA. Juan 1:1";
        assert_eq!(
            clean_chapter(raw),
            "1 En el principio  creó Dios.\n2 Y la tierra..."
        );
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let names: Vec<&str> = VERSE_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            [
                "read-full-chapter",
                "cross-references",
                "translation-comparison",
                "verse-number",
                "footnote-markers",
                "trim"
            ]
        );
        assert!(!CHAPTER_RULES.iter().any(|r| r.name == "verse-number"));
    }

    #[test]
    fn test_marker_hiding_trailer_is_still_removed() {
        // Removing "(B)" exposes a trailer that the first pass could not see.
        let raw = "Texto Read full (B)chapter tail";
        let out = clean_verse(raw);
        assert_eq!(out, "Texto");
        assert_eq!(clean_verse(&out), out);
    }

    proptest! {
        #[test]
        fn prop_verse_cleaning_is_idempotent(s in "\\PC{0,80}") {
            let once = clean_verse(&s);
            prop_assert_eq!(clean_verse(&once), once);
        }

        #[test]
        fn prop_chapter_cleaning_is_idempotent(s in "[0-9A-Za-z():\\s]{0,80}") {
            let once = clean_chapter(&s);
            prop_assert_eq!(clean_chapter(&once), once);
        }

        #[test]
        fn prop_no_trailer_survives(prefix in "[a-z ]{0,20}", suffix in "\\PC{0,20}") {
            let raw = format!("{}Read full chapter{}", prefix, suffix);
            let out = clean_verse(&raw);
            prop_assert!(!out.to_lowercase().contains("read full chapter"));
        }
    }
}
