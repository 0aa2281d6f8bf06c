use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::catalog::{self, Category};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<&'static str>,
}

struct Entry {
    name: String,
    color: Option<&'static str>,
    emoji: Option<&'static str>,
    patterns: Vec<Regex>,
}

/// Counts whole-word, case-insensitive keyword hits per category.
pub struct Classifier {
    entries: Vec<Entry>,
}

impl Entry {
    fn hits(&self, text: &str) -> usize {
        self.patterns.iter().map(|re| re.find_iter(text).count()).sum()
    }
}

fn whole_word(keyword: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
}

impl Classifier {
    pub fn new(categories: &[Category]) -> Result<Self, regex::Error> {
        let entries = categories
            .iter()
            .map(|c| {
                Ok(Entry {
                    name: c.name.to_string(),
                    color: c.color,
                    emoji: c.emoji,
                    patterns: c
                        .keywords
                        .iter()
                        .map(|kw| whole_word(kw))
                        .collect::<Result<_, _>>()?,
                })
            })
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { entries })
    }

    /// One category per word, named after the capitalised word.
    pub fn from_words(words: &[&str]) -> Result<Self, regex::Error> {
        let entries = words
            .iter()
            .map(|w| {
                Ok(Entry {
                    name: catalog::display_name(w),
                    color: None,
                    emoji: None,
                    patterns: vec![whole_word(w)?],
                })
            })
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { entries })
    }

    /// Categories with at least one hit, most hits first. Ties keep catalog order.
    pub fn classify(&self, text: &str) -> Vec<CategoryCount> {
        let mut counts: Vec<CategoryCount> = self
            .entries
            .iter()
            .map(|e| CategoryCount {
                name: e.name.clone(),
                count: e.hits(text),
                color: e.color,
                emoji: e.emoji,
            })
            .filter(|c| c.count > 0)
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    /// Hits for every category in catalog order, zeros included.
    pub fn count_each(&self, text: &str) -> Vec<usize> {
        self.entries.iter().map(|e| e.hits(text)).collect()
    }

    pub fn top(&self, text: &str, n: usize) -> Vec<CategoryCount> {
        let mut counts = self.classify(text);
        counts.truncate(n);
        counts
    }
}

/// Non-overlapping whole-word, case-insensitive occurrences of `keyword`.
/// Compiles the pattern on every call; prefer a [`Classifier`] in loops.
pub fn count_whole_word(text: &str, keyword: &str) -> usize {
    match whole_word(keyword) {
        Ok(re) => re.find_iter(text).count(),
        Err(_) => 0,
    }
}

pub static REVEAL_TOPICS: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(catalog::REVEAL_TOPICS).expect("reveal topic keywords compile")
});

pub static WRAPPED_TOPICS: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(catalog::WRAPPED_TOPICS).expect("wrapped topic keywords compile")
});

pub static PEOPLE: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::from_words(catalog::PEOPLE).expect("people keywords compile")
});

pub static DREAM_THEMES: LazyLock<Classifier> = LazyLock::new(|| {
    Classifier::new(catalog::DREAM_THEMES).expect("dream theme keywords compile")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_inside_longer_word_does_not_count() {
        assert_eq!(count_whole_word("networking all day", "work"), 0);
        assert_eq!(count_whole_word("Work, work and more WORK.", "work"), 3);
    }

    #[test]
    fn multi_word_keywords_match_as_phrases() {
        assert_eq!(count_whole_word("I was running away again", "running away"), 1);
        assert_eq!(count_whole_word("I can't find my keys", "can't find"), 1);
    }

    #[test]
    fn keyword_metacharacters_are_literal() {
        assert_eq!(count_whole_word("a.b axb", "a.b"), 1);
    }

    #[test]
    fn falling_and_flying_dream() {
        let themes = DREAM_THEMES.classify("I was falling and then flying");
        let pairs: Vec<(&str, usize)> = themes.iter().map(|t| (t.name.as_str(), t.count)).collect();
        assert_eq!(pairs, [("Falling", 1), ("Flying", 1)]);
    }

    #[test]
    fn zero_counts_dropped_and_sorted_descending() {
        let topics = WRAPPED_TOPICS.classify("my boss, my job, my gym");
        let names: Vec<&str> = topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Work", "Health"]);
        assert_eq!(topics[0].count, 2);
    }

    #[test]
    fn ties_keep_catalog_order_and_top_truncates() {
        let topics = WRAPPED_TOPICS.top("money love work family", 3);
        let names: Vec<&str> = topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Work", "Love", "Family"]);
    }

    #[test]
    fn people_names_are_capitalised() {
        let people = PEOPLE.classify("called mum, then Mum again, saw James");
        assert_eq!(people[0].name, "Mum");
        assert_eq!(people[0].count, 2);
        assert_eq!(people[1].name, "James");
        assert_eq!(people[1].count, 1);
    }

    #[test]
    fn count_each_keeps_every_category_in_catalog_order() {
        let counts = PEOPLE.count_each("called mum, then Mum again, saw James");
        assert_eq!(counts.len(), catalog::PEOPLE.len());

        let at = |word: &str| catalog::PEOPLE.iter().position(|w| *w == word).unwrap();
        assert_eq!(counts[at("mum")], 2);
        assert_eq!(counts[at("james")], 1);
        assert_eq!(counts.iter().sum::<usize>(), 3);
    }

    #[test]
    fn reveal_topics_carry_presentation_fields() {
        let topics = REVEAL_TOPICS.classify("meeting about the project");
        assert_eq!(topics[0].name, "Work");
        assert_eq!(topics[0].count, 2);
        assert_eq!(topics[0].color, Some("#a855f7"));
        assert!(topics[0].emoji.is_some());
    }
}
