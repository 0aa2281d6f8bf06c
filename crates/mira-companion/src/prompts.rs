use mira_patterns::LocalClock;
use mira_patterns::calendar::weekday_name;
use mira_patterns::summary::truncate_chars;
use mira_types::api::DreamAnalysis;
use mira_types::{Dream, Message, MoodEntry};

pub const COMPANION_SYSTEM: &str =
    "You are MIRA, a warm and caring AI companion. Keep responses short and supportive.";

pub const DREAM_SYSTEM: &str = "You are MIRA, a dream analyst. Analyse the dream and return ONLY a JSON object with themes (array of 2-3 words) and interpretation (one sentence). Example: {\"themes\": [\"Water\", \"Fear\"], \"interpretation\": \"This dream reflects hidden emotions.\"}";

const FALLBACK_THEME: &str = "Dream";
const FALLBACK_INTERPRETATION: &str = "A meaningful dream worth reflecting on.";

pub fn dream_fallback() -> DreamAnalysis {
    DreamAnalysis {
        themes: vec![FALLBACK_THEME.to_string()],
        interpretation: FALLBACK_INTERPRETATION.to_string(),
    }
}

/// Reads the analyst's JSON reply, or the fallback for anything else.
pub fn parse_dream_analysis(reply: &str) -> DreamAnalysis {
    serde_json::from_str(reply.trim()).unwrap_or_else(|_| dream_fallback())
}

pub const REVEAL_MESSAGES: usize = 25;
pub const REVEAL_DREAMS: usize = 5;
pub const REVEAL_MOODS: usize = 14;

/// Asks for a short portrait of the user plus one concrete pattern.
///
/// Inputs are newest first; only the most recent of each kind are used.
pub fn reveal_prompt(
    user_messages: &[Message],
    dreams: &[Dream],
    moods: &[MoodEntry],
    clock: &LocalClock,
) -> String {
    let messages = user_messages
        .iter()
        .take(REVEAL_MESSAGES)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(". ");
    let dreams = dreams
        .iter()
        .take(REVEAL_DREAMS)
        .map(|d| d.dream_text.as_str())
        .collect::<Vec<_>>()
        .join(". ");
    let moods = moods
        .iter()
        .take(REVEAL_MOODS)
        .map(|m| format!("{} on {}", m.mood, weekday_name(clock.weekday(m.created_at))))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are MIRA, analysing someone's life patterns deeply.

Their recent messages: "{messages}"
Their dreams: "{dreams}"
Their moods by day: "{moods}"

Give TWO things in this exact format:

SUMMARY: A warm 2-3 sentence overview of who this person is based on what they share. Start with "From our conversations..." Be personal and caring.

INSIGHT: One specific pattern you notice. Start with "I've noticed..." Be very specific - mention names, days, topics, frequencies. Max 2 sentences."#
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealInsight {
    pub summary: Option<String>,
    pub insight: Option<String>,
}

pub fn parse_reveal(reply: &str) -> RevealInsight {
    let (head, tail) = match reply.split_once("INSIGHT:") {
        Some((head, tail)) => (head, Some(tail)),
        None => (reply, None),
    };
    let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

    RevealInsight {
        summary: non_empty(head.replacen("SUMMARY:", "", 1).as_str()),
        insight: tail.and_then(non_empty),
    }
}

/// Conversations shorter than this are not worth reminiscing about.
const REMEMBERS_MIN_MESSAGES: usize = 5;
const HIGHLIGHT_MIN_CHARS: usize = 50;
const HIGHLIGHT_MAX: usize = 10;
const HIGHLIGHT_QUOTE_CHARS: usize = 150;
pub const REMEMBERS_LINES: usize = 3;

/// Prompt for "MIRA remembers", built from the user's most recent messages.
///
/// `None` when there are too few messages or none long enough to quote.
pub fn remembers_prompt(recent_user_messages: &[Message]) -> Option<String> {
    if recent_user_messages.len() <= REMEMBERS_MIN_MESSAGES {
        return None;
    }

    let highlights: Vec<String> = recent_user_messages
        .iter()
        .filter(|m| m.content.chars().count() > HIGHLIGHT_MIN_CHARS)
        .take(HIGHLIGHT_MAX)
        .map(|m| format!("\"{}\"", truncate_chars(&m.content, HIGHLIGHT_QUOTE_CHARS)))
        .collect();
    if highlights.is_empty() {
        return None;
    }

    Some(format!(
        r#"You are MIRA, looking back at meaningful moments from someone's conversations. Pick 3 touching or significant moments and write them as memories.

Their messages: {}

Write exactly 3 memories, each starting with "I remember when you..."
Keep each one short (1-2 sentences max).
Be warm and personal.
Format: Just the 3 memories, one per line, nothing else."#,
        highlights.join(", ")
    ))
}

/// First three non-blank lines of the reply.
pub fn parse_remembers(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(REMEMBERS_LINES)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mira_types::Role;
    use uuid::Uuid;

    fn user_msg(content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn dream_reply_parses_when_well_formed() {
        let reply = r#" {"themes": ["Water", "Fear"], "interpretation": "Hidden emotions."} "#;
        let analysis = parse_dream_analysis(reply);
        assert_eq!(analysis.themes, ["Water", "Fear"]);
        assert_eq!(analysis.interpretation, "Hidden emotions.");
    }

    #[test]
    fn anything_else_becomes_the_fallback() {
        let replies = [
            "",
            "Sure! Here is the analysis",
            "{}",
            "{\"themes\": 3}",
            "```json\n{}\n```",
        ];
        for reply in replies {
            let analysis = parse_dream_analysis(reply);
            assert_eq!(analysis.themes, ["Dream"]);
            assert_eq!(analysis.interpretation, "A meaningful dream worth reflecting on.");
        }
    }

    #[test]
    fn reveal_reply_is_split_on_insight() {
        let parsed = parse_reveal(
            "SUMMARY: From our conversations, you care.\n\nINSIGHT: I've noticed Mondays.",
        );
        assert_eq!(parsed.summary.as_deref(), Some("From our conversations, you care."));
        assert_eq!(parsed.insight.as_deref(), Some("I've noticed Mondays."));

        let no_insight = parse_reveal("Just a summary");
        assert_eq!(no_insight.summary.as_deref(), Some("Just a summary"));
        assert_eq!(no_insight.insight, None);
    }

    #[test]
    fn reveal_prompt_lists_moods_by_weekday() {
        let mood = MoodEntry {
            id: Uuid::new_v4(),
            mood: "Calm".into(),
            color: "#c084fc".into(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap(),
        };
        let messages = [user_msg("hello"), user_msg("again")];
        let prompt = reveal_prompt(&messages, &[], &[mood], &LocalClock::utc());
        assert!(prompt.contains(r#"Their recent messages: "hello. again""#));
        assert!(prompt.contains(r#"Their moods by day: "Calm on Sunday""#));
    }

    #[test]
    fn remembers_needs_enough_long_messages() {
        let long = "a".repeat(200);
        let few: Vec<Message> = (0..5).map(|_| user_msg(&long)).collect();
        assert_eq!(remembers_prompt(&few), None);

        let short: Vec<Message> = (0..8).map(|_| user_msg("short one")).collect();
        assert_eq!(remembers_prompt(&short), None);

        let many: Vec<Message> = (0..12).map(|_| user_msg(&long)).collect();
        let prompt = remembers_prompt(&many).unwrap();
        let quote = format!("\"{}\"", "a".repeat(150));
        assert_eq!(prompt.matches(&quote).count(), 10);
    }

    #[test]
    fn remembers_keeps_three_lines() {
        let reply = "I remember when you one\n\n  I remember when you two  \n\
                     I remember when you three\nextra";
        assert_eq!(
            parse_remembers(reply),
            ["I remember when you one", "I remember when you two", "I remember when you three"]
        );
    }
}
