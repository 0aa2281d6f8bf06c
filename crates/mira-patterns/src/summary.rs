use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use mira_types::{Dream, Message, Mood, MoodEntry};

use crate::calendar::{self, LocalClock};
use crate::catalog;
use crate::classifier::{self, CategoryCount};
use crate::tally::Tally;

/// Wrapped recaps show this many topics.
pub const WRAPPED_TOP_TOPICS: usize = 3;
/// Reveal lists at most this many people.
pub const REVEAL_TOP_PEOPLE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodCount {
    pub mood: String,
    pub color: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrappedKind {
    Monthly,
    Yearly,
}

/// Flat recap of one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WrappedSummary {
    pub total_messages: u64,
    pub total_moods: u64,
    pub total_dreams: u64,
    pub top_mood: Option<MoodCount>,
    pub top_person: Option<TopEntry>,
    pub top_day: Option<TopEntry>,
    pub top_topics: Vec<CategoryCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_month: Option<TopEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mood_breakdown: Vec<MoodCount>,
}

/// Records of one window, already fetched.
pub struct WindowData<'a> {
    /// User-authored messages in the window.
    pub messages: &'a [Message],
    pub moods: &'a [MoodEntry],
    pub dream_count: u64,
}

pub fn compose_wrapped(
    kind: WrappedKind,
    data: &WindowData<'_>,
    clock: &LocalClock,
) -> WrappedSummary {
    let text = joined_text(data.messages.iter().map(|m| m.content.as_str()));

    let moods: Tally<&str> = data.moods.iter().map(|m| m.mood.as_str()).collect();
    let days: Tally<&'static str> = data
        .messages
        .iter()
        .map(|m| calendar::weekday_name(clock.weekday(m.created_at)))
        .collect();

    let top_person = classifier::PEOPLE
        .top(&text, 1)
        .into_iter()
        .next()
        .map(|p| TopEntry {
            name: p.name,
            count: p.count,
        });

    let mut summary = WrappedSummary {
        total_messages: data.messages.len() as u64,
        total_moods: data.moods.len() as u64,
        total_dreams: data.dream_count,
        top_mood: moods.mode().map(|(mood, count)| palette_count(mood, count)),
        top_person,
        top_day: top_entry(&days),
        top_topics: classifier::WRAPPED_TOPICS.top(&text, WRAPPED_TOP_TOPICS),
        top_month: None,
        mood_breakdown: Vec::new(),
    };

    if kind == WrappedKind::Yearly {
        let months: Tally<&'static str> = data
            .messages
            .iter()
            .map(|m| calendar::month_name(clock.local_date(m.created_at).month()))
            .collect();
        summary.top_month = top_entry(&months);
        summary.mood_breakdown = mood_breakdown(&moods);
    }

    summary
}

fn top_entry(tally: &Tally<&'static str>) -> Option<TopEntry> {
    tally.mode().map(|(name, count)| TopEntry {
        name: name.to_string(),
        count,
    })
}

fn palette_count(mood: &str, count: usize) -> MoodCount {
    MoodCount {
        mood: mood.to_string(),
        color: Mood::color_for_label(mood).to_string(),
        count,
    }
}

/// Every mood in the tally, most frequent first, with palette colors.
pub fn mood_breakdown(moods: &Tally<&str>) -> Vec<MoodCount> {
    moods
        .sorted()
        .into_iter()
        .map(|(mood, count)| palette_count(mood, count))
        .collect()
}

/// Per-mood counts using the color stored with the first entry of each mood.
pub fn stored_color_counts(entries: &[MoodEntry]) -> Vec<MoodCount> {
    let tally: Tally<&str> = entries.iter().map(|m| m.mood.as_str()).collect();
    tally
        .sorted()
        .into_iter()
        .map(|(mood, count)| MoodCount {
            mood: mood.to_string(),
            color: entries
                .iter()
                .find(|e| e.mood == mood)
                .map(|e| e.color.clone())
                .unwrap_or_else(|| Mood::color_for_label(mood).to_string()),
            count,
        })
        .collect()
}

/// Most frequent mood among `entries`, ties to the first seen.
pub fn dominant_mood(entries: &[MoodEntry]) -> Option<MoodCount> {
    stored_color_counts(entries).into_iter().next()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonPattern {
    pub name: String,
    pub count: usize,
    /// Weekday this person comes up on most, when it happened at least twice.
    pub top_day: Option<String>,
    pub recent_context: String,
}

#[derive(Default)]
struct Mentions<'a> {
    count: usize,
    days: Tally<&'static str>,
    /// First hit in input order, i.e. the newest.
    recent: Option<&'a Message>,
}

/// People mentioned across `messages` (newest first), most mentioned first.
pub fn people_patterns(messages: &[Message], clock: &LocalClock) -> Vec<PersonPattern> {
    let mut mentions: Vec<Mentions> = catalog::PEOPLE
        .iter()
        .map(|_| Mentions::default())
        .collect();

    for msg in messages {
        let hits = classifier::PEOPLE.count_each(&msg.content);
        if hits.iter().all(|&n| n == 0) {
            continue;
        }
        let day = calendar::weekday_name(clock.weekday(msg.created_at));
        for (person, n) in mentions.iter_mut().zip(hits) {
            if n == 0 {
                continue;
            }
            person.count += n;
            person.days.add(day);
            person.recent.get_or_insert(msg);
        }
    }

    let mut patterns: Vec<PersonPattern> = catalog::PEOPLE
        .iter()
        .zip(mentions)
        .filter_map(|(word, person)| {
            let recent = person.recent?;
            let top_day = person
                .days
                .mode()
                .filter(|(_, n)| *n >= 2)
                .map(|(day, _)| day.to_string());

            Some(PersonPattern {
                name: catalog::display_name(word),
                count: person.count,
                top_day,
                recent_context: truncate_chars(&recent.content, 100),
            })
        })
        .collect();

    patterns.sort_by(|a, b| b.count.cmp(&a.count));
    patterns.truncate(REVEAL_TOP_PEOPLE);
    patterns
}

pub fn dream_themes(dreams: &[Dream]) -> Vec<CategoryCount> {
    let text = joined_text(dreams.iter().map(|d| d.dream_text.as_str()));
    classifier::DREAM_THEMES.classify(&text)
}

pub fn reveal_topics(messages: &[Message]) -> Vec<CategoryCount> {
    let text = joined_text(messages.iter().map(|m| m.content.as_str()));
    classifier::REVEAL_TOPICS.classify(&text)
}

/// How "complete" a user's picture is, 0 to 100.
pub fn progress_percent(user_messages: usize, moods: usize, dreams: usize) -> u8 {
    let points = user_messages * 2 + moods * 5 + dreams * 10;
    // round(points / 2) with halves rounding up
    ((points + 1) / 2).min(100) as u8
}

/// Lowercased contents joined with spaces.
pub fn joined_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Local-day label used to group history: "Sunday, 18 October 2026".
pub fn day_heading(ts: DateTime<Utc>, clock: &LocalClock) -> String {
    let date = clock.local_date(ts);
    format!(
        "{}, {} {} {}",
        calendar::weekday_name(date.weekday()),
        date.day(),
        calendar::month_name(date.month()),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use chrono::TimeZone;
    use mira_types::Role;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn msg(content: &str, created_at: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.to_string(),
            created_at,
        }
    }

    fn mood(label: &str, created_at: DateTime<Utc>) -> MoodEntry {
        MoodEntry {
            id: Uuid::new_v4(),
            mood: label.to_string(),
            color: Mood::color_for_label(label).to_string(),
            created_at,
        }
    }

    fn window<'a>(
        messages: &'a [Message],
        moods: &'a [MoodEntry],
        dream_count: u64,
    ) -> WindowData<'a> {
        WindowData {
            messages,
            moods,
            dream_count,
        }
    }

    #[test]
    fn monthly_top_mood_is_the_mode() {
        let moods = [
            mood("Happy", at(2026, 10, 2, 9)),
            mood("Sad", at(2026, 10, 3, 9)),
            mood("Happy", at(2026, 10, 5, 9)),
            mood("Happy", at(2026, 10, 9, 9)),
        ];
        let summary = compose_wrapped(
            WrappedKind::Monthly,
            &window(&[], &moods, 0),
            &LocalClock::utc(),
        );

        let top = summary.top_mood.unwrap();
        assert_eq!((top.mood.as_str(), top.count), ("Happy", 3));
        assert_eq!(top.color, "#f472b6");
        assert_eq!(summary.total_moods, 4);
        assert!(summary.mood_breakdown.is_empty());
    }

    #[test]
    fn people_ranked_by_mentions() {
        // 2026-10-12 is a Monday, 2026-10-14 a Wednesday.
        let messages = [
            msg("Had lunch with mum", at(2026, 10, 14, 12)),
            msg("Mum called, then James texted", at(2026, 10, 12, 18)),
        ];
        let clock = LocalClock::utc();

        let people = people_patterns(&messages, &clock);
        let ranked: Vec<(&str, usize)> = people
            .iter()
            .map(|p| (p.name.as_str(), p.count))
            .collect();
        assert_eq!(ranked, [("Mum", 2), ("James", 1)]);
        assert_eq!(people[0].recent_context, "Had lunch with mum");
        assert_eq!(people[0].top_day, None);

        let summary = compose_wrapped(
            WrappedKind::Monthly,
            &window(&messages, &[], 0),
            &clock,
        );
        let mum = TopEntry {
            name: "Mum".into(),
            count: 2,
        };
        assert_eq!(summary.top_person, Some(mum));
    }

    #[test]
    fn person_top_day_needs_two_mentions_on_that_day() {
        let messages = [
            msg("dad again", at(2026, 10, 12, 9)),
            msg("dad", at(2026, 10, 5, 9)),
        ];
        let people = people_patterns(&messages, &LocalClock::utc());
        assert_eq!(people[0].top_day.as_deref(), Some("Monday"));
    }

    #[test]
    fn people_patterns_scale_to_long_histories() {
        let messages: Vec<Message> = (0..3000)
            .map(|i| {
                let text = format!("talked to mum about work {i}");
                msg(&text, at(2026, 10, 12, 9))
            })
            .collect();

        let started = Instant::now();
        let people = people_patterns(&messages, &LocalClock::utc());
        assert!(started.elapsed() < Duration::from_secs(5));

        assert_eq!(people.len(), 1);
        assert_eq!(people[0].count, 3000);
        assert_eq!(people[0].top_day.as_deref(), Some("Monday"));
        assert_eq!(people[0].recent_context, "talked to mum about work 0");
    }

    #[test]
    fn yearly_adds_month_and_breakdown() {
        let messages = [
            msg("work work", at(2026, 3, 2, 9)),
            msg("my job", at(2026, 3, 9, 9)),
            msg("gym", at(2026, 5, 9, 9)),
        ];
        let moods = [
            mood("Calm", at(2026, 3, 2, 9)),
            mood("Tired", at(2026, 3, 3, 9)),
            mood("Tired", at(2026, 4, 3, 9)),
        ];
        let summary = compose_wrapped(
            WrappedKind::Yearly,
            &window(&messages, &moods, 2),
            &LocalClock::utc(),
        );

        let march = TopEntry {
            name: "March".into(),
            count: 2,
        };
        let monday = TopEntry {
            name: "Monday".into(),
            count: 2,
        };
        assert_eq!(summary.top_month, Some(march));
        assert_eq!(summary.top_day, Some(monday));
        assert_eq!(summary.total_dreams, 2);
        let breakdown: Vec<(&str, usize)> = summary
            .mood_breakdown
            .iter()
            .map(|m| (m.mood.as_str(), m.count))
            .collect();
        assert_eq!(breakdown, [("Tired", 2), ("Calm", 1)]);
        assert_eq!(summary.top_topics[0].name, "Work");
        assert_eq!(summary.top_topics[0].count, 3);
    }

    #[test]
    fn empty_window_yields_empty_summary() {
        let summary = compose_wrapped(
            WrappedKind::Yearly,
            &window(&[], &[], 0),
            &LocalClock::utc(),
        );
        assert_eq!(summary, WrappedSummary::default());
    }

    #[test]
    fn dream_theme_scenario() {
        let dreams = [Dream {
            id: Uuid::new_v4(),
            dream_text: "I was falling and then flying".into(),
            created_at: at(2026, 10, 1, 3),
        }];
        let themes = dream_themes(&dreams);
        assert_eq!(themes.len(), 2);
        assert!(themes.iter().all(|t| t.count == 1));
    }

    #[test]
    fn progress_is_capped() {
        assert_eq!(progress_percent(0, 0, 0), 0);
        assert_eq!(progress_percent(3, 1, 0), 6);
        assert_eq!(progress_percent(0, 1, 0), 3);
        assert_eq!(progress_percent(50, 20, 10), 100);
    }

    #[test]
    fn headings_and_truncation() {
        let heading = day_heading(at(2026, 10, 18, 9), &LocalClock::utc());
        assert_eq!(heading, "Sunday, 18 October 2026");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
    }
}
