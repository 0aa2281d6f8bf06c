/// A named category matched by a fixed keyword list.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub color: Option<&'static str>,
    pub emoji: Option<&'static str>,
}

const fn topic(
    name: &'static str,
    keywords: &'static [&'static str],
    color: &'static str,
    emoji: &'static str,
) -> Category {
    Category {
        name,
        keywords,
        color: Some(color),
        emoji: Some(emoji),
    }
}

const fn plain(name: &'static str, keywords: &'static [&'static str]) -> Category {
    Category {
        name,
        keywords,
        color: None,
        emoji: None,
    }
}

const fn theme(
    name: &'static str,
    keywords: &'static [&'static str],
    emoji: &'static str,
) -> Category {
    Category {
        name,
        keywords,
        color: None,
        emoji: Some(emoji),
    }
}

/// Topics shown on the Reveal view.
pub static REVEAL_TOPICS: &[Category] = &[
    topic(
        "Work",
        &["work", "job", "boss", "office", "career", "colleague", "meeting", "project"],
        "#a855f7",
        "💼",
    ),
    topic(
        "Relationships",
        &[
            "love", "relationship", "dating", "partner", "boyfriend", "girlfriend", "husband",
            "wife",
        ],
        "#ec4899",
        "💕",
    ),
    topic(
        "Family",
        &["family", "mum", "dad", "mom", "mother", "father", "sister", "brother", "parents"],
        "#f472b6",
        "👨‍👩‍👧",
    ),
    topic(
        "Health",
        &["health", "sleep", "tired", "sick", "exercise", "gym", "doctor", "anxiety"],
        "#22c55e",
        "🏃",
    ),
    topic(
        "Money",
        &["money", "pay", "afford", "expensive", "salary", "rent", "bills", "buy"],
        "#f59e0b",
        "💰",
    ),
    topic(
        "Dreams",
        &["dream", "goal", "want", "wish", "hope", "future", "plan"],
        "#6366f1",
        "✨",
    ),
];

/// Shorter topic lists used by the wrapped recaps.
pub static WRAPPED_TOPICS: &[Category] = &[
    plain("Work", &["work", "job", "boss", "office", "career"]),
    plain("Love", &["love", "relationship", "partner", "dating"]),
    plain("Family", &["family", "mum", "dad", "parents", "brother", "sister"]),
    plain("Health", &["health", "tired", "sleep", "exercise", "gym"]),
    plain("Money", &["money", "pay", "bills", "afford", "salary"]),
    plain("Future", &["future", "dream", "goal", "plan", "want"]),
];

/// Names and family words counted as "people you talk about".
pub static PEOPLE: &[&str] = &[
    "alice", "andrew", "james", "john", "emma", "sarah", "david", "michael", "chris", "tom",
    "anna", "kate", "lucy", "sophie", "jack", "harry", "charlie", "george", "oliver", "lily",
    "grace", "emily", "mum", "mom", "dad", "mother", "father", "brother", "sister",
];

pub static DREAM_THEMES: &[Category] = &[
    theme("Falling", &["falling", "fall", "dropped"], "⬇️"),
    theme("Flying", &["flying", "fly", "floating", "soaring"], "🦋"),
    theme("Being chased", &["chased", "chasing", "running away", "escape"], "🏃"),
    theme("Water", &["water", "ocean", "sea", "swimming", "drowning"], "🌊"),
    theme("Lost", &["lost", "can't find", "searching"], "🔍"),
    theme("Teeth", &["teeth", "tooth"], "🦷"),
    theme("Late", &["late", "missing", "running out of time"], "⏰"),
];

/// "mum" -> "Mum"
pub fn display_name(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
