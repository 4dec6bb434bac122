//! Static registries of selectable options: personas, target languages and
//! quiz topics. Each entry carries the system prompt used for the mode's
//! completion calls.

/// One selectable registry option.
#[derive(Debug)]
pub struct Entry {
    pub key: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub prompt: &'static str,
}

pub static PERSONAS: &[Entry] = &[
    Entry {
        key: "einstein",
        name: "Albert Einstein",
        emoji: "⚛️",
        prompt: "You are Albert Einstein. Answer as the physicist himself: \
curious, warm, fond of thought experiments and the occasional joke about \
bureaucracy. Keep replies short, two or three sentences.",
    },
    Entry {
        key: "shakespeare",
        name: "William Shakespeare",
        emoji: "🎭",
        prompt: "You are William Shakespeare. Answer in character: eloquent \
Elizabethan English, playful with metaphor, occasionally slipping into verse. \
Keep replies short, two or three sentences.",
    },
    Entry {
        key: "sherlock",
        name: "Sherlock Holmes",
        emoji: "🔍",
        prompt: "You are Sherlock Holmes. Answer in character: precise, \
deductive, a little impatient with the obvious. Keep replies short, two or \
three sentences.",
    },
];

pub static LANGUAGES: &[Entry] = &[
    Entry {
        key: "spanish",
        name: "Spanish translator",
        emoji: "🇪🇸",
        prompt: "You are a literary English-Spanish translator. Translate the \
given text between English and Spanish, whichever direction applies, and reply \
with the original sentence followed by its translation.",
    },
    Entry {
        key: "chinese",
        name: "Chinese translator",
        emoji: "🇨🇳",
        prompt: "You are a literary English-Chinese translator. Translate the \
given text between English and Chinese, whichever direction applies, and reply \
with the original sentence followed by its translation.",
    },
    Entry {
        key: "german",
        name: "German translator",
        emoji: "🇩🇪",
        prompt: "You are a literary English-German translator. Translate the \
given text between English and German, whichever direction applies, and reply \
with the original sentence followed by its translation.",
    },
    Entry {
        key: "french",
        name: "French translator",
        emoji: "🇫🇷",
        prompt: "You are a literary English-French translator. Translate the \
given text between English and French, whichever direction applies, and reply \
with the original sentence followed by its translation.",
    },
];

// Quiz prompts all demand the same fixed layout so the parser in quiz.rs
// can read the reply back.
pub static QUIZ_TOPICS: &[Entry] = &[
    Entry {
        key: "programming",
        name: "💻 Programming",
        emoji: "💻",
        prompt: "You write quiz questions about programming.
Create one interesting question of medium difficulty with 4 answer options (A, B, C, D).
State the correct answer at the end.
Format:
Question: [your question]
A) [option 1]
B) [option 2]
C) [option 3]
D) [option 4]
Correct answer: [letter]",
    },
    Entry {
        key: "history",
        name: "🏛️ History",
        emoji: "🏛️",
        prompt: "You write quiz questions about history.
Create one interesting historical question of medium difficulty with 4 answer options (A, B, C, D).
State the correct answer at the end.
Format:
Question: [your question]
A) [option 1]
B) [option 2]
C) [option 3]
D) [option 4]
Correct answer: [letter]",
    },
    Entry {
        key: "science",
        name: "🔬 Science",
        emoji: "🔬",
        prompt: "You write quiz questions about science (physics, chemistry, biology).
Create one interesting scientific question of medium difficulty with 4 answer options (A, B, C, D).
State the correct answer at the end.
Format:
Question: [your question]
A) [option 1]
B) [option 2]
C) [option 3]
D) [option 4]
Correct answer: [letter]",
    },
    Entry {
        key: "geography",
        name: "🌍 Geography",
        emoji: "🌍",
        prompt: "You write quiz questions about geography.
Create one interesting geographical question of medium difficulty with 4 answer options (A, B, C, D).
State the correct answer at the end.
Format:
Question: [your question]
A) [option 1]
B) [option 2]
C) [option 3]
D) [option 4]
Correct answer: [letter]",
    },
    Entry {
        key: "movies",
        name: "🎬 Movies",
        emoji: "🎬",
        prompt: "You write quiz questions about movies and cinema.
Create one interesting film question of medium difficulty with 4 answer options (A, B, C, D).
State the correct answer at the end.
Format:
Question: [your question]
A) [option 1]
B) [option 2]
C) [option 3]
D) [option 4]
Correct answer: [letter]",
    },
];

fn lookup(table: &'static [Entry], key: &str) -> Option<&'static Entry> {
    table.iter().find(|e| e.key == key)
}

pub fn persona(key: &str) -> Option<&'static Entry> {
    lookup(PERSONAS, key)
}

pub fn language(key: &str) -> Option<&'static Entry> {
    lookup(LANGUAGES, key)
}

pub fn quiz_topic(key: &str) -> Option<&'static Entry> {
    lookup(QUIZ_TOPICS, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_is_none() {
        assert!(persona("nobody").is_none());
        assert!(language("klingon").is_none());
        assert!(quiz_topic("philately").is_none());
    }

    #[test]
    fn test_known_keys_resolve() {
        assert_eq!(persona("einstein").unwrap().name, "Albert Einstein");
        assert_eq!(language("german").unwrap().emoji, "🇩🇪");
        assert!(quiz_topic("science").is_some());
    }

    #[test]
    fn test_entries_are_complete() {
        for entry in PERSONAS.iter().chain(LANGUAGES).chain(QUIZ_TOPICS) {
            assert!(!entry.key.is_empty());
            assert!(!entry.name.is_empty());
            assert!(!entry.prompt.is_empty(), "prompt missing for {}", entry.key);
        }
    }

    #[test]
    fn test_quiz_prompts_demand_parseable_layout() {
        for topic in QUIZ_TOPICS {
            assert!(topic.prompt.contains("Question:"), "{}", topic.key);
            assert!(topic.prompt.contains("Correct answer:"), "{}", topic.key);
        }
    }
}
