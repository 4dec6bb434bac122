//! Quiz mode: pick a topic, answer generated multiple-choice questions,
//! keep score. Question text comes back from the model in a fixed layout
//! and is parsed by `parse_question`, which is pure and tested on literal
//! strings.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{info, warn};

use crate::bot::registry;
use crate::bot::session::{Mode, QuizState};
use crate::bot::telegram::html_escape;
use crate::bot::{menu, App};

const GENERATION_MAX_TOKENS: u32 = 300;

const SELECT_TEXT: &str = "🧠 <b>Quiz — test your knowledge!</b>\n\n\
Pick a topic:\n\n\
💻 <b>Programming</b> — code and technology\n\
🏛️ <b>History</b> — facts and events\n\
🔬 <b>Science</b> — physics, chemistry, biology\n\
🌍 <b>Geography</b> — countries, capitals, nature\n\
🎬 <b>Movies</b> — films, actors, directors\n\n\
Every question has 4 answer options!";

/// A parsed multiple-choice question.
#[derive(Debug, PartialEq)]
pub struct Question {
    pub text: String,
    /// Options in A..D order; only the letters the model actually produced.
    pub options: Vec<(char, String)>,
    /// Correct letter, uppercased. May be empty when the model forgot the
    /// answer line; parsing still succeeds.
    pub answer: String,
}

fn answer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)correct answer:\s*\[?([A-D])\]?").unwrap())
}

/// Parse the model's question layout:
///
/// ```text
/// Question: ...
/// A) ...
/// B) ...
/// C) ...
/// D) ...
/// Correct answer: B
/// ```
///
/// Tolerates surrounding whitespace and a missing option or two; requires
/// the question line and more than two options to succeed.
pub fn parse_question(raw: &str) -> Option<Question> {
    let mut question = String::new();
    let mut options: [Option<String>; 4] = [const { None }; 4];
    let mut answer = String::new();

    for line in raw.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Question:") {
            question = rest.trim().to_string();
            continue;
        }
        let mut matched_option = false;
        for (i, letter) in ['A', 'B', 'C', 'D'].into_iter().enumerate() {
            if let Some(rest) = line
                .strip_prefix(letter)
                .and_then(|r| r.strip_prefix(')'))
            {
                options[i] = Some(rest.trim().to_string());
                matched_option = true;
                break;
            }
        }
        if matched_option {
            continue;
        }
        if let Some(caps) = answer_re().captures(line) {
            answer = caps[1].to_uppercase();
        }
    }

    let options: Vec<(char, String)> = ['A', 'B', 'C', 'D']
        .into_iter()
        .zip(options)
        .filter_map(|(letter, text)| text.map(|t| (letter, t)))
        .collect();

    if question.is_empty() || options.len() <= 2 {
        warn!("Could not parse question from: {raw:?}");
        return None;
    }

    Some(Question { text: question, options, answer })
}

/// Qualitative comment for a final percentage.
pub fn tier(percentage: f64) -> &'static str {
    if percentage >= 80.0 {
        "🎉 Excellent result!"
    } else if percentage >= 60.0 {
        "👍 Good result!"
    } else if percentage >= 40.0 {
        "👌 Not bad, but there's room to grow!"
    } else {
        "📚 Time to hit the books!"
    }
}

/// Final report for the finish screen. No percentage line when nothing was
/// answered.
pub fn final_report(correct: u32, total: u32) -> String {
    let mut text = format!(
        "🏁 <b>Quiz over!</b>\n\n📊 <b>Final score:</b> {correct}/{total}\n"
    );
    if total > 0 {
        let percentage = (correct as f64 / total as f64) * 100.0;
        text.push_str(&format!("Accuracy: {percentage:.1}%\n\n{}", tier(percentage)));
    }
    text
}

fn format_question(q: &Question, number: u32) -> String {
    let mut text = format!("📝 <b>Question #{number}</b>\n\n{}\n\n", html_escape(&q.text));
    for (letter, option) in &q.options {
        text.push_str(&format!("{letter}) {}\n", html_escape(option)));
    }
    text.push_str("\n<i>Reply with the letter of your answer (A, B, C or D)</i>");
    text
}

fn topics_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = registry::QUIZ_TOPICS
        .iter()
        .map(|t| {
            vec![InlineKeyboardButton::callback(
                t.name,
                format!("quiz_topic_{}", t.key),
            )]
        })
        .collect();
    rows.push(menu::back_row());
    InlineKeyboardMarkup::new(rows)
}

fn continue_keyboard(topic_key: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🎯 Next question",
            format!("quiz_continue_{topic_key}"),
        )],
        vec![InlineKeyboardButton::callback("🔄 Change topic", "quiz_change_topic")],
        vec![InlineKeyboardButton::callback("🏁 Finish quiz", "quiz_finish")],
    ])
}

/// Show the topic selection menu.
pub async fn entry(app: &Arc<App>, chat_id: i64, replace: Option<i32>) {
    info!("Quiz topic selection for chat {chat_id}");
    app.sessions
        .update(chat_id, |s| s.mode = Mode::Quiz(QuizState::ChoosingTopic))
        .await;

    let image = app.config.asset("quiz.png");
    match app
        .tg
        .show_screen(chat_id, image.as_deref(), SELECT_TEXT, topics_keyboard(), replace)
        .await
    {
        Ok(message_id) => {
            app.sessions
                .with_session(chat_id, |s| s.menu_message_id = Some(message_id))
                .await;
        }
        Err(e) => warn!("Failed to show quiz topics: {e}"),
    }
}

/// A topic was picked: zero the counters and generate the first question.
pub async fn topic_selected(app: &Arc<App>, chat_id: i64, message_id: i32, key: &str) {
    let Some(topic) = registry::quiz_topic(key) else {
        warn!("Unknown quiz topic: {key}");
        let _ = app
            .tg
            .replace_screen(
                chat_id,
                message_id,
                "❌ That topic doesn't exist. Pick one from the list:",
                Some(topics_keyboard()),
            )
            .await;
        return;
    };

    info!("Chat {chat_id} starts a {key} quiz");
    app.sessions
        .update(chat_id, |s| {
            s.mode = Mode::Quiz(QuizState::Answering {
                topic: topic.key.to_string(),
                expected: None,
                correct: 0,
                total: 0,
            })
        })
        .await;

    generate_question(app, chat_id, message_id).await;
}

/// "Next question" pressed.
pub async fn next_question(app: &Arc<App>, chat_id: i64, message_id: i32) {
    let answering = app
        .sessions
        .peek(chat_id, |s| {
            matches!(s.mode, Mode::Quiz(QuizState::Answering { .. }))
        })
        .await;
    if !answering {
        // Stale button after the quiz ended; recover at topic selection.
        entry(app, chat_id, Some(message_id)).await;
        return;
    }
    generate_question(app, chat_id, message_id).await;
}

/// Ask the model for a question on the session's topic and display it.
/// Counts the question (total += 1) only once it parsed.
async fn generate_question(app: &Arc<App>, chat_id: i64, message_id: i32) {
    let topic_key = app
        .sessions
        .peek(chat_id, |s| match &s.mode {
            Mode::Quiz(QuizState::Answering { topic, .. }) => Some(topic.clone()),
            _ => None,
        })
        .await;
    let Some(topic_key) = topic_key else {
        return;
    };
    let Some(topic) = registry::quiz_topic(&topic_key) else {
        warn!("Quiz topic {topic_key} no longer resolves, returning chat {chat_id} to selection");
        entry(app, chat_id, Some(message_id)).await;
        return;
    };

    let shown = app
        .tg
        .replace_screen(chat_id, message_id, "🤔 Generating a question... ⏳", None)
        .await;
    let Ok(message_id) = shown else {
        return;
    };

    let generated = app
        .openai
        .styled_reply("Create a new question", topic.prompt, GENERATION_MAX_TOKENS)
        .await;

    let raw = match generated {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Question generation failed for chat {chat_id}: {e}");
            let _ = app
                .tg
                .edit_message(
                    chat_id,
                    message_id,
                    "❌ Couldn't generate a question. Please try again.",
                    Some(continue_keyboard(&topic_key)),
                )
                .await;
            return;
        }
    };

    let Some(question) = parse_question(&raw) else {
        let _ = app
            .tg
            .edit_message(
                chat_id,
                message_id,
                "❌ The question came back garbled. Please try again.",
                Some(continue_keyboard(&topic_key)),
            )
            .await;
        return;
    };

    let number = app
        .sessions
        .with_session(chat_id, |s| record_question(&mut s.mode, &question.answer))
        .await;
    let Some(number) = number else {
        // The session moved on while we were generating.
        return;
    };

    let _ = app
        .tg
        .edit_message(chat_id, message_id, &format_question(&question, number), None)
        .await;
}

/// Check whether `text` is a well-formed quiz answer (a single letter A-D,
/// any case, surrounding whitespace ignored).
pub fn normalize_answer(text: &str) -> Option<String> {
    let trimmed = text.trim().to_uppercase();
    (trimmed.len() == 1 && "ABCD".contains(&trimmed)).then_some(trimmed)
}

/// Result of scoring a normalized answer against the session.
#[derive(Debug, PartialEq)]
pub enum AnswerOutcome {
    Scored { is_correct: bool, expected: String, correct: u32, total: u32, topic: String },
    NoQuestionPending,
    NotInQuiz,
}

/// Count a freshly generated question against the session: store its
/// correct letter and bump the total. Returns the question number, or
/// `None` when the session has moved on.
pub fn record_question(mode: &mut Mode, answer: &str) -> Option<u32> {
    match mode {
        Mode::Quiz(QuizState::Answering { expected, total, .. }) => {
            *expected = Some(answer.to_string());
            *total += 1;
            Some(*total)
        }
        _ => None,
    }
}

/// Score a normalized answer. Consumes the open question, so a duplicate
/// answer cannot be scored twice.
pub fn apply_answer(mode: &mut Mode, answer: &str) -> AnswerOutcome {
    match mode {
        Mode::Quiz(QuizState::Answering { topic, expected, correct, total }) => {
            match expected.take() {
                Some(letter) => {
                    let is_correct = !letter.is_empty() && answer == letter;
                    if is_correct {
                        *correct += 1;
                    }
                    AnswerOutcome::Scored {
                        is_correct,
                        expected: letter,
                        correct: *correct,
                        total: *total,
                        topic: topic.clone(),
                    }
                }
                None => AnswerOutcome::NoQuestionPending,
            }
        }
        _ => AnswerOutcome::NotInQuiz,
    }
}

/// Score a typed answer.
pub async fn handle_answer(app: &Arc<App>, chat_id: i64, text: &str) {
    let Some(answer) = normalize_answer(text) else {
        // Malformed input never consumes a turn.
        let _ = app
            .tg
            .send_message(chat_id, "❓ Please answer with a single letter: A, B, C or D", None)
            .await;
        return;
    };

    let outcome = app
        .sessions
        .with_session(chat_id, |s| apply_answer(&mut s.mode, &answer))
        .await;

    match outcome {
        AnswerOutcome::Scored { is_correct, expected, correct, total, topic } => {
            let verdict = if is_correct {
                "✅ <b>Correct!</b>".to_string()
            } else if expected.is_empty() {
                "❌ <b>Wrong!</b>".to_string()
            } else {
                format!("❌ <b>Wrong!</b> The correct answer was {expected}")
            };
            let text = format!("{verdict}\n\n📊 <b>Score:</b> {correct}/{total} correct");
            match app
                .tg
                .send_message(chat_id, &text, Some(continue_keyboard(&topic)))
                .await
            {
                Ok(message_id) => {
                    app.sessions
                        .with_session(chat_id, |s| s.menu_message_id = Some(message_id))
                        .await;
                }
                Err(e) => warn!("Failed to show quiz verdict: {e}"),
            }
        }
        AnswerOutcome::NoQuestionPending => {
            let _ = app
                .tg
                .send_message(
                    chat_id,
                    "There's no open question. Use the buttons to get one!",
                    None,
                )
                .await;
        }
        AnswerOutcome::NotInQuiz => {}
    }
}

/// Finish the quiz: final stats, then the main menu after a short pause.
pub async fn finish(app: &Arc<App>, chat_id: i64, message_id: i32) {
    let (counters, epoch) = app
        .sessions
        .update(chat_id, |s| {
            let counters = match &s.mode {
                Mode::Quiz(QuizState::Answering { correct, total, .. }) => Some((*correct, *total)),
                _ => None,
            };
            s.reset();
            (counters, s.epoch)
        })
        .await;

    let Some((correct, total)) = counters else {
        // Double-press or stale button; just land on the menu.
        menu::render_main_menu(app, chat_id, Some(message_id)).await;
        return;
    };

    info!("Quiz finished for chat {chat_id}: {correct}/{total}");
    let _ = app
        .tg
        .replace_screen(chat_id, message_id, &final_report(correct, total), None)
        .await;

    menu::schedule_main_menu(app.clone(), chat_id, Some(message_id), menu::MENU_DELAY, epoch);
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Question: What year did the Berlin Wall fall?
A) 1987
B) 1989
C) 1991
D) 1993
Correct answer: B";

    #[test]
    fn test_parse_well_formed_question() {
        let q = parse_question(WELL_FORMED).expect("should parse");
        assert_eq!(q.text, "What year did the Berlin Wall fall?");
        assert_eq!(q.options.len(), 4);
        assert_eq!(q.options[1], ('B', "1989".to_string()));
        assert_eq!(q.answer, "B");
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let raw = "\n  Question:   Which planet is largest?  \n\n A)  Earth \n B) Jupiter\n  C) Mars\n D) Venus \n  correct answer:   b  \n";
        let q = parse_question(raw).expect("should parse");
        assert_eq!(q.text, "Which planet is largest?");
        assert_eq!(q.options[0], ('A', "Earth".to_string()));
        assert_eq!(q.answer, "B");
    }

    #[test]
    fn test_parse_rejects_two_options() {
        let raw = "Question: Pick one\nA) yes\nB) no\nCorrect answer: A";
        assert_eq!(parse_question(raw), None);
    }

    #[test]
    fn test_parse_rejects_missing_question_line() {
        let raw = "A) 1\nB) 2\nC) 3\nD) 4\nCorrect answer: A";
        assert_eq!(parse_question(raw), None);
    }

    #[test]
    fn test_parse_accepts_three_options() {
        let raw = "Question: Pick\nA) x\nB) y\nC) z\nCorrect answer: C";
        let q = parse_question(raw).expect("three options are enough");
        assert_eq!(q.options.len(), 3);
        assert_eq!(q.answer, "C");
    }

    #[test]
    fn test_parse_survives_missing_answer_line() {
        let raw = "Question: Pick\nA) x\nB) y\nC) z\nD) w";
        let q = parse_question(raw).expect("answer line is optional");
        assert_eq!(q.answer, "");
    }

    #[test]
    fn test_parse_answer_in_brackets() {
        let raw = "Question: Pick\nA) x\nB) y\nC) z\nD) w\nCorrect answer: [D]";
        let q = parse_question(raw).unwrap();
        assert_eq!(q.answer, "D");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let malformed = "Question: Pick one\nA) yes\nB) no";
        for _ in 0..3 {
            assert_eq!(parse_question(malformed), None);
        }
    }

    #[test]
    fn test_normalize_answer() {
        assert_eq!(normalize_answer("a"), Some("A".to_string()));
        assert_eq!(normalize_answer("  D "), Some("D".to_string()));
        assert_eq!(normalize_answer("E"), None);
        assert_eq!(normalize_answer("AB"), None);
        assert_eq!(normalize_answer("yes"), None);
        assert_eq!(normalize_answer(""), None);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier(100.0), "🎉 Excellent result!");
        assert_eq!(tier(80.0), "🎉 Excellent result!");
        assert_eq!(tier(79.9), "👍 Good result!");
        assert_eq!(tier(60.0), "👍 Good result!");
        assert_eq!(tier(40.0), "👌 Not bad, but there's room to grow!");
        assert_eq!(tier(39.9), "📚 Time to hit the books!");
        assert_eq!(tier(0.0), "📚 Time to hit the books!");
    }

    #[test]
    fn test_final_report_four_of_five() {
        let report = final_report(4, 5);
        assert!(report.contains("4/5"));
        assert!(report.contains("80.0%"));
        assert!(report.contains("Excellent"));
    }

    #[test]
    fn test_final_report_zero_of_zero_has_no_percentage() {
        let report = final_report(0, 0);
        assert!(report.contains("0/0"));
        assert!(!report.contains('%'));
    }

    #[test]
    fn test_format_question_numbers_and_escapes() {
        let q = Question {
            text: "Is 1 < 2?".to_string(),
            options: vec![('A', "yes".to_string()), ('B', "no".to_string()), ('C', "<maybe>".to_string())],
            answer: "A".to_string(),
        };
        let text = format_question(&q, 7);
        assert!(text.contains("Question #7"));
        assert!(text.contains("1 &lt; 2"));
        assert!(text.contains("C) &lt;maybe&gt;"));
    }
}
