//! Deterministic local replies used whenever the worker cannot answer.
//!
//! Rules run against the lower-cased message in priority order:
//! greeting, thanks, farewell, question, then the neutral pool. Earlier user
//! turns refine two branches: a repeated greeting gets a "welcome back" line,
//! and a topic mentioned earlier replaces the random neutral pick.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::session::{Role, Turn};

const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey", "你好", "您好", "嗨"];
const THANKS_KEYWORDS: &[&str] = &["thank", "thanks", "thx", "谢谢", "感谢", "多谢"];
const FAREWELL_KEYWORDS: &[&str] = &["bye", "goodbye", "再见", "拜拜"];
const QUESTION_MARKS: &[char] = &['?', '？'];

pub const GREETING_REPLY: &str = "Hello! So nice to see you. How has your day been?";
pub const GREETING_AGAIN_REPLY: &str = "Nice to see you again! What shall we talk about today?";
pub const THANKS_REPLY: &str = "You're welcome! I'm always happy to help~";
pub const FAREWELL_REPLY: &str = "Bye for now! Come back and chat with me soon~";
pub const QUESTION_REPLY: &str =
    "That's a good question! Let me think... I'd say it depends on the situation.";

/// Neutral acknowledgements picked at random when no rule matches.
pub const NEUTRAL_REPLIES: &[&str] = &[
    "I see what you mean!",
    "That sounds really interesting!",
    "Let me think... yes, I think you're right!",
    "Wow, really? Tell me more!",
    "I was thinking the same thing! We're so in sync~",
];

/// Conversation topics recognised in earlier user turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Weather,
    Food,
    Work,
    Study,
}

impl Topic {
    const ALL: [Topic; 4] = [Topic::Weather, Topic::Food, Topic::Work, Topic::Study];

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Topic::Weather => &["weather", "rain", "sunny", "天气", "温度", "下雨", "晴天"],
            Topic::Food => &["food", "eat", "dinner", "lunch", "吃", "饭", "食物", "美食"],
            Topic::Work => &["work", "job", "office", "工作", "上班", "公司", "同事"],
            Topic::Study => &["study", "school", "exam", "学习", "学校", "考试", "书"],
        }
    }

    pub fn reply(&self) -> &'static str {
        match self {
            Topic::Weather => "The weather really is a fun thing to talk about!",
            Topic::Food => "Speaking of food, I can't taste it, but it sounds wonderful!",
            Topic::Work => "Work can be tough sometimes. Hang in there!",
            Topic::Study => "Learning something new is always exciting!",
        }
    }
}

/// Which rule produced a fallback reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Greeting,
    GreetingAgain,
    Thanks,
    Farewell,
    Question,
    Topic(Topic),
    Neutral,
}

/// Classifies `message` given the turns that preceded it.
pub fn classify(message: &str, prior: &[Turn]) -> FallbackKind {
    let text = message.trim().to_lowercase();
    let earlier_user_turns: Vec<String> = prior
        .iter()
        .filter(|turn| turn.role == Role::User)
        .map(|turn| turn.content.to_lowercase())
        .collect();

    if text.is_empty() {
        return FallbackKind::Greeting;
    }
    if mentions(&text, GREETING_KEYWORDS) {
        let greeted_before = earlier_user_turns
            .iter()
            .any(|turn| mentions(turn, GREETING_KEYWORDS));
        return if greeted_before {
            FallbackKind::GreetingAgain
        } else {
            FallbackKind::Greeting
        };
    }
    if mentions(&text, THANKS_KEYWORDS) {
        return FallbackKind::Thanks;
    }
    if mentions(&text, FAREWELL_KEYWORDS) {
        return FallbackKind::Farewell;
    }
    if text.contains(QUESTION_MARKS) {
        return FallbackKind::Question;
    }

    Topic::ALL
        .into_iter()
        .find(|topic| {
            earlier_user_turns
                .iter()
                .any(|turn| mentions(turn, topic.keywords()))
        })
        .map(FallbackKind::Topic)
        .unwrap_or(FallbackKind::Neutral)
}

/// Produces the fallback reply for `message`.
///
/// Only the neutral branch consults `rng`.
pub fn fallback_reply<R: Rng + ?Sized>(message: &str, prior: &[Turn], rng: &mut R) -> String {
    let reply = match classify(message, prior) {
        FallbackKind::Greeting => GREETING_REPLY,
        FallbackKind::GreetingAgain => GREETING_AGAIN_REPLY,
        FallbackKind::Thanks => THANKS_REPLY,
        FallbackKind::Farewell => FAREWELL_REPLY,
        FallbackKind::Question => QUESTION_REPLY,
        FallbackKind::Topic(topic) => topic.reply(),
        FallbackKind::Neutral => NEUTRAL_REPLIES
            .choose(rng)
            .copied()
            .unwrap_or(NEUTRAL_REPLIES[0]),
    };
    reply.to_string()
}

/// Whether `text` (already lower-cased) mentions any of `keywords`.
///
/// ASCII keywords match whole words so "this" does not count as "hi";
/// CJK keywords match as substrings since CJK text has no word breaks.
fn mentions(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        if keyword.is_ascii() {
            text.split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| word == *keyword)
        } else {
            text.contains(keyword)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn reply(message: &str) -> String {
        fallback_reply(message, &[], &mut StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_greeting_in_both_languages() {
        assert_eq!(reply("Hello there"), GREETING_REPLY);
        assert_eq!(reply("你好呀"), GREETING_REPLY);
        assert_eq!(reply("hi!"), GREETING_REPLY);
    }

    #[test]
    fn test_ascii_keywords_match_whole_words() {
        // "this" contains "hi" but is not a greeting.
        assert_eq!(classify("this is fine", &[]), FallbackKind::Neutral);
    }

    #[test]
    fn test_thanks_selects_thanks_reply() {
        assert_eq!(reply("thank you"), THANKS_REPLY);
        assert_eq!(reply("谢谢"), THANKS_REPLY);
        assert_eq!(reply("Thanks a lot"), THANKS_REPLY);
    }

    #[test]
    fn test_priority_order() {
        // Greeting beats thanks, thanks beats farewell, farewell beats question.
        assert_eq!(classify("hi, thanks", &[]), FallbackKind::Greeting);
        assert_eq!(classify("thanks, bye", &[]), FallbackKind::Thanks);
        assert_eq!(classify("bye?", &[]), FallbackKind::Farewell);
        assert_eq!(classify("what time is it？", &[]), FallbackKind::Question);
    }

    #[test]
    fn test_repeated_greeting_uses_welcome_back() {
        let prior = vec![Turn::user("hello"), Turn::assistant(GREETING_REPLY)];
        assert_eq!(classify("hi again", &prior), FallbackKind::GreetingAgain);
    }

    #[test]
    fn test_topic_from_history_replaces_neutral_pick() {
        let prior = vec![Turn::user("今天下雨了"), Turn::assistant("ok")];
        assert_eq!(
            classify("I stayed in", &prior),
            FallbackKind::Topic(Topic::Weather)
        );
        // Topics only come from user turns.
        let prior = vec![Turn::assistant("do you like school")];
        assert_eq!(classify("I stayed in", &prior), FallbackKind::Neutral);
    }

    #[test]
    fn test_neutral_reply_comes_from_pool() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let reply = fallback_reply("the sky looks nice", &[], &mut rng);
            assert!(NEUTRAL_REPLIES.contains(&reply.as_str()));
        }
    }

    #[test]
    fn test_blank_message_gets_greeting() {
        assert_eq!(reply("   "), GREETING_REPLY);
    }
}
