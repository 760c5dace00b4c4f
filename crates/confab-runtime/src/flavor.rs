//! Decorative chat phrases.
//!
//! Small phrase pools the runtime uses for cosmetic replies, kept out of
//! the dispatch core. Nothing here affects control flow.

use chrono::{Local, Timelike};
use rand::seq::SliceRandom;

fn pick(options: &[&'static str]) -> &'static str {
    options
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

/// A greeting matching the local time of day.
pub fn time_greeting() -> &'static str {
    match Local::now().hour() {
        0..=5 => "Good morning 🥱",
        6..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    }
}

/// A short opener.
pub fn hi() -> &'static str {
    pick(&["Hey!", "Hello!", "Hi!"])
}

/// A short completion phrase.
pub fn done() -> &'static str {
    pick(&["Done!", "All set!", "Ok!"])
}

/// An acknowledgment used when a request was understood.
pub fn got_it() -> String {
    let opener = pick(&[hi(), hi(), ""]);
    let ack = pick(&[
        "on it! 👍",
        "got it! 👍",
        "ok! 👍",
        "as you wish! 👍",
        "leave it to me! 👍",
    ]);
    let lead = if opener.is_empty() {
        String::new()
    } else {
        format!("{opener} ")
    };
    format!("{lead}{}, {ack}", time_greeting())
}

/// The quoted reply to a mention of the bot.
pub fn got_mention() -> String {
    let wave = pick(&["🙋‍♂️", "😁"]);
    let here = pick(&["Right here", "Yes?"]);
    format!("{wave} {here}")
}

/// A soft apology for a failed upstream fetch.
pub fn network_error() -> String {
    let what = pick(&[
        "Something went wrong while I was fetching the data!",
        "Oops, that did not work!",
        "I could not reach the data!",
    ]);
    let why = pick(&[
        "🤔 some system must be down",
        "🤔 my servers look offline",
        "🤔 one of my connections must have dropped",
    ]);
    format!("{what} {why}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrases_are_never_empty() {
        assert!(!time_greeting().is_empty());
        assert!(!hi().is_empty());
        assert!(!done().is_empty());
        assert!(!got_it().is_empty());
        assert!(!got_mention().is_empty());
        assert!(!network_error().is_empty());
    }

    #[test]
    fn got_it_carries_the_time_greeting() {
        let phrase = got_it();
        assert!(phrase.contains("Good"));
        assert!(phrase.contains("👍"));
    }
}
