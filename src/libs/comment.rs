//! Hours logged through ticket comments.
//!
//! A comment such as `"spent 1.5 hours and 0:45 hours"` records one time
//! entry per phrase. Two phrase shapes are recognized, both case-sensitive:
//!
//! - plural: a decimal number or `H:MM` (minutes 00 to 59) followed by
//!   `hours`, with optional spaces in between;
//! - singular: `1 hour` at the start of the text or after whitespace, and
//!   not followed by a word character.
//!
//! Before a comment is stored, each phrase is turned into a link to the
//! ticket's hours page, `[/hours/<id> <phrase>]`.

use crate::libs::entry::{NewTimeEntry, TimeEntry};
use crate::libs::error::Result;
use crate::libs::hours::Hours;
use crate::libs::messages::Message;
use crate::msg_debug;
use once_cell::sync::Lazy;
use regex::Regex;

static PLURAL_HOURS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(([0-9]+(\.[0-9]+)?)|([0-9]+:[0-5][0-9])) *hours").unwrap());

static SINGULAR_HOUR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s)(1 *hour)\b").unwrap());

static HOURS_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[/hours/[0-9]+ ([^\]]*)\]").unwrap());

/// One hours phrase found in a comment.
#[derive(Debug, Clone, PartialEq)]
pub struct HoursPhrase {
    /// Byte range of the phrase in the comment.
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// `None` when the amount cannot be represented.
    pub seconds: Option<i64>,
}

/// Every hours phrase in `comment`, in order of appearance.
pub fn parse_hours(comment: &str) -> Vec<HoursPhrase> {
    let mut phrases: Vec<HoursPhrase> = PLURAL_HOURS
        .captures_iter(comment)
        .filter_map(|caps| {
            let phrase = caps.get(0)?;
            Some(HoursPhrase {
                start: phrase.start(),
                end: phrase.end(),
                text: phrase.as_str().to_string(),
                seconds: plural_seconds(&caps[1]),
            })
        })
        .collect();

    phrases.extend(SINGULAR_HOUR.captures_iter(comment).filter_map(|caps| {
        let phrase = caps.get(1)?;
        Some(HoursPhrase {
            start: phrase.start(),
            end: phrase.end(),
            text: phrase.as_str().to_string(),
            seconds: Some(3600),
        })
    }));

    phrases.sort_by_key(|p| p.start);
    phrases
}

fn plural_seconds(amount: &str) -> Option<i64> {
    match amount.split_once(':') {
        Some((hours, minutes)) => {
            let hours: i64 = hours.parse().ok()?;
            let minutes: i64 = minutes.parse().ok()?;
            hours.checked_mul(3600)?.checked_add(minutes * 60)
        }
        None => {
            let seconds = (amount.parse::<f64>().ok()? * 3600.0).round();
            (seconds.is_finite() && seconds <= i64::MAX as f64).then_some(seconds as i64)
        }
    }
}

/// Links every hours phrase of `comment` to the hours page of `ticket_id`.
///
/// Phrases already inside such a link are left alone, so applying the
/// rewrite twice gives the same text.
pub fn munge_comment(comment: &str, ticket_id: i64) -> String {
    let linked: Vec<(usize, usize)> = HOURS_LINK.find_iter(comment).map(|m| (m.start(), m.end())).collect();

    let mut munged = String::with_capacity(comment.len());
    let mut cursor = 0;
    for phrase in parse_hours(comment) {
        if phrase.start < cursor || linked.iter().any(|(s, e)| phrase.start >= *s && phrase.end <= *e) {
            continue;
        }
        munged.push_str(&comment[cursor..phrase.start]);
        munged.push_str(&format!("[/hours/{} {}]", ticket_id, phrase.text));
        cursor = phrase.end;
    }
    munged.push_str(&comment[cursor..]);
    munged
}

/// Reverts hours links to their plain phrases.
pub fn unmunge_comment(comment: &str) -> String {
    HOURS_LINK.replace_all(comment, "$1").into_owned()
}

/// Records one time entry per hours phrase of `comment`.
///
/// Each entry carries the whole comment with links reverted. Phrases whose
/// amount cannot be converted are skipped.
pub fn add_hours_by_comment(hours: &mut Hours, comment: &str, ticket_id: i64, worker: &str) -> Result<Vec<TimeEntry>> {
    let plain = unmunge_comment(comment);
    let mut recorded = Vec::new();

    for phrase in parse_hours(&plain) {
        let Some(seconds) = phrase.seconds else {
            msg_debug!(format!("Skipping hours phrase '{}'", phrase.text));
            continue;
        };
        let entry = NewTimeEntry::new(ticket_id, worker, seconds).comments(Some(&plain));
        recorded.push(hours.record_work(entry)?);
    }

    if !recorded.is_empty() {
        msg_debug!(Message::HoursByComment(recorded.len(), ticket_id));
    }
    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(comment: &str) -> Vec<i64> {
        parse_hours(comment).into_iter().filter_map(|p| p.seconds).collect()
    }

    #[test]
    fn plural_and_colon_phrases() {
        assert_eq!(seconds("spent 1.5 hours and 0:45 hours"), vec![5400, 2700]);
        assert_eq!(seconds("2hours"), vec![7200]);
        assert_eq!(seconds("0:75 hours"), vec![75 * 3600]);
    }

    #[test]
    fn singular_phrase_needs_a_boundary() {
        assert_eq!(seconds("1 hour"), vec![3600]);
        assert_eq!(seconds("took 1 hour."), vec![3600]);
        assert_eq!(seconds("took 11 hour"), Vec::<i64>::new());
        assert_eq!(seconds("1 hourly sync"), Vec::<i64>::new());
        assert_eq!(seconds("1 Hour"), Vec::<i64>::new());
    }

    #[test]
    fn matches_come_in_order_of_appearance() {
        let phrases = parse_hours("1 hour then 2 hours");
        assert_eq!(phrases.iter().map(|p| p.text.as_str()).collect::<Vec<_>>(), vec!["1 hour", "2 hours"]);
    }

    #[test]
    fn munge_links_each_phrase_once() {
        let munged = munge_comment("did 1.5 hours, then 1 hour", 7);
        assert_eq!(munged, "did [/hours/7 1.5 hours], then [/hours/7 1 hour]");
        assert_eq!(munge_comment(&munged, 7), munged);
        assert_eq!(unmunge_comment(&munged), "did 1.5 hours, then 1 hour");
    }

    #[test]
    fn tab_separated_log_lines_are_not_phrases() {
        assert!(parse_hours("[/hours/3 1.50\thours]\tlogged").is_empty());
    }
}
