//! Terminal rendering for diagnoses and chat replies.

use colored::Colorize;
use once_cell::sync::Lazy;
use phyto_core::chat::{ChatMessage, ChatRole};
use phyto_core::classification::ConfidenceTier;
use phyto_core::history::{ClassificationHistory, HistoryEntry};
use regex::Regex;

static STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<strong>(.*?)</strong>").expect("valid strong pattern"));
static EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<em>(.*?)</em>").expect("valid emphasis pattern"));

/// Converts formatted reply markup into ANSI-styled text.
pub fn markup(html: &str) -> String {
    let text = html.replace("<br>", "\n");
    let text = STRONG.replace_all(&text, |caps: &regex::Captures| caps[1].bold().to_string());
    let text = EMPHASIS.replace_all(&text, |caps: &regex::Captures| caps[1].italic().to_string());
    text.into_owned()
}

fn tier_badge(tier: ConfidenceTier) -> String {
    match tier {
        ConfidenceTier::High => tier.label().green().to_string(),
        ConfidenceTier::Medium => tier.label().yellow().to_string(),
        ConfidenceTier::Low => tier.label().red().to_string(),
    }
}

/// Label, confidence and tier of one entry.
pub fn entry_summary(entry: &HistoryEntry) -> String {
    format!(
        "{} {}% {}",
        entry.label.bold(),
        entry.confidence,
        tier_badge(entry.tier())
    )
}

/// Numbered history list, newest first.
pub fn history(history: &ClassificationHistory) -> String {
    if history.is_empty() {
        return "No diagnoses yet.".bright_black().to_string();
    }
    history
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{:>3}. {}  {}",
                i + 1,
                entry_summary(entry),
                entry.date().bright_black()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn chat_message(message: &ChatMessage) -> String {
    let time = format!("[{}]", message.time_label()).bright_black();
    match message.role {
        ChatRole::User => format!("{} {} {}", time, "you:".green(), message.content),
        ChatRole::Assistant => format!(
            "{} {}\n{}",
            time,
            "advisor:".bright_blue(),
            markup(&message.rendered())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phyto_core::chat::format_message;
    use phyto_core::classification::Confidence;
    use phyto_core::history::ImagePreview;

    fn plain<T>(f: impl FnOnce() -> T) -> T {
        colored::control::set_override(false);
        f()
    }

    #[test]
    fn test_markup_strips_tags() {
        let html = format_message("**Remove** leaves\n- Spray *weekly*");
        assert_eq!(plain(|| markup(&html)), "Remove leaves\n• Spray weekly");
    }

    #[test]
    fn test_entry_summary() {
        let entry = HistoryEntry::new(
            "Tomato Late Blight",
            Confidence::new(94.2).unwrap(),
            ImagePreview::placeholder(),
        );
        assert_eq!(
            plain(|| entry_summary(&entry)),
            "Tomato Late Blight 94% High Confidence"
        );
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(
            plain(|| history(&ClassificationHistory::new())),
            "No diagnoses yet."
        );
    }

    #[test]
    fn test_history_is_numbered() {
        let listing = plain(|| history(&ClassificationHistory::demo()));
        assert!(listing.starts_with("  1. "));
        assert!(listing.contains("\n  2. "));
    }
}
