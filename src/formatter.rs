//! Readability transform applied to assistant replies before they are stored.
//!
//! Short replies pass through untouched. Longer replies are broken into
//! bullet points, first by paragraph and, for a single long paragraph, by
//! sentence. The transform is a heuristic: it never fails, whatever the
//! punctuation or whitespace of the input looks like.

/// Replies at or under this many characters are candidates for pass-through.
pub const SHORT_REPLY_CHARS: usize = 200;
/// Short replies with more paragraphs than this are still bulleted.
pub const MAX_PLAIN_PARAGRAPHS: usize = 2;
/// A single long paragraph is only bulleted with more sentences than this.
pub const MAX_PLAIN_SENTENCES: usize = 3;

pub const BULLET: &str = "• ";

pub fn format_response(text: &str) -> String {
    let paragraphs = split_paragraphs(text);

    if text.chars().count() <= SHORT_REPLY_CHARS && paragraphs.len() <= MAX_PLAIN_PARAGRAPHS {
        return text.to_string();
    }

    if paragraphs.len() > 1 {
        return bulleted(&paragraphs, "\n\n");
    }

    // Already a list; splitting it by sentence only scrambles the items.
    if text.lines().any(is_list_line) {
        return text.to_string();
    }

    let sentences = split_sentences(text);
    if sentences.len() > MAX_PLAIN_SENTENCES {
        bulleted(&sentences, "\n")
    } else {
        text.to_string()
    }
}

fn bulleted(items: &[String], separator: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", BULLET, item))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Paragraphs are runs of lines separated by blank (whitespace-only) lines.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            push_trimmed(&mut paragraphs, &current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    push_trimmed(&mut paragraphs, &current.join("\n"));

    paragraphs
}

/// A sentence ends at a run of `.`, `!` or `?` followed by whitespace or the
/// end of the text, so "3.14" or "e.g" stay inside one sentence. An ordinal
/// marker such as "2." or "b." at the start of a line never ends one.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if !is_terminal(c) {
            continue;
        }
        while let Some(&next) = chars.peek() {
            if !is_terminal(next) {
                break;
            }
            current.push(next);
            chars.next();
        }
        if chars.peek().map_or(true, |next| next.is_whitespace()) && !ends_with_ordinal(&current) {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);

    sentences
}

/// True when the last line of `segment` is only an ordinal marker like "12.".
fn ends_with_ordinal(segment: &str) -> bool {
    let line = segment.rsplit('\n').next().unwrap_or_default().trim();
    let Some(marker) = line.strip_suffix('.') else {
        return false;
    };
    let all_digits = !marker.is_empty() && marker.chars().all(|c| c.is_ascii_digit());
    let single_letter = marker.chars().count() == 1 && marker.chars().all(char::is_alphabetic);
    all_digits || single_letter
}

/// Lines such as "1. step", "2) step", "- item" or "* item".
fn is_list_line(line: &str) -> bool {
    let line = line.trim_start();
    if ["- ", "* ", BULLET].iter().any(|prefix| line.starts_with(prefix)) {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    let mut rest = line[digits..].chars();
    matches!(rest.next(), Some('.' | ')')) && rest.next().map_or(false, char::is_whitespace)
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn push_trimmed(out: &mut Vec<String>, segment: &str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_sentence(word: &str) -> String {
        format!("This sentence talks about {} at some considerable length and then a bit more", word)
    }

    #[test]
    fn test_short_reply_unchanged() {
        assert_eq!(format_response("Hi there!"), "Hi there!");
        assert_eq!(format_response("One.\n\nTwo."), "One.\n\nTwo.");
    }

    #[test]
    fn test_short_reply_keeps_surrounding_whitespace() {
        let text = "  padded reply \n";
        assert_eq!(format_response(text), text);
    }

    #[test]
    fn test_three_short_paragraphs_bulleted() {
        assert_eq!(format_response("A\n\nB\n\nC"), "• A\n\n• B\n\n• C");
    }

    #[test]
    fn test_paragraph_breaks_with_stray_whitespace() {
        let text = "A  \r\n \r\n  B\n\n\n\nC";
        assert_eq!(format_response(text), "• A\n\n• B\n\n• C");
    }

    #[test]
    fn test_long_two_paragraphs_bulleted() {
        let first = "x".repeat(150);
        let second = "y".repeat(150);
        let text = format!("{}\n\n{}", first, second);
        assert_eq!(
            format_response(&text),
            format!("• {}\n\n• {}", first, second)
        );
    }

    #[test]
    fn test_long_single_paragraph_split_into_sentences() {
        let text = format!(
            "{}. {}! {}? {}.",
            long_sentence("apples"),
            long_sentence("pears"),
            long_sentence("plums"),
            long_sentence("figs")
        );
        assert!(text.chars().count() > SHORT_REPLY_CHARS);

        let formatted = format_response(&text);
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|line| line.starts_with(BULLET)));
        assert_eq!(lines[1], format!("• {}!", long_sentence("pears")));
        assert_eq!(lines[3], format!("• {}.", long_sentence("figs")));
    }

    #[test]
    fn test_long_paragraph_with_few_sentences_unchanged() {
        let text = format!(
            "{}. {}. {}.",
            long_sentence("apples"),
            long_sentence("pears"),
            long_sentence("plums")
        );
        assert!(text.chars().count() > SHORT_REPLY_CHARS);
        assert_eq!(format_response(&text), text);
    }

    #[test]
    fn test_long_text_without_punctuation_unchanged() {
        let text = "word ".repeat(60);
        assert_eq!(format_response(&text), text);
    }

    #[test]
    fn test_whitespace_only_input_unchanged() {
        assert_eq!(format_response(""), "");
        let blank = " \n\n ".repeat(100);
        assert_eq!(format_response(&blank), blank);
    }

    #[test]
    fn test_decimal_points_do_not_split_sentences() {
        let sentences = split_sentences("Pi is 3.14 roughly. Next one?! Tail without stop");
        assert_eq!(
            sentences,
            vec!["Pi is 3.14 roughly.", "Next one?!", "Tail without stop"]
        );
    }

    #[test]
    fn test_long_numbered_list_left_intact() {
        let text = "Here is how to set up the project on a fresh machine:\n\
            1. Install the toolchain from the official site and restart\n\
            2. Clone the repository into your workspace directory\n\
            3. Run the setup script to fetch all dependencies\n\
            4. Start the server";
        assert!(text.chars().count() > SHORT_REPLY_CHARS);
        assert_eq!(format_response(text), text);
    }

    #[test]
    fn test_ordinal_markers_do_not_end_sentences() {
        let sentences = split_sentences("Steps follow.\n1. Open it.\nb. Close it. Done!");
        assert_eq!(
            sentences,
            vec!["Steps follow.", "1. Open it.", "b. Close it.", "Done!"]
        );
    }

    #[test]
    fn test_list_line_detection() {
        assert!(is_list_line("1. Install"));
        assert!(is_list_line("  12) Configure"));
        assert!(is_list_line("- item"));
        assert!(is_list_line("* item"));
        assert!(!is_list_line("3.14 is pi"));
        assert!(!is_list_line("2024 was a year"));
        assert!(!is_list_line("-dash"));
    }

    #[test]
    fn test_split_paragraphs_drops_empty_segments() {
        assert_eq!(split_paragraphs("\n\nA\n\n\n\n"), vec!["A"]);
        assert_eq!(split_paragraphs("line one\nline two"), vec!["line one\nline two"]);
    }
}
