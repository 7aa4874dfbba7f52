//! Profanity screening for user-submitted comments.
//!
//! Texts are normalized before matching: latin homoglyphs and leetspeak
//! digits fold into their cyrillic counterparts, separators vanish, and long
//! character runs collapse, so "х*у*й" and "сУуууКа" both resolve to their
//! dictionary forms. Censoring replaces whole matched words with asterisks
//! of the same length.

const RUSSIAN_PROFANITY_ROOTS: &[&str] = &[
    "хуй", "хуя", "хуе", "хуи", "хую", "пизд", "пезд", "блять", "бляд", "блят", "еба", "ебу",
    "ебе", "ебл", "ебн", "сука", "суч", "сучк", "сучар", "муда", "мудо", "муди", "мудак",
    "залуп", "шлюх", "шалав", "педик", "педер", "пидор", "пидр", "гандон", "гондон", "дерьм",
    "говн", "срат", "срал", "сран", "засран", "жоп", "трах", "долбо", "долбан", "заеб",
    "отъеб", "въеб", "уеб", "выеб", "недоеб", "перееб",
];

const ENGLISH_PROFANITY: &[&str] = &[
    "fuck", "shit", "bitch", "cunt", "dick", "cock", "pussy", "whore", "slut", "bastard",
    "asshole", "motherfucker", "bullshit",
];

const MIN_COMMENT_LEN: usize = 10;
const MAX_COMMENT_LEN: usize = 2000;

/// Fold one character through the homoglyph/leetspeak table. `None` drops the
/// character entirely (separators used to break words apart).
fn fold_char(ch: char) -> Option<char> {
    match ch {
        '0' | 'o' => Some('о'),
        '3' | 'e' | 'ё' => Some('е'),
        '4' | 'a' | '@' => Some('а'),
        '1' | 'i' | '!' => Some('и'),
        '6' | 'b' => Some('б'),
        'y' | 'u' => Some('у'),
        'x' | 'h' => Some('х'),
        'p' => Some('р'),
        'c' | '$' => Some('с'),
        'k' => Some('к'),
        'm' => Some('м'),
        'n' => Some('н'),
        '*' | '.' | '-' | '_' | ' ' => None,
        other => Some(other),
    }
}

/// Lowercase, fold homoglyphs, drop separators, collapse runs of three or
/// more identical characters down to one.
pub fn normalize(text: &str) -> String {
    let folded: Vec<char> = text
        .chars()
        .flat_map(char::to_lowercase)
        .filter_map(fold_char)
        .collect();

    let mut result = String::with_capacity(folded.len());
    let mut index = 0;
    while index < folded.len() {
        let ch = folded[index];
        let mut run = 1;
        while index + run < folded.len() && folded[index + run] == ch {
            run += 1;
        }
        let keep = if run >= 3 { 1 } else { run };
        for _ in 0..keep {
            result.push(ch);
        }
        index += run;
    }
    result
}

/// Check a text for profanity; returns the offending dictionary entries.
pub fn contains_profanity(text: &str) -> (bool, Vec<String>) {
    if text.is_empty() {
        return (false, Vec::new());
    }

    let normalized = normalize(text);
    let lowered = text.to_lowercase();
    let mut found = Vec::new();

    for root in RUSSIAN_PROFANITY_ROOTS {
        if normalized.contains(root) {
            found.push((*root).to_string());
        }
    }
    for word in ENGLISH_PROFANITY {
        if lowered.contains(word) || normalized.contains(word) {
            found.push((*word).to_string());
        }
    }

    found.sort();
    found.dedup();
    (!found.is_empty(), found)
}

fn word_is_profane(word: &str) -> bool {
    let normalized = normalize(word);
    let lowered = word.to_lowercase();
    RUSSIAN_PROFANITY_ROOTS
        .iter()
        .any(|root| normalized.contains(root))
        || ENGLISH_PROFANITY.iter().any(|entry| lowered.contains(entry))
}

/// Replace every profane word with asterisks of equal length, leaving the
/// rest of the text untouched.
pub fn censor(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut word = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            word.push(ch);
        } else {
            flush_word(&mut result, &mut word);
            result.push(ch);
        }
    }
    flush_word(&mut result, &mut word);
    result
}

fn flush_word(result: &mut String, word: &mut String) {
    if word.is_empty() {
        return;
    }
    if word_is_profane(word) {
        result.extend(std::iter::repeat('*').take(word.chars().count()));
    } else {
        result.push_str(word);
    }
    word.clear();
}

/// Length and profanity rules for a review comment.
pub fn validate_comment(text: &str) -> Result<(), String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("the comment must not be empty".to_string());
    }
    if trimmed.chars().count() < MIN_COMMENT_LEN {
        return Err(format!(
            "the comment must be at least {MIN_COMMENT_LEN} characters long"
        ));
    }
    if text.chars().count() > MAX_COMMENT_LEN {
        return Err(format!(
            "the comment must not exceed {MAX_COMMENT_LEN} characters"
        ));
    }

    let (profane, _) = contains_profanity(text);
    if profane {
        return Err("the comment contains profanity; please rephrase it".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_defeats_leetspeak_and_repeats() {
        assert_eq!(normalize("сУуууКа"), "сука");
        let (profane, found) = contains_profanity("well fuck that");
        assert!(profane);
        assert_eq!(found, vec!["fuck".to_string()]);
    }

    #[test]
    fn stretched_repeats_collapse_to_the_root() {
        let (profane, found) = contains_profanity("сукаааа");
        assert!(profane);
        assert!(found.iter().any(|word| word == "сука"));
    }

    #[test]
    fn homoglyph_substitution_is_caught() {
        // Latin 'c'/'y'/'k' fold into cyrillic, matching the russian root.
        let (profane, found) = contains_profanity("ну ты и cучka");
        assert!(profane);
        assert!(found.iter().any(|word| word == "суч"));
    }

    #[test]
    fn clean_text_passes() {
        let (profane, found) = contains_profanity("Отличный зал, светлый и просторный!");
        assert!(!profane);
        assert!(found.is_empty());
    }

    #[test]
    fn censor_masks_whole_words_preserving_length() {
        assert_eq!(censor("what the fuck, really"), "what the ****, really");
        assert_eq!(censor("fucking great"), "******* great");
        assert_eq!(censor("all good here"), "all good here");
    }

    #[test]
    fn comment_validation_enforces_length_and_language() {
        assert!(validate_comment("   ").is_err());
        assert!(validate_comment("short").is_err());
        assert!(validate_comment(&"a".repeat(2001)).is_err());
        assert!(validate_comment("This shit was unacceptable").is_err());
        assert!(validate_comment("A lovely loft with big windows.").is_ok());
    }
}
