use std::borrow::Cow;
use std::collections::BTreeMap;

use validator::ValidationError;

fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Labels are one or two ASCII alphanumerics (`A`, `B`, `1a`).
pub fn is_valid_option_label(label: &str) -> bool {
    (1..=2).contains(&label.len()) && label.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn validate_question_options(options: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    if options.len() < 2 {
        return Err(error("too_few_options", "A question needs at least two options"));
    }
    if let Some(label) = options.keys().find(|l| !is_valid_option_label(l)) {
        return Err(error(
            "invalid_option_label",
            format!("Option label '{}' must be 1-2 alphanumeric characters", label),
        ));
    }
    if options.values().any(|text| text.trim().is_empty()) {
        return Err(error("empty_option", "Option text must not be empty"));
    }
    Ok(())
}

pub fn validate_correct_answer(
    options: &BTreeMap<String, String>,
    correct_answer: &str,
) -> Result<(), ValidationError> {
    if options.contains_key(correct_answer) {
        Ok(())
    } else {
        Err(error(
            "unknown_correct_answer",
            format!("Correct answer '{}' is not one of the option labels", correct_answer),
        ))
    }
}

pub fn validate_date_range(
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(s), Some(e)) if e < s => Err(error("invalid_date_range", "end_date precedes start_date")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn labels() {
        assert!(is_valid_option_label("A"));
        assert!(is_valid_option_label("b2"));
        assert!(!is_valid_option_label(""));
        assert!(!is_valid_option_label("ABC"));
        assert!(!is_valid_option_label("A)"));
    }

    #[test]
    fn options_need_two_non_empty_entries() {
        assert!(validate_question_options(&options(&[("A", "x")])).is_err());
        assert!(validate_question_options(&options(&[("A", "x"), ("B", " ")])).is_err());
        assert!(validate_question_options(&options(&[("A", "x"), ("long", "y")])).is_err());
        assert!(validate_question_options(&options(&[("A", "x"), ("B", "y")])).is_ok());
    }

    #[test]
    fn correct_answer_must_be_a_label() {
        let opts = options(&[("A", "x"), ("B", "y")]);
        assert!(validate_correct_answer(&opts, "B").is_ok());
        assert!(validate_correct_answer(&opts, "C").is_err());
    }

    #[test]
    fn end_date_may_not_precede_start() {
        let d = |s: &str| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
        assert!(validate_date_range(d("2025-03-01"), d("2025-02-01")).is_err());
        assert!(validate_date_range(d("2025-03-01"), d("2025-03-01")).is_ok());
        assert!(validate_date_range(None, d("2025-02-01")).is_ok());
    }
}
