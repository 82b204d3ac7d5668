//! Free-form message parser.
//!
//! A spending message reads left to right as `<amount> <description...>`
//! optionally followed, in this order, by a type, a category and a date.
//! Trailing tokens are stripped right to left: date first, then type, then
//! category. A trailing token outside those closed sets simply stays part of
//! the description.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use thiserror::Error;

use crate::expenses::{Category, ExpenseKind};

/// A parsed expense before it gains a message identity and timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDraft {
    pub amount: f64,
    pub description: String,
    pub kind: Option<ExpenseKind>,
    pub category: Option<Category>,
    pub date: NaiveDate,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty command. Not enough parameters.")]
    EmptyInput,
    #[error("Ambiguous command. Not enough parameters.")]
    NotEnoughParameters,
    #[error("Ambiguous command. Invalid amount.")]
    InvalidAmount,
    #[error("Ambiguous command. Invalid date.")]
    InvalidDate,
    #[error("Ambiguous command. Division by zero in amount.")]
    DivisionByZero,
    #[error("Ambiguous command. Unterminated quote.")]
    AmbiguousQuoting,
}

/// Parse a raw message into an [`ExpenseDraft`].
///
/// `reference` supplies the default date and the default year for dates
/// written without one.
pub fn parse_message(text: &str, reference: DateTime<Utc>) -> Result<ExpenseDraft, ParseError> {
    let mut tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let date = take_date(&mut tokens, reference)?.unwrap_or_else(|| reference.date_naive());
    let kind = take_kind(&mut tokens);
    let category = take_category(&mut tokens);

    if tokens.len() < 2 {
        return Err(ParseError::NotEnoughParameters);
    }

    let amount = parse_amount(&tokens[0])?;
    let description = tokens[1..].join(" ");
    // Quoted empty tokens survive tokenizing, so the count alone does not
    // guarantee a real description.
    if description.trim().is_empty() {
        return Err(ParseError::NotEnoughParameters);
    }

    Ok(ExpenseDraft {
        amount,
        description,
        kind,
        category,
        date,
    })
}

/// Shell-style word splitting: whitespace separates tokens, double-quoted
/// substrings become one token with the quotes stripped.
fn tokenize(text: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                in_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_word {
                    tokens.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_quotes {
        return Err(ParseError::AmbiguousQuoting);
    }
    if in_word {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Whether a token is shaped like `D{1,2}/D{1,2}` or `D{1,2}/D{1,2}/D{4}`.
fn date_shape(token: &str) -> bool {
    let parts: Vec<&str> = token.split('/').collect();
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    match parts.as_slice() {
        [day, month] => {
            day.len() <= 2 && month.len() <= 2 && all_digits(day) && all_digits(month)
        }
        [day, month, year] => {
            day.len() <= 2
                && month.len() <= 2
                && year.len() == 4
                && all_digits(day)
                && all_digits(month)
                && all_digits(year)
        }
        _ => false,
    }
}

/// Pop a trailing date token. A token shaped like a date but naming an
/// impossible calendar day is an error, not a description word.
fn take_date(
    tokens: &mut Vec<String>,
    reference: DateTime<Utc>,
) -> Result<Option<NaiveDate>, ParseError> {
    let Some(last) = tokens.last() else {
        return Ok(None);
    };
    if !date_shape(last) {
        return Ok(None);
    }

    let parts: Vec<&str> = last.split('/').collect();
    let day: u32 = parts[0].parse().map_err(|_| ParseError::InvalidDate)?;
    let month: u32 = parts[1].parse().map_err(|_| ParseError::InvalidDate)?;
    let year: i32 = match parts.get(2) {
        Some(year) => year.parse().map_err(|_| ParseError::InvalidDate)?,
        None => reference.year(),
    };

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ParseError::InvalidDate)?;
    tokens.pop();
    Ok(Some(date))
}

fn take_kind(tokens: &mut Vec<String>) -> Option<ExpenseKind> {
    let last = tokens.last()?;
    let kind = ExpenseKind::try_from(last.as_str()).ok()?;
    tokens.pop();
    Some(kind)
}

fn take_category(tokens: &mut Vec<String>) -> Option<Category> {
    let last = tokens.last()?;
    let category = Category::try_from(last.as_str()).ok()?;
    tokens.pop();
    Some(category)
}

/// Parse an amount token: either a plain decimal or a fraction `a/b`
/// rounded to two decimal places.
fn parse_amount(token: &str) -> Result<f64, ParseError> {
    let slashes = token.matches('/').count();
    match slashes {
        0 => token.parse().map_err(|_| ParseError::InvalidAmount),
        1 => {
            let (num, den) = token.split_once('/').ok_or(ParseError::InvalidAmount)?;
            let num: f64 = num.parse().map_err(|_| ParseError::InvalidAmount)?;
            let den: f64 = den.parse().map_err(|_| ParseError::InvalidAmount)?;
            if den == 0.0 {
                return Err(ParseError::DivisionByZero);
            }
            Ok((num / den * 100.0).round() / 100.0)
        }
        _ => Err(ParseError::InvalidAmount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn minimal_message() {
        let draft = parse_message("10 coffee", reference()).unwrap();
        assert_eq!(draft.amount, 10.0);
        assert_eq!(draft.description, "coffee");
        assert_eq!(draft.kind, None);
        assert_eq!(draft.category, None);
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn full_message() {
        let draft = parse_message("12.5 groceries food need 3/6", reference()).unwrap();
        assert_eq!(draft.amount, 12.5);
        assert_eq!(draft.description, "groceries");
        assert_eq!(draft.kind, Some(ExpenseKind::Need));
        assert_eq!(draft.category, Some(Category::Food));
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    }

    #[test]
    fn explicit_year() {
        let draft = parse_message("10 rent 1/2/2023", reference()).unwrap();
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
    }

    #[test]
    fn quoted_description_is_one_token() {
        let draft = parse_message("10 \"birthday gift for mom\" gifts", reference()).unwrap();
        assert_eq!(draft.description, "birthday gift for mom");
        assert_eq!(draft.category, Some(Category::Gifts));
    }

    #[test]
    fn apostrophes_do_not_split_words() {
        let draft = parse_message("5 mcdonald's", reference()).unwrap();
        assert_eq!(draft.description, "mcdonald's");
    }

    #[test]
    fn unterminated_quote() {
        assert_eq!(
            parse_message("10 \"unfinished", reference()),
            Err(ParseError::AmbiguousQuoting)
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_message("", reference()), Err(ParseError::EmptyInput));
        assert_eq!(
            parse_message("   ", reference()),
            Err(ParseError::EmptyInput)
        );
    }

    #[test]
    fn amount_alone_is_not_enough() {
        assert_eq!(
            parse_message("10", reference()),
            Err(ParseError::NotEnoughParameters)
        );
        assert_eq!(
            parse_message("10 food", reference()),
            Err(ParseError::NotEnoughParameters)
        );
    }

    #[test]
    fn quoted_empty_description_is_not_enough() {
        assert_eq!(
            parse_message("10 \"\"", reference()),
            Err(ParseError::NotEnoughParameters)
        );
        assert_eq!(
            parse_message("10 \"\" \"\"", reference()),
            Err(ParseError::NotEnoughParameters)
        );
    }

    #[test]
    fn fraction_amount_rounds_to_cents() {
        let draft = parse_message("10/3 shared dinner", reference()).unwrap();
        assert_eq!(draft.amount, 3.33);
    }

    #[test]
    fn fraction_by_zero() {
        assert_eq!(
            parse_message("10/0 impossible", reference()),
            Err(ParseError::DivisionByZero)
        );
    }

    #[test]
    fn garbage_amount() {
        assert_eq!(
            parse_message("ten coffee", reference()),
            Err(ParseError::InvalidAmount)
        );
        assert_eq!(
            parse_message("1/2/3 coffee 1/2/2024", reference()),
            Err(ParseError::InvalidAmount)
        );
    }

    #[test]
    fn impossible_calendar_date_is_an_error() {
        assert_eq!(
            parse_message("10 spesa 31/02", reference()),
            Err(ParseError::InvalidDate)
        );
    }

    #[test]
    fn non_date_trailing_token_stays_in_description() {
        let draft = parse_message("10 pay 1/2/23", reference()).unwrap();
        assert_eq!(draft.description, "pay 1/2/23");
        assert_eq!(draft.date, reference().date_naive());
    }

    #[test]
    fn kind_before_category_is_positional() {
        // "need" is not in trailing position once "food" is popped, so it
        // stays in the description.
        let draft = parse_message("10 spesa need food", reference()).unwrap();
        assert_eq!(draft.kind, None);
        assert_eq!(draft.category, Some(Category::Food));
        assert_eq!(draft.description, "spesa need");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let draft = parse_message("10 spesa FOOD Need", reference()).unwrap();
        assert_eq!(draft.kind, Some(ExpenseKind::Need));
        assert_eq!(draft.category, Some(Category::Food));
    }

    #[test]
    fn category_only() {
        let draft = parse_message("10 bus ticket transportation", reference()).unwrap();
        assert_eq!(draft.category, Some(Category::Transportation));
        assert_eq!(draft.kind, None);
        assert_eq!(draft.description, "bus ticket");
    }
}
