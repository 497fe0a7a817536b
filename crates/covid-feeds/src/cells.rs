//! Cell-level helpers shared by every builder: table shape checks, date
//! normalisation and integer parsing.

use chrono::NaiveDate;
use covid_core::{ParseError, SchemaError, series::Counts};
use serde_json::{Map, Value};

use crate::{BuildOptions, EmptyCellPolicy};

pub(crate) type Row = Map<String, Value>;

/// View `value` as an array of JSON objects.
pub(crate) fn table<'a>(
  value: &'a Value,
  at: &str,
) -> Result<Vec<&'a Row>, SchemaError> {
  let shape_err = |at: String| SchemaError::UnexpectedShape {
    at,
    expected: "an array of objects",
  };
  value
    .as_array()
    .ok_or_else(|| shape_err(at.to_string()))?
    .iter()
    .enumerate()
    .map(|(i, v)| v.as_object().ok_or_else(|| shape_err(format!("{at}[{i}]"))))
    .collect()
}

/// Look up a required field.
pub(crate) fn field<'a>(
  row: &'a Row,
  at: &str,
  name: &str,
) -> Result<&'a Value, SchemaError> {
  row.get(name).ok_or_else(|| SchemaError::MissingField {
    at:    at.to_string(),
    field: name.to_string(),
  })
}

/// The string content of a cell; numbers are rendered, anything else is
/// rejected as a date/text cell.
pub(crate) fn text<'a>(value: &'a Value) -> Option<std::borrow::Cow<'a, str>> {
  match value {
    Value::String(s) => Some(s.as_str().into()),
    Value::Number(n) => Some(n.to_string().into()),
    _ => None,
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Normalise the date spellings seen across the feeds to a calendar date.
///
/// Accepted: `30 January`, `30 January 2020`, `30-Jan-2020`, `30-Jan-20`,
/// `30-January-2020`, `30-01-2020`, `30/01/2020` and `2020-01-30`. Month names
/// may be full or abbreviated, in any case. Two-digit years are read as
/// 20xx. When the year is missing, `default_year` is used.
pub(crate) fn parse_date(
  at: &str,
  field: &str,
  raw: &str,
  default_year: i32,
) -> Result<NaiveDate, ParseError> {
  let invalid = || ParseError::InvalidDate {
    at:    at.to_string(),
    field: field.to_string(),
    value: raw.to_string(),
  };

  let normalised = raw.replace(['-', '/'], " ");
  let parts: Vec<&str> = normalised.split_whitespace().collect();

  let (day, month, year) = match parts.as_slice() {
    [y, m, d] if y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()) => {
      (*d, *m, (*y).to_string())
    }
    [d, m, y] => (*d, *m, (*y).to_string()),
    [d, m] => (*d, *m, default_year.to_string()),
    _ => return Err(invalid()),
  };

  let year = if year.len() == 2 && year.bytes().all(|b| b.is_ascii_digit()) {
    format!("20{year}")
  } else {
    year
  };

  let joined = format!("{day} {month} {year}");
  let format = if month.bytes().all(|b| b.is_ascii_digit()) {
    "%d %m %Y"
  } else {
    "%d %B %Y"
  };
  NaiveDate::parse_from_str(&joined, format).map_err(|_| invalid())
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Parse an integer count from a string cell.
pub(crate) fn parse_count_str(
  at: &str,
  field: &str,
  raw: &str,
  policy: EmptyCellPolicy,
) -> Result<i64, ParseError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return match policy {
      EmptyCellPolicy::Reject => Err(ParseError::EmptyCell {
        at:    at.to_string(),
        field: field.to_string(),
      }),
      EmptyCellPolicy::Zero => Ok(0),
    };
  }
  trimmed.parse::<i64>().map_err(|_| ParseError::InvalidCount {
    at:    at.to_string(),
    field: field.to_string(),
    value: raw.to_string(),
  })
}

/// Parse an integer count from a JSON cell. String-ints and integral numbers
/// are accepted; `null` is treated as an empty cell.
pub(crate) fn parse_count(
  at: &str,
  field: &str,
  value: &Value,
  options: &BuildOptions,
) -> Result<i64, ParseError> {
  match value {
    Value::String(s) => parse_count_str(at, field, s, options.empty_cells),
    Value::Null => parse_count_str(at, field, "", options.empty_cells),
    Value::Number(n) => n.as_i64().ok_or_else(|| ParseError::InvalidCount {
      at:    at.to_string(),
      field: field.to_string(),
      value: n.to_string(),
    }),
    other => Err(ParseError::InvalidCount {
      at:    at.to_string(),
      field: field.to_string(),
      value: other.to_string(),
    }),
  }
}

/// Pair parsed counts with their active count; `field` names the derived
/// active value in the error when it overflows.
pub(crate) fn counts(
  at: &str,
  field: &str,
  confirmed: i64,
  recovered: i64,
  deceased: i64,
) -> Result<Counts, SchemaError> {
  Counts::new(confirmed, recovered, deceased).ok_or_else(|| {
    SchemaError::Overflow {
      at:    at.to_string(),
      field: field.to_string(),
    }
  })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn date(raw: &str) -> Result<NaiveDate, ParseError> {
    parse_date("row 0", "date", raw, 2020)
  }

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn month_name_without_year_uses_default() {
    assert_eq!(date("30 January").unwrap(), ymd(2020, 1, 30));
    assert_eq!(date("30 January ").unwrap(), ymd(2020, 1, 30));
    assert_eq!(
      parse_date("r", "date", "01 March", 2021).unwrap(),
      ymd(2021, 3, 1)
    );
  }

  #[test]
  fn accepts_every_known_spelling() {
    for raw in [
      "30 January 2020",
      "30-Jan-2020",
      "30-Jan-20",
      "30-January-2020",
      "30-jan-2020",
      "30-01-2020",
      "30/01/2020",
      "2020-01-30",
    ] {
      assert_eq!(date(raw).unwrap(), ymd(2020, 1, 30), "{raw}");
    }
  }

  #[test]
  fn malformed_dates_are_parse_errors() {
    for raw in ["", "yesterday", "32 January", "30 Foo 2020", "2020-13-01"] {
      assert!(
        matches!(date(raw), Err(ParseError::InvalidDate { .. })),
        "{raw}"
      );
    }
  }

  #[test]
  fn counts_accept_strings_and_numbers() {
    let opts = BuildOptions::default();
    assert_eq!(parse_count("r", "f", &json!("42"), &opts), Ok(42));
    assert_eq!(parse_count("r", "f", &json!(" -3 "), &opts), Ok(-3));
    assert_eq!(parse_count("r", "f", &json!(7), &opts), Ok(7));
  }

  #[test]
  fn non_numeric_counts_are_parse_errors() {
    let opts = BuildOptions::default();
    for v in [json!("abc"), json!("1.5"), json!(1.5), json!(true)] {
      assert!(matches!(
        parse_count("r", "f", &v, &opts),
        Err(ParseError::InvalidCount { .. })
      ));
    }
  }

  #[test]
  fn empty_cells_follow_the_policy() {
    let strict = BuildOptions::default();
    assert_eq!(
      parse_count("r", "f", &json!(""), &strict),
      Err(ParseError::EmptyCell {
        at:    "r".to_string(),
        field: "f".to_string(),
      })
    );
    assert!(parse_count("r", "f", &Value::Null, &strict).is_err());

    let lenient = BuildOptions {
      empty_cells: EmptyCellPolicy::Zero,
      ..BuildOptions::default()
    };
    assert_eq!(parse_count("r", "f", &json!(""), &lenient), Ok(0));
    assert!(parse_count("r", "f", &json!("x"), &lenient).is_err());
  }

  #[test]
  fn table_requires_array_of_objects() {
    assert!(table(&json!([{ "a": 1 }]), "feed").is_ok());
    assert!(table(&json!({ "a": 1 }), "feed").is_err());
    let err = table(&json!([{ "a": 1 }, 3]), "feed").unwrap_err();
    assert_eq!(err, SchemaError::UnexpectedShape {
      at:       "feed[1]".to_string(),
      expected: "an array of objects",
    });
  }
}
