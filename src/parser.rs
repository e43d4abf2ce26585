use chrono::{NaiveDate, NaiveTime, TimeDelta};
use thiserror::Error;

use crate::{
    ast::{DayRecord, Entry, File, Slot, Tag, Tags},
    settings::Settings,
};

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Error, Debug, Clone)]
#[error("{kind} at {line}:{column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ParseErrorKind {
    #[error("expected one of {expected:?}, found {found:?}")]
    ExpectedChars { expected: Vec<char>, found: char },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid time")]
    InvalidTime,
    #[error("invalid duration")]
    InvalidDurationFormat,
    #[error("invalid settings: {0}")]
    TomlError(toml::de::Error),
    #[error("{0}")]
    InvalidSettings(String),
}

/// Parser for the line-oriented agenda format.
#[derive(Debug, Clone)]
pub struct Parser {
    source: Vec<char>,

    start: usize,
    current: usize,

    line: usize,
    column: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().filter(|c| *c != '\r').collect(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn parse_file(&mut self) -> Result<File> {
        self.skip_blank_lines();
        let settings = if self.at_fence() {
            Some(self.parse_settings()?)
        } else {
            None
        };

        self.skip_blank_lines();

        let mut days = Vec::new();
        while self.peek().is_some() {
            days.push(self.parse_day_record()?);
            self.skip_blank_lines();
        }

        Ok(File { settings, days })
    }

    /// TOML between two `---` lines.
    fn parse_settings(&mut self) -> Result<Settings> {
        self.expect_string("---")?;
        self.expect_char('\n')?;
        self.clear();

        while self.peek().is_some() {
            if self.at_fence() {
                let toml = self.collect().unwrap_or_default();
                self.expect_string("---")?;
                if self.peek() == Some('\n') {
                    self.advance();
                }
                self.clear();
                let settings: Settings = toml::from_str(&toml)
                    .map_err(|e| self.make_error(ParseErrorKind::TomlError(e)))?;
                settings.validate().map_err(|e| {
                    self.make_error(ParseErrorKind::InvalidSettings(e.to_string()))
                })?;
                return Ok(settings);
            }
            self.extract_until('\n');
            self.expect_char('\n')?;
        }

        Err(self.make_error(ParseErrorKind::UnexpectedEof))
    }

    fn parse_day_record(&mut self) -> Result<DayRecord> {
        let date = self.parse_date()?;

        self.skip_space();
        if self.peek().is_some() {
            self.expect_char('\n')?;
        }
        self.clear();

        let mut entries = Vec::new();
        loop {
            self.skip_space();
            match self.peek() {
                Some('\n') => {
                    self.advance();
                    self.clear();
                    break;
                }
                Some(_) => entries.push(self.parse_entry()?),
                None => break,
            }
        }

        Ok(DayRecord { date, entries })
    }

    fn parse_date(&mut self) -> Result<NaiveDate> {
        let year: i32 = self.parse_number(ParseErrorKind::InvalidDate)?;
        self.expect_char('-')?;
        self.clear();

        let month: u32 = self.parse_number(ParseErrorKind::InvalidDate)?;
        self.expect_char('-')?;
        self.clear();

        let day: u32 = self.parse_number(ParseErrorKind::InvalidDate)?;

        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| self.make_error(ParseErrorKind::InvalidDate))
    }

    fn parse_entry(&mut self) -> Result<Entry> {
        let tags = if Some('[') == self.peek() {
            Some(self.parse_tags()?)
        } else {
            None
        };

        let mut slots = Vec::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                self.advance();
                self.clear();
                break;
            }

            self.skip_space();
            slots.push(self.parse_slot()?);
            self.skip_space();
            if Some(',') == self.peek() {
                self.advance();
                self.clear();
            }
        }

        Ok(Entry { tags, slots })
    }

    fn parse_tags(&mut self) -> Result<Tags> {
        self.expect_char('[')?;
        self.clear();
        let mut tags = Vec::new();

        self.skip_space();
        while matches!(self.peek(), Some(c) if c != ']') {
            tags.push(self.parse_tag()?);
            self.skip_space();
        }

        self.expect_char(']')?;
        self.clear();

        Ok(Tags { tags })
    }

    /// `title` or `title(detail)`; the detail may contain spaces.
    fn parse_tag(&mut self) -> Result<Tag> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ']' || c == '(' {
                break;
            }
            self.advance();
        }

        let title = match self.collect() {
            Some(title) if !title.is_empty() => title,
            _ => return Err(self.make_error(ParseErrorKind::UnexpectedEof)),
        };

        let detail = if self.peek() == Some('(') {
            self.advance();
            self.clear();
            self.extract_until(')');
            let detail = self.collect();
            self.expect_char(')')?;
            self.clear();
            detail.map(|d| d.trim().to_string())
        } else {
            None
        };

        Ok(Tag { title, detail })
    }

    /// `HH:MM - 1h30m`
    fn parse_slot(&mut self) -> Result<Slot> {
        let hours: u32 = self.parse_number(ParseErrorKind::InvalidTime)?;
        self.expect_char(':')?;
        self.clear();
        let minutes: u32 = self.parse_number(ParseErrorKind::InvalidTime)?;

        let time = NaiveTime::from_hms_opt(hours, minutes, 0)
            .ok_or_else(|| self.make_error(ParseErrorKind::InvalidTime))?;

        self.skip_space();
        self.expect_char('-')?;
        self.skip_space();

        let duration = self.parse_duration()?;
        Ok(Slot { time, duration })
    }

    /// Units must appear in `h`, `m`, `s` order; at least one is required.
    fn parse_duration(&mut self) -> Result<TimeDelta> {
        let mut hms: [Option<i64>; 3] = [None, None, None];
        let mut i: usize = 0;

        while i < hms.len() {
            let Some(num) = self.extract_num() else {
                break;
            };
            let num: i64 = num
                .parse()
                .map_err(|_| self.make_error(ParseErrorKind::InvalidDurationFormat))?;

            let Some(unit) = self.advance() else {
                return Err(self.make_error(ParseErrorKind::UnexpectedEof));
            };

            let n_unit = match unit {
                'h' => 0,
                'm' => 1,
                's' => 2,
                _ => return Err(self.make_error(ParseErrorKind::InvalidDurationFormat)),
            };

            self.clear();

            if n_unit < i {
                return Err(self.make_error(ParseErrorKind::InvalidDurationFormat));
            }

            hms[n_unit] = Some(num);
            i = n_unit + 1;
        }

        if hms.iter().all(Option::is_none) {
            return Err(self.make_error(ParseErrorKind::InvalidDurationFormat));
        }

        TimeDelta::try_hours(hms[0].unwrap_or_default())
            .zip(TimeDelta::try_minutes(hms[1].unwrap_or_default()))
            .and_then(|(h, m)| h.checked_add(&m))
            .zip(TimeDelta::try_seconds(hms[2].unwrap_or_default()))
            .and_then(|(hm, s)| hm.checked_add(&s))
            .ok_or_else(|| self.make_error(ParseErrorKind::InvalidDurationFormat))
    }

    #[must_use]
    fn make_error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.line, self.column)
    }

    fn parse_number<T: std::str::FromStr>(&mut self, kind: ParseErrorKind) -> Result<T> {
        match self.extract_num() {
            Some(num) => num.parse().map_err(|_| self.make_error(kind)),
            None if self.peek().is_none() => Err(self.make_error(ParseErrorKind::UnexpectedEof)),
            None => Err(self.make_error(kind)),
        }
    }

    /// Consumes a run of digits. `None` if there were none.
    fn extract_num(&mut self) -> Option<String> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        self.collect().filter(|num| !num.is_empty())
    }

    fn at_fence(&self) -> bool {
        self.source
            .get(self.current..)
            .is_some_and(|rest| rest.starts_with(&['-', '-', '-']))
    }

    fn expect_string(&mut self, s: &str) -> Result<()> {
        s.chars().try_for_each(|c| self.expect_char(c))
    }

    fn expect_char(&mut self, c: char) -> Result<()> {
        self.expect_chars(std::iter::once(c))
    }

    fn expect_chars(&mut self, chars: impl IntoIterator<Item = char> + Clone) -> Result<()> {
        if let Some(c) = self.peek() {
            if chars.clone().into_iter().any(|char| char == c) {
                self.advance();
                Ok(())
            } else {
                Err(self.make_error(ParseErrorKind::ExpectedChars {
                    expected: chars.into_iter().collect(),
                    found: c,
                }))
            }
        } else {
            Err(self.make_error(ParseErrorKind::UnexpectedEof))
        }
    }

    fn skip_space(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() && c != '\n') {
            self.advance();
        }

        self.clear();
    }

    fn skip_blank_lines(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
        self.clear();
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.source.get(self.current).copied();
        self.current += 1;

        match c {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }

        c
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn extract_until(&mut self, c: char) {
        while let Some(current) = self.peek() {
            if current == c {
                break;
            }
            self.advance();
        }
    }

    fn collect(&mut self) -> Option<String> {
        let result = self
            .source
            .get(self.start..self.current)
            .map(|chars| chars.iter().collect::<String>());

        self.clear();

        result
    }

    fn clear(&mut self) {
        self.start = self.current;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;

    const AGENDA: &str = "\
---
[calendar]
first_weekday = \"Sun\"
---

2025-06-02
[resource(anna) project(p-17) location(Main St 4)] 09:00 - 2h
[resource(ben) project(p-9) status(confirmed)] 13:30 - 1h30m, 16:00 - 45m

2025-06-04
[resource(anna) project(p-17)] 08:00 - 4h
";

    #[test]
    fn test_parse_agenda() {
        let file = Parser::new(AGENDA).parse_file().unwrap();

        let settings = file.settings.unwrap();
        assert_eq!(settings.calendar.first_weekday, Weekday::Sun);

        assert_eq!(file.days.len(), 2);
        let monday = &file.days[0];
        assert_eq!(monday.date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(monday.entries.len(), 2);

        let tags = monday.entries[0].tags.as_ref().unwrap();
        assert_eq!(tags.get("resource"), Some("anna"));
        assert_eq!(tags.get("location"), Some("Main St 4"));
        assert_eq!(monday.entries[0].slots[0].duration, TimeDelta::hours(2));

        let slots = &monday.entries[1].slots;
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].time, NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert_eq!(slots[0].duration, TimeDelta::minutes(90));
        assert_eq!(slots[1].duration, TimeDelta::minutes(45));
    }

    #[test]
    fn test_front_matter_is_validated() {
        let err = Parser::new("---\n[grid]\nhour_height = -1.0\n---\n")
            .parse_file()
            .unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidSettings(_)));
    }

    #[test]
    fn test_parse_without_settings() {
        let file = Parser::new("2025-06-02\n[resource(anna) project(p-1)] 09:00 - 1h")
            .parse_file()
            .unwrap();
        assert!(file.settings.is_none());
        assert_eq!(file.days[0].entries.len(), 1);
    }

    #[test]
    fn test_whitespace_line_ends_day() {
        let file = Parser::new("2025-06-02\n  09:00 - 1h\n   \n2025-06-03\n09:00 - 2h\n")
            .parse_file()
            .unwrap();
        assert_eq!(file.days.len(), 2);
        assert_eq!(file.days[0].entries.len(), 1);
        assert!(file.days[0].entries[0].tags.is_none());
    }

    #[test]
    fn test_invalid_date() {
        let err = Parser::new("2025-02-30\n").parse_file().unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidDate));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_duration_units_out_of_order() {
        let err = Parser::new("2025-06-02\n09:00 - 30m1h\n")
            .parse_file()
            .unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidDurationFormat));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_duration_out_of_range() {
        let err = Parser::new("2025-06-02\n09:00 - 9999999999999h\n")
            .parse_file()
            .unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidDurationFormat));

        let err = Parser::new("2025-06-02\n09:00 - 99999999999999999999m\n")
            .parse_file()
            .unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidDurationFormat));
    }

    #[test]
    fn test_missing_duration() {
        let err = Parser::new("2025-06-02\n09:00 - \n").parse_file().unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidDurationFormat));
    }
}
