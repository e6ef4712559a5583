//! Decodes the `@<channel>/<value>` records that the potentiometer board
//! prints on the serial link, one per line.

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, i32, space0},
    combinator::{all_consuming, map},
    error::{Error, ErrorKind},
    sequence::{delimited, separated_pair},
    Finish, IResult,
};

use std::{fmt, str::FromStr};

/// The token naming a physical input, including its leading `@`.
pub type ChannelId = String;

/// A reading in the board's native ADC range (0..=1023 on the stock board).
pub type Sample = i32;

/// One reading from one potentiometer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Everything before the first `/`, e.g. `@3`.
    pub channel: ChannelId,
    /// The integer after the `/`.
    pub value: Sample,
}

/// Returned when a line is not a well-formed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    line: String,
    input: String,
    code: ErrorKind,
}

impl RecordError {
    /// The part of the line the parser gave up on.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// What the parser expected there.
    pub fn code(&self) -> ErrorKind {
        self.code
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed record {:?} ({:?} at {:?})",
            self.line, self.code, self.input
        )
    }
}

impl std::error::Error for RecordError {}

fn parse_channel(s: &str) -> IResult<&str, ChannelId> {
    map(take_till1(|c| c == '/'), |cs: &str| cs.to_owned())(s)
}

fn parse_value(s: &str) -> IResult<&str, Sample> {
    delimited(space0, i32, space0)(s)
}

fn parse_record(s: &str) -> IResult<&str, Record> {
    map(
        all_consuming(separated_pair(parse_channel, char('/'), parse_value)),
        |(channel, value)| Record { channel, value },
    )(s)
}

impl FromStr for Record {
    type Err = RecordError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_record(s).finish() {
            Ok((_remaining, record)) => Ok(record),
            Err(Error { input, code }) => Err(RecordError {
                line: s.to_owned(),
                input: input.to_owned(),
                code,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_board_output() {
        let (leftover, res) = parse_record("@1/512").unwrap();

        assert_eq!(leftover, "");
        assert_eq!(
            res,
            Record {
                channel: "@1".to_owned(),
                value: 512,
            }
        );
    }

    #[test]
    fn parses_signed_values() {
        assert_eq!("@4/-17".parse::<Record>().unwrap().value, -17);
        assert_eq!("@4/+17".parse::<Record>().unwrap().value, 17);
    }

    /// Channels outside the routing table still decode; dropping them is
    /// the router's job.
    #[test]
    fn parses_unknown_channel() {
        let res: Record = "@9/1023".parse().unwrap();
        assert_eq!(res.channel, "@9");
        assert_eq!(res.value, 1023);
    }

    #[test]
    fn tolerates_padding_around_value() {
        let res: Record = "@2/ 40 ".parse().unwrap();
        assert_eq!(res.value, 40);
    }

    #[test]
    fn rejects_missing_separator() {
        assert!("@1512".parse::<Record>().is_err());
    }

    #[test]
    fn rejects_non_integer_value() {
        assert!("@1/abc".parse::<Record>().is_err());
        assert!("@1/5.5".parse::<Record>().is_err());
        assert!("@1/".parse::<Record>().is_err());
    }

    #[test]
    fn rejects_extra_separator() {
        assert!("@1/2/3".parse::<Record>().is_err());
    }

    #[test]
    fn rejects_empty_channel() {
        assert!("/100".parse::<Record>().is_err());
    }

    #[test]
    fn error_names_the_line() {
        let err = "garbage".parse::<Record>().unwrap_err();
        assert!(err.to_string().contains("garbage"));
    }

    #[test]
    fn error_points_at_bad_value() {
        let err = "@1/x".parse::<Record>().unwrap_err();
        assert_eq!(err.input(), "x");
        assert_eq!(err.code(), ErrorKind::Digit);
        assert_eq!(err.clone(), err);
    }
}
