use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ValidationError;

const MAX_INSTRUMENT_LEN: usize = 20;

/// Punctuation that appears in exchange-suffixed, index and currency tickers
/// (`RELIANCE.NS`, `^NSEI`, `EURUSD=X`, `M&M.NS`).
const TICKER_PUNCTUATION: [char; 5] = ['.', '-', '=', '^', '&'];

/// Ticker handed to the fetch step as a single argument.
///
/// The value is opaque: it is trimmed but otherwise passed through exactly as
/// the caller sent it. Validation only keeps it a safe, single process
/// argument that cannot be mistaken for an option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument(String);

impl Instrument {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim();

        let mut len = 0;
        for (index, ch) in ticker.chars().enumerate() {
            len += 1;
            let allowed = if index == 0 {
                ch.is_ascii_alphanumeric() || ch == '^'
            } else {
                ch.is_ascii_alphanumeric() || TICKER_PUNCTUATION.contains(&ch)
            };
            match (allowed, index) {
                (true, _) => {}
                (false, 0) => return Err(ValidationError::InstrumentInvalidStart { ch }),
                (false, index) => return Err(ValidationError::InstrumentInvalidChar { ch, index }),
            }
        }

        match len {
            0 => Err(ValidationError::EmptyInstrument),
            len if len > MAX_INSTRUMENT_LEN => Err(ValidationError::InstrumentTooLong {
                len,
                max: MAX_INSTRUMENT_LEN,
            }),
            _ => Ok(Self(ticker.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Instrument {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl AsRef<str> for Instrument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Instrument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
