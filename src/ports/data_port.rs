//! Data access port trait.

use crate::domain::error::ScalptraderError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// All usable bars, sorted by timestamp.
    fn fetch_bars(&self) -> Result<Vec<Bar>, ScalptraderError>;

    /// First timestamp, last timestamp and bar count, or `None` when empty.
    fn get_data_range(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, ScalptraderError> {
        let bars = self.fetch_bars()?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}
