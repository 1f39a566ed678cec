//! Parking fee calculation
//!
//! Pure functions mapping (entry, planned exit, actual departure) to a
//! monetary amount and a formatted receipt. No storage or I/O dependency;
//! the only implicit input is the current time when no planned exit is
//! given.
//!
//! Billing is tiered and non-additive: a stay of 24 hours or more bills
//! whole days, anything shorter bills whole hours. Departing 12 hours or
//! more after the recorded exit adds a flat surcharge per complete
//! 12-hour block.

use crate::{time, Error, Result};
use chrono::NaiveDateTime;

/// Hourly rate, applied to stays under 24 hours
pub const RATE_PER_HOUR: f64 = 2.0;

/// Daily rate, applied once a stay reaches 24 hours
pub const RATE_PER_DAY: f64 = 15.0;

/// Surcharge per complete 12-hour block of late departure
pub const LATE_SURCHARGE_PER_12H: f64 = 10.0;

/// Whole minutes between entry and exit, truncated toward zero.
///
/// Fails with [`Error::InvalidInterval`] when the exit precedes the entry.
pub fn duration_minutes(entry: NaiveDateTime, exit: NaiveDateTime) -> Result<i64> {
    if exit < entry {
        return Err(Error::InvalidInterval(format!(
            "exit time {} precedes entry time {}",
            exit, entry
        )));
    }
    Ok((exit - entry).num_minutes())
}

/// Compute the parking fee for a stay.
///
/// `exit` is the planned exit; when absent the current time is used.
/// `departure` is the actual departure; when present and strictly after
/// the exit, each complete 12-hour block of lateness adds
/// [`LATE_SURCHARGE_PER_12H`]. A zero-length stay still bills one hour:
/// the minimum billed unit is 1.
pub fn calculate_fee(
    entry: NaiveDateTime,
    exit: Option<NaiveDateTime>,
    departure: Option<NaiveDateTime>,
) -> Result<f64> {
    let exit = exit.unwrap_or_else(time::now);
    let minutes = duration_minutes(entry, exit)?;
    let hours = minutes as f64 / 60.0;

    let mut fee = if hours >= 24.0 {
        (hours / 24.0).ceil() * RATE_PER_DAY
    } else {
        hours.ceil().max(1.0) * RATE_PER_HOUR
    };

    if let Some(departure) = departure {
        if departure > exit {
            let late_hours = (departure - exit).num_hours();
            let late_periods = late_hours / 12;
            if late_periods > 0 {
                fee += late_periods as f64 * LATE_SURCHARGE_PER_12H;
            }
        }
    }

    Ok(fee)
}

/// Produce the formatted multi-line receipt for a completed stay.
///
/// Contains the entry, planned exit and actual departure timestamps, the
/// duration in whole minutes, and the fee to two decimals. Failures from
/// the fee functions propagate unchanged.
pub fn exit_summary(
    entry: NaiveDateTime,
    exit: Option<NaiveDateTime>,
    departure: Option<NaiveDateTime>,
) -> Result<String> {
    // Resolve the exit once so the printed duration and the fee agree
    let exit = exit.unwrap_or_else(time::now);
    let minutes = duration_minutes(entry, exit)?;
    let fee = calculate_fee(entry, Some(exit), departure)?;

    let departure_str = departure.map_or_else(
        || "-".to_string(),
        |d| d.format(time::RECEIPT_DATETIME_FMT).to_string(),
    );

    Ok(format!(
        "Entry: {}\nPlanned exit: {}\nActual departure: {}\nDuration: {} minutes\nTotal due: {:.2}€",
        entry.format(time::RECEIPT_DATETIME_FMT),
        exit.format(time::RECEIPT_DATETIME_FMT),
        departure_str,
        minutes,
        fee
    ))
}
