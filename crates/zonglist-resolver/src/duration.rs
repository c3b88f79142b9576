//! ISO-8601 duration formatting.

use crate::ResolverError;

/// Normalize a compact ISO-8601 time period to a display string.
///
/// Accepts `PT[nH][nM][nS]` with every component optional and in that
/// order. Seconds are always two digits, minutes default to `0`, and
/// hours are omitted when absent: `PT4M33S` gives `4:33`, `PT1H2M3S`
/// gives `1:2:03`, `PT45S` gives `0:45`.
///
/// # Errors
/// Returns `ResolverError::InvalidDuration` for anything else, including
/// day components such as `P1DT2H` or `P0D`.
pub fn normalize_duration(iso: &str) -> Result<String, ResolverError> {
    let invalid = || ResolverError::InvalidDuration(iso.to_string());
    let mut rest = iso.strip_prefix("PT").ok_or_else(invalid)?;

    let mut hours = None;
    let mut minutes = None;
    let mut seconds = None;
    let mut last_unit = 0;

    while !rest.is_empty() {
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits == rest.len() {
            return Err(invalid());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        let (slot, rank) = match rest.as_bytes()[digits] {
            b'H' => (&mut hours, 1),
            b'M' => (&mut minutes, 2),
            b'S' => (&mut seconds, 3),
            _ => return Err(invalid()),
        };
        if rank <= last_unit {
            return Err(invalid());
        }
        last_unit = rank;
        *slot = Some(value);
        rest = &rest[digits + 1..];
    }

    let minutes = minutes.unwrap_or(0);
    let seconds = seconds.unwrap_or(0);
    Ok(match hours {
        Some(hours) => format!("{hours}:{minutes}:{seconds:02}"),
        None => format!("{minutes}:{seconds:02}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(normalize_duration("PT4M33S").unwrap(), "4:33");
        assert_eq!(normalize_duration("PT10M5S").unwrap(), "10:05");
    }

    #[test]
    fn test_hours_are_not_padded() {
        assert_eq!(normalize_duration("PT1H2M3S").unwrap(), "1:2:03");
        assert_eq!(normalize_duration("PT2H").unwrap(), "2:0:00");
    }

    #[test]
    fn test_missing_components() {
        assert_eq!(normalize_duration("PT45S").unwrap(), "0:45");
        assert_eq!(normalize_duration("PT3M").unwrap(), "3:00");
        assert_eq!(normalize_duration("PT").unwrap(), "0:00");
    }

    #[test]
    fn test_rejects_other_shapes() {
        for bad in ["", "4:33", "P0D", "P1DT2H", "PT4S33M", "PT4M4M", "PT1.5S", "PTM", "PT12"] {
            assert!(
                matches!(normalize_duration(bad), Err(ResolverError::InvalidDuration(_))),
                "{bad} should be rejected"
            );
        }
    }
}
