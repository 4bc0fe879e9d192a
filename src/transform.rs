/// Transform Module
///
/// Pure conversion of raw contract records into canonical tickets. Dates and
/// times are rendered with one convention for the whole process: German
/// numeric dates (`19.5.2025`), 24-hour times (`08:00`), in a fixed UTC offset
/// chosen at startup.
use alloy_primitives::U256;
use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::{
    error::{ConfigError, NormalizeError},
    models::{RawTicket, Ticket, TicketId},
};

const DATE_FORMAT: &str = "%-d.%-m.%Y";
const TIME_FORMAT: &str = "%H:%M";

/// Timezone used to render every ticket timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketClock {
    offset: FixedOffset,
}

impl TicketClock {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn from_offset_minutes(minutes: i32) -> Result<Self, ConfigError> {
        let offset = minutes.checked_mul(60).and_then(FixedOffset::east_opt).ok_or(ConfigError::InvalidOffset(minutes))?;
        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn localize(&self, unix: U256) -> Result<DateTime<FixedOffset>, NormalizeError> {
        let secs = u64::try_from(unix)
            .ok()
            .and_then(|secs| i64::try_from(secs).ok())
            .ok_or_else(|| NormalizeError::Timestamp(unix.to_string()))?;
        let utc = DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| NormalizeError::Timestamp(unix.to_string()))?;
        Ok(utc.with_timezone(&self.offset))
    }

    /// Format a Unix-seconds timestamp as a date
    pub fn format_date(&self, unix: U256) -> Result<String, NormalizeError> {
        Ok(self.localize(unix)?.format(DATE_FORMAT).to_string())
    }

    /// Format a Unix-seconds timestamp as a time of day
    pub fn format_time(&self, unix: U256) -> Result<String, NormalizeError> {
        Ok(self.localize(unix)?.format(TIME_FORMAT).to_string())
    }
}

impl Default for TicketClock {
    fn default() -> Self {
        Self::utc()
    }
}

/// Build the canonical ticket for one token.
///
/// `qr_payload` is only consulted for unredeemed tickets; a redeemed ticket
/// never carries a payload. A redeemed ticket with a zero redemption timestamp
/// is inconsistent on-chain data and yields no `redeemed_date` rather than an
/// error.
pub fn build_ticket(
    token_id: TicketId,
    raw: &RawTicket,
    qr_payload: Option<String>,
    clock: &TicketClock,
) -> Result<Ticket, NormalizeError> {
    let event_date = clock.format_date(raw.event_date_unix)?;
    let event_time = clock.format_time(raw.event_date_unix)?;

    let (redeemed_date, qr_code_string) = if raw.redeemed {
        let redeemed_date = if raw.redeemed_at_unix.is_zero() {
            tracing::warn!("Ticket {} is redeemed but has no redemption timestamp", token_id);
            None
        } else {
            Some(clock.format_date(raw.redeemed_at_unix)?)
        };
        (redeemed_date, String::new())
    } else {
        (None, qr_payload.unwrap_or_default())
    };

    // The contract exposes a single seat/category field; venue and category both mirror it.
    Ok(Ticket {
        token_id: token_id.to_string(),
        event_name: raw.event_name.clone(),
        event_date,
        event_time,
        venue: raw.seat_info.clone(),
        category_name: raw.seat_info.clone(),
        image_url: None,
        is_redeemed: raw.redeemed,
        redeemed_date,
        qr_code_string,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WalletAddress;
    use alloy_primitives::B256;

    fn raw_ticket(redeemed: bool, redeemed_at: u64) -> RawTicket {
        let owner = WalletAddress::parse("0x71c7656ec7ab88b098defb751b7401b5f6d8976f").unwrap();
        RawTicket {
            event_id: U256::from(7u64),
            event_name: "FC Bayern vs. Dortmund".to_string(),
            seat_info: "Allianz Arena".to_string(),
            event_date_unix: U256::from(1747755000u64),
            qr_hash: B256::ZERO,
            redeemed,
            redeemed_at_unix: U256::from(redeemed_at),
            redeemed_by: owner,
            current_owner: owner,
        }
    }

    #[test]
    fn test_format_date_and_time() {
        let clock = TicketClock::utc();
        assert_eq!(clock.format_date(U256::from(1747641600u64)).unwrap(), "19.5.2025");
        assert_eq!(clock.format_time(U256::from(1747641600u64)).unwrap(), "08:00");
    }

    #[test]
    fn test_offset_shifts_across_midnight() {
        let clock = TicketClock::from_offset_minutes(120).unwrap();
        // 2025-06-15 23:00 UTC
        let ts = U256::from(1750028400u64);
        assert_eq!(clock.format_date(ts).unwrap(), "16.6.2025");
        assert_eq!(clock.format_time(ts).unwrap(), "01:00");
        assert!(TicketClock::from_offset_minutes(24 * 60).is_err());
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let clock = TicketClock::utc();
        assert!(matches!(clock.format_date(U256::MAX), Err(NormalizeError::Timestamp(_))));
        assert!(clock.format_date(U256::from(u64::MAX)).is_err());
    }

    #[test]
    fn test_redeemed_ticket_hides_qr() {
        let raw = raw_ticket(true, 1747641600);
        let qr = Some("TICKET:67890".to_string());
        let ticket = build_ticket(TicketId::from_u64(67890), &raw, qr, &TicketClock::utc()).unwrap();
        assert_eq!(ticket.token_id, "67890");
        assert!(ticket.is_redeemed);
        assert_eq!(ticket.redeemed_date.as_deref(), Some("19.5.2025"));
        assert!(ticket.qr_code_string.is_empty());
    }

    #[test]
    fn test_redeemed_without_timestamp() {
        let ticket = build_ticket(TicketId::from_u64(1), &raw_ticket(true, 0), None, &TicketClock::utc()).unwrap();
        assert!(ticket.is_redeemed);
        assert_eq!(ticket.redeemed_date, None);
    }

    #[test]
    fn test_active_ticket_carries_qr() {
        let raw = raw_ticket(false, 0);
        let qr = Some("TICKET:12345".to_string());
        let ticket = build_ticket(TicketId::from_u64(12345), &raw, qr, &TicketClock::utc()).unwrap();
        assert!(!ticket.is_redeemed);
        assert_eq!(ticket.redeemed_date, None);
        assert_eq!(ticket.qr_code_string, "TICKET:12345");
        assert_eq!(ticket.event_date, "20.5.2025");
        assert_eq!(ticket.event_time, "15:30");
        assert_eq!(ticket.venue, ticket.category_name);
        assert_eq!(ticket.image_url, None);
    }
}
