/// Display Module
///
/// Terminal rendering of session snapshots.
use crate::models::{SessionStatus, Snapshot, Ticket};

/// Render a snapshot as the terminal ticket view
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut lines = Vec::new();

    lines.push(format!("🎟️  Ticketor | {} | {}", snapshot.network_name, snapshot.status));
    lines.push(format!("   Wallet:   {}", snapshot.shortened_address.as_deref().unwrap_or("-")));
    lines.push(format!("   Contract: {}", snapshot.shortened_contract));

    if let Some(message) = &snapshot.error_message {
        lines.push(format!("❌ {}", message));
    }
    if snapshot.status.is_transitioning() {
        lines.push("⏳ Waiting for the wallet...".to_string());
    }

    if snapshot.status == SessionStatus::Connected {
        lines.push(format!(
            "   Tickets:  {} total, {} active, {} redeemed",
            snapshot.ticket_count(),
            snapshot.active_count,
            snapshot.redeemed_count
        ));

        if snapshot.is_loading {
            lines.push("⏳ Loading tickets...".to_string());
        } else if snapshot.tickets.is_empty() {
            lines.push("📭 No tickets found for this wallet".to_string());
        } else {
            for ticket in snapshot.tickets.tickets() {
                lines.extend(render_ticket(ticket));
            }
        }
    }

    lines.join("\n")
}

fn render_ticket(ticket: &Ticket) -> Vec<String> {
    let mut lines = vec![
        format!("   #{} {}", ticket.token_id, ticket.event_name),
        format!("      📅 {} {}", ticket.event_date, ticket.event_time),
        format!("      📍 {}", ticket.venue),
    ];
    if ticket.category_name != ticket.venue {
        lines.push(format!("      🏷️  {}", ticket.category_name));
    }

    match (&ticket.redeemed_date, ticket.is_redeemed) {
        (Some(date), true) => lines.push(format!("      ✅ Redeemed on {}", date)),
        (None, true) => lines.push("      ✅ Redeemed".to_string()),
        (_, false) => lines.push(format!("      🔑 QR: {}", ticket.qr_code_string)),
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketCollection;

    fn ticket(token_id: &str, redeemed_date: Option<&str>) -> Ticket {
        Ticket {
            token_id: token_id.to_string(),
            event_name: "FC Bayern vs. Dortmund".to_string(),
            event_date: "20.5.2025".to_string(),
            event_time: "15:30".to_string(),
            venue: "Allianz Arena - Standard".to_string(),
            category_name: "Allianz Arena - Standard".to_string(),
            image_url: None,
            is_redeemed: redeemed_date.is_some(),
            redeemed_date: redeemed_date.map(str::to_string),
            qr_code_string: if redeemed_date.is_some() { String::new() } else { format!("TICKET:{}", token_id) },
        }
    }

    fn snapshot(status: SessionStatus, tickets: Vec<Ticket>) -> Snapshot {
        let tickets = TicketCollection::new(tickets);
        Snapshot {
            revision: 5,
            status,
            address: Some("0x71c7656ec7ab88b098defb751b7401b5f6d8976f".to_string()),
            shortened_address: Some("0x71c7...976f".to_string()),
            network_name: "Hilbert Hotel Chain".to_string(),
            is_loading: false,
            redeemed_count: tickets.redeemed_count(),
            active_count: tickets.active_count(),
            tickets,
            error_message: None,
            contract_address: "0x9ffd22337ea57dac396891526cac42a03c76abfc".to_string(),
            shortened_contract: "0x9ffd...abfc".to_string(),
            loaded_at: None,
        }
    }

    #[test]
    fn test_render_connected() {
        let view = render_snapshot(&snapshot(
            SessionStatus::Connected,
            vec![ticket("67890", Some("19.5.2025")), ticket("12345", None)],
        ));

        assert!(view.contains("Hilbert Hotel Chain | Connected"));
        assert!(view.contains("0x71c7...976f"));
        assert!(view.contains("2 total, 1 active, 1 redeemed"));
        assert!(view.contains("Redeemed on 19.5.2025"));
        assert!(view.contains("QR: TICKET:12345"));
        assert!(!view.contains("TICKET:67890"));
    }

    #[test]
    fn test_render_error_and_empty() {
        let mut failed = snapshot(SessionStatus::Error, Vec::new());
        failed.address = None;
        failed.shortened_address = None;
        failed.network_name = "Not Connected".to_string();
        failed.error_message = Some("Failed to switch to Hilbert Hotel Chain.".to_string());

        let view = render_snapshot(&failed);
        assert!(view.contains("❌ Failed to switch to Hilbert Hotel Chain."));
        assert!(view.contains("Wallet:   -"));
        assert!(!view.contains("Tickets:"));

        let empty = render_snapshot(&snapshot(SessionStatus::Connected, Vec::new()));
        assert!(empty.contains("No tickets found"));
    }
}
