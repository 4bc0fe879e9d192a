/// Pipeline Module
///
/// Orchestrates one ticket load cycle: List → Fetch → Normalize.
/// Detail and QR fetches for different ids run concurrently; the cycle only
/// completes once every fetch has settled. A failing id is reported and
/// skipped without affecting the others.
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::{
    error::{GatewayError, NormalizeError},
    gateway::ContractGateway,
    models::{Ticket, TicketCollection, TicketId, WalletAddress},
    transform::{build_ticket, TicketClock},
};

/// Outcome of one load cycle
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub owner: WalletAddress,
    pub ids_listed: usize,
    pub tickets: Vec<Ticket>,
    pub failures: Vec<TicketFailure>,
    pub elapsed_time: Duration,
}

impl LoadReport {
    pub fn success_rate(&self) -> f64 {
        if self.ids_listed == 0 {
            100.0
        } else {
            (self.tickets.len() as f64 / self.ids_listed as f64) * 100.0
        }
    }

    pub fn into_collection(self) -> TicketCollection {
        TicketCollection::new(self.tickets)
    }
}

/// A ticket that could not be normalized
#[derive(Debug, Clone)]
pub struct TicketFailure {
    pub token_id: TicketId,
    pub stage: FetchStage,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Detail,
    QrPayload,
    Format,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStage::Detail => write!(f, "Detail"),
            FetchStage::QrPayload => write!(f, "QrPayload"),
            FetchStage::Format => write!(f, "Format"),
        }
    }
}

impl TicketFailure {
    fn new(token_id: TicketId, err: NormalizeError) -> Self {
        let (stage, retryable) = match &err {
            NormalizeError::Detail(inner) => (FetchStage::Detail, matches!(inner, GatewayError::Network(_))),
            NormalizeError::QrPayload(inner) => (FetchStage::QrPayload, matches!(inner, GatewayError::Network(_))),
            NormalizeError::Timestamp(_) => (FetchStage::Format, false),
        };
        Self { token_id, stage, message: err.to_string(), retryable }
    }
}

/// Run a complete load cycle for `owner`.
///
/// Fails only when the ownership enumeration itself fails; per-ticket problems
/// are collected in the report.
pub async fn load_tickets(
    gateway: &dyn ContractGateway,
    owner: WalletAddress,
    clock: &TicketClock,
) -> Result<LoadReport, GatewayError> {
    let start_time = Instant::now();
    tracing::info!("Loading tickets for {} from {}", owner, gateway.contract_address());

    let ids = gateway.list_owned_ticket_ids(owner).await?;
    let mut report = normalize(gateway, owner, &ids, clock).await;
    report.elapsed_time = start_time.elapsed();

    tracing::info!(
        "Loaded {}/{} tickets for {} in {:.2}s ({:.1}% success)",
        report.tickets.len(),
        report.ids_listed,
        owner,
        report.elapsed_time.as_secs_f64(),
        report.success_rate()
    );
    Ok(report)
}

/// Normalize every id into a ticket, preserving the order of `ids`
pub async fn normalize(
    gateway: &dyn ContractGateway,
    owner: WalletAddress,
    ids: &[TicketId],
    clock: &TicketClock,
) -> LoadReport {
    let start_time = Instant::now();
    let results = join_all(ids.iter().map(|id| normalize_one(gateway, *id, clock))).await;

    let mut tickets = Vec::with_capacity(ids.len());
    let mut failures = Vec::new();
    for (token_id, result) in ids.iter().zip(results) {
        match result {
            Ok(ticket) => tickets.push(ticket),
            Err(e) => {
                tracing::warn!("Skipping ticket {} owned by {}: {}", token_id, owner, e);
                failures.push(TicketFailure::new(*token_id, e));
            }
        }
    }

    LoadReport { owner, ids_listed: ids.len(), tickets, failures, elapsed_time: start_time.elapsed() }
}

async fn normalize_one(
    gateway: &dyn ContractGateway,
    token_id: TicketId,
    clock: &TicketClock,
) -> Result<Ticket, NormalizeError> {
    let raw = gateway.ticket_detail(token_id).await.map_err(NormalizeError::Detail)?;

    let qr_payload = if raw.redeemed {
        None
    } else {
        Some(gateway.qr_payload(token_id).await.map_err(NormalizeError::QrPayload)?)
    };

    build_ticket(token_id, &raw, qr_payload, clock)
}
