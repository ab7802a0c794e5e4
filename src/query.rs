use std::fmt;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::address::parse_address;
use crate::error::DappError;
use crate::flight::SingleFlight;
use crate::gateway::ContractGateway;
use crate::session::WalletSession;
use crate::status::StatusNotifier;
use crate::types::{BadgeRecord, DateFormat, Expiry};

pub const INVALID_ADDRESS_MESSAGE: &str = "Invalid address. Please check it.";
pub const LOADING_MESSAGE: &str = "Fetching badges...";
pub const EMPTY_MESSAGE: &str = "No badges were found for this address.";
pub const ERROR_MESSAGE: &str = "An error occurred while fetching the badges. Check the logs for details.";
pub const NEVER_EXPIRES: &str = "Never expires";
pub const UNKNOWN_BADGE_TYPE: &str = "Unknown";

/// A badge formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeView {
    pub title: String,
    pub description: String,
    pub issuer: String,
    pub badge_type: String,
    pub issued: String,
    pub validity: String,
    pub evidence_url: String,
}

impl BadgeView {
    pub fn from_record(record: &BadgeRecord, dates: &DateFormat) -> Self {
        let badge_type = match record.badge_type {
            Some(badge_type) => badge_type.label().to_string(),
            None => UNKNOWN_BADGE_TYPE.to_string(),
        };
        let validity = match record.expires_at {
            Expiry::Never => NEVER_EXPIRES.to_string(),
            Expiry::At(secs) => dates.format(secs),
        };

        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            issuer: record.issuer.clone(),
            badge_type,
            issued: dates.format(record.issued_at),
            validity,
            evidence_url: record.evidence_url.clone(),
        }
    }
}

/// What the query result area currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryView {
    Idle,
    Loading,
    Invalid(String),
    Populated(Vec<BadgeView>),
    Empty,
    Error(String),
}

impl fmt::Display for QueryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryView::Idle => Ok(()),
            QueryView::Loading => f.write_str(LOADING_MESSAGE),
            QueryView::Invalid(msg) | QueryView::Error(msg) => f.write_str(msg),
            QueryView::Empty => f.write_str(EMPTY_MESSAGE),
            QueryView::Populated(badges) => {
                write!(f, "Found {} badge(s):", badges.len())?;
                for badge in badges {
                    write!(
                        f,
                        "\n\n{}\n  Description: {}\n  Issued by:   {}\n  Type:        {}\n  Issued on:   {}\n  Valid until: {}\n  Evidence:    {}",
                        badge.title,
                        badge.description,
                        badge.issuer,
                        badge.badge_type,
                        badge.issued,
                        badge.validity,
                        badge.evidence_url,
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Looks up the badges of an address and publishes the result view.
pub struct QueryController {
    flight: SingleFlight,
    dates: DateFormat,
    view: watch::Sender<QueryView>,
}

impl QueryController {
    pub fn new(dates: DateFormat) -> Self {
        let (view, _) = watch::channel(QueryView::Idle);
        Self {
            flight: SingleFlight::new("badge query"),
            dates,
            view,
        }
    }

    pub fn view(&self) -> QueryView {
        self.view.borrow().clone()
    }

    fn render(&self, view: QueryView) -> QueryView {
        self.view.send_replace(view.clone());
        view
    }

    /// Returns the final view when badges were fetched, including an empty result.
    pub async fn query(
        &self,
        session: &WalletSession,
        notifier: &StatusNotifier,
        input: &str,
    ) -> Result<QueryView, DappError> {
        let _guard = self.flight.try_begin().inspect_err(|e| notifier.error(e.message()))?;

        let gateway = ContractGateway::new(session);
        gateway
            .ensure_reader()
            .inspect_err(|e| notifier.error(e.message()))?;

        let Some(holder) = parse_address(input.trim()) else {
            self.render(QueryView::Invalid(INVALID_ADDRESS_MESSAGE.to_string()));
            return Err(DappError::Validation(INVALID_ADDRESS_MESSAGE.to_string()));
        };

        self.render(QueryView::Loading);
        match gateway.query_badges_for_address(holder).await {
            Ok(badges) if badges.is_empty() => {
                info!(holder = %holder, "No badges found");
                Ok(self.render(QueryView::Empty))
            }
            Ok(badges) => {
                info!(holder = %holder, count = badges.len(), "Badges fetched");
                let views = badges
                    .iter()
                    .inspect(|badge| {
                        if badge.badge_type.is_none() {
                            warn!(title = %badge.title, "Badge has an unknown type index");
                        }
                    })
                    .map(|badge| BadgeView::from_record(badge, &self.dates))
                    .collect();
                Ok(self.render(QueryView::Populated(views)))
            }
            Err(e) => {
                warn!(holder = %holder, error = %e, origin = ?e.origin(), "Badge query failed");
                self.render(QueryView::Error(ERROR_MESSAGE.to_string()));
                notifier.error(format!("Failed to fetch badges: {}", e.message()));
                Err(e)
            }
        }
    }
}
