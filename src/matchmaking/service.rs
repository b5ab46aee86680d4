//! gRPC match function service
//!
//! Every handler authorizes the caller from request metadata first. The
//! streaming RPCs hand their inbound stream to a free-standing loop
//! function paired with an mpsc channel, which keeps the state machines
//! testable without a gRPC transport.

use crate::auth::AuthorizationInterceptor;
use crate::matchmaking::backfill::BackfillBuilder;
use crate::matchmaking::builder::MatchBuilder;
use crate::matchmaking::rules::GameRules;
use crate::matchmaking::{number_value, struct_is_empty};
use crate::observability::CallMetrics;
use crate::pb::matchfunction::match_function_server::MatchFunction;
use crate::pb::matchfunction::{
    BackfillMakeMatchesRequest, BackfillResponse, EnrichTicketRequest, EnrichTicketResponse,
    GetStatCodesRequest, MakeMatchesRequest, MatchResponse, StatCodesResponse,
    ValidateTicketRequest, ValidateTicketResponse, backfill_make_matches_request,
    make_matches_request,
};
use futures::{Stream, StreamExt};
use prost_types::Struct;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, info};

const ENRICHED_ATTRIBUTE_KEY: &str = "enrichedNumber";
const ENRICHED_ATTRIBUTE_VALUE: f64 = 20.0;

const STREAM_BUFFER: usize = 64;

type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

pub struct MatchFunctionService {
    auth: Arc<AuthorizationInterceptor>,
    metrics: Arc<CallMetrics>,
}

impl MatchFunctionService {
    pub fn new(auth: Arc<AuthorizationInterceptor>, metrics: Arc<CallMetrics>) -> Self {
        Self { auth, metrics }
    }
}

#[tonic::async_trait]
impl MatchFunction for MatchFunctionService {
    async fn get_stat_codes(
        &self,
        request: Request<GetStatCodesRequest>,
    ) -> Result<Response<StatCodesResponse>, Status> {
        self.metrics.record_call("GetStatCodes");
        self.auth.authorize(request.metadata()).await?;

        let request = request.into_inner();
        let rules_json = request.rules.map(|r| r.json).unwrap_or_default();
        GameRules::from_json(&rules_json)?;

        // no stat codes drive these rules
        let response = StatCodesResponse { codes: vec![] };
        debug!(?response, "GetStatCodes");
        Ok(Response::new(response))
    }

    async fn validate_ticket(
        &self,
        request: Request<ValidateTicketRequest>,
    ) -> Result<Response<ValidateTicketResponse>, Status> {
        self.metrics.record_call("ValidateTicket");
        self.auth.authorize(request.metadata()).await?;

        let request = request.into_inner();
        debug!(ticket = ?request.ticket.as_ref().map(|t| &t.ticket_id), "ValidateTicket");
        Ok(Response::new(ValidateTicketResponse { valid_ticket: true }))
    }

    async fn enrich_ticket(
        &self,
        request: Request<EnrichTicketRequest>,
    ) -> Result<Response<EnrichTicketResponse>, Status> {
        self.metrics.record_call("EnrichTicket");
        self.auth.authorize(request.metadata()).await?;

        let mut ticket = request.into_inner().ticket.unwrap_or_default();
        if struct_is_empty(ticket.ticket_attributes.as_ref()) {
            let mut attributes = Struct::default();
            attributes.fields.insert(
                ENRICHED_ATTRIBUTE_KEY.to_string(),
                number_value(ENRICHED_ATTRIBUTE_VALUE),
            );
            ticket.ticket_attributes = Some(attributes);
            info!(ticket_id = %ticket.ticket_id, "ticket enriched");
        }

        Ok(Response::new(EnrichTicketResponse {
            ticket: Some(ticket),
        }))
    }

    type MakeMatchesStream = ResponseStream<MatchResponse>;

    async fn make_matches(
        &self,
        request: Request<Streaming<MakeMatchesRequest>>,
    ) -> Result<Response<Self::MakeMatchesStream>, Status> {
        self.metrics.record_call("MakeMatches");
        self.auth.authorize(request.metadata()).await?;

        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move { run_make_matches(inbound, tx, metrics).await });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    type BackfillMatchesStream = ResponseStream<BackfillResponse>;

    async fn backfill_matches(
        &self,
        request: Request<Streaming<BackfillMakeMatchesRequest>>,
    ) -> Result<Response<Self::BackfillMatchesStream>, Status> {
        self.metrics.record_call("BackfillMatches");
        self.auth.authorize(request.metadata()).await?;

        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move { run_backfill_matches(inbound, tx, metrics).await });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

/// Drive a MakeMatches stream: the first message must carry parameters
/// whose rules parse and validate, every later message must carry a
/// ticket. Any violation ends the stream with `INVALID_ARGUMENT`.
pub async fn run_make_matches<S>(
    mut inbound: S,
    tx: mpsc::Sender<Result<MatchResponse, Status>>,
    metrics: Arc<CallMetrics>,
) where
    S: Stream<Item = Result<MakeMatchesRequest, Status>> + Unpin,
{
    let mut builder: Option<MatchBuilder> = None;
    let mut matches_made = 0u64;

    while let Some(message) = inbound.next().await {
        let request = match message {
            Ok(request) => request,
            Err(status) => {
                error!(%status, "MakeMatches inbound stream failed");
                let _ = tx.send(Err(status)).await;
                return;
            }
        };

        match (&mut builder, request.request_type) {
            (None, Some(make_matches_request::RequestType::Parameters(parameters))) => {
                let rules_json = parameters.rules.map(|r| r.json).unwrap_or_default();
                match GameRules::from_json(&rules_json) {
                    Ok(rules) => {
                        debug!(?rules, "MakeMatches stream opened");
                        builder = Some(MatchBuilder::new(rules));
                    }
                    Err(error) => {
                        error!(%error, "rejecting MakeMatches rules");
                        let _ = tx.send(Err(Status::from(error))).await;
                        return;
                    }
                }
            }
            (None, _) => {
                let _ = tx
                    .send(Err(Status::invalid_argument(
                        "First message must have the expected 'parameters' set.",
                    )))
                    .await;
                return;
            }
            (Some(builder), Some(make_matches_request::RequestType::Ticket(ticket))) => {
                debug!(ticket_id = %ticket.ticket_id, "ticket received");
                let matches = builder.push(ticket);
                if matches.is_empty() {
                    info!(pool = builder.pool_len(), "not enough tickets to make a match");
                }
                for m in matches {
                    metrics.record_match();
                    matches_made += 1;
                    info!("match made");
                    if tx
                        .send(Ok(MatchResponse { r#match: Some(m) }))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }
            (Some(_), _) => {
                let _ = tx
                    .send(Err(Status::invalid_argument(
                        "Message must have the expected 'ticket' set.",
                    )))
                    .await;
                return;
            }
        }
    }

    info!(matches_made, "MakeMatches stream complete");
}

/// Drive a BackfillMatches stream: parameters first, then any mix of
/// plain tickets and backfill tickets.
pub async fn run_backfill_matches<S>(
    mut inbound: S,
    tx: mpsc::Sender<Result<BackfillResponse, Status>>,
    metrics: Arc<CallMetrics>,
) where
    S: Stream<Item = Result<BackfillMakeMatchesRequest, Status>> + Unpin,
{
    use backfill_make_matches_request::RequestType;

    let mut builder: Option<BackfillBuilder> = None;
    let mut proposals_made = 0u64;

    while let Some(message) = inbound.next().await {
        let request = match message {
            Ok(request) => request,
            Err(status) => {
                error!(%status, "BackfillMatches inbound stream failed");
                let _ = tx.send(Err(status)).await;
                return;
            }
        };

        let proposals = match (&mut builder, request.request_type) {
            (None, Some(RequestType::Parameters(parameters))) => {
                let rules_json = parameters.rules.map(|r| r.json).unwrap_or_default();
                match GameRules::from_json(&rules_json) {
                    Ok(rules) => {
                        debug!(?rules, "BackfillMatches stream opened");
                        builder = Some(BackfillBuilder::new());
                        continue;
                    }
                    Err(error) => {
                        error!(%error, "rejecting BackfillMatches rules");
                        let _ = tx.send(Err(Status::from(error))).await;
                        return;
                    }
                }
            }
            (None, _) => {
                let _ = tx
                    .send(Err(Status::invalid_argument(
                        "First message must have the expected 'parameters' set.",
                    )))
                    .await;
                return;
            }
            (Some(builder), Some(RequestType::Ticket(ticket))) => {
                debug!(ticket_id = %ticket.ticket_id, "ticket received");
                builder.push_ticket(ticket)
            }
            (Some(builder), Some(RequestType::BackfillTicket(ticket))) => {
                debug!(ticket_id = %ticket.ticket_id, "backfill ticket received");
                builder.push_backfill_ticket(ticket)
            }
            (Some(_), _) => {
                let _ = tx
                    .send(Err(Status::invalid_argument(
                        "Message must have the expected 'ticket' or 'backfill_ticket' set.",
                    )))
                    .await;
                return;
            }
        };

        if proposals.is_empty() {
            if let Some(builder) = &builder {
                info!(
                    pool = builder.pool_len(),
                    backfill_pool = builder.backfill_pool_len(),
                    "no backfill proposal yet"
                );
            }
        }
        for proposal in proposals {
            metrics.record_proposal();
            proposals_made += 1;
            info!(
                backfill_ticket_id = %proposal.backfill_ticket_id,
                "backfill proposal made"
            );
            if tx
                .send(Ok(BackfillResponse {
                    backfill_proposal: Some(proposal),
                }))
                .await
                .is_err()
            {
                return;
            }
        }
    }

    info!(proposals_made, "BackfillMatches stream complete");
}
