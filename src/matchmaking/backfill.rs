//! Ticket pairing for BackfillMatches
//!
//! Plain tickets and backfill tickets are pooled separately in arrival
//! order. After every push the builder walks the backfill pool front to
//! back, pairing each backfill ticket with the oldest plain ticket into a
//! proposal. When the plain pool runs dry mid-walk, every backfill ticket
//! up to and including the current one leaves the pool; a walk that
//! completes without exhausting the plain pool leaves the backfill pool
//! intact, so an already-proposed backfill ticket can be proposed again
//! when more tickets arrive.

use crate::matchmaking::string_value;
use crate::pb::matchfunction::backfill_proposal::Team;
use crate::pb::matchfunction::{BackfillProposal, BackfillTicket, Ticket};
use prost_types::{Struct, Timestamp};
use std::collections::VecDeque;
use std::time::SystemTime;
use uuid::Uuid;

const GENERATED_ID_KEY: &str = "generatedID";

#[derive(Default)]
pub struct BackfillBuilder {
    unmatched: VecDeque<Ticket>,
    unmatched_backfill: VecDeque<BackfillTicket>,
}

impl BackfillBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool_len(&self) -> usize {
        self.unmatched.len()
    }

    pub fn backfill_pool_len(&self) -> usize {
        self.unmatched_backfill.len()
    }

    pub fn push_ticket(&mut self, ticket: Ticket) -> Vec<BackfillProposal> {
        self.unmatched.push_back(ticket);
        self.drain()
    }

    pub fn push_backfill_ticket(&mut self, ticket: BackfillTicket) -> Vec<BackfillProposal> {
        self.unmatched_backfill.push_back(ticket);
        self.drain()
    }

    fn drain(&mut self) -> Vec<BackfillProposal> {
        let mut proposals = Vec::new();
        if self.unmatched.is_empty() || self.unmatched_backfill.is_empty() {
            return proposals;
        }

        for i in 0..self.unmatched_backfill.len() {
            let Some(ticket) = self.unmatched.pop_front() else {
                break;
            };
            proposals.push(make_proposal(&self.unmatched_backfill[i], ticket));

            if self.unmatched.is_empty() {
                self.unmatched_backfill.drain(..=i);
                break;
            }
        }
        proposals
    }
}

/// Propose adding a plain ticket's players to a backfill ticket's partial
/// match as a fresh team, carrying the partial match's teams and
/// attributes forward.
fn make_proposal(backfill: &BackfillTicket, ticket: Ticket) -> BackfillProposal {
    let user_ids: Vec<String> = ticket
        .players
        .iter()
        .map(|p| p.player_id.clone())
        .collect();
    let new_team = Team {
        team_id: Uuid::new_v4().to_string(),
        user_ids,
    };

    let partial = backfill.partial_match.as_ref();
    let mut proposed_teams: Vec<Team> = partial.map(|p| p.teams.clone()).unwrap_or_default();
    proposed_teams.push(new_team);

    let mut attributes: Struct = partial
        .and_then(|p| p.match_attributes.clone())
        .unwrap_or_default();
    attributes.fields.insert(
        GENERATED_ID_KEY.to_string(),
        string_value(Uuid::new_v4().to_string()),
    );

    BackfillProposal {
        backfill_ticket_id: backfill.ticket_id.clone(),
        created_at: Some(Timestamp::from(SystemTime::now())),
        added_tickets: vec![ticket],
        proposed_teams,
        proposal_id: Uuid::new_v4().to_string(),
        match_pool: backfill.match_pool.clone(),
        match_session_id: backfill.match_session_id.clone(),
        attributes: Some(attributes),
    }
}
