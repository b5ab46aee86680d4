//! Ticket accumulator for MakeMatches
//!
//! Tickets are pooled in arrival order; every time the pool reaches the
//! rule-derived minimum player count, the oldest tickets are drained into
//! a match. One pushed ticket can complete several matches when the
//! minimum is small and the pool is deep.

use crate::matchmaking::rules::GameRules;
use crate::matchmaking::string_value;
use crate::pb::matchfunction::r#match::Team;
use crate::pb::matchfunction::{Match, Ticket};
use prost_types::Struct;
use std::collections::VecDeque;
use uuid::Uuid;

/// Region list attached to every match until latency-based selection
/// exists.
const REGION_PREFERENCES: [&str; 2] = ["us-east-2", "us-west-2"];

const TEAM_ATTRIBUTE_KEY: &str = "small-team-1";

pub struct MatchBuilder {
    rules: GameRules,
    unmatched: VecDeque<Ticket>,
}

impl MatchBuilder {
    pub fn new(rules: GameRules) -> Self {
        Self {
            rules,
            unmatched: VecDeque::new(),
        }
    }

    pub fn pool_len(&self) -> usize {
        self.unmatched.len()
    }

    /// Pool a ticket and drain every match it completes, oldest tickets
    /// first. Each match holds `min(pool, max_players)` tickets; a match
    /// smaller than the maximum is flagged for backfill when the rules
    /// ask for it.
    pub fn push(&mut self, ticket: Ticket) -> Vec<Match> {
        self.unmatched.push_back(ticket);

        let (min_players, max_players) = self.rules.player_bounds();
        let min_players = min_players.max(1);

        let mut matches = Vec::new();
        while self.unmatched.len() >= min_players {
            let num_players = self.unmatched.len().min(max_players);
            let backfill = self.rules.auto_backfill && num_players < max_players;
            let tickets: Vec<Ticket> = self.unmatched.drain(..num_players).collect();
            matches.push(build_match(tickets, backfill));
        }
        matches
    }
}

fn build_match(tickets: Vec<Ticket>, backfill: bool) -> Match {
    let user_ids: Vec<String> = tickets
        .iter()
        .flat_map(|t| t.players.iter().map(|p| p.player_id.clone()))
        .collect();
    let team_id = Uuid::new_v4().to_string();

    let mut match_attributes = Struct::default();
    match_attributes
        .fields
        .insert(TEAM_ATTRIBUTE_KEY.to_string(), string_value(&team_id));

    Match {
        tickets,
        teams: vec![Team { team_id, user_ids }],
        region_preferences: REGION_PREFERENCES.iter().map(|r| r.to_string()).collect(),
        match_attributes: Some(match_attributes),
        backfill,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pb::matchfunction::ticket::PlayerData;

    fn ticket(id: &str, player_ids: &[&str]) -> Ticket {
        Ticket {
            ticket_id: id.to_string(),
            match_pool: "pool-1".to_string(),
            players: player_ids
                .iter()
                .map(|p| PlayerData {
                    player_id: p.to_string(),
                    attributes: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn default_rules() -> GameRules {
        GameRules::from_json("").unwrap()
    }

    #[test]
    fn test_single_ticket_makes_no_match() {
        let mut builder = MatchBuilder::new(default_rules());
        let matches = builder.push(ticket("t1", &["p1"]));
        assert!(matches.is_empty());
        assert_eq!(builder.pool_len(), 1);
    }

    #[test]
    fn test_two_tickets_make_a_two_player_match() {
        let mut builder = MatchBuilder::new(default_rules());
        builder.push(ticket("t1", &["p1"]));
        let matches = builder.push(ticket("t2", &["p2"]));

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.tickets.len(), 2);
        assert_eq!(m.teams.len(), 1);
        assert_eq!(m.teams[0].user_ids, vec!["p1", "p2"]);
        assert!(!m.backfill);
        assert_eq!(m.region_preferences, vec!["us-east-2", "us-west-2"]);
        assert_eq!(builder.pool_len(), 0);
    }

    #[test]
    fn test_matches_drain_oldest_first() {
        let mut builder = MatchBuilder::new(default_rules());
        builder.push(ticket("t1", &["p1"]));
        let first = builder.push(ticket("t2", &["p2"]));
        builder.push(ticket("t3", &["p3"]));
        let second = builder.push(ticket("t4", &["p4"]));

        assert_eq!(first[0].tickets[0].ticket_id, "t1");
        assert_eq!(first[0].tickets[1].ticket_id, "t2");
        assert_eq!(second[0].tickets[0].ticket_id, "t3");
        assert_eq!(second[0].tickets[1].ticket_id, "t4");
    }

    #[test]
    fn test_match_attributes_carry_the_team_id() {
        let mut builder = MatchBuilder::new(default_rules());
        builder.push(ticket("t1", &["p1"]));
        let matches = builder.push(ticket("t2", &["p2"]));

        let m = &matches[0];
        let attrs = m.match_attributes.as_ref().unwrap();
        let value = attrs.fields.get("small-team-1").unwrap();
        match value.kind.as_ref().unwrap() {
            prost_types::value::Kind::StringValue(team_id) => {
                assert_eq!(team_id, &m.teams[0].team_id);
            }
            other => panic!("unexpected attribute kind: {other:?}"),
        }
    }

    #[test]
    fn test_wide_bounds_consume_whole_pool() {
        // min 2, max 4: reaching the minimum drains everything pooled
        let rules = GameRules::from_json(
            r#"{"alliance": {"minNumber": 2, "maxNumber": 4, "playerMinNumber": 1, "playerMaxNumber": 1}}"#,
        )
        .unwrap();
        let mut builder = MatchBuilder::new(rules);
        builder.push(ticket("t1", &["p1"]));

        let matches = builder.push(ticket("t2", &["p2"]));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].tickets.len(), 2);
    }

    #[test]
    fn test_undersized_match_flagged_for_backfill() {
        let rules = GameRules::from_json(
            r#"{
                "autoBackfill": true,
                "alliance": {"minNumber": 2, "maxNumber": 4, "playerMinNumber": 1, "playerMaxNumber": 1}
            }"#,
        )
        .unwrap();
        let mut builder = MatchBuilder::new(rules);
        builder.push(ticket("t1", &["p1"]));
        let matches = builder.push(ticket("t2", &["p2"]));

        assert_eq!(matches.len(), 1);
        assert!(matches[0].backfill);
    }

    #[test]
    fn test_full_match_not_flagged_for_backfill() {
        let rules = GameRules::from_json(
            r#"{
                "autoBackfill": true,
                "alliance": {"minNumber": 2, "maxNumber": 2, "playerMinNumber": 1, "playerMaxNumber": 1}
            }"#,
        )
        .unwrap();
        let mut builder = MatchBuilder::new(rules);
        builder.push(ticket("t1", &["p1"]));
        let matches = builder.push(ticket("t2", &["p2"]));

        assert_eq!(matches.len(), 1);
        assert!(!matches[0].backfill);
    }

    #[test]
    fn test_party_tickets_contribute_all_players() {
        let mut builder = MatchBuilder::new(default_rules());
        builder.push(ticket("t1", &["p1", "p2"]));
        let matches = builder.push(ticket("t2", &["p3"]));

        assert_eq!(matches[0].teams[0].user_ids, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_zero_minimum_with_nonzero_maximum_matches_each_ticket() {
        // min 0, max 4: the minimum is clamped to one ticket so every
        // push drains immediately instead of looping on an empty pool
        let rules = GameRules::from_json(
            r#"{"alliance": {"minNumber": 0, "maxNumber": 2, "playerMinNumber": 0, "playerMaxNumber": 2}}"#,
        )
        .unwrap();
        let mut builder = MatchBuilder::new(rules);

        let matches = builder.push(ticket("t1", &["p1"]));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].tickets.len(), 1);
        assert_eq!(builder.pool_len(), 0);
    }

    #[test]
    fn test_scaled_minimum_above_maximum_leaves_a_remainder() {
        // ship counts scale the minimum past the maximum: the pool fills
        // to four tickets, one capped match drains and two tickets wait
        let rules = GameRules::from_json(
            r#"{
                "shipCountMin": 2,
                "shipCountMax": 2,
                "alliance": {"minNumber": 1, "maxNumber": 2, "playerMinNumber": 1, "playerMaxNumber": 1}
            }"#,
        )
        .unwrap();
        let mut builder = MatchBuilder::new(rules);
        builder.push(ticket("t1", &["p1"]));
        builder.push(ticket("t2", &["p2"]));
        assert!(builder.push(ticket("t3", &["p3"])).is_empty());

        let matches = builder.push(ticket("t4", &["p4"]));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].tickets.len(), 2);
        assert_eq!(builder.pool_len(), 2);
    }
}
