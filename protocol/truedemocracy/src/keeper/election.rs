use super::Keeper;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::keys;
use crate::params::ABSTAIN;
use crate::types::{ElectionResult, VoteChoice, VotingMode};

impl Keeper {
    /// Stores (or replaces) the voter's ballot for a person election held as
    /// an issue whose suggestions are the candidates.
    pub fn cast_election_vote(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        issue_name: &str,
        candidate: &str,
        voter: &str,
        choice: VoteChoice,
    ) -> Result<()> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(voter) {
            return Err(Error::unauthorized("only domain members can vote in elections"));
        }
        let i = domain
            .issue_index(issue_name)
            .ok_or_else(|| Error::unknown("issue not found"))?;
        let ballot = match choice {
            VoteChoice::Abstain => {
                if !domain.options.abstention_allowed {
                    return Err(Error::invalid("abstention is not allowed in this domain"));
                }
                ABSTAIN
            }
            VoteChoice::Approve => {
                if domain.issues[i].suggestion_index(candidate).is_none() {
                    return Err(Error::unknown("candidate not found"));
                }
                candidate
            }
        };
        ctx.set(&keys::election_vote(domain_name, issue_name, voter), ballot.as_bytes());
        domain.issues[i].last_activity_at = ctx.block_time();
        self.set_domain(ctx, &domain)?;
        ctx.emit(
            Event::new(events::CAST_ELECTION_VOTE)
                .attr("domain", domain_name)
                .attr("issue", issue_name)
                .attr("voter", voter)
                .attr("ballot", ballot),
        );
        Ok(())
    }

    /// Counts ballots of current members in member order. The first
    /// candidate to reach the top count leads.
    pub fn tally_election(
        &self,
        ctx: &Ctx<'_>,
        domain_name: &str,
        issue_name: &str,
    ) -> Result<ElectionResult> {
        let domain = self.require_domain(ctx, domain_name)?;
        if domain.issue(issue_name).is_none() {
            return Err(Error::unknown("issue not found"));
        }

        let mut counts: Vec<(String, u64)> = Vec::new();
        let mut total = 0u64;
        let mut abstained = 0u64;
        for member in &domain.members {
            let Some(ballot) = ctx.get(&keys::election_vote(domain_name, issue_name, member)) else {
                continue;
            };
            let Ok(ballot) = String::from_utf8(ballot) else {
                continue;
            };
            total += 1;
            if ballot == ABSTAIN {
                abstained += 1;
                continue;
            }
            match counts.iter_mut().find(|(c, _)| *c == ballot) {
                Some((_, n)) => *n += 1,
                None => counts.push((ballot, 1)),
            }
        }

        let mut result = ElectionResult {
            total,
            abstained,
            ..ElectionResult::default()
        };
        for (candidate, votes) in counts {
            if votes > result.votes {
                result.candidate = candidate;
                result.votes = votes;
            }
        }
        result.elected = match domain.options.voting_mode {
            VotingMode::SimpleMajority => result.votes * 2 > total - abstained,
            VotingMode::AbsoluteMajority => result.votes * 2 > domain.members.len() as u64,
            VotingMode::SystemicConsensing => result.votes > 0,
        };
        Ok(result)
    }
}
