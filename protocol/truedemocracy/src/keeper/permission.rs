use super::Keeper;
use crate::context::Ctx;
use crate::crypto::{decode_pub_key_hex, onboarding_message, verify_signature};
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::keys;
use crate::params::PUB_KEY_LEN;
use crate::types::{Domain, OnboardingRequest, OnboardingStatus, RatingSource};
use tracing::info;

/// Whether `key_hex` already rated this exact suggestion.
pub fn has_domain_key_voted(domain: &Domain, issue: &str, suggestion: &str, key_hex: &str) -> bool {
    domain
        .issue(issue)
        .and_then(|i| i.suggestion(suggestion))
        .map(|s| {
            s.ratings.iter().any(|r| match r.source() {
                RatingSource::Signature { domain_pub_key_hex } => domain_pub_key_hex == key_hex,
                _ => false,
            })
        })
        .unwrap_or(false)
}

impl Keeper {
    /// Admits a 32-byte domain key for `member`.
    pub fn join_permission_register(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        member: &str,
        domain_pub_key: &[u8],
    ) -> Result<()> {
        if domain_pub_key.len() != PUB_KEY_LEN {
            return Err(Error::invalid("domain public key must be 32 bytes"));
        }
        let mut domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(member) {
            return Err(Error::unauthorized(
                "only domain members can join the permission register",
            ));
        }
        let key_hex = hex::encode(domain_pub_key);
        if domain.permission_register.contains(&key_hex) {
            return Err(Error::invalid("domain key already registered"));
        }
        domain.permission_register.push(key_hex);
        self.set_domain(ctx, &domain)?;
        ctx.emit(Event::new(events::JOIN_PERMISSION_REGISTER).attr("domain", domain_name));
        Ok(())
    }

    pub fn purge_permission_register(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        caller: &str,
    ) -> Result<()> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        if caller != domain.admin {
            return Err(Error::unauthorized("only the domain admin can purge"));
        }
        let removed = domain.permission_register.len();
        domain.permission_register.clear();
        self.set_domain(ctx, &domain)?;
        ctx.emit(
            Event::new(events::PURGE_PERMISSION_REGISTER)
                .attr("domain", domain_name)
                .attr("removed", removed),
        );
        info!("permission register of {} purged ({} keys)", domain_name, removed);
        Ok(())
    }

    pub fn is_key_authorized(
        &self,
        ctx: &Ctx<'_>,
        domain_name: &str,
        key_hex: &str,
    ) -> Result<bool> {
        Ok(self
            .get_domain(ctx, domain_name)?
            .map(|d| d.permission_register.iter().any(|k| k == key_hex))
            .unwrap_or(false))
    }

    /// One-step onboarding: the caller's global key signs the domain key it
    /// wants admitted. The two keys must differ.
    pub fn onboard_to_domain(
        &self,
        ctx: &mut Ctx<'_>,
        caller: &str,
        domain_name: &str,
        global_pub_key_hex: &str,
        domain_pub_key_hex: &str,
        signature_hex: &str,
    ) -> Result<()> {
        let global_key = decode_pub_key_hex(global_pub_key_hex)?;
        let domain_key = decode_pub_key_hex(domain_pub_key_hex)?;
        if global_key == domain_key {
            return Err(Error::invalid("domain key must differ from the global key"));
        }
        let message = onboarding_message(caller, domain_name, domain_pub_key_hex);
        if !verify_signature(&global_key, message.as_bytes(), signature_hex)? {
            return Err(Error::unauthorized("onboarding signature verification failed"));
        }
        self.join_permission_register(ctx, domain_name, caller, &domain_key)
    }

    pub fn get_onboarding_request(
        &self,
        ctx: &Ctx<'_>,
        domain_name: &str,
        requester: &str,
    ) -> Result<Option<OnboardingRequest>> {
        ctx.load(&keys::onboarding(domain_name, requester))
    }

    /// Files a pending request for the admin to approve or reject.
    pub fn submit_onboarding_request(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        requester: &str,
        domain_pub_key_hex: &str,
    ) -> Result<()> {
        let domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(requester) {
            return Err(Error::unauthorized("only domain members can request onboarding"));
        }
        decode_pub_key_hex(domain_pub_key_hex)?;
        if let Some(existing) = self.get_onboarding_request(ctx, domain_name, requester)? {
            if existing.status == OnboardingStatus::Pending {
                return Err(Error::invalid("an onboarding request is already pending"));
            }
        }
        let request = OnboardingRequest {
            domain: domain_name.to_string(),
            requester: requester.to_string(),
            domain_pub_key_hex: domain_pub_key_hex.to_string(),
            requested_at: ctx.block_time(),
            status: OnboardingStatus::Pending,
        };
        ctx.save(&keys::onboarding(domain_name, requester), &request)?;
        ctx.emit(
            Event::new(events::ONBOARDING_REQUEST)
                .attr("domain", domain_name)
                .attr("requester", requester),
        );
        Ok(())
    }

    fn pending_request_for_admin(
        &self,
        ctx: &Ctx<'_>,
        domain_name: &str,
        requester: &str,
        admin: &str,
    ) -> Result<OnboardingRequest> {
        let domain = self.require_domain(ctx, domain_name)?;
        if admin != domain.admin {
            return Err(Error::unauthorized("only the domain admin can decide onboarding"));
        }
        let request = self
            .get_onboarding_request(ctx, domain_name, requester)?
            .ok_or_else(|| Error::unknown("onboarding request not found"))?;
        if request.status != OnboardingStatus::Pending {
            return Err(Error::invalid("onboarding request is not pending"));
        }
        Ok(request)
    }

    pub fn approve_onboarding_request(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        requester: &str,
        admin: &str,
    ) -> Result<()> {
        let mut request = self.pending_request_for_admin(ctx, domain_name, requester, admin)?;
        let key = decode_pub_key_hex(&request.domain_pub_key_hex)?;
        self.join_permission_register(ctx, domain_name, requester, &key)?;
        request.status = OnboardingStatus::Approved;
        ctx.save(&keys::onboarding(domain_name, requester), &request)?;
        ctx.emit(
            Event::new(events::ONBOARDING_DECISION)
                .attr("domain", domain_name)
                .attr("requester", requester)
                .attr("status", "approved"),
        );
        Ok(())
    }

    pub fn reject_onboarding_request(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        requester: &str,
        admin: &str,
    ) -> Result<()> {
        let mut request = self.pending_request_for_admin(ctx, domain_name, requester, admin)?;
        request.status = OnboardingStatus::Rejected;
        ctx.save(&keys::onboarding(domain_name, requester), &request)?;
        ctx.emit(
            Event::new(events::ONBOARDING_DECISION)
                .attr("domain", domain_name)
                .attr("requester", requester)
                .attr("status", "rejected"),
        );
        Ok(())
    }
}
