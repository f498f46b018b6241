use crate::context::Ctx;
use crate::error::Result;
use crate::keeper::Keeper;
use crate::keys;
use crate::types::{Coins, Domain, Validator, ValidatorUpdate};
use anyhow::{bail, Context};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub operator_addr: String,
    #[serde(with = "hex::serde")]
    pub pub_key: Vec<u8>,
    pub stake: Coins,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub domains: Vec<Domain>,
    pub validators: Vec<GenesisValidator>,
    #[serde(default)]
    pub verifying_key_hex: String,
}

/// Deterministic key of the devnet validator.
pub fn default_validator_key() -> SigningKey {
    SigningKey::from_bytes(blake3::hash(b"test-validator-0").as_bytes())
}

pub fn default_genesis() -> GenesisState {
    let mut domain = Domain::new("TestParty", "admin1", Coins::pnyx(500_000));
    domain.members.extend(
        ["user1", "user2", "user3", "validator1"]
            .into_iter()
            .map(String::from),
    );
    GenesisState {
        domains: vec![domain],
        validators: vec![GenesisValidator {
            operator_addr: "validator1".to_string(),
            pub_key: default_validator_key().verifying_key().to_bytes().to_vec(),
            stake: Coins::pnyx(100_000),
            domain: "TestParty".to_string(),
        }],
        verifying_key_hex: String::new(),
    }
}

impl GenesisState {
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut names = BTreeSet::new();
        for domain in &self.domains {
            keys::check_name("genesis domain name", &domain.name)?;
            for member in &domain.members {
                keys::check_name("genesis member", member)?;
            }
            if !names.insert(domain.name.as_str()) {
                bail!("duplicate genesis domain {}", domain.name);
            }
        }
        let mut operators = BTreeSet::new();
        for validator in &self.validators {
            if !operators.insert(validator.operator_addr.as_str()) {
                bail!("duplicate genesis validator {}", validator.operator_addr);
            }
        }
        if !self.verifying_key_hex.is_empty() {
            hex::decode(&self.verifying_key_hex).context("verifying_key_hex is not hex")?;
        }
        Ok(())
    }
}

pub fn load_genesis_from_file(path: impl AsRef<Path>) -> anyhow::Result<GenesisState> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading genesis file {}", path.display()))?;
    let genesis: GenesisState = serde_json::from_str(&raw)
        .with_context(|| format!("parsing genesis file {}", path.display()))?;
    genesis.validate()?;
    Ok(genesis)
}

impl Keeper {
    /// Loads domains verbatim, registers validators (skipping any that
    /// fail), and starts the reward timers. Returns the initial validator
    /// set.
    pub fn init_genesis(
        &self,
        ctx: &mut Ctx<'_>,
        genesis: &GenesisState,
    ) -> Result<Vec<ValidatorUpdate>> {
        genesis
            .validate()
            .map_err(|e| crate::Error::invalid(format!("genesis: {e:#}")))?;
        for domain in &genesis.domains {
            self.set_domain(ctx, domain)?;
            self.initialize_purge_schedule(ctx, &domain.name)?;
        }
        for gv in &genesis.validators {
            let registered = self.register_validator(
                ctx,
                &gv.operator_addr,
                &gv.pub_key,
                gv.stake.clone(),
                &gv.domain,
            );
            if let Err(err) = registered {
                warn!("skipping genesis validator {}: {}", gv.operator_addr, err);
            }
        }
        if !genesis.verifying_key_hex.is_empty() {
            let vk = hex::decode(&genesis.verifying_key_hex)
                .map_err(|_| crate::Error::invalid("verifying_key_hex is not hex"))?;
            self.set_verifying_key(ctx, &vk);
        }
        self.init_reward_state(ctx)?;
        let updates = self.build_validator_updates(ctx)?;
        info!(
            "genesis loaded: {} domains, {} validators",
            genesis.domains.len(),
            updates.len()
        );
        Ok(updates)
    }

    pub fn export_genesis(&self, ctx: &Ctx<'_>) -> Result<GenesisState> {
        let validators = ctx
            .scan(keys::VALIDATOR_PREFIX.as_bytes())
            .into_iter()
            .map(|(_, value)| crate::codec::decode::<Validator>(&value))
            .map(|v| {
                v.map(|v| GenesisValidator {
                    domain: v.domains.first().cloned().unwrap_or_default(),
                    operator_addr: v.operator_addr,
                    pub_key: v.pub_key,
                    stake: v.stake,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GenesisState {
            domains: self.all_domains(ctx)?,
            validators,
            verifying_key_hex: self.get_verifying_key(ctx).map(hex::encode).unwrap_or_default(),
        })
    }
}
