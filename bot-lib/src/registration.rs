//! The join and leave flows, independent of Discord.

use crate::{
    matcher::{Candidate, best_matches},
    provisioning::{GroupOutcome, GuildProvisioner, ProvisionError, RoleOutcome},
    schools::{SchoolCatalog, SchoolRecord},
    selection::{ChoicePrompt, Selection},
};
use itertools::Itertools;
use poise::serenity_prelude::{RoleId, UserId};
use std::time::Duration;

pub struct JoinRequest<'a> {
    pub member: UserId,
    pub query: &'a str,
    /// Moderator added schools, matched alongside the catalog.
    pub custom_schools: &'a [String],
    /// Granted together with the school role.
    pub default_role: Option<RoleId>,
    pub selection_timeout: Duration,
    pub min_members_for_group: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub school: SchoolRecord,
    pub role: RoleOutcome,
    pub group: GroupOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    AlreadyEnrolled { schools: Vec<String> },
    NoMatch,
    TimedOut,
    Joined(Enrollment),
}

pub async fn join_school(
    request: &JoinRequest<'_>,
    catalog: &SchoolCatalog,
    prompt: &impl ChoicePrompt,
    provisioner: &impl GuildProvisioner,
) -> Result<JoinOutcome, ProvisionError> {
    let enrolled = provisioner.school_roles(request.member).await?;
    if !enrolled.is_empty() {
        return Ok(JoinOutcome::AlreadyEnrolled {
            schools: enrolled.into_iter().map(|(_, name)| name).collect(),
        });
    }

    let candidates = catalog.candidates().chain(
        request
            .custom_schools
            .iter()
            .map(|name| Candidate::from(name.as_str())),
    );

    let options = best_matches(request.query, candidates)
        .into_iter()
        .map(|candidate| candidate.name)
        .collect_vec();

    if options.is_empty() {
        return Ok(JoinOutcome::NoMatch);
    }

    let index = match prompt.choose(&options, request.selection_timeout).await? {
        Selection::Chosen(index) => index,
        Selection::TimedOut => return Ok(JoinOutcome::TimedOut),
    };

    let Some(name) = options.get(index) else {
        return Err(ProvisionError::Other(color_eyre::eyre::eyre!(
            "Option {index} picked out of {}",
            options.len()
        )));
    };

    let school = catalog.resolve(name);

    // Grants come last, a failed grouping leaves the member untouched.
    let role = provisioner.ensure_role(&school.name).await?;
    let group = provisioner
        .ensure_group(
            &school.name,
            role.id(),
            request.member,
            request.min_members_for_group,
        )
        .await?;

    provisioner.grant_role(request.member, role.id()).await?;

    if let Some(default_role) = request.default_role {
        provisioner.grant_role(request.member, default_role).await?;
    }

    tracing::info!("{} joined `{}`", request.member, school.name);

    Ok(JoinOutcome::Joined(Enrollment {
        school,
        role,
        group,
    }))
}

/// Removes every school role `member` holds, returning the schools left.
pub async fn leave_school(
    member: UserId,
    provisioner: &impl GuildProvisioner,
) -> Result<Vec<String>, ProvisionError> {
    let enrolled = provisioner.school_roles(member).await?;
    let mut left = Vec::with_capacity(enrolled.len());

    for (role, name) in enrolled {
        provisioner.revoke_role(member, role).await?;
        tracing::info!("{} left `{}`", member, name);
        left.push(name);
    }

    Ok(left)
}
