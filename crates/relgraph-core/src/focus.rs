use std::collections::HashMap;

use crate::{Account, Organisation};

/// Global account lookup across every organisation in a snapshot.
/// The first account seen with a given id wins.
pub struct AccountIndex<'a> {
    by_id: HashMap<&'a str, &'a Account>,
}

impl<'a> AccountIndex<'a> {
    pub fn new(organisations: &'a [Organisation]) -> Self {
        let mut by_id = HashMap::new();
        for account in organisations.iter().flat_map(|o| &o.accounts) {
            by_id.entry(account.id.as_str()).or_insert(account);
        }
        Self { by_id }
    }

    pub fn get(&self, account_id: &str) -> Option<&'a Account> {
        self.by_id.get(account_id).copied()
    }
}

/// Accounts of `organisation` to materialize, in the organisation's order.
///
/// With a focus account only that account and its direct lateral neighbours
/// (either link direction) are kept. An unknown focus, or one owned by another
/// organisation, selects nothing.
pub fn select_accounts<'a>(
    organisation: &'a Organisation,
    focus_account_id: Option<&str>,
    index: &AccountIndex<'a>,
) -> Vec<&'a Account> {
    let Some(focus_id) = focus_account_id else {
        return organisation.accounts.iter().collect();
    };

    let focus = organisation
        .accounts
        .iter()
        .find(|a| a.id == focus_id)
        .or_else(|| index.get(focus_id));

    let Some(focus) = focus else {
        tracing::debug!("focus account {} not found", focus_id);
        return Vec::new();
    };

    if focus.organisation_id != organisation.id {
        tracing::trace!(
            "focus account {} belongs to {}, not {}",
            focus_id,
            focus.organisation_id,
            organisation.id
        );
        return Vec::new();
    }

    organisation
        .accounts
        .iter()
        .filter(|a| a.id == focus.id || focus.links_to(&a.id) || a.links_to(&focus.id))
        .collect()
}
