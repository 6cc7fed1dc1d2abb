//! Picks the next token a department should serve.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::{Token, TokenId};

/// Order two selectable tokens: lower tier first, then oldest status change,
/// then lowest sequence number.
fn priority(a: &Token, b: &Token) -> Ordering {
    a.status
        .tier()
        .cmp(&b.status.tier())
        .then_with(|| a.status_changed_at.cmp(&b.status_changed_at))
        .then_with(|| a.seq.cmp(&b.seq))
}

/// Select the highest-priority eligible token.
///
/// Eligible means dated `today`, in `recall`, `waiting` or `hold`, and not
/// `exclude`. Tiers rank `recall` over `waiting` over `hold` regardless of
/// timestamps; within a tier the oldest status change wins.
pub fn select_next<'a, I>(tokens: I, today: NaiveDate, exclude: Option<TokenId>) -> Option<&'a Token>
where
    I: IntoIterator<Item = &'a Token>,
{
    tokens
        .into_iter()
        .filter(|t| t.date == today)
        .filter(|t| t.status.is_selectable())
        .filter(|t| exclude != Some(t.token))
        .min_by(|a, b| priority(a, b))
}
