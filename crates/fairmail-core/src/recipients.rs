//! Recipient extraction for one fair.

use crate::address::{EmailAddress, parse_cell};
use crate::dataset::{Dataset, ResolvedColumns};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Ordered, case-insensitively unique addresses for one fair.
///
/// The first spelling seen wins: adding `A@B.com` after `a@b.com` is a
/// no-op.
#[derive(Debug, Clone, Default)]
pub struct RecipientList {
    addresses: Vec<EmailAddress>,
    seen: HashSet<String>,
}

impl RecipientList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an address unless an equal one (ignoring case) is present.
    ///
    /// Returns true if the address was added.
    pub fn push(&mut self, address: EmailAddress) -> bool {
        if self.seen.insert(address.dedup_key()) {
            self.addresses.push(address);
            true
        } else {
            false
        }
    }

    /// Returns true if an equal address (ignoring case) is present.
    #[must_use]
    pub fn contains(&self, address: &EmailAddress) -> bool {
        self.seen.contains(&address.dedup_key())
    }

    /// Number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Returns true if there are no recipients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Iterates in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, EmailAddress> {
        self.addresses.iter()
    }

    /// Recipients as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[EmailAddress] {
        &self.addresses
    }
}

impl PartialEq for RecipientList {
    fn eq(&self, other: &Self) -> bool {
        self.addresses == other.addresses
    }
}

impl Eq for RecipientList {}

impl Extend<EmailAddress> for RecipientList {
    fn extend<I: IntoIterator<Item = EmailAddress>>(&mut self, iter: I) {
        for address in iter {
            self.push(address);
        }
    }
}

impl FromIterator<EmailAddress> for RecipientList {
    fn from_iter<I: IntoIterator<Item = EmailAddress>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a RecipientList {
    type Item = &'a EmailAddress;
    type IntoIter = std::slice::Iter<'a, EmailAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}

/// Yields `(fair, email_cell)` for rows where both are non-empty.
fn qualifying_rows<'a>(
    dataset: &'a Dataset,
    columns: ResolvedColumns,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    (0..dataset.len()).filter_map(move |row| {
        let fair = dataset.cell(row, columns.fair).trim();
        let email = dataset.cell(row, columns.email).trim();
        (!fair.is_empty() && !email.is_empty()).then_some((fair, email))
    })
}

/// Collects the recipients of one fair in sheet order.
///
/// Both sides are trimmed, then the fair name must match exactly, case
/// included. Every matching email cell
/// is run through [`parse_cell`] and the results are merged without
/// case-insensitive duplicates. No matching rows gives an empty list.
#[must_use]
pub fn extract(dataset: &Dataset, columns: ResolvedColumns, selected_fair: &str) -> RecipientList {
    let selected_fair = selected_fair.trim();
    let recipients: RecipientList = qualifying_rows(dataset, columns)
        .filter(|(fair, _)| *fair == selected_fair)
        .flat_map(|(_, cell)| parse_cell(cell))
        .collect();
    debug!("{} recipients for '{selected_fair}'", recipients.len());
    recipients
}

/// Distinct fair names of usable rows, sorted.
#[must_use]
pub fn list_fairs(dataset: &Dataset, columns: ResolvedColumns) -> Vec<String> {
    qualifying_rows(dataset, columns)
        .map(|(fair, _)| fair.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const COLUMNS: ResolvedColumns = ResolvedColumns { fair: 0, email: 1 };

    fn dataset(rows: &[(&str, &str)]) -> Dataset {
        Dataset::new(
            vec!["Fuar Adı".into(), "E-mail".into()],
            rows.iter()
                .map(|(fair, email)| vec![(*fair).to_string(), (*email).to_string()])
                .collect(),
        )
    }

    fn strings(list: &RecipientList) -> Vec<&str> {
        list.iter().map(EmailAddress::as_str).collect()
    }

    #[test]
    fn test_extract_filters_and_dedups() {
        let data = dataset(&[
            ("Fair X", "a@x.com"),
            ("Fair Y", "b@y.com"),
            ("Fair X", "A@X.com; c@x.com"),
        ]);
        assert_eq!(
            strings(&extract(&data, COLUMNS, "Fair X")),
            ["a@x.com", "c@x.com"]
        );
    }

    #[test]
    fn test_fair_match_is_case_sensitive() {
        let data = dataset(&[("Fair X", "a@x.com")]);
        assert!(extract(&data, COLUMNS, "fair x").is_empty());
    }

    #[test]
    fn test_fair_cells_are_trimmed() {
        let data = dataset(&[("  Gulfood 2025 ", " a@x.com ")]);
        assert_eq!(strings(&extract(&data, COLUMNS, "Gulfood 2025")), ["a@x.com"]);
    }

    #[test]
    fn test_selected_fair_is_trimmed() {
        let data = dataset(&[("Fair X", "a@x.com")]);
        assert_eq!(strings(&extract(&data, COLUMNS, " Fair X ")), ["a@x.com"]);
        assert_eq!(strings(&extract(&data, COLUMNS, "Fair X\t")), ["a@x.com"]);
        assert!(extract(&data, COLUMNS, " fair x ").is_empty());
    }

    #[test]
    fn test_empty_selection_and_no_match() {
        let data = dataset(&[("Fair X", "a@x.com"), ("", "b@x.com")]);
        assert!(extract(&data, COLUMNS, "").is_empty());
        assert!(extract(&data, COLUMNS, "Fair Z").is_empty());
    }

    #[test]
    fn test_rows_with_only_invalid_addresses_contribute_nothing() {
        let data = dataset(&[("Fair X", "n/a"), ("Fair X", "ok@x.com")]);
        assert_eq!(strings(&extract(&data, COLUMNS, "Fair X")), ["ok@x.com"]);
    }

    #[test]
    fn test_list_fairs_sorted_unique_and_skips_blank_emails() {
        let data = dataset(&[
            ("Sial", "a@x.com"),
            ("Anuga", "b@x.com"),
            (" Sial ", "c@x.com"),
            ("Gulfood", ""),
            ("", "d@x.com"),
        ]);
        assert_eq!(list_fairs(&data, COLUMNS), ["Anuga", "Sial"]);
    }

    #[test]
    fn test_recipient_list_push() {
        let mut list = RecipientList::new();
        assert!(list.push(EmailAddress::parse("Sales@Acme.com").unwrap()));
        assert!(!list.push(EmailAddress::parse("sales@acme.com").unwrap()));
        assert!(list.contains(&EmailAddress::parse("SALES@ACME.COM").unwrap()));
        assert_eq!(strings(&list), ["Sales@Acme.com"]);
    }

    proptest! {
        #[test]
        fn extraction_is_stable_and_unique(
            rows in proptest::collection::vec(
                (
                    prop_oneof!["Fair X", "Fair Y"],
                    "[a-cA-C]{1,2}@[a-b]\\.com( ; [a-cA-C]@b\\.com)?",
                ),
                0..20,
            )
        ) {
            let rows: Vec<(&str, &str)> =
                rows.iter().map(|(f, e)| (f.as_str(), e.as_str())).collect();
            let data = dataset(&rows);

            let first = extract(&data, COLUMNS, "Fair X");
            let second = extract(&data, COLUMNS, "Fair X");
            prop_assert_eq!(&first, &second);

            let keys: HashSet<String> = first.iter().map(EmailAddress::dedup_key).collect();
            prop_assert_eq!(keys.len(), first.len());
        }
    }
}
