//! Multisig wallet creation request and its form.

use core::num::NonZeroU32;

use alloy_primitives::Address;
use dissolve_derive::Dissolve;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    owners::{OwnerError, OwnerList},
    validation::{Collector, ValidationErrors},
};

/// Minimum length, in characters, of a wallet name.
pub const MIN_NAME_LEN: usize = 2;

/// The fields of the wallet creation form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum WalletField {
    /// The owner addresses.
    Owners,
    /// The minimum number of approvals required to execute a transaction or vote.
    MinimumThreshold,
    /// The initial number of approvals required to execute a transaction.
    InitialApprovals,
    /// The initial number of votes required on a proposal.
    InitialVotes,
    /// The display name.
    Name,
}

/// A violation of the wallet creation rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletRuleError {
    /// No owner was provided.
    #[error("at least one owner is required")]
    NoOwners,

    /// An owner appears more than once.
    #[error("duplicate owner address: {0}")]
    DuplicateOwner(Address),

    /// A numeric field is zero or negative.
    #[error("must be at least 1")]
    NotPositive,

    /// The minimum threshold is greater than the owner count.
    #[error("minimum threshold cannot exceed number of owners")]
    ThresholdExceedsOwners,

    /// A value is lower than the minimum threshold.
    #[error("must be at least the minimum threshold")]
    BelowMinimumThreshold,

    /// A value is greater than the owner count.
    #[error("cannot exceed number of owners")]
    ExceedsOwners,

    /// The name is too short.
    #[error("name must be at least {MIN_NAME_LEN} characters long")]
    NameTooShort,
}

/// Validation errors for a wallet creation request.
pub type WalletValidationErrors = ValidationErrors<WalletField, WalletRuleError>;

/// A validated request to deploy a multisig wallet and its handler.
///
/// # Validation
///
/// The request can only be built when:
/// - `owners` is non-empty and duplicate-free
/// - `1 <= minimum_threshold <= owners.len()`
/// - `minimum_threshold <= initial_approvals <= owners.len()`
/// - `minimum_threshold <= initial_votes <= owners.len()`
/// - `name` is at least [`MIN_NAME_LEN`] characters long
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
pub struct WalletCreationRequest {
    /// The wallet owners, in the order they were entered
    owners: Vec<Address>,

    /// Minimum approvals required to execute a transaction and vote on a proposal
    minimum_threshold: NonZeroU32,

    /// Initial number of approvals required to execute a transaction
    initial_approvals: NonZeroU32,

    /// Initial number of votes required on a proposal
    initial_votes: NonZeroU32,

    /// Display name
    name: String,
}

#[bon::bon]
impl WalletCreationRequest {
    /// Creates a wallet creation request, collecting every rule violation.
    ///
    /// # Errors
    ///
    /// Returns all violations, each attached to the offending [`WalletField`].
    #[builder]
    pub fn new(
        owners: Vec<Address>,
        minimum_threshold: i64,
        initial_approvals: i64,
        initial_votes: i64,
        #[builder(into)] name: String,
    ) -> Result<Self, WalletValidationErrors> {
        let mut errors = Collector::new();

        if owners.is_empty() {
            errors.push(WalletField::Owners, WalletRuleError::NoOwners);
        }

        for (i, owner) in owners.iter().enumerate() {
            if owners[..i].contains(owner) {
                errors.push(WalletField::Owners, WalletRuleError::DuplicateOwner(*owner));
            }
        }

        let owner_count = u32::try_from(owners.len()).unwrap_or(u32::MAX);

        let minimum_threshold =
            check_positive(&mut errors, WalletField::MinimumThreshold, minimum_threshold);
        if minimum_threshold.is_some_and(|min| min.get() > owner_count) {
            errors.push(WalletField::MinimumThreshold, WalletRuleError::ThresholdExceedsOwners);
        }

        let initial_approvals = check_bounded(
            &mut errors,
            WalletField::InitialApprovals,
            initial_approvals,
            minimum_threshold,
            owner_count,
        );

        let initial_votes = check_bounded(
            &mut errors,
            WalletField::InitialVotes,
            initial_votes,
            minimum_threshold,
            owner_count,
        );

        if name.chars().count() < MIN_NAME_LEN {
            errors.push(WalletField::Name, WalletRuleError::NameTooShort);
        }

        let request = match (minimum_threshold, initial_approvals, initial_votes) {
            (Some(minimum_threshold), Some(initial_approvals), Some(initial_votes)) => Some(Self {
                owners,
                minimum_threshold,
                initial_approvals,
                initial_votes,
                name,
            }),
            _ => None,
        };

        errors.finish(request)
    }
}

/// Checks that `value` is at least 1.
///
/// Values above `u32::MAX` are kept as `u32::MAX`, which exceeds any owner count.
fn check_positive(
    errors: &mut Collector<WalletField, WalletRuleError>,
    field: WalletField,
    value: i64,
) -> Option<NonZeroU32> {
    let value = NonZeroU32::new(u32::try_from(value.max(0)).unwrap_or(u32::MAX));

    if value.is_none() {
        errors.push(field, WalletRuleError::NotPositive);
    }

    value
}

fn check_bounded(
    errors: &mut Collector<WalletField, WalletRuleError>,
    field: WalletField,
    value: i64,
    minimum_threshold: Option<NonZeroU32>,
    owner_count: u32,
) -> Option<NonZeroU32> {
    let value = check_positive(errors, field, value)?;

    if minimum_threshold.is_some_and(|min| value < min) {
        errors.push(field, WalletRuleError::BelowMinimumThreshold);
    }

    if value.get() > owner_count {
        errors.push(field, WalletRuleError::ExceedsOwners);
    }

    Some(value)
}

impl WalletCreationRequest {
    /// Returns the owners.
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Returns the minimum threshold.
    pub fn minimum_threshold(&self) -> NonZeroU32 {
        self.minimum_threshold
    }

    /// Returns the initial approvals.
    pub fn initial_approvals(&self) -> NonZeroU32 {
        self.initial_approvals
    }

    /// Returns the initial votes.
    pub fn initial_votes(&self) -> NonZeroU32 {
        self.initial_votes
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The in-progress state of the wallet creation form.
///
/// Defaults mirror an empty form: no owners, every threshold at `1` and an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletForm {
    owners: OwnerList,
    minimum_threshold: i64,
    initial_approvals: i64,
    initial_votes: i64,
    name: String,
}

impl Default for WalletForm {
    fn default() -> Self {
        Self {
            owners: OwnerList::new(),
            minimum_threshold: 1,
            initial_approvals: 1,
            initial_votes: 1,
            name: String::new(),
        }
    }
}

/// A partial update of the scalar fields of a [`WalletForm`].
#[derive(Debug, Clone, Default, bon::Builder)]
pub struct WalletFormUpdate {
    #[builder(into)]
    name: Option<String>,
    minimum_threshold: Option<i64>,
    initial_approvals: Option<i64>,
    initial_votes: Option<i64>,
}

impl WalletForm {
    /// Adds owners from free-text input. See [`OwnerList::add`].
    ///
    /// # Errors
    ///
    /// On error the owner list is unchanged.
    pub fn add_owners(&mut self, input: &str) -> Result<&[Address], OwnerError> {
        self.owners.add(input)
    }

    /// Removes an owner, returning whether it was listed.
    pub fn remove_owner(&mut self, owner: &Address) -> bool {
        self.owners.remove(owner)
    }

    /// Applies the provided fields, leaving the others untouched.
    pub fn update(&mut self, update: WalletFormUpdate) {
        let WalletFormUpdate { name, minimum_threshold, initial_approvals, initial_votes } = update;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(minimum_threshold) = minimum_threshold {
            self.minimum_threshold = minimum_threshold;
        }
        if let Some(initial_approvals) = initial_approvals {
            self.initial_approvals = initial_approvals;
        }
        if let Some(initial_votes) = initial_votes {
            self.initial_votes = initial_votes;
        }
    }

    /// Validates the form as a whole.
    ///
    /// # Errors
    ///
    /// Returns every violation, attached to the offending field.
    pub fn validate(&self) -> Result<WalletCreationRequest, WalletValidationErrors> {
        WalletCreationRequest::builder()
            .owners(self.owners.as_slice().to_vec())
            .minimum_threshold(self.minimum_threshold)
            .initial_approvals(self.initial_approvals)
            .initial_votes(self.initial_votes)
            .name(self.name.clone())
            .build()
    }

    /// Returns the owners collected so far.
    pub fn owners(&self) -> &[Address] {
        self.owners.as_slice()
    }

    /// Returns the minimum threshold as entered.
    pub fn minimum_threshold(&self) -> i64 {
        self.minimum_threshold
    }

    /// Returns the initial approvals as entered.
    pub fn initial_approvals(&self) -> i64 {
        self.initial_approvals
    }

    /// Returns the initial votes as entered.
    pub fn initial_votes(&self) -> i64 {
        self.initial_votes
    }

    /// Returns the name as entered.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(n: u8) -> Vec<Address> {
        (1..=n).map(Address::repeat_byte).collect()
    }

    fn request(
        n: u8,
        minimum_threshold: i64,
        initial_approvals: i64,
        initial_votes: i64,
    ) -> Result<WalletCreationRequest, WalletValidationErrors> {
        WalletCreationRequest::builder()
            .owners(owners(n))
            .minimum_threshold(minimum_threshold)
            .initial_approvals(initial_approvals)
            .initial_votes(initial_votes)
            .name("Treasury")
            .build()
    }

    #[test]
    fn treasury_scenario_is_valid() {
        let request = request(3, 2, 2, 3).unwrap();

        assert_eq!(request.owners().len(), 3);
        assert_eq!(request.minimum_threshold().get(), 2);
        assert_eq!(request.initial_approvals().get(), 2);
        assert_eq!(request.initial_votes().get(), 3);
        assert_eq!(request.name(), "Treasury");
    }

    #[test]
    fn minimum_threshold_accepted_within_owner_count() {
        for n in 1..=6u8 {
            for min in 1..=i64::from(n) {
                assert!(request(n, min, min, min).is_ok(), "n={n} min={min}");
            }

            for min in [0, i64::from(n) + 1] {
                let errors = request(n, min, 1, 1).unwrap_err();
                assert!(errors.has_field(&WalletField::MinimumThreshold), "n={n} min={min}");
            }
        }
    }

    #[test]
    fn initial_approvals_bounds() {
        let (n, min) = (5, 2);

        assert!(request(n, min, min, min).is_ok());
        assert!(request(n, min, i64::from(n), min).is_ok());

        for approvals in [min - 1, i64::from(n) + 1] {
            let errors = request(n, min, approvals, min).unwrap_err();
            assert!(errors.has_field(&WalletField::InitialApprovals), "approvals={approvals}");
            assert!(!errors.has_field(&WalletField::MinimumThreshold));
        }
    }

    #[test]
    fn negative_thresholds_are_not_positive() {
        let errors = request(3, -1, -2, 2).unwrap_err();

        assert_eq!(
            errors.for_field(&WalletField::MinimumThreshold).collect::<Vec<_>>(),
            vec![&WalletRuleError::NotPositive]
        );
        assert_eq!(
            errors.for_field(&WalletField::InitialApprovals).collect::<Vec<_>>(),
            vec![&WalletRuleError::NotPositive]
        );
        assert!(!errors.has_field(&WalletField::InitialVotes));

        let errors = request(3, 1, i64::MAX, 1).unwrap_err();
        assert_eq!(
            errors.for_field(&WalletField::InitialApprovals).collect::<Vec<_>>(),
            vec![&WalletRuleError::ExceedsOwners]
        );
    }

    #[test]
    fn name_length_counts_every_character() {
        let build = |name: &str| {
            WalletCreationRequest::builder()
                .owners(owners(1))
                .minimum_threshold(1)
                .initial_approvals(1)
                .initial_votes(1)
                .name(name)
                .build()
        };

        assert!(build("x").unwrap_err().has_field(&WalletField::Name));
        assert_eq!(build(" x").unwrap().name(), " x");
        assert_eq!(build("äö").unwrap().name(), "äö");
    }

    #[test]
    fn initial_votes_bounds() {
        let errors = request(3, 2, 2, 1).unwrap_err();
        assert_eq!(
            errors.for_field(&WalletField::InitialVotes).collect::<Vec<_>>(),
            vec![&WalletRuleError::BelowMinimumThreshold]
        );

        let errors = request(3, 2, 2, 4).unwrap_err();
        assert_eq!(
            errors.for_field(&WalletField::InitialVotes).collect::<Vec<_>>(),
            vec![&WalletRuleError::ExceedsOwners]
        );
    }

    #[test]
    fn threshold_above_owner_count_is_reported_on_its_field() {
        let errors = request(1, 2, 1, 1).unwrap_err();

        let threshold_errors: Vec<_> = errors.for_field(&WalletField::MinimumThreshold).collect();
        assert_eq!(threshold_errors, vec![&WalletRuleError::ThresholdExceedsOwners]);
        assert_eq!(
            WalletRuleError::ThresholdExceedsOwners.to_string(),
            "minimum threshold cannot exceed number of owners"
        );
    }

    #[test]
    fn violations_coexist() {
        let errors = WalletCreationRequest::builder()
            .owners(vec![])
            .minimum_threshold(0)
            .initial_approvals(0)
            .initial_votes(0)
            .name("x")
            .build()
            .unwrap_err();

        for field in [
            WalletField::Owners,
            WalletField::MinimumThreshold,
            WalletField::InitialApprovals,
            WalletField::InitialVotes,
            WalletField::Name,
        ] {
            assert!(errors.has_field(&field), "{field} should be reported");
        }
    }

    #[test]
    fn duplicate_owners_are_rejected() {
        let a = Address::repeat_byte(0xaa);
        let errors = WalletCreationRequest::builder()
            .owners(vec![a, a])
            .minimum_threshold(1)
            .initial_approvals(1)
            .initial_votes(1)
            .name("Duo")
            .build()
            .unwrap_err();

        assert_eq!(
            errors.for_field(&WalletField::Owners).collect::<Vec<_>>(),
            vec![&WalletRuleError::DuplicateOwner(a)]
        );
    }

    #[test]
    fn form_defaults_and_updates() {
        let mut form = WalletForm::default();
        assert_eq!(
            (form.minimum_threshold(), form.initial_approvals(), form.initial_votes()),
            (1, 1, 1)
        );
        assert!(form.validate().unwrap_err().has_field(&WalletField::Owners));

        let input = format!(
            r#"["0x{}", "0x{}", "0x{}"]"#,
            "1".repeat(40),
            "2".repeat(40),
            "3".repeat(40)
        );
        form.add_owners(&input).unwrap();
        form.update(
            WalletFormUpdate::builder()
                .name("Treasury")
                .minimum_threshold(2)
                .initial_approvals(2)
                .initial_votes(3)
                .build(),
        );

        let request = form.validate().unwrap();
        assert_eq!(request.owners(), form.owners());
        assert_eq!(request.initial_votes().get(), 3);
    }
}
