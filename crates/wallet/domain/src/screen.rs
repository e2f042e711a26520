//! Onboarding screens and path resolution.
//!
//! The flow is `Welcome -> GetStarted -> AddWallet | CreateWallet -> Deploying`. Creating a wallet
//! goes through a review dialog (risk warning, then summary) and [`Screen::Deploying`] can only
//! be entered with a validated [`WalletCreationRequest`].

use alloy_primitives::Address;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    address::{AddressError, parse_address},
    request::{WalletCreationRequest, WalletForm, WalletValidationErrors},
};

/// The top-level view selected by the single dynamic path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The onboarding flow.
    Onboarding,
    /// The dashboard of the wallet at the given address.
    Dashboard(Address),
}

impl View {
    /// Resolves a path such as `/0xabc...` into a view.
    ///
    /// An absent segment, an empty one or anything that is not a well-formed address leads to
    /// onboarding.
    pub fn resolve(path: &str) -> Self {
        let slug = path.trim().trim_matches('/');

        match parse_address(slug) {
            Ok(address) => Self::Dashboard(address),
            Err(_) => Self::Onboarding,
        }
    }
}

/// The step of the review dialog shown before deploying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDialog {
    /// The risk warning, which must be acknowledged first.
    RiskWarning(WalletCreationRequest),
    /// The summary of the request, ready to be confirmed.
    Summary(WalletCreationRequest),
}

impl ReviewDialog {
    /// Returns the request under review.
    pub fn request(&self) -> &WalletCreationRequest {
        match self {
            Self::RiskWarning(request) | Self::Summary(request) => request,
        }
    }
}

/// The create wallet screen: the form and, while open, the review dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateWallet {
    form: WalletForm,
    dialog: Option<ReviewDialog>,
}

impl CreateWallet {
    /// Returns the form.
    pub fn form(&self) -> &WalletForm {
        &self.form
    }

    /// Returns the review dialog, if open.
    pub fn dialog(&self) -> Option<&ReviewDialog> {
        self.dialog.as_ref()
    }
}

/// An onboarding screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// The landing screen.
    Welcome,
    /// The choice between adding an existing wallet and creating a new one.
    GetStarted,
    /// The prompt for an existing wallet address.
    AddWallet,
    /// The wallet creation form.
    CreateWallet(CreateWallet),
    /// The deployment of a validated request.
    Deploying(WalletCreationRequest),
}

impl Screen {
    /// Returns the kind of the screen.
    pub fn kind(&self) -> ScreenKind {
        match self {
            Self::Welcome => ScreenKind::Welcome,
            Self::GetStarted => ScreenKind::GetStarted,
            Self::AddWallet => ScreenKind::AddWallet,
            Self::CreateWallet(_) => ScreenKind::CreateWallet,
            Self::Deploying(_) => ScreenKind::Deploying,
        }
    }
}

/// The kind of an onboarding screen, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ScreenKind {
    /// [`Screen::Welcome`].
    Welcome,
    /// [`Screen::GetStarted`].
    GetStarted,
    /// [`Screen::AddWallet`].
    AddWallet,
    /// [`Screen::CreateWallet`].
    CreateWallet,
    /// [`Screen::Deploying`].
    Deploying,
}

/// A user action on the onboarding flow.
#[derive(Debug, Clone, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ScreenAction {
    /// Leave the welcome screen.
    GetStarted,
    /// Choose to add an existing wallet.
    AddExistingWallet,
    /// Choose to create a new wallet.
    CreateNewWallet,
    /// Return to the get started screen.
    Back,
    /// Open the dashboard of an existing wallet, given as text.
    ViewWallet(String),
    /// Open the review dialog for the current form.
    OpenReview,
    /// Acknowledge the risk warning.
    AcknowledgeRisk,
    /// Close the review dialog.
    CancelReview,
    /// Confirm the summary and deploy.
    ConfirmDeploy,
}

/// The outcome of a successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The flow moved to, or stayed on, the given screen.
    Moved(ScreenKind),
    /// The dashboard of the given wallet should be opened.
    OpenWallet(Address),
    /// The request should be deployed; the flow is now on [`Screen::Deploying`].
    Deploy(WalletCreationRequest),
}

/// Errors raised by [`Onboarding::apply`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The action is not available on the current screen.
    #[error("action `{action}` is not available on screen `{screen}`")]
    InvalidTransition {
        /// The current screen.
        screen: ScreenKind,
        /// The rejected action.
        action: &'static str,
    },

    /// The wallet address given to [`ScreenAction::ViewWallet`] is malformed.
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// The form does not validate, so the review cannot be opened.
    #[error("wallet form is invalid: {0}")]
    InvalidForm(WalletValidationErrors),
}

/// The onboarding flow of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Onboarding {
    screen: Screen,
}

impl Default for Onboarding {
    fn default() -> Self {
        Self { screen: Screen::Welcome }
    }
}

impl Onboarding {
    /// Starts a flow on the welcome screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current screen.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Returns the wallet form while on the create wallet screen with no dialog open.
    ///
    /// The form is locked while it is under review.
    pub fn form_mut(&mut self) -> Option<&mut WalletForm> {
        match &mut self.screen {
            Screen::CreateWallet(CreateWallet { form, dialog: None }) => Some(form),
            _ => None,
        }
    }

    /// Applies `action` to the current screen.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::InvalidTransition`] when the action is not available on the screen
    /// - [`TransitionError::InvalidAddress`] when viewing a malformed wallet address
    /// - [`TransitionError::InvalidForm`] when opening the review of an invalid form
    ///
    /// On error the flow is left untouched.
    pub fn apply(&mut self, action: ScreenAction) -> Result<Transition, TransitionError> {
        let invalid = |screen: &Screen, action: &ScreenAction| TransitionError::InvalidTransition {
            screen: screen.kind(),
            action: action.into(),
        };

        let next = match (&self.screen, action) {
            (Screen::Welcome, ScreenAction::GetStarted) => Screen::GetStarted,

            (Screen::GetStarted, ScreenAction::AddExistingWallet) => Screen::AddWallet,
            (Screen::GetStarted, ScreenAction::CreateNewWallet) => {
                Screen::CreateWallet(CreateWallet::default())
            },

            (Screen::AddWallet, ScreenAction::Back) => Screen::GetStarted,
            (Screen::AddWallet, ScreenAction::ViewWallet(input)) => {
                let address = parse_address(input.trim())?;
                return Ok(Transition::OpenWallet(address));
            },

            (Screen::CreateWallet(CreateWallet { dialog: None, .. }), ScreenAction::Back) => {
                Screen::GetStarted
            },
            (Screen::CreateWallet(CreateWallet { form, dialog: None }), ScreenAction::OpenReview) => {
                let request = form.validate().map_err(TransitionError::InvalidForm)?;
                Screen::CreateWallet(CreateWallet {
                    form: form.clone(),
                    dialog: Some(ReviewDialog::RiskWarning(request)),
                })
            },
            (
                Screen::CreateWallet(CreateWallet {
                    form,
                    dialog: Some(ReviewDialog::RiskWarning(request)),
                }),
                ScreenAction::AcknowledgeRisk,
            ) => Screen::CreateWallet(CreateWallet {
                form: form.clone(),
                dialog: Some(ReviewDialog::Summary(request.clone())),
            }),
            (Screen::CreateWallet(CreateWallet { form, dialog: Some(_) }), ScreenAction::CancelReview) => {
                Screen::CreateWallet(CreateWallet { form: form.clone(), dialog: None })
            },
            (
                Screen::CreateWallet(CreateWallet {
                    dialog: Some(ReviewDialog::Summary(request)), ..
                }),
                ScreenAction::ConfirmDeploy,
            ) => Screen::Deploying(request.clone()),

            (screen, action) => return Err(invalid(screen, &action)),
        };

        self.screen = next;

        Ok(match &self.screen {
            Screen::Deploying(request) => Transition::Deploy(request.clone()),
            screen => Transition::Moved(screen.kind()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::WalletFormUpdate;

    fn owner(c: char) -> String {
        format!("0x{}", c.to_string().repeat(40))
    }

    fn on_create_wallet() -> Onboarding {
        let mut flow = Onboarding::new();
        flow.apply(ScreenAction::GetStarted).unwrap();
        flow.apply(ScreenAction::CreateNewWallet).unwrap();
        flow
    }

    fn fill_treasury(flow: &mut Onboarding) {
        let form = flow.form_mut().unwrap();
        form.add_owners(&format!(r#"["{}", "{}", "{}"]"#, owner('1'), owner('2'), owner('3')))
            .unwrap();
        form.update(
            WalletFormUpdate::builder()
                .name("Treasury")
                .minimum_threshold(2)
                .initial_approvals(2)
                .initial_votes(3)
                .build(),
        );
    }

    #[test]
    fn path_resolution() {
        assert_eq!(View::resolve(""), View::Onboarding);
        assert_eq!(View::resolve("/"), View::Onboarding);
        assert_eq!(View::resolve("/hello"), View::Onboarding);
        assert_eq!(View::resolve(&format!("/0x{}", "1".repeat(39))), View::Onboarding);
        assert_eq!(
            View::resolve(&format!("/{}", owner('a'))),
            View::Dashboard(Address::repeat_byte(0xaa))
        );
    }

    #[test]
    fn happy_path_reaches_deploying() {
        let mut flow = on_create_wallet();
        fill_treasury(&mut flow);

        assert_eq!(flow.apply(ScreenAction::OpenReview), Ok(Transition::Moved(ScreenKind::CreateWallet)));
        assert!(matches!(
            flow.screen(),
            Screen::CreateWallet(CreateWallet { dialog: Some(ReviewDialog::RiskWarning(_)), .. })
        ));
        assert!(flow.form_mut().is_none());

        flow.apply(ScreenAction::AcknowledgeRisk).unwrap();
        let Transition::Deploy(request) = flow.apply(ScreenAction::ConfirmDeploy).unwrap() else {
            panic!("expected a deploy transition");
        };

        assert_eq!(request.name(), "Treasury");
        assert_eq!(flow.screen(), &Screen::Deploying(request));
    }

    #[test]
    fn deploying_requires_a_valid_form() {
        let mut flow = on_create_wallet();

        let err = flow.apply(ScreenAction::OpenReview).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidForm(_)));
        assert_eq!(flow.screen().kind(), ScreenKind::CreateWallet);

        let err = flow.apply(ScreenAction::ConfirmDeploy).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
        assert_eq!(flow.screen().kind(), ScreenKind::CreateWallet);
    }

    #[test]
    fn risk_warning_must_be_acknowledged_first() {
        let mut flow = on_create_wallet();
        fill_treasury(&mut flow);
        flow.apply(ScreenAction::OpenReview).unwrap();

        let before = flow.clone();
        assert!(flow.apply(ScreenAction::ConfirmDeploy).is_err());
        assert_eq!(flow, before);

        flow.apply(ScreenAction::CancelReview).unwrap();
        assert!(flow.form_mut().is_some());
    }

    #[test]
    fn add_wallet_opens_dashboard_for_valid_address() {
        let mut flow = Onboarding::new();
        flow.apply(ScreenAction::GetStarted).unwrap();
        flow.apply(ScreenAction::AddExistingWallet).unwrap();

        assert!(matches!(
            flow.apply(ScreenAction::ViewWallet("nope".to_owned())),
            Err(TransitionError::InvalidAddress(_))
        ));
        assert_eq!(
            flow.apply(ScreenAction::ViewWallet(owner('b'))),
            Ok(Transition::OpenWallet(Address::repeat_byte(0xbb)))
        );

        flow.apply(ScreenAction::Back).unwrap();
        assert_eq!(flow.screen(), &Screen::GetStarted);
    }

    #[test]
    fn unavailable_actions_are_rejected() {
        let mut flow = Onboarding::new();

        let err = flow.apply(ScreenAction::Back).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition { screen: ScreenKind::Welcome, action: "back" }
        );
        assert_eq!(flow.screen(), &Screen::Welcome);
    }
}
