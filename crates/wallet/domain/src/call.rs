//! Typed contract calls handed to a connection.
//!
//! Calls are descriptors: they name the target contract, the function and its arguments, and
//! leave encoding to whatever sits behind the connection.

use alloy_primitives::{Address, U256};
use bon::Builder;
use dissolve_derive::Dissolve;
use strum::{Display, IntoStaticStr};

use crate::{
    request::{WalletCreationRequest, WalletCreationRequestDissolved},
    tx::TransactionRequest,
};

/// Arguments of the factory's `createMultiSigWalletAndHandler` function.
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
pub struct CreateWalletCall {
    owners: Vec<Address>,
    minimum_threshold: U256,
    initial_approvals: U256,
    initial_votes: U256,
    name: String,
}

impl CreateWalletCall {
    /// Returns the owners.
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Returns the minimum threshold.
    pub fn minimum_threshold(&self) -> U256 {
        self.minimum_threshold
    }

    /// Returns the initial approvals.
    pub fn initial_approvals(&self) -> U256 {
        self.initial_approvals
    }

    /// Returns the initial votes.
    pub fn initial_votes(&self) -> U256 {
        self.initial_votes
    }

    /// Returns the wallet name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<WalletCreationRequest> for CreateWalletCall {
    fn from(request: WalletCreationRequest) -> Self {
        let WalletCreationRequestDissolved {
            owners,
            minimum_threshold,
            initial_approvals,
            initial_votes,
            name,
        } = request.dissolve();

        Self {
            owners,
            minimum_threshold: U256::from(minimum_threshold.get()),
            initial_approvals: U256::from(initial_approvals.get()),
            initial_votes: U256::from(initial_votes.get()),
            name,
        }
    }
}

/// A contract function invocation.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr, Display)]
#[strum(serialize_all = "camelCase")]
pub enum ContractCall {
    /// Deploys a multisig wallet and its handler through the factory.
    CreateMultiSigWalletAndHandler(CreateWalletCall),

    /// Stores a number in the demonstration counter contract.
    SetNumber {
        /// The number to store.
        number: U256,
    },

    /// Submits a transaction to an existing multisig wallet for approval.
    SubmitTransaction(TransactionRequest),
}

impl ContractCall {
    /// Returns the Solidity function signature of the call.
    pub fn signature(&self) -> &'static str {
        match self {
            Self::CreateMultiSigWalletAndHandler(_) => {
                "createMultiSigWalletAndHandler(address[],uint256,uint256,uint256,string)"
            },
            Self::SetNumber { .. } => "setNumber(uint256)",
            Self::SubmitTransaction(TransactionRequest::Raw { .. }) => {
                "submitTransaction(address,uint256,bytes)"
            },
            Self::SubmitTransaction(TransactionRequest::Erc20 { .. }) => {
                "submitTransaction(address,address,uint256,bytes)"
            },
        }
    }

    /// Returns the function name, e.g. `setNumber`.
    pub fn function_name(&self) -> &'static str {
        self.into()
    }

    /// Returns `true` when the call deploys a new wallet.
    pub fn creates_wallet(&self) -> bool {
        matches!(self, Self::CreateMultiSigWalletAndHandler(_))
    }
}

impl From<WalletCreationRequest> for ContractCall {
    fn from(request: WalletCreationRequest) -> Self {
        Self::CreateMultiSigWalletAndHandler(request.into())
    }
}

impl From<TransactionRequest> for ContractCall {
    fn from(request: TransactionRequest) -> Self {
        Self::SubmitTransaction(request)
    }
}

/// A read-only contract function invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, Display)]
#[strum(serialize_all = "camelCase")]
pub enum ViewCall {
    /// Reads the number stored in the demonstration counter contract.
    GetNumber,
}

impl ViewCall {
    /// Returns the Solidity function signature of the call.
    pub fn signature(&self) -> &'static str {
        match self {
            Self::GetNumber => "getNumber()",
        }
    }

    /// Returns the function name, e.g. `getNumber`.
    pub fn function_name(&self) -> &'static str {
        self.into()
    }
}

/// A contract call bound to the contract it targets.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
pub struct CallRequest {
    /// The contract receiving the call: the factory, the counter, or the multisig wallet.
    target: Address,

    /// The function invocation.
    #[builder(into)]
    call: ContractCall,
}

impl CallRequest {
    /// Returns the contract receiving the call.
    pub fn target(&self) -> Address {
        self.target
    }

    /// Returns the function invocation.
    pub fn call(&self) -> &ContractCall {
        &self.call
    }
}

/// The factory's wallet creation event, as carried on the receipt of a creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Dissolve)]
pub struct WalletCreated {
    /// The account that sent the creation call.
    initializer: Address,
    /// The deployed multisig wallet.
    wallet: Address,
    /// The deployed handler contract.
    handler: Address,
}

impl WalletCreated {
    /// Returns the account that sent the creation call.
    pub fn initializer(&self) -> Address {
        self.initializer
    }

    /// Returns the deployed multisig wallet.
    pub fn wallet(&self) -> Address {
        self.wallet
    }

    /// Returns the deployed handler contract.
    pub fn handler(&self) -> Address {
        self.handler
    }
}
