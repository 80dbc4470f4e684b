use crate::{
    bet_form::ValidationError,
    gateway::{
        GatewayError,
        RevertKind,
        decode_error,
        revert_name,
    },
    network::NetworkError,
    preflight::LiquidityError,
};
use alloy::primitives::U256;
use std::fmt;

/// Why the contract refused a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevertReason {
    Known { kind: RevertKind, min_stake: U256 },
    Named(String),
    Raw(String),
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertReason::Known { kind, min_stake } => {
                write!(f, "{}", kind.message(*min_stake))
            }
            RevertReason::Named(name) => write!(f, "Reverted: {name}"),
            RevertReason::Raw(message) => write!(f, "{message}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Liquidity(#[from] LiquidityError),
    #[error("{0}")]
    Reverted(RevertReason),
    #[error("User rejected the request.")]
    UserRejected,
}

impl ClientError {
    /// Lifts a gateway failure into the client taxonomy. `min_stake` fills in the
    /// `BelowMinBet` message.
    pub fn from_gateway(err: GatewayError, min_stake: U256) -> Self {
        match err {
            GatewayError::UserRejected => ClientError::UserRejected,
            GatewayError::RpcUnavailable(message) => {
                ClientError::Network(NetworkError::RpcUnavailable(message))
            }
            GatewayError::Rpc(message) => ClientError::Network(NetworkError::Rpc(message)),
            GatewayError::Reverted { data, message } => {
                let data = data.unwrap_or_default();
                let reason = match decode_error(&data) {
                    Some(kind) => RevertReason::Known { kind, min_stake },
                    None => match revert_name(&data) {
                        Some(name) => RevertReason::Named(name),
                        None => RevertReason::Raw(message),
                    },
                };
                ClientError::Reverted(reason)
            }
        }
    }

    /// The one line shown to the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
