// Client session state
//
// Unauthenticated -> Authenticated(session) -> Targeted(session, target, token).
// Each transition builds a fresh record; the client swaps it in whole.

use crate::auth::{AccessToken, DeviceTarget, SessionId};
use crate::error::Precondition;

/// Lifecycle state of a [`SessionClient`](crate::SessionClient).
#[derive(Debug, Clone, Default)]
pub enum ClientState {
    /// No Enlighten session yet.
    #[default]
    Unauthenticated,

    /// Logged in to Enlighten; no gateway targeted.
    Authenticated { session: SessionId },

    /// Logged in and holding a token for one gateway.
    ///
    /// `generation` increases every time `token` is replaced, which lets
    /// concurrent callers tell whether someone else already refreshed it.
    Targeted {
        session: SessionId,
        target: DeviceTarget,
        token: AccessToken,
        generation: u64,
    },
}

/// Everything the executor needs for one gateway request.
#[derive(Debug, Clone)]
pub(crate) struct GatewaySnapshot {
    pub target: DeviceTarget,
    pub token: AccessToken,
    pub generation: u64,
}

impl ClientState {
    pub fn session(&self) -> Option<&SessionId> {
        match self {
            Self::Unauthenticated => None,
            Self::Authenticated { session } | Self::Targeted { session, .. } => Some(session),
        }
    }

    pub fn target(&self) -> Option<&DeviceTarget> {
        match self {
            Self::Targeted { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&AccessToken> {
        match self {
            Self::Targeted { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_targeted(&self) -> bool {
        matches!(self, Self::Targeted { .. })
    }

    /// Session and serial for a token request, in precondition order.
    pub(crate) fn token_inputs(&self) -> Result<(SessionId, DeviceTarget), Precondition> {
        let session = self
            .session()
            .filter(|s| !s.is_empty())
            .ok_or(Precondition::NoSession)?;
        let target = self.target().ok_or(Precondition::NoSerial)?;
        Ok((session.clone(), target.clone()))
    }

    pub(crate) fn gateway(&self) -> Result<GatewaySnapshot, Precondition> {
        match self {
            Self::Targeted {
                target,
                token,
                generation,
                ..
            } => Ok(GatewaySnapshot {
                target: target.clone(),
                token: token.clone(),
                generation: *generation,
            }),
            _ => Err(Precondition::NoTarget),
        }
    }

    fn generation(&self) -> u64 {
        match self {
            Self::Targeted { generation, .. } => *generation,
            _ => 0,
        }
    }

    /// New session; an existing target and token are carried over.
    pub(crate) fn with_session(&self, session: SessionId) -> Self {
        match self {
            Self::Targeted {
                target,
                token,
                generation,
                ..
            } => Self::Targeted {
                session,
                target: target.clone(),
                token: token.clone(),
                generation: *generation,
            },
            _ => Self::Authenticated { session },
        }
    }

    /// Point at a (possibly different) gateway with a freshly issued token.
    pub(crate) fn with_target(
        &self,
        target: DeviceTarget,
        token: AccessToken,
    ) -> Result<Self, Precondition> {
        let session = self.session().ok_or(Precondition::NoSession)?.clone();
        Ok(Self::Targeted {
            session,
            target,
            token,
            generation: self.generation() + 1,
        })
    }

    /// Replace the token, discarding the previous one unconditionally.
    pub(crate) fn with_token(&self, token: AccessToken) -> Result<Self, Precondition> {
        match self {
            Self::Targeted {
                session,
                target,
                generation,
                ..
            } => Ok(Self::Targeted {
                session: session.clone(),
                target: target.clone(),
                token,
                generation: generation + 1,
            }),
            Self::Authenticated { .. } => Err(Precondition::NoSerial),
            Self::Unauthenticated => Err(Precondition::NoSession),
        }
    }
}
