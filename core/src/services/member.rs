//! Member service: registration, login and profile management.

use crate::authorization::authorize_member;
use crate::environment::{AccessToken, Clock, MemberRepository, PasswordHasher, TokenIssuer};
use crate::error::{ReservationError, Result};
use crate::metrics;
use crate::types::{Actor, Member, MemberId, MemberPatch, MemberView, NewMember};
use std::sync::Arc;
use tracing::{info, warn};

/// Dependencies of the member service
#[derive(Clone)]
pub struct MemberEnvironment {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Member store
    pub members: Arc<dyn MemberRepository>,
    /// Password hashing
    pub hasher: Arc<dyn PasswordHasher>,
    /// Access-token issuance
    pub tokens: Arc<dyn TokenIssuer>,
}

impl MemberEnvironment {
    /// Creates a new environment
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        members: Arc<dyn MemberRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            clock,
            members,
            hasher,
            tokens,
        }
    }
}

/// Member operations
#[derive(Clone)]
pub struct MemberService {
    env: MemberEnvironment,
}

impl MemberService {
    /// Creates a new service
    #[must_use]
    pub const fn new(env: MemberEnvironment) -> Self {
        Self { env }
    }

    /// Registers a new member.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Username or password is blank → `ReservationError::MemberValidation`
    /// - Username is already registered → `ReservationError::UsernameTaken`
    /// - Storage fails → `ReservationError::Storage`
    #[tracing::instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: NewMember) -> Result<MemberView> {
        let username = validate_username(&input.username)?;
        validate_password(&input.password)?;

        if self.env.members.find_by_username(username).await?.is_some() {
            return Err(ReservationError::UsernameTaken(username.to_string()));
        }

        let now = self.env.clock.now();
        let member = Member {
            id: MemberId::new(),
            username: username.to_string(),
            password_hash: self.env.hasher.hash(&input.password).await?,
            role: input.role,
            created_at: now,
            modified_at: now,
        };
        let stored = self.env.members.insert(&member).await?;

        info!(member_id = %stored.id, role = %stored.role, "Member registered");
        metrics::record_member_registered();
        Ok(MemberView::from(stored))
    }

    /// Exchanges credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Username is unknown or the password is wrong → `ReservationError::InvalidCredentials`
    /// - Token encoding fails → `ReservationError::Internal`
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        let Some(member) = self.env.members.find_by_username(username).await? else {
            warn!("Login failed: unknown username");
            return Err(ReservationError::InvalidCredentials);
        };
        if !self.env.hasher.verify(&member.password_hash, password).await {
            warn!(member_id = %member.id, "Login failed: wrong password");
            return Err(ReservationError::InvalidCredentials);
        }

        let token = self.env.tokens.issue(&member, self.env.clock.now())?;
        info!(member_id = %member.id, "Member logged in");
        Ok(token)
    }

    /// Resolves a bearer token to the member it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `ReservationError::TokenValidation` if the token is invalid or
    /// the member no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Member> {
        let claims = self.env.tokens.verify(token, self.env.clock.now())?;
        self.env
            .members
            .find_by_id(claims.member_id)
            .await?
            .ok_or(ReservationError::TokenValidation)
    }

    /// Returns one member.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Member does not exist → `ReservationError::MemberNotFound`
    /// - Storage fails → `ReservationError::Storage`
    pub async fn get(&self, id: MemberId) -> Result<MemberView> {
        self.load(id).await.map(MemberView::from)
    }

    /// Updates the actor's own profile.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - A role change is requested by a non-admin → `ReservationError::AdminRequired`
    /// - A field is blank → `ReservationError::MemberValidation`
    /// - The new username is taken → `ReservationError::UsernameTaken`
    /// - Member does not exist → `ReservationError::MemberNotFound`
    #[tracing::instrument(skip(self, patch), fields(member_id = %actor.id))]
    pub async fn update(&self, actor: &Actor, patch: MemberPatch) -> Result<MemberView> {
        if patch.role.is_some() && !actor.is_admin() {
            return Err(ReservationError::AdminRequired);
        }

        let mut member = self.load(actor.id).await?;
        if patch.is_empty() {
            return Ok(MemberView::from(member));
        }

        if let Some(username) = patch.username.as_deref() {
            let username = validate_username(username)?;
            if let Some(existing) = self.env.members.find_by_username(username).await? {
                if existing.id != member.id {
                    return Err(ReservationError::UsernameTaken(username.to_string()));
                }
            }
            member.username = username.to_string();
        }
        if let Some(password) = patch.password.as_deref() {
            validate_password(password)?;
            member.password_hash = self.env.hasher.hash(password).await?;
        }
        if let Some(role) = patch.role {
            member.role = role;
        }
        member.modified_at = self.env.clock.now();

        let stored = self.env.members.update(&member).await?;
        info!(member_id = %stored.id, "Member updated");
        Ok(MemberView::from(stored))
    }

    /// Deletes a member. Members may delete themselves; admins anyone.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Actor is neither that member nor an admin → `ReservationError::NotAllowed`
    /// - Member does not exist → `ReservationError::MemberNotFound`
    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete(&self, actor: &Actor, id: MemberId) -> Result<()> {
        authorize_member(actor, id)?;
        if !self.env.members.delete(id, self.env.clock.now()).await? {
            return Err(ReservationError::MemberNotFound(id));
        }
        info!(member_id = %id, "Member deleted");
        Ok(())
    }

    async fn load(&self, id: MemberId) -> Result<Member> {
        self.env
            .members
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::MemberNotFound(id))
    }
}

fn validate_username(username: &str) -> Result<&str> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ReservationError::MemberValidation {
            reason: "username must not be empty".into(),
        });
    }
    Ok(trimmed)
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(ReservationError::MemberValidation {
            reason: "password must not be empty".into(),
        });
    }
    Ok(())
}
