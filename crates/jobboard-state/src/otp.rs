//! OTP verification flows: registration, login, password reset and phone
//! re-verification.
//!
//! The flow owns the active challenge and a per-destination resend
//! cooldown. It never writes the session directly; a verified login or
//! registration token is handed to [`SessionStore::set_token`].

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use jobboard_client::{ApiClient, ApiError, RegisterRequest};
use jobboard_models::{
    mask_phone, normalize_phone, validate_email, validate_otp_code, validate_password,
    OtpChallenge, OtpPurpose, UserPatch, ValidationError,
};
use scopeguard::ScopeGuard;
use tracing::{debug, info, warn};

use crate::error::{OtpError, OtpResult};
use crate::session::SessionStore;

/// Phase of the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OtpPhase {
    #[default]
    Idle,
    ChallengeSent,
    Verifying,
    Verified,
    Failed,
}

/// Phase of the three-step password reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPhase {
    #[default]
    Idle,
    OtpRequested,
    OtpVerifying,
    ResetTokenIssued,
    PasswordSubmitting,
    Done,
    Failed,
}

#[derive(Default)]
struct FlowState {
    phase: OtpPhase,
    reset_phase: ResetPhase,
    challenge: Option<OtpChallenge>,
    in_flight: HashSet<OtpPurpose>,
    resend_allowed_at: HashMap<(String, OtpPurpose), Instant>,
}

pub struct OtpFlow {
    client: Arc<ApiClient>,
    session: Arc<SessionStore>,
    resend_cooldown: Duration,
    state: Mutex<FlowState>,
}

impl OtpFlow {
    pub fn new(client: Arc<ApiClient>, session: Arc<SessionStore>, resend_cooldown: Duration) -> Self {
        Self {
            client,
            session,
            resend_cooldown,
            state: Mutex::new(FlowState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> OtpPhase {
        self.state().phase
    }

    pub fn reset_phase(&self) -> ResetPhase {
        self.state().reset_phase
    }

    /// The challenge awaiting verification, if any.
    pub fn challenge(&self) -> Option<OtpChallenge> {
        self.state().challenge.clone()
    }

    /// Time left before another code may be requested. Zero when allowed.
    pub fn resend_cooldown_remaining(&self, phone: &str, purpose: OtpPurpose) -> Duration {
        let Ok(phone) = normalize_phone(phone) else {
            return Duration::ZERO;
        };
        self.state()
            .resend_allowed_at
            .get(&(phone, purpose))
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Discard the challenge, e.g. when the verification dialog is closed.
    /// Resend cooldowns survive.
    pub fn cancel(&self) {
        let mut state = self.state();
        state.challenge = None;
        state.phase = OtpPhase::Idle;
        state.reset_phase = ResetPhase::Idle;
    }

    /// Mark a request for `purpose` as running until the guard drops.
    fn begin(&self, purpose: OtpPurpose) -> OtpResult<ScopeGuard<(), impl FnOnce(()) + '_>> {
        if !self.state().in_flight.insert(purpose) {
            return Err(OtpError::RequestInFlight);
        }
        Ok(scopeguard::guard((), move |_| {
            self.state().in_flight.remove(&purpose);
        }))
    }

    fn expect_challenge(&self, phone: &str, purpose: OtpPurpose) -> OtpResult<()> {
        match &self.state().challenge {
            None => Err(OtpError::NoActiveChallenge),
            Some(c) if c.matches(phone, purpose) => Ok(()),
            Some(_) => Err(OtpError::ChallengeMismatch),
        }
    }

    fn challenge_sent(&self, purpose: OtpPurpose, phone: &str) {
        let mut state = self.state();
        state.challenge = Some(OtpChallenge::new(purpose, phone));
        if purpose == OtpPurpose::PasswordReset {
            state.reset_phase = ResetPhase::OtpRequested;
        } else {
            state.phase = OtpPhase::ChallengeSent;
        }
    }

    fn set_phase(&self, phase: OtpPhase) {
        self.state().phase = phase;
    }

    fn set_reset_phase(&self, phase: ResetPhase) {
        self.state().reset_phase = phase;
    }

    /// Check credentials. On success the server has sent a code to the
    /// registered phone, which is returned.
    pub async fn initiate_login(&self, email: &str, password: &str) -> OtpResult<String> {
        if email.trim().is_empty() {
            return Err(ValidationError::Required { field: "email" }.into());
        }
        if password.is_empty() {
            return Err(ValidationError::Required { field: "password" }.into());
        }
        let _guard = self.begin(OtpPurpose::Login)?;

        let challenge = self
            .client
            .login(email.trim(), password)
            .await
            .map_err(login_error)?;
        let phone = normalize_phone(&challenge.phone).unwrap_or(challenge.phone);

        self.challenge_sent(OtpPurpose::Login, &phone);
        info!(phone = %mask_phone(&phone), "Login code sent");
        Ok(phone)
    }

    /// Create a pending registration; a code goes to the given phone.
    pub async fn initiate_register(&self, request: RegisterRequest) -> OtpResult<()> {
        if request.name.trim().is_empty() {
            return Err(ValidationError::Required { field: "name" }.into());
        }
        validate_email(&request.email)?;
        let phone = normalize_phone(&request.phone)?;
        validate_password(&request.password)?;
        let _guard = self.begin(OtpPurpose::Registration)?;

        let request = RegisterRequest { phone, ..request };
        self.client
            .register(&request)
            .await
            .map_err(register_error)?;

        self.challenge_sent(OtpPurpose::Registration, &request.phone);
        info!(phone = %mask_phone(&request.phone), "Registration code sent");
        Ok(())
    }

    /// Verify a login or registration code. The bearer token is handed to
    /// the session store and also returned.
    ///
    /// A failed attempt keeps the challenge so the user can retry.
    pub async fn verify_otp(&self, phone: &str, code: &str, purpose: OtpPurpose) -> OtpResult<String> {
        validate_otp_code(code)?;
        let phone = normalize_phone(phone)?;
        if !matches!(purpose, OtpPurpose::Login | OtpPurpose::Registration) {
            return Err(OtpError::UnsupportedPurpose(purpose));
        }
        self.expect_challenge(&phone, purpose)?;
        let _guard = self.begin(purpose)?;
        self.set_phase(OtpPhase::Verifying);

        let result = match purpose {
            OtpPurpose::Registration => self.client.verify_registration_otp(&phone, code).await,
            _ => self.client.verify_login_otp(&phone, code).await,
        };

        match result {
            Ok(token) => {
                {
                    let mut state = self.state();
                    state.phase = OtpPhase::Verified;
                    state.challenge = None;
                }
                let _resolving = self.session.set_token(token.clone());
                info!(purpose = %purpose, "Code verified");
                Ok(token)
            }
            Err(e) => {
                self.set_phase(OtpPhase::Failed);
                Err(verify_error(e))
            }
        }
    }

    /// Request a fresh code for the same destination and purpose.
    ///
    /// Throttled per destination and purpose; a failed request releases
    /// the cooldown.
    pub async fn resend_otp(&self, phone: &str, purpose: OtpPurpose) -> OtpResult<()> {
        let phone = normalize_phone(phone)?;
        let key = (phone.clone(), purpose);
        let reserved_until = {
            let mut state = self.state();
            if let Some(c) = &state.challenge {
                if !c.matches(&phone, purpose) {
                    return Err(OtpError::ChallengeMismatch);
                }
            }
            let now = Instant::now();
            if let Some(at) = state.resend_allowed_at.get(&key).filter(|at| **at > now) {
                let remaining = at.duration_since(now);
                return Err(OtpError::ResendCooldown {
                    remaining_secs: remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0),
                });
            }
            let until = now + self.resend_cooldown;
            state.resend_allowed_at.insert(key.clone(), until);
            until
        };

        match self.client.resend_otp(&phone, purpose).await {
            Ok(()) => {
                info!(phone = %mask_phone(&phone), purpose = %purpose, "Code resent");
                Ok(())
            }
            Err(e) => {
                let mut state = self.state();
                if state.resend_allowed_at.get(&key) == Some(&reserved_until) {
                    state.resend_allowed_at.remove(&key);
                }
                warn!(purpose = %purpose, "Resend failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Step 1 of the password reset: send a code to the phone.
    pub async fn forgot_password(&self, phone: &str) -> OtpResult<()> {
        let phone = normalize_phone(phone)?;
        let _guard = self.begin(OtpPurpose::PasswordReset)?;

        if let Err(e) = self.client.forgot_password(&phone).await {
            self.set_reset_phase(ResetPhase::Failed);
            return Err(e.into());
        }
        self.challenge_sent(OtpPurpose::PasswordReset, &phone);
        info!(phone = %mask_phone(&phone), "Password reset code sent");
        Ok(())
    }

    /// Step 2: exchange the code for a single-use reset token.
    ///
    /// The token is returned to the caller and not kept here.
    pub async fn verify_reset_otp(&self, phone: &str, code: &str) -> OtpResult<String> {
        validate_otp_code(code)?;
        let phone = normalize_phone(phone)?;
        self.expect_challenge(&phone, OtpPurpose::PasswordReset)?;
        let _guard = self.begin(OtpPurpose::PasswordReset)?;
        self.set_reset_phase(ResetPhase::OtpVerifying);

        match self.client.verify_reset_otp(&phone, code).await {
            Ok(grant) => {
                let mut state = self.state();
                state.reset_phase = ResetPhase::ResetTokenIssued;
                state.challenge = None;
                Ok(grant.reset_token)
            }
            Err(e) => {
                self.set_reset_phase(ResetPhase::Failed);
                Err(verify_error(e))
            }
        }
    }

    /// Step 3: set the new password with the token from step 2.
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> OtpResult<()> {
        if reset_token.trim().is_empty() {
            return Err(ValidationError::Required { field: "reset token" }.into());
        }
        validate_password(new_password)?;
        let _guard = self.begin(OtpPurpose::PasswordReset)?;
        self.set_reset_phase(ResetPhase::PasswordSubmitting);

        match self.client.reset_password(reset_token, new_password).await {
            Ok(()) => {
                self.set_reset_phase(ResetPhase::Done);
                info!("Password reset");
                Ok(())
            }
            Err(e) => {
                self.set_reset_phase(ResetPhase::Failed);
                Err(reset_token_error(e))
            }
        }
    }

    /// Send a code to a new phone number for the signed-in user.
    pub async fn request_phone_update(&self, new_phone: &str) -> OtpResult<()> {
        let phone = normalize_phone(new_phone)?;
        let token = self.session.token().ok_or(OtpError::NotAuthenticated)?;
        let _guard = self.begin(OtpPurpose::PhoneUpdate)?;

        self.client.request_phone_verification(&token, &phone).await?;
        self.challenge_sent(OtpPurpose::PhoneUpdate, &phone);
        info!(phone = %mask_phone(&phone), "Phone verification code sent");
        Ok(())
    }

    /// Confirm the new number; the session user is patched on success.
    pub async fn verify_phone_update(&self, phone: &str, code: &str) -> OtpResult<()> {
        validate_otp_code(code)?;
        let phone = normalize_phone(phone)?;
        let token = self.session.token().ok_or(OtpError::NotAuthenticated)?;
        self.expect_challenge(&phone, OtpPurpose::PhoneUpdate)?;
        let _guard = self.begin(OtpPurpose::PhoneUpdate)?;
        self.set_phase(OtpPhase::Verifying);

        match self.client.verify_updated_phone(&token, &phone, code).await {
            Ok(()) => {
                {
                    let mut state = self.state();
                    state.phase = OtpPhase::Verified;
                    state.challenge = None;
                }
                if !self.session.update_user(&UserPatch::verified_phone(phone.as_str())) {
                    debug!("No session user to patch after phone update");
                }
                Ok(())
            }
            Err(e) => {
                self.set_phase(OtpPhase::Failed);
                Err(verify_error(e))
            }
        }
    }
}

fn server_message(err: &ApiError) -> String {
    err.failure()
        .map(|f| f.message.clone())
        .unwrap_or_else(|| err.to_string())
}

fn login_error(err: ApiError) -> OtpError {
    let inactive = err
        .failure()
        .is_some_and(|f| f.message_mentions("inactive") || f.message_mentions("deactivated"));
    match err.http_status() {
        Some(403) => OtpError::AccountInactive(server_message(&err)),
        Some(_) if inactive => OtpError::AccountInactive(server_message(&err)),
        Some(401) => OtpError::InvalidCredentials(server_message(&err)),
        _ => OtpError::Api(err),
    }
}

fn register_error(err: ApiError) -> OtpError {
    match err {
        ApiError::Conflict(failure) => OtpError::DuplicateEmail(failure.message),
        other => OtpError::Api(other),
    }
}

fn verify_error(err: ApiError) -> OtpError {
    let Some(status @ (400 | 401 | 410)) = err.http_status() else {
        return OtpError::Api(err);
    };
    let resend_required = status == 410
        || err.failure().is_some_and(|f| {
            ["expired", "resend", "attempts"]
                .iter()
                .any(|needle| f.message_mentions(needle))
        });
    OtpError::InvalidOrExpiredOtp {
        message: server_message(&err),
        resend_required,
    }
}

fn reset_token_error(err: ApiError) -> OtpError {
    match err.http_status() {
        Some(400 | 401 | 410) => OtpError::InvalidResetToken(server_message(&err)),
        _ => OtpError::Api(err),
    }
}
