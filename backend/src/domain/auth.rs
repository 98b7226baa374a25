//! Authentication primitives: login credentials, registration input and
//! password reset tokens.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{DisplayName, EmailAddress, UserValidationError};

/// Minimum accepted password length, counted in characters.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Domain error returned when authentication payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// Email was blank or malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// Password shorter than [`PASSWORD_MIN_LEN`].
    WeakPassword { min: usize },
    /// Display name failed validation.
    DisplayName(UserValidationError),
    /// Reset token was blank.
    EmptyResetToken,
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "Invalid email address."),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::WeakPassword { min } => {
                write!(f, "Password should be at least {min} characters.")
            }
            Self::DisplayName(err) => write!(f, "{err}"),
            Self::EmptyResetToken => write!(f, "reset token must not be empty"),
        }
    }
}

impl std::error::Error for AuthValidationError {}

/// Password held in memory that is wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept any non-empty password (used for login, where strength rules
    /// must not leak which accounts predate them).
    pub fn any(raw: &str) -> Result<Self, AuthValidationError> {
        if raw.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Accept a password that satisfies the strength policy.
    pub fn new_secret(raw: &str) -> Result<Self, AuthValidationError> {
        let password = Self::any(raw)?;
        if raw.chars().count() < PASSWORD_MIN_LEN {
            return Err(AuthValidationError::WeakPassword {
                min: PASSWORD_MIN_LEN,
            });
        }
        Ok(password)
    }

    /// Borrow the plaintext for hashing or verification.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised (trimmed, lower-cased).
/// - `password` is non-empty and retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use carlot::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Seller@Example.com", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "seller@example.com");
/// assert_eq!(creds.password().expose(), "hunter22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Password,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email).map_err(|_| AuthValidationError::InvalidEmail)?;
        let password = Password::any(password)?;
        Ok(Self { email, password })
    }

    /// Normalised email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Validated sign-up payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: EmailAddress,
    password: Password,
    display_name: DisplayName,
}

impl Registration {
    /// Validate raw registration input.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email).map_err(|_| AuthValidationError::InvalidEmail)?;
        let password = Password::new_secret(password)?;
        let display_name =
            DisplayName::new(display_name).map_err(AuthValidationError::DisplayName)?;
        Ok(Self {
            email,
            password,
            display_name,
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }
}

/// Opaque single-use reset token as handed to the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetToken(Zeroizing<String>);

impl ResetToken {
    pub fn new(raw: &str) -> Result<Self, AuthValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuthValidationError::EmptyResetToken);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetToken(**redacted**)")
    }
}

/// Token plus replacement password for completing a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetConfirmation {
    token: ResetToken,
    new_password: Password,
}

impl PasswordResetConfirmation {
    pub fn try_from_parts(token: &str, new_password: &str) -> Result<Self, AuthValidationError> {
        Ok(Self {
            token: ResetToken::new(token)?,
            new_password: Password::new_secret(new_password)?,
        })
    }

    pub fn token(&self) -> &ResetToken {
        &self.token
    }

    pub fn new_password(&self) -> &Password {
        &self.new_password
    }
}
