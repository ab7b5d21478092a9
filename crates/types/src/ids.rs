use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Zero-based insertion index of a film record.
///
/// Positions are handed out in append order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position(pub u64);

impl Position {
	/// Position of the first record.
	pub const FIRST: Self = Self(0);

	/// Position as a slice index, or `None` if it does not fit in `usize`.
	pub fn index(self) -> Option<usize> {
		usize::try_from(self.0).ok()
	}

	/// Position for a slice index.
	pub fn from_index(index: usize) -> Self {
		Self(index as u64)
	}
}

impl From<u64> for Position {
	fn from(value: u64) -> Self {
		Self(value)
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Rejected caller identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("caller account must not be blank")]
pub struct AccountError;

/// Identity of the caller submitting a mutating call.
///
/// The registry never inspects it; the execution environment records it on
/// receipts and in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(String);

impl Account {
	/// Trims `value` and rejects it if nothing is left.
	pub fn new(value: impl AsRef<str>) -> Result<Self, AccountError> {
		let trimmed = value.as_ref().trim();
		if trimmed.is_empty() {
			return Err(AccountError);
		}
		Ok(Self(trimmed.to_owned()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Shortened form such as `0xf39F...2266` for log lines.
	pub fn short(&self) -> String {
		let chars: Vec<char> = self.0.chars().collect();
		if chars.len() <= 10 {
			return self.0.clone();
		}
		let head: String = chars[..6].iter().collect();
		let tail: String = chars[chars.len() - 4..].iter().collect();
		format!("{head}...{tail}")
	}
}

impl TryFrom<String> for Account {
	type Error = AccountError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl From<Account> for String {
	fn from(account: Account) -> Self {
		account.0
	}
}

impl FromStr for Account {
	type Err = AccountError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

impl fmt::Display for Account {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Identifies one deployed registry instance.
///
/// A redeployment gets a fresh id and an empty collection; clients must be
/// configured with the id of the instance they talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentId(pub Uuid);

impl DeploymentId {
	#[must_use]
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}
}

impl fmt::Display for DeploymentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.hyphenated().fmt(f)
	}
}

impl FromStr for DeploymentId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Uuid::parse_str(s).map(Self)
	}
}
