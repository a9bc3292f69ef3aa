//! Caller identities resolved from bearer sessions.

// self
use crate::{_prelude::*, auth::UserId};

/// Platform roles carried in the identity provider's user metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Platform administrator.
	Admin,
	#[default]
	/// Regular signed-in user.
	User,
	/// Shop customer.
	Customer,
	/// Donor.
	Donor,
	/// Owner of one or more campaigns.
	CampaignOwner,
	/// Delegated campaign manager.
	CampaignManager,
	/// Platform-wide administrator.
	PlatformAdmin,
	/// Owner of a store.
	StoreOwner,
	/// Delegated store manager.
	StoreManager,
}
impl Role {
	/// Returns the wire label used by the identity provider.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Admin => "admin",
			Self::User => "user",
			Self::Customer => "customer",
			Self::Donor => "donor",
			Self::CampaignOwner => "campaign_owner",
			Self::CampaignManager => "campaign_manager",
			Self::PlatformAdmin => "platform_admin",
			Self::StoreOwner => "store_owner",
			Self::StoreManager => "store_manager",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"admin" => Self::Admin,
			"user" => Self::User,
			"customer" => Self::Customer,
			"donor" => Self::Donor,
			"campaign_owner" => Self::CampaignOwner,
			"campaign_manager" => Self::CampaignManager,
			"platform_admin" => Self::PlatformAdmin,
			"store_owner" => Self::StoreOwner,
			"store_manager" => Self::StoreManager,
			other => return Err(UnknownRole(other.to_owned())),
		})
	}
}

/// Error returned when a role label is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown role: {0}.")]
pub struct UnknownRole(pub String);

/// Authenticated principal behind a bearer session.
///
/// The issuer only requires that *some* identity exists; the token it mints is not
/// bound to these fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Provider-assigned user identifier.
	pub user_id: UserId,
	/// Primary email address; empty when the provider has none on file.
	pub email: String,
	/// Platform role.
	pub role: Role,
}
impl Identity {
	/// Creates an identity with the default [`Role::User`] role.
	pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
		Self { user_id, email: email.into(), role: Role::default() }
	}

	/// Overrides the role.
	pub fn with_role(mut self, role: Role) -> Self {
		self.role = role;

		self
	}

	/// Returns `true` if the identity holds exactly `role`.
	pub fn has_role(&self, role: Role) -> bool {
		self.role == role
	}

	/// Returns `true` if the identity holds any of `roles`.
	pub fn has_any_role(&self, roles: &[Role]) -> bool {
		roles.contains(&self.role)
	}

	/// Returns `true` for administrators.
	pub fn is_admin(&self) -> bool {
		self.has_role(Role::Admin)
	}

	/// Returns `true` for campaign owners.
	pub fn is_campaign_owner(&self) -> bool {
		self.has_role(Role::CampaignOwner)
	}
}
