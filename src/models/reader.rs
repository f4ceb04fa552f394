//! Reader model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Membership tier, which fixes how many books a reader may hold at once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Membership {
    #[default]
    Basic,
    Premium,
    Vip,
}

impl Membership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Basic => "BASIC",
            Membership::Premium => "PREMIUM",
            Membership::Vip => "VIP",
        }
    }

    /// Maximum number of concurrent active loans for this tier
    pub fn issue_limit(&self) -> i32 {
        match self {
            Membership::Basic => 3,
            Membership::Premium => 5,
            Membership::Vip => 10,
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Membership {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BASIC" => Ok(Membership::Basic),
            "PREMIUM" => Ok(Membership::Premium),
            "VIP" => Ok(Membership::Vip),
            _ => Err(format!("Invalid membership: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for Membership {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Membership {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Membership {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Reader record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reader {
    /// Opaque library card identifier
    pub library_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub membership: Membership,
    /// Derived from `membership`, never set directly
    pub issue_limit: i32,
    pub created_at: DateTime<Utc>,
}

/// Reader lookup result (id, name, phone)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReaderMatch {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

/// Reader holding at least one active loan
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ActiveReader {
    pub library_id: Uuid,
    pub name: String,
    pub phone: String,
    pub membership: Membership,
    pub issue_limit: i32,
    pub active_loans: i64,
}

/// How a reader is designated in a request: library card token or phone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderKey {
    LibraryId(Uuid),
    Phone(String),
}

impl ReaderKey {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match Uuid::parse_str(raw) {
            Ok(id) => ReaderKey::LibraryId(id),
            Err(_) => ReaderKey::Phone(raw.to_string()),
        }
    }
}

impl std::fmt::Display for ReaderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderKey::LibraryId(id) => write!(f, "{}", id),
            ReaderKey::Phone(phone) => write!(f, "phone {}", phone),
        }
    }
}

/// Reader search parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReaderQuery {
    /// Case-insensitive substring of name, phone or email
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ReaderQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    /// Row offset of the page; saturates so absurd page numbers yield an empty page
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }
}

/// Create reader request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReader {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 13, message = "Phone must be 1-13 characters"))]
    pub phone: String,
    #[validate(email(message = "Invalid email format"), length(max = 100))]
    pub email: String,
    #[validate(length(max = 150, message = "Address must be at most 150 characters"))]
    pub address: String,
    pub membership: Option<Membership>,
}

impl CreateReader {
    /// Trim every text field; validation runs on the trimmed values
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
            membership: self.membership,
        }
    }
}

/// Change membership request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMembership {
    pub membership: Membership,
}
