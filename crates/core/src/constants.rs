use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fraction of every payment retained by the platform
pub const PLATFORM_FEE_RATE: Decimal = dec!(0.10);

/// Decimal precision for monetary amounts (minor currency units)
pub const MONEY_DECIMAL_PRECISION: u32 = 2;

/// Document store collection for bookings
pub const BOOKINGS_COLLECTION: &str = "bookings";

/// Document store collection for settlement transactions
pub const TRANSACTIONS_COLLECTION: &str = "transactions";

/// Document store collection for property listings
pub const PROPERTIES_COLLECTION: &str = "properties";

/// Document store collection for user accounts (owner financials live here)
pub const USERS_COLLECTION: &str = "users";
