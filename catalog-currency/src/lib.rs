//! Currency Codes and Reference Rates
//!
//! The closed set of currencies the catalog can price in. Every currency is
//! declared once in the `define_currencies!` invocation below, which generates
//! the `CurrencyCode` enum together with its metadata lookups and parsing.
//!
//! Reference rates are expressed as units of the currency per 1 EUR (the ECB
//! convention). They back the simulated rate service used in development; the
//! production cache always asks the remote rate service.
//!
//! # Example
//! ```
//! use catalog_currency::{CurrencyCode, convert_minor};
//!
//! let usd: CurrencyCode = "usd".parse().unwrap();
//! assert_eq!(usd.code(), "USD");
//!
//! // 2.45 EUR at 1.10 USD/EUR
//! assert_eq!(convert_minor(245, 1.10, CurrencyCode::EUR, usd), 270);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;

// Simulated drift, process-wide. Off unless the simulator turns it on.
static DRIFT: AtomicBool = AtomicBool::new(false);

/// Turns simulated rate drift on or off for the whole process.
pub fn set_fluctuation(enabled: bool) {
    DRIFT.store(enabled, Ordering::Relaxed);
}

pub fn fluctuation_enabled() -> bool {
    DRIFT.load(Ordering::Relaxed)
}

/// Moves `reference` by up to `variance_pct` percent in either direction.
fn fluctuate(reference: f64, variance_pct: f64) -> f64 {
    if !fluctuation_enabled() || variance_pct <= 0.0 {
        return reference;
    }
    let spread = variance_pct / 100.0;
    reference * (1.0 + rand::rng().random_range(-spread..=spread))
}

/// Error returned when a string is not one of the supported currency codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCurrency(pub String);

impl std::fmt::Display for UnknownCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown currency: {}", self.0)
    }
}

impl std::error::Error for UnknownCurrency {}

// ─────────────────────────────────────────────────────────────────────────────
// Currency table
// ─────────────────────────────────────────────────────────────────────────────

/// Macro to define the supported currencies.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     Name => ("CODE", "SYMBOL", minor_per_major, per_eur, variance%),
/// }
/// ```
#[macro_export]
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $symbol:literal, $minor_per_major:expr, $per_eur:expr, $variance:expr)
        ),* $(,)?
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum CurrencyCode {
            $($name),*
        }

        impl CurrencyCode {
            pub fn code(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $code),*
                }
            }

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $symbol),*
                }
            }

            /// Number of minor units (cents, pence, ...) in one major unit.
            pub fn minor_units_per_major(&self) -> i64 {
                match self {
                    $(CurrencyCode::$name => $minor_per_major),*
                }
            }

            /// Reference rate: units of this currency per 1 EUR.
            pub fn reference_per_eur(&self) -> f64 {
                match self {
                    $(CurrencyCode::$name => $per_eur),*
                }
            }

            /// Reference rate with simulated fluctuation applied (when enabled).
            pub fn per_eur(&self) -> f64 {
                match self {
                    $(CurrencyCode::$name => fluctuate($per_eur, $variance)),*
                }
            }

            pub fn all() -> &'static [CurrencyCode] {
                &[$(CurrencyCode::$name),*]
            }
        }

        impl std::fmt::Display for CurrencyCode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.code())
            }
        }

        impl std::str::FromStr for CurrencyCode {
            type Err = UnknownCurrency;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $($code => Ok(CurrencyCode::$name),)*
                    _ => Err(UnknownCurrency(s.to_string())),
                }
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    EUR => ("EUR", "€", 100, 1.0, 0.0),
    USD => ("USD", "$", 100, 1.10, 0.5),
    GBP => ("GBP", "£", 100, 0.86, 0.5),
    JPY => ("JPY", "¥", 1, 162.5, 0.8),
    CHF => ("CHF", "Fr", 100, 0.96, 0.3),
    INR => ("INR", "₹", 100, 91.4, 0.3),
    CAD => ("CAD", "$", 100, 1.49, 0.5),
    AUD => ("AUD", "$", 100, 1.66, 0.6),
    SEK => ("SEK", "kr", 100, 11.45, 0.6),
    NOK => ("NOK", "kr", 100, 11.72, 0.6),
    PLN => ("PLN", "zł", 100, 4.31, 0.5),
    CNY => ("CNY", "¥", 100, 7.86, 0.4),
}

// ─────────────────────────────────────────────────────────────────────────────
// Rates and Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Reference rate from `base` to `destination` (units of destination per 1 base).
pub fn reference_rate(base: CurrencyCode, destination: CurrencyCode) -> f64 {
    if base == destination {
        return 1.0;
    }
    destination.reference_per_eur() / base.reference_per_eur()
}

/// Like [`reference_rate`] but with simulated fluctuation applied.
pub fn simulated_rate(base: CurrencyCode, destination: CurrencyCode) -> f64 {
    if base == destination {
        return 1.0;
    }
    destination.per_eur() / base.per_eur()
}

/// Converts an amount in minor units of `from` into minor units of `to`.
///
/// Rounds half away from zero, so 2.45 EUR at 1.10 becomes 2.70 USD.
pub fn convert_minor(amount: i64, rate: f64, from: CurrencyCode, to: CurrencyCode) -> i64 {
    let scale = to.minor_units_per_major() as f64 / from.minor_units_per_major() as f64;
    (amount as f64 * rate * scale).round() as i64
}

/// Formats an amount in minor units with the currency symbol, e.g. `€2.45`.
pub fn format_minor(amount: i64, currency: CurrencyCode) -> String {
    let per_major = currency.minor_units_per_major();
    if per_major == 1 {
        return format!("{}{}", currency.symbol(), amount);
    }
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.abs();
    format!(
        "{}{}{}.{:02}",
        sign,
        currency.symbol(),
        abs / per_major,
        abs % per_major
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
