//! Remittance provider profiles and the validated provider table

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::core::currency::Currency;
use crate::core::error::{CompareError, ProfileError};

/// How a provider charges its explicit fee, in the source currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeModel {
    Flat { amount: Decimal },
    Percent { percent: Decimal },
    FlatAndPercent { flat: Decimal, percent: Decimal },
}

impl FeeModel {
    /// Fee charged on `source_amount`, or `None` if it overflows.
    pub fn fee_for(&self, source_amount: Decimal) -> Option<Decimal> {
        let percent_of = |percent: Decimal| {
            source_amount
                .checked_mul(percent)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        };
        match *self {
            FeeModel::Flat { amount } => Some(amount),
            FeeModel::Percent { percent } => percent_of(percent),
            FeeModel::FlatAndPercent { flat, percent } => {
                percent_of(percent).and_then(|v| v.checked_add(flat))
            }
        }
    }

    fn is_non_negative(&self) -> bool {
        match *self {
            FeeModel::Flat { amount } => !amount.is_sign_negative(),
            FeeModel::Percent { percent } => !percent.is_sign_negative(),
            FeeModel::FlatAndPercent { flat, percent } => {
                !flat.is_sign_negative() && !percent.is_sign_negative()
            }
        }
    }
}

impl fmt::Display for FeeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeModel::Flat { amount } if amount.is_zero() => write!(f, "no fee"),
            FeeModel::Flat { amount } => write!(f, "{amount} flat"),
            FeeModel::Percent { percent } => write!(f, "{percent}%"),
            FeeModel::FlatAndPercent { flat, percent } => write!(f, "{flat} + {percent}%"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    MobileMoney,
    BankDeposit,
    CashPickup,
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeliveryMethod::MobileMoney => "M-Pesa",
            DeliveryMethod::BankDeposit => "Bank deposit",
            DeliveryMethod::CashPickup => "Cash pickup",
        };
        write!(f, "{label}")
    }
}

impl FromStr for DeliveryMethod {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "mobile_money" | "mobile" | "mpesa" | "m_pesa" => Ok(DeliveryMethod::MobileMoney),
            "bank_deposit" | "bank" => Ok(DeliveryMethod::BankDeposit),
            "cash_pickup" | "cash" => Ok(DeliveryMethod::CashPickup),
            _ => Err(CompareError::InvalidInput(format!(
                "Unknown delivery method: {s}"
            ))),
        }
    }
}

/// Typical latency tier. Ordered fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedClass {
    Instant,
    Minutes,
    Hours,
    Days,
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SpeedClass::Instant => "instant",
            SpeedClass::Minutes => "minutes",
            SpeedClass::Hours => "hours",
            SpeedClass::Days => "days",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOption {
    pub method: DeliveryMethod,
    pub speed: SpeedClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Corridor {
    pub from: Currency,
    pub to: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub name: String,
    pub fee: FeeModel,
    pub spread_percent: Decimal,
    pub delivery: Vec<DeliveryOption>,
    pub corridors: Vec<Corridor>,
    /// Link to start a transfer. `{amount}`, `{from}` and `{to}` are expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ProviderProfile {
    pub fn supports(&self, from: Currency, to: Currency) -> bool {
        self.corridors.iter().any(|c| c.from == from && c.to == to)
    }

    pub fn offers(&self, method: DeliveryMethod) -> bool {
        self.delivery.iter().any(|d| d.method == method)
    }

    /// Fastest speed for `method`, or across all options when `None`.
    pub fn fastest_speed(&self, method: Option<DeliveryMethod>) -> Option<SpeedClass> {
        self.delivery
            .iter()
            .filter(|d| method.is_none_or(|m| d.method == m))
            .map(|d| d.speed)
            .min()
    }

    /// Distinct delivery methods in declaration order.
    pub fn methods(&self) -> Vec<DeliveryMethod> {
        let mut methods = Vec::new();
        for option in &self.delivery {
            if !methods.contains(&option.method) {
                methods.push(option.method);
            }
        }
        methods
    }

    pub fn transfer_url(&self, amount: Decimal, from: Currency, to: Currency) -> Option<String> {
        self.url.as_ref().map(|template| {
            template
                .replace("{amount}", &amount.trunc().to_string())
                .replace("{from}", from.code())
                .replace("{to}", to.code())
        })
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if self.spread_percent.is_sign_negative() || self.spread_percent >= Decimal::ONE_HUNDRED {
            return Err(ProfileError::InvalidSpread {
                name: self.name.clone(),
                spread: self.spread_percent,
            });
        }
        if !self.fee.is_non_negative() {
            return Err(ProfileError::NegativeFee {
                name: self.name.clone(),
            });
        }
        if self.delivery.is_empty() {
            return Err(ProfileError::NoDeliveryOptions(self.name.clone()));
        }
        if self.corridors.is_empty() {
            return Err(ProfileError::NoCorridors(self.name.clone()));
        }
        if let Some(c) = self.corridors.iter().find(|c| c.from == c.to) {
            return Err(ProfileError::DegenerateCorridor {
                name: self.name.clone(),
                currency: c.from,
            });
        }
        Ok(())
    }
}

/// Read-only set of validated provider profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTable {
    profiles: Vec<ProviderProfile>,
}

impl ProviderTable {
    pub fn new(profiles: Vec<ProviderProfile>) -> Result<Self, ProfileError> {
        if profiles.is_empty() {
            return Err(ProfileError::EmptyTable);
        }
        let mut seen = HashSet::new();
        for profile in &profiles {
            profile.validate()?;
            if !seen.insert(profile.name.as_str()) {
                return Err(ProfileError::DuplicateName(profile.name.clone()));
            }
        }
        Ok(Self { profiles })
    }

    pub fn profiles(&self) -> &[ProviderProfile] {
        &self.profiles
    }

    pub fn get(&self, name: &str) -> Option<&ProviderProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Source currencies served into `to` by at least one provider.
    pub fn sources_for(&self, to: Currency) -> Vec<Currency> {
        let mut sources: Vec<Currency> = self
            .profiles
            .iter()
            .flat_map(|p| p.corridors.iter())
            .filter(|c| c.to == to)
            .map(|c| c.from)
            .collect();
        sources.sort();
        sources.dedup();
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile(name: &str) -> ProviderProfile {
        ProviderProfile {
            name: name.to_string(),
            fee: FeeModel::Flat { amount: dec!(3.99) },
            spread_percent: dec!(1.2),
            delivery: vec![
                DeliveryOption {
                    method: DeliveryMethod::BankDeposit,
                    speed: SpeedClass::Hours,
                },
                DeliveryOption {
                    method: DeliveryMethod::MobileMoney,
                    speed: SpeedClass::Instant,
                },
            ],
            corridors: vec![Corridor {
                from: Currency::USD,
                to: Currency::KES,
            }],
            url: Some("https://example.com/send?amount={amount}&from={from}&to={to}".into()),
            notes: None,
        }
    }

    #[test]
    fn test_fee_models() {
        assert_eq!(
            FeeModel::Flat { amount: dec!(2.99) }.fee_for(dec!(500)),
            Some(dec!(2.99))
        );
        assert_eq!(
            FeeModel::Percent { percent: dec!(0.5) }.fee_for(dec!(200)),
            Some(dec!(1))
        );
        let both = FeeModel::FlatAndPercent {
            flat: dec!(1.00),
            percent: dec!(0.41),
        };
        assert_eq!(both.fee_for(dec!(200)), Some(dec!(1.82)));
    }

    #[test]
    fn test_fee_overflow_is_none() {
        let fee = FeeModel::Percent { percent: dec!(250) };
        assert_eq!(fee.fee_for(Decimal::MAX), None);
    }

    #[test]
    fn test_fastest_speed_by_method() {
        let p = profile("Remitly");
        assert_eq!(p.fastest_speed(None), Some(SpeedClass::Instant));
        assert_eq!(
            p.fastest_speed(Some(DeliveryMethod::BankDeposit)),
            Some(SpeedClass::Hours)
        );
        assert_eq!(p.fastest_speed(Some(DeliveryMethod::CashPickup)), None);
    }

    #[test]
    fn test_transfer_url_expansion() {
        let p = profile("Remitly");
        assert_eq!(
            p.transfer_url(dec!(250.75), Currency::USD, Currency::KES).as_deref(),
            Some("https://example.com/send?amount=250&from=USD&to=KES")
        );
    }

    #[test]
    fn test_delivery_method_parse() {
        assert_eq!(
            "m-pesa".parse::<DeliveryMethod>().unwrap(),
            DeliveryMethod::MobileMoney
        );
        assert_eq!(
            "Cash Pickup".parse::<DeliveryMethod>().unwrap(),
            DeliveryMethod::CashPickup
        );
        assert!(matches!(
            "pigeon".parse::<DeliveryMethod>(),
            Err(CompareError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_table_rejects_invalid_profiles() {
        let mut negative_spread = profile("A");
        negative_spread.spread_percent = dec!(-0.1);
        assert!(matches!(
            ProviderTable::new(vec![negative_spread]),
            Err(ProfileError::InvalidSpread { .. })
        ));

        let mut negative_fee = profile("A");
        negative_fee.fee = FeeModel::FlatAndPercent {
            flat: dec!(1),
            percent: dec!(-1),
        };
        assert!(matches!(
            ProviderTable::new(vec![negative_fee]),
            Err(ProfileError::NegativeFee { .. })
        ));

        let mut no_delivery = profile("A");
        no_delivery.delivery.clear();
        assert_eq!(
            ProviderTable::new(vec![no_delivery]),
            Err(ProfileError::NoDeliveryOptions("A".into()))
        );

        let mut no_corridors = profile("A");
        no_corridors.corridors.clear();
        assert_eq!(
            ProviderTable::new(vec![no_corridors]),
            Err(ProfileError::NoCorridors("A".into()))
        );

        assert_eq!(
            ProviderTable::new(vec![profile("A"), profile("A")]),
            Err(ProfileError::DuplicateName("A".into()))
        );
        assert_eq!(ProviderTable::new(vec![]), Err(ProfileError::EmptyTable));
    }

    #[test]
    fn test_profile_yaml_shape() {
        let yaml = r#"
name: LemFi
fee:
  type: percent
  percent: 0.5
spread_percent: 0.8
delivery:
  - method: mobile_money
    speed: minutes
corridors:
  - from: USD
    to: KES
"#;
        let p: ProviderProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(p.fee, FeeModel::Percent { percent: dec!(0.5) });
        assert_eq!(p.spread_percent, dec!(0.8));
        assert!(p.offers(DeliveryMethod::MobileMoney));
        assert!(p.supports(Currency::USD, Currency::KES));
        assert!(!p.supports(Currency::GBP, Currency::KES));
        assert!(p.url.is_none());
    }
}
