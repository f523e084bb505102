//! Domain Value Objects
//!
//! Immutable value types for the purchase domain.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// USDC uses 6 decimals on every supported chain
pub const USDC_DECIMALS: u32 = 6;

/// Payment rail accepted by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PaymentMethod {
    /// USDC on Base L2 mainnet
    #[serde(rename = "USDC_BASE_MAINNET")]
    UsdcBaseMainnet,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 1] = [PaymentMethod::UsdcBaseMainnet];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::UsdcBaseMainnet => "USDC_BASE_MAINNET",
        }
    }

    /// CAIP-2 network identifier
    pub const fn network(&self) -> &'static str {
        match self {
            PaymentMethod::UsdcBaseMainnet => "eip155:8453",
        }
    }

    /// Token contract address
    pub const fn asset(&self) -> &'static str {
        match self {
            PaymentMethod::UsdcBaseMainnet => "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913",
        }
    }

    /// EIP-712 domain (name, version) the facilitator needs to check signatures
    pub const fn eip712_domain(&self) -> (&'static str, &'static str) {
        match self {
            PaymentMethod::UsdcBaseMainnet => ("USD Coin", "2"),
        }
    }

    pub const fn currency(&self) -> &'static str {
        match self {
            PaymentMethod::UsdcBaseMainnet => "USDC",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised payment method tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown payment method: {0}")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

/// Non-negative price tagged with the rail it must be paid on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price {
    amount: Decimal,
    payment_method: PaymentMethod,
}

impl Price {
    /// Returns `None` for negative amounts
    pub fn new(amount: Decimal, payment_method: PaymentMethod) -> Option<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return None;
        }
        Some(Self {
            amount,
            payment_method,
        })
    }

    pub fn free(payment_method: PaymentMethod) -> Self {
        Self {
            amount: Decimal::ZERO,
            payment_method,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn is_free(&self) -> bool {
        self.amount.is_zero()
    }

    /// Amount in the token's smallest unit (e.g. 0.20 USDC -> 200000)
    pub fn atomic_units(&self) -> Option<u64> {
        let scale = Decimal::from(10u64.pow(USDC_DECIMALS));
        (self.amount * scale).round().to_u64()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.payment_method.currency())
    }
}
