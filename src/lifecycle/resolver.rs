// src/lifecycle/resolver.rs
use crate::config::CommissionConfig;
use crate::domain::commission::{commission_amount, format_money, FULL_RATE_BPS};
use crate::domain::property::{Property, TransactionType};
use crate::errors::ServerError;

/// Decides which commission rate applies to a property and computes the
/// commission for a transaction amount.
#[derive(Debug, Clone)]
pub struct CommissionResolver {
    cfg: CommissionConfig,
}

impl CommissionResolver {
    pub fn new(cfg: CommissionConfig) -> Self {
        Self { cfg }
    }

    pub fn default_rate(&self, transaction_type: TransactionType) -> u32 {
        match transaction_type {
            TransactionType::Sale => self.cfg.sale_default_rate,
            TransactionType::Rental => self.cfg.rental_default_rate,
        }
    }

    /// Precedence: explicit override, then the property's custom rate, then
    /// the transaction-type default. Always within [0, 10000].
    pub fn resolve_rate(&self, property: &Property, explicit_override: Option<u32>) -> u32 {
        explicit_override
            .or(property.custom_commission_rate)
            .unwrap_or_else(|| self.default_rate(property.transaction_type))
            .min(FULL_RATE_BPS)
    }

    /// Validates the transaction amount against the configured bounds and
    /// returns `floor(amount * rate / 10000)`.
    pub fn compute_commission(
        &self,
        transaction_amount: i64,
        rate_bps: u32,
    ) -> Result<i64, ServerError> {
        if transaction_amount < self.cfg.min_transaction_amount {
            return Err(ServerError::Validation(format!(
                "Transaction amount must be at least {}",
                format_money(self.cfg.min_transaction_amount)
            )));
        }
        if transaction_amount > self.cfg.max_transaction_amount {
            return Err(ServerError::Validation(format!(
                "Transaction amount must not exceed {}",
                format_money(self.cfg.max_transaction_amount)
            )));
        }
        validate_rate(rate_bps)?;
        Ok(commission_amount(transaction_amount, rate_bps))
    }
}

pub fn validate_rate(rate_bps: u32) -> Result<(), ServerError> {
    if rate_bps > FULL_RATE_BPS {
        return Err(ServerError::Validation(
            "Commission rate must be between 0 and 10000 basis points (0% to 100%)".into(),
        ));
    }
    Ok(())
}
