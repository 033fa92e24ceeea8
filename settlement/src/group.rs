//! Group fee optimization for federations

use crate::config::GroupConfig;
use crate::types::{
    DiscountBreakdown, GroupOptimizationRequest, GroupOptimizationResult, OptimizedTransaction,
};
use crate::{Error, Result};
use reference_data::FederationRegistry;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Applies batch-level discounts to a federation's transfers
#[derive(Debug, Clone, Copy)]
pub struct GroupOptimizer<'a> {
    federations: &'a FederationRegistry,
    config: &'a GroupConfig,
}

impl<'a> GroupOptimizer<'a> {
    /// Create optimizer
    pub fn new(federations: &'a FederationRegistry, config: &'a GroupConfig) -> Self {
        Self {
            federations,
            config,
        }
    }

    /// Discount components for a volume and principle count
    pub fn discount(&self, total_volume: Decimal, principle_count: usize) -> DiscountBreakdown {
        let config = self.config;

        let volume_discount = (total_volume / config.volume_step * config.volume_step_discount)
            .min(config.volume_cap);

        let principles = Decimal::from(principle_count as u64);
        let membership_bonus = (principles / Decimal::from(config.principle_divisor)
            * config.principle_step_bonus)
            .min(config.membership_cap);

        let uncapped_total = volume_discount
            + membership_bonus
            + config.cultural_component
            + config.community_component;

        let total_discount = match config.max_total_discount {
            Some(cap) => uncapped_total.min(cap),
            None => uncapped_total,
        };

        DiscountBreakdown {
            volume_discount,
            membership_bonus,
            cultural_component: config.cultural_component,
            community_component: config.community_component,
            uncapped_total,
            total_discount,
            capped: total_discount < uncapped_total,
        }
    }

    /// Optimize fees for a batch
    pub fn optimize(&self, request: &GroupOptimizationRequest) -> Result<GroupOptimizationResult> {
        let federation = self
            .federations
            .get(&request.federation_id)
            .ok_or_else(|| Error::FederationNotFound(request.federation_id.clone()))?;

        if request.transactions.is_empty() {
            return Err(Error::EmptyBatch);
        }

        if let Some(bad) = request.transactions.iter().find(|t| t.amount <= Decimal::ZERO) {
            return Err(Error::InvalidAmount(format!(
                "group transaction amount must be positive, got {}",
                bad.amount
            )));
        }

        let total_volume = checked_sum(request.transactions.iter().map(|t| t.amount))?;
        let discount = self.discount(total_volume, federation.principles.len());

        if discount.capped {
            warn!(
                federation = %federation.id,
                uncapped = %discount.uncapped_total,
                applied = %discount.total_discount,
                "Group discount clamped"
            );
        }

        let multiplier = Decimal::ONE - discount.total_discount;
        let transactions = request
            .transactions
            .iter()
            .map(|t| {
                let original_fee = t
                    .amount
                    .checked_mul(self.config.baseline_fee_rate)
                    .ok_or_else(|| out_of_range(t.amount))?;
                let optimized_fee = original_fee
                    .checked_mul(multiplier)
                    .ok_or_else(|| out_of_range(t.amount))?;
                Ok(OptimizedTransaction {
                    transaction: t.clone(),
                    original_fee,
                    optimized_fee,
                    savings: original_fee - optimized_fee,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total_original_fees = checked_sum(transactions.iter().map(|t| t.original_fee))?;
        let total_optimized_fees = checked_sum(transactions.iter().map(|t| t.optimized_fee))?;
        let total_savings = checked_sum(transactions.iter().map(|t| t.savings))?;

        let explanation = explain(&discount, federation.principles.len(), total_volume);

        info!(
            federation = %federation.id,
            transactions = transactions.len(),
            volume = %total_volume,
            discount = %discount.total_discount,
            savings = %total_savings,
            "Group optimization complete"
        );

        Ok(GroupOptimizationResult {
            federation_id: federation.id.clone(),
            total_volume,
            discount,
            transactions,
            total_original_fees,
            total_optimized_fees,
            total_savings,
            explanation,
        })
    }
}

fn out_of_range(amount: Decimal) -> Error {
    Error::InvalidAmount(format!("group amount {} is out of range", amount))
}

fn checked_sum(values: impl Iterator<Item = Decimal>) -> Result<Decimal> {
    values.try_fold(Decimal::ZERO, |acc, value| {
        acc.checked_add(value).ok_or_else(|| out_of_range(value))
    })
}

fn explain(discount: &DiscountBreakdown, principle_count: usize, volume: Decimal) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Volume discount {} on aggregate volume {}",
            discount.volume_discount, volume
        ),
        format!(
            "Membership bonus {} for {} federation principles",
            discount.membership_bonus, principle_count
        ),
        format!("Cultural component {}", discount.cultural_component),
        format!("Community component {}", discount.community_component),
    ];

    if discount.capped {
        lines.push(format!(
            "Total discount {} clamped to {}",
            discount.uncapped_total, discount.total_discount
        ));
    } else {
        lines.push(format!("Total discount {}", discount.total_discount));
    }

    lines
}
