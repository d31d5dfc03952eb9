use rust_decimal::Decimal;
use serde::Serialize;

use agrisync_core::{DomainError, DomainResult, Entity, InventoryItemId, Quantity, require_text};

const NAME_MAX_CHARS: usize = 100;

/// A stocked consumable with a shared, mutable balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub name: String,
    pub quantity: Quantity,
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Validated attributes for creating or fully replacing an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub name: String,
    pub quantity: Quantity,
}

impl NewInventoryItem {
    pub fn new(name: &str, quantity: Decimal) -> DomainResult<Self> {
        Ok(Self {
            name: require_text("name", name, NAME_MAX_CHARS)?,
            quantity: Quantity::new(quantity)?,
        })
    }
}

/// Partial update: absent attributes keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryItemPatch {
    pub name: Option<String>,
    pub quantity: Option<Decimal>,
}

impl InventoryItemPatch {
    /// Validate the supplied attributes against the item as read.
    ///
    /// A quantity edit becomes a [`BalanceChange`] observed against
    /// `current`, so it only lands while the balance is still the one read.
    pub fn plan(&self, current: &InventoryItem) -> DomainResult<ItemUpdate> {
        let name = self
            .name
            .as_deref()
            .map(|n| require_text("name", n, NAME_MAX_CHARS))
            .transpose()?;
        let balance = self
            .quantity
            .map(|q| {
                Ok::<_, DomainError>(BalanceChange {
                    item_id: current.id,
                    observed: current.quantity,
                    new: Quantity::new(q)?,
                })
            })
            .transpose()?;
        Ok(ItemUpdate {
            item_id: current.id,
            name,
            balance,
        })
    }
}

/// A partial item write: only the `Some` attributes are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub item_id: InventoryItemId,
    pub name: Option<String>,
    pub balance: Option<BalanceChange>,
}

/// A planned balance write, conditional on the balance not having moved.
///
/// `observed` is the balance the decision was made against; stores apply the
/// change only while the persisted balance still equals it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub item_id: InventoryItemId,
    pub observed: Quantity,
    pub new: Quantity,
}

impl InventoryItem {
    /// Stock-sufficiency rule: `amount <= quantity`.
    pub fn ensure_can_consume(&self, amount: Quantity) -> DomainResult<()> {
        if amount > self.quantity {
            return Err(DomainError::validation(format!(
                "Amount used ({amount}) cannot be greater than the available stock ({}).",
                self.quantity
            )));
        }
        Ok(())
    }

    /// Plan the decrement for consuming `amount` from the current balance.
    pub fn plan_consumption(&self, amount: Quantity) -> DomainResult<BalanceChange> {
        self.ensure_can_consume(amount)?;
        let new = self
            .quantity
            .checked_sub(amount)
            .ok_or_else(|| DomainError::validation("stock cannot go negative"))?;
        Ok(BalanceChange {
            item_id: self.id,
            observed: self.quantity,
            new,
        })
    }

    /// Plan a manual stock correction by a signed `delta`.
    pub fn plan_adjustment(&self, delta: Decimal) -> DomainResult<BalanceChange> {
        if delta.is_zero() {
            return Err(DomainError::validation("delta cannot be zero"));
        }
        Ok(BalanceChange {
            item_id: self.id,
            observed: self.quantity,
            new: self.quantity.apply_delta(delta)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn item(quantity: Decimal) -> InventoryItem {
        InventoryItem {
            id: InventoryItemId::new(1),
            name: "Urea".to_string(),
            quantity: Quantity::new(quantity).unwrap(),
        }
    }

    fn amount(value: Decimal) -> Quantity {
        Quantity::positive("amount_used", value).unwrap()
    }

    #[test]
    fn consumption_within_stock_plans_decrement() {
        let change = item(dec!(100)).plan_consumption(amount(dec!(40))).unwrap();
        assert_eq!(change.observed.value(), dec!(100));
        assert_eq!(change.new.value(), dec!(60));
    }

    #[test]
    fn consuming_entire_stock_is_allowed() {
        let change = item(dec!(12.5)).plan_consumption(amount(dec!(12.5))).unwrap();
        assert!(change.new.is_zero());
    }

    #[test]
    fn insufficient_stock_names_both_amounts() {
        let err = item(dec!(60)).plan_consumption(amount(dec!(70))).unwrap_err();
        match err {
            DomainError::Validation(msg) => {
                assert_eq!(
                    msg,
                    "Amount used (70.00) cannot be greater than the available stock (60.00)."
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn adjustment_rejects_zero_and_overdraw() {
        let it = item(dec!(5));
        assert!(it.plan_adjustment(dec!(0)).is_err());
        assert!(it.plan_adjustment(dec!(-5.01)).is_err());
        assert_eq!(it.plan_adjustment(dec!(-5)).unwrap().new, Quantity::ZERO);
        assert_eq!(it.plan_adjustment(dec!(3)).unwrap().new.value(), dec!(8));
    }

    #[test]
    fn rename_touches_no_balance() {
        let update = InventoryItemPatch {
            name: Some(" Urea 46% ".to_string()),
            quantity: None,
        }
        .plan(&item(dec!(5)))
        .unwrap();
        assert_eq!(update.name.as_deref(), Some("Urea 46%"));
        assert_eq!(update.balance, None);
    }

    #[test]
    fn quantity_edit_is_observed_against_the_read() {
        let it = item(dec!(5));
        let update = InventoryItemPatch {
            name: None,
            quantity: Some(dec!(9)),
        }
        .plan(&it)
        .unwrap();
        assert_eq!(update.name, None);
        let change = update.balance.unwrap();
        assert_eq!(change.observed, it.quantity);
        assert_eq!(change.new.value(), dec!(9));

        let negative = InventoryItemPatch {
            name: None,
            quantity: Some(dec!(-1)),
        };
        assert!(negative.plan(&it).is_err());
    }

    #[test]
    fn new_item_requires_name_and_non_negative_quantity() {
        assert!(NewInventoryItem::new("  ", dec!(1)).is_err());
        assert!(NewInventoryItem::new("Seed", dec!(-1)).is_err());
        assert!(NewInventoryItem::new("Seed", dec!(0)).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a planned consumption succeeds exactly when amount <= stock,
        /// and the planned balance is stock - amount.
        #[test]
        fn consumption_respects_stock(stock in 0i64..100_000_00, used in 1i64..100_000_00) {
            let it = item(Decimal::new(stock, 2));
            let result = it.plan_consumption(amount(Decimal::new(used, 2)));
            if used <= stock {
                let change = result.unwrap();
                prop_assert_eq!(change.new.value(), Decimal::new(stock - used, 2));
            } else {
                prop_assert!(matches!(result, Err(DomainError::Validation(_))));
            }
        }
    }
}
