use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One of the mutually exclusive fee choices offered at checkout. A missing or
/// invalid fee falls back to the configured default; the donation defaults
/// to zero. Negative values clamp to zero.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeeOption {
    pub id: String,
    #[serde(default)]
    pub fee: Option<f64>,
    #[serde(default)]
    pub donation: Option<f64>,
}

impl FeeOption {
    pub fn entry_fee(&self, default_fee: f64) -> f64 {
        match self.fee {
            Some(f) if f.is_finite() => f.max(0.0),
            _ => default_fee,
        }
    }

    pub fn donation(&self) -> f64 {
        match self.donation {
            Some(d) if d.is_finite() => d.max(0.0),
            _ => 0.0,
        }
    }

    /// Options worth nothing are hidden from presentation. A hidden option
    /// that is somehow already selected still composes (to a skipped order).
    pub fn hidden(&self, default_fee: f64) -> bool {
        self.entry_fee(default_fee) == 0.0 && self.donation() == 0.0
    }

    /// Radio-label text, e.g. "$10 Entry fee + $10 donation".
    pub fn label(&self, default_fee: f64) -> String {
        let fee = self.entry_fee(default_fee);
        let donation = self.donation();
        let mut label = String::new();
        if fee > 0.0 {
            label.push_str(&format!("${} Entry fee", fmt_amount(fee)));
        }
        if fee > 0.0 && donation > 0.0 {
            label.push_str(" + ");
        }
        if donation > 0.0 {
            label.push_str(&format!(
                "${} {}",
                fmt_amount(donation),
                if fee > 0.0 { "donation" } else { "Donation" }
            ));
        }
        label
    }
}

/// Resolve the configured default entry fee from its raw setting value.
/// Falls back to $10 only when the setting is missing or unparseable; a
/// configured "0" means the show charges no fee.
pub fn resolve_default_fee(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0))
        .unwrap_or(10.0)
}

/// Parse the free-form custom donation input. Non-numeric input counts as
/// zero; negative amounts clamp to zero.
pub fn parse_donation_input(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0))
        .unwrap_or(0.0)
}

/// Round to 2 decimal places (cents).
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Display an amount the way a price label does: no trailing ".00".
fn fmt_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub unit_amount: f64,
    pub quantity: u32,
}

/// A composed purchase order ready to hand to the payment provider.
/// There is never anything to ship and no tax applies, so `total` always
/// equals `item_total`; both are carried because the provider wants the
/// breakdown spelled out.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct OrderSpec {
    pub description: String,
    pub currency: String,
    pub total: f64,
    pub item_total: f64,
    pub shipping: f64,
    pub tax: f64,
    pub items: Vec<LineItem>,
}

/// Compose the purchase order for the selected option. Returns `None` when
/// the option's total is zero: nothing to purchase, no order is constructed.
/// Line items are included only for the nonzero components.
pub fn compose_order(
    option: &FeeOption,
    default_fee: f64,
    currency: &str,
    show_title: &str,
) -> Option<OrderSpec> {
    let fee = option.entry_fee(default_fee);
    let donation = option.donation();

    let item_total = round_cents(fee + donation);
    if item_total == 0.0 {
        return None;
    }

    let mut items = Vec::new();
    if fee > 0.0 {
        items.push(LineItem {
            name: format!("Entry Fee - {}", show_title),
            unit_amount: fee,
            quantity: 1,
        });
    }
    if donation > 0.0 {
        items.push(LineItem {
            name: format!("Donation - {}", show_title),
            unit_amount: donation,
            quantity: 1,
        });
    }

    Some(OrderSpec {
        description: format!("Artist's Entry Fee for \"{}\"", show_title),
        currency: currency.to_string(),
        total: item_total,
        item_total,
        shipping: 0.0,
        tax: 0.0,
        items,
    })
}

impl OrderSpec {
    /// The provider-shaped order body (PayPal Orders v2 purchase units).
    pub fn to_provider_json(&self) -> Value {
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|item| {
                json!({
                    "name": item.name,
                    "unit_amount": {
                        "currency_code": self.currency,
                        "value": format!("{:.2}", item.unit_amount),
                    },
                    "quantity": item.quantity.to_string(),
                })
            })
            .collect();

        json!({
            "purchase_units": [{
                "description": self.description,
                "amount": {
                    "currency_code": self.currency,
                    "value": format!("{:.2}", self.total),
                    "breakdown": {
                        "item_total": {
                            "currency_code": self.currency,
                            "value": format!("{:.2}", self.item_total),
                        },
                        "shipping": {
                            "currency_code": self.currency,
                            "value": format!("{:.2}", self.shipping),
                        },
                        "tax_total": {
                            "currency_code": self.currency,
                            "value": format!("{:.2}", self.tax),
                        },
                    },
                },
                "items": items,
            }]
        })
    }
}
