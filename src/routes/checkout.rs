use std::collections::HashMap;

use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::checkout::{self, FeeOption};
use crate::db::DbPool;
use crate::hooks::AccessContext;
use crate::models::order::Order;
use crate::models::settings::Setting;

pub fn routes() -> Vec<Route> {
    routes![checkout_options, checkout_create, checkout_capture, orders_list]
}

/// Generate a secure random token for receipts.
pub fn generate_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

fn currency(settings: &HashMap<String, String>) -> String {
    settings
        .get("commerce_currency")
        .cloned()
        .unwrap_or_else(|| "USD".to_string())
}

fn default_fee(settings: &HashMap<String, String>) -> f64 {
    checkout::resolve_default_fee(settings.get("checkout_default_fee").map(|v| v.as_str()))
}

// ── Option presentation ────────────────────────────────

#[derive(Deserialize)]
pub struct OptionsRequest {
    pub options: Vec<FeeOption>,
}

/// Resolve the configured fee options for presentation: label text and
/// whether the option should be hidden (worth $0 both ways).
#[post("/checkout/options", format = "json", data = "<body>")]
pub fn checkout_options(pool: &State<DbPool>, body: Json<OptionsRequest>) -> Json<Value> {
    let fee =
        checkout::resolve_default_fee(Setting::get(pool, "checkout_default_fee").as_deref());

    let rendered: Vec<Value> = body
        .options
        .iter()
        .map(|opt| {
            json!({
                "id": opt.id,
                "label": opt.label(fee),
                "hidden": opt.hidden(fee),
                "fee": opt.entry_fee(fee),
                "donation": opt.donation(),
            })
        })
        .collect();

    Json(json!({ "ok": true, "options": rendered }))
}

// ── Create ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCheckoutRequest {
    pub options: Vec<FeeOption>,
    pub selected: String,
    /// Free-form custom donation amount; overrides the selected option's
    /// donation when present. Non-numeric input counts as zero.
    pub custom_donation: Option<String>,
    pub show_title: Option<String>,
}

#[post("/checkout/create", format = "json", data = "<body>")]
pub fn checkout_create(pool: &State<DbPool>, body: Json<CreateCheckoutRequest>) -> Json<Value> {
    let settings = Setting::all(pool);

    if settings.get("commerce_paypal_enabled").map(|v| v.as_str()) != Some("true") {
        return Json(json!({ "ok": false, "error": "Checkout is not enabled" }));
    }

    let mut option = match body.options.iter().find(|o| o.id == body.selected) {
        Some(o) => o.clone(),
        None => return Json(json!({ "ok": false, "error": "No fee option selected" })),
    };
    if let Some(input) = &body.custom_donation {
        option.donation = Some(checkout::parse_donation_input(input));
    }

    let show_title = body.show_title.as_deref().unwrap_or("Member Show");
    let spec = match checkout::compose_order(
        &option,
        default_fee(&settings),
        &currency(&settings),
        show_title,
    ) {
        Some(s) => s,
        // A $0 total means there is nothing to purchase; no order is created.
        None => return Json(json!({ "ok": false, "error": "Nothing to purchase" })),
    };

    let order_uuid =
        match Order::create(pool, &spec.description, spec.total, &spec.currency, "paypal") {
            Ok(u) => u,
            Err(e) => return Json(json!({ "ok": false, "error": e })),
        };

    Json(json!({
        "ok": true,
        "order_id": order_uuid,
        "order": spec.to_provider_json(),
    }))
}

// ── Admin listing ──────────────────────────────────────

#[get("/orders?<limit>&<offset>")]
pub fn orders_list(
    pool: &State<DbPool>,
    ctx: AccessContext,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Json<Value> {
    if !ctx.is_admin {
        return Json(json!({ "ok": false, "error": "Admin only" }));
    }
    let rows = Order::list(pool, limit.unwrap_or(50).clamp(1, 200), offset.unwrap_or(0).max(0));
    let total = rows.len();
    Json(json!({ "ok": true, "orders": rows, "total": total }))
}

// ── Capture (after buyer approves) ─────────────────────

#[derive(Deserialize)]
pub struct CaptureRequest {
    pub order_id: String,
    pub provider_order_id: String,
}

#[post("/checkout/capture", format = "json", data = "<body>")]
pub fn checkout_capture(pool: &State<DbPool>, body: Json<CaptureRequest>) -> Json<Value> {
    let settings = Setting::all(pool);
    if settings.get("commerce_paypal_enabled").map(|v| v.as_str()) != Some("true") {
        return Json(json!({ "ok": false, "error": "Checkout is not enabled" }));
    }

    let order = match Order::find_by_uuid(pool, &body.order_id) {
        Some(o) => o,
        None => return Json(json!({ "ok": false, "error": "Order not found" })),
    };
    if order.status != "pending" {
        return Json(json!({ "ok": false, "error": "Order already completed" }));
    }

    match verify_paypal_order(&settings, &body.provider_order_id) {
        Ok(true) => {}
        Ok(false) => {
            return Json(json!({ "ok": false, "error": "Payment not verified" }));
        }
        Err(e) => {
            log::error!("paypal verification failed for order {}: {}", order.uuid, e);
            return Json(json!({ "ok": false, "error": e }));
        }
    }

    let _ = Order::update_provider_order_id(pool, &order.uuid, &body.provider_order_id);
    if let Err(e) = Order::update_status(pool, &order.uuid, "completed") {
        return Json(json!({ "ok": false, "error": e }));
    }

    Json(json!({
        "ok": true,
        "receipt_token": generate_token(),
        "message": "Thank you for your payment! We will update your entry status to \"Paid\" as soon as we can.",
    }))
}

/// Server-side verification: fetch the order from the PayPal API and check it
/// is COMPLETED (or APPROVED, for orders captured client-side).
fn verify_paypal_order(
    settings: &HashMap<String, String>,
    paypal_order_id: &str,
) -> Result<bool, String> {
    let client_id = settings
        .get("paypal_client_id")
        .cloned()
        .unwrap_or_default();
    let secret = settings.get("paypal_secret").cloned().unwrap_or_default();
    if client_id.is_empty() || secret.is_empty() {
        return Err("PayPal credentials not configured".to_string());
    }

    let is_sandbox = settings.get("paypal_mode").map(|v| v.as_str()) != Some("live");
    let api_base = if is_sandbox {
        "https://api-m.sandbox.paypal.com"
    } else {
        "https://api-m.paypal.com"
    };

    // Get OAuth token
    let client = reqwest::blocking::Client::new();
    let token_resp = client
        .post(format!("{}/v1/oauth2/token", api_base))
        .basic_auth(&client_id, Some(&secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .map_err(|e| format!("PayPal auth failed: {}", e))?;
    let access_token = token_resp
        .json::<Value>()
        .ok()
        .and_then(|v| {
            v.get("access_token")
                .and_then(|t| t.as_str())
                .map(|s| s.to_string())
        })
        .ok_or_else(|| "Failed to get PayPal access token".to_string())?;

    let order_resp = client
        .get(format!(
            "{}/v2/checkout/orders/{}",
            api_base, paypal_order_id
        ))
        .bearer_auth(&access_token)
        .send();

    Ok(match order_resp {
        Ok(r) => {
            let data: Value = r.json().unwrap_or_default();
            let status = data.get("status").and_then(|s| s.as_str()).unwrap_or("");
            status == "COMPLETED" || status == "APPROVED"
        }
        Err(_) => false,
    })
}
