use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Serialize;
use serde_json::{json, Value};

use crate::db::DbPool;
use crate::hooks::{self, AccessContext};
use crate::models::artist::{self, Artist};
use crate::models::settings::Setting;
use crate::reconcile::{self, UnusedImage};
use crate::uploads;

pub fn routes() -> Vec<Route> {
    routes![
        artists_list,
        artist_get,
        artist_insert,
        artist_update,
        artist_upload_image,
        artist_unused_images,
        portfolio_move_up,
        portfolio_move_down,
        portfolio_remove,
        portfolio_add,
        photo_set,
        photo_clear,
    ]
}

// ── Artist records ─────────────────────────────────────

#[get("/artists")]
pub fn artists_list(pool: &State<DbPool>) -> Json<Vec<Artist>> {
    Json(Artist::list_visible(pool))
}

/// Fetch one artist record, repairing its image library on the way out.
/// The repair is persisted in the background; the response never waits on it.
#[get("/artist/<id>")]
pub fn artist_get(pool: &State<DbPool>, id: &str) -> Option<Json<Artist>> {
    let mut artist = Artist::find_by_id(pool, id)?;
    reconcile::reconcile(pool, &mut artist);
    Some(Json(artist))
}

#[post("/artist", format = "json", data = "<body>")]
pub fn artist_insert(
    pool: &State<DbPool>,
    ctx: AccessContext,
    body: Json<Artist>,
) -> Json<Value> {
    let mut artist = body.into_inner();
    if artist.id.is_empty() {
        artist.id = uuid::Uuid::new_v4().to_string();
    }

    if let Err(e) = hooks::before_insert(pool, &mut artist, &ctx) {
        return Json(json!({ "ok": false, "error": format!("Artist insert rejected: {}", e) }));
    }
    match Artist::insert(pool, &artist) {
        Ok(_) => Json(json!({ "ok": true, "artist": artist })),
        Err(e) => Json(json!({ "ok": false, "error": e })),
    }
}

#[put("/artist/<id>", format = "json", data = "<body>")]
pub fn artist_update(
    pool: &State<DbPool>,
    ctx: AccessContext,
    id: &str,
    body: Json<Artist>,
) -> Json<Value> {
    let current = match Artist::find_by_id(pool, id) {
        Some(a) => a,
        None => return Json(json!({ "ok": false, "error": "Artist not found" })),
    };
    if !ctx.is_admin && current.owner_id != ctx.caller_id {
        return Json(json!({ "ok": false, "error": "Not the record owner" }));
    }

    let mut incoming = body.into_inner();
    incoming.id = current.id.clone();
    incoming.owner_id = current.owner_id.clone();

    if let Err(e) = hooks::before_update(&mut incoming, &current, &ctx) {
        return Json(json!({ "ok": false, "error": format!("Artist update rejected: {}", e) }));
    }
    match Artist::update(pool, &incoming) {
        Ok(_) => Json(json!({ "ok": true, "artist": incoming })),
        Err(e) => Json(json!({ "ok": false, "error": e })),
    }
}

// ── Image upload ───────────────────────────────────────

#[derive(FromForm)]
pub struct ImageUploadForm<'f> {
    pub file: TempFile<'f>,
    pub title: Option<String>,
}

#[post("/artist/<id>/images", data = "<form>")]
pub async fn artist_upload_image(
    pool: &State<DbPool>,
    ctx: AccessContext,
    id: &str,
    mut form: Form<ImageUploadForm<'_>>,
) -> Json<Value> {
    let artist = match Artist::find_by_id(pool, id) {
        Some(a) => a,
        None => return Json(json!({ "ok": false, "error": "Artist not found" })),
    };
    if !ctx.is_admin && artist.owner_id != ctx.caller_id {
        return Json(json!({ "ok": false, "error": "Not the record owner" }));
    }

    let max_uploads = Setting::get_i64(pool, "gallery_max_uploads").max(1) as usize;
    if artist.images.len() >= max_uploads {
        return Json(json!({
            "ok": false,
            "error": "Upload quota used up; remove images or contact support",
        }));
    }

    let original_name = form
        .file
        .raw_name()
        .map(|n| n.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .unwrap_or_else(|| "upload.jpg".to_string());

    // Spool the upload to a temp path so the dimension probe can see the bytes.
    let tmp = std::env::temp_dir().join(format!("galerie_upload_{}", uuid::Uuid::new_v4()));
    if let Err(e) = form.file.copy_to(&tmp).await {
        return Json(json!({ "ok": false, "error": format!("Upload read failed: {}", e) }));
    }
    let bytes = match std::fs::read(&tmp) {
        Ok(b) => b,
        Err(e) => {
            return Json(json!({ "ok": false, "error": format!("Upload read failed: {}", e) }))
        }
    };
    let _ = std::fs::remove_file(&tmp);

    let stored = match uploads::store_file(pool, &bytes, &original_name) {
        Ok(s) => s,
        Err(e) => return Json(json!({ "ok": false, "error": e })),
    };

    let title = form.title.as_deref().unwrap_or("");
    match uploads::create_and_save_new_image(pool, &artist, &stored, &original_name, title) {
        Some(result) => Json(json!({ "ok": true, "result": result })),
        None => Json(json!({ "ok": false, "error": "Stored file produced no usable locator" })),
    }
}

// ── Image pickers ──────────────────────────────────────

#[derive(Serialize)]
pub struct UnusedImagesResponse {
    pub rows: Vec<UnusedImage>,
    pub total: usize,
}

/// Library images not yet used as portfolio entries (or, with
/// `for_portfolio=false`, not currently the profile photo).
#[get("/artist/<id>/unused-images?<for_portfolio>")]
pub fn artist_unused_images(
    pool: &State<DbPool>,
    id: &str,
    for_portfolio: Option<bool>,
) -> Option<Json<UnusedImagesResponse>> {
    let artist = Artist::find_by_id(pool, id)?;
    let rows = reconcile::unused_images(&artist, for_portfolio.unwrap_or(true));
    let total = rows.len();
    Some(Json(UnusedImagesResponse { rows, total }))
}

// ── Portfolio ops ──────────────────────────────────────

fn portfolio_response(pool: &DbPool, artist: &Artist) -> Json<Value> {
    let max = Setting::get_i64(pool, "gallery_max_portfolio").max(1) as usize;
    Json(json!({
        "ok": true,
        "gallery": artist.gallery,
        "can_add_more": artist::can_add_more(artist.gallery.len(), max),
    }))
}

/// Load, authorize, mutate the portfolio, and save it. The save here is an
/// explicit user action, so its failure is surfaced, not swallowed.
fn with_portfolio<F>(pool: &DbPool, ctx: &AccessContext, id: &str, op: F) -> Json<Value>
where
    F: FnOnce(&DbPool, &mut Artist) -> Result<bool, String>,
{
    let mut artist = match Artist::find_by_id(pool, id) {
        Some(a) => a,
        None => return Json(json!({ "ok": false, "error": "Artist not found" })),
    };
    if !ctx.is_admin && artist.owner_id != ctx.caller_id {
        return Json(json!({ "ok": false, "error": "Not the record owner" }));
    }

    match op(pool, &mut artist) {
        Ok(changed) => {
            if changed {
                if let Err(e) = Artist::update_gallery(pool, &artist.id, &artist.gallery) {
                    return Json(json!({ "ok": false, "error": format!("Save failed: {}", e) }));
                }
            }
            portfolio_response(pool, &artist)
        }
        Err(e) => Json(json!({ "ok": false, "error": e })),
    }
}

#[post("/artist/<id>/portfolio/move-up/<ix>")]
pub fn portfolio_move_up(pool: &State<DbPool>, ctx: AccessContext, id: &str, ix: usize) -> Json<Value> {
    with_portfolio(pool, &ctx, id, |_, a| Ok(artist::move_up(&mut a.gallery, ix)))
}

#[post("/artist/<id>/portfolio/move-down/<ix>")]
pub fn portfolio_move_down(pool: &State<DbPool>, ctx: AccessContext, id: &str, ix: usize) -> Json<Value> {
    with_portfolio(pool, &ctx, id, |_, a| Ok(artist::move_down(&mut a.gallery, ix)))
}

#[post("/artist/<id>/portfolio/remove/<ix>")]
pub fn portfolio_remove(pool: &State<DbPool>, ctx: AccessContext, id: &str, ix: usize) -> Json<Value> {
    with_portfolio(pool, &ctx, id, |_, a| Ok(artist::remove_at(&mut a.gallery, ix)))
}

#[post("/artist/<id>/portfolio/add/<slug>")]
pub fn portfolio_add(pool: &State<DbPool>, ctx: AccessContext, id: &str, slug: &str) -> Json<Value> {
    with_portfolio(pool, &ctx, id, |pool, a| {
        let max = Setting::get_i64(pool, "gallery_max_portfolio").max(1) as usize;
        if !artist::can_add_more(a.gallery.len(), max) {
            return Err(format!(
                "The maximum number of images in a portfolio is {}. Remove some before adding more.",
                max
            ));
        }
        Ok(artist::add_to_portfolio(&a.images, &mut a.gallery, slug, max))
    })
}

// ── Profile photo ──────────────────────────────────────

#[post("/artist/<id>/photo/<slug>")]
pub fn photo_set(pool: &State<DbPool>, ctx: AccessContext, id: &str, slug: &str) -> Json<Value> {
    let artist = match Artist::find_by_id(pool, id) {
        Some(a) => a,
        None => return Json(json!({ "ok": false, "error": "Artist not found" })),
    };
    if !ctx.is_admin && artist.owner_id != ctx.caller_id {
        return Json(json!({ "ok": false, "error": "Not the record owner" }));
    }
    let src = match artist.images.iter().find(|img| img.slug == slug) {
        Some(img) => img.src.clone(),
        None => return Json(json!({ "ok": false, "error": "No image with that slug" })),
    };
    match Artist::update_photo(pool, id, &src) {
        Ok(_) => Json(json!({ "ok": true, "artist_photo": src })),
        Err(e) => Json(json!({ "ok": false, "error": format!("Save failed: {}", e) })),
    }
}

#[post("/artist/<id>/photo/clear")]
pub fn photo_clear(pool: &State<DbPool>, ctx: AccessContext, id: &str) -> Json<Value> {
    let artist = match Artist::find_by_id(pool, id) {
        Some(a) => a,
        None => return Json(json!({ "ok": false, "error": "Artist not found" })),
    };
    if !ctx.is_admin && artist.owner_id != ctx.caller_id {
        return Json(json!({ "ok": false, "error": "Not the record owner" }));
    }
    let default_photo = Setting::get_or(pool, "gallery_default_photo", "");
    match Artist::update_photo(pool, id, &default_photo) {
        Ok(_) => Json(json!({ "ok": true, "artist_photo": default_photo })),
        Err(e) => Json(json!({ "ok": false, "error": format!("Save failed: {}", e) })),
    }
}
