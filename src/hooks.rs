use rocket::request::{FromRequest, Outcome, Request};

use crate::db::DbPool;
use crate::media;
use crate::models::artist::Artist;

pub const DEFAULT_DISPLAY_TYPE: &str = "thumbnails";

/// Who is making the call, as supplied by the access-control layer in front
/// of this service (`X-Member-Id` / `X-Member-Role` headers).
#[derive(Debug, Clone)]
pub struct AccessContext {
    pub caller_id: String,
    pub is_admin: bool,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AccessContext {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let caller_id = req
            .headers()
            .get_one("X-Member-Id")
            .unwrap_or("")
            .to_string();
        let is_admin = req
            .headers()
            .get_one("X-Member-Role")
            .map(|r| r.eq_ignore_ascii_case("admin"))
            .unwrap_or(false);
        Outcome::Success(AccessContext { caller_id, is_admin })
    }
}

/// Normalize an incoming artist record: default the flags, make sure the
/// image vectors exist, trim the text fields.
fn clean_artist_data(artist: &mut Artist) {
    if artist.display_type.is_empty() {
        artist.display_type = DEFAULT_DISPLAY_TYPE.to_string();
    }
    artist.name = artist.name.trim().to_string();
    artist.title = artist.title.trim().to_string();
    artist.website = artist
        .website
        .as_ref()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty());
}

/// Guard an artist insert. The caller must be logged in and own the record;
/// a regular member needs a non-empty name and may own at most one record.
/// Admins can insert freely (they'll have to supply a name to update later).
pub fn before_insert(pool: &DbPool, artist: &mut Artist, ctx: &AccessContext) -> Result<(), String> {
    clean_artist_data(artist);

    if ctx.caller_id.is_empty() || artist.owner_id != ctx.caller_id {
        return Err("User not logged in or is not the record owner".to_string());
    }
    if ctx.is_admin {
        return Ok(());
    }
    if artist.name.is_empty() {
        return Err("Artist name cannot be empty".to_string());
    }
    if Artist::count_by_owner(pool, &ctx.caller_id) > 0 {
        return Err("User already has an artist gallery record".to_string());
    }
    Ok(())
}

/// Guard an artist update against the stored record.
///
/// Non-admins cannot edit a blocked record, and their incoming image list is
/// unioned with the stored one so a stale client can't silently drop images
/// another session uploaded. Admins bypass the union and may delete images.
pub fn before_update(
    incoming: &mut Artist,
    current: &Artist,
    ctx: &AccessContext,
) -> Result<(), String> {
    if current.blocked && !ctx.is_admin {
        return Err("Artist record is blocked; contact the site admin".to_string());
    }

    clean_artist_data(incoming);

    if incoming.name.is_empty() {
        return Err("Artist name cannot be empty".to_string());
    }

    if !ctx.is_admin {
        incoming.images = media::update_images(&current.images, &incoming.images);
    }

    Ok(())
}
