use crate::db::DbPool;
use crate::media;
use crate::models::artist::{Artist, ImageRecord};
use crate::models::settings::Setting;

/// Repair the artist's image library so every referenced image is present.
///
/// Portfolio entries and the profile photo should already be in the library,
/// but things happen — e.g. someone edited the records directly through an
/// admin console. Returns true if anything was changed.
///
/// Also syncs image titles one-directionally: a portfolio entry's (trimmed,
/// non-empty) title wins over the library entry's title.
pub fn add_missing_images(artist: &mut Artist, default_photo_url: &str) -> bool {
    let mut changed = false;

    let photo_slug = media::slug_of(&artist.artist_photo);
    if artist.artist_photo != default_photo_url
        && !artist.images.iter().any(|img| img.slug == photo_slug)
    {
        if let Some(img) = media::image_from_url(&artist.artist_photo, "The Artist") {
            artist.images.push(img);
            changed = true;
        }
    }

    for entry in &artist.gallery {
        match artist.images.iter_mut().find(|img| img.slug == entry.slug) {
            Some(img) => {
                let title = entry.title.trim();
                if !title.is_empty() && title != img.title {
                    img.title = title.to_string();
                    changed = true;
                }
            }
            None => {
                artist.images.push(entry.clone());
                changed = true;
            }
        }
    }

    changed
}

/// Run reconciliation and, if anything changed, persist the repaired library
/// in the background. The caller gets the repaired record either way.
pub fn reconcile(pool: &DbPool, artist: &mut Artist) {
    let default_photo = Setting::get_or(pool, "gallery_default_photo", "");
    if add_missing_images(artist, &default_photo) {
        persist_images_async(pool.clone(), artist.id.clone(), artist.images.clone());
    }
}

/// Best-effort background write of the image library. Failures are logged and
/// never retried; callers must not depend on this write having landed.
pub fn persist_images_async(pool: DbPool, artist_id: String, images: Vec<ImageRecord>) {
    std::thread::spawn(move || {
        if let Err(e) = Artist::update_images(&pool, &artist_id, &images) {
            log::error!("background image save failed for artist {}: {}", artist_id, e);
        }
    });
}

// ── Unused-image listing ────────────────────────────────

/// A library image not yet used in some context, shaped for a picker list.
#[derive(Debug, serde::Serialize)]
pub struct UnusedImage {
    pub slug: String,
    pub src: String,
    pub name: String,
}

/// Library images not used in the given context: for the portfolio, "used"
/// means present in the portfolio; for the profile photo, "used" means it is
/// the current photo. Sorted by display name.
pub fn unused_images(artist: &Artist, for_portfolio: bool) -> Vec<UnusedImage> {
    let photo_slug = media::slug_of(&artist.artist_photo);

    let mut rows: Vec<UnusedImage> = artist
        .images
        .iter()
        .filter(|img| {
            let used = if for_portfolio {
                artist.gallery.iter().any(|p| p.slug == img.slug)
            } else {
                photo_slug == img.slug
            };
            !used
        })
        .map(|img| {
            let parsed = media::parse_image_url(&img.src);
            let (slug, filename) = match parsed {
                Some(p) => (p.slug, p.filename),
                None => (String::new(), String::new()),
            };
            let name = {
                let by_title = ellipsis_text(&img.title, 60, false);
                if by_title.is_empty() {
                    ellipsis_text(&filename, 60, true)
                } else {
                    by_title
                }
            };
            UnusedImage {
                slug: if img.slug.is_empty() { slug } else { img.slug.clone() },
                src: img.src.clone(),
                name,
            }
        })
        .collect();

    rows.sort_by(|l, r| l.name.cmp(&r.name));
    rows
}

/// Constrain text to `max_len` characters, appending an ellipsis — or, with
/// `in_middle`, putting the ellipsis in the middle (useful for filenames,
/// which tend to differ at both ends).
pub fn ellipsis_text(text: &str, max_len: usize, in_middle: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return text.to_string();
    }
    if in_middle {
        let middle = (max_len + 1) / 2;
        let head: String = chars[..middle].iter().collect();
        let tail: String = chars[chars.len() - middle.saturating_sub(4)..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        let head: String = chars[..max_len.saturating_sub(3)].iter().collect();
        format!("{}...", head)
    }
}
