use regex::Regex;
use std::sync::OnceLock;

use crate::models::artist::ImageRecord;

/// Slug and original filename extracted from a hosted-media image url.
/// The filename is empty when the url didn't carry one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrlParts {
    pub slug: String,
    pub filename: String,
}

fn escaped_tilde_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)%7E").expect("valid regex"))
}

fn image_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Matches all known styles of hosted-media image locators:
    //   image://v1/5877c2_e5ec955720e74789aadc774513067c21~mv2.jpeg
    //   wix:image://v1/5877c2_e5ec955720e74789aadc774513067c21~mv2.jpeg
    //   wix:image://v1/5877c2_..~mv2.jpeg/grand-canyon.jpeg#originWidth=698&originHeight=698
    //   https://static.wixstatic.com/media/5877c2_35756317067e4267a8366e414c75dc5c~mv2.jpg
    // Capture 1 is the identifier segment (slug once '~' is stripped),
    // capture 2 the optional filename up to a '#' query suffix.
    RE.get_or_init(|| {
        Regex::new(r"(?:image://v.?/|wixstatic\.com/media/)([A-Za-z0-9_~]*)\.\w*/?([^#]*)")
            .expect("valid regex")
    })
}

/// Parse a hosted-media image url into slug and filename.
///
/// Returns `None` for anything else — e.g. a third-party url like
/// `https://graph.facebook.com/123/picture?type=large`. Those are displayable
/// but carry no media identity, so they are deliberately filtered out of
/// slug-based bookkeeping. Not an error.
pub fn parse_image_url(url: &str) -> Option<ImageUrlParts> {
    // Normalize an escaped '~' (%7E) before matching.
    let url = escaped_tilde_re().replace(url, "~");

    let caps = image_url_re().captures(&url)?;
    let slug = caps
        .get(1)
        .map(|m| m.as_str().replace('~', ""))
        .unwrap_or_default();
    let filename = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
    Some(ImageUrlParts { slug, filename })
}

/// Slug of a hosted-media image url, or empty string when it isn't one.
pub fn slug_of(url: &str) -> String {
    parse_image_url(url).map(|p| p.slug).unwrap_or_default()
}

/// Build an `ImageRecord` from a hosted-media url. `None` when the url isn't
/// a recognized locator.
pub fn image_from_url(url: &str, title: &str) -> Option<ImageRecord> {
    let parsed = parse_image_url(url)?;
    Some(ImageRecord {
        slug: parsed.slug,
        src: url.to_string(),
        title: title.to_string(),
        alt: title.to_string(),
    })
}

/// Union of new/replacement images with the currently recorded ones.
///
/// The result is `new_images` in their given order, followed by every current
/// image whose slug they don't claim, in original order. New images supersede
/// same-slug entries wholesale; nothing is field-merged. An empty `new_images`
/// returns `current` unchanged.
///
/// A new entry missing its slug or src is logged but still included in the
/// result. That leniency matches the long-standing behavior callers depend on.
pub fn update_images(current: &[ImageRecord], new_images: &[ImageRecord]) -> Vec<ImageRecord> {
    if new_images.is_empty() {
        return current.to_vec();
    }

    let mut claimed: Vec<&str> = Vec::new();
    for (ix, img) in new_images.iter().enumerate() {
        if img.slug.is_empty() || img.src.is_empty() {
            log::error!("update_images: new_images[{}] is not a proper image", ix);
        } else {
            claimed.push(img.slug.as_str());
        }
    }

    let mut result: Vec<ImageRecord> = new_images.to_vec();
    result.extend(
        current
            .iter()
            .filter(|img| !claimed.contains(&img.slug.as_str()))
            .cloned(),
    );
    result
}

fn locator_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.*v.?/").expect("valid regex"))
}

/// Build the canonical image url for an uploaded file: the stored locator plus
/// the user's original filename and the origin dimensions, e.g.
/// `image://v1/a0c4f2_9132~mv2.png/self-portrait.png#originWidth=755&originHeight=586`.
/// `None` when `file_url` doesn't look like a media locator.
pub fn build_image_url(
    file_url: &str,
    original_name: &str,
    width: u32,
    height: u32,
) -> Option<String> {
    if !locator_prefix_re().is_match(file_url) {
        return None;
    }
    Some(format!(
        "{}/{}#originWidth={}&originHeight={}",
        file_url, original_name, width, height
    ))
}
