use image::GenericImageView;
use std::fs;
use std::path::Path;

use crate::db::DbPool;
use crate::media;
use crate::models::artist::{Artist, ImageRecord};
use crate::models::settings::Setting;
use crate::reconcile;

/// A file accepted into media storage. `file_url` is the canonical locator
/// the slug is derived from.
#[derive(Debug, serde::Serialize)]
pub struct StoredUpload {
    pub file_url: String,
    pub width: u32,
    pub height: u32,
}

/// Result of uploading a new artist image: the locator, the new record, and
/// the full library including it.
#[derive(Debug, serde::Serialize)]
pub struct UploadedImage {
    pub file_url: String,
    pub image: ImageRecord,
    pub images: Vec<ImageRecord>,
}

/// Check if file size is within the configured limit.
pub fn check_file_size(pool: &DbPool, size_bytes: usize) -> bool {
    let max_mb = Setting::get_i64(pool, "uploads_max_mb").max(1) as usize;
    size_bytes <= max_mb * 1024 * 1024
}

/// Persist uploaded bytes under the configured storage dir and probe the image
/// dimensions. The stored name doubles as the media identifier: the returned
/// locator round-trips through `media::parse_image_url`.
pub fn store_file(
    pool: &DbPool,
    file_bytes: &[u8],
    original_filename: &str,
) -> Result<StoredUpload, String> {
    if !check_file_size(pool, file_bytes.len()) {
        return Err("File exceeds the upload size limit".to_string());
    }

    let storage_path = Setting::get_or(pool, "uploads_dir", "data/uploads/");

    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg")
        .to_lowercase();

    // Media identifier in the canonical shape: short site prefix, long unique
    // segment, '~mv2' marker. The on-disk name is the derived slug.
    let hexid = uuid::Uuid::new_v4().simple().to_string();
    let ident = format!("{}_{}~mv2", &hexid[..6], &hexid[6..]);
    let stored_name = format!("{}.{}", ident.replace('~', ""), ext);

    let img = image::load_from_memory(file_bytes).map_err(|e| e.to_string())?;
    let (width, height) = img.dimensions();

    let storage_dir = Path::new(&storage_path);
    fs::create_dir_all(storage_dir).map_err(|e| e.to_string())?;
    fs::write(storage_dir.join(&stored_name), file_bytes).map_err(|e| e.to_string())?;

    Ok(StoredUpload {
        file_url: format!("image://v1/{}.{}", ident, ext),
        width,
        height,
    })
}

/// Create the image record for a freshly stored upload and save the grown
/// library as a side effect. The save is best-effort: don't wait, don't worry
/// if it fails, do log it.
pub fn create_and_save_new_image(
    pool: &DbPool,
    artist: &Artist,
    stored: &StoredUpload,
    original_filename: &str,
    title: &str,
) -> Option<UploadedImage> {
    let url = media::build_image_url(
        &stored.file_url,
        original_filename,
        stored.width,
        stored.height,
    )?;
    let image = media::image_from_url(&url, title)?;

    let mut images = vec![image.clone()];
    images.extend(artist.images.iter().cloned());

    reconcile::persist_images_async(pool.clone(), artist.id.clone(), images.clone());

    Some(UploadedImage {
        file_url: stored.file_url.clone(),
        image,
        images,
    })
}
