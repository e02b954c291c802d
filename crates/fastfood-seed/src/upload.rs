//! Image re-upload: fetch the source URL, store it in the bucket, hand back
//! the bucket's view URL.

use fastfood_backend::{resolve_content_type, unique_id, Backend, FileUpload, ImageSource};
use fastfood_core::Result;
use reqwest::Url;
use tracing::debug;

/// File name for an uploaded image: the URL's last path segment,
/// percent-decoded, or `file-<unix millis>.jpg` when there is none.
pub fn file_name_from_url(url: &str) -> String {
    file_name_at(url, chrono::Utc::now().timestamp_millis())
}

fn file_name_at(url: &str, now_millis: i64) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };

    segment
        .map(|s| {
            urlencoding::decode(&s)
                .map(|decoded| decoded.into_owned())
                .unwrap_or(s)
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("file-{}.jpg", now_millis))
}

/// Copy the image at `source_url` into `bucket_id`; returns the view URL.
pub async fn reupload_image(
    backend: &dyn Backend,
    images: &dyn ImageSource,
    bucket_id: &str,
    source_url: &str,
) -> Result<String> {
    let fetched = images.fetch(source_url).await?;
    let name = file_name_from_url(source_url);
    let content_type = resolve_content_type(fetched.content_type.as_deref(), &name);

    let upload = FileUpload {
        name,
        content_type,
        bytes: fetched.bytes,
    };
    let file = backend.create_file(bucket_id, &unique_id(), upload).await?;
    debug!("Uploaded {} as {}/{}", source_url, bucket_id, file.id);

    Ok(backend.file_view_url(bucket_id, &file.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_path_segment() {
        assert_eq!(file_name_at("https://example.com/a.jpg", 1), "a.jpg");
        assert_eq!(
            file_name_at("https://cdn.example.com/img/burgers/classic.png?w=400#top", 1),
            "classic.png"
        );
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(file_name_at("https://example.com/", 42), "file-42.jpg");
        assert_eq!(file_name_at("https://example.com", 42), "file-42.jpg");
        assert_eq!(file_name_at("images/", 7), "file-7.jpg");
    }

    #[test]
    fn test_percent_encoded_segment() {
        assert_eq!(
            file_name_at("https://example.com/img/my%20burger.png", 1),
            "my burger.png"
        );
        assert_eq!(file_name_at("images/jalape%C3%B1o.jpg", 1), "jalapeño.jpg");
        // Invalid UTF-8 after decoding keeps the raw segment.
        assert_eq!(file_name_at("https://example.com/%FF.png", 1), "%FF.png");
    }

    #[test]
    fn test_unparseable_url() {
        assert_eq!(file_name_at("images/fries.webp?v=2", 1), "fries.webp");
    }
}
