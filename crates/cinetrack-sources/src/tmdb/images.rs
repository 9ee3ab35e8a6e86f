use cinetrack_config::config::DEFAULT_IMAGE_BASE_URL;

/// Width tiers the image CDN serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W185, // cast thumbnails
    W200,
    W300,
    W500, // cards and posters
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W185 => "w185",
            ImageSize::W200 => "w200",
            ImageSize::W300 => "w300",
            ImageSize::W500 => "w500",
            ImageSize::Original => "original",
        }
    }
}

/// Composes CDN URLs from the path fragments the API returns
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base_url: String,
}

impl ImageUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        let path = path.filter(|p| !p.is_empty())?;
        let separator = if path.starts_with('/') { "" } else { "/" };
        Some(format!("{}/{}{}{}", self.base_url, size.as_str(), separator, path))
    }
}

impl Default for ImageUrls {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_tiers() {
        let images = ImageUrls::default();
        assert_eq!(
            images.url(Some("/abc.jpg"), ImageSize::W500).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(
            images.url(Some("abc.jpg"), ImageSize::Original).as_deref(),
            Some("https://image.tmdb.org/t/p/original/abc.jpg")
        );
        assert_eq!(images.url(None, ImageSize::W185), None);
        assert_eq!(images.url(Some(""), ImageSize::W185), None);
    }
}
