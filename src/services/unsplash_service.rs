use serde::Deserialize;

const SEARCH_ENDPOINT: &str = "https://api.unsplash.com/search/photos";

/// Direct Unsplash URLs used whenever the live search is unavailable or
/// comes back short.
pub const FALLBACK_IMAGES: [&str; 3] = [
    "https://images.unsplash.com/photo-1488646953014-85cb44e25828?w=800&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=800&h=600&fit=crop&q=80",
    "https://images.unsplash.com/photo-1476514525535-07fb3b4ae5f1?w=800&h=600&fit=crop&q=80",
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: Option<PhotoUrls>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
    small: Option<String>,
}

/// Representative photos for a destination: always exactly three URLs.
/// Unconfigured key, a failed call, or a short result set all degrade to
/// the fallback list; the caller never sees an error.
pub async fn fetch_destination_images(
    access_key: Option<&str>,
    destination: &str,
    country: &str,
) -> Vec<String> {
    let Some(key) = access_key else {
        return fallback_set();
    };

    let query = format!("{} {} travel landmark", destination, country);
    match search(key, &query, 3).await {
        Ok(mut images) => {
            pad_with_fallbacks(&mut images);
            images.truncate(3);
            images
        }
        Err(err) => {
            log::error!("Error fetching Unsplash images: {}", err);
            fallback_set()
        }
    }
}

/// Single cover photo for a saved destination; `None` when unconfigured or
/// nothing was found (the caller falls back to a static image).
pub async fn fetch_cover_image(
    access_key: Option<&str>,
    name: &str,
    country: &str,
) -> Option<String> {
    let key = access_key?;
    let query = format!("{} {} travel landmark", name, country);
    match search(key, &query, 1).await {
        Ok(images) => images.into_iter().next(),
        Err(err) => {
            log::error!("Failed to fetch Unsplash image: {}", err);
            None
        }
    }
}

async fn search(key: &str, query: &str, per_page: u8) -> Result<Vec<String>, reqwest::Error> {
    let response = reqwest::Client::new()
        .get(SEARCH_ENDPOINT)
        .query(&[
            ("query", query),
            ("per_page", &per_page.to_string()),
            ("orientation", "landscape"),
        ])
        .header("Authorization", format!("Client-ID {}", key))
        .send()
        .await?
        .error_for_status()?;

    let body: SearchResponse = response.json().await?;
    Ok(body
        .results
        .into_iter()
        .filter_map(|photo| photo.urls.and_then(|urls| urls.regular.or(urls.small)))
        .filter(|url| !url.is_empty())
        .collect())
}

fn fallback_set() -> Vec<String> {
    FALLBACK_IMAGES.iter().map(|url| url.to_string()).collect()
}

// Cycle through the fallback list so even a partial live result fills all
// three slots.
fn pad_with_fallbacks(images: &mut Vec<String>) {
    while images.len() < 3 {
        images.push(FALLBACK_IMAGES[images.len() % FALLBACK_IMAGES.len()].to_string());
    }
}
