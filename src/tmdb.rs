//! TMDB API client and record types.

use crate::fetch::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, warn};

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_LANGUAGE: &str = "pl-PL";

pub type MovieId = u64;
pub type GenreId = u64;

/// One entry of the popular-movies list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: u64,
    pub genre_ids: Vec<GenreId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Full record returned by `/movie/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetail {
    pub id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: u64,
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    pub status: String,
    pub budget: u64,
    pub revenue: u64,
    #[serde(default)]
    pub imdb_id: Option<String>,
    pub production_companies: Vec<ProductionCompany>,
    pub production_countries: Vec<ProductionCountry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductionCompany {
    pub id: u64,
    pub logo_path: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub origin_country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductionCountry {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Deserialize)]
struct PopularResponse {
    results: Vec<MovieSummary>,
}

#[derive(Deserialize)]
struct GenresResponse {
    genres: Vec<Genre>,
}

/// TMDB sends `null` for some text fields that are usually strings.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Size tokens accepted by the image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W200,
    W500,
    Original,
}

impl ImageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::W200 => "w200",
            Self::W500 => "w500",
            Self::Original => "original",
        }
    }
}

/// Build a loadable image address from a relative poster/logo path.
/// A missing or empty path yields `None` so callers can show a placeholder.
pub fn image_url(path: Option<&str>, size: ImageSize) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    let sep = if path.starts_with('/') { "" } else { "/" };
    Some(format!("{}/{}{}{}", IMAGE_BASE_URL, size.as_str(), sep, path))
}

/// IMDb title page for an external identifier.
pub fn imdb_url(imdb_id: Option<&str>) -> Option<String> {
    imdb_id
        .filter(|id| !id.is_empty())
        .map(|id| format!("https://www.imdb.com/title/{}/", id))
}

/// Read-only access to the movie database.
#[async_trait]
pub trait MovieApi: Send + Sync {
    /// First page of the popular-movies list.
    async fn popular_movies(&self) -> Result<Vec<MovieSummary>, FetchError>;
    async fn genres(&self) -> Result<Vec<Genre>, FetchError>;
    async fn movie_detail(&self, id: MovieId) -> Result<MovieDetail, FetchError>;
}

/// TMDB client configuration.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// API key (v3) or read access token (v4)
    pub api_key: String,
    pub language: String,
    pub base_url: String,
    /// Whether to send the credential as a Bearer token
    pub use_bearer: bool,
    pub timeout: Option<Duration>,
}

impl TmdbConfig {
    /// Validate the credential. An absent or blank key is a configuration
    /// error, reported before any request is attempted.
    pub fn new(
        api_key: Option<String>,
        language: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                FetchError::Configuration(
                    "TMDB API key is missing. Set TMDB_API_KEY or pass --api-key".to_string(),
                )
            })?;

        // Read access tokens are JWTs; their base64 header starts with "eyJ"
        let use_bearer = api_key.starts_with("eyJ");

        Ok(Self {
            api_key,
            language: language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| TMDB_BASE_URL.to_string()),
            use_bearer,
            timeout,
        })
    }
}

/// TMDB API client.
pub struct TmdbClient {
    config: TmdbConfig,
    client: reqwest::Client,
}

impl TmdbClient {
    pub fn new(config: TmdbConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("movie-explorer/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Configuration(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { config, client })
    }

    /// GET `path` with the language and, for v3 keys, the api_key
    /// parameter. reqwest encodes every query value.
    fn build_request(&self, path: &str, extra_params: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.config.base_url, path);
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(extra_params.len() + 2);
        if !self.config.use_bearer {
            params.push(("api_key", self.config.api_key.as_str()));
        }
        params.push(("language", self.config.language.as_str()));
        params.extend_from_slice(extra_params);

        let request = self.client.get(url).query(&params);
        if self.config.use_bearer {
            request.bearer_auth(&self.config.api_key)
        } else {
            request
        }
    }

    /// GET and decode. Transport errors, non-success statuses and bodies
    /// that do not decode all surface as `DataUnavailable`.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        extra_params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        debug!(path, "TMDB request");

        let res = self.build_request(path, extra_params).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            warn!(path, status = status.as_u16(), "TMDB request failed");
            return Err(FetchError::DataUnavailable(format!(
                "/{} -> HTTP {}",
                path,
                status.as_u16()
            )));
        }
        let parsed = serde_json::from_str(&text)?;
        Ok(parsed)
    }
}

#[async_trait]
impl MovieApi for TmdbClient {
    async fn popular_movies(&self) -> Result<Vec<MovieSummary>, FetchError> {
        let resp: PopularResponse = self.get_json("movie/popular", &[("page", "1")]).await?;
        Ok(resp.results)
    }

    async fn genres(&self) -> Result<Vec<Genre>, FetchError> {
        let resp: GenresResponse = self.get_json("genre/movie/list", &[]).await?;
        Ok(resp.genres)
    }

    async fn movie_detail(&self, id: MovieId) -> Result<MovieDetail, FetchError> {
        self.get_json(&format!("movie/{}", id), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    const KEY: &str = "test-key";

    async fn start_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base: &str, key: &str) -> TmdbClient {
        let config = TmdbConfig::new(
            Some(key.to_string()),
            None,
            Some(base.to_string()),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        TmdbClient::new(config).unwrap()
    }

    fn authorized(query: &HashMap<String, String>) -> bool {
        query.get("api_key").map(String::as_str) == Some(KEY)
            && query.get("language").map(String::as_str) == Some("pl-PL")
    }

    fn popular_body() -> Value {
        json!({
            "page": 1,
            "results": [
                {
                    "id": 550,
                    "title": "Fight Club",
                    "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
                    "backdrop_path": null,
                    "overview": "A ticking-time-bomb insomniac...",
                    "release_date": "1999-10-15",
                    "popularity": 61.4,
                    "vote_average": 8.4,
                    "vote_count": 26280,
                    "genre_ids": [18, 53]
                },
                {
                    "id": 1,
                    "title": "Untitled",
                    "poster_path": null,
                    "overview": null,
                    "release_date": "",
                    "popularity": 0.6,
                    "vote_average": 0.0,
                    "vote_count": 0,
                    "genre_ids": []
                }
            ],
            "total_pages": 500
        })
    }

    fn detail_body() -> Value {
        json!({
            "id": 550,
            "title": "Fight Club",
            "poster_path": null,
            "overview": "",
            "release_date": "1999-10-15",
            "popularity": 61.4,
            "vote_average": 8.4,
            "vote_count": 26280,
            "genres": [{ "id": 18, "name": "Dramat" }],
            "tagline": "Mischief. Mayhem. Soap.",
            "runtime": 139,
            "status": "Released",
            "budget": 63000000,
            "revenue": 100853753,
            "imdb_id": "tt0137523",
            "production_companies": [
                { "id": 508, "logo_path": "/7cxRWzi4LsVm4Utfpr1hfARNurT.png", "name": "Regency Enterprises", "origin_country": "US" },
                { "id": 711, "logo_path": null, "name": "Fox 2000 Pictures", "origin_country": "US" }
            ],
            "production_countries": [{ "iso_3166_1": "US", "name": "United States of America" }]
        })
    }

    #[tokio::test]
    async fn test_popular_movies_sends_key_and_language() {
        let app = Router::new().route(
            "/movie/popular",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if !authorized(&q) || q.get("page").map(String::as_str) != Some("1") {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(popular_body()))
            }),
        );
        let base = start_server(app).await;

        let movies = client_for(&base, KEY).popular_movies().await.unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].id, 550);
        assert_eq!(movies[0].genre_ids, vec![18, 53]);
        assert_eq!(movies[1].overview, "");
        assert_eq!(movies[1].poster_path, None);
    }

    #[tokio::test]
    async fn test_genres_decode() {
        let app = Router::new().route(
            "/genre/movie/list",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                if !authorized(&q) {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                Ok(Json(json!({ "genres": [
                    { "id": 28, "name": "Akcja" },
                    { "id": 35, "name": "Komedia" }
                ]})))
            }),
        );
        let base = start_server(app).await;

        let genres = client_for(&base, KEY).genres().await.unwrap();
        assert_eq!(
            genres,
            vec![
                Genre { id: 28, name: "Akcja".to_string() },
                Genre { id: 35, name: "Komedia".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_movie_detail_decode() {
        let app = Router::new().route(
            "/movie/:id",
            get(|Path(id): Path<u64>| async move {
                if id != 550 {
                    return Err(StatusCode::NOT_FOUND);
                }
                Ok(Json(detail_body()))
            }),
        );
        let base = start_server(app).await;

        let detail = client_for(&base, KEY).movie_detail(550).await.unwrap();
        assert_eq!(detail.title, "Fight Club");
        assert_eq!(detail.runtime, Some(139));
        assert_eq!(detail.imdb_id.as_deref(), Some("tt0137523"));
        assert_eq!(detail.production_companies.len(), 2);
        assert_eq!(detail.production_companies[1].logo_path, None);
        assert_eq!(detail.production_countries[0].iso_3166_1, "US");
    }

    #[tokio::test]
    async fn test_unknown_movie_is_data_unavailable() {
        let app = Router::new().route(
            "/movie/:id",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "status_code": 34, "status_message": "The resource you requested could not be found." })),
                )
            }),
        );
        let base = start_server(app).await;

        let err = client_for(&base, KEY).movie_detail(999_999_999).await.unwrap_err();
        assert!(matches!(err, FetchError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_data_unavailable() {
        let app = Router::new().route(
            "/movie/popular",
            get(|| async { Json(json!({ "results": [{ "id": 1, "title": "No numbers" }] })) }),
        );
        let base = start_server(app).await;

        let err = client_for(&base, KEY).popular_movies().await.unwrap_err();
        assert!(matches!(err, FetchError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_data_unavailable() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{addr}"), KEY).genres().await.unwrap_err();
        assert!(matches!(err, FetchError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_query_values_are_encoded() {
        let language = "en US&api_key=x#frag";
        let app = Router::new().route(
            "/movie/popular",
            get(move |Query(pairs): Query<Vec<(String, String)>>| async move {
                let count = |name: &str| pairs.iter().filter(|(k, _)| k == name).count();
                let value = |name: &str| {
                    pairs
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default()
                };
                if count("api_key") != 1
                    || value("api_key") != KEY
                    || value("language") != language
                    || value("page") != "1"
                {
                    return Err(StatusCode::BAD_REQUEST);
                }
                Ok(Json(popular_body()))
            }),
        );
        let base = start_server(app).await;

        let config = TmdbConfig::new(
            Some(KEY.to_string()),
            Some(language.to_string()),
            Some(base),
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        let movies = TmdbClient::new(config).unwrap().popular_movies().await.unwrap();
        assert_eq!(movies.len(), 2);
    }

    #[tokio::test]
    async fn test_bearer_token_goes_in_header() {
        let token = "eyJhbGciOiJIUzI1NiJ9.test";
        let app = Router::new().route(
            "/genre/movie/list",
            get(
                move |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    if auth != format!("Bearer {}", token) || q.contains_key("api_key") {
                        return Err(StatusCode::UNAUTHORIZED);
                    }
                    Ok(Json(json!({ "genres": [] })))
                },
            ),
        );
        let base = start_server(app).await;

        let genres = client_for(&base, token).genres().await.unwrap();
        assert!(genres.is_empty());
    }

    #[test]
    fn test_config_requires_key() {
        let err = TmdbConfig::new(None, None, None, None).unwrap_err();
        assert!(matches!(err, FetchError::Configuration(_)));

        let err = TmdbConfig::new(Some("   ".to_string()), None, None, None).unwrap_err();
        assert!(matches!(err, FetchError::Configuration(_)));
    }

    #[test]
    fn test_config_defaults() {
        let config = TmdbConfig::new(Some("abc".to_string()), None, None, None).unwrap();
        assert_eq!(config.language, "pl-PL");
        assert_eq!(config.base_url, TMDB_BASE_URL);
        assert!(!config.use_bearer);
        assert!(config.timeout.is_none());

        let config = TmdbConfig::new(
            Some("abc".to_string()),
            Some("en-US".to_string()),
            Some("http://localhost:9000/3/".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(config.language, "en-US");
        assert_eq!(config.base_url, "http://localhost:9000/3");
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url(Some("/abc.jpg"), ImageSize::W500).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(
            image_url(Some("logo.png"), ImageSize::W200).as_deref(),
            Some("https://image.tmdb.org/t/p/w200/logo.png")
        );
        assert_eq!(image_url(None, ImageSize::Original), None);
        assert_eq!(image_url(Some(""), ImageSize::W500), None);
    }

    #[test]
    fn test_imdb_url() {
        assert_eq!(
            imdb_url(Some("tt0137523")).as_deref(),
            Some("https://www.imdb.com/title/tt0137523/")
        );
        assert_eq!(imdb_url(Some("")), None);
        assert_eq!(imdb_url(None), None);
    }
}
