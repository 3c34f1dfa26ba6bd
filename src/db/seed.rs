//! Bulk demo data for development databases.
//!
//! Creates a batch of users, pulls volumes from the Google Books API, and files
//! each one as a book with its authors, genres, a best-effort cover and a handful
//! of random reviews. Meant for an empty database; run it again and it adds
//! another batch alongside the first.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{CreateBook, CreateReview, CreateUser, Database, UserRecord};

const GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1/volumes";
/// Google Books refuses larger pages
const MAX_PAGE_SIZE: u32 = 40;
const DEMO_PASSWORD: &str = "12345678";
const MAX_REVIEWERS_PER_BOOK: usize = 10;

const REVIEW_SENTENCES: &[&str] = &[
    "Could not put it down.",
    "Slow start, but the second half makes up for it.",
    "Beautifully written and surprisingly funny.",
    "Not for me, although I can see the appeal.",
    "I have already recommended it to three friends.",
    "The ending felt rushed.",
    "A classic for a reason.",
    "Too long by about a hundred pages.",
];

/// Seeder settings, taken from the `seed` subcommand
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub users: usize,
    /// Google Books search query
    pub query: String,
    pub max_results: u32,
    pub bcrypt_cost: u32,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            users: 100,
            query: "a".to_string(),
            max_results: MAX_PAGE_SIZE,
            bcrypt_cost: 10,
        }
    }
}

/// What a seed run created
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub books: usize,
    pub reviews: usize,
    pub covers: usize,
}

// ============================================================================
// Google Books API types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VolumesResponse {
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
}

// ============================================================================
// Seeder
// ============================================================================

pub struct Seeder {
    db: Database,
    client: reqwest::Client,
    rng: StdRng,
}

impl Seeder {
    pub fn new(db: Database) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            db,
            client,
            rng: StdRng::from_entropy(),
        })
    }

    /// Use a fixed RNG seed for reproducible data
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Full run: users, then one page of volumes from Google Books
    pub async fn run(&mut self, options: &SeedOptions) -> Result<SeedSummary> {
        let users = self.create_users(options.users, options.bcrypt_cost).await?;
        let volumes = self.fetch_volumes(&options.query, options.max_results).await?;

        let mut summary = self.import_volumes(&volumes, &users).await?;
        summary.users = users.len();

        info!(
            users = summary.users,
            books = summary.books,
            reviews = summary.reviews,
            covers = summary.covers,
            "Seed complete"
        );

        Ok(summary)
    }

    /// Create `count` users sharing the demo password
    pub async fn create_users(&mut self, count: usize, bcrypt_cost: u32) -> Result<Vec<UserRecord>> {
        let password_hash =
            bcrypt::hash(DEMO_PASSWORD, bcrypt_cost).context("Failed to hash demo password")?;

        let batch: u32 = self.rng.r#gen();
        let users = self.db.users();
        let mut created = Vec::with_capacity(count);

        for n in 1..=count {
            let user = users
                .create(CreateUser {
                    email: format!("reader{}.{:08x}@example.com", n, batch),
                    password_hash: password_hash.clone(),
                })
                .await?;
            created.push(user);
        }

        info!(count = created.len(), "Created demo users");
        Ok(created)
    }

    /// Fetch one page of volumes matching `query`
    pub async fn fetch_volumes(&self, query: &str, max_results: u32) -> Result<Vec<Volume>> {
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE).to_string();

        let response = self
            .client
            .get(GOOGLE_BOOKS_URL)
            .query(&[("q", query), ("maxResults", max_results.as_str())])
            .send()
            .await
            .context("Google Books request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Google Books returned {}", response.status());
        }

        let body: VolumesResponse = response
            .json()
            .await
            .context("Failed to parse Google Books response")?;

        info!(query = %query, count = body.items.len(), "Fetched volumes");
        Ok(body.items)
    }

    /// File each volume as a book with authors, genres, cover and reviews
    pub async fn import_volumes(
        &mut self,
        volumes: &[Volume],
        users: &[UserRecord],
    ) -> Result<SeedSummary> {
        let mut summary = SeedSummary::default();

        for volume in volumes {
            let info = &volume.volume_info;

            let cover = match info.image_links.as_ref().and_then(|l| l.thumbnail.as_deref()) {
                Some(url) => self.download_cover(url).await,
                None => None,
            };
            if cover.is_some() {
                summary.covers += 1;
            }

            let book = self
                .db
                .books()
                .create(CreateBook {
                    title: info.title.clone(),
                    description: info.description.clone(),
                    cover,
                })
                .await?;
            summary.books += 1;

            self.connect_authors(&book.id, &info.authors).await?;
            self.connect_genres(&book.id, &info.categories).await?;

            summary.reviews += self.add_reviews(&book.id, users).await?;

            debug!(book_id = %book.id, slug = %book.slug, "Imported volume");
        }

        Ok(summary)
    }

    async fn connect_authors(&self, book_id: &str, names: &[String]) -> Result<()> {
        let names = distinct(names);
        try_join_all(names.iter().map(|name| async move {
            let author = self.db.authors().find_or_create(name).await?;
            self.db.books().add_author(book_id, &author.id).await
        }))
        .await?;

        Ok(())
    }

    async fn connect_genres(&self, book_id: &str, names: &[String]) -> Result<()> {
        let names = distinct(names);
        try_join_all(names.iter().map(|name| async move {
            let genre = self.db.genres().find_or_create(name).await?;
            self.db.books().add_genre(book_id, &genre.id).await
        }))
        .await?;

        Ok(())
    }

    /// Reviews from a random subset of users
    async fn add_reviews(&mut self, book_id: &str, users: &[UserRecord]) -> Result<usize> {
        let count = self.rng.gen_range(0..=MAX_REVIEWERS_PER_BOOK.min(users.len()));
        let reviewers: Vec<&UserRecord> = users.choose_multiple(&mut self.rng, count).collect();

        let reviews = self.db.reviews();
        for user in &reviewers {
            let rating = self.rng.gen_range(1..=5);
            let text = REVIEW_SENTENCES
                .choose(&mut self.rng)
                .copied()
                .unwrap_or("Worth reading.");

            reviews
                .create(CreateReview {
                    user_id: user.id.clone(),
                    book_id: book_id.to_string(),
                    rating,
                    text: text.to_string(),
                })
                .await?;
        }

        Ok(reviewers.len())
    }

    /// Download a cover image; failures are logged and skipped
    async fn download_cover(&self, url: &str) -> Option<Vec<u8>> {
        let url = url.replacen("http://", "https://", 1);

        let response = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(url = %url, status = %resp.status(), "Cover download failed");
                return None;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Cover download failed");
                return None;
            }
        };

        match response.bytes().await {
            Ok(bytes) if infer::is_image(&bytes) => Some(bytes.to_vec()),
            Ok(_) => {
                warn!(url = %url, "Cover download is not an image");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read cover body");
                None
            }
        }
    }
}

/// Trimmed, non-empty names with duplicates removed (first occurrence wins)
fn distinct(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}
