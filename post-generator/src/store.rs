use crate::traits::PostStore;
use crate::types::{BlogPost, Result, Subscriber};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    pub async fn setup_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id UUID PRIMARY KEY,
                slug VARCHAR(255) NOT NULL UNIQUE,
                category VARCHAR(255) NOT NULL,
                kind VARCHAR(32) NOT NULL,
                title TEXT NOT NULL,
                excerpt TEXT NOT NULL,
                content TEXT NOT NULL,
                seo_title TEXT NOT NULL,
                seo_description TEXT NOT NULL,
                keywords TEXT[] NOT NULL DEFAULT '{}',
                read_time_minutes INTEGER NOT NULL,
                audio_path TEXT,
                image_url TEXT,
                image_credit TEXT,
                published_at TIMESTAMP WITH TIME ZONE NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscribers (
                id UUID PRIMARY KEY,
                chat_id VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(255),
                is_active BOOLEAN NOT NULL DEFAULT true,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        info!("Database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert_post(&self, post: &BlogPost) -> Result<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, slug, category, kind, title, excerpt, content, seo_title,
                               seo_description, keywords, read_time_minutes, audio_path,
                               image_url, image_credit, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(post.id)
        .bind(&post.slug)
        .bind(&post.category)
        .bind(post.kind.as_str())
        .bind(&post.content.title)
        .bind(&post.content.excerpt)
        .bind(&post.content.content)
        .bind(&post.content.seo_title)
        .bind(&post.content.seo_description)
        .bind(&post.content.keywords)
        .bind(post.read_time_minutes as i32)
        .bind(&post.audio_path)
        .bind(post.image.as_ref().map(|i| i.url.clone()))
        .bind(post.image.as_ref().and_then(|i| i.credit.clone()))
        .bind(post.published_at)
        .execute(&self.db)
        .await?;

        debug!("Stored post {} ({})", post.slug, post.id);
        Ok(post.id)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE slug = $1")
            .bind(slug)
            .fetch_one(&self.db)
            .await?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn count_posts(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM posts")
            .fetch_one(&self.db)
            .await?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        let rows = sqlx::query(
            "SELECT id, chat_id, name FROM subscribers WHERE is_active = true ORDER BY created_at",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Subscriber {
                id: r.get("id"),
                chat_id: r.get("chat_id"),
                name: r.get("name"),
            })
            .collect())
    }
}
