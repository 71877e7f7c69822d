use crate::domain::catalog::{
    CatalogTool, Category, NewTool, NewVendor, ToolFilter, ToolStatus, Vendor,
};
use crate::domain::lead::{Lead, LeadStatus};
use crate::domain::recommendation::RecommendationSubmission;
use crate::persistence::{PersistenceLayer, StoreError};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

const TOOL_SELECT: &str = r#"
    SELECT t.id, t.slug, t.name, t.tagline, v.name AS vendor_name, t.status,
           t.best_for_size_bands, t.last_verified_at,
           ARRAY(
               SELECT tc.category_slug FROM tool_categories tc
               WHERE tc.tool_id = t.id ORDER BY tc.position
           ) AS categories,
           ARRAY(
               SELECT ti.integration_slug FROM tool_integrations ti
               WHERE ti.tool_id = t.id ORDER BY ti.position
           ) AS integrations
    FROM tools t
    LEFT JOIN vendors v ON v.id = t.vendor_id
"#;

#[derive(Debug)]
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await?;

        // Run Migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}

fn tool_from_row(row: &PgRow) -> Result<CatalogTool> {
    let id: Uuid = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    Ok(CatalogTool {
        id: id.to_string(),
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        tagline: row.try_get("tagline")?,
        vendor_name: row.try_get("vendor_name")?,
        status: ToolStatus::parse(&status).unwrap_or_default(),
        best_for_size_bands: row.try_get("best_for_size_bands")?,
        categories: row.try_get("categories")?,
        integrations: row.try_get("integrations")?,
        last_verified_at: row.try_get("last_verified_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn position(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn limit_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl PersistenceLayer for PostgresProvider {
    async fn find_published_tools(&self, limit: usize) -> Result<Vec<CatalogTool>> {
        self.find_tools(&ToolFilter {
            limit: Some(limit),
            ..ToolFilter::published()
        })
        .await
    }

    async fn find_tools(&self, filter: &ToolFilter) -> Result<Vec<CatalogTool>> {
        let sql = format!(
            r#"{TOOL_SELECT}
            WHERE ($1::text IS NULL OR t.status = $1)
              AND ($2::text IS NULL OR EXISTS (
                    SELECT 1 FROM tool_categories c
                    WHERE c.tool_id = t.id AND c.category_slug = $2))
              AND ($3::text IS NULL OR v.slug = $3)
            ORDER BY t.created_at, t.slug
            LIMIT $4
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(filter.status.map(ToolStatus::as_str))
            .bind(filter.category.as_deref())
            .bind(filter.vendor.as_deref())
            .bind(filter.limit.map(limit_i64))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(tool_from_row).collect()
    }

    async fn get_tool_by_slug(&self, slug: &str) -> Result<Option<CatalogTool>> {
        let sql = format!("{TOOL_SELECT} WHERE t.slug = $1");
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(tool_from_row).transpose()
    }

    async fn create_tool(&self, tool: &NewTool) -> Result<CatalogTool> {
        let mut tx = self.pool.begin().await?;

        let vendor_id: Option<Uuid> = match tool.vendor_slug.as_deref() {
            Some(slug) => {
                let row = sqlx::query("SELECT id FROM vendors WHERE slug = $1")
                    .bind(slug)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| StoreError::MissingReference {
                        kind: "Vendor",
                        slug: slug.to_string(),
                    })?;
                Some(row.try_get("id")?)
            }
            None => None,
        };

        let tool_id = Uuid::new_v4();
        let inserted = sqlx::query(
            r#"
            INSERT INTO tools (id, slug, name, tagline, vendor_id, status,
                               best_for_size_bands, last_verified_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            "#,
        )
        .bind(tool_id)
        .bind(&tool.slug)
        .bind(&tool.name)
        .bind(&tool.tagline)
        .bind(vendor_id)
        .bind(tool.status.as_str())
        .bind(&tool.best_for_size_bands)
        .bind(tool.last_verified_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(StoreError::Duplicate {
                    kind: "Tool",
                    slug: tool.slug.clone(),
                }
                .into());
            }
            return Err(e.into());
        }

        for (i, category) in tool.categories.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO tool_categories (tool_id, category_slug, position)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(tool_id)
            .bind(category)
            .bind(position(i))
            .execute(&mut *tx)
            .await?;
        }

        for (i, integration) in tool.integrations.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO tool_integrations (tool_id, integration_slug, position)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(tool_id)
            .bind(integration)
            .bind(position(i))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_tool_by_slug(&tool.slug)
            .await?
            .ok_or_else(|| anyhow!("tool '{}' missing after insert", tool.slug))
    }

    async fn set_tool_status(
        &self,
        slug: &str,
        status: ToolStatus,
    ) -> Result<Option<CatalogTool>> {
        let updated = sqlx::query("UPDATE tools SET status = $1, updated_at = NOW() WHERE slug = $2")
            .bind(status.as_str())
            .bind(slug)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_tool_by_slug(slug).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT slug, name, description FROM categories ORDER BY created_at, slug",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories = Vec::with_capacity(rows.len());
        for row in rows {
            categories.push(Category {
                slug: row.try_get("slug")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
            });
        }
        Ok(categories)
    }

    async fn create_category(&self, category: &Category) -> Result<Category> {
        let inserted = sqlx::query(
            "INSERT INTO categories (slug, name, description, created_at) VALUES ($1, $2, $3, NOW())",
        )
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.description)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(category.clone()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate {
                kind: "Category",
                slug: category.slug.clone(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>> {
        let rows = sqlx::query(
            "SELECT id, slug, name, website, created_at FROM vendors ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut vendors = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            vendors.push(Vendor {
                id: id.to_string(),
                slug: row.try_get("slug")?,
                name: row.try_get("name")?,
                website: row.try_get("website")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(vendors)
    }

    async fn create_vendor(&self, vendor: &NewVendor) -> Result<Vendor> {
        let id = Uuid::new_v4();
        let inserted = sqlx::query(
            r#"
            INSERT INTO vendors (id, slug, name, website, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(&vendor.slug)
        .bind(&vendor.name)
        .bind(&vendor.website)
        .fetch_one(&self.pool)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Duplicate {
                    kind: "Vendor",
                    slug: vendor.slug.clone(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        Ok(Vendor {
            id: id.to_string(),
            slug: vendor.slug.clone(),
            name: vendor.name.clone(),
            website: vendor.website.clone(),
            created_at,
        })
    }

    async fn save_lead(&self, lead: &Lead) -> Result<()> {
        let data = serde_json::to_value(lead)?;

        sqlx::query(
            r#"
            INSERT INTO leads (id, data, status, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                data = EXCLUDED.data,
                status = EXCLUDED.status
            "#,
        )
        .bind(&lead.id)
        .bind(data)
        .bind(lead.status.as_str())
        .bind(lead.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_leads(&self, status: Option<LeadStatus>, limit: usize) -> Result<Vec<Lead>> {
        let rows = sqlx::query(
            r#"
            SELECT data FROM leads
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(status.map(LeadStatus::as_str))
        .bind(limit_i64(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut leads = Vec::with_capacity(rows.len());
        for row in rows {
            let val: serde_json::Value = row.try_get("data")?;
            leads.push(serde_json::from_value(val)?);
        }
        Ok(leads)
    }

    async fn update_lead_status(&self, id: &str, status: LeadStatus) -> Result<Option<Lead>> {
        let row = sqlx::query(
            r#"
            UPDATE leads
            SET status = $2,
                data = jsonb_set(data, '{status}', to_jsonb($2::text))
            WHERE id = $1
            RETURNING data
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let val: serde_json::Value = row.try_get("data")?;
            Ok(Some(serde_json::from_value(val)?))
        } else {
            Ok(None)
        }
    }

    async fn save_submission(&self, submission: &RecommendationSubmission) -> Result<()> {
        let data = serde_json::to_value(submission)?;

        // Snapshots are immutable; a replayed id keeps the first write.
        sqlx::query(
            r#"
            INSERT INTO recommendation_submissions (id, data, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&submission.id)
        .bind(data)
        .bind(submission.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_submission(&self, id: &str) -> Result<Option<RecommendationSubmission>> {
        let row = sqlx::query("SELECT data FROM recommendation_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let val: serde_json::Value = row.try_get("data")?;
            Ok(Some(serde_json::from_value(val)?))
        } else {
            Ok(None)
        }
    }
}
