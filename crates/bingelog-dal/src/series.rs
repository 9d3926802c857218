//! Series aggregate: owner-scoped scalars plus many-to-many links to tags
//! and characters.
//!
//! Two read shapes exist and are selected explicitly by the caller:
//! [`SeriesSummary`] (links as plain id lists - listing, create and update
//! results) and [`Series`] (links as full nested records - detail reads).

use std::collections::{BTreeSet, HashMap};

use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor};

use crate::{
    ChosenDB, Error,
    character::Character,
    error::Result,
    placeholders,
    tag::Tag,
};

/// Detail (nested) representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    pub title: String,
    pub started: time::PrimitiveDateTime,
    pub status: bool,
    pub watch_rate: i64,
    pub rating: f64,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<Tag>,
    pub characters: Vec<Character>,
}

/// Flat representation - associations as id references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub id: i64,
    pub title: String,
    pub started: time::PrimitiveDateTime,
    pub status: bool,
    pub watch_rate: i64,
    pub rating: f64,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<i64>,
    pub characters: Vec<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct SeriesRow {
    id: i64,
    title: String,
    started: time::PrimitiveDateTime,
    status: bool,
    watch_rate: i64,
    rating: f64,
    link: Option<String>,
    image: Option<String>,
}

fn to_summary_view(row: SeriesRow, tags: Vec<i64>, characters: Vec<i64>) -> SeriesSummary {
    SeriesSummary {
        id: row.id,
        title: row.title,
        started: row.started,
        status: row.status,
        watch_rate: row.watch_rate,
        rating: row.rating,
        link: row.link,
        image: row.image,
        tags,
        characters,
    }
}

fn to_detail_view(row: SeriesRow, tags: Vec<Tag>, characters: Vec<Character>) -> Series {
    Series {
        id: row.id,
        title: row.title,
        started: row.started,
        status: row.status,
        watch_rate: row.watch_rate,
        rating: row.rating,
        link: row.link,
        image: row.image,
        tags,
        characters,
    }
}

/// Full payload - used for create and for full (replace) update. An absent
/// association list means an empty set on replace.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSeries {
    #[garde(custom(crate::not_blank), length(min = 1, max = 255))]
    pub title: String,
    #[garde(skip)]
    pub status: bool,
    #[garde(range(min = 0))]
    pub watch_rate: i64,
    #[garde(range(min = 0.0, max = 99.99))]
    pub rating: f64,
    #[garde(inner(length(max = 1023)))]
    pub link: Option<String>,
    #[garde(skip)]
    pub tags: Option<Vec<i64>>,
    #[garde(skip)]
    pub characters: Option<Vec<i64>>,
}

/// Partial payload - only supplied fields are touched; an absent
/// association list keeps the current set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PatchSeries {
    #[garde(inner(custom(crate::not_blank), length(min = 1, max = 255)))]
    pub title: Option<String>,
    #[garde(skip)]
    pub status: Option<bool>,
    #[garde(inner(range(min = 0)))]
    pub watch_rate: Option<i64>,
    #[garde(inner(range(min = 0.0, max = 99.99)))]
    pub rating: Option<f64>,
    #[garde(inner(length(max = 1023)))]
    pub link: Option<String>,
    #[garde(skip)]
    pub tags: Option<Vec<i64>>,
    #[garde(skip)]
    pub characters: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default)]
pub struct SeriesFilter {
    pub tag_ids: Option<Vec<i64>>,
    pub character_ids: Option<Vec<i64>>,
}

/// Rating column keeps fixed 2-decimal precision.
fn round_rating(rating: f64) -> f64 {
    (rating * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy)]
enum Link {
    Tag,
    Character,
}

impl Link {
    fn entity_table(self) -> &'static str {
        match self {
            Link::Tag => "tag",
            Link::Character => "character",
        }
    }

    fn link_table(self) -> &'static str {
        match self {
            Link::Tag => "series_tags",
            Link::Character => "series_characters",
        }
    }

    fn link_column(self) -> &'static str {
        match self {
            Link::Tag => "tag_id",
            Link::Character => "character_id",
        }
    }

    fn entity_name(self) -> &'static str {
        match self {
            Link::Tag => "Tag",
            Link::Character => "Character",
        }
    }
}

/// Referenced ids must exist, but ownership of the referenced records is
/// deliberately not checked here.
async fn insert_links(
    conn: &mut sqlx::SqliteConnection,
    series_id: i64,
    link: Link,
    ids: &[i64],
) -> Result<()> {
    let unique: BTreeSet<i64> = ids.iter().copied().collect();
    if unique.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "SELECT count(*) FROM {} WHERE id IN ({})",
        link.entity_table(),
        placeholders(unique.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in &unique {
        query = query.bind(id);
    }
    let found = query.fetch_one(&mut *conn).await?;
    if found != unique.len() as i64 {
        return Err(Error::InvalidReference(link.entity_name().to_string()));
    }
    let sql = format!(
        "INSERT INTO {} (series_id, {}) VALUES (?, ?)",
        link.link_table(),
        link.link_column()
    );
    for id in &unique {
        sqlx::query(&sql)
            .bind(series_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn replace_links(
    conn: &mut sqlx::SqliteConnection,
    series_id: i64,
    link: Link,
    ids: &[i64],
) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE series_id = ?", link.link_table());
    sqlx::query(&sql).bind(series_id).execute(&mut *conn).await?;
    insert_links(conn, series_id, link, ids).await
}

const SELECT_SCALARS: &str =
    "SELECT id, title, started, status, watch_rate, rating, link, image FROM series";

pub type SeriesRepository = SeriesRepositoryImpl<crate::Pool>;

pub struct SeriesRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> SeriesRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Series owned by `owner`, newest first. Id filters combine with AND
    /// between dimensions, OR within one dimension's list.
    pub async fn list(&self, owner: i64, filter: SeriesFilter) -> Result<Vec<SeriesSummary>> {
        let mut sql = format!("{SELECT_SCALARS} WHERE user_id = ?");
        if let Some(ref ids) = filter.tag_ids {
            sql.push_str(&format!(
                " AND id IN (SELECT series_id FROM series_tags WHERE tag_id IN ({}))",
                placeholders(ids.len())
            ));
        }
        if let Some(ref ids) = filter.character_ids {
            sql.push_str(&format!(
                " AND id IN (SELECT series_id FROM series_characters WHERE character_id IN ({}))",
                placeholders(ids.len())
            ));
        }
        sql.push_str(" ORDER BY id DESC");

        let mut query = sqlx::query_as::<_, SeriesRow>(&sql).bind(owner);
        for id in filter.tag_ids.iter().flatten() {
            query = query.bind(id);
        }
        for id in filter.character_ids.iter().flatten() {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.executor).await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut tags = self.load_link_ids(&ids, Link::Tag).await?;
        let mut characters = self.load_link_ids(&ids, Link::Character).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let row_tags = tags.remove(&row.id).unwrap_or_default();
                let row_characters = characters.remove(&row.id).unwrap_or_default();
                to_summary_view(row, row_tags, row_characters)
            })
            .collect())
    }

    /// Detail read with nested tag and character records.
    pub async fn get(&self, owner: i64, id: i64) -> Result<Series> {
        let row = self.scalars(owner, id).await?;
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name FROM tag t JOIN series_tags l ON l.tag_id = t.id \
             WHERE l.series_id = ? ORDER BY t.name DESC",
        )
        .bind(id)
        .fetch_all(&self.executor)
        .await?;
        let characters = sqlx::query_as::<_, Character>(
            "SELECT c.id, c.name FROM character c JOIN series_characters l ON l.character_id = c.id \
             WHERE l.series_id = ? ORDER BY c.name DESC",
        )
        .bind(id)
        .fetch_all(&self.executor)
        .await?;
        Ok(to_detail_view(row, tags, characters))
    }

    pub async fn create(&self, owner: i64, payload: CreateSeries) -> Result<SeriesSummary> {
        let mut tx = self.executor.begin().await?;
        let result = sqlx::query(
            "INSERT INTO series (title, user_id, status, watch_rate, rating, link) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.title)
        .bind(owner)
        .bind(payload.status)
        .bind(payload.watch_rate)
        .bind(round_rating(payload.rating))
        .bind(&payload.link)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();
        insert_links(&mut tx, id, Link::Tag, payload.tags.as_deref().unwrap_or_default()).await?;
        insert_links(
            &mut tx,
            id,
            Link::Character,
            payload.characters.as_deref().unwrap_or_default(),
        )
        .await?;
        tx.commit().await?;
        self.summary(owner, id).await
    }

    /// Full replace: all scalars overwritten, both association sets replaced
    /// with whatever the payload carries - an absent list clears the set.
    pub async fn update(
        &self,
        owner: i64,
        id: i64,
        payload: CreateSeries,
    ) -> Result<SeriesSummary> {
        let mut tx = self.executor.begin().await?;
        let result = sqlx::query(
            "UPDATE series SET title = ?, status = ?, watch_rate = ?, rating = ?, link = ? \
             WHERE id = ? AND user_id = ?",
        )
        .bind(&payload.title)
        .bind(payload.status)
        .bind(payload.watch_rate)
        .bind(round_rating(payload.rating))
        .bind(&payload.link)
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Series".to_string()));
        }
        replace_links(&mut tx, id, Link::Tag, payload.tags.as_deref().unwrap_or_default())
            .await?;
        replace_links(
            &mut tx,
            id,
            Link::Character,
            payload.characters.as_deref().unwrap_or_default(),
        )
        .await?;
        tx.commit().await?;
        self.summary(owner, id).await
    }

    /// Partial update: only supplied scalars change, association sets are
    /// replaced only when the payload carries them.
    pub async fn patch(&self, owner: i64, id: i64, payload: PatchSeries) -> Result<SeriesSummary> {
        let mut tx = self.executor.begin().await?;

        let mut sets = Vec::new();
        if payload.title.is_some() {
            sets.push("title = ?");
        }
        if payload.status.is_some() {
            sets.push("status = ?");
        }
        if payload.watch_rate.is_some() {
            sets.push("watch_rate = ?");
        }
        if payload.rating.is_some() {
            sets.push("rating = ?");
        }
        if payload.link.is_some() {
            sets.push("link = ?");
        }

        if sets.is_empty() {
            let found = sqlx::query_scalar::<_, i64>(
                "SELECT count(*) FROM series WHERE id = ? AND user_id = ?",
            )
            .bind(id)
            .bind(owner)
            .fetch_one(&mut *tx)
            .await?;
            if found == 0 {
                return Err(Error::RecordNotFound("Series".to_string()));
            }
        } else {
            let sql = format!(
                "UPDATE series SET {} WHERE id = ? AND user_id = ?",
                sets.join(", ")
            );
            let mut query = sqlx::query(&sql);
            if let Some(ref title) = payload.title {
                query = query.bind(title);
            }
            if let Some(status) = payload.status {
                query = query.bind(status);
            }
            if let Some(watch_rate) = payload.watch_rate {
                query = query.bind(watch_rate);
            }
            if let Some(rating) = payload.rating {
                query = query.bind(round_rating(rating));
            }
            if let Some(ref link) = payload.link {
                query = query.bind(link);
            }
            let result = query.bind(id).bind(owner).execute(&mut *tx).await?;
            if result.rows_affected() == 0 {
                return Err(Error::RecordNotFound("Series".to_string()));
            }
        }

        if let Some(ref tags) = payload.tags {
            replace_links(&mut tx, id, Link::Tag, tags).await?;
        }
        if let Some(ref characters) = payload.characters {
            replace_links(&mut tx, id, Link::Character, characters).await?;
        }
        tx.commit().await?;
        self.summary(owner, id).await
    }

    pub async fn set_image(&self, owner: i64, id: i64, image: &str) -> Result<Series> {
        let result = sqlx::query("UPDATE series SET image = ? WHERE id = ? AND user_id = ?")
            .bind(image)
            .bind(id)
            .bind(owner)
            .execute(&self.executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Series".to_string()));
        }
        self.get(owner, id).await
    }

    pub async fn summary(&self, owner: i64, id: i64) -> Result<SeriesSummary> {
        let row = self.scalars(owner, id).await?;
        let tags = sqlx::query_scalar::<_, i64>(
            "SELECT tag_id FROM series_tags WHERE series_id = ? ORDER BY tag_id",
        )
        .bind(id)
        .fetch_all(&self.executor)
        .await?;
        let characters = sqlx::query_scalar::<_, i64>(
            "SELECT character_id FROM series_characters WHERE series_id = ? ORDER BY character_id",
        )
        .bind(id)
        .fetch_all(&self.executor)
        .await?;
        Ok(to_summary_view(row, tags, characters))
    }

    async fn scalars(&self, owner: i64, id: i64) -> Result<SeriesRow> {
        let sql = format!("{SELECT_SCALARS} WHERE id = ? AND user_id = ?");
        sqlx::query_as::<_, SeriesRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("Series".to_string()))
    }

    async fn load_link_ids(
        &self,
        series_ids: &[i64],
        link: Link,
    ) -> Result<HashMap<i64, Vec<i64>>> {
        let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
        if series_ids.is_empty() {
            return Ok(map);
        }
        let sql = format!(
            "SELECT series_id, {col} FROM {table} WHERE series_id IN ({ids}) ORDER BY {col}",
            col = link.link_column(),
            table = link.link_table(),
            ids = placeholders(series_ids.len())
        );
        let mut query = sqlx::query_as::<_, (i64, i64)>(&sql);
        for id in series_ids {
            query = query.bind(id);
        }
        let pairs = query.fetch_all(&self.executor).await?;
        for (series_id, linked_id) in pairs {
            map.entry(series_id).or_default().push(linked_id);
        }
        Ok(map)
    }
}
