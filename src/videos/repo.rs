use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{NewVideo, Video};
use crate::pagination::{Page, PageRequest};

pub async fn create(db: &PgPool, new: &NewVideo) -> anyhow::Result<Video> {
    let video = sqlx::query_as::<_, Video>(
        r#"
        INSERT INTO videos (id, video_file, thumbnail, owner_id, title, description,
                            duration, views, is_published)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, video_file, thumbnail, owner_id, title, description, duration,
                  views, is_published, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.video_file)
    .bind(&new.thumbnail)
    .bind(new.owner_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.duration)
    .bind(new.views)
    .bind(new.is_published)
    .fetch_one(db)
    .await
    .context("insert video")?;
    Ok(video)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Video>> {
    let video = sqlx::query_as::<_, Video>(
        r#"
        SELECT id, video_file, thumbnail, owner_id, title, description, duration,
               views, is_published, created_at, updated_at
        FROM videos
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find video by id")?;
    Ok(video)
}

/// Newest first, all videos of `owner_id` regardless of publication state.
pub async fn list_by_owner(
    db: &PgPool,
    owner_id: Uuid,
    req: PageRequest,
) -> anyhow::Result<Page<Video>> {
    let req = req.clamped();
    let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM videos WHERE owner_id = $1"#)
        .bind(owner_id)
        .fetch_one(db)
        .await
        .context("count videos by owner")?;

    let docs = sqlx::query_as::<_, Video>(
        r#"
        SELECT id, video_file, thumbnail, owner_id, title, description, duration,
               views, is_published, created_at, updated_at
        FROM videos
        WHERE owner_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(owner_id)
    .bind(req.limit)
    .bind(req.offset())
    .fetch_all(db)
    .await
    .context("list videos by owner")?;

    Ok(Page::new(docs, total, req))
}

/// Newest first, published videos only.
pub async fn list_published(db: &PgPool, req: PageRequest) -> anyhow::Result<Page<Video>> {
    let req = req.clamped();
    let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM videos WHERE is_published"#)
        .fetch_one(db)
        .await
        .context("count published videos")?;

    let docs = sqlx::query_as::<_, Video>(
        r#"
        SELECT id, video_file, thumbnail, owner_id, title, description, duration,
               views, is_published, created_at, updated_at
        FROM videos
        WHERE is_published
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(req.limit)
    .bind(req.offset())
    .fetch_all(db)
    .await
    .context("list published videos")?;

    Ok(Page::new(docs, total, req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{
        model::NewUser,
        repo::{PgUserStore, UserStore},
    };

    async fn owner(db: &PgPool) -> Uuid {
        let new = NewUser::new(
            "carol",
            "carol@example.com",
            "Carol C",
            "https://cdn/carol.png".into(),
            None,
            "hash".into(),
        );
        PgUserStore::new(db.clone()).create(&new).await.unwrap().id
    }

    fn video(owner_id: Option<Uuid>, title: &str) -> NewVideo {
        NewVideo::new(
            "https://cdn/v.mp4",
            "https://cdn/t.jpg",
            owner_id,
            title,
            "description",
            "03:10",
        )
        .unwrap()
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres server via DATABASE_URL"]
    async fn create_then_find(db: PgPool) {
        let created = create(&db, &video(None, "Intro")).await.unwrap();
        assert_eq!(created.views, 0);
        assert!(!created.is_published);

        let found = find_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Intro");
        assert!(find_by_id(&db, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres server via DATABASE_URL"]
    async fn owner_listing_is_paged(db: PgPool) {
        let owner_id = owner(&db).await;
        for i in 0..3 {
            create(&db, &video(Some(owner_id), &format!("v{i}"))).await.unwrap();
        }
        create(&db, &video(None, "someone else")).await.unwrap();

        let page = list_by_owner(&db, owner_id, PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(page.total_docs, 3);
        assert_eq!(page.docs.len(), 2);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next_page);

        let page = list_by_owner(&db, owner_id, PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(page.docs.len(), 1);
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres server via DATABASE_URL"]
    async fn unpublished_videos_are_not_listed(db: PgPool) {
        let hidden = create(&db, &video(None, "draft")).await.unwrap();
        sqlx::query("UPDATE videos SET is_published = TRUE WHERE id <> $1")
            .bind(hidden.id)
            .execute(&db)
            .await
            .unwrap();
        let shown = create(&db, &video(None, "live")).await.unwrap();
        sqlx::query("UPDATE videos SET is_published = TRUE WHERE id = $1")
            .bind(shown.id)
            .execute(&db)
            .await
            .unwrap();

        let page = list_published(&db, PageRequest::default()).await.unwrap();
        assert_eq!(page.total_docs, 1);
        assert_eq!(page.docs[0].id, shown.id);
    }
}
