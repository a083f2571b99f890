//! In-process [`UserStore`] used by the handler tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{DuplicateIdentity, NewUser, User};
use super::repo::UserStore;

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn update<F>(&self, id: Uuid, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id)?;
        f(user);
        user.updated_at = OffsetDateTime::now_utc();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|u| Some(u.username.as_str()) == username || Some(u.email.as_str()) == email)
            .cloned())
    }

    async fn create(&self, new: &NewUser) -> anyhow::Result<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(DuplicateIdentity.into());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username.clone(),
            email: new.email.clone(),
            full_name: new.full_name.clone(),
            avatar: new.avatar.clone(),
            cover_image: new.cover_image.clone(),
            password_hash: new.password_hash.clone(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> anyhow::Result<()> {
        self.update(id, |u| u.refresh_token = token.map(str::to_string));
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        self.update(id, |u| u.password_hash = password_hash.to_string());
        Ok(())
    }

    async fn update_details(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        {
            let rows = self.rows.lock().unwrap();
            if rows.values().any(|u| u.id != id && u.email == email) {
                return Err(DuplicateIdentity.into());
            }
        }
        Ok(self.update(id, |u| {
            u.full_name = full_name.to_string();
            u.email = email.to_string();
        }))
    }

    async fn update_avatar(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>> {
        Ok(self.update(id, |u| u.avatar = url.to_string()))
    }

    async fn update_cover_image(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>> {
        Ok(self.update(id, |u| u.cover_image = Some(url.to_string())))
    }
}
