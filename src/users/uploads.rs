use anyhow::Context;
use uuid::Uuid;

use super::forms::UploadedFile;
use crate::storage::MediaStore;

pub const AVATAR_FOLDER: &str = "avatars";
pub const COVER_FOLDER: &str = "covers";

/// Uploads `file` under `<folder>/<uuid>.<ext>` and returns its public URL.
/// Nothing is removed from the store if a later step fails.
pub async fn upload_image(
    media: &dyn MediaStore,
    folder: &str,
    file: UploadedFile,
) -> anyhow::Result<String> {
    let ext = ext_from_mime(&file.content_type).unwrap_or("bin");
    let key = object_key(folder, Uuid::new_v4(), ext);
    media
        .upload(&key, file.body, &file.content_type)
        .await
        .with_context(|| format!("upload {key}"))
}

fn object_key(folder: &str, id: Uuid, ext: &str) -> String {
    format!("{folder}/{id}.{ext}")
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::FakeMedia;
    use bytes::Bytes;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[tokio::test]
    async fn upload_builds_key_from_folder_and_type() {
        let media = FakeMedia::default();
        let file = UploadedFile {
            body: Bytes::from_static(b"png"),
            content_type: "image/png".into(),
            file_name: Some("me.png".into()),
        };
        let url = upload_image(&media, AVATAR_FOLDER, file).await.unwrap();
        assert!(url.starts_with("https://media.fake.local/avatars/"));
        assert!(url.ends_with(".png"));
        assert_eq!(media.uploaded.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upload_failure_is_reported() {
        let media = FakeMedia {
            fail_prefix: Some(COVER_FOLDER),
            ..Default::default()
        };
        let file = UploadedFile {
            body: Bytes::from_static(b"?"),
            content_type: "text/plain".into(),
            file_name: None,
        };
        let err = upload_image(&media, COVER_FOLDER, file).await.unwrap_err();
        assert!(err.to_string().contains("covers/"));
    }
}
