use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

/// Lifetime of the signed URLs handed to viewers.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Object key for one uploaded proof file, namespaced by uploader and task
/// with a millisecond + index suffix so repeated submissions never collide.
pub fn proof_object_key(
    user_id: &str,
    task_id: &str,
    millis: i64,
    index: usize,
    file_name: &str,
) -> String {
    let extension = file_name.rsplit('.').next().filter(|ext| !ext.is_empty() && *ext != file_name);
    match extension {
        Some(ext) => format!("{}/{}-{}-{}.{}", user_id, task_id, millis, index, ext.to_lowercase()),
        None => format!("{}/{}-{}-{}", user_id, task_id, millis, index),
    }
}

/// Upload one proof blob to the proof bucket.
pub async fn upload_proof(
    s3_client: &S3Client,
    bucket_name: &str,
    key: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<(), String> {
    s3_client
        .put_object()
        .bucket(bucket_name)
        .key(key)
        .content_type(content_type)
        .body(ByteStream::from(bytes))
        .send()
        .await
        .map_err(|e| format!("S3 put_object error: {}", e))?;

    Ok(())
}

/// Issue a short-lived signed GET URL for a stored proof file.
pub async fn presign_proof_url(
    s3_client: &S3Client,
    bucket_name: &str,
    key: &str,
) -> Result<String, String> {
    let config = PresigningConfig::expires_in(Duration::from_secs(SIGNED_URL_TTL_SECS))
        .map_err(|e| format!("Invalid presigning config: {}", e))?;

    let request = s3_client
        .get_object()
        .bucket(bucket_name)
        .key(key)
        .presigned(config)
        .await
        .map_err(|e| format!("S3 presign error: {}", e))?;

    Ok(request.uri().to_string())
}

#[cfg(test)]
mod tests {
    use super::proof_object_key;

    #[test]
    fn key_is_namespaced_by_uploader_and_task() {
        let key = proof_object_key("user-1", "task-9", 1700000000000, 0, "proof.PNG");
        assert_eq!(key, "user-1/task-9-1700000000000-0.png");
    }

    #[test]
    fn key_without_extension_omits_suffix() {
        let key = proof_object_key("u", "t", 42, 3, "screenshot");
        assert_eq!(key, "u/t-42-3");
    }

    #[test]
    fn keys_for_same_attempt_are_distinct_per_file() {
        let a = proof_object_key("u", "t", 42, 0, "a.jpg");
        let b = proof_object_key("u", "t", 42, 1, "b.jpg");
        assert_ne!(a, b);
    }
}
