use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::future::{join_all, try_join_all};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;

use taskproof_atoms::proofs::model::{media_kind_for_path, validate_proof_file, ProofUpload};
use taskproof_atoms::tasks::model::TaskStatus;
use taskproof_atoms::{proofs, tasks};
use taskproof_shared::storage;

#[derive(Debug, Deserialize)]
pub struct SubmitProofPayload {
    pub files: Vec<ProofUpload>,
}

#[derive(Debug)]
struct AcceptedFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Decode and validate the whole batch before anything is uploaded.
/// The first offending file aborts the submission.
fn accept_files(files: Vec<ProofUpload>) -> Result<Vec<AcceptedFile>, String> {
    if files.is_empty() {
        return Err("at least one file is required".to_string());
    }

    let mut accepted = Vec::with_capacity(files.len());
    for file in files {
        let bytes = BASE64
            .decode(&file.data)
            .map_err(|_| format!("{}: file data is not valid base64", file.file_name))?;
        validate_proof_file(&file.file_name, &file.content_type, bytes.len())?;
        accepted.push(AcceptedFile {
            file_name: file.file_name,
            content_type: file.content_type,
            bytes,
        });
    }

    Ok(accepted)
}

/// Completed tasks are closed to further submissions; everything still
/// in flight can be submitted or resubmitted.
fn accepts_submissions(status: TaskStatus) -> bool {
    status != TaskStatus::Completed
}

/// Submit proof of completion for a task (assignee only).
///
/// Uploads fan out concurrently and are joined before any metadata row is
/// written; the status flip happens last, only after every upload and
/// every row succeeded. A failed upload aborts the batch without
/// compensating deletes for blobs that already landed.
pub async fn submit_proof(
    client: &DynamoClient,
    s3_client: &S3Client,
    table_name: &str,
    bucket_name: &str,
    user_id: &str,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: SubmitProofPayload = serde_json::from_slice(body)?;

    let task = match tasks::service::get_task(client, table_name, task_id).await {
        Ok(task) => task,
        Err(e) if e == "Task not found" => {
            return Ok(error_json(StatusCode::NOT_FOUND, &e));
        }
        Err(e) => return Ok(error_json(StatusCode::INTERNAL_SERVER_ERROR, &e)),
    };

    if task.assigned_to != user_id {
        return Ok(error_json(
            StatusCode::FORBIDDEN,
            "Only the assignee can submit proof for this task",
        ));
    }

    if !accepts_submissions(task.status) {
        return Ok(error_json(
            StatusCode::CONFLICT,
            "Task is already completed",
        ));
    }

    let accepted = match accept_files(payload.files) {
        Ok(accepted) => accepted,
        Err(e) => return Ok(error_json(StatusCode::BAD_REQUEST, &e)),
    };

    let millis = chrono::Utc::now().timestamp_millis();
    let keyed: Vec<(String, AcceptedFile)> = accepted
        .into_iter()
        .enumerate()
        .map(|(index, file)| {
            let key =
                storage::proof_object_key(user_id, task_id, millis, index, &file.file_name);
            (key, file)
        })
        .collect();

    // Fan out the uploads, joined before declaring success.
    let uploads = keyed.iter().map(|(key, file)| {
        storage::upload_proof(
            s3_client,
            bucket_name,
            key,
            &file.content_type,
            file.bytes.clone(),
        )
    });

    if let Err(e) = try_join_all(uploads).await {
        // Blobs that already landed for this attempt stay behind.
        tracing::error!(
            "Proof upload for task {} aborted, earlier files are not rolled back: {}",
            task_id,
            e
        );
        return Ok(error_json(StatusCode::INTERNAL_SERVER_ERROR, &e));
    }

    // One attachment row per uploaded file.
    let mut created = Vec::with_capacity(keyed.len());
    for (key, _) in &keyed {
        match proofs::service::create_proof(client, table_name, task_id, user_id, key).await {
            Ok(proof) => created.push(proof),
            Err(e) => return Ok(error_json(StatusCode::INTERNAL_SERVER_ERROR, &e)),
        }
    }

    if let Err(e) = tasks::service::mark_awaiting_approval(client, table_name, task_id).await {
        return Ok(error_json(StatusCode::INTERNAL_SERVER_ERROR, &e));
    }

    tracing::info!(
        "Task #{} submitted for approval with {} proof file(s)",
        task.task_number,
        created.len()
    );

    Ok(Response::builder()
        .status(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&created)?.into())
        .map_err(Box::new)?)
}

/// List a task's proof attachments with short-lived signed URLs.
///
/// URLs are requested in parallel; a failed signing degrades that single
/// item to `url: null` instead of aborting the others.
pub async fn list_task_proofs(
    client: &DynamoClient,
    s3_client: &S3Client,
    table_name: &str,
    bucket_name: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    let proof_rows = match proofs::service::load_proofs_for_task(client, table_name, task_id).await
    {
        Ok(rows) => rows,
        Err(e) => return Ok(error_json(StatusCode::INTERNAL_SERVER_ERROR, &e)),
    };

    let urls = join_all(
        proof_rows
            .iter()
            .map(|p| storage::presign_proof_url(s3_client, bucket_name, &p.file_path)),
    )
    .await;

    let items: Vec<serde_json::Value> = proof_rows
        .iter()
        .zip(urls)
        .map(|(proof, url)| {
            let url = match url {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::error!("Signing URL for {} failed: {}", proof.file_path, e);
                    None
                }
            };
            serde_json::json!({
                "proof_id": proof.proof_id,
                "task_id": proof.task_id,
                "user_id": proof.user_id,
                "file_path": proof.file_path,
                "uploaded_at": proof.uploaded_at,
                "kind": media_kind_for_path(&proof.file_path),
                "url": url,
            })
        })
        .collect();

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&items)?.into())
        .map_err(Box::new)?)
}

fn error_json(status: StatusCode, message: &str) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({"error": message}).to_string().into())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: &str, bytes: &[u8]) -> ProofUpload {
        ProofUpload {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = accept_files(vec![]).unwrap_err();
        assert!(err.contains("at least one file"));
    }

    #[test]
    fn image_and_video_within_limits_are_accepted() {
        let files = vec![
            upload("shot.png", "image/png", &[0u8; 1024]),
            upload("clip.mp4", "video/mp4", &[0u8; 2048]),
        ];
        let accepted = accept_files(files).unwrap();
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].bytes.len(), 1024);
    }

    #[test]
    fn one_bad_file_aborts_the_whole_batch() {
        let files = vec![
            upload("shot.png", "image/png", &[0u8; 16]),
            upload("notes.pdf", "application/pdf", &[0u8; 16]),
        ];
        let err = accept_files(files).unwrap_err();
        assert!(err.contains("notes.pdf"));
    }

    #[test]
    fn completed_tasks_are_closed_to_submissions() {
        assert!(!accepts_submissions(TaskStatus::Completed));
        for status in [
            TaskStatus::Pending,
            TaskStatus::AwaitingApproval,
            TaskStatus::Rejected,
        ] {
            assert!(accepts_submissions(status));
        }
    }

    #[test]
    fn invalid_base64_names_the_file() {
        let files = vec![ProofUpload {
            file_name: "shot.png".to_string(),
            content_type: "image/png".to_string(),
            data: "not-base64!!".to_string(),
        }];
        let err = accept_files(files).unwrap_err();
        assert!(err.contains("shot.png"));
    }
}
