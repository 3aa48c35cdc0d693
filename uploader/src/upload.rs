/// Part size used when splitting an upload, and the smallest part S3 accepts.
pub const DEFAULT_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Largest part S3 accepts.
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

const CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub url: String,
    pub size: u64,
    pub parts: usize,
}

/// Virtual-hosted style URL of an object. The object is not necessarily publicly readable.
pub fn object_url(bucket: &str, region: &rusoto_core::Region, key: &str) -> String {
    format!(
        "https://{}.s3.{}.amazonaws.com/{}",
        bucket,
        region.name(),
        key
    )
}

pub fn s3_client(
    credentials: rusoto_credential::AwsCredentials,
    region: rusoto_core::Region,
) -> Result<rusoto_s3::S3Client, crate::Error> {
    let provider = rusoto_credential::StaticProvider::new(
        credentials.aws_access_key_id().to_owned(),
        credentials.aws_secret_access_key().to_owned(),
        credentials.token().clone(),
        None,
    );
    let client =
        rusoto_core::HttpClient::new().map_err(|e| crate::Error::Client(e.to_string()))?;
    Ok(rusoto_s3::S3Client::new_with(client, provider, region))
}

/// Uploads `path` to `bucket` under its file name.
///
/// Files up to `part_size` bytes are sent with a single PutObject, larger ones with a multipart
/// upload of `part_size` parts.
pub async fn upload_file<S>(
    s3: &S,
    bucket: &str,
    path: &std::path::Path,
    region: &rusoto_core::Region,
    part_size: u64,
) -> Result<Upload, crate::Error>
where
    S: rusoto_s3::S3 + ?Sized,
{
    if part_size == 0 || part_size > MAX_PART_SIZE {
        return Err(crate::Error::Upload(format!(
            "part size must be between 1 and {} bytes, got {}",
            MAX_PART_SIZE, part_size
        )));
    }
    let key = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| crate::Error::Upload(format!("{} has no file name", path.display())))?
        .to_owned();
    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();

    log::info!("Uploading video to S3 bucket {}...", bucket);
    let parts = if size <= part_size {
        put_object(s3, bucket, &key, file, size).await?;
        1
    } else {
        put_multipart(s3, bucket, &key, file, part_size).await?
    };
    log::info!("Video upload completed successfully");

    let url = object_url(bucket, region, &key);
    log::info!("Uploaded video URL: {}", url);
    Ok(Upload {
        bucket: bucket.to_owned(),
        key,
        url,
        size,
        parts,
    })
}

async fn put_object<S>(
    s3: &S,
    bucket: &str,
    key: &str,
    file: tokio::fs::File,
    size: u64,
) -> Result<(), crate::Error>
where
    S: rusoto_s3::S3 + ?Sized,
{
    let body = rusoto_core::ByteStream::new_with_size(
        tokio_util::io::ReaderStream::new(file),
        size as usize,
    );
    s3.put_object(rusoto_s3::PutObjectRequest {
        bucket: bucket.to_owned(),
        key: key.to_owned(),
        body: Some(body),
        content_length: Some(size as i64),
        content_type: Some(CONTENT_TYPE.to_owned()),
        ..Default::default()
    })
    .await
    .map_err(|e| crate::Error::from_rusoto("PutObject", e))?;
    Ok(())
}

async fn put_multipart<S>(
    s3: &S,
    bucket: &str,
    key: &str,
    mut file: tokio::fs::File,
    part_size: u64,
) -> Result<usize, crate::Error>
where
    S: rusoto_s3::S3 + ?Sized,
{
    let created = s3
        .create_multipart_upload(rusoto_s3::CreateMultipartUploadRequest {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            content_type: Some(CONTENT_TYPE.to_owned()),
            ..Default::default()
        })
        .await
        .map_err(|e| crate::Error::from_rusoto("CreateMultipartUpload", e))?;
    let upload_id = created.upload_id.ok_or_else(|| {
        crate::Error::Upload("CreateMultipartUpload returned no upload id".to_owned())
    })?;

    match upload_parts(s3, bucket, key, &upload_id, &mut file, part_size).await {
        Ok(parts) => Ok(parts),
        Err(e) => {
            log::warn!("Aborting multipart upload {} of {}", upload_id, key);
            let result = s3
                .abort_multipart_upload(rusoto_s3::AbortMultipartUploadRequest {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                    upload_id: upload_id.clone(),
                    ..Default::default()
                })
                .await;
            if let Err(abort) = result {
                log::error!("Failed to abort multipart upload {}: {}", upload_id, abort);
            }
            Err(e)
        }
    }
}

async fn upload_parts<S>(
    s3: &S,
    bucket: &str,
    key: &str,
    upload_id: &str,
    file: &mut tokio::fs::File,
    part_size: u64,
) -> Result<usize, crate::Error>
where
    S: rusoto_s3::S3 + ?Sized,
{
    use tokio::io::AsyncReadExt as _;

    let mut completed = Vec::new();
    loop {
        let mut chunk = Vec::with_capacity(part_size as usize);
        (&mut *file).take(part_size).read_to_end(&mut chunk).await?;
        if chunk.is_empty() {
            break;
        }

        // Part numbers start at 1
        let part_number = completed.len() as i64 + 1;
        let len = chunk.len();
        let output = s3
            .upload_part(rusoto_s3::UploadPartRequest {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                upload_id: upload_id.to_owned(),
                part_number,
                content_length: Some(len as i64),
                body: Some(chunk.into()),
                ..Default::default()
            })
            .await
            .map_err(|e| crate::Error::from_rusoto("UploadPart", e))?;
        log::debug!("Uploaded part {} ({} bytes)", part_number, len);
        completed.push(rusoto_s3::CompletedPart {
            e_tag: output.e_tag,
            part_number: Some(part_number),
        });
    }

    let parts = completed.len();
    s3.complete_multipart_upload(rusoto_s3::CompleteMultipartUploadRequest {
        bucket: bucket.to_owned(),
        key: key.to_owned(),
        upload_id: upload_id.to_owned(),
        multipart_upload: Some(rusoto_s3::CompletedMultipartUpload {
            parts: Some(completed),
        }),
        ..Default::default()
    })
    .await
    .map_err(|e| crate::Error::from_rusoto("CompleteMultipartUpload", e))?;
    Ok(parts)
}
