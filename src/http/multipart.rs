//! Minimal `multipart/form-data` encoder for requests carrying files.

use std::sync::atomic::{AtomicU64, Ordering};

use super::UploadedFile;

static BOUNDARY_COUNTER: AtomicU64 = AtomicU64::new(0);

pub(crate) struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub(crate) fn encode(fields: &[(String, String)], files: &[UploadedFile]) -> Self {
        let seq = BOUNDARY_COUNTER.fetch_add(1, Ordering::Relaxed);
        let boundary = format!("----controller-harness-{:016x}", seq);
        let mut bytes = Vec::new();

        for (name, value) in fields {
            bytes.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            bytes.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    escape_quotes(name)
                )
                .as_bytes(),
            );
            bytes.extend_from_slice(value.as_bytes());
            bytes.extend_from_slice(b"\r\n");
        }

        for file in files {
            bytes.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            bytes.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    escape_quotes(&file.field),
                    escape_quotes(&file.file_name),
                    file.content_type
                )
                .as_bytes(),
            );
            bytes.extend_from_slice(&file.content);
            bytes.extend_from_slice(b"\r\n");
        }

        bytes.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        Self { boundary, bytes }
    }

    pub(crate) fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "%22")
}
