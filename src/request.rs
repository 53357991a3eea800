use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::extract::UploadDescriptor;
use crate::url::UrlScript;

/// Upload error reported for a file, over the conventional code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    /// Code 0, the upload succeeded
    None,
    /// Code 1, the file exceeds the server upload size limit
    MaxSize,
    /// Code 2, the file exceeds the form-declared size limit
    FormMaxSize,
    /// Code 3, the file was only partially uploaded
    Partial,
    /// Code 4, no file was uploaded
    NoFile,
    /// Code 6, no temporary directory was available
    NoTmpDir,
    /// Code 7, writing the file to disk failed
    CantWrite,
    /// Code 8, an extension stopped the upload
    Extension,
    /// Any other code, kept as-is
    Unknown(u32),
}

impl UploadError {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::None,
            1 => Self::MaxSize,
            2 => Self::FormMaxSize,
            3 => Self::Partial,
            4 => Self::NoFile,
            6 => Self::NoTmpDir,
            7 => Self::CantWrite,
            8 => Self::Extension,
            code => Self::Unknown(code),
        }
    }
}

/// One uploaded file of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    name: Option<String>,
    size: Option<u64>,
    error: UploadError,
    temp_path: Option<PathBuf>,
}

impl FileUpload {
    /// File name sent by the client, untrusted
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn error(&self) -> UploadError {
        self.error
    }

    pub fn is_ok(&self) -> bool {
        self.error == UploadError::None
    }

    /// Backing storage of the upload on the local filesystem
    pub fn temp_path(&self) -> Option<&Path> {
        self.temp_path.as_deref()
    }
}

impl From<UploadDescriptor> for FileUpload {
    fn from(descriptor: UploadDescriptor) -> Self {
        Self {
            name: descriptor.client_filename,
            size: descriptor.size,
            error: UploadError::from_code(descriptor.error),
            temp_path: descriptor.temp_path,
        }
    }
}

pub(crate) type BodyReader = Box<dyn Fn() -> io::Result<Vec<u8>> + Send + Sync>;

/// Body bytes read on first access and cached afterwards.
struct LazyBody {
    cell: OnceCell<Vec<u8>>,
    read: BodyReader,
}

/// The resolved request value object.
///
/// Headers are flattened: names are lowercase and the values of a repeated
/// header are joined by a newline. The body is read lazily on first access.
pub struct Request {
    url: UrlScript,
    post: HashMap<String, String>,
    files: Vec<FileUpload>,
    cookies: HashMap<String, String>,
    headers: HashMap<String, String>,
    method: String,
    remote_addr: Option<String>,
    remote_host: Option<String>,
    body: LazyBody,
}

impl Request {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        url: UrlScript,
        post: HashMap<String, String>,
        files: Vec<FileUpload>,
        cookies: HashMap<String, String>,
        headers: HashMap<String, String>,
        method: String,
        remote_addr: Option<String>,
        remote_host: Option<String>,
        body: BodyReader,
    ) -> Self {
        Self {
            url,
            post,
            files,
            cookies,
            headers,
            method,
            remote_addr,
            remote_host,
            body: LazyBody {
                cell: OnceCell::new(),
                read: body,
            },
        }
    }

    pub fn url(&self) -> &UrlScript {
        &self.url
    }

    pub fn post(&self) -> &HashMap<String, String> {
        &self.post
    }

    pub fn post_field(&self, name: &str) -> Option<&str> {
        self.post.get(name).map(String::as_str)
    }

    pub fn uploaded_files(&self) -> &[FileUpload] {
        &self.files
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Flattened header value by lowercase name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Resolved client address, if any was reported
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// Resolved client host, if any was reported
    pub fn remote_host(&self) -> Option<&str> {
        self.remote_host.as_deref()
    }

    /// Raw body bytes, read on first call and cached
    pub fn body(&self) -> io::Result<&[u8]> {
        self.body
            .cell
            .get_or_try_init(|| (self.body.read)())
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::Url;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn empty_request(body: BodyReader) -> Request {
        Request::new(
            UrlScript::new(Url::new(), "/"),
            HashMap::new(),
            Vec::new(),
            HashMap::new(),
            HashMap::new(),
            "GET".to_string(),
            None,
            None,
            body,
        )
    }

    #[test]
    fn body_is_read_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();

        let request = empty_request(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(b"hello".to_vec())
        }));

        assert_eq!(request.body().unwrap(), b"hello");
        assert_eq!(request.body().unwrap(), b"hello");
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn body_read_error_surfaces() {
        let request = empty_request(Box::new(|| {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream gone"))
        }));

        assert!(request.body().is_err());
    }

    #[test]
    fn upload_error_codes() {
        assert_eq!(UploadError::from_code(0), UploadError::None);
        assert_eq!(UploadError::from_code(4), UploadError::NoFile);
        assert_eq!(UploadError::from_code(8), UploadError::Extension);
        assert_eq!(UploadError::from_code(42), UploadError::Unknown(42));
    }

    #[test]
    fn file_upload_from_descriptor() {
        let upload = FileUpload::from(UploadDescriptor {
            client_filename: Some("report.pdf".to_string()),
            size: Some(1024),
            error: 0,
            temp_path: Some(PathBuf::from("/tmp/upl-1")),
        });

        assert_eq!(upload.name(), Some("report.pdf"));
        assert_eq!(upload.size(), Some(1024));
        assert!(upload.is_ok());
        assert_eq!(upload.temp_path(), Some(Path::new("/tmp/upl-1")));
    }
}
