//! Error types for the Vitrine viewer
//!
//! Library code returns [`ViewerError`]; the application boundary
//! (`ViewerApp`, `main`) wraps it in `anyhow`. Messages describe only the
//! failing step; the underlying cause is reachable through `source()`, so
//! log sites print the chain with `{:#}`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("asset '{}' does not exist", path.display())]
    MissingAsset { path: PathBuf },

    #[error("unsupported asset format '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read glTF '{}'", path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to read OBJ '{}'", path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to decode image '{}'", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to open '{}' in the system player", path.display())]
    Player {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no compatible GPU adapter")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window surface")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to acquire the next frame")]
    Frame(#[from] wgpu::SurfaceError),

    #[error("shader '{0}' is not loaded")]
    MissingShader(String),
}

pub type Result<T> = std::result::Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn cause_is_chained_not_repeated() {
        let source = image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "truncated chunk",
        ));
        let error = ViewerError::Image {
            path: PathBuf::from("content/1.png"),
            source,
        };

        assert_eq!(error.to_string(), "failed to decode image 'content/1.png'");
        assert!(error.source().is_some());

        let chained = format!("{:#}", anyhow::Error::new(error));
        assert_eq!(chained.matches("truncated chunk").count(), 1);
    }
}
